use jobpilot::collector::{Collector, CollectorPolicy, ListingSite};
use jobpilot::config::Config;
use jobpilot::infrastructure::SessionFactory;
use jobpilot::models::{ExperienceFilter, ListingQuery};
use jobpilot::ChromeSessionFactory;

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_browser_session() {
    let config = Config::from_env();

    let sessions = ChromeSessionFactory::new(&config);
    let page = sessions.open().await.expect("打开浏览器会话失败");

    page.goto("https://www.naukri.com", config.navigation_timeout())
        .await
        .expect("导航失败");
    let url = page.current_url().await.expect("获取 URL 失败");
    assert!(url.contains("naukri.com"));

    page.close().await.expect("关闭会话失败");
}

#[tokio::test]
#[ignore]
async fn test_collect_naukri_first_page() {
    let config = Config::from_env();

    let sessions = ChromeSessionFactory::new(&config);
    let page = sessions.open().await.expect("打开浏览器会话失败");

    let query = ListingQuery::new("Rust Developer", "Pune")
        .with_pages(1)
        .with_experience(ExperienceFilter::new(0, 10));
    let collection = Collector::new(ListingSite::Naukri, CollectorPolicy::from_config(&config))
        .collect(page.as_ref(), &query)
        .await
        .expect("采集失败");

    for job in &collection.jobs {
        assert!(!job.title.is_empty());
        assert!(job.is_unapplied());
    }
    println!("采集到 {} 条职位", collection.jobs.len());

    page.close().await.expect("关闭会话失败");
}
