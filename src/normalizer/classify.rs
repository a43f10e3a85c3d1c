//! 关键词分类：类别、工作类型、职级，以及从标题中识别技能

use crate::models::{JobTags, Skills};

const CATEGORY_RULES: &[(&str, &[&str])] = &[
    (
        "Frontend Development",
        &["react", "angular", "vue", "javascript", "typescript", "frontend", "html", "css"],
    ),
    (
        "Backend Development",
        &["java", "spring", "node", "express", "django", "flask", "backend", "api"],
    ),
    (
        "Data Science / ML",
        &["data", "ml", "ai", "machine learning", "deep learning", "python", "pandas", "numpy"],
    ),
    (
        "DevOps / Cloud",
        &["aws", "docker", "kubernetes", "jenkins", "terraform", "azure", "ci/cd"],
    ),
    ("Mobile Development", &["android", "flutter", "react native", "ios"]),
    ("QA / Testing", &["qa", "test", "selenium", "automation", "manual testing"]),
];

const KNOWN_SKILLS: &[&str] = &[
    "java", "python", "react", "node", "spring boot", "sql", "mongodb", "aws", "javascript",
    "typescript", "docker", "kubernetes", "html", "css", "express", "c++", "c#", "next.js",
    "flutter", "android", "django", "flask", "git",
];

/// 根据标题和技能打标签
pub fn tag(title: &str, skills: &Skills) -> JobTags {
    let title = title.to_lowercase();
    let text = format!("{} {}", title, skills.to_string().to_lowercase());

    let category = if text.contains("intern") {
        "Internship"
    } else {
        CATEGORY_RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or("General Tech")
    };

    let job_type = if title.contains("intern") {
        "Internship"
    } else if title.contains("contract") {
        "Contract"
    } else if title.contains("remote") {
        "Remote"
    } else {
        "Full-time"
    };

    let seniority = if title.contains("senior") || title.contains("lead") {
        "Senior"
    } else if title.contains("junior") || title.contains("fresher") {
        "Junior"
    } else {
        "Mid-level"
    };

    JobTags {
        category: category.to_string(),
        job_type: job_type.to_string(),
        seniority: seniority.to_string(),
    }
}

/// 从标题中识别常见技能
pub fn detect_skills(title: &str) -> Skills {
    let title = title.to_lowercase();
    KNOWN_SKILLS
        .iter()
        .filter(|skill| title.contains(*skill))
        .collect()
}
