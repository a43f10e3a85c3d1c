use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器 / 页面相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 登录会话错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 投递过程错误
    #[error("投递错误: {0}")]
    Apply(#[from] ApplyError),
    /// 职位存储接口错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 编排器控制错误
    #[error("编排器错误: {0}")]
    Orchestrator(#[from] OrchestratorError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// 浏览器相关错误（页面级的暂时性错误：跳过当前页 / 当前职位，批次继续）
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed { port: u16, source: BoxedSource },
    /// 启动浏览器失败
    #[error("启动浏览器失败: {source}")]
    LaunchFailed { source: BoxedSource },
    /// 创建页面失败
    #[error("创建页面失败: {source}")]
    PageCreationFailed { source: BoxedSource },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed { url: String, source: BoxedSource },
    /// 导航超时
    #[error("导航到 {url} 超时 ({timeout_ms} ms)")]
    NavigationTimeout { url: String, timeout_ms: u64 },
    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed { source: BoxedSource },
    /// 元素不存在
    #[error("页面元素不存在: {locator}")]
    ElementNotFound { locator: String },
    /// 截图失败
    #[error("截图失败 ({path}): {source}")]
    ScreenshotFailed { path: String, source: BoxedSource },
}

/// 登录会话错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 无法自动确认登录，需要人工介入
    #[error("无法自动确认登录状态 (等待 {waited_ms} ms)")]
    AuthRequired { waited_ms: u64 },
    /// 登录页无法打开
    #[error("无法打开登录页 {url}: {reason}")]
    LoginPageUnreachable { url: String, reason: String },
    /// 人工登录步骤失败
    #[error("人工登录步骤失败: {reason}")]
    ManualStepFailed { reason: String },
}

/// 投递过程错误（单个职位的终态失败，不会中止整个批次）
#[derive(Debug, Error)]
pub enum ApplyError {
    /// 职位没有 URL
    #[error("职位缺少 URL")]
    NoUrl,
    /// 页面上找不到投递按钮
    #[error("未找到投递按钮: {url}")]
    NoAffordance { url: String },
    /// 在限定次数内未检测到成功提示
    #[error("未检测到投递成功提示 (轮询 {polls} 次)")]
    AmbiguousOutcome { polls: u32 },
}

/// 职位存储接口错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 无法连接存储服务
    #[error("存储服务不可达 ({endpoint}): {source}")]
    Unreachable { endpoint: String, source: BoxedSource },
    /// 存储服务返回错误状态
    #[error("存储服务返回错误响应 ({endpoint}): status={status}, body={body}")]
    BadResponse {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 响应解析失败
    #[error("存储响应解析失败 ({endpoint}): {source}")]
    DecodeFailed { endpoint: String, source: BoxedSource },
    /// 职位不存在
    #[error("职位不存在: {id}")]
    JobNotFound { id: i64 },
    /// 职位没有 ID，无法回写状态
    #[error("职位缺少 ID: {title}")]
    MissingId { title: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed { path: String, source: BoxedSource },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed { path: String, source: BoxedSource },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed { path: String, source: BoxedSource },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 经验筛选格式错误
    #[error("经验筛选格式错误: '{value}' (应为 min-max)")]
    InvalidExperienceFilter { value: String },
}

/// 编排器控制错误
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// 已有运行中的批次
    #[error("自动投递已在运行中")]
    AlreadyRunning,
    /// 后台任务异常退出
    #[error("后台任务异常退出: {reason}")]
    TaskAborted { reason: String },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_default();
        AppError::Store(StoreError::Unreachable {
            endpoint,
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建导航失败错误
    pub fn navigation_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::NavigationFailed {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// 创建存储不可达错误
    pub fn store_unreachable(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Store(StoreError::Unreachable {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 是否为页面级暂时性错误（导航 / 超时），只影响当前页或当前职位
    pub fn is_transient_page_error(&self) -> bool {
        matches!(
            self,
            AppError::Browser(
                BrowserError::NavigationFailed { .. } | BrowserError::NavigationTimeout { .. }
            )
        )
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
