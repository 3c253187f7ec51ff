use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读取或解析失败
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// 配置值不合法
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// 渲染 TOML 失败
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// 配置结果类型
pub type Result<T> = std::result::Result<T, ConfigError>;
