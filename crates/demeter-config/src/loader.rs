use crate::app::AppConfig;
use crate::error::Result;
use config::{Config, Environment, File, FileFormat, Map};
use std::path::{Path, PathBuf};

/// 环境变量前缀，例如 `DEMETER_SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "DEMETER";

/// 配置加载器
///
/// 优先级：环境变量 > 配置文件 > 默认值。配置文件不存在时使用默认值。
pub struct ConfigLoader {
    path: PathBuf,
    env: Option<Map<String, String>>,
}

impl ConfigLoader {
    /// 创建配置加载器
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            env: None,
        }
    }

    /// 使用给定的变量表代替进程环境
    pub fn with_env(mut self, vars: Map<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 加载并验证配置
    pub fn load(&self) -> Result<AppConfig> {
        let config: AppConfig = Config::builder()
            .add_source(
                File::from(self.path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(self.env.clone()),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}
