use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::PathBuf;

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 搜索路径：
    /// 1. ./minerva.toml
    /// 2. 环境变量（MINERVA_ 前缀，双下划线分隔层级）
    pub fn load() -> Result<AppConfig, figment::Error> {
        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("minerva.toml"))
            .merge(Env::prefixed("MINERVA_").split("__"));

        figment.extract()
    }

    /// 从指定路径加载配置
    pub fn load_from(path: PathBuf) -> Result<AppConfig, figment::Error> {
        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("MINERVA_").split("__"));

        figment.extract()
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if !(0.0..=1.0).contains(&config.retrieval.similarity_threshold) {
            return Err(ConfigValidationError::InvalidThreshold);
        }

        if config.retrieval.top_k == 0 {
            return Err(ConfigValidationError::InvalidTopK);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("相似度阈值无效，必须在 0.0 到 1.0 之间")]
    InvalidThreshold,

    #[error("top_k 无效，必须大于 0")]
    InvalidTopK,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config::RetrievalConfig;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let config = AppConfig {
            retrieval: RetrievalConfig {
                similarity_threshold: 1.5,
                ..RetrievalConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidThreshold)
        ));
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let config = AppConfig {
            retrieval: RetrievalConfig {
                top_k: 0,
                ..RetrievalConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidTopK)
        ));
    }
}
