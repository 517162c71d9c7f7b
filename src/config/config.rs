use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

/// 检索配置
///
/// 控制回退检索的行为。阈值以下的匹配视为低置信度。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// 相似度阈值，低于该值返回兜底回复
    pub similarity_threshold: f32,
    /// 检索返回的候选数量
    pub top_k: usize,
    /// explain 模式附带的关键词数量
    pub explain_keywords: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.17,
            top_k: 1,
            explain_keywords: 6,
        }
    }
}

/// 知识库配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// 外部知识库文件路径（JSON），为空时使用内置知识库
    pub path: Option<PathBuf>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            structured: false,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 检索配置
    pub retrieval: RetrievalConfig,
    /// 知识库配置
    pub knowledge: KnowledgeConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            logging: LoggingConfig {
                level: "debug".into(),
                structured: false,
            },
            app_name: "minerva".into(),
            environment: "development".into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retrieval_config() {
        let config = RetrievalConfig::default();
        assert_eq!(config.similarity_threshold, 0.17);
        assert_eq!(config.top_k, 1);
        assert_eq!(config.explain_keywords, 6);
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.environment, "development");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.server.port, 8080);
    }
}
