//! 配置模块
//!
//! 提供应用配置结构和加载逻辑。

pub mod config;
pub mod loader;

pub use config::{AppConfig, KnowledgeConfig, LoggingConfig, RetrievalConfig, ServerConfig};
pub use loader::{ConfigLoader, ConfigValidationError};
