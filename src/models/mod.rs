//! 核心数据模型模块
//!
//! 定义 Minerva 的核心数据结构：ConversationState, KnowledgeItem 等。

pub mod knowledge;
pub mod state;

pub use knowledge::*;
pub use state::*;
