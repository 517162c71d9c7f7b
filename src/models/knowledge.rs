use serde::{Deserialize, Serialize};

/// 知识条目
///
/// 回退检索的基本单元。进程启动时加载一次，之后只读。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeItem {
    /// 条目唯一标识
    pub id: String,

    /// 标题
    pub title: String,

    /// 正文，检索语料即各条目正文按序排列
    pub text: String,

    /// 标签（仅供浏览，检索逻辑不使用）
    #[serde(default)]
    pub tags: Vec<String>,
}

impl KnowledgeItem {
    /// 创建新知识条目
    pub fn new(id: &str, title: &str, text: &str, tags: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            text: text.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}
