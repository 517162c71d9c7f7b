use serde::{Deserialize, Serialize};

/// 会话状态
///
/// 一次对话的全部可变状态。核心从不持有它：每一轮接收完整的前置状态，
/// 返回完整的新状态，未被触碰的字段原样传递。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConversationState {
    /// 研究主题
    pub topic: Option<String>,

    /// 目标字数
    pub word_count: Option<u32>,

    /// 会话内保存的笔记（只追加）
    pub notes: Vec<String>,

    /// explain 模式开关
    pub explain: bool,
}

impl ConversationState {
    /// 创建空状态
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回设置了主题的新状态
    pub fn with_topic(&self, topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            ..self.clone()
        }
    }

    /// 返回设置了字数的新状态
    pub fn with_word_count(&self, word_count: u32) -> Self {
        Self {
            word_count: Some(word_count),
            ..self.clone()
        }
    }

    /// 返回追加了一条笔记的新状态
    pub fn with_note(&self, note: impl Into<String>) -> Self {
        let mut notes = self.notes.clone();
        notes.push(note.into());
        Self {
            notes,
            ..self.clone()
        }
    }

    /// 返回设置了 explain 模式的新状态
    pub fn with_explain(&self, explain: bool) -> Self {
        Self {
            explain,
            ..self.clone()
        }
    }

    /// 主题是否已设置且非空
    pub fn has_topic(&self) -> bool {
        self.topic.as_deref().is_some_and(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_default_is_empty() {
        let state = ConversationState::new();
        assert_eq!(state.topic, None);
        assert_eq!(state.word_count, None);
        assert!(state.notes.is_empty());
        assert!(!state.explain);
    }

    #[test]
    fn test_with_note_does_not_alias() {
        let a = ConversationState::new().with_note("first");
        let b = a.with_note("second");

        assert_eq!(a.notes, vec!["first".to_string()]);
        assert_eq!(b.notes, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_untouched_fields_pass_through() {
        let state = ConversationState::new()
            .with_topic("ai in education")
            .with_word_count(2000)
            .with_explain(true);

        let next = state.with_note("remember this");
        assert_eq!(next.topic.as_deref(), Some("ai in education"));
        assert_eq!(next.word_count, Some(2000));
        assert!(next.explain);
    }

    #[test]
    fn test_has_topic_rejects_empty() {
        assert!(!ConversationState::new().has_topic());
        assert!(!ConversationState::new().with_topic("").has_topic());
        assert!(ConversationState::new().with_topic("bias").has_topic());
    }

    #[test]
    fn test_state_json_round_trip() {
        let state = ConversationState::new()
            .with_topic("social media")
            .with_note("check sources");

        let json = serde_json::to_string(&state).unwrap();
        let back: ConversationState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }
}
