//! 意图匹配
//!
//! 有序规则表驱动的意图检测。规则顺序即优先级：按表序取第一条
//! 匹配成功的规则。锚定规则要求整条输入匹配，搜索规则允许子串命中。

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// 意图类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    /// 命令一览
    Help,
    /// 设置主题
    SetTopic,
    /// 设置目标字数
    SetWordCount,
    /// 保存笔记
    SaveNote,
    /// 查看会话状态
    ShowSession,
    /// 切换 explain 模式
    ExplainToggle,
    /// 生成研究问题
    MakeResearchQuestion,
    /// 生成关键词包
    MakeKeywords,
    /// 生成检索式
    MakeSearchStrings,
    /// 生成提纲
    MakeOutline,
    /// 检查论断
    ClaimCheck,
}

/// 匹配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDiscipline {
    /// 整条输入匹配
    Anchored,
    /// 子串命中即可
    Search,
}

/// 检测到的意图
///
/// 逐条消息创建，由路由器立即消费，不保留。
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    /// 意图类别
    pub kind: IntentKind,
    /// 命名捕获组提取的实体
    pub entities: HashMap<String, String>,
}

/// 意图规则
pub struct IntentRule {
    /// 意图类别
    pub kind: IntentKind,
    /// 匹配方式
    pub discipline: MatchDiscipline,
    pattern: Regex,
}

impl IntentRule {
    fn anchored(kind: IntentKind, pattern: &str) -> Self {
        Self {
            kind,
            discipline: MatchDiscipline::Anchored,
            pattern: Regex::new(pattern).unwrap(),
        }
    }

    fn search(kind: IntentKind, pattern: &str) -> Self {
        Self {
            kind,
            discipline: MatchDiscipline::Search,
            pattern: Regex::new(pattern).unwrap(),
        }
    }

    fn capture<'t>(&self, text: &'t str) -> Option<regex::Captures<'t>> {
        let caps = self.pattern.captures(text)?;
        match self.discipline {
            MatchDiscipline::Anchored => {
                // 锚定规则要求覆盖整条输入
                let m = caps.get(0)?;
                if m.start() == 0 && m.end() == text.len() {
                    Some(caps)
                } else {
                    None
                }
            }
            MatchDiscipline::Search => Some(caps),
        }
    }
}

/// 规则表，顺序即优先级
static RULES: Lazy<Vec<IntentRule>> = Lazy::new(|| {
    vec![
        IntentRule::anchored(IntentKind::Help, r"(?i)^\s*(help|\?|commands)\s*$"),
        IntentRule::anchored(
            IntentKind::SetTopic,
            r"(?i)^\s*set\s+topic\s*:\s*(?P<topic>.+?)\s*$",
        ),
        IntentRule::anchored(
            IntentKind::SetWordCount,
            r"(?i)^\s*(set\s+word\s*count|my\s+word\s*count\s+is)\s*[: ]\s*(?P<wc>\d{3,5})\s*$",
        ),
        IntentRule::anchored(
            IntentKind::SaveNote,
            r"(?i)^\s*save\s+note\s*:\s*(?P<note>.+?)\s*$",
        ),
        IntentRule::anchored(
            IntentKind::ShowSession,
            r"(?i)^\s*(show|view)\s+(my\s+)?session\s*$",
        ),
        IntentRule::anchored(
            IntentKind::ExplainToggle,
            r"(?i)^\s*explain\s+mode\s*:\s*(?P<state>on|off)\s*$",
        ),
        IntentRule::search(
            IntentKind::MakeResearchQuestion,
            r"(?i)\b(research\s+question|rq)\b",
        ),
        IntentRule::search(IntentKind::MakeKeywords, r"(?i)\b(keywords|search\s+terms)\b"),
        IntentRule::search(
            IntentKind::MakeSearchStrings,
            r"(?i)\b(search\s+strings|boolean|google\s+scholar)\b",
        ),
        IntentRule::search(
            IntentKind::MakeOutline,
            r"(?i)\b(outline|structure|essay\s+plan)\b",
        ),
        IntentRule::anchored(
            IntentKind::ClaimCheck,
            r"(?i)^\s*check\s+my\s+claim\s*:\s*(?P<claim>.+?)\s*$",
        ),
    ]
});

/// 意图匹配器
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentMatcher;

impl IntentMatcher {
    /// 创建新匹配器
    pub fn new() -> Self {
        Self
    }

    /// 检测意图：按表序返回第一条命中的规则，无命中返回 None
    pub fn detect(&self, text: &str) -> Option<Intent> {
        for rule in RULES.iter() {
            if let Some(caps) = rule.capture(text) {
                let mut entities = HashMap::new();
                for name in rule.pattern.capture_names().flatten() {
                    if let Some(m) = caps.name(name) {
                        entities.insert(name.to_string(), m.as_str().to_string());
                    }
                }
                return Some(Intent {
                    kind: rule.kind,
                    entities,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("help", IntentKind::Help)]
    #[case("  ?  ", IntentKind::Help)]
    #[case("COMMANDS", IntentKind::Help)]
    #[case("show session", IntentKind::ShowSession)]
    #[case("view my session", IntentKind::ShowSession)]
    #[case("explain mode: on", IntentKind::ExplainToggle)]
    #[case("give me a research question", IntentKind::MakeResearchQuestion)]
    #[case("any rq ideas?", IntentKind::MakeResearchQuestion)]
    #[case("I need keywords", IntentKind::MakeKeywords)]
    #[case("search terms please", IntentKind::MakeKeywords)]
    #[case("boolean operators?", IntentKind::MakeSearchStrings)]
    #[case("google scholar tips", IntentKind::MakeSearchStrings)]
    #[case("essay plan for me", IntentKind::MakeOutline)]
    #[case("how should I structure this", IntentKind::MakeOutline)]
    fn test_detects_kind(#[case] input: &str, #[case] expected: IntentKind) {
        let matcher = IntentMatcher::new();
        let intent = matcher.detect(input).unwrap();
        assert_eq!(intent.kind, expected);
    }

    #[test]
    fn test_set_topic_extracts_entity() {
        let intent = IntentMatcher::new()
            .detect("set topic: climate migration  ")
            .unwrap();
        assert_eq!(intent.kind, IntentKind::SetTopic);
        assert_eq!(
            intent.entities.get("topic").map(String::as_str),
            Some("climate migration")
        );
    }

    #[rstest]
    #[case("set word count: 1500", "1500")]
    #[case("my word count is 2000", "2000")]
    #[case("set word count 800", "800")]
    fn test_word_count_entity(#[case] input: &str, #[case] expected: &str) {
        let intent = IntentMatcher::new().detect(input).unwrap();
        assert_eq!(intent.kind, IntentKind::SetWordCount);
        assert_eq!(intent.entities.get("wc").map(String::as_str), Some(expected));
    }

    #[test]
    fn test_word_count_requires_three_digits() {
        assert!(IntentMatcher::new().detect("set word count: 42").is_none());
    }

    #[test]
    fn test_claim_check_entity() {
        let intent = IntentMatcher::new()
            .detect("check my claim: This always proves everyone is affected")
            .unwrap();
        assert_eq!(intent.kind, IntentKind::ClaimCheck);
        assert_eq!(
            intent.entities.get("claim").map(String::as_str),
            Some("This always proves everyone is affected")
        );
    }

    #[test]
    fn test_rule_order_is_priority() {
        // 规则表中 make_rq 先于 claim_check，子串命中抢先
        let intent = IntentMatcher::new()
            .detect("check my claim: my rq is perfect")
            .unwrap();
        assert_eq!(intent.kind, IntentKind::MakeResearchQuestion);

        // 锚定的 set_topic 先于搜索型 make_outline
        let intent = IntentMatcher::new()
            .detect("set topic: outline of roman history")
            .unwrap();
        assert_eq!(intent.kind, IntentKind::SetTopic);
    }

    #[test]
    fn test_anchored_rules_reject_partial_match() {
        let matcher = IntentMatcher::new();
        assert!(matcher.detect("please help me").is_none());
        assert!(matcher.detect("show session now").is_none());
    }

    #[test]
    fn test_no_intent_for_free_text() {
        assert!(IntentMatcher::new()
            .detect("what counts as good evidence?")
            .is_none());
    }
}
