//! 知识库模块
//!
//! 提供内置知识库和外部 JSON 文件加载。知识库在进程启动时加载一次，
//! 之后作为只读语料供回退检索使用。

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::knowledge::KnowledgeItem;

/// 内置知识库
///
/// 面向学术写作辅导的十个短文档。
pub fn builtin() -> Vec<KnowledgeItem> {
    vec![
        KnowledgeItem::new(
            "rq_quality",
            "What makes a strong research question?",
            "A strong research question is specific, arguable, and researchable. \
             It should point to what you will compare/measure/explore. \
             If it\u{2019}s too broad, narrow it by time period, location, population, or a single variable.",
            &["research question", "scope", "specific", "measurable"],
        ),
        KnowledgeItem::new(
            "rq_templates",
            "Research question templates",
            "Useful frames: \
             1) To what extent does X affect Y in Z context? \
             2) How do different groups experience X? \
             3) What factors explain variation in Y? \
             4) What are the benefits/risks of X, and for whom?",
            &["templates", "to what extent", "experience", "benefits", "risks"],
        ),
        KnowledgeItem::new(
            "keywords",
            "How to generate keywords",
            "Start with 3\u{2013}6 core terms, then expand: synonyms, related concepts, narrower terms, and phrase variants. \
             Include UK/US spelling variants where relevant. Test searches early and adjust.",
            &["keywords", "synonyms", "search terms", "variants"],
        ),
        KnowledgeItem::new(
            "boolean",
            "Boolean searching (AND / OR / quotes / wildcard)",
            "AND narrows (must include both). OR expands (either). \
             Quotes lock phrases (\"social media\"). \
             Wildcard * can capture endings (educat* \u{2192} education, educational).",
            &["boolean", "and", "or", "quotes", "wildcard"],
        ),
        KnowledgeItem::new(
            "sources",
            "What counts as evidence?",
            "Match evidence type to your question. Quantitative studies help with measurable outcomes. \
             Interviews/qualitative work helps with experience and meaning. \
             Policy documents help with rules/institutions. Use multiple sources where possible.",
            &["evidence", "quantitative", "qualitative", "policy"],
        ),
        KnowledgeItem::new(
            "claims",
            "Avoiding weak claims",
            "Watch out for absolute words like 'always', 'never', 'proves', or 'everyone'. \
             Academic claims usually need conditions: 'in some contexts', 'the evidence suggests', \
             'for this population'. Then define what you mean and what evidence would support it.",
            &["claims", "hedging", "always", "never", "evidence suggests"],
        ),
        KnowledgeItem::new(
            "lit_review",
            "Literature review: what you\u{2019}re actually doing",
            "A literature review isn\u{2019}t a list of summaries. It groups sources by themes, debates, methods, \
             or findings. You\u{2019}re showing what\u{2019}s known, what\u{2019}s uncertain, and where your question fits.",
            &["literature review", "themes", "debates", "gap"],
        ),
        KnowledgeItem::new(
            "structure",
            "A reliable essay structure",
            "A common structure: Introduction (context + question + roadmap), \
             Key concepts/definitions, Literature/evidence, Discussion/argument, \
             Counterarguments/limitations, Conclusion (answer + implications).",
            &["structure", "outline", "introduction", "conclusion"],
        ),
        KnowledgeItem::new(
            "ethics",
            "Ethics and bias (quick checklist)",
            "Ask: Who benefits? Who might be harmed? What data is used? \
             Could there be bias in sampling, measurement, or interpretation? \
             Are there privacy/consent issues? Are certain groups excluded?",
            &["ethics", "bias", "privacy", "consent", "harm"],
        ),
        KnowledgeItem::new(
            "planning",
            "Planning: stop it becoming last-minute panic",
            "Break it into steps: choose question \u{2192} search \u{2192} skim and shortlist \u{2192} read properly \u{2192} outline \u{2192} draft \u{2192} edit. \
             If you have a deadline, work backwards and assign mini-deadlines.",
            &["planning", "draft", "outline", "deadline"],
        ),
    ]
}

/// 从 JSON 文件加载知识库
///
/// 文件格式为 KnowledgeItem 数组。加载失败属于启动期错误。
pub fn load_from_file(path: &Path) -> Result<Vec<KnowledgeItem>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::Knowledge(format!("{}: {}", path.display(), e)))?;
    let items: Vec<KnowledgeItem> = serde_json::from_str(&raw)
        .map_err(|e| AppError::Knowledge(format!("{}: {}", path.display(), e)))?;
    Ok(items)
}

/// 按配置加载知识库：优先外部文件，否则使用内置条目
pub fn load(path: Option<&Path>) -> Result<Vec<KnowledgeItem>> {
    match path {
        Some(p) => load_from_file(p),
        None => Ok(builtin()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_are_unique() {
        let items = builtin();
        let mut ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), items.len());
    }

    #[test]
    fn test_builtin_has_boolean_item() {
        let items = builtin();
        let item = items.iter().find(|i| i.id == "boolean").unwrap();
        assert!(item.title.contains("Boolean"));
        assert!(item.text.contains("Wildcard"));
    }

    #[test]
    fn test_load_without_path_uses_builtin() {
        let items = load(None).unwrap();
        assert_eq!(items.len(), 10);
    }

    #[test]
    fn test_load_from_missing_file_is_knowledge_error() {
        let err = load_from_file(Path::new("/nonexistent/kb.json")).unwrap_err();
        assert!(matches!(err, AppError::Knowledge(_)));
    }
}
