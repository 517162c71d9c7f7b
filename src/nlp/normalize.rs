//! 文本归一化
//!
//! 语料文档和查询必须走同一条归一化路径。

/// 归一化文本：小写化，字母数字以外的字符替换为空格，
/// 连续空白压缩为单个空格，去除首尾空白。
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mapped: String = lowered
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                ' '
            }
        })
        .collect();

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_strips() {
        assert_eq!(normalize("Hello, World!"), "hello world");
        assert_eq!(normalize("AND / OR / quotes"), "and or quotes");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  a\t\tb \n c  "), "a b c");
    }

    #[test]
    fn test_normalize_keeps_digits() {
        assert_eq!(normalize("Top-10 results (2024)"), "top 10 results 2024");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in [
            "Boolean AND OR quotes wildcard",
            "  Météo: déjà-vu!  ",
            "research   question??",
            "",
        ] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!!"), "");
    }
}
