use judex_core::{Paragraphs, SummaryEntry};
use serde_json::Value;

use crate::ContentError;

const INSTRUCTIONS: &str = "\
你是一位專業的法律助理。請根據下列法院判決「理由」段落，整理一份重點摘要。
規則：
1. 以列點方式說明本案的關鍵爭點、法院的判斷理由與最終結論。
2. 每一個摘要點都必須引用支持該論點的段落編號，格式為 [ref:段落編號]。
3. 只回傳純 JSON 陣列，不要加上 markdown 標記，也不要任何說明文字。格式範例：
[
    { \"point\": \"原告主張...\", \"refs\": [0, 2] },
    { \"point\": \"法院認為...\", \"refs\": [5] }
]

判決文本如下：
";

/// Build the summarisation prompt, or `None` when the section has no
/// non-blank paragraph to cite.
pub fn build_prompt(paragraphs: &Paragraphs) -> Option<String> {
    if paragraphs.non_blank().next().is_none() {
        return None;
    }
    Some(format!("{INSTRUCTIONS}{}", paragraphs.numbered()))
}

/// Remove every markdown code-fence marker the model adds despite being told
/// not to, wherever it appears.
pub fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse generated text into summary entries.
///
/// Entries are kept as generated, including any with a blank point; those are
/// hidden at display time.
pub fn parse_summary(raw: &str) -> Result<Vec<SummaryEntry>, ContentError> {
    let text = strip_fences(raw);
    let unparsable = |source| ContentError::UnparsableJson {
        source,
        raw: text.to_string(),
    };
    let value: Value = serde_json::from_str(&text).map_err(unparsable)?;
    if !value.is_array() {
        return Err(ContentError::NotAnArray);
    }
    serde_json::from_value(value).map_err(unparsable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_numbers_merged_paragraphs_by_first_line() {
        let paragraphs = Paragraphs::from_text("一、原告主張被告\n侵害其名譽。\n\n二、本院判斷。");
        let prompt = build_prompt(&paragraphs).unwrap();
        assert!(prompt.starts_with("你是一位專業的法律助理"));
        assert!(prompt.contains("[ref:段落編號]"));
        assert!(prompt.ends_with("[0] 一、原告主張被告侵害其名譽。\n[3] 二、本院判斷。"));
    }

    #[test]
    fn blank_section_has_no_prompt() {
        assert!(build_prompt(&Paragraphs::from_text("  \n\n")).is_none());
        assert!(build_prompt(&Paragraphs::from_text("")).is_none());
    }

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_fences("```\n[1]\n```\n"), "[1]");
        assert_eq!(strip_fences("  [1]  "), "[1]");
    }

    #[test]
    fn every_fence_marker_is_removed() {
        assert_eq!(strip_fences("```json\n[1,\n```\n2]\n```"), "[1,\n\n2]");
        assert_eq!(strip_fences("```json```json[1]``````"), "[1]");
        let preamble = "摘要如下：\n```json\n[1]\n```";
        assert_eq!(strip_fences(preamble), "摘要如下：\n\n[1]");
        assert!(matches!(
            parse_summary(preamble),
            Err(ContentError::UnparsableJson { .. })
        ));
    }

    #[test]
    fn parses_entries_verbatim() {
        let raw = "```json\n[{\"point\":\"法院認定侵權成立\",\"refs\":[0,1]},{\"point\":\"  \",\"refs\":[]}]\n```";
        let entries = parse_summary(raw).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].point, "法院認定侵權成立");
        assert_eq!(entries[0].refs, vec![0, 1]);
        assert!(!entries[1].is_valid());
    }

    #[test]
    fn missing_refs_default_to_empty() {
        let entries = parse_summary(r#"[{"point":"結論"}]"#).unwrap();
        assert!(entries[0].refs.is_empty());
    }

    #[test]
    fn malformed_json_keeps_raw_text() {
        let err = parse_summary("以下是摘要：[{\"point\":").unwrap_err();
        match err {
            ContentError::UnparsableJson { raw, .. } => assert!(raw.starts_with("以下是摘要")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn object_is_not_a_summary() {
        let err = parse_summary(r#"{"point":"x","refs":[]}"#).unwrap_err();
        assert!(matches!(err, ContentError::NotAnArray));
    }

    #[test]
    fn wrong_entry_shape_is_unparsable() {
        let err = parse_summary(r#"[{"point":"x","refs":["a"]}]"#).unwrap_err();
        assert!(matches!(err, ContentError::UnparsableJson { .. }));
    }
}
