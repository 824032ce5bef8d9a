//! Party preamble extraction.
//!
//! The preamble section lists litigants one per line, each line opening with
//! a role label that is often spaced out for alignment (`原　　告`, `上 訴 人`).
//! Lines that open with a known label become [`Party`] entries; every other
//! non-empty line is kept, in order, as narrative.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Which side of the case a party stands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PartySide {
    /// Plaintiff, appellant, petitioner.
    Initiating,
    /// Defendant, appellee, respondent.
    Responding,
    /// Representatives, counsel, intervenors.
    Supporting,
}

const LABELS: &[(&str, PartySide)] = &[
    ("原告", PartySide::Initiating),
    ("上訴人", PartySide::Initiating),
    ("聲請人", PartySide::Initiating),
    ("再審原告", PartySide::Initiating),
    ("抗告人", PartySide::Initiating),
    ("被告", PartySide::Responding),
    ("被上訴人", PartySide::Responding),
    ("相對人", PartySide::Responding),
    ("再審被告", PartySide::Responding),
    ("代表人", PartySide::Supporting),
    ("法定代理人", PartySide::Supporting),
    ("訴訟代理人", PartySide::Supporting),
    ("辯護人", PartySide::Supporting),
    ("參加人", PartySide::Supporting),
    ("輔佐人", PartySide::Supporting),
];

/// `^\s*(原\s*告|上\s*訴\s*人|...)`, longest labels first.
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    let mut labels: Vec<&str> = LABELS.iter().map(|(label, _)| *label).collect();
    labels.sort_by_key(|label| std::cmp::Reverse(label.chars().count()));
    let alternation = labels
        .iter()
        .map(|label| {
            label
                .chars()
                .map(|c| regex::escape(&c.to_string()))
                .collect::<Vec<_>>()
                .join(r"\s*")
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"^\s*({alternation})")).expect("static party label pattern")
});

/// One litigant line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Party {
    /// Role label with alignment spacing removed, e.g. `上訴人`.
    pub role: String,
    pub side: PartySide,
    /// The rest of the line: name, representation, counsel, verbatim.
    pub description: String,
}

/// A parsed preamble.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preface {
    pub parties: Vec<Party>,
    pub narrative: Vec<String>,
}

impl Preface {
    pub fn extract(text: &str) -> Self {
        let body = text.trim_start();
        let body = body.strip_prefix("前置").unwrap_or(body);

        let mut preface = Self::default();
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            match parse_party(line) {
                Some(party) => preface.parties.push(party),
                None => preface.narrative.push(line.to_string()),
            }
        }
        preface
    }

    pub fn is_empty(&self) -> bool {
        self.parties.is_empty() && self.narrative.is_empty()
    }
}

fn parse_party(line: &str) -> Option<Party> {
    let caps = LABEL_RE.captures(line)?;
    let label = caps.get(1)?;
    let role: String = label.as_str().chars().filter(|c| !c.is_whitespace()).collect();
    let side = LABELS
        .iter()
        .find(|(known, _)| *known == role)
        .map(|(_, side)| *side)?;
    Some(Party {
        role,
        side,
        description: line[label.end()..].trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREAMBLE: &str = "前置\n上 訴 人　王大明\n訴訟代理人　李律師\n被上訴人　國家安全局\n代 表 人　陳局長\n\n上列當事人間請求回復名譽事件，上訴人對於中華民國一百年一月一日判決提起上訴，本院判決如下：";

    #[test]
    fn parties_and_narrative() {
        let preface = Preface::extract(PREAMBLE);
        let roles: Vec<(&str, PartySide, &str)> = preface
            .parties
            .iter()
            .map(|p| (p.role.as_str(), p.side, p.description.as_str()))
            .collect();
        assert_eq!(
            roles,
            vec![
                ("上訴人", PartySide::Initiating, "王大明"),
                ("訴訟代理人", PartySide::Supporting, "李律師"),
                ("被上訴人", PartySide::Responding, "國家安全局"),
                ("代表人", PartySide::Supporting, "陳局長"),
            ]
        );
        assert_eq!(preface.narrative.len(), 1);
        assert!(preface.narrative[0].starts_with("上列當事人間"));
    }

    #[test]
    fn every_non_empty_line_is_kept_once() {
        let text = "原　　告　甲\n說明文字一\n被　　告　乙\n\n說明文字二\n聲請人丙\n相對人 丁";
        let preface = Preface::extract(text);
        let non_empty = text.lines().filter(|l| !l.trim().is_empty()).count();
        assert_eq!(preface.parties.len() + preface.narrative.len(), non_empty);
        assert_eq!(preface.narrative, vec!["說明文字一", "說明文字二"]);
    }

    #[test]
    fn longer_label_wins() {
        let preface = Preface::extract("再審原告 張三\n再 審 被 告 李四");
        assert_eq!(preface.parties[0].role, "再審原告");
        assert_eq!(preface.parties[1].role, "再審被告");
        assert_eq!(preface.parties[1].side, PartySide::Responding);
    }

    #[test]
    fn label_must_open_the_line() {
        let preface = Preface::extract("本件原告起訴主張");
        assert!(preface.parties.is_empty());
        assert_eq!(preface.narrative, vec!["本件原告起訴主張"]);
    }

    #[test]
    fn description_is_verbatim() {
        let preface = Preface::extract("原告 財團法人某某基金會（設臺北市）");
        assert_eq!(preface.parties[0].description, "財團法人某某基金會（設臺北市）");
    }

    #[test]
    fn empty_input() {
        assert!(Preface::extract("").is_empty());
        assert!(Preface::extract("前置\n \n").is_empty());
    }
}
