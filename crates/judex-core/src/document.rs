//! The judgment document record as it is persisted in the store.
//!
//! Field names follow the snapshot format. Fields this crate does not model
//! are carried in `extra` maps so a load/save cycle never drops data.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::paragraph::{Paragraph, Paragraphs};

/// Section title of the operative text.
pub const MAIN_TEXT_TITLE: &str = "主文";
/// Title given to a facts block split out of the operative text.
pub const FACTS_TITLE: &str = "事實";

static FACTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\n?\s*(事實(?:緣)?.*)").expect("static facts pattern"));

/// Case identity and citation fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseMeta {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court: Option<String>,
    /// Decision date as written, e.g. `中華民國一百年一月一日`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_minguo: Option<String>,
    /// Sortable decision date, `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_iso: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalised classification fields used for browsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court_normalized: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_normalized: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judgment_type_normalized: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One point of a generated summary, citing paragraph positions of the
/// reasoning section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub point: String,
    #[serde(default)]
    pub refs: Vec<usize>,
}

impl SummaryEntry {
    /// Entries with a blank point are kept in storage but never shown.
    pub fn is_valid(&self) -> bool {
        !self.point.trim().is_empty()
    }

    /// Cited paragraphs that resolve to non-blank content, in citation order.
    pub fn resolve_refs<'a>(&self, paragraphs: &'a Paragraphs) -> Vec<&'a Paragraph> {
        self.refs
            .iter()
            .filter_map(|&r| paragraphs.resolve(r))
            .collect()
    }
}

/// Section title to raw text, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections(Vec<(String, String)>);

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section, or replace the text of an existing title in place.
    pub fn insert(&mut self, title: impl Into<String>, text: impl Into<String>) {
        let title = title.into();
        let text = text.into();
        match self.0.iter_mut().find(|(t, _)| *t == title) {
            Some((_, existing)) => *existing = text,
            None => self.0.push((title, text)),
        }
    }

    pub fn get(&self, title: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(t, _)| t == title)
            .map(|(_, text)| text.as_str())
    }

    /// First section whose title contains `marker`.
    pub fn find_containing(&self, marker: &str) -> Option<(&str, &str)> {
        self.0
            .iter()
            .find(|(t, _)| t.contains(marker))
            .map(|(t, text)| (t.as_str(), text.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(t, text)| (t.as_str(), text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Into<String>, U: Into<String>> FromIterator<(T, U)> for Sections {
    fn from_iter<I: IntoIterator<Item = (T, U)>>(iter: I) -> Self {
        let mut sections = Self::new();
        for (title, text) in iter {
            sections.insert(title, text);
        }
        sections
    }
}

impl Serialize for Sections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (title, text) in &self.0 {
            map.serialize_entry(title, text)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Sections {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SectionsVisitor;

        impl<'de> Visitor<'de> for SectionsVisitor {
            type Value = Sections;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of section title to text")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Sections, A::Error> {
                let mut sections = Sections::new();
                while let Some((title, text)) = access.next_entry::<String, String>()? {
                    sections.insert(title, text);
                }
                Ok(sections)
            }
        }

        deserializer.deserialize_map(SectionsVisitor)
    }
}

/// One judgment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub meta: CaseMeta,
    #[serde(default)]
    pub analysis_meta: AnalysisMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_result: Option<String>,
    /// Operative text with markup removed; trigger keywords are matched here.
    #[serde(default)]
    pub main_text_clean: String,
    #[serde(default)]
    pub sections: Sections,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_laws: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<Vec<SummaryEntry>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn has_summary(&self) -> bool {
        self.ai_summary.is_some()
    }

    /// Unsummarised and mentioning at least one trigger keyword.
    pub fn is_eligible<S: AsRef<str>>(&self, keywords: &[S]) -> bool {
        !self.has_summary()
            && keywords
                .iter()
                .any(|k| self.main_text_clean.contains(k.as_ref()))
    }

    /// The reasoning section: the first whose title contains `marker`.
    pub fn reasoning_section(&self, marker: &str) -> Option<(&str, &str)> {
        self.sections.find_containing(marker)
    }

    /// Summary entries fit for display.
    pub fn visible_summary(&self) -> impl Iterator<Item = &SummaryEntry> {
        self.ai_summary
            .iter()
            .flatten()
            .filter(|entry| entry.is_valid())
    }

    /// The first visible summary point.
    pub fn headline(&self) -> Option<&str> {
        self.visible_summary().next().map(|e| e.point.as_str())
    }

    pub fn category(&self) -> Option<&str> {
        self.analysis_meta.category_normalized.as_deref()
    }

    /// Sections as they should be read. A `主文` section that swallowed the
    /// facts block is split into `主文` and `事實`; an operative part left
    /// empty by the split is omitted.
    pub fn display_sections(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.sections.len() + 1);
        for (title, text) in self.sections.iter() {
            if title == MAIN_TEXT_TITLE
                && (text.contains("事實緣") || text.contains("\n事實"))
                && let Some(caps) = FACTS_RE.captures(text)
                && let (Some(whole), Some(facts)) = (caps.get(0), caps.get(1))
            {
                let main = format!("{}{}", &text[..whole.start()], &text[whole.end()..]);
                let main = main.trim();
                if !main.is_empty() {
                    out.push((MAIN_TEXT_TITLE.to_string(), main.to_string()));
                }
                out.push((FACTS_TITLE.to_string(), facts.as_str().trim().to_string()));
                continue;
            }
            out.push((title.to_string(), text.to_string()));
        }
        out
    }
}
