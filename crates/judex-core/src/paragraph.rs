//! Paragraph segmentation for judgment sections.
//!
//! Source texts break lines wherever the scraper saw a line break, which is
//! usually mid-sentence. A paragraph therefore keeps absorbing raw lines until
//! its trimmed content ends on a sentence terminal (`。！？」』)）`) or the
//! input runs out.
//!
//! Every raw line belongs to exactly one paragraph, in original order. A
//! paragraph is identified by the index of the raw line it starts on, which is
//! also the number summaries cite in their `refs`.

use std::str::Split;

/// Characters that close a sentence.
const TERMINALS: &[char] = &['。', '！', '？', '」', '』', ')', '）'];

/// A merged logical paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    /// Index of the first raw line.
    pub position: usize,
    /// Raw lines concatenated without a separator.
    pub content: String,
    /// Every raw line index absorbed, starting with `position`.
    pub line_ids: Vec<usize>,
}

impl Paragraph {
    /// True when the paragraph only holds whitespace (a vertical spacer).
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// True when raw line `line` was absorbed into this paragraph.
    pub fn covers(&self, line: usize) -> bool {
        self.line_ids.contains(&line)
    }
}

fn ends_sentence(content: &str) -> bool {
    content.trim_end().ends_with(TERMINALS)
}

/// Lazy paragraph iterator over raw text. Clone it to replay from the same
/// point.
#[derive(Clone)]
pub struct ParagraphIter<'a> {
    lines: std::iter::Enumerate<Split<'a, char>>,
}

impl Iterator for ParagraphIter<'_> {
    type Item = Paragraph;

    fn next(&mut self) -> Option<Paragraph> {
        let (position, first) = self.lines.next()?;
        let mut paragraph = Paragraph {
            position,
            content: first.to_string(),
            line_ids: vec![position],
        };

        // A blank line stands alone and never starts a look-ahead.
        if paragraph.is_blank() {
            return Some(paragraph);
        }

        while !ends_sentence(&paragraph.content) {
            let Some((idx, line)) = self.lines.next() else {
                break;
            };
            paragraph.content.push_str(line);
            paragraph.line_ids.push(idx);
        }
        Some(paragraph)
    }
}

/// Segment raw section text into paragraphs.
pub fn segment(text: &str) -> ParagraphIter<'_> {
    ParagraphIter {
        lines: text.split('\n').enumerate(),
    }
}

/// An ordered, fully materialised paragraph list for one section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraphs(Vec<Paragraph>);

impl Paragraphs {
    pub fn from_text(text: &str) -> Self {
        Self(segment(text).collect())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Paragraph> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Paragraphs whose trimmed content is non-empty.
    pub fn non_blank(&self) -> impl Iterator<Item = &Paragraph> {
        self.0.iter().filter(|p| !p.is_blank())
    }

    /// Find the paragraph that absorbed raw line `line`.
    ///
    /// Summaries cite raw line numbers; a line folded into an earlier
    /// paragraph resolves to that paragraph. Blank paragraphs never resolve.
    pub fn resolve(&self, line: usize) -> Option<&Paragraph> {
        self.0.iter().find(|p| p.covers(line)).filter(|p| !p.is_blank())
    }

    /// Render the `[position] content` block used in summarisation prompts.
    pub fn numbered(&self) -> String {
        self.non_blank()
            .map(|p| format!("[{}] {}", p.position, p.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> IntoIterator for &'a Paragraphs {
    type Item = &'a Paragraph;
    type IntoIter = std::slice::Iter<'a, Paragraph>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_ids(paragraphs: &Paragraphs) -> Vec<usize> {
        paragraphs.iter().flat_map(|p| p.line_ids.clone()).collect()
    }

    #[test]
    fn broken_sentence_is_merged() {
        let text = "原告起訴主張被告於民國九十年間\n侵害其權利。\n被告則以時效抗辯。";
        let paragraphs = Paragraphs::from_text(text);
        assert_eq!(paragraphs.len(), 2);

        let first = &paragraphs.iter().next().unwrap();
        assert_eq!(first.position, 0);
        assert_eq!(first.content, "原告起訴主張被告於民國九十年間侵害其權利。");
        assert_eq!(first.line_ids, vec![0, 1]);

        let second = paragraphs.iter().nth(1).unwrap();
        assert_eq!(second.position, 2);
        assert_eq!(second.line_ids, vec![2]);
    }

    #[test]
    fn every_line_covered_once_in_order() {
        let texts = [
            "",
            "\n\n",
            "一、\n程序方面\n\n二、實體方面：原告主張\n（略）\n結論。",
            "甲。\n乙\n丙！\n「丁」\n『戊』\n(己)\n庚",
            "尾行無句點\n",
        ];
        for text in texts {
            let paragraphs = Paragraphs::from_text(text);
            let expected: Vec<usize> = (0..text.split('\n').count()).collect();
            assert_eq!(flat_ids(&paragraphs), expected, "text: {text:?}");
        }
    }

    #[test]
    fn only_last_paragraph_may_end_unterminated() {
        let text = "第一段落未完\n  \n續寫\n完結。\n第二段\n仍未完";
        let paragraphs = Paragraphs::from_text(text);
        let count = paragraphs.len();
        for (i, p) in paragraphs.iter().enumerate() {
            if i + 1 < count && !p.is_blank() {
                assert!(ends_sentence(&p.content), "premature end: {:?}", p.content);
            }
        }
        let last = paragraphs.iter().last().unwrap();
        assert_eq!(last.content, "第二段仍未完");
    }

    #[test]
    fn blank_line_stands_alone() {
        let text = "第一段。\n\n第二段。";
        let paragraphs = Paragraphs::from_text(text);
        assert_eq!(paragraphs.len(), 3);
        let blank = paragraphs.iter().nth(1).unwrap();
        assert!(blank.is_blank());
        assert_eq!(blank.line_ids, vec![1]);
    }

    #[test]
    fn trailing_whitespace_does_not_hide_terminal() {
        let paragraphs = Paragraphs::from_text("本件上訴無理由。  \n應予駁回。");
        assert_eq!(paragraphs.len(), 2);
    }

    #[test]
    fn closing_brackets_terminate() {
        for closer in ["」", "』", ")", "）"] {
            let text = format!("引述{closer}\n下一行。");
            assert_eq!(Paragraphs::from_text(&text).len(), 2, "closer {closer}");
        }
    }

    #[test]
    fn resolve_finds_absorbing_paragraph() {
        let paragraphs = Paragraphs::from_text("甲乙\n丙丁。\n\n戊。");
        assert_eq!(paragraphs.resolve(1).map(|p| p.position), Some(0));
        assert_eq!(paragraphs.resolve(3).map(|p| p.position), Some(3));
        assert!(paragraphs.resolve(2).is_none(), "blank line never resolves");
        assert!(paragraphs.resolve(9).is_none());
    }

    #[test]
    fn numbered_block_skips_blank_paragraphs() {
        let paragraphs = Paragraphs::from_text("甲。\n\n乙。");
        assert_eq!(paragraphs.numbered(), "[0] 甲。\n[2] 乙。");
    }

    #[test]
    fn iterator_is_restartable() {
        let iter = segment("甲。\n乙。");
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
    }
}
