//! Republic of China (Minguo) era dates.
//!
//! Judgments are dated `中華民國<year>年<month>月<day>日` where each component
//! may be written in Arabic, full-width, or Chinese numerals, e.g.
//! `中華民國一百十一年三月五日`, `中華民國一一〇年 ３ 月 5 日`. ROC year 1 is 1912.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

const ROC_EPOCH_OFFSET: i32 = 1911;

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let numerals = r"[0-9０-９〇○零一二三四五六七八九十百\s]+";
    Regex::new(&format!(
        r"中華民國\s*({numerals})年\s*({numerals})月\s*({numerals})日"
    ))
    .expect("static date pattern")
});

/// One era date found in free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateMatch {
    /// The matched text, verbatim.
    pub text: String,
    /// Byte range of the match in the searched text.
    pub span: Range<usize>,
}

impl DateMatch {
    /// Convert to a Gregorian calendar date, if the components are valid.
    pub fn to_date(&self) -> Option<NaiveDate> {
        parse(&self.text)
    }
}

/// All era dates in `text`, left to right.
pub fn find_dates(text: &str) -> Vec<DateMatch> {
    DATE_RE
        .find_iter(text)
        .map(|m| DateMatch {
            text: m.as_str().to_string(),
            span: m.range(),
        })
        .collect()
}

/// Parse the first era date in `text` into a Gregorian date.
pub fn parse(text: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(text)?;
    let year = i32::try_from(numeral_value(&caps[1])?)
        .ok()?
        .checked_add(ROC_EPOCH_OFFSET)?;
    let month = numeral_value(&caps[2])?;
    let day = numeral_value(&caps[3])?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn digit_value(c: char) -> Option<u32> {
    match c {
        '0'..='9' => c.to_digit(10),
        '０'..='９' => Some(c as u32 - '０' as u32),
        '〇' | '○' | '零' => Some(0),
        '一' => Some(1),
        '二' => Some(2),
        '三' => Some(3),
        '四' => Some(4),
        '五' => Some(5),
        '六' => Some(6),
        '七' => Some(7),
        '八' => Some(8),
        '九' => Some(9),
        _ => None,
    }
}

/// Value of a numeral run. Runs containing `十`/`百` are read as counted
/// numbers (`一百零五` = 105); anything else is read digit by digit
/// (`一一〇` = 110, `１０` = 10).
fn numeral_value(raw: &str) -> Option<u32> {
    let chars: Vec<char> = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if chars.is_empty() {
        return None;
    }

    if chars.iter().any(|&c| c == '十' || c == '百') {
        let mut total: u32 = 0;
        let mut pending = 0;
        for c in chars {
            match c {
                '十' => {
                    total = total.checked_add(pending.max(1) * 10)?;
                    pending = 0;
                }
                '百' => {
                    total = total.checked_add(pending.max(1) * 100)?;
                    pending = 0;
                }
                _ => pending = digit_value(c)?,
            }
        }
        return total.checked_add(pending);
    }

    chars.into_iter().try_fold(0u32, |acc, c| {
        acc.checked_mul(10)?.checked_add(digit_value(c)?)
    })
}
