//! Verification block ("legal footer") extraction.
//!
//! The closing block of a judgment carries the issuing date, the issuing
//! court or committee, the signing personnel by role, the clerk, and a
//! proof-of-authenticity statement, typically run together on one or two
//! lines:
//!
//! ```text
//! 中華民國一百年一月一日 司法院 審判長法官王小明 法官李小華 書記官陳小美 正本證明與原本無異
//! ```
//!
//! A paragraph is a verification block only if it holds an era date **and**
//! either a role keyword or the proof statement. Prose that merely mentions a
//! date is left alone.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::minguo::{self, DateMatch};

static PROOF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"右?\s*正本證明與原本無異|以上正本證明與原本無異").expect("static proof pattern")
});

/// Characters that end a name: the proof statement (`右正本…`, `正本…`), the
/// era marker (`中華民國`), and whitespace.
fn is_landmark(c: char) -> bool {
    matches!(c, '右' | '正' | '中') || c.is_whitespace()
}

/// Leading characters left over from a role label the scan cut short.
const FRAGMENTS: &[char] = &['法', '評', '員', '委', '主'];

const MIN_NAME_CHARS: usize = 2;
const MAX_NAME_CHARS: usize = 4;

/// Signing roles, in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    /// 審判長法官
    PresidingJudge,
    /// 審判長評事
    PresidingAssessor,
    /// 主席委員
    PresidingCommissioner,
    /// 法院書記官
    CourtClerk,
    /// 審判長
    Presiding,
    /// 評議員
    CommitteeAssessor,
    /// 書記官
    Clerk,
    /// 法官
    Judge,
    /// 評事
    Assessor,
    /// 委員
    Commissioner,
    /// 主席
    Chair,
}

impl Role {
    /// Longest and most specific first, so `審判長法官` claims its span before
    /// `審判長` or `法官` can.
    pub const PRIORITY: [Role; 11] = [
        Role::PresidingJudge,
        Role::PresidingAssessor,
        Role::PresidingCommissioner,
        Role::CourtClerk,
        Role::Presiding,
        Role::CommitteeAssessor,
        Role::Clerk,
        Role::Judge,
        Role::Assessor,
        Role::Commissioner,
        Role::Chair,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::PresidingJudge => "審判長法官",
            Self::PresidingAssessor => "審判長評事",
            Self::PresidingCommissioner => "主席委員",
            Self::CourtClerk => "法院書記官",
            Self::Presiding => "審判長",
            Self::CommitteeAssessor => "評議員",
            Self::Clerk => "書記官",
            Self::Judge => "法官",
            Self::Assessor => "評事",
            Self::Commissioner => "委員",
            Self::Chair => "主席",
        }
    }

    pub fn is_clerk(&self) -> bool {
        self.label().contains("書記官")
    }
}

/// A named signatory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub role: Role,
    pub name: String,
}

/// A parsed verification block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct VerificationBlock {
    /// Issuing court or committee, when it sits between the date and the
    /// first accepted signatory.
    pub organization: Option<String>,
    /// Every era date, in text order.
    pub dates: Vec<DateMatch>,
    /// Judges, assessors, committee members and chairs.
    pub judges: Vec<Person>,
    pub clerks: Vec<Person>,
    pub proof: Option<String>,
}

impl VerificationBlock {
    /// Try to read `text` as a verification block.
    pub fn extract(text: &str) -> Option<Self> {
        let dates = minguo::find_dates(text);
        let proof = PROOF_RE.find(text).map(|m| m.as_str().trim().to_string());
        let roles = scan_roles(text);

        if dates.is_empty() || (roles.is_empty() && proof.is_none()) {
            return None;
        }

        let people = extract_people(text, &roles);
        let organization = match (dates.first(), people.first()) {
            (Some(date), Some((role_start, _))) if *role_start > date.span.end => {
                let between = text[date.span.end..*role_start].trim();
                (!between.is_empty()).then(|| between.to_string())
            }
            _ => None,
        };

        let (clerks, judges): (Vec<Person>, Vec<Person>) = people
            .into_iter()
            .map(|(_, person)| person)
            .partition(|p| p.role.is_clerk());

        Some(Self {
            organization,
            dates,
            judges,
            clerks,
            proof,
        })
    }

    /// The date of issue, verbatim.
    pub fn issued_on(&self) -> Option<&str> {
        self.dates.first().map(|d| d.text.as_str())
    }

    /// The last date when the block carries more than one.
    pub fn recorded_on(&self) -> Option<&str> {
        match self.dates.as_slice() {
            [_, .., last] => Some(last.text.as_str()),
            _ => None,
        }
    }

    pub fn issue_date(&self) -> Option<NaiveDate> {
        self.dates.first().and_then(DateMatch::to_date)
    }

    /// All signatories, judges first.
    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.judges.iter().chain(self.clerks.iter())
    }
}

#[derive(Debug, Clone)]
struct RoleMatch {
    role: Role,
    span: Range<usize>,
}

/// Every role occurrence, sorted by position. An occurrence starting inside a
/// span already claimed by a higher-priority role is dropped.
fn scan_roles(text: &str) -> Vec<RoleMatch> {
    let mut found: Vec<RoleMatch> = Vec::new();
    for role in Role::PRIORITY {
        let label = role.label();
        for (start, _) in text.match_indices(label) {
            if found.iter().any(|m| m.span.contains(&start)) {
                continue;
            }
            found.push(RoleMatch {
                role,
                span: start..start + label.len(),
            });
        }
    }
    found.sort_by_key(|m| m.span.start);
    found
}

/// Accepted signatories, each with the byte offset of its role keyword.
fn extract_people(text: &str, roles: &[RoleMatch]) -> Vec<(usize, Person)> {
    let mut people = Vec::new();
    for (i, current) in roles.iter().enumerate() {
        let start = current.span.end;
        let end = roles.get(i + 1).map_or(text.len(), |next| next.span.start);
        if end <= start {
            continue;
        }

        let tail = &text[start..end];
        let cut = tail.find(is_landmark).unwrap_or(tail.len());
        match clean_name(&tail[..cut]) {
            Some(name) => people.push((
                current.span.start,
                Person {
                    role: current.role,
                    name,
                },
            )),
            None => debug!(role = current.role.label(), raw = &tail[..cut], "discarded name"),
        }
    }
    people
}

/// Trim, drop one leftover role fragment, cap at four characters, and accept
/// only two to four characters.
fn clean_name(raw: &str) -> Option<String> {
    let mut name = raw.trim();
    if name.chars().count() > MIN_NAME_CHARS
        && let Some(rest) = name.strip_prefix(FRAGMENTS)
    {
        name = rest;
    }
    let name: String = name.chars().take(MAX_NAME_CHARS).collect();
    let name = name.trim();
    let len = name.chars().count();
    (MIN_NAME_CHARS..=MAX_NAME_CHARS)
        .contains(&len)
        .then(|| name.to_string())
}
