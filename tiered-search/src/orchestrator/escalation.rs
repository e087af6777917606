//! Heuristic deciding whether fast results justify a deep search.
//!
//! The policy only recommends; the orchestrator decides what to do with
//! the recommendation.

use std::collections::HashSet;
use std::fmt;

use chrono::Datelike;

use crate::types::SearchItem;

use super::url_key::host_key;

/// Titles shorter than this (after trimming) carry no information.
const MIN_TITLE_CHARS: usize = 4;

/// Never demand more than this many results before escalating.
const MIN_RESULTS_CEILING: usize = 3;

/// Single words that mark a query as time-sensitive.
const RECENCY_WORDS: &[&str] = &[
    "today",
    "tonight",
    "yesterday",
    "tomorrow",
    "now",
    "latest",
    "newest",
    "current",
    "currently",
    "recent",
    "recently",
    "breaking",
    "news",
    "live",
    "upcoming",
];

/// Multi-word phrases that mark a query as time-sensitive.
const RECENCY_PHRASES: &[&str] = &[
    "this week",
    "this month",
    "this year",
    "right now",
    "last night",
    "hôm nay",
    "hôm qua",
    "mới nhất",
    "hiện nay",
    "hiện tại",
    "tuần này",
    "tháng này",
    "năm nay",
];

/// Why the policy recommended escalation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationReason {
    /// Fewer results than `min(desired, 3)`.
    TooFewResults { found: usize, needed: usize },
    /// Every title is near-empty.
    DegenerateTitles,
    /// Results concentrate on too few hosts.
    LowDiversity { hosts: usize, items: usize },
    /// The query asks for something recent.
    RecencySignal(String),
}

impl fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewResults { found, needed } => {
                write!(f, "too few results ({found} < {needed})")
            }
            Self::DegenerateTitles => f.write_str("all titles degenerate"),
            Self::LowDiversity { hosts, items } => {
                write!(f, "low domain diversity ({hosts} hosts for {items} results)")
            }
            Self::RecencySignal(term) => write!(f, "recency signal '{term}'"),
        }
    }
}

/// Escalation rules, parameterised by the current year so that the
/// recency check is deterministic under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    current_year: i32,
}

impl EscalationPolicy {
    /// Policy using today's year from the local clock.
    pub fn for_today() -> Self {
        Self::for_year(chrono::Local::now().year())
    }

    pub fn for_year(current_year: i32) -> Self {
        Self { current_year }
    }

    /// The first rule that fires, or `None` when the fast results are good
    /// enough.
    ///
    /// Rules are checked in order: result count, title quality, domain
    /// diversity, then recency words or the current year in the query.
    pub fn evaluate(
        &self,
        query: &str,
        items: &[SearchItem],
        desired: usize,
    ) -> Option<EscalationReason> {
        let needed = desired.min(MIN_RESULTS_CEILING);
        if items.len() < needed {
            return Some(EscalationReason::TooFewResults {
                found: items.len(),
                needed,
            });
        }

        if !items.is_empty()
            && items
                .iter()
                .all(|item| item.title.trim().chars().count() < MIN_TITLE_CHARS)
        {
            return Some(EscalationReason::DegenerateTitles);
        }

        if !items.is_empty() {
            let hosts: HashSet<String> = items.iter().map(|item| host_key(&item.url)).collect();
            if hosts.len() <= items.len().div_ceil(3) {
                return Some(EscalationReason::LowDiversity {
                    hosts: hosts.len(),
                    items: items.len(),
                });
            }
        }

        self.recency_signal(query)
            .map(EscalationReason::RecencySignal)
    }

    /// Whether any rule fires.
    pub fn should_escalate(&self, query: &str, items: &[SearchItem], desired: usize) -> bool {
        self.evaluate(query, items, desired).is_some()
    }

    fn recency_signal(&self, query: &str) -> Option<String> {
        let lowered = query.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let year = self.current_year.to_string();
        if let Some(word) = words
            .iter()
            .find(|w| **w == year || RECENCY_WORDS.contains(*w))
        {
            return Some((*word).to_owned());
        }

        // Phrases match on word boundaries of the normalised query.
        let normalised = format!(" {} ", words.join(" "));
        RECENCY_PHRASES
            .iter()
            .find(|phrase| normalised.contains(&format!(" {phrase} ")))
            .map(|phrase| (*phrase).to_owned())
    }
}

/// Escalation check using today's policy.
///
/// # Examples
///
/// ```
/// use tiered_search::orchestrator::escalation::should_escalate;
///
/// assert!(should_escalate("rust traits", &[], 5));
/// ```
pub fn should_escalate(query: &str, items: &[SearchItem], desired: usize) -> bool {
    EscalationPolicy::for_today().should_escalate(query, items, desired)
}
