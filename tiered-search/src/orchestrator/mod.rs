//! Search orchestrator: mode dispatch, escalation, merge and dedup.
//!
//! [`TwoTierSearch`] runs the fast engine, asks the [`escalation`] policy
//! whether the deep engine is worth invoking, and combines both result
//! lists with [`merge::merge_dedupe`], keyed by [`url_key::canonical_key`].

pub mod escalation;
pub mod merge;
pub mod search;
pub mod url_key;

pub use escalation::{should_escalate, EscalationPolicy, EscalationReason};
pub use merge::{merge_dedupe, merge_tiers};
pub use search::TwoTierSearch;
pub use url_key::canonical_key;
