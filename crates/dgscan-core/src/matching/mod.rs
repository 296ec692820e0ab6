pub mod details;
pub mod flags;
pub mod matcher;
pub mod normalize;
pub mod outcome;

pub use details::extract_details;
pub use flags::{regulatory_flags, RegulatoryFlag};
pub use matcher::{find_unmatched_entries, match_segments, MatcherOptions};
pub use outcome::{
    KeywordCluster, LineItemDetails, MatchCandidate, MatchKind, MatchSource, Quantity,
    UnmatchedEntry,
};
