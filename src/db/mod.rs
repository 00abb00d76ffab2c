//! Database layer (Firestore, plus an in-memory backend).

pub mod memory;
pub mod store;

pub use store::{RecordStore, WriteOp};

/// Collection names as constants.
pub mod collections {
    pub const ACTIVITIES: &str = "activities";
    /// Operator-edited athlete display metadata (keyed by identity key)
    pub const ATHLETE_META: &str = "athlete_meta";
    /// Leaderboard summary rows (keyed by identity key)
    pub const SUMMARIES: &str = "summaries";
}
