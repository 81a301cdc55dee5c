//! Query-time matching: index, ranking service and skill gaps

pub mod gap;
pub mod index;
pub mod service;

pub use gap::{analyze_gap, SkillGap};
pub use index::MatchIndex;
pub use service::{MatchService, MatchSnapshot, RankedResult};
