//! Tri-state selection over the partner tree, progressive reveal, and
//! the read-only selection summary.

pub mod expand;
pub mod model;
pub mod reveal;
pub mod summary;

pub use expand::ExpansionState;
pub use model::SelectionModel;
pub use reveal::{LoadOutcome, RevealState};
pub use summary::{project, SelectionCounts, SelectionSummary};
