//! Bulk filter-to-promotion assignment: executor seam, retryable
//! workflow state machine, batched runs, and the active-run registry.

pub mod batch;
pub mod executor;
pub mod manager;
pub mod workflow;

pub use batch::{BulkRun, ItemStatus, RunItem, RunOutcome, RunStats};
pub use executor::{AssignmentExecutor, AssignmentOutcome, FailFirstExecutor, MockExecutor};
pub use manager::AssignmentRegistry;
pub use workflow::{AssignmentStatus, AssignmentWorkflow, StartOutcome};
