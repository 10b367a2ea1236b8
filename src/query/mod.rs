//! Query module: the record type stored in history, and the policy that
//! decides which executions become history entries.

pub mod policy;
pub mod types;

pub use policy::{check, is_first_appearance, is_present, query_length, should_save, Decline, MAX_QUERY_SIZE};
pub use types::QueryRecord;
