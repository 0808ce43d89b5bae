//! Continuous ingestion
//!
//! An ingestion loop owns one domain's sliding window. Every round it fetches
//! all catalog entities concurrently, appends the readings in catalog order,
//! republishes the window to the domain's sink and sleeps. The supervisor runs
//! several loops side by side and restarts bounded ones if asked to.

mod r#loop;
mod supervisor;


pub use r#loop::{
    FailurePolicy, IngestionConfig, IngestionLoop, IngestionLoopBuilder, LoopState, LoopSummary,
    RoundReport,
};
pub use supervisor::{IngestionSupervisor, RestartPolicy, SupervisorHandle};
