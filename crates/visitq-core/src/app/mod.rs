//! App - the service's moving parts.
//!
//! - `intake`: chat message -> queue item (or a rejection event)
//! - `planner`: scheduled time for a new item
//! - `scheduler`: periodic claim of due items
//! - `reaper`: optional return of stale claims to the pending pool
//! - `orchestrator`: one claimed item -> resolver -> committed outcome
//! - `permits`: bound on concurrent resolver calls
//! - `notifier`: outcome -> owner message
//! - `builder`: wiring

pub mod builder;
pub mod intake;
pub mod notifier;
pub mod orchestrator;
pub mod permits;
pub mod planner;
pub mod reaper;
pub mod scheduler;

pub use builder::{App, AppBuilder, BuildError};
pub use intake::{Intake, IntakeError, Submission, extract_links};
pub use notifier::{Dispatch, NotificationDispatcher};
pub use orchestrator::{Completion, OrchestratorError, ResolutionOrchestrator};
pub use permits::{DEFAULT_PERMITS, Permit, PermitPool, PoolClosed};
pub use planner::{TransitionTimePlanner, Window};
pub use reaper::{Reaper, ReclaimPolicy};
pub use scheduler::{DEFAULT_TICK_INTERVAL, Scheduler, SchedulerHandle, TickReport};
