//! Domain model (IDs, queue items, events, attempts, devices, owners).

pub mod attempt;
pub mod device;
pub mod errors;
pub mod event;
pub mod ids;
pub mod owner;
pub mod queue_item;

pub use attempt::{ProxyAttempt, ProxyAttemptLog};
pub use device::DeviceProfile;
pub use errors::{ConflictReason, DirectoryError, MessagingError, ResolveError, StoreError};
pub use event::{Event, EventOutcome};
pub use ids::{AttemptGroupId, EventId, MessageRef, OwnerId, QueueItemId};
pub use owner::{NotifyMode, Owner, Role, TransitionMode};
pub use queue_item::{QueueItem, QueueStatus};
