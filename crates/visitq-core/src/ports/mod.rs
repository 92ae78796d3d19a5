//! Ports - abstraction layer.
//!
//! Each trait is the seam to something outside the core: storage, the
//! resolver, the chat platform, user management and time.

pub mod clock;
pub mod event_log;
pub mod id_generator;
pub mod messenger;
pub mod owner_directory;
pub mod queue_store;
pub mod resolver;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_log::EventLog;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::messenger::Messenger;
pub use self::owner_directory::OwnerDirectory;
pub use self::queue_store::{Committed, QueueStore};
pub use self::resolver::{BlockingResolver, Resolution, Resolver};
