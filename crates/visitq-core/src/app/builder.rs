//! AppBuilder - wires ports into a runnable service.
//!
//! `build()` checks the wiring up front (fail-fast): a missing collaborator,
//! an empty device catalog or a zero-capacity pool is a startup error, not a
//! runtime surprise on the first claimed item.
//!
//! ```ignore
//! let app = AppBuilder::new()
//!     .store(Arc::new(InMemoryStore::new(ids, clock)))
//!     .resolver(Arc::new(my_resolver))
//!     .messenger(Arc::new(LogMessenger))
//!     .directory(Arc::new(directory))
//!     .devices(DeviceCatalog::load(&cfg.devices.catalog)?)
//!     .configure(&cfg)?
//!     .build()?;
//! let handle = Arc::clone(&app.scheduler).spawn();
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::app::intake::Intake;
use crate::app::notifier::NotificationDispatcher;
use crate::app::orchestrator::ResolutionOrchestrator;
use crate::app::permits::{DEFAULT_PERMITS, PermitPool};
use crate::app::planner::TransitionTimePlanner;
use crate::app::reaper::{ReclaimPolicy, Reaper};
use crate::app::scheduler::{DEFAULT_TICK_INTERVAL, Scheduler};
use crate::config::{Config, ConfigError};
use crate::domain::StoreError;
use crate::impls::DeviceCatalog;
use crate::observability::QueueCounts;
use crate::ports::{
    Clock, EventLog, IdGenerator, Messenger, OwnerDirectory, QueueStore, Resolver, SystemClock,
    UlidGenerator,
};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing component: {0}")]
    MissingComponent(&'static str),

    #[error("device catalog is empty")]
    EmptyDeviceCatalog,

    #[error("permit pool capacity must be greater than zero")]
    ZeroPermits,

    #[error("tick interval must be greater than zero")]
    ZeroInterval,
}

pub struct AppBuilder {
    store: Option<Arc<dyn QueueStore>>,
    events: Option<Arc<dyn EventLog>>,
    resolver: Option<Arc<dyn Resolver>>,
    messenger: Option<Arc<dyn Messenger>>,
    directory: Option<Arc<dyn OwnerDirectory>>,
    devices: Option<DeviceCatalog>,
    clock: Arc<dyn Clock>,
    ids: Option<Arc<dyn IdGenerator>>,
    permits: usize,
    interval: Duration,
    reclaim: ReclaimPolicy,
    planner: TransitionTimePlanner,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            events: None,
            resolver: None,
            messenger: None,
            directory: None,
            devices: None,
            clock: Arc::new(SystemClock),
            ids: None,
            permits: DEFAULT_PERMITS,
            interval: DEFAULT_TICK_INTERVAL,
            reclaim: ReclaimPolicy::disabled(),
            planner: TransitionTimePlanner::default(),
        }
    }

    /// One backend serving as both the queue store and the event log.
    pub fn store<S>(mut self, store: Arc<S>) -> Self
    where
        S: QueueStore + EventLog + 'static,
    {
        self.store = Some(store.clone());
        self.events = Some(store);
        self
    }

    pub fn queue_store(mut self, store: Arc<dyn QueueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn event_log(mut self, events: Arc<dyn EventLog>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn messenger(mut self, messenger: Arc<dyn Messenger>) -> Self {
        self.messenger = Some(messenger);
        self
    }

    pub fn directory(mut self, directory: Arc<dyn OwnerDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn devices(mut self, devices: DeviceCatalog) -> Self {
        self.devices = Some(devices);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Defaults to a `UlidGenerator` on the builder's clock.
    pub fn ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn permits(mut self, permits: usize) -> Self {
        self.permits = permits;
        self
    }

    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn reclaim(mut self, policy: ReclaimPolicy) -> Self {
        self.reclaim = policy;
        self
    }

    pub fn planner(mut self, planner: TransitionTimePlanner) -> Self {
        self.planner = planner;
        self
    }

    /// Apply the tunables of a loaded config file.
    pub fn configure(self, cfg: &Config) -> Result<Self, ConfigError> {
        let planner = cfg.planner()?;
        Ok(self
            .permits(cfg.resolver.permits)
            .tick_interval(cfg.tick_interval())
            .reclaim(cfg.reclaim_policy())
            .planner(planner))
    }

    pub fn build(self) -> Result<App, BuildError> {
        let store = self.store.ok_or(BuildError::MissingComponent("queue store"))?;
        let events = self.events.ok_or(BuildError::MissingComponent("event log"))?;
        let resolver = self.resolver.ok_or(BuildError::MissingComponent("resolver"))?;
        let messenger = self.messenger.ok_or(BuildError::MissingComponent("messenger"))?;
        let directory = self
            .directory
            .ok_or(BuildError::MissingComponent("owner directory"))?;
        let devices = self
            .devices
            .ok_or(BuildError::MissingComponent("device catalog"))?;
        if devices.is_empty() {
            return Err(BuildError::EmptyDeviceCatalog);
        }
        if self.permits == 0 {
            return Err(BuildError::ZeroPermits);
        }
        if self.interval.is_zero() {
            return Err(BuildError::ZeroInterval);
        }

        let clock = self.clock;
        let ids: Arc<dyn IdGenerator> = match self.ids {
            Some(ids) => ids,
            None => Arc::new(UlidGenerator::new(Arc::clone(&clock))),
        };

        let notifier = NotificationDispatcher::new(
            Arc::clone(&directory),
            Arc::clone(&events),
            messenger,
        );
        let orchestrator = Arc::new(ResolutionOrchestrator::new(
            Arc::clone(&store),
            resolver,
            Arc::new(devices),
            PermitPool::new(self.permits),
            Arc::clone(&ids),
            Arc::clone(&clock),
            notifier,
        ));
        let reaper = Reaper::new(Arc::clone(&store), Arc::clone(&clock), self.reclaim);
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&store),
            Arc::clone(&orchestrator),
            reaper,
            Arc::clone(&clock),
            self.interval,
        ));
        let intake = Intake::new(
            Arc::clone(&store),
            Arc::clone(&events),
            directory,
            self.planner,
            ids,
            clock,
        );

        Ok(App {
            scheduler,
            orchestrator,
            intake,
            store,
            events,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A wired service. Start it with `Arc::clone(&app.scheduler).spawn()`.
#[derive(Clone)]
pub struct App {
    pub scheduler: Arc<Scheduler>,
    pub orchestrator: Arc<ResolutionOrchestrator>,
    pub intake: Intake,
    pub store: Arc<dyn QueueStore>,
    pub events: Arc<dyn EventLog>,
}

impl App {
    pub async fn counts(&self) -> Result<QueueCounts, StoreError> {
        self.store.counts_by_status().await
    }
}
