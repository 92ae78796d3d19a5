//! ResolutionOrchestrator - resolves one claimed queue item.
//!
//! # Flow
//! 1. Draw a device profile uniformly from the catalog.
//! 2. Acquire a permit from the shared pool.
//! 3. Call the resolver.
//! 4. Classify the result (`success` / `proxy_error` / `redirector_error`).
//! 5. Commit the event, the attempt rows and the terminal item together;
//!    the commit also reports how many items the owner still has open.
//! 6. Release the permit (RAII, on every exit path).
//! 7. Hand the completion to the notification dispatcher.
//!
//! Nothing is retried here. Retrying proxies is the resolver's job; a failed
//! resolution is terminal for the queue.

use std::sync::Arc;

use crate::app::notifier::{Dispatch, NotificationDispatcher};
use crate::app::permits::{PermitPool, PoolClosed};
use crate::domain::{
    AttemptGroupId, DeviceProfile, Event, EventOutcome, ProxyAttempt, ProxyAttemptLog, QueueItem,
    ResolveError, StoreError,
};
use crate::impls::DeviceCatalog;
use crate::ports::{Clock, Committed, IdGenerator, QueueStore, Resolution, Resolver};

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("device catalog is empty")]
    NoDevices,

    #[error(transparent)]
    PoolClosed(#[from] PoolClosed),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of one processed item.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The item in its terminal representation.
    pub item: QueueItem,
    pub event: Event,
    pub dispatch: Dispatch,
}

pub struct ResolutionOrchestrator {
    store: Arc<dyn QueueStore>,
    resolver: Arc<dyn Resolver>,
    devices: Arc<DeviceCatalog>,
    permits: PermitPool,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    notifier: NotificationDispatcher,
}

impl ResolutionOrchestrator {
    pub fn new(
        store: Arc<dyn QueueStore>,
        resolver: Arc<dyn Resolver>,
        devices: Arc<DeviceCatalog>,
        permits: PermitPool,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            resolver,
            devices,
            permits,
            ids,
            clock,
            notifier,
        }
    }

    pub fn permits(&self) -> &PermitPool {
        &self.permits
    }

    pub async fn process(&self, item: QueueItem) -> Result<Completion, OrchestratorError> {
        let device = self.draw_device()?;
        let group = self.ids.generate_attempt_group_id();
        tracing::debug!(item = %item.id, device = device.id, %group, "resolving");

        let (Committed { item, open_after }, event) = {
            let _permit = self.permits.acquire().await?;
            let result = self.resolver.resolve(&item.url, &device).await;
            self.commit(item, &device, group, result).await?
        };

        let dispatch = self.notifier.notify(&event, &item, open_after).await;
        Ok(Completion {
            item,
            event,
            dispatch,
        })
    }

    fn draw_device(&self) -> Result<DeviceProfile, OrchestratorError> {
        let mut rng = rand::thread_rng();
        self.devices
            .choose(&mut rng)
            .cloned()
            .ok_or(OrchestratorError::NoDevices)
    }

    async fn commit(
        &self,
        item: QueueItem,
        device: &DeviceProfile,
        group: AttemptGroupId,
        result: Result<Resolution, ResolveError>,
    ) -> Result<(Committed, Event), StoreError> {
        let now = self.clock.now();
        let (outcome, resolution, attempts) = classify(result);

        let rows: Vec<ProxyAttemptLog> = attempts
            .iter()
            .map(|attempt| ProxyAttemptLog::from_attempt(group, attempt, now))
            .collect();

        let mut event = Event::bare(self.ids.generate_event_id(), item.owner, outcome, now);
        event.attempt_group = Some(group);
        if let Some(resolution) = resolution {
            event.device_id = Some(device.id);
            event.initial_url = Some(resolution.initial_url);
            event.final_url = Some(resolution.final_url);
            event.ip = resolution.ip;
            event.isp = resolution.isp;
        }

        let attempt_count = rows.len();
        let committed = self.store.commit_outcome(item.id, event.clone(), rows).await?;
        tracing::info!(
            item = %committed.item.id,
            owner = %committed.item.owner,
            %outcome,
            attempts = attempt_count,
            open_after = committed.open_after,
            "resolution committed"
        );
        Ok((committed, event))
    }
}

/// Map a resolver result to its terminal outcome and the attempts to log.
pub fn classify(
    result: Result<Resolution, ResolveError>,
) -> (EventOutcome, Option<Resolution>, Vec<ProxyAttempt>) {
    match result {
        Ok(mut resolution) => {
            let attempts = std::mem::take(&mut resolution.attempts);
            (EventOutcome::Success, Some(resolution), attempts)
        }
        Err(ResolveError::ProxyAcquisition { attempts }) => {
            (EventOutcome::ProxyError, None, attempts)
        }
        Err(ResolveError::Other(reason)) => {
            tracing::debug!(%reason, "resolver failed");
            (EventOutcome::RedirectorError, None, Vec::new())
        }
    }
}
