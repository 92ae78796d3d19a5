//! Scheduler - periodic claiming of due queue items.
//!
//! # Tick
//! 1. Reaper pass (no-op unless a reclaim policy is configured).
//! 2. `QueueStore::claim_due(now)` flips every due item to `in_progress`
//!    in one atomic step.
//! 3. One orchestrator task is spawned per claimed item; the tick does not
//!    wait for them.
//!
//! The loop stops taking new claims on shutdown and then waits for the
//! resolutions it spawned. They are never cancelled; an `in_progress` item
//! always runs to its terminal outcome.
//!
//! Every dispatched item stays in the live set until its task ends, and the
//! reaper never reclaims a live item. A claim that is only queued behind the
//! permit pool is therefore never handed out a second time.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::app::orchestrator::ResolutionOrchestrator;
use crate::app::reaper::Reaper;
use crate::domain::{QueueItemId, StoreError};
use crate::ports::{Clock, QueueStore};

/// Default claim period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// What one tick did.
#[derive(Debug, Default)]
pub struct TickReport {
    pub reclaimed: Vec<QueueItemId>,
    pub claimed: Vec<QueueItemId>,
    /// One handle per spawned resolution.
    pub tasks: Vec<JoinHandle<()>>,
}

impl TickReport {
    /// Wait for every resolution spawned by this tick.
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(error) = task.await {
                tracing::error!(%error, "resolution task aborted");
            }
        }
    }
}

/// Items with a resolution task running in this process.
#[derive(Debug, Clone, Default)]
struct LiveClaims {
    ids: Arc<Mutex<HashSet<QueueItemId>>>,
}

impl LiveClaims {
    fn lock(&self) -> MutexGuard<'_, HashSet<QueueItemId>> {
        self.ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn snapshot(&self) -> HashSet<QueueItemId> {
        self.lock().clone()
    }

    fn register(&self, id: QueueItemId) -> LiveClaim {
        self.lock().insert(id);
        LiveClaim {
            claims: self.clone(),
            id,
        }
    }
}

/// Leaves the live set when dropped, whether the task finished or panicked.
struct LiveClaim {
    claims: LiveClaims,
    id: QueueItemId,
}

impl Drop for LiveClaim {
    fn drop(&mut self) {
        self.claims.lock().remove(&self.id);
    }
}

pub struct Scheduler {
    store: Arc<dyn QueueStore>,
    orchestrator: Arc<ResolutionOrchestrator>,
    reaper: Reaper,
    clock: Arc<dyn Clock>,
    interval: Duration,
    live: LiveClaims,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn QueueStore>,
        orchestrator: Arc<ResolutionOrchestrator>,
        reaper: Reaper,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            orchestrator,
            reaper,
            clock,
            interval,
            live: LiveClaims::default(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn tick(&self) -> Result<TickReport, StoreError> {
        let reclaimed = self.reaper.run_once(&self.live.snapshot()).await?;

        let now = self.clock.now();
        let claimed = self.store.claim_due(now).await?;
        if !claimed.is_empty() {
            tracing::info!(count = claimed.len(), %now, "claimed due items");
        }

        let mut report = TickReport {
            reclaimed,
            claimed: claimed.iter().map(|item| item.id).collect(),
            tasks: Vec::with_capacity(claimed.len()),
        };
        for item in claimed {
            let orchestrator = Arc::clone(&self.orchestrator);
            let live = self.live.register(item.id);
            report.tasks.push(tokio::spawn(async move {
                let _live = live;
                let id = item.id;
                if let Err(error) = orchestrator.process(item).await {
                    tracing::error!(item = %id, %error, "resolution failed to complete");
                }
            }));
        }
        Ok(report)
    }

    /// Run ticks on the configured period until shutdown is requested.
    pub fn spawn(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(async move {
            self.run(shutdown_rx).await;
        });
        SchedulerHandle { shutdown_tx, join }
    }

    async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "scheduler started");

        let mut in_flight: Vec<JoinHandle<()>> = Vec::new();
        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    // sender dropped counts as shutdown
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            in_flight.retain(|task| !task.is_finished());
            match self.tick().await {
                Ok(report) => in_flight.extend(report.tasks),
                Err(error) => tracing::error!(%error, "tick failed"),
            }
        }

        if !in_flight.is_empty() {
            tracing::info!(count = in_flight.len(), "waiting for in-flight resolutions");
        }
        TickReport {
            tasks: in_flight,
            ..TickReport::default()
        }
        .join()
        .await;
        tracing::info!("scheduler stopped");
    }
}

/// Handle to a running scheduler loop.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop claiming. In-flight resolutions keep running.
    pub fn request_shutdown(&self) {
        // receiver may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Stop claiming and wait until every spawned resolution has finished.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        if let Err(error) = self.join.await {
            tracing::error!(%error, "scheduler task aborted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::notifier::Dispatch;
    use crate::domain::{EventOutcome, NotifyMode, OwnerId, TransitionMode};
    use crate::ports::EventLog;
    use crate::testkit::{Harness, ScriptedResolver};
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    #[tokio::test]
    async fn immediate_item_is_claimed_on_next_tick() {
        let harness = Harness::new(NotifyMode::Each);
        let item = harness.enqueue(OwnerId(1), "https://example.com/a").await;

        let report = harness.scheduler.tick().await.unwrap();
        assert_eq!(report.claimed, vec![item.id]);
        report.join().await;

        let events = harness.store.events_for(OwnerId(1)).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, EventOutcome::Success);
        assert_eq!(harness.messenger.sent().len(), 1);
    }

    #[tokio::test]
    async fn scheduled_item_waits_for_its_time() {
        let harness = Harness::new(NotifyMode::None);
        let at = harness.clock.now() + ChronoDuration::hours(3);
        harness.enqueue_at(OwnerId(1), "https://example.com/a", Some(at)).await;

        assert!(harness.scheduler.tick().await.unwrap().claimed.is_empty());

        harness.clock.set(at);
        let report = harness.scheduler.tick().await.unwrap();
        assert_eq!(report.claimed.len(), 1);
        report.join().await;
    }

    #[tokio::test]
    async fn late_daily_submission_waits_until_tomorrow() {
        // 23:00 local in UTC+3
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 20, 0, 0).unwrap();
        let harness = Harness::new(NotifyMode::None);
        harness.clock.set(now);
        harness.set_transition_mode(OwnerId(1), TransitionMode::Daily);

        let queued = harness.submit(OwnerId(1), "see https://example.com/a").await;
        let at = queued.scheduled_time.unwrap();
        // next local day: [2024-05-10 21:00 UTC, 2024-05-11 20:59:59 UTC]
        assert!(at >= Utc.with_ymd_and_hms(2024, 5, 10, 21, 0, 0).unwrap());
        assert!(at <= Utc.with_ymd_and_hms(2024, 5, 11, 20, 59, 59).unwrap());
        assert!(harness.scheduler.tick().await.unwrap().claimed.is_empty());

        // the same link in immediate mode goes out on the very next tick
        harness.set_transition_mode(OwnerId(1), TransitionMode::Immediate);
        let immediate = harness.submit(OwnerId(1), "https://example.com/a").await;
        assert_eq!(immediate.scheduled_time, None);
        let report = harness.scheduler.tick().await.unwrap();
        assert_eq!(report.claimed, vec![immediate.id]);
        report.join().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_ticks_dispatch_once() {
        let resolver = ScriptedResolver::new();
        let harness = Arc::new(Harness::with_resolver(NotifyMode::None, resolver.clone()));
        harness.enqueue(OwnerId(1), "https://example.com/a").await;

        let (a, b) = tokio::join!(harness.scheduler.tick(), harness.scheduler.tick());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.claimed.len() + b.claimed.len(), 1);
        a.join().await;
        b.join().await;

        assert_eq!(resolver.calls(), 1);
        assert_eq!(harness.store.events_for(OwnerId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn batch_of_items_resolves_one_at_a_time() {
        let resolver = ScriptedResolver::new().with_delay(std::time::Duration::from_millis(15));
        let harness = Harness::with_resolver(NotifyMode::None, resolver.clone());
        for n in 0..4 {
            harness.enqueue(OwnerId(1), &format!("https://example.com/{n}")).await;
        }

        let report = harness.scheduler.tick().await.unwrap();
        assert_eq!(report.claimed.len(), 4);
        report.join().await;

        assert_eq!(resolver.calls(), 4);
        assert_eq!(resolver.max_in_flight(), 1);
        let events = harness.store.events_for(OwnerId(1)).await.unwrap();
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| e.outcome.is_resolution()));
    }

    #[tokio::test]
    async fn summary_is_sent_once_when_queue_drains() {
        let harness = Harness::with_resolver(
            NotifyMode::Summary,
            ScriptedResolver::new().fail_other("https://example.com/2"),
        );
        for n in 1..=3 {
            harness.enqueue(OwnerId(1), &format!("https://example.com/{n}")).await;
        }

        let report = harness.scheduler.tick().await.unwrap();
        assert_eq!(report.claimed.len(), 3);
        report.join().await;

        let sent = harness.messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].reply_to, None);
        let lines: Vec<_> = sent[0].text.lines().collect();
        assert_eq!(lines[0], "Visit summary:");
        // two successes listed, the failed link is not
        assert_eq!(lines.len(), 3);
        assert!(!sent[0].text.contains("https://example.com/2 →"));
    }

    #[tokio::test]
    async fn summary_waits_for_items_claimed_later() {
        let harness = Harness::new(NotifyMode::Summary);
        let first = harness.enqueue_claimed(OwnerId(1), "https://example.com/1").await;
        let later = harness.clock.now() + ChronoDuration::hours(1);
        harness.enqueue_at(OwnerId(1), "https://example.com/2", Some(later)).await;

        let completion = harness.orchestrator.process(first).await.unwrap();
        assert_eq!(completion.dispatch, Dispatch::Deferred);
        assert!(harness.messenger.sent().is_empty());

        harness.clock.set(later);
        harness.scheduler.tick().await.unwrap().join().await;
        assert_eq!(harness.messenger.sent().len(), 1);
    }

    #[tokio::test]
    async fn delivery_failure_is_not_retried() {
        let harness = Harness::new(NotifyMode::Each);
        harness.messenger.fail_all();
        let item = harness.enqueue_claimed(OwnerId(1), "https://example.com/a").await;

        let completion = harness.orchestrator.process(item).await.unwrap();
        assert_eq!(completion.dispatch, Dispatch::Failed);
        assert_eq!(harness.messenger.attempts(), 1);
        assert_eq!(harness.store.events_for(OwnerId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn muted_owner_gets_nothing() {
        let harness = Harness::new(NotifyMode::None);
        harness.enqueue(OwnerId(1), "https://example.com/a").await;
        harness.scheduler.tick().await.unwrap().join().await;
        assert!(harness.messenger.sent().is_empty());
        assert_eq!(harness.store.events_for(OwnerId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn each_mode_replies_to_the_submission() {
        let harness = Harness::new(NotifyMode::Each);
        let item = harness.enqueue(OwnerId(1), "https://example.com/a").await;
        harness.scheduler.tick().await.unwrap().join().await;

        let sent = harness.messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat, OwnerId(1));
        assert_eq!(sent[0].reply_to, Some(item.message_ref));
    }

    #[tokio::test]
    async fn stale_claims_are_retried_when_policy_allows() {
        let harness = Harness::with_reclaim(ChronoDuration::minutes(15), ScriptedResolver::new());
        let item = harness.enqueue_claimed(OwnerId(1), "https://example.com/a").await;

        harness.clock.advance(ChronoDuration::minutes(20));
        let report = harness.scheduler.tick().await.unwrap();
        assert_eq!(report.reclaimed, vec![item.id]);
        assert_eq!(report.claimed, vec![item.id]);
        report.join().await;
        assert_eq!(harness.store.events_for(OwnerId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn claim_waiting_for_a_permit_is_not_reclaimed() {
        let resolver = ScriptedResolver::new();
        let harness = Harness::with_reclaim(ChronoDuration::minutes(15), resolver.clone());
        harness.enqueue(OwnerId(1), "https://example.com/a").await;
        harness.enqueue(OwnerId(1), "https://example.com/b").await;

        let held = harness.orchestrator.permits().acquire().await.unwrap();
        let first = harness.scheduler.tick().await.unwrap();
        assert_eq!(first.claimed.len(), 2);

        harness.clock.advance(ChronoDuration::minutes(20));
        let second = harness.scheduler.tick().await.unwrap();
        assert!(second.reclaimed.is_empty());
        assert!(second.claimed.is_empty());

        drop(held);
        first.join().await;
        second.join().await;

        assert_eq!(resolver.calls(), 2);
        let events = harness.store.events_for(OwnerId(1)).await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.outcome == EventOutcome::Success));

        // finished tasks leave the live set
        assert!(harness.scheduler.live.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn loop_ticks_until_shutdown() {
        let harness = Harness::new(NotifyMode::None);
        let handle = Arc::clone(&harness.scheduler).spawn();

        harness.enqueue(OwnerId(1), "https://example.com/a").await;
        tokio::time::sleep(harness.scheduler.interval() + std::time::Duration::from_secs(1)).await;

        handle.shutdown_and_join().await;
        assert_eq!(harness.store.events_for(OwnerId(1)).await.unwrap().len(), 1);
    }
}
