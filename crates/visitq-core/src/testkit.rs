//! Test doubles and a wired harness shared by the app tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use crate::app::{AppBuilder, Intake, ReclaimPolicy, ResolutionOrchestrator, Scheduler, Submission};
use crate::app::planner::TransitionTimePlanner;
use crate::domain::{
    DeviceProfile, MessageRef, MessagingError, NotifyMode, Owner, OwnerId, ProxyAttempt,
    QueueItem, ResolveError, Role, TransitionMode,
};
use crate::impls::{DeviceCatalog, InMemoryStore, StaticOwnerDirectory};
use crate::ports::{Clock, FixedClock, Messenger, QueueStore, Resolution, Resolver, UlidGenerator};

pub fn device(id: u32) -> DeviceProfile {
    DeviceProfile {
        id,
        user_agent: format!("test-agent/{id}"),
        viewport: (390, 844),
        platform: "iPhone".to_string(),
        pixel_ratio: 3,
        mobile: true,
        model: None,
    }
}

pub fn owner(id: i64, notify_mode: NotifyMode) -> Owner {
    Owner {
        id: OwnerId(id),
        role: Role::User,
        notify_mode,
        transition_mode: TransitionMode::Immediate,
    }
}

#[derive(Debug, Clone)]
enum Script {
    ProxyFailure(u32),
    Failure,
}

#[derive(Default)]
struct ResolverState {
    scripts: HashMap<String, Script>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Resolver that succeeds unless a URL is scripted to fail.
///
/// Success lands on `{url}/landing` after two proxy attempts.
#[derive(Clone, Default)]
pub struct ScriptedResolver {
    state: Arc<ResolverState>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn edit(self, edit: impl FnOnce(&mut ResolverState)) -> Self {
        let mut state = Arc::try_unwrap(self.state).unwrap_or_else(|_| panic!("resolver shared"));
        edit(&mut state);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn fail_proxy(self, url: &str, attempts: u32) -> Self {
        let url = url.to_string();
        self.edit(|s| {
            s.scripts.insert(url, Script::ProxyFailure(attempts));
        })
    }

    pub fn fail_other(self, url: &str) -> Self {
        let url = url.to_string();
        self.edit(|s| {
            s.scripts.insert(url, Script::Failure);
        })
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.edit(|s| s.delay = Some(delay))
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Resolver for ScriptedResolver {
    async fn resolve(&self, url: &str, _device: &DeviceProfile) -> Result<Resolution, ResolveError> {
        let state = &self.state;
        state.calls.fetch_add(1, Ordering::SeqCst);
        let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = state.delay {
            tokio::time::sleep(delay).await;
        }

        let result = match state.scripts.get(url) {
            Some(Script::ProxyFailure(n)) => Err(ResolveError::ProxyAcquisition {
                attempts: (1..=*n)
                    .map(|i| ProxyAttempt::new(i, None, Some("nowhere")))
                    .collect(),
            }),
            Some(Script::Failure) => Err(ResolveError::Other("navigation timeout".to_string())),
            None => Ok(Resolution {
                initial_url: url.to_string(),
                final_url: format!("{url}/landing"),
                ip: Some("203.0.113.7".to_string()),
                isp: Some("Example ISP".to_string()),
                attempts: vec![
                    ProxyAttempt::new(1, None, None),
                    ProxyAttempt::new(2, Some("203.0.113.7"), Some("Lisbon")),
                ],
            }),
        };

        state.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat: OwnerId,
    pub text: String,
    pub reply_to: Option<MessageRef>,
}

#[derive(Default)]
struct MessengerState {
    sent: Vec<SentMessage>,
    attempts: usize,
    failing: bool,
}

/// Records outbound messages; can be switched to fail every delivery.
#[derive(Clone, Default)]
pub struct RecordingMessenger {
    state: Arc<Mutex<MessengerState>>,
}

impl RecordingMessenger {
    fn lock(&self) -> std::sync::MutexGuard<'_, MessengerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.lock().sent.clone()
    }

    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    pub fn fail_all(&self) {
        self.lock().failing = true;
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(
        &self,
        chat: OwnerId,
        text: &str,
        reply_to: Option<MessageRef>,
    ) -> Result<(), MessagingError> {
        let mut state = self.lock();
        state.attempts += 1;
        if state.failing {
            return Err(MessagingError {
                chat,
                reason: "chat unreachable".to_string(),
            });
        }
        state.sent.push(SentMessage {
            chat,
            text: text.to_string(),
            reply_to,
        });
        Ok(())
    }
}

/// Fully wired service on a fixed clock and in-memory storage.
///
/// Owner 1 is registered; the planner runs in UTC+3.
pub struct Harness {
    pub clock: FixedClock,
    pub store: Arc<InMemoryStore>,
    pub directory: StaticOwnerDirectory,
    pub messenger: RecordingMessenger,
    pub orchestrator: Arc<ResolutionOrchestrator>,
    pub scheduler: Arc<Scheduler>,
    pub intake: Intake,
    planner: TransitionTimePlanner,
    next_message: AtomicUsize,
}

impl Harness {
    pub fn new(mode: NotifyMode) -> Self {
        Self::build(mode, ScriptedResolver::new(), ReclaimPolicy::disabled())
    }

    pub fn with_resolver(mode: NotifyMode, resolver: ScriptedResolver) -> Self {
        Self::build(mode, resolver, ReclaimPolicy::disabled())
    }

    pub fn with_reclaim(stale_after: chrono::Duration, resolver: ScriptedResolver) -> Self {
        Self::build(NotifyMode::None, resolver, ReclaimPolicy::after(stale_after))
    }

    fn build(mode: NotifyMode, resolver: ScriptedResolver, reclaim: ReclaimPolicy) -> Self {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap());
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let store = Arc::new(InMemoryStore::new(
            Arc::new(UlidGenerator::new(Arc::clone(&shared_clock))),
            Arc::clone(&shared_clock),
        ));
        let directory = StaticOwnerDirectory::new([owner(1, mode)]);
        let messenger = RecordingMessenger::default();
        let planner = TransitionTimePlanner::new(FixedOffset::east_opt(3 * 3600).unwrap());

        let app = AppBuilder::new()
            .store(Arc::clone(&store))
            .resolver(Arc::new(resolver))
            .messenger(Arc::new(messenger.clone()))
            .directory(Arc::new(directory.clone()))
            .devices(DeviceCatalog::new(vec![device(1), device(2), device(3)]))
            .clock(shared_clock)
            .reclaim(reclaim)
            .planner(planner)
            .build()
            .unwrap();

        Self {
            clock,
            store,
            directory,
            messenger,
            orchestrator: app.orchestrator,
            scheduler: app.scheduler,
            intake: app.intake,
            planner,
            next_message: AtomicUsize::new(1),
        }
    }

    pub fn planner(&self) -> TransitionTimePlanner {
        self.planner
    }

    fn message_ref(&self) -> MessageRef {
        MessageRef(self.next_message.fetch_add(1, Ordering::SeqCst) as i64)
    }

    pub fn set_transition_mode(&self, id: OwnerId, transition_mode: TransitionMode) {
        let mut entry = self
            .directory
            .get(id)
            .unwrap_or_else(|| owner(id.0, NotifyMode::None));
        entry.transition_mode = transition_mode;
        self.directory.upsert(entry);
    }

    pub async fn enqueue(&self, owner: OwnerId, url: &str) -> QueueItem {
        self.enqueue_at(owner, url, None).await
    }

    pub async fn enqueue_at(
        &self,
        owner: OwnerId,
        url: &str,
        scheduled_time: Option<DateTime<Utc>>,
    ) -> QueueItem {
        self.store
            .enqueue(owner, url, self.message_ref(), scheduled_time)
            .await
            .unwrap()
    }

    /// Enqueue and claim, as the scheduler would.
    pub async fn enqueue_claimed(&self, owner: OwnerId, url: &str) -> QueueItem {
        let item = self.enqueue(owner, url).await;
        self.store
            .claim_due(self.clock.now())
            .await
            .unwrap()
            .into_iter()
            .find(|claimed| claimed.id == item.id)
            .unwrap()
    }

    /// Submit through intake; the text must produce a queued item.
    pub async fn submit(&self, owner: OwnerId, text: &str) -> QueueItem {
        match self.intake.submit(owner, self.message_ref(), text).await.unwrap() {
            Submission::Queued(item) => item,
            other => panic!("submission not queued: {other:?}"),
        }
    }
}
