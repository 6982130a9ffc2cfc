//! Shared fixtures for the service integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use actordir_core::{
    ActorCheckpointData, ActorCheckpointIdData, ActorId, ActorTableData, CheckpointId, Status,
};
use actordir_events::{Channel, Publisher, Result as PublishResult};
use actordir_service::{
    ActorInfoAccessor, Completion, InMemoryActorStore, MultiItemCallback, OptionalItemCallback,
    Rejected, ReplySender, StatusCallback, Submitted,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::runtime::Handle;

/// Something observable that happened while serving a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Published { channel: String, key: String },
    Replied { request: usize, status: Status },
}

/// Ordered record of publishes and replies.
#[derive(Debug, Default, Clone)]
pub struct Timeline {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.events.lock().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn publishes(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, Event::Published { .. }))
            .count()
    }

    pub fn replies(&self) -> Vec<(usize, Status)> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Replied { request, status } => Some((*request, status.clone())),
                Event::Published { .. } => None,
            })
            .collect()
    }

    /// Wait until at least `count` replies were recorded.
    pub async fn wait_for_replies(&self, count: usize) -> Result<(), String> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let seen = self.replies().len();
            if seen >= count {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(format!("saw {seen} of {count} replies before timing out"));
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// A reply sender that records its reply under `request`.
    pub fn reply_sender<R: Default + Send + 'static>(&self, request: usize) -> ReplySender<R> {
        let timeline = self.clone();
        ReplySender::from_fn(move |_payload: R, status| {
            timeline.push(Event::Replied { request, status });
        })
    }
}

/// Publisher that appends to a [`Timeline`].
#[derive(Debug, Clone)]
pub struct RecordingPublisher {
    timeline: Timeline,
}

impl RecordingPublisher {
    pub const fn new(timeline: Timeline) -> Self {
        Self { timeline }
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, channel: &Channel, key: &str, _payload: Vec<u8>) -> PublishResult<()> {
        self.timeline.push(Event::Published {
            channel: channel.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }
}

/// How a [`ScriptedStore`] treats every call.
#[derive(Debug, Clone)]
pub enum Script {
    /// Forward to the in-memory store.
    Forward,
    /// Refuse synchronously with the status.
    RejectSync(Status),
    /// Accept, then complete with the failure from another task.
    FailAsync(Status),
}

/// Store wrapper that counts calls and can inject failures.
pub struct ScriptedStore {
    inner: InMemoryActorStore,
    script: Mutex<Script>,
    calls: AtomicUsize,
}

impl ScriptedStore {
    pub fn new(runtime: Handle) -> Self {
        Self {
            inner: InMemoryActorStore::new(runtime),
            script: Mutex::new(Script::Forward),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock() = script;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn intercept<C: Completion>(
        &self,
        callback: C,
        forward: impl FnOnce(&InMemoryActorStore, C) -> Submitted<C>,
    ) -> Submitted<C> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().clone();
        match script {
            Script::Forward => forward(&self.inner, callback),
            Script::RejectSync(status) => Err(Rejected::new(status, callback)),
            Script::FailAsync(status) => {
                tokio::spawn(async move { callback.fail(status) });
                Ok(())
            }
        }
    }
}

impl ActorInfoAccessor for ScriptedStore {
    fn async_get(
        &self,
        actor_id: &ActorId,
        callback: OptionalItemCallback<ActorTableData>,
    ) -> Submitted<OptionalItemCallback<ActorTableData>> {
        self.intercept(callback, |s, c| s.async_get(actor_id, c))
    }

    fn async_get_all(
        &self,
        callback: MultiItemCallback<ActorTableData>,
    ) -> Submitted<MultiItemCallback<ActorTableData>> {
        self.intercept(callback, |s, c| s.async_get_all(c))
    }

    fn async_register(
        &self,
        data: Arc<ActorTableData>,
        callback: StatusCallback,
    ) -> Submitted<StatusCallback> {
        self.intercept(callback, |s, c| s.async_register(data, c))
    }

    fn async_update(
        &self,
        actor_id: &ActorId,
        data: Arc<ActorTableData>,
        callback: StatusCallback,
    ) -> Submitted<StatusCallback> {
        self.intercept(callback, |s, c| s.async_update(actor_id, data, c))
    }

    fn async_add_checkpoint(
        &self,
        data: Arc<ActorCheckpointData>,
        callback: StatusCallback,
    ) -> Submitted<StatusCallback> {
        self.intercept(callback, |s, c| s.async_add_checkpoint(data, c))
    }

    fn async_get_checkpoint(
        &self,
        checkpoint_id: &CheckpointId,
        actor_id: &ActorId,
        callback: OptionalItemCallback<ActorCheckpointData>,
    ) -> Submitted<OptionalItemCallback<ActorCheckpointData>> {
        self.intercept(callback, |s, c| {
            s.async_get_checkpoint(checkpoint_id, actor_id, c)
        })
    }

    fn async_get_checkpoint_id(
        &self,
        actor_id: &ActorId,
        callback: OptionalItemCallback<ActorCheckpointIdData>,
    ) -> Submitted<OptionalItemCallback<ActorCheckpointIdData>> {
        self.intercept(callback, |s, c| s.async_get_checkpoint_id(actor_id, c))
    }
}

/// Store that completes every call along a randomly chosen path.
///
/// Each call is either refused synchronously, completed inline before the
/// submission returns, completed on a tokio task, or completed from a plain
/// OS thread. Accepted calls succeed or fail at random; successful reads
/// always carry a default item.
pub struct ChaosStore {
    rng: Mutex<StdRng>,
    runtime: Handle,
}

#[derive(Debug, Clone, Copy)]
enum Path {
    RejectSync,
    Inline,
    Task,
    Thread,
}

impl ChaosStore {
    pub fn new(seed: u64, runtime: Handle) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            runtime,
        }
    }

    fn roll(&self) -> (Path, bool) {
        let mut rng = self.rng.lock();
        let path = match rng.gen_range(0..4) {
            0 => Path::RejectSync,
            1 => Path::Inline,
            2 => Path::Task,
            _ => Path::Thread,
        };
        (path, rng.gen_bool(0.7))
    }

    fn run<C: Completion>(
        &self,
        callback: C,
        finish: impl FnOnce(C, Status) + Send + 'static,
    ) -> Submitted<C> {
        let (path, succeed) = self.roll();
        let status = if succeed {
            Status::ok()
        } else {
            Status::io_error("injected store failure")
        };
        match path {
            Path::RejectSync => {
                return Err(Rejected::new(Status::unavailable("injected rejection"), callback));
            }
            Path::Inline => finish(callback, status),
            Path::Task => {
                self.runtime.spawn(async move { finish(callback, status) });
            }
            Path::Thread => {
                std::thread::spawn(move || finish(callback, status));
            }
        }
        Ok(())
    }

    fn run_status(&self, callback: StatusCallback) -> Submitted<StatusCallback> {
        self.run(callback, |callback, status| callback(status))
    }

    fn run_optional<T: Default + Send + 'static>(
        &self,
        callback: OptionalItemCallback<T>,
    ) -> Submitted<OptionalItemCallback<T>> {
        self.run(callback, |callback, status| {
            let item = status.is_ok().then(T::default);
            callback(status, item);
        })
    }
}

impl ActorInfoAccessor for ChaosStore {
    fn async_get(
        &self,
        _actor_id: &ActorId,
        callback: OptionalItemCallback<ActorTableData>,
    ) -> Submitted<OptionalItemCallback<ActorTableData>> {
        self.run_optional(callback)
    }

    fn async_get_all(
        &self,
        callback: MultiItemCallback<ActorTableData>,
    ) -> Submitted<MultiItemCallback<ActorTableData>> {
        self.run(callback, |callback, status| {
            let items = if status.is_ok() {
                vec![ActorTableData::default()]
            } else {
                Vec::new()
            };
            callback(status, items);
        })
    }

    fn async_register(
        &self,
        _data: Arc<ActorTableData>,
        callback: StatusCallback,
    ) -> Submitted<StatusCallback> {
        self.run_status(callback)
    }

    fn async_update(
        &self,
        _actor_id: &ActorId,
        _data: Arc<ActorTableData>,
        callback: StatusCallback,
    ) -> Submitted<StatusCallback> {
        self.run_status(callback)
    }

    fn async_add_checkpoint(
        &self,
        _data: Arc<ActorCheckpointData>,
        callback: StatusCallback,
    ) -> Submitted<StatusCallback> {
        self.run_status(callback)
    }

    fn async_get_checkpoint(
        &self,
        _checkpoint_id: &CheckpointId,
        _actor_id: &ActorId,
        callback: OptionalItemCallback<ActorCheckpointData>,
    ) -> Submitted<OptionalItemCallback<ActorCheckpointData>> {
        self.run_optional(callback)
    }

    fn async_get_checkpoint_id(
        &self,
        _actor_id: &ActorId,
        callback: OptionalItemCallback<ActorCheckpointIdData>,
    ) -> Submitted<OptionalItemCallback<ActorCheckpointIdData>> {
        self.run_optional(callback)
    }
}
