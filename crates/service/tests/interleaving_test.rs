//! Exactly-once replies under randomized completion orderings.
//!
//! A store completes each call along a random path (synchronous rejection,
//! inline, tokio task or OS thread) with a random outcome, while requests of
//! every kind are issued concurrently. Every request must be answered exactly
//! once with the store's outcome, never through a dropped reply, and
//! successful mutations must publish exactly once, before replying.

mod common;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use actordir_core::messages::{
    AddActorCheckpointRequest, CreateActorRequest, GetActorCheckpointIdRequest,
    GetActorCheckpointRequest, GetActorInfoRequest, GetAllActorInfoRequest,
    GetNamedActorInfoRequest, RegisterActorInfoRequest, UpdateActorInfoRequest,
};
use actordir_core::{
    ActorCheckpointData, ActorId, ActorTableData, CheckpointId, JobId, StatusCode, TaskId,
    TaskSpec,
};
use actordir_service::{ActorInfoHandler, DefaultActorInfoHandler, LocalActorManager};
use common::{ChaosStore, Event, RecordingPublisher, Timeline};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::runtime::Handle;

const REQUESTS: usize = 10_000;

type ChaosHandler =
    DefaultActorInfoHandler<ChaosStore, LocalActorManager<ChaosStore>, RecordingPublisher>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Create,
    Get,
    GetAll,
    GetNamed,
    Register,
    Update,
    AddCheckpoint,
    GetCheckpoint,
    GetCheckpointId,
}

impl Kind {
    const ALL: [Self; 9] = [
        Self::Create,
        Self::Get,
        Self::GetAll,
        Self::GetNamed,
        Self::Register,
        Self::Update,
        Self::AddCheckpoint,
        Self::GetCheckpoint,
        Self::GetCheckpointId,
    ];

    const fn is_mutation(self) -> bool {
        matches!(self, Self::Register | Self::Update)
    }
}

fn actor_of(request: usize) -> ActorId {
    ActorId::of(JobId::from_int(1), TaskId::nil(), request as u64)
}

fn issue(handler: &ChaosHandler, timeline: &Timeline, request: usize, kind: Kind) {
    let counter = request as u64;
    let actor_id = actor_of(request);
    match kind {
        Kind::Create => {
            let task_spec = TaskSpec::actor_creation(JobId::from_int(1), TaskId::nil(), counter)
                .with_actor_name(format!("actor-{request}"));
            handler.handle_create_actor(
                CreateActorRequest { task_spec },
                timeline.reply_sender(request),
            );
        }
        Kind::Get => {
            handler.handle_get_actor_info(
                GetActorInfoRequest { actor_id },
                timeline.reply_sender(request),
            );
        }
        Kind::GetAll => {
            handler.handle_get_all_actor_info(
                GetAllActorInfoRequest {},
                timeline.reply_sender(request),
            );
        }
        Kind::GetNamed => {
            // Roughly half of these names were taken by earlier creations.
            let name = format!("actor-{}", request / 2);
            handler.handle_get_named_actor_info(
                GetNamedActorInfoRequest { name },
                timeline.reply_sender(request),
            );
        }
        Kind::Register => {
            handler.handle_register_actor_info(
                RegisterActorInfoRequest {
                    actor_table_data: ActorTableData::new(actor_id),
                },
                timeline.reply_sender(request),
            );
        }
        Kind::Update => {
            handler.handle_update_actor_info(
                UpdateActorInfoRequest {
                    actor_id,
                    actor_table_data: ActorTableData::new(actor_id),
                },
                timeline.reply_sender(request),
            );
        }
        Kind::AddCheckpoint => {
            handler.handle_add_actor_checkpoint(
                AddActorCheckpointRequest {
                    checkpoint_data: ActorCheckpointData::new(
                        actor_id,
                        CheckpointId::from_random(),
                        vec![0; 8],
                    ),
                },
                timeline.reply_sender(request),
            );
        }
        Kind::GetCheckpoint => {
            handler.handle_get_actor_checkpoint(
                GetActorCheckpointRequest {
                    actor_id,
                    checkpoint_id: CheckpointId::from_random(),
                },
                timeline.reply_sender(request),
            );
        }
        Kind::GetCheckpointId => {
            handler.handle_get_actor_checkpoint_id(
                GetActorCheckpointIdRequest { actor_id },
                timeline.reply_sender(request),
            );
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_reply_exactly_once_under_random_completion_orderings() -> Result<(), String> {
    let timeline = Timeline::new();
    let store = Arc::new(ChaosStore::new(0x5eed, Handle::current()));
    let manager = Arc::new(LocalActorManager::new(Arc::clone(&store)));
    let publisher = Arc::new(RecordingPublisher::new(timeline.clone()));
    let handler = Arc::new(DefaultActorInfoHandler::new(store, manager, publisher));

    let mut rng = StdRng::seed_from_u64(42);
    let kinds: Vec<Kind> = (0..REQUESTS)
        .map(|_| Kind::ALL[rng.gen_range(0..Kind::ALL.len())])
        .collect();

    // Issue from several tasks so submissions also interleave.
    let mut issuers = Vec::new();
    for (chunk_index, chunk) in kinds.chunks(REQUESTS / 8).enumerate() {
        let handler = Arc::clone(&handler);
        let timeline = timeline.clone();
        let chunk = chunk.to_vec();
        let offset = chunk_index * (REQUESTS / 8);
        issuers.push(tokio::spawn(async move {
            for (i, kind) in chunk.into_iter().enumerate() {
                issue(&handler, &timeline, offset + i, kind);
                if i % 64 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }
    for result in futures::future::join_all(issuers).await {
        result.map_err(|e| format!("issuer task failed: {e}"))?;
    }

    timeline.wait_for_replies(REQUESTS).await?;
    // Late duplicates from OS threads would land here.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let replies = timeline.replies();
    assert_eq!(replies.len(), REQUESTS, "one reply per request");
    let answered: HashSet<usize> = replies.iter().map(|(request, _)| *request).collect();
    assert_eq!(answered.len(), REQUESTS, "no request answered twice");
    let dropped: Vec<usize> = replies
        .iter()
        .filter(|(_, status)| status.code() == StatusCode::Internal)
        .map(|(request, _)| *request)
        .collect();
    assert!(dropped.is_empty(), "replies lost their completion: {dropped:?}");

    let status_by_request: HashMap<usize, bool> = replies
        .iter()
        .map(|(request, status)| (*request, status.is_ok()))
        .collect();
    let successful_mutations = kinds
        .iter()
        .enumerate()
        .filter(|(request, kind)| {
            kind.is_mutation() && status_by_request.get(request).copied().unwrap_or(false)
        })
        .count();
    assert_eq!(
        timeline.publishes(),
        successful_mutations,
        "one publish per successful mutation, none for failures"
    );

    // Each actor id is used by exactly one request, so keys identify it.
    let mut published_at: HashMap<String, usize> = HashMap::new();
    let mut replied_at: HashMap<usize, usize> = HashMap::new();
    for (position, event) in timeline.events().into_iter().enumerate() {
        match event {
            Event::Published { key, .. } => {
                published_at.entry(key).or_insert(position);
            }
            Event::Replied { request, .. } => {
                replied_at.insert(request, position);
            }
        }
    }
    for (request, kind) in kinds.iter().enumerate() {
        if !(kind.is_mutation() && status_by_request.get(&request).copied().unwrap_or(false)) {
            continue;
        }
        let published = published_at
            .get(&actor_of(request).hex())
            .ok_or_else(|| format!("request {request} replied OK without publishing"))?;
        let replied = replied_at
            .get(&request)
            .ok_or_else(|| format!("request {request} has no reply"))?;
        assert!(published < replied, "request {request} replied before publishing");
    }

    Ok(())
}
