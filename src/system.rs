//! `ActorSystem`: the registry of live actors plus the arbiter that routes
//! every outgoing envelope to its addressed mailbox.

use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use futures::future::FutureExt;
use futures::stream::StreamExt;
use tokio::sync::{broadcast, Mutex as AsyncMutex};
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::actor::{Actor, ActorFactory, Behavior, Enriched, RespondFn};
use crate::actor_ref::ActorRef;
use crate::address::ActorPath;
use crate::context::Context;
use crate::error::{ActorError, AskError, CreateError};
use crate::mailbox::{Mailbox, MailboxSender};
use crate::message::{Action, IncomingMessage, MessageResponse, Payload};
use crate::scheduler::Scheduler;
use crate::settings::ActorSystemConfig;

/// How an `ask` ultimately resolves: a value, or a cancellation if the
/// destination never responded (because it does not exist, or because a
/// later message of the same kind superseded it).
#[derive(Debug)]
pub enum AskOutcome {
    Value(Payload),
    Cancelled,
}

struct ActorRecord {
    mailbox: MailboxSender,
    actor: Arc<AsyncMutex<Box<dyn Actor>>>,
}

/// The shared state behind every clone of [`ActorSystem`]. `ActorRef`s hold
/// this only weakly so no ref keeps a defunct system alive.
pub struct SystemInner {
    registry: DashMap<ActorPath, ActorRecord>,
    responses_tx: broadcast::Sender<MessageResponse>,
    cancel_tx: broadcast::Sender<MessageResponse>,
    config: ActorSystemConfig,
}

const BROADCAST_CAPACITY: usize = 4096;

impl SystemInner {
    fn dispatch(inner: &Arc<SystemInner>, msg: IncomingMessage) {
        match inner.registry.get(&msg.address) {
            Some(record) => {
                if record.mailbox.send(msg.clone()).is_err() {
                    tracing::debug!(address = %msg.address, "mailbox closed; dropping message");
                    let _ = inner.cancel_tx.send(MessageResponse::cancelled(msg.message_id));
                }
            }
            None => {
                tracing::debug!(address = %msg.address, "no actor registered; dropping message");
                let _ = inner.cancel_tx.send(MessageResponse::cancelled(msg.message_id));
            }
        }
    }

    pub(crate) fn tell_from(
        inner: &Arc<SystemInner>,
        target: &ActorPath,
        action: Action,
        context_creator: Option<ActorPath>,
    ) {
        let message_id = Uuid::new_v4();
        let msg = IncomingMessage {
            message_id,
            address: target.clone(),
            action,
            context_creator,
        };
        let inner = inner.clone();
        inner.config.message_scheduler.clone().schedule(Box::new(move || {
            SystemInner::dispatch(&inner, msg);
        }));
    }

    pub(crate) async fn ask_from(
        inner: &Arc<SystemInner>,
        target: &ActorPath,
        action: Action,
        context_creator: Option<ActorPath>,
    ) -> Result<AskOutcome, AskError> {
        let message_id = Uuid::new_v4();
        SystemInner::ask_with_id(inner, target, action, context_creator, message_id).await
    }

    pub(crate) async fn ask_with_id(
        inner: &Arc<SystemInner>,
        target: &ActorPath,
        action: Action,
        context_creator: Option<ActorPath>,
        message_id: Uuid,
    ) -> Result<AskOutcome, AskError> {
        let mut responses_rx = inner.responses_tx.subscribe();
        let mut cancel_rx = inner.cancel_tx.subscribe();

        let msg = IncomingMessage {
            message_id,
            address: target.clone(),
            action,
            context_creator,
        };
        let inner_for_dispatch = inner.clone();
        inner
            .config
            .message_scheduler
            .clone()
            .schedule(Box::new(move || {
                SystemInner::dispatch(&inner_for_dispatch, msg);
            }));

        loop {
            tokio::select! {
                resp = responses_rx.recv() => {
                    match resp {
                        Ok(resp) if resp.resp_id == message_id => {
                            return match (resp.error, resp.response) {
                                (Some(err), _) => Err(AskError::User(err)),
                                (None, Some(payload)) => Ok(AskOutcome::Value(payload)),
                                (None, None) => Ok(AskOutcome::Cancelled),
                            };
                        }
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => return Ok(AskOutcome::Cancelled),
                    }
                }
                resp = cancel_rx.recv() => {
                    match resp {
                        Ok(resp) if resp.resp_id == message_id => return Ok(AskOutcome::Cancelled),
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => return Ok(AskOutcome::Cancelled),
                    }
                }
            }
        }
    }
}

/// A cheap, cloneable handle to the registry and arbiter. Every clone
/// shares the same underlying state; dropping the last clone tears the
/// system down (any outstanding `ActorRef`s simply stop resolving).
#[derive(Clone)]
pub struct ActorSystem(Arc<SystemInner>);

impl ActorSystem {
    pub fn new(config: ActorSystemConfig) -> Self {
        let (responses_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (cancel_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        ActorSystem(Arc::new(SystemInner {
            registry: DashMap::new(),
            responses_tx,
            cancel_tx,
            config,
        }))
    }

    fn weak(&self) -> std::sync::Weak<SystemInner> {
        Arc::downgrade(&self.0)
    }

    /// Spawns a top-level actor under the system prefix.
    pub async fn actor_of(
        &self,
        factory: Arc<dyn ActorFactory>,
        name: Option<&str>,
    ) -> Result<ActorRef, CreateError> {
        let path = ActorPath::create(name.unwrap_or(""))
            .map_err(|e| CreateError::InvalidName(e.name))?;
        self.actor_of_at(path, factory).await
    }

    pub(crate) async fn actor_of_at(
        &self,
        path: ActorPath,
        factory: Arc<dyn ActorFactory>,
    ) -> Result<ActorRef, CreateError> {
        if self.0.registry.contains_key(&path) {
            return Err(CreateError::AlreadyExists(path));
        }

        let self_ref = ActorRef::new(path.clone(), self.weak());
        let parent_ref = ActorRef::new(path.parent(), self.weak());
        let ctx = Context::new(self_ref.clone(), parent_ref, self.clone());

        let mut actor = build_actor(&factory, path.clone(), ctx.clone())?;
        actor.pre_start(&ctx).await;

        let behavior = actor.behavior(&ctx);
        let (mailbox_tx, mailbox) = Mailbox::new(self.0.config.mailbox_capacity);
        let actor_cell = Arc::new(AsyncMutex::new(actor));

        self.0.registry.insert(
            path.clone(),
            ActorRecord {
                mailbox: mailbox_tx,
                actor: actor_cell.clone(),
            },
        );

        {
            let mut guard = actor_cell.lock().await;
            guard.post_start(&ctx).await;
        }

        tracing::debug!(address = %path, "actor started");
        self.install_pattern(mailbox, behavior);

        Ok(self_ref)
    }

    /// Replaces the actor record at `address` with a fresh incarnation
    /// built from `factory`, firing `pre_restart` on the doomed instance
    /// (if present) and `post_restart` on the new one.
    pub async fn reincarnate(
        &self,
        address: ActorPath,
        factory: Arc<dyn ActorFactory>,
    ) -> Result<ActorRef, CreateError> {
        let self_ref = ActorRef::new(address.clone(), self.weak());
        let parent_ref = ActorRef::new(address.parent(), self.weak());
        let ctx = Context::new(self_ref.clone(), parent_ref, self.clone());

        if let Some((_, old_record)) = self.0.registry.remove(&address) {
            let mut old_actor = old_record.actor.lock().await;
            old_actor.pre_restart(&ctx).await;
        }

        let mut actor = build_actor(&factory, address.clone(), ctx.clone())?;
        let behavior = actor.behavior(&ctx);
        let (mailbox_tx, mailbox) = Mailbox::new(self.0.config.mailbox_capacity);
        let actor_cell = Arc::new(AsyncMutex::new(actor));

        self.0.registry.insert(
            address.clone(),
            ActorRecord {
                mailbox: mailbox_tx,
                actor: actor_cell.clone(),
            },
        );

        {
            let mut guard = actor_cell.lock().await;
            guard.post_restart(&ctx).await;
        }

        tracing::debug!(address = %address, "actor reincarnated");
        self.install_pattern(mailbox, behavior);

        Ok(self_ref)
    }

    /// Resolves a glob-style pattern against every currently registered
    /// address, anchored at the system root unless the pattern is
    /// absolute. Returns a point-in-time snapshot, not a live view.
    pub fn actor_selection(&self, pattern: &str) -> Vec<ActorRef> {
        self.actor_selection_from(pattern, &ActorPath::root())
    }

    pub(crate) fn actor_selection_from(&self, pattern: &str, prefix: &ActorPath) -> Vec<ActorRef> {
        let pattern = pattern.trim_end_matches('/');
        let full_pattern = if pattern.starts_with('/') {
            pattern.to_string()
        } else {
            format!("{}/{}", prefix.as_str(), pattern)
        };

        let matcher = match globset::Glob::new(&full_pattern) {
            Ok(glob) => glob.compile_matcher(),
            Err(_) => return Vec::new(),
        };

        let weak = self.weak();
        self.0
            .registry
            .iter()
            .filter(|entry| matcher.is_match(entry.key().as_str()))
            .map(|entry| ActorRef::new(entry.key().clone(), weak.clone()))
            .collect()
    }

    pub fn actor_ref_for(&self, path: ActorPath) -> ActorRef {
        ActorRef::new(path, self.weak())
    }

    pub fn publish_response(&self, resp: MessageResponse) {
        let _ = self.0.responses_tx.send(resp);
    }

    pub fn publish_cancellation(&self, resp: MessageResponse) {
        let _ = self.0.cancel_tx.send(resp);
    }

    pub fn message_scheduler(&self) -> Arc<dyn Scheduler> {
        self.0.config.message_scheduler.clone()
    }

    pub fn time_scheduler(&self) -> Arc<dyn Scheduler> {
        self.0.config.time_scheduler.clone()
    }

    pub async fn ask(&self, target: &ActorPath, action: Action) -> Result<AskOutcome, AskError> {
        SystemInner::ask_from(&self.0, target, action, None).await
    }

    pub fn tell(&self, target: &ActorPath, action: Action) {
        SystemInner::tell_from(&self.0, target, action, None)
    }

    /// Fire-and-forget stop: deliver a synthetic `stop` action, then
    /// invoke `post_stop` and deregister once it is handled.
    pub fn stop(&self, target: &ActorRef) {
        let inner = self.0.clone();
        let address = target.address().clone();
        tokio::spawn(async move {
            SystemInner::tell_from(&inner, &address, Action::new("stop", Payload::new(())), None);
            let actor = inner.registry.get(&address).map(|r| r.actor.clone());
            if let Some(actor) = actor {
                actor.lock().await.post_stop().await;
            }
            inner.registry.remove(&address);
        });
    }

    /// Stops each ref in turn: ask it to stop, await the acknowledgement,
    /// invoke `post_stop` while the actor is still registered, then
    /// deregister — serially, in order.
    pub async fn graceful_stop(&self, targets: &[ActorRef]) -> Vec<Result<(), ActorError>> {
        let mut results = Vec::with_capacity(targets.len());

        for target in targets {
            let address = target.address().clone();
            if !self.0.registry.contains_key(&address) {
                results.push(Err(ActorError::InvalidReference(address)));
                continue;
            }

            let outcome = SystemInner::ask_from(
                &self.0,
                &address,
                Action::new("stop", Payload::new(())),
                None,
            )
            .await;

            match outcome {
                Ok(_) => {
                    let actor = self.0.registry.get(&address).map(|r| r.actor.clone());
                    if let Some(actor) = actor {
                        actor.lock().await.post_stop().await;
                    }
                    self.0.registry.remove(&address);
                    results.push(Ok(()));
                }
                Err(AskError::LostDestination(path)) => {
                    results.push(Err(ActorError::LostDestination(path)))
                }
                Err(AskError::User(msg)) => results.push(Err(ActorError::User(msg))),
            }
        }

        results
    }

    /// A snapshot of every currently registered address; useful for tests
    /// asserting on registry round trips.
    pub fn registered_addresses(&self) -> Vec<ActorPath> {
        self.0.registry.iter().map(|e| e.key().clone()).collect()
    }

    fn install_pattern(&self, mailbox: Mailbox, behavior: Behavior) {
        let msg_process_limit = self.0.config.msg_process_limit.max(1);

        match behavior {
            Behavior::Receive(mut recv_fn) => {
                let system = self.clone();
                tokio::spawn(async move {
                    let mut mailbox = mailbox;
                    let mut processed = 0u32;
                    while let Some(msg) = mailbox.recv().await {
                        let message_id = msg.message_id;
                        let enriched = enrich(&system, msg);
                        let caught =
                            AssertUnwindSafe(recv_fn(enriched)).catch_unwind().await;
                        if caught.is_err() {
                            tracing::warn!(%message_id, "receive handler panicked; dropping this actor's mailbox");
                            system.publish_cancellation(MessageResponse::cancelled(message_id));
                            // Dropping `mailbox` here closes the channel, so any
                            // message still in flight to it resolves as a
                            // cancellation at the dispatch site instead of
                            // hanging forever behind a dead handler.
                            break;
                        }

                        processed += 1;
                        if processed >= msg_process_limit {
                            processed = 0;
                            tokio::task::yield_now().await;
                        }
                    }
                });
            }
            Behavior::MappedMethods(methods) => {
                let system = self.clone();
                let mut senders: HashMap<
                    String,
                    (
                        tokio::sync::mpsc::UnboundedSender<Enriched>,
                        Arc<Mutex<HashSet<Uuid>>>,
                    ),
                > = HashMap::new();

                for (kind, method_fn) in methods {
                    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Enriched>();
                    let stream = UnboundedReceiverStream::new(rx).boxed();
                    let mut output = method_fn(stream);
                    let system = system.clone();
                    let in_flight: Arc<Mutex<HashSet<Uuid>>> = Arc::new(Mutex::new(HashSet::new()));
                    let in_flight_for_task = in_flight.clone();
                    let kind_for_task = kind.clone();

                    tokio::spawn(async move {
                        loop {
                            let next = AssertUnwindSafe(output.next()).catch_unwind().await;
                            match next {
                                Ok(Some(resp)) => {
                                    in_flight_for_task.lock().unwrap().remove(&resp.resp_id);
                                    system.publish_response(resp);
                                }
                                Ok(None) => break,
                                Err(_) => {
                                    tracing::warn!(
                                        kind = %kind_for_task,
                                        "method handler panicked; cancelling its in-flight messages"
                                    );
                                    let pending: Vec<Uuid> =
                                        in_flight_for_task.lock().unwrap().drain().collect();
                                    for id in pending {
                                        system.publish_cancellation(MessageResponse::cancelled(id));
                                    }
                                    break;
                                }
                            }
                        }
                    });
                    senders.insert(kind, (tx, in_flight));
                }

                let system = self.clone();
                tokio::spawn(async move {
                    let mut mailbox = mailbox;
                    let mut processed = 0u32;
                    while let Some(msg) = mailbox.recv().await {
                        match senders.get(&msg.action.kind) {
                            Some((tx, in_flight)) => {
                                in_flight.lock().unwrap().insert(msg.message_id);
                                let message_id = msg.message_id;
                                let enriched = enrich(&system, msg);
                                if tx.send(enriched).is_err() {
                                    in_flight.lock().unwrap().remove(&message_id);
                                    system.publish_cancellation(MessageResponse::cancelled(message_id));
                                }
                            }
                            None => {
                                system.publish_response(MessageResponse::error(
                                    msg.message_id,
                                    format!(
                                        "no handler registered for action '{}'",
                                        msg.action.kind
                                    ),
                                ));
                            }
                        }

                        processed += 1;
                        if processed >= msg_process_limit {
                            processed = 0;
                            tokio::task::yield_now().await;
                        }
                    }
                });
            }
            Behavior::SetupReceive(setup_fn) => {
                let system = self.clone();
                let in_flight: Arc<Mutex<HashSet<Uuid>>> = Arc::new(Mutex::new(HashSet::new()));
                let in_flight_for_input = in_flight.clone();
                let stream = mailbox
                    .into_stream()
                    .inspect(move |msg: &IncomingMessage| {
                        in_flight_for_input.lock().unwrap().insert(msg.message_id);
                    })
                    .boxed();
                let mut output = setup_fn(stream);

                tokio::spawn(async move {
                    loop {
                        let next = AssertUnwindSafe(output.next()).catch_unwind().await;
                        match next {
                            Ok(Some(resp)) => {
                                in_flight.lock().unwrap().remove(&resp.resp_id);
                                system.publish_response(resp);
                            }
                            Ok(None) => break,
                            Err(_) => {
                                tracing::warn!(
                                    "setup_receive handler panicked; cancelling its in-flight messages"
                                );
                                let pending: Vec<Uuid> = in_flight.lock().unwrap().drain().collect();
                                for id in pending {
                                    system.publish_cancellation(MessageResponse::cancelled(id));
                                }
                                break;
                            }
                        }
                    }
                });
            }
        }
    }
}

pub(crate) fn enrich(system: &ActorSystem, msg: IncomingMessage) -> Enriched {
    let message_id = msg.message_id;
    let respond_system = system.clone();
    let respond: RespondFn = Arc::new(move |result| {
        let resp = match result {
            Ok(payload) => MessageResponse::value(message_id, payload),
            Err(err) => MessageResponse::error(message_id, err),
        };
        respond_system.publish_response(resp);
    });
    let sender = msg
        .context_creator
        .clone()
        .map(|addr| system.actor_ref_for(addr));

    Enriched {
        message_id,
        action: msg.action,
        sender,
        respond,
    }
}

fn build_actor(
    factory: &Arc<dyn ActorFactory>,
    path: ActorPath,
    ctx: Context,
) -> Result<Box<dyn Actor>, CreateError> {
    let factory = factory.clone();
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || factory.create(path, ctx)))
        .map_err(|_| CreateError::Panicked)
}
