use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;

use conduit::prelude::*;
use conduit::pattern::latest_async;

struct EchoActor;

#[async_trait]
impl Actor for EchoActor {
    fn behavior(&mut self, _ctx: &Context) -> Behavior {
        let mut methods: HashMap<String, MethodFn> = HashMap::new();
        methods.insert(
            "echo".to_string(),
            Box::new(|stream| {
                stream
                    .map(|enriched| {
                        MessageResponse::value(enriched.message_id, enriched.action.payload)
                    })
                    .boxed()
            }),
        );
        Behavior::MappedMethods(methods)
    }
}

fn echo_factory() -> Arc<dyn ActorFactory> {
    Arc::new(|_path: ActorPath, _ctx: Context| -> Box<dyn Actor> { Box::new(EchoActor) })
}

struct DebounceActor;

#[async_trait]
impl Actor for DebounceActor {
    fn behavior(&mut self, ctx: &Context) -> Behavior {
        let ctx = ctx.clone();
        Behavior::SetupReceive(Box::new(move |incoming| {
            ctx.cleanup_cancelled_messages(incoming, "compute", |enriched_stream| {
                latest_async(enriched_stream, |enriched| async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    MessageResponse::value(enriched.message_id, enriched.action.payload)
                })
            })
        }))
    }
}

fn debounce_factory() -> Arc<dyn ActorFactory> {
    Arc::new(|_path: ActorPath, _ctx: Context| -> Box<dyn Actor> { Box::new(DebounceActor) })
}

struct StoppableActor {
    probe: conduit_testkit::probe::channel::ChannelProbe<(), String>,
}

#[async_trait]
impl Actor for StoppableActor {
    async fn post_stop(&mut self) {
        self.probe.event("stopped".to_string());
    }

    fn behavior(&mut self, _ctx: &Context) -> Behavior {
        let mut methods: HashMap<String, MethodFn> = HashMap::new();
        methods.insert(
            "stop".to_string(),
            Box::new(|stream| {
                stream
                    .map(|enriched| MessageResponse::value(enriched.message_id, Payload::new(())))
                    .boxed()
            }),
        );
        Behavior::MappedMethods(methods)
    }
}

struct CounterActor {
    count: Arc<AtomicU32>,
}

#[async_trait]
impl Actor for CounterActor {
    fn behavior(&mut self, _ctx: &Context) -> Behavior {
        let count = self.count.clone();
        let mut methods: HashMap<String, MethodFn> = HashMap::new();
        methods.insert(
            "bump".to_string(),
            Box::new(move |stream| {
                let count = count.clone();
                stream
                    .map(move |enriched| {
                        let value = count.fetch_add(1, Ordering::SeqCst) + 1;
                        MessageResponse::value(enriched.message_id, Payload::new(value))
                    })
                    .boxed()
            }),
        );
        Behavior::MappedMethods(methods)
    }
}

fn counter_factory() -> Arc<dyn ActorFactory> {
    Arc::new(|_path: ActorPath, _ctx: Context| -> Box<dyn Actor> {
        Box::new(CounterActor {
            count: Arc::new(AtomicU32::new(0)),
        })
    })
}

async fn ask_u32(actor: &ActorRef, kind: &str) -> u32 {
    match actor.ask(kind, Payload::new(())).await.unwrap() {
        AskOutcome::Value(payload) => *payload.downcast::<u32>().unwrap(),
        AskOutcome::Cancelled => panic!("expected a value, got a cancellation"),
    }
}

/// Scenario A — basic ask/respond via a `MappedMethods` actor.
#[tokio::test]
async fn scenario_a_basic_ask_respond() {
    let system = ActorSystem::new(ActorSystemConfig::default());
    let actor = system.actor_of(echo_factory(), Some("echo")).await.unwrap();

    let outcome = actor.ask("echo", Payload::new(7u32)).await.unwrap();
    match outcome {
        AskOutcome::Value(payload) => assert_eq!(payload.downcast::<u32>(), Some(&7u32)),
        AskOutcome::Cancelled => panic!("expected a value"),
    }
}

/// Scenario B — a burst of same-kind messages collapses to one response;
/// the rest resolve as cancellations, via `cleanup_cancelled_messages` +
/// `latest_async`.
#[tokio::test]
async fn scenario_b_supersession_collapses_a_burst() {
    let system = ActorSystem::new(ActorSystemConfig::default());
    let actor = system
        .actor_of(debounce_factory(), Some("debounce"))
        .await
        .unwrap();

    let fut = tokio::time::timeout(
        Duration::from_secs(2),
        futures::future::join3(
            actor.ask("compute", Payload::new(0u32)),
            actor.ask("compute", Payload::new(1u32)),
            actor.ask("compute", Payload::new(2u32)),
        ),
    );

    let (r0, r1, r2) = fut.await.expect("scenario did not settle in time");

    assert!(matches!(r0.unwrap(), AskOutcome::Cancelled));
    assert!(matches!(r1.unwrap(), AskOutcome::Cancelled));
    match r2.unwrap() {
        AskOutcome::Value(payload) => assert_eq!(payload.downcast::<u32>(), Some(&2u32)),
        AskOutcome::Cancelled => panic!("the latest message in the burst should win"),
    }
}

/// Scenario C — graceful stop: the stop ack is awaited, `post_stop` runs,
/// then the actor is deregistered, in that order.
#[tokio::test]
async fn scenario_c_graceful_stop_ordering() {
    let system = ActorSystem::new(ActorSystemConfig::default());
    let (probe, listen) = conduit_testkit::probe::channel::probe();

    let factory: Arc<dyn ActorFactory> = Arc::new(move |_path: ActorPath, _ctx: Context| {
        Box::new(StoppableActor {
            probe: probe.clone(),
        }) as Box<dyn Actor>
    });

    let actor = system.actor_of(factory, Some("stoppable")).await.unwrap();
    let address = actor.address().clone();

    let results = system.graceful_stop(&[actor]).await;
    assert!(results[0].is_ok());

    assert_eq!(listen.recv(), "stopped".to_string());
    assert!(!system.registered_addresses().contains(&address));
}

/// Scenario D — reincarnation replaces the actor at an address with a
/// fresh instance from the original factory; prior in-memory state is
/// gone.
#[tokio::test]
async fn scenario_d_reincarnation_resets_state() {
    let system = ActorSystem::new(ActorSystemConfig::default());
    let factory = counter_factory();

    let actor = system
        .actor_of(factory.clone(), Some("counter"))
        .await
        .unwrap();
    let address = actor.address().clone();

    assert_eq!(ask_u32(&actor, "bump").await, 1);
    assert_eq!(ask_u32(&actor, "bump").await, 2);

    let reincarnated = system.reincarnate(address, factory).await.unwrap();
    assert_eq!(ask_u32(&reincarnated, "bump").await, 1);
}

/// Scenario E — glob-based selection returns only matching addresses.
#[tokio::test]
async fn scenario_e_selection_with_glob() {
    let system = ActorSystem::new(ActorSystemConfig::default());
    system.actor_of(echo_factory(), Some("alpha1")).await.unwrap();
    system.actor_of(echo_factory(), Some("alpha2")).await.unwrap();
    system.actor_of(echo_factory(), Some("beta")).await.unwrap();

    let matched = system.actor_selection("alpha*");
    assert_eq!(matched.len(), 2);
    for actor_ref in &matched {
        assert!(actor_ref.address().as_str().starts_with("/system/alpha"));
    }
}

/// Scenario F — asking an address with no registered actor resolves as a
/// cancellation, never an error or a hang.
#[tokio::test]
async fn scenario_f_lost_destination_ask() {
    let system = ActorSystem::new(ActorSystemConfig::default());
    let ghost = system.actor_ref_for(ActorPath::create("ghost").unwrap());

    let outcome = ghost.ask("anything", Payload::new(())).await.unwrap();
    assert!(matches!(outcome, AskOutcome::Cancelled));
}
