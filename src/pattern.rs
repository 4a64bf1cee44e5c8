//! The supersession wrapper (`cleanup_cancelled_messages`) and its
//! companion cancellation combinator (`latest_async`), the idiomatic
//! equivalent of a `switchMap`-style "latest wins" operator built on
//! `futures::future::Abortable`.

use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::future::{Abortable, AbortHandle};
use futures::stream::{BoxStream, StreamExt};
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::actor::Enriched;
use crate::message::{IncomingMessage, MessageResponse};
use crate::system::{enrich, ActorSystem};

/// Wraps a stream of an actor's incoming messages so that, for any burst
/// of messages sharing `action_kind`, exactly one (the one `user_fn`
/// ultimately emits) survives as a normal response — every earlier
/// message in the burst is published as a cancellation instead.
///
/// `user_fn` is expected to apply its own "latest wins" operator
/// internally (see [`latest_async`]); this wrapper only tracks which ids
/// have been seen and emits the cancellations once `user_fn` settles on
/// a winner.
pub fn cleanup_cancelled_messages<F>(
    system: ActorSystem,
    incoming: BoxStream<'static, IncomingMessage>,
    action_kind: &str,
    user_fn: F,
) -> BoxStream<'static, MessageResponse>
where
    F: FnOnce(BoxStream<'static, Enriched>) -> BoxStream<'static, MessageResponse> + Send + 'static,
{
    let action_kind = action_kind.to_string();
    let seen: Arc<Mutex<Vec<Uuid>>> = Arc::new(Mutex::new(Vec::new()));

    let seen_for_input = seen.clone();
    let system_for_input = system.clone();
    let enriched = incoming
        .filter(move |msg| futures::future::ready(msg.action.kind == action_kind))
        .map(move |msg| {
            seen_for_input.lock().unwrap().push(msg.message_id);
            enrich(&system_for_input, msg)
        })
        .boxed();

    let output = user_fn(enriched);

    let seen_for_output = seen.clone();
    output
        .map(move |out| {
            let to_cancel: Vec<Uuid> = {
                let seen = seen_for_output.lock().unwrap();
                seen.iter().filter(|id| **id != out.resp_id).cloned().collect()
            };
            for id in to_cancel {
                system.publish_cancellation(MessageResponse::cancelled(id));
            }
            out
        })
        .boxed()
}

/// The idiomatic replacement for a `switchMap`-style "latest wins"
/// operator: for each item pulled from `input`, spawns `f(item)` and
/// aborts whichever task was previously in flight. Only outputs from the
/// most recently started task ever reach the returned stream.
pub fn latest_async<I, O, Fut, F>(
    mut input: BoxStream<'static, I>,
    f: F,
) -> BoxStream<'static, O>
where
    I: Send + 'static,
    O: Send + 'static,
    Fut: Future<Output = O> + Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
{
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let f = Arc::new(f);
    let current: Arc<Mutex<Option<AbortHandle>>> = Arc::new(Mutex::new(None));

    tokio::spawn(async move {
        while let Some(item) = input.next().await {
            let (handle, registration) = AbortHandle::new_pair();
            if let Some(prev) = current.lock().unwrap().replace(handle) {
                prev.abort();
            }

            let fut = f(item);
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Ok(output) = Abortable::new(fut, registration).await {
                    let _ = tx.send(output);
                }
            });
        }
    });

    UnboundedReceiverStream::new(rx).boxed()
}
