//! Per-actor mailboxes: a FIFO queue of incoming messages, owned by exactly
//! one actor record for its lifetime. A `capacity` of `0` yields an
//! unbounded mailbox; any other value bounds it, with `send` reporting
//! backpressure instead of growing the queue without limit.

use futures::stream::{BoxStream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, UnboundedReceiverStream};

use crate::message::IncomingMessage;

#[derive(Clone)]
enum SenderInner {
    Unbounded(mpsc::UnboundedSender<IncomingMessage>),
    Bounded(mpsc::Sender<IncomingMessage>),
}

/// The sending half installed into the registry so the arbiter can deliver
/// to this actor. Cloneable so multiple senders (asks, tells, children)
/// can hold it concurrently; the mailbox itself is still drained by a
/// single receiver task.
#[derive(Clone)]
pub struct MailboxSender {
    inner: SenderInner,
}

impl MailboxSender {
    /// Enqueues `msg`. Fails, handing the message back, if the mailbox has
    /// been dropped — or, for a bounded mailbox, if it is currently full.
    pub fn send(&self, msg: IncomingMessage) -> Result<(), IncomingMessage> {
        match &self.inner {
            SenderInner::Unbounded(tx) => tx.send(msg).map_err(|e| e.0),
            SenderInner::Bounded(tx) => tx.try_send(msg).map_err(|e| match e {
                mpsc::error::TrySendError::Full(m) => m,
                mpsc::error::TrySendError::Closed(m) => m,
            }),
        }
    }
}

enum ReceiverInner {
    Unbounded(mpsc::UnboundedReceiver<IncomingMessage>),
    Bounded(mpsc::Receiver<IncomingMessage>),
}

/// The receiving half, consumed exactly once by the actor's dispatch task.
pub struct Mailbox {
    inner: ReceiverInner,
}

impl Mailbox {
    /// `capacity == 0` means unbounded, matching `ActorSystemConfig`'s
    /// convention.
    pub fn new(capacity: usize) -> (MailboxSender, Mailbox) {
        if capacity == 0 {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                MailboxSender { inner: SenderInner::Unbounded(tx) },
                Mailbox { inner: ReceiverInner::Unbounded(rx) },
            )
        } else {
            let (tx, rx) = mpsc::channel(capacity);
            (
                MailboxSender { inner: SenderInner::Bounded(tx) },
                Mailbox { inner: ReceiverInner::Bounded(rx) },
            )
        }
    }

    pub async fn recv(&mut self) -> Option<IncomingMessage> {
        match &mut self.inner {
            ReceiverInner::Unbounded(rx) => rx.recv().await,
            ReceiverInner::Bounded(rx) => rx.recv().await,
        }
    }

    /// Consumes the mailbox into a stream, for patterns (`SetupReceive`)
    /// that own the whole incoming stream rather than pulling one message
    /// at a time.
    pub fn into_stream(self) -> BoxStream<'static, IncomingMessage> {
        match self.inner {
            ReceiverInner::Unbounded(rx) => UnboundedReceiverStream::new(rx).boxed(),
            ReceiverInner::Bounded(rx) => ReceiverStream::new(rx).boxed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ActorPath;
    use crate::message::{Action, Payload};
    use uuid::Uuid;

    #[tokio::test]
    async fn delivers_messages_in_fifo_order() {
        let (tx, mut mailbox) = Mailbox::new(0);
        let address = ActorPath::create("alpha").unwrap();

        for i in 0..3u32 {
            tx.send(IncomingMessage {
                message_id: Uuid::new_v4(),
                address: address.clone(),
                action: Action::new("count", Payload::new(i)),
                context_creator: None,
            })
            .unwrap();
        }

        for expected in 0..3u32 {
            let msg = mailbox.recv().await.unwrap();
            assert_eq!(msg.action.payload.downcast::<u32>(), Some(&expected));
        }
    }

    #[tokio::test]
    async fn bounded_mailbox_reports_backpressure_once_full() {
        let (tx, mut mailbox) = Mailbox::new(1);
        let address = ActorPath::create("alpha").unwrap();
        let make_msg = || IncomingMessage {
            message_id: Uuid::new_v4(),
            address: address.clone(),
            action: Action::new("count", Payload::new(0u32)),
            context_creator: None,
        };

        tx.send(make_msg()).unwrap();
        assert!(tx.send(make_msg()).is_err());

        mailbox.recv().await.unwrap();
        tx.send(make_msg()).unwrap();
    }
}
