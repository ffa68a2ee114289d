//! The serialized access point in front of the UI sink.
//!
//! `UiDispatcher::spawn` moves the sink into a single task that drains a
//! bounded `mpsc` mailbox. Producers (stream relays, upload receivers,
//! sessions) only ever hold a cloneable [`UiHandle`], so the dispatcher task
//! is the sole writer of UI-visible state and signals reach the sink in the
//! order they were posted.
//!
//! Each posted signal carries the liveness token of the session scope that
//! produced it. Signals whose token has been cancelled by the time they are
//! dequeued (the session was closed, or switched to another chat) are dropped.

use chatrelay_types::chat::ChatId;
use chatrelay_types::event::UiEvent;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::attachment::buffer::AttachmentBuffer;

use super::sink::UiSink;

enum Envelope {
    Signal {
        event: UiEvent,
        liveness: CancellationToken,
    },
    /// Resolved to `AttachmentsChanged` at delivery time, so the sink always
    /// sees the buffer as it is when the signal is handled.
    PendingChanged {
        chat_id: ChatId,
        pending: AttachmentBuffer,
        liveness: CancellationToken,
    },
    Flush(oneshot::Sender<()>),
}

/// Spawns the task that owns a [`UiSink`].
pub struct UiDispatcher;

impl UiDispatcher {
    /// Move `sink` into a new dispatcher task.
    ///
    /// The task ends once every [`UiHandle`] has been dropped; the join
    /// handle then yields the sink back.
    pub fn spawn<S: UiSink>(mut sink: S, capacity: usize) -> (UiHandle, JoinHandle<S>) {
        let (tx, mut rx) = mpsc::channel::<Envelope>(capacity.max(1));

        let task = tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                match envelope {
                    Envelope::Signal { event, liveness } => {
                        if liveness.is_cancelled() {
                            debug!(chat_id = %event.chat_id(), "dropping signal from a closed scope");
                            continue;
                        }
                        trace!(chat_id = %event.chat_id(), terminal = event.is_terminal(), "delivering signal");
                        sink.handle(event);
                    }
                    Envelope::PendingChanged {
                        chat_id,
                        pending,
                        liveness,
                    } => {
                        if liveness.is_cancelled() {
                            continue;
                        }
                        sink.handle(UiEvent::AttachmentsChanged {
                            chat_id,
                            file_names: pending.file_names(),
                        });
                    }
                    Envelope::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("UI dispatcher stopped");
            sink
        });

        (UiHandle { tx }, task)
    }
}

/// Cloneable producer side of the dispatcher.
#[derive(Clone)]
pub struct UiHandle {
    tx: mpsc::Sender<Envelope>,
}

impl UiHandle {
    /// Queue a signal for the sink.
    ///
    /// If the dispatcher has already stopped the signal is discarded.
    pub async fn post(&self, event: UiEvent, liveness: &CancellationToken) {
        let envelope = Envelope::Signal {
            event,
            liveness: liveness.clone(),
        };
        if self.tx.send(envelope).await.is_err() {
            debug!("UI dispatcher gone, signal discarded");
        }
    }

    /// Queue an attachment-list refresh for the sink.
    pub(crate) async fn post_pending_changed(
        &self,
        chat_id: ChatId,
        pending: &AttachmentBuffer,
        liveness: &CancellationToken,
    ) {
        let envelope = Envelope::PendingChanged {
            chat_id,
            pending: pending.clone(),
            liveness: liveness.clone(),
        };
        if self.tx.send(envelope).await.is_err() {
            debug!("UI dispatcher gone, attachment update discarded");
        }
    }

    /// Wait until every signal posted before this call has been handled.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Envelope::Flush(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Whether the dispatcher task is still accepting signals.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl std::fmt::Debug for UiHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiHandle")
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Recorder;
    use chatrelay_types::attachment::Attachment;

    fn token(text: &str) -> UiEvent {
        UiEvent::Token {
            chat_id: ChatId::from("c1"),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn delivers_in_post_order() {
        let recorder = Recorder::default();
        let (ui, _task) = UiDispatcher::spawn(recorder.clone(), 4);
        let live = CancellationToken::new();

        for t in ["a", "b", "c", "d", "e", "f"] {
            ui.post(token(t), &live).await;
        }
        ui.flush().await;

        assert_eq!(recorder.tokens(), vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[tokio::test]
    async fn drops_signals_of_cancelled_scope() {
        let recorder = Recorder::default();
        let (ui, _task) = UiDispatcher::spawn(recorder.clone(), 16);
        let live = CancellationToken::new();
        let stale = CancellationToken::new();
        stale.cancel();

        ui.post(token("kept"), &live).await;
        ui.post(token("dropped"), &stale).await;
        ui.flush().await;

        assert_eq!(recorder.tokens(), vec!["kept"]);
    }

    #[tokio::test]
    async fn pending_changed_reads_buffer_at_delivery() {
        let recorder = Recorder::default();
        let (ui, _task) = UiDispatcher::spawn(recorder.clone(), 16);
        let live = CancellationToken::new();
        let pending = AttachmentBuffer::new();
        pending.add(Attachment::new("a.png", "image/png", vec![1]));

        ui.post_pending_changed(ChatId::from("c1"), &pending, &live).await;
        ui.flush().await;

        assert_eq!(recorder.events().len(), 1);
        assert!(matches!(
            &recorder.events()[0],
            UiEvent::AttachmentsChanged { file_names, .. } if file_names == &vec!["a.png".to_string()]
        ));
    }

    #[tokio::test]
    async fn task_returns_sink_when_handles_dropped() {
        let recorder = Recorder::default();
        let (ui, task) = UiDispatcher::spawn(recorder, 16);
        let live = CancellationToken::new();
        ui.post(token("x"), &live).await;
        drop(ui);

        let sink = task.await.unwrap();
        assert_eq!(sink.tokens(), vec!["x"]);
    }
}
