use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::automation::{
    error::DriverError,
    remote::{Ack, ActionChannel, Intent},
};

/// An intent waiting in the queue together with its reply slot.
#[derive(Debug)]
pub struct Dispatched {
    pub intent: Intent,
    reply: oneshot::Sender<Result<Ack, String>>,
}

impl Dispatched {
    /// Tell the submitter the intent was forwarded.
    pub fn ack(self) {
        let _ = self.reply.send(Ok(Ack));
    }

    /// Tell the submitter the intent could not be forwarded.
    pub fn reject(self, reason: impl Into<String>) {
        let _ = self.reply.send(Err(reason.into()));
    }
}

/// [`ActionChannel`] that queues intents for a single executor task.
///
/// Clones share the queue, so every intent submitted through any clone is
/// executed one at a time, in the order it was enqueued.
#[derive(Debug, Clone)]
pub struct DispatchChannel {
    tx: mpsc::Sender<Dispatched>,
}

/// Executor side of a [`DispatchChannel`].
#[derive(Debug)]
pub struct IntentReceiver {
    rx: mpsc::Receiver<Dispatched>,
}

impl DispatchChannel {
    /// Create a channel whose queue holds at most `capacity` pending intents.
    pub fn new(capacity: usize) -> (Self, IntentReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, IntentReceiver { rx })
    }
}

#[async_trait]
impl ActionChannel for DispatchChannel {
    async fn submit(&self, intent: Intent) -> Result<Ack, DriverError> {
        let (reply, answer) = oneshot::channel();
        let queued = Dispatched {
            intent: intent.clone(),
            reply,
        };
        if self.tx.send(queued).await.is_err() {
            return Err(DriverError::channel(intent, "dispatch queue closed"));
        }

        match answer.await {
            Ok(Ok(ack)) => Ok(ack),
            Ok(Err(reason)) => Err(DriverError::channel(intent, reason)),
            Err(_) => Err(DriverError::channel(intent, "executor dropped the intent")),
        }
    }
}

impl IntentReceiver {
    /// Next queued intent; `None` once every [`DispatchChannel`] is dropped.
    pub async fn recv(&mut self) -> Option<Dispatched> {
        self.rx.recv().await
    }

    /// Forward every queued intent to `target` until the senders are gone.
    ///
    /// Returns the number of intents handled.
    pub async fn serve(mut self, target: Arc<dyn ActionChannel>) -> usize {
        let mut handled = 0;
        while let Some(dispatched) = self.recv().await {
            handled += 1;
            debug!(target: "pilot.dispatch", intent = %dispatched.intent, "executing");
            match target.submit(dispatched.intent.clone()).await {
                Ok(_) => dispatched.ack(),
                Err(err) => {
                    warn!(target: "pilot.dispatch", intent = %dispatched.intent, error = %err, "intent failed");
                    let reason = match err {
                        DriverError::Channel { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    dispatched.reject(reason);
                }
            }
        }
        debug!(target: "pilot.dispatch", handled, "dispatch queue drained");
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submit_fails_once_executor_is_gone() {
        let (channel, rx) = DispatchChannel::new(4);
        drop(rx);
        let err = channel
            .submit(Intent::Click("#go".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Channel { ref reason, .. } if reason == "dispatch queue closed"));
    }

    #[tokio::test]
    async fn dropped_reply_is_a_channel_error() {
        let (channel, mut rx) = DispatchChannel::new(4);
        let executor = tokio::spawn(async move {
            let dispatched = rx.recv().await.unwrap();
            drop(dispatched);
        });
        let err = channel.submit(Intent::Type("x".into())).await.unwrap_err();
        executor.await.unwrap();
        assert!(matches!(
            err,
            DriverError::Channel { intent: Intent::Type(_), .. }
        ));
    }

    #[tokio::test]
    async fn rejection_reason_reaches_submitter() {
        let (channel, mut rx) = DispatchChannel::new(1);
        tokio::spawn(async move {
            while let Some(d) = rx.recv().await {
                d.reject("element is covered");
            }
        });
        let err = channel
            .submit(Intent::Click("#submit".into()))
            .await
            .unwrap_err();
        match err {
            DriverError::Channel { intent, reason } => {
                assert_eq!(intent, Intent::Click("#submit".into()));
                assert_eq!(reason, "element is covered");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
