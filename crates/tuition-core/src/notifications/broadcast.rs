use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures_util::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError};

use super::{NotificationError, NotificationEvent, NotificationPublisher};
use crate::config::NotificationConfig;

/// In-process publish/subscribe channel backed by a bounded tokio broadcast buffer.
///
/// Sending never waits on subscribers. A subscriber that falls more than `buffer` events
/// behind skips ahead and loses the overflow.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<NotificationEvent>,
}

impl BroadcastNotifier {
    pub fn new(config: &NotificationConfig) -> Self {
        let (sender, _) = broadcast::channel(config.buffer.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl NotificationPublisher for BroadcastNotifier {
    fn publish(&self, event: NotificationEvent) -> Result<usize, NotificationError> {
        // No connected subscribers is a normal outcome for at-most-once delivery.
        Ok(self.sender.send(event).unwrap_or(0))
    }
}

/// Server-sent events endpoint streaming every published notification.
pub fn event_router(notifier: Arc<BroadcastNotifier>) -> Router {
    Router::new()
        .route("/api/v1/events", get(events_handler))
        .with_state(notifier)
}

async fn events_handler(
    State(notifier): State<Arc<BroadcastNotifier>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(
        subscribers = notifier.subscriber_count() + 1,
        "event stream subscriber connected"
    );
    Sse::new(event_stream(notifier.subscribe())).keep_alive(KeepAlive::default())
}

fn event_stream(
    receiver: broadcast::Receiver<NotificationEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let sse = match Event::default().event(event.label()).json_data(&event) {
                        Ok(sse) => sse,
                        Err(err) => {
                            tracing::warn!(error = %err, "dropping unencodable notification");
                            continue;
                        }
                    };
                    return Some((Ok::<Event, Infallible>(sse), receiver));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event stream subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}
