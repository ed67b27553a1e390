use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt, stream::BoxStream};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::{feed::FeedStatusResponse, sse::ServerEvent};

/// Name of the SSE event carrying a feed status.
pub const STATUS_EVENT: &str = "status";

/// Convert the status updates of a feed into an SSE response, forwarding
/// events until either the client disconnects or the feed is closed.
pub fn to_sse_stream(
    mut updates: BoxStream<'static, FeedStatusResponse>,
    keep_alive: Duration,
    feed_id: Uuid,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                next = updates.next() => {
                    let Some(status) = next else { break };
                    let payload = match ServerEvent::json(Some(STATUS_EVENT.to_owned()), &status) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!(%feed_id, error = %err, "failed to encode feed status");
                            continue;
                        }
                    };

                    if tx.send(Ok(to_event(payload))).await.is_err() {
                        break;
                    }
                }
            }
        }

        info!(%feed_id, "feed SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(KeepAlive::new().interval(keep_alive).text("keep-alive"))
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}
