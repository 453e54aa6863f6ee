use axum::{
    extract::{Query, State},
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
    routing::get,
};
use futures_util::Stream;
use gigwave_collab::CollabEvent;
use log::{error, info};
use parking_lot::Mutex;
use serde::Serialize;
use std::{
    collections::VecDeque,
    convert::Infallible,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
    task::{Context, Poll, Waker},
};
use utoipa::ToSchema;

use crate::{
    context::ServerContext,
    schemas::EventsQuery,
    serialized::{NowPlaying, Reaction, Request, ToSerialized},
    Router,
};

type ConnectionId = u64;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum ServerEvent {
    /// An audience member submitted a request
    #[serde(rename_all = "camelCase")]
    RequestSubmitted { gig_id: i32, request: Request },
    /// A request was accepted, rejected, or played
    #[serde(rename_all = "camelCase")]
    RequestUpdated {
        gig_id: i32,
        request_id: i32,
        new_status: String,
    },
    /// The number of voters of a request changed
    #[serde(rename_all = "camelCase")]
    VoteUpdate {
        gig_id: i32,
        request_id: i32,
        votes: u32,
    },
    /// The track a gig is playing changed, or was cleared
    #[serde(rename_all = "camelCase")]
    NowPlayingUpdate {
        gig_id: i32,
        now_playing: Option<NowPlaying>,
    },
    /// A gig went live, ended, was flagged, or was cancelled
    #[serde(rename_all = "camelCase")]
    GigStatusUpdate { gig_id: i32, new_status: String },
    /// Someone sent an emoji to a live gig
    #[serde(rename_all = "camelCase")]
    Reaction { gig_id: i32, reaction: Reaction },
}

impl ServerEvent {
    fn gig_id(&self) -> i32 {
        match self {
            Self::RequestSubmitted { gig_id, .. }
            | Self::RequestUpdated { gig_id, .. }
            | Self::VoteUpdate { gig_id, .. }
            | Self::NowPlayingUpdate { gig_id, .. }
            | Self::GigStatusUpdate { gig_id, .. }
            | Self::Reaction { gig_id, .. } => *gig_id,
        }
    }
}

impl From<CollabEvent> for ServerEvent {
    fn from(value: CollabEvent) -> Self {
        match value {
            CollabEvent::RequestSubmitted { gig_id, request } => Self::RequestSubmitted {
                gig_id,
                request: request.to_serialized(),
            },
            CollabEvent::RequestUpdated {
                gig_id,
                request_id,
                new_status,
            } => Self::RequestUpdated {
                gig_id,
                request_id,
                new_status: new_status.to_string(),
            },
            CollabEvent::VoteUpdate {
                gig_id,
                request_id,
                votes,
            } => Self::VoteUpdate {
                gig_id,
                request_id,
                votes,
            },
            CollabEvent::NowPlayingUpdate {
                gig_id,
                now_playing,
            } => Self::NowPlayingUpdate {
                gig_id,
                now_playing: now_playing.to_serialized(),
            },
            CollabEvent::GigStatusUpdate { gig_id, new_status } => Self::GigStatusUpdate {
                gig_id,
                new_status: new_status.to_string(),
            },
            CollabEvent::Reaction { gig_id, reaction } => Self::Reaction {
                gig_id,
                reaction: reaction.to_serialized(),
            },
        }
    }
}

/// Manages server sent event connections
pub struct ServerSentEvents {
    me: Weak<Self>,
    next_id: AtomicU64,
    connections: Mutex<Vec<Connection>>,
}

struct Connection {
    id: ConnectionId,
    /// Only events of this gig are sent, if set
    gig_id: Option<i32>,
    pending_messages: Arc<Mutex<VecDeque<ServerEvent>>>,
    waker: Arc<Mutex<Option<Waker>>>,
}

pub struct ConnectionHandle {
    id: ConnectionId,
    /// A reference to [Connection]'s pending messages
    pending_messages: Arc<Mutex<VecDeque<ServerEvent>>>,
    /// A reference to [Connection]'s stored [Waker]
    waker: Arc<Mutex<Option<Waker>>>,
    /// Required to remove connection when dropped
    manager: Weak<ServerSentEvents>,
}

impl ServerSentEvents {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            next_id: AtomicU64::new(1),
            connections: Default::default(),
        })
    }

    pub fn broadcast(&self, event: ServerEvent) {
        let connections = self.connections.lock();
        let gig_id = event.gig_id();

        for connection in connections.iter() {
            if connection.gig_id.is_some_and(|id| id != gig_id) {
                continue;
            }

            connection.send(event.clone())
        }
    }

    pub fn connect(&self, gig_id: Option<i32>) -> ConnectionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let connection = Connection::new(id, gig_id);
        let handle = connection.handle(self.me.clone());

        self.connections.lock().push(connection);
        info!("Event stream {} connected", id);

        handle
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    fn disconnect(&self, id: ConnectionId) {
        self.connections.lock().retain(|c| c.id != id);
        info!(
            "Event stream {} disconnected, {} remain",
            id,
            self.connection_count()
        );
    }
}

impl Connection {
    fn new(id: ConnectionId, gig_id: Option<i32>) -> Self {
        Self {
            id,
            gig_id,
            pending_messages: Default::default(),
            waker: Default::default(),
        }
    }

    fn send(&self, message: ServerEvent) {
        self.pending_messages.lock().push_back(message);

        if let Some(waker) = self.waker.lock().take() {
            waker.wake()
        }
    }

    fn handle(&self, manager: Weak<ServerSentEvents>) -> ConnectionHandle {
        ConnectionHandle {
            id: self.id,
            pending_messages: self.pending_messages.clone(),
            waker: self.waker.clone(),
            manager,
        }
    }
}

impl Stream for ConnectionHandle {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut pending_messages = self.pending_messages.lock();

        while let Some(message) = pending_messages.pop_front() {
            match serde_json::to_string(&message) {
                Ok(data) => return Poll::Ready(Some(Ok(Event::default().data(data)))),
                Err(e) => error!("Failed to serialize event {:?}: {}", message, e),
            }
        }

        *self.waker.lock() = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if let Some(manager) = self.manager.upgrade() {
            manager.disconnect(self.id)
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/events",
    tag = "events",
    params(EventsQuery),
    responses(
        (
            status = 200,
            content_type = "text/event-stream",
            description = "A stream of gig events",
            body = ServerEvent
        )
    )
)]
pub async fn event_stream(
    State(context): State<ServerContext>,
    Query(query): Query<EventsQuery>,
) -> Sse<ConnectionHandle> {
    Sse::new(context.sse.connect(query.gig_id)).keep_alive(KeepAlive::default())
}

pub fn router() -> Router {
    Router::new().route("/", get(event_stream))
}
