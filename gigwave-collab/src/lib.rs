mod catalog;
mod db;
mod errors;
mod events;
mod gigs;
mod lifecycle;

use std::sync::Arc;

pub use catalog::*;
pub use db::*;
pub use errors::*;
pub use events::*;
pub use gigs::*;
pub use lifecycle::*;

use crossbeam::channel::unbounded;
use gigwave_core::Config;
pub use gigwave_core::{PrimaryKey, UserId};

/// The gigwave collab system, exposing every gig, request, and catalog operation.
pub struct Collab {
    context: CollabContext,
    event_receiver: EventReceiver,

    pub gigs: GigManager,
    pub catalog: Catalog,
    pub lifecycle: Lifecycle,
}

/// A type passed to various components of the collab system, to access state and emit events.
#[derive(Clone)]
pub struct CollabContext {
    pub database: SharedDatabase,
    pub config: Arc<Config>,
    event_sender: EventSender,
}

impl Collab {
    pub fn new(database: SharedDatabase, config: Config) -> Self {
        let (event_sender, event_receiver) = unbounded();

        let context = CollabContext {
            database,
            config: Arc::new(config),
            event_sender,
        };

        Self {
            gigs: GigManager::new(&context),
            catalog: Catalog::new(&context),
            lifecycle: Lifecycle::new(&context),
            context,
            event_receiver,
        }
    }

    /// Returns a receiver of all events emitted by the collab system.
    /// Receivers share one queue, so there should only be one consumer.
    pub fn events(&self) -> EventReceiver {
        self.event_receiver.clone()
    }

    pub fn config(&self) -> &Config {
        &self.context.config
    }

    /// Resolves a bearer token to a caller
    pub async fn authenticate(&self, token: &str) -> GigResult<Caller> {
        match self.context.database.session_by_token(token).await {
            Ok(session) => Ok(Caller::User(session.user_id)),
            Err(DatabaseError::NotFound { .. }) => Err(GigError::Unauthenticated),
            Err(e) => Err(e.into()),
        }
    }
}

impl CollabContext {
    /// Emits an event
    pub fn emit(&self, event: CollabEvent) {
        // Nobody listening is fine
        let _ = self.event_sender.send(event);
    }

    /// Returns the gig if the caller is its artist
    pub async fn gig_as_artist(&self, caller: &Caller, gig_id: PrimaryKey) -> GigResult<GigData> {
        let user_id = caller.user_id()?;
        let gig = self.database.gig_by_id(gig_id).await?;

        if gig.artist_id != user_id {
            return Err(GigError::PermissionDenied);
        }

        Ok(gig)
    }
}
