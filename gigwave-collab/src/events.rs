use crossbeam::channel::{Receiver, Sender};
use gigwave_core::{GigStatus, NowPlaying, RequestStatus};

use crate::{PrimaryKey, ReactionData, RequestData};

pub type EventSender = Sender<CollabEvent>;
pub type EventReceiver = Receiver<CollabEvent>;

/// Events emitted when gig state changes
#[derive(Debug, Clone)]
pub enum CollabEvent {
    /// An audience member submitted a new request
    RequestSubmitted {
        gig_id: PrimaryKey,
        request: RequestData,
    },
    /// A request changed status
    RequestUpdated {
        gig_id: PrimaryKey,
        request_id: PrimaryKey,
        new_status: RequestStatus,
    },
    /// The number of distinct voters of a request changed
    VoteUpdate {
        gig_id: PrimaryKey,
        request_id: PrimaryKey,
        votes: u32,
    },
    /// The now playing pointer of a gig changed
    NowPlayingUpdate {
        gig_id: PrimaryKey,
        now_playing: Option<NowPlaying>,
    },
    /// A gig moved through its lifecycle
    GigStatusUpdate {
        gig_id: PrimaryKey,
        new_status: GigStatus,
    },
    /// Someone sent an emoji to a live gig
    Reaction {
        gig_id: PrimaryKey,
        reaction: ReactionData,
    },
}

impl CollabEvent {
    pub fn gig_id(&self) -> PrimaryKey {
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
