use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gigwave_core::{GigStatus, NowPlaying, PlaylistSource, PrimaryKey, RequestStatus, UserId};
use serde_json::Value;
use thiserror::Error;

mod data;
pub use data::*;

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;
pub type SharedDatabase = Arc<dyn Database>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    /// A conditional update found the resource in a different state than expected
    #[error("{resource} was modified concurrently")]
    Stale { resource: &'static str },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Represents a type that can fetch and store gigwave data.
///
/// Every method is a single atomic unit as far as callers are concerned,
/// in particular [Database::transition_request] and [Database::transition_gig]
/// must apply all of their writes or none of them.
#[async_trait]
pub trait Database: Send + Sync {
    async fn session_by_token(&self, token: &str) -> Result<SessionData>;

    async fn gig_by_id(&self, gig_id: PrimaryKey) -> Result<GigData>;
    async fn list_gigs(&self) -> Result<Vec<GigData>>;
    async fn create_gig(&self, new_gig: NewGig) -> Result<GigData>;
    /// Replaces the details an artist can edit, leaving status and counters alone
    async fn update_gig(&self, gig_id: PrimaryKey, update: UpdatedGig) -> Result<GigData>;
    /// Replaces the playlist source, clearing whichever kind was set before
    async fn update_playlist_source(
        &self,
        gig_id: PrimaryKey,
        source: Option<PlaylistSource>,
    ) -> Result<GigData>;
    async fn update_now_playing(
        &self,
        gig_id: PrimaryKey,
        now_playing: Option<NowPlaying>,
    ) -> Result<()>;
    /// Changes the status of a gig if it still has the expected status,
    /// otherwise fails with [DatabaseError::Stale]
    async fn transition_gig(&self, transition: GigTransition) -> Result<GigData>;

    async fn playlist_by_id(&self, playlist_id: PrimaryKey) -> Result<PlaylistData>;
    async fn list_playlists(&self, artist_id: &str) -> Result<Vec<PlaylistData>>;
    async fn create_playlist(&self, new_playlist: NewPlaylist) -> Result<PlaylistData>;
    async fn update_playlist_tracks(
        &self,
        playlist_id: PrimaryKey,
        tracks: Vec<Value>,
    ) -> Result<PlaylistData>;
    /// Deletes a playlist, detaching it from every gig it was attached to
    async fn delete_playlist(&self, playlist_id: PrimaryKey) -> Result<()>;

    /// Returns the master catalog of an artist, in insertion order
    async fn master_tracks(&self, artist_id: &str) -> Result<Vec<MasterTrackData>>;
    async fn create_master_track(&self, new_track: NewMasterTrack) -> Result<MasterTrackData>;
    async fn master_track_by_id(&self, track_id: PrimaryKey) -> Result<MasterTrackData>;
    async fn delete_master_track(&self, track_id: PrimaryKey) -> Result<()>;

    async fn request_by_id(&self, gig_id: PrimaryKey, request_id: PrimaryKey)
        -> Result<RequestData>;
    async fn list_requests(&self, gig_id: PrimaryKey) -> Result<Vec<RequestData>>;
    async fn create_request(&self, new_request: NewRequest) -> Result<RequestData>;
    /// Changes the status of a request and applies its effects on the gig,
    /// failing with [DatabaseError::Stale] if the request isn't in the expected status
    async fn transition_request(
        &self,
        transition: RequestTransition,
    ) -> Result<TransitionedRequest>;

    /// Creates a vote, or does nothing if the voter already voted on the request
    async fn upsert_vote(&self, new_vote: NewVote) -> Result<()>;
    async fn list_votes(&self, gig_id: PrimaryKey) -> Result<Vec<VoteData>>;

    /// Records an interest, or raises the status of an existing one.
    /// A joined interest is never lowered back to interested.
    async fn upsert_interest(&self, new_interest: NewInterest) -> Result<InterestData>;
    /// Removes an interest, doing nothing if there is none
    async fn delete_interest(&self, gig_id: PrimaryKey, user_id: &str) -> Result<()>;
    async fn list_interests(&self, gig_id: PrimaryKey) -> Result<Vec<InterestData>>;
    async fn interests_for_user(&self, user_id: &str) -> Result<Vec<InterestData>>;

    async fn create_reaction(&self, new_reaction: NewReaction) -> Result<ReactionData>;
    /// Returns the latest reactions of a gig, oldest first
    async fn recent_reactions(&self, gig_id: PrimaryKey, limit: usize)
        -> Result<Vec<ReactionData>>;
}

#[derive(Debug)]
pub struct NewGig {
    pub artist_id: UserId,
    pub title: String,
    pub description: String,
    pub venue: VenueData,
    pub date: String,
    pub time: String,
    pub song_limit: Option<i32>,
    pub playlist_source: Option<PlaylistSource>,
}

/// The editable details of a gig, already validated
#[derive(Debug)]
pub struct UpdatedGig {
    pub title: String,
    pub description: String,
    pub venue: VenueData,
    pub date: String,
    pub time: String,
    pub song_limit: Option<i32>,
    pub playlist_source: Option<PlaylistSource>,
}

#[derive(Debug)]
pub struct GigTransition {
    pub gig_id: PrimaryKey,
    pub from: GigStatus,
    pub to: GigStatus,
    pub at: DateTime<Utc>,
    pub clear_now_playing: bool,
}

#[derive(Debug)]
pub struct NewPlaylist {
    /// The owner of the new playlist
    pub artist_id: UserId,
    pub name: String,
    pub description: String,
    pub tracks: Vec<Value>,
}

#[derive(Debug)]
pub struct NewMasterTrack {
    pub artist_id: UserId,
    pub track: Value,
}

#[derive(Debug)]
pub struct NewRequest {
    pub gig_id: PrimaryKey,
    pub user_id: UserId,
    pub song_name: String,
    pub message: Option<String>,
    pub custom: bool,
}

/// What happens to the gig's now playing pointer when a request changes status
#[derive(Debug, Clone)]
pub enum NowPlayingEffect {
    Keep,
    Set(NowPlaying),
    /// Clear it only if it still points at the transitioned request
    ClearIfCurrent,
}

#[derive(Debug)]
pub struct RequestTransition {
    pub gig_id: PrimaryKey,
    pub request_id: PrimaryKey,
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub at: DateTime<Utc>,
    pub now_playing: NowPlayingEffect,
}

/// A request after a successful [Database::transition_request]
#[derive(Debug)]
pub struct TransitionedRequest {
    pub request: RequestData,
    /// True if the transition cleared the gig's now playing pointer
    pub cleared_now_playing: bool,
}

#[derive(Debug)]
pub struct NewVote {
    pub gig_id: PrimaryKey,
    pub request_id: PrimaryKey,
    pub voter_id: UserId,
}

#[derive(Debug)]
pub struct NewInterest {
    pub gig_id: PrimaryKey,
    pub user_id: UserId,
    pub status: InterestStatus,
}

#[derive(Debug)]
pub struct NewReaction {
    pub gig_id: PrimaryKey,
    pub user_id: Option<UserId>,
    pub emoji: String,
}

/// The gig counter that a request status is tallied in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestCounter {
    Accepted,
    Rejected,
    Played,
}

impl RequestCounter {
    pub fn for_status(status: RequestStatus) -> Option<Self> {
        match status {
            RequestStatus::Pending => None,
            RequestStatus::Accepted => Some(Self::Accepted),
            RequestStatus::Rejected => Some(Self::Rejected),
            RequestStatus::Played => Some(Self::Played),
        }
    }

    pub fn increment(&self, counters: &mut RequestCounters) {
        match self {
            Self::Accepted => counters.accepted += 1,
            Self::Rejected => counters.rejected += 1,
            Self::Played => counters.played += 1,
        }
    }
}
