use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use gigwave_core::{
    Coordinates, GigStatus, NowPlaying, PlaylistSource, PrimaryKey, Queueable, RequestStatus,
    UserId,
};
use serde_json::Value;

/// A bearer session issued by the identity provider
#[derive(Debug, Clone)]
pub struct SessionData {
    pub token: String,
    /// The user that is signed in
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct VenueData {
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// How many requests of a gig have been handled
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RequestCounters {
    pub accepted: i32,
    pub rejected: i32,
    pub played: i32,
}

/// A live music event
#[derive(Debug, Clone)]
pub struct GigData {
    pub id: PrimaryKey,
    /// The artist that owns the gig
    pub artist_id: UserId,
    pub title: String,
    pub description: String,
    pub venue: VenueData,
    /// As entered by the artist, YYYY-MM-DD
    pub date: String,
    /// As entered by the artist, HH:MM
    pub time: String,
    pub status: GigStatus,
    /// Stored as written, use [gigwave_core::SongLimit::clamped] before resolving
    pub song_limit: Option<i32>,
    pub playlist_source: Option<PlaylistSource>,
    pub now_playing: Option<NowPlaying>,
    pub counters: RequestCounters,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl VenueData {
    /// Returns the venue location if both coordinates are known
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
            _ => None,
        }
    }
}

/// A saved playlist an artist can attach to gigs
#[derive(Debug, Clone)]
pub struct PlaylistData {
    pub id: PrimaryKey,
    pub artist_id: UserId,
    pub name: String,
    pub description: String,
    /// Raw tracks, normalized when resolved
    pub tracks: Vec<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A song in an artist's master catalog
#[derive(Debug, Clone)]
pub struct MasterTrackData {
    pub id: PrimaryKey,
    pub artist_id: UserId,
    pub track: Value,
    pub created_at: DateTime<Utc>,
}

/// A song requested by the crowd during a live gig
#[derive(Debug, Clone)]
pub struct RequestData {
    pub id: PrimaryKey,
    pub gig_id: PrimaryKey,
    /// The audience member that submitted the request
    pub user_id: UserId,
    pub song_name: String,
    pub message: Option<String>,
    /// True if typed by the crowd rather than picked from the playlist
    pub custom: bool,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub played_at: Option<DateTime<Utc>>,
}

impl Queueable for RequestData {
    fn request_id(&self) -> PrimaryKey {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// One audience member's endorsement of a request.
/// Note: `request_id` and `voter_id` are unique together.
#[derive(Debug, Clone)]
pub struct VoteData {
    pub request_id: PrimaryKey,
    pub voter_id: UserId,
    pub gig_id: PrimaryKey,
    pub created_at: DateTime<Utc>,
}

/// How far an audience member has committed to a gig.
/// Ordered so that joining outranks being interested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InterestStatus {
    Interested,
    /// The audience member is at the venue of a live gig
    Joined,
}

impl InterestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interested => "interested",
            Self::Joined => "joined",
        }
    }
}

impl Display for InterestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "interested" => Ok(Self::Interested),
            "joined" => Ok(Self::Joined),
            other => Err(format!("unknown interest status {}", other)),
        }
    }
}

/// An audience member's interest in a gig.
/// Note: `gig_id` and `user_id` are unique together.
#[derive(Debug, Clone)]
pub struct InterestData {
    pub gig_id: PrimaryKey,
    pub user_id: UserId,
    pub status: InterestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An emoji sent to a live gig
#[derive(Debug, Clone)]
pub struct ReactionData {
    pub id: PrimaryKey,
    pub gig_id: PrimaryKey,
    /// None if sent without signing in
    pub user_id: Option<UserId>,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}
