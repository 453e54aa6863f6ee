//! All schemas that are exposed from endpoints are defined here
//! along with the From<T> impls

use chrono::{DateTime, Utc};
use gigwave_collab::{
    GigData, InterestData, InterestSummary as CollabInterestSummary, MasterTrackData,
    PlaylistData, ReactionData, RequestData, VenueData,
};
use gigwave_core::{
    Config, Coordinates, GigStatus, NowPlaying as CoreNowPlaying, NowPlayingSource,
    PlaylistSource as CorePlaylistSource, Provenance, Ranked, ResolvedTrack, SongLimit,
};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    name: String,
    address: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    song_name: String,
    /// Either "request" or "playlist"
    source: String,
    request_id: Option<i32>,
    track_index: Option<usize>,
    started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum PlaylistSource {
    #[serde(rename_all = "camelCase")]
    Attached { playlist_id: i32 },
    Embedded {
        #[schema(value_type = Vec<Object>)]
        tracks: Vec<Value>,
    },
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Gig {
    id: i32,
    artist_id: String,
    title: String,
    description: String,
    venue: Venue,
    date: String,
    time: String,
    #[schema(example = "Check with Venue")]
    status: String,
    /// The number of tracks the effective playlist is capped at
    song_limit: usize,
    playlist_source: Option<PlaylistSource>,
    now_playing: Option<NowPlaying>,
    accepted_requests_count: i32,
    rejected_requests_count: i32,
    played_requests_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    /// Whether the caller is close enough to join, if they shared their location
    can_join: Option<bool>,
    /// Whether the caller can request and vote right now, if they shared their location
    interactive: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    id: i32,
    gig_id: i32,
    user_id: String,
    song_name: String,
    message: Option<String>,
    custom: bool,
    status: String,
    /// Distinct voters, only present in queues
    #[serde(skip_serializing_if = "Option::is_none")]
    votes: Option<u32>,
    created_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    rejected_at: Option<DateTime<Utc>>,
    played_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedRequest {
    request_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    success: bool,
    votes: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistTrack {
    external_id: Option<String>,
    title: String,
    artist_name: Option<String>,
    #[schema(example = "supplemented")]
    provenance: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    id: i32,
    artist_id: String,
    name: String,
    description: String,
    #[schema(value_type = Vec<Object>)]
    tracks: Vec<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MasterTrack {
    id: i32,
    artist_id: String,
    #[schema(value_type = Object)]
    track: Value,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    gig_id: i32,
    user_id: String,
    #[schema(example = "joined")]
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterestSummary {
    interested: usize,
    joined: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    id: i32,
    gig_id: i32,
    user_id: Option<String>,
    #[schema(example = "🔥")]
    emoji: String,
    created_at: DateTime<Utc>,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl<I, O> ToSerialized<Option<O>> for Option<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Option<O> {
        self.as_ref().map(|x| x.to_serialized())
    }
}

impl ToSerialized<Venue> for VenueData {
    fn to_serialized(&self) -> Venue {
        Venue {
            name: self.name.clone(),
            address: self.address.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

impl ToSerialized<NowPlaying> for CoreNowPlaying {
    fn to_serialized(&self) -> NowPlaying {
        let (source, request_id, track_index) = match self.source {
            NowPlayingSource::Request { request_id } => ("request", Some(request_id), None),
            NowPlayingSource::Playlist { track_index } => ("playlist", None, Some(track_index)),
        };

        NowPlaying {
            song_name: self.song_name.clone(),
            source: source.to_string(),
            request_id,
            track_index,
            started_at: self.started_at,
        }
    }
}

impl ToSerialized<PlaylistSource> for CorePlaylistSource {
    fn to_serialized(&self) -> PlaylistSource {
        match self {
            Self::Attached { playlist_id } => PlaylistSource::Attached {
                playlist_id: *playlist_id,
            },
            Self::Embedded { tracks } => PlaylistSource::Embedded {
                tracks: tracks.clone(),
            },
        }
    }
}

/// A gig as seen from wherever the caller is
pub struct GigView<'a> {
    pub gig: &'a GigData,
    pub location: Option<Coordinates>,
    pub config: &'a Config,
}

impl<'a> GigView<'a> {
    /// Whether the caller is within the radius of the venue.
    /// Unknown locations are never near.
    fn is_near(&self, radius_in_km: f64) -> Option<bool> {
        let location = self.location?;

        let near = self
            .gig
            .venue
            .coordinates()
            .is_some_and(|venue| location.is_within(&venue, radius_in_km));

        Some(near)
    }

    pub fn can_join(&self) -> Option<bool> {
        self.is_near(self.config.join_radius_in_km)
    }

    /// Audiences interact with live gigs from near the venue
    pub fn interactive(&self) -> bool {
        self.gig.status == GigStatus::Live
            && self
                .is_near(self.config.interaction_radius_in_km)
                .unwrap_or(false)
    }
}

impl ToSerialized<Gig> for GigView<'_> {
    fn to_serialized(&self) -> Gig {
        let gig = self.gig;

        Gig {
            id: gig.id,
            artist_id: gig.artist_id.clone(),
            title: gig.title.clone(),
            description: gig.description.clone(),
            venue: gig.venue.to_serialized(),
            date: gig.date.clone(),
            time: gig.time.clone(),
            status: gig.status.to_string(),
            song_limit: SongLimit::clamped(gig.song_limit.map(f64::from)).get(),
            playlist_source: gig.playlist_source.to_serialized(),
            now_playing: gig.now_playing.to_serialized(),
            accepted_requests_count: gig.counters.accepted,
            rejected_requests_count: gig.counters.rejected,
            played_requests_count: gig.counters.played,
            created_at: gig.created_at,
            updated_at: gig.updated_at,
            ended_at: gig.ended_at,
            cancelled_at: gig.cancelled_at,
            can_join: self.can_join(),
            interactive: self.location.map(|_| self.interactive()),
        }
    }
}

fn serialize_request(request: &RequestData, votes: Option<u32>) -> Request {
    Request {
        id: request.id,
        gig_id: request.gig_id,
        user_id: request.user_id.clone(),
        song_name: request.song_name.clone(),
        message: request.message.clone(),
        custom: request.custom,
        status: request.status.to_string(),
        votes,
        created_at: request.created_at,
        accepted_at: request.accepted_at,
        rejected_at: request.rejected_at,
        played_at: request.played_at,
    }
}

impl ToSerialized<Request> for RequestData {
    fn to_serialized(&self) -> Request {
        serialize_request(self, None)
    }
}

impl ToSerialized<Request> for Ranked<RequestData> {
    fn to_serialized(&self) -> Request {
        serialize_request(&self.item, Some(self.votes))
    }
}

impl ToSerialized<PlaylistTrack> for ResolvedTrack {
    fn to_serialized(&self) -> PlaylistTrack {
        let provenance = match self.provenance {
            Provenance::Primary => "primary",
            Provenance::Supplemented => "supplemented",
        };

        PlaylistTrack {
            external_id: self.track.external_id.clone(),
            title: self.track.title.clone(),
            artist_name: self.track.artist_name.clone(),
            provenance: provenance.to_string(),
        }
    }
}

impl ToSerialized<Playlist> for PlaylistData {
    fn to_serialized(&self) -> Playlist {
        Playlist {
            id: self.id,
            artist_id: self.artist_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            tracks: self.tracks.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl ToSerialized<MasterTrack> for MasterTrackData {
    fn to_serialized(&self) -> MasterTrack {
        MasterTrack {
            id: self.id,
            artist_id: self.artist_id.clone(),
            track: self.track.clone(),
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<Interest> for InterestData {
    fn to_serialized(&self) -> Interest {
        Interest {
            gig_id: self.gig_id,
            user_id: self.user_id.clone(),
            status: self.status.to_string(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl ToSerialized<InterestSummary> for CollabInterestSummary {
    fn to_serialized(&self) -> InterestSummary {
        InterestSummary {
            interested: self.interested,
            joined: self.joined,
        }
    }
}

impl ToSerialized<Reaction> for ReactionData {
    fn to_serialized(&self) -> Reaction {
        Reaction {
            id: self.id,
            gig_id: self.gig_id,
            user_id: self.user_id.clone(),
            emoji: self.emoji.clone(),
            created_at: self.created_at,
        }
    }
}

impl SubmittedRequest {
    pub fn new(request_id: i32) -> Self {
        Self { request_id }
    }
}

impl VoteResult {
    pub fn new(votes: u32) -> Self {
        Self {
            success: true,
            votes,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use gigwave_collab::{GigData, RequestCounters, VenueData};
    use gigwave_core::{Config, Coordinates, GigStatus};

    use super::{GigView, ToSerialized};

    fn gig(status: GigStatus) -> GigData {
        GigData {
            id: 1,
            artist_id: "artist-1".to_string(),
            title: "Rooftop set".to_string(),
            description: String::new(),
            venue: VenueData {
                name: "The Loft".to_string(),
                address: String::new(),
                latitude: Some(12.9716),
                longitude: Some(77.5946),
            },
            date: "2026-10-18".to_string(),
            time: "20:00".to_string(),
            status,
            song_limit: None,
            playlist_source: None,
            now_playing: None,
            counters: RequestCounters::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ended_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn interaction_needs_a_live_gig_and_a_nearby_caller() {
        let config = Config::default();
        let live = gig(GigStatus::Live);
        let upcoming = gig(GigStatus::Upcoming);

        // About 2.2 km from the venue
        let nearby = Some(Coordinates::new(12.9916, 77.5946));
        let far = Some(Coordinates::new(13.0827, 80.2707));

        let view = |gig, location| GigView {
            gig,
            location,
            config: &config,
        };

        assert!(view(&live, nearby).interactive());
        assert!(!view(&live, far).interactive());
        assert!(!view(&live, None).interactive());
        assert!(!view(&upcoming, nearby).interactive());

        // Joining uses a tighter radius
        assert_eq!(view(&live, nearby).can_join(), Some(false));
        assert_eq!(view(&live, None).can_join(), None);
    }

    #[test]
    fn missing_song_limits_show_the_default() {
        let config = Config::default();
        let gig = gig(GigStatus::Upcoming);

        let serialized = GigView {
            gig: &gig,
            location: None,
            config: &config,
        }
        .to_serialized();

        let value = serde_json::to_value(serialized).unwrap();
        assert_eq!(value["songLimit"], 20);
        assert_eq!(value["status"], "upcoming");
    }
}
