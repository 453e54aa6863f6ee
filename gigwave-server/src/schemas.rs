use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use gigwave_collab::{GigDraft, GigEdit, PlaylistDraft, RequestDraft, VenueData};
use gigwave_core::{Coordinates, PlaylistSource};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::ServerError;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VenueSchema {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub address: String,
    #[validate(range(min = -90., max = 90.))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180., max = 180.))]
    pub longitude: Option<f64>,
}

/// Where a gig's own tracks come from
#[derive(Debug, ToSchema, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum PlaylistSourceSchema {
    #[serde(rename_all = "camelCase")]
    Attached { playlist_id: i32 },
    Embedded {
        #[schema(value_type = Vec<Object>)]
        tracks: Vec<Value>,
    },
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewGigSchema {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate(nested)]
    pub venue: VenueSchema,
    /// YYYY-MM-DD, in the venue's timezone
    #[schema(example = "2026-10-18")]
    pub date: String,
    /// HH:MM, in the venue's timezone
    #[schema(example = "20:00")]
    pub time: String,
    pub song_limit: Option<i64>,
    pub playlist_source: Option<PlaylistSourceSchema>,
}

/// Replaces every editable detail of a gig
#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateGigSchema {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate(nested)]
    pub venue: VenueSchema,
    #[schema(example = "2026-10-18")]
    pub date: String,
    #[schema(example = "20:00")]
    pub time: String,
    pub song_limit: Option<i64>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlaylistSourceUpdateSchema {
    /// Leave out to remove the gig's own tracks
    pub source: Option<PlaylistSourceSchema>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NowPlayingFromPlaylistSchema {
    /// Position in the gig's effective playlist
    pub track_index: i64,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubmitRequestSchema {
    #[validate(length(min = 1, max = 200))]
    pub song_name: String,
    #[validate(length(max = 500))]
    pub message: Option<String>,
    #[serde(default)]
    pub custom: bool,
    #[validate(range(min = -90., max = 90.))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180., max = 180.))]
    pub longitude: Option<f64>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VoteSchema {
    #[validate(range(min = -90., max = 90.))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180., max = 180.))]
    pub longitude: Option<f64>,
}

/// Where the caller is when joining a gig
#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JoinSchema {
    #[validate(range(min = -90., max = 90.))]
    pub latitude: f64,
    #[validate(range(min = -180., max = 180.))]
    pub longitude: f64,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReactionSchema {
    #[validate(length(min = 1, max = 32))]
    #[schema(example = "🔥")]
    pub emoji: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewPlaylistSchema {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(max = 500))]
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub tracks: Vec<Value>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlaylistTracksSchema {
    #[validate(length(max = 500))]
    #[schema(value_type = Vec<Object>)]
    pub tracks: Vec<Value>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MasterTrackSchema {
    /// A song name, or an object with a title
    #[schema(value_type = Object)]
    pub track: Value,
}

/// The caller's position, used to decide whether they are close to a venue
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EventsQuery {
    /// Only receive events of this gig
    pub gig_id: Option<i32>,
}

fn location(latitude: Option<f64>, longitude: Option<f64>) -> Option<Coordinates> {
    Some(Coordinates::new(latitude?, longitude?))
}

impl LocationQuery {
    pub fn coordinates(&self) -> Option<Coordinates> {
        location(self.latitude, self.longitude)
    }
}

impl SubmitRequestSchema {
    pub fn coordinates(&self) -> Option<Coordinates> {
        location(self.latitude, self.longitude)
    }
}

impl VoteSchema {
    pub fn coordinates(&self) -> Option<Coordinates> {
        location(self.latitude, self.longitude)
    }
}

impl JoinSchema {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

impl From<VenueSchema> for VenueData {
    fn from(value: VenueSchema) -> Self {
        Self {
            name: value.name,
            address: value.address,
            latitude: value.latitude,
            longitude: value.longitude,
        }
    }
}

impl From<PlaylistSourceSchema> for PlaylistSource {
    fn from(value: PlaylistSourceSchema) -> Self {
        match value {
            PlaylistSourceSchema::Attached { playlist_id } => Self::Attached { playlist_id },
            PlaylistSourceSchema::Embedded { tracks } => Self::Embedded { tracks },
        }
    }
}

impl From<NewGigSchema> for GigDraft {
    fn from(value: NewGigSchema) -> Self {
        Self {
            title: value.title,
            description: value.description,
            venue: value.venue.into(),
            date: value.date,
            time: value.time,
            song_limit: value.song_limit,
            playlist_source: value.playlist_source.map(Into::into),
        }
    }
}

impl From<UpdateGigSchema> for GigEdit {
    fn from(value: UpdateGigSchema) -> Self {
        Self {
            title: value.title,
            description: value.description,
            venue: value.venue.into(),
            date: value.date,
            time: value.time,
            song_limit: value.song_limit,
        }
    }
}

impl From<SubmitRequestSchema> for RequestDraft {
    fn from(value: SubmitRequestSchema) -> Self {
        Self {
            song_name: value.song_name,
            message: value.message,
            custom: value.custom,
        }
    }
}

impl From<NewPlaylistSchema> for PlaylistDraft {
    fn from(value: NewPlaylistSchema) -> Self {
        Self {
            name: value.name,
            description: value.description,
            tracks: value.tracks,
        }
    }
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e| ServerError::InvalidArgument(e.body_text()))?;

        extracted_json
            .0
            .validate()
            .map_err(|e| ServerError::InvalidArgument(format!("Request body is invalid: {}", e)))?;

        Ok(Self(extracted_json.0))
    }
}
