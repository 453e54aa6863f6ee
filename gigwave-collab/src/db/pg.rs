use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gigwave_core::{
    GigStatus, NowPlaying, PlaylistSource, PrimaryKey, RequestStatus,
};
use log::warn;
use serde_json::Value;
use sqlx::{
    postgres::PgPoolOptions, query, query_as, types::Json, Error as SqlxError, FromRow, PgPool,
};

use crate::{
    Database, DatabaseError, GigData, GigTransition, InterestData, InterestStatus,
    IntoDatabaseError, MasterTrackData, NewGig, NewInterest, NewMasterTrack, NewPlaylist,
    NewReaction, NewRequest, NewVote, NowPlayingEffect, PlaylistData, ReactionData,
    RequestCounter, RequestCounters, RequestData, RequestTransition, Result, SessionData,
    TransitionedRequest, UpdatedGig, VenueData, VoteData,
};

/// A postgres database implementation for gigwave
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// Connects to the database and runs any pending migrations
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        Ok(Self { pool })
    }
}

#[derive(FromRow)]
struct SessionRow {
    token: String,
    user_id: String,
    expires_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct GigRow {
    id: i32,
    artist_id: String,
    title: String,
    description: String,
    venue_name: String,
    venue_address: String,
    venue_latitude: Option<f64>,
    venue_longitude: Option<f64>,
    date: String,
    time: String,
    status: String,
    song_limit: Option<i32>,
    playlist_id: Option<i32>,
    embedded_tracks: Option<Json<Vec<Value>>>,
    now_playing: Option<Json<NowPlaying>>,
    accepted_count: i32,
    rejected_count: i32,
    played_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct PlaylistRow {
    id: i32,
    artist_id: String,
    name: String,
    description: String,
    tracks: Json<Vec<Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct MasterTrackRow {
    id: i32,
    artist_id: String,
    track: Json<Value>,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct RequestRow {
    id: i32,
    gig_id: i32,
    user_id: String,
    song_name: String,
    message: Option<String>,
    custom: bool,
    status: String,
    created_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    rejected_at: Option<DateTime<Utc>>,
    played_at: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct VoteRow {
    request_id: i32,
    voter_id: String,
    gig_id: i32,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct InterestRow {
    gig_id: i32,
    user_id: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct ReactionRow {
    id: i32,
    gig_id: i32,
    user_id: Option<String>,
    emoji: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<GigRow> for GigData {
    type Error = DatabaseError;

    fn try_from(row: GigRow) -> Result<Self> {
        let status: GigStatus = row
            .status
            .parse()
            .map_err(|e: String| DatabaseError::Internal(e.into()))?;

        let playlist_source = match (row.playlist_id, row.embedded_tracks) {
            (Some(playlist_id), _) => Some(PlaylistSource::Attached { playlist_id }),
            (None, Some(Json(tracks))) => Some(PlaylistSource::Embedded { tracks }),
            (None, None) => None,
        };

        Ok(GigData {
            id: row.id,
            artist_id: row.artist_id,
            title: row.title,
            description: row.description,
            venue: VenueData {
                name: row.venue_name,
                address: row.venue_address,
                latitude: row.venue_latitude,
                longitude: row.venue_longitude,
            },
            date: row.date,
            time: row.time,
            status,
            song_limit: row.song_limit,
            playlist_source,
            now_playing: row.now_playing.map(|Json(n)| n),
            counters: RequestCounters {
                accepted: row.accepted_count,
                rejected: row.rejected_count,
                played: row.played_count,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
            ended_at: row.ended_at,
            cancelled_at: row.cancelled_at,
        })
    }
}

impl From<PlaylistRow> for PlaylistData {
    fn from(row: PlaylistRow) -> Self {
        Self {
            id: row.id,
            artist_id: row.artist_id,
            name: row.name,
            description: row.description,
            tracks: row.tracks.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<MasterTrackRow> for MasterTrackData {
    fn from(row: MasterTrackRow) -> Self {
        Self {
            id: row.id,
            artist_id: row.artist_id,
            track: row.track.0,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<RequestRow> for RequestData {
    type Error = DatabaseError;

    fn try_from(row: RequestRow) -> Result<Self> {
        let status: RequestStatus = row
            .status
            .parse()
            .map_err(|e: String| DatabaseError::Internal(e.into()))?;

        Ok(RequestData {
            id: row.id,
            gig_id: row.gig_id,
            user_id: row.user_id,
            song_name: row.song_name,
            message: row.message,
            custom: row.custom,
            status,
            created_at: row.created_at,
            accepted_at: row.accepted_at,
            rejected_at: row.rejected_at,
            played_at: row.played_at,
        })
    }
}

impl From<VoteRow> for VoteData {
    fn from(row: VoteRow) -> Self {
        Self {
            request_id: row.request_id,
            voter_id: row.voter_id,
            gig_id: row.gig_id,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<InterestRow> for InterestData {
    type Error = DatabaseError;

    fn try_from(row: InterestRow) -> Result<Self> {
        let status: InterestStatus = row
            .status
            .parse()
            .map_err(|e: String| DatabaseError::Internal(e.into()))?;

        Ok(InterestData {
            gig_id: row.gig_id,
            user_id: row.user_id,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<ReactionRow> for ReactionData {
    fn from(row: ReactionRow) -> Self {
        Self {
            id: row.id,
            gig_id: row.gig_id,
            user_id: row.user_id,
            emoji: row.emoji,
            created_at: row.created_at,
        }
    }
}

/// Splits a playlist source into the two mutually exclusive gig columns
fn source_columns(source: Option<PlaylistSource>) -> (Option<i32>, Option<Json<Vec<Value>>>) {
    match source {
        Some(PlaylistSource::Attached { playlist_id }) => (Some(playlist_id), None),
        Some(PlaylistSource::Embedded { tracks }) => (None, Some(Json(tracks))),
        None => (None, None),
    }
}

fn timestamp_column(status: RequestStatus) -> Option<&'static str> {
    match status {
        RequestStatus::Pending => None,
        RequestStatus::Accepted => Some("accepted_at"),
        RequestStatus::Rejected => Some("rejected_at"),
        RequestStatus::Played => Some("played_at"),
    }
}

fn counter_column(counter: RequestCounter) -> &'static str {
    match counter {
        RequestCounter::Accepted => "accepted_count",
        RequestCounter::Rejected => "rejected_count",
        RequestCounter::Played => "played_count",
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        let row: SessionRow = query_as(
            "SELECT * FROM sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("session", "token"))?;

        Ok(SessionData {
            token: row.token,
            user_id: row.user_id,
            expires_at: row.expires_at,
        })
    }

    async fn gig_by_id(&self, gig_id: PrimaryKey) -> Result<GigData> {
        let row: GigRow = query_as("SELECT * FROM gigs WHERE id = $1")
            .bind(gig_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("gig", "id"))?;

        row.try_into()
    }

    async fn list_gigs(&self) -> Result<Vec<GigData>> {
        let rows: Vec<GigRow> = query_as("SELECT * FROM gigs ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        let gigs = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;

                GigData::try_from(row)
                    .map_err(|e| warn!("Skipping gig {}: {}", id, e))
                    .ok()
            })
            .collect();

        Ok(gigs)
    }

    async fn create_gig(&self, new_gig: NewGig) -> Result<GigData> {
        if let Some(PlaylistSource::Attached { playlist_id }) = &new_gig.playlist_source {
            self.playlist_by_id(*playlist_id).await?;
        }

        let (playlist_id, embedded_tracks) = source_columns(new_gig.playlist_source);

        let row: GigRow = query_as(
            "
            INSERT INTO gigs (
                artist_id, title, description,
                venue_name, venue_address, venue_latitude, venue_longitude,
                date, time, status, song_limit, playlist_id, embedded_tracks
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *",
        )
        .bind(new_gig.artist_id)
        .bind(new_gig.title)
        .bind(new_gig.description)
        .bind(new_gig.venue.name)
        .bind(new_gig.venue.address)
        .bind(new_gig.venue.latitude)
        .bind(new_gig.venue.longitude)
        .bind(new_gig.date)
        .bind(new_gig.time)
        .bind(GigStatus::Upcoming.as_str())
        .bind(new_gig.song_limit)
        .bind(playlist_id)
        .bind(embedded_tracks)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        row.try_into()
    }

    async fn update_gig(&self, gig_id: PrimaryKey, update: UpdatedGig) -> Result<GigData> {
        if let Some(PlaylistSource::Attached { playlist_id }) = &update.playlist_source {
            self.playlist_by_id(*playlist_id).await?;
        }

        let (playlist_id, embedded_tracks) = source_columns(update.playlist_source);

        let row: GigRow = query_as(
            "
            UPDATE gigs SET
                title = $1,
                description = $2,
                venue_name = $3,
                venue_address = $4,
                venue_latitude = $5,
                venue_longitude = $6,
                date = $7,
                time = $8,
                song_limit = $9,
                playlist_id = $10,
                embedded_tracks = $11,
                updated_at = now()
            WHERE id = $12
            RETURNING *",
        )
        .bind(update.title)
        .bind(update.description)
        .bind(update.venue.name)
        .bind(update.venue.address)
        .bind(update.venue.latitude)
        .bind(update.venue.longitude)
        .bind(update.date)
        .bind(update.time)
        .bind(update.song_limit)
        .bind(playlist_id)
        .bind(embedded_tracks)
        .bind(gig_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("gig", "id"))?;

        row.try_into()
    }

    async fn update_playlist_source(
        &self,
        gig_id: PrimaryKey,
        source: Option<PlaylistSource>,
    ) -> Result<GigData> {
        if let Some(PlaylistSource::Attached { playlist_id }) = &source {
            self.playlist_by_id(*playlist_id).await?;
        }

        let (playlist_id, embedded_tracks) = source_columns(source);

        let row: GigRow = query_as(
            "
            UPDATE gigs SET
                playlist_id = $1,
                embedded_tracks = $2,
                updated_at = now()
            WHERE id = $3
            RETURNING *",
        )
        .bind(playlist_id)
        .bind(embedded_tracks)
        .bind(gig_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("gig", "id"))?;

        row.try_into()
    }

    async fn update_now_playing(
        &self,
        gig_id: PrimaryKey,
        now_playing: Option<NowPlaying>,
    ) -> Result<()> {
        let result = query(
            "UPDATE gigs SET now_playing = $1, updated_at = now() WHERE id = $2",
        )
        .bind(now_playing.map(Json))
        .bind(gig_id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "gig",
                identifier: "id",
            });
        }

        Ok(())
    }

    async fn transition_gig(&self, transition: GigTransition) -> Result<GigData> {
        let timestamp = match transition.to {
            GigStatus::Ended => ", ended_at = $4",
            GigStatus::Cancelled => ", cancelled_at = $4",
            _ => "",
        };
        let now_playing = if transition.clear_now_playing {
            ", now_playing = NULL"
        } else {
            ""
        };

        let sql = format!(
            "UPDATE gigs SET status = $1, updated_at = $4{}{} WHERE id = $2 AND status = $3 RETURNING *",
            timestamp, now_playing
        );

        let row: Option<GigRow> = query_as(&sql)
            .bind(transition.to.as_str())
            .bind(transition.gig_id)
            .bind(transition.from.as_str())
            .bind(transition.at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| e.any())?;

        match row {
            Some(row) => row.try_into(),
            None => {
                // Either the gig is gone or someone else moved it first
                self.gig_by_id(transition.gig_id).await?;
                Err(DatabaseError::Stale { resource: "gig" })
            }
        }
    }

    async fn playlist_by_id(&self, playlist_id: PrimaryKey) -> Result<PlaylistData> {
        let row: PlaylistRow = query_as("SELECT * FROM playlists WHERE id = $1")
            .bind(playlist_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("playlist", "id"))?;

        Ok(row.into())
    }

    async fn list_playlists(&self, artist_id: &str) -> Result<Vec<PlaylistData>> {
        let rows: Vec<PlaylistRow> =
            query_as("SELECT * FROM playlists WHERE artist_id = $1 ORDER BY id")
                .bind(artist_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_playlist(&self, new_playlist: NewPlaylist) -> Result<PlaylistData> {
        let row: PlaylistRow = query_as(
            "
            INSERT INTO playlists (artist_id, name, description, tracks)
            VALUES ($1, $2, $3, $4)
            RETURNING *",
        )
        .bind(new_playlist.artist_id)
        .bind(new_playlist.name)
        .bind(new_playlist.description)
        .bind(Json(new_playlist.tracks))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(row.into())
    }

    async fn update_playlist_tracks(
        &self,
        playlist_id: PrimaryKey,
        tracks: Vec<Value>,
    ) -> Result<PlaylistData> {
        let row: PlaylistRow = query_as(
            "
            UPDATE playlists SET
                tracks = $1,
                updated_at = now()
            WHERE id = $2
            RETURNING *",
        )
        .bind(Json(tracks))
        .bind(playlist_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("playlist", "id"))?;

        Ok(row.into())
    }

    async fn delete_playlist(&self, playlist_id: PrimaryKey) -> Result<()> {
        // Attached gigs fall back to no source through the foreign key
        let result = query("DELETE FROM playlists WHERE id = $1")
            .bind(playlist_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "playlist",
                identifier: "id",
            });
        }

        Ok(())
    }

    async fn master_tracks(&self, artist_id: &str) -> Result<Vec<MasterTrackData>> {
        let rows: Vec<MasterTrackRow> =
            query_as("SELECT * FROM master_tracks WHERE artist_id = $1 ORDER BY id")
                .bind(artist_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_master_track(&self, new_track: NewMasterTrack) -> Result<MasterTrackData> {
        let row: MasterTrackRow = query_as(
            "INSERT INTO master_tracks (artist_id, track) VALUES ($1, $2) RETURNING *",
        )
        .bind(new_track.artist_id)
        .bind(Json(new_track.track))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(row.into())
    }

    async fn master_track_by_id(&self, track_id: PrimaryKey) -> Result<MasterTrackData> {
        let row: MasterTrackRow = query_as("SELECT * FROM master_tracks WHERE id = $1")
            .bind(track_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("master track", "id"))?;

        Ok(row.into())
    }

    async fn delete_master_track(&self, track_id: PrimaryKey) -> Result<()> {
        let result = query("DELETE FROM master_tracks WHERE id = $1")
            .bind(track_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "master track",
                identifier: "id",
            });
        }

        Ok(())
    }

    async fn request_by_id(
        &self,
        gig_id: PrimaryKey,
        request_id: PrimaryKey,
    ) -> Result<RequestData> {
        let row: RequestRow = query_as("SELECT * FROM requests WHERE id = $1 AND gig_id = $2")
            .bind(request_id)
            .bind(gig_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("request", "id"))?;

        row.try_into()
    }

    async fn list_requests(&self, gig_id: PrimaryKey) -> Result<Vec<RequestData>> {
        let rows: Vec<RequestRow> =
            query_as("SELECT * FROM requests WHERE gig_id = $1 ORDER BY created_at, id")
                .bind(gig_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| e.any())?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn create_request(&self, new_request: NewRequest) -> Result<RequestData> {
        // Ensure gig exists
        let _ = self.gig_by_id(new_request.gig_id).await?;

        let row: RequestRow = query_as(
            "
            INSERT INTO requests (gig_id, user_id, song_name, message, custom, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *",
        )
        .bind(new_request.gig_id)
        .bind(new_request.user_id)
        .bind(new_request.song_name)
        .bind(new_request.message)
        .bind(new_request.custom)
        .bind(RequestStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        row.try_into()
    }

    async fn transition_request(
        &self,
        transition: RequestTransition,
    ) -> Result<TransitionedRequest> {
        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        // Lock the gig row so counters and now playing are written in order
        query("SELECT id FROM gigs WHERE id = $1 FOR UPDATE")
            .bind(transition.gig_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| e.not_found_or("gig", "id"))?;

        let timestamp = timestamp_column(transition.to)
            .map(|column| format!(", {} = $4", column))
            .unwrap_or_default();

        let sql = format!(
            "UPDATE requests SET status = $1{} WHERE id = $2 AND gig_id = $3 AND status = $5 RETURNING *",
            timestamp
        );

        let row: Option<RequestRow> = query_as(&sql)
            .bind(transition.to.as_str())
            .bind(transition.request_id)
            .bind(transition.gig_id)
            .bind(transition.at)
            .bind(transition.from.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        let Some(row) = row else {
            tx.rollback().await.map_err(|e| e.any())?;
            self.request_by_id(transition.gig_id, transition.request_id)
                .await?;

            return Err(DatabaseError::Stale {
                resource: "request",
            });
        };

        if let Some(counter) = RequestCounter::for_status(transition.to) {
            let sql = format!(
                "UPDATE gigs SET {0} = {0} + 1, updated_at = $1 WHERE id = $2",
                counter_column(counter)
            );

            query(&sql)
                .bind(transition.at)
                .bind(transition.gig_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| e.any())?;
        }

        let mut cleared_now_playing = false;

        match transition.now_playing {
            NowPlayingEffect::Keep => {}
            NowPlayingEffect::Set(now_playing) => {
                query("UPDATE gigs SET now_playing = $1 WHERE id = $2")
                    .bind(Json(now_playing))
                    .bind(transition.gig_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| e.any())?;
            }
            NowPlayingEffect::ClearIfCurrent => {
                let result = query(
                    "
                    UPDATE gigs SET now_playing = NULL
                    WHERE id = $1
                        AND now_playing->>'type' = 'request'
                        AND (now_playing->>'requestId')::int = $2",
                )
                .bind(transition.gig_id)
                .bind(transition.request_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| e.any())?;

                cleared_now_playing = result.rows_affected() > 0;
            }
        }

        tx.commit().await.map_err(|e| e.any())?;

        Ok(TransitionedRequest {
            request: row.try_into()?,
            cleared_now_playing,
        })
    }

    async fn upsert_vote(&self, new_vote: NewVote) -> Result<()> {
        // Ensure the request belongs to the gig
        let _ = self
            .request_by_id(new_vote.gig_id, new_vote.request_id)
            .await?;

        query(
            "
            INSERT INTO votes (request_id, voter_id, gig_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (request_id, voter_id) DO NOTHING",
        )
        .bind(new_vote.request_id)
        .bind(new_vote.voter_id)
        .bind(new_vote.gig_id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())
        .map(|_| ())
    }

    async fn list_votes(&self, gig_id: PrimaryKey) -> Result<Vec<VoteData>> {
        let rows: Vec<VoteRow> = query_as("SELECT * FROM votes WHERE gig_id = $1")
            .bind(gig_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_interest(&self, new_interest: NewInterest) -> Result<InterestData> {
        // Ensure gig exists
        let _ = self.gig_by_id(new_interest.gig_id).await?;

        let row: InterestRow = query_as(
            "
            INSERT INTO interests (gig_id, user_id, status)
            VALUES ($1, $2, $3)
            ON CONFLICT (gig_id, user_id) DO UPDATE SET
                status = CASE
                    WHEN interests.status = 'joined' THEN interests.status
                    ELSE EXCLUDED.status
                END,
                updated_at = CASE
                    WHEN interests.status = EXCLUDED.status OR interests.status = 'joined'
                        THEN interests.updated_at
                    ELSE now()
                END
            RETURNING *",
        )
        .bind(new_interest.gig_id)
        .bind(new_interest.user_id)
        .bind(new_interest.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        row.try_into()
    }

    async fn delete_interest(&self, gig_id: PrimaryKey, user_id: &str) -> Result<()> {
        query("DELETE FROM interests WHERE gig_id = $1 AND user_id = $2")
            .bind(gig_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn list_interests(&self, gig_id: PrimaryKey) -> Result<Vec<InterestData>> {
        let rows: Vec<InterestRow> =
            query_as("SELECT * FROM interests WHERE gig_id = $1 ORDER BY created_at")
                .bind(gig_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| e.any())?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn interests_for_user(&self, user_id: &str) -> Result<Vec<InterestData>> {
        let rows: Vec<InterestRow> =
            query_as("SELECT * FROM interests WHERE user_id = $1 ORDER BY gig_id")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| e.any())?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn create_reaction(&self, new_reaction: NewReaction) -> Result<ReactionData> {
        // Ensure gig exists
        let _ = self.gig_by_id(new_reaction.gig_id).await?;

        let row: ReactionRow = query_as(
            "INSERT INTO reactions (gig_id, user_id, emoji) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(new_reaction.gig_id)
        .bind(new_reaction.user_id)
        .bind(new_reaction.emoji)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(row.into())
    }

    async fn recent_reactions(
        &self,
        gig_id: PrimaryKey,
        limit: usize,
    ) -> Result<Vec<ReactionData>> {
        let rows: Vec<ReactionRow> = query_as(
            "
            SELECT * FROM (
                SELECT * FROM reactions
                WHERE gig_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT $2
            ) recent
            ORDER BY created_at, id",
        )
        .bind(gig_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }
}
