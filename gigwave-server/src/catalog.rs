use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Json,
};

use crate::{
    auth::Session,
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{MasterTrackSchema, NewPlaylistSchema, PlaylistTracksSchema, ValidatedJson},
    serialized::{MasterTrack, Playlist, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/v1/playlists",
    tag = "catalog",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The caller's own playlists", body = Vec<Playlist>)
    )
)]
async fn my_playlists(
    Session(caller): Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Playlist>>> {
    let artist_id = caller.user_id()?;
    let playlists = context.collab.catalog.playlists_for_artist(artist_id).await?;

    Ok(Json(playlists.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/playlists",
    tag = "catalog",
    request_body = NewPlaylistSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Playlist)
    )
)]
async fn create_playlist(
    Session(caller): Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewPlaylistSchema>,
) -> ServerResult<Json<Playlist>> {
    let playlist = context
        .collab
        .catalog
        .create_playlist(&caller, body.into())
        .await?;

    Ok(Json(playlist.to_serialized()))
}

#[utoipa::path(
    put,
    path = "/v1/playlists/{id}/tracks",
    tag = "catalog",
    request_body = PlaylistTracksSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Playlist)
    )
)]
async fn update_playlist_tracks(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path(playlist_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<PlaylistTracksSchema>,
) -> ServerResult<Json<Playlist>> {
    let playlist = context
        .collab
        .catalog
        .update_playlist_tracks(&caller, playlist_id, body.tracks)
        .await?;

    Ok(Json(playlist.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/playlists/{id}",
    tag = "catalog",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Playlist was deleted and detached from its gigs.")
    )
)]
async fn delete_playlist(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path(playlist_id): Path<i32>,
) -> ServerResult<()> {
    context
        .collab
        .catalog
        .delete_playlist(&caller, playlist_id)
        .await?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/artists/{id}/master-tracks",
    tag = "catalog",
    responses(
        (status = 200, body = Vec<MasterTrack>)
    )
)]
async fn master_tracks(
    State(context): State<ServerContext>,
    Path(artist_id): Path<String>,
) -> ServerResult<Json<Vec<MasterTrack>>> {
    let tracks = context.collab.catalog.master_tracks(&artist_id).await?;

    Ok(Json(tracks.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/artists/{id}/master-tracks",
    tag = "catalog",
    request_body = MasterTrackSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = MasterTrack)
    )
)]
async fn add_master_track(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path(artist_id): Path<String>,
    ValidatedJson(body): ValidatedJson<MasterTrackSchema>,
) -> ServerResult<Json<MasterTrack>> {
    if caller.user_id()? != artist_id {
        return Err(ServerError::PermissionDenied);
    }

    let track = context
        .collab
        .catalog
        .add_master_track(&caller, body.track)
        .await?;

    Ok(Json(track.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/artists/{id}/master-tracks/{track_id}",
    tag = "catalog",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Track was removed from the master catalog.")
    )
)]
async fn delete_master_track(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path((artist_id, track_id)): Path<(String, i32)>,
) -> ServerResult<()> {
    if caller.user_id()? != artist_id {
        return Err(ServerError::PermissionDenied);
    }

    context
        .collab
        .catalog
        .delete_master_track(&caller, track_id)
        .await?;

    Ok(())
}

pub fn playlist_router() -> Router {
    Router::new()
        .route("/", get(my_playlists).post(create_playlist))
        .route("/:id", delete(delete_playlist))
        .route("/:id/tracks", put(update_playlist_tracks))
}

pub fn artist_router() -> Router {
    Router::new()
        .route("/:id/master-tracks", get(master_tracks).post(add_master_track))
        .route("/:id/master-tracks/:track_id", delete(delete_master_track))
}
