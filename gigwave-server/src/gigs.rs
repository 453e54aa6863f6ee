use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json,
};
use gigwave_collab::GigData;
use gigwave_core::Coordinates;

use crate::{
    auth::Session,
    context::ServerContext,
    errors::ServerResult,
    schemas::{
        JoinSchema, LocationQuery, NewGigSchema, NowPlayingFromPlaylistSchema,
        PlaylistSourceUpdateSchema, ReactionSchema, SubmitRequestSchema, UpdateGigSchema,
        ValidatedJson, VoteSchema,
    },
    serialized::{
        Gig, GigView, Interest, InterestSummary, NowPlaying, PlaylistTrack, Reaction, Request,
        SubmittedRequest, ToSerialized, VoteResult,
    },
    Router,
};

fn serialize_gig(context: &ServerContext, gig: &GigData, location: Option<Coordinates>) -> Gig {
    GigView {
        gig,
        location,
        config: context.collab.config(),
    }
    .to_serialized()
}

/// Whether the caller at this location may request and vote in the gig right now
async fn is_interactive(
    context: &ServerContext,
    gig_id: i32,
    location: Option<Coordinates>,
) -> ServerResult<bool> {
    let gig = context.collab.gigs.gig_by_id(gig_id).await?;

    let view = GigView {
        gig: &gig,
        location,
        config: context.collab.config(),
    };

    Ok(view.interactive())
}

/// Whether the caller at this location is close enough to join the gig
async fn can_join(
    context: &ServerContext,
    gig_id: i32,
    location: Coordinates,
) -> ServerResult<bool> {
    let gig = context.collab.gigs.gig_by_id(gig_id).await?;

    let view = GigView {
        gig: &gig,
        location: Some(location),
        config: context.collab.config(),
    };

    Ok(view.can_join().unwrap_or(false))
}

#[utoipa::path(
    get,
    path = "/v1/gigs",
    tag = "gigs",
    params(LocationQuery),
    responses(
        (status = 200, body = Vec<Gig>)
    )
)]
async fn list_gigs(
    State(context): State<ServerContext>,
    Query(query): Query<LocationQuery>,
) -> ServerResult<Json<Vec<Gig>>> {
    let location = query.coordinates();
    let gigs = context.collab.gigs.list_gigs().await?;

    let gigs = gigs
        .iter()
        .map(|gig| serialize_gig(&context, gig, location))
        .collect();

    Ok(Json(gigs))
}

#[utoipa::path(
    post,
    path = "/v1/gigs",
    tag = "gigs",
    request_body = NewGigSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Gig)
    )
)]
async fn create_gig(
    Session(caller): Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewGigSchema>,
) -> ServerResult<Json<Gig>> {
    let gig = context.collab.gigs.create_gig(&caller, body.into()).await?;

    Ok(Json(serialize_gig(&context, &gig, None)))
}

#[utoipa::path(
    get,
    path = "/v1/gigs/{id}",
    tag = "gigs",
    params(LocationQuery),
    responses(
        (status = 200, body = Gig)
    )
)]
async fn gig(
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
    Query(query): Query<LocationQuery>,
) -> ServerResult<Json<Gig>> {
    let gig = context.collab.gigs.gig_by_id(gig_id).await?;

    Ok(Json(serialize_gig(&context, &gig, query.coordinates())))
}

#[utoipa::path(
    put,
    path = "/v1/gigs/{id}",
    tag = "gigs",
    request_body = UpdateGigSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Gig)
    )
)]
async fn update_gig(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<UpdateGigSchema>,
) -> ServerResult<Json<Gig>> {
    let gig = context
        .collab
        .gigs
        .update_gig(&caller, gig_id, body.into())
        .await?;

    Ok(Json(serialize_gig(&context, &gig, None)))
}

#[utoipa::path(
    put,
    path = "/v1/gigs/{id}/playlist-source",
    tag = "gigs",
    request_body = PlaylistSourceUpdateSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Gig)
    )
)]
async fn set_playlist_source(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<PlaylistSourceUpdateSchema>,
) -> ServerResult<Json<Gig>> {
    let gig = context
        .collab
        .gigs
        .set_playlist_source(&caller, gig_id, body.source.map(Into::into))
        .await?;

    Ok(Json(serialize_gig(&context, &gig, None)))
}

#[utoipa::path(
    get,
    path = "/v1/gigs/{id}/playlist",
    tag = "gigs",
    responses(
        (status = 200, body = Vec<PlaylistTrack>)
    )
)]
async fn effective_playlist(
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
) -> ServerResult<Json<Vec<PlaylistTrack>>> {
    let tracks = context.collab.gigs.effective_playlist(gig_id).await?;

    Ok(Json(tracks.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/gigs/{id}/now-playing",
    tag = "gigs",
    request_body = NowPlayingFromPlaylistSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = NowPlaying)
    )
)]
async fn set_now_playing_from_playlist(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<NowPlayingFromPlaylistSchema>,
) -> ServerResult<Json<NowPlaying>> {
    let now_playing = context
        .collab
        .gigs
        .set_now_playing_from_playlist(&caller, gig_id, body.track_index)
        .await?;

    Ok(Json(now_playing.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/gigs/{id}/go-live",
    tag = "gigs",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Gig)
    )
)]
async fn go_live(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
) -> ServerResult<Json<Gig>> {
    let gig = context.collab.lifecycle.go_live(&caller, gig_id).await?;

    Ok(Json(serialize_gig(&context, &gig, None)))
}

#[utoipa::path(
    post,
    path = "/v1/gigs/{id}/end",
    tag = "gigs",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Gig)
    )
)]
async fn end_gig(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
) -> ServerResult<Json<Gig>> {
    let gig = context.collab.lifecycle.end_gig(&caller, gig_id).await?;

    Ok(Json(serialize_gig(&context, &gig, None)))
}

#[utoipa::path(
    post,
    path = "/v1/gigs/{id}/cancel",
    tag = "gigs",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Gig)
    )
)]
async fn cancel_gig(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
) -> ServerResult<Json<Gig>> {
    let gig = context.collab.lifecycle.cancel_gig(&caller, gig_id).await?;

    Ok(Json(serialize_gig(&context, &gig, None)))
}

#[utoipa::path(
    post,
    path = "/v1/gigs/{id}/interest",
    tag = "audience",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Interest)
    )
)]
async fn mark_interested(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
) -> ServerResult<Json<Interest>> {
    let interest = context.collab.gigs.mark_interested(&caller, gig_id).await?;

    Ok(Json(interest.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/gigs/{id}/interest",
    tag = "audience",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The caller is no longer interested in or part of the gig.")
    )
)]
async fn leave_gig(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
) -> ServerResult<()> {
    context.collab.gigs.leave_gig(&caller, gig_id).await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/gigs/{id}/interests",
    tag = "audience",
    responses(
        (status = 200, body = InterestSummary)
    )
)]
async fn interest_summary(
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
) -> ServerResult<Json<InterestSummary>> {
    let summary = context.collab.gigs.interest_summary(gig_id).await?;

    Ok(Json(summary.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/gigs/{id}/join",
    tag = "audience",
    request_body = JoinSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Interest)
    )
)]
async fn join_gig(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<JoinSchema>,
) -> ServerResult<Json<Interest>> {
    let can_join = can_join(&context, gig_id, body.coordinates()).await?;

    let interest = context
        .collab
        .gigs
        .join_gig(&caller, gig_id, can_join)
        .await?;

    Ok(Json(interest.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/me/interested-gigs",
    tag = "audience",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Gigs the caller is interested in or joined", body = Vec<Gig>)
    )
)]
async fn interested_gigs(
    Session(caller): Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Gig>>> {
    let gigs = context.collab.gigs.interested_gigs(&caller).await?;

    let gigs = gigs
        .iter()
        .map(|gig| serialize_gig(&context, gig, None))
        .collect();

    Ok(Json(gigs))
}

#[utoipa::path(
    get,
    path = "/v1/gigs/{id}/reactions",
    tag = "audience",
    responses(
        (status = 200, description = "The latest reactions, oldest first", body = Vec<Reaction>)
    )
)]
async fn recent_reactions(
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
) -> ServerResult<Json<Vec<Reaction>>> {
    let reactions = context.collab.gigs.recent_reactions(gig_id).await?;

    Ok(Json(reactions.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/gigs/{id}/reactions",
    tag = "audience",
    request_body = ReactionSchema,
    responses(
        (status = 200, body = Reaction)
    )
)]
async fn send_reaction(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<ReactionSchema>,
) -> ServerResult<Json<Reaction>> {
    let reaction = context
        .collab
        .gigs
        .send_reaction(&caller, gig_id, &body.emoji)
        .await?;

    Ok(Json(reaction.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/gigs/{id}/requests",
    tag = "requests",
    responses(
        (status = 200, description = "Requests ordered by votes, then age", body = Vec<Request>)
    )
)]
async fn request_queue(
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
) -> ServerResult<Json<Vec<Request>>> {
    let queue = context.collab.gigs.request_queue(gig_id).await?;

    Ok(Json(queue.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/gigs/{id}/requests",
    tag = "requests",
    request_body = SubmitRequestSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = SubmittedRequest)
    )
)]
async fn submit_request(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<SubmitRequestSchema>,
) -> ServerResult<Json<SubmittedRequest>> {
    let interactive = is_interactive(&context, gig_id, body.coordinates()).await?;

    let request_id = context
        .collab
        .gigs
        .submit_request(&caller, gig_id, body.into(), interactive)
        .await?;

    Ok(Json(SubmittedRequest::new(request_id)))
}

#[utoipa::path(
    post,
    path = "/v1/gigs/{id}/requests/accept-top",
    tag = "requests",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The accepted request", body = Request)
    )
)]
async fn accept_top_request(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path(gig_id): Path<i32>,
) -> ServerResult<Json<Request>> {
    let request = context
        .collab
        .gigs
        .accept_top_request(&caller, gig_id)
        .await?;

    Ok(Json(request.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/gigs/{id}/requests/{request_id}/accept",
    tag = "requests",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Request)
    )
)]
async fn accept_request(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path((gig_id, request_id)): Path<(i32, i32)>,
) -> ServerResult<Json<Request>> {
    let request = context
        .collab
        .gigs
        .accept_request(&caller, gig_id, request_id)
        .await?;

    Ok(Json(request.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/gigs/{id}/requests/{request_id}/reject",
    tag = "requests",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Request)
    )
)]
async fn reject_request(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path((gig_id, request_id)): Path<(i32, i32)>,
) -> ServerResult<Json<Request>> {
    let request = context
        .collab
        .gigs
        .reject_request(&caller, gig_id, request_id)
        .await?;

    Ok(Json(request.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/gigs/{id}/requests/{request_id}/played",
    tag = "requests",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Request)
    )
)]
async fn mark_played(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path((gig_id, request_id)): Path<(i32, i32)>,
) -> ServerResult<Json<Request>> {
    let request = context
        .collab
        .gigs
        .mark_played(&caller, gig_id, request_id)
        .await?;

    Ok(Json(request.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/gigs/{id}/requests/{request_id}/now-playing",
    tag = "requests",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = NowPlaying)
    )
)]
async fn set_now_playing(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path((gig_id, request_id)): Path<(i32, i32)>,
) -> ServerResult<Json<NowPlaying>> {
    let now_playing = context
        .collab
        .gigs
        .set_now_playing(&caller, gig_id, request_id)
        .await?;

    Ok(Json(now_playing.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/gigs/{id}/requests/{request_id}/votes",
    tag = "requests",
    request_body = VoteSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = VoteResult)
    )
)]
async fn vote_request(
    Session(caller): Session,
    State(context): State<ServerContext>,
    Path((gig_id, request_id)): Path<(i32, i32)>,
    ValidatedJson(body): ValidatedJson<VoteSchema>,
) -> ServerResult<Json<VoteResult>> {
    let interactive = is_interactive(&context, gig_id, body.coordinates()).await?;

    let votes = context
        .collab
        .gigs
        .vote_request(&caller, gig_id, request_id, interactive)
        .await?;

    Ok(Json(VoteResult::new(votes)))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_gigs).post(create_gig))
        .route("/:id", get(gig).put(update_gig))
        .route("/:id/playlist-source", put(set_playlist_source))
        .route("/:id/playlist", get(effective_playlist))
        .route("/:id/now-playing", post(set_now_playing_from_playlist))
        .route("/:id/go-live", post(go_live))
        .route("/:id/end", post(end_gig))
        .route("/:id/cancel", post(cancel_gig))
        .route("/:id/interest", post(mark_interested).delete(leave_gig))
        .route("/:id/interests", get(interest_summary))
        .route("/:id/join", post(join_gig))
        .route("/:id/reactions", get(recent_reactions).post(send_reaction))
        .route("/:id/requests", get(request_queue).post(submit_request))
        .route("/:id/requests/accept-top", post(accept_top_request))
        .route("/:id/requests/:request_id/accept", post(accept_request))
        .route("/:id/requests/:request_id/reject", post(reject_request))
        .route("/:id/requests/:request_id/played", post(mark_played))
        .route("/:id/requests/:request_id/now-playing", post(set_now_playing))
        .route("/:id/requests/:request_id/votes", post(vote_request))
}

pub fn me_router() -> Router {
    Router::new().route("/interested-gigs", get(interested_gigs))
}
