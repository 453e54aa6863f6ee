use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{catalog, errors, gigs, schemas, serialized, sse};

#[derive(OpenApi)]
#[openapi(
    paths(
        gigs::list_gigs,
        gigs::create_gig,
        gigs::gig,
        gigs::update_gig,
        gigs::set_playlist_source,
        gigs::effective_playlist,
        gigs::set_now_playing_from_playlist,
        gigs::go_live,
        gigs::end_gig,
        gigs::cancel_gig,
        gigs::mark_interested,
        gigs::leave_gig,
        gigs::interest_summary,
        gigs::join_gig,
        gigs::interested_gigs,
        gigs::recent_reactions,
        gigs::send_reaction,
        gigs::request_queue,
        gigs::submit_request,
        gigs::accept_top_request,
        gigs::accept_request,
        gigs::reject_request,
        gigs::mark_played,
        gigs::set_now_playing,
        gigs::vote_request,
        catalog::my_playlists,
        catalog::create_playlist,
        catalog::update_playlist_tracks,
        catalog::delete_playlist,
        catalog::master_tracks,
        catalog::add_master_track,
        catalog::delete_master_track,
        sse::event_stream,
    ),
    components(schemas(
        errors::ErrorBody,
        schemas::VenueSchema,
        schemas::PlaylistSourceSchema,
        schemas::NewGigSchema,
        schemas::UpdateGigSchema,
        schemas::PlaylistSourceUpdateSchema,
        schemas::NowPlayingFromPlaylistSchema,
        schemas::SubmitRequestSchema,
        schemas::VoteSchema,
        schemas::JoinSchema,
        schemas::ReactionSchema,
        schemas::NewPlaylistSchema,
        schemas::PlaylistTracksSchema,
        schemas::MasterTrackSchema,
        serialized::Venue,
        serialized::NowPlaying,
        serialized::PlaylistSource,
        serialized::Gig,
        serialized::Request,
        serialized::SubmittedRequest,
        serialized::VoteResult,
        serialized::PlaylistTrack,
        serialized::Playlist,
        serialized::MasterTrack,
        serialized::Interest,
        serialized::InterestSummary,
        serialized::Reaction,
        sse::ServerEvent,
    )),
    modifiers(&Security),
    info(
        description = "gigwave-server exposes endpoints to run gigs and take requests from the crowd"
    )
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let scheme = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("Bearer <token>")
                .build();

            components.add_security_scheme("BearerAuth", SecurityScheme::Http(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let api = ApiDoc::openapi();

        assert!(api.paths.paths.contains_key("/v1/gigs/{id}/requests/{request_id}/votes"));
        assert!(api.paths.paths.contains_key("/v1/artists/{id}/master-tracks"));
        assert!(api.paths.paths.contains_key("/v1/events"));
        assert!(api.paths.paths.contains_key("/v1/gigs/{id}/cancel"));
        assert!(api.paths.paths.contains_key("/v1/gigs/{id}/join"));
        assert!(api.paths.paths.contains_key("/v1/gigs/{id}/reactions"));
        assert!(api.paths.paths.contains_key("/v1/me/interested-gigs"));
        assert!(api
            .paths
            .paths
            .contains_key("/v1/artists/{id}/master-tracks/{track_id}"));

        let components = api.components.expect("has components");
        assert!(components.security_schemes.contains_key("BearerAuth"));
    }
}
