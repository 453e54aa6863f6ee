use chrono::Utc;
use gigwave_core::{prioritize, NowPlaying, PrimaryKey, Ranked, RequestStatus, VoteTally};
use log::info;

use crate::{
    Caller, CollabEvent, GigData, GigError, GigResult, NewRequest, NewVote, NowPlayingEffect,
    RequestData, RequestTransition, TransitionedRequest,
};

use super::GigManager;

/// A song request as typed by an audience member
#[derive(Debug, Clone, Default)]
pub struct RequestDraft {
    pub song_name: String,
    pub message: Option<String>,
    /// True if the song isn't from the gig's playlist
    pub custom: bool,
}

impl GigManager {
    /// Accepts a pending request and starts playing it
    pub async fn accept_request(
        &self,
        caller: &Caller,
        gig_id: PrimaryKey,
        request_id: PrimaryKey,
    ) -> GigResult<RequestData> {
        let gig = self.managed_gig(caller, gig_id).await?;
        let request = self.context.database.request_by_id(gig_id, request_id).await?;

        let now_playing = NowPlaying::from_request(request.id, &request.song_name, Utc::now());
        let transitioned = self
            .transition_request(
                &gig,
                request,
                RequestStatus::Accepted,
                NowPlayingEffect::Set(now_playing.clone()),
            )
            .await?;

        self.context.emit(CollabEvent::NowPlayingUpdate {
            gig_id,
            now_playing: Some(now_playing),
        });

        Ok(transitioned.request)
    }

    /// Rejects a pending request, leaving now playing alone
    pub async fn reject_request(
        &self,
        caller: &Caller,
        gig_id: PrimaryKey,
        request_id: PrimaryKey,
    ) -> GigResult<RequestData> {
        let gig = self.managed_gig(caller, gig_id).await?;
        let request = self.context.database.request_by_id(gig_id, request_id).await?;

        self.transition_request(&gig, request, RequestStatus::Rejected, NowPlayingEffect::Keep)
            .await
            .map(|t| t.request)
    }

    /// Marks an accepted request as played, clearing now playing if it was this request
    pub async fn mark_played(
        &self,
        caller: &Caller,
        gig_id: PrimaryKey,
        request_id: PrimaryKey,
    ) -> GigResult<RequestData> {
        let gig = self.managed_gig(caller, gig_id).await?;
        let request = self.context.database.request_by_id(gig_id, request_id).await?;

        let transitioned = self
            .transition_request(
                &gig,
                request,
                RequestStatus::Played,
                NowPlayingEffect::ClearIfCurrent,
            )
            .await?;

        if transitioned.cleared_now_playing {
            self.context.emit(CollabEvent::NowPlayingUpdate {
                gig_id,
                now_playing: None,
            });
        }

        Ok(transitioned.request)
    }

    /// Points now playing at a request, whatever its status
    pub async fn set_now_playing(
        &self,
        caller: &Caller,
        gig_id: PrimaryKey,
        request_id: PrimaryKey,
    ) -> GigResult<NowPlaying> {
        self.managed_gig(caller, gig_id).await?;
        let request = self.context.database.request_by_id(gig_id, request_id).await?;

        let now_playing = NowPlaying::from_request(request.id, &request.song_name, Utc::now());
        self.update_now_playing(gig_id, now_playing).await
    }

    /// Points now playing at a track of the gig's effective playlist
    pub async fn set_now_playing_from_playlist(
        &self,
        caller: &Caller,
        gig_id: PrimaryKey,
        track_index: i64,
    ) -> GigResult<NowPlaying> {
        let gig = self.managed_gig(caller, gig_id).await?;

        if track_index < 0 {
            return Err(GigError::invalid(format!(
                "Track index must not be negative, got {}",
                track_index
            )));
        }

        let playlist = self.effective_playlist_of(&gig).await?;
        let index = track_index as usize;

        let resolved = playlist.get(index).ok_or(GigError::NotFound {
            resource: "track",
            identifier: "index",
        })?;

        let now_playing = NowPlaying::from_playlist(index, &resolved.track, Utc::now());
        self.update_now_playing(gig_id, now_playing).await
    }

    /// Accepts whichever pending request is at the top of the queue
    pub async fn accept_top_request(
        &self,
        caller: &Caller,
        gig_id: PrimaryKey,
    ) -> GigResult<RequestData> {
        self.managed_gig(caller, gig_id).await?;

        let top = self
            .request_queue(gig_id)
            .await?
            .into_iter()
            .find(|r| r.item.status == RequestStatus::Pending)
            .ok_or(GigError::NotFound {
                resource: "pending request",
                identifier: "gig",
            })?;

        self.accept_request(caller, gig_id, top.item.id).await
    }

    /// Votes on a request of a live gig, returning the new number of voters.
    /// Voting twice counts once.
    pub async fn vote_request(
        &self,
        caller: &Caller,
        gig_id: PrimaryKey,
        request_id: PrimaryKey,
        interactive: bool,
    ) -> GigResult<u32> {
        let voter_id = caller.user_id()?;
        self.interactive_gig(gig_id, interactive).await?;

        self.context
            .database
            .upsert_vote(NewVote {
                gig_id,
                request_id,
                voter_id: voter_id.to_string(),
            })
            .await?;

        let votes = self.context.database.list_votes(gig_id).await?;
        let tally = VoteTally::from_votes(votes.iter().map(|v| (v.request_id, v.voter_id.as_str())));
        let count = tally.count(request_id);

        self.context.emit(CollabEvent::VoteUpdate {
            gig_id,
            request_id,
            votes: count,
        });

        Ok(count)
    }

    /// Submits a song request to a live gig, returning the id of the new request
    pub async fn submit_request(
        &self,
        caller: &Caller,
        gig_id: PrimaryKey,
        draft: RequestDraft,
        interactive: bool,
    ) -> GigResult<PrimaryKey> {
        let user_id = caller.user_id()?;
        self.interactive_gig(gig_id, interactive).await?;

        let song_name = draft.song_name.trim();
        if song_name.is_empty() {
            return Err(GigError::invalid("Song name cannot be empty"));
        }

        let message = draft
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        let request = self
            .context
            .database
            .create_request(NewRequest {
                gig_id,
                user_id: user_id.to_string(),
                song_name: song_name.to_string(),
                message,
                custom: draft.custom,
            })
            .await?;

        info!("Request {} submitted to gig {}", request.song_name, gig_id);

        let id = request.id;
        self.context
            .emit(CollabEvent::RequestSubmitted { gig_id, request });

        Ok(id)
    }

    /// Returns every request of the gig, most voted first, oldest first among equals
    pub async fn request_queue(&self, gig_id: PrimaryKey) -> GigResult<Vec<Ranked<RequestData>>> {
        // Ensure gig exists
        let _ = self.context.database.gig_by_id(gig_id).await?;

        let requests = self.context.database.list_requests(gig_id).await?;
        let votes = self.context.database.list_votes(gig_id).await?;

        let tally = VoteTally::from_votes(votes.iter().map(|v| (v.request_id, v.voter_id.as_str())));

        Ok(prioritize(requests, &tally))
    }

    /// Returns the gig if the caller is its artist and it hasn't finished
    async fn managed_gig(&self, caller: &Caller, gig_id: PrimaryKey) -> GigResult<GigData> {
        let gig = self.context.gig_as_artist(caller, gig_id).await?;

        if gig.status.is_terminal() {
            return Err(GigError::precondition(format!(
                "Gig is already {}",
                gig.status
            )));
        }

        Ok(gig)
    }

    /// Ensures the audience can currently interact with the gig
    async fn interactive_gig(&self, gig_id: PrimaryKey, interactive: bool) -> GigResult<GigData> {
        let gig = self.context.database.gig_by_id(gig_id).await?;

        if !gig.status.is_live() {
            return Err(GigError::precondition(format!(
                "Gig is {}, requests are only open while it's live",
                gig.status
            )));
        }

        if !interactive {
            return Err(GigError::precondition(
                "You need to be near the venue to interact with this gig",
            ));
        }

        Ok(gig)
    }

    async fn transition_request(
        &self,
        gig: &GigData,
        request: RequestData,
        to: RequestStatus,
        now_playing: NowPlayingEffect,
    ) -> GigResult<TransitionedRequest> {
        let to = request.status.transition(to)?;

        let transitioned = self
            .context
            .database
            .transition_request(RequestTransition {
                gig_id: gig.id,
                request_id: request.id,
                from: request.status,
                to,
                at: Utc::now(),
                now_playing,
            })
            .await?;
        let updated = &transitioned.request;

        info!(
            "Request {} in gig {} is now {}",
            updated.song_name, gig.title, updated.status
        );

        self.context.emit(CollabEvent::RequestUpdated {
            gig_id: gig.id,
            request_id: updated.id,
            new_status: updated.status,
        });

        Ok(transitioned)
    }

    async fn update_now_playing(
        &self,
        gig_id: PrimaryKey,
        now_playing: NowPlaying,
    ) -> GigResult<NowPlaying> {
        self.context
            .database
            .update_now_playing(gig_id, Some(now_playing.clone()))
            .await?;

        info!("Gig {} is now playing {}", gig_id, now_playing.song_name);

        self.context.emit(CollabEvent::NowPlayingUpdate {
            gig_id,
            now_playing: Some(now_playing.clone()),
        });

        Ok(now_playing)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gigwave_core::{Config, GigStatus, NowPlayingSource, RequestStatus};
    use serde_json::json;

    use super::RequestDraft;
    use crate::{
        testing::*, Caller, Collab, CollabEvent, Database, DatabaseError, ErrorKind,
        MemoryDatabase, NowPlayingEffect, RequestTransition,
    };

    fn song(name: &str) -> RequestDraft {
        RequestDraft {
            song_name: name.to_string(),
            ..Default::default()
        }
    }

    async fn submit(collab: &Collab, gig_id: i32, name: &str) -> i32 {
        collab
            .gigs
            .submit_request(&fan(0), gig_id, song(name), true)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn accepting_counts_and_starts_playing() {
        let (collab, database) = collab();
        let gig = live_gig(&collab).await;
        let request_id = submit(&collab, gig.id, "Wonderwall").await;

        let request = collab
            .gigs
            .accept_request(&artist(), gig.id, request_id)
            .await
            .unwrap();

        assert_eq!(request.status, RequestStatus::Accepted);
        assert!(request.accepted_at.is_some());

        let gig = database.gig_by_id(gig.id).await.unwrap();
        assert_eq!(gig.counters.accepted, 1);

        let now_playing = gig.now_playing.unwrap();
        assert_eq!(now_playing.song_name, "Wonderwall");
        assert!(now_playing.references_request(request_id));
    }

    #[tokio::test]
    async fn rejecting_leaves_now_playing_alone() {
        let (collab, database) = collab();
        let gig = live_gig(&collab).await;
        let first = submit(&collab, gig.id, "Yellow").await;
        let second = submit(&collab, gig.id, "Clocks").await;

        collab
            .gigs
            .accept_request(&artist(), gig.id, first)
            .await
            .unwrap();
        collab
            .gigs
            .reject_request(&artist(), gig.id, second)
            .await
            .unwrap();

        let gig = database.gig_by_id(gig.id).await.unwrap();
        assert_eq!(gig.counters.rejected, 1);
        assert!(gig.now_playing.unwrap().references_request(first));
    }

    #[tokio::test]
    async fn accepting_twice_fails_without_counting_twice() {
        let (collab, database) = collab();
        let gig = live_gig(&collab).await;
        let request_id = submit(&collab, gig.id, "Yellow").await;

        collab
            .gigs
            .accept_request(&artist(), gig.id, request_id)
            .await
            .unwrap();

        let error = collab
            .gigs
            .accept_request(&artist(), gig.id, request_id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FailedPrecondition);

        let gig = database.gig_by_id(gig.id).await.unwrap();
        assert_eq!(gig.counters.accepted, 1);
    }

    #[tokio::test]
    async fn only_accepted_requests_can_be_played() {
        let (collab, _) = collab();
        let gig = live_gig(&collab).await;
        let request_id = submit(&collab, gig.id, "Yellow").await;

        let error = collab
            .gigs
            .mark_played(&artist(), gig.id, request_id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FailedPrecondition);

        collab
            .gigs
            .reject_request(&artist(), gig.id, request_id)
            .await
            .unwrap();

        let error = collab
            .gigs
            .accept_request(&artist(), gig.id, request_id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FailedPrecondition);
    }

    #[tokio::test]
    async fn marking_played_clears_only_the_current_request() {
        let (collab, database) = collab();
        let gig = live_gig(&collab).await;
        let first = submit(&collab, gig.id, "Yellow").await;
        let second = submit(&collab, gig.id, "Clocks").await;

        collab
            .gigs
            .accept_request(&artist(), gig.id, first)
            .await
            .unwrap();
        collab
            .gigs
            .accept_request(&artist(), gig.id, second)
            .await
            .unwrap();

        // Now playing points at the second request, so playing the first keeps it
        collab
            .gigs
            .mark_played(&artist(), gig.id, first)
            .await
            .unwrap();
        let current = database.gig_by_id(gig.id).await.unwrap();
        assert!(current.now_playing.unwrap().references_request(second));

        collab
            .gigs
            .mark_played(&artist(), gig.id, second)
            .await
            .unwrap();
        let current = database.gig_by_id(gig.id).await.unwrap();
        assert!(current.now_playing.is_none());
        assert_eq!(current.counters.played, 2);
        assert_eq!(current.counters.accepted, 2);
    }

    #[tokio::test]
    async fn now_playing_is_announced_cleared_only_when_it_was() {
        let (collab, database) = collab();
        let gig = live_gig(&collab).await;
        let first = submit(&collab, gig.id, "Yellow").await;
        let second = submit(&collab, gig.id, "Clocks").await;

        for request_id in [first, second] {
            collab
                .gigs
                .accept_request(&artist(), gig.id, request_id)
                .await
                .unwrap();
        }

        let events = collab.events();
        events.try_iter().for_each(drop);

        let cleared = |events: &crate::EventReceiver| {
            events.try_iter().any(|e| {
                matches!(
                    e,
                    CollabEvent::NowPlayingUpdate {
                        now_playing: None,
                        ..
                    }
                )
            })
        };

        collab
            .gigs
            .mark_played(&artist(), gig.id, first)
            .await
            .unwrap();
        assert!(!cleared(&events));

        // The store decides, even if now playing moved since the gig was read
        database.update_now_playing(gig.id, None).await.unwrap();
        collab
            .gigs
            .mark_played(&artist(), gig.id, second)
            .await
            .unwrap();
        assert!(!cleared(&events));

        let third = submit(&collab, gig.id, "Fix You").await;
        collab
            .gigs
            .accept_request(&artist(), gig.id, third)
            .await
            .unwrap();
        collab
            .gigs
            .mark_played(&artist(), gig.id, third)
            .await
            .unwrap();
        assert!(cleared(&events));
    }

    #[tokio::test]
    async fn stores_report_whether_now_playing_was_cleared() {
        let (collab, database) = collab();
        let gig = live_gig(&collab).await;
        let request_id = submit(&collab, gig.id, "Yellow").await;

        collab
            .gigs
            .accept_request(&artist(), gig.id, request_id)
            .await
            .unwrap();

        let transitioned = database
            .transition_request(RequestTransition {
                gig_id: gig.id,
                request_id,
                from: RequestStatus::Accepted,
                to: RequestStatus::Played,
                at: chrono::Utc::now(),
                now_playing: NowPlayingEffect::ClearIfCurrent,
            })
            .await
            .unwrap();

        assert!(transitioned.cleared_now_playing);
        assert_eq!(transitioned.request.status, RequestStatus::Played);
        assert!(database.gig_by_id(gig.id).await.unwrap().now_playing.is_none());
    }

    #[tokio::test]
    async fn only_the_artist_manages_requests() {
        let (collab, database) = collab();
        let gig = live_gig(&collab).await;
        let request_id = submit(&collab, gig.id, "Yellow").await;

        let error = collab
            .gigs
            .accept_request(&fan(1), gig.id, request_id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PermissionDenied);

        let error = collab
            .gigs
            .reject_request(&Caller::Anonymous, gig.id, request_id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unauthenticated);

        let request = database.request_by_id(gig.id, request_id).await.unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_requests_are_not_found() {
        let (collab, _) = collab();
        let gig = live_gig(&collab).await;

        let error = collab
            .gigs
            .accept_request(&artist(), gig.id, 999)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn set_now_playing_keeps_request_status() {
        let (collab, database) = collab();
        let gig = live_gig(&collab).await;
        let request_id = submit(&collab, gig.id, "Yellow").await;

        let now_playing = collab
            .gigs
            .set_now_playing(&artist(), gig.id, request_id)
            .await
            .unwrap();

        assert_eq!(now_playing.song_name, "Yellow");

        let request = database.request_by_id(gig.id, request_id).await.unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn playlist_tracks_can_be_played_by_index() {
        let (collab, _) = collab();
        let gig = gig_with_tracks(&collab, vec![json!("Intro"), json!({ "name": "Outro" })]).await;

        let now_playing = collab
            .gigs
            .set_now_playing_from_playlist(&artist(), gig.id, 1)
            .await
            .unwrap();

        assert_eq!(now_playing.song_name, "Outro");
        assert_eq!(
            now_playing.source,
            NowPlayingSource::Playlist { track_index: 1 }
        );

        let error = collab
            .gigs
            .set_now_playing_from_playlist(&artist(), gig.id, -1)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);

        let error = collab
            .gigs
            .set_now_playing_from_playlist(&artist(), gig.id, 2)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn accept_top_takes_the_most_voted_pending_request() {
        let (collab, _) = collab();
        let gig = live_gig(&collab).await;
        let quiet = submit(&collab, gig.id, "Quiet").await;
        let loud = submit(&collab, gig.id, "Loud").await;

        for n in 1..=2 {
            collab
                .gigs
                .vote_request(&fan(n), gig.id, loud, true)
                .await
                .unwrap();
        }

        let accepted = collab
            .gigs
            .accept_top_request(&artist(), gig.id)
            .await
            .unwrap();
        assert_eq!(accepted.id, loud);

        let accepted = collab
            .gigs
            .accept_top_request(&artist(), gig.id)
            .await
            .unwrap();
        assert_eq!(accepted.id, quiet);

        let error = collab
            .gigs
            .accept_top_request(&artist(), gig.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn voting_twice_counts_once() {
        let (collab, _) = collab();
        let gig = live_gig(&collab).await;
        let request_id = submit(&collab, gig.id, "Yellow").await;

        let first = collab
            .gigs
            .vote_request(&fan(1), gig.id, request_id, true)
            .await
            .unwrap();
        let second = collab
            .gigs
            .vote_request(&fan(1), gig.id, request_id, true)
            .await
            .unwrap();
        let other = collab
            .gigs
            .vote_request(&fan(2), gig.id, request_id, true)
            .await
            .unwrap();

        assert_eq!((first, second, other), (1, 1, 2));
    }

    #[tokio::test]
    async fn audience_can_only_interact_with_live_gigs_nearby() {
        let (collab, database) = collab();
        let gig = gig_with_tracks(&collab, vec![]).await;

        let error = collab
            .gigs
            .submit_request(&fan(1), gig.id, song("Yellow"), true)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FailedPrecondition);

        force_status(&database, &gig, GigStatus::Live).await;

        let error = collab
            .gigs
            .submit_request(&fan(1), gig.id, song("Yellow"), false)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FailedPrecondition);

        let error = collab
            .gigs
            .submit_request(&Caller::Anonymous, gig.id, song("Yellow"), true)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unauthenticated);

        let request_id = submit(&collab, gig.id, "Yellow").await;

        let error = collab
            .gigs
            .vote_request(&fan(1), gig.id, request_id, false)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FailedPrecondition);

        let error = collab
            .gigs
            .vote_request(&fan(1), gig.id, 999, true)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn submitted_requests_are_trimmed_and_pending() {
        let (collab, database) = collab();
        let gig = live_gig(&collab).await;

        let request_id = collab
            .gigs
            .submit_request(
                &fan(1),
                gig.id,
                RequestDraft {
                    song_name: "  Yellow ".to_string(),
                    message: Some("   ".to_string()),
                    custom: true,
                },
                true,
            )
            .await
            .unwrap();

        let request = database.request_by_id(gig.id, request_id).await.unwrap();
        assert_eq!(request.song_name, "Yellow");
        assert_eq!(request.message, None);
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.custom);

        let error = collab
            .gigs
            .submit_request(&fan(1), gig.id, song("  "), true)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn queue_orders_by_votes_then_age() {
        let (collab, _) = collab();
        let gig = live_gig(&collab).await;
        let first = submit(&collab, gig.id, "First").await;
        let second = submit(&collab, gig.id, "Second").await;
        let third = submit(&collab, gig.id, "Third").await;

        collab
            .gigs
            .vote_request(&fan(1), gig.id, third, true)
            .await
            .unwrap();

        let queue: Vec<_> = collab
            .gigs
            .request_queue(gig.id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.item.id, r.votes))
            .collect();

        assert_eq!(queue, vec![(third, 1), (first, 0), (second, 0)]);
    }

    #[tokio::test]
    async fn events_are_emitted_for_request_changes() {
        let (collab, _) = collab();
        let events = collab.events();
        let gig = live_gig(&collab).await;
        let request_id = submit(&collab, gig.id, "Yellow").await;

        collab
            .gigs
            .reject_request(&artist(), gig.id, request_id)
            .await
            .unwrap();

        let emitted: Vec<_> = events.try_iter().collect();

        assert!(emitted
            .iter()
            .any(|e| matches!(e, CollabEvent::RequestSubmitted { .. })));
        assert!(emitted.iter().any(|e| matches!(
            e,
            CollabEvent::RequestUpdated {
                new_status: RequestStatus::Rejected,
                ..
            }
        )));
        assert!(emitted.iter().all(|e| e.gig_id() == gig.id));
    }

    #[tokio::test]
    async fn lost_races_are_failed_preconditions() {
        let database = Arc::new(MemoryDatabase::new());
        let collab = Collab::new(database.clone(), Config::default());
        let gig = live_gig(&collab).await;
        let request_id = submit(&collab, gig.id, "Yellow").await;

        let transition = || RequestTransition {
            gig_id: gig.id,
            request_id,
            from: RequestStatus::Pending,
            to: RequestStatus::Accepted,
            at: chrono::Utc::now(),
            now_playing: NowPlayingEffect::Keep,
        };

        database.transition_request(transition()).await.unwrap();
        let error = database.transition_request(transition()).await.unwrap_err();

        assert!(matches!(error, DatabaseError::Stale { .. }));
        assert_eq!(
            database.gig_by_id(gig.id).await.unwrap().counters.accepted,
            1
        );
    }

    #[tokio::test]
    async fn requests_cannot_be_managed_after_the_gig_ends() {
        let (collab, _) = collab();
        let gig = live_gig(&collab).await;
        let request_id = submit(&collab, gig.id, "Yellow").await;

        collab.lifecycle.end_gig(&artist(), gig.id).await.unwrap();

        let error = collab
            .gigs
            .accept_request(&artist(), gig.id, request_id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FailedPrecondition);
    }
}
