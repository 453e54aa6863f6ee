use chrono::{DateTime, Utc};
use gigwave_core::{automatic_transition, GigStatus, PrimaryKey, Schedule};
use log::{debug, info, warn};

use crate::{
    Caller, CollabContext, CollabEvent, DatabaseError, GigData, GigResult, GigTransition,
};

/// Moves gigs through their lifecycle, manually or as time passes
pub struct Lifecycle {
    context: CollabContext,
}

impl Lifecycle {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Starts a gig that is upcoming or waiting on the venue
    pub async fn go_live(&self, caller: &Caller, gig_id: PrimaryKey) -> GigResult<GigData> {
        let gig = self.context.gig_as_artist(caller, gig_id).await?;
        let to = gig.status.go_live()?;

        self.transition(&gig, to, Utc::now(), false).await
    }

    /// Ends a live gig, clearing whatever is playing
    pub async fn end_gig(&self, caller: &Caller, gig_id: PrimaryKey) -> GigResult<GigData> {
        let gig = self.context.gig_as_artist(caller, gig_id).await?;
        let to = gig.status.end()?;

        self.transition(&gig, to, Utc::now(), true).await
    }

    /// Calls off a gig that never went live
    pub async fn cancel_gig(&self, caller: &Caller, gig_id: PrimaryKey) -> GigResult<GigData> {
        let gig = self.context.gig_as_artist(caller, gig_id).await?;
        let to = gig.status.cancel()?;

        self.transition(&gig, to, Utc::now(), false).await
    }

    /// Applies time based transitions to every gig, returning how many gigs changed.
    ///
    /// A gig that can't be processed is logged and skipped, so one bad gig
    /// never holds back the rest.
    pub async fn sweep(&self, now: DateTime<Utc>) -> GigResult<usize> {
        let config = &self.context.config;
        let gigs = self.context.database.list_gigs().await?;

        let mut transitioned = 0;

        for gig in gigs {
            if gig.status.is_terminal() {
                continue;
            }

            let schedule = match Schedule::parse(&gig.date, &gig.time, config.venue_offset()) {
                Ok(schedule) => schedule,
                Err(e) => {
                    warn!("Skipping gig {} in lifecycle sweep: {}", gig.id, e);
                    continue;
                }
            };

            let Some(change) = automatic_transition(gig.status, schedule.elapsed(now), config)
            else {
                continue;
            };

            match self
                .transition(&gig, change.to, now, change.clears_now_playing())
                .await
            {
                Ok(_) => transitioned += 1,
                Err(e) => warn!("Failed to move gig {} to {}: {}", gig.id, change.to, e),
            }
        }

        if transitioned > 0 {
            info!("Lifecycle sweep moved {} gigs", transitioned);
        }

        Ok(transitioned)
    }

    async fn transition(
        &self,
        gig: &GigData,
        to: GigStatus,
        at: DateTime<Utc>,
        clear_now_playing: bool,
    ) -> GigResult<GigData> {
        let result = self
            .context
            .database
            .transition_gig(GigTransition {
                gig_id: gig.id,
                from: gig.status,
                to,
                at,
                clear_now_playing,
            })
            .await;

        let updated = result.map_err(|e| {
            if let DatabaseError::Stale { .. } = e {
                debug!("Gig {} changed before it could move to {}", gig.id, to);
            }

            e
        })?;

        info!("Gig {} is now {}", updated.title, updated.status);

        self.context.emit(CollabEvent::GigStatusUpdate {
            gig_id: updated.id,
            new_status: updated.status,
        });

        if clear_now_playing && gig.now_playing.is_some() {
            self.context.emit(CollabEvent::NowPlayingUpdate {
                gig_id: updated.id,
                now_playing: None,
            });
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use gigwave_core::{Config, GigStatus, NowPlaying};

    use crate::{testing::*, Database, ErrorKind, GigTransition, NewGig, VenueData};

    /// 2026-10-18 20:00 at UTC+05:30
    fn scheduled_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 14, 30, 0).unwrap()
    }

    fn minutes_in(minutes: i64) -> DateTime<Utc> {
        scheduled_start() + Duration::minutes(minutes)
    }

    #[test]
    fn gigs_are_scheduled_in_the_venue_offset() {
        let schedule = gigwave_core::Schedule::parse(
            "2026-10-18",
            "20:00",
            Config::default().venue_offset(),
        )
        .unwrap();

        assert_eq!(schedule.start(), scheduled_start());
    }

    #[tokio::test]
    async fn late_gigs_are_flagged_to_check_with_the_venue() {
        let (collab, database) = collab();
        let gig = gig_with_tracks(&collab, vec![]).await;

        assert_eq!(collab.lifecycle.sweep(minutes_in(10)).await.unwrap(), 0);
        assert_eq!(collab.lifecycle.sweep(minutes_in(45)).await.unwrap(), 1);

        let gig = database.gig_by_id(gig.id).await.unwrap();
        assert_eq!(gig.status, GigStatus::CheckWithVenue);

        // Already flagged, nothing else happens until the close threshold
        assert_eq!(collab.lifecycle.sweep(minutes_in(60)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn gigs_that_never_start_are_cancelled() {
        let (collab, database) = collab();
        let upcoming = gig_with_tracks(&collab, vec![]).await;
        let flagged = gig_with_tracks(&collab, vec![]).await;

        // One of them gets flagged first
        database
            .transition_gig(GigTransition {
                gig_id: flagged.id,
                from: GigStatus::Upcoming,
                to: GigStatus::CheckWithVenue,
                at: Utc::now(),
                clear_now_playing: false,
            })
            .await
            .unwrap();

        assert_eq!(collab.lifecycle.sweep(minutes_in(310)).await.unwrap(), 2);

        for id in [upcoming.id, flagged.id] {
            let gig = database.gig_by_id(id).await.unwrap();
            assert_eq!(gig.status, GigStatus::Cancelled);
            assert!(gig.cancelled_at.is_some());
        }
    }

    #[tokio::test]
    async fn forgotten_live_gigs_are_ended() {
        let (collab, database) = collab();
        let gig = live_gig(&collab).await;

        database
            .update_now_playing(
                gig.id,
                Some(NowPlaying::from_request(1, "Yellow", Utc::now())),
            )
            .await
            .unwrap();

        assert_eq!(collab.lifecycle.sweep(minutes_in(200)).await.unwrap(), 0);
        assert_eq!(collab.lifecycle.sweep(minutes_in(310)).await.unwrap(), 1);

        let gig = database.gig_by_id(gig.id).await.unwrap();
        assert_eq!(gig.status, GigStatus::Ended);
        assert!(gig.ended_at.is_some());
        assert!(gig.now_playing.is_none());
    }

    #[tokio::test]
    async fn malformed_gigs_do_not_block_the_sweep() {
        let (collab, database) = collab();

        let broken = database
            .create_gig(NewGig {
                artist_id: ARTIST.to_string(),
                title: "Broken".to_string(),
                description: String::new(),
                venue: VenueData {
                    name: "Nowhere".to_string(),
                    address: String::new(),
                    latitude: None,
                    longitude: None,
                },
                date: "someday".to_string(),
                time: "late".to_string(),
                song_limit: None,
                playlist_source: None,
            })
            .await
            .unwrap();
        let fine = gig_with_tracks(&collab, vec![]).await;

        assert_eq!(collab.lifecycle.sweep(minutes_in(45)).await.unwrap(), 1);

        let broken = database.gig_by_id(broken.id).await.unwrap();
        assert_eq!(broken.status, GigStatus::Upcoming);

        let fine = database.gig_by_id(fine.id).await.unwrap();
        assert_eq!(fine.status, GigStatus::CheckWithVenue);
    }

    #[tokio::test]
    async fn terminal_gigs_are_left_alone() {
        let (collab, database) = collab();
        let gig = gig_with_tracks(&collab, vec![]).await;

        collab.lifecycle.sweep(minutes_in(310)).await.unwrap();
        assert_eq!(collab.lifecycle.sweep(minutes_in(1000)).await.unwrap(), 0);

        let gig = database.gig_by_id(gig.id).await.unwrap();
        assert_eq!(gig.status, GigStatus::Cancelled);
    }

    #[tokio::test]
    async fn ending_a_gig_clears_now_playing() {
        let (collab, database) = collab();
        let gig = live_gig(&collab).await;

        database
            .update_now_playing(
                gig.id,
                Some(NowPlaying::from_request(1, "Yellow", Utc::now())),
            )
            .await
            .unwrap();

        let ended = collab.lifecycle.end_gig(&artist(), gig.id).await.unwrap();

        assert_eq!(ended.status, GigStatus::Ended);
        assert!(ended.ended_at.is_some());
        assert!(ended.now_playing.is_none());
    }

    #[tokio::test]
    async fn only_live_gigs_can_be_ended() {
        let (collab, database) = collab();
        let gig = live_gig(&collab).await;

        collab.lifecycle.end_gig(&artist(), gig.id).await.unwrap();
        let ended_at = database.gig_by_id(gig.id).await.unwrap().ended_at;

        let error = collab
            .lifecycle
            .end_gig(&artist(), gig.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FailedPrecondition);

        // Nothing changed
        assert_eq!(database.gig_by_id(gig.id).await.unwrap().ended_at, ended_at);

        let upcoming = gig_with_tracks(&collab, vec![]).await;
        let error = collab
            .lifecycle
            .end_gig(&artist(), upcoming.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FailedPrecondition);
    }

    #[tokio::test]
    async fn only_the_artist_can_end_a_gig() {
        let (collab, _) = collab();
        let gig = live_gig(&collab).await;

        let error = collab.lifecycle.end_gig(&fan(1), gig.id).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn flagged_gigs_can_still_go_live() {
        let (collab, _) = collab();
        let gig = gig_with_tracks(&collab, vec![]).await;

        collab.lifecycle.sweep(minutes_in(45)).await.unwrap();

        let live = collab.lifecycle.go_live(&artist(), gig.id).await.unwrap();
        assert_eq!(live.status, GigStatus::Live);

        let error = collab
            .lifecycle
            .go_live(&artist(), gig.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FailedPrecondition);
    }

    #[tokio::test]
    async fn artists_can_cancel_gigs_that_never_started() {
        let (collab, database) = collab();
        let events = collab.events();
        let upcoming = gig_with_tracks(&collab, vec![]).await;
        let flagged = gig_with_tracks(&collab, vec![]).await;
        force_status(&database, &flagged, GigStatus::CheckWithVenue).await;

        for id in [upcoming.id, flagged.id] {
            let cancelled = collab.lifecycle.cancel_gig(&artist(), id).await.unwrap();

            assert_eq!(cancelled.status, GigStatus::Cancelled);
            assert!(cancelled.cancelled_at.is_some());
            assert!(cancelled.ended_at.is_none());
        }

        assert!(events.try_iter().any(|e| matches!(
            e,
            crate::CollabEvent::GigStatusUpdate {
                new_status: GigStatus::Cancelled,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn started_or_finished_gigs_cannot_be_cancelled() {
        let (collab, database) = collab();
        let live = live_gig(&collab).await;

        let error = collab
            .lifecycle
            .cancel_gig(&artist(), live.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FailedPrecondition);

        let cancelled = gig_with_tracks(&collab, vec![]).await;
        collab
            .lifecycle
            .cancel_gig(&artist(), cancelled.id)
            .await
            .unwrap();
        let cancelled_at = database.gig_by_id(cancelled.id).await.unwrap().cancelled_at;

        let error = collab
            .lifecycle
            .cancel_gig(&artist(), cancelled.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FailedPrecondition);

        // Nothing changed
        assert_eq!(
            database.gig_by_id(cancelled.id).await.unwrap().cancelled_at,
            cancelled_at
        );
    }

    #[tokio::test]
    async fn only_the_artist_can_cancel_a_gig() {
        let (collab, database) = collab();
        let gig = gig_with_tracks(&collab, vec![]).await;

        let error = collab
            .lifecycle
            .cancel_gig(&fan(1), gig.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PermissionDenied);

        let error = collab
            .lifecycle
            .cancel_gig(&crate::Caller::Anonymous, gig.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unauthenticated);

        assert_eq!(
            database.gig_by_id(gig.id).await.unwrap().status,
            GigStatus::Upcoming
        );
    }
}
