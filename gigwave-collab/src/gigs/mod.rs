mod audience;
mod live;

pub use audience::*;
pub use live::*;

use gigwave_core::{
    compute_effective_playlist, order_playlist_tracks, renumber_playlist_tracks, PlaylistSource,
    PrimaryKey, ResolvedTrack, Schedule, SongLimit,
};
use log::info;
use serde_json::Value;

use crate::{
    Caller, CollabContext, DatabaseError, GigData, GigError, GigResult, NewGig, UpdatedGig,
    VenueData,
};

/// Manages gigs and everything that happens during them
pub struct GigManager {
    context: CollabContext,
}

/// A gig as written by an artist, before validation
#[derive(Debug, Clone)]
pub struct GigDraft {
    pub title: String,
    pub description: String,
    pub venue: VenueData,
    pub date: String,
    pub time: String,
    pub song_limit: Option<i64>,
    pub playlist_source: Option<PlaylistSource>,
}

/// The details of a gig an artist can change after creating it
#[derive(Debug, Clone)]
pub struct GigEdit {
    pub title: String,
    pub description: String,
    pub venue: VenueData,
    pub date: String,
    pub time: String,
    pub song_limit: Option<i64>,
}

impl GigManager {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Creates an upcoming gig owned by the caller
    pub async fn create_gig(&self, caller: &Caller, draft: GigDraft) -> GigResult<GigData> {
        let artist_id = caller.user_id()?;
        let title = self.checked_title(&draft.title, &draft.venue, &draft.date, &draft.time)?;

        let song_limit = draft.song_limit.map(SongLimit::new).transpose()?;
        let playlist_source = match draft.playlist_source {
            Some(source) => Some(self.validate_source(artist_id, source, song_limit).await?),
            None => None,
        };

        let gig = self
            .context
            .database
            .create_gig(NewGig {
                artist_id: artist_id.to_string(),
                title,
                description: draft.description.trim().to_string(),
                venue: draft.venue,
                date: draft.date.trim().to_string(),
                time: draft.time.trim().to_string(),
                song_limit: song_limit.map(|l| l.get() as i32),
                playlist_source,
            })
            .await?;

        info!("Gig {} created by {}", gig.title, gig.artist_id);

        Ok(gig)
    }

    /// Changes the details of a gig that hasn't finished.
    /// Embedded tracks are capped again at the new song limit.
    pub async fn update_gig(
        &self,
        caller: &Caller,
        gig_id: PrimaryKey,
        edit: GigEdit,
    ) -> GigResult<GigData> {
        let gig = self.context.gig_as_artist(caller, gig_id).await?;

        if gig.status.is_terminal() {
            return Err(GigError::precondition(format!(
                "Gig is already {}",
                gig.status
            )));
        }

        let title = self.checked_title(&edit.title, &edit.venue, &edit.date, &edit.time)?;
        let song_limit = edit.song_limit.map(SongLimit::new).transpose()?;

        let playlist_source = match gig.playlist_source {
            Some(source @ PlaylistSource::Embedded { .. }) => Some(
                self.validate_source(&gig.artist_id, source, song_limit)
                    .await?,
            ),
            other => other,
        };

        let gig = self
            .context
            .database
            .update_gig(
                gig_id,
                UpdatedGig {
                    title,
                    description: edit.description.trim().to_string(),
                    venue: edit.venue,
                    date: edit.date.trim().to_string(),
                    time: edit.time.trim().to_string(),
                    song_limit: song_limit.map(|l| l.get() as i32),
                    playlist_source,
                },
            )
            .await?;

        info!("Gig {} updated by {}", gig.title, gig.artist_id);

        Ok(gig)
    }

    pub async fn gig_by_id(&self, gig_id: PrimaryKey) -> GigResult<GigData> {
        Ok(self.context.database.gig_by_id(gig_id).await?)
    }

    pub async fn list_gigs(&self) -> GigResult<Vec<GigData>> {
        Ok(self.context.database.list_gigs().await?)
    }

    /// Replaces the primary track source of a gig, or removes it
    pub async fn set_playlist_source(
        &self,
        caller: &Caller,
        gig_id: PrimaryKey,
        source: Option<PlaylistSource>,
    ) -> GigResult<GigData> {
        let gig = self.context.gig_as_artist(caller, gig_id).await?;

        if gig.status.is_terminal() {
            return Err(GigError::precondition(format!(
                "Gig is already {}",
                gig.status
            )));
        }

        let song_limit = gig.song_limit.map(|l| SongLimit::clamped(Some(l as f64)));
        let source = match source {
            Some(source) => Some(
                self.validate_source(&gig.artist_id, source, song_limit)
                    .await?,
            ),
            None => None,
        };

        let gig = self
            .context
            .database
            .update_playlist_source(gig_id, source)
            .await?;

        Ok(gig)
    }

    /// Resolves the tracks the gig will play, primary source first then the master catalog
    pub async fn effective_playlist(&self, gig_id: PrimaryKey) -> GigResult<Vec<ResolvedTrack>> {
        let gig = self.context.database.gig_by_id(gig_id).await?;
        self.effective_playlist_of(&gig).await
    }

    pub(crate) async fn effective_playlist_of(&self, gig: &GigData) -> GigResult<Vec<ResolvedTrack>> {
        let primary = self.primary_tracks(gig).await?;
        let master: Vec<Value> = self
            .context
            .database
            .master_tracks(&gig.artist_id)
            .await?
            .into_iter()
            .map(|t| t.track)
            .collect();

        let limit = SongLimit::clamped(gig.song_limit.map(f64::from));

        Ok(compute_effective_playlist(&primary, &master, limit))
    }

    async fn primary_tracks(&self, gig: &GigData) -> GigResult<Vec<Value>> {
        match &gig.playlist_source {
            None => Ok(vec![]),
            Some(PlaylistSource::Embedded { tracks }) => Ok(order_playlist_tracks(tracks.clone())),
            Some(PlaylistSource::Attached { playlist_id }) => {
                match self.context.database.playlist_by_id(*playlist_id).await {
                    Ok(playlist) => Ok(order_playlist_tracks(playlist.tracks)),
                    // A deleted playlist leaves the gig with only its master catalog
                    Err(DatabaseError::NotFound { .. }) => Ok(vec![]),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    /// Trims the title and ensures the details of a new or edited gig are usable
    fn checked_title(
        &self,
        title: &str,
        venue: &VenueData,
        date: &str,
        time: &str,
    ) -> GigResult<String> {
        let title = title.trim();
        if title.is_empty() {
            return Err(GigError::invalid("Gig title cannot be empty"));
        }

        if venue.name.trim().is_empty() {
            return Err(GigError::invalid("Venue name cannot be empty"));
        }

        // Reject schedules the lifecycle sweep would never be able to read
        Schedule::parse(date, time, self.context.config.venue_offset())?;

        Ok(title.to_string())
    }

    /// Ensures an attached playlist is owned by the artist, and caps embedded tracks in their order
    async fn validate_source(
        &self,
        artist_id: &str,
        source: PlaylistSource,
        song_limit: Option<SongLimit>,
    ) -> GigResult<PlaylistSource> {
        match source {
            PlaylistSource::Attached { playlist_id } => {
                let playlist = self.context.database.playlist_by_id(playlist_id).await?;

                if playlist.artist_id != artist_id {
                    return Err(GigError::PermissionDenied);
                }

                Ok(PlaylistSource::Attached { playlist_id })
            }
            PlaylistSource::Embedded { tracks } => {
                let mut tracks = order_playlist_tracks(tracks);
                tracks.truncate(song_limit.unwrap_or_default().get());
                renumber_playlist_tracks(&mut tracks);

                Ok(PlaylistSource::Embedded { tracks })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use gigwave_core::{GigStatus, PlaylistSource, Provenance};
    use serde_json::json;

    use super::GigEdit;
    use crate::{testing::*, Caller, ErrorKind, PlaylistDraft};

    fn edit_of(draft: crate::GigDraft) -> GigEdit {
        GigEdit {
            title: draft.title,
            description: draft.description,
            venue: draft.venue,
            date: draft.date,
            time: draft.time,
            song_limit: draft.song_limit,
        }
    }

    #[tokio::test]
    async fn created_gigs_start_upcoming() {
        let (collab, _) = collab();

        let gig = collab
            .gigs
            .create_gig(&artist(), draft("2026-10-18", "20:00"))
            .await
            .unwrap();

        assert_eq!(gig.status, GigStatus::Upcoming);
        assert_eq!(gig.artist_id, ARTIST);
        assert!(gig.now_playing.is_none());
    }

    #[tokio::test]
    async fn creating_a_gig_validates_input() {
        let (collab, _) = collab();

        let error = collab
            .gigs
            .create_gig(&Caller::Anonymous, draft("2026-10-18", "20:00"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unauthenticated);

        let error = collab
            .gigs
            .create_gig(&artist(), draft("18/10/2026", "20:00"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);

        let mut too_many = draft("2026-10-18", "20:00");
        too_many.song_limit = Some(61);
        let error = collab.gigs.create_gig(&artist(), too_many).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);

        let mut untitled = draft("2026-10-18", "20:00");
        untitled.title = "   ".to_string();
        let error = collab.gigs.create_gig(&artist(), untitled).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn effective_playlist_supplements_from_the_master_catalog() {
        let (collab, _) = collab();

        for title in ["Song A", "Song C", "Song D"] {
            collab
                .catalog
                .add_master_track(&artist(), json!(title))
                .await
                .unwrap();
        }

        let mut gig = draft("2026-10-18", "20:00");
        gig.song_limit = Some(5);
        gig.playlist_source = Some(PlaylistSource::Embedded {
            tracks: vec![json!("Song A"), json!("Song B")],
        });
        let gig = collab.gigs.create_gig(&artist(), gig).await.unwrap();

        let playlist = collab.gigs.effective_playlist(gig.id).await.unwrap();
        let titles: Vec<_> = playlist
            .iter()
            .map(|t| (t.track.title.as_str(), t.provenance))
            .collect();

        assert_eq!(
            titles,
            vec![
                ("Song A", Provenance::Primary),
                ("Song B", Provenance::Primary),
                ("Song C", Provenance::Supplemented),
                ("Song D", Provenance::Supplemented),
            ]
        );
    }

    #[tokio::test]
    async fn attached_playlists_are_resolved_in_their_order() {
        let (collab, _) = collab();

        let playlist = collab
            .catalog
            .create_playlist(
                &artist(),
                PlaylistDraft {
                    name: "Openers".to_string(),
                    description: String::new(),
                    tracks: vec![
                        json!({ "title": "Second", "order": 1 }),
                        json!({ "title": "First", "order": 0 }),
                    ],
                },
            )
            .await
            .unwrap();

        let gig = gig_with_tracks(&collab, vec![json!("Embedded")]).await;
        let gig = collab
            .gigs
            .set_playlist_source(
                &artist(),
                gig.id,
                Some(PlaylistSource::Attached {
                    playlist_id: playlist.id,
                }),
            )
            .await
            .unwrap();

        // Setting one source replaces the other
        assert!(matches!(
            gig.playlist_source,
            Some(PlaylistSource::Attached { .. })
        ));

        let titles: Vec<_> = collab
            .gigs
            .effective_playlist(gig.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.track.title)
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn only_owned_playlists_can_be_attached() {
        let (collab, _) = collab();

        let playlist = collab
            .catalog
            .create_playlist(
                &fan(1),
                PlaylistDraft {
                    name: "Not yours".to_string(),
                    description: String::new(),
                    tracks: vec![],
                },
            )
            .await
            .unwrap();

        let gig = gig_with_tracks(&collab, vec![]).await;
        let error = collab
            .gigs
            .set_playlist_source(
                &artist(),
                gig.id,
                Some(PlaylistSource::Attached {
                    playlist_id: playlist.id,
                }),
            )
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn embedded_tracks_are_capped_at_the_song_limit() {
        let (collab, _) = collab();

        let tracks = (0..30).map(|i| json!(format!("Song {}", i))).collect();
        let gig = gig_with_tracks(&collab, tracks).await;

        match gig.playlist_source {
            Some(PlaylistSource::Embedded { tracks }) => assert_eq!(tracks.len(), 20),
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[tokio::test]
    async fn embedded_tracks_are_resolved_in_their_order() {
        let (collab, _) = collab();

        let gig = gig_with_tracks(
            &collab,
            vec![
                json!({ "title": "Second", "order": 1 }),
                json!({ "title": "First", "order": 0 }),
            ],
        )
        .await;

        let titles: Vec<_> = collab
            .gigs
            .effective_playlist(gig.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.track.title)
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn embedded_tracks_are_ordered_before_they_are_capped() {
        let (collab, _) = collab();

        let mut gig = draft("2026-10-18", "20:00");
        gig.song_limit = Some(5);
        gig.playlist_source = Some(PlaylistSource::Embedded {
            tracks: (0..6)
                .rev()
                .map(|i| json!({ "title": format!("Song {}", i), "order": i * 10 }))
                .collect(),
        });
        let gig = collab.gigs.create_gig(&artist(), gig).await.unwrap();

        let expected: Vec<_> = (0..5)
            .map(|i| json!({ "title": format!("Song {}", i), "order": i }))
            .collect();

        match gig.playlist_source {
            Some(PlaylistSource::Embedded { tracks }) => assert_eq!(tracks, expected),
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[tokio::test]
    async fn artists_can_edit_their_gigs() {
        let (collab, _) = collab();

        let tracks = (0..10)
            .rev()
            .map(|i| json!({ "title": format!("Song {}", i), "order": i }))
            .collect();
        let gig = gig_with_tracks(&collab, tracks).await;

        let mut edit = edit_of(draft("2026-10-19", "21:30"));
        edit.title = " Late set ".to_string();
        edit.song_limit = Some(5);

        let updated = collab
            .gigs
            .update_gig(&artist(), gig.id, edit)
            .await
            .unwrap();

        assert_eq!(updated.title, "Late set");
        assert_eq!((updated.date.as_str(), updated.time.as_str()), ("2026-10-19", "21:30"));
        assert_eq!(updated.song_limit, Some(5));
        assert_eq!(updated.status, GigStatus::Upcoming);

        let titles: Vec<_> = collab
            .gigs
            .effective_playlist(gig.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.track.title)
            .collect();
        assert_eq!(titles, vec!["Song 0", "Song 1", "Song 2", "Song 3", "Song 4"]);
    }

    #[tokio::test]
    async fn gig_edits_are_validated_and_owned() {
        let (collab, database) = collab();
        let gig = gig_with_tracks(&collab, vec![]).await;

        let error = collab
            .gigs
            .update_gig(&fan(1), gig.id, edit_of(draft("2026-10-18", "20:00")))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PermissionDenied);

        let error = collab
            .gigs
            .update_gig(&artist(), gig.id, edit_of(draft("2026-10-18", "8pm")))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);

        let mut too_many = edit_of(draft("2026-10-18", "20:00"));
        too_many.song_limit = Some(0);
        let error = collab
            .gigs
            .update_gig(&artist(), gig.id, too_many)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);

        force_status(&database, &gig, GigStatus::Cancelled).await;

        let error = collab
            .gigs
            .update_gig(&artist(), gig.id, edit_of(draft("2026-10-18", "20:00")))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::FailedPrecondition);
    }
}
