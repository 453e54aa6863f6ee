use gigwave_core::{PrimaryKey, Track};
use log::info;
use serde_json::Value;

use crate::{
    Caller, CollabContext, GigError, GigResult, MasterTrackData, NewMasterTrack, NewPlaylist,
    PlaylistData,
};

/// Manages the saved playlists and master catalogs of artists
pub struct Catalog {
    context: CollabContext,
}

/// A playlist as written by an artist
#[derive(Debug, Clone, Default)]
pub struct PlaylistDraft {
    pub name: String,
    pub description: String,
    pub tracks: Vec<Value>,
}

impl Catalog {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    pub async fn create_playlist(
        &self,
        caller: &Caller,
        draft: PlaylistDraft,
    ) -> GigResult<PlaylistData> {
        let artist_id = caller.user_id()?;

        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(GigError::invalid("Playlist name cannot be empty"));
        }

        let playlist = self
            .context
            .database
            .create_playlist(NewPlaylist {
                artist_id: artist_id.to_string(),
                name,
                description: draft.description.trim().to_string(),
                tracks: draft.tracks,
            })
            .await?;

        info!("Playlist {} created by {}", playlist.name, playlist.artist_id);

        Ok(playlist)
    }

    pub async fn playlists_for_artist(&self, artist_id: &str) -> GigResult<Vec<PlaylistData>> {
        Ok(self.context.database.list_playlists(artist_id).await?)
    }

    /// Replaces the tracks of a playlist owned by the caller
    pub async fn update_playlist_tracks(
        &self,
        caller: &Caller,
        playlist_id: PrimaryKey,
        tracks: Vec<Value>,
    ) -> GigResult<PlaylistData> {
        let artist_id = caller.user_id()?;
        let playlist = self.context.database.playlist_by_id(playlist_id).await?;

        if playlist.artist_id != artist_id {
            return Err(GigError::PermissionDenied);
        }

        Ok(self
            .context
            .database
            .update_playlist_tracks(playlist_id, tracks)
            .await?)
    }

    /// Deletes a playlist owned by the caller.
    /// Gigs it was attached to are left with only their master catalog.
    pub async fn delete_playlist(&self, caller: &Caller, playlist_id: PrimaryKey) -> GigResult<()> {
        let artist_id = caller.user_id()?;
        let playlist = self.context.database.playlist_by_id(playlist_id).await?;

        if playlist.artist_id != artist_id {
            return Err(GigError::PermissionDenied);
        }

        self.context.database.delete_playlist(playlist_id).await?;
        info!("Playlist {} deleted by {}", playlist.name, artist_id);

        Ok(())
    }

    /// Adds a track to the end of the caller's master catalog
    pub async fn add_master_track(&self, caller: &Caller, track: Value) -> GigResult<MasterTrackData> {
        let artist_id = caller.user_id()?;

        if Track::normalize(&track).is_none() {
            return Err(GigError::invalid(
                "Track must be a song name or an object with a title",
            ));
        }

        Ok(self
            .context
            .database
            .create_master_track(NewMasterTrack {
                artist_id: artist_id.to_string(),
                track,
            })
            .await?)
    }

    /// Removes a track from the caller's master catalog
    pub async fn delete_master_track(&self, caller: &Caller, track_id: PrimaryKey) -> GigResult<()> {
        let artist_id = caller.user_id()?;
        let track = self.context.database.master_track_by_id(track_id).await?;

        if track.artist_id != artist_id {
            return Err(GigError::PermissionDenied);
        }

        Ok(self.context.database.delete_master_track(track_id).await?)
    }

    /// Returns the master catalog of an artist, in the order tracks were added
    pub async fn master_tracks(&self, artist_id: &str) -> GigResult<Vec<MasterTrackData>> {
        Ok(self.context.database.master_tracks(artist_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use gigwave_core::PlaylistSource;

    use super::PlaylistDraft;
    use crate::{testing::*, Caller, Database, ErrorKind};

    #[tokio::test]
    async fn master_tracks_keep_insertion_order() {
        let (collab, _) = collab();

        for track in [json!("Intro"), json!({ "trackName": "Encore", "artist": "Band" })] {
            collab
                .catalog
                .add_master_track(&artist(), track)
                .await
                .unwrap();
        }

        let tracks = collab.catalog.master_tracks(ARTIST).await.unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].track, json!("Intro"));

        assert!(collab.catalog.master_tracks("someone-else").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_master_tracks_are_rejected() {
        let (collab, _) = collab();

        for track in [json!(""), json!(42), json!(null), json!(["Intro"])] {
            let error = collab
                .catalog
                .add_master_track(&artist(), track)
                .await
                .unwrap_err();

            assert_eq!(error.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[tokio::test]
    async fn playlists_can_only_be_edited_by_their_artist() {
        let (collab, _) = collab();

        let playlist = collab
            .catalog
            .create_playlist(
                &artist(),
                PlaylistDraft {
                    name: " Openers ".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(playlist.name, "Openers");

        let error = collab
            .catalog
            .update_playlist_tracks(&fan(1), playlist.id, vec![json!("Hijacked")])
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PermissionDenied);

        let updated = collab
            .catalog
            .update_playlist_tracks(&artist(), playlist.id, vec![json!("Intro")])
            .await
            .unwrap();
        assert_eq!(updated.tracks, vec![json!("Intro")]);

        let listed = collab.catalog.playlists_for_artist(ARTIST).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn anonymous_callers_cannot_create_playlists() {
        let (collab, _) = collab();

        let error = collab
            .catalog
            .create_playlist(
                &Caller::Anonymous,
                PlaylistDraft {
                    name: "Openers".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Unauthenticated);
    }

    #[tokio::test]
    async fn deleted_playlists_are_detached_from_gigs() {
        let (collab, database) = collab();

        let playlist = collab
            .catalog
            .create_playlist(
                &artist(),
                PlaylistDraft {
                    name: "Openers".to_string(),
                    tracks: vec![json!("Intro")],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let gig = gig_with_tracks(&collab, vec![]).await;
        collab
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

        let error = collab
            .catalog
            .delete_playlist(&fan(1), playlist.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PermissionDenied);

        collab
            .catalog
            .delete_playlist(&artist(), playlist.id)
            .await
            .unwrap();

        assert!(collab.catalog.playlists_for_artist(ARTIST).await.unwrap().is_empty());
        assert!(database
            .gig_by_id(gig.id)
            .await
            .unwrap()
            .playlist_source
            .is_none());
        assert!(collab.gigs.effective_playlist(gig.id).await.unwrap().is_empty());

        let error = collab
            .catalog
            .delete_playlist(&artist(), playlist.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn master_tracks_can_only_be_deleted_by_their_artist() {
        let (collab, _) = collab();

        let intro = collab
            .catalog
            .add_master_track(&artist(), json!("Intro"))
            .await
            .unwrap();
        collab
            .catalog
            .add_master_track(&artist(), json!("Encore"))
            .await
            .unwrap();

        let error = collab
            .catalog
            .delete_master_track(&fan(1), intro.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PermissionDenied);

        collab
            .catalog
            .delete_master_track(&artist(), intro.id)
            .await
            .unwrap();

        let remaining: Vec<_> = collab
            .catalog
            .master_tracks(ARTIST)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.track)
            .collect();
        assert_eq!(remaining, vec![json!("Encore")]);

        let error = collab
            .catalog
            .delete_master_track(&artist(), intro.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }
}
