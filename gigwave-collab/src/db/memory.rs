use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use gigwave_core::{GigStatus, NowPlaying, PlaylistSource, PrimaryKey, RequestStatus, UserId};
use parking_lot::Mutex;
use serde_json::Value;

use crate::{
    Database, DatabaseError, GigData, GigTransition, InterestData, MasterTrackData, NewGig,
    NewInterest, NewMasterTrack, NewPlaylist, NewReaction, NewRequest, NewVote, NowPlayingEffect,
    PlaylistData, ReactionData, RequestCounter, RequestCounters, RequestData, RequestTransition,
    Result, SessionData, TransitionedRequest, UpdatedGig, VoteData,
};

/// A database kept entirely in memory.
/// Every operation holds one lock for its whole duration, which makes it atomic.
#[derive(Default)]
pub struct MemoryDatabase {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_id: PrimaryKey,
    sessions: HashMap<String, SessionData>,
    gigs: BTreeMap<PrimaryKey, GigData>,
    playlists: BTreeMap<PrimaryKey, PlaylistData>,
    master_tracks: BTreeMap<PrimaryKey, MasterTrackData>,
    requests: BTreeMap<PrimaryKey, RequestData>,
    votes: BTreeMap<(PrimaryKey, UserId), VoteData>,
    interests: BTreeMap<(PrimaryKey, UserId), InterestData>,
    reactions: BTreeMap<PrimaryKey, ReactionData>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a session, as the identity provider would
    pub fn insert_session(&self, session: SessionData) {
        self.state
            .lock()
            .sessions
            .insert(session.token.clone(), session);
    }
}

impl MemoryState {
    fn next_id(&mut self) -> PrimaryKey {
        self.last_id += 1;
        self.last_id
    }

    fn gig_mut(&mut self, gig_id: PrimaryKey) -> Result<&mut GigData> {
        self.gigs.get_mut(&gig_id).ok_or(DatabaseError::NotFound {
            resource: "gig",
            identifier: "id",
        })
    }

    fn request_mut(&mut self, gig_id: PrimaryKey, request_id: PrimaryKey) -> Result<&mut RequestData> {
        self.requests
            .get_mut(&request_id)
            .filter(|r| r.gig_id == gig_id)
            .ok_or(DatabaseError::NotFound {
                resource: "request",
                identifier: "id",
            })
    }

    fn playlist_mut(&mut self, playlist_id: PrimaryKey) -> Result<&mut PlaylistData> {
        self.playlists
            .get_mut(&playlist_id)
            .ok_or(DatabaseError::NotFound {
                resource: "playlist",
                identifier: "id",
            })
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        self.state
            .lock()
            .sessions
            .get(token)
            .filter(|s| s.expires_at > Utc::now())
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "session",
                identifier: "token",
            })
    }

    async fn gig_by_id(&self, gig_id: PrimaryKey) -> Result<GigData> {
        self.state.lock().gig_mut(gig_id).map(|g| g.clone())
    }

    async fn list_gigs(&self) -> Result<Vec<GigData>> {
        Ok(self.state.lock().gigs.values().cloned().collect())
    }

    async fn create_gig(&self, new_gig: NewGig) -> Result<GigData> {
        let mut state = self.state.lock();
        let now = Utc::now();

        let gig = GigData {
            id: state.next_id(),
            artist_id: new_gig.artist_id,
            title: new_gig.title,
            description: new_gig.description,
            venue: new_gig.venue,
            date: new_gig.date,
            time: new_gig.time,
            status: GigStatus::Upcoming,
            song_limit: new_gig.song_limit,
            playlist_source: new_gig.playlist_source,
            now_playing: None,
            counters: RequestCounters::default(),
            created_at: now,
            updated_at: now,
            ended_at: None,
            cancelled_at: None,
        };

        state.gigs.insert(gig.id, gig.clone());
        Ok(gig)
    }

    async fn update_gig(&self, gig_id: PrimaryKey, update: UpdatedGig) -> Result<GigData> {
        let mut state = self.state.lock();
        let gig = state.gig_mut(gig_id)?;

        gig.title = update.title;
        gig.description = update.description;
        gig.venue = update.venue;
        gig.date = update.date;
        gig.time = update.time;
        gig.song_limit = update.song_limit;
        gig.playlist_source = update.playlist_source;
        gig.updated_at = Utc::now();

        Ok(gig.clone())
    }

    async fn update_playlist_source(
        &self,
        gig_id: PrimaryKey,
        source: Option<PlaylistSource>,
    ) -> Result<GigData> {
        let mut state = self.state.lock();
        let gig = state.gig_mut(gig_id)?;

        gig.playlist_source = source;
        gig.updated_at = Utc::now();

        Ok(gig.clone())
    }

    async fn update_now_playing(
        &self,
        gig_id: PrimaryKey,
        now_playing: Option<NowPlaying>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let gig = state.gig_mut(gig_id)?;

        gig.now_playing = now_playing;
        gig.updated_at = Utc::now();

        Ok(())
    }

    async fn transition_gig(&self, transition: GigTransition) -> Result<GigData> {
        let mut state = self.state.lock();
        let gig = state.gig_mut(transition.gig_id)?;

        if gig.status != transition.from {
            return Err(DatabaseError::Stale { resource: "gig" });
        }

        gig.status = transition.to;
        gig.updated_at = transition.at;

        match transition.to {
            GigStatus::Ended => gig.ended_at = Some(transition.at),
            GigStatus::Cancelled => gig.cancelled_at = Some(transition.at),
            _ => {}
        }

        if transition.clear_now_playing {
            gig.now_playing = None;
        }

        Ok(gig.clone())
    }

    async fn playlist_by_id(&self, playlist_id: PrimaryKey) -> Result<PlaylistData> {
        self.state.lock().playlist_mut(playlist_id).map(|p| p.clone())
    }

    async fn list_playlists(&self, artist_id: &str) -> Result<Vec<PlaylistData>> {
        Ok(self
            .state
            .lock()
            .playlists
            .values()
            .filter(|p| p.artist_id == artist_id)
            .cloned()
            .collect())
    }

    async fn create_playlist(&self, new_playlist: NewPlaylist) -> Result<PlaylistData> {
        let mut state = self.state.lock();
        let now = Utc::now();

        let playlist = PlaylistData {
            id: state.next_id(),
            artist_id: new_playlist.artist_id,
            name: new_playlist.name,
            description: new_playlist.description,
            tracks: new_playlist.tracks,
            created_at: now,
            updated_at: now,
        };

        state.playlists.insert(playlist.id, playlist.clone());
        Ok(playlist)
    }

    async fn update_playlist_tracks(
        &self,
        playlist_id: PrimaryKey,
        tracks: Vec<Value>,
    ) -> Result<PlaylistData> {
        let mut state = self.state.lock();
        let playlist = state.playlist_mut(playlist_id)?;

        playlist.tracks = tracks;
        playlist.updated_at = Utc::now();

        Ok(playlist.clone())
    }

    async fn delete_playlist(&self, playlist_id: PrimaryKey) -> Result<()> {
        let mut state = self.state.lock();

        state.playlist_mut(playlist_id)?;
        state.playlists.remove(&playlist_id);

        for gig in state.gigs.values_mut() {
            if let Some(PlaylistSource::Attached { playlist_id: attached }) = gig.playlist_source {
                if attached == playlist_id {
                    gig.playlist_source = None;
                }
            }
        }

        Ok(())
    }

    async fn master_tracks(&self, artist_id: &str) -> Result<Vec<MasterTrackData>> {
        Ok(self
            .state
            .lock()
            .master_tracks
            .values()
            .filter(|t| t.artist_id == artist_id)
            .cloned()
            .collect())
    }

    async fn create_master_track(&self, new_track: NewMasterTrack) -> Result<MasterTrackData> {
        let mut state = self.state.lock();

        let track = MasterTrackData {
            id: state.next_id(),
            artist_id: new_track.artist_id,
            track: new_track.track,
            created_at: Utc::now(),
        };

        state.master_tracks.insert(track.id, track.clone());
        Ok(track)
    }

    async fn master_track_by_id(&self, track_id: PrimaryKey) -> Result<MasterTrackData> {
        self.state
            .lock()
            .master_tracks
            .get(&track_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "master track",
                identifier: "id",
            })
    }

    async fn delete_master_track(&self, track_id: PrimaryKey) -> Result<()> {
        self.state
            .lock()
            .master_tracks
            .remove(&track_id)
            .map(|_| ())
            .ok_or(DatabaseError::NotFound {
                resource: "master track",
                identifier: "id",
            })
    }

    async fn request_by_id(
        &self,
        gig_id: PrimaryKey,
        request_id: PrimaryKey,
    ) -> Result<RequestData> {
        self.state
            .lock()
            .request_mut(gig_id, request_id)
            .map(|r| r.clone())
    }

    async fn list_requests(&self, gig_id: PrimaryKey) -> Result<Vec<RequestData>> {
        Ok(self
            .state
            .lock()
            .requests
            .values()
            .filter(|r| r.gig_id == gig_id)
            .cloned()
            .collect())
    }

    async fn create_request(&self, new_request: NewRequest) -> Result<RequestData> {
        let mut state = self.state.lock();

        // Ensure gig exists
        state.gig_mut(new_request.gig_id)?;

        let request = RequestData {
            id: state.next_id(),
            gig_id: new_request.gig_id,
            user_id: new_request.user_id,
            song_name: new_request.song_name,
            message: new_request.message,
            custom: new_request.custom,
            status: Default::default(),
            created_at: Utc::now(),
            accepted_at: None,
            rejected_at: None,
            played_at: None,
        };

        state.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn transition_request(
        &self,
        transition: RequestTransition,
    ) -> Result<TransitionedRequest> {
        let mut state = self.state.lock();

        // Validate both documents before writing either
        state.gig_mut(transition.gig_id)?;
        let request = state.request_mut(transition.gig_id, transition.request_id)?;

        if request.status != transition.from {
            return Err(DatabaseError::Stale {
                resource: "request",
            });
        }

        request.status = transition.to;
        match transition.to {
            RequestStatus::Accepted => request.accepted_at = Some(transition.at),
            RequestStatus::Rejected => request.rejected_at = Some(transition.at),
            RequestStatus::Played => request.played_at = Some(transition.at),
            RequestStatus::Pending => {}
        }
        let updated = request.clone();

        let gig = state.gig_mut(transition.gig_id)?;

        if let Some(counter) = RequestCounter::for_status(transition.to) {
            counter.increment(&mut gig.counters);
        }

        let mut cleared_now_playing = false;

        match transition.now_playing {
            NowPlayingEffect::Keep => {}
            NowPlayingEffect::Set(now_playing) => gig.now_playing = Some(now_playing),
            NowPlayingEffect::ClearIfCurrent => {
                let is_current = gig
                    .now_playing
                    .as_ref()
                    .is_some_and(|n| n.references_request(transition.request_id));

                if is_current {
                    gig.now_playing = None;
                    cleared_now_playing = true;
                }
            }
        }

        gig.updated_at = transition.at;

        Ok(TransitionedRequest {
            request: updated,
            cleared_now_playing,
        })
    }

    async fn upsert_vote(&self, new_vote: NewVote) -> Result<()> {
        let mut state = self.state.lock();

        state.request_mut(new_vote.gig_id, new_vote.request_id)?;

        state
            .votes
            .entry((new_vote.request_id, new_vote.voter_id.clone()))
            .or_insert_with(|| VoteData {
                request_id: new_vote.request_id,
                voter_id: new_vote.voter_id,
                gig_id: new_vote.gig_id,
                created_at: Utc::now(),
            });

        Ok(())
    }

    async fn list_votes(&self, gig_id: PrimaryKey) -> Result<Vec<VoteData>> {
        Ok(self
            .state
            .lock()
            .votes
            .values()
            .filter(|v| v.gig_id == gig_id)
            .cloned()
            .collect())
    }

    async fn upsert_interest(&self, new_interest: NewInterest) -> Result<InterestData> {
        let mut state = self.state.lock();
        let now = Utc::now();

        state.gig_mut(new_interest.gig_id)?;

        let interest = state
            .interests
            .entry((new_interest.gig_id, new_interest.user_id.clone()))
            .and_modify(|i| {
                if new_interest.status > i.status {
                    i.status = new_interest.status;
                    i.updated_at = now;
                }
            })
            .or_insert_with(|| InterestData {
                gig_id: new_interest.gig_id,
                user_id: new_interest.user_id,
                status: new_interest.status,
                created_at: now,
                updated_at: now,
            });

        Ok(interest.clone())
    }

    async fn delete_interest(&self, gig_id: PrimaryKey, user_id: &str) -> Result<()> {
        self.state
            .lock()
            .interests
            .remove(&(gig_id, user_id.to_string()));

        Ok(())
    }

    async fn list_interests(&self, gig_id: PrimaryKey) -> Result<Vec<InterestData>> {
        Ok(self
            .state
            .lock()
            .interests
            .values()
            .filter(|i| i.gig_id == gig_id)
            .cloned()
            .collect())
    }

    async fn interests_for_user(&self, user_id: &str) -> Result<Vec<InterestData>> {
        Ok(self
            .state
            .lock()
            .interests
            .values()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_reaction(&self, new_reaction: NewReaction) -> Result<ReactionData> {
        let mut state = self.state.lock();

        // Ensure gig exists
        state.gig_mut(new_reaction.gig_id)?;

        let reaction = ReactionData {
            id: state.next_id(),
            gig_id: new_reaction.gig_id,
            user_id: new_reaction.user_id,
            emoji: new_reaction.emoji,
            created_at: Utc::now(),
        };

        state.reactions.insert(reaction.id, reaction.clone());
        Ok(reaction)
    }

    async fn recent_reactions(
        &self,
        gig_id: PrimaryKey,
        limit: usize,
    ) -> Result<Vec<ReactionData>> {
        let state = self.state.lock();

        // Ids increase with time, so the map is already oldest first
        let mut recent: Vec<_> = state
            .reactions
            .values()
            .rev()
            .filter(|r| r.gig_id == gig_id)
            .take(limit)
            .cloned()
            .collect();
        recent.reverse();

        Ok(recent)
    }
}
