use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet},
    fmt::Display,
    str::FromStr,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PrimaryKey, Track};

/// The status of a song request.
/// Requests only move forward, nothing returns to [RequestStatus::Pending].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Played,
}

#[derive(Debug, Error)]
#[error("Request cannot go from {from} to {to}")]
pub struct RequestTransitionError {
    pub from: RequestStatus,
    pub to: RequestStatus,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Played => "played",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Played)
    }

    /// A request has to be accepted before it can be played
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Accepted)
                | (Self::Pending, Self::Rejected)
                | (Self::Accepted, Self::Played)
        )
    }

    /// Returns the next status if the transition is legal
    pub fn transition(self, next: RequestStatus) -> Result<RequestStatus, RequestTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(RequestTransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "played" => Ok(Self::Played),
            other => Err(format!("unknown request status {}", other)),
        }
    }
}

/// What the "now playing" pointer of a gig refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum NowPlayingSource {
    #[serde(rename_all = "camelCase")]
    Request { request_id: PrimaryKey },
    #[serde(rename_all = "camelCase")]
    Playlist { track_index: usize },
}

/// The single track a gig is currently playing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    /// Snapshot of the song name at the time it started
    pub song_name: String,
    #[serde(flatten)]
    pub source: NowPlayingSource,
    pub started_at: DateTime<Utc>,
}

impl NowPlaying {
    pub fn from_request(request_id: PrimaryKey, song_name: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            song_name: song_name.to_string(),
            source: NowPlayingSource::Request { request_id },
            started_at,
        }
    }

    pub fn from_playlist(track_index: usize, track: &Track, started_at: DateTime<Utc>) -> Self {
        Self {
            song_name: track.title.clone(),
            source: NowPlayingSource::Playlist { track_index },
            started_at,
        }
    }

    pub fn references_request(&self, request_id: PrimaryKey) -> bool {
        self.source == NowPlayingSource::Request { request_id }
    }
}

/// Counts distinct voters per request
#[derive(Debug, Default, Clone)]
pub struct VoteTally {
    voters: HashMap<PrimaryKey, HashSet<String>>,
}

impl VoteTally {
    pub fn from_votes<'a, I>(votes: I) -> Self
    where
        I: IntoIterator<Item = (PrimaryKey, &'a str)>,
    {
        let mut tally = Self::default();

        for (request_id, voter_id) in votes {
            tally.record(request_id, voter_id);
        }

        tally
    }

    /// Records a vote, returning false if the voter already voted on this request
    pub fn record(&mut self, request_id: PrimaryKey, voter_id: &str) -> bool {
        self.voters
            .entry(request_id)
            .or_default()
            .insert(voter_id.to_string())
    }

    pub fn count(&self, request_id: PrimaryKey) -> u32 {
        self.voters
            .get(&request_id)
            .map(|voters| voters.len() as u32)
            .unwrap_or(0)
    }

    pub fn has_voted(&self, request_id: PrimaryKey, voter_id: &str) -> bool {
        self.voters
            .get(&request_id)
            .is_some_and(|voters| voters.contains(voter_id))
    }
}

/// Anything that can be placed in a request queue
pub trait Queueable {
    fn request_id(&self) -> PrimaryKey;
    fn created_at(&self) -> DateTime<Utc>;
}

/// A request together with its vote count
#[derive(Debug, Clone)]
pub struct Ranked<T> {
    pub item: T,
    pub votes: u32,
}

/// Orders requests for the artist's queue.
///
/// Most votes come first, equally voted requests surface oldest first.
/// This is recomputed on every read and never stored.
pub fn prioritize<T>(requests: Vec<T>, tally: &VoteTally) -> Vec<Ranked<T>>
where
    T: Queueable,
{
    let mut ranked: Vec<_> = requests
        .into_iter()
        .map(|item| Ranked {
            votes: tally.count(item.request_id()),
            item,
        })
        .collect();

    ranked.sort_by_key(|r| (Reverse(r.votes), r.item.created_at(), r.item.request_id()));
    ranked
}
