use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{PrimaryKey, Track};

/// Where a gig's own tracks come from.
/// A gig either references a saved playlist or embeds its own list, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum PlaylistSource {
    /// A saved playlist of the artist, reusable across gigs
    Attached { playlist_id: PrimaryKey },
    /// Tracks stored directly on the gig
    Embedded { tracks: Vec<Value> },
}

/// Whether a resolved track came from the gig itself or was padded from the master catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    Primary,
    Supplemented,
}

/// A track in an effective playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTrack {
    #[serde(flatten)]
    pub track: Track,
    pub provenance: Provenance,
}

/// The maximum number of tracks in a gig's effective playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongLimit(u32);

#[derive(Debug, Error)]
pub enum SongLimitError {
    #[error("Song limit must be between {min} and {max}, got {value}")]
    OutOfRange { value: i64, min: u32, max: u32 },
}

impl SongLimit {
    pub const MIN: u32 = 5;
    pub const MAX: u32 = 60;
    pub const DEFAULT: u32 = 20;

    /// Creates a song limit, rejecting values outside of the allowed range.
    /// Used when an artist writes a gig.
    pub fn new(value: i64) -> Result<Self, SongLimitError> {
        if value < Self::MIN as i64 || value > Self::MAX as i64 {
            return Err(SongLimitError::OutOfRange {
                value,
                min: Self::MIN,
                max: Self::MAX,
            });
        }

        Ok(Self(value as u32))
    }

    /// Forces any stored value into the allowed range.
    /// Missing values use the default, fractional values round up.
    pub fn clamped(raw: Option<f64>) -> Self {
        match raw {
            Some(value) if !value.is_nan() => {
                let value = value.ceil().clamp(Self::MIN as f64, Self::MAX as f64);
                Self(value as u32)
            }
            _ => Self::default(),
        }
    }

    /// Same as [SongLimit::clamped], for untyped input
    pub fn from_value(raw: &Value) -> Self {
        Self::clamped(raw.as_f64())
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for SongLimit {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Computes the tracks that will actually be used for a gig.
///
/// Tracks from the gig's own list come first, in order. If there are fewer than
/// `limit` of them, the artist's master catalog pads the rest. Duplicates are
/// skipped across both lists, and the result never exceeds `limit`.
pub fn compute_effective_playlist(
    primary: &[Value],
    master: &[Value],
    limit: SongLimit,
) -> Vec<ResolvedTrack> {
    let limit = limit.get();

    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(limit);

    let sources = [
        (primary, Provenance::Primary),
        (master, Provenance::Supplemented),
    ];

    for (raw_tracks, provenance) in sources {
        for raw in raw_tracks {
            if resolved.len() >= limit {
                break;
            }

            let Some(track) = Track::normalize(raw) else {
                continue;
            };

            if !seen.insert(track.key()) {
                continue;
            }

            resolved.push(ResolvedTrack { track, provenance });
        }
    }

    resolved
}

/// Sorts the tracks of a saved playlist by their `order` field.
/// Tracks without one keep their position in the list.
pub fn order_playlist_tracks(tracks: Vec<Value>) -> Vec<Value> {
    let mut indexed: Vec<_> = tracks
        .into_iter()
        .enumerate()
        .map(|(index, track)| {
            let order = track
                .get("order")
                .and_then(Value::as_f64)
                .unwrap_or(index as f64);

            (order, track)
        })
        .collect();

    indexed.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    indexed.into_iter().map(|(_, track)| track).collect()
}

/// Rewrites the `order` field of every track that has one to its position in the list
pub fn renumber_playlist_tracks(tracks: &mut [Value]) {
    for (index, track) in tracks.iter_mut().enumerate() {
        if let Some(fields) = track.as_object_mut().filter(|f| f.contains_key("order")) {
            fields.insert("order".to_string(), Value::from(index));
        }
    }
}
