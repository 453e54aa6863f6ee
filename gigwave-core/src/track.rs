use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Title given to tracks that don't carry one
pub const UNTITLED_TRACK: &str = "Untitled track";

// Aliases are tried in order, the first usable value wins.
const EXTERNAL_ID_FIELDS: [&str; 3] = ["itunesId", "trackId", "id"];
const TITLE_FIELDS: [&str; 3] = ["title", "name", "trackName"];
const ARTIST_FIELDS: [&str; 3] = ["artistName", "artist", "singer"];

/// A song reference in its canonical shape.
///
/// Tracks arrive as bare names or as objects with many different field names,
/// [Track::normalize] is the only place that deals with those shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// The id of the track in the external song catalog
    pub external_id: Option<String>,
    pub title: String,
    pub artist_name: Option<String>,
}

/// Identifies a track for deduplication, independent of where it came from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackKey(String);

impl Track {
    /// Converts a raw track into a [Track], or returns [None] if it isn't a track at all.
    pub fn normalize(raw: &Value) -> Option<Self> {
        match raw {
            Value::String(name) if !name.is_empty() => Some(Self {
                external_id: None,
                title: name.clone(),
                artist_name: None,
            }),
            Value::Object(fields) => Some(Self::from_fields(fields)),
            _ => None,
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            external_id: first_present(fields, &EXTERNAL_ID_FIELDS),
            title: first_present(fields, &TITLE_FIELDS)
                .unwrap_or_else(|| UNTITLED_TRACK.to_string()),
            artist_name: first_present(fields, &ARTIST_FIELDS),
        }
    }

    /// Returns the deduplication key of this track
    pub fn key(&self) -> TrackKey {
        if let Some(id) = &self.external_id {
            return TrackKey(format!("itunes:{}", id));
        }

        let title = self.title.trim().to_lowercase();
        let artist = self
            .artist_name
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        TrackKey(format!("{}::{}", title, artist))
    }
}

impl TrackKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn first_present(fields: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| fields.get(*alias))
        .find_map(present_text)
}

/// Empty strings, zero, null and booleans count as absent
fn present_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) if number.as_f64() != Some(0.0) => Some(number_text(number)),
        _ => None,
    }
}

/// Integral floats render without a fraction, so `1.0` and `1` are the same id
fn number_text(number: &Number) -> String {
    match number.as_f64() {
        Some(float) if number.is_f64() && float.fract() == 0.0 && float.abs() < 1e15 => {
            format!("{}", float as i64)
        }
        _ => number.to_string(),
    }
}
