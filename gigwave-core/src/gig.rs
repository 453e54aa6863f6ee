use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The lifecycle status of a gig.
///
/// ```text
/// upcoming ──> Check with Venue ──> cancelled
///    │  └──────────────────────────────^
///    └──> live ──> ended
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GigStatus {
    #[default]
    #[serde(rename = "upcoming")]
    Upcoming,
    /// The gig should have started but never went live
    #[serde(rename = "Check with Venue")]
    CheckWithVenue,
    #[serde(rename = "live")]
    Live,
    #[serde(rename = "ended")]
    Ended,
    #[serde(rename = "cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
#[error("Gig cannot go from {from} to {to}")]
pub struct GigTransitionError {
    pub from: GigStatus,
    pub to: GigStatus,
}

impl GigStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::CheckWithVenue => "Check with Venue",
            Self::Live => "live",
            Self::Ended => "ended",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended | Self::Cancelled)
    }

    /// Audiences can only request and vote while a gig is live
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// Promotes a gig that hasn't started yet
    pub fn go_live(self) -> Result<GigStatus, GigTransitionError> {
        match self {
            Self::Upcoming | Self::CheckWithVenue => Ok(Self::Live),
            from => Err(GigTransitionError {
                from,
                to: Self::Live,
            }),
        }
    }

    /// Calls off a gig that never went live
    pub fn cancel(self) -> Result<GigStatus, GigTransitionError> {
        match self {
            Self::Upcoming | Self::CheckWithVenue => Ok(Self::Cancelled),
            from => Err(GigTransitionError {
                from,
                to: Self::Cancelled,
            }),
        }
    }

    /// Ends a live gig
    pub fn end(self) -> Result<GigStatus, GigTransitionError> {
        match self {
            Self::Live => Ok(Self::Ended),
            from => Err(GigTransitionError {
                from,
                to: Self::Ended,
            }),
        }
    }
}

impl Display for GigStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GigStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(Self::Upcoming),
            "Check with Venue" => Ok(Self::CheckWithVenue),
            "live" => Ok(Self::Live),
            "ended" => Ok(Self::Ended),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown gig status {}", other)),
        }
    }
}
