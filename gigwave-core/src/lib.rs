mod config;
mod geo;
mod gig;
mod lifecycle;
mod playlist;
mod request;
mod track;

pub use config::*;
pub use geo::*;
pub use gig::*;
pub use lifecycle::*;
pub use playlist::*;
pub use request::*;
pub use track::*;

/// The type used for primary keys in the database.
pub type PrimaryKey = i32;

/// Identities are issued by an external provider, so they are opaque strings.
pub type UserId = String;
