//! Match a Spotify user's playlist artists against a festival lineup and
//! write day-ordered schedules of the overlap.

pub mod catalog;
pub mod config;
pub mod error;
pub mod lineup;
pub mod matcher;
pub mod normalize;
pub mod playlists;
pub mod prompt;
pub mod recommend;
pub mod schedule;
pub mod store;

pub use catalog::{MusicCatalog, SpotifyCatalog};
pub use error::{Error, Result};
pub use lineup::{Lineup, LineupEntry};
pub use matcher::{LineupIndex, Match, Partitioned};
pub use normalize::normalize;
pub use playlists::{PlaylistCollection, PlaylistSummary};
