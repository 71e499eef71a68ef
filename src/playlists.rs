//! Playlist aggregation: per-playlist artist frequency tables built from the
//! catalog, and the JSON documents they persist to.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::{MusicCatalog, PlaylistRef, TrackRecord};
use crate::error::Result;
use crate::store;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub playlist_name: String,
    pub total_tracks: usize,
    pub unique_artists: usize,
    pub artist_counts: BTreeMap<String, usize>,
    pub all_artists: BTreeSet<String>,
}

impl PlaylistSummary {
    pub fn from_tracks(playlist_name: &str, tracks: &[TrackRecord]) -> Self {
        let mut artist_counts: BTreeMap<String, usize> = BTreeMap::new();
        for artist in tracks.iter().flat_map(|track| &track.artists) {
            *artist_counts.entry(artist.name.clone()).or_default() += 1;
        }
        // One per artist credit, so a collaboration counts once per artist
        let total_tracks: usize = artist_counts.values().sum();
        let all_artists: BTreeSet<String> = artist_counts.keys().cloned().collect();

        Self {
            playlist_name: playlist_name.to_string(),
            total_tracks,
            unique_artists: all_artists.len(),
            artist_counts,
            all_artists,
        }
    }

    /// Most frequent artists first; ties keep alphabetical order.
    pub fn top_artists(&self, n: usize) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .artist_counts
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

/// Every owned playlist, keyed by playlist name.
pub type PlaylistCollection = BTreeMap<String, PlaylistSummary>;

pub fn load_collection(path: &Path) -> Result<PlaylistCollection> {
    store::read_json(path)
}

pub fn save_collection(path: &Path, collection: &PlaylistCollection) -> Result<()> {
    store::write_json(path, collection)
}

/// Union of every playlist's artists, in sorted order.
pub fn all_artists(collection: &PlaylistCollection) -> BTreeSet<String> {
    collection
        .values()
        .flat_map(|summary| summary.all_artists.iter().cloned())
        .collect()
}

/// Summarises each playlist owned by the current user. Followed playlists
/// owned by someone else are skipped.
pub async fn collect_owned<C: MusicCatalog + ?Sized>(catalog: &C) -> Result<PlaylistCollection> {
    let me = catalog.current_user_id().await?;
    let playlists = catalog.user_playlists().await?;

    let mut collection = PlaylistCollection::new();
    for playlist in playlists.iter().filter(|p| p.owner_id == me) {
        println!("Processing playlist: '{}'...", playlist.name);
        let tracks = catalog.playlist_tracks(&playlist.id).await?;
        let summary = PlaylistSummary::from_tracks(&playlist.name, &tracks);
        info!(
            playlist = %playlist.name,
            tracks = summary.total_tracks,
            artists = summary.unique_artists,
            "summarised playlist"
        );
        collection.insert(playlist.name.clone(), summary);
    }
    Ok(collection)
}

/// One artist credit on one track, as kept in the single-playlist extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistCredit {
    pub name: String,
    pub id: Option<String>,
    pub track_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedPlaylist {
    #[serde(flatten)]
    pub summary: PlaylistSummary,
    pub detailed_data: Vec<ArtistCredit>,
}

pub async fn extract_playlist<C: MusicCatalog + ?Sized>(
    catalog: &C,
    playlist: &PlaylistRef,
) -> Result<DetailedPlaylist> {
    let tracks = catalog.playlist_tracks(&playlist.id).await?;
    let detailed_data = tracks
        .iter()
        .flat_map(|track| {
            track.artists.iter().map(move |artist| ArtistCredit {
                name: artist.name.clone(),
                id: artist.id.clone(),
                track_name: track.name.clone(),
            })
        })
        .collect();

    Ok(DetailedPlaylist {
        summary: PlaylistSummary::from_tracks(&playlist.name, &tracks),
        detailed_data,
    })
}

/// `artists_<name with underscores>.json`
pub fn extract_file_name(playlist_name: &str) -> String {
    format!("artists_{}.json", playlist_name.replace(' ', "_"))
}
