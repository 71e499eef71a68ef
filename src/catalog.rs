//! Streaming-service seam. `MusicCatalog` is what the pipelines talk to;
//! `SpotifyCatalog` is the real implementation over `rspotify`.

use std::future::Future;

use async_trait::async_trait;
use rspotify::{
    model::{
        ArtistId, PlayableItem, PlaylistId, RecommendationsAttribute, SearchResult, SearchType,
        SimplifiedArtist, TrackId,
    },
    prelude::*,
    scopes, AuthCodeSpotify, Config, Credentials, OAuth,
};
use tracing::{debug, info};

use crate::config::SpotifyConfig;
use crate::error::Result;

const PLAYLIST_PAGE: u32 = 50;
const ITEM_PAGE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistRef {
    pub name: String,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    pub name: String,
    pub id: Option<String>,
    pub artists: Vec<ArtistRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRef {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub total_tracks: u32,
}

/// Read-only view of the streaming service used by every pipeline.
///
/// Paginated listings are fetched until exhausted. Lookups that find nothing
/// return an empty collection or `None` rather than an error.
#[async_trait]
pub trait MusicCatalog: Send + Sync {
    async fn current_user_id(&self) -> Result<String>;

    async fn user_playlists(&self) -> Result<Vec<PlaylistRef>>;

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<TrackRecord>>;

    async fn search_artist(&self, name: &str) -> Result<Option<String>>;

    async fn related_artists(&self, artist_id: &str) -> Result<Vec<String>>;

    async fn recommendations(&self, seed_artist_ids: &[String], limit: u32) -> Result<Vec<TrackRecord>>;
}

/// Calls `fetch` with increasing offsets until a page comes back empty or
/// reports no next page. `fetch` returns the page's items and whether another
/// page follows.
pub async fn paginate<T, F, Fut>(page_size: u32, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, bool)>>,
{
    let mut all = Vec::new();
    let mut offset: u32 = 0;
    loop {
        let (items, has_next) = fetch(offset).await?;
        if items.is_empty() {
            break;
        }
        all.extend(items);
        offset += page_size;
        if !has_next {
            break;
        }
    }
    Ok(all)
}

pub struct SpotifyCatalog {
    client: AuthCodeSpotify,
}

impl SpotifyCatalog {
    /// Runs the authorization-code flow, reusing the cached token when present.
    pub async fn connect(config: &SpotifyConfig) -> Result<Self> {
        let creds = Credentials::new(&config.client_id, &config.client_secret);
        let oauth = OAuth {
            redirect_uri: config.redirect_uri.clone(),
            scopes: scopes!("playlist-read-private", "playlist-read-collaborative"),
            ..Default::default()
        };
        let rspotify_config = Config {
            token_cached: true,
            token_refreshing: true,
            cache_path: config.token_cache.clone(),
            ..Default::default()
        };

        let client = AuthCodeSpotify::with_config(creds, oauth, rspotify_config);
        let authorize_url = client.get_authorize_url(false)?;
        client.prompt_for_token(&authorize_url).await?;
        info!("authorized with Spotify");

        Ok(Self { client })
    }
}

fn artist_ref(artist: &SimplifiedArtist) -> ArtistRef {
    ArtistRef {
        name: artist.name.clone(),
        id: artist.id.as_ref().map(|id| id.id().to_string()),
    }
}

#[async_trait]
impl MusicCatalog for SpotifyCatalog {
    async fn current_user_id(&self) -> Result<String> {
        let me = self.client.me().await?;
        Ok(me.id.id().to_string())
    }

    async fn user_playlists(&self) -> Result<Vec<PlaylistRef>> {
        let playlists = paginate(PLAYLIST_PAGE, |offset| async move {
            let page = self
                .client
                .current_user_playlists_manual(Some(PLAYLIST_PAGE), Some(offset))
                .await?;
            let has_next = page.next.is_some();
            let items = page
                .items
                .into_iter()
                .map(|playlist| PlaylistRef {
                    id: playlist.id.id().to_string(),
                    owner_id: playlist.owner.id.id().to_string(),
                    total_tracks: playlist.tracks.total,
                    name: playlist.name,
                })
                .collect();
            Ok((items, has_next))
        })
        .await?;
        debug!(count = playlists.len(), "fetched playlists");
        Ok(playlists)
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<TrackRecord>> {
        let playlist_id = PlaylistId::from_id(playlist_id)?;
        paginate(ITEM_PAGE, |offset| {
            let playlist_id = playlist_id.clone();
            async move {
                let page = self
                    .client
                    .playlist_items_manual(playlist_id, None, None, Some(ITEM_PAGE), Some(offset))
                    .await?;
                let has_next = page.next.is_some();
                let items = page
                    .items
                    .into_iter()
                    // Episodes and removed tracks carry no artists
                    .filter_map(|item| match item.track {
                        Some(PlayableItem::Track(track)) => Some(TrackRecord {
                            id: track.id.as_ref().map(|id| id.id().to_string()),
                            artists: track.artists.iter().map(artist_ref).collect(),
                            name: track.name,
                        }),
                        _ => None,
                    })
                    .collect();
                Ok((items, has_next))
            }
        })
        .await
    }

    async fn search_artist(&self, name: &str) -> Result<Option<String>> {
        let result = self
            .client
            .search(name, SearchType::Artist, None, None, Some(1), None)
            .await?;
        match result {
            SearchResult::Artists(page) => Ok(page.items.first().map(|a| a.id.id().to_string())),
            _ => Ok(None),
        }
    }

    #[allow(deprecated)]
    async fn related_artists(&self, artist_id: &str) -> Result<Vec<String>> {
        let artist_id = ArtistId::from_id(artist_id)?;
        let related = self.client.artist_related_artists(artist_id).await?;
        Ok(related.into_iter().map(|a| a.name).collect())
    }

    #[allow(deprecated)]
    async fn recommendations(&self, seed_artist_ids: &[String], limit: u32) -> Result<Vec<TrackRecord>> {
        let seeds = seed_artist_ids
            .iter()
            .map(|id| ArtistId::from_id(id.as_str()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let recommendations = self
            .client
            .recommendations(
                Vec::<RecommendationsAttribute>::new(),
                Some(seeds),
                None::<Vec<&str>>,
                None::<Vec<TrackId>>,
                None,
                Some(limit),
            )
            .await?;
        Ok(recommendations
            .tracks
            .into_iter()
            .map(|track| TrackRecord {
                artists: track.artists.iter().map(artist_ref).collect(),
                id: track.id.as_ref().map(|id| id.id().to_string()),
                name: track.name,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[tokio::test]
    async fn paginate_fetches_until_no_next_page() {
        let offsets = RefCell::new(Vec::new());
        let all = paginate(2, |offset| {
            offsets.borrow_mut().push(offset);
            async move {
                let items: Vec<u32> = (offset..(offset + 2).min(5)).collect();
                Ok((items, offset + 2 < 5))
            }
        })
        .await
        .unwrap();

        assert_eq!(all, vec![0, 1, 2, 3, 4]);
        assert_eq!(*offsets.borrow(), vec![0, 2, 4]);
    }

    #[tokio::test]
    async fn paginate_stops_on_empty_page() {
        let mut calls = 0;
        let all: Vec<u32> = paginate(50, |_| {
            calls += 1;
            async { Ok((Vec::new(), true)) }
        })
        .await
        .unwrap();
        assert!(all.is_empty());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn paginate_propagates_errors() {
        let result: Result<Vec<u32>> = paginate(50, |offset| async move {
            if offset == 0 {
                Ok((vec![1], true))
            } else {
                Err(crate::error::Error::Config("boom".into()))
            }
        })
        .await;
        assert!(result.is_err());
    }
}
