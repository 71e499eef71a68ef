//! Lineup suggestions from related artists and seed-based recommendations.
//!
//! Every catalog lookup here is best-effort: a failed search, related-artist
//! or recommendation call is logged and counts as "no result" for that item.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use crate::catalog::MusicCatalog;
use crate::lineup::LineupEntry;
use crate::matcher::{find_in_lineup, LineupIndex};

/// Upper bound on seed artists per recommendation request.
pub const MAX_SEEDS: usize = 5;
/// Seeds are drawn from this many playlist artists.
pub const SEED_POOL: usize = 50;
pub const RECOMMENDATION_LIMIT: u32 = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions {
    /// Seed names that resolved to a catalog artist.
    pub seeds_found: usize,
    /// Distinct artist names returned by the catalog.
    pub candidates: usize,
    pub entries: Vec<LineupEntry>,
}

/// Catalog id of the best search hit for `name`, if any.
pub async fn lookup_artist_id<C: MusicCatalog + ?Sized>(catalog: &C, name: &str) -> Option<String> {
    match catalog.search_artist(name).await {
        Ok(id) => id,
        Err(e) => {
            warn!("artist search for {name} failed: {e}");
            None
        }
    }
}

/// Lineup artists related to any of `seeds`, excluding the seeds themselves.
pub async fn related_suggestions<C: MusicCatalog + ?Sized>(
    catalog: &C,
    seeds: &[String],
    index: &LineupIndex,
) -> Suggestions {
    let mut related = BTreeSet::new();
    let mut seeds_found = 0;

    for seed in seeds {
        println!("Getting related artists for {seed}...");
        let Some(artist_id) = lookup_artist_id(catalog, seed).await else {
            continue;
        };
        seeds_found += 1;
        let names = match catalog.related_artists(&artist_id).await {
            Ok(names) => names,
            Err(e) => {
                warn!("related artists for {seed} failed: {e}");
                Vec::new()
            }
        };
        println!("  Found {} related artists", names.len());
        related.extend(names);
    }

    let known: BTreeSet<String> = seeds.iter().cloned().collect();
    Suggestions {
        seeds_found,
        candidates: related.len(),
        entries: find_in_lineup(&related, index, &known),
    }
}

/// Up to [`MAX_SEEDS`] names chosen at random from the first [`SEED_POOL`]
/// playlist artists.
pub fn pick_seed_names<R: Rng + ?Sized>(artists: &BTreeSet<String>, count: usize, rng: &mut R) -> Vec<String> {
    let mut pool: Vec<String> = artists.iter().take(SEED_POOL).cloned().collect();
    pool.shuffle(rng);
    pool.truncate(count.min(MAX_SEEDS));
    pool
}

/// Lineup artists found among the catalog's recommendations for `seed_names`.
pub async fn recommendation_suggestions<C: MusicCatalog + ?Sized>(
    catalog: &C,
    seed_names: &[String],
    index: &LineupIndex,
) -> Suggestions {
    let mut seed_ids = Vec::new();
    for name in seed_names.iter().take(MAX_SEEDS) {
        if let Some(id) = lookup_artist_id(catalog, name).await {
            seed_ids.push(id);
        }
    }
    if seed_ids.is_empty() {
        return Suggestions::default();
    }

    let tracks = match catalog.recommendations(&seed_ids, RECOMMENDATION_LIMIT).await {
        Ok(tracks) => tracks,
        Err(e) => {
            warn!("recommendations failed: {e}");
            Vec::new()
        }
    };
    let recommended: BTreeSet<String> = tracks
        .into_iter()
        .flat_map(|track| track.artists.into_iter().map(|a| a.name))
        .collect();

    Suggestions {
        seeds_found: seed_ids.len(),
        candidates: recommended.len(),
        entries: find_in_lineup(&recommended, index, &BTreeSet::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn seeds_come_from_the_sorted_pool() {
        let artists: BTreeSet<String> = (0..80).map(|i| format!("Artist {i:03}")).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let seeds = pick_seed_names(&artists, 5, &mut rng);

        assert_eq!(seeds.len(), 5);
        let pool: Vec<&String> = artists.iter().take(SEED_POOL).collect();
        assert!(seeds.iter().all(|s| pool.contains(&s)));
        let unique: BTreeSet<_> = seeds.iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn seed_count_is_capped() {
        let artists: BTreeSet<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick_seed_names(&artists, 10, &mut rng).len(), 3);
        assert!(pick_seed_names(&BTreeSet::new(), 5, &mut rng).is_empty());
    }
}
