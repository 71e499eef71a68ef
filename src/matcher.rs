//! Exact-name matching between playlist artists and the lineup.
//!
//! Both sides are compared through [`normalize`]. Matching is first-match:
//! once a lineup slot finds a playlist artist (or a playlist artist finds a
//! lineup artist) the search for that item stops.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::lineup::{display_stage, start_of, Lineup, LineupEntry};
use crate::normalize::normalize;
use crate::playlists::{all_artists, PlaylistCollection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub playlist_artist: String,
    pub lineup_artist: String,
    pub stage: String,
    pub day: String,
    pub time: String,
    pub broadcast: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist: Option<String>,
}

impl Match {
    fn new(playlist_artist: &str, entry: &LineupEntry) -> Self {
        Self {
            playlist_artist: playlist_artist.to_string(),
            lineup_artist: entry.artist.clone(),
            stage: display_stage(&entry.stage),
            day: entry.day.clone(),
            time: entry.time.clone(),
            broadcast: entry.is_broadcast(),
            playlist: None,
        }
    }

    pub fn start_time(&self) -> &str {
        start_of(&self.time)
    }
}

/// Normalized artist name → its first slot in document order, built once per
/// run.
///
/// An artist booked in more than one slot is reachable only through the
/// first; the later slots are logged when the index is built.
#[derive(Debug, Clone, Default)]
pub struct LineupIndex {
    entries: Vec<LineupEntry>,
    by_name: HashMap<String, usize>,
}

impl LineupIndex {
    pub fn new(lineup: &Lineup) -> Self {
        let entries = lineup.entries();
        let mut by_name: HashMap<String, usize> = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            let key = normalize(&entry.artist);
            if let Some(&first) = by_name.get(&key) {
                let kept = &entries[first];
                warn!(
                    "{} appears in several slots; matching {} {} {} and ignoring {} {} {}",
                    entry.artist, kept.stage, kept.day, kept.time, entry.stage, entry.day, entry.time
                );
                continue;
            }
            by_name.insert(key, idx);
        }
        Self { entries, by_name }
    }

    /// Every slot in document order, duplicates included.
    pub fn entries(&self) -> &[LineupEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up any spelling of an artist name.
    pub fn find(&self, name: &str) -> Option<&LineupEntry> {
        self.find_normalized(&normalize(name))
    }

    pub fn find_normalized(&self, key: &str) -> Option<&LineupEntry> {
        self.by_name.get(key).map(|&idx| &self.entries[idx])
    }
}

/// Normalized name → first candidate spelling. Candidates arrive sorted, so
/// "Maccabees" wins over "The Maccabees".
fn candidate_index(candidates: &BTreeSet<String>) -> HashMap<String, &str> {
    let mut index = HashMap::with_capacity(candidates.len());
    for name in candidates {
        index.entry(normalize(name)).or_insert(name.as_str());
    }
    index
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partitioned {
    pub broadcast: Vec<Match>,
    pub non_broadcast: Vec<Match>,
}

impl Partitioned {
    pub fn total(&self) -> usize {
        self.broadcast.len() + self.non_broadcast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Broadcast matches first, then the rest.
    pub fn all(&self) -> Vec<Match> {
        self.broadcast
            .iter()
            .chain(&self.non_broadcast)
            .cloned()
            .collect()
    }
}

/// Walks every lineup slot and records the first playlist artist that
/// normalizes to the same name, splitting the results by broadcast stage.
/// Each slot is checked on its own, so a repeat booking yields one match per
/// slot.
pub fn match_broadcast(candidates: &BTreeSet<String>, lineup: &Lineup) -> Partitioned {
    let index = candidate_index(candidates);
    let mut result = Partitioned::default();

    for entry in lineup.entries() {
        let Some(playlist_artist) = index.get(&normalize(&entry.artist)) else {
            continue;
        };
        let found = Match::new(playlist_artist, &entry);
        if found.broadcast {
            result.broadcast.push(found);
        } else {
            result.non_broadcast.push(found);
        }
    }

    result
}

/// [`match_broadcast`] over the union of every playlist's artists.
pub fn match_collection(collection: &PlaylistCollection, lineup: &Lineup) -> Partitioned {
    match_broadcast(&all_artists(collection), lineup)
}

/// Matches each playlist's artists against the lineup and tags every match
/// with its playlist. Stage, day and time come from the artist's first slot.
pub fn match_per_playlist(collection: &PlaylistCollection, index: &LineupIndex) -> Vec<Match> {
    let mut matches = Vec::new();
    for (playlist_name, summary) in collection {
        for playlist_artist in &summary.all_artists {
            if let Some(entry) = index.find(playlist_artist) {
                let mut found = Match::new(playlist_artist, entry);
                found.playlist = Some(playlist_name.clone());
                matches.push(found);
            }
        }
    }
    matches
}

/// Lineup slots for a set of names, skipping any artist whose normalized name
/// is in `exclude` and reporting each lineup artist once.
pub fn find_in_lineup<'a>(
    names: impl IntoIterator<Item = &'a String>,
    index: &LineupIndex,
    exclude: &BTreeSet<String>,
) -> Vec<LineupEntry> {
    let excluded: BTreeSet<String> = exclude.iter().map(|name| normalize(name)).collect();
    let mut seen = BTreeSet::new();
    let mut found = Vec::new();
    for name in names {
        let key = normalize(name);
        let Some(entry) = index.find_normalized(&key) else {
            continue;
        };
        if excluded.contains(&key) || !seen.insert(key) {
            continue;
        }
        found.push(entry.clone());
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineup::{parse_lineup, Slot};

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn caribou_lineup() -> Lineup {
        let mut lineup = Lineup::new();
        lineup.push(
            "Park Stage (broadcast)",
            "Friday",
            Slot {
                artist: "Caribou".into(),
                time: "18:00-19:00".into(),
            },
        );
        lineup
    }

    #[test]
    fn broadcast_stage_sets_flag_and_strips_marker() {
        let result = match_broadcast(&names(&["caribou"]), &caribou_lineup());
        assert_eq!(result.total(), 1);
        assert!(result.non_broadcast.is_empty());

        let found = &result.broadcast[0];
        assert!(found.broadcast);
        assert_eq!(found.stage, "Park Stage");
        assert_eq!(found.playlist_artist, "caribou");
        assert_eq!(found.lineup_artist, "Caribou");
        assert_eq!(found.day, "Friday");
        assert_eq!(found.time, "18:00-19:00");
    }

    #[test]
    fn non_broadcast_stage_goes_to_other_partition() {
        let lineup = parse_lineup("Woodsies - Saturday\nThe Maccabees: 20:00 - 21:00\n");
        let result = match_broadcast(&names(&["Maccabees", "Tom Odell"]), &lineup);
        assert!(result.broadcast.is_empty());
        assert_eq!(result.non_broadcast.len(), 1);
        assert_eq!(result.non_broadcast[0].stage, "Woodsies");
        assert!(!result.non_broadcast[0].broadcast);
    }

    #[test]
    fn one_match_per_slot_even_with_duplicate_spellings() {
        let lineup = parse_lineup("Woodsies - Saturday\nThe Maccabees: 20:00 - 21:00\n");
        let result = match_broadcast(&names(&["The Maccabees", "Maccabees"]), &lineup);
        assert_eq!(result.total(), 1);
        assert_eq!(result.non_broadcast[0].playlist_artist, "Maccabees");
    }

    #[test]
    fn repeat_bookings_match_each_slot() {
        let lineup = parse_lineup(
            "Pyramid Stage (broadcast) - Friday\nRAYE: 17:00 - 18:00\n\
             Acoustic Stage - Sunday\nRAYE: 12:00 - 12:45\n",
        );
        let result = match_broadcast(&names(&["RAYE"]), &lineup);
        assert_eq!(result.broadcast.len(), 1);
        assert_eq!(result.non_broadcast.len(), 1);
    }

    #[test]
    fn index_keeps_first_slot() {
        let lineup = parse_lineup(
            "Pyramid Stage - Friday\nRAYE: 17:00 - 18:00\n\
             Acoustic Stage - Sunday\nRAYE: 12:00 - 12:45\n",
        );
        let index = LineupIndex::new(&lineup);
        assert_eq!(index.len(), 2);
        let entry = index.find("raye").unwrap();
        assert_eq!(entry.stage, "Pyramid Stage");
        assert_eq!(entry.day, "Friday");
    }

    #[test]
    fn per_playlist_matches_are_tagged() {
        let lineup = parse_lineup(
            "Park Stage (broadcast) - Friday\nCaribou: 18:00 - 19:00\n\
             Other Stage - Saturday\nTurnstile: 16:00 - 17:00\n",
        );
        let index = LineupIndex::new(&lineup);

        let mut collection = PlaylistCollection::new();
        for (name, artists) in [("Chill", vec!["Caribou", "Bonobo"]), ("Loud", vec!["Turnstile"])] {
            let summary = crate::playlists::PlaylistSummary {
                playlist_name: name.to_string(),
                all_artists: artists.iter().map(|a| a.to_string()).collect(),
                ..Default::default()
            };
            collection.insert(name.to_string(), summary);
        }

        let matches = match_per_playlist(&collection, &index);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].playlist.as_deref(), Some("Chill"));
        assert_eq!(matches[0].stage, "Park Stage");
        assert!(matches[0].broadcast);
        assert_eq!(matches[1].playlist.as_deref(), Some("Loud"));
        assert_eq!(matches[1].lineup_artist, "Turnstile");
    }

    #[test]
    fn find_in_lineup_excludes_known_and_dedupes() {
        let lineup = parse_lineup(
            "West Holts - Friday\nMaribou State: 21:00 - 22:00\nBonobo: 22:30 - 23:59\n",
        );
        let index = LineupIndex::new(&lineup);
        let related = names(&["Bonobo", "bonobo", "Maribou State", "Tycho"]);
        let found = find_in_lineup(&related, &index, &names(&["Maribou State"]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].artist, "Bonobo");
        assert_eq!(found[0].stage, "West Holts");
    }

    #[test]
    fn exclusion_ignores_spelling() {
        let lineup = parse_lineup(
            "Pyramid Stage - Friday\nWolf Alice: 19:45 - 20:45\nThe 1975: 22:15 - 23:45\n",
        );
        let index = LineupIndex::new(&lineup);
        let related = names(&["Wolf Alice", "1975"]);
        let found = find_in_lineup(&related, &index, &names(&["wolf alice"]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].artist, "The 1975");
    }

    #[test]
    fn match_json_omits_missing_playlist() {
        let result = match_broadcast(&names(&["Caribou"]), &caribou_lineup());
        let value = serde_json::to_value(&result.broadcast[0]).unwrap();
        assert!(value.get("playlist").is_none());
        assert_eq!(value["broadcast"], true);
    }
}
