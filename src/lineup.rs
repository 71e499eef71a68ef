//! Festival lineup: parsing the hand-written listing and the stage → day →
//! slots record persisted as JSON.
//!
//! The listing is a sequence of `"<Stage> - <Day>"` headers, each followed by
//! `"<Artist>: HH:MM - HH:MM"` lines. Stages and days keep the order they were
//! first seen in, both in memory and in the JSON document.

use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::store;

/// Stage names carrying this text are covered by TV/streaming.
pub const BROADCAST_MARKER: &str = "(broadcast)";

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// One performance as stored under `lineup[stage][day]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub artist: String,
    pub time: String,
}

/// A slot together with the stage and day it sits under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupEntry {
    pub artist: String,
    pub stage: String,
    pub day: String,
    pub time: String,
}

impl LineupEntry {
    /// First clock time of the slot, e.g. `"12:00"` for `"12:00 - 13:00"`.
    pub fn start_time(&self) -> &str {
        start_of(&self.time)
    }

    pub fn is_broadcast(&self) -> bool {
        is_broadcast_stage(&self.stage)
    }
}

/// Text before the first `-` of a time range, trimmed.
pub fn start_of(time: &str) -> &str {
    time.split('-').next().unwrap_or_default().trim()
}

pub fn is_broadcast_stage(stage: &str) -> bool {
    stage.contains(BROADCAST_MARKER)
}

/// Stage name as shown in reports, without the broadcast marker.
pub fn display_stage(stage: &str) -> String {
    stage.replace(BROADCAST_MARKER, "").trim().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDay {
    pub day: String,
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: String,
    pub days: Vec<StageDay>,
}

impl Stage {
    pub fn artist_count(&self) -> usize {
        self.days.iter().map(|d| d.slots.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lineup {
    stages: Vec<Stage>,
}

impl Lineup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        store::read_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        store::write_json(path, self)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the slot list for `stage`/`day`, creating empty groups as needed.
    pub fn group_mut(&mut self, stage: &str, day: &str) -> &mut Vec<Slot> {
        let stage_idx = match self.stages.iter().position(|s| s.name == stage) {
            Some(idx) => idx,
            None => {
                self.stages.push(Stage {
                    name: stage.to_string(),
                    days: Vec::new(),
                });
                self.stages.len() - 1
            }
        };
        let days = &mut self.stages[stage_idx].days;
        let day_idx = match days.iter().position(|d| d.day == day) {
            Some(idx) => idx,
            None => {
                days.push(StageDay {
                    day: day.to_string(),
                    slots: Vec::new(),
                });
                days.len() - 1
            }
        };
        &mut days[day_idx].slots
    }

    pub fn push(&mut self, stage: &str, day: &str, slot: Slot) {
        self.group_mut(stage, day).push(slot);
    }

    /// Every slot in document order: stage, then day, then position.
    pub fn entries(&self) -> Vec<LineupEntry> {
        self.stages
            .iter()
            .flat_map(|stage| {
                stage.days.iter().flat_map(move |day| {
                    day.slots.iter().map(move |slot| LineupEntry {
                        artist: slot.artist.clone(),
                        stage: stage.name.clone(),
                        day: day.day.clone(),
                        time: slot.time.clone(),
                    })
                })
            })
            .collect()
    }

    /// `(stage, days, artists)` for each stage, used by the converter summary.
    pub fn stage_counts(&self) -> Vec<(&str, usize, usize)> {
        self.stages
            .iter()
            .map(|s| (s.name.as_str(), s.days.len(), s.artist_count()))
            .collect()
    }
}

fn entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.+?):\s*(\d{2}:\d{2}\s*-\s*\d{2}:\d{2}).*$")
            .expect("lineup entry pattern is valid")
    })
}

/// Splits `"<Stage> - <Day>"` when the day part opens with a weekday name.
fn parse_header(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split(" - ");
    let stage = parts.next()?.trim();
    let day = parts.next()?.trim();
    if parts.next().is_some() || stage.is_empty() {
        return None;
    }
    let lower = day.to_lowercase();
    WEEKDAYS
        .iter()
        .any(|w| lower.starts_with(&w.to_lowercase()))
        .then_some((stage, day))
}

fn parse_entry(line: &str) -> Option<Slot> {
    let caps = entry_pattern().captures(line)?;
    Some(Slot {
        artist: caps[1].trim().to_string(),
        time: caps[2].trim().to_string(),
    })
}

pub fn parse_lineup(text: &str) -> Lineup {
    let mut lineup = Lineup::new();
    let mut current: Option<(String, String)> = None;

    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        // Entries first: "Artist - Sunday Session: 12:00 - 13:00" also splits
        // like a header, while a header never carries a time range.
        if let Some(slot) = parse_entry(line) {
            match &current {
                Some((stage, day)) => lineup.push(stage, day, slot),
                None => {
                    warn!(line = number + 1, artist = %slot.artist, "entry before any stage header, skipped");
                }
            }
            continue;
        }

        match parse_header(line) {
            Some((stage, day)) => {
                lineup.group_mut(stage, day);
                current = Some((stage.to_string(), day.to_string()));
            }
            None => debug!(line = number + 1, text = line, "unrecognised lineup line"),
        }
    }

    lineup
}

pub fn parse_lineup_file(path: &Path) -> Result<Lineup> {
    Ok(parse_lineup(&store::read_text(path)?))
}

impl Serialize for Lineup {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.stages.len()))?;
        for stage in &self.stages {
            map.serialize_entry(&stage.name, &DaysByName(&stage.days))?;
        }
        map.end()
    }
}

struct DaysByName<'a>(&'a [StageDay]);

impl Serialize for DaysByName<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for day in self.0 {
            map.serialize_entry(&day.day, &day.slots)?;
        }
        map.end()
    }
}

/// A JSON object read as a list of pairs, keeping document order.
struct OrderedEntries<V>(Vec<(String, V)>);

struct OrderedVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
    type Value = OrderedEntries<V>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            entries.push((key, value));
        }
        Ok(OrderedEntries(entries))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedEntries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

impl<'de> Deserialize<'de> for Lineup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let stages = OrderedEntries::<OrderedEntries<Vec<Slot>>>::deserialize(deserializer)?;
        let mut lineup = Lineup::new();
        for (stage, days) in stages.0 {
            for (day, slots) in days.0 {
                lineup.group_mut(&stage, &day).extend(slots);
            }
        }
        Ok(lineup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Pyramid Stage - Friday 27 June
The 1975: 22:15 - 23:45
Wolf Alice: 19:45 - 20:45

Park Stage (broadcast) - Friday 27 June
Caribou: 18:00 - 19:00 (DJ set)

Pyramid Stage - Saturday 28 June
RAYE: 17:15 - 18:15
";

    #[test]
    fn parses_headers_and_entries() {
        let lineup = parse_lineup(LISTING);
        let counts = lineup.stage_counts();
        assert_eq!(
            counts,
            vec![
                ("Pyramid Stage", 2, 3),
                ("Park Stage (broadcast)", 1, 1),
            ]
        );

        let entries = lineup.entries();
        assert_eq!(entries[0].artist, "The 1975");
        assert_eq!(entries[0].time, "22:15 - 23:45");
        assert_eq!(entries[0].day, "Friday 27 June");
        // stage order is preserved, so the second Pyramid day follows its first
        assert_eq!(entries[2].artist, "RAYE");
        assert_eq!(entries[3].artist, "Caribou");
        assert_eq!(entries[3].time, "18:00 - 19:00");
    }

    #[test]
    fn artist_named_after_weekday_is_not_a_header() {
        let lineup = parse_lineup("Acoustic Stage - Sunday\nSunday Girl: 12:00 - 13:00\n");
        let entries = lineup.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].artist, "Sunday Girl");
        assert_eq!(entries[0].stage, "Acoustic Stage");
    }

    #[test]
    fn entry_with_dash_and_weekday_stays_an_entry() {
        let lineup = parse_lineup(
            "Park Stage - Friday\nWolf Alice - Sunday Session: 12:00-13:00\n",
        );
        let entries = lineup.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].artist, "Wolf Alice - Sunday Session");
        assert_eq!(entries[0].stage, "Park Stage");
        assert_eq!(lineup.stage_counts(), vec![("Park Stage", 1, 1)]);
    }

    #[test]
    fn colon_in_artist_name() {
        let lineup = parse_lineup("Other Stage - Friday\nSheer Mag: Live: 14:00-15:00\n");
        let entries = lineup.entries();
        assert_eq!(entries[0].artist, "Sheer Mag: Live");
        assert_eq!(entries[0].time, "14:00-15:00");
    }

    #[test]
    fn entries_before_header_are_skipped() {
        let lineup = parse_lineup("Orphan: 10:00 - 11:00\nWest Holts - Thursday\n");
        assert!(lineup.entries().is_empty());
        assert_eq!(lineup.stage_counts(), vec![("West Holts", 1, 0)]);
    }

    #[test]
    fn start_time_takes_first_clock() {
        let entry = LineupEntry {
            artist: "Caribou".into(),
            stage: "Park Stage".into(),
            day: "Friday".into(),
            time: "18:00-19:00".into(),
        };
        assert_eq!(entry.start_time(), "18:00");
    }

    #[test]
    fn broadcast_marker_is_stripped_for_display() {
        assert!(is_broadcast_stage("Park Stage (broadcast)"));
        assert!(!is_broadcast_stage("Park Stage"));
        assert_eq!(display_stage("Park Stage (broadcast)"), "Park Stage");
    }

    #[test]
    fn json_keeps_document_order() {
        let lineup = parse_lineup(LISTING);
        let json = serde_json::to_string(&lineup).unwrap();
        let pyramid = json.find("Pyramid Stage").unwrap();
        let park = json.find("Park Stage").unwrap();
        assert!(pyramid < park);

        let back: Lineup = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lineup);
    }

    #[test]
    fn json_shape_is_stage_day_slots() {
        let lineup = parse_lineup("Park Stage - Friday\nCaribou: 18:00 - 19:00\n");
        let value = serde_json::to_value(&lineup).unwrap();
        assert_eq!(value["Park Stage"]["Friday"][0]["artist"], "Caribou");
        assert_eq!(value["Park Stage"]["Friday"][0]["time"], "18:00 - 19:00");
    }
}
