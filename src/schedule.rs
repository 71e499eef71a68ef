//! Day-ordered schedule reports.

use std::cmp::Ordering;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::matcher::{Match, Partitioned};
use crate::store;

const TITLE_RULE: usize = 50;
const ESCAPED_NEWLINE: &str = "\\n";
const BROADCAST_TAG: &str = " [BROADCAST]";

/// The festival's day sequence. A day ranks by the first label it equals or
/// starts with, ignoring case, so "Friday 27 June" ranks as "Friday".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayOrder {
    labels: Vec<String>,
}

impl DayOrder {
    pub fn new(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Comma-separated labels; blanks are dropped.
    pub fn parse(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty()),
        )
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Unknown days rank after every known one.
    pub fn rank(&self, day: &str) -> usize {
        let day = day.trim().to_lowercase();
        self.labels
            .iter()
            .map(|label| label.to_lowercase())
            .position(|label| day == label || day.starts_with(&label))
            .unwrap_or(self.labels.len())
    }

    /// Day rank, then the day label itself so each label stays one group,
    /// then start time.
    pub fn compare(&self, a: &Match, b: &Match) -> Ordering {
        self.rank(&a.day)
            .cmp(&self.rank(&b.day))
            .then_with(|| a.day.cmp(&b.day))
            .then_with(|| a.start_time().cmp(b.start_time()))
    }
}

/// Stable sort by festival day, then by start time. Zero-padded 24h clock
/// times order correctly as strings.
pub fn sort_matches(matches: &mut [Match], order: &DayOrder) {
    matches.sort_by(|a, b| order.compare(a, b));
}

fn push_title(output: &mut String, title: &str) {
    output.push_str(title);
    output.push('\n');
    output.push_str(&"=".repeat(TITLE_RULE));
    output.push_str("\n\n");
}

/// Writes each match with `line`, opening a new underlined header whenever
/// the day changes. Expects matches already sorted.
fn push_day_groups(output: &mut String, matches: &[Match], line: impl Fn(&Match) -> String) {
    let mut current_day: Option<&str> = None;
    for m in matches {
        if current_day != Some(m.day.as_str()) {
            output.push('\n');
            output.push_str(&m.day.to_uppercase());
            output.push('\n');
            output.push_str(&"-".repeat(m.day.chars().count()));
            output.push('\n');
            current_day = Some(m.day.as_str());
        }
        output.push_str(&line(m));
        output.push('\n');
    }
}

/// Schedule of per-playlist matches, noting which playlist each came from.
pub fn render_playlist_schedule(festival: &str, matches: &[Match], order: &DayOrder) -> String {
    let mut sorted = matches.to_vec();
    sort_matches(&mut sorted, order);

    let mut output = String::new();
    push_title(&mut output, &format!("{festival} - ALL PLAYLISTS SCHEDULE"));
    push_day_groups(&mut output, &sorted, |m| {
        let mut line = format!(
            "{} - {} @ {} (from '{}')",
            m.start_time(),
            m.lineup_artist,
            m.stage,
            m.playlist.as_deref().unwrap_or_default()
        );
        if m.broadcast {
            line.push_str(BROADCAST_TAG);
        }
        line
    });
    output
}

/// Day-grouped schedule of the broadcast matches only.
pub fn render_broadcast_schedule(festival: &str, broadcast: &[Match], order: &DayOrder) -> String {
    let mut sorted = broadcast.to_vec();
    sort_matches(&mut sorted, order);

    let mut output = String::new();
    push_title(&mut output, &format!("{festival} - YOUR BROADCAST SCHEDULE"));
    push_day_groups(&mut output, &sorted, |m| {
        format!("{} - {} @ {}", m.time, m.lineup_artist, m.stage)
    });
    output
}

/// Broadcast and festival-only acts in two sections.
pub fn render_complete_schedule(festival: &str, matches: &Partitioned, order: &DayOrder) -> String {
    let mut broadcast = matches.broadcast.clone();
    let mut festival_only = matches.non_broadcast.clone();
    sort_matches(&mut broadcast, order);
    sort_matches(&mut festival_only, order);

    let line = |m: &Match| format!("{} {} - {} @ {}\n", m.day, m.time, m.lineup_artist, m.stage);

    let mut output = String::new();
    push_title(&mut output, &format!("{festival} - COMPLETE SCHEDULE"));

    output.push_str("BROADCAST ACTS (TV/iPlayer)\n");
    output.push_str(&"-".repeat(30));
    output.push('\n');
    for m in &broadcast {
        output.push_str(&line(m));
    }

    output.push_str("\nNON-BROADCAST ACTS (Festival Only)\n");
    output.push_str(&"-".repeat(35));
    output.push('\n');
    for m in &festival_only {
        output.push_str(&line(m));
    }
    output
}

/// Turns literal `\n` sequences into real line breaks.
pub fn resolve_escaped_newlines(text: &str) -> String {
    text.replace(ESCAPED_NEWLINE, "\n")
}

/// Writes a rendered report. Escaped newlines that slipped in through
/// artist or stage names are resolved first, so the file never holds one.
pub fn write_report(path: &Path, report: &str) -> Result<()> {
    store::write_text(path, &resolve_escaped_newlines(report))
}

/// Rewrites a report produced by older tooling that wrote `\n` literally.
/// Returns whether the file changed.
pub fn repair_file(path: &Path) -> Result<bool> {
    let content = store::read_text(path)?;
    if !content.contains(ESCAPED_NEWLINE) {
        debug!(path = %path.display(), "no escaped newlines");
        return Ok(false);
    }
    store::write_text(path, &resolve_escaped_newlines(&content))?;
    Ok(true)
}

#[derive(Serialize)]
struct CsvRow<'a> {
    playlist_artist: &'a str,
    lineup_artist: &'a str,
    stage: &'a str,
    day: &'a str,
    time: &'a str,
    broadcast: bool,
    playlist: &'a str,
}

impl<'a> From<&'a Match> for CsvRow<'a> {
    fn from(m: &'a Match) -> Self {
        Self {
            playlist_artist: &m.playlist_artist,
            lineup_artist: &m.lineup_artist,
            stage: &m.stage,
            day: &m.day,
            time: &m.time,
            broadcast: m.broadcast,
            playlist: m.playlist.as_deref().unwrap_or_default(),
        }
    }
}

/// One row per match, headed by the field names. Every row has the same
/// columns; a match without a source playlist leaves that column empty.
pub fn write_csv(path: &Path, matches: &[Match]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for m in matches {
        writer.serialize(CsvRow::from(m))?;
    }
    writer.flush().map_err(|e| Error::io(path, e))
}
