use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spotify_lineup_matcher::{
    catalog::{MusicCatalog, PlaylistRef, SpotifyCatalog},
    config::{load_dotenv, ReportConfig, SpotifyConfig},
    lineup::{self, Lineup, LineupEntry},
    matcher::{self, LineupIndex, Match},
    playlists::{self, PlaylistCollection},
    prompt, recommend, schedule, store,
};

#[derive(Parser)]
#[command(name = "spotify-lineup-matcher")]
#[command(about = "Find festival acts you already listen to on Spotify", long_about = None)]
struct Cli {
    /// Lineup JSON produced by `convert`
    #[arg(long, global = true, env = "LINEUP_JSON", default_value = "lineup.json")]
    lineup: PathBuf,

    /// Playlist summaries produced by `collect`
    #[arg(long, global = true, env = "PLAYLISTS_JSON", default_value = "all_playlists_artists.json")]
    playlists: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Converts a text lineup ("<Stage> - <Day>" / "<Artist>: HH:MM - HH:MM") to JSON
    Convert {
        /// The hand-written lineup listing
        input: PathBuf,
        /// Where to write the JSON (defaults to --lineup)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Extracts the artists of a single playlist
    Extract {
        /// 1-based position in the playlist listing, or a playlist ID; prompts when absent
        #[arg(long, short = 'p')]
        playlist: Option<String>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Summarises the artists of every playlist you own (defaults to --playlists)
    Collect {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Matches each playlist against the lineup and writes a combined schedule
    Match {
        #[arg(long, default_value = "all_playlists_schedule.txt")]
        out: PathBuf,
    },
    /// Splits matches into broadcast and festival-only acts
    Broadcast {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Also export every match as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Suggests lineup acts related to artists you already matched
    Related {
        /// Seed artist; repeatable. Defaults to your current lineup matches
        #[arg(long = "seed")]
        seeds: Vec<String>,
        #[arg(long, default_value = "lineup_suggestions.json")]
        out: PathBuf,
    },
    /// Suggests lineup acts from recommendations seeded by your playlists
    Recommend {
        #[arg(long, default_value_t = recommend::MAX_SEEDS)]
        seeds: usize,
        #[arg(long, default_value = "lineup_recommendations.json")]
        out: PathBuf,
    },
    /// Rewrites schedule files that contain literal "\n" sequences
    Repair {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let env_file = load_dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spotify_lineup_matcher=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
    if let Some(path) = env_file {
        debug!(path = %path.display(), "loaded environment file");
    }

    let cli = Cli::parse();
    let report = ReportConfig::from_env();

    match cli.command {
        Commands::Convert { input, out } => convert(&input, out.as_deref().unwrap_or(cli.lineup.as_path())),
        Commands::Extract { playlist, out_dir } => extract(playlist.as_deref(), &out_dir).await,
        Commands::Collect { out } => collect(out.as_deref().unwrap_or(cli.playlists.as_path())).await,
        Commands::Match { out } => match_playlists(&cli.playlists, &cli.lineup, &out, &report),
        Commands::Broadcast { out_dir, csv } => {
            broadcast(&cli.playlists, &cli.lineup, &out_dir, csv.as_deref(), &report)
        }
        Commands::Related { seeds, out } => related(&cli.playlists, &cli.lineup, seeds, &out).await,
        Commands::Recommend { seeds, out } => recommend_acts(&cli.playlists, &cli.lineup, seeds, &out).await,
        Commands::Repair { files } => repair(&files),
    }
}

async fn connect() -> anyhow::Result<SpotifyCatalog> {
    let config = SpotifyConfig::from_env()?;
    SpotifyCatalog::connect(&config)
        .await
        .context("Spotify authorization failed")
}

fn load_lineup(path: &Path) -> anyhow::Result<Lineup> {
    Lineup::load(path).with_context(|| format!("could not load lineup from {}", path.display()))
}

fn load_playlists(path: &Path) -> anyhow::Result<PlaylistCollection> {
    playlists::load_collection(path)
        .with_context(|| format!("could not load playlist summaries from {}", path.display()))
}

fn print_entry(artist: &str, stage: &str, day: &str, time: &str) {
    println!("* {artist}");
    println!("   {stage} - {day} at {time}");
}

fn convert(input: &Path, out: &Path) -> anyhow::Result<()> {
    let lineup = lineup::parse_lineup_file(input)?;
    if lineup.is_empty() {
        bail!("no stage headers found in {}", input.display());
    }
    lineup.save(out)?;

    let counts = lineup.stage_counts();
    println!("Lineup converted to JSON format!");
    println!("Found {} stages", counts.len());
    for (stage, days, artists) in counts {
        println!("  {stage}: {days} days, {artists} artists");
    }
    println!("Saved to: {}", out.display());
    Ok(())
}

fn select_playlist<'a>(playlists: &'a [PlaylistRef], choice: Option<&str>) -> anyhow::Result<&'a PlaylistRef> {
    if let Some(choice) = choice {
        if let Ok(position) = choice.parse::<usize>() {
            if let Some(found) = position.checked_sub(1).and_then(|i| playlists.get(i)) {
                return Ok(found);
            }
        }
        return playlists
            .iter()
            .find(|p| p.id == choice)
            .with_context(|| format!("no playlist matches '{choice}'"));
    }

    let stdin = io::stdin();
    let index = prompt::choose_index(&mut stdin.lock(), &mut io::stdout(), playlists.len())?;
    Ok(&playlists[index])
}

async fn extract(choice: Option<&str>, out_dir: &Path) -> anyhow::Result<()> {
    let catalog = connect().await?;

    println!("Fetching your playlists...");
    let available = catalog.user_playlists().await?;
    println!("\nYour playlists:");
    for (i, playlist) in available.iter().enumerate() {
        println!("{}. {} ({} tracks)", i + 1, playlist.name, playlist.total_tracks);
    }

    let selected = select_playlist(&available, choice)?;
    println!("\nExtracting artists from '{}'...", selected.name);
    let detailed = playlists::extract_playlist(&catalog, selected).await?;
    let summary = &detailed.summary;

    println!("\n=== ARTISTS FROM '{}' ===", selected.name);
    println!("Total tracks: {}", summary.total_tracks);
    println!("Unique artists: {}", summary.unique_artists);

    println!("\nTop 10 Most Frequent Artists:");
    for (artist, count) in summary.top_artists(10) {
        println!("  {artist}: {count} track(s)");
    }
    println!("\nAll Artists (alphabetical):");
    for artist in &summary.all_artists {
        println!("  - {artist}");
    }

    let out = out_dir.join(playlists::extract_file_name(&selected.name));
    store::write_json(&out, &detailed)?;
    println!("\nData saved to: {}", out.display());
    Ok(())
}

async fn collect(out: &Path) -> anyhow::Result<()> {
    let catalog = connect().await?;

    println!("Extracting artists from all your playlists...");
    let collection = playlists::collect_owned(&catalog).await?;
    playlists::save_collection(out, &collection)?;

    println!("\nProcessed {} playlists:", collection.len());
    for (name, summary) in &collection {
        println!("  - {name}: {} unique artists", summary.unique_artists);
    }
    println!("\nData saved to: {}", out.display());
    Ok(())
}

fn match_playlists(
    playlists_path: &Path,
    lineup_path: &Path,
    out: &Path,
    report: &ReportConfig,
) -> anyhow::Result<()> {
    let collection = load_playlists(playlists_path)?;
    let index = LineupIndex::new(&load_lineup(lineup_path)?);
    let matches = matcher::match_per_playlist(&collection, &index);

    println!("Checked {} playlists against {}", collection.len(), report.festival_name);
    println!("Found {} total exact matches!\n", matches.len());
    if matches.is_empty() {
        println!("No exact matches found across all playlists.");
        return Ok(());
    }

    let mut by_playlist: BTreeMap<&str, Vec<&Match>> = BTreeMap::new();
    for m in &matches {
        let name = m.playlist.as_deref().unwrap_or_default();
        by_playlist.entry(name).or_default().push(m);
    }
    for (name, group) in by_playlist {
        println!("=== {} ({} matches) ===", name.to_uppercase(), group.len());
        for m in group {
            println!("* {} -> {}", m.playlist_artist, m.lineup_artist);
            println!("   {} - {} at {}\n", m.stage, m.day, m.time);
        }
        println!();
    }

    let rendered = schedule::render_playlist_schedule(&report.festival_name, &matches, &report.day_order);
    schedule::write_report(out, &rendered)?;
    println!("Complete schedule saved to: {}", out.display());
    Ok(())
}

fn broadcast(
    playlists_path: &Path,
    lineup_path: &Path,
    out_dir: &Path,
    csv: Option<&Path>,
    report: &ReportConfig,
) -> anyhow::Result<()> {
    let collection = load_playlists(playlists_path)?;
    let lineup = load_lineup(lineup_path)?;
    let mut result = matcher::match_collection(&collection, &lineup);
    schedule::sort_matches(&mut result.broadcast, &report.day_order);
    schedule::sort_matches(&mut result.non_broadcast, &report.day_order);

    println!("Found {} total exact matches!", result.total());
    println!("  - {} will be broadcast on TV/iPlayer", result.broadcast.len());
    println!("  - {} are not being broadcast\n", result.non_broadcast.len());

    if !result.broadcast.is_empty() {
        println!("=== BROADCAST ACTS (TV/iPlayer Coverage) ===");
        for m in &result.broadcast {
            print_entry(&m.lineup_artist, &m.stage, &m.day, &m.time);
            println!("   [BROADCAST] Will be on TV/iPlayer\n");
        }
    }
    if !result.non_broadcast.is_empty() {
        println!("=== NON-BROADCAST ACTS (Festival Only) ===");
        for m in &result.non_broadcast {
            print_entry(&m.lineup_artist, &m.stage, &m.day, &m.time);
            println!("   [FESTIVAL ONLY] Not broadcast\n");
        }
    }

    if result.is_empty() {
        return Ok(());
    }

    if !result.broadcast.is_empty() {
        let path = out_dir.join("broadcast_schedule.txt");
        let rendered =
            schedule::render_broadcast_schedule(&report.festival_name, &result.broadcast, &report.day_order);
        schedule::write_report(&path, &rendered)?;
        println!("Broadcast schedule saved to: {}", path.display());
    }

    let path = out_dir.join("complete_festival_schedule.txt");
    let rendered = schedule::render_complete_schedule(&report.festival_name, &result, &report.day_order);
    schedule::write_report(&path, &rendered)?;
    println!("Complete schedule saved to: {}", path.display());

    if let Some(csv) = csv {
        schedule::write_csv(csv, &result.all())?;
        println!("Match list exported to: {}", csv.display());
    }
    Ok(())
}

fn print_suggestions(heading: &str, entries: &[LineupEntry]) {
    println!("\n=== LINEUP ARTISTS YOU MIGHT LIKE ===");
    println!("{heading}, found {} suggestions:\n", entries.len());
    for entry in entries {
        print_entry(&entry.artist, &entry.stage, &entry.day, &entry.time);
        println!();
    }
}

async fn related(
    playlists_path: &Path,
    lineup_path: &Path,
    seeds: Vec<String>,
    out: &Path,
) -> anyhow::Result<()> {
    let index = LineupIndex::new(&load_lineup(lineup_path)?);

    let seeds = if seeds.is_empty() {
        let collection = load_playlists(playlists_path)?;
        let matched: BTreeSet<String> = matcher::match_per_playlist(&collection, &index)
            .into_iter()
            .map(|m| m.lineup_artist)
            .collect();
        matched.into_iter().collect::<Vec<_>>()
    } else {
        seeds
    };
    if seeds.is_empty() {
        bail!("no seed artists: pass --seed or collect playlists that overlap the lineup");
    }
    info!(seeds = seeds.len(), "finding related artists");

    let catalog = connect().await?;
    println!("Finding related artists for your lineup matches...");
    let suggestions = recommend::related_suggestions(&catalog, &seeds, &index).await;
    println!("\nTotal related artists found: {}", suggestions.candidates);

    print_suggestions("Based on artists similar to your matches", &suggestions.entries);
    if suggestions.entries.is_empty() {
        println!("No new lineup artists found in related artists.");
        return Ok(());
    }
    store::write_json(out, &suggestions.entries)?;
    println!("Suggestions saved to: {}", out.display());
    Ok(())
}

async fn recommend_acts(
    playlists_path: &Path,
    lineup_path: &Path,
    seed_count: usize,
    out: &Path,
) -> anyhow::Result<()> {
    let collection = load_playlists(playlists_path)?;
    let artists = playlists::all_artists(&collection);
    println!("Found {} unique artists in your playlists", artists.len());

    let index = LineupIndex::new(&load_lineup(lineup_path)?);
    let seed_names = recommend::pick_seed_names(&artists, seed_count, &mut rand::thread_rng());
    info!(seeds = ?seed_names, "picked seed artists");

    let catalog = connect().await?;
    println!("Getting Spotify recommendations...");
    let suggestions = recommend::recommendation_suggestions(&catalog, &seed_names, &index).await;

    if suggestions.seeds_found == 0 {
        println!("Could not find seed artists on Spotify");
        return Ok(());
    }
    if suggestions.candidates == 0 {
        println!("No recommendations found");
        return Ok(());
    }

    print_suggestions("Based on your listening history", &suggestions.entries);
    if suggestions.entries.is_empty() {
        println!("No lineup artists found in your recommendations.");
        println!("Try running again for different seed artists.");
        return Ok(());
    }
    store::write_json(out, &suggestions.entries)?;
    println!("Recommendations saved to: {}", out.display());
    Ok(())
}

fn repair(files: &[PathBuf]) -> anyhow::Result<()> {
    for file in files {
        match schedule::repair_file(file) {
            Ok(true) => println!("Fixed {}", file.display()),
            Ok(false) => println!("{} already uses real line breaks", file.display()),
            Err(e) => eprintln!("Could not fix {}: {e}", file.display()),
        }
    }
    Ok(())
}
