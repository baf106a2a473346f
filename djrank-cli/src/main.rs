//! DJ Rank CLI (djrank) - Main entry point
//!
//! Works against a running djrank-server. Every command loads the board
//! through the HTTP gateway; mutating commands need the admin token.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use djrank_common::config::{ClientConfig, ClientOverrides, ConfigFile};
use djrank_common::gateway::HttpGateway;
use djrank_common::performer::{EventContext, PerformerPatch, SocialLinks};
use djrank_common::placement::DragController;
use djrank_common::rubric::Criterion;
use djrank_common::search::{ArtistSearchResult, SearchSource};
use djrank_common::{Board, Capability, NewPerformer, Tier};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

/// Rank DJs and performers into S-F tiers
#[derive(Parser, Debug)]
#[command(name = "djrank")]
#[command(about = "Rank DJs and performers into S-F tiers", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "DJRANK_CONFIG")]
    config: Option<PathBuf>,

    /// Server base URL
    #[arg(short, long, global = true, env = "DJRANK_SERVER_URL")]
    server: Option<String>,

    /// Admin token; without it the session is read-only
    #[arg(long, global = true, env = "DJRANK_ADMIN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show tiers S..F and the unranked queue
    Board {
        /// Only list queued performers whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Show one performer in full
    Show {
        id: String,
        /// Print the stored record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a performer's score breakdown
    Score { id: String },
    /// Add a performer (lands in the queue unless --tier is given)
    Add(AddArgs),
    /// Import an artist found on an external platform
    Import(ImportArgs),
    /// Place a performer into a tier
    Place {
        id: String,
        #[arg(value_parser = parse_tier)]
        tier: Tier,
    },
    /// Move a performer back to the queue
    Unrank { id: String },
    /// Drag a performer onto a target ("queue" or S..F)
    Move { id: String, target: String },
    /// Place a performer in the tier its score suggests
    ApplyTier { id: String },
    /// Set rubric ratings and flags
    Rate(RateArgs),
    /// Replace the notes (empty text clears them)
    Note { id: String, text: String },
    /// Attach a photo or video reference
    Attach {
        #[arg(value_parser = ["photo", "video"])]
        kind: String,
        id: String,
        reference: String,
    },
    /// Delete a performer
    Delete { id: String },
}

#[derive(Args, Debug)]
struct AddArgs {
    name: String,
    #[arg(long)]
    id: Option<String>,
    #[arg(long, value_parser = parse_tier)]
    tier: Option<Tier>,
    #[arg(long)]
    bio: Option<String>,
    #[arg(long)]
    image: Option<String>,
    #[arg(long)]
    soundcloud: Option<String>,
    #[arg(long)]
    spotify: Option<String>,
    #[arg(long)]
    apple_music: Option<String>,
    #[arg(long)]
    venue: Option<String>,
    #[arg(long)]
    city: Option<String>,
    /// Event date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<chrono::NaiveDate>,
    /// Event type (club, festival, ...)
    #[arg(long)]
    event_type: Option<String>,
    #[arg(long)]
    slot: Option<String>,
    #[arg(long)]
    set_duration: Option<String>,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// soundcloud or spotify
    #[arg(value_parser = parse_source)]
    source: SearchSource,
    external_id: String,
    name: String,
    /// Profile URL on the source platform
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    image: Option<String>,
    #[arg(long)]
    bio: Option<String>,
}

#[derive(Args, Debug)]
struct RateArgs {
    id: String,
    /// Ratings 0-3; out-of-range values are clamped
    #[arg(long, allow_hyphen_values = true)]
    flow: Option<i64>,
    #[arg(long, allow_hyphen_values = true)]
    vibes: Option<i64>,
    #[arg(long, allow_hyphen_values = true)]
    visuals: Option<i64>,
    #[arg(long, allow_hyphen_values = true)]
    creativity: Option<i64>,
    #[arg(long)]
    crowd_control: Option<bool>,
    #[arg(long)]
    signature_moment: Option<bool>,
    #[arg(long)]
    bold_risks: Option<bool>,
    #[arg(long)]
    cliche_tracks: Option<bool>,
    #[arg(long)]
    overreliance: Option<bool>,
    #[arg(long)]
    poor_energy: Option<bool>,
}

fn parse_tier(s: &str) -> std::result::Result<Tier, String> {
    s.parse().map_err(|e: djrank_common::Error| e.to_string())
}

fn parse_source(s: &str) -> std::result::Result<SearchSource, String> {
    s.parse().map_err(|e: djrank_common::Error| e.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "djrank_cli=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let file = ConfigFile::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let config = ClientConfig::resolve(
        ClientOverrides {
            server_url: cli.server,
            admin_token: cli.token,
        },
        &file,
    );
    debug!("Using server {}", config.server_url);

    let capability = Capability::from_token(config.admin_token.as_deref());
    let gateway = HttpGateway::new(&config.server_url, config.admin_token.clone())
        .context("Failed to create HTTP client")?;
    let mut board = Board::load(Arc::new(gateway), capability)
        .await
        .with_context(|| format!("Failed to load board from {}", config.server_url))?;

    run(&mut board, cli.command).await
}

async fn run(board: &mut Board, command: Commands) -> Result<()> {
    match command {
        Commands::Board { filter } => {
            print!("{}", render::board(board, filter.as_deref()));
        }
        Commands::Show { id, json } => {
            let performer = board
                .performer(&id)
                .with_context(|| format!("No performer {}", id))?;
            if json {
                println!("{}", serde_json::to_string_pretty(performer)?);
            } else {
                print!("{}", render::performer(performer));
            }
        }
        Commands::Score { id } => {
            let score = board.score(&id)?;
            println!("{}", render::score(&score));
        }
        Commands::Add(args) => {
            let performer = board.add(new_performer(args)).await?;
            println!("Added {} [{}] to {}", performer.name, performer.id, performer.bucket());
        }
        Commands::Import(args) => {
            let result = ArtistSearchResult {
                source: args.source,
                external_id: args.external_id,
                name: args.name,
                image: non_empty(args.image),
                bio: non_empty(args.bio),
                url: non_empty(args.url),
                followers: 0,
                genres: Vec::new(),
            };
            let performer = board.import_search_result(result).await?;
            println!("Imported {} [{}] into the queue", performer.name, performer.id);
        }
        Commands::Place { id, tier } => {
            let performer = board.place_in_tier(&id, Some(tier)).await?;
            println!("{} -> {}", performer.name, performer.bucket());
        }
        Commands::Unrank { id } => {
            let performer = board.remove_from_tier(&id).await?;
            println!("{} -> queue", performer.name);
        }
        Commands::Move { id, target } => {
            let source = board.locate(&id).await?;
            let mut drag = DragController::new();
            drag.begin(id.as_str(), source);
            match drag.drop_on(&target) {
                Some(intent) => {
                    let performer = board.apply_drop(&intent).await?;
                    println!("{}: {} -> {}", performer.name, intent.from, intent.to);
                }
                None => println!("No change"),
            }
        }
        Commands::ApplyTier { id } => {
            let performer = board.apply_calculated_tier(&id).await?;
            println!("{} -> {}", performer.name, performer.bucket());
        }
        Commands::Rate(args) => {
            let patch = rate_patch(board, &args)?;
            let performer = board.update_details(&args.id, patch).await?;
            println!("{}", render::score(&performer.score()));
        }
        Commands::Note { id, text } => {
            let performer = board
                .update_details(&id, PerformerPatch::notes(non_empty(Some(text))))
                .await?;
            println!("Updated notes for {}", performer.name);
        }
        Commands::Attach {
            kind,
            id,
            reference,
        } => {
            let performer = if kind == "video" {
                board.attach_video(&id, &reference).await?
            } else {
                board.attach_photo(&id, &reference).await?
            };
            println!(
                "{} now has {} photos, {} videos",
                performer.name,
                performer.photos.len(),
                performer.videos.len()
            );
        }
        Commands::Delete { id } => {
            board.delete(&id).await?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}

fn new_performer(args: AddArgs) -> NewPerformer {
    NewPerformer {
        id: non_empty(args.id),
        name: args.name,
        bio: non_empty(args.bio),
        image: non_empty(args.image),
        links: SocialLinks {
            soundcloud_url: non_empty(args.soundcloud),
            spotify_url: non_empty(args.spotify),
            apple_music_url: non_empty(args.apple_music),
        },
        tier: args.tier,
        event: EventContext {
            venue: non_empty(args.venue),
            city: non_empty(args.city),
            date: args.date,
            kind: non_empty(args.event_type),
            slot: non_empty(args.slot),
            set_duration: non_empty(args.set_duration),
        },
        ..NewPerformer::default()
    }
}

/// Merge the given ratings and flags into the performer's current rubric
fn rate_patch(board: &Board, args: &RateArgs) -> Result<PerformerPatch> {
    let mut rubric = board
        .performer(&args.id)
        .with_context(|| format!("No performer {}", args.id))?
        .rubric;

    let ratings = [
        (Criterion::Flow, args.flow),
        (Criterion::Vibes, args.vibes),
        (Criterion::Visuals, args.visuals),
        (Criterion::Creativity, args.creativity),
    ];
    let flags = [
        args.crowd_control,
        args.signature_moment,
        args.bold_risks,
        args.cliche_tracks,
        args.overreliance,
        args.poor_energy,
    ];
    if ratings.iter().all(|(_, v)| v.is_none()) && flags.iter().all(Option::is_none) {
        bail!("Nothing to rate: pass at least one rating or flag");
    }

    for (criterion, value) in ratings {
        if let Some(value) = value {
            rubric.criteria.set(criterion, value);
        }
    }

    let bonuses = &mut rubric.bonuses;
    let penalties = &mut rubric.penalties;
    for (target, value) in [
        (&mut bonuses.crowd_control, args.crowd_control),
        (&mut bonuses.signature_moment, args.signature_moment),
        (&mut bonuses.bold_risks, args.bold_risks),
        (&mut penalties.cliche_tracks, args.cliche_tracks),
        (&mut penalties.overreliance, args.overreliance),
        (&mut penalties.poor_energy, args.poor_energy),
    ] {
        if let Some(value) = value {
            *target = value;
        }
    }

    Ok(PerformerPatch::rubric(&rubric))
}

#[cfg(test)]
mod tests {
    use super::*;
    use djrank_common::gateway::MemoryGateway;
    use djrank_common::Gateway;

    fn rate_args(id: &str) -> RateArgs {
        RateArgs {
            id: id.to_string(),
            flow: None,
            vibes: None,
            visuals: None,
            creativity: None,
            crowd_control: None,
            signature_moment: None,
            bold_risks: None,
            cliche_tracks: None,
            overreliance: None,
            poor_energy: None,
        }
    }

    #[tokio::test]
    async fn test_rate_merges_into_current_rubric() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway
            .create(NewPerformer::named("Rated").with_id("r1"))
            .await
            .unwrap();
        let mut board = Board::load(gateway, Capability::Admin).await.unwrap();

        let mut args = rate_args("r1");
        args.flow = Some(7);
        args.bold_risks = Some(true);
        let patch = rate_patch(&board, &args).unwrap();
        let performer = board.update_details("r1", patch).await.unwrap();
        assert_eq!(performer.rubric.criteria.flow, 3);
        assert!(performer.rubric.bonuses.bold_risks);

        let mut args = rate_args("r1");
        args.vibes = Some(2);
        let patch = rate_patch(&board, &args).unwrap();
        let performer = board.update_details("r1", patch).await.unwrap();
        assert_eq!(performer.rubric.criteria.flow, 3);
        assert_eq!(performer.rubric.criteria.vibes, 2);
        assert!(performer.rubric.bonuses.bold_risks);
        assert_eq!(performer.score().total, 5.5);
    }

    #[tokio::test]
    async fn test_rate_requires_something_to_change() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway
            .create(NewPerformer::named("Rated").with_id("r1"))
            .await
            .unwrap();
        let board = Board::load(gateway, Capability::Admin).await.unwrap();

        assert!(rate_patch(&board, &rate_args("r1")).is_err());
        assert!(rate_patch(&board, &rate_args("missing")).is_err());
    }

    #[tokio::test]
    async fn test_move_fetches_performer_missing_from_board() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut board = Board::load(gateway.clone(), Capability::Admin).await.unwrap();
        gateway
            .create(NewPerformer::named("Latecomer").with_id("late"))
            .await
            .unwrap();

        run(
            &mut board,
            Commands::Move {
                id: "late".to_string(),
                target: "b".to_string(),
            },
        )
        .await
        .unwrap();

        let stored = gateway.get("late").await.unwrap().unwrap();
        assert_eq!(stored.tier, Some(Tier::B));
        assert_eq!(board.index().locate("late"), Some(djrank_common::Bucket::Tier(Tier::B)));

        let missing = Commands::Move {
            id: "ghost".to_string(),
            target: "b".to_string(),
        };
        assert!(run(&mut board, missing).await.is_err());
    }

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::try_parse_from(["djrank", "place", "42", "s"]).unwrap();
        match cli.command {
            Commands::Place { id, tier } => {
                assert_eq!(id, "42");
                assert_eq!(tier, Tier::S);
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Cli::try_parse_from(["djrank", "place", "42", "Z"]).is_err());
        assert!(Cli::try_parse_from(["djrank", "attach", "audio", "42", "x"]).is_err());
    }

    #[test]
    fn test_add_args_drop_blank_fields() {
        let cli = Cli::try_parse_from([
            "djrank", "add", "Fresh", "--bio", " ", "--city", "Berlin", "--date", "2025-06-01",
        ])
        .unwrap();
        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        let new = new_performer(args);
        assert_eq!(new.name, "Fresh");
        assert_eq!(new.bio, None);
        assert_eq!(new.event.city.as_deref(), Some("Berlin"));
        assert_eq!(new.event.date, chrono::NaiveDate::from_ymd_opt(2025, 6, 1));
        assert_eq!(new.tier, None);
    }
}
