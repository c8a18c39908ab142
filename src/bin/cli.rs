use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kairos_store::export::{self, ExportDump};
use kairos_store::models::{Deck, Flashcard, Quadrant, Task};
use kairos_store::scheduler::{self, Rating};
use kairos_store::sdk::{Config, SaltMode, Workspace};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data directory (falls back to KAIROS_DATA_DIR, then ./data).
    #[arg(short, long)]
    data_dir: Option<String>,

    #[arg(short, long, env = "KAIROS_PASSPHRASE", hide_env_values = true)]
    passphrase: String,

    /// Derive the key with the fixed salt used by early releases.
    #[arg(long)]
    legacy_salt: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
enum Commands {
    AddTask {
        title: String,
        /// Q1, Q2, Q3, Q4 or UNSORTED
        #[arg(short, long, default_value = "Q2")]
        quadrant: String,
    },
    Tasks,
    Complete { id: String },
    AddDeck { title: String },
    AddCard { deck: String, front: String, back: String },
    Due { deck: String },
    Review {
        card: String,
        /// again, hard, good or easy
        rating: Rating,
    },
    Streak,
    Heatmap,
    Export {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    Import { file: PathBuf },
}

fn parse_quadrant(s: &str) -> anyhow::Result<Quadrant> {
    Ok(serde_json::from_value(serde_json::Value::String(s.to_uppercase()))?)
}

fn open_workspace(cli: &Cli) -> anyhow::Result<Workspace> {
    let mut config = Config::from_env("data");
    if let Some(dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(dir);
    }
    if cli.legacy_salt {
        config.salt_mode = SaltMode::Legacy;
    }
    Ok(Workspace::open(&config)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let workspace = open_workspace(&cli)?;
    workspace.unlock(&cli.passphrase).await?;

    match cli.command {
        Commands::AddTask { title, quadrant } => {
            let task = Task::new(title, parse_quadrant(&quadrant)?);
            workspace.tasks.save_task(&task).await?;
            println!("{}", task.id);
        }
        Commands::Tasks => {
            let tasks = workspace.tasks.get_all_tasks().await?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        Commands::Complete { id } => {
            let task = workspace.complete_task(&id).await?;
            println!("Completed {} (+{} points)", task.title, task.points_value);
        }
        Commands::AddDeck { title } => {
            let deck = Deck::new(title);
            workspace.flashcards.save_deck(&deck).await?;
            println!("{}", deck.id);
        }
        Commands::AddCard { deck, front, back } => {
            let card = Flashcard::new(deck, front, back);
            workspace.flashcards.save_card(&card).await?;
            println!("{}", card.id);
        }
        Commands::Due { deck } => {
            for card in workspace.flashcards.get_due_cards(&deck).await? {
                let [again, hard, good, easy] = scheduler::preview_intervals(&card);
                println!(
                    "{}\t{}\tagain {}d / hard {}d / good {}d / easy {}d",
                    card.id, card.front, again, hard, good, easy
                );
            }
        }
        Commands::Review { card, rating } => {
            let updated = workspace.review_card(&card, rating).await?;
            let outcome = if rating.passed() { "passed" } else { "requeued" };
            println!("{}: next review in {} day(s), ease {:.2}", outcome, updated.interval, updated.ease_factor);
        }
        Commands::Streak => {
            let report = workspace.analytics().await?;
            println!("{}", serde_json::to_string_pretty(&report.streak)?);
        }
        Commands::Heatmap => {
            let report = workspace.analytics().await?;
            println!("{}", serde_json::to_string_pretty(&report.heatmap)?);
        }
        Commands::Export { out } => {
            let dump = export::export_dump(&workspace).await?;
            let json = serde_json::to_string_pretty(&dump)?;
            match out {
                Some(path) => fs::write(path, json)?,
                None => println!("{}", json),
            }
        }
        Commands::Import { file } => {
            let dump: ExportDump = serde_json::from_slice(&fs::read(file)?)?;
            let summary = export::import_dump(&workspace, &dump).await?;
            println!("{:?}", summary);
        }
    }

    Ok(())
}
