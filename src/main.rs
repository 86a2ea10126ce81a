mod api;
mod llm;
mod server;

use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use post_optimizer::config::AppConfig;
use post_optimizer::drafts::{DraftStore, JsonFileBackend};
use post_optimizer::optimizer::{OptimizationRequest, Optimizer, PostLength, Tone};
use post_optimizer::{analyze, format_number, join_suggestions};

#[derive(Parser)]
#[command(name = "post-optimizer", about = "LinkedIn post optimizer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    Analyze(AnalyzeArgs),
    Optimize(OptimizeArgs),
    Drafts(DraftsArgs),
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct AnalyzeArgs {
    #[arg(long)]
    text: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct OptimizeArgs {
    #[arg(long)]
    text: Option<String>,
    #[arg(long, default_value = "professional")]
    tone: String,
    #[arg(long, default_value = "medium")]
    length: String,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    raw: bool,
}

#[derive(Args, Debug)]
struct DraftsArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    action: DraftsAction,
}

#[derive(Subcommand, Debug)]
enum DraftsAction {
    List,
    Save {
        #[arg(long)]
        text: Option<String>,
    },
    Delete {
        #[arg(long)]
        id: u64,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8787)]
    port: u16,
    #[arg(long, default_value = "webapp/dist")]
    web_root: String,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or(Command::Analyze(AnalyzeArgs::default()));

    match command {
        Command::Analyze(args) => run_analyze(args),
        Command::Optimize(args) => run_optimize(args).await,
        Command::Drafts(args) => run_drafts(args).await,
        Command::Serve(args) => server::serve(args).await,
    }
}

fn run_analyze(args: AnalyzeArgs) -> Result<(), String> {
    let text = read_text(args.text)?;
    let report = analyze(&text);

    println!("Estimated reach: {}", format_number(report.estimated_reach));
    println!("Engagement score: {:.1}%", report.engagement_score);
    println!("Content score: {}/100", report.content_score);
    println!(
        "Hashtag count optimal: {}",
        if report.optimal { "yes" } else { "no" }
    );
    println!("Best posting time: {}", report.best_posting_time);
    if !report.hashtag_suggestions.is_empty() {
        println!("Hashtag ideas: {}", report.hashtag_suggestions.join(", "));
    }
    if !report.suggestions.is_empty() {
        println!("\nSuggestions:\n{}", join_suggestions(&report.suggestions));
    }

    Ok(())
}

async fn run_optimize(args: OptimizeArgs) -> Result<(), String> {
    let tone = Tone::from_str(&args.tone).ok_or_else(|| format!("invalid tone: {}", args.tone))?;
    let length = PostLength::from_str(&args.length)
        .ok_or_else(|| format!("invalid length: {}", args.length))?;
    let text = read_text(args.text)?;

    let (config, _) = AppConfig::load(args.config)?;
    let client = llm::GenerationClient::from_config(&config)?;
    let optimizer = Optimizer::new(client);

    let request = OptimizationRequest { text, tone, length };
    let content = optimizer
        .optimize(&request)
        .await
        .map_err(|err| err.to_string())?;

    println!("Best posting time: {}", content.best_posting_time);
    println!("Content score: {}/100", content.content_score);
    println!("Estimated reach: {}", format_number(content.estimated_reach));
    println!("Engagement score: {:.1}%", content.engagement_score);
    if !content.hashtag_suggestions.is_empty() {
        println!(
            "Recommended hashtags: {}",
            content.hashtag_suggestions.join(" ")
        );
    }
    if !content.suggestions.is_empty() {
        println!("\nSuggestions:\n{}", join_suggestions(&content.suggestions));
    }
    if args.raw {
        println!("\n{}", content.raw_markdown);
    }

    Ok(())
}

async fn run_drafts(args: DraftsArgs) -> Result<(), String> {
    let (config, _) = AppConfig::load(args.config)?;
    let store = DraftStore::open(JsonFileBackend::new(PathBuf::from(&config.drafts.path))).await?;

    match args.action {
        DraftsAction::List => {
            let drafts = store.list().await;
            if drafts.is_empty() {
                println!("No saved drafts");
                return Ok(());
            }
            for draft in drafts {
                let preview: String = draft.content.chars().take(60).collect();
                println!("{}  {}  {}", draft.id, draft.created_at, preview);
            }
        }
        DraftsAction::Save { text } => {
            let content = read_text(text)?;
            let draft = store.save(&content).await?;
            println!("Saved draft {}", draft.id);
        }
        DraftsAction::Delete { id } => {
            if store.delete(id).await? {
                println!("Deleted draft {}", id);
            } else {
                return Err(format!("no draft with id {}", id));
            }
        }
    }

    Ok(())
}

fn read_text(arg: Option<String>) -> Result<String, String> {
    if let Some(text) = arg {
        if !text.trim().is_empty() {
            return Ok(text);
        }
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|err| format!("failed reading stdin: {}", err))?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Err("missing post text: pass --text or pipe stdin".to_string());
    }
    Ok(trimmed.to_string())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
