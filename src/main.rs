use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use audiocast::commands;
use audiocast::config::{self, Settings};
use audiocast::store::EpisodeRecord;
use audiocast::Result;

#[derive(Parser)]
#[command(
    name = "audiocast",
    version,
    about = "Turn a Substack newsletter into a podcast feed"
)]
struct Cli {
    /// Project root holding data/ and output/ (defaults to the current directory)
    #[arg(long, global = true)]
    project_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch new posts and publish them as podcast episodes
    Run,
    /// Report configuration readiness
    SetupCheck,
    /// Fetch one article's structured content by URL
    FetchArticle { url: String },
    /// Synthesize audio from a plain-text file
    GenerateAudio {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        pub_date: String,
        #[arg(long)]
        text_file: PathBuf,
    },
    /// Append or replace one episode record and rebuild the feed
    UpdateFeed {
        #[arg(long)]
        guid: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        link: String,
        #[arg(long)]
        pub_date_iso: String,
        #[arg(long)]
        audio_file: String,
        #[arg(long)]
        audio_url: String,
        #[arg(long)]
        audio_size_bytes: u64,
    },
    /// List the episode catalog and processed state
    ListEpisodes,
    /// Remove orphaned part files from a crashed run
    Cleanup,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_root = cli
        .project_root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    config::load_dotenv(&project_root.join(".env"));

    match execute(cli, &project_root).await {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            let error = serde_json::json!({ "error": e.to_string() });
            println!("{}", error);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli, project_root: &std::path::Path) -> Result<String> {
    match cli.command {
        Command::SetupCheck => to_json(&commands::setup_check()),
        Command::Run => {
            let settings = Settings::from_env(project_root)?;
            to_json(&commands::run_batch(&settings).await?)
        }
        Command::FetchArticle { url } => to_json(&commands::fetch_article(&url).await?),
        Command::GenerateAudio {
            title,
            pub_date,
            text_file,
        } => {
            let settings = Settings::from_env(project_root)?;
            to_json(&commands::generate_audio(&settings, &title, &pub_date, &text_file).await?)
        }
        Command::UpdateFeed {
            guid,
            title,
            description,
            author,
            link,
            pub_date_iso,
            audio_file,
            audio_url,
            audio_size_bytes,
        } => {
            let settings = Settings::from_env(project_root)?;
            let record = EpisodeRecord {
                guid,
                title,
                description,
                author,
                link,
                pub_date_iso,
                audio_file,
                audio_url,
                audio_size_bytes,
            };
            to_json(&commands::update_feed(&settings, record)?)
        }
        Command::ListEpisodes => {
            let settings = Settings::from_env(project_root)?;
            to_json(&commands::list_episodes(&settings)?)
        }
        Command::Cleanup => {
            let settings = Settings::from_env(project_root)?;
            to_json(&commands::cleanup(&settings)?)
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
