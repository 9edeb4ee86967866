use anyhow::Result;
use clap::{Parser, Subcommand};

use lorekeeper::settings::Settings;

mod canvas;
mod panel;
mod scene;
mod session;

#[derive(Parser)]
#[command(name = "lorekeeper", author, version, about, long_about = None)]
struct Cli {
    /// Scene file providing tokens and context (JSON)
    #[arg(short, long, global = true)]
    scene: Option<std::path::PathBuf>,

    /// Act as the GM (sees hidden tokens, may use GM tools)
    #[arg(long, global = true)]
    gm: bool,

    /// Display name of the requesting user
    #[arg(long, global = true, default_value = "Player")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat session with streamed replies and token highlights
    Chat,
    /// Ask a single question over the non-streaming endpoint
    Ask {
        prompt: String,
        /// GM tool to run the prompt through (requires --gm)
        #[arg(long)]
        tool: Option<String>,
    },
    /// List the models the backend can serve
    Models,
    /// Show the chunks currently held in the retrieval index
    Chunks,
    /// Ingest the document behind a URL into the retrieval index
    Ingest { url: String },
    /// Ingest a directory of journal files (.md/.txt) into the index
    IngestJournals { dir: std::path::PathBuf },
    /// Drop everything the backend remembers about the current scene
    ClearScene,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = Settings::load()?;
    let stage = scene::Stage::load(cli.scene.as_deref(), &cli.user, cli.gm)?;

    match cli.command {
        Command::Chat => session::run(settings, stage).await,
        Command::Ask { prompt, tool } => {
            if tool.is_some() && !cli.gm {
                anyhow::bail!("GM tools require --gm");
            }
            panel::ask(&settings, &stage, &prompt, tool).await
        }
        Command::Models => panel::models(&settings).await,
        Command::Chunks => panel::chunks(&settings).await,
        Command::Ingest { url } => panel::ingest(&settings, &stage, &url).await,
        Command::IngestJournals { dir } => panel::ingest_journals(&settings, &stage, &dir).await,
        Command::ClearScene => panel::clear_scene(&settings, &stage).await,
    }
}
