use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use convokit::caps::Caps;
use convokit::client::{AgentClient, HttpAgentClient};
use convokit::common;
use convokit::importer::LogReporter;
use convokit::model::ImportResult;
use convokit::orchestrator::{self, ExportArgs, ImportArgs};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import conversations and utterance sets from an exported agent archive
    Import {
        /// Build convo files with intent asserters
        #[clap(long)]
        build_convos: bool,
        /// Reverse-engineer the agent and build multi-step convo files
        #[clap(long)]
        build_multistep_convos: bool,
        /// Path to the exported agent archive; downloaded when not given
        #[clap(long)]
        agent_zip: Option<PathBuf>,
        /// Path to a JSON capability file with provider connection settings
        #[clap(long)]
        caps: Option<PathBuf>,
        /// Where to write the produced records as JSON; stdout when not given
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge utterance phrases back into an agent archive or the live agent
    Export {
        /// JSON file holding the conversations/utterance sets to merge
        #[clap(long)]
        convos: PathBuf,
        /// Path to the exported agent archive; downloaded when not given
        #[clap(long)]
        agent_zip: Option<PathBuf>,
        /// Path to a JSON capability file with provider connection settings
        #[clap(long)]
        caps: Option<PathBuf>,
        /// Where to write the changed archive; uploaded live when not given
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_caps(path: &Option<PathBuf>) -> Result<Caps> {
    match path {
        Some(path) => Ok(Caps::from_file(path)?),
        None => Ok(Caps::default()),
    }
}

/// Builds a provider client only when the flow needs one.
fn maybe_client(caps: &Caps, needed: bool) -> Result<Option<HttpAgentClient>> {
    if needed {
        Ok(Some(HttpAgentClient::from_caps(caps)?))
    } else {
        Ok(None)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        Commands::Import {
            build_convos,
            build_multistep_convos,
            agent_zip,
            caps,
            output,
        } => {
            let caps = load_caps(&caps)?;
            let client = maybe_client(&caps, agent_zip.is_none())?;
            let import_args = ImportArgs {
                caps,
                build_convos,
                build_multistep_convos,
                agent_zip,
            };
            let result = orchestrator::import_handler(
                &import_args,
                client.as_ref().map(|c| c as &dyn AgentClient),
                &LogReporter,
            )
            .await?;
            info!(
                "imported {} conversations and {} utterance sets",
                result.conversations.len(),
                result.utterances.len()
            );
            let rendered = serde_json::to_string_pretty(&result)?;
            match output {
                Some(path) => common::write_string_to_file(&path, &rendered)?,
                None => println!("{}", rendered),
            }
        }
        Commands::Export {
            convos,
            agent_zip,
            caps,
            output,
        } => {
            let caps = load_caps(&caps)?;
            let client =
                maybe_client(&caps, agent_zip.is_none() || output.is_none())?;
            let content = std::fs::read_to_string(&convos)?;
            let data: ImportResult = serde_json::from_str(&content)?;
            let export_args = ExportArgs {
                caps,
                agent_zip,
                output,
            };
            orchestrator::export_handler(
                &export_args,
                &data,
                client.as_ref().map(|c| c as &dyn AgentClient),
                &LogReporter,
            )
            .await?;
        }
    }
    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level.to_string()))
        .without_time()
        .init();
}
