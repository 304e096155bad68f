//! Ties the pieces together: picks the archive source (local file or live
//! download), runs the requested importer, and on export merges new
//! utterance phrases back into the archive and persists or uploads it.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::{debug, info};

use crate::agent::{self, AgentArchive, UserSaysEntry};
use crate::caps::Caps;
use crate::client::AgentClient;
use crate::errors::{ConnectorError, Result};
use crate::importer::{self, status, ImportOptions, StatusReporter};
use crate::model::ImportResult;
use crate::runtime::{self, RuntimeContainer};

pub struct ImportArgs {
    pub caps: Caps,
    pub build_convos: bool,
    pub build_multistep_convos: bool,
    pub agent_zip: Option<PathBuf>,
}

pub struct ExportArgs {
    pub caps: Caps,
    pub agent_zip: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

async fn obtain_archive(
    agent_zip: Option<&Path>,
    client: Option<&dyn AgentClient>,
) -> Result<AgentArchive> {
    match agent_zip {
        Some(path) => {
            debug!("loading agent archive from {}", path.display());
            AgentArchive::from_path(path)
        }
        None => {
            let client = client.ok_or_else(|| {
                ConnectorError::Connection(
                    "no provider client configured and no archive path given".to_string(),
                )
            })?;
            debug!("downloading agent archive from provider");
            let bytes = client.export_agent().await?;
            AgentArchive::from_bytes(&bytes)
        }
    }
}

pub async fn import_handler(
    args: &ImportArgs,
    client: Option<&dyn AgentClient>,
    reporter: &dyn StatusReporter,
) -> Result<ImportResult> {
    debug!(
        "import options: build_convos={} build_multistep_convos={} agent_zip={:?}",
        args.build_convos, args.build_multistep_convos, args.agent_zip
    );
    let mut container = RuntimeContainer::build(args.caps.clone()).await?;

    let outcome = run_import(args, client, reporter).await;

    runtime::clean_quietly(&mut container).await;
    outcome
}

async fn run_import(
    args: &ImportArgs,
    client: Option<&dyn AgentClient>,
    reporter: &dyn StatusReporter,
) -> Result<ImportResult> {
    let archive = obtain_archive(args.agent_zip.as_deref(), client).await?;
    if args.build_multistep_convos {
        importer::import_conversations(&archive, reporter)
    } else {
        let options = ImportOptions {
            build_convos: args.build_convos,
        };
        importer::import_intents(&archive, &options, reporter)
    }
}

pub async fn export_handler(
    args: &ExportArgs,
    data: &ImportResult,
    client: Option<&dyn AgentClient>,
    reporter: &dyn StatusReporter,
) -> Result<()> {
    let mut container = RuntimeContainer::build(args.caps.clone()).await?;

    let outcome = run_export(args, data, client, reporter).await;

    runtime::clean_quietly(&mut container).await;
    outcome
}

async fn run_export(
    args: &ExportArgs,
    data: &ImportResult,
    client: Option<&dyn AgentClient>,
    reporter: &dyn StatusReporter,
) -> Result<()> {
    let mut archive = obtain_archive(args.agent_zip.as_deref(), client).await?;
    let language = archive.language().to_string();

    for set in &data.utterances {
        let entry_name = agent::user_says_name_for(&set.name, &language);
        let Some(existing) = archive.read_json_opt::<Vec<UserSaysEntry>>(&entry_name)? else {
            status(
                reporter,
                format!(
                    "user examples file not found for \"{}\", ignoring",
                    set.name
                ),
                None,
            );
            continue;
        };

        let known = agent::extract_phrases(&existing);
        let new_examples: Vec<&String> = set
            .utterances
            .iter()
            .filter(|phrase| !known.contains(phrase))
            .collect();
        if new_examples.is_empty() {
            status(
                reporter,
                format!("no new user examples found for \"{}\"", set.name),
                None,
            );
            continue;
        }

        status(
            reporter,
            format!(
                "{} new user examples found for \"{}\", adding to agent",
                new_examples.len(),
                set.name
            ),
            Some(json!({ "count": new_examples.len() })),
        );
        let mut merged = existing;
        merged.extend(
            new_examples
                .iter()
                .map(|phrase| UserSaysEntry::from_phrase(phrase, &language)),
        );
        archive.replace_entry(&entry_name, serde_json::to_vec_pretty(&merged)?);
    }

    let bytes = archive.to_bytes()?;
    match &args.output {
        Some(path) => {
            fs::write(path, &bytes)?;
            info!("wrote agent archive to {}", path.display());
        }
        None => {
            let client = client.ok_or_else(|| {
                ConnectorError::Connection(
                    "no provider client configured and no output path given".to_string(),
                )
            })?;
            let descriptor = client.agent_descriptor().await?;
            client.restore_agent(&descriptor.parent, &bytes).await?;
            status(
                reporter,
                format!("uploaded agent to {}", descriptor.parent),
                None,
            );
        }
    }
    Ok(())
}
