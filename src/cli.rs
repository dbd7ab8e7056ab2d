use crate::config::ClientConfig;
use crate::error::{EncodeOutputSnafu, Error, OperationKind, Result};
use crate::local::{AssumeYes, Confirmer, ConsolePrompt, SaveTarget};
use crate::manager::{FileManager, Outcome};
use crate::storage::RemoteStorage;
use crate::storage::utils::OutputFormat;
use crate::view::render_listing;
use clap::{Parser, Subcommand};
use serde::Serialize;
use snafu::ResultExt;
use std::path::PathBuf;

pub mod shell;

#[derive(Parser, Debug)]
#[command(
    name = "fileshelf",
    version,
    about = "List, upload, download and delete files on a remote file storage service"
)]
pub struct Args {
    /// Base URL of the storage service (overrides FILESHELF_ENDPOINT)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Directory downloaded files are saved to (overrides FILESHELF_DOWNLOAD_DIR)
    #[arg(short = 'd', long, global = true)]
    pub download_dir: Option<PathBuf>,

    /// Re-fetch the file list after a successful upload or delete
    #[arg(long, global = true)]
    pub refresh: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Apply command-line overrides on top of the environment configuration.
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(dir) = &self.download_dir {
            config.download_dir = dir.clone();
        }
        if self.refresh {
            config.auto_refresh = true;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List files held by the server
    Ls {
        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload a local file
    Put {
        /// Local file to upload
        path: PathBuf,
    },
    /// Download one or more files
    Get {
        /// Names of the files to download
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Delete one or more files
    Rm {
        /// Names of the files to delete
        #[arg(required = true)]
        names: Vec<String>,
        /// Do not ask for confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Delete every file on the server
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Interactive session with live per-file status
    Shell,
}

#[derive(Serialize)]
struct JsonListing<'a> {
    files: &'a [crate::storage::FileEntry],
}

pub async fn run<S, L>(command: Command, manager: FileManager<S, L>) -> Result<()>
where
    S: RemoteStorage + 'static,
    L: SaveTarget + 'static,
{
    match command {
        Command::Ls { json } => {
            let format = if json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            };
            list(&manager, format).await
        }
        Command::Put { path } => {
            manager.select(&path).await?;
            let outcome = manager.upload().await?;
            println!("{outcome}");
            Ok(())
        }
        Command::Get { names } => {
            let results = manager.download_many(&names).await;
            report(OperationKind::Download, &names, results)
        }
        Command::Rm { names, force } => {
            if !confirmer(force).confirm(OperationKind::Delete, &names)? {
                println!("Aborted.");
                return Ok(());
            }
            let results = manager.delete_many(&names).await;
            report(OperationKind::Delete, &names, results)
        }
        Command::Clear { force } => {
            if !confirmer(force).confirm(OperationKind::Clear, &[])? {
                println!("Aborted.");
                return Ok(());
            }
            let outcome = manager.clear().await?;
            println!("{outcome}");
            Ok(())
        }
        Command::Shell => shell::run(manager).await,
    }
}

fn confirmer(force: bool) -> Box<dyn Confirmer> {
    if force {
        Box::new(AssumeYes)
    } else {
        Box::new(ConsolePrompt)
    }
}

async fn list<S, L>(manager: &FileManager<S, L>, format: OutputFormat) -> Result<()>
where
    S: RemoteStorage,
    L: SaveTarget,
{
    let files = manager.refresh().await?;
    match format {
        OutputFormat::Human => {
            print!("{}", render_listing(&manager.listing(), manager.tracker()));
        }
        OutputFormat::Json => {
            let body = serde_json::to_string(&JsonListing { files: &files })
                .context(EncodeOutputSnafu)?;
            println!("{body}");
        }
    }
    Ok(())
}

/// Print each outcome; every failure names its file and operation.
fn report(kind: OperationKind, names: &[String], results: Vec<Result<Outcome>>) -> Result<()> {
    if let [_] = names {
        let outcome = results.into_iter().next().ok_or_else(|| Error::PartialFailure {
            kind,
            failed_names: names.to_vec(),
        })??;
        println!("{outcome}");
        return Ok(());
    }

    let mut failed_names = Vec::new();
    for (name, result) in names.iter().zip(results) {
        match result {
            Ok(outcome) => println!("{outcome}"),
            Err(e) => {
                eprintln!("{e}");
                failed_names.push(name.clone());
            }
        }
    }

    if failed_names.is_empty() {
        Ok(())
    } else {
        Err(Error::PartialFailure { kind, failed_names })
    }
}
