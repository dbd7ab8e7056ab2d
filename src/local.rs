//! Side effects in the user's environment: saving downloads and asking for
//! confirmation. Both are injected so the core never touches the console or
//! the local filesystem directly.

use crate::error::{Error, OperationKind, Result};
use crate::storage::ByteStream;
use crate::storage::constants::{CONFIRM_PREVIEW_LIMIT, PARTIAL_DIR};
use crate::storage::utils::path::local_file_name;
use futures::stream::StreamExt;
use opendal::{Operator, Writer};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Where downloaded bytes end up.
pub trait SaveTarget {
    /// Save `body` under `name` and return a description of where it went.
    async fn save(&self, name: &str, body: ByteStream) -> Result<String>;
}

/// Saves downloads into a local directory through an OpenDAL `fs` operator.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    operator: Operator,
    root: PathBuf,
}

impl DirectorySaver {
    /// Create a saver rooted at `root`.
    ///
    /// Bytes are written under a hidden partial directory and only moved to
    /// their final name once the whole body has arrived, so a failed download
    /// never replaces an existing local file.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let partial = root.join(PARTIAL_DIR);
        let builder = opendal::services::Fs::default()
            .root(&root.to_string_lossy())
            .atomic_write_dir(&partial.to_string_lossy());
        Ok(Self {
            operator: Operator::new(builder)?.finish(),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SaveTarget for DirectorySaver {
    async fn save(&self, name: &str, mut body: ByteStream) -> Result<String> {
        let file_name = local_file_name(name).ok_or_else(|| Error::InvalidName {
            name: name.to_string(),
        })?;
        let save_failed = |source| Error::SaveFailed {
            name: name.to_string(),
            source,
        };

        let mut writer = self
            .operator
            .writer(&file_name)
            .await
            .map_err(save_failed)?;

        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(source) => {
                    abort_partial(&mut writer, name).await;
                    return Err(Error::OperationFailed {
                        kind: OperationKind::Download,
                        name: name.to_string(),
                        source,
                    });
                }
            };
            written += chunk.len() as u64;
            if let Err(e) = writer.write(chunk).await {
                abort_partial(&mut writer, name).await;
                return Err(save_failed(e));
            }
        }
        writer.close().await.map_err(save_failed)?;

        let location = self.root.join(&file_name);
        log::info!("saved name={name} path={} bytes={written}", location.display());
        Ok(location.display().to_string())
    }
}

async fn abort_partial(writer: &mut Writer, name: &str) {
    if let Err(e) = writer.abort().await {
        log::warn!("failed to discard partial download name={name}: {e}");
    }
}

/// Asks the user before a destructive operation.
pub trait Confirmer {
    fn confirm(&self, action: OperationKind, names: &[String]) -> Result<bool>;
}

/// Prompts on stdout and reads the answer from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt;

impl Confirmer for ConsolePrompt {
    fn confirm(&self, action: OperationKind, names: &[String]) -> Result<bool> {
        println!("{}", confirmation_message(action, names));
        print!("Continue? (y/N): ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        Ok(is_yes(&input))
    }
}

/// Always confirms; used for `--force`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&self, _action: OperationKind, _names: &[String]) -> Result<bool> {
        Ok(true)
    }
}

/// Summary of what is about to happen, at most a handful of names long.
pub fn confirmation_message(action: OperationKind, names: &[String]) -> String {
    if action == OperationKind::Clear {
        return "About to delete ALL files on the server.".to_string();
    }
    let mut message = format!("About to {action} {} file(s):", names.len());
    for name in names.iter().take(CONFIRM_PREVIEW_LIMIT) {
        message.push_str(&format!("\n  {name}"));
    }
    if names.len() > CONFIRM_PREVIEW_LIMIT {
        message.push_str(&format!(
            "\n  ... and {} more",
            names.len() - CONFIRM_PREVIEW_LIMIT
        ));
    }
    message
}

pub fn is_yes(input: &str) -> bool {
    let answer = input.trim().to_lowercase();
    answer == "y" || answer == "yes"
}
