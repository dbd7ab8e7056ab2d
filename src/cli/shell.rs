//! Interactive session.
//!
//! The file list is fetched once on start and after that only on `refresh`.
//! Transfers run as local tasks on a single thread, so the prompt stays
//! responsive and `status` shows what is in flight.

use crate::error::{OperationKind, Result};
use crate::local::{SaveTarget, confirmation_message, is_yes};
use crate::manager::{FileManager, Outcome};
use crate::storage::RemoteStorage;
use crate::view::{render_listing, render_status};
use std::future::Future;
use std::io::Write;
use std::rc::Rc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::task::{self, JoinHandle, LocalSet};

const HELP: &str = "\
Commands:
  ls              show the file list as last fetched, with status
  refresh         fetch the file list from the server
  select <path>   choose a local file to upload
  upload          upload the selected file
  get <name>      download a file
  rm <name>       delete a file
  clear           delete every file
  status          show operations in progress
  help            show this help
  quit            wait for running operations and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    Refresh,
    Select(String),
    Upload,
    Get(String),
    Rm(String),
    Clear,
    Status,
    Help,
    Quit,
    Empty,
    MissingArgument(&'static str),
    Unknown(String),
}

impl ShellCommand {
    /// Everything after the command word is one argument, so names may contain spaces.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let arg = |build: fn(String) -> ShellCommand, usage: &'static str| {
            if rest.is_empty() {
                ShellCommand::MissingArgument(usage)
            } else {
                build(rest.to_string())
            }
        };

        match word {
            "" => ShellCommand::Empty,
            "ls" | "list" => ShellCommand::List,
            "refresh" => ShellCommand::Refresh,
            "select" => arg(ShellCommand::Select, "select <path>"),
            "upload" => ShellCommand::Upload,
            "get" | "download" => arg(ShellCommand::Get, "get <name>"),
            "rm" | "delete" => arg(ShellCommand::Rm, "rm <name>"),
            "clear" => ShellCommand::Clear,
            "status" => ShellCommand::Status,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            other => ShellCommand::Unknown(other.to_string()),
        }
    }
}

pub async fn run<S, L>(manager: FileManager<S, L>) -> Result<()>
where
    S: RemoteStorage + 'static,
    L: SaveTarget + 'static,
{
    let local = LocalSet::new();
    local.run_until(session(Rc::new(manager))).await
}

async fn session<S, L>(manager: Rc<FileManager<S, L>>) -> Result<()>
where
    S: RemoteStorage + 'static,
    L: SaveTarget + 'static,
{
    if let Err(e) = manager.refresh().await {
        eprintln!("{e}");
    }
    print!("{}", render_listing(&manager.listing(), manager.tracker()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    loop {
        prompt("> ")?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match ShellCommand::parse(&line) {
            ShellCommand::Empty => {}
            ShellCommand::List => {
                print!("{}", render_listing(&manager.listing(), manager.tracker()));
            }
            ShellCommand::Refresh => match manager.refresh().await {
                Ok(_) => print!("{}", render_listing(&manager.listing(), manager.tracker())),
                Err(e) => eprintln!("{e}"),
            },
            ShellCommand::Select(path) => match manager.select(&path).await {
                Ok(selection) => println!("Selected '{}' for upload.", selection.name()),
                Err(e) => eprintln!("{e}"),
            },
            ShellCommand::Upload => {
                let m = Rc::clone(&manager);
                spawn_operation(&mut tasks, async move { m.upload().await });
            }
            ShellCommand::Get(name) => {
                let m = Rc::clone(&manager);
                spawn_operation(&mut tasks, async move { m.download(&name).await });
            }
            ShellCommand::Rm(name) => {
                let names = [name];
                println!("{}", confirmation_message(OperationKind::Delete, &names));
                if confirm(&mut lines).await? {
                    let m = Rc::clone(&manager);
                    let [name] = names;
                    spawn_operation(&mut tasks, async move { m.delete(&name).await });
                } else {
                    println!("Aborted.");
                }
            }
            ShellCommand::Clear => {
                println!("{}", confirmation_message(OperationKind::Clear, &[]));
                if confirm(&mut lines).await? {
                    let m = Rc::clone(&manager);
                    spawn_operation(&mut tasks, async move { m.clear().await });
                } else {
                    println!("Aborted.");
                }
            }
            ShellCommand::Status => print!("{}", render_status(manager.tracker())),
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => break,
            ShellCommand::MissingArgument(usage) => eprintln!("usage: {usage}"),
            ShellCommand::Unknown(word) => {
                eprintln!("unknown command '{word}'; type `help` for a list")
            }
        }
    }

    // Transfers cannot be cancelled; let the running ones settle.
    tasks.retain(|t| !t.is_finished());
    if !tasks.is_empty() {
        println!("Waiting for {} operation(s) to finish...", tasks.len());
    }
    for handle in tasks {
        let _ = handle.await;
    }
    Ok(())
}

fn spawn_operation<F>(tasks: &mut Vec<JoinHandle<()>>, operation: F)
where
    F: Future<Output = Result<Outcome>> + 'static,
{
    tasks.retain(|t| !t.is_finished());
    tasks.push(task::spawn_local(async move {
        match operation.await {
            Ok(outcome) => println!("{outcome}"),
            Err(e) => eprintln!("{e}"),
        }
    }));
}

async fn confirm(lines: &mut Lines<BufReader<Stdin>>) -> Result<bool> {
    prompt("Continue? (y/N): ")?;
    Ok(lines.next_line().await?.as_deref().is_some_and(is_yes))
}

fn prompt(text: &str) -> Result<()> {
    print!("{text}");
    std::io::stdout().flush()?;
    Ok(())
}
