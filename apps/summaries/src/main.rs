use std::{path::PathBuf, sync::Arc};

mod config;
mod render;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use client_core::{
    presentation::DELETE_CONFIRMATION_PROMPT, ClientError, ClientEvent, DeleteOutcome,
    EditOutcome, FileUpload, HttpStoreOptions, HttpSummaryStore, SortField, SortOrder,
    SummaryController,
};
use shared::domain::SummaryId;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "summaries", about = "List, create, edit and delete document summaries")]
struct Cli {
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Overrides the configured API base URL.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        /// Explicit order such as `name:asc` or `created:desc`.
        #[arg(long)]
        sort: Option<SortOrder>,
        /// Column-header clicks applied in order: a repeated field flips direction.
        #[arg(long = "click")]
        clicks: Vec<SortField>,
    },
    Show {
        id: String,
    },
    CreateText {
        /// Read from stdin when omitted.
        text: Option<String>,
    },
    CreateFile {
        path: PathBuf,
    },
    Edit {
        id: String,
        text: String,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()).await {
        match err.downcast_ref::<ClientError>() {
            Some(client_err) => {
                error!(error = %client_err, "summaries: command failed");
                eprintln!("{}", client_err.notice());
            }
            None => eprintln!("error: {err:#}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = config::load_settings(&cli.config);
    if let Some(api_url) = cli.api_url {
        settings.api_base_url = api_url;
    }
    if let Some(token) = cli.token {
        settings.auth_token = Some(token);
    }

    let store = HttpSummaryStore::with_options(
        &settings.api_base_url,
        HttpStoreOptions {
            auth_token: settings.auth_token.clone(),
            request_timeout: settings.request_timeout(),
        },
    )
    .context("failed to configure summary store")?;
    let controller = SummaryController::with_sort_order(Arc::new(store), settings.default_sort);
    spawn_event_logger(&controller);

    match cli.command {
        Command::List { sort, clicks } => {
            if let Some(order) = sort {
                controller.set_sort_order(order).await;
            }
            for field in clicks {
                controller.select_sort_field(field).await;
            }
            controller.reload().await?;
            let rows = controller.sorted_summaries().await;
            print!(
                "{}",
                render::render_list(&rows, controller.sort_order().await, &Local)
            );
        }
        Command::Show { id } => {
            controller.reload().await?;
            let summary = controller
                .view(&SummaryId::from(id.as_str()))
                .await
                .ok_or_else(|| anyhow!("summary {id} not found"))?;
            print!("{}", render::render_detail(&summary, &Local));
        }
        Command::CreateText { text } => {
            let text = match text {
                Some(text) => text,
                None => read_stdin().await?,
            };
            controller.create_from_text(&text).await?;
            println!("Summary requested; {} summaries listed.", controller.snapshot().await.len());
        }
        Command::CreateFile { path } => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .ok_or_else(|| anyhow!("{} is not a file path", path.display()))?;
            let mime_type = mime_guess::from_path(&path)
                .first()
                .map(|mime| mime.to_string());
            controller
                .create_from_file(FileUpload {
                    filename: filename.clone(),
                    mime_type,
                    bytes,
                })
                .await?;
            println!("Uploaded {filename}; {} summaries listed.", controller.snapshot().await.len());
        }
        Command::Edit { id, text } => {
            controller.reload().await?;
            match controller.edit(&SummaryId::from(id.as_str()), &text).await? {
                EditOutcome::Applied(_) => println!("Saved summary {id}."),
                EditOutcome::Stale => bail!("summary {id} not found"),
            }
        }
        Command::Delete { id, yes } => {
            controller.reload().await?;
            let pending = controller.request_delete(&SummaryId::from(id.as_str())).await;
            if !yes && !confirm(DELETE_CONFIRMATION_PROMPT).await? {
                controller.cancel_delete(pending).await;
                println!("Deletion cancelled.");
                return Ok(());
            }
            match controller.confirm_delete(pending).await? {
                DeleteOutcome::Deleted => println!("Deleted summary {id}."),
                DeleteOutcome::AlreadyAbsent => println!("Summary {id} was already deleted."),
            }
        }
    }

    Ok(())
}

fn spawn_event_logger(controller: &Arc<SummaryController>) {
    let mut events = controller.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ClientEvent::OperationFailed { operation, notice } => {
                    debug!(%operation, %notice, "summaries: operation failed")
                }
                other => debug!(event = ?other, "summaries: client event"),
            }
        }
    });
}

async fn read_stdin() -> Result<String> {
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .context("failed to read text from stdin")?;
    Ok(text)
}

async fn confirm(prompt: &str) -> Result<bool> {
    let mut stderr = tokio::io::stderr();
    stderr
        .write_all(format!("{prompt} [y/N] ").as_bytes())
        .await?;
    stderr.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await
        .context("failed to read confirmation")?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
