//! Watch paths and print settled events

use anyhow::{Context, Result};
use chrono::Local;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::borrow::Cow;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use watcher::{Event, Op, WatchError, Watcher};

/// Flags of `settle watch`
pub struct WatchOptions {
    pub debounce_ms: Option<u64>,
    pub keep_temporary: bool,
    pub config: Option<PathBuf>,
    pub json: bool,
}

pub async fn run(paths: &[PathBuf], options: WatchOptions) -> Result<()> {
    // 1. Resolve configuration: file first, then flags
    let mut config = super::load_config(options.config.as_deref())?;
    if let Some(ms) = options.debounce_ms {
        config = config.with_debounce(Duration::from_millis(ms));
    }
    if options.keep_temporary {
        config.ignore_temporary_files = false;
    }

    // 2. Start the watcher and register every path
    let mut watcher = Watcher::with_config(config).context("Failed to start watcher")?;
    for path in paths {
        watcher
            .add(path)
            .with_context(|| format!("Failed to watch {}", path.display()))?;
        info!("Watching {}", path.display());
    }

    if !options.json {
        println!(
            "{} {} (debounce {}ms, Ctrl-C to stop)",
            "Watching".bold(),
            describe(paths),
            watcher.debounce().as_millis()
        );
    }

    // 3. Print until interrupted
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut errors_open = true;
    let result = loop {
        tokio::select! {
            event = watcher.events.recv() => match event {
                Some(event) => print_event(&event, options.json)?,
                None => break Ok(()),
            },
            error = watcher.errors.recv(), if errors_open => match error {
                Some(error) => print_error(&error),
                None => errors_open = false,
            },
            signal = &mut ctrl_c => {
                break signal.context("Failed to listen for Ctrl-C");
            }
        }
    };

    // 4. Shut down; pending windows are dropped
    let pending = watcher.pending_count();
    if pending > 0 {
        info!("Discarding {} pending path(s)", pending);
    }
    watcher.close().await.context("Failed to close watcher")?;

    result
}

fn describe(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_event(event: &Event, json: bool) -> Result<()> {
    let now = Local::now();

    if json {
        println!("{}", json_line(event, &now.to_rfc3339())?);
        return Ok(());
    }

    println!(
        "{} {} {}",
        now.format("%H:%M:%S%.3f").to_string().dimmed(),
        colored_op(event.op),
        event.path.display()
    );
    Ok(())
}

/// One `--json` output record
#[derive(Serialize)]
struct JsonEvent<'a> {
    time: &'a str,
    op: Op,
    /// Lossy, so names that are not valid UTF-8 still print
    path: Cow<'a, str>,
}

fn json_line(event: &Event, time: &str) -> Result<String> {
    let record = JsonEvent {
        time,
        op: event.op,
        path: event.path.to_string_lossy(),
    };
    serde_json::to_string(&record).context("Failed to encode event")
}

fn colored_op(op: Op) -> String {
    let label = format!("{:<8}", op.to_string());
    if op.contains(Op::REMOVE) {
        label.red().to_string()
    } else if op.contains(Op::RENAME) {
        label.yellow().to_string()
    } else if op.intersects(Op::CREATE | Op::WRITE) {
        label.green().to_string()
    } else {
        label.cyan().to_string()
    }
}

fn print_error(error: &WatchError) {
    warn!("Watch error: {}", error);
    eprintln!("{} {}", "error:".red().bold(), error);
}
