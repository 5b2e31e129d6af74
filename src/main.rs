//! kafkawatch - Terminal dashboard for live Kafka state
//!
//! Shows topics with partition counts, consumer groups with live
//! rebalance status, and the stream of messages consumed from one
//! topic.
//!
//! # Architecture
//!
//! Three threads feed one event queue:
//! - the poll worker consumes from the broker (`worker`),
//! - the input thread reads the terminal (`input`),
//! - rebalance callbacks fire on the poll worker's thread and write
//!   only into the shared `RebalanceState` (`rebalance`).
//!
//! The main thread runs the render loop: block on the queue, apply one
//! event to `AppState`, redraw, repeat. Shutdown stops and joins both
//! producer threads before closing the queue.

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use kafkawatch::app::AppState;
use kafkawatch::config::{FileConfig, WatchConfig};
use kafkawatch::events::EventQueue;
use kafkawatch::input::InputSource;
use kafkawatch::metadata;
use kafkawatch::rebalance::RebalanceState;
use kafkawatch::ui::ui;
use kafkawatch::worker::{self, KafkaMessageSource, PollWorker};

/// Timeout for metadata and group-list fetch operations (seconds)
const METADATA_TIMEOUT_SECS: u64 = 5;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Broker bootstrap address
    #[arg(short, long, env = "KAFKA_BROKER")]
    broker: Option<String>,

    /// Consumer group identifier
    #[arg(short, long, env = "KAFKA_GROUP")]
    group: Option<String>,

    /// Topic to watch
    #[arg(short, long, env = "KAFKA_TOPIC")]
    topic: Option<String>,

    /// Path to an optional YAML config file
    #[arg(short, long, default_value = "kafkawatch.yaml")]
    config: PathBuf,

    /// File to write logs to (level via RUST_LOG, default info)
    #[arg(long, default_value = "kafkawatch.log")]
    log_file: PathBuf,
}

/// Sets up file-based logging.
///
/// The dashboard owns the terminal, so logs go to a file instead of
/// stderr.
fn init_logging(path: &Path) -> Result<()> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {:?}", path))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let file_config = FileConfig::load(&args.config)?;
    let config = WatchConfig::resolve(file_config, args.broker, args.group, args.topic)
        .context("Invalid configuration")?;
    info!(
        topic = %config.topic,
        group = %config.group_id,
        broker = %config.brokers,
        "starting kafkawatch"
    );

    // The consumer context writes into this from the poll thread; the
    // render loop reads snapshots. It must outlive the poll worker.
    let rebalance = Arc::new(RebalanceState::new());

    let consumer =
        worker::connect(&config, rebalance.clone()).context("Failed to connect to Kafka")?;

    let metadata_timeout = Duration::from_secs(METADATA_TIMEOUT_SECS);
    let topics = metadata::fetch_topics(&consumer, metadata_timeout)
        .context("Failed to fetch topic metadata")?;
    let groups = metadata::fetch_groups(&consumer, metadata_timeout)
        .context("Failed to list consumer groups")?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let queue = EventQueue::new();
    let mut poll_worker = PollWorker::spawn(KafkaMessageSource::new(consumer), queue.clone());
    let mut input = InputSource::start(queue.clone());

    let mut app = AppState::new(
        config.topic.clone(),
        config.group_id.clone(),
        config.brokers.clone(),
        topics,
        groups,
    );

    let res = run_app(&mut terminal, &mut app, &queue, &rebalance);

    // Teardown order matters: stop and join both producers first, so
    // no enqueue or rebalance-state mutation happens afterwards, then
    // close the queue.
    input.stop();
    poll_worker.stop();
    queue.close();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("shutdown complete");
    res
}

/// Runs the render loop.
///
/// Draw first so the initial state is visible, then block on the
/// queue; every dequeued event is applied exactly once and followed by
/// a full redraw. The rebalance snapshot is refreshed per frame; it
/// is the only way the render loop observes the shared state.
fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
    queue: &EventQueue,
    rebalance: &RebalanceState,
) -> Result<()> {
    loop {
        app.group_state = rebalance.snapshot();
        terminal.draw(|f| ui(f, app))?;

        let Some(event) = queue.dequeue() else {
            // Queue closed: controlled shutdown from outside the loop.
            return Ok(());
        };
        if app.handle_event(event) {
            return Ok(());
        }
    }
}
