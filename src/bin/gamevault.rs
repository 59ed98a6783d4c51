//! GameVault Binary
//!
//! Opens the catalog and runs the interactive menu on stdin/stdout.

use std::io;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use clap::Parser;
use gamevault::console::{Console, Line, LineSource};
use gamevault::{CatalogService, Config};
use tracing_subscriber::{fmt, EnvFilter};

/// GameVault
#[derive(Parser, Debug)]
#[command(name = "gamevault")]
#[command(about = "Durable video game catalog with free-text search")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./gamevault_data")]
    data_dir: String,

    /// Commits to accumulate in the WAL before writing a snapshot
    #[arg(short, long, default_value = "64")]
    checkpoint_every: u64,
}

fn main() {
    // Logs go to stderr so they never interleave with the menu
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,gamevault=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("GameVault v{}", gamevault::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .checkpoint_every(args.checkpoint_every)
        .build();

    let mut service = match CatalogService::open(config) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to open catalog: {}", e);
            eprintln!("Could not open the catalog: {}", e);
            std::process::exit(1);
        }
    };

    if service.is_first_run() {
        println!("Catalog initialized.");
    }

    let mut console = Console::new(terminal_input(), io::stdout());
    let outcome = console.run(&mut service);
    if console.was_interrupted() {
        tracing::info!("Interrupted, shutting down");
    }

    // Shut down on every path, including a console I/O failure
    let closed = service.shutdown();

    if let Err(e) = outcome {
        tracing::error!("Console error: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = closed {
        tracing::error!("Shutdown failed: {}", e);
        std::process::exit(1);
    }
}

/// Stdin lines and Ctrl-C, merged into one stream for the console
struct TerminalInput {
    events: Receiver<io::Result<Line>>,
}

impl LineSource for TerminalInput {
    fn next_line(&mut self) -> io::Result<Line> {
        // Every sender gone means stdin closed and no handler is installed
        self.events.recv().unwrap_or(Ok(Line::End))
    }
}

/// Read stdin on a background thread so Ctrl-C can cut a blocked prompt short
fn terminal_input() -> TerminalInput {
    let (tx, rx) = mpsc::channel();

    let interrupt = tx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = interrupt.send(Ok(Line::Interrupted));
    }) {
        tracing::warn!("Ctrl-C handler not installed: {}", e);
    }

    thread::spawn(move || {
        let mut stdin = io::stdin().lock();
        loop {
            let line = stdin.next_line();
            let last = match &line {
                Ok(Line::End) => true,
                Err(e) => e.kind() != io::ErrorKind::InvalidData,
                Ok(_) => false,
            };
            if tx.send(line).is_err() || last {
                break;
            }
        }
    });

    TerminalInput { events: rx }
}
