//! Quote Watch — a terminal client that tracks the live price of one ticker.
//!
//! Typing a symbol issues one REST quote request and opens one streaming
//! subscription; trades on the stream keep the displayed price fresh until the
//! symbol changes again.
//!
//! Usage example (CLI):
//! ```bash
//! QUOTE_API_KEY=... quote_watch --symbol AAPL
//! ```
//!
//! Input lines: a symbol to track, an empty line to re-subscribe, `:clear` to
//! stop tracking, `:quit` to exit.
use std::io;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use crossbeam_channel::unbounded;
use log::{debug, error, info};
use quote_watch::args::Args;
use quote_watch::event::AppEvent;
use quote_watch::shell::{self, Screen, UserInput};
use quote_watch::snapshot::RestSnapshotSource;
use quote_watch::stream::WsConnector;
use quote_watch::{ClientError, Flow, QuoteSessionManager, Result};

fn main() -> Result<(), ClientError> {
    let dotenv = dotenvy::dotenv();
    init_logger();
    if let Err(e) = dotenv {
        debug!("No .env loaded: {}", e);
    }
    let args = Args::parse().normalized();
    info!("Quotes from {}, trades from {}", args.quote_url, args.stream_url);

    let (events_tx, events_rx) = unbounded::<AppEvent>();
    {
        let events_tx = events_tx.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down...");
            let _ = events_tx.send(AppEvent::Shutdown);
        })?;
    }

    let source = Arc::new(RestSnapshotSource::new(&args.quote_url, &args.api_key, args.http_timeout())?);
    let connector = WsConnector::new(&args.stream_url, &args.api_key);
    let mut manager = QuoteSessionManager::new(source, connector, events_tx.clone());

    if let Some(symbol) = &args.symbol {
        events_tx
            .send(AppEvent::Input(UserInput::SetSymbol(symbol.clone())))
            .map_err(|e| ClientError::ChannelSend(e.to_string()))?;
    }

    {
        let events_tx = events_tx.clone();
        thread::Builder::new().name("input".into()).spawn(move || {
            if let Err(e) = shell::read_stdin(events_tx) {
                error!("Input loop failed: {}", e);
            }
        })?;
    }
    drop(events_tx);

    let mut screen = Screen::new(io::stdout());
    screen.refresh(manager.form(), manager.view())?;
    info!("Enter a symbol. Empty line re-subscribes, :clear stops, :quit exits.");

    let result = run(&mut manager, &mut screen, &events_rx);
    manager.shutdown();
    info!("Stopped.");
    result
}

/// Drain events one at a time until the manager asks to exit.
fn run<W: io::Write>(
    manager: &mut QuoteSessionManager<WsConnector>,
    screen: &mut Screen<W>,
    events: &crossbeam_channel::Receiver<AppEvent>,
) -> Result<()> {
    loop {
        let event = events
            .recv()
            .map_err(|e| ClientError::ChannelRecv(e.to_string()))?;
        if manager.handle(event) == Flow::Exit {
            return Ok(());
        }
        screen.refresh(manager.form(), manager.view())?;
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
