mod accumulator;
mod action;
mod app;
mod config;
mod controller;
mod error;
mod event;
mod fetcher;
mod jikan;
mod trigger;
mod tui;
mod types;
mod ui;

use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::config::Config;
use crate::event::Event;
use crate::jikan::Jikan;
use crate::types::{FetchOutcome, FilterSet};

#[derive(Debug, Parser)]
#[command(name = "anigrid", version, about = "Browse the Jikan anime catalog")]
struct Cli {
    /// Comma-separated genre ids to filter by, e.g. "1,4"
    #[arg(long, value_parser = FilterSet::parse)]
    genres: Option<FilterSet>,

    /// Jikan API base URL
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load();
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    let filters = cli.genres.unwrap_or_else(|| config.initial_filters());

    let jikan = Jikan::new(config.api.base_url.clone(), config.api.timeout())?;
    tracing::info!(base_url = %config.api.base_url, filters = %filters, "starting");

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    // Run the application
    let result = run(jikan, filters, &config).await;

    // Restore terminal
    tui::restore()?;

    result
}

async fn run(
    jikan: Jikan,
    filters: FilterSet,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize terminal
    let mut terminal = tui::init()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<FetchOutcome>();

    // Mounting the app dispatches page 1
    let mut app = App::new(
        Arc::new(jikan),
        filters,
        &config.pagination,
        action_tx.clone(),
        outcome_tx,
    );

    let tick_rate = Duration::from_millis(250);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = tui::EventHandler::new(tick_rate, render_rate);

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &mut app))?;
                        app.after_render();
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
            Some(outcome) = outcome_rx.recv() => {
                app.update(Action::PageLoaded(outcome));
            }
        }

        if app.should_quit {
            break;
        }
    }

    app.trigger.detach();
    Ok(())
}
