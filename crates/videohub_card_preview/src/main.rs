use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing::warn;
use tracing_subscriber::filter::LevelFilter;
use videohub_card::Card;
use videohub_card_preview::load_config;
use videohub_card_preview::load_snapshot;
use videohub_card_preview::LogLevel;
use videohub_card_preview::LoggingBus;
use videohub_card_preview::RouteAction;

/// Render a Videohub routing card against a saved state snapshot
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Card configuration (TOML, or JSON with a .json extension)
    #[arg(long)]
    config: PathBuf,

    /// JSON state snapshot: entity id -> {state, attributes}
    #[arg(long)]
    states: PathBuf,

    /// Change a row before rendering, as <entity>=<option>
    #[arg(long = "route")]
    routes: Vec<RouteAction>,

    /// Run the preset at this index before rendering
    #[arg(long = "preset")]
    presets: Vec<usize>,

    /// Make the command bus reject every call
    #[arg(long)]
    fail: bool,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries only the rendered card
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(args.log_level))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args.config)?;
    let snapshot = load_snapshot(&args.states)?;
    info!(
        "Loaded {} entities from {}",
        snapshot.len(),
        args.states.display()
    );

    let card = Card::new(Arc::new(LoggingBus::new(args.fail)));
    card.set_config(config);
    card.update_state(snapshot);

    for route in &args.routes {
        let outcome = card.route_entity(&route.entity, &route.option).await;
        info!(entity = %route.entity, option = %route.option, ?outcome, "route");
    }
    for &index in &args.presets {
        let outcome = card.run_preset(index).await;
        info!(index, ?outcome, "preset");
    }

    match card.view() {
        Some(view) => println!("{}", view.to_html()),
        None => warn!("Card has nothing to render"),
    }
    info!(sizing_hint = card.sizing_hint(), "Preview complete");

    Ok(())
}
