use anyhow::{anyhow, Context, Result};
use clap::Parser;
use winit::event_loop::EventLoop;

use fbviz::app::App;
use fbviz::cli::Cli;
use fbviz::device::DeviceCatalog;
use fbviz::engine::{PatternEngine, RenderEngine};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list_languages {
        for id in PatternEngine::new().language_ids() {
            println!("{id}");
        }
        return Ok(());
    }

    let catalog = match &cli.devices {
        Some(path) => DeviceCatalog::with_file(path)?,
        None => DeviceCatalog::builtin(),
    };

    let event_loop = EventLoop::new().map_err(|e| anyhow!("failed to create event loop: {e}"))?;
    let mut app = App::new(&cli, catalog).context("invalid startup selection")?;
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("event loop error: {e}"))?;

    Ok(())
}
