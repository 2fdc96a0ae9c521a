// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "fbviz")]
#[command(about = "Device framebuffer visualizer", long_about = None)]
pub struct Cli {
    /// Device profile to render at startup
    #[arg(long, default_value = crate::device::DEFAULT_DEVICE)]
    pub device: String,

    /// Language id passed to the render engine
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Start with the magnified layout enabled
    #[arg(long, default_value = "false")]
    pub magnified: bool,

    /// Merge additional device profiles from a JSON file
    #[arg(long)]
    pub devices: Option<PathBuf>,

    /// Print the engine's language ids and exit
    #[arg(long, default_value = "false")]
    pub list_languages: bool,
}
