//! tev-ipc entry point.
//!
//! ```text
//! tev-ipc open <path> [--channels R,G]   Open a file in the viewer
//! tev-ipc reload <name>                  Reload an image from disk
//! tev-ipc close <name>                   Close an image
//! tev-ipc create <name> -W 640 -H 480    Create a blank image
//! tev-ipc demo                           Send the striped test image
//! tev-ipc --gen-config                   Dump default config and exit
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tev_ipc::config::ClientConfig;
use tev_ipc::demo;
use tev_ipc_core::{
    ConnectionInfo, CreateImage, DEFAULT_CHANNEL_NAMES, Session, TevError, TileSize,
};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tev-ipc", about = "Remote control for the tev image viewer", version)]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "tev-ipc.toml")]
    config: PathBuf,

    /// Viewer address as `host[:port]` (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Viewer port (overrides config and `--host`).
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open an image file from the viewer's file system.
    Open {
        path: String,
        /// Channel selector; empty loads every channel.
        #[arg(long, default_value = "")]
        channels: String,
        /// Do not bring the image to the foreground.
        #[arg(long)]
        no_focus: bool,
    },
    /// Reload an open image from disk.
    Reload {
        name: String,
        #[arg(long)]
        no_focus: bool,
    },
    /// Close an open image.
    Close { name: String },
    /// Create a blank image.
    Create {
        name: String,
        #[arg(short = 'W', long)]
        width: i32,
        #[arg(short = 'H', long)]
        height: i32,
        /// Channel names, comma separated.
        #[arg(long, value_delimiter = ',')]
        channels: Vec<String>,
        #[arg(long)]
        no_focus: bool,
    },
    /// Create a striped test image and draw an overlay on it.
    Demo,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&ClientConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let config = ClientConfig::load(&cli.config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let Some(command) = cli.command else {
        anyhow::bail!("no command given; see `tev-ipc --help`");
    };

    let mut target = match &cli.host {
        Some(addr) => addr
            .parse::<ConnectionInfo>()
            .with_context(|| format!("invalid --host {addr:?}"))?,
        None => config.connection_info(),
    };
    if let Some(port) = cli.port {
        target = ConnectionInfo::new(target.host(), port);
    }

    info!("tev-ipc v{} -> {target}", env!("CARGO_PKG_VERSION"));

    let tile_size = config.tile_size().context("invalid [update] settings")?;

    // A command error takes precedence over a failure to close.
    Session::scoped(target.clone(), async move |tev| run(tev, command, tile_size).await)
        .await
        .with_context(|| format!("tev at {target}"))
}

async fn run(
    tev: &mut Session,
    command: Command,
    tile_size: Option<TileSize>,
) -> Result<(), TevError> {
    match command {
        Command::Open {
            path,
            channels,
            no_focus,
        } => tev.open_image(&path, &channels, !no_focus).await?,
        Command::Reload { name, no_focus } => tev.reload_image(&name, !no_focus).await?,
        Command::Close { name } => tev.close_image(&name).await?,
        Command::Create {
            name,
            width,
            height,
            channels,
            no_focus,
        } => {
            let names: Vec<&str> = if channels.is_empty() {
                DEFAULT_CHANNEL_NAMES.to_vec()
            } else {
                channels.iter().map(String::as_str).collect()
            };
            let create = CreateImage::new(&name, width, height)
                .with_channels(&names)
                .grab_focus(!no_focus);
            tev.create_image(&create).await?;
        }
        Command::Demo => demo::run(tev, tile_size).await?,
    }

    let stats = tev.stats();
    info!(
        packets = stats.packets_sent,
        bytes = stats.bytes_sent,
        "done"
    );
    Ok(())
}
