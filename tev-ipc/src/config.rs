//! Command-line client configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tev_ipc_core::{ConnectionInfo, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TILE_SIZE, TevError, TileSize};

/// Top-level configuration for the command-line client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Where the viewer listens.
    pub connection: ConnectionConfig,
    /// Pixel update tiling.
    pub update: UpdateConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Viewer address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
}

/// Tiling of pixel updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Maximum tile width in pixels.
    pub tile_width: usize,
    /// Maximum tile height in pixels.
    pub tile_height: usize,
    /// Split updates into tiles; when false each update is one packet.
    pub tiling: bool,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            tile_width: DEFAULT_TILE_SIZE,
            tile_height: DEFAULT_TILE_SIZE,
            tiling: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ClientConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::debug!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo::new(self.connection.host.clone(), self.connection.port)
    }

    /// Tile size for pixel updates, or `None` when tiling is disabled.
    pub fn tile_size(&self) -> Result<Option<TileSize>, TevError> {
        if !self.update.tiling {
            return Ok(None);
        }
        TileSize::new(self.update.tile_width, self.update.tile_height).map(Some)
    }
}

// ── Tests ────────────────────────────────────────────────────────
