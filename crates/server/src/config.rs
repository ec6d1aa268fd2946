// crates/server/src/config.rs
//! Startup configuration, read once from the environment.

use std::path::PathBuf;

use stems_separator::Device;

/// Default listening port.
const DEFAULT_PORT: u16 = 5000;

/// Default worker pool size. Separation is CPU/accelerator-bound, so the pool
/// stays small; queued jobs report `pending` until a slot frees up.
const DEFAULT_WORKERS: usize = 2;

#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the on-disk data area (`input/` and `output/` live under it).
    pub data_dir: PathBuf,
    /// Separation model identifier passed to the backend loader.
    pub model: String,
    /// Compute device for the backend.
    pub device: Device,
    /// HTTP listening port.
    pub port: u16,
    /// Number of concurrent separation workers.
    pub workers: usize,
}

impl Config {
    /// Read configuration from the environment, falling back to defaults.
    ///
    /// `STEMS_PORT` takes priority over the generic `PORT`; an unparseable
    /// device falls back to CPU with a warning rather than refusing to start.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("STEMS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let model =
            std::env::var("STEMS_MODEL").unwrap_or_else(|_| "passthrough".to_string());

        let device = match std::env::var("STEMS_DEVICE") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "invalid STEMS_DEVICE, falling back to cpu");
                Device::Cpu
            }),
            Err(_) => Device::Cpu,
        };

        let port = std::env::var("STEMS_PORT")
            .ok()
            .or_else(|| std::env::var("PORT").ok())
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let workers = std::env::var("STEMS_WORKERS")
            .ok()
            .and_then(|w| w.parse().ok())
            .filter(|&w| w > 0)
            .unwrap_or(DEFAULT_WORKERS);

        Self {
            data_dir,
            model,
            device,
            port,
            workers,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            model: "passthrough".to_string(),
            device: Device::Cpu,
            port: DEFAULT_PORT,
            workers: DEFAULT_WORKERS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.model, "passthrough");
        assert_eq!(config.device, Device::Cpu);
        assert!(config.workers > 0);
    }
}
