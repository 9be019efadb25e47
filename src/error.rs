use crate::config::ConfigError;

/// Errors that stop the overlay process. Connection problems never reach
/// here; the transport recovers from those on its own.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
