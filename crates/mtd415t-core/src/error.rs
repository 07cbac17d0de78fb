//! Device-level errors

use thiserror::Error;

use crate::config::ConfigError;
use crate::protocol::ProtocolError;
use crate::settings::SettingError;

/// Errors returned by [`Mtd415t`](crate::Mtd415t)
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Transport failure or rejected set command
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Input rejected before transmission
    #[error(transparent)]
    Setting(#[from] SettingError),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}
