//! # MTD415T Core Library
//!
//! Driver for the Thorlabs MTD415T thermoelectric temperature controller.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - The newline-terminated ASCII protocol (queries, set-and-confirm, save)
//! - A bounded communication log with an optional JSON-lines sink
//! - Query throttling and single retry of transient failures
//! - Typed, range-checked access to every controller setting
//! - Decoding of the 16-bit error register
//!
//! ## Example
//!
//! ```rust,ignore
//! use mtd415t_core::{DeviceConfig, Mtd415t};
//!
//! let mut controller = Mtd415t::from_config(&DeviceConfig::for_port("/dev/ttyUSB0"))?;
//! controller.set_temperature_setpoint(15.025)?;
//! std::thread::sleep(std::time::Duration::from_secs(10));
//! println!("{}", controller.temperature()?); // 15.02
//! ```

pub mod config;
pub mod device;
mod error;
pub mod error_register;
pub mod protocol;
pub mod reading;
pub mod settings;

pub use config::{ConfigError, DeviceConfig};
pub use device::Mtd415t;
pub use error::DeviceError;
pub use error_register::ErrorRegister;
pub use reading::{Reading, UNAVAILABLE};
pub use settings::{Measurement, Setting, SettingDescriptor, SettingError, SettingValue};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::protocol::{ByteLink, MockLink, ProtocolError, SerialLink};
    pub use crate::{
        DeviceConfig, DeviceError, ErrorRegister, Measurement, Mtd415t, Reading, Setting,
        SettingValue,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
