//! Settings model
//!
//! Descriptor table of every writable controller setting together with the
//! conversion between physical values and the fixed-point integers sent on
//! the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fixed-point multiplier used by scaled settings
pub const SCALE_FACTOR: i64 = 1000;

/// Errors raised before anything is transmitted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingError {
    #[error("{name} must be an integer or float")]
    InvalidType { name: &'static str },

    #[error("{name} must be >= {min}{unit}.")]
    BelowMinimum {
        name: &'static str,
        min: f64,
        unit: &'static str,
    },

    #[error("{name} must be <= {max}{unit}.")]
    AboveMaximum {
        name: &'static str,
        max: f64,
        unit: &'static str,
    },
}

/// Value handed to a setter
///
/// Only `Integer` and `Float` are accepted; the other variants exist so that
/// callers forwarding untyped input get a descriptive error instead of a
/// silent conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// Whole number
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Boolean, rejected
    Bool(bool),
    /// Text, rejected
    Text(String),
}

impl SettingValue {
    /// Numeric value, `None` for non-numeric or non-finite input
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Integer(v) => Some(*v as f64),
            SettingValue::Float(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

macro_rules! setting_value_from {
    ($variant:ident, $($ty:ty),+) => {
        $(impl From<$ty> for SettingValue {
            fn from(v: $ty) -> Self {
                SettingValue::$variant(v.into())
            }
        })+
    };
}

setting_value_from!(Integer, i8, i16, i32, i64, u8, u16, u32);
setting_value_from!(Float, f32, f64);
setting_value_from!(Bool, bool);
setting_value_from!(Text, String, &str);

/// Immutable metadata of one setting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingDescriptor {
    /// Human readable name used in error messages
    pub name: &'static str,
    /// Wire code, e.g. `T`
    pub code: &'static str,
    /// Fixed-point multiplier, 1 for unscaled settings
    pub scale: i64,
    /// Inclusive lower bound in physical units
    pub min: f64,
    /// Inclusive upper bound in physical units
    pub max: f64,
    /// Unit label appended to the bound in error messages
    pub unit: &'static str,
    /// Plain integer setting (no fixed-point scaling)
    pub integer: bool,
}

impl SettingDescriptor {
    const fn scaled(
        name: &'static str,
        code: &'static str,
        min: f64,
        max: f64,
        unit: &'static str,
    ) -> Self {
        Self {
            name,
            code,
            scale: SCALE_FACTOR,
            min,
            max,
            unit,
            integer: false,
        }
    }

    /// Validate a physical value and convert it to its wire integer
    pub fn to_wire(&self, value: &SettingValue) -> Result<i64, SettingError> {
        let value = value
            .as_f64()
            .ok_or(SettingError::InvalidType { name: self.name })?;

        if value < self.min {
            return Err(SettingError::BelowMinimum {
                name: self.name,
                min: self.min,
                unit: self.unit,
            });
        }
        if value > self.max {
            return Err(SettingError::AboveMaximum {
                name: self.name,
                max: self.max,
                unit: self.unit,
            });
        }

        // ties go to the even integer
        Ok((value * self.scale as f64).round_ties_even() as i64)
    }

    /// Convert a wire integer back to the physical value
    pub fn from_wire(&self, raw: i64) -> f64 {
        raw as f64 / self.scale as f64
    }

    /// Smallest representable step in physical units
    pub fn resolution(&self) -> f64 {
        1.0 / self.scale as f64
    }
}

static DESCRIPTORS: [SettingDescriptor; 10] = [
    SettingDescriptor::scaled("Temperature setpoint", "T", 5.0, 45.0, "°C"),
    SettingDescriptor::scaled("TEC current limit", "L", 0.2, 2.0, " A"),
    SettingDescriptor::scaled("Status temperature window", "W", 1e-3, 32.768, "°C"),
    SettingDescriptor {
        name: "Status delay",
        code: "d",
        scale: 1,
        min: 1.0,
        max: 32768.0,
        unit: " s",
        integer: true,
    },
    SettingDescriptor::scaled("Critical gain", "G", 10e-3, 100.0, " A/K"),
    SettingDescriptor::scaled("Critical period", "O", 100e-3, 100e3, " s"),
    SettingDescriptor::scaled("Cycling time", "C", 1e-3, 1.0, " s"),
    SettingDescriptor::scaled("P gain", "P", 0.0, 100.0, " A/K"),
    SettingDescriptor::scaled("I gain", "I", 0.0, 100.0, " A/(K x s)"),
    SettingDescriptor::scaled("D gain", "D", 0.0, 100.0, " (A x s)/K"),
];

/// Writable controller settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Setting {
    /// Temperature setpoint in °C
    TemperatureSetpoint,
    /// TEC current limit in A
    TecCurrentLimit,
    /// Temperature window of the status pin in °C
    StatusTemperatureWindow,
    /// Delay before the status pin changes, in s
    StatusDelay,
    /// Critical gain in A/K
    CriticalGain,
    /// Critical period in s
    CriticalPeriod,
    /// Cycling time in s
    CyclingTime,
    /// Proportional gain in A/K
    ProportionalGain,
    /// Integral gain in A/(K·s)
    IntegralGain,
    /// Differential gain in (A·s)/K
    DifferentialGain,
}

impl Setting {
    /// Every setting, in descriptor table order
    pub const ALL: [Setting; 10] = [
        Setting::TemperatureSetpoint,
        Setting::TecCurrentLimit,
        Setting::StatusTemperatureWindow,
        Setting::StatusDelay,
        Setting::CriticalGain,
        Setting::CriticalPeriod,
        Setting::CyclingTime,
        Setting::ProportionalGain,
        Setting::IntegralGain,
        Setting::DifferentialGain,
    ];

    /// Descriptor of this setting
    pub fn descriptor(self) -> &'static SettingDescriptor {
        &DESCRIPTORS[self as usize]
    }

    /// Wire code of this setting
    pub fn code(self) -> &'static str {
        self.descriptor().code
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().name)
    }
}

/// Read-only measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    /// Measured temperature in °C
    Temperature,
    /// TEC current in A
    TecCurrent,
    /// TEC voltage in V
    TecVoltage,
}

impl Measurement {
    /// Wire code of this measurement
    pub fn code(self) -> &'static str {
        match self {
            Measurement::Temperature => "Te",
            Measurement::TecCurrent => "A",
            Measurement::TecVoltage => "U",
        }
    }

    /// Whether a failed query is retried once
    pub fn retry(self) -> bool {
        !matches!(self, Measurement::TecVoltage)
    }

    /// Convert a wire integer to the physical value
    pub fn from_wire(self, raw: i64) -> f64 {
        raw as f64 / SCALE_FACTOR as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_order_matches_enum() {
        let codes: Vec<_> = Setting::ALL.iter().map(|s| s.code()).collect();
        assert_eq!(
            codes,
            vec!["T", "L", "W", "d", "G", "O", "C", "P", "I", "D"]
        );
    }

    #[test]
    fn test_scales_setpoint() {
        let d = Setting::TemperatureSetpoint.descriptor();
        assert_eq!(d.to_wire(&15.025.into()), Ok(15025));
        assert_eq!(d.to_wire(&5.into()), Ok(5000));
        assert_eq!(d.to_wire(&45.0.into()), Ok(45000));
        assert_eq!(d.from_wire(15020), 15.02);
    }

    #[test]
    fn test_rounds_to_nearest() {
        let d = Setting::TecCurrentLimit.descriptor();
        assert_eq!(d.to_wire(&1.2344.into()), Ok(1234));
        assert_eq!(d.to_wire(&1.2346.into()), Ok(1235));
    }

    #[test]
    fn test_range_errors_name_bound_and_unit() {
        let d = Setting::TecCurrentLimit.descriptor();
        let err = d.to_wire(&0.1.into()).unwrap_err();
        assert_eq!(err.to_string(), "TEC current limit must be >= 0.2 A.");

        let err = d.to_wire(&3.0.into()).unwrap_err();
        assert_eq!(err.to_string(), "TEC current limit must be <= 2 A.");
    }

    #[test]
    fn test_rejects_non_numeric() {
        for setting in Setting::ALL {
            let d = setting.descriptor();
            for value in [
                SettingValue::from("invalid"),
                SettingValue::from(true),
                SettingValue::from(f64::NAN),
                SettingValue::from(f64::INFINITY),
            ] {
                assert_eq!(
                    d.to_wire(&value),
                    Err(SettingError::InvalidType { name: d.name })
                );
            }
        }
    }

    #[test]
    fn test_bounds_are_inclusive() {
        for setting in Setting::ALL {
            let d = setting.descriptor();
            assert!(d.to_wire(&d.min.into()).is_ok(), "{} min", d.name);
            assert!(d.to_wire(&d.max.into()).is_ok(), "{} max", d.name);
        }
    }

    #[test]
    fn test_status_delay_is_unscaled_and_rounded() {
        let d = Setting::StatusDelay.descriptor();
        assert!(d.integer);
        assert_eq!(d.to_wire(&10.into()), Ok(10));
        assert_eq!(d.to_wire(&10.9.into()), Ok(11));
        assert_eq!(d.to_wire(&10.5.into()), Ok(10));
        assert_eq!(d.to_wire(&11.5.into()), Ok(12));
        assert!(matches!(
            d.to_wire(&32768.5.into()),
            Err(SettingError::AboveMaximum { .. })
        ));
        assert_eq!(d.from_wire(10), 10.0);
        assert!(matches!(
            d.to_wire(&0.5.into()),
            Err(SettingError::BelowMinimum { .. })
        ));
    }

    #[test]
    fn test_measurements() {
        assert_eq!(Measurement::Temperature.code(), "Te");
        assert_eq!(Measurement::TecVoltage.from_wire(621), 0.621);
        assert!(Measurement::TecCurrent.retry());
        assert!(!Measurement::TecVoltage.retry());
    }
}
