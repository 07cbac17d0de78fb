//! MTD415T controller
//!
//! Typed access to the controller's settings and measurements on top of the
//! line protocol. All calls block the calling thread; one device owns its
//! link exclusively and has at most one request in flight.
//!
//! ```rust,no_run
//! use mtd415t_core::{DeviceConfig, Mtd415t};
//!
//! let mut controller = Mtd415t::from_config(&DeviceConfig::for_port("/dev/ttyUSB0"))?;
//! controller.set_temperature_setpoint(15.025)?;
//! println!("{}", controller.temperature()?);
//! # Ok::<(), mtd415t_core::DeviceError>(())
//! ```

use std::time::Duration;

use crate::config::DeviceConfig;
use crate::error::DeviceError;
use crate::error_register::ErrorRegister;
use crate::protocol::commands::{self, Command};
use crate::protocol::{
    open_file_sink, ByteLink, CommunicationLog, LogSink, ProtocolError, QueryThrottler,
    SerialLink, Session, MAX_QUERY_ATTEMPTS, RETRY_DELAY_MS,
};
use crate::reading::{Reading, UNAVAILABLE};
use crate::settings::{Measurement, Setting, SettingValue};

/// MTD415T temperature controller
pub struct Mtd415t<L: ByteLink = SerialLink> {
    session: Session<L>,
    throttler: QueryThrottler,
    auto_save: bool,
}

impl Mtd415t<SerialLink> {
    /// Controller on a serial port. The port is opened on first use.
    pub fn from_config(config: &DeviceConfig) -> Result<Self, DeviceError> {
        let link = SerialLink::new(config.port_name.clone(), Some(config.baud_rate));
        Self::with_link(link, config)
    }
}

macro_rules! setting_accessors {
    ($($(#[$doc:meta])* $setting:ident => $get:ident, $set:ident;)+) => {
        $(
            $(#[$doc])*
            pub fn $get(&mut self) -> Result<Reading<f64>, DeviceError> {
                self.get(Setting::$setting)
            }

            $(#[$doc])*
            pub fn $set(&mut self, value: impl Into<SettingValue>) -> Result<(), DeviceError> {
                self.set_setting(Setting::$setting, value)
            }
        )+
    };
}

impl<L: ByteLink> Mtd415t<L> {
    /// Controller over any link with default configuration
    pub fn new(link: L) -> Self {
        let config = DeviceConfig::default();
        Self {
            session: Session::new(link, config.timeout(), config.max_log_length),
            throttler: QueryThrottler::new(config.min_query_interval()),
            auto_save: config.auto_save,
        }
    }

    /// Controller over any link. Opens the log file named in `config`, if any.
    pub fn with_link(link: L, config: &DeviceConfig) -> Result<Self, DeviceError> {
        let mut session = Session::new(link, config.timeout(), config.max_log_length);
        if let Some(path) = &config.log_file {
            session.set_log_sink(open_file_sink(path)?);
        }

        Ok(Self {
            session,
            throttler: QueryThrottler::new(config.min_query_interval()),
            auto_save: config.auto_save,
        })
    }

    /// Mirror the communication log to `sink`
    pub fn set_log_sink(&mut self, sink: LogSink) {
        self.session.set_log_sink(sink);
    }

    /// Open the link
    pub fn open(&mut self) -> Result<(), DeviceError> {
        Ok(self.session.open()?)
    }

    /// Close the link
    pub fn close(&mut self) -> Result<(), DeviceError> {
        Ok(self.session.close()?)
    }

    /// Whether the link is open
    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    /// Underlying link
    pub fn link(&self) -> &L {
        self.session.link()
    }

    /// Read timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.session.timeout()
    }

    /// Change the read timeout
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.session.set_timeout(timeout);
    }

    /// Whether every successful set is followed by a save to flash
    pub fn auto_save(&self) -> bool {
        self.auto_save
    }

    /// Enable or disable auto-save
    pub fn set_auto_save(&mut self, auto_save: bool) {
        self.auto_save = auto_save;
    }

    /// Query a setting by wire code.
    ///
    /// With `retry`, a timeout or an "unknown command" answer is retried once
    /// after 100 ms; if that fails too the result is `None`.
    pub fn query(&mut self, code: &str, retry: bool) -> Result<Option<String>, ProtocolError> {
        let cmd = Command::query(code).encode();
        let attempts = if retry { MAX_QUERY_ATTEMPTS } else { 1 };

        for attempt in 1..=attempts {
            if attempt > 1 {
                tracing::debug!(code, attempt, "retrying query");
                std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS));
            }

            self.throttler.wait();
            let result = self.session.query(&cmd);
            self.throttler.mark();
            let response = result?;

            if !retry || !commands::is_retryable(response.as_deref()) {
                return Ok(response);
            }
        }

        Ok(None)
    }

    /// Send a raw line
    pub fn write(&mut self, data: &str) -> Result<(), ProtocolError> {
        self.session.write(data.as_bytes())
    }

    /// Read a raw line, `None` on timeout
    pub fn read(&mut self) -> Result<Option<String>, ProtocolError> {
        self.session.read()
    }

    /// Set a wire code to an integer and check the echoed confirmation.
    ///
    /// A timeout or a mismatching answer dumps the communication log and
    /// fails; the device's answer is carried in the error.
    pub fn set(&mut self, code: &str, value: i64) -> Result<(), ProtocolError> {
        self.session.write(&Command::set(code, value).encode())?;
        let confirmation = self.session.read()?;

        if let Err(e) = commands::check_confirmation(code, value, confirmation.as_deref()) {
            tracing::error!("{e}");
            self.session.print_dump_log();
            return Err(e);
        }

        if self.auto_save {
            tracing::warn!(
                "Using auto-save mode: every set writes to flash, repeated writes wear out the controller's flash memory."
            );
            self.save()?;
        }

        Ok(())
    }

    /// Save settings to non-volatile memory
    pub fn save(&mut self) -> Result<(), ProtocolError> {
        tracing::warn!("Saving config to flash memory.");
        self.session.write(&Command::Save.encode())?;
        // drain the answer
        self.session.read()?;
        Ok(())
    }

    /// Clear the error register
    pub fn clear_errors(&mut self) -> Result<(), ProtocolError> {
        self.session.write(&Command::ClearErrors.encode())?;
        self.session.read()?;
        Ok(())
    }

    /// Communication log
    pub fn log(&self) -> &CommunicationLog {
        self.session.log()
    }

    /// Newline-separated rendering of the communication log
    pub fn dump_log(&self) -> String {
        self.session.dump_log()
    }

    /// Print the communication log to stderr
    pub fn print_dump_log(&self) {
        self.session.print_dump_log();
    }

    fn query_text(&mut self, code: &str) -> Result<String, DeviceError> {
        Ok(match self.query(code, true)? {
            Some(line) => line.trim_end_matches(['\r', '\n']).to_string(),
            None => UNAVAILABLE.to_string(),
        })
    }

    fn query_integer(&mut self, code: &str, retry: bool) -> Result<Reading<i64>, DeviceError> {
        match self.query(code, retry)? {
            Some(line) => Ok(Reading::Value(commands::parse_integer(code, &line)?)),
            None => Ok(Reading::Unavailable),
        }
    }

    /// Product name and version number
    pub fn idn(&mut self) -> Result<String, DeviceError> {
        self.query_text("m")
    }

    /// Unique device identifier
    pub fn uid(&mut self) -> Result<String, DeviceError> {
        self.query_text("u")
    }

    /// Content of the error register
    pub fn error_register(&mut self) -> Result<Reading<ErrorRegister>, DeviceError> {
        let raw = match self.query_integer("E", true)? {
            Reading::Value(raw) => raw,
            Reading::Unavailable => return Ok(Reading::Unavailable),
        };
        let bits = u16::try_from(raw).map_err(|_| ProtocolError::InvalidResponse {
            command: "E".to_string(),
            response: raw.to_string(),
        })?;
        Ok(Reading::Value(ErrorRegister(bits)))
    }

    /// Error flags, bit 0 first
    pub fn error_flags(&mut self) -> Result<Reading<[bool; 16]>, DeviceError> {
        Ok(self.error_register()?.map(ErrorRegister::flags))
    }

    /// Names of the active error conditions
    pub fn errors(&mut self) -> Result<Reading<Vec<&'static str>>, DeviceError> {
        Ok(self.error_register()?.map(ErrorRegister::errors))
    }

    /// Read a measurement in physical units
    pub fn measure(&mut self, measurement: Measurement) -> Result<Reading<f64>, DeviceError> {
        Ok(self
            .query_integer(measurement.code(), measurement.retry())?
            .map(|raw| measurement.from_wire(raw)))
    }

    /// Current temperature in °C
    pub fn temperature(&mut self) -> Result<Reading<f64>, DeviceError> {
        self.measure(Measurement::Temperature)
    }

    /// TEC current in A
    pub fn tec_current(&mut self) -> Result<Reading<f64>, DeviceError> {
        self.measure(Measurement::TecCurrent)
    }

    /// TEC voltage in V
    pub fn tec_voltage(&mut self) -> Result<Reading<f64>, DeviceError> {
        self.measure(Measurement::TecVoltage)
    }

    /// Read a setting in physical units
    pub fn get(&mut self, setting: Setting) -> Result<Reading<f64>, DeviceError> {
        let descriptor = setting.descriptor();
        Ok(self
            .query_integer(descriptor.code, true)?
            .map(|raw| descriptor.from_wire(raw)))
    }

    /// Validate, scale and write a setting
    pub fn set_setting(
        &mut self,
        setting: Setting,
        value: impl Into<SettingValue>,
    ) -> Result<(), DeviceError> {
        let descriptor = setting.descriptor();
        let raw = descriptor.to_wire(&value.into())?;
        self.set(descriptor.code, raw)?;
        Ok(())
    }

    /// Delay for changing the status pin in s
    pub fn status_delay(&mut self) -> Result<Reading<i64>, DeviceError> {
        self.query_integer(Setting::StatusDelay.code(), true)
    }

    /// Delay for changing the status pin in s (1 to 32768)
    pub fn set_status_delay(&mut self, value: impl Into<SettingValue>) -> Result<(), DeviceError> {
        self.set_setting(Setting::StatusDelay, value)
    }

    setting_accessors! {
        /// Temperature setpoint in °C (5.000 to 45.000)
        TemperatureSetpoint => temperature_setpoint, set_temperature_setpoint;
        /// TEC current limit in A (0.200 to 2.000)
        TecCurrentLimit => tec_current_limit, set_tec_current_limit;
        /// Temperature window for the status pin in °C (0.001 to 32.768)
        StatusTemperatureWindow => status_temperature_window, set_status_temperature_window;
        /// Critical gain in A/K (0.010 to 100.000)
        CriticalGain => critical_gain, set_critical_gain;
        /// Critical period in s (0.100 to 100000.000)
        CriticalPeriod => critical_period, set_critical_period;
        /// Cycling time in s (0.001 to 1.000)
        CyclingTime => cycling_time, set_cycling_time;
        /// Proportional gain in A/K (0 to 100.000)
        ProportionalGain => p_gain, set_p_gain;
        /// Integral gain in A/(K·s) (0 to 100.000)
        IntegralGain => i_gain, set_i_gain;
        /// Differential gain in (A·s)/K (0 to 100.000)
        DifferentialGain => d_gain, set_d_gain;
    }
}
