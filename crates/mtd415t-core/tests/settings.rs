mod common;

use common::mock_device;
use mtd415t_core::protocol::ProtocolError;
use mtd415t_core::{DeviceError, Reading, Setting, SettingError, SettingValue};
use pretty_assertions::assert_eq;

fn in_range_samples(setting: Setting) -> Vec<f64> {
    let d = setting.descriptor();
    vec![d.min, (d.min + d.max) / 2.0, d.max]
}

#[test]
fn test_set_then_get_round_trips_within_one_step() {
    for setting in Setting::ALL {
        let d = setting.descriptor();
        for value in in_range_samples(setting) {
            let (mut device, handle) = mock_device();
            let raw = d.to_wire(&value.into()).unwrap();
            // echo on set, then the same integer on query
            handle.queue_replies([raw.to_string().as_str(), raw.to_string().as_str()]);

            device.set_setting(setting, value).unwrap();
            let read = device.get(setting).unwrap().value().unwrap();

            assert!(
                (read - value).abs() <= d.resolution(),
                "{}: wrote {value}, read {read}",
                d.name
            );
        }
    }
}

#[test]
fn test_out_of_range_never_transmits() {
    for setting in Setting::ALL {
        let d = setting.descriptor();
        for value in [d.min - 1.0, d.max + 1.0] {
            let (mut device, handle) = mock_device();
            let err = device.set_setting(setting, value).unwrap_err();
            assert!(
                matches!(
                    err,
                    DeviceError::Setting(
                        SettingError::BelowMinimum { .. } | SettingError::AboveMaximum { .. }
                    )
                ),
                "{}: {err}",
                d.name
            );
            assert!(handle.written().is_empty());
        }
    }
}

#[test]
fn test_non_numeric_is_type_error() {
    for setting in Setting::ALL {
        let (mut device, handle) = mock_device();
        let err = device
            .set_setting(setting, SettingValue::from("invalid"))
            .unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Setting(SettingError::InvalidType { .. })
        ));
        assert!(handle.written().is_empty());
    }
}

#[test]
fn test_set_temperature_setpoint_scenario() {
    let (mut device, handle) = mock_device();
    handle.queue_replies(["15025", "15020"]);

    device.set_temperature_setpoint(15.025).unwrap();
    assert_eq!(handle.last_written().as_deref(), Some("T15025\n"));

    assert_eq!(device.temperature().unwrap(), Reading::Value(15.02));
    assert_eq!(handle.last_written().as_deref(), Some("Te?\n"));
}

#[test]
fn test_tec_current_limit_below_minimum() {
    let (mut device, handle) = mock_device();

    let err = device.set_tec_current_limit(0.1).unwrap_err();

    assert_eq!(err.to_string(), "TEC current limit must be >= 0.2 A.");
    assert!(handle.written().is_empty());
    assert!(device.log().is_empty());
}

#[test]
fn test_typed_accessors_use_wire_codes() {
    let (mut device, handle) = mock_device();
    handle.queue_replies(["1234", "500", "50", "20", "100", "2", "3", "4"]);

    device.set_tec_current_limit(1.234).unwrap();
    device.set_status_temperature_window(0.5).unwrap();
    device.set_critical_gain(0.05).unwrap();
    device.set_cycling_time(0.02).unwrap();
    device.set_critical_period(0.1).unwrap();
    device.set_p_gain(0.002).unwrap();
    device.set_i_gain(0.003).unwrap();
    device.set_d_gain(0.004).unwrap();

    assert_eq!(
        handle.written(),
        vec!["L1234\n", "W500\n", "G50\n", "C20\n", "O100\n", "P2\n", "I3\n", "D4\n"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
}

#[test]
fn test_status_delay_is_plain_integer() {
    let (mut device, handle) = mock_device();
    handle.queue_replies(["10", "10"]);

    device.set_status_delay(10).unwrap();
    assert_eq!(handle.last_written().as_deref(), Some("d10\n"));
    assert_eq!(device.status_delay().unwrap(), Reading::Value(10));
}

#[test]
fn test_getters_query_wire_codes() {
    let (mut device, handle) = mock_device();
    handle.queue_replies(["2000", "5321", "5321"]);

    assert_eq!(device.tec_current_limit().unwrap(), Reading::Value(2.0));
    assert_eq!(device.temperature_setpoint().unwrap(), Reading::Value(5.321));
    assert_eq!(device.status_temperature_window().unwrap(), Reading::Value(5.321));

    assert_eq!(
        handle.written(),
        vec!["L?\n".to_string(), "T?\n".to_string(), "W?\n".to_string()]
    );
}

#[test]
fn test_set_timeout_is_fatal() {
    let (mut device, handle) = mock_device();
    handle.queue_silence();

    let err = device.set_temperature_setpoint(20).unwrap_err();
    assert!(matches!(
        err,
        DeviceError::Protocol(ProtocolError::SetTimeout { value: 20000, .. })
    ));
}

#[test]
fn test_status_delay_just_above_maximum_is_rejected() {
    let (mut device, handle) = mock_device();

    let err = device.set_status_delay(32768.5).unwrap_err();

    assert!(matches!(
        err,
        DeviceError::Setting(SettingError::AboveMaximum { .. })
    ));
    assert!(handle.written().is_empty());
}

#[test]
fn test_status_delay_rounds_to_nearest() {
    let (mut device, handle) = mock_device();
    handle.queue_replies(["11", "10", "12"]);

    device.set_status_delay(10.9).unwrap();
    device.set_status_delay(10.5).unwrap();
    device.set_status_delay(11.5).unwrap();

    assert_eq!(
        handle.written(),
        vec!["d11\n".to_string(), "d10\n".to_string(), "d12\n".to_string()]
    );
}
