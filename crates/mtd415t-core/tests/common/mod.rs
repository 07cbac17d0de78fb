use mtd415t_core::protocol::{MockHandle, MockLink};
use mtd415t_core::{DeviceConfig, Mtd415t};

/// Controller on a scripted link with a short read timeout
#[allow(dead_code)]
pub fn mock_device() -> (Mtd415t<MockLink>, MockHandle) {
    mock_device_with(DeviceConfig {
        timeout_ms: Some(20),
        ..DeviceConfig::default()
    })
}

#[allow(dead_code)]
pub fn mock_device_with(config: DeviceConfig) -> (Mtd415t<MockLink>, MockHandle) {
    let (link, handle) = MockLink::with_handle();
    let device = Mtd415t::with_link(link, &config).expect("mock device");
    (device, handle)
}
