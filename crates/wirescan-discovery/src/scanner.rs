//! Bus scanner that presence-tests every address and identifies what answered

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wirescan_bus::{read_register, Bus, RegisterWidth, TransmissionStatus};
use wirescan_core::address::{self, HexAddr};
use wirescan_core::{
    BusId, DeviceKind, DeviceRecord, DiscoveryResult, KeyboardModel, ScreenModel, ScreenState,
    SensorKind,
};

use crate::probe::probe_display;
use crate::rtc::{configure_clock, ClockVariant};
use crate::secure_element::{report_secure_element, SecureElement};

/// BME chip-id register
const BME_ID_REGISTER: u8 = 0xD0;
const BME680_CHIP_ID: u16 = 0x61;
const BME280_CHIP_ID: u16 = 0x60;

/// INA manufacturer-id register
const INA_MFG_ID_REGISTER: u8 = 0xFE;
/// "TI" in ASCII
const INA260_MFG_ID: u16 = 0x5449;

/// Keypad firmware version register
const KEYPAD_VERSION_REGISTER: u8 = 0x04;
const RAK14004_KEYPAD_VERSION: u16 = 0x02;

/// Sensors identified by address alone
const FIXED_IDENTITY_SENSORS: &[(u8, SensorKind)] = &[
    (address::MCP9808_ADDR, SensorKind::Mcp9808),
    (address::SHTC3_ADDR, SensorKind::Shtc3),
    (address::LPS22HB_ADDR, SensorKind::Lps22),
    (address::LPS22HB_ADDR_ALT, SensorKind::Lps22),
    (address::QMC6310_ADDR, SensorKind::Qmc6310),
    (address::QMI8658_ADDR, SensorKind::Qmi8658),
    (address::QMC5883L_ADDR, SensorKind::Qmc5883l),
];

/// Optional rule groups, depending on what the board carries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Identify and report an ATECC608B secure element
    #[serde(default)]
    pub secure_element: bool,
    /// Real-time clock variant to look for
    #[serde(default)]
    pub clock: ClockVariant,
    /// Report an AXP192/AXP2101 power-management unit
    #[serde(default)]
    pub pmu: bool,
}

/// Summary of one scan pass over one bus
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Bus that was scanned
    pub bus: BusId,
    /// Number of addresses that acknowledged
    pub found: usize,
    /// Addresses that failed with an unknown bus error
    pub unknown_errors: Vec<u8>,
    /// When the sweep finished
    pub completed_at: DateTime<Utc>,
}

/// State that only lives for one scan pass
#[derive(Debug, Default)]
struct Pass {
    screen_claimed: bool,
}

/// I2C bus scanner
pub struct Scanner {
    config: ScannerConfig,
    secure_element: Option<Box<dyn SecureElement>>,
}

impl Scanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            secure_element: None,
        }
    }

    /// Attach the driver used when the secure-element rule matches
    pub fn with_secure_element(mut self, element: Box<dyn SecureElement>) -> Self {
        self.secure_element = Some(element);
        self
    }

    /// Get current config
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Sweep addresses 1 to 126 once, recording every device that answers
    ///
    /// Existing entries in `result` are overwritten, never removed.
    pub fn scan<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        bus_id: BusId,
        result: &mut DiscoveryResult,
    ) -> ScanReport {
        let mut pass = Pass::default();
        let mut found = 0;
        let mut unknown_errors = Vec::new();

        debug!(bus = %bus_id, "Starting I2C scan");

        for addr in address::scan_range() {
            bus.begin_transmission(addr);
            match bus.end_transmission() {
                TransmissionStatus::Success => {
                    info!(bus = %bus_id, address = %HexAddr(addr), "I2C device found");
                    result.record_device(DeviceRecord::new(addr, bus_id));
                    found += 1;

                    if let Some(kind) = self.identify(bus, addr, &mut pass, result) {
                        result.set_device_kind(addr, kind);
                    }
                }
                TransmissionStatus::Other => {
                    warn!(bus = %bus_id, address = %HexAddr(addr), "Unknown error at address");
                    unknown_errors.push(addr);
                }
                _ => {}
            }
        }

        if found == 0 {
            info!(bus = %bus_id, "No I2C devices found");
        } else {
            info!(bus = %bus_id, "{} I2C devices found", found);
        }

        ScanReport {
            bus: bus_id,
            found,
            unknown_errors,
            completed_at: Utc::now(),
        }
    }

    /// Run every rule group against a responding address
    ///
    /// Groups cover disjoint addresses on supported boards, so at most one
    /// matches; if several did, the last one decides the device kind.
    fn identify<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        addr: u8,
        pass: &mut Pass,
        result: &mut DiscoveryResult,
    ) -> Option<DeviceKind> {
        let mut kind = None;

        if addr == address::SSD1306_ADDR {
            kind = Some(identify_display(bus, addr, pass, result));
        }
        if self.config.secure_element && addr == address::ATECC608B_ADDR {
            kind = Some(self.identify_secure_element(addr));
        }
        if let Some(model) = self.config.clock.model() {
            if self.config.clock.address() == Some(addr) {
                configure_clock(bus, model, addr);
                kind = Some(DeviceKind::Rtc(model));
            }
        }
        if addr == address::CARDKB_ADDR {
            kind = Some(identify_keyboard(bus, addr, result));
        }
        if addr == address::ST7567_ADDR {
            info!(address = %HexAddr(addr), "st7567 display found");
            claim_screen(pass, result, addr, ScreenModel::Unknown);
            kind = Some(DeviceKind::MonochromeDisplay);
        }
        if self.config.pmu && addr == address::AXP_PMU_ADDR {
            info!(address = %HexAddr(addr), "axp192/axp2101 PMU found");
            kind = Some(DeviceKind::Pmu);
        }
        if addr == address::BME_ADDR || addr == address::BME_ADDR_ALT {
            kind = Some(identify_environmental(bus, addr, result));
        }
        if addr == address::INA_ADDR || addr == address::INA_ADDR_ALT {
            kind = Some(identify_power_monitor(bus, addr, result));
        }
        if let Some(&(_, sensor)) = FIXED_IDENTITY_SENSORS.iter().find(|(a, _)| *a == addr) {
            if sensor.is_high_rate() {
                info!(address = %HexAddr(addr), sensor = %sensor, "High-rate sensor found");
            } else {
                info!(address = %HexAddr(addr), sensor = %sensor, "Sensor found");
            }
            result.record_sensor(sensor, addr);
            kind = Some(DeviceKind::Sensor(sensor));
        }

        kind
    }

    fn identify_secure_element(&mut self, addr: u8) -> DeviceKind {
        match self.secure_element.as_deref_mut() {
            Some(element) => {
                report_secure_element(element, addr);
            }
            None => warn!(
                address = %HexAddr(addr),
                "Secure element answered but no driver is attached"
            ),
        }
        DeviceKind::SecureElement
    }
}

/// SSD1306 and SH1106 share the display address; the status register decides
fn identify_display<B: Bus + ?Sized>(
    bus: &mut B,
    addr: u8,
    pass: &mut Pass,
    result: &mut DiscoveryResult,
) -> DeviceKind {
    let model = probe_display(bus, addr);
    match model {
        ScreenModel::Ssd1306 => info!(address = %HexAddr(addr), "ssd1306 display found"),
        ScreenModel::Sh1106 => info!(address = %HexAddr(addr), "sh1106 display found"),
        ScreenModel::Unknown => info!(address = %HexAddr(addr), "unknown display found"),
    }
    claim_screen(pass, result, addr, model);
    DeviceKind::Display(model)
}

/// Set the screen unless an earlier address claimed it during this pass
fn claim_screen(pass: &mut Pass, result: &mut DiscoveryResult, addr: u8, model: ScreenModel) {
    if pass.screen_claimed {
        debug!(address = %HexAddr(addr), "Screen already claimed in this pass");
        return;
    }
    pass.screen_claimed = true;
    result.set_screen(ScreenState {
        address: addr,
        model,
    });
}

/// CardKB and RAK14004 share an address; the keypad reports its version at 0x04
fn identify_keyboard<B: Bus + ?Sized>(
    bus: &mut B,
    addr: u8,
    result: &mut DiscoveryResult,
) -> DeviceKind {
    let value = read_register(bus, addr, KEYPAD_VERSION_REGISTER, RegisterWidth::Byte);
    let model = if value == RAK14004_KEYPAD_VERSION {
        info!(address = %HexAddr(addr), "RAK14004 found");
        KeyboardModel::Rak14004
    } else {
        info!(address = %HexAddr(addr), "m5 cardKB found");
        KeyboardModel::CardKb
    };
    result.set_keyboard(model);
    DeviceKind::Keyboard(model)
}

/// BME680, BME280 and BMP280 share addresses; anything without a BME chip id is a BMP280
fn identify_environmental<B: Bus + ?Sized>(
    bus: &mut B,
    addr: u8,
    result: &mut DiscoveryResult,
) -> DeviceKind {
    let value = read_register(bus, addr, BME_ID_REGISTER, RegisterWidth::Byte);
    let sensor = match value {
        BME680_CHIP_ID => SensorKind::Bme680,
        BME280_CHIP_ID => SensorKind::Bme280,
        _ => SensorKind::Bmp280,
    };
    info!(address = %HexAddr(addr), sensor = %sensor, chip_id = value, "Sensor found");
    result.record_sensor(sensor, addr);
    DeviceKind::Sensor(sensor)
}

/// INA260 reports a TI manufacturer id; anything else is assumed to be an INA219
fn identify_power_monitor<B: Bus + ?Sized>(
    bus: &mut B,
    addr: u8,
    result: &mut DiscoveryResult,
) -> DeviceKind {
    let value = read_register(bus, addr, INA_MFG_ID_REGISTER, RegisterWidth::Word);
    debug!(address = %HexAddr(addr), mfg_id = %format!("{:#x}", value), "Register MFG_UID");
    let sensor = if value == INA260_MFG_ID {
        SensorKind::Ina260
    } else {
        SensorKind::Ina219
    };
    info!(address = %HexAddr(addr), sensor = %sensor, "Sensor found");
    result.record_sensor(sensor, addr);
    DeviceKind::Sensor(sensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secure_element::tests::FakeSecureElement;
    use crate::secure_element::{SecureElementConfig, SecureElementError};
    use std::cell::RefCell;
    use std::rc::Rc;
    use wirescan_bus::{SimulatedBus, SimulatedDevice, Transaction};
    use wirescan_core::RtcModel;

    fn scan(bus: &mut SimulatedBus, config: ScannerConfig) -> (DiscoveryResult, ScanReport) {
        let mut result = DiscoveryResult::new();
        let report = Scanner::new(config).scan(bus, BusId(0), &mut result);
        (result, report)
    }

    fn bus_with(devices: Vec<SimulatedDevice>) -> SimulatedBus {
        let mut bus = SimulatedBus::new();
        for device in devices {
            bus.add_device(device);
        }
        bus
    }

    #[test]
    fn test_probes_every_address_once_in_order() {
        let mut bus = SimulatedBus::new();
        let (result, report) = scan(&mut bus, ScannerConfig::default());

        let probed = bus.probed_addresses();
        assert_eq!(probed, (1..=126).collect::<Vec<u8>>());
        assert_eq!(report.found, 0);
        assert!(result.is_empty());
    }

    #[test]
    fn test_never_touches_reserved_addresses() {
        let mut bus = bus_with(vec![
            SimulatedDevice::new(0x3C).with_register(0x00, vec![0x07]),
            SimulatedDevice::new(0x40).with_register(0xFE, vec![0x54, 0x49]),
            SimulatedDevice::new(0x76).with_register(0xD0, vec![0x61]),
            SimulatedDevice::new(0x5F).with_register(0x04, vec![0x02]),
        ]);
        scan(&mut bus, ScannerConfig::default());

        let touched = bus.touched_addresses();
        assert!(!touched.is_empty());
        assert!(touched.iter().all(|&a| (1..=126).contains(&a)));
    }

    #[test]
    fn test_pmu_address_without_pmu_config() {
        let mut bus = bus_with(vec![SimulatedDevice::new(0x34)]);
        let (result, report) = scan(&mut bus, ScannerConfig::default());

        assert_eq!(report.found, 1);
        assert_eq!(result.device(0x34).unwrap().kind, DeviceKind::Unidentified);
        assert!(result.sensors.is_empty());
        assert!(result.screen.is_none());
        assert!(result.keyboard.is_none());
    }

    #[test]
    fn test_pmu_address_with_pmu_config() {
        let mut bus = bus_with(vec![SimulatedDevice::new(0x34)]);
        let config = ScannerConfig {
            pmu: true,
            ..Default::default()
        };
        let (result, _) = scan(&mut bus, config);

        assert_eq!(result.device(0x34).unwrap().kind, DeviceKind::Pmu);
        assert!(result.sensors.is_empty());
    }

    #[test]
    fn test_ina260_identified_by_manufacturer_id() {
        let mut bus = bus_with(vec![
            SimulatedDevice::new(0x40).with_register(0xFE, vec![0x54, 0x49])
        ]);
        let (result, _) = scan(&mut bus, ScannerConfig::default());

        assert_eq!(result.sensor_address(SensorKind::Ina260), Some(0x40));
        assert_eq!(result.sensor_address(SensorKind::Ina219), None);
        assert_eq!(
            result.device(0x40).unwrap().kind,
            DeviceKind::Sensor(SensorKind::Ina260)
        );
    }

    #[test]
    fn test_ina219_is_the_fallback() {
        let mut bus = bus_with(vec![
            SimulatedDevice::new(0x41).with_register(0xFE, vec![0x00, 0x00])
        ]);
        let (result, _) = scan(&mut bus, ScannerConfig::default());

        assert_eq!(result.sensor_address(SensorKind::Ina219), Some(0x41));
        assert_eq!(result.sensor_address(SensorKind::Ina260), None);
    }

    #[test]
    fn test_environmental_sensor_branches() {
        for (chip_id, expected) in [
            (0x61, SensorKind::Bme680),
            (0x60, SensorKind::Bme280),
            (0x00, SensorKind::Bmp280),
        ] {
            let mut bus = bus_with(vec![
                SimulatedDevice::new(0x76).with_register(0xD0, vec![chip_id])
            ]);
            let (result, _) = scan(&mut bus, ScannerConfig::default());

            assert_eq!(result.sensors.len(), 1, "chip id {:#x}", chip_id);
            assert_eq!(result.sensor_address(expected), Some(0x76));
        }
    }

    #[test]
    fn test_environmental_sensor_at_alternate_address() {
        let mut bus = bus_with(vec![
            SimulatedDevice::new(0x77).with_register(0xD0, vec![0x60])
        ]);
        let (result, _) = scan(&mut bus, ScannerConfig::default());
        assert_eq!(result.sensor_address(SensorKind::Bme280), Some(0x77));
    }

    #[test]
    fn test_later_address_wins_for_same_sensor_kind() {
        let mut bus = bus_with(vec![
            SimulatedDevice::new(0x76).with_register(0xD0, vec![0x60]),
            SimulatedDevice::new(0x77).with_register(0xD0, vec![0x60]),
        ]);
        let (result, _) = scan(&mut bus, ScannerConfig::default());

        assert_eq!(result.sensor_address(SensorKind::Bme280), Some(0x77));
        assert_eq!(result.device_count(), 2);
    }

    #[test]
    fn test_keyboard_variants() {
        let mut bus = bus_with(vec![
            SimulatedDevice::new(0x5F).with_register(0x04, vec![0x02])
        ]);
        let (result, _) = scan(&mut bus, ScannerConfig::default());
        assert_eq!(result.keyboard, Some(KeyboardModel::Rak14004));

        let mut bus = bus_with(vec![
            SimulatedDevice::new(0x5F).with_register(0x04, vec![0x01])
        ]);
        let (result, _) = scan(&mut bus, ScannerConfig::default());
        assert_eq!(result.keyboard, Some(KeyboardModel::CardKb));

        // Keyboard without the version register reads zero
        let mut bus = bus_with(vec![SimulatedDevice::new(0x5F)]);
        let (result, _) = scan(&mut bus, ScannerConfig::default());
        assert_eq!(result.keyboard, Some(KeyboardModel::CardKb));
    }

    #[test]
    fn test_display_probe_sets_screen() {
        let mut bus = bus_with(vec![
            SimulatedDevice::new(0x3C).with_register(0x00, vec![0x07])
        ]);
        let (result, _) = scan(&mut bus, ScannerConfig::default());

        assert_eq!(
            result.screen,
            Some(ScreenState {
                address: 0x3C,
                model: ScreenModel::Ssd1306,
            })
        );
        assert_eq!(
            result.device(0x3C).unwrap().kind,
            DeviceKind::Display(ScreenModel::Ssd1306)
        );
    }

    #[test]
    fn test_monochrome_display_sets_address_only() {
        let mut bus = bus_with(vec![SimulatedDevice::new(0x3F)]);
        let (result, _) = scan(&mut bus, ScannerConfig::default());

        assert_eq!(
            result.screen,
            Some(ScreenState {
                address: 0x3F,
                model: ScreenModel::Unknown,
            })
        );
        // No subtype probe on the monochrome address
        assert_eq!(
            bus.touched_addresses().iter().filter(|&&a| a == 0x3F).count(),
            1
        );
    }

    #[test]
    fn test_first_display_claims_screen() {
        let mut bus = bus_with(vec![
            SimulatedDevice::new(0x3C).with_register(0x00, vec![0x08]),
            SimulatedDevice::new(0x3F),
        ]);
        let (result, _) = scan(&mut bus, ScannerConfig::default());

        assert_eq!(
            result.screen,
            Some(ScreenState {
                address: 0x3C,
                model: ScreenModel::Sh1106,
            })
        );
        assert_eq!(result.device(0x3F).unwrap().kind, DeviceKind::MonochromeDisplay);
    }

    #[test]
    fn test_fixed_identity_sensors() {
        let mut bus = bus_with(
            [0x18, 0x70, 0x5C, 0x1C, 0x6B, 0x0D]
                .into_iter()
                .map(SimulatedDevice::new)
                .collect(),
        );
        let (result, report) = scan(&mut bus, ScannerConfig::default());

        assert_eq!(report.found, 6);
        assert_eq!(result.sensor_address(SensorKind::Mcp9808), Some(0x18));
        assert_eq!(result.sensor_address(SensorKind::Shtc3), Some(0x70));
        assert_eq!(result.sensor_address(SensorKind::Lps22), Some(0x5C));
        assert_eq!(result.sensor_address(SensorKind::Qmc6310), Some(0x1C));
        assert_eq!(result.sensor_address(SensorKind::Qmi8658), Some(0x6B));
        assert_eq!(result.sensor_address(SensorKind::Qmc5883l), Some(0x0D));

        // Address alone identifies these, no register traffic
        assert!(!bus
            .transcript()
            .iter()
            .any(|t| matches!(t, Transaction::RequestFrom { .. })));
    }

    #[test]
    fn test_unknown_error_is_reported_not_recorded() {
        let mut bus = bus_with(vec![
            SimulatedDevice::new(0x20).with_status(TransmissionStatus::Other),
            SimulatedDevice::new(0x21).with_status(TransmissionStatus::Timeout),
            SimulatedDevice::new(0x18),
        ]);
        let (result, report) = scan(&mut bus, ScannerConfig::default());

        assert_eq!(report.found, 1);
        assert_eq!(report.unknown_errors, vec![0x20]);
        assert!(result.device(0x20).is_none());
        assert!(result.device(0x21).is_none());
        assert!(result.device(0x18).is_some());
    }

    #[test]
    fn test_unrecognised_status_is_silent_absence() {
        let mut bus = SimulatedBus::from_toml(
            r#"
[[device]]
address = 0x20
status = 7

[[device]]
address = 0x21
status = 4
"#,
        )
        .unwrap();
        let (result, report) = scan(&mut bus, ScannerConfig::default());

        assert_eq!(report.found, 0);
        assert_eq!(report.unknown_errors, vec![0x21]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_scan_is_idempotent() {
        let mut bus = bus_with(vec![
            SimulatedDevice::new(0x3C).with_register(0x00, vec![0x07]),
            SimulatedDevice::new(0x40).with_register(0xFE, vec![0x54, 0x49]),
            SimulatedDevice::new(0x76).with_register(0xD0, vec![0x61]),
            SimulatedDevice::new(0x5F).with_register(0x04, vec![0x02]),
            SimulatedDevice::new(0x70),
        ]);
        let mut scanner = Scanner::new(ScannerConfig::default());
        let mut result = DiscoveryResult::new();

        scanner.scan(&mut bus, BusId(0), &mut result);
        let first = result.clone();
        scanner.scan(&mut bus, BusId(0), &mut result);

        assert_eq!(result, first);
        assert_eq!(result.device_count(), 5);
    }

    #[test]
    fn test_second_pass_can_claim_screen_again() {
        let mut scanner = Scanner::new(ScannerConfig::default());
        let mut result = DiscoveryResult::new();

        let mut bus = bus_with(vec![
            SimulatedDevice::new(0x3C).with_register(0x00, vec![0x07])
        ]);
        scanner.scan(&mut bus, BusId(0), &mut result);

        let mut other = bus_with(vec![SimulatedDevice::new(0x3F)]);
        scanner.scan(&mut other, BusId(1), &mut result);

        assert_eq!(result.screen.unwrap().address, 0x3F);
    }

    #[test]
    fn test_stale_entries_survive_rescan() {
        let mut scanner = Scanner::new(ScannerConfig::default());
        let mut result = DiscoveryResult::new();

        let mut bus = bus_with(vec![SimulatedDevice::new(0x70)]);
        scanner.scan(&mut bus, BusId(0), &mut result);

        bus.remove_device(0x70);
        let report = scanner.scan(&mut bus, BusId(0), &mut result);

        assert_eq!(report.found, 0);
        assert!(result.device(0x70).is_some());
        assert_eq!(result.sensor_address(SensorKind::Shtc3), Some(0x70));
    }

    #[test]
    fn test_records_bus_id() {
        let mut bus = bus_with(vec![SimulatedDevice::new(0x18)]);
        let mut result = DiscoveryResult::new();
        let report = Scanner::new(ScannerConfig::default()).scan(&mut bus, BusId(1), &mut result);

        assert_eq!(report.bus, BusId(1));
        assert_eq!(result.device(0x18).unwrap().bus, BusId(1));
    }

    #[test]
    fn test_rtc_rules() {
        let mut bus = bus_with(vec![SimulatedDevice::new(0x52), SimulatedDevice::new(0x51)]);
        let config = ScannerConfig {
            clock: ClockVariant::Rv3028,
            ..Default::default()
        };
        let (result, _) = scan(&mut bus, config);

        assert_eq!(bus.register_writes(), &[(0x52, 0x35, 0x07), (0x52, 0x37, 0xB4)]);
        assert_eq!(
            result.device(0x52).unwrap().kind,
            DeviceKind::Rtc(RtcModel::Rv3028)
        );
        assert_eq!(result.device(0x51).unwrap().kind, DeviceKind::Unidentified);

        let mut bus = bus_with(vec![SimulatedDevice::new(0x52), SimulatedDevice::new(0x51)]);
        let config = ScannerConfig {
            clock: ClockVariant::Pcf8563,
            ..Default::default()
        };
        let (result, _) = scan(&mut bus, config);

        assert!(bus.register_writes().is_empty());
        assert_eq!(
            result.device(0x51).unwrap().kind,
            DeviceKind::Rtc(RtcModel::Pcf8563)
        );
    }

    /// Shares its call log with the test after being boxed into the scanner
    struct SharedSecureElement(Rc<RefCell<FakeSecureElement>>);

    impl SecureElement for SharedSecureElement {
        fn begin(&mut self, address: u8) -> Result<(), SecureElementError> {
            self.0.borrow_mut().begin(address)
        }

        fn read_config_zone(&mut self) -> Result<SecureElementConfig, SecureElementError> {
            self.0.borrow_mut().read_config_zone()
        }

        fn generate_public_key(&mut self) -> Result<[u8; 64], SecureElementError> {
            self.0.borrow_mut().generate_public_key()
        }
    }

    #[test]
    fn test_secure_element_rule() {
        let element = Rc::new(RefCell::new(FakeSecureElement {
            locked: true,
            ..Default::default()
        }));
        let config = ScannerConfig {
            secure_element: true,
            ..Default::default()
        };
        let mut scanner = Scanner::new(config)
            .with_secure_element(Box::new(SharedSecureElement(element.clone())));

        let mut bus = bus_with(vec![SimulatedDevice::new(0x35), SimulatedDevice::new(0x18)]);
        let mut result = DiscoveryResult::new();
        let report = scanner.scan(&mut bus, BusId(0), &mut result);

        assert_eq!(element.borrow().begun_at, Some(0x35));
        assert_eq!(element.borrow().key_requests, 1);
        assert_eq!(result.device(0x35).unwrap().kind, DeviceKind::SecureElement);
        // Scan carried on past the secure element
        assert_eq!(report.found, 2);
    }

    #[test]
    fn test_secure_element_failure_is_not_fatal() {
        let element = Rc::new(RefCell::new(FakeSecureElement {
            fail_begin: true,
            ..Default::default()
        }));
        let config = ScannerConfig {
            secure_element: true,
            ..Default::default()
        };
        let mut scanner = Scanner::new(config)
            .with_secure_element(Box::new(SharedSecureElement(element.clone())));

        let mut bus = bus_with(vec![SimulatedDevice::new(0x35), SimulatedDevice::new(0x70)]);
        let mut result = DiscoveryResult::new();
        let report = scanner.scan(&mut bus, BusId(0), &mut result);

        assert_eq!(report.found, 2);
        assert_eq!(element.borrow().key_requests, 0);
        assert_eq!(result.sensor_address(SensorKind::Shtc3), Some(0x70));
    }

    #[test]
    fn test_secure_element_disabled() {
        let element = Rc::new(RefCell::new(FakeSecureElement::default()));
        let mut scanner = Scanner::new(ScannerConfig::default())
            .with_secure_element(Box::new(SharedSecureElement(element.clone())));

        let mut bus = bus_with(vec![SimulatedDevice::new(0x35)]);
        let mut result = DiscoveryResult::new();
        scanner.scan(&mut bus, BusId(0), &mut result);

        assert_eq!(element.borrow().begun_at, None);
        assert_eq!(result.device(0x35).unwrap().kind, DeviceKind::Unidentified);
    }

    #[test]
    fn test_replays_tracker_fixture() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../fixtures/tracker-bus0.toml");
        let mut bus = SimulatedBus::from_file(&path).unwrap();
        let (result, report) = scan(&mut bus, ScannerConfig::default());

        assert_eq!(report.found, 4);
        assert_eq!(
            result.screen,
            Some(ScreenState {
                address: 0x3C,
                model: ScreenModel::Ssd1306,
            })
        );
        assert_eq!(result.sensor_address(SensorKind::Bme680), Some(0x76));
        assert_eq!(result.sensor_address(SensorKind::Ina260), Some(0x40));
        assert_eq!(result.device(0x34).unwrap().kind, DeviceKind::Unidentified);
    }

    #[test]
    fn test_config_from_toml() {
        let config: ScannerConfig = toml::from_str(
            r#"
secure_element = true
clock = "rv3028"
"#,
        )
        .unwrap();

        assert!(config.secure_element);
        assert_eq!(config.clock, ClockVariant::Rv3028);
        assert!(!config.pmu);
    }
}
