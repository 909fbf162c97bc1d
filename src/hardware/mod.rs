//! Thermocouple hardware.
//!
//! - [`capabilities`]: thermometer trait, readings and line errors
//! - [`max6675`]: bit-banged converter driver
//! - [`sysfs`]: Linux GPIO lines
//! - [`mock`]: simulated converter and scripted thermometer

pub mod capabilities;
pub mod max6675;
pub mod mock;
pub mod sysfs;

use embedded_hal::digital::PinState;
use linux_embedded_hal::Delay;
use tracing::info;

use crate::config::{SensorBackend, SensorSettings};
use crate::error::AppResult;
use capabilities::Thermometer;
use max6675::{DriverConfig, Max6675};
use mock::{SimulatedMax6675, SimulationProfile};

/// Open the thermometer selected by `settings`.
pub fn open_thermometer(settings: &SensorSettings) -> AppResult<Box<dyn Thermometer>> {
    let config = DriverConfig {
        settle: settings.settle,
    };

    let sensor: Box<dyn Thermometer> = match settings.backend {
        SensorBackend::Sysfs => {
            let pins = settings.pins;
            let clock = sysfs::output_pin(pins.clock, "clock", PinState::Low)?;
            let chip_select = sysfs::output_pin(pins.chip_select, "chip_select", PinState::High)?;
            let data = sysfs::input_pin(pins.data, "data")?;
            Box::new(Max6675::new(clock, chip_select, data, Delay, config)?)
        }
        SensorBackend::Simulated => {
            let sim = &settings.simulation;
            let converter = SimulatedMax6675::new(SimulationProfile {
                base_celsius: sim.base_celsius,
                noise_celsius: sim.noise_celsius,
                open_circuit_rate: sim.open_circuit_rate,
                seed: sim.seed,
            });
            let (clock, chip_select, data) = converter.lines();
            Box::new(Max6675::new(clock, chip_select, data, Delay, config)?)
        }
    };

    info!(backend = %settings.backend, "Thermometer ready");
    Ok(sensor)
}
