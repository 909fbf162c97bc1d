//! MAX6675 thermocouple-to-digital converter, bit-banged over three lines.
//!
//! # Protocol
//!
//! ```text
//!  CS  ‾‾‾\___________________________________________/‾‾‾
//!          |settle|
//!  SCK ____________/‾\_/‾\_/‾\_ ... _/‾\_/‾\______________
//!  SO             D15  D14  D13  ...  D1   D0
//! ```
//!
//! 16 bits are shifted out MSB-first, one per clock pulse:
//!
//! | Bits   | Meaning                                   |
//! |--------|-------------------------------------------|
//! | D15    | dummy sign bit (always 0)                 |
//! | D14-D3 | 12-bit temperature, 0.25 °C per count     |
//! | D2     | thermocouple input open                   |
//! | D1     | device ID                                 |
//! | D0     | three-state                               |
//!
//! Only D2 is inspected for faults.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use linux_embedded_hal::Delay;
use std::time::Duration;
use tracing::{debug, trace};

use super::capabilities::{LineError, Reading, Thermometer};

/// Number of clock pulses (and bits) per conversion frame.
pub const FRAME_BITS: u32 = 16;

/// Mask of the open-circuit flag (bit 2) in the raw frame.
pub const OPEN_CIRCUIT_MASK: u16 = 1 << 2;

/// Low status bits discarded before scaling.
pub const STATUS_BITS: u32 = 3;

/// Converter resolution in °C per count.
pub const CELSIUS_PER_COUNT: f64 = 0.25;

/// Settle time after asserting chip-select.
pub const DEFAULT_SETTLE: Duration = Duration::from_micros(10);

const CLOCK: &str = "clock";
const CHIP_SELECT: &str = "chip_select";
const DATA: &str = "data";

/// Timing parameters for the read protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Wait between asserting chip-select and the first clock edge
    pub settle: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            settle: DEFAULT_SETTLE,
        }
    }
}

impl DriverConfig {
    /// Settle time in nanoseconds, saturating at `u32::MAX` (about 4.3 s).
    pub fn settle_nanos(&self) -> u32 {
        u32::try_from(self.settle.as_nanos()).unwrap_or(u32::MAX)
    }
}

/// Decode a raw 16-bit frame.
///
/// Bit 2 set means the thermocouple is disconnected. Otherwise the three
/// status bits are dropped and the remaining count is scaled by 0.25 °C.
pub fn decode(word: u16) -> Reading {
    if word & OPEN_CIRCUIT_MASK != 0 {
        return Reading::OpenCircuit;
    }
    Reading::Celsius(f64::from(word >> STATUS_BITS) * CELSIUS_PER_COUNT)
}

/// Bit-banged MAX6675 driver.
///
/// Owns the clock and chip-select outputs, the serial-data input and the
/// settle delay. Chip-select is driven high on construction and is released
/// again at the end of every read, whatever the outcome.
pub struct Max6675<CLK, CS, SO, D = Delay> {
    clock: CLK,
    chip_select: CS,
    data: SO,
    delay: D,
    config: DriverConfig,
}

impl<CLK, CS, SO, D> Max6675<CLK, CS, SO, D>
where
    CLK: OutputPin,
    CS: OutputPin,
    SO: InputPin,
    D: DelayNs,
{
    /// Take ownership of the lines and park the bus in its idle state
    /// (chip-select high, clock low).
    pub fn new(
        mut clock: CLK,
        mut chip_select: CS,
        data: SO,
        delay: D,
        config: DriverConfig,
    ) -> Result<Self, LineError> {
        chip_select
            .set_high()
            .map_err(|e| LineError::pin(CHIP_SELECT, e))?;
        clock.set_low().map_err(|e| LineError::pin(CLOCK, e))?;
        debug!(settle_us = config.settle.as_micros() as u64, "MAX6675 bus idle");

        Ok(Self {
            clock,
            chip_select,
            data,
            delay,
            config,
        })
    }

    /// Clock one frame out of the converter without decoding it.
    pub fn read_raw(&mut self) -> Result<u16, LineError> {
        self.chip_select
            .set_low()
            .map_err(|e| LineError::pin(CHIP_SELECT, e))?;
        let frame = self.clock_in_frame();
        let released = self
            .chip_select
            .set_high()
            .map_err(|e| LineError::pin(CHIP_SELECT, e));

        let word = frame?;
        released?;
        trace!(raw = word, "MAX6675 frame");
        Ok(word)
    }

    /// Read and decode one conversion.
    pub fn read_celsius(&mut self) -> Result<Reading, LineError> {
        self.read_raw().map(decode)
    }

    /// Timing parameters in use.
    pub fn config(&self) -> DriverConfig {
        self.config
    }

    /// Give the lines back (clock, chip-select, data, delay).
    pub fn release(self) -> (CLK, CS, SO, D) {
        (self.clock, self.chip_select, self.data, self.delay)
    }

    fn clock_in_frame(&mut self) -> Result<u16, LineError> {
        self.delay.delay_ns(self.config.settle_nanos());

        let mut word: u16 = 0;
        for _ in 0..FRAME_BITS {
            self.clock.set_high().map_err(|e| LineError::pin(CLOCK, e))?;
            word <<= 1;
            if self.data.is_high().map_err(|e| LineError::pin(DATA, e))? {
                word |= 1;
            }
            self.clock.set_low().map_err(|e| LineError::pin(CLOCK, e))?;
        }
        Ok(word)
    }
}

impl<CLK, CS, SO, D> Thermometer for Max6675<CLK, CS, SO, D>
where
    CLK: OutputPin,
    CS: OutputPin,
    SO: InputPin,
    D: DelayNs,
{
    fn read(&mut self) -> Result<Reading, LineError> {
        self.read_celsius()
    }
}

impl<CLK, CS, SO, D> std::fmt::Debug for Max6675<CLK, CS, SO, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Max6675")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
