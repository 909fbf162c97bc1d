//! Linux sysfs GPIO lines.
//!
//! Lines are claimed through `sysfs_gpio` (re-exported by
//! `linux-embedded-hal`) and handed to the driver as [`SysfsPin`]s, which
//! implement the `embedded-hal` digital traits.
//!
//! Right after export the kernel creates `gpioN/` owned by root and udev
//! may still be fixing permissions, so configuring the direction is retried
//! for a short while.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;
use linux_embedded_hal::sysfs_gpio::{self, Direction};
use linux_embedded_hal::{Delay, SysfsPin};
use tracing::debug;

use super::capabilities::LineError;

/// Attempts at configuring a freshly exported line.
const CONFIGURE_ATTEMPTS: u32 = 20;

/// Wait between configuration attempts.
const CONFIGURE_RETRY_MS: u32 = 10;

/// Claim GPIO `number` as an output starting at `initial`.
pub fn output_pin(number: u32, name: &str, initial: PinState) -> Result<SysfsPin, LineError> {
    let direction = match initial {
        PinState::High => Direction::High,
        PinState::Low => Direction::Low,
    };
    claim(number, name, direction)
}

/// Claim GPIO `number` as an input.
pub fn input_pin(number: u32, name: &str) -> Result<SysfsPin, LineError> {
    claim(number, name, Direction::In)
}

fn claim(number: u32, name: &str, direction: Direction) -> Result<SysfsPin, LineError> {
    let pin = SysfsPin::new(u64::from(number));
    pin.export().map_err(|e| unavailable(name, number, &e))?;

    let mut delay = Delay;
    let mut attempt = 1;
    loop {
        match pin.set_direction(direction) {
            Ok(()) => break,
            Err(e) if attempt < CONFIGURE_ATTEMPTS => {
                debug!(line = name, gpio = number, attempt, error = %e, "GPIO not ready, retrying");
                attempt += 1;
                delay.delay_ms(CONFIGURE_RETRY_MS);
            }
            Err(e) => return Err(unavailable(name, number, &e)),
        }
    }

    debug!(line = name, gpio = number, ?direction, "Claimed GPIO line");
    Ok(pin)
}

fn unavailable(name: &str, number: u32, err: &sysfs_gpio::Error) -> LineError {
    LineError::Unavailable {
        line: name.to_string(),
        reason: format!("gpio{number}: {err}"),
    }
}
