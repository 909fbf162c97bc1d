//! Mock Hardware Implementations
//!
//! Provides simulated hardware for running and testing without a physical
//! converter.
//!
//! # Available Mocks
//!
//! - [`SimulatedMax6675`] - a MAX6675 model that answers the real bit-banged
//!   protocol on three simulated lines, so the driver runs unmodified
//! - [`ScriptedThermometer`] - replays a fixed list of readings, for
//!   acquisition loop tests
//!
//! # Simulation Characteristics
//!
//! - Temperature: configurable base value with uniform ±noise, quantized to
//!   0.25 °C and clamped to the converter's 12-bit range
//! - Faults: each conversion reports an open thermocouple with a configurable
//!   probability
//! - Deterministic when seeded

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::trace;

use super::capabilities::{LineError, Reading, Thermometer};
use super::max6675::{CELSIUS_PER_COUNT, OPEN_CIRCUIT_MASK, STATUS_BITS};

/// Largest count the converter can report (12 bits).
const MAX_COUNT: u16 = 0x0FFF;

/// Parameters of the simulated thermocouple.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationProfile {
    /// Mean temperature in °C
    pub base_celsius: f64,
    /// Half-width of the uniform noise band in °C
    pub noise_celsius: f64,
    /// Probability (0.0..=1.0) that a conversion reports an open input
    pub open_circuit_rate: f64,
    /// RNG seed, `None` for OS entropy
    pub seed: Option<u64>,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            base_celsius: 23.0,
            noise_celsius: 0.5,
            open_circuit_rate: 0.0,
            seed: None,
        }
    }
}

struct ConverterState {
    profile: SimulationProfile,
    rng: StdRng,
    chip_selected: bool,
    clock_high: bool,
    shift: u16,
    conversions: u64,
}

impl ConverterState {
    /// Produce a new frame, as the converter does on the chip-select falling edge.
    fn latch(&mut self) {
        let noise = if self.profile.noise_celsius > 0.0 {
            self.rng
                .gen_range(-self.profile.noise_celsius..=self.profile.noise_celsius)
        } else {
            0.0
        };
        let celsius = self.profile.base_celsius + noise;
        let counts = (celsius / CELSIUS_PER_COUNT)
            .round()
            .clamp(0.0, f64::from(MAX_COUNT)) as u16;

        let mut word = counts << STATUS_BITS;
        if self.rng.gen_bool(self.profile.open_circuit_rate.clamp(0.0, 1.0)) {
            word |= OPEN_CIRCUIT_MASK;
        }

        self.shift = word;
        self.conversions += 1;
        trace!(word, celsius, "Simulated MAX6675 latched frame");
    }
}

/// Simulated MAX6675 converter.
///
/// Hands out one line handle per pin; all handles share the converter state.
/// The MSB is presented on the data line when chip-select falls and each
/// clock falling edge shifts the next bit out.
///
/// # Example
///
/// ```rust,ignore
/// let sim = SimulatedMax6675::new(SimulationProfile::default());
/// let (clock, cs, data) = sim.lines();
/// let mut dev = Max6675::new(clock, cs, data, Delay, DriverConfig::default())?;
/// let reading = dev.read_celsius()?;
/// ```
#[derive(Clone)]
pub struct SimulatedMax6675 {
    state: Arc<Mutex<ConverterState>>,
}

impl SimulatedMax6675 {
    /// Create a simulated converter.
    pub fn new(profile: SimulationProfile) -> Self {
        let rng = match profile.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: Arc::new(Mutex::new(ConverterState {
                profile,
                rng,
                chip_selected: false,
                clock_high: false,
                shift: 0,
                conversions: 0,
            })),
        }
    }

    /// Line handles for (clock, chip-select, data).
    pub fn lines(&self) -> (SimClock, SimChipSelect, SimData) {
        (
            SimClock(self.state.clone()),
            SimChipSelect(self.state.clone()),
            SimData(self.state.clone()),
        )
    }

    /// Unplug or reconnect the thermocouple.
    pub fn set_open_circuit(&self, open: bool) {
        self.state.lock().profile.open_circuit_rate = if open { 1.0 } else { 0.0 };
    }

    /// Change the simulated mean temperature.
    pub fn set_base_celsius(&self, celsius: f64) {
        self.state.lock().profile.base_celsius = celsius;
    }

    /// Number of conversions latched so far.
    pub fn conversions(&self) -> u64 {
        self.state.lock().conversions
    }

    /// Whether chip-select is currently asserted (low).
    pub fn is_selected(&self) -> bool {
        self.state.lock().chip_selected
    }
}

impl std::fmt::Debug for SimulatedMax6675 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SimulatedMax6675")
            .field("profile", &state.profile)
            .field("conversions", &state.conversions)
            .finish()
    }
}

/// Simulated clock line.
pub struct SimClock(Arc<Mutex<ConverterState>>);

/// Simulated chip-select line.
pub struct SimChipSelect(Arc<Mutex<ConverterState>>);

/// Simulated serial-data line.
pub struct SimData(Arc<Mutex<ConverterState>>);

impl SimClock {
    fn drive(&mut self, high: bool) {
        let mut state = self.0.lock();
        let falling = state.clock_high && !high;
        state.clock_high = high;
        if falling && state.chip_selected {
            state.shift <<= 1;
        }
    }
}

impl ErrorType for SimClock {
    type Error = Infallible;
}

impl OutputPin for SimClock {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.drive(true);
        Ok(())
    }
}

impl SimChipSelect {
    fn drive(&mut self, high: bool) {
        let mut state = self.0.lock();
        let selecting = !high && !state.chip_selected;
        state.chip_selected = !high;
        if selecting {
            state.latch();
        }
    }
}

impl ErrorType for SimChipSelect {
    type Error = Infallible;
}

impl OutputPin for SimChipSelect {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.drive(true);
        Ok(())
    }
}

impl ErrorType for SimData {
    type Error = Infallible;
}

impl InputPin for SimData {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        let state = self.0.lock();
        // Three-state while deselected; reads low.
        Ok(state.chip_selected && state.shift & 0x8000 != 0)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

/// One step of a [`ScriptedThermometer`] script.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptStep {
    /// Return this reading
    Reading(Reading),
    /// Fail as if the data line could not be sampled
    LineFailure,
}

impl From<Reading> for ScriptStep {
    fn from(reading: Reading) -> Self {
        ScriptStep::Reading(reading)
    }
}

/// Thermometer that replays a script, cycling when it reaches the end.
#[derive(Debug, Clone)]
pub struct ScriptedThermometer {
    script: VecDeque<ScriptStep>,
    reads: usize,
}

impl ScriptedThermometer {
    /// Replay `steps` in order, starting over after the last one.
    pub fn new<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ScriptStep>,
    {
        Self {
            script: steps.into_iter().map(Into::into).collect(),
            reads: 0,
        }
    }

    /// Always report the same temperature.
    pub fn constant(celsius: f64) -> Self {
        Self::new([Reading::Celsius(celsius)])
    }

    /// Number of `read` calls so far.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl Thermometer for ScriptedThermometer {
    fn read(&mut self) -> Result<Reading, LineError> {
        self.reads += 1;
        let step = self.script.pop_front().unwrap_or(ScriptStep::Reading(Reading::OpenCircuit));
        self.script.push_back(step);

        match step {
            ScriptStep::Reading(reading) => Ok(reading),
            ScriptStep::LineFailure => Err(LineError::pin("data", ErrorKind::Other)),
        }
    }
}
