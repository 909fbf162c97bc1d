//! Acquired samples.

/// One successful temperature reading.
///
/// `elapsed_seconds` is active acquisition time (paused intervals excluded).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Active time since acquisition start, in seconds
    pub elapsed_seconds: f64,
    /// Temperature in °C, a multiple of 0.25
    pub temperature_celsius: f64,
}

impl Sample {
    /// Create a sample.
    pub fn new(elapsed_seconds: f64, temperature_celsius: f64) -> Self {
        Self {
            elapsed_seconds,
            temperature_celsius,
        }
    }
}

impl std::fmt::Display for Sample {
    /// Console/CSV row form: `elapsed,temperature` with 3 and 2 decimals.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3},{:.2}", self.elapsed_seconds, self.temperature_celsius)
    }
}

/// Append-only sequence of samples for one run, ordered by elapsed time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSequence {
    samples: Vec<Sample>,
}

impl SampleSequence {
    /// Empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty sequence with room for `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Append a sample. Its elapsed time must not precede the last one.
    pub fn push(&mut self, sample: Sample) {
        if let Some(last) = self.samples.last() {
            debug_assert!(
                last.elapsed_seconds <= sample.elapsed_seconds,
                "sample at {}s pushed out of order",
                sample.elapsed_seconds
            );
        }
        self.samples.push(sample);
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Borrow the samples in acquisition order.
    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    /// Consume the sequence.
    pub fn into_vec(self) -> Vec<Sample> {
        self.samples
    }
}

impl FromIterator<Sample> for SampleSequence {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        let mut seq = SampleSequence::new();
        for sample in iter {
            seq.push(sample);
        }
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_fixed_precision() {
        assert_eq!(Sample::new(0.998, 23.25).to_string(), "0.998,23.25");
        assert_eq!(Sample::new(1.999, 23.5).to_string(), "1.999,23.50");
        assert_eq!(Sample::new(12.0, 100.0).to_string(), "12.000,100.00");
    }

    #[test]
    fn sequence_accepts_equal_timestamps() {
        let mut seq = SampleSequence::new();
        seq.push(Sample::new(1.0, 20.0));
        seq.push(Sample::new(1.0, 20.25));
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.into_vec()[1].temperature_celsius, 20.25);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of order")]
    fn sequence_asserts_ordering() {
        let mut seq = SampleSequence::new();
        seq.push(Sample::new(1.0, 20.0));
        seq.push(Sample::new(0.5, 20.5));
    }

    #[test]
    fn sequence_from_iter() {
        let seq: SampleSequence = [Sample::new(0.0, 1.0), Sample::new(1.0, 2.0)]
            .into_iter()
            .collect();
        assert_eq!(seq.as_slice()[1], Sample::new(1.0, 2.0));
        assert!(!seq.is_empty());
    }
}
