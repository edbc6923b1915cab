// src/sensor.rs - Reading suppliers and the retry wrapper that feeds the core
use crate::{
    config::SensorConfig,
    enclosure::CycleReadings,
    error::SensorError,
};
use std::time::Duration;
use tracing::{debug, error, warn};

/// After the first failure only every Nth retry is logged at `warn`.
const WARN_EVERY: u32 = 10;

/// Source of one cycle's four raw values.
///
/// A supplier may fail or hand back NaN; [`RetryingSupplier`] turns that into
/// a valid [`CycleReadings`] before anything downstream sees it.
pub trait ReadingSupplier: Send {
    fn sample(&mut self) -> Result<CycleReadings, SensorError>;
}

impl<F> ReadingSupplier for F
where
    F: FnMut() -> Result<CycleReadings, SensorError> + Send,
{
    fn sample(&mut self) -> Result<CycleReadings, SensorError> {
        self()
    }
}

/// Re-samples until all four values are valid.
///
/// With no attempt limit a permanently broken sensor stalls the cycle
/// indefinitely. Set `max_attempts` to surface [`SensorError::Exhausted`] instead.
pub struct RetryingSupplier {
    inner: Box<dyn ReadingSupplier>,
    retry_delay: Duration,
    max_attempts: Option<u32>,
}

impl RetryingSupplier {
    pub fn new(inner: Box<dyn ReadingSupplier>, retry_delay: Duration, max_attempts: Option<u32>) -> Self {
        Self { inner, retry_delay, max_attempts }
    }

    pub fn from_config(inner: Box<dyn ReadingSupplier>, config: &SensorConfig) -> Self {
        Self::new(
            inner,
            Duration::from_millis(config.retry_delay_ms),
            config.max_attempts,
        )
    }

    pub async fn supply(&mut self) -> Result<CycleReadings, SensorError> {
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);

            let failure = match self.inner.sample() {
                Ok(readings) if readings.is_valid() => return Ok(readings),
                Ok(_) => SensorError::Invalid,
                Err(e) => e,
            };

            if let Some(max) = self.max_attempts {
                if attempt >= max {
                    error!("Sensor read failed after {} attempts: {}", attempt, failure);
                    return Err(SensorError::Exhausted(attempt));
                }
            }

            if attempt == 1 || attempt % WARN_EVERY == 0 {
                warn!("Sensor read failed (attempt {}): {}", attempt, failure);
            } else {
                debug!("Sensor read failed (attempt {}): {}", attempt, failure);
            }

            if self.retry_delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
    }
}

#[cfg(feature = "simulation")]
pub use simulated::SimulatedSupplier;

#[cfg(feature = "simulation")]
mod simulated {
    use super::ReadingSupplier;
    use crate::{
        enclosure::{CycleReadings, Reading},
        error::SensorError,
    };
    use rand::{rngs::StdRng, Rng, SeedableRng};

    /// Random walk around a plausible climate for each enclosure.
    pub struct SimulatedSupplier {
        rng: StdRng,
        current: CycleReadings,
    }

    impl SimulatedSupplier {
        pub fn new() -> Self {
            Self::with_rng(StdRng::from_entropy())
        }

        pub fn with_seed(seed: u64) -> Self {
            Self::with_rng(StdRng::seed_from_u64(seed))
        }

        fn with_rng(rng: StdRng) -> Self {
            Self {
                rng,
                current: CycleReadings::new(Reading::new(24.0, 55.0), Reading::new(30.0, 40.0)),
            }
        }

        fn step(rng: &mut StdRng, reading: &mut Reading) {
            reading.temperature += rng.gen_range(-0.5..0.5);
            reading.humidity = (reading.humidity + rng.gen_range(-1.5..1.5)).clamp(0.0, 100.0);
        }
    }

    impl Default for SimulatedSupplier {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ReadingSupplier for SimulatedSupplier {
        fn sample(&mut self) -> Result<CycleReadings, SensorError> {
            Self::step(&mut self.rng, &mut self.current.avian);
            Self::step(&mut self.rng, &mut self.current.reptilian);
            Ok(self.current)
        }
    }
}
