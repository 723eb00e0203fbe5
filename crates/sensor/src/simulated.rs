use std::f64::consts::TAU;

use thermowatch_protocol::Reading;

use crate::max6675::RESOLUTION_C;
use crate::{SensorError, SensorFuture, SensorSource};

/// Deterministic stand-in for a thermocouple.
///
/// Produces a sine wave around `base` quantized to the MAX6675 resolution, so
/// the monitor can run on machines without the hardware.
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    base: f64,
    amplitude: f64,
    period_ticks: u32,
    tick: u64,
}

impl SimulatedSource {
    /// `period_ticks` is clamped to at least 1.
    pub fn new(base: f64, amplitude: f64, period_ticks: u32) -> Self {
        Self {
            base,
            amplitude,
            period_ticks: period_ticks.max(1),
            tick: 0,
        }
    }

    fn next_value(&mut self) -> f64 {
        let phase = (self.tick % u64::from(self.period_ticks)) as f64 / f64::from(self.period_ticks);
        self.tick += 1;
        let raw = self.base + self.amplitude * (phase * TAU).sin();
        (raw / RESOLUTION_C).round() * RESOLUTION_C
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new(22.0, 3.0, 60)
    }
}

impl SensorSource for SimulatedSource {
    fn name(&self) -> &str {
        "simulated"
    }

    fn poll(&mut self) -> SensorFuture<'_, Result<Reading, SensorError>> {
        let value = self.next_value();
        Box::pin(async move { Ok(Reading::now(value)) })
    }
}
