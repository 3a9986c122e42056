//! Test harness: deterministic randomness, tolerance checks and a
//! clock-driven pipeline

use std::sync::Arc;

use quadpilot_core::{
    config::FlightConfig,
    pipeline::{FlightPipeline, TickInput, TickOutput},
    time::MockTimeSource,
};

#[macro_export]
macro_rules! assert_within_tolerance {
    ($actual:expr, $expected:expr, $tolerance:expr) => {
        let diff = ($actual - $expected).abs();
        if diff > $tolerance {
            panic!(
                "Value {} not within tolerance {} of expected {} (diff: {})",
                $actual, $tolerance, $expected, diff
            );
        }
    };
}

/// Deterministic random number generator for tests
pub struct TestRng {
    state: u32,
}

impl TestRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u32(&mut self) -> u32 {
        // Xorshift algorithm
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        self.state
    }

    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / 16777216.0
    }

    pub fn gen_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }
}

/// Pipeline driven by a mock clock at a fixed tick period
pub struct FlightHarness {
    pub clock: Arc<MockTimeSource>,
    pub pipeline: FlightPipeline<Arc<MockTimeSource>>,
    pub period_ms: u64,
}

impl FlightHarness {
    pub fn new(config: FlightConfig, period_ms: u64) -> Self {
        let clock = Arc::new(MockTimeSource::new(0));
        let pipeline = FlightPipeline::new(config, Arc::clone(&clock)).expect("valid config");
        Self { clock, pipeline, period_ms }
    }

    /// Advance the clock one period and tick
    pub fn step(&mut self, input: &TickInput) -> TickOutput {
        self.clock.advance_ms(self.period_ms);
        self.pipeline.tick(input).expect("tick")
    }

    /// Tick `n` times with the same input, returning the last output
    pub fn run(&mut self, n: usize, input: &TickInput) -> TickOutput {
        assert!(n > 0);
        let mut last = self.step(input);
        for _ in 1..n {
            last = self.step(input);
        }
        last
    }
}
