//! One Control Tick, End to End
//!
//! ## Overview
//!
//! [`FlightPipeline`] owns one instance of every stage and runs them in a
//! fixed order each time [`FlightPipeline::tick`] is called:
//!
//! ```text
//!  TickInput ─→ SensorFusion ─→ GuidanceStateMachine ─→ AttitudeAltitudeController ─→ MotorMixer
//!   batch          │                  ↑   │                        │                      │
//!   rc, mode ──────┼──────────────────┘   │                        │                      │
//!   failsafes      ↓                      ↓                        ↓                      ↓
//!              VehicleState         GuidanceOutput           ControlCommand          MotorCommand
//! ```
//!
//! ## Scheduling
//!
//! The pipeline is synchronous and never blocks. An external scheduler calls
//! `tick` at a fixed cadence (typically every 5 to 20 ms) with inputs that
//! are already in memory. Producers on other threads hand snapshots over
//! through [`crate::handoff`].
//!
//! ## Failure semantics
//!
//! Only a malformed sensor batch fails a tick. The caller keeps the previous
//! motor command (or idles the motors) and tries again next tick; fusion's
//! prior is left untouched. Every other fault is absorbed inside the stage
//! that detected it, so a successful tick always carries a bounded
//! [`MotorCommand`].
//!
//! ## Usage Example
//!
//! ```rust
//! use quadpilot_core::batch::{BaroSample, GpsFix, ImuSample, MagSample, SensorBatch};
//! use quadpilot_core::config::FlightConfig;
//! use quadpilot_core::pipeline::{FlightPipeline, ModeRequest, TickInput};
//! use quadpilot_core::state::{FlightMode, RcInput};
//! use quadpilot_core::time::MockTimeSource;
//!
//! let clock = MockTimeSource::new(0);
//! let mut pipeline = FlightPipeline::new(FlightConfig::default(), &clock).unwrap();
//!
//! let batch = SensorBatch::from_slices(
//!     &[ImuSample::from_raw([0.0, 0.0, 16_384.0, 0.0, 0.0, 0.0])],
//!     &[GpsFix::new(47.39, 8.54, 410.0)],
//!     &[MagSample::new(0.25, 0.0, 0.4)],
//!     &[BaroSample::new(101_325.0, 21.0, 45.0)],
//! ).unwrap();
//!
//! let input = TickInput::new(batch, RcInput::centered(1500))
//!     .with_mode(ModeRequest::Explicit(FlightMode::Stabilize));
//!
//! clock.advance_ms(10);
//! let out = pipeline.tick(&input).unwrap();
//! assert_eq!(out.motors.as_array(), [1500; 4]);
//! ```

use crate::{
    batch::SensorBatch,
    config::{ConfigResult, FlightConfig},
    control::AttitudeAltitudeController,
    errors::PipelineResult,
    fusion::SensorFusion,
    guidance::{GuidanceStateMachine, ModeSwitch},
    mixer::MotorMixer,
    state::{ControlCommand, FlightMode, GuidanceOutput, ModeTag, MotorCommand, RcInput, VehicleState},
    time::TimeSource,
};

/// Where the requested flight mode comes from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModeRequest {
    /// Decode the RC mode channels
    #[default]
    FromRc,
    /// Use this mode (ground station or companion computer)
    Explicit(FlightMode),
}

/// Everything one tick consumes
///
/// Owns its batch, so it moves through the hand-off queue by value.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickInput {
    /// Sensor samples collected since the previous tick
    pub batch: SensorBatch,
    /// Latest RC frame
    pub rc: RcInput,
    /// Mode source
    pub mode: ModeRequest,
    /// Radio link lost
    pub rc_failsafe: bool,
    /// Battery critically low
    pub battery_failsafe: bool,
}

impl TickInput {
    /// Input with mode taken from RC and no failsafe raised
    pub fn new(batch: SensorBatch, rc: RcInput) -> Self {
        Self { batch, rc, ..Self::default() }
    }

    /// Replace the mode source
    pub fn with_mode(mut self, mode: ModeRequest) -> Self {
        self.mode = mode;
        self
    }

    /// Set both failsafe flags
    pub fn with_failsafes(mut self, rc_failsafe: bool, battery_failsafe: bool) -> Self {
        self.rc_failsafe = rc_failsafe;
        self.battery_failsafe = battery_failsafe;
        self
    }
}

/// Everything one tick produces
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickOutput {
    /// Fused estimate
    pub state: VehicleState,
    /// Guidance setpoints (telemetry)
    pub guidance: GuidanceOutput,
    /// Per-axis PWM commands
    pub control: ControlCommand,
    /// Motor pulses
    pub motors: MotorCommand,
}

/// Fusion, guidance, control and mixing wired together
///
/// `C` is cloned once per time-aware stage; pass `&clock` or an `Arc` so
/// both stages read the same timeline.
#[derive(Debug)]
pub struct FlightPipeline<C: TimeSource + Clone> {
    config: FlightConfig,
    fusion: SensorFusion,
    guidance: GuidanceStateMachine<C>,
    controller: AttitudeAltitudeController<C>,
    mixer: MotorMixer,
    mode_switch: ModeSwitch,
    last_mode: Option<ModeTag>,
    ticks: u32,
}

impl<C: TimeSource + Clone> FlightPipeline<C> {
    /// Validate `config` and build every stage
    pub fn new(config: FlightConfig, clock: C) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            fusion: SensorFusion::new(config.fusion),
            guidance: GuidanceStateMachine::new(config.guidance, clock.clone()),
            controller: AttitudeAltitudeController::new(config.control, clock),
            mixer: MotorMixer::new(config.mixer),
            mode_switch: ModeSwitch::new(config.mode_switch),
            config,
            last_mode: None,
            ticks: 0,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    /// Fusion stage
    pub fn fusion(&self) -> &SensorFusion {
        &self.fusion
    }

    /// Guidance stage
    pub fn guidance(&self) -> &GuidanceStateMachine<C> {
        &self.guidance
    }

    /// Guidance stage, e.g. to reset the home position
    pub fn guidance_mut(&mut self) -> &mut GuidanceStateMachine<C> {
        &mut self.guidance
    }

    /// Controller stage
    pub fn controller(&self) -> &AttitudeAltitudeController<C> {
        &self.controller
    }

    /// Controller stage, e.g. for an explicit reset
    pub fn controller_mut(&mut self) -> &mut AttitudeAltitudeController<C> {
        &mut self.controller
    }

    /// Mode tag of the most recent successful tick
    pub fn active_mode(&self) -> Option<ModeTag> {
        self.last_mode
    }

    /// Successful ticks since creation
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Run sense → fuse → guide → control → mix once
    ///
    /// Fails only when the sensor batch is empty or malformed. Guidance and
    /// the controller are not advanced on a failed tick.
    pub fn tick(&mut self, input: &TickInput) -> PipelineResult<TickOutput> {
        let state = self.fusion.process_batch(&input.batch).map_err(|err| {
            log_warn!("tick rejected: {}", err);
            err
        })?;

        let requested = match input.mode {
            ModeRequest::FromRc => self.mode_switch.decode(&input.rc),
            ModeRequest::Explicit(mode) => mode,
        };

        let guidance = self.guidance.process(
            &state,
            requested,
            input.rc_failsafe,
            input.battery_failsafe,
            &input.rc,
        );

        let changed = self.last_mode.map_or(false, |previous| previous != guidance.mode);
        if changed && self.config.reset_controller_on_mode_change {
            self.controller.reset();
        }
        self.last_mode = Some(guidance.mode);

        let control = self.controller.process(&state, &guidance);
        let motors = self.mixer.mix_command(&control);

        self.ticks = self.ticks.wrapping_add(1);
        log_trace!(
            "tick {}: mode={} alt={} motors={:?}",
            self.ticks,
            guidance.mode,
            state.altitude,
            motors.as_array()
        );

        Ok(TickOutput { state, guidance, control, motors })
    }
}
