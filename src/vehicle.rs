// ==============================================================================
// vehicle.rs — VEHICLE STEP ORCHESTRATOR
// ------------------------------------------------------------------------------
// Per rendered frame (variable dt), read-only on the body:
//   update_frame: capture input -> drift state -> steering filter -> boost timer
//   Velocity changes requested here (boost kick, drift exit) are queued.
//
// Per physics tick (fixed dt), the only writer of the chassis:
//   probe_wheels: four read-only ground rays
//   fixed_step:
//     1) queued velocity changes
//     2) sleep check (enter: zero velocities + backend sleep)
//     3) awake: solve all four wheels from the same pre-step state,
//        apply F*dt at each mount, drift yaw torque
//     4) speed governor (boosted max while boosting)
//     5) angular velocity clamp
//     6) wheel visuals (cosmetic)
//
// While disabled both entry points are no-ops.
// ==============================================================================

use tracing::debug;

use crate::boost::{BoostActivation, BoostState};
use crate::config::VehicleConfig;
use crate::debug_builders::{
    build_wheel_ray, push_ray_debug, push_wheel_debug, update_wheel_visual, DebugChassis, DebugOverlay,
    WheelVisual,
};
use crate::drift::{exit_correction, DriftState, DriftTransition};
use crate::dynamics::kinematics::{chassis_axes, signed_slip_angle, wheel_frame};
use crate::dynamics::solve::{solve_step, ChassisMotion};
use crate::dynamics::steering::SteeringFilter;
use crate::dynamics::types::{
    DriverInput, GroundHit, Pt3, SolveContext, Vec3, WheelFrame, WheelId, WheelSolution,
};
use crate::error::ConfigError;
use crate::host::{ChassisBody, WorldQuery};
use crate::stability::{clamp_angular, govern_speed, SleepState, SleepTransition};

/// Below this planar speed the drift angle reads as zero.
const DRIFT_ANGLE_MIN_SPEED: f32 = 0.5;
const SPEED_TIER: f32 = 10.0; // m/s
const DRIVEN_WHEELS: f32 = 2.0;

/// Kinematic read-back refreshed on every frame and fixed step.
#[derive(Debug, Clone, Copy, Default)]
struct Telemetry {
    speed: f32,
    forward_speed: f32,
    drift_angle: f32,
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    config: VehicleConfig,
    mounts: [Pt3; 4],               // chassis local, FL FR RL RR

    input: DriverInput,
    steering: SteeringFilter,
    boost: BoostState,
    drift: DriftState,
    sleep: SleepState,
    enabled: bool,

    pending_kick: f32,              // m/s along forward, applied next fixed step
    pending_drift_exit: bool,

    contacts: [Option<GroundHit>; 4],
    solutions: [Option<WheelSolution>; 4],
    visuals: [WheelVisual; 4],
    telemetry: Telemetry,
    speed_tier: u32,
}

impl Vehicle {
    pub fn new(config: VehicleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mounts = config.wheels.map(|[x, y, z]| Pt3::new(x, y, z));
        Ok(Self {
            config,
            mounts,
            input: DriverInput::default(),
            steering: SteeringFilter::default(),
            boost: BoostState::default(),
            drift: DriftState::default(),
            sleep: SleepState::default(),
            enabled: true,
            pending_kick: 0.0,
            pending_drift_exit: false,
            contacts: [None; 4],
            solutions: [None; 4],
            visuals: WheelId::ALL.map(WheelVisual::new),
            telemetry: Telemetry::default(),
            speed_tier: 0,
        })
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    pub fn input(&self) -> DriverInput {
        self.input
    }

    fn frames(&self, pose: &nalgebra::Isometry3<f32>) -> [WheelFrame; 4] {
        WheelId::ALL.map(|id| wheel_frame(pose, id, self.mounts[id.index()]))
    }

    // ==========================================================================
    // Frame update (variable dt, never writes the body)
    // ==========================================================================
    pub fn update_frame<B: ChassisBody + ?Sized>(&mut self, input: DriverInput, body: &B, dt: f32) {
        if !self.enabled {
            return;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.input = input.sanitized();

        let (_, right, forward) = chassis_axes(&body.pose());
        let linvel = body.linvel();
        let forward_speed = linvel.dot(&forward);

        match self.drift.update(&self.config.drift, self.input.drift_held, forward_speed, self.input.steer) {
            DriftTransition::Entered(direction) => {
                debug!(direction, forward_speed, "drift started");
            }
            DriftTransition::Exited => {
                self.pending_drift_exit = true;
                debug!(forward_speed, "drift released");
            }
            DriftTransition::None => {}
        }

        let drift_steer = self.drift.steer_multiplier(&self.config.drift);
        self.steering.update(&self.config.steering, self.input.steer, linvel.norm(), drift_steer, dt);

        if self.boost.tick(dt) {
            debug!("boost expired");
        }

        self.refresh_telemetry(linvel, forward, right);
        self.log_speed_tier();
    }

    // ==========================================================================
    // Boost requests (from pickups / trigger volumes)
    // ==========================================================================
    pub fn activate_boost(&mut self, duration: f32) -> BoostActivation {
        if !self.enabled || !self.config.boost.enabled {
            return BoostActivation::Ignored;
        }
        let outcome = self.boost.activate(duration);
        match outcome {
            BoostActivation::Started => {
                self.pending_kick += self.config.boost.initial_kick;
                debug!(duration, kick = self.config.boost.initial_kick, "boost started");
            }
            BoostActivation::Extended => {
                debug!(remaining = self.boost.remaining(), "boost extended");
            }
            BoostActivation::Rejected | BoostActivation::Ignored => {}
        }
        outcome
    }

    pub fn activate_default_boost(&mut self) -> BoostActivation {
        self.activate_boost(self.config.boost.default_duration)
    }

    // ==========================================================================
    // Fixed step
    // ==========================================================================
    pub fn probe_wheels<B, W>(&self, body: &B, world: &W) -> [Option<GroundHit>; 4]
    where
        B: ChassisBody + ?Sized,
        W: WorldQuery + ?Sized,
    {
        let max = self.config.suspension.probe_length();
        self.frames(&body.pose()).map(|f| world.cast_ray(f.position, -f.up, max))
    }

    pub fn step<B, W>(&mut self, body: &mut B, world: &W, dt: f32)
    where
        B: ChassisBody + ?Sized,
        W: WorldQuery + ?Sized,
    {
        let probes = self.probe_wheels(body, world);
        self.fixed_step(body, &probes, dt);
    }

    pub fn fixed_step<B: ChassisBody + ?Sized>(&mut self, body: &mut B, probes: &[Option<GroundHit>; 4], dt: f32) {
        if !self.enabled || !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let pose = body.pose();
        let (up, right, forward) = chassis_axes(&pose);

        // ---- 1) queued velocity changes ----
        self.apply_pending(body, forward, right, up);

        // ---- 2) sleep ----
        let cfg = &self.config;
        let wheels_loaded = probes
            .iter()
            .all(|p| p.is_some_and(|h| cfg.suspension.rest_length - h.distance > 0.0));

        match self.sleep.update(&cfg.stability, body.linvel(), body.angvel(), self.input.magnitude(), wheels_loaded, dt) {
            SleepTransition::Enter => {
                body.set_linvel(Vec3::zeros());
                body.set_angvel(Vec3::zeros());
                body.sleep();
                debug!("vehicle asleep");
            }
            SleepTransition::Exit => {
                body.wake_up();
                debug!("vehicle awake");
            }
            SleepTransition::Stay => {}
        }

        self.contacts = *probes;
        let frames = self.frames(&pose);

        // ---- 3) wheel forces ----
        if self.sleep.is_asleep() {
            self.solutions = [None; 4];
        } else {
            self.apply_wheel_forces(body, &frames, up, dt);
        }

        // ---- 4) governor ----
        let max_forward = self.effective_max_speed();
        if let Some(v) = govern_speed(body.linvel(), forward, max_forward, self.config.drive.max_reverse_speed) {
            body.set_linvel(v);
        }

        // ---- 5) angular clamp ----
        if let Some(w) = clamp_angular(body.angvel(), self.config.stability.max_angular_velocity) {
            body.set_angvel(w);
        }

        // ---- 6) visuals ----
        let linvel = body.linvel();
        let angvel = body.angvel();
        let com = body.center_of_mass();
        let steer = self.steering.angle();
        for (i, frame) in frames.iter().enumerate() {
            let rolling = crate::dynamics::kinematics::point_velocity(linvel, angvel, com, frame.position)
                .dot(&frame.forward);
            update_wheel_visual(
                &mut self.visuals[i],
                frame,
                self.contacts[i].as_ref(),
                &self.config.suspension,
                steer,
                rolling,
                dt,
            );
        }

        self.refresh_telemetry(linvel, forward, right);
    }

    fn apply_pending<B: ChassisBody + ?Sized>(&mut self, body: &mut B, forward: Vec3, right: Vec3, up: Vec3) {
        if self.pending_kick > 0.0 {
            body.wake_up();
            self.sleep.reset();
            body.set_linvel(body.linvel() + forward * self.pending_kick);
            self.pending_kick = 0.0;
        }
        if self.pending_drift_exit {
            let (v, w) = exit_correction(&self.config.drift, body.linvel(), body.angvel(), forward, right, up);
            body.set_linvel(v);
            body.set_angvel(w);
            self.pending_drift_exit = false;
        }
    }

    fn apply_wheel_forces<B: ChassisBody + ?Sized>(&mut self, body: &mut B, frames: &[WheelFrame; 4], up: Vec3, dt: f32) {
        let cfg = &self.config;
        let mass = body.mass();
        let (front_grip, rear_grip) = self.drift.grip_multipliers(&cfg.drift);

        let ctx = SolveContext {
            dt,
            chassis_mass: if mass.is_finite() && mass > 0.0 { mass } else { cfg.chassis.mass },
            driven_wheels: DRIVEN_WHEELS,
            throttle: self.input.throttle,
            steer_angle: self.steering.angle(),
            boosting: self.boost.is_active(),
            front_grip,
            rear_grip,
            power_multiplier: self.boost.power_multiplier(&cfg.boost) * self.drift.power_multiplier(&cfg.drift),
            slope_override: self.input.surface_slope_override,
        };

        // sample once: every wheel sees the same pre-step state
        let motion = ChassisMotion {
            linvel: body.linvel(),
            angvel: body.angvel(),
            com: body.center_of_mass(),
        };

        self.solutions = solve_step(cfg, &ctx, frames, &self.contacts, &motion);

        for sol in self.solutions.iter().flatten() {
            let total = sol.total();
            if total != Vec3::zeros() {
                body.apply_impulse_at_point(total * dt, sol.apply_point);
            }
        }

        if self.solutions.iter().any(Option::is_some) {
            let torque = self.drift.yaw_torque(&cfg.drift, self.input.steer, up, motion.angvel);
            if torque.iter().all(|t| t.is_finite()) && torque != Vec3::zeros() {
                body.apply_torque_impulse(torque * dt);
            }
        }
    }

    // ==========================================================================
    // Enable / disable / respawn
    // ==========================================================================
    pub fn disable<B: ChassisBody + ?Sized>(&mut self, body: &mut B) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        body.set_linvel(Vec3::zeros());
        body.set_angvel(Vec3::zeros());
        body.clear_forces();
        body.sleep();

        self.drift.cancel();
        self.pending_drift_exit = false;
        self.pending_kick = 0.0;
        self.sleep.reset();
        self.solutions = [None; 4];
        self.telemetry = Telemetry::default();
        debug!("vehicle disabled");
    }

    pub fn enable<B: ChassisBody + ?Sized>(&mut self, body: &mut B) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        body.wake_up();
        debug!("vehicle enabled");
    }

    /// Clear boost, drift, sleep and steering for a respawn.
    pub fn reset_transient_state(&mut self) {
        self.boost.reset();
        self.drift.cancel();
        self.sleep.reset();
        self.steering.reset();
        self.pending_kick = 0.0;
        self.pending_drift_exit = false;
        self.input = DriverInput::default();
        self.speed_tier = 0;
    }

    // ==========================================================================
    // Read-back
    // ==========================================================================
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_boosting(&self) -> bool {
        self.boost.is_active()
    }

    pub fn boost_time_remaining(&self) -> f32 {
        self.boost.remaining()
    }

    pub fn boost_state(&self) -> BoostState {
        self.boost
    }

    pub fn is_drifting(&self) -> bool {
        self.drift.is_active()
    }

    pub fn drift_direction(&self) -> i8 {
        self.drift.direction()
    }

    pub fn drift_state(&self) -> DriftState {
        self.drift
    }

    /// Signed angle (radians) between velocity and chassis forward, + = sliding right.
    pub fn drift_angle(&self) -> f32 {
        self.telemetry.drift_angle
    }

    /// |linear velocity|, m/s.
    pub fn current_speed(&self) -> f32 {
        self.telemetry.speed
    }

    pub fn forward_speed(&self) -> f32 {
        self.telemetry.forward_speed
    }

    pub fn is_asleep(&self) -> bool {
        self.sleep.is_asleep()
    }

    pub fn steer_angle(&self) -> f32 {
        self.steering.angle()
    }

    pub fn effective_max_speed(&self) -> f32 {
        self.boost.max_speed(&self.config.boost, self.config.drive.max_speed)
    }

    pub fn wheel_visuals(&self) -> &[WheelVisual; 4] {
        &self.visuals
    }

    pub fn wheel_solutions(&self) -> &[Option<WheelSolution>; 4] {
        &self.solutions
    }

    pub fn debug_overlay<B: ChassisBody + ?Sized>(&self, body: &B) -> DebugOverlay {
        let pose = body.pose();
        let mut overlay = DebugOverlay {
            chassis: Some(DebugChassis {
                position: pose.translation.vector.into(),
                rotation: pose.rotation.coords.into(),
                half_extents: self.config.chassis.half_extents,
            }),
            ..DebugOverlay::default()
        };
        for (i, frame) in self.frames(&pose).iter().enumerate() {
            let ray = build_wheel_ray(frame, &self.config.suspension);
            push_ray_debug(&mut overlay, &ray, self.contacts[i].as_ref());
            push_wheel_debug(
                &mut overlay,
                &self.visuals[i],
                self.config.suspension.wheel_radius,
                self.solutions[i].as_ref(),
            );
        }
        overlay
    }

    fn refresh_telemetry(&mut self, linvel: Vec3, forward: Vec3, right: Vec3) {
        let speed = linvel.norm();
        self.telemetry = Telemetry {
            speed: if speed.is_finite() { speed } else { 0.0 },
            forward_speed: linvel.dot(&forward),
            drift_angle: signed_slip_angle(linvel, forward, right, DRIFT_ANGLE_MIN_SPEED),
        };
    }

    fn log_speed_tier(&mut self) {
        let tier = (self.telemetry.forward_speed.abs() / SPEED_TIER).floor() as u32;
        if tier != self.speed_tier {
            if tier > 0 {
                debug!(
                    speed = tier as f32 * SPEED_TIER,
                    boosting = self.boost.is_active(),
                    "speed tier"
                );
            }
            self.speed_tier = tier;
        }
    }
}
