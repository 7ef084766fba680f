// ==============================================================================
// physics.rs — RAPIER3D BACKEND
// ------------------------------------------------------------------------------
// Owns the rapier pipeline and every vehicle living in it.
//
// - Static ground: a large box whose top surface is y = 0
// - Vehicles: dynamic box chassis, explicit mass properties (lowered COM),
//   zero friction; wheels are rays only, the chassis box is a crash hull
// - RapierGround: WorldQuery over the query pipeline (excludes the chassis)
// - ChassisBody for rapier's RigidBody
//
// Tick order:
//   1) query pipeline refresh
//   2) per vehicle: frame update + probes (read-only), then fixed step (write)
//   3) rapier integration
//   4) sanity pass on exploded bodies
// ==============================================================================

use std::collections::HashMap;

use rapier3d::prelude::*;
use tracing::{debug, info, warn};

use crate::boost::BoostActivation;
use crate::config::VehicleConfig;
use crate::debug_builders::DebugOverlay;
use crate::dynamics::types::{DriverInput, GroundHit};
use crate::error::WorldError;
use crate::host::{ChassisBody, WorldQuery};
use crate::state::{VehicleSnapshot, WorldSnapshot};
use crate::vehicle::Vehicle;

const GROUP_GROUND: Group = Group::from_bits_truncate(0b0001);
const GROUP_CHASSIS: Group = Group::from_bits_truncate(0b0010);

const WORLD_LIMIT: f32 = 1_000.0; // m from origin before a body counts as exploded

// ============================================
// ----- rapier as a vehicle host -------------
// ============================================

impl ChassisBody for RigidBody {
    fn pose(&self) -> Isometry<Real> {
        *self.position()
    }

    fn center_of_mass(&self) -> Point<Real> {
        // world space
        *RigidBody::center_of_mass(self)
    }

    fn mass(&self) -> f32 {
        RigidBody::mass(self)
    }

    fn linvel(&self) -> Vector<Real> {
        *RigidBody::linvel(self)
    }

    fn angvel(&self) -> Vector<Real> {
        *RigidBody::angvel(self)
    }

    fn set_linvel(&mut self, linvel: Vector<Real>) {
        RigidBody::set_linvel(self, linvel, false);
    }

    fn set_angvel(&mut self, angvel: Vector<Real>) {
        RigidBody::set_angvel(self, angvel, false);
    }

    fn apply_impulse_at_point(&mut self, impulse: Vector<Real>, point: Point<Real>) {
        RigidBody::apply_impulse_at_point(self, impulse, point, true);
    }

    fn apply_torque_impulse(&mut self, impulse: Vector<Real>) {
        RigidBody::apply_torque_impulse(self, impulse, true);
    }

    fn sleep(&mut self) {
        RigidBody::sleep(self);
    }

    fn wake_up(&mut self) {
        RigidBody::wake_up(self, true);
    }

    fn clear_forces(&mut self) {
        self.reset_forces(false);
        self.reset_torques(false);
    }
}

/// Ground probes against everything except the probing chassis.
pub struct RapierGround<'a> {
    pub query: &'a QueryPipeline,
    pub bodies: &'a RigidBodySet,
    pub colliders: &'a ColliderSet,
    pub exclude: RigidBodyHandle,
}

impl WorldQuery for RapierGround<'_> {
    fn cast_ray(&self, origin: Point<Real>, dir: Vector<Real>, max_distance: f32) -> Option<GroundHit> {
        let ray = Ray::new(origin, dir);
        let filter = QueryFilter::default()
            .exclude_rigid_body(self.exclude)
            .groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND));

        let (_collider, hit) =
            self.query
                .cast_ray_and_get_normal(self.bodies, self.colliders, &ray, max_distance, true, filter)?;

        Some(GroundHit {
            distance: hit.time_of_impact,
            point: ray.point_at(hit.time_of_impact),
            normal: hit.normal,
        })
    }
}

// ============================================
// ----- world --------------------------------
// ============================================

struct VehicleSlot {
    body: RigidBodyHandle,
    vehicle: Vehicle,
    input: DriverInput,
    spawn: [f32; 3],
}

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,              // gravity vector
    pub pipeline: PhysicsPipeline,          // physics pipeline
    pub island_manager: IslandManager,      // manages islands of bodies
    pub broad_phase: DefaultBroadPhase,     // broad-phase collision detection
    pub narrow_phase: NarrowPhase,          // collision detection
    pub bodies: RigidBodySet,               // for rigid bodies
    pub colliders: ColliderSet,             // for collision shapes
    pub joints: ImpulseJointSet,            // for constraints
    pub multibody_joints: MultibodyJointSet,// for articulated bodies
    pub ccd: CCDSolver,                     // continuous collision detection
    pub query_pipeline: QueryPipeline,      // for raycasting
    vehicles: HashMap<String, VehicleSlot>, // id -> vehicle
    tick: u64,
    time: f32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        let gravity = vector![0.0, -9.81, 0.0];

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        // Big static ground box, top surface exactly at y = 0.
        let ground_rb = RigidBodyBuilder::fixed()
            .translation(vector![0.0, -1.0, 0.0])
            .build();
        let ground_handle = bodies.insert(ground_rb);

        let ground_collider = ColliderBuilder::cuboid(500.0, 1.0, 500.0)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS))
            .friction(1.2)
            .restitution(0.0)
            .build();
        colliders.insert_with_parent(ground_collider, ground_handle, &mut bodies);

        debug!(bodies = bodies.len(), colliders = colliders.len(), "ground inserted");

        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            vehicles: HashMap::new(),
            tick: 0,
            time: 0.0,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Extra static geometry (ramps, walls). `rotation` is a scaled axis in radians.
    pub fn add_static_cuboid(&mut self, half_extents: [f32; 3], translation: [f32; 3], rotation: [f32; 3]) -> ColliderHandle {
        let [hx, hy, hz] = half_extents;
        let [tx, ty, tz] = translation;
        let [rx, ry, rz] = rotation;
        let rb = RigidBodyBuilder::fixed()
            .translation(vector![tx, ty, tz])
            .rotation(vector![rx, ry, rz])
            .build();
        let handle = self.bodies.insert(rb);
        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS))
            .friction(1.2)
            .restitution(0.0)
            .build();
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies)
    }

    /// Spawn a vehicle chassis. An existing vehicle with the same id is replaced.
    pub fn spawn_vehicle(
        &mut self,
        id: impl Into<String>,
        config: VehicleConfig,
        position: [f32; 3],
    ) -> Result<RigidBodyHandle, WorldError> {
        let id = id.into();
        let vehicle = Vehicle::new(config)?;
        let cfg = vehicle.config();

        if self.vehicles.contains_key(&id) {
            self.despawn_vehicle(&id)?;
        }

        let [px, py, pz] = position;
        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![px, py, pz])
            .linear_damping(cfg.chassis.linear_damping)
            .angular_damping(cfg.chassis.angular_damping)
            .ccd_enabled(true)
            .build();

        // Box inertia about its own centre, mass concentrated at the lowered COM.
        let m = cfg.chassis.mass;
        let [hx, hy, hz] = cfg.chassis.half_extents;
        let [cx, cy, cz] = cfg.chassis.com_offset;
        let inertia = vector![
            m / 3.0 * (hy * hy + hz * hz),
            m / 3.0 * (hx * hx + hz * hz),
            m / 3.0 * (hx * hx + hy * hy)
        ];

        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .collision_groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND))
            .active_events(ActiveEvents::empty())
            .mass_properties(MassProperties::new(point![cx, cy, cz], m, inertia))
            .friction(0.0)
            .restitution(0.0)
            .build();

        let handle = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        // world-space COM is valid before the first pipeline step
        if let Some(body) = self.bodies.get_mut(handle) {
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }

        info!(vehicle = %id, ?position, ?handle, "vehicle spawned");

        self.vehicles.insert(
            id,
            VehicleSlot { body: handle, vehicle, input: DriverInput::default(), spawn: position },
        );
        Ok(handle)
    }

    pub fn despawn_vehicle(&mut self, id: &str) -> Result<(), WorldError> {
        let slot = self.vehicles.remove(id).ok_or_else(|| WorldError::UnknownVehicle(id.to_string()))?;
        self.bodies.remove(
            slot.body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            true,
        );
        debug!(vehicle = %id, "vehicle despawned");
        Ok(())
    }

    fn slot(&self, id: &str) -> Result<&VehicleSlot, WorldError> {
        self.vehicles.get(id).ok_or_else(|| WorldError::UnknownVehicle(id.to_string()))
    }

    fn slot_mut(&mut self, id: &str) -> Result<&mut VehicleSlot, WorldError> {
        self.vehicles.get_mut(id).ok_or_else(|| WorldError::UnknownVehicle(id.to_string()))
    }

    /// Store input; it is consumed on the next `step`.
    pub fn set_input(&mut self, id: &str, input: DriverInput) -> Result<(), WorldError> {
        self.slot_mut(id)?.input = input;
        Ok(())
    }

    pub fn activate_boost(&mut self, id: &str, duration: f32) -> Result<BoostActivation, WorldError> {
        Ok(self.slot_mut(id)?.vehicle.activate_boost(duration))
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), WorldError> {
        let slot = self.vehicles.get_mut(id).ok_or_else(|| WorldError::UnknownVehicle(id.to_string()))?;
        let body = self.bodies.get_mut(slot.body).ok_or_else(|| WorldError::MissingBody(id.to_string()))?;
        if enabled {
            slot.vehicle.enable(body);
        } else {
            slot.vehicle.disable(body);
        }
        Ok(())
    }

    pub fn reset_transient_state(&mut self, id: &str) -> Result<(), WorldError> {
        let slot = self.slot_mut(id)?;
        slot.vehicle.reset_transient_state();
        slot.input = DriverInput::default();
        Ok(())
    }

    pub fn vehicle(&self, id: &str) -> Result<&Vehicle, WorldError> {
        Ok(&self.slot(id)?.vehicle)
    }

    pub fn body(&self, id: &str) -> Result<&RigidBody, WorldError> {
        let slot = self.slot(id)?;
        self.bodies.get(slot.body).ok_or_else(|| WorldError::MissingBody(id.to_string()))
    }

    pub fn vehicle_snapshot(&self, id: &str) -> Result<VehicleSnapshot, WorldError> {
        let slot = self.slot(id)?;
        let body = self.body(id)?;
        Ok(VehicleSnapshot::capture(id, &slot.vehicle, body))
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let mut vehicles: Vec<VehicleSnapshot> = self
            .vehicles
            .iter()
            .filter_map(|(id, slot)| {
                let body = self.bodies.get(slot.body)?;
                Some(VehicleSnapshot::capture(id, &slot.vehicle, body))
            })
            .collect();
        vehicles.sort_by(|a, b| a.id.cmp(&b.id));
        WorldSnapshot { tick: self.tick, time: self.time, vehicles }
    }

    pub fn debug_overlay(&self, id: &str) -> Result<DebugOverlay, WorldError> {
        let slot = self.slot(id)?;
        let body = self.body(id)?;
        Ok(slot.vehicle.debug_overlay(body))
    }

    // ==========================================================================
    // Step
    // ==========================================================================
    pub fn step(&mut self, dt: Real) {
        // 1) Fresh broad-phase data for the ground probes
        self.query_pipeline.update(&self.colliders);

        // 2) Vehicles: read-only phase, then the single writer
        for (id, slot) in self.vehicles.iter_mut() {
            let Some(body) = self.bodies.get(slot.body) else {
                warn!(vehicle = %id, "vehicle body missing, skipped");
                continue;
            };
            slot.vehicle.update_frame(slot.input, body, dt);

            let ground = RapierGround {
                query: &self.query_pipeline,
                bodies: &self.bodies,
                colliders: &self.colliders,
                exclude: slot.body,
            };
            let probes = slot.vehicle.probe_wheels(body, &ground);

            if let Some(body) = self.bodies.get_mut(slot.body) {
                slot.vehicle.fixed_step(body, &probes, dt);
            }
        }

        // 3) Integrate
        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters { dt, ..IntegrationParameters::default() },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );

        // 4) Safety: put exploded vehicles back at their spawn point
        for (id, slot) in self.vehicles.iter_mut() {
            let Some(body) = self.bodies.get_mut(slot.body) else {
                continue;
            };
            let pos = *body.translation();
            let bad = !pos.iter().all(|c| c.is_finite()) || pos.iter().any(|c| c.abs() > WORLD_LIMIT);
            if bad {
                let [x, y, z] = slot.spawn;
                body.set_position(Isometry::translation(x, y, z), true);
                body.set_linvel(Vector::zeros(), true);
                body.set_angvel(Vector::zeros(), true);
                slot.vehicle.reset_transient_state();
                warn!(vehicle = %id, ?pos, "reset exploded vehicle to spawn");
            }
        }

        self.tick += 1;
        self.time += dt;
    }
}
