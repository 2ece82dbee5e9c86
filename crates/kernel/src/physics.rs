//! Per-frame drag, thrust and rotation integration for physics movers.

use glam::{EulerRot, Quat, Vec3};

use crate::body::{PhysicsFlags, PhysicsInfo};
use crate::config::SimConfig;

/// Exponential decay factor and the matching thrust scale for time constant `tau`.
fn decay(tau: f32, frame_time: f32) -> (f32, f32) {
    if tau <= 0.0 || frame_time <= 0.0 {
        return (1.0, 1.0);
    }
    let decay = (-frame_time / tau).exp();
    (decay, (1.0 - decay) * tau / frame_time)
}

/// Apply drag and thrust to linear and angular velocity.
pub fn apply_drag(physics: &mut PhysicsInfo, frame_time: f32, config: &SimConfig) {
    let tau = physics.mass * physics.drag;
    let (linear, thrust_scale) = decay(tau, frame_time);
    let thrust = if physics.flags.contains(PhysicsFlags::USES_THRUST) {
        physics.thrust * thrust_scale
    } else {
        Vec3::ZERO
    };
    physics.velocity = physics.velocity * linear + thrust;

    let (angular, rot_scale) = decay(tau * config.rotational_drag_factor, frame_time);
    physics.rot_velocity = physics.rot_velocity * angular + physics.rot_thrust * rot_scale;
}

/// Rotation by local pitch (x), heading (y) and bank (z) angles.
fn local_rotation(angles: Vec3) -> Quat {
    Quat::from_euler(EulerRot::YXZ, angles.y, angles.x, angles.z)
}

/// Integrate angular velocity into `orientation`, banking into turns for
/// turn-roll bodies.
pub fn integrate_rotation(
    orientation: Quat,
    physics: &mut PhysicsInfo,
    frame_time: f32,
    config: &SimConfig,
) -> Quat {
    let turnroll = physics.flags.contains(PhysicsFlags::TURNROLL);
    let mut orient = orientation;
    if turnroll {
        orient *= Quat::from_rotation_z(-physics.turnroll);
    }
    let angles = physics.rot_velocity * frame_time;
    if angles != Vec3::ZERO {
        orient *= local_rotation(angles);
    }
    if turnroll {
        let target = -physics.rot_velocity.y * config.turnroll_scale;
        let max_step = config.roll_rate * frame_time;
        physics.turnroll += (target - physics.turnroll).clamp(-max_step, max_step);
        orient *= Quat::from_rotation_z(physics.turnroll);
    }
    orient.normalize()
}

/// Rotation only, for bodies that spin in place.
pub fn spin(orientation: Quat, rot_velocity: Vec3, frame_time: f32) -> Quat {
    (orientation * local_rotation(rot_velocity * frame_time)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_drag_keeps_velocity() {
        let mut p = PhysicsInfo {
            velocity: Vec3::new(3.0, 0.0, 0.0),
            ..PhysicsInfo::default()
        };
        apply_drag(&mut p, 0.1, &SimConfig::default());
        assert_eq!(p.velocity, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn drag_decays_exponentially() {
        let mut p = PhysicsInfo {
            velocity: Vec3::new(10.0, 0.0, 0.0),
            mass: 2.0,
            drag: 0.5,
            ..PhysicsInfo::default()
        };
        apply_drag(&mut p, 1.0, &SimConfig::default());
        assert!((p.velocity.x - 10.0 * (-1.0f32).exp()).abs() < 1e-4);
    }

    #[test]
    fn thrust_approaches_terminal_velocity() {
        let mut p = PhysicsInfo {
            thrust: Vec3::new(0.0, 0.0, 5.0),
            mass: 1.0,
            drag: 1.0,
            flags: PhysicsFlags::USES_THRUST,
            ..PhysicsInfo::default()
        };
        let config = SimConfig::default();
        for _ in 0..200 {
            apply_drag(&mut p, 0.1, &config);
        }
        // Fixed point of v = v*d + T*(1-d)*tau/ft is T*tau/ft.
        assert!((p.velocity.z - 50.0).abs() < 0.5);
    }

    #[test]
    fn thrust_ignored_without_flag() {
        let mut p = PhysicsInfo {
            thrust: Vec3::X,
            ..PhysicsInfo::default()
        };
        apply_drag(&mut p, 0.1, &SimConfig::default());
        assert_eq!(p.velocity, Vec3::ZERO);
    }

    #[test]
    fn rotation_integrates_heading() {
        let mut p = PhysicsInfo {
            rot_velocity: Vec3::new(0.0, 1.0, 0.0),
            ..PhysicsInfo::default()
        };
        let q = integrate_rotation(Quat::IDENTITY, &mut p, 0.5, &SimConfig::default());
        let expected = Quat::from_rotation_y(0.5);
        assert!(q.angle_between(expected) < 1e-4);
    }

    #[test]
    fn turnroll_banks_toward_target_at_limited_rate() {
        let config = SimConfig::default();
        let mut p = PhysicsInfo {
            rot_velocity: Vec3::new(0.0, 4.0, 0.0),
            flags: PhysicsFlags::TURNROLL,
            ..PhysicsInfo::default()
        };
        integrate_rotation(Quat::IDENTITY, &mut p, 0.1, &config);
        // Target bank is -1.0 rad; one frame may move at most roll_rate * ft.
        assert!((p.turnroll + 0.2).abs() < 1e-5);
        for _ in 0..20 {
            integrate_rotation(Quat::IDENTITY, &mut p, 0.1, &config);
        }
        assert!((p.turnroll + 1.0).abs() < 1e-5);
    }

    #[test]
    fn spinning_keeps_unit_orientation() {
        let mut q = Quat::IDENTITY;
        for _ in 0..1000 {
            q = spin(q, Vec3::new(0.3, 1.1, -0.7), 0.016);
        }
        assert!((q.length() - 1.0).abs() < 1e-4);
    }
}
