use serde::{Deserialize, Serialize};

/// Simulation tuning: timings for walls and doors, and integrator limits.
///
/// Every field has a default, so partial override files deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seconds an auto-closing door stays fully open before closing.
    pub door_wait_time: f32,
    /// Seconds for a wall to fade fully in or out of cloak.
    pub cloak_time: f32,
    /// Seconds an exploding wall keeps emitting fireballs.
    pub exploding_wall_time: f32,
    /// Fireballs emitted over the whole exploding-wall timeline.
    pub exploding_wall_fireballs: u32,
    /// Hit points of an undamaged blastable wall.
    pub wall_hit_points: f32,
    /// Maximum wall/body contacts resolved per body per frame.
    pub bounce_budget: u32,
    /// Extra clearance kept between a body and the walls it touches.
    pub collision_epsilon: f32,
    /// Rotational drag time constant relative to linear drag.
    pub rotational_drag_factor: f32,
    /// Bank angle (radians) per unit of yaw rate for turn-roll bodies.
    pub turnroll_scale: f32,
    /// Maximum bank change per second for turn-roll bodies.
    pub roll_rate: f32,
    /// Bounces a bouncing weapon survives before it detonates.
    pub max_weapon_bounces: u32,
    /// Size of the impact explosion a weapon leaves on a wall.
    pub impact_explosion_size: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            door_wait_time: 5.0,
            cloak_time: 1.0,
            exploding_wall_time: 1.0,
            exploding_wall_fireballs: 32,
            wall_hit_points: 100.0,
            bounce_budget: 3,
            collision_epsilon: 0.01,
            rotational_drag_factor: 2.5,
            turnroll_scale: 0.25,
            roll_rate: 2.0,
            max_weapon_bounces: 2,
            impact_explosion_size: 2.5,
        }
    }
}
