//! Update-step math shared by the scenes
//!
//! Per-frame constants in the scenes were tuned at 60 Hz; `frame_factor(dt)`
//! rescales them for whatever cadence the clock actually delivers.

use glam::Vec2;

use super::store::EntityStore;
use crate::consts::{MAX_DT, REFERENCE_FRAME_SECS, SPRING_FRICTION, SPRING_TENSION};
use crate::frame_factor;

/// Linear motion: `pos += vel * frame_factor(dt)`
#[inline]
pub fn integrate(pos: &mut Vec2, vel: Vec2, dt: f32) {
    *pos += vel * frame_factor(dt);
}

/// Clamp an incoming dt to the largest step the integrators tolerate
#[inline]
pub fn clamp_dt(dt: f32) -> f32 {
    dt.clamp(0.0, MAX_DT)
}

/// Per-frame multiplicative decay (`v *= rate` at 60 Hz) applied over `dt`
#[inline]
pub fn decay(rate: f32, dt: f32) -> f32 {
    rate.powf(frame_factor(dt))
}

/// Move `current` a fixed fraction of the way to `target`
#[inline]
pub fn ease_toward(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}

/// Damped spring toward a target.
///
/// Not real physics: tension and friction are tuned by eye for a
/// critically-damped feel, and one step is one reference frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    /// Pull strength toward the target per step
    pub tension: f32,
    /// Velocity retained per step
    pub friction: f32,
}

impl Default for Spring {
    fn default() -> Self {
        Self {
            tension: SPRING_TENSION,
            friction: SPRING_FRICTION,
        }
    }
}

impl Spring {
    pub const fn new(tension: f32, friction: f32) -> Self {
        Self { tension, friction }
    }

    /// Per-frame equivalent of a unit-mass spring with `stiffness` and
    /// `damping` given per second, sampled at the reference frame rate
    pub fn from_stiffness(stiffness: f32, damping: f32) -> Self {
        let h = REFERENCE_FRAME_SECS;
        Self {
            tension: stiffness * h * h,
            friction: (1.0 - damping * h).clamp(0.0, 1.0),
        }
    }

    /// One step: `vel += (target - pos) * tension; vel *= friction; pos += vel`
    pub fn step(&self, pos: &mut Vec2, vel: &mut Vec2, target: Vec2) {
        *vel += (target - *pos) * self.tension;
        *vel *= self.friction;
        *pos += *vel;
    }

    pub fn step_scalar(&self, value: &mut f32, vel: &mut f32, target: f32) {
        *vel += (target - *value) * self.tension;
        *vel *= self.friction;
        *value += *vel;
    }

    /// Take `steps` reference-frame steps (see `StepCarry`)
    pub fn advance(&self, pos: &mut Vec2, vel: &mut Vec2, target: Vec2, steps: u32) {
        for _ in 0..steps {
            self.step(pos, vel, target);
        }
    }
}

/// Turns frame dt into whole reference-frame steps, carrying the remainder.
///
/// On a 144 Hz display most frames take no step and every 2-3 frames take
/// one, so a spring covers the same ground per second at any refresh rate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepCarry {
    carry: f32,
}

impl StepCarry {
    /// Float slack so 1/144 s accumulated 12 times still counts as 5 steps
    const SLACK: f32 = 1e-4;

    pub fn take(&mut self, dt: f32) -> u32 {
        self.carry += frame_factor(clamp_dt(dt));
        let steps = (self.carry + Self::SLACK).floor().max(0.0);
        self.carry -= steps;
        steps as u32
    }

    pub fn reset(&mut self) {
        self.carry = 0.0;
    }
}

/// Radius collision: centers closer than the sum of the radii (strict)
#[inline]
pub fn collides(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    a.distance_squared(b) < reach * reach
}

/// `floor(score / divisor) + 1`
#[inline]
pub fn level_for_score(score: u64, divisor: u64) -> u32 {
    (score / divisor.max(1)) as u32 + 1
}

/// Resolve projectile-vs-target hits for one tick.
///
/// Targets are visited in store order and each checks projectiles in store
/// order. A projectile that hits is spent and skipped by every later check.
/// `on_hit` returns true when the target is destroyed; a destroyed target
/// stops checking further projectiles. Returns the number destroyed.
pub fn resolve_hits<P, T, H, F>(
    projectiles: &mut EntityStore<P>,
    targets: &mut EntityStore<T>,
    hits: H,
    mut on_hit: F,
) -> usize
where
    H: Fn(&P, &T) -> bool,
    F: FnMut(&P, &mut T) -> bool,
{
    if projectiles.is_empty() || targets.is_empty() {
        return 0;
    }

    let mut spent = vec![false; projectiles.len()];
    let mut destroyed = 0;

    targets.update_retain(|target| {
        for (i, projectile) in projectiles.iter().enumerate() {
            if spent[i] || !hits(projectile, target) {
                continue;
            }
            spent[i] = true;
            if on_hit(projectile, target) {
                destroyed += 1;
                return false;
            }
        }
        true
    });

    let mut index = 0;
    projectiles.retain(|_| {
        let keep = !spent[index];
        index += 1;
        keep
    });

    destroyed
}

/// Wrap a position around the surface once it is `margin` past an edge
pub fn wrap(pos: &mut Vec2, size: Vec2, margin: f32) {
    if pos.x < -margin {
        pos.x = size.x + margin;
    } else if pos.x > size.x + margin {
        pos.x = -margin;
    }
    if pos.y < -margin {
        pos.y = size.y + margin;
    } else if pos.y > size.y + margin {
        pos.y = -margin;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ship_asteroid_scenario() {
        let ship = Vec2::new(100.0, 100.0);
        assert!(collides(ship, 20.0, Vec2::new(110.0, 105.0), 15.0));
        assert!(!collides(ship, 20.0, Vec2::new(200.0, 100.0), 15.0));
    }

    #[test]
    fn test_touching_is_not_a_hit() {
        assert!(!collides(Vec2::ZERO, 10.0, Vec2::new(20.0, 0.0), 10.0));
        assert!(collides(Vec2::ZERO, 10.0, Vec2::new(19.99, 0.0), 10.0));
    }

    #[test]
    fn test_spring_settles() {
        let spring = Spring::new(0.04, 0.85);
        let target = Vec2::new(100.0, 50.0);
        let mut pos = Vec2::ZERO;
        let mut vel = Vec2::ZERO;
        for _ in 0..500 {
            spring.step(&mut pos, &mut vel, target);
        }
        assert!(pos.distance(target) < 0.01);
        assert!(vel.length() < 0.01);
    }

    #[test]
    fn test_stiffness_spring_settles_without_ringing_forever() {
        let spring = Spring::from_stiffness(500.0, 28.0);
        assert!(spring.tension > 0.1 && spring.tension < 0.2);
        assert!(spring.friction > 0.5 && spring.friction < 0.6);
        let mut pos = Vec2::ZERO;
        let mut vel = Vec2::ZERO;
        for _ in 0..120 {
            spring.step(&mut pos, &mut vel, Vec2::new(40.0, 40.0));
        }
        assert!(pos.distance(Vec2::new(40.0, 40.0)) < 0.01);
    }

    fn settle_for(hz: f32, secs: f32) -> Vec2 {
        let spring = Spring::default();
        let mut carry = StepCarry::default();
        let (mut pos, mut vel) = (Vec2::ZERO, Vec2::ZERO);
        let frames = (secs * hz).round() as usize;
        for _ in 0..frames {
            let steps = carry.take(1.0 / hz);
            spring.advance(&mut pos, &mut vel, Vec2::new(100.0, 0.0), steps);
        }
        pos
    }

    #[test]
    fn test_spring_motion_is_refresh_rate_independent() {
        let at_60 = settle_for(60.0, 0.5);
        for hz in [120.0, 144.0, 30.0] {
            let other = settle_for(hz, 0.5);
            assert!(at_60.distance(other) < 0.5, "{hz} Hz: {other} vs {at_60}");
        }
    }

    #[test]
    fn test_step_carry_keeps_the_remainder() {
        let mut carry = StepCarry::default();
        let steps: u32 = (0..12).map(|_| carry.take(1.0 / 144.0)).sum();
        assert_eq!(steps, 5);
        assert_eq!(carry.take(1.0 / 30.0), 2);
        // Backgrounded tab: clamped to MAX_DT
        carry.reset();
        assert_eq!(carry.take(5.0), 6);
    }

    #[test]
    fn test_integrate_at_reference_rate() {
        let mut pos = Vec2::ZERO;
        integrate(&mut pos, Vec2::new(2.0, -1.0), crate::consts::REFERENCE_FRAME_SECS);
        assert!((pos - Vec2::new(2.0, -1.0)).length() < 1e-4);
        assert_eq!(clamp_dt(5.0), MAX_DT);
    }

    #[test]
    fn test_one_projectile_cannot_score_twice() {
        // Two overlapping targets, one laser
        let mut lasers = EntityStore::new();
        lasers.spawn(Vec2::new(50.0, 50.0));
        let mut rocks = EntityStore::new();
        rocks.spawn((Vec2::new(50.0, 52.0), 1u32));
        rocks.spawn((Vec2::new(51.0, 50.0), 1u32));

        let mut score = 0;
        let destroyed = resolve_hits(
            &mut lasers,
            &mut rocks,
            |l, (p, _)| collides(*l, 0.0, *p, 20.0),
            |_, (_, hp)| {
                *hp -= 1;
                score += 10;
                *hp == 0
            },
        );
        assert_eq!(destroyed, 1);
        assert_eq!(score, 10);
        assert!(lasers.is_empty());
        assert_eq!(rocks.len(), 1);
        // First target in store order took the hit
        assert_eq!(rocks.iter().next().unwrap().0, Vec2::new(51.0, 50.0));
    }

    #[test]
    fn test_tough_target_absorbs_several_projectiles() {
        let mut lasers = EntityStore::new();
        lasers.extend([Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)]);
        let mut rocks = EntityStore::new();
        rocks.spawn((Vec2::ZERO, 2u32));

        let destroyed = resolve_hits(
            &mut lasers,
            &mut rocks,
            |l, (p, _)| collides(*l, 0.0, *p, 30.0),
            |_, (_, hp)| {
                *hp -= 1;
                *hp == 0
            },
        );
        assert_eq!(destroyed, 1);
        assert!(rocks.is_empty());
        // Third laser was never spent
        assert_eq!(lasers.len(), 1);
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(level_for_score(0, 500), 1);
        assert_eq!(level_for_score(499, 500), 1);
        assert_eq!(level_for_score(500, 500), 2);
        assert_eq!(level_for_score(1234, 500), 3);
    }

    #[test]
    fn test_wrap() {
        let size = Vec2::new(100.0, 100.0);
        let mut p = Vec2::new(-21.0, 50.0);
        wrap(&mut p, size, 20.0);
        assert_eq!(p.x, 120.0);
        let mut p = Vec2::new(50.0, 121.0);
        wrap(&mut p, size, 20.0);
        assert_eq!(p.y, -20.0);
    }

    proptest! {
        #[test]
        fn prop_collision_is_symmetric(
            ax in -1000.0f32..1000.0, ay in -1000.0f32..1000.0, ra in 0.0f32..100.0,
            bx in -1000.0f32..1000.0, by in -1000.0f32..1000.0, rb in 0.0f32..100.0,
        ) {
            let a = Vec2::new(ax, ay);
            let b = Vec2::new(bx, by);
            prop_assert_eq!(collides(a, ra, b, rb), collides(b, rb, a, ra));
        }

        #[test]
        fn prop_score_and_level_monotonic(
            awards in proptest::collection::vec(0u64..200, 0..100),
        ) {
            let mut score = 0u64;
            let mut level = level_for_score(score, 500);
            for award in awards {
                let before = score;
                score += award;
                prop_assert!(score >= before);
                let next = level_for_score(score, 500);
                prop_assert!(next >= level);
                prop_assert_eq!(next as u64, score / 500 + 1);
                level = next;
            }
        }

        #[test]
        fn prop_spring_converges(
            sx in -2000.0f32..2000.0, sy in -2000.0f32..2000.0,
            tx in -2000.0f32..2000.0, ty in -2000.0f32..2000.0,
        ) {
            let spring = Spring::default();
            let target = Vec2::new(tx, ty);
            let mut pos = Vec2::new(sx, sy);
            let mut vel = Vec2::ZERO;
            for _ in 0..600 {
                spring.step(&mut pos, &mut vel, target);
            }
            prop_assert!(pos.distance(target) < 0.05);
            prop_assert!(vel.length() < 0.05);
        }
    }
}
