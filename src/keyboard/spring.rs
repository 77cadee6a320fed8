//! Critically-damped spring used to animate key depression.
//!
//! The integrator runs once per frame with fixed constants. A step input
//! overshoots once, then rings down to within 1% of the target in a bounded
//! number of frames.

/// Spring stiffness applied to the distance from the target.
pub const STIFFNESS: f32 = 0.2;

/// Fraction of velocity lost each frame.
pub const DAMPING: f32 = 0.15;

/// Position and velocity of one spring.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpringState {
    /// Current displacement
    pub current: f32,
    /// Displacement change applied on the last step
    pub velocity: f32,
}

impl SpringState {
    /// Advances the spring one frame toward `target`.
    pub fn step(&mut self, target: f32) {
        let force = (target - self.current) * STIFFNESS;
        self.velocity = (self.velocity + force) * (1.0 - DAMPING);
        self.current += self.velocity;
    }

    /// Returns true if the spring is within `epsilon` of `target` and nearly still.
    #[must_use]
    pub fn is_settled(&self, target: f32, epsilon: f32) -> bool {
        (self.current - target).abs() <= epsilon && self.velocity.abs() <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_input_converges() {
        let target = 2.0;
        let mut spring = SpringState::default();
        let mut last_outside = 0;

        for tick in 1..=200 {
            spring.step(target);
            if (spring.current - target).abs() > 0.01 * target {
                last_outside = tick;
            }
        }

        assert!(last_outside < 60, "still outside 1% band at tick {last_outside}");
        assert!(spring.is_settled(target, 1e-3));
    }

    #[test]
    fn test_motion_is_continuous() {
        let target = 2.0;
        let mut spring = SpringState::default();
        let mut previous = spring.current;

        for _ in 0..200 {
            spring.step(target);
            let jump = (spring.current - previous).abs();
            assert!(jump <= 0.5 * target, "jumped {jump} in one frame");
            previous = spring.current;
        }
    }

    #[test]
    fn test_overshoot_is_transient() {
        let mut spring = SpringState::default();
        let mut peak: f32 = 0.0;
        for _ in 0..200 {
            spring.step(1.0);
            peak = peak.max(spring.current);
        }
        assert!(peak > 1.0);
        assert!((spring.current - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_rest_stays_at_rest() {
        let mut spring = SpringState::default();
        for _ in 0..10 {
            spring.step(0.0);
        }
        assert_eq!(spring, SpringState::default());
    }
}
