//! Stamina-gated sprinting

use super::tuning::StaminaTuning;

/// Sprint energy of a single player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamina {
    value: f32,
    /// Set while a sprint that started above the threshold is still running
    sprinting: bool,
    /// Seconds since stamina was last drained
    since_drain: f32,
}

impl Stamina {
    pub fn full(tuning: &StaminaTuning) -> Self {
        Self {
            value: tuning.max,
            sprinting: false,
            since_drain: tuning.regen_delay,
        }
    }

    pub fn with_value(value: f32, tuning: &StaminaTuning) -> Self {
        Self {
            value: value.clamp(0.0, tuning.max),
            ..Self::full(tuning)
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_sprinting(&self) -> bool {
        self.sprinting
    }

    /// Advance by `dt` seconds
    ///
    /// `wants_sprint` is the sprint key AND a non-zero move intent. Returns
    /// whether the player may move at sprint speed this frame. A sprint can
    /// only begin at `min_to_sprint` or above, but once begun it lasts until
    /// stamina runs out or the intent stops.
    pub fn update(&mut self, dt: f32, wants_sprint: bool, tuning: &StaminaTuning) -> bool {
        let dt = dt.max(0.0);

        if wants_sprint && (self.sprinting || self.value >= tuning.min_to_sprint) && self.value > 0.0
        {
            self.value = (self.value - tuning.drain_rate * dt).max(0.0);
            self.sprinting = self.value > 0.0;
            self.since_drain = 0.0;
            return true;
        }

        self.sprinting = false;

        // Only the part of this frame past the regen delay counts
        self.since_drain += dt;
        let regen_time = (self.since_drain - tuning.regen_delay).clamp(0.0, dt);
        if regen_time > 0.0 {
            self.value = (self.value + tuning.regen_rate * regen_time).min(tuning.max);
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Tuning;
    use proptest::prelude::*;

    fn tuning() -> StaminaTuning {
        Tuning::default().stamina
    }

    fn run(stamina: &mut Stamina, secs: f32, sprint: bool, dt: f32) -> bool {
        let t = tuning();
        let steps = (secs / dt).round() as usize;
        let mut allowed = false;
        for _ in 0..steps {
            allowed = stamina.update(dt, sprint, &t);
        }
        allowed
    }

    #[test]
    fn sprint_then_rest_scenario() {
        let mut stamina = Stamina::full(&tuning());

        assert!(run(&mut stamina, 2.0, true, 0.1));
        assert!((stamina.value() - 50.0).abs() < 1e-3);

        run(&mut stamina, tuning().regen_delay + 1.0, false, 0.1);
        assert!((stamina.value() - 65.0).abs() < 1e-3);
    }

    #[test]
    fn regen_waits_for_delay() {
        let t = tuning();
        let mut stamina = Stamina::with_value(40.0, &t);
        stamina.update(0.5, true, &t);
        let drained = stamina.value();

        run(&mut stamina, 0.9, false, 0.1);
        assert!((stamina.value() - drained).abs() < 1e-4);
    }

    #[test]
    fn cannot_start_below_threshold() {
        let t = tuning();
        let mut stamina = Stamina::with_value(t.min_to_sprint - 1.0, &t);
        assert!(!stamina.update(1.0 / 60.0, true, &t));
        assert!(!stamina.is_sprinting());
    }

    #[test]
    fn started_sprint_runs_until_exhausted() {
        let t = tuning();
        let mut stamina = Stamina::with_value(t.min_to_sprint + 1.0, &t);

        // 0.2s dips below the start threshold but keeps sprinting
        assert!(run(&mut stamina, 0.2, true, 0.05));
        assert!(stamina.value() < t.min_to_sprint);
        assert!(stamina.is_sprinting());

        run(&mut stamina, 1.0, true, 0.05);
        assert_eq!(stamina.value(), 0.0);
        assert!(!stamina.update(0.05, true, &t));
    }

    #[test]
    fn releasing_sprint_requires_threshold_again() {
        let t = tuning();
        let mut stamina = Stamina::with_value(t.min_to_sprint + 1.0, &t);
        run(&mut stamina, 0.2, true, 0.05);
        stamina.update(0.05, false, &t);
        assert!(!stamina.update(0.05, true, &t));
    }

    proptest! {
        #[test]
        fn stays_within_bounds(inputs in prop::collection::vec((0.0f32..0.5, any::<bool>()), 1..200)) {
            let t = tuning();
            let mut stamina = Stamina::full(&t);
            for (dt, sprint) in inputs {
                stamina.update(dt, sprint, &t);
                prop_assert!(stamina.value() >= 0.0);
                prop_assert!(stamina.value() <= t.max);
            }
        }
    }
}
