use std::time::Duration;

/// Interval between intermediate pointer positions during a glide.
pub const GLIDE_STEP: Duration = Duration::from_millis(10);

/// A straight-line pointer path from `from` to `to` spread over `duration`.
///
/// Iterating yields the intermediate points (excluding `from`, always ending
/// exactly on `to`). A zero duration yields `to` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glide {
    from: (i32, i32),
    to: (i32, i32),
    steps: u32,
}

impl Glide {
    pub fn new(from: (i32, i32), to: (i32, i32), duration: Duration) -> Self {
        let steps = (duration.as_millis() / GLIDE_STEP.as_millis()).max(1);
        Self {
            from,
            to,
            steps: u32::try_from(steps).unwrap_or(u32::MAX),
        }
    }

    /// Number of positions the glide visits.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Pause between two consecutive positions.
    pub fn step_interval(&self) -> Duration {
        if self.steps <= 1 {
            Duration::ZERO
        } else {
            GLIDE_STEP
        }
    }

    /// Position after `step` of `steps` increments.
    pub fn point_at(&self, step: u32) -> (i32, i32) {
        let step = step.min(self.steps);
        let t = f64::from(step) / f64::from(self.steps);
        (lerp(self.from.0, self.to.0, t), lerp(self.from.1, self.to.1, t))
    }

    pub fn points(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (1..=self.steps).map(|s| self.point_at(s))
    }
}

fn lerp(a: i32, b: i32, t: f64) -> i32 {
    let v = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
    v.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifty_ms_glide_has_five_points_ending_on_target() {
        let g = Glide::new((0, 0), (100, -50), Duration::from_millis(50));
        let pts: Vec<_> = g.points().collect();
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], (20, -10));
        assert_eq!(*pts.last().unwrap(), (100, -50));
        assert_eq!(g.step_interval(), GLIDE_STEP);
    }

    #[test]
    fn zero_duration_jumps() {
        let g = Glide::new((3, 3), (9, 9), Duration::ZERO);
        assert_eq!(g.points().collect::<Vec<_>>(), vec![(9, 9)]);
        assert_eq!(g.step_interval(), Duration::ZERO);
    }
}
