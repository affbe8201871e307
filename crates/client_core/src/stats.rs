use std::time::{Duration, Instant};

use shared::protocol::Task;

const ANIMATION_SPAN: Duration = Duration::from_millis(200);
const MIN_STEP_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub completion_rate: u64,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len() as u64;
        let completed = tasks.iter().filter(|task| task.completed).count() as u64;
        Self {
            total,
            completed,
            pending: total - completed,
            completion_rate: completion_rate(completed, total),
        }
    }
}

/// Whole-percent completion; 0 for an empty list.
pub fn completion_rate(completed: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as u64
}

/// A displayed number that walks one unit at a time toward its target.
#[derive(Debug, Clone)]
pub struct AnimatedCounter {
    shown: u64,
    target: u64,
    step_interval: Duration,
    next_step_at: Option<Instant>,
}

impl Default for AnimatedCounter {
    fn default() -> Self {
        Self {
            shown: 0,
            target: 0,
            step_interval: MIN_STEP_INTERVAL,
            next_step_at: None,
        }
    }
}

impl AnimatedCounter {
    pub fn value(&self) -> u64 {
        self.shown
    }

    pub fn is_settled(&self) -> bool {
        self.shown == self.target
    }

    pub fn step_interval(&self) -> Duration {
        self.step_interval
    }

    pub fn set_target(&mut self, target: u64, now: Instant) {
        self.target = target;
        let delta = self.shown.abs_diff(target);
        if delta == 0 {
            self.next_step_at = None;
            return;
        }

        let per_step = ANIMATION_SPAN.as_millis() as u64 / delta;
        self.step_interval = if per_step == 0 {
            MIN_STEP_INTERVAL
        } else {
            Duration::from_millis(per_step)
        };
        self.next_step_at = Some(now + self.step_interval);
    }

    /// Applies every step due by `now`. Returns whether the shown value moved.
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_step_at else {
            return false;
        };
        if now < due {
            return false;
        }

        let elapsed_steps =
            1 + now.duration_since(due).as_nanos() / self.step_interval.as_nanos().max(1);
        let remaining = self.shown.abs_diff(self.target);
        let steps = u64::try_from(elapsed_steps)
            .unwrap_or(u64::MAX)
            .min(remaining);

        if self.target > self.shown {
            self.shown += steps;
        } else {
            self.shown -= steps;
        }

        self.next_step_at = if self.is_settled() {
            None
        } else {
            let steps = u32::try_from(steps).unwrap_or(u32::MAX);
            Some(due + self.step_interval.saturating_mul(steps))
        };
        true
    }

    pub fn settle(&mut self) {
        self.shown = self.target;
        self.next_step_at = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsDisplay {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub completion_rate: u64,
    /// Clear-completed is only offered while something is completed.
    pub show_clear_completed: bool,
    pub settled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StatBoard {
    total: AnimatedCounter,
    completed: AnimatedCounter,
    pending: AnimatedCounter,
    completion_rate: AnimatedCounter,
    targets: TaskStats,
}

impl StatBoard {
    pub fn set_targets(&mut self, stats: TaskStats, now: Instant) {
        self.targets = stats;
        self.total.set_target(stats.total, now);
        self.completed.set_target(stats.completed, now);
        self.pending.set_target(stats.pending, now);
        self.completion_rate.set_target(stats.completion_rate, now);
    }

    pub fn targets(&self) -> TaskStats {
        self.targets
    }

    pub fn advance(&mut self, now: Instant) -> bool {
        let mut moved = false;
        for counter in self.counters_mut() {
            moved |= counter.advance(now);
        }
        moved
    }

    pub fn settle(&mut self) {
        for counter in self.counters_mut() {
            counter.settle();
        }
    }

    pub fn snapshot(&self) -> StatsDisplay {
        StatsDisplay {
            total: self.total.value(),
            completed: self.completed.value(),
            pending: self.pending.value(),
            completion_rate: self.completion_rate.value(),
            show_clear_completed: self.targets.completed > 0,
            settled: self.total.is_settled()
                && self.completed.is_settled()
                && self.pending.is_settled()
                && self.completion_rate.is_settled(),
        }
    }

    fn counters_mut(&mut self) -> [&mut AnimatedCounter; 4] {
        [
            &mut self.total,
            &mut self.completed,
            &mut self.pending,
            &mut self.completion_rate,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_rate_rounds_to_nearest_percent() {
        assert_eq!(completion_rate(0, 0), 0);
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(1, 2), 50);
        assert_eq!(completion_rate(3, 3), 100);
        assert_eq!(completion_rate(1, 8), 13);
    }

    #[test]
    fn counter_step_interval_scales_with_distance() {
        let now = Instant::now();
        let mut counter = AnimatedCounter::default();
        counter.set_target(4, now);
        assert_eq!(counter.step_interval(), Duration::from_millis(50));

        counter.set_target(1000, now);
        assert_eq!(counter.step_interval(), Duration::from_millis(10));
    }

    #[test]
    fn counter_does_not_move_before_first_step() {
        let now = Instant::now();
        let mut counter = AnimatedCounter::default();
        counter.set_target(4, now);
        assert!(!counter.advance(now + Duration::from_millis(49)));
        assert_eq!(counter.value(), 0);
        assert!(counter.advance(now + Duration::from_millis(50)));
        assert_eq!(counter.value(), 1);
    }

    #[test]
    fn counter_converges_exactly_upward_and_downward() {
        let start = Instant::now();
        let mut counter = AnimatedCounter::default();
        counter.set_target(7, start);
        let mut now = start;
        for _ in 0..100 {
            now += Duration::from_millis(13);
            counter.advance(now);
        }
        assert_eq!(counter.value(), 7);
        assert!(counter.is_settled());

        counter.set_target(2, now);
        counter.advance(now + Duration::from_secs(5));
        assert_eq!(counter.value(), 2);
        assert!(!counter.advance(now + Duration::from_secs(6)));
    }

    #[test]
    fn board_snapshot_offers_clear_completed_from_targets() {
        let now = Instant::now();
        let mut board = StatBoard::default();
        board.set_targets(
            TaskStats {
                total: 3,
                completed: 1,
                pending: 2,
                completion_rate: 33,
            },
            now,
        );

        let snapshot = board.snapshot();
        assert!(snapshot.show_clear_completed);
        assert!(!snapshot.settled);

        board.advance(now + Duration::from_secs(1));
        let snapshot = board.snapshot();
        assert!(snapshot.settled);
        assert_eq!(
            (snapshot.total, snapshot.completed, snapshot.pending, snapshot.completion_rate),
            (3, 1, 2, 33)
        );
    }
}
