//! Opacity transitions.
//!
//! All in-flight transitions live in one table keyed by region id and are advanced
//! together once per frame. Cancelling a transition is a table removal.

use std::collections::HashMap;

use super::region::RegionId;
use super::store::RegionStore;

/// Ease-in-out cubic: accelerates until the midpoint, then decelerates
pub fn ease_in_out_cubic(p: f64) -> f64 {
    if p < 0.5 {
        4.0 * p * p * p
    } else {
        1.0 - (-2.0 * p + 2.0).powi(3) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpacityTween {
    pub from: f32,
    pub to: f32,
    /// None until the first tick when started before any clock reading
    pub started_at_ms: Option<f64>,
    pub duration_ms: f64,
}

impl OpacityTween {
    /// Linear progress in [0, 1] at `now_ms`
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        let Some(started_at_ms) = self.started_at_ms else {
            return 0.0;
        };
        ((now_ms - started_at_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Eased opacity at `now_ms`
    pub fn sample(&self, now_ms: f64) -> f32 {
        let progress = self.progress(now_ms);
        if progress >= 1.0 {
            return self.to;
        }
        let eased = ease_in_out_cubic(progress) as f32;
        self.from + (self.to - self.from) * eased
    }
}

#[derive(Debug, Default)]
pub struct AnimationScheduler {
    tweens: HashMap<RegionId, OpacityTween>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transition from `from` to `to`, replacing any transition already running
    /// for this region.
    pub fn animate(&mut self, id: RegionId, from: f32, to: f32, now_ms: f64, duration_ms: f64) {
        self.insert(id, from, to, Some(now_ms), duration_ms);
    }

    /// Like [`animate`](Self::animate), but the transition starts at the time of the
    /// next [`tick`](Self::tick).
    pub fn animate_from_next_tick(&mut self, id: RegionId, from: f32, to: f32, duration_ms: f64) {
        self.insert(id, from, to, None, duration_ms);
    }

    fn insert(
        &mut self,
        id: RegionId,
        from: f32,
        to: f32,
        started_at_ms: Option<f64>,
        duration_ms: f64,
    ) {
        self.tweens.insert(
            id,
            OpacityTween {
                from,
                to,
                started_at_ms,
                duration_ms,
            },
        );
    }

    pub fn cancel(&mut self, id: RegionId) -> bool {
        self.tweens.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.tweens.clear();
    }

    pub fn is_animating(&self, id: RegionId) -> bool {
        self.tweens.contains_key(&id)
    }

    pub fn target(&self, id: RegionId) -> Option<f32> {
        self.tweens.get(&id).map(|tween| tween.to)
    }

    pub fn active_count(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_idle(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Advance every transition to `now_ms` and write the opacities into the store.
    ///
    /// Returns the regions whose transition finished on this tick with their final
    /// opacity. Transitions for regions that no longer exist are dropped silently.
    pub fn tick(&mut self, now_ms: f64, store: &mut RegionStore) -> Vec<(RegionId, f32)> {
        let mut completed = Vec::new();

        self.tweens.retain(|id, tween| {
            tween.started_at_ms.get_or_insert(now_ms);
            if !store.set_opacity(*id, tween.sample(now_ms)) {
                return false;
            }
            if tween.progress(now_ms) >= 1.0 {
                completed.push((*id, tween.to));
                return false;
            }
            true
        });

        completed
    }
}

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::*;
    use crate::fog::region::{RegionOptions, ShapeKind};

    const EPS: f64 = 1e-9;

    fn store_with_region() -> (RegionStore, RegionId) {
        let mut store = RegionStore::default();
        let id = store
            .create(
                ShapeKind::Circle,
                &[Vec2::ZERO, Vec2::new(10.0, 0.0)],
                RegionOptions::default(),
            )
            .unwrap();
        (store, id)
    }

    #[test]
    fn test_easing_endpoints_and_midpoint() {
        assert!(ease_in_out_cubic(0.0).abs() < EPS);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < EPS);
        assert!((ease_in_out_cubic(1.0) - 1.0).abs() < EPS);
        assert!((ease_in_out_cubic(0.25) - 0.0625).abs() < EPS);
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let (mut store, id) = store_with_region();
        let mut scheduler = AnimationScheduler::new();
        scheduler.animate(id, 1.0, 0.0, 0.0, 0.0);

        let completed = scheduler.tick(0.0, &mut store);
        assert_eq!(completed, vec![(id, 0.0)]);
        assert_eq!(store.get(id).unwrap().opacity, 0.0);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_restart_replaces_running_tween() {
        let (mut store, id) = store_with_region();
        let mut scheduler = AnimationScheduler::new();
        scheduler.animate(id, 1.0, 0.0, 0.0, 500.0);
        scheduler.tick(250.0, &mut store);

        let current = store.get(id).unwrap().opacity;
        scheduler.animate(id, current, 1.0, 250.0, 500.0);
        assert_eq!(scheduler.active_count(), 1);
        assert_eq!(scheduler.target(id), Some(1.0));

        let completed = scheduler.tick(750.0, &mut store);
        assert_eq!(completed, vec![(id, 1.0)]);
        assert_eq!(store.get(id).unwrap().opacity, 1.0);
    }

    #[test]
    fn test_tween_without_start_time_begins_on_first_tick() {
        let (mut store, id) = store_with_region();
        let mut scheduler = AnimationScheduler::new();
        scheduler.animate_from_next_tick(id, 1.0, 0.0, 500.0);

        // A late first tick anchors the start rather than finishing the tween
        assert!(scheduler.tick(10_000.0, &mut store).is_empty());
        assert_eq!(store.get(id).unwrap().opacity, 1.0);

        assert!(scheduler.tick(10_250.0, &mut store).is_empty());
        let halfway = store.get(id).unwrap().opacity;
        assert!((halfway - 0.5).abs() < 1e-6);

        assert_eq!(scheduler.tick(10_500.0, &mut store), vec![(id, 0.0)]);
    }

    #[test]
    fn test_tween_for_removed_region_is_dropped() {
        let (mut store, id) = store_with_region();
        let mut scheduler = AnimationScheduler::new();
        scheduler.animate(id, 1.0, 0.0, 0.0, 500.0);
        store.remove(id);

        assert!(scheduler.tick(100.0, &mut store).is_empty());
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_cancel() {
        let (_, id) = store_with_region();
        let mut scheduler = AnimationScheduler::new();
        scheduler.animate(id, 1.0, 0.0, 0.0, 500.0);
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(!scheduler.is_animating(id));
    }
}
