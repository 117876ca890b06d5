//! Foreground/background tracking.
//!
//! Capture devices may go stale while the app is backgrounded, so a return
//! to the foreground triggers one capture refresh.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Foreground,
    Background,
}

#[derive(Debug, Clone)]
pub struct VisibilityTracker {
    current: Visibility,
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self {
            current: Visibility::Foreground,
        }
    }
}

impl VisibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Visibility {
        self.current
    }

    /// Record a visibility notice. Returns `true` only on a
    /// background → foreground transition.
    pub fn observe(&mut self, next: Visibility) -> bool {
        let previous = std::mem::replace(&mut self.current, next);
        previous == Visibility::Background && next == Visibility::Foreground
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_foreground() {
        let mut tracker = VisibilityTracker::new();
        assert_eq!(tracker.current(), Visibility::Foreground);
        assert!(!tracker.observe(Visibility::Foreground));
    }

    #[test]
    fn fires_once_per_return() {
        let mut tracker = VisibilityTracker::new();
        assert!(!tracker.observe(Visibility::Background));
        assert!(!tracker.observe(Visibility::Background));
        assert!(tracker.observe(Visibility::Foreground));
        assert!(!tracker.observe(Visibility::Foreground));

        tracker.observe(Visibility::Background);
        assert!(tracker.observe(Visibility::Foreground));
    }
}
