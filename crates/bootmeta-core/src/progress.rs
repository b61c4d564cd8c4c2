//! Progress reporting shared between a worker and a polling reader.

use std::sync::Mutex;

#[derive(Debug, Default)]
struct ProgressState {
    total: usize,
    current: usize,
    label: String,
}

/// Step counter a background operation advances and another thread polls.
///
/// [`ProgressReport::set_total`] must be called with a positive value
/// before the first [`ProgressReport::ratio`] read.
#[derive(Debug, Default)]
pub struct ProgressReport {
    state: Mutex<ProgressState>,
}

impl ProgressReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to a fresh operation of `total` steps.
    pub fn set_total(&self, total: usize) {
        let mut state = self.state.lock().unwrap();
        state.total = total;
        state.current = 0;
        state.label.clear();
    }

    /// Advance by one step and update the label.
    pub fn advance(&self, label: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        state.current += 1;
        state.label = label.into();
    }

    /// Jump straight to the end of the operation.
    pub fn finish(&self) {
        let mut state = self.state.lock().unwrap();
        state.current = state.total;
    }

    /// Completed fraction of the operation.
    pub fn ratio(&self) -> f32 {
        let state = self.state.lock().unwrap();
        state.current as f32 / state.total as f32
    }

    pub fn is_done(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.current >= state.total
    }

    /// Current and total step counts.
    pub fn position(&self) -> (usize, usize) {
        let state = self.state.lock().unwrap();
        (state.current, state.total)
    }

    /// Label of the most recent step.
    pub fn label(&self) -> String {
        self.state.lock().unwrap().label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_and_ratio() {
        let progress = ProgressReport::new();
        progress.set_total(4);
        assert!(!progress.is_done());

        progress.advance("a");
        progress.advance("b");
        assert!((progress.ratio() - 0.5).abs() < f32::EPSILON);
        assert_eq!(progress.label(), "b");
        assert_eq!(progress.position(), (2, 4));

        progress.advance("c");
        progress.advance("d");
        assert!(progress.is_done());
    }

    #[test]
    fn test_set_total_resets() {
        let progress = ProgressReport::new();
        progress.set_total(2);
        progress.advance("x");
        progress.set_total(3);
        assert_eq!(progress.position(), (0, 3));
        assert_eq!(progress.label(), "");
    }

    #[test]
    fn test_finish() {
        let progress = ProgressReport::new();
        progress.set_total(10);
        progress.finish();
        assert!(progress.is_done());
    }
}
