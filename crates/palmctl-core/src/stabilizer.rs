//! Consecutive-frame debouncer for the single-hand media gestures.

use std::collections::VecDeque;

pub const DEFAULT_STABLE_FRAMES: usize = 5;

/// Confirms a gesture once it has been seen on `required` consecutive frames.
#[derive(Debug, Clone)]
pub struct GestureStabilizer<T> {
    history: VecDeque<T>,
    required: usize,
    enabled: bool,
}

impl<T: Copy + PartialEq> GestureStabilizer<T> {
    /// `required` is clamped to at least one frame. A disabled stabilizer
    /// confirms every candidate immediately.
    pub fn new(required: usize, enabled: bool) -> Self {
        let required = required.max(1);
        Self {
            history: VecDeque::with_capacity(required),
            required,
            enabled,
        }
    }

    /// Push this frame's candidate and report whether it is now stable.
    pub fn observe(&mut self, candidate: T) -> bool {
        if !self.enabled {
            return true;
        }
        self.history.push_back(candidate);
        while self.history.len() > self.required {
            self.history.pop_front();
        }
        self.history.len() == self.required && self.history.iter().all(|g| *g == candidate)
    }

    /// Break the current run.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum G {
        A,
        B,
    }

    #[test]
    fn test_stable_after_required_frames() {
        let mut s = GestureStabilizer::new(5, true);
        let results: Vec<bool> = (0..7).map(|_| s.observe(G::A)).collect();
        assert_eq!(results, vec![false, false, false, false, true, true, true]);
        assert_eq!(s.len(), 5);
    }

    #[test]
    fn test_mismatch_breaks_run() {
        let mut s = GestureStabilizer::new(3, true);
        assert!(!s.observe(G::A));
        assert!(!s.observe(G::A));
        assert!(!s.observe(G::B));
        // Window is [A, A, B] then [A, B, B]: not yet uniform.
        assert!(!s.observe(G::B));
        assert!(s.observe(G::B));
    }

    #[test]
    fn test_clear_restarts_count() {
        let mut s = GestureStabilizer::new(3, true);
        s.observe(G::A);
        s.observe(G::A);
        s.clear();
        assert!(s.is_empty());
        assert!(!s.observe(G::A));
        assert!(!s.observe(G::A));
        assert!(s.observe(G::A));
    }

    #[test]
    fn test_disabled_confirms_immediately() {
        let mut s = GestureStabilizer::new(5, false);
        assert!(s.observe(G::A));
        assert!(s.observe(G::B));
        assert!(s.is_empty());
    }

    #[test]
    fn test_history_never_exceeds_required() {
        let mut s = GestureStabilizer::new(4, true);
        for i in 0..50 {
            s.observe(if i % 3 == 0 { G::A } else { G::B });
            assert!(s.len() <= 4);
        }
    }

    #[test]
    fn test_stable_iff_last_k_equal() {
        // Candidate sequence with absent frames (None) that reset the run.
        let seq = [
            Some(G::A), Some(G::A), Some(G::A), None, Some(G::A), Some(G::A),
            Some(G::A), Some(G::B), Some(G::B), Some(G::B), Some(G::B),
        ];
        let k = 3;
        let mut s = GestureStabilizer::new(k, true);
        let mut run: Vec<G> = Vec::new();
        for candidate in seq {
            match candidate {
                None => {
                    s.clear();
                    run.clear();
                }
                Some(g) => {
                    run.push(g);
                    let expected = run.len() >= k && run[run.len() - k..].iter().all(|x| *x == g);
                    assert_eq!(s.observe(g), expected);
                }
            }
        }
    }
}
