use crate::utils::prelude::*;

/// Snapshot of the best solution known for the current puzzle.
#[derive(Clone, Debug)]
pub struct GlobalBestEntry {
    pub puzzle_id: String,
    pub score: u32,
    pub solution: Vec<u32>,
    pub timestamp: Instant,
}

/// Process-wide register of the best-known solution for the puzzle currently
/// being worked on. Reset whenever a new puzzle is announced.
pub struct GlobalBest {
    inner: Mutex<Option<GlobalBestEntry>>,
}

impl GlobalBest {
    pub fn new() -> GlobalBest {
        GlobalBest { inner: Mutex::new(None) }
    }

    /// Clears the register for a new puzzle. Any `update` for a different
    /// puzzle_id is ignored until the next reset.
    pub fn reset(&self, puzzle_id: impl Into<String>) {
        let mut guard = self.inner.lock().unwrap();
        *guard = Some(GlobalBestEntry { puzzle_id: puzzle_id.into(), score: u32::MAX, solution: Vec::new(), timestamp: Instant::now() });
    }

    /// Replaces the stored entry only if `puzzle_id` matches and `score` is
    /// strictly lower than what's stored. Returns whether it replaced -
    /// callers use this to decide whether to re-broadcast.
    pub fn update(&self, puzzle_id: &str, score: u32, solution: &[u32]) -> bool {
        let mut guard = self.inner.lock().unwrap();
        match guard.as_mut() {
            Some(entry) if entry.puzzle_id == puzzle_id => {
                if score < entry.score {
                    entry.score = score;
                    entry.solution = solution.to_vec();
                    entry.timestamp = Instant::now();
                    true
                } else {
                    false
                }
            }
            Some(entry) => {
                log::warn!("discarding update for stale puzzle {puzzle_id}, current is {}", entry.puzzle_id);
                false
            }
            None => {
                log::warn!("discarding update for {puzzle_id}, register has not been reset for any puzzle");
                false
            }
        }
    }

    pub fn snapshot(&self) -> Option<GlobalBestEntry> {
        self.inner.lock().unwrap().clone()
    }
}

impl Default for GlobalBest {
    fn default() -> Self {
        GlobalBest::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p6_update_is_monotone_per_puzzle() {
        let gb = GlobalBest::new();
        gb.reset("p1");
        assert!(gb.update("p1", 50, &[1, 2]));
        assert!(!gb.update("p1", 50, &[3, 4]));
        assert!(gb.update("p1", 40, &[5]));
        assert!(!gb.update("p1", 45, &[6]));
        assert_eq!(gb.snapshot().unwrap().score, 40);
    }

    #[test]
    fn stale_puzzle_id_is_discarded() {
        let gb = GlobalBest::new();
        gb.reset("p1");
        gb.update("p1", 10, &[]);
        assert!(!gb.update("p2", 1, &[]));
        assert_eq!(gb.snapshot().unwrap().puzzle_id, "p1");
    }

    #[test]
    fn reset_clears_previous_puzzle() {
        let gb = GlobalBest::new();
        gb.reset("p1");
        gb.update("p1", 10, &[]);
        gb.reset("p2");
        assert!(gb.update("p2", 100, &[]));
    }
}
