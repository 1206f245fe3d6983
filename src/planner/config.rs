//! Search tuning parameters.

/// Configuration for the round-based search and its enumeration loop.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Hard cap on rounds; a journey with k transfers needs k+1 rounds.
    pub max_rounds: usize,

    /// Restart step when an enumeration pass finds nothing new (seconds).
    pub restart_step_secs: i32,

    /// Give up after this many consecutive empty restarts.
    pub max_empty_advances: usize,

    /// Stop enumerating once start times span more than this horizon
    /// (seconds).
    pub horizon_secs: i32,

    /// Discrete start hours seeded by explore mode.
    pub explore_start_hours: Vec<i32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            restart_step_secs: 30 * 60,
            max_empty_advances: 4,
            horizon_secs: 14 * 3600,
            explore_start_hours: vec![5, 7, 9, 11, 13, 15, 17, 19],
        }
    }
}
