//! Controller configuration.

use serde::{Deserialize, Serialize};

/// Sidebar controller settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SidebarConfig {
    /// Fetch worker threads
    pub fetch_threads: usize,

    /// Start with the card panel collapsed
    pub start_collapsed: bool,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            // Leave ~25% of cores for the controller/UI thread
            fetch_threads: (num_cpus::get() * 3 / 4).max(1),
            start_collapsed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_at_least_one_thread() {
        assert!(SidebarConfig::default().fetch_threads >= 1);
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let cfg: SidebarConfig = serde_json::from_str(r#"{"fetch_threads": 2}"#).unwrap();
        assert_eq!(cfg.fetch_threads, 2);
        assert!(!cfg.start_collapsed);
    }
}
