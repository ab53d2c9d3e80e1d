//! Slab pool statistics

use crate::config::ComponentName;

/// Slab pool statistics snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolStats {
    pub name: ComponentName,
    pub capacity: usize,
    pub in_use: usize,
    pub available: usize,
    /// Successful checkouts since construction
    pub checkouts: u64,
    /// Checkins since construction
    pub checkins: u64,
    /// Checkouts refused because the pool was empty
    pub exhausted: u64,
}

impl PoolStats {
    /// Get utilization ratio (0.0 to 1.0)
    pub fn utilization_ratio(&self) -> f64 {
        if self.capacity > 0 {
            self.in_use as f64 / self.capacity as f64
        } else {
            0.0
        }
    }

    /// Check if pool is nearly full
    pub fn is_nearly_full(&self, threshold: f64) -> bool {
        self.utilization_ratio() > threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::component_name;

    fn stats(in_use: usize, capacity: usize) -> PoolStats {
        PoolStats {
            name: component_name("flows_mp"),
            capacity,
            in_use,
            available: capacity - in_use,
            checkouts: in_use as u64,
            checkins: 0,
            exhausted: 0,
        }
    }

    #[test]
    fn test_utilization_thresholds() {
        assert_eq!(stats(3, 4).utilization_ratio(), 0.75);
        assert!(stats(19, 20).is_nearly_full(0.9));
        assert!(!stats(18, 20).is_nearly_full(0.9));
        assert!(!stats(0, 0).is_nearly_full(0.0));
    }
}
