//! Quantity progress
//!
//! Roll-up of completed/total units up the hierarchy and the strategies
//! for splitting a parent quantity across its children.

pub mod aggregator;
pub mod distributor;

pub use aggregator::QuantityAggregator;
pub use distributor::{
    Allocation, ChildQuantity, DistributionRequest, DistributionStrategy, QuantityDistributor,
};

/// Anything that carries completed/total/progress quantities
pub trait Quantities {
    fn completed(&self) -> i64;
    fn total(&self) -> i64;
    fn progress(&self) -> u8;
}

/// `round(completed * 100 / total)`, or 0 when there is nothing to do
///
/// Rounds half up, computed in integers so large quantities stay exact.
pub fn progress_percent(completed: i64, total: i64) -> u8 {
    if total <= 0 || completed <= 0 {
        return 0;
    }
    let completed = i128::from(completed);
    let total = i128::from(total);
    let percent = (completed * 200 + total) / (total * 2);
    percent.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(5, 0), 0);
        assert_eq!(progress_percent(0, 10), 0);
        assert_eq!(progress_percent(10, 10), 100);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(1, 8), 13);
        assert_eq!(progress_percent(1, 200), 1);
        assert_eq!(progress_percent(1, 201), 0);
    }

    #[test]
    fn test_progress_percent_large_values() {
        assert_eq!(progress_percent(i64::MAX / 2, i64::MAX), 50);
    }
}
