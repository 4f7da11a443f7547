//! Watchpoint registry
//!
//! Counter values at which the counting unit notifies the application
//! instead of silently accumulating.

use crate::error::Error;
use heapless::Vec;

/// Maximum number of watchpoints on a unit
pub const MAX_WATCHPOINTS: usize = 8;

/// Ordered set of watchpoints, validated against the counter limits
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct WatchpointSet {
    values: Vec<i32, MAX_WATCHPOINTS>,
}

impl WatchpointSet {
    /// Build a set from `values`, which must all lie in `[low, high]`
    pub fn new(values: &[i32], low: i32, high: i32) -> Result<Self, Error> {
        let mut set: Vec<i32, MAX_WATCHPOINTS> = Vec::new();
        for &v in values {
            if v < low || v > high {
                return Err(Error::WatchpointOutOfRange(v));
            }
            match set.binary_search(&v) {
                Ok(_) => return Err(Error::DuplicateWatchpoint(v)),
                Err(pos) => set
                    .insert(pos, v)
                    .map_err(|_| Error::TooManyWatchpoints)?,
            }
        }
        Ok(Self { values: set })
    }

    /// Whether `value` is a watchpoint
    pub fn contains(&self, value: i32) -> bool {
        self.values.binary_search(&value).is_ok()
    }

    /// Watchpoints, in increasing order
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted() {
        let set = WatchpointSet::new(&[50, -100, 0, 100, -50], -100, 100).unwrap();
        let values: std::vec::Vec<i32> = set.iter().collect();
        assert_eq!(values, [-100, -50, 0, 50, 100]);
        assert_eq!(set.len(), 5);
        assert!(set.contains(-50));
        assert!(!set.contains(49));
    }

    #[test]
    fn test_duplicate() {
        assert_eq!(
            WatchpointSet::new(&[0, 50, 0], -100, 100),
            Err(Error::DuplicateWatchpoint(0))
        );
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            WatchpointSet::new(&[0, 101], -100, 100),
            Err(Error::WatchpointOutOfRange(101))
        );
        assert_eq!(
            WatchpointSet::new(&[-101], -100, 100),
            Err(Error::WatchpointOutOfRange(-101))
        );
    }

    #[test]
    fn test_too_many() {
        let values = [-4, -3, -2, -1, 0, 1, 2, 3, 4];
        assert_eq!(
            WatchpointSet::new(&values, -100, 100),
            Err(Error::TooManyWatchpoints)
        );
        assert!(WatchpointSet::new(&values[..MAX_WATCHPOINTS], -100, 100).is_ok());
    }

    #[test]
    fn test_empty() {
        let set = WatchpointSet::new(&[], -100, 100).unwrap();
        assert!(set.is_empty());
        assert!(!set.contains(0));
    }
}
