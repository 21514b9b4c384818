//! TimedItem - ProducerLoop output
//!
//! A normalized payload stamped with its camera-local capture time.

/// Timestamped payload produced by one source.
///
/// Immutable after construction. The value is moved from the producer into
/// its queue and from the queue into the synchronizer; it is never shared
/// between threads, so no interior synchronization is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedItem<P> {
    payload: P,
    timestamp: u64,
    source_index: usize,
}

impl<P> TimedItem<P> {
    /// Create a new item
    ///
    /// # Arguments
    /// * `payload` - Normalized frame (ownership is taken)
    /// * `timestamp` - Source-local capture time in nanoseconds
    /// * `source_index` - Producing source (0..N-1)
    pub fn new(payload: P, timestamp: u64, source_index: usize) -> Self {
        Self {
            payload,
            timestamp,
            source_index,
        }
    }

    /// Borrow the payload
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Source-local capture time (ns)
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Index of the producing source
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    /// Move the payload out, consuming the item
    pub fn into_payload(self) -> P {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let item = TimedItem::new(vec![1u8, 2, 3], 150, 1);
        assert_eq!(item.timestamp(), 150);
        assert_eq!(item.source_index(), 1);
        assert_eq!(item.payload(), &vec![1u8, 2, 3]);
        assert_eq!(item.into_payload(), vec![1u8, 2, 3]);
    }
}
