// Document ID Generator - Snowflake-like IDs rendered as sortable strings
// Firestore-style auto ids, but time-ordered so pagination tie-breaks are stable

use std::sync::Mutex;

const SEQUENCE_BITS: u32 = 12;
const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;

/// Millisecond and sequence last handed out
#[derive(Debug, Default)]
struct IdClock {
    last_timestamp: u64,
    sequence: u64,
}

/// 64-bit ID layout: [timestamp:42][node_id:10][sequence:12]
/// 1024 writer nodes, 4096 IDs per millisecond per node.
#[derive(Debug)]
pub struct DocumentIdGenerator {
    node_id: u16,
    clock: Mutex<IdClock>,
}

impl DocumentIdGenerator {
    pub fn new(node_id: u16) -> Self {
        assert!(node_id < 1024, "Node ID must be less than 1024");

        Self {
            node_id,
            clock: Mutex::new(IdClock::default()),
        }
    }

    /// Next raw 64-bit ID. Timestamp and sequence are claimed under one lock,
    /// so concurrent callers never share a pair.
    pub fn next_raw(&self) -> u64 {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let mut clock = self.clock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if now > clock.last_timestamp {
            clock.last_timestamp = now;
            clock.sequence = 0;
        } else if clock.sequence < MAX_SEQUENCE {
            clock.sequence += 1;
        } else {
            // Sequence exhausted: borrow the next millisecond
            clock.last_timestamp += 1;
            clock.sequence = 0;
        }

        ((clock.last_timestamp & 0x3FFFFFFFFFF) << 22)
            | ((self.node_id as u64) << SEQUENCE_BITS)
            | clock.sequence
    }

    /// Next document ID, zero-padded so string order matches creation order
    pub fn next_id(&self) -> String {
        format!("{:019}", self.next_raw())
    }
}

impl Default for DocumentIdGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let generator = DocumentIdGenerator::new(7);

        let ids: Vec<String> = (0..500).map(|_| generator.next_id()).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1], "{} should sort before {}", pair[0], pair[1]);
        }
        assert!(ids.iter().all(|id| id.len() == 19));
    }

    #[test]
    fn test_sequence_overflow_stays_ordered() {
        let generator = DocumentIdGenerator::default();
        let ids: Vec<u64> = (0..(MAX_SEQUENCE as usize * 3)).map(|_| generator.next_raw()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_concurrent_ids_are_unique() {
        let generator = Arc::new(DocumentIdGenerator::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = generator.clone();
                std::thread::spawn(move || (0..5000).map(|_| generator.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id.clone()), "duplicate id {}", id);
            }
        }
        assert_eq!(seen.len(), 40_000);
    }
}
