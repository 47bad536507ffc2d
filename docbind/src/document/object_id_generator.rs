use crate::common::OBJECT_ID_LENGTH;
use chrono::Utc;
use log::info;
use rand::rngs::OsRng;
use rand::Rng;
use std::sync::atomic::{AtomicU32, Ordering};

const COUNTER_MASK: u32 = 0x00FF_FFFF;

/// Produces the raw bytes of new object ids.
///
/// Layout: 4-byte big-endian seconds since the epoch, 5 bytes unique to this
/// process, 3-byte big-endian counter. The counter starts at a random value
/// and wraps after 2^24 ids.
pub(crate) struct ObjectIdGenerator {
    process_unique: [u8; 5],
    counter: AtomicU32,
}

impl ObjectIdGenerator {
    pub(crate) fn new() -> Self {
        let process_unique = Self::process_unique();
        let counter = OsRng.gen::<u32>() & COUNTER_MASK;
        info!(
            "Initialized object id generator with process id {:02x?}",
            process_unique
        );

        ObjectIdGenerator {
            process_unique,
            counter: AtomicU32::new(counter),
        }
    }

    pub(crate) fn next_bytes(&self) -> [u8; OBJECT_ID_LENGTH] {
        let seconds = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;
        Self::compose(seconds, &self.process_unique, count)
    }

    pub(crate) fn compose(seconds: u32, process_unique: &[u8; 5], count: u32) -> [u8; OBJECT_ID_LENGTH] {
        let mut bytes = [0u8; OBJECT_ID_LENGTH];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process_unique);
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        bytes
    }

    fn process_unique() -> [u8; 5] {
        // mix a fresh uuid with os randomness so forked processes diverge
        let uuid = uuid::Uuid::new_v4();
        let uid = uuid.as_bytes();
        let noise: [u8; 5] = OsRng.gen();

        let mut unique = [0u8; 5];
        for (i, byte) in unique.iter_mut().enumerate() {
            *byte = uid[uid.len() - 1 - i] ^ noise[i];
        }
        unique
    }
}
