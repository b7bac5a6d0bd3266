//! Monotonic nonce allocation for private calls.

use parking_lot::Mutex;

use crate::core::{Error, Result};

/// Microsecond-resolution nonce source.
///
/// Values are strictly increasing for the lifetime of the generator, even
/// when the wall clock stalls or steps backwards: allocation is serialized
/// and bumps past the last value handed out.
#[derive(Debug, Default)]
pub struct NonceGenerator {
    last: Mutex<u64>,
}

impl NonceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start above a nonce already used by this key (e.g. by a previous process).
    pub fn starting_after(last_used: u64) -> Self {
        Self {
            last: Mutex::new(last_used),
        }
    }

    /// Fails only once `u64::MAX` has been issued; the sequence never wraps.
    pub fn next(&self) -> Result<u64> {
        let now = now_micros();
        let mut last = self.last.lock();
        let nonce = if now > *last {
            now
        } else {
            last.checked_add(1)
                .ok_or_else(|| Error::Config("nonce space exhausted for this key".to_string()))?
        };
        *last = nonce;
        Ok(nonce)
    }

    /// Most recently issued nonce (0 if none).
    pub fn last(&self) -> u64 {
        *self.last.lock()
    }
}

fn now_micros() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_micros()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_rapid_nonces_strictly_increase() {
        let nonces = NonceGenerator::new();
        let issued: Vec<u64> = (0..10_000).map(|_| nonces.next().unwrap()).collect();
        assert!(issued.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_nonce_tracks_wall_clock() {
        let nonces = NonceGenerator::new();
        let before = now_micros();
        let n = nonces.next().unwrap();
        assert!(n >= before);
        assert_eq!(nonces.last(), n);
    }

    #[test]
    fn test_starting_after_future_value_bumps_by_one() {
        let future = now_micros() + 60_000_000;
        let nonces = NonceGenerator::starting_after(future);
        assert_eq!(nonces.next().unwrap(), future + 1);
        assert_eq!(nonces.next().unwrap(), future + 2);
    }

    #[test]
    fn test_exhausted_sequence_errors_instead_of_wrapping() {
        let nonces = NonceGenerator::starting_after(u64::MAX - 1);
        assert_eq!(nonces.next().unwrap(), u64::MAX);
        assert!(matches!(nonces.next(), Err(Error::Config(_))));
        assert_eq!(nonces.last(), u64::MAX);
    }

    #[test]
    fn test_concurrent_allocation_never_repeats() {
        let nonces = Arc::new(NonceGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let nonces = Arc::clone(&nonces);
                std::thread::spawn(move || {
                    (0..1_000)
                        .map(|_| nonces.next().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
