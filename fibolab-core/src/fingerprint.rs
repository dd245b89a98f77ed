//! Signal-sequence fingerprinting.
//!
//! Two replays of the same candle history under the same configuration must
//! produce byte-identical signal sequences. Hashing the sequence with BLAKE3
//! turns that into a single string comparison and gives backtest results a
//! stable identity.

use crate::engine::BarOutcome;

/// BLAKE3 hash over index, timestamp, signal kind, brackets and size of every
/// outcome, in order.
pub fn signal_fingerprint(outcomes: &[BarOutcome]) -> String {
    let mut hasher = blake3::Hasher::new();
    for out in outcomes {
        hasher.update(&(out.index as u64).to_le_bytes());
        hasher.update(&out.timestamp.to_le_bytes());
        hasher.update(&[out.signal.kind.code()]);
        for level in [out.signal.stop_loss, out.signal.take_profit] {
            match level {
                Some(v) => {
                    hasher.update(&[1]);
                    hasher.update(&v.to_le_bytes());
                }
                None => {
                    hasher.update(&[0]);
                }
            }
        }
        hasher.update(&out.signal.size.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
