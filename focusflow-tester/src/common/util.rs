use serde::Serialize;
use std::hash::Hasher;
use twox_hash::XxHash64;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Stable digest of a serializable snapshot, used to compare replays.
///
/// Snapshots that fail to serialize all hash to the digest of an empty buffer.
pub fn snapshot_digest<T: Serialize>(value: &T) -> u64 {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&bytes);
    hasher.finish()
}
