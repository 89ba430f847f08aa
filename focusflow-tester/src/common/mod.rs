pub mod scenario;
pub mod util;

pub use util::{snapshot_digest, split_csv};
