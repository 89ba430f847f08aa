//! Seeded random streams for chest draws and synthetic activity.
use hmac::{Hmac, Mac};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

const LOOT_DOMAIN: &[u8] = b"loot";
const ACTIVITY_DOMAIN: &[u8] = b"activity";

/// Independent RNG streams derived from one seed, segregated by domain so
/// that drawing from one never shifts the other.
#[derive(Debug, Clone)]
pub struct RngStreams {
    seed: Option<u64>,
    loot: RefCell<CountingRng<ChaCha20Rng>>,
    activity: RefCell<CountingRng<ChaCha20Rng>>,
}

impl RngStreams {
    /// Construct reproducible streams from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            loot: RefCell::new(CountingRng::seeded(derive_stream_seed(seed, LOOT_DOMAIN))),
            activity: RefCell::new(CountingRng::seeded(derive_stream_seed(seed, ACTIVITY_DOMAIN))),
        }
    }

    /// Construct streams seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            seed: None,
            loot: RefCell::new(CountingRng::wrap(ChaCha20Rng::from_entropy())),
            activity: RefCell::new(CountingRng::wrap(ChaCha20Rng::from_entropy())),
        }
    }

    /// Seed these streams were derived from, if any.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Stream used for chest rarity and item draws.
    #[must_use]
    pub fn loot(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.loot.borrow_mut()
    }

    /// Stream used by harnesses that synthesise activity.
    #[must_use]
    pub fn activity(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.activity.borrow_mut()
    }
}

/// Draw-counting RNG adapter.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha20Rng> {
    fn seeded(seed: u64) -> Self {
        Self::wrap(ChaCha20Rng::seed_from_u64(seed))
    }
}

impl<R: RngCore> CountingRng<R> {
    pub const fn wrap(rng: R) -> Self {
        Self { rng, draws: 0 }
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    // HMAC accepts keys of any length, so this never falls through.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
