//! Seedable random streams with domain-separated derivation.
//!
//! Every session owns one [`StreamBundle`]; there is no process-wide RNG
//! state. Streams are `ChaCha8Rng` so a given seed yields the same draw
//! sequence on every platform, which is what makes replays and shared seed
//! codes work.

use hmac::{Hmac, Mac};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// Uniform draw contract used by effect programs and event rolls.
pub trait TurnRng {
    /// Uniform float in `[0, 1)`.
    fn next_f32(&mut self) -> f32;

    /// Uniform double in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform integer in the inclusive range `[min, max]`.
    ///
    /// A reversed range collapses to `min`.
    fn int_in(&mut self, min: i64, max: i64) -> i64;

    /// Bernoulli draw with probability `p`. Consumes exactly one draw
    /// regardless of `p`.
    fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }
}

/// Counting wrapper for RNG streams providing draw instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha8Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// Current word position within the ChaCha keystream.
    #[must_use]
    pub fn word_pos(&self) -> u64 {
        u64::try_from(self.rng.get_word_pos()).unwrap_or(u64::MAX)
    }

    fn set_word_pos(&mut self, pos: u64) {
        self.rng.set_word_pos(u128::from(pos));
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    fn set_draws(&mut self, draws: u64) {
        self.draws = draws;
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

impl<R: RngCore> TurnRng for CountingRng<R> {
    fn next_f32(&mut self) -> f32 {
        self.r#gen::<f32>()
    }

    fn next_f64(&mut self) -> f64 {
        self.r#gen::<f64>()
    }

    fn int_in(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.gen_range(min..=max)
    }
}

/// Per-session random streams, one per draw site.
///
/// Effect programs and event-table rolls draw from independent streams;
/// a draw on one never perturbs the other. Stream seeds are derived from
/// the user seed with HMAC-SHA256 domain tags.
#[derive(Debug, Clone)]
pub struct StreamBundle {
    effects: CountingRng<ChaCha8Rng>,
    events: CountingRng<ChaCha8Rng>,
}

/// Keystream positions captured for snapshot persistence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamPositions {
    pub effects: u64,
    pub events: u64,
}

/// Draw counts reported through session status for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDrawCounts {
    pub effects: u64,
    pub events: u64,
}

impl StreamBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            effects: CountingRng::new(derive_stream_seed(seed, b"effects")),
            events: CountingRng::new(derive_stream_seed(seed, b"events")),
        }
    }

    /// Reconstruct a bundle at previously captured keystream positions and
    /// draw counts.
    #[must_use]
    pub fn restore(seed: u64, positions: StreamPositions, draws: StreamDrawCounts) -> Self {
        let mut bundle = Self::from_user_seed(seed);
        bundle.effects.set_word_pos(positions.effects);
        bundle.effects.set_draws(draws.effects);
        bundle.events.set_word_pos(positions.events);
        bundle.events.set_draws(draws.events);
        bundle
    }

    /// Access the effect-program stream.
    pub fn effects(&mut self) -> &mut CountingRng<ChaCha8Rng> {
        &mut self.effects
    }

    /// Access the event-roll stream.
    pub fn events(&mut self) -> &mut CountingRng<ChaCha8Rng> {
        &mut self.events
    }

    /// Current keystream positions, captured into snapshots.
    #[must_use]
    pub fn positions(&self) -> StreamPositions {
        StreamPositions {
            effects: self.effects.word_pos(),
            events: self.events.word_pos(),
        }
    }

    /// Draw counts across both streams.
    #[must_use]
    pub const fn draw_counts(&self) -> StreamDrawCounts {
        StreamDrawCounts {
            effects: self.effects.draws(),
            events: self.events.draws(),
        }
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes())
        .expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}
