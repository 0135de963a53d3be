//! Linear congruential generator used for course generation.
//!
//! The constants and the output mapping are fixed: browser clients replay the
//! same generator from the seed announced in `game-start` and must land on
//! exactly the obstacles the server collides against. Seeds are 32-bit so
//! that `state * MULTIPLIER` stays below 2^53 and a JavaScript port using
//! doubles computes every step exactly.

/// Course seed, broadcast to clients at race start.
pub type Seed = u32;

/// `state = state * 1664525 + 1013904223 (mod 2^32)`, output `state / 2^32`.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
    draws: u64,
}

impl Lcg {
    pub const MULTIPLIER: u32 = 1_664_525;
    pub const INCREMENT: u32 = 1_013_904_223;

    const SCALE: f64 = 4_294_967_296.0;

    pub fn new(seed: Seed) -> Self {
        Self {
            state: seed,
            draws: 0,
        }
    }

    /// Advances the generator once and returns the new raw state.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        self.draws += 1;
        self.state
    }

    /// Advances once and maps the state into `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / Self::SCALE
    }

    /// Number of draws taken since construction.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}
