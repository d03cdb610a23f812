//! RNG trait abstraction for reaction handlers
//!
//! Handlers only ever need uniform integers, so any `rand::Rng` works, as does
//! a scripted source in tests that forces specific rolls.

/// Random number source consumed by reaction handlers
pub trait ReactionRng {
    /// Uniform integer in `[0, n)`; always 0 for `n == 0`
    fn uniform_below(&mut self, n: u32) -> u32;

    /// One-in-`n` chance; never succeeds for `n == 0`
    fn one_in(&mut self, n: u32) -> bool {
        n != 0 && self.uniform_below(n) == 0
    }

    /// Uniform integer in `[lo, lo + n)`
    fn offset_below(&mut self, lo: i32, n: u32) -> i32 {
        lo + self.uniform_below(n) as i32
    }
}

// Blanket implementation for any type implementing rand::Rng
impl<T: ?Sized + rand::Rng> ReactionRng for T {
    fn uniform_below(&mut self, n: u32) -> u32 {
        if n == 0 { 0 } else { self.gen_range(0..n) }
    }
}
