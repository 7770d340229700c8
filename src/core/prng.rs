// Minimal PRNG (no external crates).
//
// Not cryptographically secure. It only seeds board contents and board sizes,
// and a fixed seed reproduces the same swarm.

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // xorshift has a fixed point at zero.
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    /// Seed from the wall clock, for runs that do not ask for reproducibility.
    pub fn from_clock() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(nanos ^ 0xD1B5_4A32_D192_ED03)
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn gen_bool(&mut self) -> bool {
        // Top bit; the low bits of xorshift* are the weakest.
        self.next_u64() >> 63 == 1
    }

    /// Uniform in `low..=high`.
    #[inline]
    pub fn gen_inclusive(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        let span = (high - low) as u64 + 1;
        low + ((self.next_u64() >> 32) % span) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Prng::new(42);
        let mut b = Prng::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn inclusive_range_hits_both_ends() {
        let mut rng = Prng::new(7);
        let mut seen_low = false;
        let mut seen_high = false;
        for _ in 0..2000 {
            let v = rng.gen_inclusive(5, 8);
            assert!((5..=8).contains(&v));
            seen_low |= v == 5;
            seen_high |= v == 8;
        }
        assert!(seen_low && seen_high);
    }

    #[test]
    fn zero_seed_is_usable() {
        let mut rng = Prng::new(0);
        assert_ne!(rng.next_u64(), 0);
    }
}
