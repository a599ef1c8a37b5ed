// Minimal PRNG (no external crates).
//
// This is NOT cryptographically secure.
// It drives the synthetic demonstration layouts; a fixed seed reproduces a page.

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // Avoid a zero state.
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform in [0,1).
    #[inline]
    pub fn next_f32_01(&mut self) -> f32 {
        // 24 mantissa bits so the result never rounds up to 1.0.
        let x = self.next_u32() >> 8;
        (x as f32) / ((1u32 << 24) as f32)
    }

    #[inline]
    pub fn gen_range_f32(&mut self, low: f32, high: f32) -> f32 {
        low + (high - low) * self.next_f32_01()
    }

    /// Uniform in [-span/2, span/2).
    #[inline]
    pub fn jitter(&mut self, span: f32) -> f32 {
        (self.next_f32_01() - 0.5) * span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Prng::new(7);
        let mut b = Prng::new(7);
        for _ in 0..32 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn unit_interval_and_jitter_bounds() {
        let mut r = Prng::new(0);
        for _ in 0..10_000 {
            let u = r.next_f32_01();
            assert!((0.0..1.0).contains(&u));
            let j = r.jitter(40.0);
            assert!((-20.0..20.0).contains(&j));
        }
    }
}
