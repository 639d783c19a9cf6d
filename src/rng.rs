/// Xorshift random number generator.
///
/// See George Marsaglia (2003). Xorshift RNGs. DOI: 10.18637/jss.v008.i14
/// (section 4, function xor128)
///
/// Current implementation is the xorshift64* variant which has better
/// statistical properties. Every stochastic choice in the pipeline draws
/// from one of these, seeded by a node id, so that a given input file
/// produces bit-identical outputs on every host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rng {
    x: u64,
}

/// u64 isomorphism
///
/// the seed is xored with a fixed constant to avoid a zero state.
impl From<u64> for Rng {
    fn from(seed: u64) -> Self {
        let rng = Rng {
            x: seed ^ 0xedef335f00e170b3,
        };
        assert!(rng.x != 0);
        rng
    }
}

impl Rng {
    pub fn step(&mut self) -> u64 {
        self.x ^= self.x >> 12;
        self.x ^= self.x << 25;
        self.x ^= self.x >> 27;
        self.x.wrapping_mul(2685821657736338717)
    }

    /// uniform draw in [min, max). An empty range yields min without
    /// consuming a draw.
    pub fn uni(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        self.step() % (max - min) + min
    }

    /// draw skewed towards min: uniform in [min, uni(min+1, max))
    pub fn exp(&mut self, min: u64, max: u64) -> u64 {
        let max = self.uni(min + 1, max);
        self.uni(min, max)
    }

    /// draw clustered around the midpoint of [min, max)
    pub fn norm(&mut self, min: u64, max: u64) -> u64 {
        (self.uni(min, max) + self.uni(min, max)) / 2
    }
}

impl crate::Arbitrary for Rng {
    fn random() -> Self {
        Self::from(rand::random::<u64>())
    }
}
