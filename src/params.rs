use core::num::NonZeroU8;

use crate::Error;

pub(crate) const MAX_CF: u8 = 31;
const DEFAULT_CF: NonZeroU8 = NonZeroU8::new(14).unwrap();
const MAX_RP: u64 = 1 << 30;
const MAX_OUTPUT_LEN: u64 = (u32::MAX as u64) * 32;

/// Validated scrypt cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    cf: NonZeroU8,
    r: u32,
    p: u32,
}

impl Default for Params {
    /// N = 16384, r = 8, p = 1
    fn default() -> Self {
        Self {
            cf: DEFAULT_CF,
            r: 8,
            p: 1,
        }
    }
}

impl core::fmt::Display for Params {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}/{}", self.n(), self.r, self.p)
    }
}

impl Params {
    /// Validate parameters given N directly
    pub fn new(n: u64, r: u32, p: u32) -> Result<Self, Error> {
        if n < 2 || !n.is_power_of_two() {
            return Err(Error::InvalidCostFactor(n));
        }
        let cf = n.trailing_zeros();
        if cf > MAX_CF as u32 {
            return Err(Error::InvalidCostFactor(n));
        }
        // cf is in 1..=31 here
        Self::new_cf(NonZeroU8::new(cf as u8).ok_or(Error::InvalidCostFactor(n))?, r, p)
    }

    /// Validate parameters given the cost factor (log2(N))
    pub fn new_cf(cf: NonZeroU8, r: u32, p: u32) -> Result<Self, Error> {
        if cf.get() > MAX_CF {
            return Err(Error::InvalidCostFactor(1u64 << cf.get().min(63)));
        }
        if r == 0 {
            return Err(Error::InvalidBlockSize);
        }
        if p == 0 {
            return Err(Error::InvalidParallelism);
        }
        if r as u64 * p as u64 >= MAX_RP {
            return Err(Error::ParamsTooLarge { r, p });
        }

        Ok(Self { cf, r, p })
    }

    /// Check that a derived key length is at most (2^32 - 1) * 32 bytes
    pub fn check_output_len(len: usize) -> Result<(), Error> {
        if len as u64 > MAX_OUTPUT_LEN {
            return Err(Error::InvalidOutputLength(len));
        }
        Ok(())
    }

    /// Cost factor (log2(N))
    #[inline(always)]
    pub const fn cf(&self) -> NonZeroU8 {
        self.cf
    }

    /// N
    #[inline(always)]
    pub const fn n(&self) -> u64 {
        1 << self.cf.get()
    }

    /// r
    #[inline(always)]
    pub const fn r(&self) -> u32 {
        self.r
    }

    /// p
    #[inline(always)]
    pub const fn p(&self) -> u32 {
        self.p
    }

    /// Size of one lane (128 * r bytes)
    #[inline(always)]
    pub const fn block_len(&self) -> usize {
        128 * self.r as usize
    }

    /// Size of the scratch table of one SMix invocation (128 * r * N bytes)
    pub const fn scratch_len(&self) -> u64 {
        128 * self.r as u64 * self.n()
    }
}
