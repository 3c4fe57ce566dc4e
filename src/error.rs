/// Errors reported by parameter validation, allocation and the AES-CTR wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// N is not a power of two, is less than 2, or exceeds the addressable range
    #[error("invalid cost factor: N = {0} must be a power of two in 2..=2^31")]
    InvalidCostFactor(u64),
    /// r is zero
    #[error("invalid block size: r must be positive")]
    InvalidBlockSize,
    /// p is zero
    #[error("invalid parallelization: p must be positive")]
    InvalidParallelism,
    /// r * p is not below 2^30
    #[error("r * p must be less than 2^30 (r = {r}, p = {p})")]
    ParamsTooLarge {
        /// block size factor
        r: u32,
        /// parallelization factor
        p: u32,
    },
    /// dkLen is above (2^32 - 1) * 32
    #[error("invalid output length: {0}")]
    InvalidOutputLength(usize),
    /// counter width is zero or not a multiple of 8 bits
    #[error("invalid counter length: {0} bits")]
    InvalidCounterWidth(usize),
    /// the initial counter value does not fit in the counter width
    #[error("initial counter value too large for {bits} bits")]
    CounterValueTooLarge {
        /// counter width in bits
        bits: usize,
    },
    /// AES key is not 16, 24 or 32 bytes
    #[error("invalid AES key length: {0} bytes")]
    InvalidKeyLength(usize),
    /// AES-CTR requires a counter as wide as the AES block
    #[error("unsupported counter width for AES-CTR: {0} bits (expected 128)")]
    UnsupportedCounterWidth(usize),
    /// the scratch table could not be allocated
    #[error("failed to allocate {bytes} bytes of scratch memory")]
    OutOfMemory {
        /// requested size
        bytes: usize,
    },
}
