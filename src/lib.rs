#![doc = include_str!("../README.md")]
#![cfg_attr(
    all(not(test), not(feature = "std"), not(target_arch = "wasm32")),
    no_std
)]
#![warn(missing_docs)]

extern crate alloc;

/// Re-export sha2
pub use sha2;


/// Memory utilities
pub mod memory;

/// Salsa20/8 core
pub mod salsa20;

/// $BlockMix_{Salsa20/8, r}$
pub mod block_mix;

/// $ROMix$ / $SMix$
pub mod romix;

/// PBKDF2-HMAC-SHA256
pub mod pbkdf2;

/// scrypt entry points, C exports and WASM bindings
pub mod compat;

/// AES-CTR stream cipher
pub mod ctr;

mod error;
mod params;

pub use block_mix::block_mix;
#[cfg(feature = "std")]
pub use compat::scrypt_parallel;
pub use compat::{scrypt, scrypt_hash};
pub use ctr::{AesCtr, Counter};
pub use error::Error;
pub use params::Params;
pub use pbkdf2::{Pbkdf2HmacSha256State, pbkdf2_hmac_sha256};

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))] {
        /// The ROMix kernel selected at compile time
        pub const KERNEL: &str = "avx2 (static)";
    } else if #[cfg(target_arch = "x86_64")] {
        /// The ROMix kernel selected at compile time
        pub const KERNEL: &str = "portable + avx2 (runtime dispatch)";
    } else {
        /// The ROMix kernel selected at compile time
        pub const KERNEL: &str = "portable";
    }
}
