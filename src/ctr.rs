//! AES in counter mode over a big-endian counter block.
//!
//! The counter wraps silently to zero after its maximum value. Keeping the stream length
//! far below `2^bits` blocks is the caller's responsibility.

use alloc::vec::Vec;

use aes::cipher::{BlockEncrypt, KeyInit};

use crate::Error;

/// Initial counter value used when none is given
pub const DEFAULT_INITIAL_VALUE: u128 = 1;

const AES_BLOCK_BITS: usize = 128;

/// A big-endian counter of a fixed whole-byte width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    bytes: Vec<u8>,
}

impl Default for Counter {
    /// A 128-bit counter starting at [`DEFAULT_INITIAL_VALUE`]
    fn default() -> Self {
        Self {
            bytes: DEFAULT_INITIAL_VALUE.to_be_bytes().to_vec(),
        }
    }
}

impl Counter {
    /// Create a counter `bits` wide holding `initial`
    ///
    /// `initial` is placed in the low-order bytes. Counters wider than 128 bits can
    /// therefore only start at values up to `u128::MAX`, and `CounterValueTooLarge` only
    /// fires for widths below 128 bits.
    pub fn new(bits: usize, initial: u128) -> Result<Self, Error> {
        if bits == 0 || bits % 8 != 0 {
            return Err(Error::InvalidCounterWidth(bits));
        }

        let width = bits / 8;
        if width < 16 && initial >> (width * 8) != 0 {
            return Err(Error::CounterValueTooLarge { bits });
        }

        let mut bytes = alloc::vec![0u8; width];
        let value = initial.to_be_bytes();
        let n = width.min(value.len());
        bytes[width - n..].copy_from_slice(&value[value.len() - n..]);

        Ok(Self { bytes })
    }

    /// Width in bits
    pub fn bits(&self) -> usize {
        self.bytes.len() * 8
    }

    /// The current counter block
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Add one with carry, wrapping to all zeros past the maximum
    pub fn advance(&mut self) {
        for b in self.bytes.iter_mut().rev() {
            let (next, carry) = b.overflowing_add(1);
            *b = next;
            if !carry {
                return;
            }
        }
    }

    /// Return the current counter block, then advance
    pub fn next_block(&mut self) -> Vec<u8> {
        let block = self.bytes.clone();
        self.advance();
        block
    }
}

enum AesCipher {
    Aes128(aes::Aes128),
    Aes192(aes::Aes192),
    Aes256(aes::Aes256),
}

impl AesCipher {
    fn new(key: &[u8]) -> Result<Self, Error> {
        let invalid = |_: aes::cipher::InvalidLength| Error::InvalidKeyLength(key.len());
        Ok(match key.len() {
            16 => Self::Aes128(aes::Aes128::new_from_slice(key).map_err(invalid)?),
            24 => Self::Aes192(aes::Aes192::new_from_slice(key).map_err(invalid)?),
            32 => Self::Aes256(aes::Aes256::new_from_slice(key).map_err(invalid)?),
            len => return Err(Error::InvalidKeyLength(len)),
        })
    }

    fn key_bits(&self) -> usize {
        match self {
            Self::Aes128(_) => 128,
            Self::Aes192(_) => 192,
            Self::Aes256(_) => 256,
        }
    }

    #[inline(always)]
    fn encrypt_block(&self, block: &mut aes::Block) {
        match self {
            Self::Aes128(c) => c.encrypt_block(block),
            Self::Aes192(c) => c.encrypt_block(block),
            Self::Aes256(c) => c.encrypt_block(block),
        }
    }
}

/// AES-CTR stream state: cipher, counter and the unconsumed key-stream residue
pub struct AesCtr {
    cipher: AesCipher,
    counter: Counter,
    keystream: aes::Block,
    used: usize,
}

impl core::fmt::Debug for AesCtr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AesCtr")
            .field("key_bits", &self.cipher.key_bits())
            .field("residue", &(self.keystream.len() - self.used))
            .finish_non_exhaustive()
    }
}

impl AesCtr {
    /// Key AES-128/192/256 from a 16, 24 or 32 byte key; the counter must be 128 bits wide
    pub fn new(key: &[u8], counter: Counter) -> Result<Self, Error> {
        if counter.bits() != AES_BLOCK_BITS {
            return Err(Error::UnsupportedCounterWidth(counter.bits()));
        }
        let cipher = AesCipher::new(key)?;
        log::debug!("aes-ctr: AES-{} selected", cipher.key_bits());

        let keystream = aes::Block::default();
        Ok(Self {
            cipher,
            counter,
            used: keystream.len(),
            keystream,
        })
    }

    /// The counter block the next refill will encrypt
    pub fn counter(&self) -> &Counter {
        &self.counter
    }

    fn refill(&mut self) {
        self.keystream.copy_from_slice(self.counter.as_bytes());
        self.counter.advance();
        self.cipher.encrypt_block(&mut self.keystream);
        self.used = 0;
    }

    /// XOR the key-stream into `data` in place
    pub fn apply_keystream(&mut self, mut data: &mut [u8]) {
        while !data.is_empty() {
            if self.used == self.keystream.len() {
                self.refill();
            }

            let take = (self.keystream.len() - self.used).min(data.len());
            let (head, tail) = core::mem::take(&mut data).split_at_mut(take);
            head.iter_mut()
                .zip(&self.keystream[self.used..self.used + take])
                .for_each(|(d, k)| *d ^= k);

            self.used += take;
            data = tail;
        }
    }

    /// Encrypt, continuing the key-stream from previous calls
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Vec<u8> {
        let mut out = plaintext.to_vec();
        self.apply_keystream(&mut out);
        out
    }

    /// Decrypt; identical to [`AesCtr::encrypt`]
    pub fn decrypt(&mut self, ciphertext: &[u8]) -> Vec<u8> {
        self.encrypt(ciphertext)
    }
}

/// One-shot AES-CTR encryption
pub fn encrypt(key: &[u8], counter: Counter, plaintext: &[u8]) -> Result<Vec<u8>, Error> {
    Ok(AesCtr::new(key, counter)?.encrypt(plaintext))
}

/// One-shot AES-CTR decryption
pub fn decrypt(key: &[u8], counter: Counter, ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
    encrypt(key, counter, ciphertext)
}
