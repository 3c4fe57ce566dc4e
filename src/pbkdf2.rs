use core::num::NonZeroU32;

use sha2::{
    Digest, Sha256,
    digest::{crypto_common, generic_array::GenericArray},
};

type Sha256Block = crypto_common::Block<Sha256>;

const IV: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

const MAX_OUTPUT_LEN: u64 = u32::MAX as u64 * 32;

const OPAD: u8 = 0x5c;
const IPAD: u8 = 0x36;

// bit length of a message made of one padded key block and one 32-byte digest
const KEYED_DIGEST_BITS: u64 = (64 + 32) * 8;

#[inline(always)]
fn words_to_be_bytes(words: &[u32; 8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (chunk, w) in out.chunks_exact_mut(4).zip(words.iter()) {
        chunk.copy_from_slice(&w.to_be_bytes());
    }
    out
}

/// SHA-256 over raw compression words, resumable from a precomputed prefix state
#[derive(Clone)]
struct SoftSha256 {
    words: [u32; 8],
    buf: Sha256Block,
    ptr: usize,
    prev_blocks: u64,
}

impl SoftSha256 {
    /// Resume from a state that has absorbed exactly one block (the padded HMAC key)
    #[inline(always)]
    fn resume_keyed(words: [u32; 8]) -> Self {
        Self {
            words,
            buf: Default::default(),
            ptr: 0,
            prev_blocks: 1,
        }
    }

    fn update(&mut self, mut data: &[u8]) {
        if self.ptr > 0 {
            let take = (64 - self.ptr).min(data.len());
            self.buf[self.ptr..self.ptr + take].copy_from_slice(&data[..take]);
            self.ptr += take;
            data = &data[take..];

            if self.ptr < 64 {
                return;
            }

            sha2::compress256(&mut self.words, core::slice::from_ref(&self.buf));
            self.prev_blocks += 1;
            self.ptr = 0;
        }

        let mut chunks = data.chunks_exact(64);
        for chunk in &mut chunks {
            sha2::compress256(&mut self.words, &[GenericArray::from_slice(chunk).clone()]);
            self.prev_blocks += 1;
        }

        let remainder = chunks.remainder();
        self.buf[..remainder.len()].copy_from_slice(remainder);
        self.ptr = remainder.len();
    }

    fn finalize(mut self) -> [u32; 8] {
        let bit_len = (self.prev_blocks * 64 + self.ptr as u64) * 8;

        self.buf[self.ptr] = 0x80;
        self.buf[self.ptr + 1..].fill(0);
        if self.ptr >= 56 {
            sha2::compress256(&mut self.words, core::slice::from_ref(&self.buf));
            self.buf.fill(0);
        }
        self.buf[56..].copy_from_slice(&bit_len.to_be_bytes());
        sha2::compress256(&mut self.words, core::slice::from_ref(&self.buf));

        self.words
    }
}

#[derive(Clone, Copy)]
#[repr(align(64))]
/// A cheaply copyable HMAC-SHA256 state for PBKDF2-HMAC-SHA256
///
/// The inner and outer padded keys are compressed once up front, so every PRF call starts
/// from a one-block prefix instead of re-hashing the password.
pub struct Pbkdf2HmacSha256State {
    inner_digest_words: [u32; 8],
    outer_digest_words: [u32; 8],
}

impl core::fmt::Debug for Pbkdf2HmacSha256State {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pbkdf2HmacSha256State").finish_non_exhaustive()
    }
}

impl Pbkdf2HmacSha256State {
    /// Create a new PBKDF2-HMAC-SHA256 state from a password
    ///
    /// Passwords longer than the SHA-256 block are hashed first, as HMAC requires.
    pub fn new(password: &[u8]) -> Self {
        let mut key_pad = Sha256Block::default();
        if password.len() <= key_pad.len() {
            key_pad[..password.len()].copy_from_slice(password);
        } else {
            let key_hash = Sha256::digest(password);
            key_pad[..key_hash.len()].copy_from_slice(&key_hash);
        }

        let mut inner_words = IV;
        let mut outer_words = IV;
        key_pad.iter_mut().for_each(|b| *b ^= IPAD);
        sha2::compress256(&mut inner_words, core::slice::from_ref(&key_pad));
        key_pad.iter_mut().for_each(|b| *b ^= IPAD ^ OPAD);
        sha2::compress256(&mut outer_words, core::slice::from_ref(&key_pad));

        Self {
            inner_digest_words: inner_words,
            outer_digest_words: outer_words,
        }
    }

    /// Hash a 32-byte message on top of a keyed prefix, which always fits one final block
    #[inline(always)]
    fn keyed_digest_block(prefix: [u32; 8], msg: &[u8; 32]) -> [u32; 8] {
        let mut block = Sha256Block::default();
        block[..32].copy_from_slice(msg);
        block[32] = 0x80;
        block[56..].copy_from_slice(&KEYED_DIGEST_BITS.to_be_bytes());

        let mut words = prefix;
        sha2::compress256(&mut words, core::slice::from_ref(&block));
        words
    }

    #[inline(always)]
    fn finish_outer(&self, inner_words: [u32; 8]) -> [u8; 32] {
        let inner = words_to_be_bytes(&inner_words);
        words_to_be_bytes(&Self::keyed_digest_block(self.outer_digest_words, &inner))
    }

    #[inline(always)]
    fn prf_digest(&self, msg: &[u8; 32]) -> [u8; 32] {
        self.finish_outer(Self::keyed_digest_block(self.inner_digest_words, msg))
    }

    /// HMAC-SHA256 of an arbitrary message under this state's key
    pub fn hmac(&self, msg: &[u8]) -> [u8; 32] {
        let mut inner = SoftSha256::resume_keyed(self.inner_digest_words);
        inner.update(msg);
        self.finish_outer(inner.finalize())
    }

    /// Fill `output` with PBKDF2-HMAC-SHA256(password, salt, iterations)
    ///
    /// # Panics
    ///
    /// If `output` is longer than `(2^32 - 1) * 32` bytes.
    pub fn emit(&self, salt: &[u8], iterations: NonZeroU32, output: &mut [u8]) {
        assert_output_len(output.len());

        let mut salted = SoftSha256::resume_keyed(self.inner_digest_words);
        salted.update(salt);

        for (chunk, block_index) in output.chunks_mut(32).zip(1..=u32::MAX) {
            let mut inner = salted.clone();
            inner.update(&block_index.to_be_bytes());

            let mut u = self.finish_outer(inner.finalize());
            let mut t = u;
            for _ in 1..iterations.get() {
                u = self.prf_digest(&u);
                t.iter_mut().zip(u.iter()).for_each(|(t, u)| *t ^= u);
            }

            chunk.copy_from_slice(&t[..chunk.len()]);
        }
    }
}

#[inline(always)]
fn assert_output_len(len: usize) {
    assert!(len as u64 <= MAX_OUTPUT_LEN, "PBKDF2 output too long: {} bytes", len);
}

/// PBKDF2-HMAC-SHA256 in one call
///
/// # Panics
///
/// If `output` is longer than `(2^32 - 1) * 32` bytes.
pub fn pbkdf2_hmac_sha256(password: &[u8], salt: &[u8], iterations: NonZeroU32, output: &mut [u8]) {
    Pbkdf2HmacSha256State::new(password).emit(salt, iterations, output);
}
