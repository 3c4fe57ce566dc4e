use core::ops::{Deref, DerefMut};

use alloc::vec::Vec;

use crate::{Error, Params};

#[repr(align(64))]
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy)]
/// Align to 64 bytes
pub struct Align64<T>(pub T);

/// One 64-byte Salsa20 block viewed as 16 native words
pub type Block64 = Align64<[u32; 16]>;

impl Block64 {
    /// Load a block from 64 little-endian bytes
    #[inline(always)]
    pub fn load_le(bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len(), 64, "unexpected block length");
        let mut w = [0u32; 16];
        for (word, chunk) in w.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self(w)
    }

    /// Store the block as 64 little-endian bytes
    #[inline(always)]
    pub fn store_le(&self, bytes: &mut [u8]) {
        debug_assert_eq!(bytes.len(), 64, "unexpected block length");
        for (word, chunk) in self.0.iter().zip(bytes.chunks_exact_mut(4)) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
    }

    /// XOR a block with another block
    #[inline(always)]
    pub fn xor_with(&mut self, other: &Self) {
        for i in 0..16 {
            self.0[i] ^= other.0[i];
        }
    }
}

impl<T> AsRef<T> for Align64<T> {
    fn as_ref(&self) -> &T {
        &self.0
    }
}

impl<T> AsMut<T> for Align64<T> {
    fn as_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> Deref for Align64<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Align64<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Allocate a zeroed block buffer, reporting allocation failure instead of aborting
pub(crate) fn try_alloc_blocks(len: usize) -> Result<Vec<Block64>, Error> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| Error::OutOfMemory {
        bytes: len.saturating_mul(core::mem::size_of::<Block64>()),
    })?;
    v.resize(len, Block64::default());
    Ok(v)
}

/// The $V$ table of one $ROMix$ invocation ($N$ slots of $2r$ blocks)
///
/// A table is owned by exactly one SMix call at a time. The serial path reuses one
/// table for every lane; the parallel path allocates one per worker.
#[derive(Debug)]
pub struct ScratchTable {
    v: Vec<Block64>,
    r: usize,
    n: usize,
}

impl ScratchTable {
    /// Allocate a table for the given parameters
    pub fn new(params: &Params) -> Result<Self, Error> {
        let r = params.r() as usize;
        let n = params.n() as usize;
        let blocks = n
            .checked_mul(2 * r)
            .ok_or(Error::OutOfMemory { bytes: usize::MAX })?;

        Ok(Self {
            v: try_alloc_blocks(blocks)?,
            r,
            n,
        })
    }

    /// Block size factor this table was sized for
    #[inline(always)]
    pub const fn r(&self) -> usize {
        self.r
    }

    /// Number of slots
    #[inline(always)]
    pub const fn n(&self) -> usize {
        self.n
    }

    /// Total size in bytes
    pub const fn byte_len(&self) -> usize {
        self.n * self.r * 128
    }

    #[inline(always)]
    pub(crate) fn slot(&self, i: usize) -> &[Block64] {
        let w = 2 * self.r;
        &self.v[i * w..(i + 1) * w]
    }

    #[inline(always)]
    pub(crate) fn slot_mut(&mut self, i: usize) -> &mut [Block64] {
        let w = 2 * self.r;
        &mut self.v[i * w..(i + 1) * w]
    }
}

/// The $X$/$Y$ working buffer of one SMix invocation ($4r$ blocks)
#[derive(Debug)]
pub struct WorkBuffer {
    xy: Vec<Block64>,
    r: usize,
}

impl WorkBuffer {
    /// Allocate a working buffer for block size factor `r`
    pub fn new(params: &Params) -> Result<Self, Error> {
        let r = params.r() as usize;
        Ok(Self {
            xy: try_alloc_blocks(4 * r)?,
            r,
        })
    }

    /// Block size factor this buffer was sized for
    #[inline(always)]
    pub const fn r(&self) -> usize {
        self.r
    }

    /// Split into the $X$ and $Y$ halves
    #[inline(always)]
    pub(crate) fn split(&mut self) -> (&mut [Block64], &mut [Block64]) {
        self.xy.split_at_mut(2 * self.r)
    }
}
