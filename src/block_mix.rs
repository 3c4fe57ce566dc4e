use crate::{memory::Block64, salsa20::salsa20_8};

/// Trait for loading a block from a BlockMix input
pub trait ScryptBlockMixInput {
    /// Load the 64-byte block at index `idx`
    fn load(&self, idx: usize) -> Block64;
}

impl ScryptBlockMixInput for [Block64] {
    #[inline(always)]
    fn load(&self, idx: usize) -> Block64 {
        self[idx]
    }
}

impl<T: ScryptBlockMixInput + ?Sized> ScryptBlockMixInput for &T {
    #[inline(always)]
    fn load(&self, idx: usize) -> Block64 {
        (**self).load(idx)
    }
}

impl<T: ScryptBlockMixInput + ?Sized> ScryptBlockMixInput for &mut T {
    #[inline(always)]
    fn load(&self, idx: usize) -> Block64 {
        (**self).load(idx)
    }
}

/// Two inputs read as their XOR, so `BlockMix(X ^ V[j])` never materializes the sum
impl<Lhs: ScryptBlockMixInput, Rhs: ScryptBlockMixInput> ScryptBlockMixInput for (Lhs, Rhs) {
    #[inline(always)]
    fn load(&self, idx: usize) -> Block64 {
        let mut x0 = self.0.load(idx);
        let x1 = self.1.load(idx);
        x0.xor_with(&x1);
        x0
    }
}

/// $BlockMix_{Salsa20/8, r}$ from `input` ($2r$ blocks) into `output` ($2r$ blocks)
///
/// Even-indexed results land in the first half of `output`, odd-indexed results in the
/// second half.
#[inline(always)]
pub fn block_mix<I: ScryptBlockMixInput + ?Sized>(r: usize, input: &I, output: &mut [Block64]) {
    assert_eq!(output.len(), 2 * r, "block_mix: output.len() != 2 * r");

    let (even, odd) = output.split_at_mut(r);
    let mut x = input.load(2 * r - 1);

    for i in 0..r {
        x.xor_with(&input.load(2 * i));
        salsa20_8(&mut x);
        even[i] = x;

        x.xor_with(&input.load(2 * i + 1));
        salsa20_8(&mut x);
        odd[i] = x;
    }
}

/// $BlockMix$ over little-endian byte buffers of `128 * r` bytes each
pub fn block_mix_bytes(r: usize, input: &[u8], output: &mut [u8]) {
    assert_eq!(input.len(), 128 * r, "block_mix_bytes: input.len() != 128 * r");
    assert_eq!(output.len(), 128 * r, "block_mix_bytes: output.len() != 128 * r");

    let mut x = alloc::vec::Vec::with_capacity(2 * r);
    x.extend(input.chunks_exact(64).map(Block64::load_le));
    let mut y = alloc::vec![Block64::default(); 2 * r];

    block_mix(r, x.as_slice(), &mut y);

    for (block, chunk) in y.iter().zip(output.chunks_exact_mut(64)) {
        block.store_le(chunk);
    }
}
