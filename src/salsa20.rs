use crate::memory::Block64;

macro_rules! quarter_words {
    ($w:expr, $a:literal, $b:literal, $c:literal, $d:literal) => {
        $w[$b] ^= $w[$a].wrapping_add($w[$d]).rotate_left(7);
        $w[$c] ^= $w[$b].wrapping_add($w[$a]).rotate_left(9);
        $w[$d] ^= $w[$c].wrapping_add($w[$b]).rotate_left(13);
        $w[$a] ^= $w[$d].wrapping_add($w[$c]).rotate_left(18);
    };
}

/// Apply `ROUND_PAIRS` Salsa20 double rounds to a block and add the input back in
#[inline(always)]
pub fn keystream<const ROUND_PAIRS: usize>(block: &mut Block64) {
    let mut w = block.0;

    for _ in 0..ROUND_PAIRS {
        // columns
        quarter_words!(w, 0, 4, 8, 12);
        quarter_words!(w, 5, 9, 13, 1);
        quarter_words!(w, 10, 14, 2, 6);
        quarter_words!(w, 15, 3, 7, 11);

        // rows
        quarter_words!(w, 0, 1, 2, 3);
        quarter_words!(w, 5, 6, 7, 4);
        quarter_words!(w, 10, 11, 8, 9);
        quarter_words!(w, 15, 12, 13, 14);
    }

    for i in 0..16 {
        block.0[i] = block.0[i].wrapping_add(w[i]);
    }
}

/// The Salsa20/8 core on 16 words
#[inline(always)]
pub fn salsa20_8(block: &mut Block64) {
    keystream::<4>(block);
}

/// The Salsa20/8 core on 64 little-endian bytes, in place
pub fn salsa20_8_bytes(bytes: &mut [u8; 64]) {
    let mut block = Block64::load_le(&bytes[..]);
    salsa20_8(&mut block);
    block.store_le(&mut bytes[..]);
}
