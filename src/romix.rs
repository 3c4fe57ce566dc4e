use crate::{
    block_mix::block_mix,
    memory::{Block64, ScratchTable, WorkBuffer},
};

#[cfg(target_arch = "x86_64")]
cpufeatures::new!(cpuid_avx2, "avx2");

/// Whether the AVX2 variant of the mixing loop can run here
#[inline(always)]
fn avx2_available() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        cfg!(target_feature = "avx2") || cpuid_avx2::get()
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

/// Name of the kernel [`smix`] runs on this machine: `"avx2"` or `"portable"`
pub fn selected_kernel() -> &'static str {
    if avx2_available() { "avx2" } else { "portable" }
}

/// $Integerify$: the first word of the last 64-byte block, as an index
#[inline(always)]
fn integerify(x: &[Block64]) -> usize {
    x[x.len() - 1][0] as usize
}

#[cfg_attr(
    all(target_arch = "x86_64", not(target_feature = "avx2")),
    scrypt_ctr_derive::generate_target_variant("avx2")
)]
#[cfg_attr(
    not(all(target_arch = "x86_64", not(target_feature = "avx2"))),
    inline(always)
)]
fn ro_mix_dyn(x: &mut [Block64], y: &mut [Block64], v: &mut ScratchTable) {
    let r = v.r();
    let n = v.n();
    // n is a power of two and at least 2, so both loops run in whole X/Y round trips
    debug_assert!(n >= 2 && n.is_power_of_two(), "ro_mix_dyn: invalid n");

    for i in (0..n).step_by(2) {
        v.slot_mut(i).copy_from_slice(x);
        block_mix(r, &*x, y);
        v.slot_mut(i + 1).copy_from_slice(y);
        block_mix(r, &*y, x);
    }

    for _ in (0..n).step_by(2) {
        let j = integerify(x) & (n - 1);
        block_mix(r, &(&*x, v.slot(j)), y);

        let j2 = integerify(y) & (n - 1);
        block_mix(r, &(&*y, v.slot(j2)), x);
    }
}

fn ro_mix_words(x: &mut [Block64], y: &mut [Block64], v: &mut ScratchTable) {
    #[cfg(all(target_arch = "x86_64", not(target_feature = "avx2")))]
    {
        if avx2_available() {
            // SAFETY: AVX2 availability was just checked
            unsafe { ro_mix_dyn_avx2(x, y, v) };
            return;
        }
    }

    ro_mix_dyn(x, y, v)
}

/// $SMix$: run $ROMix$ over one `128 * r` byte lane in place
///
/// `r` and `N` are taken from the scratch table. The work buffer must be sized for the
/// same `r`.
pub fn smix(block: &mut [u8], v: &mut ScratchTable, work: &mut WorkBuffer) {
    let r = v.r();
    assert_eq!(work.r(), r, "smix: work buffer and scratch table disagree on r");
    assert_eq!(block.len(), 128 * r, "smix: block.len() != 128 * r");

    let (x, y) = work.split();
    for (b, chunk) in x.iter_mut().zip(block.chunks_exact(64)) {
        *b = Block64::load_le(chunk);
    }

    ro_mix_words(x, y, v);

    for (b, chunk) in x.iter().zip(block.chunks_exact_mut(64)) {
        b.store_le(chunk);
    }
}
