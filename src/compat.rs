use alloc::vec::Vec;
use core::num::{NonZeroU8, NonZeroU32};

#[cfg(target_arch = "wasm32")]
use alloc::string::{String, ToString};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use crate::{
    Error, Params,
    memory::{ScratchTable, WorkBuffer},
    pbkdf2::Pbkdf2HmacSha256State,
    romix::smix,
};

const ONE_ITERATION: NonZeroU32 = NonZeroU32::MIN;

/// Allocate the `p * 128 * r` byte lane buffer $B$
fn alloc_lanes(params: &Params) -> Result<Vec<u8>, Error> {
    let len = (params.r() as usize)
        .checked_mul(128)
        .and_then(|l| l.checked_mul(params.p() as usize))
        .ok_or(Error::OutOfMemory { bytes: usize::MAX })?;

    let mut lanes = Vec::new();
    lanes
        .try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory { bytes: len })?;
    lanes.resize(len, 0);
    Ok(lanes)
}

/// Run scrypt with the given parameters and store the result in the output buffer.
///
/// Validates `output.len()` and allocates every buffer before any hashing starts. The `p`
/// lanes are mixed in index order through a single scratch table. An empty output is
/// accepted and leaves nothing to compute.
pub fn scrypt(password: &[u8], salt: &[u8], params: &Params, output: &mut [u8]) -> Result<(), Error> {
    Params::check_output_len(output.len())?;
    if output.is_empty() {
        return Ok(());
    }

    let mut lanes = alloc_lanes(params)?;
    let mut v = ScratchTable::new(params)?;
    let mut work = WorkBuffer::new(params)?;

    log::debug!(
        "scrypt: N/r/p = {}, scratch {} bytes, output {} bytes",
        params,
        v.byte_len(),
        output.len()
    );

    let hmac_state = Pbkdf2HmacSha256State::new(password);
    hmac_state.emit(salt, ONE_ITERATION, &mut lanes);

    for (i, lane) in lanes.chunks_exact_mut(params.block_len()).enumerate() {
        log::trace!("scrypt: mixing lane {}/{}", i + 1, params.p());
        smix(lane, &mut v, &mut work);
    }

    hmac_state.emit(&lanes, ONE_ITERATION, output);
    Ok(())
}

/// Run scrypt with the `p` lanes spread over up to `workers` threads.
///
/// Each worker owns a private scratch table, so peak memory is `min(workers, p)` tables.
/// The result is identical to [`scrypt`].
#[cfg(feature = "std")]
pub fn scrypt_parallel(
    password: &[u8],
    salt: &[u8],
    params: &Params,
    workers: core::num::NonZeroUsize,
    output: &mut [u8],
) -> Result<(), Error> {
    Params::check_output_len(output.len())?;
    if output.is_empty() {
        return Ok(());
    }

    let p = params.p() as usize;
    let workers = workers.get().min(p);
    let lanes_per_worker = p.div_ceil(workers);
    let workers = p.div_ceil(lanes_per_worker);

    let mut lanes = alloc_lanes(params)?;
    let mut buffers = Vec::new();
    buffers
        .try_reserve_exact(workers)
        .map_err(|_| Error::OutOfMemory { bytes: usize::MAX })?;
    for _ in 0..workers {
        buffers.push((ScratchTable::new(params)?, WorkBuffer::new(params)?));
    }

    log::debug!(
        "scrypt: N/r/p = {}, {} workers x {} lanes, scratch {} bytes, output {} bytes",
        params,
        workers,
        lanes_per_worker,
        params.scratch_len() * workers as u64,
        output.len()
    );

    let hmac_state = Pbkdf2HmacSha256State::new(password);
    hmac_state.emit(salt, ONE_ITERATION, &mut lanes);

    let block_len = params.block_len();
    std::thread::scope(|s| {
        for (w, (group, (v, work))) in lanes
            .chunks_mut(lanes_per_worker * block_len)
            .zip(buffers.iter_mut())
            .enumerate()
        {
            s.spawn(move || {
                for (i, lane) in group.chunks_exact_mut(block_len).enumerate() {
                    log::trace!("scrypt: worker {} mixing lane {}", w, w * lanes_per_worker + i);
                    smix(lane, v, work);
                }
            });
        }
    });

    hmac_state.emit(&lanes, ONE_ITERATION, output);
    Ok(())
}

/// Derive `dk_len` bytes from a password and salt.
///
/// Fails before any computation when `n` is not a power of two of at least 2, or any
/// other parameter is out of range.
pub fn scrypt_hash(
    password: &[u8],
    salt: &[u8],
    n: u64,
    r: u32,
    p: u32,
    dk_len: usize,
) -> Result<Vec<u8>, Error> {
    let params = Params::new(n, r, p)?;
    Params::check_output_len(dk_len)?;

    let mut output = Vec::new();
    output
        .try_reserve_exact(dk_len)
        .map_err(|_| Error::OutOfMemory { bytes: dk_len })?;
    output.resize(dk_len, 0);

    scrypt(password, salt, &params, &mut output)?;
    Ok(output)
}

/// # Safety
///
/// `ptr` must be valid for `len` bytes unless `len` is zero.
unsafe fn slice_or_empty<'a>(ptr: *const u8, len: usize) -> &'a [u8] {
    if len == 0 || ptr.is_null() {
        &[]
    } else {
        unsafe { core::slice::from_raw_parts(ptr, len) }
    }
}

#[unsafe(export_name = "scrypt_kdf_cf")]
/// C export for scrypt_kdf using a libscrypt-kdf compatible API except input is taken as a cost factor.
///
/// Returns 0 on success and -1 on invalid parameters or allocation failure.
///
/// # Safety
///
/// `password`, `salt` and `output` must be valid for their respective lengths.
pub unsafe extern "C" fn scrypt_c_cf(
    password: *const u8,
    password_len: usize,
    salt: *const u8,
    salt_len: usize,
    log2_n: u8,
    r: u32,
    p: u32,
    output: *mut u8,
    output_len: usize,
) -> core::ffi::c_int {
    let Some(cf) = NonZeroU8::new(log2_n) else {
        return -1;
    };
    let Ok(params) = Params::new_cf(cf, r, p) else {
        return -1;
    };
    if output.is_null() {
        return -1;
    }

    let password = unsafe { slice_or_empty(password, password_len) };
    let salt = unsafe { slice_or_empty(salt, salt_len) };
    let output = unsafe { core::slice::from_raw_parts_mut(output, output_len) };
    match scrypt(password, salt, &params, output) {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

#[unsafe(export_name = "scrypt_kdf")]
/// C export for scrypt_kdf using a libscrypt-kdf compatible API.
///
/// Returns 0 on success and -1 on invalid parameters or allocation failure.
///
/// # Safety
///
/// `password`, `salt` and `output` must be valid for their respective lengths.
pub unsafe extern "C" fn scrypt_c(
    password: *const u8,
    password_len: usize,
    salt: *const u8,
    salt_len: usize,
    n: u64,
    r: u32,
    p: u32,
    output: *mut u8,
    output_len: usize,
) -> core::ffi::c_int {
    let Ok(params) = Params::new(n, r, p) else {
        return -1;
    };
    if output.is_null() {
        return -1;
    }

    let password = unsafe { slice_or_empty(password, password_len) };
    let salt = unsafe { slice_or_empty(salt, salt_len) };
    let output = unsafe { core::slice::from_raw_parts_mut(output, output_len) };
    match scrypt(password, salt, &params, output) {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = "scrypt")]
/// WASM bindings for scrypt, returning the derived key as lowercase hex or an error message.
pub fn scrypt_wasm(password: &[u8], salt: &[u8], n: u32, r: u32, p: u32, dklen: usize) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    let dk = match scrypt_hash(password, salt, n as u64, r, p, dklen) {
        Ok(dk) => dk,
        Err(e) => return e.to_string(),
    };

    let mut result = String::with_capacity(dklen * 2);
    for b in dk {
        result.push(HEX[(b >> 4) as usize] as char);
        result.push(HEX[(b & 0xf) as usize] as char);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const KARATE_1024_1_1: &str = "3a3cbca04456f6ee5295460171a2a2b27e1c28163999f19ab1e2eeda01e355d9\
        04627c6baa185087f99f3fee33e4a9ccad1f4230681d77301d2b4f6543023e09\
        0faf6e86431a1071f64b693402ceb485469ef33308af104fb1f87b39ecaf733e\
        bc3d73b184c0914fbc4e8eff90777c60172596de79070418f3c9998b6b60640f\
        1d8f3019904b3e20f2920d26c21daf81d0652ffcaffccf734773e0730900204\
        b56b5bebbfb8c3a31d543f6e3ac5f4e1431a864da87c239eefec8e462d458ee2\
        d214646864e9207e15f66a3782b52bb5158152d757d0ca25d2062235ee76c431\
        e5016b3a52cd5b575e3a26aba95654d5b9a991527f5a19d7275ac4f9889081ee9";

    fn hash_hex(password: &[u8], salt: &[u8], n: u64, r: u32, p: u32, len: usize) -> String {
        hex::encode(scrypt_hash(password, salt, n, r, p, len).unwrap())
    }

    #[test]
    fn test_published_vectors() {
        assert_eq!(
            hash_hex(b"password", b"salt", 2, 1, 1, 32),
            "6d1bb878eee9ce4a7b77d7a44103574d4cbfe3c15ae3940f0ffe75cd5e1e0afa"
        );
        assert_eq!(
            hash_hex(b"password", b"salt", 32, 4, 15, 128),
            "19f255f7dbcc4128e3467c78c795cb934a82bb813793d2634f6e3adbaee1f54b\
             118fca8b067ab4aad3f6557c716b3734bb93a5cb40500b5e42dc96ccee260fc6\
             4d8e660b80e7aecd81c83fefedaf1319b6265e6ef37ca268247052f0b5cac91d\
             14800c1b6f8cb23a28f4620aa0a8e12de88906ec5755a4a643917947a010b7bf"
        );
        assert_eq!(
            hash_hex(b"password", b"salt", 128, 3, 3, 45),
            "bdbefc353d2145625af2d8f86dad13d6bd993daabbb39a740887ff985803a226\
             75284ad4c3ab5f68a779d0b71a"
        );
        assert_eq!(
            hash_hex(b"password", b"salt", 256, 6, 2, 100),
            "08d4bd8bc6a0db2d3afb86e14bb3e219c7e067add953576ebc4678f86c85f5bc\
             819de1fe22877c7d98c2ee11fef9f3a1ca0047a079b3ee35152c31d51b8db57f\
             267050255065b933d65edfc65203e9b964c5c54507eba8b990c8c9106274fa10\
             5237550a"
        );
        assert_eq!(
            hash_hex(
                b"You're a master of Karate",
                b"And friendship for Everyone",
                1024,
                1,
                1,
                256
            ),
            KARATE_1024_1_1
        );
    }

    #[test]
    fn test_rfc7914_vectors() {
        assert_eq!(
            hash_hex(b"", b"", 16, 1, 1, 64),
            "77d6576238657b203b19ca42c18a0497f16b4844e3074ae8dfdffa3fede21442\
             fcd0069ded0948f8326a753a0fc81f17e8d3e0fb2e0d3628cf35e20c38d18906"
        );
        assert_eq!(
            hash_hex(b"password", b"NaCl", 1024, 8, 16, 64),
            "fdbabe1c9d3472007856e7190d01e9fe7c6ad7cbc8237830e77376634b373162\
             2eaf30d92e22a3886ff109279d9830dac727afb94a83ee6d8360cbdfa2cc0640"
        );
    }

    #[test]
    fn test_against_rustcrypto() {
        for (cf, r, p, len) in [(1, 1, 1, 32), (4, 2, 3, 7), (6, 5, 2, 65), (10, 8, 1, 64)] {
            let rc_params = scrypt::Params::new(cf, r, p, 10).unwrap();
            let mut expected = vec![0u8; len];
            scrypt::scrypt(b"hunter2", b"pepper", &rc_params, &mut expected).unwrap();

            let params = Params::new(1 << cf, r, p).unwrap();
            let mut output = vec![0u8; len];
            super::scrypt(b"hunter2", b"pepper", &params, &mut output).unwrap();

            assert_eq!(output, expected, "mismatch at {}", params);
        }
    }

    #[test]
    fn test_rejects_before_work() {
        for n in [0, 1, 3, 12, 1023] {
            assert_eq!(
                scrypt_hash(b"password", b"salt", n, 1, 1, 32),
                Err(Error::InvalidCostFactor(n))
            );
        }

        assert_eq!(
            scrypt_hash(b"password", b"salt", 16, 0, 1, 0),
            Err(Error::InvalidBlockSize)
        );
    }

    #[test]
    fn test_empty_output() {
        assert_eq!(scrypt_hash(b"password", b"salt", 16, 1, 1, 0), Ok(Vec::new()));

        let params = Params::new(16, 1, 1).unwrap();
        let mut empty: [u8; 0] = [];
        assert_eq!(super::scrypt(b"password", b"salt", &params, &mut empty), Ok(()));
        assert_eq!(
            scrypt_parallel(
                b"password",
                b"salt",
                &params,
                core::num::NonZeroUsize::MIN,
                &mut empty
            ),
            Ok(())
        );
    }

    #[test]
    fn test_output_length_exact() {
        let full = scrypt_hash(b"password", b"salt", 16, 2, 2, 200).unwrap();
        for len in [1, 16, 31, 32, 33, 64, 65, 199] {
            let dk = scrypt_hash(b"password", b"salt", 16, 2, 2, len).unwrap();
            assert_eq!(dk.len(), len);
            assert_eq!(dk, full[..len]);
        }
    }

    #[test]
    fn test_deterministic() {
        let a = scrypt_hash(b"pw", b"na", 64, 3, 2, 48).unwrap();
        let b = scrypt_hash(b"pw", b"na", 64, 3, 2, 48).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, scrypt_hash(b"pw", b"nb", 64, 3, 2, 48).unwrap());
    }

    #[test]
    fn test_parallel_matches_serial() {
        let params = Params::new(32, 4, 15).unwrap();
        let mut serial = [0u8; 128];
        super::scrypt(b"password", b"salt", &params, &mut serial).unwrap();

        for workers in [1, 2, 3, 4, 7, 15, 64] {
            let mut parallel = [0u8; 128];
            scrypt_parallel(
                b"password",
                b"salt",
                &params,
                core::num::NonZeroUsize::new(workers).unwrap(),
                &mut parallel,
            )
            .unwrap();
            assert_eq!(parallel, serial, "workers = {}", workers);
        }
    }

    #[test]
    fn test_c_exports() {
        let mut out = [0u8; 32];
        let ret = unsafe {
            scrypt_c(
                b"password".as_ptr(),
                8,
                b"salt".as_ptr(),
                4,
                2,
                1,
                1,
                out.as_mut_ptr(),
                out.len(),
            )
        };
        assert_eq!(ret, 0);
        assert_eq!(
            hex::encode(out),
            "6d1bb878eee9ce4a7b77d7a44103574d4cbfe3c15ae3940f0ffe75cd5e1e0afa"
        );

        let mut out_cf = [0u8; 32];
        let ret = unsafe {
            scrypt_c_cf(
                b"password".as_ptr(),
                8,
                b"salt".as_ptr(),
                4,
                1,
                1,
                1,
                out_cf.as_mut_ptr(),
                out_cf.len(),
            )
        };
        assert_eq!(ret, 0);
        assert_eq!(out_cf, out);

        let ret = unsafe {
            scrypt_c(
                core::ptr::null(),
                0,
                core::ptr::null(),
                0,
                3,
                1,
                1,
                out.as_mut_ptr(),
                out.len(),
            )
        };
        assert_eq!(ret, -1);

        let ret = unsafe {
            scrypt_c_cf(
                core::ptr::null(),
                0,
                core::ptr::null(),
                0,
                0,
                1,
                1,
                out.as_mut_ptr(),
                out.len(),
            )
        };
        assert_eq!(ret, -1);
    }
}
