//! The functions behind the provider table.
//!
//! Every entry clears the calling thread's last error, converts its raw
//! arguments to slices, and forwards to the registered provider. Failures
//! are returned as result codes with the message kept in the last error.

use crate::error::{clear_last_error, report, PAGECRYPT_OK};
use pagecrypt_provider::{
    registry, CipherMode, Provider, ProviderContext, ProviderError, ProviderResult,
};
use std::ffi::{c_char, c_int, c_uchar, c_void, CStr, CString};
use std::sync::OnceLock;
use std::{ptr, slice};
use tracing::{error, trace};

/// Descriptive strings, NUL-terminated for C callers.
struct Labels {
    name: CString,
    version: CString,
    cipher: CString,
}

static LABELS: OnceLock<Labels> = OnceLock::new();

fn labels() -> Option<&'static Labels> {
    if let Some(labels) = LABELS.get() {
        return Some(labels);
    }
    let provider = provider().ok()?;
    Some(LABELS.get_or_init(|| Labels {
        name: CString::new(provider.name()).unwrap_or_default(),
        version: CString::new(provider.version()).unwrap_or_default(),
        cipher: CString::new(provider.cipher_name()).unwrap_or_default(),
    }))
}

fn label(select: impl FnOnce(&'static Labels) -> &'static CStr) -> *const c_char {
    labels().map_or(c"".as_ptr(), |labels| select(labels).as_ptr())
}

fn provider() -> ProviderResult<&'static Provider> {
    registry::global().map_err(|e| {
        error!(error = %e, "no provider available");
        e
    })
}

fn size(value: usize) -> c_int {
    c_int::try_from(value).unwrap_or(0)
}

fn length(operation: &'static str, len: c_int) -> ProviderResult<usize> {
    usize::try_from(len).map_err(|_| {
        error!(operation, len, "negative length");
        ProviderError::invalid_input(operation, format!("negative length {len}"))
    })
}

/// Borrows `len` bytes at `ptr`; a null pointer is only accepted for an
/// empty input.
unsafe fn input<'a>(
    operation: &'static str,
    ptr: *const c_uchar,
    len: c_int,
) -> ProviderResult<&'a [u8]> {
    let len = length(operation, len)?;
    if ptr.is_null() {
        if len == 0 {
            return Ok(&[]);
        }
        error!(operation, len, "null input");
        return Err(ProviderError::NullInput { operation });
    }
    Ok(slice::from_raw_parts(ptr, len))
}

unsafe fn output<'a>(
    operation: &'static str,
    ptr: *mut c_uchar,
    len: usize,
) -> ProviderResult<&'a mut [u8]> {
    if ptr.is_null() {
        if len == 0 {
            return Ok(&mut []);
        }
        error!(operation, len, "null output");
        return Err(ProviderError::NullInput { operation });
    }
    Ok(slice::from_raw_parts_mut(ptr, len))
}

/// Resolves the opaque context. A null context was never initialized.
unsafe fn context<'a>(
    operation: &'static str,
    ctx: *mut c_void,
) -> ProviderResult<&'a ProviderContext> {
    match ctx.cast::<ProviderContext>().as_ref() {
        Some(ctx) => Ok(ctx),
        None => {
            error!(operation, "null provider context");
            Err(ProviderError::not_active(operation))
        }
    }
}

pub(crate) unsafe extern "C" fn activate(_ctx: *mut c_void) -> c_int {
    clear_last_error();
    report(&provider().and_then(Provider::activate))
}

pub(crate) unsafe extern "C" fn deactivate(_ctx: *mut c_void) -> c_int {
    clear_last_error();
    report(&provider().and_then(Provider::deactivate))
}

pub(crate) unsafe extern "C" fn get_provider_name(_ctx: *mut c_void) -> *const c_char {
    label(|labels| labels.name.as_c_str())
}

pub(crate) unsafe extern "C" fn get_provider_version(_ctx: *mut c_void) -> *const c_char {
    label(|labels| labels.version.as_c_str())
}

pub(crate) unsafe extern "C" fn get_cipher(_ctx: *mut c_void) -> *const c_char {
    label(|labels| labels.cipher.as_c_str())
}

pub(crate) unsafe extern "C" fn get_key_sz(_ctx: *mut c_void) -> c_int {
    provider().map_or(0, |p| size(p.key_size()))
}

pub(crate) unsafe extern "C" fn get_iv_sz(_ctx: *mut c_void) -> c_int {
    provider().map_or(0, |p| size(p.iv_size()))
}

pub(crate) unsafe extern "C" fn get_block_sz(_ctx: *mut c_void) -> c_int {
    provider().map_or(0, |p| size(p.block_size()))
}

pub(crate) unsafe extern "C" fn get_hmac_sz(_ctx: *mut c_void, algorithm: c_int) -> c_int {
    provider().map_or(0, |p| size(p.hmac_size_for_id(algorithm)))
}

pub(crate) unsafe extern "C" fn fips_status(_ctx: *mut c_void) -> c_int {
    provider().map_or(0, |p| p.fips_status().as_raw())
}

pub(crate) unsafe extern "C" fn random(
    ctx: *mut c_void,
    buffer: *mut c_void,
    length: c_int,
) -> c_int {
    clear_last_error();
    report(&random_impl(ctx, buffer, length))
}

unsafe fn random_impl(ctx: *mut c_void, buffer: *mut c_void, len: c_int) -> ProviderResult<()> {
    let ctx = context("random", ctx)?;
    let len = length("random", len)?;
    let buf = output("random", buffer.cast(), len)?;
    ctx.random(buf)
}

pub(crate) unsafe extern "C" fn add_random(
    ctx: *mut c_void,
    buffer: *mut c_void,
    length: c_int,
) -> c_int {
    clear_last_error();
    if let Err(e) = add_random_impl(ctx, buffer, length) {
        trace!(error = %e, "add_random: entropy ignored");
    }
    PAGECRYPT_OK
}

unsafe fn add_random_impl(ctx: *mut c_void, buffer: *mut c_void, len: c_int) -> ProviderResult<()> {
    let ctx = context("add_random", ctx)?;
    let entropy = input("add_random", buffer.cast_const().cast(), len)?;
    ctx.add_random(entropy);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(crate) unsafe extern "C" fn hmac(
    ctx: *mut c_void,
    algorithm: c_int,
    key: *const c_uchar,
    key_sz: c_int,
    input1: *const c_uchar,
    in_sz: c_int,
    input2: *const c_uchar,
    in2_sz: c_int,
    out: *mut c_uchar,
) -> c_int {
    clear_last_error();
    report(&hmac_impl(
        ctx, algorithm, key, key_sz, input1, in_sz, input2, in2_sz, out,
    ))
}

#[allow(clippy::too_many_arguments)]
unsafe fn hmac_impl(
    ctx: *mut c_void,
    algorithm: c_int,
    key: *const c_uchar,
    key_sz: c_int,
    input1: *const c_uchar,
    in_sz: c_int,
    input2: *const c_uchar,
    in2_sz: c_int,
    out: *mut c_uchar,
) -> ProviderResult<()> {
    let ctx = context("hmac", ctx)?;
    if input1.is_null() {
        error!(algorithm, "hmac: first input is null");
        return Err(ProviderError::NullInput { operation: "hmac" });
    }

    let key = input("hmac", key, key_sz)?;
    let first = input("hmac", input1, in_sz)?;
    let second = if input2.is_null() {
        None
    } else {
        Some(input("hmac", input2, in2_sz)?)
    };
    let out = output(
        "hmac",
        out,
        ctx.provider().hmac_size_for_id(algorithm),
    )?;

    ctx.hmac_raw(algorithm, key, first, second, out)
}

#[allow(clippy::too_many_arguments)]
pub(crate) unsafe extern "C" fn kdf(
    ctx: *mut c_void,
    algorithm: c_int,
    pass: *const c_uchar,
    pass_sz: c_int,
    salt: *const c_uchar,
    salt_sz: c_int,
    workfactor: c_int,
    key_sz: c_int,
    key: *mut c_uchar,
) -> c_int {
    clear_last_error();
    report(&kdf_impl(
        ctx, algorithm, pass, pass_sz, salt, salt_sz, workfactor, key_sz, key,
    ))
}

#[allow(clippy::too_many_arguments)]
unsafe fn kdf_impl(
    ctx: *mut c_void,
    algorithm: c_int,
    pass: *const c_uchar,
    pass_sz: c_int,
    salt: *const c_uchar,
    salt_sz: c_int,
    workfactor: c_int,
    key_sz: c_int,
    key: *mut c_uchar,
) -> ProviderResult<()> {
    let ctx = context("kdf", ctx)?;
    let password = input("kdf", pass, pass_sz)?;
    let salt = input("kdf", salt, salt_sz)?;
    let iterations = u32::try_from(workfactor).map_err(|_| {
        error!(workfactor, "kdf: negative work factor");
        ProviderError::invalid_input("kdf", format!("negative work factor {workfactor}"))
    })?;
    let out = output("kdf", key, length("kdf", key_sz)?)?;

    ctx.kdf_raw(algorithm, password, salt, iterations, out)
}

#[allow(clippy::too_many_arguments)]
pub(crate) unsafe extern "C" fn cipher(
    ctx: *mut c_void,
    mode: c_int,
    key: *const c_uchar,
    key_sz: c_int,
    iv: *const c_uchar,
    input1: *const c_uchar,
    in_sz: c_int,
    out: *mut c_uchar,
) -> c_int {
    clear_last_error();
    report(&cipher_impl(ctx, mode, key, key_sz, iv, input1, in_sz, out))
}

#[allow(clippy::too_many_arguments)]
unsafe fn cipher_impl(
    ctx: *mut c_void,
    mode: c_int,
    key: *const c_uchar,
    key_sz: c_int,
    iv: *const c_uchar,
    input1: *const c_uchar,
    in_sz: c_int,
    out: *mut c_uchar,
) -> ProviderResult<()> {
    let ctx = context("cipher", ctx)?;
    let key = input("cipher", key, key_sz)?;
    let iv = input("cipher", iv, size(ctx.provider().iv_size()))?;
    let data = input("cipher", input1, in_sz)?;
    let out = output("cipher", out, data.len())?;

    ctx.cipher(CipherMode::from_raw(mode), key, iv, data, out)
}

pub(crate) unsafe extern "C" fn ctx_init(ctx: *mut *mut c_void) -> c_int {
    clear_last_error();
    report(&ctx_init_impl(ctx))
}

unsafe fn ctx_init_impl(ctx: *mut *mut c_void) -> ProviderResult<()> {
    if ctx.is_null() {
        error!("ctx_init: null context slot");
        return Err(ProviderError::NullInput {
            operation: "ctx_init",
        });
    }

    // The slot is write-only here; whatever it held before is not read.
    let context = provider()?.ctx_init()?;
    ctx.write(Box::into_raw(Box::new(context)).cast());
    Ok(())
}

pub(crate) unsafe extern "C" fn ctx_free(ctx: *mut *mut c_void) -> c_int {
    clear_last_error();
    if ctx.is_null() || (*ctx).is_null() {
        trace!("ctx_free: no context");
        return PAGECRYPT_OK;
    }

    let mut context = Box::from_raw((*ctx).cast::<ProviderContext>());
    *ctx = ptr::null_mut();
    report(&context.free())
}
