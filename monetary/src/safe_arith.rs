//! Overflow-checked integer operations on raw amounts.
//!
//! Nothing here wraps or panics. Callers propagate the [`ArithError`] and
//! decide whether to roll back.

use crate::error::ArithError;

/// Default divisor for [`percentage`].
pub const PERCENT_DIVISOR: u64 = 100;

pub fn add(a: u64, b: u64) -> Result<u64, ArithError> {
    a.checked_add(b).ok_or(ArithError::Overflow)
}

pub fn sub(a: u64, b: u64) -> Result<u64, ArithError> {
    a.checked_sub(b).ok_or(ArithError::Underflow)
}

pub fn mul(a: u64, b: u64) -> Result<u64, ArithError> {
    a.checked_mul(b).ok_or(ArithError::Overflow)
}

pub fn div(a: u64, b: u64) -> Result<u64, ArithError> {
    a.checked_div(b).ok_or(ArithError::DivByZero)
}

pub fn rem(a: u64, b: u64) -> Result<u64, ArithError> {
    a.checked_rem(b).ok_or(ArithError::DivByZero)
}

/// `amount * pct / divisor`, computed in 128 bits so only the final result
/// can overflow.
pub fn percentage(amount: u64, pct: u64, divisor: u64) -> Result<u64, ArithError> {
    if divisor == 0 {
        return Err(ArithError::DivByZero);
    }
    let product = u128::from(amount) * u128::from(pct);
    u64::try_from(product / u128::from(divisor)).map_err(|_| ArithError::Overflow)
}

/// Sum a sequence, failing on the first overflow.
pub fn sum<I: IntoIterator<Item = u64>>(values: I) -> Result<u64, ArithError> {
    values.into_iter().try_fold(0u64, add)
}

/// Integer square root (floor) by Newton iteration.
///
/// Monotonic and deterministic for every `u64` input.
pub fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = x / 2 + (x & 1);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}
