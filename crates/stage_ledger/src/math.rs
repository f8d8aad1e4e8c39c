//! Safe amount arithmetic - no unwrap, no panics, truncating division

use primitive_types::{U256, U512};

/// Fungible unit / external value amount
pub type Amount = U256;

/// Add with saturation at MAX
pub fn add(a: Amount, b: Amount) -> Amount {
    a.saturating_add(b)
}

/// Subtract with saturation at 0
pub fn sub(a: Amount, b: Amount) -> Amount {
    a.saturating_sub(b)
}

/// Multiply with saturation at MAX
pub fn mul(a: Amount, b: Amount) -> Amount {
    a.saturating_mul(b)
}

/// Divide (returns 0 if divisor is 0)
pub fn div(a: Amount, b: Amount) -> Amount {
    if b.is_zero() {
        Amount::zero()
    } else {
        a / b
    }
}

/// floor(a * b / d) through a 512-bit intermediate.
///
/// The product never overflows; the quotient saturates at MAX when it does
/// not fit back into 256 bits. Returns 0 if `d` is 0.
pub fn mul_div_floor(a: Amount, b: Amount, d: Amount) -> Amount {
    if d.is_zero() {
        return Amount::zero();
    }
    let wide = a.full_mul(b) / U512::from(d);
    U256::try_from(wide).unwrap_or(U256::MAX)
}

/// Minimum of two amounts
pub fn min(a: Amount, b: Amount) -> Amount {
    if a < b { a } else { b }
}

/// Maximum of two amounts
pub fn max(a: Amount, b: Amount) -> Amount {
    if a > b { a } else { b }
}

/// Sum an iterator of amounts with saturation
pub fn sum<I: IntoIterator<Item = Amount>>(items: I) -> Amount {
    items.into_iter().fold(Amount::zero(), add)
}
