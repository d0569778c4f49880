//! Integer to mixed-radix digit conversions.
//!
//! Digit vectors are most-significant digit first. Base `1` is the degenerate unary code: a value
//! `v` is written as `v` ones, and decoding sums the digits.
//!
//! The de-interleaving helpers split one index into `m` sub-indices by dealing out its base-`m`
//! digits round-robin. They are what turns a topology index into the indices of its children.

use num_bigint::BigUint;

use crate::error::{EnumerationError, Result};

fn check_base(m: u32) -> Result<()> {
    if m < 1 {
        return Err(EnumerationError::InvalidBase { base: m });
    }
    Ok(())
}

/// Writes `value` in base `m`, most-significant digit first.
///
/// ```
/// use gourgs_enum::codec::decimal_to_base_m;
/// use num_bigint::BigUint;
///
/// assert_eq!(decimal_to_base_m(&BigUint::from(5u32), 2).unwrap(), vec![1, 0, 1]);
/// assert_eq!(decimal_to_base_m(&BigUint::from(125u32), 9).unwrap(), vec![1, 4, 8]);
/// assert_eq!(decimal_to_base_m(&BigUint::from(5u32), 1).unwrap(), vec![1, 1, 1, 1, 1]);
/// ```
pub fn decimal_to_base_m(value: &BigUint, m: u32) -> Result<Vec<u32>> {
    check_base(m)?;

    if *value == BigUint::ZERO {
        return Ok(vec![0]);
    }

    if m == 1 {
        let n = usize::try_from(value).map_err(|_| EnumerationError::Overflow {
            what: "unary code length",
        })?;
        return Ok(vec![1; n]);
    }

    if m <= 256 {
        return Ok(value.to_radix_be(m).into_iter().map(u32::from).collect());
    }

    let radix = BigUint::from(m);
    let mut rest = value.clone();
    let mut digits = Vec::new();
    while rest != BigUint::ZERO {
        let digit = &rest % &radix;
        // Remainder of a division by a `u32` always fits.
        digits.push(digit.to_u32_digits().first().copied().unwrap_or(0));
        rest /= &radix;
    }
    digits.reverse();
    Ok(digits)
}

/// Inverse of [`decimal_to_base_m`].
///
/// Every digit must be below `m` (for `m == 1`, every digit must be `0` or `1`).
pub fn base_m_to_decimal(digits: &[u32], m: u32) -> Result<BigUint> {
    check_base(m)?;

    let limit = m.max(2);
    if let Some(&digit) = digits.iter().find(|&&d| d >= limit) {
        return Err(EnumerationError::out_of_range("digit", digit, format!("base {}", m)));
    }

    if m == 1 {
        let ones = digits.iter().filter(|&&d| d == 1).count();
        return Ok(BigUint::from(ones));
    }

    let radix = BigUint::from(m);
    Ok(digits
        .iter()
        .fold(BigUint::ZERO, |acc, &d| acc * &radix + BigUint::from(d)))
}

/// Reads a base-`m` literal written with one character per digit (`0-9`, then `a-z`).
///
/// `parse_base_m("11122", 3)` is `125`, `parse_base_m("11111", 1)` is `5`.
pub fn parse_base_m(literal: &str, m: u32) -> Result<BigUint> {
    let digits = literal
        .chars()
        .enumerate()
        .map(|(position, c)| {
            c.to_digit(36).ok_or_else(|| EnumerationError::Parse {
                input: literal.to_string(),
                position,
                reason: format!("'{}' is not a digit", c),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    base_m_to_decimal(&digits, m)
}

/// Writes `value` in base `m` using exactly `width` digits, most-significant first.
///
/// Fails with [`EnumerationError::OutOfRange`] when `value >= m^width`.
pub fn to_fixed_width(value: &BigUint, m: u32, width: usize) -> Result<Vec<u32>> {
    check_base(m)?;

    if *value == BigUint::ZERO {
        return Ok(vec![0; width]);
    }
    if m == 1 {
        return Err(EnumerationError::out_of_range("rank", value, "1"));
    }

    let digits = decimal_to_base_m(value, m)?;
    if digits.len() > width {
        return Err(EnumerationError::out_of_range(
            "rank",
            value,
            format!("{}^{}", m, width),
        ));
    }

    let mut padded = vec![0; width - digits.len()];
    padded.extend(digits);
    Ok(padded)
}

/// Deals the digits out to `m` groups: the digits are left-padded to a multiple of `m`, and
/// group `j` receives the `j`-th digit of every `m`-digit chunk.
pub fn deinterleave(digits: &[u32], m: usize) -> Vec<Vec<u32>> {
    let mut groups = vec![Vec::new(); m];
    if m == 0 {
        return groups;
    }

    let padding = (m - digits.len() % m) % m;
    let padded: Vec<u32> = std::iter::repeat(0)
        .take(padding)
        .chain(digits.iter().copied())
        .collect();
    for chunk in padded.chunks(m) {
        for (group, &digit) in groups.iter_mut().zip(chunk) {
            group.push(digit);
        }
    }
    groups
}

/// Inverse of [`deinterleave`]. Shorter groups are left-padded with zeros, so the groups may be
/// written without their leading zeros.
pub fn interleave(groups: &[Vec<u32>]) -> Vec<u32> {
    let len = groups.iter().map(Vec::len).max().unwrap_or(0);
    let mut digits = Vec::with_capacity(len * groups.len());
    for position in 0..len {
        for group in groups {
            let offset = len - group.len();
            digits.push(if position < offset { 0 } else { group[position - offset] });
        }
    }
    digits
}

/// Splits `e` into `m` child indices, equivalent to
/// `deinterleave(decimal_to_base_m(e, m), m)` followed by `base_m_to_decimal` on every group,
/// but on machine words and without the unary expansion for `m == 1`.
pub fn split_index(e: u64, m: u64) -> Vec<u64> {
    if m <= 1 {
        return vec![e; m as usize];
    }

    let group_count = m as usize;
    let mut children = vec![0u64; group_count];
    // Weight of the next digit within each group.
    let mut weights = vec![1u64; group_count];
    let mut rest = e;
    let mut position = 0usize;
    while rest != 0 {
        let digit = rest % m;
        rest /= m;
        // Least-significant digits land in the last group.
        let group = group_count - 1 - position % group_count;
        children[group] += digit * weights[group];
        if rest != 0 {
            weights[group] = weights[group].saturating_mul(m);
        }
        position += 1;
    }
    children
}

/// Inverse of [`split_index`]. Fails with [`EnumerationError::Overflow`] if the merged index does
/// not fit into `u64`.
pub fn merge_index(children: &[u64], m: u64) -> Result<u64> {
    if m <= 1 {
        return Ok(children.first().copied().unwrap_or(0));
    }

    let group_count = m as usize;
    let mut rests = children.to_vec();
    let mut merged: u64 = 0;
    let mut weight: u64 = 1;
    let mut position = 0usize;
    let overflow = || EnumerationError::Overflow { what: "topology index" };
    while rests.iter().any(|&r| r != 0) {
        let group = group_count - 1 - position % group_count;
        let digit = rests[group] % m;
        rests[group] /= m;
        if digit != 0 {
            let term = digit.checked_mul(weight).ok_or_else(overflow)?;
            merged = merged.checked_add(term).ok_or_else(overflow)?;
        }
        position += 1;
        if rests.iter().any(|&r| r != 0) {
            weight = weight.checked_mul(m).ok_or_else(overflow)?;
        }
    }
    Ok(merged)
}
