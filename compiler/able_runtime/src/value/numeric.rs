//! Width-tagged integers and floats.
//!
//! `IntegerValue` stores every kind as a sign and a `u128` magnitude, wide
//! enough for both `i128::MIN` and `u128::MAX`, and deliberately exposes no
//! operator traits. Arithmetic goes through the checked methods, which
//! range-check the result against its kind and report `integer overflow`.

use std::cmp::Ordering;
use std::fmt;

use able_ir::ast::{FloatType, IntegerType};

use crate::errors::{integer_overflow, integer_width_exceeded, EvalError};

/// Sign and magnitude. Zero is never negative.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct Wide {
    negative: bool,
    magnitude: u128,
}

impl Wide {
    const ZERO: Wide = Wide::unsigned(0);

    const fn signed(negative: bool, magnitude: u128) -> Self {
        Wide {
            negative: negative && magnitude != 0,
            magnitude,
        }
    }

    const fn unsigned(magnitude: u128) -> Self {
        Wide {
            negative: false,
            magnitude,
        }
    }

    const fn from_i128(value: i128) -> Self {
        Wide::signed(value < 0, value.unsigned_abs())
    }

    fn to_i128(self) -> Option<i128> {
        if self.negative {
            0i128.checked_sub_unsigned(self.magnitude)
        } else {
            i128::try_from(self.magnitude).ok()
        }
    }

    const fn negate(self) -> Self {
        Wide::signed(!self.negative, self.magnitude)
    }

    fn checked_add(self, rhs: Self) -> Option<Self> {
        if self.negative == rhs.negative {
            let magnitude = self.magnitude.checked_add(rhs.magnitude)?;
            return Some(Wide::signed(self.negative, magnitude));
        }
        Some(if self.magnitude >= rhs.magnitude {
            Wide::signed(self.negative, self.magnitude - rhs.magnitude)
        } else {
            Wide::signed(rhs.negative, rhs.magnitude - self.magnitude)
        })
    }

    fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.checked_add(rhs.negate())
    }

    fn checked_mul(self, rhs: Self) -> Option<Self> {
        let magnitude = self.magnitude.checked_mul(rhs.magnitude)?;
        Some(Wide::signed(self.negative != rhs.negative, magnitude))
    }

    /// Truncates toward zero.
    fn checked_div(self, rhs: Self) -> Option<Self> {
        let magnitude = self.magnitude.checked_div(rhs.magnitude)?;
        Some(Wide::signed(self.negative != rhs.negative, magnitude))
    }

    /// The sign follows the dividend.
    fn checked_rem(self, rhs: Self) -> Option<Self> {
        let magnitude = self.magnitude.checked_rem(rhs.magnitude)?;
        Some(Wide::signed(self.negative, magnitude))
    }
}

impl Ord for Wide {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, false) => self.magnitude.cmp(&other.magnitude),
            (true, true) => other.magnitude.cmp(&self.magnitude),
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
        }
    }
}

impl PartialOrd for Wide {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Wide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        write!(f, "{}", self.magnitude)
    }
}

/// Inclusive value range of an integer kind.
fn bounds(ty: IntegerType) -> (Wide, Wide) {
    let signed = |min: i128, max: i128| (Wide::from_i128(min), Wide::from_i128(max));
    let unsigned = |max: u128| (Wide::ZERO, Wide::unsigned(max));
    match ty {
        IntegerType::I8 => signed(i8::MIN.into(), i8::MAX.into()),
        IntegerType::I16 => signed(i16::MIN.into(), i16::MAX.into()),
        IntegerType::I32 => signed(i32::MIN.into(), i32::MAX.into()),
        IntegerType::I64 => signed(i64::MIN.into(), i64::MAX.into()),
        IntegerType::I128 => signed(i128::MIN, i128::MAX),
        IntegerType::U8 => unsigned(u8::MAX.into()),
        IntegerType::U16 => unsigned(u16::MAX.into()),
        IntegerType::U32 => unsigned(u32::MAX.into()),
        IntegerType::U64 => unsigned(u64::MAX.into()),
        IntegerType::U128 => unsigned(u128::MAX),
    }
}

fn signed_with_bits(bits: u32) -> Option<IntegerType> {
    [
        IntegerType::I8,
        IntegerType::I16,
        IntegerType::I32,
        IntegerType::I64,
        IntegerType::I128,
    ]
    .into_iter()
    .find(|ty| ty.bits() >= bits)
}

/// Result kind of a binary operation between two integer kinds.
///
/// Same signedness picks the wider kind. Mixed signedness picks the
/// smallest signed kind with one more bit than the wider operand, falling
/// back to the unsigned operand when it is at least as wide as both.
pub fn promote_integer_types(
    left: IntegerType,
    right: IntegerType,
) -> Result<IntegerType, EvalError> {
    if left.is_signed() == right.is_signed() {
        return Ok(if left.bits() >= right.bits() { left } else { right });
    }
    let widest = left.bits().max(right.bits());
    if let Some(ty) = signed_with_bits(widest + 1) {
        return Ok(ty);
    }
    let unsigned = if left.is_signed() { right } else { left };
    if unsigned.bits() >= widest {
        return Ok(unsigned);
    }
    Err(integer_width_exceeded())
}

/// Integer with an explicit width/signedness tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct IntegerValue {
    value: Wide,
    ty: IntegerType,
}

impl IntegerValue {
    /// Create an integer, failing with `integer overflow` if `value` does
    /// not fit `ty`.
    pub fn new(value: i128, ty: IntegerType) -> Result<Self, EvalError> {
        Self::checked(Wide::from_i128(value), ty)
    }

    /// Like `new`, for magnitudes above `i128::MAX`.
    pub fn from_u128(value: u128, ty: IntegerType) -> Result<Self, EvalError> {
        Self::checked(Wide::unsigned(value), ty)
    }

    fn checked(value: Wide, ty: IntegerType) -> Result<Self, EvalError> {
        let (min, max) = bounds(ty);
        if (min..=max).contains(&value) {
            Ok(IntegerValue { value, ty })
        } else {
            Err(integer_overflow())
        }
    }

    #[inline]
    pub const fn from_i32(value: i32) -> Self {
        IntegerValue {
            value: Wide::from_i128(value as i128),
            ty: IntegerType::I32,
        }
    }

    /// The value as `i128`; `None` only for `u128` values past `i128::MAX`.
    pub fn to_i128(self) -> Option<i128> {
        self.value.to_i128()
    }

    /// The value as `u128`; `None` for negatives.
    pub fn to_u128(self) -> Option<u128> {
        (!self.value.negative).then_some(self.value.magnitude)
    }

    #[inline]
    pub const fn ty(self) -> IntegerType {
        self.ty
    }

    /// Numeric ordering, ignoring the kind tags.
    pub fn cmp_value(self, other: Self) -> Ordering {
        self.value.cmp(&other.value)
    }

    /// Re-tag as another kind, range-checked.
    pub fn retag(self, ty: IntegerType) -> Result<Self, EvalError> {
        Self::checked(self.value, ty)
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.value.magnitude == 0
    }

    /// The neighbour one step up or down, in the same kind.
    pub fn step(self, down: bool) -> Result<Self, EvalError> {
        let value = self
            .value
            .checked_add(Wide::signed(down, 1))
            .ok_or_else(integer_overflow)?;
        Self::checked(value, self.ty)
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "integer to float coercion rounds like the language does"
    )]
    pub fn to_f64(self) -> f64 {
        let magnitude = self.value.magnitude as f64;
        if self.value.negative {
            -magnitude
        } else {
            magnitude
        }
    }

    /// The value as `i32`, when tagged `i32`.
    pub fn as_i32(self) -> Option<i32> {
        if self.ty == IntegerType::I32 {
            self.to_i128().and_then(|value| i32::try_from(value).ok())
        } else {
            None
        }
    }

    fn binary(
        self,
        rhs: Self,
        op: impl FnOnce(Wide, Wide) -> Option<Wide>,
    ) -> Result<Self, EvalError> {
        let ty = promote_integer_types(self.ty, rhs.ty)?;
        let value = op(self.value, rhs.value).ok_or_else(integer_overflow)?;
        Self::checked(value, ty)
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, EvalError> {
        self.binary(rhs, Wide::checked_add)
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, EvalError> {
        self.binary(rhs, Wide::checked_sub)
    }

    pub fn checked_mul(self, rhs: Self) -> Result<Self, EvalError> {
        self.binary(rhs, Wide::checked_mul)
    }

    /// Truncating division. The caller rejects a zero divisor first.
    pub fn checked_div(self, rhs: Self) -> Result<Self, EvalError> {
        self.binary(rhs, Wide::checked_div)
    }

    /// Truncated remainder; the sign follows the dividend.
    pub fn checked_rem(self, rhs: Self) -> Result<Self, EvalError> {
        self.binary(rhs, Wide::checked_rem)
    }

    pub fn checked_neg(self) -> Result<Self, EvalError> {
        Self::checked(self.value.negate(), self.ty)
    }
}

impl fmt::Display for IntegerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Float with an `f32`/`f64` tag. `f32` values are stored already rounded.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FloatValue {
    value: f64,
    ty: FloatType,
}

impl FloatValue {
    pub fn new(value: f64, ty: FloatType) -> Self {
        let value = match ty {
            FloatType::F32 => round_f32(value),
            FloatType::F64 => value,
        };
        FloatValue { value, ty }
    }

    #[inline]
    pub const fn f64(value: f64) -> Self {
        FloatValue {
            value,
            ty: FloatType::F64,
        }
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.value
    }

    #[inline]
    pub const fn ty(self) -> FloatType {
        self.ty
    }

    /// Result kind when combining with another float: `f64` wins.
    pub fn join(left: FloatType, right: FloatType) -> FloatType {
        if left == FloatType::F64 || right == FloatType::F64 {
            FloatType::F64
        } else {
            FloatType::F32
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "f32 results are rounded through f32 on purpose"
)]
fn round_f32(value: f64) -> f64 {
    f64::from(value as f32)
}

impl fmt::Display for FloatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
