//! Bound checks for raw field values.
//!
//! Each check returns the accepted value or a [`FieldError`] tagged with the
//! caller-supplied field name, so entity constructors can aggregate failures
//! across many fields. The constants below are the column domains the
//! backend enforces; callers narrow them per field.

use crate::error::FieldError;

/// Widest text column accepted anywhere.
pub const TEXT_MAX: usize = 65_535;

/// Float column domain.
pub const FLOAT_MAX: f64 = 99_999.99;
pub const FLOAT_MIN: f64 = -99_999.99;

/// Integer column domain: unsigned 32-bit above zero, signed 32-bit below.
pub const INT_MAX: i64 = 4_294_967_295;
pub const INT_MIN: i64 = -2_147_483_648;

pub const MEDIUM_INT_MAX: i64 = 16_777_215;
pub const MEDIUM_INT_MIN: i64 = -8_388_608;

pub const SMALL_INT_MAX: i64 = 65_535;
pub const SMALL_INT_MIN: i64 = -32_768;

pub const TINY_INT_MAX: i64 = 255;
pub const TINY_INT_MIN: i64 = -128;

/// Check a text value against character-count bounds.
///
/// Does not normalize; trimming is the caller's concern.
pub fn text(value: &str, min: usize, max: usize, field: &str) -> Result<String, FieldError> {
    let length = value.chars().count();
    if length > max {
        return Err(FieldError::new(field, format!("Too long. Max length: {max}.")));
    }
    if length < min {
        return Err(FieldError::new(field, format!("Too short. Min length: {min}.")));
    }
    Ok(value.to_string())
}

/// Check a float for finiteness, then inclusive bounds.
pub fn float(value: f64, min: f64, max: f64, field: &str) -> Result<f64, FieldError> {
    if !value.is_finite() {
        return Err(FieldError::new(field, "Not an finite float."));
    }
    if value > max {
        return Err(FieldError::new(field, format!("Too high. Max value: {max}.")));
    }
    if value < min {
        return Err(FieldError::new(field, format!("Too low. Min value: {min}.")));
    }
    Ok(value)
}

/// Round to the two-decimal money grid; ties round away from zero.
///
/// Price change detection and rendered wire parameters both use this form.
pub fn money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Check an integer against inclusive bounds.
pub fn int(value: i64, min: i64, max: i64, field: &str) -> Result<i64, FieldError> {
    if value > max {
        return Err(FieldError::new(field, format!("Too high. Max value: {max}.")));
    }
    if value < min {
        return Err(FieldError::new(field, format!("Too low. Min value: {min}.")));
    }
    Ok(value)
}

/// Medium-width integer column check.
pub fn medium_int(value: i64, field: &str) -> Result<i64, FieldError> {
    int(value, MEDIUM_INT_MIN, MEDIUM_INT_MAX, field)
}

/// Small-width integer column check.
pub fn small_int(value: i64, field: &str) -> Result<i64, FieldError> {
    int(value, SMALL_INT_MIN, SMALL_INT_MAX, field)
}

/// Tiny-width integer column check.
pub fn tiny_int(value: i64, field: &str) -> Result<i64, FieldError> {
    int(value, TINY_INT_MIN, TINY_INT_MAX, field)
}
