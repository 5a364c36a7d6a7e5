//! Locale-independent rendering of coordinates and other floats.

/// Render `value` in its shortest round-trip decimal form.
///
/// Integral values keep a fractional part (`31.0`), magnitudes below `1e-4`
/// or from `1e16` upwards use an exponent with an explicit sign and at least
/// two digits (`1e-05`, `1.5e+16`). This is the notation consumer mapping
/// tools already show for these datasets.
///
/// # Examples
/// ```
/// use shelter_core::format_float;
///
/// assert_eq!(format_float(31.0), "31.0");
/// assert_eq!(format_float(34.781_768_1), "34.7817681");
/// assert_eq!(format_float(0.000_01), "1e-05");
/// ```
#[must_use]
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value.is_sign_negative() { "-inf" } else { "inf" }.to_owned();
    }

    let shortest = format!("{value:?}");
    match shortest.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = exponent
                .strip_prefix('-')
                .map_or(('+', exponent), |digits| ('-', digits));
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => shortest,
    }
}
