use chrono::{DateTime, TimeZone, Utc};

// Binary suffixes must be checked before decimal ones ("Ki" vs "k" is fine, but "Mi" vs "M" is not).
const BINARY_SUFFIXES: &[(&str, u32)] = &[
    ("Ki", 10),
    ("Mi", 20),
    ("Gi", 30),
    ("Ti", 40),
    ("Pi", 50),
    ("Ei", 60),
];

const DECIMAL_SUFFIXES: &[(&str, i32)] = &[
    ("n", -9),
    ("u", -6),
    ("m", -3),
    ("k", 3),
    ("M", 6),
    ("G", 9),
    ("T", 12),
    ("P", 15),
    ("E", 18),
];

/// Milli-value of a Kubernetes quantity string, rounded up like the API
/// server does (`1n` is `1` milli). Returns `None` for anything that is not a
/// non-negative quantity or that would not fit in an `i64`.
pub fn parse_quantity_millis(q: &str) -> Option<i64> {
    let q = q.trim();
    if q.is_empty() {
        return None;
    }

    for (suf, shift) in BINARY_SUFFIXES {
        if let Some(number) = q.strip_suffix(suf) {
            let (digits, frac_len) = parse_decimal(number)?;
            let numerator = digits.checked_mul(1000)?.checked_mul(1i128 << shift)?;
            return to_millis(numerator, pow10(frac_len)?);
        }
    }

    let (number, exponent) = match DECIMAL_SUFFIXES
        .iter()
        .find_map(|(suf, exp)| q.strip_suffix(suf).map(|n| (n, *exp)))
    {
        Some(found) => found,
        None => split_exponent(q)?,
    };
    let (digits, frac_len) = parse_decimal(number)?;

    // value = digits * 10^(exponent + 3 - frac_len) milli-units
    let power = exponent.checked_add(3)?.checked_sub(i32::try_from(frac_len).ok()?)?;
    if power >= 0 {
        to_millis(digits.checked_mul(pow10(power as u32)?)?, 1)
    } else {
        to_millis(digits, pow10(power.unsigned_abs())?)
    }
}

/// Splits `1e3` / `500E-3` into mantissa and exponent. A bare trailing `E`
/// is the exa suffix and never reaches here.
fn split_exponent(q: &str) -> Option<(&str, i32)> {
    let Some((mantissa, exp)) = q.split_once(|c: char| c == 'e' || c == 'E') else {
        return Some((q, 0));
    };
    let unsigned = exp.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(exp);
    if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((mantissa, exp.parse::<i32>().ok()?))
}

fn parse_decimal(number: &str) -> Option<(i128, u32)> {
    let number = number.strip_prefix('+').unwrap_or(number);
    let (int_part, frac_part) = match number.split_once('.') {
        Some((i, f)) => (i, f),
        None => (number, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut digits: i128 = 0;
    for b in int_part.bytes().chain(frac_part.bytes()) {
        digits = digits.checked_mul(10)?.checked_add(i128::from(b - b'0'))?;
    }
    Some((digits, u32::try_from(frac_part.len()).ok()?))
}

fn pow10(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

fn to_millis(numerator: i128, denominator: i128) -> Option<i64> {
    let millis = (numerator + denominator - 1) / denominator;
    i64::try_from(millis).ok()
}

/// Parses a Prometheus sample value, which is sent as a string and may be
/// `NaN`, `+Inf` or `-Inf`.
pub fn parse_sample_value(raw: &str) -> Option<f64> {
    match raw {
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        other => other.parse::<f64>().ok(),
    }
}

/// Converts a Prometheus timestamp (unix seconds with a fractional part) to
/// a UTC time with millisecond precision.
pub fn parse_sample_timestamp(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let millis = (seconds * 1000.0).round() as i64;
    Utc.timestamp_millis_opt(millis).single()
}
