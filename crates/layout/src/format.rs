//! Significant-digit rendering of numbers and of value/uncertainty pairs.
//!
//! Every function here is pure and locale independent. Floats are rendered
//! with the shortest representation that reads back to the same value, in
//! fixed notation for decimal exponents in [-4, 16) and in exponential
//! notation otherwise (`0.000123`, `123.0`, `1.23e-05`, `1e+17`).

/// Rounds `x` to `n` significant digits.
///
/// Values with `|x|` from `10^(n-1)` upwards (before or after rounding) are
/// truncated to an integer instead and rendered without a trailing `.0`
/// (`round_to_ndigits(123456.7, 3)` is `"123456"`). Returns `""` for
/// `n == 0`, and `"nan"` / `"inf"` for non-finite input.
pub fn round_to_ndigits(x: f64, n: usize) -> String {
    if n < 1 {
        return String::new();
    }
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return "inf".to_string();
    }

    let threshold = 10f64.powi(i32::try_from(n - 1).unwrap_or(i32::MAX));
    let x = if x.abs() < threshold {
        let rounded = round_significant(x, n);
        // 99.96 at 3 digits carries into the integer range.
        if rounded.abs() < threshold {
            return python_repr(rounded);
        }
        rounded
    } else {
        x
    };

    let text = python_repr(round_significant(x.trunc(), 12));
    match text.strip_suffix(".0") {
        Some(integer) if text.len() >= 3 => integer.to_string(),
        _ => text,
    }
}

/// Renders `mean +/- error` with both parts aligned on the same precision.
///
/// The part with the smaller magnitude is rounded to 3 significant digits and
/// dictates the rendering of the other one: same number of decimals, integer
/// truncation, or `%.2e` style exponents for both.
pub fn format_value_with_error(mean: f64, error: f64) -> String {
    if mean == 0.0 && error == 0.0 {
        return "0.0 +/- 0.0".to_string();
    }
    if error == 0.0 {
        return round_to_ndigits(mean, 3);
    }
    if !mean.is_finite() || !error.is_finite() {
        return format!(
            "{} +/- {}",
            round_to_ndigits(mean, 3),
            round_to_ndigits(error, 3)
        );
    }

    let mean_leads = mean.abs() <= error.abs();
    let (small, other) = if mean_leads {
        (mean, error)
    } else {
        (error, mean)
    };

    let small_text = round_to_ndigits(small, 3);
    let (small_text, other_text) = if small_text.contains(['e', 'E']) {
        (exponential(small, 2), exponential(other, 2))
    } else if let Some((_, decimals)) = small_text.split_once('.') {
        let other_text = format!("{:.*}", decimals.len(), other);
        (small_text, other_text)
    } else {
        (small_text, integer_part(other))
    };

    if mean_leads {
        format!("{small_text} +/- {other_text}")
    } else {
        format!("{other_text} +/- {small_text}")
    }
}

/// Renders a cross section with its relative uncertainty: `"2.0 @ 5.0%"`.
pub fn format_percentage_error(xsection: f64, xerror: f64) -> String {
    if xsection == 0.0 && xerror == 0.0 {
        return "0.0 @ 0.0%".to_string();
    }
    if xerror == 0.0 {
        return round_to_ndigits(xsection, 3);
    }
    let value = round_to_ndigits(xsection, 3);
    let percent = if xsection == 0.0 {
        "0.0".to_string()
    } else {
        round_to_ndigits(100.0 * xerror / xsection, 2)
    };
    format!("{value} @ {percent}%")
}

/// `1234567` becomes `"1,234,567"`.
pub fn display_integer(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Shortest round-trip rendering: `2.0`, `0.000123`, `1.5e-07`, `1e+16`.
pub(crate) fn python_repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{x:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();

    if (-4..16).contains(&exponent) {
        let (integer, fraction) = if exponent >= 0 {
            let int_len = exponent as usize + 1;
            if digits.len() <= int_len {
                (format!("{digits:0<int_len$}"), "0".to_string())
            } else {
                (digits[..int_len].to_string(), digits[int_len..].to_string())
            }
        } else {
            let zeros = "0".repeat((-exponent - 1) as usize);
            ("0".to_string(), format!("{zeros}{digits}"))
        };
        format!("{sign}{integer}.{fraction}")
    } else {
        let mantissa = if digits.len() == 1 {
            digits
        } else {
            format!("{}.{}", &digits[..1], &digits[1..])
        };
        format!("{sign}{mantissa}{}", exponent_suffix(exponent))
    }
}

/// `%.{precision}e` rendering with a signed, at least two-digit exponent.
fn exponential(x: f64, precision: usize) -> String {
    let text = format!("{x:.precision$e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            format!("{mantissa}{}", exponent_suffix(exponent))
        }
        None => text,
    }
}

fn exponent_suffix(exponent: i32) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("e{sign}{:02}", exponent.unsigned_abs())
}

/// `x` rounded to `n` significant digits, exactly as the decimal rendering
/// would round it.
fn round_significant(x: f64, n: usize) -> f64 {
    format!("{:.*e}", n.saturating_sub(1), x)
        .parse()
        .unwrap_or(x)
}

fn integer_part(x: f64) -> String {
    let truncated = x.trunc();
    if truncated == 0.0 {
        "0".to_string()
    } else {
        format!("{truncated}")
    }
}
