use ethers_core::types::U256;
use ethers_core::utils::format_ether;

/// Placeholder shown for values that are not known yet.
pub const UNKNOWN: &str = "--";

/// Converts a base-unit amount to its decimal value, for display only.
pub fn ether_value(amount: U256) -> f64 {
    format_ether(amount).parse::<f64>().unwrap_or(f64::NAN)
}

/// Enough digits to hold the exact decimal expansion of any finite `f64`.
const EXACT_DIGITS: usize = 800;

/// Formats `value` with `precision` significant digits, the way
/// `Number.prototype.toPrecision` does in browsers: the exact value is
/// rounded with ties going up, and exponents below -6 or at least
/// `precision` switch to scientific notation.
pub fn to_precision(value: f64, precision: usize) -> String {
    let precision = precision.clamp(1, 21);
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return if precision == 1 {
            "0".to_owned()
        } else {
            format!("0.{}", "0".repeat(precision - 1))
        };
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let (digits, exponent) = round_half_up(value.abs(), precision);

    if exponent < -6 || exponent >= precision as i32 {
        let (lead, rest) = digits.split_at(1);
        let fraction = if rest.is_empty() {
            String::new()
        } else {
            format!(".{rest}")
        };
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{sign}{lead}{fraction}e{exponent_sign}{}", exponent.abs());
    }

    if exponent < 0 {
        let zeros = "0".repeat((-exponent - 1) as usize);
        return format!("{sign}0.{zeros}{digits}");
    }
    let (integer, fraction) = digits.split_at(exponent as usize + 1);
    if fraction.is_empty() {
        format!("{sign}{integer}")
    } else {
        format!("{sign}{integer}.{fraction}")
    }
}

/// First `precision` significant digits of a positive `value`, rounded half
/// up, with the decimal exponent of the leading digit.
fn round_half_up(value: f64, precision: usize) -> (String, i32) {
    let exact = format!("{:.*e}", EXACT_DIGITS, value);
    let (mantissa, exponent) = exact.split_once('e').unwrap_or((exact.as_str(), "0"));
    let mut exponent = exponent.parse::<i32>().unwrap_or(0);
    let expansion: Vec<u8> = mantissa.bytes().filter(u8::is_ascii_digit).collect();

    let mut kept = expansion[..precision].to_vec();
    if expansion[precision] >= b'5' {
        let mut carry = true;
        for digit in kept.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            kept.insert(0, b'1');
            kept.pop();
            exponent += 1;
        }
    }
    (String::from_utf8_lossy(&kept).into_owned(), exponent)
}

/// `"{value} {symbol}"` with `precision` significant digits, or the
/// placeholder when the amount is unknown.
pub fn format_amount(amount: Option<U256>, precision: usize, symbol: &str) -> String {
    match amount {
        Some(amount) => format!("{} {symbol}", to_precision(ether_value(amount), precision)),
        None => format!("{UNKNOWN} {symbol}"),
    }
}

/// Share of the hard cap raised so far, clamped to `0.0..=1.0`.
pub fn raised_progress(total_raised: Option<U256>, hard_cap: U256) -> f32 {
    match total_raised {
        Some(raised) if !hard_cap.is_zero() => {
            let ratio = ether_value(raised) / ether_value(hard_cap);
            if ratio.is_finite() {
                ratio.clamp(0.0, 1.0) as f32
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}
