//! Number parsing, formatting and decimal rounding shared by the engines.

/// Parse a plain decimal literal (`12`, `-3.5`, `+1.00`, `.5`, `1e3`).
/// Words such as `inf` or `NaN` are rejected.
pub fn parse_number(text: &str) -> Option<f64> {
    let t = text.trim();
    if t.is_empty() || !t.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    if !t.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E')) {
        return None;
    }
    t.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Shortest plain representation: `1`, `0.5`, `-2.25`, never `-0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

/// Round a plain decimal string half away from zero, then drop trailing
/// zeros. The input must be what [`format_number`] produces.
pub fn round_decimal_str(text: &str, decimals: usize) -> String {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return text.to_string();
    }

    let kept = frac_part.len().min(decimals);
    let mut digits: Vec<u8> = int_part.bytes().chain(frac_part[..kept].bytes()).map(|b| b - b'0').collect();
    if frac_part.len() > decimals && frac_part.as_bytes()[decimals] >= b'5' {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, 1);
                break;
            }
            i -= 1;
            if digits[i] == 9 {
                digits[i] = 0;
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let split = digits.len() - kept;
    let int_digits: String = digits[..split].iter().map(|d| (b'0' + d) as char).collect();
    let int_digits = int_digits.trim_start_matches('0');
    let frac_digits: String = digits[split..].iter().map(|d| (b'0' + d) as char).collect();
    let frac_digits = frac_digits.trim_end_matches('0');

    let mut out = String::new();
    if int_digits.is_empty() && frac_digits.is_empty() {
        return "0".to_string();
    }
    if negative {
        out.push('-');
    }
    out.push_str(if int_digits.is_empty() { "0" } else { int_digits });
    if !frac_digits.is_empty() {
        out.push('.');
        out.push_str(frac_digits);
    }
    out
}

/// Round `value` to `decimals` places on its decimal representation.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    round_decimal_str(&format_number(value), decimals).parse().unwrap_or(value)
}

/// Round and format in one step, e.g. `1.005` → `"1.01"`, `2.50` → `"2.5"`.
pub fn round_str(value: f64, decimals: usize) -> String {
    round_decimal_str(&format_number(value), decimals)
}

/// Drop the zero before a decimal point: `0.5` → `.5`, `-0.5` → `-.5`.
pub fn strip_leading_zero(text: &str) -> String {
    if let Some(rest) = text.strip_prefix("0.") {
        format!(".{rest}")
    } else if let Some(rest) = text.strip_prefix("-0.") {
        format!("-.{rest}")
    } else {
        text.to_string()
    }
}

/// Population mean and standard deviation.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
