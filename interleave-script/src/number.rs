/// Formats a number the way JavaScript's `Number.prototype.toString` does for
/// radix 10.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if n == 0.0 {
        // Also covers -0.
        return "0".to_owned();
    }
    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        // Display is the shortest round-tripping decimal without an exponent.
        return format!("{n}");
    }
    // Exponent form: Rust writes `1e21` and `1.5e-7`, JavaScript `1e+21`.
    let s = format!("{n:e}");
    match s.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => s,
    }
}

/// Converts a string to a number the way JavaScript's `Number(s)` does for
/// decimal and hexadecimal literals.
pub fn parse_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return f64::NAN;
        }
        return hex_value(hex);
    }
    // Rust also accepts `inf` and `nan`, which JavaScript does not.
    let is_decimal = s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !is_decimal {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

/// Value of a string of hexadecimal digits, rounded to the nearest `f64`.
pub fn hex_value(digits: &str) -> f64 {
    let digits = digits.trim_start_matches('0');
    // 32 digits fill a u128, far more than the 53 bits an f64 keeps.
    let (head, tail) = digits.split_at(digits.len().min(32));
    let mut mantissa = head
        .chars()
        .filter_map(|ch| ch.to_digit(16))
        .fold(0u128, |acc, d| acc << 4 | u128::from(d));
    if tail.bytes().any(|b| b != b'0') {
        // Sticky bit, so that truncated digits still round up past a tie.
        mantissa |= 1;
    }
    let shift = 4 * tail.len();
    if shift > 1024 {
        return f64::INFINITY;
    }
    let scale = 2f64.powi(shift as i32);
    mantissa as f64 * scale
}
