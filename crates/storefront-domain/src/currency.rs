/// Render an amount as Indonesian Rupiah: `Rp 1.234.567`.
///
/// Rounds half up to a whole rupiah and groups thousands with `.`.
pub fn format_idr(amount: f64) -> String {
    if !amount.is_finite() {
        return "Rp 0".to_string();
    }
    #[allow(clippy::cast_possible_truncation)]
    let rounded = (amount + 0.5).floor() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if rounded < 0 {
        format!("Rp -{grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands_with_dots() {
        assert_eq!(format_idr(0.0), "Rp 0");
        assert_eq!(format_idr(999.0), "Rp 999");
        assert_eq!(format_idr(1_000.0), "Rp 1.000");
        assert_eq!(format_idr(1_234_567.4), "Rp 1.234.567");
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(format_idr(59.5), "Rp 60");
        assert_eq!(format_idr(49.99), "Rp 50");
        assert_eq!(format_idr(-1.5), "Rp -1");
        assert_eq!(format_idr(-1_500.6), "Rp -1.501");
    }
}
