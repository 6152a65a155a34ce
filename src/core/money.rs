//! Money arithmetic and formatting helpers.
//!
//! Amounts are `f64` throughout the crate. Ratios are rounded to four decimal places
//! before being turned into percentages so that a category holding 5/14 of spending
//! reports `35.71`, not a long binary tail.

/// Rounds `value` to `places` decimals, ties away from zero.
///
/// Values that sit a few ulps below a tie because of binary representation
/// (`2.675` is stored as `2.67499999...`) are treated as the tie they print as.
#[must_use]
pub fn round_half_away(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    let nudge = scaled.abs().max(1.0) * f64::EPSILON * 4.0;
    (scaled + scaled.signum() * nudge).round() / factor
}

/// Rounds `value` to `places` decimals, ties towards positive infinity.
///
/// Used for display figures in projections, where `-0.005` becomes `-0.00`.
#[must_use]
pub fn round_half_ceil(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    let nudge = scaled.abs().max(1.0) * f64::EPSILON * 4.0;
    (scaled + 0.5 + nudge).floor() / factor
}

/// Rounds to whole cents.
#[must_use]
pub fn round_cents(value: f64) -> f64 {
    round_half_away(value, 2)
}

/// `part / whole` as a percentage, with the ratio rounded to four decimals first.
///
/// Returns `0.0` when `whole` is not positive.
#[must_use]
pub fn ratio_percent(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    round_half_away(round_half_away(part / whole, 4) * 100.0, 2)
}

/// Sum of the positive amounts.
pub fn income_total<'a>(amounts: impl IntoIterator<Item = &'a f64>) -> f64 {
    amounts.into_iter().filter(|a| **a > 0.0).sum()
}

/// Sum of the absolute values of the negative amounts.
pub fn expense_total<'a>(amounts: impl IntoIterator<Item = &'a f64>) -> f64 {
    amounts
        .into_iter()
        .filter(|a| **a < 0.0)
        .map(|a| a.abs())
        .sum()
}

/// Calculates progress percentage of `current` towards `target`.
///
/// Returns `0.0` for a zero target.
#[must_use]
pub fn calculate_progress(current: f64, target: f64) -> f64 {
    if target == 0.0 {
        return 0.0;
    }

    (current / target) * 100.0
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80.0%`
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // Cast safety: clamped_progress ∈ [0, 100], length is small (10-20).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    format!(
        "[{}{}] {progress_percent:.1}%",
        "█".repeat(filled),
        "░".repeat(empty)
    )
}

/// Formats a signed amount like `"+$50.00"` or `"-$25.50"`.
#[must_use]
pub fn format_signed_amount(amount: f64) -> String {
    if amount >= 0.0 {
        format!("+${amount:.2}")
    } else {
        format!("-${:.2}", amount.abs())
    }
}

/// Formats an unsigned amount like `"$1500.00"`.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${amount:.2}")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_round_half_away_ties() {
        assert_eq!(round_half_away(2.675, 2), 2.68);
        assert_eq!(round_half_away(-2.675, 2), -2.68);
        assert_eq!(round_half_away(0.35715, 4), 0.3572);
        assert_eq!(round_half_away(35.4, 1), 35.4);
    }

    #[test]
    fn test_round_half_ceil_negative_tie() {
        assert_eq!(round_half_ceil(-0.125, 2), -0.12);
        assert_eq!(round_half_ceil(0.125, 2), 0.13);
        assert_eq!(round_half_ceil(1234.5678, 2), 1234.57);
    }

    #[test]
    fn test_ratio_percent() {
        assert_eq!(ratio_percent(500.0, 1400.0), 35.71);
        assert_eq!(ratio_percent(1.0, 3.0), 33.33);
        assert_eq!(ratio_percent(10.0, 0.0), 0.0);
        assert_eq!(ratio_percent(-1000.0, 2000.0), -50.0);
    }

    #[test]
    fn test_income_and_expense_totals() {
        let amounts = [1000.0, -200.0, 0.0, 50.5, -49.5];
        assert_eq!(income_total(&amounts), 1050.5);
        assert_eq!(expense_total(&amounts), 249.5);
    }

    #[test]
    fn test_calculate_progress() {
        assert_eq!(calculate_progress(50.0, 100.0), 50.0);
        assert_eq!(calculate_progress(150.0, 100.0), 150.0);
        assert_eq!(calculate_progress(50.0, 0.0), 0.0);
    }

    #[test]
    fn test_format_progress_bar() {
        assert_eq!(format_progress_bar(100.0, Some(10)), "[██████████] 100.0%");
        assert_eq!(format_progress_bar(50.0, Some(10)), "[█████░░░░░] 50.0%");
        assert_eq!(format_progress_bar(-25.0, Some(10)), "[░░░░░░░░░░] -25.0%");
        assert_eq!(format_progress_bar(130.0, Some(4)), "[████] 130.0%");
    }

    #[test]
    fn test_format_amounts() {
        assert_eq!(format_signed_amount(50.0), "+$50.00");
        assert_eq!(format_signed_amount(-123.45), "-$123.45");
        assert_eq!(format_signed_amount(0.0), "+$0.00");
        assert_eq!(format_amount(1500.0), "$1500.00");
        assert_eq!(format_amount(-2.5), "-$2.50");
    }
}
