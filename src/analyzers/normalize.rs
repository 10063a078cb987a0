/// Days in each calendar month, February always taken as 28.
pub const DAYS_IN_MONTH: [u64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Average month length, 30.417 days, in thousandths of a day.
pub const AVERAGE_MONTH_MILLIDAYS: u64 = 30_417;

/// Returns the day count for a 1-based month, or `None` outside 1..=12.
pub fn days_in_month(month: u32) -> Option<u64> {
    let idx = usize::try_from(month.checked_sub(1)?).ok()?;
    DAYS_IN_MONTH.get(idx).copied()
}

/// Rescales a monthly count to an average-length month:
/// `round(count / days * 30.417)`.
///
/// Evaluated exactly as `count * 30417 / (days * 1000)` and rounded half to
/// even, so results do not depend on floating point.
pub fn normalize_month_count(count: u64, month: u32) -> Option<u64> {
    let days = days_in_month(month)?;
    Some(div_round_half_even(
        count * AVERAGE_MONTH_MILLIDAYS,
        days * 1000,
    ))
}

/// Integer division rounding to nearest, ties to the even quotient.
pub fn div_round_half_even(numerator: u64, denominator: u64) -> u64 {
    let quotient = numerator / denominator;
    let twice_remainder = (numerator % denominator) * 2;

    if twice_remainder > denominator || (twice_remainder == denominator && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(1), Some(31));
        assert_eq!(days_in_month(2), Some(28));
        assert_eq!(days_in_month(12), Some(31));
        assert_eq!(days_in_month(0), None);
        assert_eq!(days_in_month(13), None);
        assert_eq!(DAYS_IN_MONTH.iter().sum::<u64>(), 365);
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(div_round_half_even(5, 2), 2);
        assert_eq!(div_round_half_even(7, 2), 4);
        assert_eq!(div_round_half_even(9, 4), 2);
        assert_eq!(div_round_half_even(11, 4), 3);
        assert_eq!(div_round_half_even(0, 31), 0);
    }

    #[test]
    fn test_normalize_worked_examples() {
        // 3 / 31 * 30.417 = 2.94
        assert_eq!(normalize_month_count(3, 1), Some(3));
        // 2 / 28 * 30.417 = 2.17
        assert_eq!(normalize_month_count(2, 2), Some(2));
        assert_eq!(normalize_month_count(0, 2), Some(0));
        assert_eq!(normalize_month_count(10, 13), None);
    }

    #[test]
    fn test_normalize_ties_round_to_even() {
        // 15500 / 31 * 30.417 = 15208.5 exactly
        assert_eq!(normalize_month_count(15_500, 1), Some(15_208));
        // 46500 / 31 * 30.417 = 45625.5 exactly
        assert_eq!(normalize_month_count(46_500, 1), Some(45_626));
    }

    #[test]
    fn test_short_months_scale_up_long_months_scale_down() {
        for count in [1u64, 28, 100, 2_800, 123_456] {
            assert!(normalize_month_count(count, 2).unwrap() >= count);
            assert!(normalize_month_count(count, 1).unwrap() <= count);
        }
        // Equal daily rate: February and January land on the same value.
        assert_eq!(normalize_month_count(2_800, 2), normalize_month_count(3_100, 1));
    }
}
