//! Reduction of a raw prometheus sample value to something the thresholds can be applied to.

use crate::Thresholds;

/// Stands in for `-Inf`. Thresholds are never negative, so this is below all of them.
pub const NEGATIVE_INFINITY_SENTINEL: i64 = -1;

/// The comparable form of the value a query returned.
///
/// Non-finite values keep their own variants; [NormalizedValue::as_integer] turns the two
/// infinities into the integer sentinels used for comparison and display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NormalizedValue {
    Number(i64),
    NaN,
    PositiveInfinity,
    NegativeInfinity,
    Unparsable(String),
}

impl NormalizedValue {
    /// Normalizes the raw value string of a sample.
    ///
    /// Decimal strings are rounded to the nearest integer with ties going to the even
    /// neighbour. Everything that isn't a decimal, `+Inf`, `-Inf` or `NaN` is kept verbatim
    /// as [NormalizedValue::Unparsable], including the empty string a failed query yields.
    ///
    /// ```rust
    /// # use check_prometheus_metric::NormalizedValue;
    /// assert_eq!(NormalizedValue::parse("3.7"), NormalizedValue::Number(4));
    /// assert_eq!(NormalizedValue::parse("+Inf"), NormalizedValue::PositiveInfinity);
    /// assert_eq!(
    ///     NormalizedValue::parse("1e3"),
    ///     NormalizedValue::Unparsable("1e3".to_owned())
    /// );
    /// ```
    pub fn parse(raw: &str) -> Self {
        if is_decimal(raw) {
            return match raw.parse::<f64>() {
                // `as` saturates for values beyond the i64 range
                Ok(value) => NormalizedValue::Number(value.round_ties_even() as i64),
                Err(_) => NormalizedValue::Unparsable(raw.to_owned()),
            };
        }

        match raw {
            "+Inf" => NormalizedValue::PositiveInfinity,
            "-Inf" => NormalizedValue::NegativeInfinity,
            "NaN" => NormalizedValue::NaN,
            _ => NormalizedValue::Unparsable(raw.to_owned()),
        }
    }

    /// Returns the integer the thresholds are compared against, or `None` for values that
    /// can't be compared at all.
    ///
    /// `+Inf` becomes `warning + critical`. That is only guaranteed to exceed both thresholds
    /// for the ascending comparators, but it is what existing check configurations rely on.
    pub fn as_integer(&self, thresholds: &Thresholds) -> Option<i64> {
        match self {
            NormalizedValue::Number(n) => Some(*n),
            NormalizedValue::PositiveInfinity => Some(positive_infinity_sentinel(thresholds)),
            NormalizedValue::NegativeInfinity => Some(NEGATIVE_INFINITY_SENTINEL),
            NormalizedValue::NaN | NormalizedValue::Unparsable(_) => None,
        }
    }
}

/// Stands in for `+Inf`: `warning + critical`, saturating at `i64::MAX`.
pub fn positive_infinity_sentinel(thresholds: &Thresholds) -> i64 {
    thresholds.warning().saturating_add(thresholds.critical())
}

/// Matches `-?[0-9]+(\.[0-9]+)?`.
fn is_decimal(raw: &str) -> bool {
    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let (integral, fractional) = match unsigned.split_once('.') {
        Some((integral, fractional)) => (integral, Some(fractional)),
        None => (unsigned, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    all_digits(integral) && fractional.map_or(true, all_digits)
}
