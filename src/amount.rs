//! Amount normalization shared by the field strategies.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::{ExportError, ExportResult};

/// Parses a plain decimal amount. Negative zero is normalized to zero.
pub fn parse_amount(value: &str) -> ExportResult<Decimal> {
    let mut amount = Decimal::from_str(value.trim())
        .map_err(|_| ExportError::InvalidAmount(value.to_string()))?;
    if amount.is_zero() {
        amount.set_sign_positive(true);
    }
    Ok(amount)
}

/// Formats with exactly two decimal places, rounding half away from zero.
pub fn format_two_places(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.to_string()
}

/// Flips the debit/credit convention of an amount.
pub fn invert_sign(value: &str) -> ExportResult<String> {
    let amount = parse_amount(value)?;
    Ok(format_two_places(-amount))
}

/// Combines separate debit and credit columns into one signed amount.
///
/// Empty cells count as zero. Every character of `strip` is removed first,
/// which takes care of thousands separators such as `'` or `,`.
pub fn debit_credit(debit: &str, credit: &str, strip: &str) -> ExportResult<String> {
    let clean = |s: &str| s.chars().filter(|c| !strip.contains(*c)).collect::<String>();

    let mut amount = Decimal::ZERO;
    let debit = clean(debit);
    if !debit.trim().is_empty() {
        amount -= parse_amount(&debit)?;
    }
    let credit = clean(credit);
    if !credit.trim().is_empty() {
        amount += parse_amount(&credit)?;
    }
    Ok(format_two_places(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("100.00", "-100.00")]
    #[case("-50", "50.00")]
    #[case("0", "0.00")]
    #[case("-0.00", "0.00")]
    #[case(" 12.5 ", "-12.50")]
    #[case("0.005", "-0.01")]
    #[case("1234567.891", "-1234567.89")]
    fn test_invert_sign(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(invert_sign(input).unwrap(), expected);
    }

    #[rstest]
    #[case("invalid")]
    #[case("$100.00")]
    #[case("1,000.00")]
    #[case("")]
    fn test_invert_sign_invalid(#[case] input: &str) {
        assert!(matches!(invert_sign(input), Err(ExportError::InvalidAmount(_))));
    }

    #[rstest]
    #[case("100.00")]
    #[case("-50.00")]
    #[case("0.1")]
    #[case("42")]
    #[case("-999.999")]
    fn test_invert_sign_round_trip(#[case] input: &str) {
        let twice = invert_sign(&invert_sign(input).unwrap()).unwrap();
        assert_eq!(twice, format_two_places(parse_amount(input).unwrap()));
    }

    #[rstest]
    #[case("10.00", "", "", "-10.00")]
    #[case("", "20.5", "", "20.50")]
    #[case("", "", "", "0.00")]
    #[case("1'250.00", "", "'", "-1250.00")]
    #[case("5.00", "7.25", "", "2.25")]
    fn test_debit_credit(
        #[case] debit: &str,
        #[case] credit: &str,
        #[case] strip: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(debit_credit(debit, credit, strip).unwrap(), expected);
    }

    #[test]
    fn test_debit_credit_invalid() {
        assert!(matches!(
            debit_credit("abc", "", ""),
            Err(ExportError::InvalidAmount(_))
        ));
    }
}
