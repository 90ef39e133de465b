//! Unit tests for the Money module
//!
//! Tests cover creation, rounding, arithmetic, discounts and serialization.

use core_kernel::{Money, MoneyError, Percentage};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_creates_money_with_correct_amount() {
        let m = Money::new(dec!(100.50));
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_new_rounds_to_two_decimal_places() {
        let m = Money::new(dec!(100.123456789));
        assert_eq!(m.amount(), dec!(100.12));
    }

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        assert_eq!(Money::new(dec!(0.125)).amount(), dec!(0.13));
        assert_eq!(Money::new(dec!(-0.125)).amount(), dec!(-0.13));
    }

    #[test]
    fn test_zero_creates_zero_amount() {
        let m = Money::zero();
        assert!(m.is_zero());
        assert!(!m.is_negative());
        assert!(!m.is_positive());
    }

    #[test]
    fn test_negative_amount_creation() {
        let m = Money::new(dec!(-40.00));
        assert!(m.is_negative());
        assert_eq!(m.abs(), Money::new(dec!(40)));
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_running_balance_accumulation() {
        let mut balance = Money::zero();
        balance -= Money::new(dec!(40));
        assert_eq!(balance, Money::new(dec!(-40)));
        balance += Money::new(dec!(100));
        assert_eq!(balance, Money::new(dec!(60)));
    }

    #[test]
    fn test_multiply_by_quantity() {
        let price = Money::new(dec!(12.50));
        assert_eq!(price * dec!(3), Money::new(dec!(37.50)));
        assert_eq!(price.multiply(dec!(0.333)), Money::new(dec!(4.16)));
    }

    #[test]
    fn test_checked_add_overflow() {
        let max = Money::new(Decimal::MAX.trunc());
        assert_eq!(max.checked_add(&max), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_negation() {
        assert_eq!(-Money::new(dec!(15)), Money::new(dec!(-15)));
    }
}

mod discounts {
    use super::*;

    #[test]
    fn test_percentage_fraction() {
        let p = Percentage::new(dec!(12.5)).unwrap();
        assert_eq!(p.as_fraction(), dec!(0.125));
        assert_eq!(p.remaining_fraction(), dec!(0.875));
    }

    #[test]
    fn test_full_discount() {
        let gross = Money::new(dec!(99.99));
        assert!(gross.discounted(Percentage::new(dec!(100)).unwrap()).is_zero());
    }

    #[test]
    fn test_percentage_display() {
        assert_eq!(Percentage::new(dec!(5.00)).unwrap().to_string(), "5%");
    }
}

mod serialization {
    use super::*;

    #[test]
    fn test_money_serializes_transparently() {
        let json = serde_json::to_string(&Money::new(dec!(10.50))).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::new(dec!(10.50)));
    }

    #[test]
    fn test_percentage_rejects_out_of_range_on_deserialize() {
        let result: Result<Percentage, _> = serde_json::from_str("\"150\"");
        assert!(result.is_err());
    }
}
