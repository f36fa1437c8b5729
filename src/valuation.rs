use chrono::{DateTime, Datelike, Utc};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use rust_decimal::{Decimal, MathematicalOps};

use crate::decimal::{Money, Rate};
use crate::types::Investment;

/// tax rates by investment age bracket
///
/// non-cumulative: the single bracket matching the elapsed whole months
/// applies to the entire gross value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TaxSchedule {
    /// applies below 12 elapsed months
    pub short_term: Rate,
    /// applies from 12 to 23 elapsed months
    pub medium_term: Rate,
    /// applies from 24 elapsed months on
    pub long_term: Rate,
}

impl TaxSchedule {
    /// first month of the medium-term bracket
    pub const MEDIUM_TERM_START: i64 = 12;
    /// first month of the long-term bracket
    pub const LONG_TERM_START: i64 = 24;

    pub fn new(short_term: Rate, medium_term: Rate, long_term: Rate) -> Self {
        Self {
            short_term,
            medium_term,
            long_term,
        }
    }

    /// select the bracket rate for an elapsed-months count
    pub fn rate_for(&self, months: i64) -> Rate {
        if months < Self::MEDIUM_TERM_START {
            self.short_term
        } else if months < Self::LONG_TERM_START {
            self.medium_term
        } else {
            self.long_term
        }
    }
}

impl Default for TaxSchedule {
    fn default() -> Self {
        Self {
            short_term: Rate::from_bps(2250),
            medium_term: Rate::from_bps(1850),
            long_term: Rate::from_bps(1500),
        }
    }
}

/// growth and tax parameters for the yield calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct YieldConfig {
    /// interest rate applied per elapsed month
    pub monthly_rate: Rate,
    pub tax: TaxSchedule,
}

impl YieldConfig {
    pub fn new(monthly_rate: Rate, tax: TaxSchedule) -> Self {
        Self { monthly_rate, tax }
    }
}

impl Default for YieldConfig {
    fn default() -> Self {
        Self {
            monthly_rate: Rate::from_bps(52),
            tax: TaxSchedule::default(),
        }
    }
}

/// valuation result at a single point in time
#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    pub principal: Money,
    pub months: i64,
    pub gross: Money,
    pub tax_rate: Rate,
    pub tax: Money,
    /// payout value, clamped at zero and rounded to whole cents
    pub net: Money,
}

/// engine for compound growth and tax-adjusted payout values
pub struct YieldCalculator {
    pub config: YieldConfig,
}

impl YieldCalculator {
    pub fn new(config: YieldConfig) -> Self {
        Self { config }
    }

    /// compound growth factor (1 + r)^months
    ///
    /// zero or negative months yield no growth; the exponent is decimal
    /// so fractional month counts are supported. growth past the decimal
    /// range saturates at `Decimal::MAX` instead of overflowing.
    pub fn growth_factor(&self, months: Decimal) -> Decimal {
        if months <= Decimal::ZERO {
            return Decimal::ONE;
        }
        let base = Decimal::ONE + self.config.monthly_rate.as_decimal();
        base.checked_powd(months).unwrap_or(Decimal::MAX)
    }

    /// value a principal from its creation date to an explicit point in time
    pub fn value_at(
        &self,
        principal: Money,
        created_at: DateTime<Utc>,
        as_of: DateTime<Utc>,
    ) -> Valuation {
        let months = months_between(created_at, as_of);
        let gross = principal
            .as_decimal()
            .saturating_mul(self.growth_factor(Decimal::from(months)));
        let tax_rate = self.config.tax.rate_for(months);
        let tax = gross * tax_rate.as_decimal();
        let net = Money::from_decimal(gross - tax)
            .max(Money::ZERO)
            .round_cents();

        Valuation {
            principal,
            months,
            gross: Money::from_decimal(gross),
            tax_rate,
            tax: Money::from_decimal(tax),
            net,
        }
    }

    /// value an investment at its freeze point, or at the current time
    /// while it is still accruing
    pub fn appraise(&self, investment: &Investment, time_provider: &SafeTimeProvider) -> Valuation {
        let as_of = investment
            .deleted_at
            .unwrap_or_else(|| time_provider.now());
        self.value_at(investment.amount, investment.created_at, as_of)
    }
}

impl Default for YieldCalculator {
    fn default() -> Self {
        Self::new(YieldConfig::default())
    }
}

/// whole calendar-month difference, day-of-month ignored
///
/// two dates in the same calendar month are always 0 months apart no
/// matter their days; the count goes negative when `to` precedes `from`.
pub fn months_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let years = to.year() as i64 - from.year() as i64;
    let months = to.month() as i64 - from.month() as i64;
    years * 12 + months
}

/// net payout of a principal under the default configuration
///
/// `as_of` is the freeze point of a closed investment; pass `None` for a
/// still-accruing one to value it at the system clock.
pub fn investment_value(
    principal: Money,
    created_at: DateTime<Utc>,
    as_of: Option<DateTime<Utc>>,
) -> Money {
    let as_of = match as_of {
        Some(frozen) => frozen,
        None => SafeTimeProvider::new(TimeSource::System).now(),
    };
    YieldCalculator::default()
        .value_at(principal, created_at, as_of)
        .net
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    // 2020-01-01 shifted forward by whole months
    fn months_after_epoch(months: i64) -> DateTime<Utc> {
        date(2020 + (months / 12) as i32, 1 + (months % 12) as u32, 1)
    }

    #[test]
    fn test_months_between_ignores_days() {
        assert_eq!(months_between(date(2021, 1, 1), date(2021, 1, 31)), 0);
        assert_eq!(months_between(date(2021, 1, 31), date(2021, 2, 1)), 1);
        assert_eq!(months_between(date(2021, 1, 15), date(2021, 9, 2)), 8);
    }

    #[test]
    fn test_months_between_across_years() {
        assert_eq!(months_between(date(2021, 1, 1), date(2022, 8, 1)), 19);
        assert_eq!(months_between(date(2015, 1, 1), date(2023, 6, 1)), 101);
        assert_eq!(months_between(date(2021, 11, 1), date(2022, 2, 1)), 3);
    }

    #[test]
    fn test_months_between_can_go_negative() {
        assert_eq!(months_between(date(2021, 5, 1), date(2021, 3, 1)), -2);
    }

    #[test]
    fn test_growth_factor_floors_at_one() {
        let calc = YieldCalculator::default();
        assert_eq!(calc.growth_factor(Decimal::ZERO), Decimal::ONE);
        assert_eq!(calc.growth_factor(dec!(-6)), Decimal::ONE);
        assert_eq!(calc.growth_factor(Decimal::ONE), dec!(1.0052));
    }

    #[test]
    fn test_growth_factor_supports_fractional_months() {
        let calc = YieldCalculator::default();
        let half = calc.growth_factor(dec!(0.5));
        assert!(half > Decimal::ONE);
        assert!(half < calc.growth_factor(Decimal::ONE));
    }

    #[test]
    fn test_tax_bracket_selection() {
        let tax = TaxSchedule::default();
        assert_eq!(tax.rate_for(0), Rate::from_bps(2250));
        assert_eq!(tax.rate_for(11), Rate::from_bps(2250));
        assert_eq!(tax.rate_for(12), Rate::from_bps(1850));
        assert_eq!(tax.rate_for(23), Rate::from_bps(1850));
        assert_eq!(tax.rate_for(24), Rate::from_bps(1500));
        assert_eq!(tax.rate_for(101), Rate::from_bps(1500));
        assert_eq!(tax.rate_for(-3), Rate::from_bps(2250));
    }

    #[test]
    fn test_short_term_payout() {
        // 1000 held 8 months: short-term bracket
        let calc = YieldCalculator::default();
        let v = calc.value_at(Money::from_major(1000), date(2021, 1, 1), date(2021, 9, 1));
        assert_eq!(v.months, 8);
        assert_eq!(v.tax_rate, Rate::from_bps(2250));
        assert_eq!(v.net, Money::from_str_exact("807.83").unwrap());
        assert_eq!(v.net.round_dp(0), Money::from_major(808));
    }

    #[test]
    fn test_medium_term_payout() {
        // 1000 held 19 months: medium-term bracket
        let calc = YieldCalculator::default();
        let v = calc.value_at(Money::from_major(1000), date(2021, 1, 1), date(2022, 8, 1));
        assert_eq!(v.months, 19);
        assert_eq!(v.tax_rate, Rate::from_bps(1850));
        assert_eq!(v.net, Money::from_str_exact("899.40").unwrap());
        assert_eq!(v.net.round_dp(0), Money::from_major(899));
    }

    #[test]
    fn test_long_term_payout() {
        // 1000 held 101 months: long-term bracket, growth outruns tax
        let calc = YieldCalculator::default();
        let v = calc.value_at(Money::from_major(1000), date(2015, 1, 1), date(2023, 6, 1));
        assert_eq!(v.months, 101);
        assert_eq!(v.tax_rate, Rate::from_bps(1500));
        assert_eq!(v.net, Money::from_str_exact("1435.22").unwrap());
        assert_eq!(v.net.round_dp(0), Money::from_major(1435));
    }

    #[test]
    fn test_zero_months_taxes_principal() {
        let calc = YieldCalculator::default();
        let v = calc.value_at(Money::from_major(1000), date(2021, 1, 1), date(2021, 1, 28));
        assert_eq!(v.months, 0);
        assert_eq!(v.gross, Money::from_major(1000));
        assert_eq!(v.net, Money::from_major(775));
    }

    #[test]
    fn test_negative_months_yield_no_growth() {
        let calc = YieldCalculator::default();
        let v = calc.value_at(Money::from_major(1000), date(2021, 5, 1), date(2021, 3, 1));
        assert_eq!(v.months, -2);
        assert_eq!(v.gross, Money::from_major(1000));
        assert_eq!(v.net, Money::from_major(775));
    }

    #[test]
    fn test_extreme_horizons_saturate() {
        // a millennium and a half of compounding exceeds the decimal
        // range; the valuation pins at the ceiling instead of panicking
        let calc = YieldCalculator::default();
        let v = calc.value_at(Money::from_major(1000), date(2021, 1, 1), date(3521, 1, 1));
        assert_eq!(v.months, 18_000);
        assert_eq!(v.tax_rate, Rate::from_bps(1500));
        assert_eq!(v.gross, Money::from_decimal(Decimal::MAX));
        assert!(v.net > Money::from_major(i64::MAX));
        assert!(v.net < v.gross);
    }

    #[test]
    fn test_appraise_prefers_freeze_point() {
        let calc = YieldCalculator::default();
        let investment = Investment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount: Money::from_major(1000),
            created_at: date(2021, 1, 1),
            deleted_at: Some(date(2021, 9, 1)),
        };

        // the clock reads years later; the frozen deactivation wins
        let time = SafeTimeProvider::new(TimeSource::Test(date(2030, 1, 1)));
        let v = calc.appraise(&investment, &time);
        assert_eq!(v.months, 8);
        assert_eq!(v.net, Money::from_str_exact("807.83").unwrap());
    }

    #[test]
    fn test_appraise_active_investment_follows_clock() {
        let calc = YieldCalculator::default();
        let investment = Investment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount: Money::from_major(1000),
            created_at: date(2021, 1, 1),
            deleted_at: None,
        };

        let time = SafeTimeProvider::new(TimeSource::Test(date(2021, 9, 15)));
        assert_eq!(calc.appraise(&investment, &time).months, 8);

        let later = SafeTimeProvider::new(TimeSource::Test(date(2022, 8, 15)));
        assert_eq!(calc.appraise(&investment, &later).months, 19);
    }

    #[test]
    fn test_investment_value_matches_calculator() {
        let principal = Money::from_major(1000);
        let frozen = investment_value(principal, date(2021, 1, 1), Some(date(2021, 9, 1)));
        assert_eq!(frozen, Money::from_str_exact("807.83").unwrap());
    }

    #[test]
    fn test_valuation_is_deterministic() {
        let calc = YieldCalculator::default();
        let a = calc.value_at(Money::from_major(1000), date(2015, 1, 1), date(2023, 6, 1));
        let b = calc.value_at(Money::from_major(1000), date(2015, 1, 1), date(2023, 6, 1));
        assert_eq!(a, b);
        assert_eq!(a.net.to_string(), b.net.to_string());
    }

    proptest! {
        #[test]
        fn prop_net_never_negative(principal in 1i64..=1_000_000, months in 0i64..=360) {
            let calc = YieldCalculator::default();
            let v = calc.value_at(
                Money::from_major(principal),
                months_after_epoch(0),
                months_after_epoch(months),
            );
            prop_assert!(v.net >= Money::ZERO);
        }

        #[test]
        fn prop_net_non_decreasing_in_months(
            principal in 1i64..=1_000_000,
            m1 in 0i64..=336,
            delta in 1i64..=24,
        ) {
            let calc = YieldCalculator::default();
            let earlier = calc.value_at(
                Money::from_major(principal),
                months_after_epoch(0),
                months_after_epoch(m1),
            );
            let later = calc.value_at(
                Money::from_major(principal),
                months_after_epoch(0),
                months_after_epoch(m1 + delta),
            );
            prop_assert!(later.net >= earlier.net);
        }

        #[test]
        fn prop_same_bracket_compounds_strictly(
            principal in 100i64..=1_000_000,
            m1 in 0i64..=336,
            delta in 1i64..=24,
        ) {
            let schedule = TaxSchedule::default();
            let m2 = m1 + delta;
            prop_assume!(schedule.rate_for(m1) == schedule.rate_for(m2));

            let calc = YieldCalculator::default();
            let earlier = calc.value_at(
                Money::from_major(principal),
                months_after_epoch(0),
                months_after_epoch(m1),
            );
            let later = calc.value_at(
                Money::from_major(principal),
                months_after_epoch(0),
                months_after_epoch(m2),
            );
            prop_assert!(later.net > earlier.net);
            prop_assert!(later.gross > earlier.gross);
        }
    }
}
