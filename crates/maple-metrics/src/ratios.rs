//! Valuation, profitability and balance-sheet ratios.
//!
//! Each ratio is described by a [`RatioRule`]: an optional provider accessor
//! and an optional fallback computed from statements. The provider value always
//! wins; the fallback only runs when the provider value is absent.
//!
//! # Example
//!
//! ```
//! use maple_metrics::{Profile, RatioName, Statements, compute_ratios};
//!
//! let profile = Profile { trailing_pe: Some(12.5), ..Default::default() };
//! let ratios = compute_ratios(Some(10.0), &profile, &Statements::default());
//! assert_eq!(ratios.get(RatioName::PriceToEarnings), Some(12.5));
//! ```

use crate::profile::Profile;
use crate::statements::{Statements, latest_value, ttm_sum};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Divide two optional values.
///
/// Returns `None` when either side is absent, the denominator is zero, or the
/// quotient is not finite.
pub fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    Some(n / d).filter(|q| q.is_finite())
}

/// Statement line-item candidates, tried in order.
pub mod labels {
    /// Net income
    pub const NET_INCOME: &[&str] = &["net income", "net income common"];
    /// Revenue
    pub const REVENUE: &[&str] = &["total revenue", "revenue", "sales"];
    /// EBITDA
    pub const EBITDA: &[&str] = &["ebitda"];
    /// Debt used in enterprise value
    pub const EV_DEBT: &[&str] = &["total debt", "long term debt", "short long term debt"];
    /// Cash used in enterprise value
    pub const CASH: &[&str] = &["cash", "cash and cash equivalents"];
    /// Debt used in leverage
    pub const DEBT: &[&str] = &["total debt", "long term debt"];
    /// Shareholders' equity
    pub const EQUITY: &[&str] = &[
        "total stockholder equity",
        "total stockholders equity",
        "total shareholders equity",
    ];
    /// Operating cash flow
    pub const OPERATING_CASH_FLOW: &[&str] =
        &["total cash from operating activities", "operating cash flow"];
    /// Capital expenditures
    pub const CAPEX: &[&str] = &["capital expenditures"];
    /// Current assets
    pub const CURRENT_ASSETS: &[&str] = &["total current assets"];
    /// Current liabilities
    pub const CURRENT_LIABILITIES: &[&str] = &["total current liabilities"];
    /// EBIT
    pub const EBIT: &[&str] = &["ebit", "operating income"];
    /// Interest expense
    pub const INTEREST_EXPENSE: &[&str] = &["interest expense", "interest expense non operating"];
}

/// The closed set of ratios, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RatioName {
    /// P/E (TTM)
    PriceToEarnings,
    /// P/B
    PriceToBook,
    /// P/S (TTM)
    PriceToSales,
    /// EV/EBITDA (TTM)
    EvToEbitda,
    /// FCF Yield (TTM)
    FcfYield,
    /// ROE (TTM)
    ReturnOnEquity,
    /// D/E
    DebtToEquity,
    /// Current Ratio
    CurrentRatio,
    /// Interest Coverage
    InterestCoverage,
    /// Dividend Yield
    DividendYield,
    /// Beta
    Beta,
}

impl RatioName {
    /// All ratios in display order.
    pub const ALL: [Self; 11] = [
        Self::PriceToEarnings,
        Self::PriceToBook,
        Self::PriceToSales,
        Self::EvToEbitda,
        Self::FcfYield,
        Self::ReturnOnEquity,
        Self::DebtToEquity,
        Self::CurrentRatio,
        Self::InterestCoverage,
        Self::DividendYield,
        Self::Beta,
    ];

    /// Display label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PriceToEarnings => "P/E (TTM)",
            Self::PriceToBook => "P/B",
            Self::PriceToSales => "P/S (TTM)",
            Self::EvToEbitda => "EV/EBITDA (TTM)",
            Self::FcfYield => "FCF Yield (TTM)",
            Self::ReturnOnEquity => "ROE (TTM)",
            Self::DebtToEquity => "D/E",
            Self::CurrentRatio => "Current Ratio",
            Self::InterestCoverage => "Interest Coverage",
            Self::DividendYield => "Dividend Yield",
            Self::Beta => "Beta",
        }
    }

    /// Whether the value reads as a percentage rather than a multiple.
    pub const fn is_percentage(&self) -> bool {
        matches!(
            self,
            Self::FcfYield | Self::ReturnOnEquity | Self::DividendYield
        )
    }
}

impl fmt::Display for RatioName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RatioName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown ratio: {s}"))
    }
}

/// Everything a fallback may read.
#[derive(Debug, Clone, Copy)]
pub struct RatioInputs<'a> {
    /// Latest price
    pub price: Option<f64>,
    /// Provider profile
    pub profile: &'a Profile,
    /// Statement tables
    pub statements: &'a Statements,
}

impl RatioInputs<'_> {
    fn net_income_ttm(&self) -> Option<f64> {
        ttm_sum(&self.statements.income_quarterly, labels::NET_INCOME)
    }

    fn equity(&self) -> Option<f64> {
        latest_value(&self.statements.balance_sheet_annual, labels::EQUITY)
    }
}

type ProviderAccessor = fn(&Profile) -> Option<f64>;
type Fallback = fn(&RatioInputs<'_>) -> Option<f64>;

/// How one ratio is obtained.
#[derive(Debug, Clone, Copy)]
pub struct RatioRule {
    /// Ratio produced
    pub name: RatioName,
    /// Provider-reported value
    pub primary: Option<ProviderAccessor>,
    /// Value computed from statements
    pub fallback: Option<Fallback>,
}

impl RatioRule {
    /// Evaluate the rule: provider value first, then the fallback.
    pub fn evaluate(&self, inputs: &RatioInputs<'_>) -> Option<f64> {
        self.primary
            .and_then(|primary| primary(inputs.profile))
            .or_else(|| self.fallback.and_then(|fallback| fallback(inputs)))
    }
}

/// Rules for every ratio, in display order.
pub const RATIO_RULES: [RatioRule; 11] = [
    RatioRule {
        name: RatioName::PriceToEarnings,
        primary: Some(trailing_pe),
        fallback: Some(pe_from_statements),
    },
    RatioRule {
        name: RatioName::PriceToBook,
        primary: Some(price_to_book),
        fallback: None,
    },
    RatioRule {
        name: RatioName::PriceToSales,
        primary: Some(price_to_sales),
        fallback: Some(ps_from_statements),
    },
    RatioRule {
        name: RatioName::EvToEbitda,
        primary: Some(enterprise_to_ebitda),
        fallback: Some(ev_ebitda_from_statements),
    },
    RatioRule {
        name: RatioName::FcfYield,
        primary: None,
        fallback: Some(fcf_yield),
    },
    RatioRule {
        name: RatioName::ReturnOnEquity,
        primary: None,
        fallback: Some(return_on_equity),
    },
    RatioRule {
        name: RatioName::DebtToEquity,
        primary: None,
        fallback: Some(debt_to_equity),
    },
    RatioRule {
        name: RatioName::CurrentRatio,
        primary: None,
        fallback: Some(current_ratio),
    },
    RatioRule {
        name: RatioName::InterestCoverage,
        primary: None,
        fallback: Some(interest_coverage),
    },
    RatioRule {
        name: RatioName::DividendYield,
        primary: Some(dividend_yield),
        fallback: None,
    },
    RatioRule {
        name: RatioName::Beta,
        primary: Some(beta),
        fallback: None,
    },
];

const fn trailing_pe(p: &Profile) -> Option<f64> {
    p.trailing_pe
}

const fn price_to_book(p: &Profile) -> Option<f64> {
    p.price_to_book
}

const fn price_to_sales(p: &Profile) -> Option<f64> {
    p.price_to_sales_trailing_12_months
}

const fn enterprise_to_ebitda(p: &Profile) -> Option<f64> {
    p.enterprise_to_ebitda
}

const fn dividend_yield(p: &Profile) -> Option<f64> {
    p.dividend_yield
}

const fn beta(p: &Profile) -> Option<f64> {
    p.beta
}

fn pe_from_statements(inputs: &RatioInputs<'_>) -> Option<f64> {
    let eps = safe_div(inputs.net_income_ttm(), inputs.profile.shares_outstanding);
    safe_div(inputs.price, eps)
}

fn ps_from_statements(inputs: &RatioInputs<'_>) -> Option<f64> {
    let shares = inputs.profile.shares_outstanding.filter(|s| *s != 0.0)?;
    let market_value = inputs.price? * shares;
    let sales = ttm_sum(&inputs.statements.income_quarterly, labels::REVENUE);
    safe_div(Some(market_value), sales)
}

fn ev_ebitda_from_statements(inputs: &RatioInputs<'_>) -> Option<f64> {
    let balance_sheet = &inputs.statements.balance_sheet_annual;
    let debt = latest_value(balance_sheet, labels::EV_DEBT);
    let cash = latest_value(balance_sheet, labels::CASH);
    let enterprise_value = match (inputs.profile.market_cap, debt, cash) {
        (Some(mcap), Some(debt), Some(cash)) => Some(mcap + debt - cash),
        _ => None,
    };
    let ebitda = ttm_sum(&inputs.statements.income_quarterly, labels::EBITDA);
    safe_div(enterprise_value, ebitda)
}

fn fcf_yield(inputs: &RatioInputs<'_>) -> Option<f64> {
    let cashflow = &inputs.statements.cashflow_quarterly;
    let operating = ttm_sum(cashflow, labels::OPERATING_CASH_FLOW)?;
    let capex = ttm_sum(cashflow, labels::CAPEX)?;
    safe_div(Some(operating - capex), inputs.profile.market_cap)
}

fn return_on_equity(inputs: &RatioInputs<'_>) -> Option<f64> {
    safe_div(inputs.net_income_ttm(), inputs.equity())
}

fn debt_to_equity(inputs: &RatioInputs<'_>) -> Option<f64> {
    let debt = latest_value(&inputs.statements.balance_sheet_annual, labels::DEBT);
    safe_div(debt, inputs.equity())
}

fn current_ratio(inputs: &RatioInputs<'_>) -> Option<f64> {
    let balance_sheet = &inputs.statements.balance_sheet_annual;
    safe_div(
        latest_value(balance_sheet, labels::CURRENT_ASSETS),
        latest_value(balance_sheet, labels::CURRENT_LIABILITIES),
    )
}

fn interest_coverage(inputs: &RatioInputs<'_>) -> Option<f64> {
    let income = &inputs.statements.income_quarterly;
    let interest = ttm_sum(income, labels::INTEREST_EXPENSE).map(f64::abs);
    safe_div(ttm_sum(income, labels::EBIT), interest)
}

/// Computed ratios keyed by name. Every name is present; values may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioSet {
    values: BTreeMap<RatioName, Option<f64>>,
}

impl RatioSet {
    /// Value for `name`, if computed.
    pub fn get(&self, name: RatioName) -> Option<f64> {
        self.values.get(&name).copied().flatten()
    }

    /// Value for a display label such as `"P/E (TTM)"`.
    pub fn get_by_label(&self, label: &str) -> Option<f64> {
        label.parse().ok().and_then(|name| self.get(name))
    }

    /// Ratios in display order.
    pub fn iter(&self) -> impl Iterator<Item = (RatioName, Option<f64>)> + '_ {
        self.values.iter().map(|(name, value)| (*name, *value))
    }

    /// Number of ratios with a value.
    pub fn available(&self) -> usize {
        self.values.values().filter(|v| v.is_some()).count()
    }
}

/// Compute every ratio from the latest price, provider profile and statements.
///
/// Independent ratios are always evaluated; a missing input only blanks the
/// ratios that depend on it.
pub fn compute_ratios(
    last_price: Option<f64>,
    profile: &Profile,
    statements: &Statements,
) -> RatioSet {
    let inputs = RatioInputs {
        price: last_price,
        profile,
        statements,
    };
    let values = RATIO_RULES
        .iter()
        .map(|rule| (rule.name, rule.evaluate(&inputs)))
        .collect();
    RatioSet { values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statements::{LineItem, PeriodValue, StatementTable};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn quarters(label: &str, values: &[f64]) -> LineItem {
        let ends = [(2023, 3, 31), (2023, 6, 30), (2023, 9, 30), (2023, 12, 31), (2024, 3, 31)];
        LineItem::new(
            label,
            values
                .iter()
                .zip(ends)
                .map(|(v, (y, m, d))| {
                    PeriodValue::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), Some(*v))
                })
                .collect(),
        )
    }

    fn annual(label: &str, value: f64) -> LineItem {
        LineItem::new(
            label,
            vec![PeriodValue::new(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(), Some(value))],
        )
    }

    fn statements() -> Statements {
        Statements {
            income_quarterly: StatementTable::new(vec![
                quarters("Total Revenue", &[100.0, 100.0, 100.0, 100.0]),
                quarters("Ebit", &[20.0, 20.0, 20.0, 20.0]),
                quarters("Ebitda", &[30.0, 30.0, 30.0, 30.0]),
                quarters("Net Income", &[60.0, 60.0, 65.0, 65.0]),
                quarters("Interest Expense", &[-2.0, -2.0, -3.0, -3.0]),
            ]),
            balance_sheet_annual: StatementTable::new(vec![
                annual("Total Debt", 500.0),
                annual("Cash And Cash Equivalents", 100.0),
                annual("Total Stockholder Equity", 1000.0),
                annual("Total Current Assets", 300.0),
                annual("Total Current Liabilities", 200.0),
            ]),
            cashflow_quarterly: StatementTable::new(vec![
                quarters("Operating Cash Flow", &[50.0, 50.0, 50.0, 50.0]),
                quarters("Capital Expenditures", &[-10.0, -10.0, -10.0, -10.0]),
            ]),
            ..Default::default()
        }
    }

    #[rstest]
    #[case(Some(3.0), Some(0.0))]
    #[case(None, Some(2.0))]
    #[case(Some(3.0), None)]
    fn test_safe_div_absent(#[case] n: Option<f64>, #[case] d: Option<f64>) {
        assert_eq!(safe_div(n, d), None);
    }

    #[test]
    fn test_safe_div() {
        assert_eq!(safe_div(Some(3.0), Some(2.0)), Some(1.5));
    }

    #[test]
    fn test_provider_value_wins() {
        let profile = Profile {
            trailing_pe: Some(12.5),
            shares_outstanding: Some(100.0),
            ..Default::default()
        };
        let ratios = compute_ratios(Some(10.0), &profile, &statements());
        assert_eq!(ratios.get(RatioName::PriceToEarnings), Some(12.5));
    }

    #[test]
    fn test_pe_fallback_from_statements() {
        let profile = Profile {
            shares_outstanding: Some(100.0),
            ..Default::default()
        };
        let ratios = compute_ratios(Some(10.0), &profile, &statements());
        assert_relative_eq!(ratios.get(RatioName::PriceToEarnings).unwrap(), 4.0);
    }

    #[test]
    fn test_pe_fallback_needs_price_and_shares() {
        let profile = Profile {
            shares_outstanding: Some(0.0),
            ..Default::default()
        };
        assert_eq!(
            compute_ratios(Some(10.0), &profile, &statements()).get(RatioName::PriceToEarnings),
            None
        );
        let profile = Profile {
            shares_outstanding: Some(100.0),
            ..Default::default()
        };
        assert_eq!(
            compute_ratios(None, &profile, &statements()).get(RatioName::PriceToEarnings),
            None
        );
    }

    #[test]
    fn test_ps_fallback_needs_shares() {
        let profile = Profile {
            shares_outstanding: Some(0.0),
            ..Default::default()
        };
        let ratios = compute_ratios(Some(10.0), &profile, &statements());
        assert_eq!(ratios.get(RatioName::PriceToSales), None);

        let profile = Profile {
            shares_outstanding: Some(100.0),
            ..Default::default()
        };
        let ratios = compute_ratios(Some(10.0), &profile, &statements());
        assert_relative_eq!(ratios.get(RatioName::PriceToSales).unwrap(), 2.5);
    }

    #[test]
    fn test_statement_fallbacks() {
        let profile = Profile {
            market_cap: Some(2000.0),
            shares_outstanding: Some(100.0),
            ..Default::default()
        };
        let ratios = compute_ratios(Some(20.0), &profile, &statements());

        assert_relative_eq!(ratios.get(RatioName::PriceToSales).unwrap(), 2000.0 / 400.0);
        assert_relative_eq!(ratios.get(RatioName::EvToEbitda).unwrap(), 2400.0 / 120.0);
        assert_relative_eq!(ratios.get(RatioName::FcfYield).unwrap(), 240.0 / 2000.0);
        assert_relative_eq!(ratios.get(RatioName::ReturnOnEquity).unwrap(), 0.25);
        assert_relative_eq!(ratios.get(RatioName::DebtToEquity).unwrap(), 0.5);
        assert_relative_eq!(ratios.get(RatioName::CurrentRatio).unwrap(), 1.5);
        assert_relative_eq!(ratios.get(RatioName::InterestCoverage).unwrap(), 8.0);
        assert_eq!(ratios.get(RatioName::PriceToBook), None);
        assert_eq!(ratios.get(RatioName::Beta), None);
    }

    #[test]
    fn test_ev_requires_market_cap() {
        let ratios = compute_ratios(Some(20.0), &Profile::default(), &statements());
        assert_eq!(ratios.get(RatioName::EvToEbitda), None);
        assert_eq!(ratios.get(RatioName::FcfYield), None);
        assert!(ratios.get(RatioName::CurrentRatio).is_some());
    }

    #[test]
    fn test_empty_inputs_give_full_absent_set() {
        let ratios = compute_ratios(None, &Profile::default(), &Statements::default());
        assert_eq!(ratios.iter().count(), RatioName::ALL.len());
        assert_eq!(ratios.available(), 0);
    }

    #[test]
    fn test_set_is_in_display_order() {
        let ratios = compute_ratios(None, &Profile::default(), &Statements::default());
        let names: Vec<RatioName> = ratios.iter().map(|(name, _)| name).collect();
        assert_eq!(names, RatioName::ALL.to_vec());
    }

    #[test]
    fn test_lookup_by_label() {
        let profile = Profile {
            beta: Some(0.9),
            dividend_yield: Some(0.04),
            ..Default::default()
        };
        let ratios = compute_ratios(None, &profile, &Statements::default());
        assert_eq!(ratios.get_by_label("Beta"), Some(0.9));
        assert_eq!(ratios.get_by_label("dividend yield"), Some(0.04));
        assert_eq!(ratios.get_by_label("Unknown"), None);
        assert!("P/E (TTM)".parse::<RatioName>().is_ok());
    }
}
