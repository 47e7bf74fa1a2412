//! Issuer profiles and financial statements from Yahoo Finance.
//!
//! Profiles come from the quote-summary endpoint and are flattened across
//! modules with the first occurrence of a key winning. Statements come from the
//! fundamentals time-series endpoint, one series per concept and frequency, and
//! are mapped to line-item labels through [`SERIES_LABELS`].

use crate::error::{DataError, Result};
use crate::http::HttpClient;
use chrono::{NaiveDate, Utc};
use maple_metrics::{LineItem, PeriodValue, Profile, StatementTable, Statements};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const TIMESERIES_URL: &str =
    "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";

/// Quote-summary modules read, in precedence order.
pub const PROFILE_MODULES: [&str; 5] = [
    "price",
    "summaryDetail",
    "defaultKeyStatistics",
    "financialData",
    "assetProfile",
];

/// Which statement a concept belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// Income statement
    Income,
    /// Balance sheet
    BalanceSheet,
    /// Cash flow statement
    CashFlow,
}

/// Reporting frequency of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// Quarterly periods
    Quarterly,
    /// Fiscal years
    Annual,
}

impl Frequency {
    const fn prefix(&self) -> &'static str {
        match self {
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        }
    }
}

/// Time-series concept, display label and statement, in row order.
///
/// Row order matters for substring label resolution: a label that contains
/// another label's text must come after it (e.g. "Ebit" before "Ebitda").
pub const SERIES_LABELS: &[(&str, &str, StatementKind)] = &[
    ("TotalRevenue", "Total Revenue", StatementKind::Income),
    ("CostOfRevenue", "Cost Of Revenue", StatementKind::Income),
    ("GrossProfit", "Gross Profit", StatementKind::Income),
    ("OperatingExpense", "Operating Expense", StatementKind::Income),
    ("OperatingIncome", "Operating Income", StatementKind::Income),
    ("EBIT", "Ebit", StatementKind::Income),
    ("EBITDA", "Ebitda", StatementKind::Income),
    ("InterestExpense", "Interest Expense", StatementKind::Income),
    (
        "InterestExpenseNonOperating",
        "Interest Expense Non Operating",
        StatementKind::Income,
    ),
    ("PretaxIncome", "Pretax Income", StatementKind::Income),
    ("TaxProvision", "Tax Provision", StatementKind::Income),
    ("NetIncome", "Net Income", StatementKind::Income),
    (
        "NetIncomeCommonStockholders",
        "Net Income Common Stockholders",
        StatementKind::Income,
    ),
    ("BasicEPS", "Basic EPS", StatementKind::Income),
    ("DilutedEPS", "Diluted EPS", StatementKind::Income),
    ("TotalAssets", "Total Assets", StatementKind::BalanceSheet),
    ("CurrentAssets", "Total Current Assets", StatementKind::BalanceSheet),
    (
        "CashAndCashEquivalents",
        "Cash And Cash Equivalents",
        StatementKind::BalanceSheet,
    ),
    ("Receivables", "Receivables", StatementKind::BalanceSheet),
    ("Inventory", "Inventory", StatementKind::BalanceSheet),
    (
        "TotalLiabilitiesNetMinorityInterest",
        "Total Liabilities",
        StatementKind::BalanceSheet,
    ),
    (
        "CurrentLiabilities",
        "Total Current Liabilities",
        StatementKind::BalanceSheet,
    ),
    ("TotalDebt", "Total Debt", StatementKind::BalanceSheet),
    ("LongTermDebt", "Long Term Debt", StatementKind::BalanceSheet),
    (
        "StockholdersEquity",
        "Total Stockholder Equity",
        StatementKind::BalanceSheet,
    ),
    ("RetainedEarnings", "Retained Earnings", StatementKind::BalanceSheet),
    ("OrdinarySharesNumber", "Ordinary Shares Number", StatementKind::BalanceSheet),
    ("OperatingCashFlow", "Operating Cash Flow", StatementKind::CashFlow),
    ("CapitalExpenditure", "Capital Expenditures", StatementKind::CashFlow),
    ("FreeCashFlow", "Free Cash Flow", StatementKind::CashFlow),
    ("InvestingCashFlow", "Investing Cash Flow", StatementKind::CashFlow),
    ("FinancingCashFlow", "Financing Cash Flow", StatementKind::CashFlow),
    ("CashDividendsPaid", "Cash Dividends Paid", StatementKind::CashFlow),
    (
        "RepurchaseOfCapitalStock",
        "Repurchase Of Capital Stock",
        StatementKind::CashFlow,
    ),
];

/// Every time-series type requested for one symbol.
pub fn series_types() -> Vec<String> {
    [Frequency::Quarterly, Frequency::Annual]
        .iter()
        .flat_map(|freq| {
            SERIES_LABELS
                .iter()
                .map(move |(concept, _, _)| format!("{}{concept}", freq.prefix()))
        })
        .collect()
}

/// Read a number from a quote-summary field, unwrapping `{ "raw": x }`.
///
/// Non-finite numbers are treated as absent.
fn raw_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::Object(map) => map.get("raw").and_then(Value::as_f64),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

/// Build a [`Profile`] from a quote-summary response body.
///
/// Modules are read in [`PROFILE_MODULES`] order and the first occurrence of a
/// key wins.
pub fn parse_quote_summary(body: &Value) -> Result<Profile> {
    let result = body
        .pointer("/quoteSummary/result/0")
        .ok_or_else(|| DataError::Parse("quoteSummary has no result".to_string()))?;

    let mut profile = Profile::default();
    for module in PROFILE_MODULES {
        let Some(fields) = result.get(module).and_then(Value::as_object) else {
            continue;
        };
        for (key, value) in fields {
            match value {
                Value::String(text) => profile.set_text(key, text),
                other => {
                    if let Some(number) = raw_number(other) {
                        profile.set_number(key, number);
                    }
                }
            }
        }
    }
    Ok(profile)
}

/// Build [`Statements`] from a fundamentals time-series response body.
///
/// Series with an unknown concept are skipped. Rows follow
/// [`SERIES_LABELS`] order and each row holds its periods most recent first.
pub fn parse_timeseries(body: &Value) -> Result<Statements> {
    let results = body
        .pointer("/timeseries/result")
        .and_then(Value::as_array)
        .ok_or_else(|| DataError::Parse("timeseries has no result".to_string()))?;

    let mut cells: HashMap<(Frequency, &'static str), Vec<PeriodValue>> = HashMap::new();
    for series in results {
        let Some(series_type) = series.pointer("/meta/type/0").and_then(Value::as_str) else {
            continue;
        };
        let (frequency, concept) = if let Some(c) = series_type.strip_prefix("quarterly") {
            (Frequency::Quarterly, c)
        } else if let Some(c) = series_type.strip_prefix("annual") {
            (Frequency::Annual, c)
        } else {
            continue;
        };
        let Some(&(concept, _, _)) = SERIES_LABELS.iter().find(|(c, _, _)| *c == concept) else {
            debug!(series_type, "skipping unknown statement series");
            continue;
        };
        let Some(entries) = series.get(series_type).and_then(Value::as_array) else {
            continue;
        };

        let values = cells.entry((frequency, concept)).or_default();
        for entry in entries {
            let Some(date) = entry
                .get("asOfDate")
                .and_then(Value::as_str)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            else {
                continue;
            };
            let value = entry.get("reportedValue").and_then(raw_number);
            values.push(PeriodValue::new(date, value));
        }
    }

    let table = |frequency: Frequency, kind: StatementKind| {
        let rows = SERIES_LABELS
            .iter()
            .filter(|(_, _, k)| *k == kind)
            .filter_map(|(concept, label, _)| {
                cells
                    .get(&(frequency, *concept))
                    .filter(|values| !values.is_empty())
                    .map(|values| LineItem::new(*label, values.clone()))
            })
            .collect();
        StatementTable::new(rows)
    };

    Ok(Statements {
        income_quarterly: table(Frequency::Quarterly, StatementKind::Income),
        income_annual: table(Frequency::Annual, StatementKind::Income),
        balance_sheet_quarterly: table(Frequency::Quarterly, StatementKind::BalanceSheet),
        balance_sheet_annual: table(Frequency::Annual, StatementKind::BalanceSheet),
        cashflow_quarterly: table(Frequency::Quarterly, StatementKind::CashFlow),
        cashflow_annual: table(Frequency::Annual, StatementKind::CashFlow),
    })
}

/// Yahoo Finance profile and statement provider.
#[derive(Debug)]
pub struct YahooFundamentalsProvider {
    http: HttpClient,
    crumb: Mutex<Option<String>>,
}

impl YahooFundamentalsProvider {
    /// Create a provider on top of a shared HTTP client.
    pub const fn new(http: HttpClient) -> Self {
        Self {
            http,
            crumb: Mutex::const_new(None),
        }
    }

    async fn crumb(&self) -> Result<String> {
        let mut crumb = self.crumb.lock().await;
        if let Some(c) = crumb.as_ref() {
            return Ok(c.clone());
        }
        self.http.touch(COOKIE_URL).await?;
        let fetched = self.http.get_text(CRUMB_URL, &[]).await?.trim().to_string();
        if fetched.is_empty() || fetched.contains('<') {
            return Err(DataError::YahooApi("Could not obtain a crumb".to_string()));
        }
        *crumb = Some(fetched.clone());
        Ok(fetched)
    }

    /// Fetch the profile for `symbol`.
    pub async fn fetch_profile(&self, symbol: &str) -> Result<Profile> {
        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }
        let crumb = self.crumb().await?;
        let url = format!("{QUOTE_SUMMARY_URL}/{symbol}");
        let body: Value = self
            .http
            .get_json(
                &url,
                &[
                    ("modules", PROFILE_MODULES.join(",")),
                    ("crumb", crumb),
                ],
            )
            .await?;
        parse_quote_summary(&body)
    }

    /// Fetch the six statement tables for `symbol`.
    pub async fn fetch_statements(&self, symbol: &str) -> Result<Statements> {
        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }
        let url = format!("{TIMESERIES_URL}/{symbol}");
        let period2 = Utc::now().timestamp();
        let period1 = period2 - 6 * 366 * 86_400;
        let body: Value = self
            .http
            .get_json(
                &url,
                &[
                    ("symbol", symbol.to_string()),
                    ("type", series_types().join(",")),
                    ("period1", period1.to_string()),
                    ("period2", period2.to_string()),
                ],
            )
            .await?;
        parse_timeseries(&body)
    }
}
