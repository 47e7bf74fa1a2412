//! Stock detail report: KPIs, profile, ratios and statement previews.

use crate::format::{
    NOT_AVAILABLE, format_percent, format_price, format_ratio, format_thousands, truncate,
};
use chrono::{DateTime, NaiveDate, Utc};
use maple_metrics::{
    Normalization, PriceMatrix, PriceSeries, Profile, RatioSet, ReturnProfile, StatementTable,
    Statements, compute_ratios,
};
use serde::{Deserialize, Serialize};

/// Number of annual columns shown in a statement preview.
pub const PREVIEW_COLUMNS: usize = 4;

/// Headline figures of a stock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    /// Last adjusted close
    pub last_price: Option<f64>,
    /// Quote currency
    pub currency: Option<String>,
    /// 1-month return
    pub one_month: Option<f64>,
    /// Year-to-date return
    pub ytd: Option<f64>,
    /// 1-year return
    pub one_year: Option<f64>,
}

impl Kpis {
    /// Compute the KPI block from a price series.
    pub fn compute(series: &PriceSeries, currency: Option<String>, as_of: NaiveDate) -> Self {
        let returns = ReturnProfile::compute(series, as_of);
        Self {
            last_price: series.last_observed().map(|p| p.value),
            currency,
            one_month: returns.one_month,
            ytd: returns.ytd,
            one_year: returns.one_year,
        }
    }
}

/// One line of the ratio table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioRow {
    /// Display label
    pub label: String,
    /// Raw value
    pub value: Option<f64>,
    /// Formatted value
    pub display: String,
}

impl RatioRow {
    /// Rows for every ratio in display order.
    pub fn from_set(ratios: &RatioSet) -> Vec<Self> {
        ratios
            .iter()
            .map(|(name, value)| Self {
                label: name.label().to_string(),
                value,
                display: format_ratio(name, value),
            })
            .collect()
    }
}

/// Compact view of one statement.
///
/// Shows the most recent annual columns. When no annual data exists it falls
/// back to a single column derived from the quarterly table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementPreview {
    /// Statement name
    pub title: String,
    /// Column headers
    pub columns: Vec<String>,
    /// Line items with one value per column
    pub rows: Vec<(String, Vec<Option<f64>>)>,
    /// Explanation when a fallback column is shown
    pub note: Option<String>,
}

impl StatementPreview {
    /// Most recent `max_columns` periods of `table`.
    fn from_table(title: &str, table: &StatementTable, max_columns: usize) -> Self {
        let periods: Vec<NaiveDate> = table.periods().into_iter().take(max_columns).collect();
        let rows = table
            .rows()
            .iter()
            .map(|row| {
                let values = periods.iter().map(|p| row.value_at(*p)).collect();
                (row.label.clone(), values)
            })
            .collect();
        Self {
            title: title.to_string(),
            columns: periods.iter().map(NaiveDate::to_string).collect(),
            rows,
            note: None,
        }
    }

    /// Annual flows, or the trailing twelve months summed from quarters.
    pub fn annual_or_ttm(
        title: &str,
        annual: &StatementTable,
        quarterly: &StatementTable,
        max_columns: usize,
    ) -> Self {
        if !annual.is_empty() {
            return Self::from_table(title, annual, max_columns);
        }
        quarterly.ttm_column().map_or_else(
            || Self::empty(title),
            |column| Self {
                title: title.to_string(),
                columns: vec!["TTM".to_string()],
                rows: column
                    .into_iter()
                    .map(|(label, value)| (label, vec![value]))
                    .collect(),
                note: Some("TTM summed from the last 4 quarters".to_string()),
            },
        )
    }

    /// Annual balance sheet, or the latest quarterly one.
    pub fn annual_or_latest_quarter(
        title: &str,
        annual: &StatementTable,
        quarterly: &StatementTable,
        max_columns: usize,
    ) -> Self {
        if !annual.is_empty() {
            return Self::from_table(title, annual, max_columns);
        }
        if quarterly.is_empty() {
            return Self::empty(title);
        }
        let mut preview = Self::from_table(title, quarterly, 1);
        preview.columns = vec!["Latest quarter".to_string()];
        preview.note = Some("latest quarterly balance sheet".to_string());
        preview
    }

    fn empty(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    /// Whether there is nothing to show.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Plain-text rendering with thousands separators.
    pub fn to_ascii_table(&self) -> String {
        let mut output = format!("\n{}\n", self.title);
        if self.is_empty() {
            output.push_str("  not available\n");
            return output;
        }
        if let Some(note) = &self.note {
            output.push_str(&format!("  ({note})\n"));
        }
        output.push_str(&format!("  {:<36}", "Line item"));
        for column in &self.columns {
            output.push_str(&format!(" {column:>18}"));
        }
        output.push('\n');
        for (label, values) in &self.rows {
            output.push_str(&format!("  {:<36}", truncate(label, 36)));
            for value in values {
                output.push_str(&format!(" {:>18}", format_thousands(*value)));
            }
            output.push('\n');
        }
        output
    }
}

/// Everything shown for one stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReport {
    /// Symbol
    pub symbol: String,
    /// Report generation time
    pub generated_at: DateTime<Utc>,
    /// Provider profile
    pub profile: Profile,
    /// Headline figures
    pub kpis: Kpis,
    /// Cumulative return of the stock over the downloaded history
    pub cumulative_return: Option<f64>,
    /// Benchmark symbol and its cumulative return over the same dates
    pub benchmark: Option<(String, Option<f64>)>,
    /// Ratio table
    pub ratios: Vec<RatioRow>,
    /// Income, balance sheet and cash flow previews
    pub statements: Vec<StatementPreview>,
}

impl StockReport {
    /// Assemble the report. Ratios use the last observed price.
    pub fn build(
        symbol: impl Into<String>,
        prices: &PriceSeries,
        benchmark: Option<&PriceSeries>,
        profile: Profile,
        statements: &Statements,
        as_of: NaiveDate,
    ) -> Self {
        let kpis = Kpis::compute(prices, profile.currency.clone(), as_of);
        let ratios = compute_ratios(kpis.last_price, &profile, statements);

        let mut aligned = vec![prices.clone()];
        aligned.extend(benchmark.cloned());
        let cumulative = PriceMatrix::align(&aligned)
            .forward_filled()
            .drop_empty_rows()
            .normalized(Normalization::CumulativePercent)
            .last_row();
        let cumulative_of = |symbol: &str| {
            cumulative
                .iter()
                .find(|(s, _)| s == symbol)
                .and_then(|(_, v)| *v)
                .map(|pct| pct / 100.0)
        };

        Self {
            symbol: symbol.into(),
            generated_at: Utc::now(),
            cumulative_return: cumulative_of(prices.symbol()),
            benchmark: benchmark.map(|b| (b.symbol().to_string(), cumulative_of(b.symbol()))),
            kpis,
            ratios: RatioRow::from_set(&ratios),
            statements: vec![
                StatementPreview::annual_or_ttm(
                    "Income Statement",
                    &statements.income_annual,
                    &statements.income_quarterly,
                    PREVIEW_COLUMNS,
                ),
                StatementPreview::annual_or_latest_quarter(
                    "Balance Sheet",
                    &statements.balance_sheet_annual,
                    &statements.balance_sheet_quarterly,
                    PREVIEW_COLUMNS,
                ),
                StatementPreview::annual_or_ttm(
                    "Cash Flow",
                    &statements.cashflow_annual,
                    &statements.cashflow_quarterly,
                    PREVIEW_COLUMNS,
                ),
            ],
            profile,
        }
    }

    /// Company name, or the symbol.
    pub fn title(&self) -> &str {
        self.profile.display_name().unwrap_or(&self.symbol)
    }

    /// Plain-text rendering of the full report.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{} ({})\n", self.title(), self.symbol));
        output.push_str(&"=".repeat(60));
        output.push('\n');

        let meta: Vec<String> = [
            self.profile.sector.as_ref().map(|s| format!("Sector: {s}")),
            self.profile.industry.as_ref().map(|s| format!("Industry: {s}")),
            self.profile.website.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !meta.is_empty() {
            output.push_str(&format!("{}\n", meta.join(" | ")));
        }

        output.push_str(&format!(
            "\n{:<22} {:>16}\n",
            "Last price (adjusted)",
            format_price(self.kpis.last_price, self.kpis.currency.as_deref())
        ));
        output.push_str(&format!("{:<22} {:>16}\n", "1 month", format_percent(self.kpis.one_month)));
        output.push_str(&format!("{:<22} {:>16}\n", "YTD", format_percent(self.kpis.ytd)));
        output.push_str(&format!("{:<22} {:>16}\n", "1 year", format_percent(self.kpis.one_year)));
        output.push_str(&format!(
            "{:<22} {:>16}\n",
            "Cumulative",
            format_percent(self.cumulative_return)
        ));
        if let Some((symbol, value)) = &self.benchmark {
            output.push_str(&format!(
                "{:<22} {:>16}\n",
                format!("Benchmark {symbol}"),
                format_percent(*value)
            ));
        }

        output.push_str("\nKey ratios\n");
        output.push_str(&format!("{:<22} {:>16}\n", "Ratio", "Value"));
        output.push_str(&"-".repeat(39));
        output.push('\n');
        for row in &self.ratios {
            output.push_str(&format!("{:<22} {:>16}\n", row.label, row.display));
        }

        for preview in &self.statements {
            output.push_str(&preview.to_ascii_table());
        }

        if let Some(summary) = &self.profile.long_business_summary {
            output.push_str(&format!("\n{}\n", truncate(summary, 600)));
        }
        output
    }

    /// Markdown rendering of the KPI block and ratio table.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("# {} ({})\n\n", self.title(), self.symbol));
        output.push_str(&format!(
            "- **Last price:** {}\n",
            format_price(self.kpis.last_price, self.kpis.currency.as_deref())
        ));
        output.push_str(&format!("- **1 month:** {}\n", format_percent(self.kpis.one_month)));
        output.push_str(&format!("- **YTD:** {}\n", format_percent(self.kpis.ytd)));
        output.push_str(&format!("- **1 year:** {}\n\n", format_percent(self.kpis.one_year)));

        output.push_str("| Ratio | Value |\n");
        output.push_str("|-------|------:|\n");
        for row in &self.ratios {
            output.push_str(&format!("| {} | {} |\n", row.label, row.display));
        }
        let available = self.ratios.iter().filter(|r| r.value.is_some()).count();
        if available == 0 {
            output.push_str(&format!("\nRatios {NOT_AVAILABLE}.\n"));
        }
        output
    }
}
