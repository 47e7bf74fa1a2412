//! CSV and JSON export of screener results and reports.

use crate::compare::ComparisonReport;
use crate::market::MarketOverview;
use crate::news::NewsDigest;
use crate::report::StockReport;
use crate::screener::ScreenerTable;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized output was not valid UTF-8.
    #[error("Invalid UTF-8 in output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Infer the format from a file extension; JSON files are pretty-printed.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::PrettyJson),
            _ => Err(ExportError::InvalidFormat(format!(
                "cannot infer export format from '{}'",
                path.display()
            ))),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_from_records<T: Serialize>(records: impl IntoIterator<Item = T>) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn json<T: Serialize + ?Sized>(value: &T, format: ExportFormat) -> Result<String, ExportError> {
    Ok(match format {
        ExportFormat::PrettyJson => serde_json::to_string_pretty(value)?,
        _ => serde_json::to_string(value)?,
    })
}

impl Exporter for ScreenerTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_from_records(self.rows()),
            _ => json(self.rows(), format),
        }
    }
}

impl Exporter for ComparisonReport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        if format != ExportFormat::Csv {
            return json(self, format);
        }
        let mut wtr = csv::Writer::from_writer(vec![]);
        let mut header = vec!["Date".to_string()];
        header.extend(self.symbols.iter().cloned());
        wtr.write_record(&header)?;
        for (date, row) in self.dates.iter().zip(&self.values) {
            let mut record = vec![date.to_string()];
            record.extend(row.iter().map(|v| v.map(|v| v.to_string()).unwrap_or_default()));
            wtr.write_record(&record)?;
        }
        let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }
}

/// Flattened report value for CSV export.
#[derive(Debug, Serialize)]
struct ReportRecord<'a> {
    section: &'a str,
    item: &'a str,
    period: &'a str,
    value: Option<f64>,
}

impl StockReport {
    fn to_flat_records(&self) -> Vec<ReportRecord<'_>> {
        let kpi = |item, value| ReportRecord {
            section: "kpi",
            item,
            period: "",
            value,
        };
        let mut records = vec![
            kpi("last_price", self.kpis.last_price),
            kpi("return_1m", self.kpis.one_month),
            kpi("return_ytd", self.kpis.ytd),
            kpi("return_1y", self.kpis.one_year),
        ];
        records.extend(self.ratios.iter().map(|r| ReportRecord {
            section: "ratio",
            item: &r.label,
            period: "",
            value: r.value,
        }));
        for preview in &self.statements {
            for (label, values) in &preview.rows {
                for (period, value) in preview.columns.iter().zip(values) {
                    records.push(ReportRecord {
                        section: &preview.title,
                        item: label,
                        period,
                        value: *value,
                    });
                }
            }
        }
        records
    }
}

impl Exporter for StockReport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_from_records(self.to_flat_records()),
            _ => json(self, format),
        }
    }
}

/// Flattened overview line for CSV export.
#[derive(Debug, Serialize)]
struct OverviewRecord<'a> {
    section: &'a str,
    symbol: &'a str,
    last: Option<f64>,
    one_day: Option<f64>,
    ytd: Option<f64>,
}

impl Exporter for MarketOverview {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        if format != ExportFormat::Csv {
            return json(self, format);
        }
        let cards = self
            .indices
            .iter()
            .map(|c| ("index", c))
            .chain(self.macro_indicators.iter().map(|c| ("macro", c)))
            .map(|(section, card)| OverviewRecord {
                section,
                symbol: &card.symbol,
                last: card.snapshot.and_then(|s| s.last),
                one_day: card.snapshot.and_then(|s| s.one_day),
                ytd: card.snapshot.and_then(|s| s.ytd),
            });
        let movers = self.movers.iter().map(|m| OverviewRecord {
            section: "mover",
            symbol: &m.symbol,
            last: None,
            one_day: Some(m.one_day),
            ytd: None,
        });
        csv_from_records(cards.chain(movers))
    }
}

impl Exporter for NewsDigest {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_from_records(&self.items),
            _ => json(self, format),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screener::ScreenerRow;
    use chrono::NaiveDate;
    use maple_metrics::{Normalization, PriceSeries};
    use rstest::rstest;
    use std::io::Read;

    fn screener() -> ScreenerTable {
        ScreenerTable::from_rows(vec![ScreenerRow {
            ticker: "RY.TO".to_string(),
            name: Some("Royal Bank of Canada".to_string()),
            sector: Some("Financials".to_string()),
            one_day: Some(0.52),
            one_week: None,
            one_month: Some(3.1),
            three_months: None,
            six_months: None,
            one_year: Some(18.25),
            ytd: Some(9.4),
            last_price: Some(142.1),
        }])
    }

    #[test]
    fn test_screener_csv_headers_and_blanks() {
        let csv = screener().export_to_string(ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Ticker,Name,Sector,1D %,1W %,1M %,3M %,6M %,1Y %,YTD %,Last Price"
        );
        assert_eq!(
            lines.next().unwrap(),
            "RY.TO,Royal Bank of Canada,Financials,0.52,,3.1,,,18.25,9.4,142.1"
        );
    }

    #[test]
    fn test_screener_json() {
        let json = screener().export_to_string(ExportFormat::Json).unwrap();
        assert!(json.contains("\"Ticker\":\"RY.TO\""));
        assert!(json.contains("\"1W %\":null"));

        let pretty = screener().export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(pretty.contains("  "));
    }

    #[test]
    fn test_comparison_csv() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let series = PriceSeries::from_pairs("RY.TO", [(d(2), 100.0), (d(3), 150.0)]).unwrap();
        let report = ComparisonReport::build(&[series], None, Normalization::Base100);
        let csv = report.export_to_string(ExportFormat::Csv).unwrap();
        assert_eq!(csv, "Date,RY.TO\n2024-01-02,100\n2024-01-03,150\n");
    }

    #[rstest]
    #[case("csv", ExportFormat::Csv)]
    #[case("JSON", ExportFormat::Json)]
    #[case("pretty-json", ExportFormat::PrettyJson)]
    fn test_export_format_from_str(#[case] input: &str, #[case] expected: ExportFormat) {
        assert_eq!(input.parse::<ExportFormat>().unwrap(), expected);
    }

    #[test]
    fn test_export_format_from_path() {
        assert_eq!(
            ExportFormat::from_path(Path::new("tsx_screener.csv")).unwrap(),
            ExportFormat::Csv
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("report.JSON")).unwrap(),
            ExportFormat::PrettyJson
        );
        assert!(matches!(
            ExportFormat::from_path(Path::new("report.xlsx")),
            Err(ExportError::InvalidFormat(_))
        ));
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }

    #[test]
    fn test_export_to_file() {
        let path = std::env::temp_dir().join("maple_screener_export_test.csv");
        screener().export_to_file(&path, ExportFormat::Csv).unwrap();

        let mut content = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert!(content.contains("RY.TO"));

        std::fs::remove_file(path).ok();
    }
}
