//! Integration tests for the screener, stock report and exports.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use maple_data::UniverseRow;
use maple_metrics::{LineItem, PeriodValue, PriceSeries, Profile, StatementTable, Statements};
use maple_output::{
    ExportFormat, Exporter, ScreenerEntry, ScreenerTable, SortColumn, StockReport,
};
use std::collections::HashMap;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
}

/// Daily series ending on `as_of` growing by `step` per session.
fn trending(symbol: &str, sessions: usize, start: f64, step: f64) -> PriceSeries {
    let first = as_of() - Duration::days(sessions as i64 - 1);
    PriceSeries::from_pairs(
        symbol,
        (0..sessions).map(|i| (first + Duration::days(i as i64), start + step * i as f64)),
    )
    .unwrap()
}

fn universe() -> Vec<UniverseRow> {
    [
        ("RY.TO", "Royal Bank of Canada", "Financials"),
        ("ENB.TO", "Enbridge", "Energy"),
        ("SHOP.TO", "Shopify", "Information Technology"),
        ("NEW.TO", "Newly Listed", "Energy"),
    ]
    .into_iter()
    .map(|(symbol, name, sector)| UniverseRow {
        symbol: symbol.to_string(),
        name: Some(name.to_string()),
        sector: Some(sector.to_string()),
        industry: None,
    })
    .collect()
}

#[test]
fn test_screener_workflow() {
    let entries: Vec<ScreenerEntry> = universe().iter().map(ScreenerEntry::from).collect();
    let prices = HashMap::from([
        ("RY.TO".to_string(), trending("RY.TO", 300, 100.0, 0.1)),
        ("ENB.TO".to_string(), trending("ENB.TO", 300, 50.0, -0.05)),
        ("SHOP.TO".to_string(), trending("SHOP.TO", 300, 80.0, 0.5)),
        ("NEW.TO".to_string(), trending("NEW.TO", 10, 20.0, 1.0)),
    ]);

    let mut table = ScreenerTable::build(&entries, &prices, as_of());
    assert_eq!(table.len(), 4);

    table.sort_by(SortColumn::OneYear, false);
    let order: Vec<_> = table.rows().iter().map(|r| r.ticker.as_str()).collect();
    // Ten sessions of history cannot produce a 1Y return
    assert_eq!(order, vec!["SHOP.TO", "RY.TO", "ENB.TO", "NEW.TO"]);

    let shop = &table.rows()[0];
    assert_eq!(shop.name.as_deref(), Some("Shopify"));
    assert_relative_eq!(shop.last_price.unwrap(), 80.0 + 0.5 * 299.0);
    let expected = ((229.5_f64 / (229.5 - 0.5 * 252.0) - 1.0) * 10_000.0).round() / 100.0;
    assert_relative_eq!(shop.one_year.unwrap(), expected);

    let ascii = table.to_ascii_table(2);
    assert!(ascii.contains("SHOP.TO"));
    assert!(!ascii.contains("ENB.TO"));

    // Export covers every row regardless of the display limit
    let csv = table.export_to_string(ExportFormat::Csv).unwrap();
    assert_eq!(csv.lines().count(), 5);
}

#[test]
fn test_stock_report_with_statement_fallbacks() {
    let quarter = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
    let quarterly = |label: &str, values: [f64; 4]| {
        StatementTable::new(vec![LineItem::new(
            label,
            [quarter(3, 31), quarter(6, 30), quarter(9, 30), quarter(12, 31)]
                .into_iter()
                .zip(values)
                .map(|(date, v)| PeriodValue::new(date, Some(v)))
                .collect(),
        )])
    };
    let statements = Statements {
        income_quarterly: quarterly("Net Income", [5.0, 5.0, 5.0, 5.0]),
        balance_sheet_quarterly: quarterly("Stockholders Equity", [90.0, 95.0, 98.0, 100.0]),
        ..Statements::default()
    };
    let profile = Profile {
        short_name: Some("Royal Bank".to_string()),
        currency: Some("CAD".to_string()),
        shares_outstanding: Some(10.0),
        ..Profile::default()
    };
    let prices = trending("RY.TO", 300, 100.0, 0.0);

    let report = StockReport::build("RY.TO", &prices, None, profile, &statements, as_of());

    assert_eq!(report.title(), "Royal Bank");
    assert_eq!(report.benchmark, None);
    assert_eq!(report.statements[0].columns, vec!["TTM"]);
    assert_eq!(report.statements[0].rows[0].1, vec![Some(20.0)]);
    assert_eq!(report.statements[1].columns, vec!["Latest quarter"]);
    assert_eq!(report.statements[1].rows[0].1, vec![Some(100.0)]);
    assert!(report.statements[2].is_empty());

    let csv = report.export_to_string(ExportFormat::Csv).unwrap();
    assert!(csv.starts_with("section,item,period,value\n"));
    assert!(csv.contains("kpi,last_price,,100"));
    assert!(csv.contains("Income Statement,Net Income,TTM,20"));

    let json = report.export_to_string(ExportFormat::Json).unwrap();
    assert!(json.contains("\"symbol\":\"RY.TO\""));
}
