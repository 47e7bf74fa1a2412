//! End-to-end checks of the return, statement and ratio layers.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use maple_metrics::{
    LineItem, Normalization, PeriodValue, PriceMatrix, PriceSeries, Profile, RatioName,
    ReturnProfile, StatementTable, Statements, compute_ratios, latest_value, safe_div, ttm_sum,
    windowed_return, year_to_date_return,
};
use rstest::rstest;

fn trading_days(symbol: &str, start: NaiveDate, values: &[f64]) -> PriceSeries {
    PriceSeries::from_pairs(
        symbol,
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + Duration::days(i as i64), *v)),
    )
    .unwrap()
}

fn quarterly(label: &str, values: &[Option<f64>]) -> LineItem {
    let start = NaiveDate::from_ymd_opt(2022, 3, 31).unwrap();
    LineItem::new(
        label,
        values
            .iter()
            .enumerate()
            .map(|(i, v)| PeriodValue::new(start + Duration::days(91 * i as i64), *v))
            .collect(),
    )
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(3)]
fn test_window_absent_when_too_short(#[case] extra_missing: usize) {
    let mut values = vec![10.0, 11.0, 12.0];
    values.extend(std::iter::repeat_n(f64::NAN, extra_missing));
    let series = trading_days("CNQ.TO", NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(), &values);
    assert_eq!(windowed_return(&series, 3), None);
    assert_relative_eq!(windowed_return(&series, 2).unwrap(), 0.2, epsilon = 1e-12);
}

#[test]
fn test_reference_series_windows() {
    let series = trading_days(
        "RY.TO",
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        &[100.0, 102.0, 101.0, 105.0, 110.0],
    );
    assert_relative_eq!(windowed_return(&series, 1).unwrap(), 110.0 / 105.0 - 1.0);
    assert_relative_eq!(windowed_return(&series, 4).unwrap(), 0.10, epsilon = 1e-12);
    assert_eq!(windowed_return(&series, 5), None);
}

#[test]
fn test_ytd_one_and_two_points() {
    let as_of = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
    let one = trading_days("SU.TO", NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(), &[42.0]);
    assert_eq!(year_to_date_return(&one, as_of), None);
    let two = trading_days("SU.TO", NaiveDate::from_ymd_opt(2024, 2, 14).unwrap(), &[40.0, 42.0]);
    assert_relative_eq!(year_to_date_return(&two, as_of).unwrap(), 0.05, epsilon = 1e-12);
}

#[test]
fn test_return_profile_over_a_year_of_data() {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let values: Vec<f64> = (0..400).map(|i| 100.0 + i as f64 * 0.1).collect();
    let series = trading_days("BNS.TO", start, &values);
    let as_of = series.last_observed().unwrap().date;
    let profile = ReturnProfile::compute(&series, as_of);
    assert!(profile.one_year.is_some());
    assert!(profile.ytd.is_some());
    assert_relative_eq!(profile.one_day.unwrap(), 139.9 / 139.8 - 1.0, epsilon = 1e-12);
}

#[test]
fn test_ttm_independent_of_older_columns() {
    let recent = [Some(10.0), Some(20.0), Some(30.0), Some(40.0)];
    let mut with_history = vec![Some(1_000.0), Some(2_000.0)];
    with_history.extend(recent);

    let short = StatementTable::new(vec![quarterly("Net Income", &recent)]);
    let long = StatementTable::new(vec![quarterly("Net Income", &with_history)]);

    assert_eq!(ttm_sum(&short, &["net income"]), Some(100.0));
    assert_eq!(ttm_sum(&long, &["net income"]), Some(100.0));

    let three = StatementTable::new(vec![quarterly("Net Income", &recent[1..])]);
    assert_eq!(ttm_sum(&three, &["net income"]), None);
    assert_eq!(latest_value(&three, &["net income"]), Some(40.0));
}

#[test]
fn test_provider_trailing_pe_ignores_statements() {
    let profile = Profile {
        trailing_pe: Some(12.5),
        ..Default::default()
    };
    let statements = Statements {
        income_quarterly: StatementTable::new(vec![quarterly(
            "Net Income",
            &[Some(1.0), Some(1.0), Some(1.0), Some(1.0)],
        )]),
        ..Default::default()
    };
    for stmts in [&statements, &Statements::default()] {
        let ratios = compute_ratios(Some(99.0), &profile, stmts);
        assert_eq!(ratios.get_by_label("P/E (TTM)"), Some(12.5));
    }
}

#[test]
fn test_pe_from_net_income() {
    let profile = Profile {
        shares_outstanding: Some(100.0),
        ..Default::default()
    };
    let statements = Statements {
        income_quarterly: StatementTable::new(vec![quarterly(
            "Net Income",
            &[Some(50.0), Some(60.0), Some(70.0), Some(70.0)],
        )]),
        ..Default::default()
    };
    let ratios = compute_ratios(Some(10.0), &profile, &statements);
    assert_relative_eq!(ratios.get(RatioName::PriceToEarnings).unwrap(), 4.0);
}

#[test]
fn test_safe_div_edges() {
    assert_eq!(safe_div(Some(1.0), Some(0.0)), None);
    assert_eq!(safe_div(None, Some(1.0)), None);
}

#[test]
fn test_comparator_pipeline() {
    let start = NaiveDate::from_ymd_opt(2023, 12, 27).unwrap();
    let a = trading_days("ENB.TO", start, &[50.0, 51.0, 52.0, 53.0, 54.0, 55.0, 56.0]);
    let b = trading_days("^GSPTSE", start + Duration::days(1), &[100.0, f64::NAN, 104.0, 105.0]);
    let matrix = PriceMatrix::align(&[a, b])
        .forward_filled()
        .drop_empty_rows()
        .since(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .normalized(Normalization::CumulativePercent);

    let last = matrix.last_row();
    assert_relative_eq!(last[0].1.unwrap(), (56.0 / 55.0 - 1.0) * 100.0, epsilon = 1e-9);
    assert_relative_eq!(last[1].1.unwrap(), (105.0 / 105.0 - 1.0) * 100.0, epsilon = 1e-9);
}
