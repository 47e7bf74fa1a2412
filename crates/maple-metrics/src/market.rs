//! Market overview: index snapshot, breadth and top movers.

use crate::compare::PriceMatrix;
use crate::ratios::safe_div;
use crate::returns::{windowed_return, year_to_date_return};
use crate::series::PriceSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Headline figures for a benchmark index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Last observed level
    pub last: Option<f64>,
    /// 1-day return
    pub one_day: Option<f64>,
    /// Year-to-date return
    pub ytd: Option<f64>,
}

/// Summarize an index series as of `as_of`.
pub fn index_snapshot(series: &PriceSeries, as_of: NaiveDate) -> IndexSnapshot {
    IndexSnapshot {
        last: series.last_observed().map(|p| p.value),
        one_day: windowed_return(series, 1),
        ytd: year_to_date_return(series, as_of),
    }
}

/// Count of rising and falling symbols over the last session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadth {
    /// Symbols up on the day
    pub advancers: usize,
    /// Symbols down on the day
    pub decliners: usize,
}

/// One-day return of each symbol between the last two aligned dates.
///
/// Series are aligned on a common calendar and forward-filled first. Returns an
/// empty list when fewer than two dates exist.
fn last_session_returns(series: &[PriceSeries]) -> Vec<(String, Option<f64>)> {
    let matrix = PriceMatrix::align(series).forward_filled();
    let rows = matrix.len();
    if rows < 2 {
        return Vec::new();
    }
    let values = matrix.values();
    matrix
        .symbols()
        .iter()
        .enumerate()
        .map(|(j, symbol)| {
            let previous = Some(values[[rows - 2, j]]).filter(|v| !v.is_nan());
            let last = Some(values[[rows - 1, j]]).filter(|v| !v.is_nan());
            (symbol.clone(), safe_div(last, previous).map(|r| r - 1.0))
        })
        .collect()
}

/// Count advancers and decliners over the last session. Unchanged and
/// undefined returns count in neither.
pub fn advancers_decliners(series: &[PriceSeries]) -> Breadth {
    last_session_returns(series)
        .into_iter()
        .filter_map(|(_, r)| r)
        .fold(Breadth::default(), |mut breadth, r| {
            if r > 0.0 {
                breadth.advancers += 1;
            } else if r < 0.0 {
                breadth.decliners += 1;
            }
            breadth
        })
}

/// A symbol and its last-session return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    /// Symbol
    pub symbol: String,
    /// 1-day return
    pub one_day: f64,
}

/// Best `n` performers followed by the worst `n`, by last-session return.
///
/// Symbols without a defined return are excluded. Results are in descending
/// return order and never repeat a symbol.
pub fn top_movers(series: &[PriceSeries], n: usize) -> Vec<Mover> {
    let mut movers: Vec<Mover> = last_session_returns(series)
        .into_iter()
        .filter_map(|(symbol, r)| r.map(|one_day| Mover { symbol, one_day }))
        .collect();
    movers.sort_by(|a, b| b.one_day.total_cmp(&a.one_day));
    if movers.len() > 2 * n {
        let worst = movers.split_off(movers.len() - n);
        movers.truncate(n);
        movers.extend(worst);
    }
    movers
}
