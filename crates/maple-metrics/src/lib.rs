#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/maple/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod compare;
pub mod error;
pub mod market;
pub mod profile;
pub mod ratios;
pub mod returns;
pub mod series;
pub mod statements;

pub use compare::{Normalization, PriceMatrix};
pub use error::{MetricsError, Result};
pub use market::{Breadth, IndexSnapshot, Mover, advancers_decliners, index_snapshot, top_movers};
pub use profile::Profile;
pub use ratios::{RATIO_RULES, RatioInputs, RatioName, RatioRule, RatioSet, compute_ratios, safe_div};
pub use returns::{ReturnProfile, ReturnWindow, windowed_return, year_to_date_return};
pub use series::{PricePoint, PriceSeries};
pub use statements::{
    LineItem, PeriodValue, StatementTable, Statements, latest_value, resolve_line_item, ttm_sum,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
