#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/maple/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod compare;
pub mod export;
pub mod format;
pub mod market;
pub mod news;
pub mod report;
pub mod screener;

pub use compare::ComparisonReport;
pub use export::{ExportError, ExportFormat, Exporter};
pub use market::MarketOverview;
pub use news::{NewsDigest, human_time};
pub use report::{Kpis, RatioRow, StockReport};
pub use screener::{ScreenerEntry, ScreenerRow, ScreenerTable, SortColumn};
