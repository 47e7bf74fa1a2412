//! Financial news from RSS and Atom feeds.

pub mod feed;
pub mod rss;

pub use feed::{DEFAULT_LIMIT, NewsFeed, rank_items, score_item};
pub use rss::{NewsItem, parse_feed, strip_html};
