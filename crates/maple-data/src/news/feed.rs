//! Headline aggregation with French and Canadian content ranked first.

use crate::error::Result;
use crate::http::HttpClient;
use crate::news::rss::{NewsItem, parse_feed};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::{debug, warn};

/// French-language feeds, fetched first.
pub const FRENCH_FEEDS: [&str; 2] = [
    "https://fr.finance.yahoo.com/actualites/rssindex",
    "https://fr.finance.yahoo.com/news/rssindex",
];

/// English feeds (Canada, then global).
pub const ENGLISH_FEEDS: [&str; 2] = [
    "https://ca.finance.yahoo.com/news/rssindex",
    "https://finance.yahoo.com/news/rssindex",
];

/// Default number of headlines returned.
pub const DEFAULT_LIMIT: usize = 40;

/// Score at which an item is ranked ahead of all others.
pub const PREFERRED_SCORE: i32 = 50;

const FRENCH_HINTS: &[&str] = &[
    " le ", " la ", " les ", " des ", " aux ", " du ", " de ", " bourse", " action",
    " obligations", " dividende", "rendement", " économie", " croissance", " inflation",
    " récession", " québec", " montréal", " toronto", " ottawa", " vancouver", " calgary",
    " dollar canadien", " cad ", " tsx", " gsp",
];

const CANADA_HINTS: &[&str] = &[
    " canada", " canadien", " canadienne", " toronto", " ottawa", " québec", " vancouver",
    " alberta", " ontario", " saskatchewan", " manitoba", " tsx", ".to", " cad ",
    " banque du canada", " boc", " gsp", " royal bank of canada", " rbc", " td bank",
    " scotiabank", " bmo", " cibc", " enbridge", " suncor", " canadian natural", " cnq",
    " shopify", " bell", " bce", " rogers", " telus", " bombardier", " air canada",
];

fn padded_lowercase(text: &str) -> String {
    format!(" {} ", text.to_lowercase())
}

/// Whether `text` reads like French: function words, market vocabulary or accents.
pub fn is_french_like(text: &str) -> bool {
    let text = padded_lowercase(text);
    FRENCH_HINTS.iter().any(|hint| text.contains(hint))
        || text.chars().any(|c| matches!(c, 'é' | 'è' | 'ê' | 'à' | 'ù' | 'ç'))
}

/// Whether a headline is about Canada or comes from a Canadian outlet.
pub fn is_canada_focused(text: &str, source: &str) -> bool {
    let text = padded_lowercase(text);
    CANADA_HINTS.iter().any(|hint| text.contains(hint))
        || source.ends_with(".ca")
        || source.contains("ca.finance.yahoo.com")
}

/// Ranking score of a headline.
///
/// French source +50, French-looking text +25, Canada focus +40, dated +1.
pub fn score_item(item: &NewsItem) -> i32 {
    let text = format!("{} {}", item.title, item.summary);
    let source = item.source.to_lowercase();

    let mut score = 0;
    if source.contains("fr.finance.yahoo.com") || source.starts_with("fr.") {
        score += 50;
    }
    if is_french_like(&text) {
        score += 25;
    }
    if is_canada_focused(&text, &source) {
        score += 40;
    }
    if item.published.is_some() {
        score += 1;
    }
    score
}

/// Order headlines: preferred (score >= 50) first, each group by score then date,
/// most recent first, truncated to `limit`.
pub fn rank_items(items: Vec<NewsItem>, limit: usize) -> Vec<NewsItem> {
    let (mut preferred, mut others): (Vec<_>, Vec<_>) = items
        .into_iter()
        .map(|item| (score_item(&item), item))
        .partition(|(score, _)| *score >= PREFERRED_SCORE);

    let key = |entry: &(i32, NewsItem)| {
        Reverse((entry.0, entry.1.published.unwrap_or(DateTime::<Utc>::MIN_UTC)))
    };
    preferred.sort_by_key(key);
    others.sort_by_key(key);

    preferred
        .into_iter()
        .chain(others)
        .map(|(_, item)| item)
        .take(limit)
        .collect()
}

/// Collects distinct headlines across feeds up to a cap.
#[derive(Debug, Default)]
struct Collector {
    items: Vec<NewsItem>,
    seen: HashSet<String>,
}

impl Collector {
    fn extend(&mut self, batch: Vec<NewsItem>, cap: usize) {
        for item in batch {
            if self.items.len() >= cap {
                break;
            }
            if self.seen.insert(item.link.clone()) {
                self.items.push(item);
            }
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Fetches and ranks headlines from French and English RSS feeds.
#[derive(Debug, Clone)]
pub struct NewsFeed {
    http: HttpClient,
    french_feeds: Vec<String>,
    english_feeds: Vec<String>,
}

impl NewsFeed {
    /// Create an aggregator over the default Yahoo Finance feeds.
    pub fn new(http: HttpClient) -> Self {
        Self::with_feeds(
            http,
            FRENCH_FEEDS.iter().map(|s| s.to_string()).collect(),
            ENGLISH_FEEDS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Create an aggregator over custom feed URLs.
    pub const fn with_feeds(
        http: HttpClient,
        french_feeds: Vec<String>,
        english_feeds: Vec<String>,
    ) -> Self {
        Self {
            http,
            french_feeds,
            english_feeds,
        }
    }

    /// Fetch and parse a single feed.
    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<NewsItem>> {
        let body = self.http.get_text(url, &[]).await?;
        let items = parse_feed(&body)?;
        debug!(url, items = items.len(), "parsed feed");
        Ok(items)
    }

    async fn fetch_or_empty(&self, url: &str) -> Vec<NewsItem> {
        match self.fetch_feed(url).await {
            Ok(items) => items,
            Err(e) => {
                warn!(url, error = %e, "failed to fetch news feed");
                Vec::new()
            }
        }
    }

    /// Fetch the ranked headline list.
    ///
    /// French feeds are read until `2 * limit` items are collected; English
    /// feeds are only read when that threshold is not reached. At most
    /// `3 * limit` distinct links are considered. Feed failures yield fewer items.
    pub async fn fetch(&self, limit: usize) -> Vec<NewsItem> {
        let cap = limit.saturating_mul(3);
        let enough = limit.saturating_mul(2);
        let mut collector = Collector::default();

        for url in &self.french_feeds {
            collector.extend(self.fetch_or_empty(url).await, cap);
            if collector.len() >= enough {
                break;
            }
        }

        if collector.len() < enough {
            for url in &self.english_feeds {
                collector.extend(self.fetch_or_empty(url).await, cap);
                if collector.len() >= cap {
                    break;
                }
            }
        }

        rank_items(collector.items, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn item(title: &str, link: &str, hour: Option<u32>) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            link: link.to_string(),
            summary: String::new(),
            image: None,
            published: hour.map(|h| Utc.with_ymd_and_hms(2024, 6, 4, h, 0, 0).unwrap()),
            source: crate::news::rss::source_host(link),
        }
    }

    #[rstest]
    #[case("Les marchés reculent", "https://fr.finance.yahoo.com/a", Some(9), 50 + 25 + 1)]
    #[case("TSX hits record", "https://finance.yahoo.com/b", None, 25 + 40)]
    #[case("Apple earnings beat", "https://www.reuters.com/c", Some(9), 1)]
    #[case("Oil prices slip", "https://www.cbc.ca/d", None, 40)]
    fn test_score_item(
        #[case] title: &str,
        #[case] link: &str,
        #[case] hour: Option<u32>,
        #[case] expected: i32,
    ) {
        assert_eq!(score_item(&item(title, link, hour)), expected);
    }

    #[test]
    fn test_french_detection() {
        assert!(is_french_like("Hausse du dollar"));
        assert!(is_french_like("Récolte"));
        assert!(!is_french_like("Stocks rally on jobs data"));
    }

    #[test]
    fn test_preferred_items_rank_first() {
        let items = vec![
            item("Apple earnings beat", "https://reuters.com/1", Some(15)),
            item("Shopify rallies", "https://reuters.com/2", Some(10)),
            item("Enbridge expands", "https://reuters.com/3", Some(12)),
            item("Nvidia slips", "https://reuters.com/4", None),
        ];
        let ranked = rank_items(items, 10);
        let titles: Vec<_> = ranked.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Enbridge expands", "Shopify rallies", "Apple earnings beat", "Nvidia slips"]
        );
    }

    #[test]
    fn test_rank_truncates() {
        let items = (0..5)
            .map(|i| item("Headline", &format!("https://x.com/{i}"), Some(i)))
            .collect();
        assert_eq!(rank_items(items, 2).len(), 2);
    }

    #[test]
    fn test_collector_dedups_and_caps() {
        let mut collector = Collector::default();
        collector.extend(
            vec![
                item("a", "https://x.com/1", None),
                item("b", "https://x.com/1", None),
                item("c", "https://x.com/2", None),
            ],
            10,
        );
        assert_eq!(collector.len(), 2);

        collector.extend(
            (3..10)
                .map(|i| item("d", &format!("https://x.com/{i}"), None))
                .collect(),
            4,
        );
        assert_eq!(collector.len(), 4);
    }
}
