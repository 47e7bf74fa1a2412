//! Headline listing with relative publication times.

use crate::format::truncate;
use chrono::{DateTime, Utc};
use maple_data::NewsItem;
use serde::{Deserialize, Serialize};

/// Relative time in French (`"il y a 3 heures"`).
///
/// Undated items render as an empty string; dates in the future read as
/// `"à l'instant"`.
pub fn human_time(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(published) = published else {
        return String::new();
    };
    let seconds = (now - published).num_seconds();
    let (count, unit) = match seconds {
        s if s < 60 => return "à l'instant".to_string(),
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "heure"),
        s => (s / 86_400, "jour"),
    };
    let plural = if count > 1 { "s" } else { "" };
    format!("il y a {count} {unit}{plural}")
}

/// Ranked headlines ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsDigest {
    /// When the feeds were read
    pub generated_at: DateTime<Utc>,
    /// Headlines in ranked order
    pub items: Vec<NewsItem>,
}

impl NewsDigest {
    /// Wrap ranked headlines.
    pub const fn new(items: Vec<NewsItem>, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            items,
        }
    }

    /// Whether no headline was collected.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// One block per headline: title, source and age, link, then summary.
    pub fn to_ascii_table(&self) -> String {
        if self.is_empty() {
            return "No news could be retrieved right now.\n".to_string();
        }
        let mut output = String::new();
        for (i, item) in self.items.iter().enumerate() {
            let age = human_time(item.published, self.generated_at);
            let meta = if age.is_empty() {
                item.source.clone()
            } else {
                format!("{} \u{2022} {age}", item.source)
            };
            output.push_str(&format!("{:>3}. {}\n", i + 1, item.title));
            output.push_str(&format!("     {meta}\n"));
            output.push_str(&format!("     {}\n", item.link));
            if !item.summary.is_empty() {
                output.push_str(&format!("     {}\n", truncate(&item.summary, 160)));
            }
            output.push('\n');
        }
        output
    }

    /// Markdown list of linked titles.
    pub fn to_markdown(&self) -> String {
        self.items
            .iter()
            .map(|item| {
                let age = human_time(item.published, self.generated_at);
                format!("- [{}]({}) _{}_ {}\n", item.title, item.link, item.source, age)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 4, 12, 0, 0).unwrap()
    }

    #[rstest]
    #[case(Duration::seconds(59), "à l'instant")]
    #[case(Duration::seconds(-30), "à l'instant")]
    #[case(Duration::seconds(60), "il y a 1 minute")]
    #[case(Duration::minutes(59), "il y a 59 minutes")]
    #[case(Duration::hours(1), "il y a 1 heure")]
    #[case(Duration::hours(23), "il y a 23 heures")]
    #[case(Duration::days(1), "il y a 1 jour")]
    #[case(Duration::days(12), "il y a 12 jours")]
    fn test_human_time(#[case] age: Duration, #[case] expected: &str) {
        assert_eq!(human_time(Some(now() - age), now()), expected);
    }

    #[test]
    fn test_human_time_undated() {
        assert_eq!(human_time(None, now()), "");
    }

    #[test]
    fn test_digest_rendering() {
        let item = NewsItem {
            title: "La Banque du Canada maintient son taux".to_string(),
            link: "https://fr.finance.yahoo.com/a".to_string(),
            summary: "Décision attendue.".to_string(),
            image: None,
            published: Some(now() - Duration::hours(2)),
            source: "fr.finance.yahoo.com".to_string(),
        };
        let digest = NewsDigest::new(vec![item], now());
        let text = digest.to_ascii_table();
        assert!(text.contains("  1. La Banque du Canada maintient son taux"));
        assert!(text.contains("il y a 2 heures"));
        assert!(digest.to_markdown().starts_with("- [La Banque"));

        let empty = NewsDigest::new(Vec::new(), now());
        assert!(empty.to_ascii_table().contains("No news"));
    }
}
