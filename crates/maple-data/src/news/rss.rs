//! RSS 2.0 and Atom parsing.

use crate::error::{DataError, Result};
use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, BytesText, Event};
use scraper::{Html, Node};
use serde::{Deserialize, Serialize};

/// A headline from a news feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Headline, HTML stripped
    pub title: String,
    /// Article URL
    pub link: String,
    /// Plain-text summary, possibly empty
    pub summary: String,
    /// Thumbnail URL
    pub image: Option<String>,
    /// Publication time
    pub published: Option<DateTime<Utc>>,
    /// Host of the article link without `www.`
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Summary,
    Published,
}

#[derive(Debug, Default)]
struct Draft {
    title: String,
    link: String,
    summary: String,
    published: String,
    image: Option<String>,
}

impl Draft {
    fn buffer(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Summary => &mut self.summary,
            Field::Published => &mut self.published,
        }
    }

    fn finish(self) -> Option<NewsItem> {
        let title = strip_html(&self.title);
        let link = self.link.trim().to_string();
        if title.is_empty() || link.is_empty() {
            return None;
        }
        Some(NewsItem {
            source: source_host(&link),
            summary: strip_html(&self.summary),
            published: parse_published(&self.published),
            image: self.image,
            title,
            link,
        })
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Option<String> {
    element
        .try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.trim().to_string()))
        .filter(|v| !v.is_empty())
}

fn text_of(text: &BytesText<'_>) -> String {
    text.unescape()
        .map(|t| t.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(text).into_owned())
}

/// Handle an opening or self-closing element inside an item.
///
/// Returns the text field the element's content should go to.
fn open_element(draft: &mut Draft, element: &BytesStart<'_>) -> Option<Field> {
    match element.name().as_ref() {
        b"title" => Some(Field::Title),
        b"link" => match attribute(element, "href") {
            Some(href) => {
                let alternate = attribute(element, "rel").is_none_or(|rel| rel == "alternate");
                if draft.link.is_empty() && alternate {
                    draft.link = href;
                }
                None
            }
            None => Some(Field::Link),
        },
        b"description" | b"summary" => Some(Field::Summary),
        b"pubDate" | b"published" | b"updated" | b"dc:date" => {
            draft.published.is_empty().then_some(Field::Published)
        }
        b"media:content" | b"media:thumbnail" | b"enclosure" => {
            if draft.image.is_none() {
                draft.image = attribute(element, "url");
            }
            None
        }
        _ => None,
    }
}

/// Parse every item of an RSS 2.0 channel or Atom feed.
///
/// Items without a title or link are dropped.
pub fn parse_feed(xml: &str) -> Result<Vec<NewsItem>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut draft: Option<Draft> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" | b"entry" => {
                    draft = Some(Draft::default());
                    field = None;
                }
                _ => {
                    if let Some(d) = draft.as_mut() {
                        field = open_element(d, &e);
                    }
                }
            },
            Ok(Event::Empty(e)) => {
                if let Some(d) = draft.as_mut() {
                    let _ = open_element(d, &e);
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(d), Some(f)) = (draft.as_mut(), field) {
                    d.buffer(f).push_str(&text_of(&t));
                }
            }
            Ok(Event::CData(c)) => {
                if let (Some(d), Some(f)) = (draft.as_mut(), field) {
                    d.buffer(f).push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"item" | b"entry" => {
                    if let Some(item) = draft.take().and_then(Draft::finish) {
                        items.push(item);
                    }
                    field = None;
                }
                _ => field = None,
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(DataError::XmlParse(format!("Feed parse error: {e}"))),
        }
    }

    Ok(items)
}

/// Text content of an HTML fragment with entities decoded and whitespace
/// collapsed.
///
/// `<br>` becomes a line break; script and style contents are dropped.
pub fn strip_html(input: &str) -> String {
    let fragment = Html::parse_fragment(input);
    let mut text = String::with_capacity(input.len());
    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(t) => {
                let in_script = node
                    .parent()
                    .and_then(|p| p.value().as_element().map(|e| matches!(e.name(), "script" | "style")))
                    .unwrap_or(false);
                if !in_script {
                    text.push_str(t);
                }
            }
            Node::Element(e) if e.name() == "br" => text.push('\n'),
            _ => {}
        }
    }

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse an RFC 2822 or RFC 3339 timestamp.
pub fn parse_published(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(text)
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Host of `link` with any leading `www.` removed.
pub fn source_host(link: &str) -> String {
    reqwest::Url::parse(link)
        .ok()
        .and_then(|url| url.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default()
}
