//! Pure display formatting for posts: the localized publication date, the
//! summary projection the index templates consume, and the estimated
//! reading time. Everything here is deterministic for a fixed locale, so
//! the same post always renders the same strings.

use crate::htmlrenderer;
use crate::post::Post;
use chrono::{DateTime, FixedOffset, Locale};
use gtmpl_value::Value;
use std::collections::HashMap;
use url::Url;

/// The string rendered in place of a missing publication date. Documents
/// saved but never published carry no date; the page still renders.
pub const MISSING_DATE: &str = "—";

/// Words per minute assumed when estimating reading time.
const WORDS_PER_MINUTE: u64 = 200;

/// Computes the display strings for a post under one locale.
pub struct PostRenderer {
    locale: Locale,
}

impl PostRenderer {
    pub fn new(locale: Locale) -> PostRenderer {
        PostRenderer { locale }
    }

    /// Formats a publication date as localized `day month year`, e.g.
    /// `15 mar 2021` under `pt_BR`. A missing date renders as
    /// [`MISSING_DATE`] rather than failing the build.
    pub fn format_date(&self, date: Option<&DateTime<FixedOffset>>) -> String {
        match date {
            Some(date) => date.format_localized("%d %b %Y", self.locale).to_string(),
            None => MISSING_DATE.to_owned(),
        }
    }

    /// Projects a post into the fields the index templates render. No
    /// side effects; the post itself is left untouched.
    pub fn summarize(&self, post: &Post) -> PostSummary {
        PostSummary {
            url: post.url.clone(),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            formatted_date: self.format_date(post.first_publication_date.as_ref()),
        }
    }

    /// Converts a post into the template value for its own page: the
    /// summary fields plus the rendered body, the banner, and the
    /// estimated reading time.
    pub fn post_value(&self, post: &Post) -> Value {
        let mut html = String::new();
        htmlrenderer::push_html(&mut html, &post.content);

        let mut map: HashMap<String, Value> = HashMap::new();
        map.insert("url".to_owned(), Value::String(post.url.to_string()));
        map.insert("title".to_owned(), Value::String(post.title.clone()));
        map.insert("subtitle".to_owned(), Value::String(post.subtitle.clone()));
        map.insert("author".to_owned(), Value::String(post.author.clone()));
        map.insert(
            "date".to_owned(),
            Value::String(self.format_date(post.first_publication_date.as_ref())),
        );
        map.insert(
            "banner_url".to_owned(),
            match &post.banner_url {
                Some(url) => Value::String(url.clone()),
                None => Value::Nil,
            },
        );
        map.insert("content".to_owned(), Value::String(html));
        map.insert("reading_time".to_owned(), Value::from(reading_time(post)));
        Value::Object(map)
    }
}

/// The slice of a post that index pages show: everything needed to decide
/// whether to click through, nothing more.
#[derive(Clone, Debug, PartialEq)]
pub struct PostSummary {
    pub url: Url,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub formatted_date: String,
}

impl From<&PostSummary> for Value {
    /// Converts a [`PostSummary`] into a `gtmpl::Value` so it can be
    /// rendered in the index templates.
    fn from(summary: &PostSummary) -> Value {
        let mut map: HashMap<String, Value> = HashMap::new();
        map.insert("url".to_owned(), Value::String(summary.url.to_string()));
        map.insert("title".to_owned(), Value::String(summary.title.clone()));
        map.insert(
            "subtitle".to_owned(),
            Value::String(summary.subtitle.clone()),
        );
        map.insert("author".to_owned(), Value::String(summary.author.clone()));
        map.insert(
            "date".to_owned(),
            Value::String(summary.formatted_date.clone()),
        );
        Value::Object(map)
    }
}

/// Estimates the minutes needed to read a post: total words across
/// headings and body text at 200 words per minute, rounded up, never less
/// than one minute.
pub fn reading_time(post: &Post) -> u64 {
    let words = post.word_count() as u64;
    std::cmp::max(1, (words + WORDS_PER_MINUTE - 1) / WORDS_PER_MINUTE)
}
