//! Support for creating Atom feeds from a list of posts.

use crate::config::Author;
use crate::post::Post;
use atom_syndication::{
    Entry, EntryBuilder, Error as AtomError, Feed, FeedBuilder, FixedDateTime, GeneratorBuilder,
    Link, LinkBuilder, Person, PersonBuilder, Text,
};
use std::fmt;
use std::io::Write;
use url::Url;

/// Bundled configuration for creating a feed.
pub struct FeedConfig {
    pub title: String,
    pub id: String,
    pub author: Option<Author>,
    pub home_page: Url,
    pub feed_url: Url,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and a list of
/// [`Post`]s and writes the result to a [`std::io::Write`]. This function
/// takes ownership of the provided [`FeedConfig`].
pub fn write_feed<W: Write>(config: FeedConfig, posts: &[Post], w: W) -> Result<()> {
    feed(config, posts).write_to(w)?;
    Ok(())
}

fn feed(config: FeedConfig, posts: &[Post]) -> Feed {
    let entries = feed_entries(&config, posts);

    // The feed's updated stamp is its newest entry's. A feed with no dated
    // entries reports the epoch rather than the build time, so rebuilding
    // an unchanged site yields an unchanged feed.
    let updated = posts
        .iter()
        .filter_map(|post| post.first_publication_date)
        .max()
        .unwrap_or_else(FixedDateTime::default);

    let self_link: Link = LinkBuilder::default()
        .href(config.feed_url.to_string())
        .rel("self".to_string())
        .mime_type(Some("application/atom+xml".to_string()))
        .build();
    let alternate_link: Link = LinkBuilder::default()
        .href(config.home_page.to_string())
        .rel("alternate".to_string())
        .build();

    FeedBuilder::default()
        .title(Text::plain(config.title))
        .id(config.id)
        .updated(updated)
        .authors(author_to_people(config.author))
        .links(vec![self_link, alternate_link])
        .generator(Some(
            GeneratorBuilder::default()
                .value("stela")
                .version(Some(env!("CARGO_PKG_VERSION").to_string()))
                .build(),
        ))
        .entries(entries)
        .build()
}

fn feed_entries(config: &FeedConfig, posts: &[Post]) -> Vec<Entry> {
    posts
        .iter()
        .map(|post| {
            EntryBuilder::default()
                .title(Text::plain(post.title.clone()))
                .id(post.url.to_string())
                .updated(
                    post.first_publication_date
                        .unwrap_or_else(FixedDateTime::default),
                )
                .published(post.first_publication_date)
                .authors(author_to_people(config.author.clone()))
                .links(vec![LinkBuilder::default()
                    .href(post.url.to_string())
                    .rel("alternate".to_owned())
                    .build()])
                .summary(match post.subtitle.is_empty() {
                    true => None,
                    false => Some(Text::plain(post.subtitle.clone())),
                })
                .build()
        })
        .collect()
}

fn author_to_people(author: Option<Author>) -> Vec<Person> {
    match author {
        Some(author) => vec![PersonBuilder::default()
            .name(author.name)
            .email(author.email)
            .build()],
        None => Vec::new(),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed. Variants include I/O and Atom
/// serialization issues.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when there is an Atom-related error.
    Atom(AtomError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Atom(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Atom(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator in fallible feed operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<AtomError> for Error {
    /// Converts [`AtomError`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}
