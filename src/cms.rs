//! The content-fetch side of the build: a client for a Prismic-style
//! headless CMS HTTP API. The client resolves the repository's master ref,
//! issues one search query for the configured document type, and exposes
//! cursor-based pagination through the [`PageFetcher`] trait so that the
//! list store ([`crate::store`]) never talks to the network directly.
//!
//! The provider's pagination scheme hands back a `next_page` URL with every
//! response; that URL is carried verbatim as an opaque [`Cursor`] and
//! dereferenced, never inspected.

use crate::post::{Post, Section};
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use url::Url;

/// An opaque token identifying the next page of results in the provider's
/// pagination scheme. Meaningful only to the provider; this program only
/// ever hands it back unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    pub fn new<S: Into<String>>(raw: S) -> Cursor {
        Cursor(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of fetched posts plus the cursor for the page after it.
/// `next_cursor` is `None` when the provider reports no further pages.
#[derive(Clone, Debug, PartialEq)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub next_cursor: Option<Cursor>,
}

/// The seam between the list store and the network: anything that can turn
/// a [`Cursor`] into the next [`PostPage`]. Production code uses
/// [`Client`]; tests use scripted in-memory fetchers.
pub trait PageFetcher {
    fn fetch_page(&self, cursor: &Cursor) -> Result<PostPage>;
}

/// Fetches [`Post`] objects from the provider's HTTP API.
pub struct Client<'a> {
    /// The API root, e.g. `https://myrepo.cdn.prismic.io/api/v2`.
    api_url: &'a Url,

    /// The document type to query, e.g. `posts`.
    doc_type: &'a str,

    /// The number of documents requested per page.
    page_size: usize,

    /// The access token for private repositories, if any.
    access_token: Option<&'a str>,

    /// `posts_url` is the base URL for post pages. It's used to prefix post
    /// page URLs (i.e., the URL for a post is `{posts_url}/{post_id}.html`).
    posts_url: &'a Url,

    /// `posts_directory` is the directory in which post pages will be
    /// rendered.
    posts_directory: &'a Path,
}

impl<'a> Client<'a> {
    /// Constructs a new client. See fields on [`Client`] for argument
    /// descriptions.
    pub fn new(
        api_url: &'a Url,
        doc_type: &'a str,
        page_size: usize,
        access_token: Option<&'a str>,
        posts_url: &'a Url,
        posts_directory: &'a Path,
    ) -> Client<'a> {
        Client {
            api_url,
            doc_type,
            page_size,
            access_token,
            posts_url,
            posts_directory,
        }
    }

    /// Fetches the first page of posts: resolves the master ref, builds the
    /// search query, and performs it. Further pages come from
    /// [`PageFetcher::fetch_page`] with the returned page's cursor.
    pub fn front_page(&self) -> Result<PostPage> {
        let reference = self.master_ref()?;
        let query = self.search_url(&reference)?;
        self.get_page(query.as_str())
    }

    /// Fetches the API index and picks the master ref, which parameterizes
    /// every search query. The provider moves this value whenever content
    /// is published, so it must be resolved fresh on every build.
    fn master_ref(&self) -> Result<String> {
        let body = http_get(self.api_url.as_str())?;
        let index: ApiIndex = serde_json::from_str(&body)?;
        index
            .refs
            .iter()
            .find(|r| r.is_master)
            .or_else(|| index.refs.first())
            .map(|r| r.reference.clone())
            .ok_or(Error::MissingMasterRef)
    }

    /// Builds the search query URL for the configured document type.
    fn search_url(&self, reference: &str) -> Result<Url> {
        // Url::join would treat the API root's last path segment as a file
        // name and drop it, so the search path is appended textually.
        let mut url = Url::parse(&format!(
            "{}/documents/search",
            self.api_url.as_str().trim_end_matches('/')
        ))?;
        url.query_pairs_mut()
            .append_pair("ref", reference)
            .append_pair("q", &format!("[[at(document.type,\"{}\")]]", self.doc_type))
            .append_pair("orderings", "[document.first_publication_date desc]")
            .append_pair("pageSize", &self.page_size.to_string());
        if let Some(token) = self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }
        Ok(url)
    }

    /// Performs one search request and converts the response into a
    /// [`PostPage`].
    fn get_page(&self, url: &str) -> Result<PostPage> {
        let body = http_get(url)?;
        let response: SearchResponse = serde_json::from_str(&body)?;
        let mut posts = Vec::with_capacity(response.results.len());
        for document in response.results {
            posts.push(self.document_to_post(document)?);
        }
        Ok(PostPage {
            posts,
            next_cursor: response.next_page.map(Cursor),
        })
    }

    /// Converts one wire document into a domain [`Post`], filling in the
    /// output URL and file path the way the writer expects them.
    fn document_to_post(&self, document: Document) -> Result<Post> {
        // The id becomes a path segment of both joins below, so the uid
        // gets the same slug normalization as the title fallback.
        let id = match document.uid {
            Some(uid) => slug::slugify(uid),
            None if !document.data.title.is_empty() => slug::slugify(&document.data.title),
            None => document.id,
        };
        let file_name = format!("{}.html", id);
        Ok(Post {
            url: self.posts_url.join(&file_name)?,
            file_path: self.posts_directory.join(&file_name),
            id,
            first_publication_date: document
                .first_publication_date
                .as_deref()
                .map(parse_publication_date)
                .transpose()?,
            title: document.data.title,
            subtitle: document.data.subtitle,
            author: document.data.author,
            banner_url: document.data.banner.and_then(|b| b.url),
            content: document.data.content,
        })
    }
}

impl PageFetcher for Client<'_> {
    /// Dereferences the cursor. The provider embeds the ref, query, and
    /// page number in it, so no query construction happens here.
    fn fetch_page(&self, cursor: &Cursor) -> Result<PostPage> {
        self.get_page(cursor.as_str())
    }
}

/// Parses a publication timestamp. The provider emits offsets in the
/// `+0000` style, which RFC 3339 parsing rejects, so that format is tried
/// first with RFC 3339 as the fallback.
fn parse_publication_date(raw: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map_err(|err| Error::Date {
            raw: raw.to_owned(),
            err,
        })
}

/// Performs one GET request and returns the response body.
fn http_get(url: &str) -> Result<String> {
    let mut response = ureq::get(url).call()?;
    if !response.status().is_success() {
        return Err(Error::Status(response.status().as_u16()));
    }
    Ok(response.body_mut().read_to_string()?)
}

/// The API index, fetched from the API root. Only the refs are of
/// interest.
#[derive(Deserialize)]
struct ApiIndex {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,

    #[serde(default, rename = "isMasterRef")]
    is_master: bool,
}

/// The response to a search query: one page of documents plus the URL of
/// the next page, if any.
#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    next_page: Option<String>,

    results: Vec<Document>,
}

/// One document as the provider serializes it. The envelope fields live
/// here; the rich-text body deserializes straight into the domain types.
#[derive(Deserialize)]
struct Document {
    id: String,

    #[serde(default)]
    uid: Option<String>,

    #[serde(default)]
    first_publication_date: Option<String>,

    data: DocumentData,
}

#[derive(Deserialize)]
struct DocumentData {
    #[serde(default)]
    title: String,

    #[serde(default)]
    subtitle: String,

    #[serde(default)]
    author: String,

    #[serde(default)]
    banner: Option<Banner>,

    #[serde(default)]
    content: Vec<Section>,
}

#[derive(Deserialize)]
struct Banner {
    #[serde(default)]
    url: Option<String>,
}

/// Represents the result of a fetch operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error fetching posts from the provider. The first two
/// variants are fetch failures; the rest mean the provider answered with
/// something this program cannot use.
#[derive(Debug)]
pub enum Error {
    /// Returned when the request could not be performed or the provider
    /// answered with an error status.
    Http(ureq::Error),

    /// Returned when a response carries a non-success status. With the
    /// default client configuration error statuses already surface as
    /// [`Error::Http`]; this guards against configurations that disable
    /// that behavior.
    Status(u16),

    /// Returned when a response body does not match the provider's wire
    /// shape.
    Decode(serde_json::Error),

    /// Returned when a document's publication date cannot be parsed.
    Date {
        raw: String,
        err: chrono::ParseError,
    },

    /// Returned when the API index contains no refs at all.
    MissingMasterRef,

    /// Returned when a query or post URL cannot be built.
    Url(url::ParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Http(err) => err.fmt(f),
            Error::Status(status) => {
                write!(f, "provider answered with status {}", status)
            }
            Error::Decode(err) => {
                write!(f, "response body does not match the provider shape: {}", err)
            }
            Error::Date { raw, err } => {
                write!(f, "unparseable publication date `{}`: {}", raw, err)
            }
            Error::MissingMasterRef => {
                write!(f, "the API index lists no refs to query against")
            }
            Error::Url(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(err) => Some(err),
            Error::Status(_) => None,
            Error::Decode(err) => Some(err),
            Error::Date { raw: _, err } => Some(err),
            Error::MissingMasterRef => None,
            Error::Url(err) => Some(err),
        }
    }
}

impl From<ureq::Error> for Error {
    /// Converts a [`ureq::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator for request and body-reading operations.
    fn from(err: ureq::Error) -> Error {
        Error::Http(err)
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. This allows us
    /// to use the `?` operator for response decoding.
    fn from(err: serde_json::Error) -> Error {
        Error::Decode(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. This allows us to
    /// use the `?` operator for URL parsing and joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::Url(err)
    }
}
