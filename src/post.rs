//! Defines the [`Post`] type and the rich-text building blocks
//! ([`Section`], [`Block`], [`Span`]) that make up a post's body. Posts are
//! produced by the CMS client ([`crate::cms`]), accumulated by the list
//! store ([`crate::store`]), and consumed by the writer
//! ([`crate::write`]). The rich-text types deserialize directly from the
//! provider's wire format and travel through the program unmodified; they
//! are only turned into HTML at the very edge
//! ([`crate::htmlrenderer`]).

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// A single blog post as fetched from the content provider.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The post's unique identifier. This is the document's `uid`
    /// (slug-normalized) when the provider has one, otherwise a slug
    /// derived from the title, otherwise the provider's internal document
    /// id.
    pub id: String,

    /// The URL of the post's output page,
    /// `{posts_url}/{id}.html`.
    pub url: Url,

    /// The target location on disk for the post's output page.
    pub file_path: PathBuf,

    /// When the post was first published. The provider reports `null` for
    /// documents that have never been published; formatting such posts is
    /// the renderer's problem, not ours (see
    /// [`crate::render::PostRenderer::format_date`]).
    pub first_publication_date: Option<DateTime<FixedOffset>>,

    /// The post's title.
    pub title: String,

    /// The post's subtitle, shown under the title on index pages.
    pub subtitle: String,

    /// The post's author, as entered in the CMS.
    pub author: String,

    /// The URL of the post's banner image, if one was uploaded.
    pub banner_url: Option<String>,

    /// The post's body: an ordered list of sections, each a heading plus
    /// rich-text blocks.
    pub content: Vec<Section>,
}

impl Post {
    /// Counts the words in the post: section headings plus every block of
    /// body text. Used for the estimated reading time.
    pub fn word_count(&self) -> usize {
        self.content
            .iter()
            .map(|section| {
                section.heading.split_whitespace().count()
                    + section
                        .body
                        .iter()
                        .map(|block| block.text.split_whitespace().count())
                        .sum::<usize>()
            })
            .sum()
    }
}

/// One section of a post's body: a heading followed by rich-text blocks.
/// Sections render in order; blocks within a section render in order.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Section {
    /// The section heading. The provider may omit it entirely.
    #[serde(default)]
    pub heading: String,

    /// The section's rich-text body, passed through unmodified.
    #[serde(default)]
    pub body: Vec<Block>,
}

/// A rich-text block: one paragraph, heading, list item, or preformatted
/// run, with inline formatting described by [`Span`]s over `text`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Block {
    /// The block's kind, e.g. `paragraph` or `list-item`.
    #[serde(rename = "type")]
    pub kind: BlockKind,

    /// The block's plain text.
    #[serde(default)]
    pub text: String,

    /// Inline formatting spans over `text`, with offsets counted in
    /// characters.
    #[serde(default)]
    pub spans: Vec<Span>,
}

/// The kinds of rich-text block the provider's editor produces. Kinds this
/// program predates fall into [`BlockKind::Other`] and render as plain
/// paragraphs rather than failing the whole post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Paragraph,
    Preformatted,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    ListItem,
    OListItem,
    #[serde(other)]
    Other,
}

/// An inline formatting run over a [`Block`]'s text. `start` and `end` are
/// character offsets into the block text; `end` is exclusive.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,

    /// The span's kind, e.g. `strong` or `hyperlink`.
    #[serde(rename = "type")]
    pub kind: SpanKind,

    /// Extra data for the span. Only hyperlinks carry any.
    #[serde(default)]
    pub data: Option<SpanData>,
}

/// The kinds of inline formatting the renderer understands. Unknown kinds
/// fall into [`SpanKind::Other`] and render as unformatted text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    #[serde(other)]
    Other,
}

/// Extra data attached to a [`Span`]. Hyperlinks to the outside web carry a
/// `url`; links to other CMS documents carry only an internal id, which
/// this program has no page for, so such spans render as unformatted text.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
}
