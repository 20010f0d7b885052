//! Implements a custom [`push_html`] for the provider's rich-text format.
//! The provider serializes post bodies as structured blocks rather than
//! markup, so there is no off-the-shelf renderer to call: each block
//! carries plain text plus inline formatting spans given as character
//! offsets, and this module splices the spans back in as tags while
//! escaping the text around them.

use crate::post::{Block, BlockKind, Section, Span, SpanKind};

/// Renders rich-text [`Section`]s into HTML.
struct HtmlRenderer<'a> {
    out: &'a mut String,
}

impl<'a> HtmlRenderer<'a> {
    fn on_section(&mut self, section: &Section) {
        if !section.heading.is_empty() {
            self.out.push_str("<h2>");
            escape_html(self.out, &section.heading);
            self.out.push_str("</h2>\n");
        }
        self.on_blocks(&section.body);
    }

    fn on_blocks(&mut self, blocks: &[Block]) {
        let mut rest = blocks;
        while let Some(block) = rest.first() {
            rest = match block.kind {
                BlockKind::ListItem => self.on_list(rest, BlockKind::ListItem, "<ul>\n", "</ul>\n"),
                BlockKind::OListItem => {
                    self.on_list(rest, BlockKind::OListItem, "<ol>\n", "</ol>\n")
                }
                _ => {
                    self.on_block(block);
                    &rest[1..]
                }
            };
        }
    }

    /// Wraps a run of consecutive list items of the same kind in a single
    /// list element. The provider serializes each item as its own block
    /// with no list container. Returns the blocks after the run.
    fn on_list<'b>(
        &mut self,
        blocks: &'b [Block],
        kind: BlockKind,
        open: &str,
        close: &str,
    ) -> &'b [Block] {
        self.out.push_str(open);
        let mut consumed = 0;
        while consumed < blocks.len() && blocks[consumed].kind == kind {
            let item = &blocks[consumed];
            self.out.push_str("<li>");
            self.on_text(&item.text, &item.spans);
            self.out.push_str("</li>\n");
            consumed += 1;
        }
        self.out.push_str(close);
        &blocks[consumed..]
    }

    fn on_block(&mut self, block: &Block) {
        let (open, close) = match block.kind {
            BlockKind::Preformatted => ("<pre><code>", "</code></pre>\n"),
            BlockKind::Heading1 => ("<h1>", "</h1>\n"),
            BlockKind::Heading2 => ("<h2>", "</h2>\n"),
            BlockKind::Heading3 => ("<h3>", "</h3>\n"),
            BlockKind::Heading4 => ("<h4>", "</h4>\n"),
            BlockKind::Heading5 => ("<h5>", "</h5>\n"),
            BlockKind::Heading6 => ("<h6>", "</h6>\n"),
            // Paragraphs, and any block kind this program predates.
            _ => ("<p>", "</p>\n"),
        };
        self.out.push_str(open);
        self.on_text(&block.text, &block.spans);
        self.out.push_str(close);
    }

    /// Writes a block's text with its formatting spans spliced back in.
    /// Offsets are counted in characters and clamped to the text length;
    /// at equal positions closing tags come before opening tags, and of
    /// two spans opening together the longer opens first, so nested spans
    /// produce properly nested tags. The editor only produces nested or
    /// disjoint spans; anything else closes in stack order.
    fn on_text(&mut self, text: &str, spans: &[Span]) {
        let chars: Vec<char> = text.chars().collect();
        let mut spliced: Vec<(usize, usize, &Span)> = spans
            .iter()
            .filter_map(|span| {
                let start = span.start.min(chars.len());
                let end = span.end.min(chars.len());
                if start < end {
                    Some((start, end, span))
                } else {
                    None
                }
            })
            .collect();
        spliced.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut opens = spliced.into_iter().peekable();
        let mut closers: Vec<(usize, &'static str)> = Vec::new();
        for (position, c) in chars.iter().enumerate() {
            while closers
                .last()
                .map(|(end, _)| *end <= position)
                .unwrap_or(false)
            {
                if let Some((_, tag)) = closers.pop() {
                    self.out.push_str(tag);
                }
            }
            while opens
                .peek()
                .map(|(start, _, _)| *start == position)
                .unwrap_or(false)
            {
                if let Some((_, end, span)) = opens.next() {
                    if let Some(close) = self.on_span_start(span) {
                        closers.push((end, close));
                    }
                }
            }
            escape_char(self.out, *c);
        }
        while let Some((_, tag)) = closers.pop() {
            self.out.push_str(tag);
        }
    }

    /// Writes a span's opening tag and returns the matching closing tag,
    /// or `None` for spans that contribute no markup. Hyperlinks to other
    /// CMS documents carry an internal id instead of a URL; this program
    /// has no page to point them at, so their text renders unformatted.
    fn on_span_start(&mut self, span: &Span) -> Option<&'static str> {
        match span.kind {
            SpanKind::Strong => {
                self.out.push_str("<strong>");
                Some("</strong>")
            }
            SpanKind::Em => {
                self.out.push_str("<em>");
                Some("</em>")
            }
            SpanKind::Hyperlink => match span.data.as_ref().and_then(|d| d.url.as_deref()) {
                Some(url) => {
                    self.out.push_str("<a href=\"");
                    escape_href(self.out, url);
                    self.out.push_str("\">");
                    Some("</a>")
                }
                None => None,
            },
            SpanKind::Other => None,
        }
    }
}

fn escape_char(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        _ => out.push(c),
    }
}

fn escape_html(out: &mut String, text: &str) {
    for c in text.chars() {
        escape_char(out, c);
    }
}

fn escape_href(out: &mut String, url: &str) {
    for c in url.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

/// Converts rich-text [`Section`]s into an HTML string. Section headings
/// render as `<h2>` elements (omitted when empty) followed by that
/// section's blocks.
pub fn push_html(out: &mut String, sections: &[Section]) {
    let mut renderer = HtmlRenderer { out };
    for section in sections {
        renderer.on_section(section);
    }
}
