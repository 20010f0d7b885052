use crate::post::Post;
use crate::render::PostRenderer;
use gtmpl::{Template, Value};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// Responsible for indexing, templating, and writing HTML pages to disk from
/// [`Post`] sources.
pub struct Writer<'a> {
    /// The template for post pages.
    pub posts_template: &'a Template,

    /// The template for index pages.
    pub index_template: &'a Template,

    /// Computes the display strings templates consume (dates, summaries,
    /// reading times).
    pub renderer: &'a PostRenderer,

    /// The base URL for index pages. The index pages will be located at
    /// `{index_base_url}/index.html`, `{index_base_url}/1.html`, etc.
    pub index_base_url: &'a Url,

    /// The directory in which the index HTML files will be written. The
    /// index page files will be located at
    /// `{index_output_directory}/index.html`,
    /// `{index_output_directory}/1.html`, etc.
    pub index_output_directory: &'a Path,

    /// The number of posts per index page.
    pub index_page_size: usize,

    /// The URL for the site's home page. This is made available to both post
    /// and index templates, typically as the destination for the site-header
    /// link.
    pub home_page: &'a Url,

    /// The URL for the static assets. This is made available to both post
    /// and index templates, typically for the theme's stylesheet.
    pub static_url: &'a Url,

    /// The URL for the Atom feed, made available to templates for the feed
    /// `<link>` element.
    pub atom_url: &'a Url,

    /// The generator name and version, made available to templates for the
    /// generator `<meta>` element.
    pub generator: &'a str,

    /// The comment-widget settings as a template value, or [`Value::Nil`]
    /// when comments are disabled. Templates gate the widget markup on this
    /// field.
    pub comments: Value,
}

impl Writer<'_> {
    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: &Page) -> Result<()> {
        let mut value = page.to_value();
        if let Value::Object(obj) = &mut value {
            obj.insert(
                "home_page".to_owned(),
                Value::String(self.home_page.to_string()),
            );
            obj.insert(
                "static_url".to_owned(),
                Value::String(self.static_url.to_string()),
            );
            obj.insert(
                "atom_url".to_owned(),
                Value::String(self.atom_url.to_string()),
            );
            obj.insert(
                "generator".to_owned(),
                Value::String(self.generator.to_owned()),
            );
            obj.insert("comments".to_owned(), self.comments.clone());
        }
        page.template.execute(
            &mut std::fs::File::create(&page.file_path)?,
            &gtmpl::Context::from(value).unwrap(),
        )?;
        Ok(())
    }

    /// Takes a slice of [`Post`], paginates it, and writes post and index
    /// pages to disk.
    pub fn write_posts(&self, posts: &[Post]) -> Result<()> {
        use std::collections::HashSet;
        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        let pages = pages(
            posts,
            self.renderer,
            self.index_base_url,
            self.index_output_directory,
            self.index_page_size,
            self.posts_template,
            self.index_template,
        )?;
        for page in pages {
            let dir = page.file_path.parent().unwrap(); // there should always be a dir
            if seen_dirs.insert(dir.to_owned()) {
                std::fs::create_dir_all(dir)?;
            }
            self.write_page(&page)?;
        }
        Ok(())
    }
}

/// An object representing an output HTML file. A [`Page`] can be converted
/// to a [`Value`] and thus rendered in a template via [`Page::to_value`].
struct Page<'a> {
    /// The main item for the page.
    item: Value,

    /// The target location on disk for the output file.
    file_path: PathBuf,

    /// The URL for the previous page, if any.
    prev: Option<Url>,

    /// The URL for the next page, if any.
    next: Option<Url>,

    /// The template with which the page will be rendered.
    template: &'a Template,
}

impl Page<'_> {
    /// Converts a [`Page`] into a [`Value`]. The result is a
    /// [`Value::Object`] with fields `item`, `prev`, and `next` (see
    /// [`Page`] for descriptions).
    fn to_value(&self) -> Value {
        use std::collections::HashMap;

        let option_to_value = |opt: &Option<Url>| match opt {
            Some(url) => Value::String(url.to_string()),
            None => Value::Nil,
        };

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("item".to_owned(), self.item.clone());
        m.insert("prev".to_owned(), option_to_value(&self.prev));
        m.insert("next".to_owned(), option_to_value(&self.next));
        Value::Object(m)
    }
}

/// Creates all of the index and post [`Page`]s for a set of [`Post`]s. See
/// [`Writer`] for a description of arguments. Calls [`index_pages`] and
/// [`post_pages`] and returns the union of their results.
fn pages<'a>(
    posts: &'a [Post],
    renderer: &PostRenderer,
    index_base_url: &Url,
    index_output_directory: &Path,
    index_page_size: usize,
    posts_template: &'a Template,
    index_template: &'a Template,
) -> Result<Vec<Page<'a>>> {
    let mut pages = index_pages(
        posts,
        renderer,
        index_base_url,
        index_output_directory,
        index_page_size,
        index_template,
    )?;
    pages.extend(post_pages(posts, renderer, posts_template));
    Ok(pages)
}

/// Creates all of the post [`Page`]s for a set of [`Post`]s. Posts link to
/// their neighbors in list order, so each page carries the previous
/// (newer) and next (older) post URLs.
fn post_pages<'a>(
    posts: &'a [Post],
    renderer: &PostRenderer,
    template: &'a Template,
) -> Vec<Page<'a>> {
    posts
        .iter()
        .enumerate()
        .map(|(i, post)| Page {
            item: renderer.post_value(post),
            file_path: post.file_path.clone(),
            prev: match i < 1 {
                true => None,
                false => Some(posts[i - 1].url.clone()),
            },
            next: match i >= posts.len() - 1 {
                true => None,
                false => Some(posts[i + 1].url.clone()),
            },
            template,
        })
        .collect()
}

/// Creates all of the index [`Page`]s for a set of [`Post`]s. The first
/// page is always written, even for an empty site, so the home page
/// exists; its item is an array of post summaries and its `next` link is
/// how readers reach older posts.
fn index_pages<'a>(
    posts: &[Post],
    renderer: &PostRenderer,
    index_base_url: &Url,
    index_output_directory: &Path,
    index_page_size: usize,
    index_template: &'a Template,
) -> Result<Vec<Page<'a>>> {
    let total_pages = match posts.len() % index_page_size {
        0 => posts.len() / index_page_size,
        _ => posts.len() / index_page_size + 1,
    };
    let total_pages = std::cmp::max(total_pages, 1);

    let mut pages = Vec::with_capacity(total_pages);
    for i in 0..total_pages {
        let chunk = &posts[(i * index_page_size).min(posts.len())
            ..((i + 1) * index_page_size).min(posts.len())];
        let file_name = match i > 0 {
            false => String::from("index.html"),
            true => format!("{}.html", i),
        };

        pages.push(Page {
            item: Value::Array(
                chunk
                    .iter()
                    .map(|p| Value::from(&renderer.summarize(p)))
                    .collect(),
            ),
            file_path: index_output_directory.join(&file_name),
            prev: match i {
                0 => None,
                1 => Some(index_base_url.join("index.html")?),
                _ => Some(index_base_url.join(&format!("{}.html", i - 1))?),
            },
            next: match i < total_pages - 1 {
                false => None,
                true => Some(index_base_url.join(&format!("{}.html", i + 1))?),
            },
            template: index_template,
        });
    }
    Ok(pages)
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error writing the output files.
    Io(io::Error),

    /// An error building a page URL.
    Url(url::ParseError),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`].
    /// This allows us to use the `?` operator for fallible template
    /// operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. This allows us to
    /// use the `?` operator for fallible URL-joining operations.
    fn from(err: url::ParseError) -> Error {
        Error::Url(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::Url(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::Io(err) => Some(err),
            Error::Url(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Locale;
    use std::path::PathBuf;

    fn post(id: &str) -> Post {
        Post {
            id: id.to_owned(),
            url: Url::parse(&format!("https://example.org/posts/{}.html", id)).unwrap(),
            file_path: PathBuf::from(format!("posts/{}.html", id)),
            first_publication_date: None,
            title: format!("Post {}", id),
            subtitle: String::new(),
            author: "Author".to_owned(),
            banner_url: None,
            content: Vec::new(),
        }
    }

    fn template(body: &str) -> Template {
        let mut template = Template::default();
        template.parse(body).unwrap();
        template
    }

    #[test]
    fn test_index_pages_chunk_name_and_link() -> Result<()> {
        let posts: Vec<Post> = (0..7).map(|n| post(&format!("p{}", n))).collect();
        let renderer = PostRenderer::new(Locale::pt_BR);
        let base_url = Url::parse("https://example.org/pages/").unwrap();
        let index_template = template("index");

        let pages = index_pages(
            &posts,
            &renderer,
            &base_url,
            Path::new("pages"),
            3,
            &index_template,
        )?;

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].file_path, Path::new("pages/index.html"));
        assert_eq!(pages[1].file_path, Path::new("pages/1.html"));
        assert_eq!(pages[2].file_path, Path::new("pages/2.html"));

        assert_eq!(pages[0].prev, None);
        assert_eq!(
            pages[0].next.as_ref().map(Url::as_str),
            Some("https://example.org/pages/1.html")
        );
        assert_eq!(
            pages[1].prev.as_ref().map(Url::as_str),
            Some("https://example.org/pages/index.html")
        );
        assert_eq!(
            pages[2].prev.as_ref().map(Url::as_str),
            Some("https://example.org/pages/1.html")
        );
        assert_eq!(pages[2].next, None);

        match &pages[2].item {
            Value::Array(summaries) => assert_eq!(summaries.len(), 1),
            value => panic!("wanted an array of summaries; found {:?}", value),
        }
        Ok(())
    }

    #[test]
    fn test_index_pages_exact_multiple_leaves_no_trailing_page() -> Result<()> {
        let posts: Vec<Post> = (0..6).map(|n| post(&format!("p{}", n))).collect();
        let renderer = PostRenderer::new(Locale::pt_BR);
        let base_url = Url::parse("https://example.org/pages/").unwrap();
        let index_template = template("index");

        let pages = index_pages(
            &posts,
            &renderer,
            &base_url,
            Path::new("pages"),
            3,
            &index_template,
        )?;

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].file_path, Path::new("pages/1.html"));
        assert_eq!(pages[1].next, None);
        match &pages[1].item {
            Value::Array(summaries) => assert_eq!(summaries.len(), 3),
            value => panic!("wanted an array of summaries; found {:?}", value),
        }
        Ok(())
    }

    #[test]
    fn test_index_pages_always_include_the_home_page() -> Result<()> {
        let renderer = PostRenderer::new(Locale::pt_BR);
        let base_url = Url::parse("https://example.org/pages/").unwrap();
        let index_template = template("index");

        let pages = index_pages(
            &[],
            &renderer,
            &base_url,
            Path::new("pages"),
            10,
            &index_template,
        )?;

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].file_path, Path::new("pages/index.html"));
        assert_eq!(pages[0].item, Value::Array(Vec::new()));
        assert_eq!(pages[0].prev, None);
        assert_eq!(pages[0].next, None);
        Ok(())
    }

    #[test]
    fn test_post_pages_link_their_neighbors() {
        let posts: Vec<Post> = (0..3).map(|n| post(&format!("p{}", n))).collect();
        let renderer = PostRenderer::new(Locale::pt_BR);
        let posts_template = template("post");

        let pages = post_pages(&posts, &renderer, &posts_template);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].prev, None);
        assert_eq!(
            pages[1].prev.as_ref().map(Url::as_str),
            Some("https://example.org/posts/p0.html")
        );
        assert_eq!(
            pages[1].next.as_ref().map(Url::as_str),
            Some("https://example.org/posts/p2.html")
        );
        assert_eq!(pages[2].next, None);
    }

    #[test]
    fn test_write_posts_renders_into_the_output_tree() -> Result<()> {
        let out = tempfile::tempdir()?;
        let posts = vec![{
            let mut p = post("hello");
            p.file_path = out.path().join("posts/hello.html");
            p
        }];

        let renderer = PostRenderer::new(Locale::pt_BR);
        let posts_template = template("post: {{.item.title}}");
        let index_template = template("index: {{range .item}}{{.title}}{{end}}");
        let base_url = Url::parse("https://example.org/pages/").unwrap();
        let static_url = Url::parse("https://example.org/static/").unwrap();
        let atom_url = Url::parse("https://example.org/feed.atom").unwrap();
        let home_page = Url::parse("https://example.org/").unwrap();
        let index_dir = out.path().join("pages");

        let writer = Writer {
            posts_template: &posts_template,
            index_template: &index_template,
            renderer: &renderer,
            index_base_url: &base_url,
            index_output_directory: &index_dir,
            index_page_size: 10,
            home_page: &home_page,
            static_url: &static_url,
            atom_url: &atom_url,
            generator: "stela/test",
            comments: Value::Nil,
        };
        writer.write_posts(&posts)?;

        let index = std::fs::read_to_string(index_dir.join("index.html"))?;
        assert_eq!(index, "index: Post hello");
        let page = std::fs::read_to_string(out.path().join("posts/hello.html"))?;
        assert_eq!(page, "post: Post hello");
        Ok(())
    }
}
