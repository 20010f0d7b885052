//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: draining the posts from the
//! content provider ([`crate::cms`] and [`crate::store`]), rendering index
//! and post pages ([`crate::write`]), copying the static source directory
//! into the static output directory, and generating the Atom feed.

use crate::cms::{Client, Error as CmsError};
use crate::config::{Comments, Config};
use crate::feed::{write_feed, Error as FeedError, FeedConfig};
use crate::post::Post;
use crate::render::PostRenderer;
use crate::store::PostListStore;
use crate::write::{Error as WriteError, Writer};
use gtmpl::{Template, Value};
use log::info;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// The generator name advertised in page metadata.
const GENERATOR: &str = concat!("stela/", env!("CARGO_PKG_VERSION"));

/// Builds the site from a [`Config`] object. This calls into
/// [`fetch_posts`], [`Writer::write_posts`], and [`write_feed`] which do
/// the heavy-lifting. This function also copies the static assets from the
/// source directory to the output directory.
pub fn build_site(config: Config) -> Result<()> {
    let started = Instant::now();

    // collect all posts
    let posts = fetch_posts(&config)?;

    // Parse the template files.
    let index_template = parse_template(config.index_template.iter())?;
    let posts_template = parse_template(config.posts_template.iter())?;

    // Blow away the old output directories so we don't have any collisions.
    // We probably don't want to naively delete the whole root output
    // directory in case the user accidentally passes the wrong directory.
    rmdir(&config.posts_output_directory)?;
    rmdir(&config.index_output_directory)?;
    rmdir(&config.static_output_directory)?;

    let renderer = PostRenderer::new(config.locale);

    // write the post and index pages
    let writer = Writer {
        posts_template: &posts_template,
        index_template: &index_template,
        renderer: &renderer,
        index_page_size: config.index_page_size,
        index_base_url: &config.index_url,
        index_output_directory: &config.index_output_directory,
        home_page: &config.home_page,
        static_url: &config.static_url,
        atom_url: &config.atom_url,
        generator: GENERATOR,
        comments: comments_value(config.comments.as_ref()),
    };
    writer.write_posts(&posts)?;
    info!("Wrote {} post pages", posts.len());

    // copy static directory
    copy_dir(
        &config.static_source_directory,
        &config.static_output_directory,
    )?;

    // copy /pages/index.html to /index.html
    let _ = std::fs::copy(
        config.index_output_directory.join("index.html"),
        config.root_output_directory.join("index.html"),
    )?;

    // create the atom feed
    write_feed(
        FeedConfig {
            title: config.title,
            id: config.atom_url.to_string(),
            author: config.author,
            home_page: config.home_page,
            feed_url: config.atom_url,
        },
        &posts,
        File::create(config.root_output_directory.join("feed.atom"))?,
    )?;

    info!("Built the site in {:.2?}", started.elapsed());
    Ok(())
}

/// Drains the provider's pagination into a complete post list. The store
/// keeps fetch order and drops duplicate ids; `max_pages` caps the number
/// of fetched pages for very large sites.
fn fetch_posts(config: &Config) -> Result<Vec<Post>> {
    let client = Client::new(
        &config.api_url,
        &config.doc_type,
        config.api_page_size,
        config.access_token.as_deref(),
        &config.posts_url,
        &config.posts_output_directory,
    );

    let mut store = PostListStore::new(client.front_page()?);
    info!("Fetched page 1 ({} posts)", store.posts().len());

    let mut fetched_pages = 1;
    while store.has_more() {
        if let Some(max_pages) = config.max_pages {
            if fetched_pages >= max_pages {
                info!("Stopping at the configured cap of {} pages", max_pages);
                break;
            }
        }
        store.load_more(&client)?;
        fetched_pages += 1;
        info!(
            "Fetched page {} ({} posts)",
            fetched_pages,
            store.posts().len()
        );
    }
    Ok(store.into_posts())
}

/// Converts the comment settings into the template value the post template
/// gates on. No settings renders no widget.
fn comments_value(comments: Option<&Comments>) -> Value {
    use std::collections::HashMap;
    match comments {
        None => Value::Nil,
        Some(comments) => {
            let mut m: HashMap<String, Value> = HashMap::new();
            m.insert("repo".to_owned(), Value::String(comments.repo.clone()));
            m.insert(
                "issue_term".to_owned(),
                Value::String(comments.issue_term.clone()),
            );
            m.insert("theme".to_owned(), Value::String(comments.theme.clone()));
            Value::Object(m)
        }
    }
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    // Themes without static assets are fine.
    if !src.is_dir() {
        return Ok(());
    }
    for result in walkdir::WalkDir::new(src) {
        let entry = result?;
        // strip_prefix shouldn't fail since the walk stays under `src`
        let target = dst.join(entry.path().strip_prefix(src).unwrap());
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

// Loads the template file contents, appends them to `base_template`, and
// parses the result into a template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during fetching,
/// writing, cleaning output directories, parsing template files, and other
/// I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors fetching posts from the provider.
    Fetch(CmsError),

    /// Returned for errors writing [`crate::post::Post`]s to disk as HTML
    /// files.
    Write(WriteError),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned for errors writing the feed.
    Feed(FeedError),

    /// Returned for I/O problems while walking the static source directory.
    WalkDir(walkdir::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Fetch(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => err.fmt(f),
            Error::Feed(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Fetch(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Feed(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<CmsError> for Error {
    /// Converts [`CmsError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: CmsError) -> Error {
        Error::Fetch(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator for fallible directory walks.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}
