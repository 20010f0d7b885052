use anyhow::{anyhow, Result};
use chrono::Locale;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

#[derive(Deserialize)]
struct ApiPageSize(usize);
impl Default for ApiPageSize {
    fn default() -> Self {
        ApiPageSize(20)
    }
}

fn default_doc_type() -> String {
    "posts".to_owned()
}

fn default_locale() -> String {
    "pt_BR".to_owned()
}

fn default_issue_term() -> String {
    "pathname".to_owned()
}

fn default_comments_theme() -> String {
    "github-light".to_owned()
}

/// The site author, used in feed metadata.
#[derive(Clone, Debug, Deserialize)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

/// Settings for the issue-backed comment widget embedded on post pages.
/// Absent settings mean no widget.
#[derive(Clone, Debug, Deserialize)]
pub struct Comments {
    /// The repository whose issues hold the comments, e.g.
    /// `example/blog-comments`.
    pub repo: String,

    /// How the widget maps a page to an issue.
    #[serde(default = "default_issue_term")]
    pub issue_term: String,

    /// The widget's color theme.
    #[serde(default = "default_comments_theme")]
    pub theme: String,
}

#[derive(Deserialize)]
struct Api {
    url: Url,

    #[serde(default = "default_doc_type")]
    doc_type: String,

    #[serde(default)]
    page_size: ApiPageSize,

    /// The name of the environment variable holding the access token for
    /// private repositories. The token itself never goes in the project
    /// file.
    #[serde(default)]
    access_token_env: Option<String>,

    #[serde(default)]
    max_pages: Option<usize>,
}

#[derive(Deserialize)]
struct Project {
    site_root: Url,
    title: String,

    #[serde(default)]
    author: Option<Author>,

    #[serde(default)]
    index_page_size: PageSize,

    #[serde(default = "default_locale")]
    locale: String,

    api: Api,

    #[serde(default)]
    comments: Option<Comments>,
}

#[derive(Deserialize)]
struct Theme {
    index_template: Vec<PathBuf>,
    posts_template: Vec<PathBuf>,
}

pub struct Config {
    pub title: String,
    pub author: Option<Author>,
    pub home_page: Url,
    pub index_url: Url,
    pub index_output_directory: PathBuf,
    pub index_page_size: usize,
    pub posts_url: Url,
    pub posts_output_directory: PathBuf,
    pub static_url: Url,
    pub static_source_directory: PathBuf,
    pub static_output_directory: PathBuf,
    pub atom_url: Url,
    pub root_output_directory: PathBuf,
    pub index_template: Vec<PathBuf>,
    pub posts_template: Vec<PathBuf>,
    pub locale: Locale,
    pub api_url: Url,
    pub doc_type: String,
    pub api_page_size: usize,
    pub access_token: Option<String>,
    pub max_pages: Option<usize>,
    pub comments: Option<Comments>,
}

impl Config {
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join("stela.yaml");
        if path.exists() {
            match Config::from_project_file(&path, output_directory) {
                Ok(config) => Ok(config),
                Err(e) => Err(anyhow!("Loading configuration: {:?}", e)),
            }
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(anyhow!(
                    "Could not find `stela.yaml` in any parent directory"
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => {
                let theme_dir = project_root.join("theme");
                let theme_file = open(&theme_dir.join("theme.yaml"), "theme")?;
                let theme: Theme = serde_yaml::from_reader(theme_file)?;
                if project.index_page_size.0 < 1 {
                    return Err(anyhow!("index_page_size must be at least 1"));
                }
                if project.api.page_size.0 < 1 {
                    return Err(anyhow!("api.page_size must be at least 1"));
                }
                let site_root = with_trailing_slash(&project.site_root)?;
                Ok(Config {
                    home_page: site_root.clone(),
                    index_url: site_root.join("pages/")?,
                    posts_url: site_root.join("posts/")?,
                    static_url: site_root.join("static/")?,
                    atom_url: site_root.join("feed.atom")?,
                    index_template: theme
                        .index_template
                        .iter()
                        .map(|relpath| theme_dir.join(relpath))
                        .collect(),
                    posts_template: theme
                        .posts_template
                        .iter()
                        .map(|relpath| theme_dir.join(relpath))
                        .collect(),
                    static_source_directory: theme_dir.join("static"),
                    index_output_directory: output_directory.join("pages"),
                    posts_output_directory: output_directory.join("posts"),
                    static_output_directory: output_directory.join("static"),
                    root_output_directory: output_directory.to_owned(),
                    index_page_size: project.index_page_size.0,
                    locale: parse_locale(&project.locale)?,
                    title: project.title,
                    author: project.author,
                    api_url: project.api.url,
                    doc_type: project.api.doc_type,
                    api_page_size: project.api.page_size.0,
                    access_token: match project.api.access_token_env {
                        None => None,
                        Some(var) => Some(std::env::var(&var).map_err(|_| {
                            anyhow!("The access token variable `{}` is not set", var)
                        })?),
                    },
                    max_pages: project.api.max_pages,
                    comments: project.comments,
                })
            }
        }
    }
}

fn open(path: &Path, kind: &str) -> Result<File> {
    match File::open(path) {
        Err(e) => Err(anyhow!("Opening {} file `{}`: {}", kind, path.display(), e)),
        Ok(file) => Ok(file),
    }
}

/// Section URLs hang off the site root with [`Url::join`], which treats a
/// rootless path's last segment as a file name, so the root must end in a
/// slash.
fn with_trailing_slash(url: &Url) -> Result<Url> {
    match url.path().ends_with('/') {
        true => Ok(url.clone()),
        false => Ok(Url::parse(&format!("{}/", url))?),
    }
}

fn parse_locale(name: &str) -> Result<Locale> {
    Locale::try_from(name.replace('-', "_").as_str())
        .map_err(|_| anyhow!("Unrecognized locale `{}`", name))
}

#[cfg(test)]
mod test {
    use super::*;

    const PROJECT: &str = "\
site_root: https://blog.example.org
title: spacetraveling
author:
  name: Joseph Oliveira
index_page_size: 2
locale: pt_BR
api:
  url: https://myrepo.cdn.example.org/api/v2
  max_pages: 5
comments:
  repo: example/blog-comments
";

    const THEME: &str = "\
index_template: [base.html, index.html]
posts_template: [base.html, post.html]
";

    fn write_project(root: &Path) -> Result<()> {
        std::fs::write(root.join("stela.yaml"), PROJECT)?;
        std::fs::create_dir_all(root.join("theme"))?;
        std::fs::write(root.join("theme").join("theme.yaml"), THEME)?;
        Ok(())
    }

    #[test]
    fn test_from_directory_walks_up_to_the_project_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write_project(dir.path())?;
        let nested = dir.path().join("content").join("drafts");
        std::fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested, &dir.path().join("out"))?;
        assert_eq!(config.title, "spacetraveling");
        assert_eq!(config.home_page.as_str(), "https://blog.example.org/");
        assert_eq!(config.index_url.as_str(), "https://blog.example.org/pages/");
        assert_eq!(config.posts_url.as_str(), "https://blog.example.org/posts/");
        assert_eq!(config.static_url.as_str(), "https://blog.example.org/static/");
        assert_eq!(config.atom_url.as_str(), "https://blog.example.org/feed.atom");
        assert_eq!(config.index_page_size, 2);
        assert_eq!(config.api_page_size, 20);
        assert_eq!(config.doc_type, "posts");
        assert_eq!(config.max_pages, Some(5));
        assert_eq!(config.access_token, None);
        assert_eq!(
            config.index_template,
            vec![
                dir.path().join("theme").join("base.html"),
                dir.path().join("theme").join("index.html"),
            ]
        );
        assert_eq!(
            config.index_output_directory,
            dir.path().join("out").join("pages")
        );

        let comments = config.comments.expect("comments should be configured");
        assert_eq!(comments.repo, "example/blog-comments");
        assert_eq!(comments.issue_term, "pathname");
        assert_eq!(comments.theme, "github-light");
        Ok(())
    }

    #[test]
    fn test_missing_project_file_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert!(Config::from_directory(dir.path(), Path::new("out")).is_err());
        Ok(())
    }

    #[test]
    fn test_locale_names_accept_hyphens() -> Result<()> {
        parse_locale("pt-BR")?;
        parse_locale("en_US")?;
        assert!(parse_locale("klingon").is_err());
        Ok(())
    }

    #[test]
    fn test_access_token_resolves_through_the_environment() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let project = PROJECT.replace(
            "  max_pages: 5",
            "  max_pages: 5\n  access_token_env: STELA_TEST_ACCESS_TOKEN",
        );
        std::fs::write(dir.path().join("stela.yaml"), project)?;
        std::fs::create_dir_all(dir.path().join("theme"))?;
        std::fs::write(dir.path().join("theme").join("theme.yaml"), THEME)?;

        std::env::set_var("STELA_TEST_ACCESS_TOKEN", "s3cret");
        let config = Config::from_directory(dir.path(), Path::new("out"))?;
        assert_eq!(config.access_token.as_deref(), Some("s3cret"));
        Ok(())
    }
}
