//! The library code for the `stela` static site generator. The architecture
//! can be generally broken down into two distinct steps:
//!
//! 1. Fetching posts from the content provider's HTTP API ([`crate::cms`]),
//!    accumulated page by page in [`crate::store`]
//! 2. Converting the posts into output files on disk ([`crate::write`])
//!
//! Of the two, the second step is the more involved. It is itself composed of
//! three distinct sub-steps:
//!
//! 1. Building post pages
//! 2. Building index pages
//! 3. Rendering all pages to disk
//!
//! The second sub-step paginates the full post list--groups of pages based on
//! a configurable number of posts per index page--while the first renders
//! each post's rich-text body ([`crate::htmlrenderer`]) along with the
//! display strings computed by [`crate::render`].
//!
//! The third substep is pretty straight-forward: for each page, apply the
//! template (either the post template or the index template) and write the
//! result to disk.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod cms;
pub mod config;
pub mod feed;
pub mod htmlrenderer;
pub mod logging;
pub mod post;
pub mod render;
pub mod store;
pub mod write;
