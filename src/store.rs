//! Accumulates the full post list across the provider's pages. The store
//! owns the growing list and the cursor for the next page; the build loop
//! keeps calling [`PostListStore::load_more`] until the provider reports no
//! further pages. Posts keep their fetch order (the search query already
//! orders them newest-first) and duplicate ids are dropped, so re-sent
//! documents cannot produce duplicate pages in the output.

use crate::cms::{self, PageFetcher, PostPage};
use crate::post::Post;
use std::collections::HashSet;

/// Holds the posts fetched so far and the position in the provider's
/// pagination scheme.
pub struct PostListStore {
    /// The accumulated posts, in fetch order.
    posts: Vec<Post>,

    /// The ids already in `posts`. Pages can overlap when documents are
    /// published mid-pagination; accepting an id twice would render the
    /// same post page twice.
    seen: HashSet<String>,

    /// Where to resume. `None` once the provider reports the last page.
    next_cursor: Option<cms::Cursor>,
}

impl PostListStore {
    /// Constructs a store from the first fetched page.
    pub fn new(page: PostPage) -> PostListStore {
        let mut store = PostListStore {
            posts: Vec::new(),
            seen: HashSet::new(),
            next_cursor: None,
        };
        store.absorb(page);
        store
    }

    /// True while the provider has pages this store has not fetched.
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    /// The posts accumulated so far, in fetch order.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Consumes the store, yielding the accumulated posts.
    pub fn into_posts(self) -> Vec<Post> {
        self.posts
    }

    /// Fetches the next page through `fetcher` and appends its posts,
    /// skipping ids already present. Does nothing when the provider has
    /// already reported the last page. On a fetch or decode error the
    /// list and cursor are left exactly as they were; the caller decides
    /// whether to retry. Taking `&mut self` means a second load cannot
    /// start while one is in progress.
    pub fn load_more<F: PageFetcher>(&mut self, fetcher: &F) -> cms::Result<()> {
        let cursor = match &self.next_cursor {
            Some(cursor) => cursor.clone(),
            None => return Ok(()),
        };
        let page = fetcher.fetch_page(&cursor)?;
        self.absorb(page);
        Ok(())
    }

    /// Appends a page's posts (deduplicated) and takes over its cursor.
    fn absorb(&mut self, page: PostPage) {
        for post in page.posts {
            if self.seen.insert(post.id.clone()) {
                self.posts.push(post);
            }
        }
        self.next_cursor = page.next_cursor;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cms::{Cursor, Error};
    use std::cell::RefCell;
    use std::path::PathBuf;
    use url::Url;

    /// Replays a fixed script of responses and records the cursors it was
    /// asked to dereference.
    struct ScriptedFetcher {
        script: RefCell<Vec<cms::Result<PostPage>>>,
        requested: RefCell<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<cms::Result<PostPage>>) -> ScriptedFetcher {
            ScriptedFetcher {
                script: RefCell::new(script),
                requested: RefCell::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested.borrow().clone()
        }
    }

    impl PageFetcher for ScriptedFetcher {
        fn fetch_page(&self, cursor: &Cursor) -> cms::Result<PostPage> {
            self.requested.borrow_mut().push(cursor.as_str().to_owned());
            let mut script = self.script.borrow_mut();
            if script.is_empty() {
                panic!("fetched past the end of the script");
            }
            script.remove(0)
        }
    }

    fn post(id: &str) -> Post {
        Post {
            id: id.to_owned(),
            url: Url::parse("https://example.org/posts/")
                .and_then(|base| base.join(&format!("{}.html", id)))
                .unwrap(),
            file_path: PathBuf::from(format!("/tmp/out/posts/{}.html", id)),
            first_publication_date: None,
            title: format!("Post {}", id),
            subtitle: String::new(),
            author: "Author".to_owned(),
            banner_url: None,
            content: Vec::new(),
        }
    }

    fn page(ids: &[&str], next: Option<&str>) -> PostPage {
        PostPage {
            posts: ids.iter().map(|id| post(id)).collect(),
            next_cursor: next.map(Cursor::new),
        }
    }

    fn ids(store: &PostListStore) -> Vec<&str> {
        store.posts().iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_load_more_concatenates_pages_in_call_order() -> cms::Result<()> {
        let mut store = PostListStore::new(page(&["p1", "p2"], Some("c1")));
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page(&["p3"], Some("c2"))),
            Ok(page(&["p4", "p5"], None)),
        ]);

        store.load_more(&fetcher)?;
        assert_eq!(ids(&store), vec!["p1", "p2", "p3"]);
        assert!(store.has_more());

        store.load_more(&fetcher)?;
        assert_eq!(ids(&store), vec!["p1", "p2", "p3", "p4", "p5"]);
        assert!(!store.has_more());

        assert_eq!(fetcher.requested(), vec!["c1", "c2"]);
        Ok(())
    }

    #[test]
    fn test_load_more_after_last_page_is_a_no_op() -> cms::Result<()> {
        let mut store = PostListStore::new(page(&["p1"], None));
        assert!(!store.has_more());

        // The script is empty; a fetch would panic.
        let fetcher = ScriptedFetcher::new(Vec::new());
        store.load_more(&fetcher)?;

        assert_eq!(ids(&store), vec!["p1"]);
        assert!(fetcher.requested().is_empty());
        Ok(())
    }

    #[test]
    fn test_load_more_reaching_the_end_clears_the_cursor() -> cms::Result<()> {
        let mut store = PostListStore::new(page(&["p1"], Some("c1")));
        let fetcher = ScriptedFetcher::new(vec![Ok(page(&["p2"], None))]);

        store.load_more(&fetcher)?;
        assert_eq!(ids(&store), vec!["p1", "p2"]);
        assert!(!store.has_more());
        Ok(())
    }

    #[test]
    fn test_failed_load_leaves_the_store_untouched() {
        let mut store = PostListStore::new(page(&["p1"], Some("c1")));
        let fetcher = ScriptedFetcher::new(vec![Err(Error::Status(500))]);

        let result = store.load_more(&fetcher);
        assert!(matches!(result, Err(Error::Status(500))));
        assert_eq!(ids(&store), vec!["p1"]);
        assert!(store.has_more());

        // The cursor survives the failure, so a later call retries the
        // same page.
        let retry = ScriptedFetcher::new(vec![Ok(page(&["p2"], None))]);
        store.load_more(&retry).unwrap();
        assert_eq!(ids(&store), vec!["p1", "p2"]);
        assert_eq!(retry.requested(), vec!["c1"]);
    }

    #[test]
    fn test_duplicate_ids_are_dropped() -> cms::Result<()> {
        let mut store = PostListStore::new(page(&["p1", "p1", "p2"], Some("c1")));
        assert_eq!(ids(&store), vec!["p1", "p2"]);

        let fetcher = ScriptedFetcher::new(vec![Ok(page(&["p2", "p3"], None))]);
        store.load_more(&fetcher)?;
        assert_eq!(ids(&store), vec!["p1", "p2", "p3"]);
        Ok(())
    }
}
