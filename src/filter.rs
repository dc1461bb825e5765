//! The tag filter: a selection of tags and the listing it derives from the
//! catalog's ordered post list.
//!
//! A filter lives wherever a listing view lives, and for exactly as long.
//! It starts empty ("all posts"), every [`TagFilter::toggle`] flips one tag
//! in or out, and the derived [`Listing`] partitions the posts into the
//! ones carrying a selected tag and the rest. Deriving is a synchronous
//! pass over the in-memory list; there is nothing to debounce or cancel.

use crate::post::Post;
use std::collections::BTreeSet;

/// The set of currently-selected tags.
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    selected: BTreeSet<String>,
}

/// What a listing view shows under a given selection.
#[derive(Debug, PartialEq)]
pub enum Listing<'a> {
    /// Nothing selected: the full list, untouched.
    All(&'a [Post]),

    /// At least one tag selected: the posts whose tags intersect the
    /// selection, then the rest. Both halves preserve catalog order and
    /// together they partition the input. `matching` may be empty; the
    /// consumer renders that as an explicit empty state with a clear-filter
    /// action, not as a blank screen.
    Filtered {
        matching: Vec<&'a Post>,
        other: Vec<&'a Post>,
    },
}

impl TagFilter {
    /// Creates an empty selection: the "all posts" display mode.
    pub fn new() -> TagFilter {
        TagFilter::default()
    }

    /// Flips `tag` in or out of the selection. Toggling the same tag twice
    /// leaves the selection exactly as it was.
    pub fn toggle(&mut self, tag: &str) {
        if !self.selected.remove(tag) {
            self.selected.insert(tag.to_owned());
        }
    }

    /// Empties the selection, returning to the "all posts" display mode.
    /// This is the clear-filter action behind the empty state.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Reports whether `tag` is currently selected.
    pub fn is_selected(&self, tag: &str) -> bool {
        self.selected.contains(tag)
    }

    /// The selected tags, in lexicographic order.
    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(|tag| tag.as_str())
    }

    /// Reports whether `post` carries at least one selected tag.
    pub fn matches(&self, post: &Post) -> bool {
        post.tags.iter().any(|tag| self.selected.contains(tag))
    }

    /// Derives the listing for `posts` under the current selection.
    pub fn listing<'a>(&self, posts: &'a [Post]) -> Listing<'a> {
        if self.selected.is_empty() {
            return Listing::All(posts);
        }
        let (matching, other) = posts
            .iter()
            .partition::<Vec<&Post>, _>(|post| self.matches(post));
        Listing::Filtered { matching, other }
    }
}
