//! Markdown-to-HTML rendering, the catalog's one renderer boundary.
//!
//! Post bodies stay opaque strings until a page is written; this is the
//! only place they are interpreted. Rendering is delegated wholesale to
//! `pulldown-cmark`, with the extensions posts actually use switched on.

use pulldown_cmark::{html, Options, Parser};

/// Renders `markdown` into an HTML fragment.
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut html = String::new();
    html::push_html(&mut html, Parser::new_ext(markdown, options));
    html
}
