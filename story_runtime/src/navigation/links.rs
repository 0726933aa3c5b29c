//! Declarative link bindings found in rendered markup.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static SNIPPET_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bdata-snippet\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("link pattern is valid")
});

/// An element the host should wire to a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkBinding {
    /// Selector matching the link element(s).
    pub selector: String,
    /// Name of the snippet to show.
    pub target: String,
}

impl LinkBinding {
    pub fn new(target: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            selector: format!(
                "a[data-snippet=\"{}\"]",
                target.replace('\\', "\\\\").replace('"', "\\\"")
            ),
            target,
        }
    }
}

/// Every `a[data-snippet]` target in document order, without duplicates.
pub fn extract_links(markup: &str) -> Vec<LinkBinding> {
    let mut links: Vec<LinkBinding> = Vec::new();

    for caps in SNIPPET_LINK_RE.captures_iter(markup) {
        let Some(target) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) else {
            continue;
        };
        let target = target.as_str().trim();
        if target.is_empty() || links.iter().any(|l| l.target == target) {
            continue;
        }
        links.push(LinkBinding::new(target));
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_links() {
        let markup = r##"
            <p>Go <a href="#" data-snippet="tower">up</a>,
            <A class='x' data-snippet='cellar'>down</A> or
            <a data-snippet="tower">up again</a>.</p>
            <div data-snippet="not-a-link"></div>
            <a href="https://example.com">away</a>
        "##;
        let targets: Vec<_> = extract_links(markup).into_iter().map(|l| l.target).collect();
        assert_eq!(targets, vec!["tower", "cellar"]);
    }

    #[test]
    fn test_selector() {
        assert_eq!(LinkBinding::new("tower").selector, r#"a[data-snippet="tower"]"#);
        assert_eq!(
            LinkBinding::new(r#"say "hi""#).selector,
            r#"a[data-snippet="say \"hi\""]"#
        );
    }

    #[test]
    fn test_no_links() {
        assert!(extract_links("<p>The end.</p>").is_empty());
        assert!(extract_links(r#"<a data-snippet="">nowhere</a>"#).is_empty());
    }
}
