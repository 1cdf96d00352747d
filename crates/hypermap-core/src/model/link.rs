//! Hypermedia links and the per-resource link list.

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Well-known Relations
// =============================================================================

pub const REL_SELF: &str = "self";
pub const REL_NEXT: &str = "next";
pub const REL_PREV: &str = "prev";
pub const REL_FIRST: &str = "first";
pub const REL_LAST: &str = "last";
pub const REL_ALTERNATE: &str = "alternate";
pub const REL_COLLECTION: &str = "collection";
pub const REL_EDIT: &str = "edit";
pub const REL_EDIT_MEDIA: &str = "edit-media";
pub const REL_RELATED: &str = "related";

/// Errors raised when a link is constructed from bad parts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("Link relation must not be empty")]
    EmptyRel,

    #[error("Link href must not be empty (rel: {0})")]
    EmptyHref(String),
}

// =============================================================================
// Link
// =============================================================================

/// An immutable relation/target pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    rel: String,
    href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    templated: bool,
}

impl Link {
    /// Create a link, rejecting an empty rel or href.
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Result<Self, LinkError> {
        let rel = rel.into();
        let href = href.into();
        if rel.trim().is_empty() {
            return Err(LinkError::EmptyRel);
        }
        if href.trim().is_empty() {
            return Err(LinkError::EmptyHref(rel));
        }
        Ok(Self {
            rel,
            href,
            title: None,
            templated: false,
        })
    }

    pub fn self_link(href: impl Into<String>) -> Result<Self, LinkError> {
        Self::new(REL_SELF, href)
    }

    pub fn next(href: impl Into<String>) -> Result<Self, LinkError> {
        Self::new(REL_NEXT, href)
    }

    pub fn prev(href: impl Into<String>) -> Result<Self, LinkError> {
        Self::new(REL_PREV, href)
    }

    pub fn first(href: impl Into<String>) -> Result<Self, LinkError> {
        Self::new(REL_FIRST, href)
    }

    pub fn last(href: impl Into<String>) -> Result<Self, LinkError> {
        Self::new(REL_LAST, href)
    }

    pub fn alternate(href: impl Into<String>) -> Result<Self, LinkError> {
        Self::new(REL_ALTERNATE, href)
    }

    pub fn collection(href: impl Into<String>) -> Result<Self, LinkError> {
        Self::new(REL_COLLECTION, href)
    }

    pub fn edit(href: impl Into<String>) -> Result<Self, LinkError> {
        Self::new(REL_EDIT, href)
    }

    pub fn edit_media(href: impl Into<String>) -> Result<Self, LinkError> {
        Self::new(REL_EDIT_MEDIA, href)
    }

    pub fn related(href: impl Into<String>) -> Result<Self, LinkError> {
        Self::new(REL_RELATED, href)
    }

    /// Attach a human-readable title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Mark the href as a URI template.
    pub fn templated(mut self) -> Self {
        self.templated = true;
        self
    }

    pub fn rel(&self) -> &str {
        &self.rel
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn is_templated(&self) -> bool {
        self.templated
    }

    pub fn is_self(&self) -> bool {
        self.rel == REL_SELF
    }
}

// =============================================================================
// Link List
// =============================================================================

/// Ordered links of a single resource.
///
/// Holds at most one `self` link: adding another replaces the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Links(Vec<Link>);

impl Links {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a link.
    ///
    /// A `self` link replaces the current one in place. An exact duplicate
    /// (same rel and href) is ignored.
    pub fn add(&mut self, link: Link) {
        if link.is_self() {
            if let Some(existing) = self.0.iter_mut().find(|l| l.is_self()) {
                *existing = link;
                return;
            }
        } else if self
            .0
            .iter()
            .any(|l| l.rel == link.rel && l.href == link.href)
        {
            return;
        }
        self.0.push(link);
    }

    /// Set the `self` link from an href.
    pub fn set_self(&mut self, href: impl Into<String>) -> Result<(), LinkError> {
        self.add(Link::self_link(href)?);
        Ok(())
    }

    pub fn self_link(&self) -> Option<&Link> {
        self.0.iter().find(|l| l.is_self())
    }

    pub fn self_href(&self) -> Option<&str> {
        self.self_link().map(Link::href)
    }

    /// All links with the given relation, in insertion order.
    pub fn with_rel<'a>(&'a self, rel: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.0.iter().filter(move |l| l.rel == rel)
    }

    /// First link with the given relation.
    pub fn get(&self, rel: &str) -> Option<&Link> {
        self.0.iter().find(|l| l.rel == rel)
    }

    pub fn count(&self, rel: &str) -> usize {
        self.with_rel(rel).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Link> {
        self.0.iter()
    }

    /// Links other than `self`.
    pub fn non_self(&self) -> impl Iterator<Item = &Link> {
        self.0.iter().filter(|l| !l.is_self())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Links {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_parts() {
        assert_eq!(Link::new("", "http://x/").unwrap_err(), LinkError::EmptyRel);
        assert_eq!(
            Link::new("next", " ").unwrap_err(),
            LinkError::EmptyHref("next".to_string())
        );
    }

    #[test]
    fn test_second_self_link_replaces_first() {
        let mut links = Links::new();
        links.set_self("http://a/1").unwrap();
        links.add(Link::next("http://a/?$skip=10").unwrap());
        links.set_self("http://a/2").unwrap();

        assert_eq!(links.count(REL_SELF), 1);
        assert_eq!(links.self_href(), Some("http://a/2"));
        // replaced in place, so ordering is kept
        assert!(links.iter().next().unwrap().is_self());
    }

    #[test]
    fn test_duplicate_link_ignored() {
        let mut links = Links::new();
        links.add(Link::new("Layers", "http://a/layers").unwrap());
        links.add(Link::new("Layers", "http://a/layers").unwrap());
        links.add(Link::new("Layers", "http://a/other").unwrap());
        assert_eq!(links.count("Layers"), 2);
    }
}
