// src/site.rs
//! Site identity.
//!
//! A site is keyed by a slug derived from its host (or from a plain name), so
//! `https://www.Example.com/about` and `example_com` name the same site.

use crate::error::{A11yError, Result};
use crate::types::ScanRecord;
use std::fmt;

pub const SNAPSHOT_EXT: &str = ".json";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SiteId {
    slug: String,
}

impl SiteId {
    /// Builds a site identity from a URL or a plain name.
    ///
    /// # Errors
    /// Returns `InvalidSite` if nothing alphanumeric remains.
    pub fn parse(raw: &str) -> Result<Self> {
        let host = host_of(raw.trim());
        let slug = slugify(host);
        let slug = strip_www(&slug).to_string();

        if slug.is_empty() {
            return Err(A11yError::InvalidSite(raw.to_string()));
        }
        Ok(Self { slug })
    }

    /// Derives the site from the first audited page.
    ///
    /// # Errors
    /// Returns `InvalidSite` if there are no records or the URL has no host.
    pub fn from_records(records: &[ScanRecord]) -> Result<Self> {
        let first = records
            .first()
            .ok_or_else(|| A11yError::InvalidSite(String::new()))?;
        Self::parse(&first.url)
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Fuzzy match of a snapshot file name against this site.
    ///
    /// The name must start with the slug, followed by `_` or the extension.
    /// Case, `-` versus `_` inside the slug, and a leading `www` are ignored.
    #[must_use]
    pub fn matches_file(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        let Some(stem) = name.strip_suffix(SNAPSHOT_EXT) else {
            return false;
        };
        let stem = stem
            .strip_prefix("www_")
            .or_else(|| stem.strip_prefix("www-"))
            .unwrap_or(stem);

        let slug = strip_www(&self.slug);
        match (stem.get(..slug.len()), stem.get(slug.len()..)) {
            (Some(head), Some(rest)) => {
                fold(head) == slug && (rest.is_empty() || rest.starts_with('_'))
            }
            _ => false,
        }
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug)
    }
}

fn host_of(raw: &str) -> &str {
    let rest = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let authority = rest
        .split(|c| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or(rest);
    let authority = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    authority.split(':').next().unwrap_or(authority)
}

fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_dash = false;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn fold(raw: &str) -> String {
    raw.to_lowercase().replace('_', "-")
}

fn strip_www(slug: &str) -> &str {
    slug.strip_prefix("www-").unwrap_or(slug)
}
