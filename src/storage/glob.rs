//! Glob locators selecting a set of input objects

use super::location::StorageLocation;
use crate::error::{Error, Result};
use futures::TryStreamExt;
use object_store::ObjectMeta;
use regex::Regex;

/// A storage location plus a glob over keys below it
///
/// Glob syntax: `*` matches within one path segment, `**` matches across
/// segments (`**/` also matches no directory at all), `?` matches one
/// character other than `/`.
#[derive(Debug, Clone)]
pub struct InputLocator {
    location: StorageLocation,
    glob: String,
    pattern: Regex,
}

impl InputLocator {
    /// Parse a locator such as `s3://bucket/logs/*.json`
    ///
    /// The store is opened at the longest wildcard-free directory. A
    /// locator without wildcards selects every object below it.
    pub fn parse(locator: &str) -> Result<Self> {
        let (base, glob) = split_glob(locator);
        let location = StorageLocation::parse(base)?;
        Self::new(location, glob)
    }

    /// Build a locator over an already-opened location
    pub fn new(location: StorageLocation, glob: &str) -> Result<Self> {
        Ok(Self {
            location,
            glob: glob.to_string(),
            pattern: glob_to_regex(glob)?,
        })
    }

    /// The location the glob is evaluated under
    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// The glob, relative to the location prefix
    pub fn glob(&self) -> &str {
        &self.glob
    }

    /// Check a key relative to the location prefix
    pub fn matches(&self, relative_key: &str) -> bool {
        self.pattern.is_match(relative_key)
    }

    /// List matching objects in lexicographic key order
    pub async fn resolve(&self) -> Result<Vec<ObjectMeta>> {
        let prefix = self.location.prefix();
        let prefix_path = (!prefix.is_empty()).then(|| self.location.child(""));

        let listed: Vec<ObjectMeta> = self
            .location
            .store()
            .list(prefix_path.as_ref())
            .try_collect()
            .await
            .map_err(|e| Error::storage("list", prefix, e))?;

        let mut matched: Vec<ObjectMeta> = listed
            .into_iter()
            .filter(|meta| {
                let key = meta.location.as_ref();
                let relative = if prefix.is_empty() {
                    key
                } else {
                    key.strip_prefix(prefix)
                        .map_or(key, |rest| rest.trim_start_matches('/'))
                };
                self.matches(relative)
            })
            .collect();

        matched.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(matched)
    }
}

/// Split a locator into its wildcard-free base and the glob below it
pub fn split_glob(locator: &str) -> (&str, &str) {
    let Some(first_wildcard) = locator.find(['*', '?']) else {
        return (locator, "**");
    };

    match locator[..first_wildcard].rfind('/') {
        Some(slash) => (&locator[..slash], &locator[slash + 1..]),
        None => (".", locator),
    }
}

/// Compile a glob into an anchored regex
pub fn glob_to_regex(glob: &str) -> Result<Regex> {
    let mut pattern = String::from("^");
    let mut chars = glob.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    pattern.push_str("(?:.*/)?");
                } else {
                    pattern.push_str(".*");
                }
            }
            '*' => pattern.push_str("[^/]*"),
            '?' => pattern.push_str("[^/]"),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push('$');

    Regex::new(&pattern).map_err(|e| Error::invalid_value("input", format!("bad glob '{glob}': {e}")))
}
