//! Loose version ordering for vendor data
//!
//! Vendor indices and library folders carry versions such as `1.6`, `1.8.3`,
//! `1.2.3.4` or `4.8.1-arduino5`. They are not all valid semver. A version is
//! ordered by its dot-separated release components, missing components
//! counting as `0`, and then by its pre-release tag, which ranks below the
//! plain release. Tags follow [`semver`] precedence.

use semver::Prerelease;
use std::cmp::Ordering;

/// One dot-separated release component
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Component<'a> {
    Number(u64),
    Text(&'a str),
}

/// Pre-release tag; tags semver rejects sort after the valid ones
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Tag<'a> {
    Semver(Prerelease),
    Raw(&'a str),
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey<'a> {
    release: Vec<Component<'a>>,
    is_release: bool,
    tag: Option<Tag<'a>>,
}

impl<'a> SortKey<'a> {
    fn new(version: &'a str) -> Self {
        let version = version.trim().trim_start_matches('v');
        let version = version.split_once('+').map_or(version, |(head, _)| head);
        let (core, tag) = match version.split_once('-') {
            Some((core, tag)) => (core, Some(tag)),
            None => (version, None),
        };

        let mut release: Vec<Component<'a>> = core
            .split('.')
            .map(|part| part.parse().map_or(Component::Text(part), Component::Number))
            .collect();
        // `1.6` and `1.6.0` are the same release
        while release.last() == Some(&Component::Number(0)) {
            release.pop();
        }

        Self {
            release,
            is_release: tag.is_none(),
            tag: tag.map(|tag| Prerelease::new(tag).map_or(Tag::Raw(tag), Tag::Semver)),
        }
    }
}

/// Leading numeric component of a version string
pub fn major_of(version: &str) -> Option<u64> {
    let digits: String = version
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Total order over loose version strings
pub fn compare_loose(a: &str, b: &str) -> Ordering {
    SortKey::new(a).cmp(&SortKey::new(b))
}
