//! Slug normalization for route segments.
//!
//! Both forms are pure functions of the input: ASCII-only lowercasing, no
//! locale data, no state. The cache writer and the route guard reader must
//! derive identical slugs from identical names.

/// Maximum length of a navigation slug.
pub const NAVIGATION_SLUG_MAX_LEN: usize = 50;

/// Lowercases `name`, collapses every run of non-alphanumeric characters into a
/// single hyphen, and strips leading and trailing hyphens.
///
/// Only ASCII letters and digits survive; everything else (including
/// non-ASCII letters) acts as a separator.
///
/// ```
/// use nav_cache::slug::basic_slug;
/// assert_eq!(basic_slug("Invoice March.pdf"), "invoice-march-pdf");
/// assert_eq!(basic_slug("  --Kitchen   Reno!! "), "kitchen-reno");
/// ```
pub fn basic_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// [`basic_slug`] capped to [`NAVIGATION_SLUG_MAX_LEN`] characters.
///
/// A hyphen left dangling by the cut is dropped, so the result is itself a
/// valid basic slug.
pub fn navigation_slug(name: &str) -> String {
    let mut slug = basic_slug(name);
    // Output is ASCII, so byte and char lengths agree
    slug.truncate(NAVIGATION_SLUG_MAX_LEN);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Which form of a candidate's identity matched an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlugMatch {
    RawId,
    BasicSlug,
    NavigationSlug,
}

/// Compares `input` against a candidate's raw ID, basic slug, and navigation
/// slug, in that order, returning the first form that matches.
pub fn slug_matches(input: &str, candidate_id: &str, candidate_name: &str) -> Option<SlugMatch> {
    if input == candidate_id {
        return Some(SlugMatch::RawId);
    }
    let basic = basic_slug(candidate_name);
    if input == basic {
        return Some(SlugMatch::BasicSlug);
    }
    if input == navigation_slug(candidate_name) {
        return Some(SlugMatch::NavigationSlug);
    }
    None
}
