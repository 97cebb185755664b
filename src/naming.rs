//! Slug and display-title derivation.
//!
//! A project's slug is the primary key for its manifest, thumbnails, page and
//! metadata entry. It is derived from the folder's path relative to the image
//! root, so the same folder always maps to the same slug:
//!
//! - `Gokart` → `gokart`
//! - `BSA/Eagle Scout Project` → `bsa-eagle-scout-project`
//! - `Knife & Hatchet` → `knife-&-hatchet`
//!
//! Only case, spaces and separators are normalized. Other punctuation is kept,
//! which is why slug collisions are possible (`A B` and `A/B` both become
//! `a-b`); the scanner reports them.

use std::path::{Component, Path};

/// Derive a slug from a path relative to the image root.
///
/// Lowercases, turns spaces into `-` and joins path components with `-`.
/// Returns an empty string for an empty path (the image root itself).
pub fn slug_from_relative_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_lowercase()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("-")
        .replace(' ', "-")
}

/// Default display title for a slug without metadata.
///
/// Dashes become spaces and each word is capitalized: a letter is upper-cased
/// when it follows a non-letter, every other letter is lower-cased.
///
/// - `"gokart"` → `"Gokart"`
/// - `"knife-&-hatchet"` → `"Knife & Hatchet"`
/// - `"bsa-eagle-scout"` → `"Bsa Eagle Scout"`
pub fn title_from_slug(slug: &str) -> String {
    let mut title = String::with_capacity(slug.len());
    let mut after_letter = false;
    for c in slug.chars() {
        let c = if c == '-' { ' ' } else { c };
        if c.is_alphabetic() {
            if after_letter {
                title.extend(c.to_lowercase());
            } else {
                title.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            title.push(c);
            after_letter = false;
        }
    }
    title
}

/// Whether `segment` is a single, plain path component.
///
/// Slugs and filenames arriving from the admin API are joined onto real
/// directories; anything that could climb out of them is rejected.
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && !segment.contains("..")
        && !segment.contains('/')
        && !segment.contains('\\')
        && !segment.contains('\0')
}
