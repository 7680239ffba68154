//! Slug generation.
//!
//! A slug is the first eight hex digits of a random (v4) UUID. Uniqueness is
//! enforced by the caller checking candidates against the index.

use uuid::Uuid;

/// Length of every slug, in characters.
pub const SLUG_LEN: usize = 8;

/// Draws a random candidate slug. May collide with an existing one.
pub(crate) fn candidate() -> String {
    let mut slug = Uuid::new_v4().simple().to_string();
    slug.truncate(SLUG_LEN);
    slug
}

/// Whether `slug` has the shape of a slug: exactly eight lowercase hex digits.
pub fn is_valid(slug: &str) -> bool {
    slug.len() == SLUG_LEN && crate::models::is_lower_hex(slug)
}
