//! Heading slugs.

use std::collections::HashMap;

/// Convert text to URL-safe slug.
///
/// Converts to lowercase, replaces whitespace/dashes/underscores with single dashes,
/// and removes other non-alphanumeric characters.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true; // Prevents leading dash

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Generates slugs that are unique within one page.
///
/// Repeated slugs get a numeric suffix (`usage`, `usage-1`, `usage-2`).
/// Explicit identifiers are reserved so generated slugs never collide
/// with them.
#[derive(Debug, Default)]
pub(crate) struct SlugGenerator {
    counts: HashMap<String, usize>,
}

impl SlugGenerator {
    /// Unique slug for heading `text`. Empty when the text has no slug characters.
    pub fn generate(&mut self, text: &str) -> String {
        let base = slugify(text);
        if base.is_empty() {
            return base;
        }
        loop {
            let count = self.counts.entry(base.clone()).or_default();
            let id = match *count {
                0 => base.clone(),
                n => format!("{base}-{n}"),
            };
            *count += 1;
            // A suffixed slug may already be taken by an explicit identifier.
            if id == base || !self.counts.contains_key(&id) {
                self.counts.entry(id.clone()).or_insert(1);
                return id;
            }
        }
    }

    /// Mark an explicit identifier as taken.
    pub fn reserve(&mut self, id: &str) {
        *self.counts.entry(id.to_owned()).or_default() += 1;
    }
}
