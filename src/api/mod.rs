// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Remote Two/3 Integration API model.
//!
//! Minimal definition of the WebSocket Integration API messages this driver speaks.
//! See <https://github.com/unfoldedcircle/core-api> for the full API documentation.

mod entity;
pub mod intg;
pub mod ws;

use std::collections::HashMap;

pub use entity::*;

/// Implemented Integration API version.
pub const API_VERSION: &str = "0.12.1";

/// Get the text for the given language from a language text map, e.g. `{ "en": "Light" }`.
///
/// Fallback order if the requested language is not found: `en`, first entry.
pub fn text_from_language_map<'a>(
    text: Option<&'a HashMap<String, String>>,
    language: &str,
) -> Option<&'a str> {
    let text = text?;
    text.get(language)
        .or_else(|| text.get("en"))
        .or_else(|| text.values().next())
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::text_from_language_map;
    use std::collections::HashMap;

    #[test]
    fn text_from_language_map_falls_back_to_english() {
        let map = HashMap::from([
            ("en".to_string(), "Light".to_string()),
            ("de".to_string(), "Licht".to_string()),
        ]);

        assert_eq!(Some("Licht"), text_from_language_map(Some(&map), "de"));
        assert_eq!(Some("Light"), text_from_language_map(Some(&map), "fr"));
        assert_eq!(None, text_from_language_map(None, "en"));
    }
}
