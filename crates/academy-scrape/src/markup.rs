//! Small HTML helpers over `scraper` shared by the extractors.

use scraper::{ElementRef, Html, Selector};

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text content of an element with whitespace normalised.
pub fn element_text(element: &ElementRef<'_>) -> String {
    normalize_ws(&element.text().collect::<String>())
}

/// Value of the `value` attribute on the first `<input name="{name}">`.
///
/// Returns `None` when no such input exists. An input without a `value`
/// attribute yields `Some("")`.
pub fn input_value(document: &Html, name: &str) -> Option<String> {
    let sel = Selector::parse(&format!(r#"input[name="{name}"]"#)).ok()?;
    document
        .select(&sel)
        .next()
        .map(|el| el.value().attr("value").unwrap_or("").to_string())
}

/// Value of the `content` attribute on the first `<meta name="{name}">`.
pub fn meta_content(document: &Html, name: &str) -> Option<String> {
    let sel = Selector::parse(&format!(r#"meta[name="{name}"]"#)).ok()?;
    document
        .select(&sel)
        .next()
        .map(|el| el.value().attr("content").unwrap_or("").to_string())
}

/// Title-case every word: first letter upper, rest lower.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
