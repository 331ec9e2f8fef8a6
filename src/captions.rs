use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DELIMITER: Regex = Regex::new(r"\s*\*\s*").unwrap();
    static ref EDGE_ASTERISKS: Regex = Regex::new(r"^\*+|\*+$").unwrap();
    // models like to open with "Here are some funny captions for the image:"
    static ref INTRO: Regex = Regex::new(r"(?i)^Here are some.*? captions for the image:").unwrap();
}

/// Split a raw model answer into individual captions.
///
/// Captions are separated by asterisks with optional whitespace around them.
/// Empty fragments and the introductory sentence are dropped; order is kept.
pub fn parse_captions(text: &str) -> Vec<String> {
    DELIMITER
        .split(text)
        .map(|caption| EDGE_ASTERISKS.replace_all(caption, "").trim().to_string())
        .filter(|caption| !caption.is_empty())
        .map(|caption| INTRO.replace(&caption, "").trim().to_string())
        .filter(|caption| !caption.is_empty())
        .collect()
}
