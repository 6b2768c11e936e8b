//! Description helpers: sentence cuts and word-boundary cropping.

use sitekit_shared::Locale;

/// Ideographic full stop ending a Japanese sentence.
const IDEOGRAPHIC_STOP: char = '。';

/// Text up to the first sentence boundary: `。` for Japanese, `". "` otherwise.
pub fn first_sentence<'a>(text: &'a str, locale: &Locale) -> &'a str {
    if locale.is_japanese() {
        first_japanese_sentence(text)
    } else {
        text.split(". ").next().unwrap_or(text)
    }
}

/// Text up to the first `。`.
pub fn first_japanese_sentence(text: &str) -> &str {
    text.split(IDEOGRAPHIC_STOP).next().unwrap_or(text)
}

/// Shorten `text` to whole words fitting in `max_len` characters and append
/// `...` when anything was dropped.
pub fn crop_string(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let mut cropped = String::new();
    let mut length = 0;
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if length + word_len + 1 > max_len {
            break;
        }
        cropped.push_str(word);
        cropped.push(' ');
        length += word_len + 1;
    }

    let mut cropped = cropped.trim_end().to_string();
    if cropped.chars().count() < text.chars().count() {
        cropped.push_str("...");
    }
    cropped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_cut_depends_on_language() {
        let jp = Locale::new("jp");
        assert_eq!(first_sentence("最初の文。二番目。", &jp), "最初の文");
        assert_eq!(first_sentence("One. Two. Three", &Locale::default()), "One");
        assert_eq!(first_sentence("No boundary", &Locale::default()), "No boundary");
        // A Latin boundary is not a Japanese one.
        assert_eq!(first_sentence("A. B", &jp), "A. B");
    }

    #[test]
    fn crops_on_word_boundaries() {
        assert_eq!(crop_string("short", 10), "short");
        assert_eq!(crop_string("The quick brown fox", 10), "The quick...");
        assert_eq!(crop_string("Supercalifragilistic", 5), "...");
    }
}
