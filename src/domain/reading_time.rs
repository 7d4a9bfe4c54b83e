//! Reading-time estimate for a post body.

use crate::domain::{posts::ContentSection, rich_text};

pub const WORDS_PER_MINUTE: usize = 200;

/// Count whitespace-separated words across every section heading and body.
pub fn count_words(sections: &[ContentSection]) -> usize {
    let mut text = String::new();
    for section in sections {
        text.push_str(&section.heading);
        text.push(' ');
        text.push_str(&rich_text::as_text(&section.body));
        text.push(' ');
    }
    text.split_whitespace().count()
}

pub fn estimate_minutes(sections: &[ContentSection]) -> u32 {
    minutes_for_words(count_words(sections))
}

/// Minutes needed for `words` at [`WORDS_PER_MINUTE`], rounded up and never below one.
pub fn minutes_for_words(words: usize) -> u32 {
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rich_text::RichTextBlock;

    fn section(heading: &str, paragraphs: &[&str]) -> ContentSection {
        ContentSection {
            heading: heading.to_string(),
            body: paragraphs
                .iter()
                .map(|text| RichTextBlock::paragraph(*text))
                .collect(),
        }
    }

    fn words(count: usize) -> String {
        vec!["palavra"; count].join(" ")
    }

    #[test]
    fn two_single_word_sections_take_one_minute() {
        let sections = vec![section("", &["Hello"]), section("", &["World"])];
        assert_eq!(count_words(&sections), 2);
        assert_eq!(estimate_minutes(&sections), 1);
    }

    #[test]
    fn headings_count_towards_the_total() {
        let sections = vec![section("Introdução ao tema", &["um dois"])];
        assert_eq!(count_words(&sections), 5);
    }

    #[test]
    fn block_boundaries_separate_words() {
        let sections = vec![section("", &["fim", "início"])];
        assert_eq!(count_words(&sections), 2);
    }

    #[test]
    fn exactly_two_hundred_words_is_one_minute() {
        let body = words(150);
        let sections = vec![section(&words(50), &[body.as_str()])];
        assert_eq!(count_words(&sections), 200);
        assert_eq!(estimate_minutes(&sections), 1);
    }

    #[test]
    fn boundaries_round_up() {
        assert_eq!(minutes_for_words(201), 2);
        assert_eq!(minutes_for_words(400), 2);
        assert_eq!(minutes_for_words(401), 3);
    }

    #[test]
    fn empty_content_is_floored_at_one_minute() {
        assert_eq!(estimate_minutes(&[]), 1);
        assert_eq!(estimate_minutes(&[section("   ", &["\n\t"])]), 1);
    }

    #[test]
    fn estimate_is_monotonic_in_word_count() {
        let mut previous = 0;
        for count in 0..=1_000 {
            let minutes = minutes_for_words(count);
            assert!(minutes >= previous, "estimate decreased at {count} words");
            previous = minutes;
        }
    }
}
