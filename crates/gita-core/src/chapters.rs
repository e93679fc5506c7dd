//! Static reference data: the eighteen chapters of the Bhagavad Gita and the
//! languages explanations can be requested in.

use rand::Rng;
use serde::Serialize;

/// One chapter of the Gita and the number of verses it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChapterInfo {
    pub number: u8,
    pub name: &'static str,
    pub translation: &'static str,
    pub verse_count: u16,
}

const fn ch(number: u8, name: &'static str, translation: &'static str, verse_count: u16) -> ChapterInfo {
    ChapterInfo {
        number,
        name,
        translation,
        verse_count,
    }
}

pub static CHAPTERS: [ChapterInfo; 18] = [
    ch(1, "Arjuna Vishada Yoga", "The Yoga of Arjuna's Dejection", 47),
    ch(2, "Sankhya Yoga", "The Yoga of Knowledge", 72),
    ch(3, "Karma Yoga", "The Yoga of Action", 43),
    ch(4, "Jnana Karma Sanyasa Yoga", "The Yoga of Knowledge and Discipline of Action", 42),
    ch(5, "Karma Sanyasa Yoga", "The Yoga of Action and Knowledge", 29),
    ch(6, "Dhyana Yoga", "The Yoga of Meditation", 47),
    ch(7, "Jnana Vijnana Yoga", "The Yoga of Wisdom and Understanding", 30),
    ch(8, "Akshara Brahma Yoga", "The Yoga of Imperishable Brahman", 28),
    ch(9, "Raja Vidya Raja Guhya Yoga", "The Yoga of Sovereign Science and Secret", 34),
    ch(10, "Vibhuti Yoga", "The Yoga of Divine Glories", 42),
    ch(11, "Vishwarupa Darshana Yoga", "The Yoga of the Vision of the Cosmic Form", 55),
    ch(12, "Bhakti Yoga", "The Yoga of Devotion", 20),
    ch(13, "Kshetra Kshetrajna Vibhaga Yoga", "The Yoga of Distinction between Field and Knower", 34),
    ch(14, "Gunatraya Vibhaga Yoga", "The Yoga of the Division of Three Gunas", 27),
    ch(15, "Purushottama Yoga", "The Yoga of the Supreme Divine Personality", 20),
    ch(16, "Daivasura Sampad Vibhaga Yoga", "The Yoga of Division between Divine and Demoniac", 24),
    ch(17, "Sraddhatraya Vibhaga Yoga", "The Yoga of the Division of Threefold Faith", 28),
    ch(18, "Moksha Sanyasa Yoga", "The Yoga of Liberation and Renunciation", 78),
];

pub static LANGUAGES: [&str; 13] = [
    "English",
    "Hindi",
    "Sanskrit",
    "Bengali",
    "Telugu",
    "Marathi",
    "Tamil",
    "Gujarati",
    "Kannada",
    "Malayalam",
    "Punjabi",
    "Odia",
    "Assamese",
];

pub const DEFAULT_LANGUAGE: &str = "English";

/// Look up a chapter by its number (1-based).
pub fn chapter(number: u8) -> Option<&'static ChapterInfo> {
    CHAPTERS.iter().find(|c| c.number == number)
}

pub fn is_supported_language(language: &str) -> bool {
    LANGUAGES.contains(&language)
}

/// Pick a chapter uniformly, then a verse uniformly within that chapter.
pub fn random_verse<R: Rng + ?Sized>(rng: &mut R) -> (u8, u16) {
    let info = &CHAPTERS[rng.gen_range(0..CHAPTERS.len())];
    let verse = rng.gen_range(1..=info.verse_count);
    (info.number, verse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_chapters_are_contiguous_from_one() {
        for (i, info) in CHAPTERS.iter().enumerate() {
            assert_eq!(info.number as usize, i + 1);
            assert!(info.verse_count >= 1);
        }
        assert_eq!(CHAPTERS.len(), 18);
    }

    #[test]
    fn test_chapter_lookup() {
        assert_eq!(chapter(2).map(|c| c.verse_count), Some(72));
        assert_eq!(chapter(12).map(|c| c.verse_count), Some(20));
        assert!(chapter(0).is_none());
        assert!(chapter(19).is_none());
    }

    #[test]
    fn test_total_verse_count() {
        let total: u32 = CHAPTERS.iter().map(|c| c.verse_count as u32).sum();
        assert_eq!(total, 700);
    }

    #[test]
    fn test_languages() {
        assert_eq!(LANGUAGES[0], DEFAULT_LANGUAGE);
        assert!(is_supported_language("Tamil"));
        assert!(!is_supported_language("Klingon"));
    }

    #[test]
    fn test_random_verse_in_range_and_every_chapter_reachable() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..2000 {
            let (number, verse) = random_verse(&mut rng);
            let info = chapter(number).unwrap();
            assert!((1..=info.verse_count).contains(&verse));
            seen.insert(number);
        }
        assert_eq!(seen.len(), CHAPTERS.len());
    }
}
