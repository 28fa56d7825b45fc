//! Localized display strings and search phrases, keyed by primary language subtag.
use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug)]
pub struct Locale {
    pub code: &'static str,
    pub trailer_label: &'static str,
    pub making_label: &'static str,
    pub ending_label: &'static str,
    /// Word a trailer title is expected to contain, lowercase.
    pub trailer_word: &'static str,
    /// Words naming this language inside a video title or description, lowercase.
    pub language_words: &'static [&'static str],
    pub phrases: &'static SearchPhrases,
}

/// Query suffixes and scoring phrases for the auxiliary searches. All phrases lowercase.
#[derive(Debug)]
pub struct SearchPhrases {
    pub making_query: &'static str,
    pub ending_query: &'static str,
    pub making_of: &'static [&'static str],
    pub behind_scenes: &'static [&'static str],
    pub interview: &'static [&'static str],
    pub ending_explained: &'static [&'static str],
}

static ENGLISH_PHRASES: SearchPhrases = SearchPhrases {
    making_query: "making of behind the scenes",
    ending_query: "ending explained",
    making_of: &["making of"],
    behind_scenes: &["behind the scenes"],
    interview: &["interview"],
    ending_explained: &["ending explained"],
};

static SPANISH_PHRASES: SearchPhrases = SearchPhrases {
    making_query: "making of detrás de cámaras",
    ending_query: "final explicado",
    making_of: &["making of", "cómo se hizo"],
    behind_scenes: &["detrás de cámaras", "detrás de escena", "behind the scenes"],
    interview: &["entrevista", "interview"],
    ending_explained: &["final explicado", "explicación del final"],
};

pub static ENGLISH: Locale = Locale {
    code: "en",
    trailer_label: "Trailer",
    making_label: "Making of",
    ending_label: "Ending explained",
    trailer_word: "trailer",
    language_words: &["english"],
    phrases: &ENGLISH_PHRASES,
};

static SPANISH: Locale = Locale {
    code: "es",
    trailer_label: "Tráiler",
    making_label: "Cómo se hizo",
    ending_label: "Final explicado",
    trailer_word: "tráiler",
    language_words: &["español", "castellano", "latino"],
    phrases: &SPANISH_PHRASES,
};

static FRENCH: Locale = Locale {
    code: "fr",
    trailer_label: "Bande-annonce",
    making_label: "Making of",
    ending_label: "Fin expliquée",
    trailer_word: "bande-annonce",
    language_words: &["français", "vf"],
    phrases: &ENGLISH_PHRASES,
};

static GERMAN: Locale = Locale {
    code: "de",
    trailer_label: "Trailer",
    making_label: "Making-of",
    ending_label: "Ende erklärt",
    trailer_word: "trailer",
    language_words: &["deutsch"],
    phrases: &ENGLISH_PHRASES,
};

static ITALIAN: Locale = Locale {
    code: "it",
    trailer_label: "Trailer",
    making_label: "Dietro le quinte",
    ending_label: "Finale spiegato",
    trailer_word: "trailer",
    language_words: &["italiano"],
    phrases: &ENGLISH_PHRASES,
};

static PORTUGUESE: Locale = Locale {
    code: "pt",
    trailer_label: "Trailer",
    making_label: "Making of",
    ending_label: "Final explicado",
    trailer_word: "trailer",
    language_words: &["português", "dublado"],
    phrases: &ENGLISH_PHRASES,
};

static LOCALES: Lazy<HashMap<&'static str, &'static Locale>> = Lazy::new(|| {
    [&ENGLISH, &SPANISH, &FRENCH, &GERMAN, &ITALIAN, &PORTUGUESE]
        .into_iter()
        .map(|l| (l.code, l))
        .collect()
});

impl Locale {
    pub fn for_tag(tag: &str) -> &'static Locale {
        LOCALES
            .get(primary_subtag(tag).as_str())
            .copied()
            .unwrap_or(&ENGLISH)
    }

    pub fn is_english(&self) -> bool {
        self.code == ENGLISH.code
    }
}

pub fn primary_subtag(tag: &str) -> String {
    tag.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Region subtag lowercased, `us` when the tag carries none.
pub fn region_subtag(tag: &str) -> String {
    tag.trim()
        .split(['-', '_'])
        .nth(1)
        .filter(|r| !r.is_empty())
        .map(|r| r.to_lowercase())
        .unwrap_or_else(|| "us".to_string())
}
