//! Keyword based mood classification and the genre filter.

use std::fmt;

use serde::Serialize;

/// Shown when free text matches none of the keyword sets.
pub const GUIDANCE: &str =
    "Could not detect mood from your input. Try using words like happy, sad, calm, etc.";

/// One of the five fixed mood categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mood {
    Happy,
    Sad,
    Energetic,
    Calm,
    Romantic,
}

impl Mood {
    /// Evaluation order of `classify`. Earlier entries win ties.
    pub const ALL: [Mood; 5] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Energetic,
        Mood::Calm,
        Mood::Romantic,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Sad => "Sad",
            Mood::Energetic => "Energetic",
            Mood::Calm => "Calm",
            Mood::Romantic => "Romantic",
        }
    }

    /// Lower-case substrings that select this mood.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Mood::Happy => &["happy", "joy", "excited"],
            Mood::Sad => &["sad", "down", "depressed"],
            Mood::Energetic => &["energetic", "pumped", "active"],
            Mood::Calm => &["calm", "relaxed", "peaceful"],
            Mood::Romantic => &["love", "romantic", "crush"],
        }
    }

    pub fn example(self) -> &'static str {
        match self {
            Mood::Happy => "I'm feeling joyful today!",
            Mood::Sad => "I'm feeling a bit down",
            Mood::Energetic => "I need something pumped up",
            Mood::Calm => "I'm feeling relaxed",
            Mood::Romantic => "I'm feeling love in the air",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map free text to a mood. `None` means the text is unrecognized.
pub fn classify(text: &str) -> Option<Mood> {
    let text = text.to_lowercase();
    Mood::ALL
        .into_iter()
        .find(|mood| mood.keywords().iter().any(|kw| text.contains(kw)))
}

/// Optional genre appended to the search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Genre {
    Pop,
    Rock,
    #[serde(rename = "Hip-Hop")]
    HipHop,
    Classical,
    Bollywood,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown genre '{0}', expected one of Pop, Rock, Hip-Hop, Classical, Bollywood")]
pub struct UnknownGenre(pub String);

impl Genre {
    pub const ALL: [Genre; 5] = [
        Genre::Pop,
        Genre::Rock,
        Genre::HipHop,
        Genre::Classical,
        Genre::Bollywood,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Genre::Pop => "Pop",
            Genre::Rock => "Rock",
            Genre::HipHop => "Hip-Hop",
            Genre::Classical => "Classical",
            Genre::Bollywood => "Bollywood",
        }
    }

    /// Blank input means "no genre filter".
    pub fn parse(raw: &str) -> Result<Option<Genre>, UnknownGenre> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        Genre::ALL
            .into_iter()
            .find(|g| g.label().eq_ignore_ascii_case(raw))
            .map(Some)
            .ok_or_else(|| UnknownGenre(raw.to_string()))
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Search query for a mood, optionally narrowed by genre.
pub fn build_query(mood: Mood, genre: Option<Genre>) -> String {
    match genre {
        Some(g) => format!("{} {}", mood.label(), g.label()),
        None => mood.label().to_string(),
    }
}
