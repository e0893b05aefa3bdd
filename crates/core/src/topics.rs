//! Debate topics
//!
//! Topics are only consulted when a room is created. A model-backed source may
//! be configured; [`TopicBank`] is the built-in source and the fallback.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::scoring::OracleError;

/// Number of suggestions returned for a genre
pub const TOPICS_PER_GENRE: usize = 3;

/// Topic category offered to players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Sports,
    Cinema,
    Philosophy,
    Music,
    Geopolitics,
    Brainrot,
}

impl Genre {
    pub const ALL: [Genre; 6] = [
        Genre::Sports,
        Genre::Cinema,
        Genre::Philosophy,
        Genre::Music,
        Genre::Geopolitics,
        Genre::Brainrot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Sports => "sports",
            Genre::Cinema => "cinema",
            Genre::Philosophy => "philosophy",
            Genre::Music => "music",
            Genre::Geopolitics => "geopolitics",
            Genre::Brainrot => "brainrot",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Genre::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::Validation(format!("unknown genre: {}", wanted)))
    }
}

#[async_trait]
pub trait TopicSource: Send + Sync {
    /// A single topic from any genre
    async fn generate_topic(&self) -> Result<String, OracleError>;

    /// Exactly [`TOPICS_PER_GENRE`] topics for `genre`
    async fn topics_for_genre(&self, genre: Genre) -> Result<Vec<String>, OracleError>;
}

/// Curated offline topics
#[derive(Debug, Default, Clone, Copy)]
pub struct TopicBank;

impl TopicBank {
    fn pool(genre: Genre) -> &'static [&'static str] {
        match genre {
            Genre::Sports => &[
                "Penalty shootouts are a fair way to decide a final",
                "Esports deserve a place at the Olympics",
                "Video review has made football worse",
                "The designated hitter rule improved baseball",
                "Marathon running is the purest sport",
            ],
            Genre::Cinema => &[
                "Sequels are usually better than remakes",
                "Practical effects beat CGI every time",
                "Three hours is too long for any film",
                "Animated films deserve best picture nominations",
                "Streaming releases have killed the movie theater",
            ],
            Genre::Philosophy => &[
                "Free will is an illusion",
                "It is never right to lie",
                "A perfect simulation of you would still be you",
                "Happiness matters more than truth",
                "We owe more to future generations than to ourselves",
            ],
            Genre::Music => &[
                "Vinyl sounds better than streaming",
                "Lyrics matter more than melody",
                "Auto-tune is a legitimate instrument",
                "The album format is obsolete",
                "Live recordings beat studio recordings",
            ],
            Genre::Geopolitics => &[
                "Space exploration should be run by nations, not companies",
                "Every country should adopt a four-day work week",
                "Small states benefit most from global trade",
                "International sporting bans are an effective sanction",
                "A single world language would do more good than harm",
            ],
            Genre::Brainrot => &[
                "A hot dog is a sandwich",
                "Cereal is a soup",
                "Pineapple belongs on pizza",
                "Cats are secretly running the internet",
                "Water is wet",
            ],
        }
    }

    /// `count` distinct topics from one genre
    pub fn pick<R: Rng + ?Sized>(rng: &mut R, genre: Genre, count: usize) -> Vec<String> {
        Self::pool(genre)
            .choose_multiple(rng, count)
            .map(|t| t.to_string())
            .collect()
    }

    /// One topic from a random genre
    pub fn any<R: Rng + ?Sized>(rng: &mut R) -> String {
        let genre = Genre::ALL[rng.gen_range(0..Genre::ALL.len())];
        Self::pool(genre)
            .choose(rng)
            .map(|t| t.to_string())
            .unwrap_or_else(|| "Water is wet".to_string())
    }
}

#[async_trait]
impl TopicSource for TopicBank {
    async fn generate_topic(&self) -> Result<String, OracleError> {
        Ok(Self::any(&mut rand::thread_rng()))
    }

    async fn topics_for_genre(&self, genre: Genre) -> Result<Vec<String>, OracleError> {
        Ok(Self::pick(&mut rand::thread_rng(), genre, TOPICS_PER_GENRE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_parse() {
        assert_eq!("Cinema".parse::<Genre>().unwrap(), Genre::Cinema);
        assert_eq!(" brainrot ".parse::<Genre>().unwrap(), Genre::Brainrot);
        assert!(matches!("cooking".parse::<Genre>(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_genre_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Genre::Geopolitics).unwrap(), "\"geopolitics\"");
    }

    #[test]
    fn test_every_genre_has_enough_topics() {
        for genre in Genre::ALL {
            assert!(TopicBank::pool(genre).len() >= TOPICS_PER_GENRE, "{genre}");
        }
    }

    #[tokio::test]
    async fn test_bank_returns_three_distinct() {
        let topics = TopicBank.topics_for_genre(Genre::Music).await.unwrap();
        assert_eq!(topics.len(), TOPICS_PER_GENRE);
        let mut unique = topics.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), TOPICS_PER_GENRE);
    }

    #[tokio::test]
    async fn test_bank_generates_non_empty_topic() {
        let topic = TopicBank.generate_topic().await.unwrap();
        assert!(!topic.trim().is_empty());
    }
}
