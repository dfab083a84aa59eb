use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

static CORPUS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/corpus");

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus file not found: {0}")]
    Missing(String),
    #[error("corpus file {0} is not valid utf-8")]
    NotUtf8(String),
    #[error("unable to deserialize corpus file {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("corpus list '{0}' is empty")]
    Empty(&'static str),
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase", from = "String")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl From<String> for Difficulty {
    fn from(name: String) -> Self {
        Difficulty::from_name(&name)
    }
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Parse a stored or user supplied name, falling back to `Medium`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            other => {
                tracing::warn!("unknown difficulty '{}', using medium", other);
                Difficulty::Medium
            }
        }
    }

    pub fn sentence_count(&self) -> usize {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Medium => 5,
            Difficulty::Hard => 7,
        }
    }

    pub fn words_per_sentence(&self) -> RangeInclusive<usize> {
        match self {
            Difficulty::Easy => 5..=7,
            Difficulty::Medium => 6..=9,
            Difficulty::Hard => 8..=12,
        }
    }

    pub fn quote_count(&self) -> usize {
        match self {
            Difficulty::Easy | Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase", from = "String")]
#[strum(serialize_all = "lowercase")]
pub enum ContentType {
    #[default]
    Random,
    Code,
    Quotes,
}

impl From<String> for ContentType {
    fn from(name: String) -> Self {
        ContentType::from_name(&name)
    }
}

impl ContentType {
    pub const ALL: [ContentType; 3] = [ContentType::Random, ContentType::Code, ContentType::Quotes];

    /// Parse a stored or user supplied name, falling back to `Random`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "random" => ContentType::Random,
            "code" => ContentType::Code,
            "quotes" => ContentType::Quotes,
            other => {
                tracing::warn!("unknown content type '{}', using random", other);
                ContentType::Random
            }
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ContentType::Random => ContentType::Code,
            ContentType::Code => ContentType::Quotes,
            ContentType::Quotes => ContentType::Random,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
struct WordLists {
    easy: Vec<String>,
    medium: Vec<String>,
    hard: Vec<String>,
}

#[derive(Deserialize)]
struct Snippets {
    snippets: Vec<String>,
}

#[derive(Deserialize)]
struct Quotes {
    quotes: Vec<String>,
}

#[derive(Deserialize)]
struct Tips {
    tips: Vec<String>,
}

/// Fixed practice material embedded in the binary
#[derive(Clone, Debug)]
pub struct Corpus {
    words: WordLists,
    pub snippets: Vec<String>,
    pub quotes: Vec<String>,
    pub tips: Vec<String>,
}

impl Corpus {
    pub fn embedded() -> Result<Self, CorpusError> {
        let words: WordLists = read_corpus_file("words.json")?;
        let Snippets { snippets } = read_corpus_file("code.json")?;
        let Quotes { quotes } = read_corpus_file("quotes.json")?;
        let Tips { tips } = read_corpus_file("tips.json")?;

        for (name, list) in [
            ("easy", &words.easy),
            ("medium", &words.medium),
            ("hard", &words.hard),
            ("snippets", &snippets),
            ("quotes", &quotes),
            ("tips", &tips),
        ] {
            if list.is_empty() {
                return Err(CorpusError::Empty(name));
            }
        }

        Ok(Self {
            words,
            snippets,
            quotes,
            tips,
        })
    }

    pub fn words(&self, difficulty: Difficulty) -> &[String] {
        match difficulty {
            Difficulty::Easy => &self.words.easy,
            Difficulty::Medium => &self.words.medium,
            Difficulty::Hard => &self.words.hard,
        }
    }
}

fn read_corpus_file<T: DeserializeOwned>(file_name: &str) -> Result<T, CorpusError> {
    let file = CORPUS_DIR
        .get_file(file_name)
        .ok_or_else(|| CorpusError::Missing(file_name.to_string()))?;

    let contents = file
        .contents_utf8()
        .ok_or_else(|| CorpusError::NotUtf8(file_name.to_string()))?;

    serde_json::from_str(contents).map_err(|source| CorpusError::Json {
        file: file_name.to_string(),
        source,
    })
}

/// Builds practice passages from the embedded corpus.
///
/// The random source is injected so a seeded generator yields a reproducible
/// sequence of passages.
#[derive(Debug)]
pub struct TextGenerator<R: Rng = StdRng> {
    corpus: Corpus,
    rng: R,
}

impl TextGenerator<StdRng> {
    pub fn from_entropy() -> Result<Self, CorpusError> {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Result<Self, CorpusError> {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> TextGenerator<R> {
    pub fn new(rng: R) -> Result<Self, CorpusError> {
        Ok(Self {
            corpus: Corpus::embedded()?,
            rng,
        })
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn generate(&mut self, difficulty: Difficulty, content_type: ContentType) -> String {
        match content_type {
            ContentType::Code => self.code_snippet(),
            ContentType::Quotes => self.quotes(difficulty.quote_count()),
            ContentType::Random => self.sentences(difficulty),
        }
    }

    pub fn random_tip(&mut self) -> String {
        pick(&self.corpus.tips, &mut self.rng)
    }

    fn code_snippet(&mut self) -> String {
        pick(&self.corpus.snippets, &mut self.rng)
    }

    fn quotes(&mut self, count: usize) -> String {
        (0..count)
            .map(|_| pick(&self.corpus.quotes, &mut self.rng))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn sentences(&mut self, difficulty: Difficulty) -> String {
        let words = self.corpus.words(difficulty);
        let mut text = String::new();

        for _ in 0..difficulty.sentence_count() {
            let word_count = self.rng.gen_range(difficulty.words_per_sentence());
            let sentence = (0..word_count)
                .map(|j| {
                    let word = pick(words, &mut self.rng);
                    if j == 0 {
                        capitalize(&word)
                    } else {
                        word
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");

            text.push_str(&sentence);
            text.push_str(". ");
        }

        text.trim().to_string()
    }
}

fn pick<R: Rng>(items: &[String], rng: &mut R) -> String {
    items.choose(rng).cloned().unwrap_or_default()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
