use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;

use crate::error::{ConfigError, Result};

static LANG_DIR: Dir = include_dir!("src/lang");

/// A static, ordered list of candidate tokens.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Vocabulary {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl Vocabulary {
    /// Load a bundled vocabulary by file stem, e.g. `"words"`.
    pub fn load(file_name: &str) -> Result<Self> {
        read_vocabulary_from_file(&format!("{file_name}.json"))
    }

    /// Build a vocabulary from in-memory entries.
    pub fn from_words<I, S>(name: &str, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();
        Self {
            name: name.to_string(),
            size: words.len() as u32,
            words,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn read_vocabulary_from_file(file_name: &str) -> Result<Vocabulary> {
    let load_err = |message: &str| ConfigError::VocabularyLoad {
        name: file_name.to_string(),
        message: message.to_string(),
    };

    let file = LANG_DIR
        .get_file(file_name)
        .ok_or_else(|| load_err("vocabulary file not found"))?;

    let file_as_str = file
        .contents_utf8()
        .ok_or_else(|| load_err("vocabulary file is not valid utf-8"))?;

    let vocab: Vocabulary = from_str(file_as_str).map_err(|e| load_err(&e.to_string()))?;

    if vocab.is_empty() {
        return Err(ConfigError::EmptyVocabulary(vocab.name));
    }

    Ok(vocab)
}
