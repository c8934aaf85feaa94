use rand::Rng;

use crate::language::Vocabulary;

/// One unit of target text: a word, or a whole sentence.
pub type Token = String;

/// Non-fatal conditions noticed while sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceDiagnostic {
    /// Fewer than two distinct entries; consecutive repeats could not be avoided.
    RepeatsAllowed,
    /// The vocabulary was empty, so nothing was generated.
    EmptyVocabulary,
}

/// Tokens produced by a single generation call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Batch {
    pub tokens: Vec<Token>,
    pub diagnostic: Option<SourceDiagnostic>,
}

/// Samples tokens uniformly from a vocabulary, never emitting the same token twice in a row.
#[derive(Debug)]
pub struct TokenSource<R: Rng> {
    vocabulary: Vocabulary,
    rng: R,
}

impl<R: Rng> TokenSource<R> {
    pub fn new(vocabulary: Vocabulary, rng: R) -> Self {
        Self { vocabulary, rng }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn generate_batch(&mut self, count: usize) -> Batch {
        self.sample_after(None, count)
    }

    /// Append `count` tokens to `existing`, honouring no-repeat against its last token.
    pub fn extend(&mut self, existing: &mut Vec<Token>, count: usize) -> Option<SourceDiagnostic> {
        let batch = self.sample_after(existing.last().map(String::as_str), count);
        existing.extend(batch.tokens);
        batch.diagnostic
    }

    fn sample_after(&mut self, previous: Option<&str>, count: usize) -> Batch {
        let words = &self.vocabulary.words;
        if count == 0 {
            return Batch::default();
        }
        if words.is_empty() {
            tracing::warn!(vocabulary = %self.vocabulary.name, "cannot sample from empty vocabulary");
            return Batch {
                tokens: Vec::new(),
                diagnostic: Some(SourceDiagnostic::EmptyVocabulary),
            };
        }

        let degenerate = !has_two_distinct(words);
        let needs_resampling = count > 1 || previous.is_some();
        let diagnostic = (degenerate && needs_resampling).then(|| {
            tracing::warn!(
                vocabulary = %self.vocabulary.name,
                "fewer than two distinct tokens, allowing consecutive repeats"
            );
            SourceDiagnostic::RepeatsAllowed
        });

        let mut tokens: Vec<Token> = Vec::with_capacity(count);
        for _ in 0..count {
            let before = tokens.last().map(String::as_str).or(previous);
            let next = loop {
                let candidate = &words[self.rng.gen_range(0..words.len())];
                if degenerate || before != Some(candidate.as_str()) {
                    break candidate.clone();
                }
            };
            tokens.push(next);
        }

        Batch { tokens, diagnostic }
    }
}

fn has_two_distinct(words: &[String]) -> bool {
    words.iter().any(|w| w != &words[0])
}

/// True if no token equals its immediate predecessor.
pub fn has_no_immediate_repeat(tokens: &[Token]) -> bool {
    tokens.windows(2).all(|pair| pair[0] != pair[1])
}
