use chrono::{DateTime, Local};
use rand::{rngs::StdRng, SeedableRng};

use crate::classifier::{classify, CharClass};
use crate::clock::{Clock, SystemClock};
use crate::config::{validate_time_limit, Mode, SessionConfig, VocabularyKind};
use crate::countdown::{CountdownTimer, TimerEvent};
use crate::error::{ConfigError, Result};
use crate::language::Vocabulary;
use crate::stats::Stats;
use crate::token_source::{SourceDiagnostic, Token, TokenSource};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// waiting for the first keystroke
    Idle,
    Active,
    /// terminal until reset
    Finished,
}

/// Whether an inbound event changed the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Applied,
    Ignored,
}

impl InputOutcome {
    pub fn is_applied(&self) -> bool {
        *self == InputOutcome::Applied
    }

    fn or(self, other: InputOutcome) -> InputOutcome {
        if self.is_applied() || other.is_applied() {
            InputOutcome::Applied
        } else {
            InputOutcome::Ignored
        }
    }
}

/// Snapshot of the results, taken when a session finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub wpm: u32,
    pub accuracy: u32,
    pub correct_chars: usize,
    pub total_typed_chars: usize,
    pub tokens_committed: usize,
    pub elapsed_secs: f64,
    pub consistency: f64,
    pub finished_at: DateTime<Local>,
}

/// Owns one typing session and applies input and timer events to it.
#[derive(Debug)]
pub struct SessionEngine<C: Clock = SystemClock> {
    config: SessionConfig,
    source: TokenSource<StdRng>,
    clock: C,
    timer: Option<CountdownTimer>,
    state: SessionState,
    tokens: Vec<Token>,
    initial_len: usize,
    cursor: usize,
    active: String,
    committed: Vec<String>,
    stats: Stats,
    started_at_ms: Option<u64>,
    finished_at_ms: Option<u64>,
    diagnostic: Option<SourceDiagnostic>,
    summary: Option<SessionSummary>,
}

impl SessionEngine<SystemClock> {
    /// Create a session using the bundled vocabulary and the wall clock.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let vocabulary = config.vocabulary.load()?;
        Self::with_clock(config, vocabulary, SystemClock::new(), StdRng::from_entropy())
    }
}

impl<C: Clock> SessionEngine<C> {
    pub fn with_clock(
        config: SessionConfig,
        vocabulary: Vocabulary,
        clock: C,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;
        if vocabulary.is_empty() {
            return Err(ConfigError::EmptyVocabulary(vocabulary.name));
        }

        let mut engine = Self {
            config,
            source: TokenSource::new(vocabulary, rng),
            clock,
            timer: None,
            state: SessionState::Idle,
            tokens: Vec::new(),
            initial_len: 0,
            cursor: 0,
            active: String::new(),
            committed: Vec::new(),
            stats: Stats::default(),
            started_at_ms: None,
            finished_at_ms: None,
            diagnostic: None,
            summary: None,
        };
        engine.reset();
        Ok(engine)
    }

    pub fn character_entered(&mut self, ch: char) -> InputOutcome {
        self.on_tick();
        match self.state {
            SessionState::Finished => return InputOutcome::Ignored,
            SessionState::Idle => self.start(),
            SessionState::Active => {}
        }
        self.active.push(ch);
        self.stats.on_char_entered();
        InputOutcome::Applied
    }

    /// Remove the last character of the active token. Never reaches into committed tokens.
    pub fn character_deleted(&mut self) -> InputOutcome {
        self.on_tick();
        if self.state != SessionState::Active || self.active.pop().is_none() {
            return InputOutcome::Ignored;
        }
        self.stats.on_char_deleted();
        InputOutcome::Applied
    }

    /// Commit the active buffer against the token at the cursor.
    pub fn word_boundary(&mut self) -> InputOutcome {
        self.on_tick();
        if self.state != SessionState::Active {
            return InputOutcome::Ignored;
        }

        let typed = std::mem::take(&mut self.active);
        let target = &self.tokens[self.cursor];
        let matched = self.stats.on_word_committed(target, &typed);
        tracing::debug!(
            cursor = self.cursor,
            matched,
            target_len = target.chars().count(),
            typed_len = typed.chars().count(),
            "token committed"
        );
        self.committed.push(typed);
        self.cursor += 1;
        let elapsed_ms = self.elapsed_ms();
        self.stats.record_sample(elapsed_ms);

        if self.cursor == self.tokens.len() {
            match self.config.mode {
                Mode::Fixed => {
                    let now = self.clock.now_ms();
                    self.finish(now);
                }
                Mode::Timed => self.replenish(),
            }
        }
        InputOutcome::Applied
    }

    /// Route a raw character: boundary characters commit, anything else is typed.
    pub fn handle_char(&mut self, ch: char) -> InputOutcome {
        if self.is_boundary(ch) {
            self.word_boundary()
        } else {
            self.character_entered(ch)
        }
    }

    /// Apply the whole new value of a text field, expressed as entries, deletions
    /// and boundaries relative to the active buffer.
    pub fn input_changed(&mut self, new_value: &str) -> InputOutcome {
        if self.state == SessionState::Finished {
            return InputOutcome::Ignored;
        }

        let shared = self
            .active
            .chars()
            .zip(new_value.chars())
            .take_while(|(a, b)| a == b)
            .count();
        let removed = self.active.chars().count() - shared;

        let mut outcome = InputOutcome::Ignored;
        for _ in 0..removed {
            outcome = outcome.or(self.character_deleted());
        }
        for ch in new_value.chars().skip(shared) {
            outcome = outcome.or(self.handle_char(ch));
        }
        outcome
    }

    /// Change the countdown length. In timed mode this restarts the session.
    pub fn time_limit_changed(&mut self, secs: u64) -> Result<()> {
        validate_time_limit(secs)?;
        self.config.time_limit_secs = secs;
        if self.config.is_timed() {
            tracing::info!(secs, "time limit changed, resetting session");
            self.reset();
        }
        Ok(())
    }

    /// Start over with a freshly sampled token sequence.
    pub fn reset(&mut self) {
        let batch = self.source.generate_batch(self.config.token_count);
        self.diagnostic = batch.diagnostic;
        self.load(batch.tokens);
    }

    /// Start over on the same tokens the session began with.
    pub fn retry(&mut self) {
        let tokens = self.tokens[..self.initial_len].to_vec();
        self.load(tokens);
    }

    /// Start over on caller-provided tokens, e.g. a custom prompt.
    pub fn reset_with_tokens(&mut self, tokens: Vec<Token>) -> Result<()> {
        if tokens.is_empty() {
            return Err(ConfigError::ZeroTokenCount);
        }
        self.diagnostic = None;
        self.load(tokens);
        Ok(())
    }

    /// Advance the countdown to the current time. Input handlers call this
    /// first, so keys landing after the deadline are rejected even between ticks.
    pub fn on_tick(&mut self) -> Option<TimerEvent> {
        if self.state != SessionState::Active {
            return None;
        }
        let now = self.clock.now_ms();
        let event = self.timer.as_mut()?.advance(now);
        if event == Some(TimerEvent::Expired) {
            self.time_expired();
        }
        event
    }

    /// End the session because time ran out, wherever the cursor is.
    ///
    /// The session ends at the deadline, not at whenever this was noticed.
    pub fn time_expired(&mut self) -> InputOutcome {
        if self.state != SessionState::Active {
            return InputOutcome::Ignored;
        }
        let now = self.clock.now_ms();
        let at_ms = match (self.started_at_ms, self.timer.as_ref()) {
            (Some(start), Some(timer)) => now.min(start + timer.limit_secs() * 1000),
            _ => now,
        };
        self.finish(at_ms);
        InputOutcome::Applied
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn active_buffer(&self) -> &str {
        &self.active
    }

    pub fn committed_inputs(&self) -> &[String] {
        &self.committed
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Per-character classes for the token at `index`, or `None` for tokens not yet reached.
    pub fn classification(&self, index: usize) -> Option<Vec<CharClass>> {
        let target = self.tokens.get(index)?;
        if index < self.cursor {
            let typed = self.committed.get(index).map(String::as_str).unwrap_or("");
            Some(classify(target, typed, false))
        } else if index == self.cursor {
            Some(classify(target, &self.active, true))
        } else {
            None
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self.started_at_ms {
            Some(start) => self
                .finished_at_ms
                .unwrap_or_else(|| self.clock.now_ms())
                .saturating_sub(start),
            None => 0,
        }
    }

    pub fn live_wpm(&self) -> u32 {
        self.stats.wpm(self.elapsed_ms())
    }

    pub fn live_accuracy(&self) -> u32 {
        self.stats.accuracy()
    }

    /// Seconds left on the countdown; `None` outside timed mode.
    pub fn remaining_seconds(&self) -> Option<u64> {
        self.timer.as_ref().map(CountdownTimer::remaining_secs)
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    /// Diagnostic from the most recent token generation, if any.
    pub fn diagnostic(&self) -> Option<SourceDiagnostic> {
        self.diagnostic
    }

    pub fn is_boundary(&self, ch: char) -> bool {
        match ch {
            '\n' | '\r' => true,
            ' ' => self.config.vocabulary == VocabularyKind::Words,
            _ => false,
        }
    }

    fn load(&mut self, tokens: Vec<Token>) {
        self.initial_len = tokens.len();
        self.tokens = tokens;
        self.state = SessionState::Idle;
        self.cursor = 0;
        self.active.clear();
        self.committed.clear();
        self.stats = Stats::default();
        self.started_at_ms = None;
        self.finished_at_ms = None;
        self.summary = None;
        if self.config.is_timed() {
            let limit = self.config.time_limit_secs;
            match self.timer.as_mut() {
                Some(timer) => timer.reset(limit),
                None => self.timer = Some(CountdownTimer::new(limit)),
            }
        } else {
            self.timer = None;
        }
        tracing::info!(
            mode = %self.config.mode,
            vocabulary = %self.config.vocabulary,
            tokens = self.tokens.len(),
            "session reset"
        );
    }

    fn start(&mut self) {
        let now = self.clock.now_ms();
        self.started_at_ms = Some(now);
        self.state = SessionState::Active;
        if let Some(timer) = self.timer.as_mut() {
            timer.start(now);
        }
        tracing::info!(mode = %self.config.mode, "session started");
    }

    fn replenish(&mut self) {
        let diagnostic = self
            .source
            .extend(&mut self.tokens, self.config.token_count);
        if diagnostic.is_some() {
            self.diagnostic = diagnostic;
        }
        tracing::debug!(tokens = self.tokens.len(), "token sequence extended");
    }

    fn finish(&mut self, at_ms: u64) {
        self.finished_at_ms = Some(at_ms);
        self.state = SessionState::Finished;
        if let Some(timer) = self.timer.as_mut() {
            timer.stop();
        }

        let elapsed_ms = self.elapsed_ms();
        self.stats.record_sample(elapsed_ms);
        let summary = SessionSummary {
            wpm: self.stats.wpm(elapsed_ms),
            accuracy: self.stats.accuracy(),
            correct_chars: self.stats.correct_chars,
            total_typed_chars: self.stats.total_typed_chars,
            tokens_committed: self.cursor,
            elapsed_secs: elapsed_ms as f64 / 1000.0,
            consistency: self.stats.consistency(),
            finished_at: Local::now(),
        };
        tracing::info!(
            wpm = summary.wpm,
            accuracy = summary.accuracy,
            tokens = summary.tokens_committed,
            "session finished"
        );
        self.summary = Some(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::token_source::has_no_immediate_repeat;
    use assert_matches::assert_matches;

    fn engine(config: SessionConfig, words: &[&str]) -> (SessionEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let engine = SessionEngine::with_clock(
            config,
            Vocabulary::from_words("test", words.iter().copied()),
            clock.clone(),
            StdRng::seed_from_u64(42),
        )
        .unwrap();
        (engine, clock)
    }

    fn fixed(tokens: &[&str]) -> (SessionEngine<ManualClock>, ManualClock) {
        let (mut e, clock) = engine(
            SessionConfig::fixed(VocabularyKind::Words, tokens.len()),
            tokens,
        );
        e.reset_with_tokens(tokens.iter().map(|t| t.to_string()).collect())
            .unwrap();
        (e, clock)
    }

    fn type_str<C: Clock>(e: &mut SessionEngine<C>, s: &str) {
        for ch in s.chars() {
            e.handle_char(ch);
        }
    }

    #[test]
    fn test_new_session_is_idle() {
        let (e, _) = engine(SessionConfig::fixed(VocabularyKind::Words, 10), &["a", "b", "c"]);
        assert_eq!(e.state(), SessionState::Idle);
        assert_eq!(e.tokens().len(), 10);
        assert!(has_no_immediate_repeat(e.tokens()));
        assert_eq!(e.cursor(), 0);
        assert_eq!(e.active_buffer(), "");
        assert_eq!(e.live_wpm(), 0);
        assert_eq!(e.live_accuracy(), 100);
        assert_eq!(e.remaining_seconds(), None);
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let clock = ManualClock::new();
        let vocab = Vocabulary::from_words("test", ["a", "b"]);

        let zero = SessionConfig::fixed(VocabularyKind::Words, 0);
        assert_matches!(
            SessionEngine::with_clock(zero, vocab.clone(), clock.clone(), StdRng::seed_from_u64(1)),
            Err(ConfigError::ZeroTokenCount)
        );

        let odd_limit = SessionConfig::timed(VocabularyKind::Words, 20);
        assert_matches!(
            SessionEngine::with_clock(odd_limit, vocab, clock.clone(), StdRng::seed_from_u64(1)),
            Err(ConfigError::UnsupportedTimeLimit(20))
        );

        let empty = Vocabulary::from_words("none", Vec::<String>::new());
        assert_matches!(
            SessionEngine::with_clock(SessionConfig::default(), empty, clock, StdRng::seed_from_u64(1)),
            Err(ConfigError::EmptyVocabulary(_))
        );
    }

    #[test]
    fn test_input_before_first_char_is_ignored() {
        let (mut e, _) = fixed(&["cat", "dog"]);
        assert_eq!(e.character_deleted(), InputOutcome::Ignored);
        assert_eq!(e.word_boundary(), InputOutcome::Ignored);
        assert_eq!(e.state(), SessionState::Idle);
        assert_eq!(e.cursor(), 0);
    }

    #[test]
    fn test_first_char_starts_session() {
        let (mut e, clock) = fixed(&["cat", "dog"]);
        clock.advance_secs(5);

        assert_eq!(e.character_entered('c'), InputOutcome::Applied);
        assert_eq!(e.state(), SessionState::Active);

        clock.advance_secs(2);
        assert_eq!(e.elapsed_ms(), 2_000);
    }

    #[test]
    fn test_fixed_session_perfect_run() {
        let (mut e, clock) = fixed(&["cat", "dog", "sun"]);

        for word in ["cat", "dog", "sun"] {
            for ch in word.chars() {
                e.character_entered(ch);
                clock.advance_ms(200);
            }
            e.word_boundary();
        }

        assert_eq!(e.state(), SessionState::Finished);
        assert_eq!(e.stats().correct_chars, 9);
        assert_eq!(e.stats().total_typed_chars, 9);
        assert_eq!(e.live_accuracy(), 100);
        assert_eq!(e.committed_inputs(), &["cat", "dog", "sun"]);
        assert_eq!(e.cursor(), e.committed_inputs().len());

        let summary = e.summary().unwrap();
        assert_eq!(summary.accuracy, 100);
        assert_eq!(summary.tokens_committed, 3);
        // 9 correct chars in 1.8s
        assert_eq!(summary.wpm, 60);
    }

    #[test]
    fn test_mistyped_word_scores_matching_positions() {
        let (mut e, _) = fixed(&["cat", "dog"]);
        type_str(&mut e, "cot ");

        assert_eq!(e.stats().correct_chars, 2);
        assert_eq!(e.stats().total_typed_chars, 3);
        assert!(e.live_accuracy() < 100);
        assert_eq!(
            e.classification(0).unwrap(),
            vec![CharClass::Correct, CharClass::Incorrect, CharClass::Correct]
        );
    }

    #[test]
    fn test_delete_after_enter_restores_state() {
        let (mut e, _) = fixed(&["cat", "dog"]);
        type_str(&mut e, "ca");
        let before = (e.active_buffer().to_string(), e.stats().total_typed_chars);

        e.character_entered('x');
        e.character_deleted();

        assert_eq!(
            (e.active_buffer().to_string(), e.stats().total_typed_chars),
            before
        );
    }

    #[test]
    fn test_delete_does_not_spill_into_committed_token() {
        let (mut e, _) = fixed(&["cat", "dog"]);
        type_str(&mut e, "cat ");

        assert_eq!(e.character_deleted(), InputOutcome::Ignored);
        assert_eq!(e.cursor(), 1);
        assert_eq!(e.committed_inputs(), &["cat"]);
        assert_eq!(e.stats().total_typed_chars, 3);
    }

    #[test]
    fn test_empty_commit_scores_whole_token_incorrect() {
        let (mut e, _) = fixed(&["cat", "dog"]);
        type_str(&mut e, "c");
        e.character_deleted();
        e.word_boundary();

        assert_eq!(e.cursor(), 1);
        assert_eq!(e.committed_inputs(), &[""]);
        assert_eq!(e.classification(0).unwrap(), vec![CharClass::Incorrect; 3]);
        assert_eq!(e.stats().correct_chars, 0);
    }

    #[test]
    fn test_classification_window() {
        let (mut e, _) = fixed(&["cat", "dog", "sun"]);
        type_str(&mut e, "cat d");

        assert_eq!(e.classification(0).unwrap(), vec![CharClass::Correct; 3]);
        assert_eq!(
            e.classification(1).unwrap(),
            vec![CharClass::Correct, CharClass::Pending, CharClass::Untyped]
        );
        assert_eq!(e.classification(2), None);
        assert_eq!(e.classification(99), None);
    }

    #[test]
    fn test_finished_rejects_input() {
        let (mut e, _) = fixed(&["hi"]);
        type_str(&mut e, "hi ");
        assert_eq!(e.state(), SessionState::Finished);

        assert_eq!(e.character_entered('x'), InputOutcome::Ignored);
        assert_eq!(e.character_deleted(), InputOutcome::Ignored);
        assert_eq!(e.word_boundary(), InputOutcome::Ignored);
        assert_eq!(e.input_changed("zzz"), InputOutcome::Ignored);
        assert_eq!(e.stats().total_typed_chars, 2);
    }

    #[test]
    fn test_wpm_frozen_after_finish() {
        let (mut e, clock) = fixed(&["hello"]);
        e.character_entered('h');
        clock.advance_secs(6);
        type_str(&mut e, "ello ");
        let wpm = e.live_wpm();

        clock.advance_secs(60);
        assert_eq!(e.live_wpm(), wpm);
        assert_eq!(wpm, 10);
    }

    #[test]
    fn test_sentence_mode_spaces_are_typed() {
        let (mut e, _) = engine(
            SessionConfig::fixed(VocabularyKind::Sentences, 1),
            &["a b", "c d"],
        );
        e.reset_with_tokens(vec!["a b".into()]).unwrap();

        type_str(&mut e, "a b");
        assert_eq!(e.cursor(), 0);
        assert_eq!(e.active_buffer(), "a b");

        e.handle_char('\n');
        assert_eq!(e.state(), SessionState::Finished);
        assert_eq!(e.stats().correct_chars, 3);
    }

    #[test]
    fn test_input_changed_decomposes_edits() {
        let (mut e, _) = fixed(&["cat", "dog", "sun"]);

        assert_eq!(e.input_changed("ca"), InputOutcome::Applied);
        assert_eq!(e.active_buffer(), "ca");
        assert_eq!(e.stats().total_typed_chars, 2);

        e.input_changed("cx");
        assert_eq!(e.active_buffer(), "cx");
        assert_eq!(e.stats().total_typed_chars, 2);

        e.input_changed("cxt ");
        assert_eq!(e.cursor(), 1);
        assert_eq!(e.active_buffer(), "");
        assert_eq!(e.committed_inputs(), &["cxt"]);

        assert_eq!(e.input_changed(""), InputOutcome::Ignored);

        e.input_changed("dog sun ");
        assert_eq!(e.state(), SessionState::Finished);
        assert_eq!(e.stats().correct_chars, 8);
    }

    #[test]
    fn test_timed_session_extends_tokens() {
        let mut config = SessionConfig::timed(VocabularyKind::Words, 15);
        config.token_count = 5;
        let (mut e, _) = engine(config, &["cat", "dog", "sun", "sky"]);
        assert_eq!(e.tokens().len(), 5);
        assert_eq!(e.remaining_seconds(), Some(15));

        for i in 0..5 {
            let word = e.tokens()[i].clone();
            type_str(&mut e, &word);
            e.word_boundary();
        }

        assert_eq!(e.cursor(), 5);
        assert_eq!(e.tokens().len(), 10);
        assert_eq!(e.state(), SessionState::Active);
        assert!(has_no_immediate_repeat(e.tokens()));
    }

    #[test]
    fn test_timer_expiry_finishes_mid_sequence() {
        let (mut e, clock) = engine(SessionConfig::timed(VocabularyKind::Words, 15), &["ab", "cd"]);

        assert_eq!(e.on_tick(), None);
        type_str(&mut e, "a");

        clock.advance_secs(14);
        assert_eq!(e.on_tick(), None);
        assert_eq!(e.remaining_seconds(), Some(1));
        assert_eq!(e.state(), SessionState::Active);

        clock.advance_secs(1);
        assert_eq!(e.on_tick(), Some(TimerEvent::Expired));
        assert_eq!(e.state(), SessionState::Finished);
        assert_eq!(e.remaining_seconds(), Some(0));

        assert_eq!(e.character_entered('b'), InputOutcome::Ignored);
        assert_eq!(e.active_buffer(), "a");
        assert_eq!(e.on_tick(), None);
        assert_eq!(e.summary().unwrap().elapsed_secs, 15.0);
    }

    #[test]
    fn test_time_expired_only_while_active() {
        let (mut e, _) = engine(SessionConfig::timed(VocabularyKind::Words, 30), &["ab", "cd"]);
        assert_eq!(e.time_expired(), InputOutcome::Ignored);
        e.character_entered('a');
        assert_eq!(e.time_expired(), InputOutcome::Applied);
        assert_eq!(e.time_expired(), InputOutcome::Ignored);
    }

    #[test]
    fn test_keys_past_deadline_are_rejected_between_ticks() {
        let (mut e, clock) = engine(SessionConfig::timed(VocabularyKind::Words, 15), &["ab", "cd"]);
        type_str(&mut e, "a");

        clock.advance_ms(14_999);
        assert_eq!(e.character_entered('b'), InputOutcome::Applied);
        assert_eq!(e.remaining_seconds(), Some(1));

        clock.advance_ms(1);
        assert_eq!(e.character_entered('x'), InputOutcome::Ignored);
        assert_eq!(e.state(), SessionState::Finished);
        assert_eq!(e.character_deleted(), InputOutcome::Ignored);
        assert_eq!(e.word_boundary(), InputOutcome::Ignored);
        assert_eq!(e.input_changed("abz"), InputOutcome::Ignored);

        assert_eq!(e.active_buffer(), "ab");
        assert_eq!(e.stats().total_typed_chars, 2);
        assert_eq!(e.remaining_seconds(), Some(0));
        assert_eq!(e.summary().unwrap().elapsed_secs, 15.0);
    }

    #[test]
    fn test_late_tick_finishes_at_deadline() {
        let (mut e, clock) = engine(SessionConfig::timed(VocabularyKind::Words, 15), &["ab", "cd"]);
        let first = e.tokens()[0].clone();
        type_str(&mut e, &first);
        e.word_boundary();

        clock.advance_secs(40);
        assert_eq!(e.on_tick(), Some(TimerEvent::Expired));

        assert_eq!(e.elapsed_ms(), 15_000);
        let summary = e.summary().unwrap();
        assert_eq!(summary.elapsed_secs, 15.0);
        // 2 correct chars over a quarter minute
        assert_eq!(summary.wpm, 2);
        assert_eq!(e.stats().wpm_samples.last().unwrap().t, 15.0);
    }

    #[test]
    fn test_reset_rearms_countdown() {
        let (mut e, clock) = engine(SessionConfig::timed(VocabularyKind::Words, 15), &["ab", "cd"]);
        type_str(&mut e, "a");
        clock.advance_secs(15);
        e.on_tick();
        assert_eq!(e.state(), SessionState::Finished);

        e.reset();
        assert_eq!(e.remaining_seconds(), Some(15));
        type_str(&mut e, "a");
        clock.advance_secs(2);
        assert_eq!(e.on_tick(), None);
        assert_eq!(e.remaining_seconds(), Some(13));
        assert_eq!(e.state(), SessionState::Active);
    }

    #[test]
    fn test_reset_from_finished() {
        let (mut e, _) = engine(SessionConfig::fixed(VocabularyKind::Words, 3), &["x", "y", "z"]);
        type_str(&mut e, "a b c ");
        assert_eq!(e.state(), SessionState::Finished);

        e.reset();

        assert_eq!(e.state(), SessionState::Idle);
        assert_eq!(e.cursor(), 0);
        assert!(e.committed_inputs().is_empty());
        assert_eq!(e.stats().correct_chars, 0);
        assert_eq!(e.stats().total_typed_chars, 0);
        assert_eq!(e.tokens().len(), 3);
        assert!(has_no_immediate_repeat(e.tokens()));
        assert!(e.summary().is_none());
    }

    #[test]
    fn test_retry_keeps_original_tokens() {
        let mut config = SessionConfig::timed(VocabularyKind::Words, 15);
        config.token_count = 2;
        let (mut e, _) = engine(config, &["ab", "cd", "ef"]);
        let original = e.tokens().to_vec();

        type_str(&mut e, "x y ");
        assert_eq!(e.tokens().len(), 4);

        e.retry();
        assert_eq!(e.tokens(), original.as_slice());
        assert_eq!(e.state(), SessionState::Idle);
    }

    #[test]
    fn test_time_limit_change_resets_timed_session() {
        let (mut e, clock) = engine(SessionConfig::timed(VocabularyKind::Words, 30), &["ab", "cd"]);
        type_str(&mut e, "ab ");
        clock.advance_secs(3);
        e.on_tick();

        e.time_limit_changed(60).unwrap();
        assert_eq!(e.state(), SessionState::Idle);
        assert_eq!(e.remaining_seconds(), Some(60));
        assert_eq!(e.cursor(), 0);

        assert_eq!(
            e.time_limit_changed(45),
            Err(ConfigError::UnsupportedTimeLimit(45))
        );
        assert_eq!(e.config().time_limit_secs, 60);
    }

    #[test]
    fn test_degenerate_vocabulary_reports_diagnostic() {
        let (e, _) = engine(SessionConfig::fixed(VocabularyKind::Words, 4), &["same"]);
        assert_eq!(e.tokens().len(), 4);
        assert_eq!(e.diagnostic(), Some(SourceDiagnostic::RepeatsAllowed));
    }

    #[test]
    fn test_reset_with_empty_tokens_fails() {
        let (mut e, _) = fixed(&["cat"]);
        assert_eq!(e.reset_with_tokens(vec![]), Err(ConfigError::ZeroTokenCount));
        assert_eq!(e.tokens(), &["cat"]);
    }
}
