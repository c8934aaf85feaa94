// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod classifier;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod engine;
pub mod error;
pub mod language;
pub mod logging;
pub mod runtime;
pub mod stats;
pub mod token_source;

pub use classifier::{classify, CharClass};
pub use config::{Mode, SessionConfig, VocabularyKind};
pub use engine::{InputOutcome, SessionEngine, SessionState, SessionSummary};
pub use error::ConfigError;
