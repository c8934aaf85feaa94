pub mod core;

pub use core::Vocabulary;

use crate::config::VocabularyKind;
use crate::error::Result;

impl VocabularyKind {
    /// Load the bundled vocabulary for this kind.
    pub fn load(&self) -> Result<Vocabulary> {
        Vocabulary::load(self.file_stem())
    }
}
