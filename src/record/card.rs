//! Cards: a record plus the non-secret data printed next to it.

use crate::error::Result;
use crate::record::payload::{hash_text, PayloadCodec, Record};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One physical card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedCard {
    /// The record encoded in the visual code.
    pub record: Record,
    /// Canonical text of `record`, as handed to rendering.
    pub payload_text: String,
    /// Full content hash.
    pub hash: String,
    /// Short hash for cross-referencing copies of the same card.
    pub short_hash: String,
    /// Display label.
    pub label: Option<String>,
    /// Number of copies to print.
    pub copies: u32,
}

impl EncodedCard {
    /// Compute the display data for a record.
    pub fn compute(codec: &PayloadCodec, record: Record) -> Result<Self> {
        let payload_text = codec.serialize(&record)?;
        let hash = hash_text(&payload_text);
        let label = record.metadata.label.clone();

        Ok(Self {
            record,
            payload_text,
            hash: hash.full,
            short_hash: hash.short,
            label,
            copies: 1,
        })
    }

    /// Set the number of copies. At least one copy is always printed.
    pub fn with_copies(mut self, copies: u32) -> Self {
        self.copies = copies.max(1);
        self
    }

    /// File name used when saving the card.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.short_hash)
    }

    /// Write the payload text into `dir` under [`file_name`](Self::file_name).
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, &self.payload_text)?;
        debug!(path = %path.display(), "card saved");
        Ok(path)
    }
}
