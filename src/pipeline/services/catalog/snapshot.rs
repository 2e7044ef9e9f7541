use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, PipelineError};
use crate::pipeline::types::Embedding;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub card_id: String,
    pub card_name: String,
    pub embedding: Embedding,
}

impl CatalogEntry {
    pub fn new(card_id: impl Into<String>, card_name: impl Into<String>, embedding: Embedding) -> Self {
        Self {
            card_id: card_id.into(),
            card_name: card_name.into(),
            embedding,
        }
    }
}

/// Reference cards in insertion order, unique by `card_id`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    model_version: String,
    dim: Option<usize>,
    entries: IndexMap<String, CatalogEntry>,
}

/// JSON layout of a catalog snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    model_version: String,
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(model_version: impl Into<String>) -> Self {
        Self {
            model_version: model_version.into(),
            dim: None,
            entries: IndexMap::new(),
        }
    }

    pub fn from_entries(
        model_version: impl Into<String>,
        entries: impl IntoIterator<Item = CatalogEntry>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new(model_version);
        for entry in entries {
            catalog.insert(entry)?;
        }
        Ok(catalog)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, PipelineError> {
        let file: CatalogFile = serde_json::from_slice(bytes)
            .map_err(|e| PipelineError::model_unavailable(format!("unreadable catalog: {}", e)))?;
        Ok(Self::from_entries(file.model_version, file.entries)?)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&CatalogFile {
            model_version: self.model_version.clone(),
            entries: self.entries.values().cloned().collect(),
        })
    }

    pub fn insert(&mut self, entry: CatalogEntry) -> Result<(), CatalogError> {
        if entry.embedding.dim() == 0 {
            return Err(CatalogError::EmptyEmbedding(entry.card_id));
        }
        if let Some(expected) = self.dim {
            if entry.embedding.dim() != expected {
                return Err(CatalogError::DimensionMismatch {
                    card_id: entry.card_id,
                    expected,
                    actual: entry.embedding.dim(),
                });
            }
        }
        if self.entries.contains_key(&entry.card_id) {
            return Err(CatalogError::DuplicateCardId(entry.card_id));
        }

        self.dim = Some(entry.embedding.dim());
        self.entries.insert(entry.card_id.clone(), entry);
        Ok(())
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Embedding dimension, `None` while the catalog is empty.
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, card_id: &str) -> Option<&CatalogEntry> {
        self.entries.get(card_id)
    }

    pub fn get_index(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get_index(index).map(|(_, entry)| entry)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }
}
