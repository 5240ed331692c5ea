// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector store capability trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MnemoError;
use crate::traits::adapter::BackendAdapter;
use crate::types::VectorRecord;

/// A metadata predicate applied during vector search.
///
/// All set fields must match; an empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Match records with this exact category.
    pub category: Option<String>,
    /// Match records belonging to this project.
    pub project_id: Option<String>,
    /// Match records carrying at least one of these tags.
    pub tags_any: Vec<String>,
}

impl MetadataFilter {
    /// Whether a record's metadata satisfies this filter.
    pub fn matches(&self, metadata: &crate::types::RecordMetadata) -> bool {
        if let Some(category) = &self.category {
            if &metadata.category != category {
                return false;
            }
        }
        if let Some(project) = &self.project_id {
            if metadata.project_id.as_ref() != Some(project) {
                return false;
            }
        }
        if !self.tags_any.is_empty()
            && !self.tags_any.iter().any(|t| metadata.tags.contains(t))
        {
            return false;
        }
        true
    }
}

/// A search hit: the matched record plus its cosine score in [-1, 1].
#[derive(Debug, Clone)]
pub struct VectorMatch {
    pub record: VectorRecord,
    pub score: f32,
}

/// Stores `(id, vector, payload)` records and answers nearest-neighbor
/// queries by cosine similarity.
///
/// Search is monotonic in `top_k`: the results for `top_k = 5` are a
/// prefix of the results for `top_k = 10` under the same data and query.
#[async_trait]
pub trait VectorBackend: BackendAdapter {
    /// Insert a record. Fails with [`MnemoError::DimensionMismatch`] when
    /// the embedding does not match the store's dimension.
    async fn add(&self, record: VectorRecord) -> Result<(), MnemoError>;

    /// Fetch a record by id.
    async fn get(&self, id: &str) -> Result<VectorRecord, MnemoError>;

    /// Remove a record by id.
    async fn delete(&self, id: &str) -> Result<(), MnemoError>;

    /// Update a record's metadata in place. Content and embedding are
    /// immutable after insertion.
    async fn update_metadata(
        &self,
        id: &str,
        metadata: crate::types::RecordMetadata,
    ) -> Result<(), MnemoError>;

    /// Nearest-neighbor search, sorted by descending cosine, at most
    /// `top_k` results.
    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<VectorMatch>, MnemoError>;

    /// Number of stored records.
    async fn len(&self) -> Result<usize, MnemoError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordMetadata;

    fn meta(category: &str, project: Option<&str>, tags: &[&str]) -> RecordMetadata {
        let mut m = RecordMetadata::for_category(category);
        m.project_id = project.map(str::to_string);
        m.tags = tags.iter().map(|t| t.to_string()).collect();
        m
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = MetadataFilter::default();
        assert!(filter.matches(&meta("function", None, &[])));
        assert!(filter.matches(&meta("doc", Some("p1"), &["a"])));
    }

    #[test]
    fn category_filter() {
        let filter = MetadataFilter {
            category: Some("function".into()),
            ..Default::default()
        };
        assert!(filter.matches(&meta("function", None, &[])));
        assert!(!filter.matches(&meta("doc", None, &[])));
    }

    #[test]
    fn project_filter() {
        let filter = MetadataFilter {
            project_id: Some("p1".into()),
            ..Default::default()
        };
        assert!(filter.matches(&meta("doc", Some("p1"), &[])));
        assert!(!filter.matches(&meta("doc", Some("p2"), &[])));
        assert!(!filter.matches(&meta("doc", None, &[])));
    }

    #[test]
    fn tags_any_filter() {
        let filter = MetadataFilter {
            tags_any: vec!["async".into(), "io".into()],
            ..Default::default()
        };
        assert!(filter.matches(&meta("doc", None, &["io"])));
        assert!(!filter.matches(&meta("doc", None, &["sync"])));
    }
}
