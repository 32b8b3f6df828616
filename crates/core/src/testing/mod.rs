//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides a scripted remote source and a fault-injecting
//! catalog wrapper, allowing the whole import pipeline to be exercised
//! without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use mangawatch_core::testing::{fixtures, MockCatalogSource};
//!
//! let source = MockCatalogSource::new();
//! source.add_records(vec![
//!     fixtures::raw_record("m1", "Berserk", "2020-01-01T00:00:00+00:00"),
//! ]).await;
//! source.fail_next_pages(2).await;
//! ```

mod flaky_catalog;
mod mock_source;

pub use flaky_catalog::FlakyCatalog;
pub use mock_source::MockCatalogSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::source::{
        RawAttributes, RawRecord, RawTag, Relationship, RelationshipAttributes, TagAttributes,
    };

    /// Create a raw listing entry with reasonable defaults and no
    /// relationships.
    pub fn raw_record(id: &str, title: &str, created_at: &str) -> RawRecord {
        RawRecord {
            id: id.to_string(),
            attributes: Some(RawAttributes {
                title: [("en".to_string(), title.to_string())].into(),
                alt_titles: Vec::new(),
                description: [("en".to_string(), format!("About {}.", title))].into(),
                status: Some("ongoing".to_string()),
                year: Some(2000),
                content_rating: Some("safe".to_string()),
                publication_demographic: None,
                tags: Vec::new(),
                created_at: Some(created_at.to_string()),
                updated_at: Some(created_at.to_string()),
            }),
            relationships: Vec::new(),
        }
    }

    /// Like [`raw_record`] but with an author relationship, cover art and
    /// one genre tag.
    pub fn raw_record_full(
        id: &str,
        title: &str,
        created_at: &str,
        author_id: &str,
    ) -> RawRecord {
        let mut record = raw_record(id, title, created_at);
        record.relationships = vec![
            Relationship {
                id: author_id.to_string(),
                kind: "author".to_string(),
                attributes: None,
            },
            Relationship {
                id: format!("{}-cover", id),
                kind: "cover_art".to_string(),
                attributes: Some(RelationshipAttributes {
                    file_name: Some(format!("{}.jpg", id)),
                    name: None,
                }),
            },
        ];
        if let Some(attrs) = record.attributes.as_mut() {
            attrs.tags = vec![RawTag {
                id: format!("{}-tag", id),
                attributes: Some(TagAttributes {
                    name: [("en".to_string(), "Action".to_string())].into(),
                    group: Some("genre".to_string()),
                }),
            }];
        }
        record
    }
}
