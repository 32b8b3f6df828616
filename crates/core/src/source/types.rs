//! Wire types for the MangaDex API.
//!
//! These mirror the JSON:API-ish envelope MangaDex returns. Every field the
//! remote may omit is optional or defaulted so a partially filled entry never
//! fails the whole page.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One page of raw records as returned by the list endpoint.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub records: Vec<RawRecord>,
    pub limit: u32,
    pub offset: u32,
    pub total: u64,
}

/// Filters applied to a listing request. An empty filter means no
/// content-rating or demographic restriction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassFilter {
    #[serde(default)]
    pub content_ratings: Vec<String>,
    #[serde(default)]
    pub demographics: Vec<String>,
}

impl PassFilter {
    /// The filter used by a plain single-pass import: all content ratings
    /// the importer handles, no demographic restriction.
    pub fn default_ratings() -> Self {
        Self {
            content_ratings: vec![
                "safe".to_string(),
                "suggestive".to_string(),
                "erotica".to_string(),
            ],
            demographics: Vec::new(),
        }
    }

    pub fn for_rating(rating: &str) -> Self {
        Self {
            content_ratings: vec![rating.to_string()],
            demographics: Vec::new(),
        }
    }

    pub fn for_demographic(demographic: &str) -> Self {
        Self {
            content_ratings: Vec::new(),
            demographics: vec![demographic.to_string()],
        }
    }

    /// Short human label for logging and status reporting.
    pub fn label(&self) -> String {
        if !self.demographics.is_empty() {
            format!("demographic:{}", self.demographics.join(","))
        } else if !self.content_ratings.is_empty() {
            format!("rating:{}", self.content_ratings.join(","))
        } else {
            "unfiltered".to_string()
        }
    }
}

/// Parameters for a single listing request.
#[derive(Debug, Clone, Default)]
pub struct PageQuery {
    pub limit: u32,
    pub offset: u32,
    /// RFC 3339 timestamp floor for the creation-time cursor window.
    pub created_at_since: Option<String>,
    pub filter: PassFilter,
}

/// A single entry from the list endpoint, before transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub id: String,
    /// Absent attributes are legal; such entries become minimal records.
    #[serde(default)]
    pub attributes: Option<RawAttributes>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl RawRecord {
    /// The id of the first author relationship, if any.
    pub fn author_id(&self) -> Option<&str> {
        self.relationships
            .iter()
            .find(|r| r.kind == "author")
            .map(|r| r.id.as_str())
    }

    /// The cover art filename, if a cover relationship with attributes exists.
    pub fn cover_filename(&self) -> Option<&str> {
        self.relationships
            .iter()
            .find(|r| r.kind == "cover_art")
            .and_then(|r| r.attributes.as_ref())
            .and_then(|a| a.file_name.as_deref())
    }

    pub fn created_at(&self) -> Option<&str> {
        self.attributes.as_ref()?.created_at.as_deref()
    }
}

/// Localized-string maps are keyed by language code. BTreeMap keeps
/// "first available value" deterministic.
pub type LocalizedString = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttributes {
    #[serde(default)]
    pub title: LocalizedString,
    #[serde(default)]
    pub alt_titles: Vec<LocalizedString>,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub content_rating: Option<String>,
    #[serde(default)]
    pub publication_demographic: Option<String>,
    #[serde(default)]
    pub tags: Vec<RawTag>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTag {
    pub id: String,
    #[serde(default)]
    pub attributes: Option<TagAttributes>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagAttributes {
    #[serde(default)]
    pub name: LocalizedString,
    #[serde(default)]
    pub group: Option<String>,
}

/// A reference from a record to a related entity (author, cover art, artist).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Option<RelationshipAttributes>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipAttributes {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A resolved author, as returned by the author endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorEntry {
    pub id: String,
    pub name: String,
}
