//! Raw record to catalog record transformation.
//!
//! Every rule here degrades instead of failing: a record missing any field
//! still produces a storable CatalogRecord.

use std::collections::HashMap;

use crate::catalog::CatalogRecord;
use crate::source::{LocalizedString, RawRecord};

const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN: &str = "Unknown";
const COVER_BASE_URL: &str = "https://uploads.mangadex.org/covers";

/// Transform one raw listing entry into a catalog record.
///
/// `authors` maps author ids to display names, as resolved by the author
/// resolver. Unresolved authors become "Unknown".
pub fn transform(record: &RawRecord, authors: &HashMap<String, String>) -> CatalogRecord {
    let Some(attrs) = &record.attributes else {
        return CatalogRecord::minimal(&record.id);
    };

    let author = record
        .author_id()
        .and_then(|id| authors.get(id))
        .filter(|name| !name.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| UNKNOWN.to_string());

    let cover_url = record
        .cover_filename()
        .map(|filename| format!("{}/{}/{}", COVER_BASE_URL, record.id, filename));

    // Every value in every language map, in encounter order.
    let alt_titles = attrs
        .alt_titles
        .iter()
        .flat_map(|map| map.values().cloned())
        .collect();

    // Genres, themes and formats all land in one flat list. Only tags
    // without a name are dropped.
    let genres = attrs
        .tags
        .iter()
        .filter_map(|tag| tag.attributes.as_ref())
        .filter_map(|a| localized_value(&a.name))
        .map(str::to_string)
        .collect();

    CatalogRecord {
        id: None,
        external_id: record.id.clone(),
        title: pick_title(&attrs.title),
        author,
        year: attrs.year,
        status: normalize_status(attrs.status.as_deref()),
        description: pick_description(&attrs.description),
        cover_url,
        alt_titles,
        genres,
    }
}

/// Title fallback chain: en, then ja-ro, then any, then a placeholder.
fn pick_title(title: &LocalizedString) -> String {
    title
        .get("en")
        .or_else(|| title.get("ja-ro"))
        .or_else(|| title.values().next())
        .cloned()
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

/// Description fallback chain: en, then any, then empty.
fn pick_description(description: &LocalizedString) -> String {
    description
        .get("en")
        .or_else(|| description.values().next())
        .cloned()
        .unwrap_or_default()
}

/// Capitalize the remote's lowercase status ("ongoing" becomes "Ongoing").
/// Absent or empty statuses become "Unknown".
fn normalize_status(status: Option<&str>) -> String {
    match status {
        Some(s) if !s.is_empty() => {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => UNKNOWN.to_string(),
            }
        }
        _ => UNKNOWN.to_string(),
    }
}

/// Preferred value from a localized map: en first, then whatever is there.
fn localized_value(map: &LocalizedString) -> Option<&str> {
    map.get("en")
        .or_else(|| map.values().next())
        .map(String::as_str)
}
