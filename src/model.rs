use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;

/// A single media entry as served by the library API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LibraryItem {
    pub title: String,
    pub year: Option<i32>,
    pub thumb_url: Option<String>,
    pub added_at: String,
    /// Fraction in `[0, 1]`.
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub cast: Option<Vec<String>>,
    pub trailer_url: Option<String>,
}

impl LibraryItem {
    /// Thumbnail location, if the item has a usable one.
    pub fn thumbnail_source(&self) -> Option<&str> {
        non_blank(self.thumb_url.as_deref())
    }

    pub fn trailer_source(&self) -> Option<&str> {
        non_blank(self.trailer_url.as_deref())
    }

    pub fn description_text(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }

    pub fn cast(&self) -> &[String] {
        self.cast.as_deref().unwrap_or(&[])
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// One named library and its items, in server order.
#[derive(Debug, Clone, PartialEq)]
pub struct Library {
    pub name: String,
    pub items: Vec<LibraryItem>,
}

/// All libraries in the order the server listed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Libraries(Vec<Library>);

impl From<Vec<Library>> for Libraries {
    fn from(libraries: Vec<Library>) -> Self {
        Self(libraries)
    }
}

impl Libraries {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Library> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Library> {
        self.0.iter()
    }
}

// The JSON object is read entry by entry so section order matches the document.
impl<'de> Deserialize<'de> for Libraries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LibrariesVisitor;

        impl<'de> Visitor<'de> for LibrariesVisitor {
            type Value = Libraries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of library names to item lists")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut libraries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, items)) =
                    map.next_entry::<String, Option<Vec<LibraryItem>>>()?
                {
                    let items = items.unwrap_or_default();
                    // A repeated name keeps its first position and its last value.
                    match libraries.iter_mut().find(|l: &&mut Library| l.name == name) {
                        Some(existing) => existing.items = items,
                        None => libraries.push(Library { name, items }),
                    }
                }
                Ok(Libraries(libraries))
            }
        }

        deserializer.deserialize_map(LibrariesVisitor)
    }
}

/// Body of a successful `GET /api/`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LibraryEnvelope {
    pub libraries: Libraries,
    #[serde(rename = "lastUpdated", default)]
    pub last_updated: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_preserves_library_order() {
        let body = r#"{
            "libraries": {
                "TV Shows": [{"title": "Severance", "added_at": "2024-01-05T15:04:05Z"}],
                "Movies": [],
                "Anime": null
            },
            "lastUpdated": "2024-01-06 10:00:00"
        }"#;
        let envelope: LibraryEnvelope = serde_json::from_str(body).unwrap();
        let names: Vec<&str> = envelope.libraries.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["TV Shows", "Movies", "Anime"]);
        assert!(envelope.libraries.get(2).unwrap().items.is_empty());
        assert_eq!(envelope.last_updated, "2024-01-06 10:00:00");
    }

    #[test]
    fn test_item_optional_fields() {
        let body = r#"{
            "title": "Arrival",
            "year": 2016,
            "thumb_url": "/thumbnail/library/metadata/7/thumb",
            "added_at": "2023-11-02T08:00:00Z",
            "rating": 0.94,
            "description": "Linguist meets heptapods.",
            "cast": ["Amy Adams", "Jeremy Renner"],
            "trailer_url": null,
            "guid": "ignored"
        }"#;
        let item: LibraryItem = serde_json::from_str(body).unwrap();
        assert_eq!(item.year, Some(2016));
        assert_eq!(item.cast().len(), 2);
        assert_eq!(item.thumbnail_source(), Some("/thumbnail/library/metadata/7/thumb"));
        assert_eq!(item.trailer_source(), None);
    }

    #[test]
    fn test_blank_strings_count_as_missing() {
        let item: LibraryItem = serde_json::from_str(
            r#"{"title": "Blank", "added_at": "x", "thumb_url": "  ", "description": ""}"#,
        )
        .unwrap();
        assert_eq!(item.thumbnail_source(), None);
        assert_eq!(item.description_text(), None);
        assert!(item.cast().is_empty());
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let result: Result<LibraryItem, _> = serde_json::from_str(r#"{"added_at": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_repeated_library_name_keeps_one_section() {
        let body = r#"{
            "Movies": [],
            "Shows": [],
            "Movies": [{"title": "Heat", "added_at": "1995-12-15"}]
        }"#;
        let libraries: Libraries = serde_json::from_str(body).unwrap();
        let names: Vec<&str> = libraries.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Movies", "Shows"]);
        assert_eq!(libraries.get(0).unwrap().items[0].title, "Heat");
    }

    #[test]
    fn test_missing_last_updated_defaults_to_empty() {
        let envelope: LibraryEnvelope = serde_json::from_str(r#"{"libraries": {}}"#).unwrap();
        assert!(envelope.libraries.is_empty());
        assert!(envelope.last_updated.is_empty());
    }
}
