use serde::{Deserialize, Serialize};

use super::chapter::Chapter;
use super::Result;

/// Top-level manga entity as served by the `/manga/{slug}` endpoint.
///
/// Chapters start out empty and are attached by the loader after the
/// chapter list and page lists have been resolved.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Manga {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub rus_name: Option<String>,
    pub slug: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

#[derive(Deserialize, Debug)]
struct MangaWrapper {
    data: Manga,
}

/// Decodes the single-object `{ "data": { .. } }` envelope
pub fn decode(body: &[u8]) -> Result<Manga> {
    let wrapper: MangaWrapper = serde_json::from_slice(body)?;

    Ok(wrapper.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_manga_envelope() {
        let body = r#"{"data": {"id": 7, "name": "Example", "rus_name": "Пример", "slug": "example"}}"#;

        let manga = decode(body.as_bytes()).unwrap();

        assert_eq!(manga.id, 7);
        assert_eq!(manga.name, "Example");
        assert_eq!(manga.rus_name.as_deref(), Some("Пример"));
        assert_eq!(manga.slug, "example");
        assert!(manga.chapters.is_empty());
    }

    #[test]
    fn tolerates_missing_rus_name() {
        let body = br#"{"data": {"id": 7, "name": "Example", "slug": "example"}}"#;

        let manga = decode(body).unwrap();

        assert_eq!(manga.rus_name, None);
    }

    #[test]
    fn rejects_malformed_body() {
        assert!(decode(b"not json at all").is_err());
        assert!(decode(br#"{"data": []}"#).is_err());
    }
}
