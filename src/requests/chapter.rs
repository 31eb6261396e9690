use serde::{Deserialize, Serialize};

use super::page::Page;
use super::Result;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Chapter {
    pub id: i64,
    pub volume: String,
    pub number: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Deserialize, Debug)]
struct ChapterListWrapper {
    data: Vec<Chapter>,
}

/// Decodes the `{ "data": [ .. ] }` envelope of the chapter list endpoint
pub fn decode_list(body: &[u8]) -> Result<Vec<Chapter>> {
    let wrapper: ChapterListWrapper = serde_json::from_slice(body)?;

    Ok(wrapper.data)
}

/// Query string of the chapter pages endpoint
#[derive(Serialize, Debug)]
pub struct PagesQuery<'a> {
    pub number: &'a str,
    pub volume: &'a str,
}

/// Keeps the chapters whose volume tag equals `volume`, preserving input order.
///
/// Comparison is plain string equality: "03" and "3" are different volumes.
pub fn filter_by_volume(chapters: Vec<Chapter>, volume: &str) -> Vec<Chapter> {
    chapters.into_iter().filter(|c| c.volume == volume).collect()
}

/// Window variant of [`filter_by_volume`]: keeps chapters matching any of `volumes`.
pub fn filter_by_volumes(chapters: Vec<Chapter>, volumes: &[String]) -> Vec<Chapter> {
    chapters
        .into_iter()
        .filter(|c| volumes.iter().any(|v| c.volume == *v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(id: i64, volume: &str, number: &str) -> Chapter {
        Chapter {
            id,
            volume: volume.to_owned(),
            number: number.to_owned(),
            name: None,
            pages: Vec::new(),
        }
    }

    #[test]
    fn decodes_chapter_list() {
        let body = br#"{"data": [
            {"id": 11, "volume": "3", "number": "1", "name": "First"},
            {"id": 12, "volume": "3", "number": "1.5", "name": null}
        ]}"#;

        let chapters = decode_list(body).unwrap();

        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].name.as_deref(), Some("First"));
        assert_eq!(chapters[1].number, "1.5");
        assert_eq!(chapters[1].name, None);
    }

    #[test]
    fn filter_keeps_exact_matches_in_order() {
        let chapters = vec![
            chapter(1, "3", "1"),
            chapter(2, "4", "1"),
            chapter(3, "3", "2"),
        ];

        let filtered = filter_by_volume(chapters, "3");

        assert_eq!(
            filtered.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[test]
    fn filter_does_not_normalize_numbers() {
        let chapters = vec![chapter(1, "03", "1"), chapter(2, "3", "2")];

        let filtered = filter_by_volume(chapters, "3");

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 2);
    }

    #[test]
    fn filter_may_return_empty() {
        let chapters = vec![chapter(1, "3", "1")];

        assert!(filter_by_volume(chapters, "5").is_empty());
    }

    #[test]
    fn window_filter_matches_any_tag() {
        let chapters = vec![
            chapter(1, "3", "1"),
            chapter(2, "4", "1"),
            chapter(3, "5", "1"),
            chapter(4, "03", "1"),
        ];

        let filtered = filter_by_volumes(chapters, &["3".to_owned(), "4".to_owned()]);

        assert_eq!(
            filtered.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn pages_query_serializes_to_query_string() {
        let query = PagesQuery {
            number: "10.5",
            volume: "3",
        };

        assert_eq!(
            serde_qs::to_string(&query).unwrap(),
            "number=10.5&volume=3"
        );
    }
}
