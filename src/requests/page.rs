use serde::{Deserialize, Serialize};

use super::Result;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Page {
    pub id: i64,
    #[serde(default)]
    pub image: String,
    pub url: String,
}

impl Page {
    /// File name under which this page is staged: the last segment of its url
    pub fn file_name(&self) -> &str {
        self.url.rsplit('/').next().unwrap_or(self.url.as_str())
    }
}

#[derive(Deserialize, Debug)]
struct PagesWrapper {
    data: PagesData,
}

#[derive(Deserialize, Debug)]
struct PagesData {
    pages: Vec<Page>,
}

/// Decodes the `{ "data": { "pages": [ .. ] } }` envelope of the chapter endpoint
pub fn decode_list(body: &[u8]) -> Result<Vec<Page>> {
    let wrapper: PagesWrapper = serde_json::from_slice(body)?;

    Ok(wrapper.data.pages)
}
