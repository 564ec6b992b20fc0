use jiff::Timestamp;
use linksnip_core::LinkRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    /// Missing, null and empty are all reported as "URL is required".
    #[serde(default)]
    pub url: Option<String>,
    pub custom_slug: Option<String>,
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub short_url: String,
    pub slug: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub slug: String,
    pub original_url: String,
    pub short_url: String,
    pub is_custom: bool,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub clicks: u64,
}

impl LinkResponse {
    pub fn from_record(record: LinkRecord, short_url: String) -> Self {
        Self {
            slug: record.code.as_str().to_owned(),
            original_url: record.target_url,
            short_url,
            is_custom: record.is_custom,
            created_at: record.created_at,
            expires_at: record.expires_at,
            clicks: record.click_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub links: Vec<LinkResponse>,
    pub total: u64,
    pub page: u32,
    pub pages: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
