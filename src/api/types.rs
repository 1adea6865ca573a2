use crate::models::{Gym, SearchFilters, SearchMeta, SortOrder, MAX_LIMIT};
use serde::{Deserialize, Serialize};

/// Query parameters of the backend search endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text keyword
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// Prefecture slug
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pref: Option<String>,
    /// City slug, only sent together with a prefecture
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Equipment slugs as CSV
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipments: Option<String>,
    /// Backend sort key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// 1-based page, omitted in cursor mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self::from(&SearchFilters::default())
    }
}

impl From<&SearchFilters> for SearchRequest {
    fn from(filters: &SearchFilters) -> Self {
        let filters = filters.normalized();
        let location = filters.location;

        Self {
            q: Some(filters.keyword).filter(|keyword| !keyword.is_empty()),
            city: filters.city.filter(|_| filters.prefecture.is_some()),
            pref: filters.prefecture,
            equipments: if filters.categories.is_empty() {
                None
            } else {
                Some(filters.categories.join(","))
            },
            sort: Some(filters.sort)
                .filter(|sort| *sort != SortOrder::Relevance)
                .map(|sort| sort.wire_key().to_string()),
            page: match filters.page_token {
                Some(_) => None,
                None => Some(filters.page),
            },
            per_page: filters.limit.clamp(1, MAX_LIMIT),
            page_token: filters.page_token,
            lat: location.map(|geo| geo.lat),
            lng: location.map(|geo| geo.lng),
            distance_km: location.map(|geo| geo.radius_km),
        }
    }
}

/// Body of a search response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<Gym>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub page_token: Option<String>,
}

impl SearchResponse {
    pub fn meta(&self) -> SearchMeta {
        SearchMeta {
            total: self.total,
            has_next: self.has_next,
            page_token: self.page_token.clone(),
        }
    }
}
