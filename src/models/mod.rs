use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page size used when the URL carries none (or an unusable one)
pub const DEFAULT_LIMIT: u32 = 20;
/// Largest page size the backend accepts
pub const MAX_LIMIT: u32 = 100;

pub const DEFAULT_RADIUS_KM: f64 = 5.0;
pub const MIN_RADIUS_KM: f64 = 0.5;
pub const MAX_RADIUS_KM: f64 = 50.0;

/// Result ordering offered by the directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Relevance,
    Freshness,
    Richness,
    Name,
    CreatedAt,
}

impl SortOrder {
    /// Value used in the address bar
    pub fn as_query_value(&self) -> &'static str {
        match self {
            SortOrder::Relevance => "relevance",
            SortOrder::Freshness => "freshness",
            SortOrder::Richness => "richness",
            SortOrder::Name => "name",
            SortOrder::CreatedAt => "created_at",
        }
    }

    /// Sort key understood by the backend search endpoint
    pub fn wire_key(&self) -> &'static str {
        match self {
            SortOrder::Relevance => "score",
            SortOrder::Freshness => "freshness",
            SortOrder::Richness => "richness",
            SortOrder::Name => "gym_name",
            SortOrder::CreatedAt => "created_at",
        }
    }

    /// Parse an address-bar or wire sort value.
    ///
    /// Matching is case-insensitive and a trailing direction (`name:asc`) is
    /// ignored. Unknown values yield `None`.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let head = raw.split(':').next().unwrap_or_default().trim();
        match head.to_ascii_lowercase().as_str() {
            "relevance" | "score" => Some(SortOrder::Relevance),
            "freshness" => Some(SortOrder::Freshness),
            "richness" => Some(SortOrder::Richness),
            "name" | "gym_name" => Some(SortOrder::Name),
            "created_at" | "createdat" | "newest" => Some(SortOrder::CreatedAt),
            _ => None,
        }
    }
}

/// Radius search around a point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFilter {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
}

impl GeoFilter {
    /// Build a filter from raw coordinates.
    ///
    /// Returns `None` unless both coordinates are finite and on the globe.
    /// The radius is clamped into range; a missing or non-finite radius
    /// falls back to [`DEFAULT_RADIUS_KM`].
    pub fn new(lat: f64, lng: f64, radius_km: Option<f64>) -> Option<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Self {
            lat,
            lng,
            radius_km: clamp_radius(radius_km),
        })
    }
}

/// The user's current search intent.
///
/// Values coming from the outside (URL, UI input) are brought into canonical
/// form with [`SearchFilters::normalized`]; the store and the codec only hand
/// out canonical values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub keyword: String,
    pub prefecture: Option<String>,
    pub city: Option<String>,
    pub categories: Vec<String>,
    pub sort: SortOrder,
    pub page: u32,
    pub limit: u32,
    pub location: Option<GeoFilter>,
    pub page_token: Option<String>,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            prefecture: None,
            city: None,
            categories: Vec::new(),
            sort: SortOrder::Relevance,
            page: 1,
            limit: DEFAULT_LIMIT,
            location: None,
            page_token: None,
        }
    }
}

impl SearchFilters {
    /// Canonical copy: trimmed, lower-cased, deduplicated and clamped.
    pub fn normalized(&self) -> Self {
        let prefecture = normalize_slug(self.prefecture.as_deref());
        // a city without its prefecture does not narrow anything
        let city = prefecture
            .as_ref()
            .and_then(|_| normalize_slug(self.city.as_deref()));
        let page = self.page.max(1);
        let page_token = if page > 1 {
            None
        } else {
            normalize_token(self.page_token.as_deref())
        };

        Self {
            keyword: normalize_keyword(&self.keyword),
            prefecture,
            city,
            categories: normalize_categories(&self.categories),
            sort: self.sort,
            page,
            limit: self.limit.clamp(1, MAX_LIMIT),
            location: self
                .location
                .and_then(|geo| GeoFilter::new(geo.lat, geo.lng, Some(geo.radius_km))),
            page_token,
        }
    }

    pub fn is_canonical(&self) -> bool {
        *self == self.normalized()
    }

    /// True when nothing narrows the search
    pub fn is_empty(&self) -> bool {
        self.keyword.is_empty()
            && self.prefecture.is_none()
            && self.categories.is_empty()
            && self.location.is_none()
    }
}

pub(crate) fn normalize_keyword(raw: &str) -> String {
    raw.trim().to_string()
}

pub(crate) fn normalize_slug(raw: Option<&str>) -> Option<String> {
    let slug = raw?.trim().to_lowercase();
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

pub(crate) fn normalize_token(raw: Option<&str>) -> Option<String> {
    let token = raw?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Ordered, de-duplicated category slugs. Entries holding commas are split so
/// the comma-separated URL form stays unambiguous.
pub(crate) fn normalize_categories<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut categories: Vec<String> = Vec::new();
    for entry in raw {
        for piece in entry.as_ref().split(',') {
            if let Some(slug) = normalize_slug(Some(piece)) {
                if !categories.contains(&slug) {
                    categories.push(slug);
                }
            }
        }
    }
    categories
}

pub(crate) fn clamp_page(raw: i64) -> u32 {
    raw.clamp(1, i64::from(u32::MAX)) as u32
}

pub(crate) fn clamp_limit(raw: i64) -> u32 {
    raw.clamp(1, i64::from(MAX_LIMIT)) as u32
}

pub(crate) fn clamp_radius(raw: Option<f64>) -> f64 {
    match raw {
        Some(radius) if radius.is_finite() => radius.clamp(MIN_RADIUS_KM, MAX_RADIUS_KM),
        _ => DEFAULT_RADIUS_KM,
    }
}

/// A facility as returned by the search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gym {
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[serde(rename = "pref", default)]
    pub prefecture: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub equipments: Vec<String>,
    #[serde(rename = "lat", default)]
    pub latitude: Option<f64>,
    #[serde(rename = "lng", default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub last_verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Paging information attached to a result page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMeta {
    pub total: u64,
    pub has_next: bool,
    pub page_token: Option<String>,
}
