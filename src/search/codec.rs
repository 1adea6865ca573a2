//! Address-bar representation of [`SearchFilters`].
//!
//! `encode` writes the shortest canonical query string (defaults omitted, fixed
//! key order) and `decode` reads any query string back without ever failing:
//! missing or malformed parameters fall back to their defaults.

use crate::models::{
    clamp_limit, clamp_page, normalize_categories, normalize_keyword, normalize_slug,
    normalize_token, GeoFilter, SearchFilters, SortOrder, DEFAULT_LIMIT,
};
use std::collections::HashMap;
use tracing::debug;
use url::form_urlencoded;

pub const KEYWORD: &str = "q";
pub const PREFECTURE: &str = "pref";
pub const CITY: &str = "city";
pub const CATEGORIES: &str = "equipments";
pub const SORT: &str = "sort";
pub const PAGE: &str = "page";
pub const LIMIT: &str = "limit";
pub const LAT: &str = "lat";
pub const LNG: &str = "lng";
pub const RADIUS: &str = "radiusKm";
pub const PAGE_TOKEN: &str = "pageToken";

/// Serialize filters into a canonical query string (no leading `?`).
pub fn encode(filters: &SearchFilters) -> String {
    let filters = filters.normalized();
    let mut pairs: Vec<(&str, String)> = Vec::new();

    if !filters.keyword.is_empty() {
        pairs.push((KEYWORD, escape(&filters.keyword)));
    }
    if let Some(prefecture) = &filters.prefecture {
        pairs.push((PREFECTURE, escape(prefecture)));
    }
    if let Some(city) = &filters.city {
        pairs.push((CITY, escape(city)));
    }
    if !filters.categories.is_empty() {
        let csv = filters
            .categories
            .iter()
            .map(|category| escape(category))
            .collect::<Vec<_>>()
            .join(",");
        pairs.push((CATEGORIES, csv));
    }
    if filters.sort != SortOrder::default() {
        pairs.push((SORT, filters.sort.as_query_value().to_string()));
    }
    if filters.page > 1 {
        pairs.push((PAGE, filters.page.to_string()));
    }
    if filters.limit != DEFAULT_LIMIT {
        pairs.push((LIMIT, filters.limit.to_string()));
    }
    if let Some(geo) = &filters.location {
        pairs.push((LAT, geo.lat.to_string()));
        pairs.push((LNG, geo.lng.to_string()));
        pairs.push((RADIUS, geo.radius_km.to_string()));
    }
    // normalized() guarantees the token only survives on page 1
    if let Some(token) = &filters.page_token {
        pairs.push((PAGE_TOKEN, escape(token)));
    }

    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parse a query string, a path with a query, or a full URL into filters.
pub fn decode(input: &str) -> SearchFilters {
    let query = query_part(input);
    let params = QueryParams::parse(query);

    let keyword = params
        .first(&[KEYWORD, "keyword"])
        .map(normalize_keyword)
        .unwrap_or_default();
    let prefecture = normalize_slug(params.first(&[PREFECTURE, "prefecture"]));
    let city = prefecture
        .as_ref()
        .and_then(|_| normalize_slug(params.first(&[CITY])));
    let categories = params
        .first(&[CATEGORIES, "categories"])
        .map(|csv| normalize_categories(csv.split(',')))
        .unwrap_or_default();
    let sort = params
        .first(&[SORT])
        .and_then(SortOrder::parse_lenient)
        .unwrap_or_default();

    let explicit_page = params
        .first(&[PAGE])
        .and_then(|raw| raw.trim().parse::<i64>().ok());
    let page = explicit_page.map(clamp_page).unwrap_or(1);
    let limit = params
        .first(&[LIMIT, "per_page"])
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .map(clamp_limit)
        .unwrap_or(DEFAULT_LIMIT);

    let location = match (parse_float(params.first(&[LAT])), parse_float(params.first(&[LNG]))) {
        (Some(lat), Some(lng)) => GeoFilter::new(
            lat,
            lng,
            parse_float(params.first(&[RADIUS, "distance_km"])),
        ),
        _ => None,
    };

    // a parsable page number wins over a cursor; a malformed one is ignored
    let page_token = if explicit_page.is_some() {
        None
    } else {
        normalize_token(params.first(&[PAGE_TOKEN, "page_token"]))
    };

    let filters = SearchFilters {
        keyword,
        prefecture,
        city,
        categories,
        sort,
        page,
        limit,
        location,
        page_token,
    };
    debug!("Decoded query '{}' into {:?}", query, filters);
    filters
}

/// Strip everything that is not the query: leading `?`, the path of a URL
/// and any `#fragment`.
pub fn query_part(input: &str) -> &str {
    let without_fragment = input.split('#').next().unwrap_or_default();
    match without_fragment.split_once('?') {
        Some((_, query)) => query,
        None if without_fragment.starts_with('/') || without_fragment.contains("://") => "",
        None => without_fragment,
    }
}

/// Path component of a path-with-query or URL, if there is one
pub fn path_part(input: &str) -> Option<&str> {
    let without_fragment = input.split('#').next().unwrap_or_default();
    let path = without_fragment
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(without_fragment);
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

fn escape(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn parse_float(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// First-occurrence view over decoded query pairs
struct QueryParams {
    values: HashMap<String, String>,
}

impl QueryParams {
    fn parse(query: &str) -> Self {
        let mut values = HashMap::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            values
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        Self { values }
    }

    fn first(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .find_map(|name| self.values.get(*name).map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DEFAULT_RADIUS_KM, MAX_LIMIT};
    use pretty_assertions::assert_eq;

    #[test]
    fn default_filters_encode_to_empty_query() {
        assert_eq!(encode(&SearchFilters::default()), "");
        assert_eq!(decode(""), SearchFilters::default());
        assert_eq!(decode("?"), SearchFilters::default());
    }

    #[test]
    fn encodes_keys_in_fixed_order() {
        let filters = SearchFilters {
            keyword: "bench press".to_string(),
            prefecture: Some("tokyo".to_string()),
            city: Some("minato".to_string()),
            categories: vec!["squat-rack".to_string()],
            sort: SortOrder::Name,
            page: 2,
            limit: 50,
            ..Default::default()
        };
        assert_eq!(
            encode(&filters),
            "q=bench+press&pref=tokyo&city=minato&equipments=squat-rack&sort=name&page=2&limit=50"
        );
    }

    #[test]
    fn round_trips_canonical_filters() {
        let samples = vec![
            SearchFilters::default(),
            SearchFilters {
                keyword: "ヨガ & pilates".to_string(),
                prefecture: Some("osaka".to_string()),
                city: Some("kita".to_string()),
                categories: vec!["power-rack".to_string(), "dumbbell".to_string()],
                sort: SortOrder::CreatedAt,
                page: 7,
                limit: 1,
                location: None,
                page_token: None,
            },
            SearchFilters {
                location: GeoFilter::new(35.681236, 139.767125, Some(2.5)),
                page_token: Some("eyJvZmZzZXQiOjIwfQ==".to_string()),
                sort: SortOrder::Freshness,
                ..Default::default()
            },
        ];
        for filters in samples {
            assert!(filters.is_canonical());
            assert_eq!(decode(&encode(&filters)), filters);
        }
    }

    #[test]
    fn clamps_page_and_limit() {
        assert_eq!(decode("page=-5").page, 1);
        assert_eq!(decode("page=0").page, 1);
        assert_eq!(decode("page=abc").page, 1);
        assert_eq!(decode("limit=99999").limit, MAX_LIMIT);
        assert_eq!(decode("limit=0").limit, 1);
        assert_eq!(decode("limit=lots").limit, DEFAULT_LIMIT);
        assert_eq!(decode("per_page=30").limit, 30);
    }

    #[test]
    fn location_is_all_or_nothing() {
        assert_eq!(decode("lat=35.6").location, None);
        assert_eq!(decode("lng=139.7").location, None);
        assert_eq!(decode("lat=95&lng=139.7").location, None);
        assert_eq!(decode("lat=NaN&lng=139.7").location, None);

        let geo = decode("lat=35.6&lng=139.7").location.unwrap();
        assert_eq!(geo.radius_km, DEFAULT_RADIUS_KM);
        let geo = decode("lat=35.6&lng=139.7&distance_km=3").location.unwrap();
        assert_eq!(geo.radius_km, 3.0);
    }

    #[test]
    fn category_csv_collapses_duplicates() {
        let filters = SearchFilters {
            categories: vec![
                "squat-rack".to_string(),
                "squat-rack".to_string(),
                "barbell".to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(encode(&filters), "equipments=squat-rack,barbell");
        assert_eq!(
            decode("equipments=squat-rack,barbell").categories,
            vec!["squat-rack", "barbell"]
        );
        assert_eq!(decode("equipments=,,a,,A").categories, vec!["a"]);
    }

    #[test]
    fn explicit_page_wins_over_token() {
        let filters = decode("page=3&pageToken=xyz");
        assert_eq!(filters.page, 3);
        assert_eq!(filters.page_token, None);

        let filters = decode("page_token=xyz");
        assert_eq!(filters.page, 1);
        assert_eq!(filters.page_token.as_deref(), Some("xyz"));

        let filters = decode("page=abc&pageToken=xyz");
        assert_eq!(filters.page, 1);
        assert_eq!(filters.page_token.as_deref(), Some("xyz"));

        let filters = decode("page=-2&pageToken=xyz");
        assert_eq!(filters.page, 1);
        assert_eq!(filters.page_token, None);

        let mixed = SearchFilters {
            page: 4,
            page_token: Some("xyz".to_string()),
            ..Default::default()
        };
        assert_eq!(encode(&mixed), "page=4");
    }

    #[test]
    fn decode_reads_urls_and_first_occurrence() {
        let filters = decode("https://gyms.example.jp/gyms?pref=Tokyo&pref=osaka#map");
        assert_eq!(filters.prefecture.as_deref(), Some("tokyo"));
        assert_eq!(decode("/gyms").prefecture, None);
        assert_eq!(decode("city=minato").city, None);
        assert_eq!(decode("sort=name:asc").sort, SortOrder::Name);
        assert_eq!(decode("sort=sideways").sort, SortOrder::Relevance);
    }

    #[test]
    fn splits_path_and_query() {
        assert_eq!(path_part("/gyms?pref=tokyo"), Some("/gyms"));
        assert_eq!(path_part("?pref=tokyo"), None);
        assert_eq!(query_part("/gyms?pref=tokyo#top"), "pref=tokyo");
        assert_eq!(query_part("?pref=tokyo"), "pref=tokyo");
    }
}
