//! Remote data client for the World Bank emissions indicator.
//!
//! Each requested entity is fetched page by page. A failed or empty page
//! ends pagination for that entity and whatever was collected so far is
//! kept, so a flaky connection yields partial series instead of an error.
//! Resolved requests are memoized in [`crate::cache`].

use crate::cache::{self, CacheKey};
use crate::config::{API_BASE, INDICATOR, PER_PAGE};
use crate::query::{Countries, FilterParams};
use crate::series::{all_entity_codes, entity, DataSeries, Point};
use futures::future::join_all;
use gloo_net::http::Request;
use log::{debug, info, warn};
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// Requested codes that are not in the entity catalog.
    UnknownEntities(Vec<String>),
    Network(String),
    Status { code: u16, text: String },
    Decode(String),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::UnknownEntities(codes) => {
                write!(f, "Invalid country codes: {}", codes.join(", "))
            }
            DataError::Network(msg) => write!(f, "Network error: {}", msg),
            DataError::Status { code, text } => {
                write!(f, "Failed to fetch data: {} {}", code, text)
            }
            DataError::Decode(msg) => write!(f, "Unexpected response: {}", msg),
        }
    }
}

impl std::error::Error for DataError {}

/// Pagination block of an API response.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub pages: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeyValue {
    pub id: String,
    pub value: String,
}

/// One observation as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawPoint {
    pub country: KeyValue,
    pub date: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub pages: u32,
    pub points: Vec<RawPoint>,
}

pub fn page_url(code: &str, start_year: i32, end_year: i32, page: u32) -> String {
    format!(
        "{}/country/{}/indicator/{}?format=json&date={}:{}&page={}&per_page={}",
        API_BASE, code, INDICATOR, start_year, end_year, page, PER_PAGE
    )
}

/// Parse a response body of the form `[meta, points | null]`.
pub fn parse_page(body: &str) -> Result<Page, DataError> {
    let (meta, points): (PageMeta, Option<Vec<RawPoint>>) =
        serde_json::from_str(body).map_err(|e| DataError::Decode(e.to_string()))?;
    debug!("Received page {}/{}", meta.page, meta.pages);
    Ok(Page {
        pages: meta.pages,
        points: points.unwrap_or_default(),
    })
}

async fn fetch_page(
    code: &str,
    start_year: i32,
    end_year: i32,
    page: u32,
) -> Result<Page, DataError> {
    let url = page_url(code, start_year, end_year, page);
    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| DataError::Network(e.to_string()))?;

    if !resp.ok() {
        return Err(DataError::Status {
            code: resp.status(),
            text: resp.status_text(),
        });
    }

    let body = resp
        .text()
        .await
        .map_err(|e| DataError::Network(e.to_string()))?;
    parse_page(&body)
}

/// Walk pages starting at 1 until the reported page count is reached, a
/// page comes back empty, or a page fails.
pub async fn collect_pages<F, Fut>(mut fetch: F) -> Vec<RawPoint>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page, DataError>>,
{
    let mut all = Vec::new();
    let mut current = 1;
    let mut total = 1;

    while current <= total {
        match fetch(current).await {
            Ok(page) if page.points.is_empty() => break,
            Ok(page) => {
                all.extend(page.points);
                total = page.pages;
                current += 1;
            }
            Err(e) => {
                warn!("Error fetching page {}: {}", current, e);
                break;
            }
        }
    }

    all
}

/// Turn raw observations into a series sorted by year.
///
/// Missing observations are dropped. The label prefers the country name
/// reported by the API, then the catalog name, then the code itself.
pub fn normalize(code: &str, mut points: Vec<RawPoint>) -> DataSeries {
    points.sort_by_key(|p| p.date.parse::<i32>().unwrap_or(i32::MAX));

    let label = points
        .first()
        .map(|p| p.country.value.clone())
        .filter(|name| !name.is_empty())
        .or_else(|| entity(code).map(|e| e.name.to_string()))
        .unwrap_or_else(|| code.to_string());

    let values = points
        .into_iter()
        .filter_map(|p| p.value.map(|y| Point { x: p.date, y }))
        .collect();

    DataSeries {
        id: code.to_string(),
        label,
        values,
    }
}

/// Expand a country selection into entity codes, rejecting unknown ones.
pub fn resolve_codes(countries: &Countries) -> Result<Vec<String>, DataError> {
    match countries {
        Countries::All => Ok(all_entity_codes()),
        Countries::Codes(codes) => {
            let unknown: Vec<String> = codes
                .iter()
                .filter(|code| entity(code).is_none())
                .cloned()
                .collect();
            if unknown.is_empty() {
                Ok(codes.clone())
            } else {
                Err(DataError::UnknownEntities(unknown))
            }
        }
    }
}

async fn fetch_entity(code: String, start_year: i32, end_year: i32) -> DataSeries {
    let points = collect_pages(|page| {
        let code = code.clone();
        async move { fetch_page(&code, start_year, end_year, page).await }
    })
    .await;
    normalize(&code, points)
}

/// Series for every entity selected by `params`, one per code, in request
/// order.
pub async fn get_series(params: &FilterParams) -> Result<Rc<Vec<DataSeries>>, DataError> {
    let codes = resolve_codes(&params.countries)?;
    let key = CacheKey::new(params.start_year, params.end_year, &codes);

    if let Some(hit) = cache::lookup(&key) {
        debug!("Cache hit for {:?}", key);
        return Ok(hit);
    }
    debug!("Cache miss for {:?}", key);

    let requests = codes
        .iter()
        .map(|code| fetch_entity(code.clone(), params.start_year, params.end_year));
    let series = Rc::new(join_all(requests).await);

    info!(
        "Loaded {} series for {}-{}",
        series.len(),
        params.start_year,
        params.end_year
    );
    cache::store(key, series.clone());
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::RefCell;

    fn raw(country: &str, date: &str, value: Option<f64>) -> RawPoint {
        RawPoint {
            country: KeyValue {
                id: "XX".into(),
                value: country.into(),
            },
            date: date.into(),
            value,
        }
    }

    #[test]
    fn url_carries_range_and_page() {
        assert_eq!(
            page_url("FRA", 1990, 2000, 3),
            "https://api.worldbank.org/v2/country/FRA/indicator/EN.GHG.ALL.MT.CE.AR5\
             ?format=json&date=1990:2000&page=3&per_page=100"
        );
    }

    #[test]
    fn parses_api_page() {
        let body = r#"[
            {"page":1,"pages":2,"per_page":100,"total":120,"sourceid":"2","lastupdated":"2024-06-28"},
            [
              {"indicator":{"id":"EN.GHG.ALL.MT.CE.AR5","value":"Total GHG"},
               "country":{"id":"JP","value":"Japan"},"countryiso3code":"JPN",
               "date":"2020","value":1150.5,"unit":"","obs_status":"","decimal":0},
              {"indicator":{"id":"EN.GHG.ALL.MT.CE.AR5","value":"Total GHG"},
               "country":{"id":"JP","value":"Japan"},"countryiso3code":"JPN",
               "date":"2021","value":null,"unit":"","obs_status":"","decimal":0}
            ]
        ]"#;
        let page = parse_page(body).unwrap();
        assert_eq!(page.pages, 2);
        assert_eq!(page.points.len(), 2);
        assert_eq!(page.points[0].value, Some(1150.5));
        assert_eq!(page.points[1].value, None);
    }

    #[test]
    fn page_without_data_parses_empty() {
        let page = parse_page(r#"[{"page":1,"pages":0,"per_page":100,"total":0},null]"#).unwrap();
        assert!(page.points.is_empty());
    }

    #[test]
    fn api_error_message_is_a_decode_error() {
        let body = r#"[{"message":[{"id":"120","key":"Invalid value"}]}]"#;
        assert!(matches!(parse_page(body), Err(DataError::Decode(_))));
    }

    #[test]
    fn follows_reported_page_count() {
        let requested = RefCell::new(Vec::new());
        let points = block_on(collect_pages(|page| {
            requested.borrow_mut().push(page);
            async move {
                Ok(Page {
                    pages: 3,
                    points: vec![raw("France", &format!("{}", 2000 + page), Some(1.0))],
                })
            }
        }));
        assert_eq!(points.len(), 3);
        assert_eq!(*requested.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn empty_page_stops_pagination() {
        let points = block_on(collect_pages(|page| async move {
            if page == 1 {
                Ok(Page { pages: 5, points: vec![raw("Brazil", "2000", Some(2.0))] })
            } else {
                Ok(Page { pages: 5, points: Vec::new() })
            }
        }));
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn failed_page_keeps_earlier_pages() {
        let points = block_on(collect_pages(|page| async move {
            match page {
                1 | 2 => Ok(Page { pages: 4, points: vec![raw("India", "2000", Some(3.0))] }),
                _ => Err(DataError::Network("connection reset".into())),
            }
        }));
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn first_page_failure_gives_no_points() {
        let points = block_on(collect_pages(|_| async {
            Err::<Page, _>(DataError::Status { code: 502, text: "Bad Gateway".into() })
        }));
        assert!(points.is_empty());
    }

    #[test]
    fn normalize_sorts_by_year_and_drops_gaps() {
        let series = normalize(
            "CHN",
            vec![
                raw("China", "2002", Some(3.0)),
                raw("China", "2000", Some(1.0)),
                raw("China", "2001", None),
            ],
        );
        assert_eq!(series.id, "CHN");
        assert_eq!(series.label, "China");
        let years: Vec<_> = series.values.iter().map(|p| p.x.as_str()).collect();
        assert_eq!(years, vec!["2000", "2002"]);
    }

    #[test]
    fn label_falls_back_to_catalog_then_code() {
        assert_eq!(normalize("USA", Vec::new()).label, "United States");
        assert_eq!(normalize("ZZZ", Vec::new()).label, "ZZZ");
        assert_eq!(normalize("FRA", vec![raw("", "2000", Some(1.0))]).label, "France");
    }

    #[test]
    fn unknown_codes_are_rejected() {
        let err = resolve_codes(&Countries::Codes(vec!["USA".into(), "XYZ".into()])).unwrap_err();
        assert_eq!(err, DataError::UnknownEntities(vec!["XYZ".into()]));
        assert_eq!(err.to_string(), "Invalid country codes: XYZ");
    }

    #[test]
    fn all_expands_to_catalog() {
        assert_eq!(resolve_codes(&Countries::All).unwrap(), all_entity_codes());
        assert!(resolve_codes(&Countries::Codes(Vec::new())).unwrap().is_empty());
    }

    #[test]
    fn unknown_codes_fail_before_fetching() {
        let params = FilterParams {
            start_year: 1990,
            end_year: 2000,
            countries: Countries::Codes(vec!["QQQ".into()]),
        };
        assert!(matches!(
            block_on(get_series(&params)),
            Err(DataError::UnknownEntities(_))
        ));
    }

    #[test]
    fn cached_requests_skip_the_network() {
        let params = FilterParams {
            start_year: 1980,
            end_year: 1985,
            countries: Countries::Codes(vec!["JPN".into(), "BRA".into()]),
        };
        let key = CacheKey::new(1980, 1985, &["BRA".into(), "JPN".into()]);
        let stored = Rc::new(vec![normalize("JPN", Vec::new())]);
        cache::store(key, stored.clone());

        let got = block_on(get_series(&params)).unwrap();
        assert!(Rc::ptr_eq(&got, &stored));
    }
}
