//! Thread-local memo of resolved data requests.
//!
//! The cache lives for the whole page session, so flipping the filters back
//! to an earlier selection is served without hitting the network again.
//!
//! # Cache Key Structure
//! - `start_year`, `end_year`: requested year range
//! - `entities`: requested entity codes, sorted and comma-joined
//!
//! # Cache Value Structure
//! - `Rc<Vec<DataSeries>>`: the normalized series, shared with renderers

use crate::series::DataSeries;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Cache key: (start_year, end_year, sorted codes joined with ',')
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub start_year: i32,
    pub end_year: i32,
    pub entities: String,
}

impl CacheKey {
    pub fn new(start_year: i32, end_year: i32, codes: &[String]) -> Self {
        let mut sorted: Vec<&str> = codes.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        Self {
            start_year,
            end_year,
            entities: sorted.join(","),
        }
    }
}

pub type CacheValue = Rc<Vec<DataSeries>>;

thread_local! {
    /// Global cache that survives component lifetimes.
    /// Thread-local because everything runs on the browser's main thread.
    pub static SERIES_CACHE: RefCell<HashMap<CacheKey, CacheValue>> =
        RefCell::new(HashMap::new());
}

pub fn lookup(key: &CacheKey) -> Option<CacheValue> {
    SERIES_CACHE.with(|c| c.borrow().get(key).cloned())
}

pub fn store(key: CacheKey, value: CacheValue) {
    SERIES_CACHE.with(|c| {
        c.borrow_mut().insert(key, value);
    });
}
