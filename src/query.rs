//! Filter parameters carried in the page's query string.
//!
//! - `startYear`, `endYear`: integers, defaulting to 1972 and 2022
//! - `countries`: comma-separated entity codes, or `All`. A missing key also
//!   means every entity; an empty value selects none.

use crate::config::{DEFAULT_END_YEAR, DEFAULT_START_YEAR, MIN_YEAR};
use std::fmt;
use url::form_urlencoded;

const ALL_TOKEN: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Countries {
    All,
    Codes(Vec<String>),
}

impl Countries {
    pub fn contains(&self, code: &str) -> bool {
        match self {
            Countries::All => true,
            Countries::Codes(codes) => codes.iter().any(|c| c == code),
        }
    }

    fn to_param(&self) -> String {
        match self {
            Countries::All => ALL_TOKEN.to_string(),
            Countries::Codes(codes) => codes.join(","),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParams {
    pub start_year: i32,
    pub end_year: i32,
    pub countries: Countries,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            start_year: DEFAULT_START_YEAR,
            end_year: DEFAULT_END_YEAR,
            countries: Countries::All,
        }
    }
}

impl FilterParams {
    /// Parse a query string, with or without the leading `?`.
    ///
    /// Unparsable years fall back to their defaults.
    pub fn from_query(query: &str) -> Self {
        let mut params = FilterParams::default();

        let query = query.trim_start_matches('?');
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                "startYear" => {
                    params.start_year = value.trim().parse().unwrap_or(DEFAULT_START_YEAR)
                }
                "endYear" => params.end_year = value.trim().parse().unwrap_or(DEFAULT_END_YEAR),
                "countries" => params.countries = parse_countries(&value),
                _ => {}
            }
        }

        params
    }

    /// Query string (with leading `?`) that parses back to `self`.
    pub fn to_query(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("startYear", &self.start_year.to_string())
            .append_pair("endYear", &self.end_year.to_string())
            .append_pair("countries", &self.countries.to_param())
            .finish();
        format!("?{}", query)
    }
}

fn parse_countries(value: &str) -> Countries {
    if value == ALL_TOKEN {
        return Countries::All;
    }
    Countries::Codes(
        value
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    Empty(&'static str),
    NotAYear(&'static str),
    OutOfRange { field: &'static str, year: i32 },
    StartAfterEnd { start: i32, end: i32 },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::Empty(field) => write!(f, "{} cannot be empty", field),
            FilterError::NotAYear(field) => write!(f, "{} must be a valid year", field),
            FilterError::OutOfRange { field, year } => write!(
                f,
                "{} {} is outside {}-{}",
                field, year, MIN_YEAR, DEFAULT_END_YEAR
            ),
            FilterError::StartAfterEnd { start, end } => {
                write!(f, "Start year {} is after end year {}", start, end)
            }
        }
    }
}

impl std::error::Error for FilterError {}

/// Validate a year typed into the filter form.
pub fn validate_year(input: &str, field: &'static str) -> Result<i32, FilterError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FilterError::Empty(field));
    }
    let year: i32 = trimmed.parse().map_err(|_| FilterError::NotAYear(field))?;
    if !(MIN_YEAR..=DEFAULT_END_YEAR).contains(&year) {
        return Err(FilterError::OutOfRange { field, year });
    }
    Ok(year)
}

pub fn validate_range(start: i32, end: i32) -> Result<(), FilterError> {
    if start > end {
        Err(FilterError::StartAfterEnd { start, end })
    } else {
        Ok(())
    }
}
