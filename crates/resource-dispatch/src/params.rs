//! # Request Parameters
//!
//! Raw parameters as delivered by the transport, and the parsed refinement
//! specs the index pipeline consumes.
//!
//! Query conventions:
//!
//! | Parameter | Meaning |
//! |-----------|---------|
//! | `filter[<field>]=<value>` | one [`FilterSpec`] per occurrence, in order |
//! | `sort=a,-b` | one [`SortSpec`] per field, left to right; leading `-` is descending |
//! | `page[number]=<n>&page[size]=<n>` | [`PaginationSpec`]; both or neither |

use crate::error::ParamError;
use serde_json::Value;
use std::fmt::{self, Display};

/// Normalizes a wire key (`published-at`) to the internal convention (`published_at`).
///
/// Fixed for every resource; not overridable.
pub fn normalize_key(key: &str) -> String {
    key.replace('-', "_")
}

/// Parameters of one request: route identifier, query pairs and JSON body.
#[derive(Debug, Clone, Default)]
pub struct Params {
    id: Option<String>,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a urlencoded query string (without the leading `?`).
    pub fn from_query(query: &str) -> Self {
        let query = url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Self {
            query,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => f.write_str("asc"),
            SortDirection::Descending => f.write_str("desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Parses one sort segment: `published` or `-published`.
    pub fn parse(segment: &str) -> Option<Self> {
        let segment = segment.trim();
        let (field, direction) = match segment.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Descending),
            None => (segment, SortDirection::Ascending),
        };
        if field.is_empty() {
            return None;
        }
        Some(Self {
            field: normalize_key(field),
            direction,
        })
    }
}

/// Requested page. Numbers are one-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSpec {
    pub number: u64,
    pub size: u64,
}

impl PaginationSpec {
    /// Zero-based index of the first record on the page. Saturates; pages
    /// parsed by [`QuerySpec::parse`] never do.
    pub fn offset(&self) -> u64 {
        self.number.saturating_sub(1).saturating_mul(self.size)
    }
}

/// Ordered refinements parsed from the query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub filters: Vec<FilterSpec>,
    pub sorts: Vec<SortSpec>,
    pub page: Option<PaginationSpec>,
}

impl QuerySpec {
    pub fn parse(params: &Params) -> Result<Self, ParamError> {
        let mut spec = QuerySpec::default();
        let mut page_number = None;
        let mut page_size = None;

        for (key, value) in params.query_pairs() {
            if let Some(field) = bracketed(key, "filter") {
                if field.is_empty() {
                    continue;
                }
                spec.filters.push(FilterSpec {
                    field: normalize_key(field),
                    value: value.clone(),
                });
            } else if key == "sort" {
                spec.sorts = value.split(',').filter_map(SortSpec::parse).collect();
            } else if let Some(part) = bracketed(key, "page") {
                match part {
                    "number" => page_number = Some(parse_page_value("number", value)?),
                    "size" => page_size = Some(parse_page_value("size", value)?),
                    _ => {}
                }
            }
        }

        spec.page = match (page_number, page_size) {
            (Some(number), Some(size)) => {
                if (number - 1).checked_mul(size).is_none() {
                    return Err(ParamError::InvalidPage {
                        key: "number",
                        value: number.to_string(),
                    });
                }
                Some(PaginationSpec { number, size })
            }
            (None, None) => None,
            _ => return Err(ParamError::IncompletePage),
        };
        Ok(spec)
    }
}

fn bracketed<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    key.strip_prefix(prefix)?
        .strip_prefix('[')?
        .strip_suffix(']')
}

fn parse_page_value(key: &'static str, value: &str) -> Result<u64, ParamError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParamError::InvalidPage {
            key,
            value: value.to_string(),
        }),
    }
}
