//! Query-string decoding for the `/search` endpoints.
//!
//! axum's `Query` extractor cannot express repeated keys or report which
//! parameter was malformed, so the raw query string is decoded here and each
//! search type picks out its own parameters.

use std::str::FromStr;

use muses_core::{
  artwork::ArtworkSearch,
  filter::split_terms,
  museum::MuseumSearch,
  user::UserSearch,
};
use uuid::Uuid;

use crate::error::ApiError;

/// Decoded `key=value` pairs in request order.
#[derive(Debug, Default)]
pub struct QueryPairs(Vec<(String, String)>);

impl QueryPairs {
  pub fn parse(raw: Option<&str>) -> Self {
    let pairs = raw
      .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
      .unwrap_or_default();
    Self(pairs)
  }

  /// First value for `key`, if any.
  pub fn first(&self, key: &str) -> Option<&str> {
    self
      .0
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, v)| v.as_str())
  }

  /// Every value for `key`, in order.
  pub fn all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    self
      .0
      .iter()
      .filter(move |(k, _)| k == key)
      .map(|(_, v)| v.as_str())
  }

  /// Repeated and comma-joined list values, trimmed, blanks dropped.
  pub fn terms(&self, key: &str) -> Vec<String> { split_terms(self.all(key)) }

  pub fn text(&self, key: &str) -> Option<String> {
    self.first(key).map(str::to_owned)
  }

  /// Parse the first non-blank value for `key`. A value that does not parse
  /// is a client error naming the parameter.
  pub fn parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, ApiError> {
    match self.first(key).map(str::trim).filter(|v| !v.is_empty()) {
      None => Ok(None),
      Some(v) => v
        .parse()
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("Invalid {key} value"))),
    }
  }
}

/// Builds an entity's search parameters from the query string.
pub trait FromQuery: Sized {
  fn from_query(query: &QueryPairs) -> Result<Self, ApiError>;
}

impl FromQuery for UserSearch {
  fn from_query(query: &QueryPairs) -> Result<Self, ApiError> {
    Ok(Self {
      email:    query.text("email"),
      username: query.text("username"),
    })
  }
}

impl FromQuery for MuseumSearch {
  fn from_query(query: &QueryPairs) -> Result<Self, ApiError> {
    Ok(Self {
      types:   query.terms("types"),
      name:    query.text("name"),
      min_lat: query.parsed("minLat")?,
      max_lat: query.parsed("maxLat")?,
      min_lon: query.parsed("minLon")?,
      max_lon: query.parsed("maxLon")?,
    })
  }
}

impl FromQuery for ArtworkSearch {
  fn from_query(query: &QueryPairs) -> Result<Self, ApiError> {
    Ok(Self {
      types:  query.terms("types"),
      name:   query.text("name"),
      museum: query.parsed::<Uuid>("museum")?,
    })
  }
}
