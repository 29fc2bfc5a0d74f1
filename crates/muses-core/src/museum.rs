//! Museums: a located venue with opening hours, price and category tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  entity::{Entity, Meta, Search},
  filter::{Filter, any_tag, trimmed},
  validate::{Check, ValidationError, required},
};

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  #[serde(default)]
  pub longitude: f64,
  #[serde(default)]
  pub latitude:  f64,
}

impl Coordinates {
  /// `(0, 0)` doubles as "not given", so a museum at that exact point cannot
  /// be stored.
  pub fn is_unset(&self) -> bool { self.latitude == 0.0 && self.longitude == 0.0 }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Museum {
  #[serde(flatten)]
  pub meta:        Meta,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub name:        String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub description: String,
  #[serde(default)]
  pub location:    Coordinates,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub hours:       String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub price:       String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub imageurl:    String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub types:       Vec<String>,
  /// Optional reference to another document; never resolved.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub parent:      Option<Uuid>,
}

impl Entity for Museum {
  const KIND: &'static str = "museum";
  const LABEL: &'static str = "Museum";
  const LINKED: bool = true;

  type Search = MuseumSearch;

  fn meta(&self) -> &Meta { &self.meta }

  fn meta_mut(&mut self) -> &mut Meta { &mut self.meta }

  fn validate(&mut self, _now: DateTime<Utc>) -> Check {
    required(&self.name, "name is required")?;
    required(&self.description, "description is required")?;
    if self.location.is_unset() {
      return Err(ValidationError("location is required"));
    }
    required(&self.hours, "hours are required")?;
    required(&self.price, "price is required")?;
    required(&self.imageurl, "image URL is required")?;
    if self.types.is_empty() {
      return Err(ValidationError("types are required"));
    }
    Ok(())
  }
}

/// Category, name and bounding-box search. Every given parameter narrows the
/// result.
#[derive(Debug, Clone, Default)]
pub struct MuseumSearch {
  pub types:   Vec<String>,
  pub name:    Option<String>,
  pub min_lat: Option<f64>,
  pub max_lat: Option<f64>,
  pub min_lon: Option<f64>,
  pub max_lon: Option<f64>,
}

impl Search for MuseumSearch {
  fn to_filter(&self) -> Filter {
    let mut all = vec![any_tag("types", &self.types)];
    if let Some(name) = trimmed(self.name.as_deref()) {
      all.push(Filter::Contains { field: "name", value: name });
    }
    let bounds = [
      (self.min_lat, "location.latitude", true),
      (self.max_lat, "location.latitude", false),
      (self.min_lon, "location.longitude", true),
      (self.max_lon, "location.longitude", false),
    ];
    for (bound, field, lower) in bounds {
      match (bound, lower) {
        (Some(value), true) => all.push(Filter::Gte { field, value }),
        (Some(value), false) => all.push(Filter::Lte { field, value }),
        (None, _) => {}
      }
    }
    Filter::and(all)
  }
}
