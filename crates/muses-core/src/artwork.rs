//! Artworks: pieces held by a museum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  entity::{Entity, Meta, Search},
  filter::{Filter, any_tag, trimmed},
  validate::{Check, ValidationError, required},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
  #[serde(flatten)]
  pub meta:        Meta,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub name:        String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub description: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub imageurl:    String,
  /// The holding museum. Matched exactly in searches and never checked
  /// against the museums service.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub museum:      Option<Uuid>,
  /// `None` means the client did not say, which is rejected; `Some(false)`
  /// is a real answer.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_exposed:  Option<bool>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub types:       Vec<String>,
}

impl Entity for Artwork {
  const KIND: &'static str = "artwork";
  const LABEL: &'static str = "Artwork";
  const LINKED: bool = false;

  type Search = ArtworkSearch;

  fn meta(&self) -> &Meta { &self.meta }

  fn meta_mut(&mut self) -> &mut Meta { &mut self.meta }

  fn validate(&mut self, _now: DateTime<Utc>) -> Check {
    required(&self.name, "name is required")?;
    required(&self.description, "description is required")?;
    required(&self.imageurl, "image URL is required")?;
    if self.is_exposed.is_none() {
      return Err(ValidationError("is_exposed is required"));
    }
    if self.museum.is_none_or(|id| id.is_nil()) {
      return Err(ValidationError("museum is required"));
    }
    if self.types.is_empty() {
      return Err(ValidationError("types are required"));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default)]
pub struct ArtworkSearch {
  pub types:  Vec<String>,
  pub name:   Option<String>,
  pub museum: Option<Uuid>,
}

impl Search for ArtworkSearch {
  fn to_filter(&self) -> Filter {
    let mut all = vec![any_tag("types", &self.types)];
    if let Some(name) = trimmed(self.name.as_deref()) {
      all.push(Filter::Contains { field: "name", value: name });
    }
    if let Some(id) = self.museum {
      all.push(Filter::IdEquals { field: "museum", id });
    }
    Filter::and(all)
  }
}
