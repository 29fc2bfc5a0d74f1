//! The [`Entity`] trait: what a resource declares to plug into the generic
//! repository and service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{filter::Filter, validate::ValidationError};

/// Store-managed fields shared by every entity.
///
/// Flattened into each entity's JSON. Whatever a client sends for these is
/// discarded by the repository before a write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
  #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
  pub id:         Option<Uuid>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_at: Option<DateTime<Utc>>,
}

impl Meta {
  /// Document keys owned by the store rather than the client.
  pub const KEYS: [&'static str; 3] = ["_id", "created_at", "updated_at"];
}

/// Search parameters for one entity type, compiled into a [`Filter`].
pub trait Search: Default + Send + Sync {
  fn to_filter(&self) -> Filter;
}

/// A resource stored as one document per instance in its own collection.
///
/// Serialization must omit unset fields (empty strings, empty collections,
/// `None`): the serialized form of an update payload is exactly the set of
/// fields that get merged into the stored document.
pub trait Entity:
  Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
  /// Lowercase name used in log fields and some messages (`"user"`).
  const KIND: &'static str;
  /// Capitalised name used in client-facing messages (`"User"`).
  const LABEL: &'static str;
  /// Whether creation and deletion are mirrored into the external authority.
  const LINKED: bool;

  type Search: Search;

  fn meta(&self) -> &Meta;
  fn meta_mut(&mut self) -> &mut Meta;

  /// Check the candidate against the full rule set and return the first
  /// violated rule. May normalise defaulted fields in place.
  fn validate(&mut self, now: DateTime<Utc>) -> Result<(), ValidationError>;

  /// Documents that would collide with this one on a unique key, if the
  /// entity has any.
  fn conflict_filter(&self) -> Option<Filter> { None }

  fn id(&self) -> Option<Uuid> { self.meta().id }
}
