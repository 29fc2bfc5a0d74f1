//! Users: profile data plus a free-text preference tag set.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  entity::{Entity, Meta, Search},
  filter::{Filter, trimmed},
  validate::{Check, ValidationError, is_email, max_chars, required},
};

/// Upper bound for [`User::range_preferences`].
pub const MAX_RANGE: f32 = 15.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
  #[serde(flatten)]
  pub meta:              Meta,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub firstname:         String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub lastname:          String,
  /// Display name; unique across users, compared case-insensitively.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub username:          String,
  /// Unique across users, compared case-insensitively.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub email:             String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub birthday:          Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub country:           String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub avatar_url:        String,
  /// Case-sensitive, de-duplicated tags.
  #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
  pub preferences:       BTreeSet<String>,
  /// Zero means "not given" and is replaced by 1 during validation.
  #[serde(default)]
  pub range_preferences: f32,
}

impl Entity for User {
  const KIND: &'static str = "user";
  const LABEL: &'static str = "User";
  const LINKED: bool = true;

  type Search = UserSearch;

  fn meta(&self) -> &Meta { &self.meta }

  fn meta_mut(&mut self) -> &mut Meta { &mut self.meta }

  fn validate(&mut self, now: DateTime<Utc>) -> Check {
    required(&self.firstname, "firstname is required")?;
    required(&self.lastname, "lastname is required")?;
    required(&self.username, "username is required")?;
    required(&self.email, "email is required")?;
    let Some(birthday) = self.birthday else {
      return Err(ValidationError("birthday is required"));
    };
    required(&self.country, "country is required")?;

    max_chars(&self.firstname, 50, "firstname must be less than 50 characters")?;
    max_chars(&self.lastname, 50, "lastname must be less than 50 characters")?;

    max_chars(&self.email, 256, "email must be less than 256 characters")?;
    if !is_email(&self.email) {
      return Err(ValidationError("email is not a valid address"));
    }

    if birthday > now {
      return Err(ValidationError("birthday cannot be in the future"));
    }

    max_chars(&self.country, 100, "country must be less than 100 characters")?;
    max_chars(&self.avatar_url, 2048, "avatar_url must be less than 2048 characters")?;

    if self.range_preferences == 0.0 {
      self.range_preferences = 1.0;
    }
    if !(0.0..=MAX_RANGE).contains(&self.range_preferences) {
      return Err(ValidationError("range_preferences must be between 0 and 15"));
    }

    Ok(())
  }

  fn conflict_filter(&self) -> Option<Filter> {
    let search = UserSearch {
      email:    Some(self.email.clone()),
      username: Some(self.username.clone()),
    };
    Some(search.to_filter()).filter(|f| !f.is_all())
  }
}

/// Duplicate probing: exact, case-insensitive email and/or username.
#[derive(Debug, Clone, Default)]
pub struct UserSearch {
  pub email:    Option<String>,
  pub username: Option<String>,
}

impl Search for UserSearch {
  /// Either condition matching is enough.
  fn to_filter(&self) -> Filter {
    let mut any = Vec::new();
    if let Some(email) = trimmed(self.email.as_deref()) {
      any.push(Filter::EqualsIgnoreCase { field: "email", value: email });
    }
    if let Some(username) = trimmed(self.username.as_deref()) {
      any.push(Filter::EqualsIgnoreCase { field: "username", value: username });
    }
    Filter::or(any)
  }
}
