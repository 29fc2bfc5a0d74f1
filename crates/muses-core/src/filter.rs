//! Store-independent search predicates.
//!
//! A [`Filter`] is built from optional search parameters and handed to a
//! [`DocumentStore`](crate::store::DocumentStore), which compiles it into its
//! own query language. Every text value is literal: backends must escape
//! whatever pattern metacharacters their matcher understands.
//!
//! Field names are dotted paths into the stored document, e.g.
//! `"location.latitude"`.

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
  /// No constraint; every document matches.
  All,
  /// Every child must match.
  And(Vec<Filter>),
  /// At least one child must match.
  Or(Vec<Filter>),
  /// Case-insensitive substring match on a text field.
  Contains { field: &'static str, value: String },
  /// Case-insensitive whole-string match on a text field.
  EqualsIgnoreCase { field: &'static str, value: String },
  /// A list field has at least one element containing at least one of
  /// `values` as a case-insensitive substring.
  AnyElementContains {
    field:  &'static str,
    values: Vec<String>,
  },
  /// Inclusive lower bound on a numeric field.
  Gte { field: &'static str, value: f64 },
  /// Inclusive upper bound on a numeric field.
  Lte { field: &'static str, value: f64 },
  /// Exact match on a reference field holding an identifier.
  IdEquals { field: &'static str, id: Uuid },
}

impl Filter {
  /// Conjunction that collapses trivially: no children is [`Filter::All`],
  /// one child is returned as-is.
  pub fn and(mut filters: Vec<Filter>) -> Self {
    filters.retain(|f| !f.is_all());
    match filters.len() {
      0 => Self::All,
      1 => filters.remove(0),
      _ => Self::And(filters),
    }
  }

  /// Disjunction over the given conditions. No conditions means no
  /// constraint at all, so an empty search still lists everything.
  pub fn or(mut filters: Vec<Filter>) -> Self {
    if filters.iter().any(Filter::is_all) {
      return Self::All;
    }
    match filters.len() {
      0 => Self::All,
      1 => filters.remove(0),
      _ => Self::Or(filters),
    }
  }

  pub fn is_all(&self) -> bool { matches!(self, Self::All) }
}

// ─── Parameter helpers ───────────────────────────────────────────────────────

/// Trim `value`, returning `None` if nothing is left.
pub fn trimmed(value: Option<&str>) -> Option<String> {
  value
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(str::to_owned)
}

/// Flatten repeated and comma-joined list parameters into trimmed,
/// non-empty terms: `["art, history", "", "modern"]` → `["art", "history",
/// "modern"]`.
pub fn split_terms<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<String> {
  raw
    .into_iter()
    .flat_map(|v| v.split(','))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(str::to_owned)
    .collect()
}

/// Partial, case-insensitive match of any of `terms` against any element of
/// the list field; [`Filter::All`] when there are no terms.
pub fn any_tag(field: &'static str, terms: &[String]) -> Filter {
  if terms.is_empty() {
    return Filter::All;
  }
  Filter::AnyElementContains { field, values: terms.to_vec() }
}
