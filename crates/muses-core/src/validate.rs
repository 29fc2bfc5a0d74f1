//! Field-level validation helpers shared by the entity rule sets.
//!
//! Each entity's `validate` runs its checks in a fixed order and stops at the
//! first failure, so callers always see exactly one message.

use thiserror::Error;

/// A violated validation rule. The message is returned to clients verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub &'static str);

pub type Check = Result<(), ValidationError>;

/// Fails with `message` when `value` is empty after trimming whitespace.
pub fn required(value: &str, message: &'static str) -> Check {
  if value.trim().is_empty() {
    return Err(ValidationError(message));
  }
  Ok(())
}

/// Fails with `message` when `value` is longer than `max` characters.
pub fn max_chars(value: &str, max: usize, message: &'static str) -> Check {
  if value.chars().count() > max {
    return Err(ValidationError(message));
  }
  Ok(())
}

/// Matches `local@domain.tld`: a run without whitespace or `@`, an `@`, then a
/// run without whitespace or `@` that contains a `.` with at least one
/// character on each side.
pub fn is_email(value: &str) -> bool {
  let Some((local, domain)) = value.split_once('@') else {
    return false;
  };
  let clean = |s: &str| !s.is_empty() && !s.contains('@') && !s.chars().any(char::is_whitespace);
  if !clean(local) || !clean(domain) {
    return false;
  }
  domain
    .char_indices()
    .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}
