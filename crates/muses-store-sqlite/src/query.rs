//! Compiles a [`Filter`] into a SQL `WHERE` fragment over `documents.body`.
//!
//! All user input travels as bound parameters; only field paths and fixed
//! SQL are spliced into the text. Parameters use anonymous `?` placeholders,
//! so their order in the returned vector matches their order in the SQL.

use muses_core::filter::Filter;
use rusqlite::types::Value;

use crate::schema::CASEFOLD;

/// Append the SQL for `filter` to `sql`, pushing its parameters to `params`.
pub fn compile(filter: &Filter, sql: &mut String, params: &mut Vec<Value>) {
  match filter {
    Filter::All => sql.push('1'),
    Filter::And(children) => join(children, " AND ", "1", sql, params),
    Filter::Or(children) => join(children, " OR ", "0", sql, params),
    Filter::Contains { field, value } => {
      sql.push_str(&format!(
        "{CASEFOLD}(json_extract(body, ?)) LIKE ? ESCAPE '\\'"
      ));
      params.push(path(field));
      params.push(Value::Text(like_pattern(value)));
    }
    Filter::EqualsIgnoreCase { field, value } => {
      sql.push_str(&format!("{CASEFOLD}(json_extract(body, ?)) = ?"));
      params.push(path(field));
      params.push(Value::Text(value.to_lowercase()));
    }
    Filter::AnyElementContains { field, values } => {
      if values.is_empty() {
        sql.push('1');
        return;
      }
      sql.push_str("EXISTS (SELECT 1 FROM json_each(body, ?) AS e WHERE ");
      params.push(path(field));
      for (i, value) in values.iter().enumerate() {
        if i > 0 {
          sql.push_str(" OR ");
        }
        sql.push_str(&format!("{CASEFOLD}(e.value) LIKE ? ESCAPE '\\'"));
        params.push(Value::Text(like_pattern(value)));
      }
      sql.push(')');
    }
    Filter::Gte { field, value } => {
      sql.push_str("json_extract(body, ?) >= ?");
      params.push(path(field));
      params.push(Value::Real(*value));
    }
    Filter::Lte { field, value } => {
      sql.push_str("json_extract(body, ?) <= ?");
      params.push(path(field));
      params.push(Value::Real(*value));
    }
    Filter::IdEquals { field, id } => {
      sql.push_str("json_extract(body, ?) = ?");
      params.push(path(field));
      params.push(Value::Text(id.hyphenated().to_string()));
    }
  }
}

fn join(
  children: &[Filter],
  op: &str,
  empty: &str,
  sql: &mut String,
  params: &mut Vec<Value>,
) {
  if children.is_empty() {
    sql.push_str(empty);
    return;
  }
  sql.push('(');
  for (i, child) in children.iter().enumerate() {
    if i > 0 {
      sql.push_str(op);
    }
    compile(child, sql, params);
  }
  sql.push(')');
}

/// JSON path for a dotted field name: `location.latitude` →
/// `$.location.latitude`.
fn path(field: &str) -> Value { Value::Text(format!("$.{field}")) }

/// `%needle%` with `LIKE` metacharacters escaped, after case folding.
fn like_pattern(needle: &str) -> String {
  let mut out = String::with_capacity(needle.len() + 2);
  out.push('%');
  for c in needle.to_lowercase().chars() {
    if matches!(c, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn render(filter: &Filter) -> (String, Vec<Value>) {
    let mut sql = String::new();
    let mut params = Vec::new();
    compile(filter, &mut sql, &mut params);
    (sql, params)
  }

  #[test]
  fn metacharacters_are_escaped() {
    assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    assert_eq!(like_pattern("ÉCOLE"), "%école%");
  }

  #[test]
  fn empty_or_matches_nothing() {
    assert_eq!(render(&Filter::Or(vec![])).0, "0");
    assert_eq!(render(&Filter::And(vec![])).0, "1");
  }

  #[test]
  fn parameters_follow_placeholder_order() {
    let museum = Uuid::new_v4();
    let (sql, params) = render(&Filter::And(vec![
      Filter::Gte { field: "location.latitude", value: 1.5 },
      Filter::IdEquals { field: "museum", id: museum },
    ]));
    assert_eq!(sql, "(json_extract(body, ?) >= ? AND json_extract(body, ?) = ?)");
    assert_eq!(params, vec![
      Value::Text("$.location.latitude".into()),
      Value::Real(1.5),
      Value::Text("$.museum".into()),
      Value::Text(museum.to_string()),
    ]);
  }

  #[test]
  fn any_element_contains_ors_the_terms() {
    let (sql, params) = render(&Filter::AnyElementContains {
      field:  "types",
      values: vec!["art".into(), "War".into()],
    });
    assert_eq!(sql.matches(" LIKE ? ").count(), 2);
    assert!(sql.starts_with("EXISTS (SELECT 1 FROM json_each(body, ?)"));
    assert_eq!(params[2], Value::Text("%war%".into()));
  }
}
