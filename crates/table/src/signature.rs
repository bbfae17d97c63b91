//! Table signature
//!
//! A signature is the routing identity of a logical table: its (possibly
//! database-qualified) name plus the ordered list of fields that every row
//! carries. Two signatures with the same key are the same table.

use std::fmt;

use crate::error::SignatureError;

const BACKTICK: char = '`';

/// Identity of a logical table: qualified name and ordered fields
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableSignature {
    name: String,
    fields: Vec<String>,
    key: String,
}

impl TableSignature {
    /// Create a signature from a table name and a comma-separated field list
    ///
    /// Surrounding whitespace is trimmed from every field. An empty (or
    /// all-whitespace) list yields a signature with no fields, which
    /// [`validate`](Self::validate) rejects.
    pub fn new(name: impl Into<String>, fields: &str) -> Self {
        let fields = if fields.trim().is_empty() {
            Vec::new()
        } else {
            fields.split(',').map(|f| f.trim().to_string()).collect()
        };
        Self::from_fields(name, fields)
    }

    /// Create a signature from an already split field list
    pub fn from_fields(name: impl Into<String>, fields: Vec<String>) -> Self {
        let name = name.into();
        let key = format!("{}|{}", name, fields.join(","));
        Self { name, fields, key }
    }

    /// Qualified table name as given, e.g. `db.events`
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered field names
    #[inline]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Fields joined with commas, suitable for an INSERT column list
    pub fn field_list(&self) -> String {
        self.fields.join(",")
    }

    /// Routing key: `name|field1,field2,...`
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Number of cells per row
    ///
    /// Never zero, so a signature without fields still has a well-defined
    /// row width.
    #[inline]
    pub fn row_width(&self) -> usize {
        self.fields.len().max(1)
    }

    /// Split the name into an optional database and a table, backticks removed
    ///
    /// `` `db`.`events` `` yields `(Some("db"), "events")`, `events` yields
    /// `(None, "events")`.
    pub fn unquoted_name_parts(&self) -> (Option<&str>, &str) {
        match self.name.split_once('.') {
            Some((db, table)) => (Some(unquote(db)), unquote(table)),
            None => (None, unquote(&self.name)),
        }
    }

    /// Check the name and field list for syntactic problems
    ///
    /// Checks run in order: name, name parts, name quoting, field presence,
    /// each field, each field's quoting.
    pub fn validate(&self) -> Result<(), SignatureError> {
        if self.name.is_empty() {
            return Err(SignatureError::EmptyTableName);
        }

        for part in self.name.split('.') {
            if is_empty_identifier(part) {
                return Err(SignatureError::EmptyTableNamePart {
                    name: self.name.clone(),
                });
            }
            if !has_balanced_backticks(part) {
                return Err(SignatureError::TableNameInvalidBacktick {
                    name: self.name.clone(),
                });
            }
        }

        if self.fields.is_empty() {
            return Err(SignatureError::EmptyFields);
        }

        for (index, field) in self.fields.iter().enumerate() {
            if is_empty_identifier(field) {
                return Err(SignatureError::EmptyField { index });
            }
            if !has_balanced_backticks(field) {
                return Err(SignatureError::FieldInvalidBacktick {
                    field: field.clone(),
                });
            }
        }

        Ok(())
    }
}

impl fmt::Display for TableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Empty, or nothing but a pair of backticks
fn is_empty_identifier(s: &str) -> bool {
    s.is_empty() || s == "``"
}

/// Either quoted on both sides or on neither
fn has_balanced_backticks(s: &str) -> bool {
    if s == "`" {
        return false;
    }
    s.starts_with(BACKTICK) == s.ends_with(BACKTICK)
}

fn unquote(s: &str) -> &str {
    s.strip_prefix(BACKTICK)
        .and_then(|s| s.strip_suffix(BACKTICK))
        .unwrap_or(s)
}

#[cfg(test)]
#[path = "signature_test.rs"]
mod signature_test;
