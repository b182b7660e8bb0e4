//! Projection of serde-serializable values.
//!
//! Useful for request types that already derive `Serialize`: keys follow the
//! serde field names and `skip_serializing_if` takes the place of
//! `omitempty`.

use crate::error::{Error, Result};
use crate::query::Query;
use crate::value::ToQueryValue;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

impl Query {
    /// Project a serializable record into this query.
    ///
    /// `null` at the top level (e.g. `None`) is a no-op. Field values render
    /// as follows: `null` becomes an empty string, strings are kept, numbers
    /// and booleans use their textual form, arrays and objects become compact
    /// JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotARecord`] when the value does not serialize to an
    /// object, and [`Error::Encode`] when serialization itself fails.
    ///
    /// ```
    /// use formquery_core::Query;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct Page {
    ///     #[serde(rename = "pageSize")]
    ///     page_size: u32,
    ///     #[serde(skip_serializing_if = "Option::is_none")]
    ///     cursor: Option<String>,
    /// }
    ///
    /// let mut query = Query::new();
    /// query.serialized(&Page { page_size: 20, cursor: None })?;
    /// assert_eq!(query.encode(), "pageSize=20");
    /// # Ok::<(), formquery_core::Error>(())
    /// ```
    pub fn serialized<T>(&mut self, record: &T) -> Result<&mut Self>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(record).map_err(|err| Error::Encode(err.to_string()))?;

        match value {
            Value::Null => Ok(self),
            Value::Object(fields) => {
                let count = fields.len();
                for (key, field) in fields {
                    self.set_string(key, field.to_query_value().into_text());
                }
                debug!(fields = count, "projected serialized record into query");
                Ok(self)
            }
            other => Err(Error::NotARecord(kind_of(&other).to_string())),
        }
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
