//! Struct projection.
//!
//! A record type registers its fields once through [`query_record!`]; the
//! resulting table of [`QueryField`]s drives [`Query::record`].
//!
//! Projection is shallow. A field whose type is itself a record is emitted
//! through its own [`ToQueryValue`] rendering, never flattened into the
//! parent's keys.
//!
//! [`ToQueryValue`]: crate::ToQueryValue

use crate::field::{FieldSpec, FieldTags};
use crate::query::Query;
use crate::value::QueryValue;
use tracing::debug;

/// One registered field: its resolved spec and an accessor.
pub struct QueryField<R> {
    spec: FieldSpec,
    value: fn(&R) -> QueryValue,
}

impl<R> QueryField<R> {
    /// Resolve `tags` and pair them with the field accessor.
    #[must_use]
    pub fn new(tags: FieldTags, value: fn(&R) -> QueryValue) -> Self {
        Self {
            spec: FieldSpec::resolve(&tags),
            value,
        }
    }

    /// The resolved key and options.
    #[must_use]
    pub const fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// Read and classify this field on `record`.
    #[must_use]
    pub fn value_of(&self, record: &R) -> QueryValue {
        (self.value)(record)
    }
}

impl<R> std::fmt::Debug for QueryField<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryField")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// A type whose fields can be projected into a [`Query`].
///
/// Implement it with [`query_record!`], which builds the field table once per
/// type.
pub trait QueryRecord: Sized + 'static {
    /// Registered fields, in declaration order.
    fn query_fields() -> &'static [QueryField<Self>];
}

impl Query {
    /// Build a query from a single record.
    #[must_use]
    pub fn from_record<R: QueryRecord>(record: &R) -> Self {
        let mut query = Self::new();
        query.record(record);
        query
    }

    /// Project the fields of `record` into this query.
    ///
    /// For each field, in order:
    /// - an absent optional sets the key to an empty string, unless `omitempty`;
    /// - a timestamp is formatted by its first option token and always set;
    /// - a string-rendered value is set, unless empty under `omitempty`;
    /// - a scalar is skipped when it is its type's zero value under
    ///   `omitempty`, and set otherwise.
    pub fn record<R: QueryRecord>(&mut self, record: &R) -> &mut Self {
        let fields = R::query_fields();
        for field in fields {
            let spec = field.spec();
            let options = spec.options();

            match field.value_of(record) {
                QueryValue::Nil => {
                    self.set_string_with(spec.key(), "", options);
                }
                QueryValue::Time(instant) => {
                    self.put_time(spec.key().to_string(), &instant, options.time_format());
                }
                QueryValue::Text(text) => {
                    self.set_string_with(spec.key(), text, options);
                }
                QueryValue::Scalar { text, empty } => {
                    if empty && options.omit_empty() {
                        continue;
                    }
                    self.set_string_with(spec.key(), text, options);
                }
            }
        }

        debug!(
            record = std::any::type_name::<R>(),
            fields = fields.len(),
            "projected record into query"
        );
        self
    }

    /// Project an optional record; `None` leaves the query untouched.
    pub fn record_opt<R: QueryRecord>(&mut self, record: Option<&R>) -> &mut Self {
        if let Some(record) = record {
            self.record(record);
        }
        self
    }
}

/// Register the query fields of a struct.
///
/// Each listed field may carry `url = "..."` and `json = "..."` annotations
/// in the `key,opt1,opt2` form, separated by whitespace when both are given
/// (`field: url = ",omitempty" json = "name"`). The record type must be
/// `'static` and non-generic. The key comes from `url`, then `json`, then
/// the field's own name. Only listed fields are projected, in the order given.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use formquery_core::{query_record, Query};
///
/// struct Orders {
///     symbol: String,
///     limit: u32,
///     start_time: chrono::DateTime<Utc>,
///     cursor: Option<String>,
/// }
///
/// query_record!(Orders {
///     symbol: url = "symbol",
///     limit: json = "limit,omitempty",
///     start_time: url = "startTime,unixMilli",
///     cursor: url = "cursor,omitempty",
/// });
///
/// let orders = Orders {
///     symbol: "BTCUSDT".into(),
///     limit: 0,
///     start_time: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
///     cursor: None,
/// };
///
/// assert_eq!(
///     Query::from_record(&orders).encode(),
///     "startTime=1700000000000&symbol=BTCUSDT"
/// );
/// ```
#[macro_export]
macro_rules! query_record {
    ($record:ty { $( $field:ident $( : $( $namespace:ident = $annotation:literal )+ )? ),* $(,)? }) => {
        impl $crate::QueryRecord for $record {
            fn query_fields() -> &'static [$crate::QueryField<Self>] {
                static FIELDS: ::std::sync::OnceLock<::std::vec::Vec<$crate::QueryField<$record>>> =
                    ::std::sync::OnceLock::new();
                FIELDS.get_or_init(|| {
                    ::std::vec![
                        $(
                            $crate::QueryField::new(
                                $crate::FieldTags::new(::std::stringify!($field))
                                    $( $( .tag(::std::stringify!($namespace), $annotation) )+ )?,
                                |record: &$record| $crate::ToQueryValue::to_query_value(&record.$field),
                            ),
                        )*
                    ]
                })
            }
        }
    };
}
