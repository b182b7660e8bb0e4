//! Value dispatch for projected fields.
//!
//! Every field registered on a record is turned into a [`QueryValue`] through
//! [`ToQueryValue`]. The variant decides how the projector formats it.

use crate::query::{FALSE, TRUE};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone};
use std::borrow::Cow;

/// The dispatch class of a field value, in projector priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// An absent optional value.
    Nil,
    /// A timestamp, formatted according to the field's time format.
    Time(DateTime<FixedOffset>),
    /// A value with its own string rendering, emitted without the zero-value check.
    Text(String),
    /// A plain scalar in its default textual form.
    Scalar {
        /// Rendered value.
        text: String,
        /// Whether the value is the zero value of its type.
        empty: bool,
    },
}

impl QueryValue {
    /// A scalar value.
    #[must_use]
    pub fn scalar(text: impl Into<String>, empty: bool) -> Self {
        Self::Scalar {
            text: text.into(),
            empty,
        }
    }

    /// Mark a scalar as present. Values reached through a populated optional
    /// are never treated as empty.
    #[must_use]
    pub fn present(self) -> Self {
        match self {
            Self::Scalar { text, .. } => Self::Scalar { text, empty: false },
            other => other,
        }
    }

    /// Whether the value counts as the zero value for omission purposes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        match self {
            Self::Nil => true,
            Self::Scalar { empty, .. } => *empty,
            Self::Time(_) | Self::Text(_) => false,
        }
    }

    /// The default textual form, ignoring any field options.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Nil => String::new(),
            Self::Time(instant) => instant.to_string(),
            Self::Text(text) | Self::Scalar { text, .. } => text,
        }
    }
}

/// Conversion of a field value into its dispatch class.
///
/// Implemented for the primitive scalars, strings, sequences, optionals,
/// chrono timestamps and a few common string-rendered types. Use
/// [`query_display!`](crate::query_display) to give a `Display` type the
/// string rendering capability.
pub trait ToQueryValue {
    /// Classify and render the value.
    fn to_query_value(&self) -> QueryValue;
}

macro_rules! integer_value {
    ($($ty:ty),+) => {
        $(
            impl ToQueryValue for $ty {
                fn to_query_value(&self) -> QueryValue {
                    QueryValue::scalar(self.to_string(), *self == 0)
                }
            }
        )+
    };
}

integer_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! float_value {
    ($($ty:ty),+) => {
        $(
            impl ToQueryValue for $ty {
                #[allow(clippy::float_cmp)]
                fn to_query_value(&self) -> QueryValue {
                    QueryValue::scalar(self.to_string(), *self == 0.0)
                }
            }
        )+
    };
}

float_value!(f32, f64);

impl ToQueryValue for bool {
    fn to_query_value(&self) -> QueryValue {
        QueryValue::scalar(if *self { TRUE } else { FALSE }, !*self)
    }
}

impl ToQueryValue for char {
    fn to_query_value(&self) -> QueryValue {
        QueryValue::scalar(self.to_string(), *self == '\0')
    }
}

impl ToQueryValue for str {
    fn to_query_value(&self) -> QueryValue {
        QueryValue::scalar(self, self.is_empty())
    }
}

impl ToQueryValue for String {
    fn to_query_value(&self) -> QueryValue {
        self.as_str().to_query_value()
    }
}

impl ToQueryValue for Cow<'_, str> {
    fn to_query_value(&self) -> QueryValue {
        self.as_ref().to_query_value()
    }
}

impl<T: ToQueryValue + ?Sized> ToQueryValue for &T {
    fn to_query_value(&self) -> QueryValue {
        (**self).to_query_value()
    }
}

impl<T: ToQueryValue + ?Sized> ToQueryValue for Box<T> {
    fn to_query_value(&self) -> QueryValue {
        (**self).to_query_value()
    }
}

impl<T: ToQueryValue> ToQueryValue for Option<T> {
    fn to_query_value(&self) -> QueryValue {
        match self {
            Some(value) => value.to_query_value().present(),
            None => QueryValue::Nil,
        }
    }
}

// Sequences render as `[a b c]`, the form existing callers receive.
impl<T: ToQueryValue> ToQueryValue for [T] {
    fn to_query_value(&self) -> QueryValue {
        let items: Vec<String> = self
            .iter()
            .map(|item| item.to_query_value().into_text())
            .collect();
        QueryValue::scalar(format!("[{}]", items.join(" ")), self.is_empty())
    }
}

impl<T: ToQueryValue> ToQueryValue for Vec<T> {
    fn to_query_value(&self) -> QueryValue {
        self.as_slice().to_query_value()
    }
}

impl<T: ToQueryValue, const N: usize> ToQueryValue for [T; N] {
    fn to_query_value(&self) -> QueryValue {
        self.as_slice().to_query_value()
    }
}

impl<Tz: TimeZone> ToQueryValue for DateTime<Tz> {
    fn to_query_value(&self) -> QueryValue {
        QueryValue::Time(self.with_timezone(&self.offset().fix()))
    }
}

impl ToQueryValue for NaiveDate {
    fn to_query_value(&self) -> QueryValue {
        QueryValue::Text(self.to_string())
    }
}

impl ToQueryValue for uuid::Uuid {
    fn to_query_value(&self) -> QueryValue {
        QueryValue::Text(self.to_string())
    }
}

impl ToQueryValue for serde_json::Value {
    fn to_query_value(&self) -> QueryValue {
        use serde_json::Value;

        match self {
            Value::Null => QueryValue::scalar("", true),
            Value::Bool(flag) => flag.to_query_value(),
            Value::Number(number) => {
                let empty = number.as_f64().is_some_and(|n| n == 0.0);
                // floats use the same shortest form as `set_f64`
                let text = match number.as_f64() {
                    Some(float) if number.is_f64() => float.to_string(),
                    _ => number.to_string(),
                };
                QueryValue::scalar(text, empty)
            }
            Value::String(text) => text.to_query_value(),
            Value::Array(items) => QueryValue::scalar(self.to_string(), items.is_empty()),
            Value::Object(map) => QueryValue::scalar(self.to_string(), map.is_empty()),
        }
    }
}

/// Give `Display` types the string rendering capability.
///
/// Fields of these types are emitted through their `Display` output and skip
/// the zero-value check applied to plain scalars.
///
/// ```
/// use formquery_core::{query_display, QueryValue, ToQueryValue};
/// use std::fmt;
///
/// enum Side {
///     Buy,
///     Sell,
/// }
///
/// impl fmt::Display for Side {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         f.write_str(match self {
///             Side::Buy => "BUY",
///             Side::Sell => "SELL",
///         })
///     }
/// }
///
/// query_display!(Side);
///
/// assert_eq!(Side::Sell.to_query_value(), QueryValue::Text("SELL".into()));
/// ```
#[macro_export]
macro_rules! query_display {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::ToQueryValue for $ty {
                fn to_query_value(&self) -> $crate::QueryValue {
                    $crate::QueryValue::Text(::std::string::ToString::to_string(self))
                }
            }
        )+
    };
}
