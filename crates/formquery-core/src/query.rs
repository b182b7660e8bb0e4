//! Query accumulator.
//!
//! [`Query`] collects key/value pairs (last write wins per key) through typed
//! setters and renders them as `application/x-www-form-urlencoded` text with
//! keys in ascending order.
//!
//! A `Query` is plain owned data with no interior locking. Share it across
//! threads only behind your own synchronization.

use crate::field::{FieldOptions, TimeFormat};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Offset, TimeZone};
use std::collections::btree_map::{self, BTreeMap};
use std::fmt::{self, Display, Write};
use tracing::warn;
use url::form_urlencoded;

/// Literal emitted for `true`.
pub const TRUE: &str = "true";

/// Literal emitted for `false`.
pub const FALSE: &str = "false";

/// Ordered accumulator of query parameters.
///
/// ```
/// use formquery_core::Query;
///
/// let mut query = Query::new();
/// query.set_string("name", "alice").set_f64("price", 19.5).set_bool("active", false);
/// assert_eq!(query.encode(), "active=false&name=alice&price=19.5");
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Query {
    values: BTreeMap<String, String>,
}

impl Query {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Set keys and values from an alternating `key, value, key, value` list.
    ///
    /// Every token is rendered through `Display`. A trailing key without a
    /// value is ignored. No omission applies.
    pub fn pair(&mut self, key_values: &[&dyn Display]) -> &mut Self {
        for chunk in key_values.chunks_exact(2) {
            self.insert(chunk[0].to_string(), chunk[1].to_string());
        }
        self
    }

    /// Set a string value.
    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.insert(key.into(), value.into());
        self
    }

    /// Set a string value, skipping it when empty and `omitempty` is set.
    pub fn set_string_with(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        options: &FieldOptions,
    ) -> &mut Self {
        let value = value.into();
        if value.is_empty() && options.omit_empty() {
            return self;
        }
        self.insert(key.into(), value);
        self
    }

    /// Set a signed integer in base 10.
    pub fn set_i64(&mut self, key: impl Into<String>, value: i64) -> &mut Self {
        self.set_i64_with(key, value, &FieldOptions::none())
    }

    /// Set a signed integer, skipping zero when `omitempty` is set.
    pub fn set_i64_with(
        &mut self,
        key: impl Into<String>,
        value: i64,
        options: &FieldOptions,
    ) -> &mut Self {
        if value == 0 && options.omit_empty() {
            return self;
        }
        self.set_string(key, value.to_string())
    }

    /// Set an unsigned integer in base 10.
    pub fn set_u64(&mut self, key: impl Into<String>, value: u64) -> &mut Self {
        self.set_u64_with(key, value, &FieldOptions::none())
    }

    /// Set an unsigned integer, skipping zero when `omitempty` is set.
    pub fn set_u64_with(
        &mut self,
        key: impl Into<String>,
        value: u64,
        options: &FieldOptions,
    ) -> &mut Self {
        if value == 0 && options.omit_empty() {
            return self;
        }
        self.set_string(key, value.to_string())
    }

    /// Set a float in its shortest round-trip decimal form.
    pub fn set_f64(&mut self, key: impl Into<String>, value: f64) -> &mut Self {
        self.set_f64_with(key, value, &FieldOptions::none())
    }

    /// Set a float, skipping zero when `omitempty` is set.
    #[allow(clippy::float_cmp)]
    pub fn set_f64_with(
        &mut self,
        key: impl Into<String>,
        value: f64,
        options: &FieldOptions,
    ) -> &mut Self {
        if value == 0.0 && options.omit_empty() {
            return self;
        }
        // `Display` for f64 never uses exponent notation and is round-trip exact.
        self.set_string(key, value.to_string())
    }

    /// Set a boolean as `true` or `false`. Booleans are never omitted.
    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) -> &mut Self {
        self.set_string(key, if value { TRUE } else { FALSE })
    }

    /// Set a timestamp in its default string form.
    pub fn set_time<Tz: TimeZone>(&mut self, key: impl Into<String>, value: &DateTime<Tz>) -> &mut Self {
        self.set_time_with(key, value, &FieldOptions::none())
    }

    /// Set a timestamp formatted by the first option token.
    ///
    /// `unix`, `unixMilli`, `unixMicro` and `unixNano` emit an epoch count;
    /// any other token is a `strftime` layout. With `omitempty` the Unix epoch
    /// itself counts as the zero value and is skipped.
    pub fn set_time_with<Tz: TimeZone>(
        &mut self,
        key: impl Into<String>,
        value: &DateTime<Tz>,
        options: &FieldOptions,
    ) -> &mut Self {
        let instant = value.with_timezone(&value.offset().fix());
        let is_epoch = instant.timestamp() == 0 && instant.timestamp_subsec_nanos() == 0;
        if is_epoch && options.omit_empty() {
            return self;
        }
        self.put_time(key.into(), &instant, options.time_format());
        self
    }

    /// Set whole seconds since the Unix epoch.
    pub fn set_unix<Tz: TimeZone>(&mut self, key: impl Into<String>, value: &DateTime<Tz>) -> &mut Self {
        self.set_i64(key, value.timestamp())
    }

    /// Set milliseconds since the Unix epoch.
    pub fn set_unix_millis<Tz: TimeZone>(
        &mut self,
        key: impl Into<String>,
        value: &DateTime<Tz>,
    ) -> &mut Self {
        self.set_i64(key, value.timestamp_millis())
    }

    /// Look up the value stored for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no parameters have been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over pairs in key order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.values.iter(),
        }
    }

    /// Render the query as form-urlencoded text with keys sorted.
    ///
    /// Returns an empty string for an empty query.
    #[must_use]
    pub fn encode(&self) -> String {
        if self.values.is_empty() {
            return String::new();
        }
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.values.iter())
            .finish()
    }

    /// Store a timestamp without any omission check.
    pub(crate) fn put_time(
        &mut self,
        key: String,
        instant: &DateTime<FixedOffset>,
        format: Option<&TimeFormat>,
    ) {
        let value = match format {
            None => instant.to_string(),
            Some(TimeFormat::Unix) => instant.timestamp().to_string(),
            Some(TimeFormat::UnixMilli) => instant.timestamp_millis().to_string(),
            Some(TimeFormat::UnixMicro) => instant.timestamp_micros().to_string(),
            Some(TimeFormat::UnixNano) => match instant.timestamp_nanos_opt() {
                Some(nanos) => nanos.to_string(),
                None => {
                    warn!(key = %key, "timestamp out of range for nanoseconds, using default form");
                    instant.to_string()
                }
            },
            Some(TimeFormat::Layout(layout)) => match format_layout(instant, layout) {
                Some(text) => text,
                None => {
                    warn!(key = %key, layout = %layout, "invalid time layout, using default form");
                    instant.to_string()
                }
            },
        };
        self.insert(key, value);
    }

    fn insert(&mut self, key: String, value: String) {
        self.values.insert(key, value);
    }
}

fn format_layout(instant: &DateTime<FixedOffset>, layout: &str) -> Option<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(layout).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }
    let mut out = String::new();
    write!(out, "{}", instant.format_with_items(items.iter())).ok()?;
    Some(out)
}

impl Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl<K, V> FromIterator<(K, V)> for Query
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Self::new();
        query.extend(iter);
        query
    }
}

impl<K, V> Extend<(K, V)> for Query
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key.into(), value.into());
        }
    }
}

/// Iterator over the pairs of a [`Query`], in key order.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: btree_map::Iter<'a, String, String>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a Query {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Build a [`Query`] from an alternating `key, value, ...` list.
///
/// ```
/// use formquery_core::query;
///
/// let query = query!("limit", 50, "symbol", "BTC USD");
/// assert_eq!(query.encode(), "limit=50&symbol=BTC+USD");
/// ```
#[macro_export]
macro_rules! query {
    ($($token:expr),* $(,)?) => {{
        let mut query = $crate::Query::new();
        query.pair(&[$(&$token as &dyn ::std::fmt::Display),*]);
        query
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use url::form_urlencoded;

    fn fixed_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()
    }

    #[test]
    fn empty_query_encodes_to_empty_string() {
        assert_eq!(Query::new().encode(), "");
        assert!(Query::new().is_empty());
    }

    #[test]
    fn encode_sorts_keys_and_escapes_values() {
        let mut query = Query::new();
        query
            .set_string("z", "last")
            .set_string("a", "hello world")
            .set_string("m", "a&b=c");
        assert_eq!(query.encode(), "a=hello+world&m=a%26b%3Dc&z=last");
        assert_eq!(query.to_string(), query.encode());
    }

    #[test]
    fn encode_is_deterministic() {
        let query: Query = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(query.encode(), query.encode());
        assert_eq!(query.encode(), "a=1&b=2");
    }

    #[test]
    fn last_write_wins() {
        let mut query = Query::new();
        query.set_string("key", "first").set_i64("key", 2);
        assert_eq!(query.len(), 1);
        assert_eq!(query.get("key"), Some("2"));
    }

    #[test]
    fn string_omission() {
        let omit = FieldOptions::omit_empty_only();
        let mut query = Query::new();
        query
            .set_string_with("skipped", "", &omit)
            .set_string_with("kept", "", &FieldOptions::none())
            .set_string_with("value", "x", &omit);
        assert_eq!(query.encode(), "kept=&value=x");
    }

    #[test]
    fn numeric_omission_uses_zero_value() {
        let omit = FieldOptions::omit_empty_only();
        let mut query = Query::new();
        query
            .set_i64_with("i", 0, &omit)
            .set_u64_with("u", 0, &omit)
            .set_f64_with("f", 0.0, &omit);
        assert!(query.is_empty());

        query
            .set_i64_with("i", -3, &omit)
            .set_u64_with("u", 9, &omit)
            .set_f64_with("f", 0.25, &omit);
        assert_eq!(query.encode(), "f=0.25&i=-3&u=9");
    }

    #[test]
    fn zero_without_omission_is_emitted() {
        let mut query = Query::new();
        query.set_i64("count", 0);
        assert_eq!(query.encode(), "count=0");
    }

    #[test]
    fn float_formatting_is_shortest() {
        let mut query = Query::new();
        query.set_f64("price", 19.5);
        assert_eq!(query.encode(), "price=19.5");

        query.set_f64("price", 100.0);
        assert_eq!(query.get("price"), Some("100"));

        query.set_f64("price", 1e21);
        assert_eq!(query.get("price"), Some("1000000000000000000000"));
    }

    #[test]
    fn bool_is_never_omitted() {
        let mut query = Query::new();
        query.set_bool("key", false);
        assert_eq!(query.encode(), "key=false");
        query.set_bool("key", true);
        assert_eq!(query.encode(), "key=true");
    }

    #[test]
    fn pair_renders_tokens_and_drops_dangling_key() {
        let mut query = Query::new();
        query.pair(&[&"limit", &10, &"active", &true, &"dangling"]);
        assert_eq!(query.encode(), "active=true&limit=10");
    }

    #[test]
    fn query_macro_pairs() {
        let query = query!("b", 2.5, "a", 'x');
        assert_eq!(query.encode(), "a=x&b=2.5");
        assert!(query!().is_empty());
    }

    #[test]
    fn time_default_form() {
        let mut query = Query::new();
        query.set_time("at", &fixed_instant());
        assert_eq!(query.get("at"), Some("2023-11-14 22:13:20 +00:00"));
    }

    #[test]
    fn time_epoch_formats() {
        let instant = fixed_instant();
        let mut query = Query::new();
        query
            .set_time_with("s", &instant, &FieldOptions::parse("unix"))
            .set_time_with("ms", &instant, &FieldOptions::parse("unixMilli"))
            .set_time_with("us", &instant, &FieldOptions::parse("unixMicro"))
            .set_time_with("ns", &instant, &FieldOptions::parse("unixNano"));

        assert_eq!(query.get("s"), Some("1700000000"));
        assert_eq!(query.get("ms"), Some("1700000000000"));
        assert_eq!(query.get("us"), Some("1700000000000000"));
        assert_eq!(query.get("ns"), Some("1700000000000000000"));
    }

    #[test]
    fn time_layout_format() {
        let mut query = Query::new();
        query.set_time_with("day", &fixed_instant(), &FieldOptions::parse("%Y-%m-%d"));
        assert_eq!(query.get("day"), Some("2023-11-14"));

        query.set_time_with("ref", &fixed_instant(), &FieldOptions::parse("2006-01-02"));
        assert_eq!(query.get("ref"), Some("2006-01-02"));
    }

    #[test]
    fn invalid_time_layout_degrades_to_default_form() {
        let mut query = Query::new();
        query.set_time_with("at", &fixed_instant(), &FieldOptions::parse("%Q"));
        assert_eq!(query.get("at"), Some("2023-11-14 22:13:20 +00:00"));
    }

    #[test]
    fn time_keeps_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = fixed_instant().with_timezone(&offset);
        let mut query = Query::new();
        query
            .set_time("at", &local)
            .set_time_with("s", &local, &FieldOptions::parse("unix"));
        assert_eq!(query.get("at"), Some("2023-11-15 00:13:20 +02:00"));
        assert_eq!(query.get("s"), Some("1700000000"));
    }

    #[test]
    fn time_omission_only_skips_epoch() {
        let omit = FieldOptions::parse("unix,omitempty");
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        let mut query = Query::new();
        query.set_time_with("epoch", &epoch, &omit);
        assert!(query.is_empty());

        query.set_time_with("at", &fixed_instant(), &omit);
        assert_eq!(query.get("at"), Some("1700000000"));
    }

    #[test]
    fn unix_helpers() {
        let instant = NaiveDate::from_ymd_opt(2023, 11, 14)
            .unwrap()
            .and_hms_opt(22, 13, 20)
            .unwrap()
            .and_utc();
        let mut query = Query::new();
        query
            .set_unix("s", &instant)
            .set_unix_millis("ms", &instant);
        assert_eq!(query.encode(), "ms=1700000000000&s=1700000000");
    }

    #[test]
    fn encoded_output_decodes_back() {
        let mut query = Query::new();
        query
            .set_string("plain", "abc-123")
            .set_string("spaced", "a b+c")
            .set_string("unicode", "héllo");

        let decoded: Vec<(String, String)> = form_urlencoded::parse(query.encode().as_bytes())
            .into_owned()
            .collect();
        assert_eq!(
            decoded,
            vec![
                ("plain".to_string(), "abc-123".to_string()),
                ("spaced".to_string(), "a b+c".to_string()),
                ("unicode".to_string(), "héllo".to_string()),
            ]
        );
    }

    #[test]
    fn iterate_remove_and_extend() {
        let mut query = Query::new();
        query.extend([("b", "2"), ("a", "1")]);
        let pairs: Vec<_> = query.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);

        assert_eq!(query.remove("a"), Some("1".to_string()));
        assert_eq!(query.get("a"), None);
        assert_eq!((&query).into_iter().count(), 1);
    }
}
