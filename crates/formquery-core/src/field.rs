//! Field annotation model.
//!
//! Each registered record field carries optional `url` and `json` annotations
//! of the form `"key,opt1,opt2"`. They are resolved once per record type into
//! a [`FieldSpec`] holding the query key and typed [`FieldOptions`].

use std::fmt;

/// Option token that suppresses default-valued fields.
pub const OMIT_EMPTY: &str = "omitempty";

/// Primary annotation namespace.
pub const URL_NAMESPACE: &str = "url";

/// Fallback annotation namespace.
pub const JSON_NAMESPACE: &str = "json";

/// Formatting applied to timestamp fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimeFormat {
    /// Whole seconds since the Unix epoch.
    Unix,
    /// Milliseconds since the Unix epoch.
    UnixMilli,
    /// Microseconds since the Unix epoch.
    UnixMicro,
    /// Nanoseconds since the Unix epoch.
    UnixNano,
    /// A chrono `strftime` pattern, e.g. `%Y-%m-%d`.
    ///
    /// Only `%` specifiers are substituted. Reference-date layouts such as
    /// `2006-01-02` contain none, so they are emitted literally.
    Layout(String),
}

impl TimeFormat {
    /// Interpret an option token as a time format.
    ///
    /// Returns `None` for the empty token and for `omitempty`, which leave the
    /// timestamp in its default string form.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "" | OMIT_EMPTY => None,
            "unix" => Some(Self::Unix),
            "unixMilli" => Some(Self::UnixMilli),
            "unixMicro" => Some(Self::UnixMicro),
            "unixNano" => Some(Self::UnixNano),
            layout => Some(Self::Layout(layout.to_string())),
        }
    }

    /// The option token naming this format.
    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::Unix => "unix",
            Self::UnixMilli => "unixMilli",
            Self::UnixMicro => "unixMicro",
            Self::UnixNano => "unixNano",
            Self::Layout(layout) => layout,
        }
    }
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Formatting options attached to a field or passed to a setter.
///
/// The raw tokens are kept in order; the omission marker and the time format
/// (taken from the first token) are resolved when the options are built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOptions {
    tokens: Vec<String>,
    omit_empty: bool,
    time_format: Option<TimeFormat>,
}

impl FieldOptions {
    /// Options with no tokens.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Options carrying only the omission marker.
    #[must_use]
    pub fn omit_empty_only() -> Self {
        Self::from_tokens([OMIT_EMPTY])
    }

    /// Parse the comma separated option list that follows the key segment.
    ///
    /// ```
    /// use formquery_core::{FieldOptions, TimeFormat};
    ///
    /// let options = FieldOptions::parse("unixMilli,omitempty");
    /// assert!(options.omit_empty());
    /// assert_eq!(options.time_format(), Some(&TimeFormat::UnixMilli));
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self::from_tokens(raw.split(','))
    }

    /// Build options from individual tokens.
    #[must_use]
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let omit_empty = tokens.iter().any(|token| token == OMIT_EMPTY);
        let time_format = tokens
            .first()
            .and_then(|token| TimeFormat::from_token(token));

        Self {
            tokens,
            omit_empty,
            time_format,
        }
    }

    /// Whether the omission marker is present.
    #[must_use]
    pub const fn omit_empty(&self) -> bool {
        self.omit_empty
    }

    /// The time format named by the first token, if any.
    #[must_use]
    pub const fn time_format(&self) -> Option<&TimeFormat> {
        self.time_format.as_ref()
    }

    /// Raw tokens in declaration order.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

/// Raw annotations registered for one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTags {
    name: &'static str,
    url: Option<&'static str>,
    json: Option<&'static str>,
}

impl FieldTags {
    /// Tags for a field with the given declared name and no annotations.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            url: None,
            json: None,
        }
    }

    /// Attach an annotation. Namespaces other than `url` and `json` are ignored.
    #[must_use]
    pub fn tag(mut self, namespace: &str, value: &'static str) -> Self {
        match namespace {
            URL_NAMESPACE => self.url = Some(value),
            JSON_NAMESPACE => self.json = Some(value),
            _ => {}
        }
        self
    }

    /// The declared field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The `url` annotation, if any.
    #[must_use]
    pub const fn url(&self) -> Option<&'static str> {
        self.url
    }

    /// The `json` annotation, if any.
    #[must_use]
    pub const fn json(&self) -> Option<&'static str> {
        self.json
    }
}

/// Resolved key name and options for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    key: String,
    options: FieldOptions,
}

impl FieldSpec {
    /// Create a spec directly.
    #[must_use]
    pub fn new(key: impl Into<String>, options: FieldOptions) -> Self {
        Self {
            key: key.into(),
            options,
        }
    }

    /// Resolve the key and options of a field.
    ///
    /// The `url` annotation is consulted first. If its key segment is missing
    /// or empty the `json` annotation replaces both key and options, and if
    /// that key is empty too the declared name is used with the `json` options.
    #[must_use]
    pub fn resolve(tags: &FieldTags) -> Self {
        let (mut key, mut options) = split_annotation(tags.url.unwrap_or_default());
        if key.is_empty() {
            (key, options) = split_annotation(tags.json.unwrap_or_default());
        }
        if key.is_empty() {
            key = tags.name;
        }

        Self::new(key, options)
    }

    /// The query key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The formatting options.
    #[must_use]
    pub const fn options(&self) -> &FieldOptions {
        &self.options
    }
}

fn split_annotation(annotation: &str) -> (&str, FieldOptions) {
    match annotation.split_once(',') {
        Some((key, rest)) => (key, FieldOptions::parse(rest)),
        None => (annotation, FieldOptions::parse("")),
    }
}
