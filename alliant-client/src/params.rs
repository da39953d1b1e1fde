//! Query parameters for resource and collection requests
//!
//! The API uses OData-style system query options (`$top`, `$filter`, ...)
//! plus a bare `$<verbosity>` flag, so query strings are assembled here. Only
//! the `$filter` clause carries caller text, and it is form-encoded.

use std::fmt;
use std::str::FromStr;

use url::form_urlencoded;

/// How much of each record the API returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Minimal,
    #[default]
    Default,
    Verbose,
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Default => "default",
            Self::Verbose => "verbose",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "default" => Ok(Self::Default),
            "verbose" => Ok(Self::Verbose),
            _ => Err(format!("unknown verbosity '{s}'")),
        }
    }
}

/// Comparison operators accepted in `$filter`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Contains,
    EndsWith,
    StartsWith,
    Eq,
    Ne,
    Le,
    Lt,
    Ge,
    Gt,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::EndsWith => "endswith",
            Self::StartsWith => "startswith",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Le => "le",
            Self::Lt => "lt",
            Self::Ge => "ge",
            Self::Gt => "gt",
        }
    }
}

/// Sort direction for `$orderby`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A `$filter` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `field operator 'value'`
    Field {
        field: String,
        operator: FilterOperator,
        value: String,
    },
    /// A complete filter expression such as
    /// `(id eq '123' or description eq 'x') and statusReference.id ne 'active'`,
    /// without the `$filter=` prefix
    Expression(String),
}

impl Filter {
    /// Equality filter on a single field
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            operator: FilterOperator::Eq,
            value: value.into(),
        }
    }

    /// The unencoded clause, e.g. `id eq 'C-100'`
    pub fn clause(&self) -> String {
        match self {
            Self::Field {
                field,
                operator,
                value,
            } => format!(
                "{field} {} '{}'",
                operator.as_str(),
                value.replace('\'', r"\'")
            ),
            Self::Expression(expression) => expression.clone(),
        }
    }

    /// The clause as it appears in the query string
    ///
    /// Spaces become `+` and reserved characters (`&`, `+`, `%`, `#`, `=`,
    /// quotes) are percent-encoded.
    pub fn to_query(&self) -> String {
        let clause = self.clause();
        let encoded: String = form_urlencoded::byte_serialize(clause.as_bytes()).collect();
        format!("$filter={encoded}")
    }
}

/// Parameters for requests that return a single resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceParameters {
    pub verbosity: Option<Verbosity>,
    /// Fields added to a minimal or default response
    pub include: Vec<String>,
    /// Fields removed from the response
    pub exclude: Vec<String>,
}

impl ResourceParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = Some(verbosity);
        self
    }

    pub fn include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(fields.into_iter().map(Into::into));
        self
    }

    fn push_parts(&self, parts: &mut Vec<String>) {
        if let Some(verbosity) = self.verbosity {
            parts.push(format!("${verbosity}"));
        }
        if !self.include.is_empty() {
            parts.push(format!("include={}", self.include.join(",")));
        }
        if !self.exclude.is_empty() {
            parts.push(format!("exclude={}", self.exclude.join(",")));
        }
    }

    /// Query string without the leading `?`, or `None` when nothing is set
    pub fn query_string(&self) -> Option<String> {
        let mut parts = Vec::new();
        self.push_parts(&mut parts);
        join_parts(parts)
    }
}

/// Parameters for requests that return a collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionParameters {
    pub resource: ResourceParameters,
    /// Page size; the API defaults to 20
    pub top: Option<u32>,
    /// Records to skip when paging
    pub skip: Option<u32>,
    pub order_by: Option<(String, SortOrder)>,
    pub filter: Option<Filter>,
}

impl CollectionParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.resource.verbosity = Some(verbosity);
        self
    }

    pub fn include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource = self.resource.include(fields);
        self
    }

    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource = self.resource.exclude(fields);
        self
    }

    pub fn top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.order_by = Some((field.into(), order));
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Query string without the leading `?`, or `None` when nothing is set
    pub fn query_string(&self) -> Option<String> {
        let mut parts = Vec::new();
        self.resource.push_parts(&mut parts);
        if let Some(top) = self.top {
            parts.push(format!("$top={top}"));
        }
        if let Some(skip) = self.skip {
            parts.push(format!("$skip={skip}"));
        }
        if let Some((field, order)) = &self.order_by {
            parts.push(format!("$orderby={field}+{}", order.as_str()));
        }
        if let Some(filter) = &self.filter {
            parts.push(filter.to_query());
        }
        join_parts(parts)
    }
}

fn join_parts(parts: Vec<String>) -> Option<String> {
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("&"))
    }
}
