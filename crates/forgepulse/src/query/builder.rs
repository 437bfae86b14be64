//! Typed GraphQL document construction.
//!
//! Documents are assembled from [`Field`], [`Selection`] and [`Fragment`]
//! values and rendered in one pass. Rendering validates every identifier and
//! escapes every string argument, so caller data can only ever appear inside a
//! quoted literal.

use std::collections::HashSet;

use thiserror::Error;

use crate::graphql::{GraphQlRequest, QueryError};

const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("'{0}' is not a valid GraphQL name")]
    InvalidName(String),

    #[error("'{0}' is not a valid GraphQL type")]
    InvalidType(String),

    #[error("document has no selections")]
    EmptySelection,

    #[error("fragment '{0}' is used but never defined")]
    UnknownFragment(String),

    #[error("response key '{0}' appears twice in one selection set")]
    DuplicateKey(String),
}

impl From<DocumentError> for QueryError {
    fn from(e: DocumentError) -> Self {
        QueryError::InvalidRequest(e.to_string())
    }
}

/// An argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Rendered as an escaped, quoted string literal.
    Str(String),
    Int(i64),
    /// A bare enum value such as `PUSHED_AT`.
    Enum(String),
    List(Vec<Arg>),
    Object(Vec<(String, Arg)>),
    /// A `$variable` reference.
    Var(String),
}

impl Arg {
    pub fn str(value: impl Into<String>) -> Self {
        Arg::Str(value.into())
    }

    pub fn enum_value(value: impl Into<String>) -> Self {
        Arg::Enum(value.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Arg::Var(name.into())
    }

    pub fn enums(values: &[&str]) -> Self {
        Arg::List(values.iter().map(|v| Arg::enum_value(*v)).collect())
    }

    /// `{field: FIELD, direction: DIRECTION}`.
    pub fn order_by(field: &str, direction: &str) -> Self {
        Arg::Object(vec![
            ("field".to_string(), Arg::enum_value(field)),
            ("direction".to_string(), Arg::enum_value(direction)),
        ])
    }
}

impl From<usize> for Arg {
    fn from(value: usize) -> Self {
        Arg::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

/// One entry in a selection set.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Field),
    /// `... on Type { ... }`
    Inline {
        on: String,
        selections: Vec<Selection>,
    },
    /// `...FragmentName`
    Spread(String),
}

impl Selection {
    pub fn on(type_condition: impl Into<String>, selections: Vec<Selection>) -> Self {
        Selection::Inline {
            on: type_condition.into(),
            selections,
        }
    }

    pub fn spread(fragment: impl Into<String>) -> Self {
        Selection::Spread(fragment.into())
    }
}

impl From<Field> for Selection {
    fn from(field: Field) -> Self {
        Selection::Field(field)
    }
}

/// A field with optional alias, arguments and sub-selections.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    alias: Option<String>,
    name: String,
    arguments: Vec<(String, Arg)>,
    selections: Vec<Selection>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: name.into(),
            arguments: Vec::new(),
            selections: Vec::new(),
        }
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Arg>) -> Self {
        self.arguments.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn select(mut self, selection: impl Into<Selection>) -> Self {
        self.selections.push(selection.into());
        self
    }

    /// Add scalar leaf fields.
    #[must_use]
    pub fn scalars(mut self, names: &[&str]) -> Self {
        self.selections
            .extend(names.iter().map(|n| Selection::Field(Field::new(*n))));
        self
    }

    fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A named fragment definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    name: String,
    on: String,
    selections: Vec<Selection>,
}

impl Fragment {
    pub fn new(name: impl Into<String>, on: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on: on.into(),
            selections: Vec::new(),
        }
    }

    #[must_use]
    pub fn select(mut self, selection: impl Into<Selection>) -> Self {
        self.selections.push(selection.into());
        self
    }

    #[must_use]
    pub fn scalars(mut self, names: &[&str]) -> Self {
        self.selections
            .extend(names.iter().map(|n| Selection::Field(Field::new(*n))));
        self
    }
}

/// A query operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    variables: Vec<(String, String)>,
    selections: Vec<Selection>,
    fragments: Vec<Fragment>,
}

impl Document {
    pub fn query() -> Self {
        Self::default()
    }

    /// Declare `$name: ty`.
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.variables.push((name.into(), ty.into()));
        self
    }

    #[must_use]
    pub fn select(mut self, selection: impl Into<Selection>) -> Self {
        self.selections.push(selection.into());
        self
    }

    #[must_use]
    pub fn fragment(mut self, fragment: Fragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// Validate and render the document text.
    pub fn render(&self) -> Result<String, DocumentError> {
        if self.selections.is_empty() {
            return Err(DocumentError::EmptySelection);
        }

        let defined: HashSet<&str> = self.fragments.iter().map(|f| f.name.as_str()).collect();
        let mut out = String::from("query");

        if !self.variables.is_empty() {
            out.push('(');
            for (i, (name, ty)) in self.variables.iter().enumerate() {
                check_name(name)?;
                check_type(ty)?;
                if i > 0 {
                    out.push_str(", ");
                }
                out.push('$');
                out.push_str(name);
                out.push_str(": ");
                out.push_str(ty);
            }
            out.push(')');
        }

        out.push_str(" {\n");
        render_selections(&mut out, &self.selections, 1, &defined)?;
        out.push_str("}\n");

        for fragment in &self.fragments {
            check_name(&fragment.name)?;
            check_name(&fragment.on)?;
            if fragment.selections.is_empty() {
                return Err(DocumentError::EmptySelection);
            }
            out.push_str("\nfragment ");
            out.push_str(&fragment.name);
            out.push_str(" on ");
            out.push_str(&fragment.on);
            out.push_str(" {\n");
            render_selections(&mut out, &fragment.selections, 1, &defined)?;
            out.push_str("}\n");
        }

        Ok(out)
    }

    /// Render into a request ready for an executor.
    pub fn to_request(&self) -> Result<GraphQlRequest, QueryError> {
        GraphQlRequest::new(self.render()?)
    }
}

fn render_selections(
    out: &mut String,
    selections: &[Selection],
    depth: usize,
    fragments: &HashSet<&str>,
) -> Result<(), DocumentError> {
    let mut keys = HashSet::new();
    for selection in selections {
        push_indent(out, depth);
        match selection {
            Selection::Field(field) => {
                if !keys.insert(field.response_key()) {
                    return Err(DocumentError::DuplicateKey(
                        field.response_key().to_string(),
                    ));
                }
                render_field(out, field, depth, fragments)?;
            }
            Selection::Inline { on, selections } => {
                check_name(on)?;
                out.push_str("... on ");
                out.push_str(on);
                render_block(out, selections, depth, fragments)?;
            }
            Selection::Spread(name) => {
                check_name(name)?;
                if !fragments.contains(name.as_str()) {
                    return Err(DocumentError::UnknownFragment(name.clone()));
                }
                out.push_str("...");
                out.push_str(name);
                out.push('\n');
            }
        }
    }
    Ok(())
}

fn render_field(
    out: &mut String,
    field: &Field,
    depth: usize,
    fragments: &HashSet<&str>,
) -> Result<(), DocumentError> {
    if let Some(alias) = &field.alias {
        check_name(alias)?;
        out.push_str(alias);
        out.push_str(": ");
    }
    check_name(&field.name)?;
    out.push_str(&field.name);

    if !field.arguments.is_empty() {
        out.push('(');
        render_pairs(out, &field.arguments)?;
        out.push(')');
    }

    if field.selections.is_empty() {
        out.push('\n');
        Ok(())
    } else {
        render_block(out, &field.selections, depth, fragments)
    }
}

fn render_block(
    out: &mut String,
    selections: &[Selection],
    depth: usize,
    fragments: &HashSet<&str>,
) -> Result<(), DocumentError> {
    out.push_str(" {\n");
    render_selections(out, selections, depth + 1, fragments)?;
    push_indent(out, depth);
    out.push_str("}\n");
    Ok(())
}

fn render_pairs(out: &mut String, pairs: &[(String, Arg)]) -> Result<(), DocumentError> {
    for (i, (name, value)) in pairs.iter().enumerate() {
        check_name(name)?;
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(name);
        out.push_str(": ");
        render_arg(out, value)?;
    }
    Ok(())
}

fn render_arg(out: &mut String, arg: &Arg) -> Result<(), DocumentError> {
    match arg {
        Arg::Str(s) => out.push_str(&quote(s)),
        Arg::Int(n) => out.push_str(&n.to_string()),
        Arg::Enum(v) => {
            check_name(v)?;
            out.push_str(v);
        }
        Arg::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_arg(out, item)?;
            }
            out.push(']');
        }
        Arg::Object(pairs) => {
            out.push('{');
            render_pairs(out, pairs)?;
            out.push('}');
        }
        Arg::Var(name) => {
            check_name(name)?;
            out.push('$');
            out.push_str(name);
        }
    }
    Ok(())
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// Quote and escape a GraphQL string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// `[_A-Za-z][_0-9A-Za-z]*`
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

fn check_name(name: &str) -> Result<(), DocumentError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(DocumentError::InvalidName(name.to_string()))
    }
}

fn check_type(ty: &str) -> Result<(), DocumentError> {
    let core = ty.trim_end_matches('!');
    let inner = core
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .map(|t| t.trim_end_matches('!'))
        .unwrap_or(core);
    if is_valid_name(inner) {
        Ok(())
    } else {
        Err(DocumentError::InvalidType(ty.to_string()))
    }
}
