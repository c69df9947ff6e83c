//! Path template compilation.
//!
//! A template such as `/users/{id:\d+}/posts/{slug}` is compiled into:
//!
//! - an anchored regex with one named group per placeholder
//!   (`^/users/(?P<id>\d+)/posts/(?P<slug>[^/]+)$`)
//! - a [`ReverseTemplate`] (`/users/{id}/posts/{slug}`) used to build
//!   concrete paths back from variable values
//!
//! Literal text is regex-escaped verbatim. A placeholder without an
//! expression matches one or more characters other than `/`.

use super::error::{ReverseError, TemplateError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

/// Named group holding the remainder of the path for delegating routes
pub const DELEGATE_GROUP: &str = "__path_info__";

/// Expression used for placeholders that do not carry their own
pub const DEFAULT_VARIABLE_PATTERN: &str = "[^/]+";

/// Expression used for [`DelegatePath::Anything`]
pub const ANYTHING_PATTERN: &str = "/(?s:.*)";

#[allow(clippy::expect_used)]
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)(?::([^}]+))?\}").expect("valid placeholder regex")
});

/// How a delegating route captures the rest of the path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelegatePath {
    /// `/` followed by anything
    Anything,
    /// A caller-supplied expression, used verbatim
    Pattern(String),
}

impl DelegatePath {
    fn expression(&self) -> &str {
        match self {
            DelegatePath::Anything => ANYTHING_PATTERN,
            DelegatePath::Pattern(expr) => expr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// Template text with placeholders reduced to `{name}`, for URL building.
///
/// Placeholder constraints are dropped; values are substituted verbatim and
/// never checked against the original expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseTemplate {
    segments: Vec<Segment>,
}

impl ReverseTemplate {
    /// Placeholder names in template order
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Variable(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute `vars` into the placeholders
    pub fn format(&self, vars: &HashMap<String, String>) -> Result<String, ReverseError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(name) => match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(ReverseError::MissingVariable {
                            template: self.to_string(),
                            name: name.clone(),
                        })
                    }
                },
            }
        }
        Ok(out)
    }
}

impl fmt::Display for ReverseTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Variable(name) => write!(f, "{{{}}}", name)?,
            }
        }
        Ok(())
    }
}

/// Output of [`compile_template`]
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    /// Anchored match pattern
    pub pattern: Regex,
    /// Reverse template; `None` when there was no template
    pub reverse: Option<ReverseTemplate>,
    /// Placeholder names in template order (excludes the delegate group)
    pub variables: Vec<String>,
    /// Whether the pattern ends with the delegate group
    pub delegates: bool,
}

/// Compile `template` into a match pattern and reverse template.
///
/// With `delegate` set, a trailing group named [`DELEGATE_GROUP`] captures
/// the remainder of the path. A `None` template matches every path, or
/// only the delegate capture when delegating.
pub fn compile_template(
    template: Option<&str>,
    delegate: Option<&DelegatePath>,
) -> Result<CompiledTemplate, TemplateError> {
    let source = template.unwrap_or("");
    let mut pattern = String::with_capacity(source.len() + 16);
    let mut segments = Vec::new();
    let mut variables: Vec<String> = Vec::new();
    pattern.push('^');

    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_literal(source, last, &source[last..whole.start()], &mut pattern, &mut segments)?;

        let name = name.as_str();
        if variables.iter().any(|v| v == name) || name == DELEGATE_GROUP {
            return Err(TemplateError::DuplicateVariable {
                template: source.to_string(),
                name: name.to_string(),
            });
        }
        let expr = caps
            .get(2)
            .map(|m| m.as_str())
            .unwrap_or(DEFAULT_VARIABLE_PATTERN);
        pattern.push_str("(?P<");
        pattern.push_str(name);
        pattern.push('>');
        pattern.push_str(expr);
        pattern.push(')');

        segments.push(Segment::Variable(name.to_string()));
        variables.push(name.to_string());
        last = whole.end();
    }
    push_literal(source, last, &source[last..], &mut pattern, &mut segments)?;

    match (template, delegate) {
        (_, Some(delegate)) => {
            pattern.push_str("(?P<");
            pattern.push_str(DELEGATE_GROUP);
            pattern.push('>');
            pattern.push_str(delegate.expression());
            pattern.push(')');
        }
        (None, None) => pattern.push_str("(?s:.*)"),
        (Some(_), None) => {}
    }
    pattern.push('$');

    let regex = Regex::new(&pattern).map_err(|e| TemplateError::InvalidPattern {
        template: source.to_string(),
        message: e.to_string(),
    })?;

    Ok(CompiledTemplate {
        pattern: regex,
        reverse: template.map(|_| ReverseTemplate { segments }),
        variables,
        delegates: delegate.is_some(),
    })
}

fn push_literal(
    template: &str,
    offset: usize,
    literal: &str,
    pattern: &mut String,
    segments: &mut Vec<Segment>,
) -> Result<(), TemplateError> {
    if literal.is_empty() {
        return Ok(());
    }
    if let Some(pos) = literal.find('{') {
        return Err(TemplateError::InvalidPlaceholder {
            template: template.to_string(),
            position: offset + pos,
        });
    }
    pattern.push_str(&regex::escape(literal));
    segments.push(Segment::Literal(literal.to_string()));
    Ok(())
}
