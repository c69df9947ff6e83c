use std::fmt;

/// Malformed path template, reported when the route is registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A `{` that does not open a well-formed `{name}` / `{name:expr}` placeholder
    InvalidPlaceholder {
        /// The offending template
        template: String,
        /// Byte offset of the `{`
        position: usize,
    },
    /// The same placeholder name appears twice
    DuplicateVariable {
        /// The offending template
        template: String,
        /// The repeated name
        name: String,
    },
    /// The assembled pattern (usually a placeholder expression) is not a valid regex
    InvalidPattern {
        /// The offending template, or the delegate expression
        template: String,
        /// Message from the regex compiler
        message: String,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::InvalidPlaceholder { template, position } => write!(
                f,
                "Invalid placeholder in template '{}' at byte {}: expected {{name}} or {{name:expr}}",
                template, position
            ),
            TemplateError::DuplicateVariable { template, name } => write!(
                f,
                "Variable '{}' appears more than once in template '{}'",
                name, template
            ),
            TemplateError::InvalidPattern { template, message } => {
                write!(f, "Template '{}' does not compile: {}", template, message)
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Route registration failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The path template could not be compiled
    Template(TemplateError),
    /// A route option is not usable (e.g. an unknown HTTP method)
    InvalidOption {
        /// What was wrong
        message: String,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Template(e) => write!(f, "{}", e),
            RouteError::InvalidOption { message } => write!(f, "Invalid route option: {}", message),
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::Template(e) => Some(e),
            RouteError::InvalidOption { .. } => None,
        }
    }
}

impl From<TemplateError> for RouteError {
    fn from(e: TemplateError) -> Self {
        RouteError::Template(e)
    }
}

/// URL reversal failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReverseError {
    /// No route matches the given identifier
    NotFound {
        /// Description of what was looked up
        target: String,
    },
    /// The route was registered without a path template
    NotReversible {
        /// View name of the route
        route: String,
    },
    /// A placeholder in the template has no supplied value
    MissingVariable {
        /// The reverse template, e.g. `/path/{element}`
        template: String,
        /// The placeholder without a value
        name: String,
    },
}

impl fmt::Display for ReverseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReverseError::NotFound { target } => write!(f, "No route found for {}", target),
            ReverseError::NotReversible { route } => {
                write!(f, "Route '{}' has no path template and cannot be reversed", route)
            }
            ReverseError::MissingVariable { template, name } => write!(
                f,
                "No value supplied for variable '{}' of template '{}'",
                name, template
            ),
        }
    }
}

impl std::error::Error for ReverseError {}
