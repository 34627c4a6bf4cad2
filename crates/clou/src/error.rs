//! error taxonomy
//!
//! Every failure aborts the whole substitution/render. There are no partial results and no retries.
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unbalanced expression: too many {side} in '{input}'")]
    UnbalancedExpression { side: Brace, input: String },

    #[error("expression '{expression}' does not evaluate (expected `ref <path>` or `file <path>`)")]
    InvalidExpression { expression: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("path '{path}' does not resolve: nothing found at '{segment}'")]
    NotFound { path: String, segment: String },

    #[error("type mismatch at '{path}': {message}")]
    TypeMismatch { path: String, message: String },

    #[error("unable to read '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("spec '{spec}' redefines '{key}' in {section}")]
    CompositionConflict {
        spec: String,
        section: String,
        key: String,
    },

    #[error("template '{name}' not found")]
    TemplateNotFound { name: String },

    #[error("unable to parse {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("invalid substitution '{name}': {message}")]
    InvalidSubstitution { name: String, message: String },

    #[error("document nesting exceeds the limit of {limit} levels")]
    DepthExceeded { limit: usize },

    #[error("invalid config: {0}")]
    Config(String),

    #[error("at '{location}'")]
    At {
        location: String,
        #[source]
        source: Box<Error>,
    },

    #[error("in spec '{spec}'")]
    Spec {
        spec: String,
        #[source]
        source: Box<Error>,
    },

    #[error("unable to serialize yaml")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unable to serialize json")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Attach the document location the error was raised at
    ///
    /// An empty location (the document root) leaves the error as is.
    pub fn at(self, location: &[crate::path::Segment]) -> Self {
        if location.is_empty() {
            return self;
        }

        Error::At {
            location: crate::path::Path::from(location.to_vec()).to_string(),
            source: Box::new(self),
        }
    }

    pub fn in_spec(self, spec: &str) -> Self {
        Error::Spec {
            spec: spec.to_string(),
            source: Box::new(self),
        }
    }

    /// The error without any location/spec context
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::At { source, .. } | Error::Spec { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Side of an unbalanced placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Brace {
    Opening,
    Closing,
}

impl std::fmt::Display for Brace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Brace::Opening => f.write_str("opening braces '{{'"),
            Brace::Closing => f.write_str("closing braces '}}'"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::Segment;

    #[test]
    fn location_wraps_and_unwraps() {
        let error = Error::InvalidExpression {
            expression: "nope".into(),
        }
        .at(&[Segment::key("vars"), Segment::Index(2)]);

        assert_eq!(error.to_string(), "at 'vars[2]'");
        assert!(matches!(
            error.root_cause(),
            Error::InvalidExpression { expression } if expression == "nope"
        ));
    }

    #[test]
    fn root_location_is_not_wrapped() {
        let error = Error::DepthExceeded { limit: 1 }.at(&[]);
        assert!(matches!(error, Error::DepthExceeded { limit: 1 }));
    }

    #[test]
    fn unbalanced_message_names_the_side() {
        let error = Error::UnbalancedExpression {
            side: Brace::Closing,
            input: "a }}".into(),
        };
        assert_eq!(
            error.to_string(),
            "unbalanced expression: too many closing braces '}}' in 'a }}'"
        );
    }
}
