use thiserror::Error;

use crate::{attr::ParseError, spec::CollectorKind};

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned while turning a metric record into registered collectors.
#[derive(Debug, Error)]
pub enum Error {
    /// The record was not handed over as a mutable reference to a struct.
    #[error("struct pointer required, got `{type_name}`")]
    NotAStructPointer { type_name: &'static str },

    /// The annotation text of a field does not follow the attribute grammar.
    #[error("invalid annotation on field `{field}`: {source}")]
    AnnotationParse {
        field: String,
        #[source]
        source: ParseError,
    },

    /// An attribute value has the wrong shape for its attribute name.
    #[error("attribute malformed: `{attribute}` on field `{field}` {reason}")]
    AttributeMalformed { field: String, attribute: String, reason: &'static str },

    /// The attribute name is not allowed for the collector kind of the field.
    #[error("unsupported attribute `{attribute}` for {kind} field `{field}`")]
    UnsupportedAttribute { field: String, attribute: String, kind: CollectorKind },

    /// The registry already holds a collector exposed under this name.
    #[error("a collector named `{name}` is already registered")]
    RegistrationConflict { name: String },

    /// Any other failure reported by the collector library.
    #[error(transparent)]
    Collector(#[from] prometheus::Error),

    /// An error wrapped with the pipeline stage or field it happened in.
    #[error("{context}: {source}")]
    Context { context: String, source: Box<Error> },
}

impl Error {
    /// Wrap the error with a stage or field description.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context { context: context.into(), source: Box::new(self) }
    }

    /// Returns the innermost error, looking through any [`Error::Context`] layers.
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Self::Context { source, .. } = current {
            current = source.as_ref();
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_root_cause() {
        let err = Error::RegistrationConflict { name: "requests".to_string() }
            .context("collector register failed for requests")
            .context("outer");

        assert!(matches!(err.root_cause(), Error::RegistrationConflict { name } if name == "requests"));
        assert_eq!(
            err.to_string(),
            "outer: collector register failed for requests: a collector named `requests` is already registered"
        );
    }

    #[test]
    fn root_cause_of_plain_error_is_itself() {
        let err = Error::NotAStructPointer { type_name: "Stat" };
        assert!(matches!(err.root_cause(), Error::NotAStructPointer { type_name: "Stat" }));
    }
}
