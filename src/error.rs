//! Errors raised while parsing and compiling record and transform documents.

use thiserror::Error;

/// Errors that abort a compilation run.
///
/// Every variant is an input validation failure. None of them are retried and
/// a run that hits one emits no descriptors.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A domain in a document has no resolved zone
    #[error("not configured to modify records on domain '{domain}'")]
    UnknownZone { domain: String },

    /// A server spec references a name missing from the registry
    #[error("server '{server}' does not exist (referenced by '{record}')")]
    UnknownServer { server: String, record: String },

    /// A spec's `kind` is missing or not one of proxy, raw, redirect, server
    #[error("unknown record kind {kind:?} for '{record}'")]
    UnknownRecordKind { record: String, kind: Option<String> },

    /// A spec with a known kind has missing or malformed fields
    #[error("invalid record spec for '{record}': {source}")]
    InvalidSpec {
        record: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Two specs compile to the same resource identifier
    #[error("more than one spec compiles to resource '{id}'")]
    DuplicateResource { id: String },

    /// The document itself is not valid YAML of the expected shape
    #[error("failed to parse document: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = CompileError::UnknownZone {
            domain: "example.com".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "not configured to modify records on domain 'example.com'"
        );

        let err = CompileError::UnknownServer {
            server: "missing".to_string(),
            record: "www.example.com".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("'missing'"));
        assert!(message.contains("'www.example.com'"));
    }
}
