use thiserror::Error;

/// A watched object could not be interpreted as the resource kind its
/// collection holds.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{name:?} is a {found}, not a {expected}")]
pub struct TypeMismatch {
    pub expected: &'static str,
    pub found: String,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum JoinError {
    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),

    #[error("failed to find {relation} related to {owner}")]
    RelationLookup {
        relation: &'static str,
        owner: String,
        #[source]
        source: TypeMismatch,
    },
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Namespace {0} not found/available")]
    NotAvailable(String),

    #[error("failed to join namespace {namespace}")]
    Join {
        namespace: String,
        #[source]
        source: JoinError,
    },
}

// === impl JoinError ===

impl JoinError {
    pub fn relation(relation: &'static str, owner: impl Into<String>, source: TypeMismatch) -> Self {
        Self::RelationLookup {
            relation,
            owner: owner.into(),
            source,
        }
    }

    /// Returns the type mismatch at the root of this error.
    pub fn type_mismatch(&self) -> &TypeMismatch {
        match self {
            Self::TypeMismatch(e) => e,
            Self::RelationLookup { source, .. } => source,
        }
    }
}
