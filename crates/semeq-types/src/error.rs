use thiserror::Error;

/// Errors produced when constructing or retagging typed values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("value of kind '{kind}' does not belong to type '{type_id}'")]
    KindMismatch { type_id: String, kind: &'static str },

    #[error("cannot retag a '{from}' value as '{to}': type families differ")]
    FamilyMismatch { from: String, to: String },

    #[error("type name must not be empty")]
    EmptyTypeName,
}
