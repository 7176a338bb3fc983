use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("conflicting definitions of class `{name}`: {reason}")]
    ClassIdentityConflict { name: String, reason: String },
}
