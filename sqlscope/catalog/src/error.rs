use miette::Diagnostic;
use sqlscope_common::error::NotImplemented;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("invalid configuration for dataset type `{kind}`: {reason}")]
    InvalidConfig { kind: String, reason: String },

    #[error("dataset not found: {0}")]
    DatasetNotFound(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    NotImplemented(#[from] NotImplemented),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
