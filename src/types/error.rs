use crate::types::codes::Category;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No {0} codes selected")]
    EmptySelector(Category),

    #[error("Invalid {category} code '{code}'")]
    InvalidCode { category: Category, code: String },

    #[error("Invalid file name prefix '{0}'")]
    InvalidPrefix(String),

    #[error("Output path '{0}' exists but is not a directory")]
    OutputNotDirectory(PathBuf),

    #[error("Failed to build file name pattern")]
    Pattern(#[source] regex::Error),
}

#[derive(Debug, Error)]
#[error("Unknown {category} code '{value}'")]
pub struct ParseCodeError {
    pub category: Category,
    pub value: String,
}
