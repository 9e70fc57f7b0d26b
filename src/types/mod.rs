pub mod codes;
pub mod error;
pub mod options;
pub mod selector;
