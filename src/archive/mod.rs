pub mod decoder;
pub mod entry;
pub mod error;
pub mod matcher;
pub mod pipeline;
pub mod writer;
pub mod zip_stream;
