pub mod compiler;
pub mod error;
pub mod executor;
pub mod sanitizer;
