pub mod error;
pub mod occurrence;
pub mod template;
