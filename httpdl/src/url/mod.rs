//! URL composition and splitting.

pub mod parser;

pub use parser::{
    normalize_path, split_authority, UrlParts, DEFAULT_SCHEME_PREFIX, SCHEME_SEPARATOR,
};
