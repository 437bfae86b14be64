//! Structured GraphQL documents and validated repository identifiers.

mod builder;
mod names;

pub use builder::{Arg, Document, DocumentError, Field, Fragment, Selection, is_valid_name, quote};
pub use names::{RepoName, RepoNameError};
