//! `warden-core`: API object foundation building blocks.
//!
//! This crate contains **pure** primitives shared by every resource kind
//! (metadata, identifiers, selectors, field validation). No storage concerns.

pub mod error;
pub mod id;
pub mod meta;
pub mod object;
pub mod selector;
pub mod validation;

pub use error::{ErrorList, FieldError, FieldErrorKind, FieldPath};
pub use id::Uid;
pub use meta::{ObjectKey, ObjectMeta};
pub use object::Object;
pub use selector::{FieldSelector, LabelSelector, SelectionPredicate, SelectorParseError};
