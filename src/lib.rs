//! # buildable
//!
//! Fluent builders for plain structs, generated at compile time.
//!
//! `#[derive(Builder)]` emits a companion `{StructName}Builder` with one
//! chaining setter per field and a `build()` method that checks every
//! required field was set. This crate holds the small contract the
//! generated code implements: the [`Builder`] and [`Buildable`] traits and
//! the [`BuilderError`] returned when a required value is missing.
//!
//! ## Example
//!
//! ```rust
//! use buildable::{Buildable, Builder, BuilderError};
//!
//! #[derive(Builder, Debug, PartialEq)]
//! pub struct Comment {
//!     pub content: String,
//!     #[builder(default = false)]
//!     pub is_top_answer: bool,
//!     #[builder(default = "ThumbsUp".to_string())]
//!     pub upvote_emoji: String,
//! }
//!
//! let comment = Comment::build(|b| b.content("hi".to_string())).unwrap();
//! assert_eq!(comment.upvote_emoji, "ThumbsUp");
//! assert!(!comment.is_top_answer);
//!
//! let missing = Comment::build(|b| b);
//! assert_eq!(
//!     missing,
//!     Err(BuilderError::missing_value_for("content", "Comment"))
//! );
//! ```
//!
//! ## Field attributes
//!
//! - `#[builder(default = expr)]`: the field may be omitted; `expr` is used.
//! - `#[builder(default)]`: the field starts out as `Default::default()`.
//! - `#[builder(ignore)]`: no setter; the field is filled from its default.
//! - `#[builder(escaping)]`: the setter requires a `'static` value, boxing
//!   it when the field is a boxed trait object.
//!
//! Fields whose type derives `Builder` as well get a second setter,
//! `{field}_builder`, that configures the nested builder in place. Wrap the
//! declarations in [`builders`] (or list the types with
//! `#[builder(generable(..))]`) so the derive knows which types qualify.

mod error;

pub use buildable_derive::{builders, Builder};
pub use error::{BuildResult, BuilderError};

/// A builder generated for the aggregate `Self::Buildable`.
pub trait Builder: Default {
    type Buildable;

    /// Validates the collected values and constructs the aggregate.
    fn build(self) -> BuildResult<Self::Buildable>;
}

/// An aggregate with a generated builder.
pub trait Buildable: Sized {
    type Builder: Builder<Buildable = Self>;

    fn builder() -> Self::Builder {
        Self::Builder::default()
    }

    /// Runs `configure` against a fresh builder and builds the result.
    fn build<F>(configure: F) -> BuildResult<Self>
    where
        F: FnOnce(Self::Builder) -> Self::Builder,
    {
        configure(Self::Builder::default()).build()
    }
}

/// Configuration closure accepted by [`Buildable::build`].
pub type BuildClosure<T> = dyn FnOnce(<T as Buildable>::Builder) -> <T as Buildable>::Builder;

pub mod prelude {
    pub use crate::{BuildResult, Buildable, Builder, BuilderError};
}
