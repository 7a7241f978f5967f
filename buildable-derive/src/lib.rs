//! # buildable-derive
//!
//! Procedural macros behind the `buildable` crate. Use them through
//! `buildable`, which also provides the traits and error type the
//! generated code refers to.
//!
//! ## Example
//!
//! ```rust,ignore
//! use buildable::{Buildable, Builder};
//!
//! #[derive(Builder)]
//! pub struct User {
//!     pub username: String,
//!     pub email: String,
//!     pub age: Option<u32>,
//! }
//!
//! let user = User::builder()
//!     .username("alice".to_string())
//!     .email("alice@example.com".to_string())
//!     .age(30)
//!     .build()
//!     .unwrap();
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod classify;
mod decl;
mod decorate;
mod diagnostic;
mod generate;
mod model;
mod registry;
mod validate;

/// Derives a Builder pattern for the annotated struct.
///
/// This macro generates:
/// - A builder struct named `{StructName}Builder` implementing `Default`
/// - `builder()` and `checked_build(configure)` on the original struct
/// - Setter methods for each field that enable method chaining
/// - A `build()` method that validates required fields and constructs the original struct
/// - `buildable::Builder` and `buildable::Buildable` implementations
///
/// ## Field Handling
///
/// - **Required fields**: must be set before calling `build()`
/// - **Optional fields**: `Option<T>` fields can be omitted (default to `None`)
/// - **Defaults**: `#[builder(default = expr)]` or `#[builder(default)]`
/// - **Ignored fields**: `#[builder(ignore)]` gets no setter
/// - **Closures**: `Box<dyn Fn(..)>` fields accept any `'static` closure
/// - **Nested builders**: fields whose type is listed in
///   `#[builder(generable(..))]` also get a `{field}_builder` setter
///
/// ## Example
///
/// ```rust,ignore
/// use buildable::Builder;
///
/// #[derive(Builder)]
/// pub struct Config {
///     pub host: String,
///     pub port: u16,
///     #[builder(default = 30)]
///     pub timeout: u64,
///     pub features: Option<Vec<String>>,
/// }
///
/// let config = Config::builder()
///     .host("localhost".to_string())
///     .port(8080)
///     .build()
///     .expect("Failed to build config");
/// ```
#[proc_macro_derive(Builder, attributes(builder))]
pub fn derive_builder(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate::impl_builder(&input) {
        Ok(tokens) => tokens.into(),
        Err(diagnostics) => diagnostics.to_compile_error().into(),
    }
}

/// Registers every `#[derive(Builder)]` struct of an inline module before
/// any of them is expanded, so fields can use nested builders of types
/// declared further down.
///
/// ```rust,ignore
/// #[buildable::builders]
/// mod models {
///     use buildable::Builder;
///
///     #[derive(Builder)]
///     pub struct Person {
///         pub address: Address,
///     }
///
///     #[derive(Builder)]
///     pub struct Address {
///         pub street: String,
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn builders(args: TokenStream, input: TokenStream) -> TokenStream {
    match registry::impl_builders(args.into(), input.into()) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
