//! Diagnostics reported when an aggregate cannot get a builder.
//!
//! Every problem found while expanding one aggregate is collected into
//! [`Diagnostics`] and rendered together, so a caller sees all field-level
//! errors at once instead of fixing them one compile at a time.

use proc_macro2::{Span, TokenStream};
use thiserror::Error;

/// The two diagnostic classes the engine reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedDeclarationKind,
    InvalidProperty,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Message {
    #[error("`Builder` can only be derived for structs with named fields, not {0}")]
    NotAStruct(&'static str),

    #[error("`Builder` cannot be derived for tuple structs; give the fields names")]
    TupleStruct,

    #[error("`Builder` cannot be derived for unit structs")]
    UnitStruct,

    #[error("`Builder` cannot be derived for bitfield structs; their storage is not a set of named values")]
    Bitset,

    #[error("only stored fields can be set through a builder")]
    NotStored,

    #[error("marker fields cannot be annotated with `default`, `ignore` or `escaping`")]
    AnnotatedMarker,

    #[error("a field cannot have both `default = ...` and an initial value; choose one")]
    DefaultAndInitializer,

    #[error("couldn't infer the property type")]
    MissingType,

    #[error("couldn't parse the property name")]
    MissingName,

    #[error("a shared `default = ...` requires every binding to have the same type")]
    InconsistentDefaultType,

    #[error("the setter `{0}` clashes with another method of the builder; rename the field")]
    SetterClash(String),

    #[error("{0}")]
    Attribute(String),
}

impl Message {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Message::NotAStruct(_)
            | Message::TupleStruct
            | Message::UnitStruct
            | Message::Bitset
            | Message::AnnotatedMarker => ErrorKind::UnsupportedDeclarationKind,
            _ => ErrorKind::InvalidProperty,
        }
    }
}

/// A single-token rewrite offered alongside a diagnostic.
#[derive(Debug, Clone)]
pub struct FixIt {
    pub span: Span,
    pub replace: &'static str,
    pub with: &'static str,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: Message,
    pub span: Span,
    pub fix: Option<FixIt>,
}

impl Diagnostic {
    pub fn new(message: Message, span: Span) -> Self {
        Diagnostic {
            message,
            span,
            fix: None,
        }
    }

    pub fn with_fix(mut self, fix: FixIt) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.message.kind()
    }

    fn to_syn_error(&self) -> syn::Error {
        let mut error = syn::Error::new(self.span, &self.message);
        if let Some(fix) = &self.fix {
            error.combine(syn::Error::new(
                fix.span,
                format!("help: replace `{}` with `{}`", fix.replace, fix.with),
            ));
        }
        error
    }
}

impl From<syn::Error> for Diagnostic {
    fn from(error: syn::Error) -> Self {
        Diagnostic::new(Message::Attribute(error.to_string()), error.span())
    }
}

/// The accumulated diagnostics of one aggregate.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics(Vec::new())
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.0.extend(other);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// `Ok(())` when nothing was reported.
    pub fn finish(self) -> Result<(), Diagnostics> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn to_compile_error(&self) -> TokenStream {
        let mut errors = self.0.iter().map(Diagnostic::to_syn_error);
        match errors.next() {
            Some(mut first) => {
                for error in errors {
                    first.combine(error);
                }
                first.to_compile_error()
            }
            None => TokenStream::new(),
        }
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Diagnostics(vec![diagnostic])
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
