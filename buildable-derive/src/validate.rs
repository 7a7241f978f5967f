//! Parsing and validation logic for the Builder derive macro.
//!
//! The aggregate check decides whether a declaration may get a builder at
//! all; the field check runs once per field statement and reports every
//! problem it finds rather than stopping at the first.

use proc_macro2::Span;

use crate::classify::{classify, ClassifiedBinding};
use crate::decl::{AnnotationName, Declaration, DeclarationShape, FieldStatement};
use crate::diagnostic::{Diagnostic, Diagnostics, FixIt, Message};

/// A declaration confirmed to be a struct with named fields.
#[derive(Clone, Copy)]
pub struct Aggregate<'a> {
    decl: &'a Declaration,
}

impl<'a> Aggregate<'a> {
    pub fn declaration(&self) -> &'a Declaration {
        self.decl
    }

    pub fn statements(&self) -> &'a [FieldStatement] {
        &self.decl.statements
    }
}

/// Validates that the input is a plain struct with named fields.
///
/// Enums and unions are rejected with a suggestion to declare a struct
/// instead; tuple, unit and bitfield structs are rejected without one.
pub fn validate_aggregate(decl: &Declaration) -> Result<Aggregate<'_>, Diagnostics> {
    let span = decl.ident.span();
    let diagnostic = match decl.shape {
        DeclarationShape::Named => match decl.bitset {
            Some(attr) => Diagnostic::new(Message::Bitset, attr),
            None => return Ok(Aggregate { decl }),
        },
        DeclarationShape::Tuple => Diagnostic::new(Message::TupleStruct, span),
        DeclarationShape::Unit => Diagnostic::new(Message::UnitStruct, span),
        DeclarationShape::Enum { keyword } => {
            convertible(Message::NotAStruct("enums"), span, keyword, "enum")
        }
        DeclarationShape::Union { keyword } => {
            convertible(Message::NotAStruct("unions"), span, keyword, "union")
        }
    };
    Err(diagnostic.into())
}

fn convertible(message: Message, span: Span, keyword: Span, replace: &'static str) -> Diagnostic {
    Diagnostic::new(message, span).with_fix(FixIt {
        span: keyword,
        replace,
        with: "struct",
    })
}

/// Outcome of checking one field statement.
pub struct FieldVerdict {
    pub has_error: bool,
    /// Marker fields are valid but never become properties.
    pub excluded: bool,
    pub bindings: Vec<ClassifiedBinding>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn validate_field(statement: &FieldStatement) -> FieldVerdict {
    let bindings: Vec<ClassifiedBinding> = statement
        .bindings
        .iter()
        .map(|binding| classify(binding, statement))
        .collect();
    let mut diagnostics = statement.errors.clone();

    for binding in bindings.iter().filter(|b| !b.is_stored) {
        diagnostics.push(Diagnostic::new(Message::NotStored, binding.span));
    }

    let is_static = bindings.iter().any(|b| b.is_static);
    if is_static {
        match statement.annotations.first() {
            Some(annotation) => {
                diagnostics.push(Diagnostic::new(Message::AnnotatedMarker, annotation.span));
            }
            None => {
                return FieldVerdict {
                    has_error: !diagnostics.is_empty(),
                    excluded: true,
                    bindings,
                    diagnostics,
                };
            }
        }
    }

    let default = statement.annotation(AnnotationName::Default);
    let has_default = default.is_some();
    for binding in &bindings {
        if let (Some(default), true) = (default, binding.has_initializer) {
            diagnostics.push(Diagnostic::new(Message::DefaultAndInitializer, default.span));
        }
        if binding.ty.is_none() {
            diagnostics.push(Diagnostic::new(Message::MissingType, binding.span));
        }
        if binding.name.is_none() {
            diagnostics.push(Diagnostic::new(Message::MissingName, binding.span));
        }
    }

    if has_default && statement.bindings.len() > 1 {
        let mut declared = statement.bindings.iter().filter_map(|b| b.ty.as_ref());
        if let Some(first) = declared.next() {
            if declared.any(|ty| ty != first) {
                diagnostics.push(Diagnostic::new(
                    Message::InconsistentDefaultType,
                    statement.span,
                ));
            }
        }
    }

    FieldVerdict {
        has_error: !diagnostics.is_empty(),
        excluded: is_static,
        bindings,
        diagnostics,
    }
}
