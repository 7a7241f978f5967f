//! The declaration model the engine works on.
//!
//! A [`Declaration`] is lowered once from the derive input and never
//! mutated afterwards. The model is a little wider than Rust field syntax:
//! a field statement may hold several bindings, an accessor kind and a
//! constant flag. The `syn` lowering always produces one stored, mutable
//! binding per named field.

use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, Generics, Ident, Type, Visibility};

use crate::diagnostic::Diagnostic;

/// Helper attribute carrying every builder annotation.
pub const ATTRIBUTE: &str = "builder";

/// Attributes of bitfield-style macros whose storage is not a set of fields.
const BITSET_ATTRIBUTES: &[&str] = &["bitfield", "bitsize", "bitflags"];

/// Zero-sized field types that belong to the type rather than the value.
const MARKER_TYPES: &[&str] = &["PhantomData", "PhantomPinned"];

#[derive(Debug, Clone, Copy)]
pub enum DeclarationShape {
    Named,
    Tuple,
    Unit,
    Enum { keyword: Span },
    Union { keyword: Span },
}

pub struct Declaration {
    pub ident: Ident,
    pub vis: Visibility,
    pub generics: Generics,
    pub shape: DeclarationShape,
    /// Span of a bitfield attribute, if one is present.
    pub bitset: Option<Span>,
    /// Types listed in `#[builder(generable(..))]`.
    pub generable: Vec<Ident>,
    pub errors: Vec<Diagnostic>,
    pub statements: Vec<FieldStatement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationName {
    Default,
    Ignore,
    Escaping,
}

impl AnnotationName {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "default" => Some(AnnotationName::Default),
            "ignore" => Some(AnnotationName::Ignore),
            "escaping" => Some(AnnotationName::Escaping),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Annotation {
    pub name: AnnotationName,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    /// Plain or observed storage.
    Stored,
    /// A read-only computed value.
    Getter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Instance,
    /// Marker fields such as `PhantomData<T>`.
    Type,
}

#[derive(Clone)]
pub struct FieldStatement {
    pub annotations: Vec<Annotation>,
    pub bindings: Vec<Binding>,
    pub scope: Scope,
    pub is_constant: bool,
    pub accessor: Accessor,
    pub errors: Vec<Diagnostic>,
    pub span: Span,
}

#[derive(Clone)]
pub struct Binding {
    pub name: Option<Ident>,
    pub ty: Option<Type>,
    pub init: Option<Expr>,
    pub span: Span,
}

impl FieldStatement {
    pub fn annotation(&self, name: AnnotationName) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    pub fn has_annotation(&self, name: AnnotationName) -> bool {
        self.annotation(name).is_some()
    }

    fn from_field(field: &syn::Field) -> Self {
        let mut annotations = Vec::new();
        let mut errors = Vec::new();
        let mut init = None;

        for attr in builder_attributes(&field.attrs) {
            let parsed = attr.parse_nested_meta(|meta| {
                let key = meta
                    .path
                    .get_ident()
                    .map(Ident::to_string)
                    .unwrap_or_default();
                match AnnotationName::from_key(&key) {
                    Some(AnnotationName::Default) if !meta.input.peek(syn::Token![=]) => {
                        init = Some(syn::parse_quote!(::core::default::Default::default()));
                    }
                    Some(name) => {
                        let value = if name == AnnotationName::Default {
                            Some(meta.value()?.parse::<Expr>()?)
                        } else {
                            None
                        };
                        annotations.push(Annotation {
                            name,
                            value,
                            span: meta.path.span(),
                        });
                    }
                    None => {
                        return Err(meta.error(
                            "unsupported builder attribute, expected `default`, `ignore` or `escaping`",
                        ))
                    }
                }
                Ok(())
            });
            if let Err(error) = parsed {
                errors.push(Diagnostic::from(error));
            }
        }

        let scope = if is_marker_type(&field.ty) {
            Scope::Type
        } else {
            Scope::Instance
        };

        FieldStatement {
            annotations,
            bindings: vec![Binding {
                name: field.ident.clone(),
                ty: Some(field.ty.clone()),
                init,
                span: field.span(),
            }],
            scope,
            is_constant: false,
            accessor: Accessor::Stored,
            errors,
            span: field.span(),
        }
    }
}

impl Declaration {
    pub fn from_derive_input(input: &DeriveInput) -> Self {
        let shape = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(_) => DeclarationShape::Named,
                Fields::Unnamed(_) => DeclarationShape::Tuple,
                Fields::Unit => DeclarationShape::Unit,
            },
            Data::Enum(data) => DeclarationShape::Enum {
                keyword: data.enum_token.span,
            },
            Data::Union(data) => DeclarationShape::Union {
                keyword: data.union_token.span,
            },
        };

        let bitset = input
            .attrs
            .iter()
            .filter_map(|attr| attr.path().segments.last())
            .find(|segment| BITSET_ATTRIBUTES.iter().any(|name| segment.ident == name))
            .map(|segment| segment.ident.span());

        let mut generable = Vec::new();
        let mut errors = Vec::new();
        for attr in builder_attributes(&input.attrs) {
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("generable") {
                    meta.parse_nested_meta(|inner| {
                        match inner.path.get_ident() {
                            Some(ident) => generable.push(ident.clone()),
                            None => return Err(inner.error("expected a type name")),
                        }
                        Ok(())
                    })
                } else {
                    Err(meta.error("unsupported builder attribute, expected `generable(..)`"))
                }
            });
            if let Err(error) = parsed {
                errors.push(Diagnostic::from(error));
            }
        }

        let statements = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(fields) => fields.named.iter().map(FieldStatement::from_field).collect(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        Declaration {
            ident: input.ident.clone(),
            vis: input.vis.clone(),
            generics: input.generics.clone(),
            shape,
            bitset,
            generable,
            errors,
            statements,
        }
    }
}

fn builder_attributes(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|attr| attr.path().is_ident(ATTRIBUTE))
}

fn is_marker_type(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path
            .path
            .segments
            .last()
            .is_some_and(|s| MARKER_TYPES.iter().any(|name| s.ident == name)),
        _ => false,
    }
}
