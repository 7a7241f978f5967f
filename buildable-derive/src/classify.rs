//! Field analysis and type introspection.
//!
//! Classification never fails: missing names or types surface as `None`
//! and are reported by the member validator.

use proc_macro2::Span;
use syn::punctuated::Punctuated;
use syn::{Expr, GenericArgument, Ident, Path, PathArguments, Type, TypeParamBound};

use crate::decl::{Accessor, AnnotationName, Binding, FieldStatement, Scope};

const CLOSURE_TRAITS: &[&str] = &["Fn", "FnMut", "FnOnce"];
const SMART_POINTERS: &[&str] = &["Box", "Rc", "Arc"];

/// Everything the engine needs to know about one binding.
#[derive(Clone)]
pub struct ClassifiedBinding {
    pub name: Option<Ident>,
    /// The declared type with one `Option` layer and any grouping removed.
    pub ty: Option<Type>,
    pub is_stored: bool,
    pub is_optional: bool,
    pub callable: Option<Callable>,
    pub has_initializer: bool,
    pub default: Option<Expr>,
    pub is_ignored: bool,
    pub is_escaping: bool,
    pub is_static: bool,
    pub is_constant: bool,
    pub span: Span,
}

impl ClassifiedBinding {
    pub fn is_closure(&self) -> bool {
        self.callable.is_some()
    }
}

/// A function-shaped field type.
#[derive(Clone)]
pub enum Callable {
    /// `fn(A) -> B`
    FnPointer,
    /// `Box<dyn Fn(A) -> B>` and the `Rc`/`Arc` equivalents.
    Pointer,
}

/// A smart pointer to a trait object, e.g. `Box<dyn Handler + Send>`.
#[derive(Clone)]
pub struct DynPointer {
    /// The pointer path without generic arguments, e.g. `Box`.
    pub pointer: Path,
    pub bounds: Punctuated<TypeParamBound, syn::Token![+]>,
}

impl DynPointer {
    pub fn is_closure(&self) -> bool {
        self.bounds.iter().any(|bound| match bound {
            TypeParamBound::Trait(trait_bound) => trait_bound
                .path
                .segments
                .last()
                .is_some_and(|s| CLOSURE_TRAITS.iter().any(|name| s.ident == name)),
            _ => false,
        })
    }

    pub fn has_lifetime_bound(&self) -> bool {
        self.bounds
            .iter()
            .any(|bound| matches!(bound, TypeParamBound::Lifetime(_)))
    }
}

pub fn classify(binding: &Binding, statement: &FieldStatement) -> ClassifiedBinding {
    let (is_optional, ty) = match &binding.ty {
        Some(declared) => {
            let (is_optional, inner) = extract_option_inner_type(ungroup(declared));
            (is_optional, Some(resolve_grouping(inner).clone()))
        }
        None => (false, None),
    };
    let callable = ty.as_ref().and_then(callable_shape);

    let default = statement
        .annotation(AnnotationName::Default)
        .and_then(|annotation| annotation.value.clone())
        .or_else(|| binding.init.clone());

    ClassifiedBinding {
        name: binding.name.clone(),
        ty,
        is_stored: statement.accessor != Accessor::Getter,
        is_optional,
        callable,
        has_initializer: binding.init.is_some(),
        default,
        is_ignored: statement.has_annotation(AnnotationName::Ignore),
        is_escaping: statement.has_annotation(AnnotationName::Escaping),
        is_static: statement.scope == Scope::Type,
        is_constant: statement.is_constant,
        span: binding.span,
    }
}

/// Checks if a type is `Option<T>` and extracts the inner type T.
///
/// Accepts `Option<T>` and the fully qualified `std::option::Option<T>` /
/// `core::option::Option<T>` spellings. Returns the type unchanged when it
/// is not optional.
pub fn extract_option_inner_type(ty: &Type) -> (bool, &Type) {
    if let Type::Path(type_path) = ty {
        if type_path.qself.is_none() && is_option_path(&type_path.path) {
            if let Some(segment) = type_path.path.segments.last() {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner_ty)) = args.args.first() {
                        return (true, ungroup(inner_ty));
                    }
                }
            }
        }
    }
    (false, ty)
}

fn is_option_path(path: &Path) -> bool {
    let names: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
    match names.as_slice() {
        [option] => option == "Option",
        [krate, module, option] => {
            (krate == "std" || krate == "core") && module == "option" && option == "Option"
        }
        _ => false,
    }
}

/// Removes invisible groups left behind by `macro_rules!` expansion.
fn ungroup(ty: &Type) -> &Type {
    match ty {
        Type::Group(group) => ungroup(&group.elem),
        _ => ty,
    }
}

/// Unwraps `(T)` when `T` is function-shaped.
fn resolve_grouping(ty: &Type) -> &Type {
    match ty {
        Type::Paren(paren) if callable_shape(ungroup(&paren.elem)).is_some() => {
            resolve_grouping(ungroup(&paren.elem))
        }
        Type::Group(group) => resolve_grouping(&group.elem),
        _ => ty,
    }
}

fn callable_shape(ty: &Type) -> Option<Callable> {
    match ty {
        Type::BareFn(_) => Some(Callable::FnPointer),
        Type::Paren(paren) => callable_shape(&paren.elem),
        Type::Group(group) => callable_shape(&group.elem),
        _ => dyn_pointer(ty)
            .filter(DynPointer::is_closure)
            .map(|_| Callable::Pointer),
    }
}

/// Recognizes `Box<dyn Trait>`, `Rc<dyn Trait>` and `Arc<dyn Trait>`.
pub fn dyn_pointer(ty: &Type) -> Option<DynPointer> {
    let Type::Path(type_path) = ungroup(ty) else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    let segment = type_path.path.segments.last()?;
    if !SMART_POINTERS.iter().any(|name| segment.ident == name) {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let Some(GenericArgument::Type(pointee)) = args.args.first() else {
        return None;
    };
    let bounds = match ungroup(pointee) {
        Type::TraitObject(object) => object.bounds.clone(),
        Type::Paren(paren) => match ungroup(&paren.elem) {
            Type::TraitObject(object) => object.bounds.clone(),
            _ => return None,
        },
        _ => return None,
    };

    let mut pointer = type_path.path.clone();
    if let Some(last) = pointer.segments.last_mut() {
        last.arguments = PathArguments::None;
    }
    Some(DynPointer { pointer, bounds })
}
