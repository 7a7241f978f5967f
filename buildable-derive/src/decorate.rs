//! Type decorations.
//!
//! A property's base type is rendered through an ordered list of
//! decorations folded over a plain [`TypeDescriptor`]. The order is fixed:
//! nested builder, then escaping, then closure.

use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use syn::punctuated::Punctuated;
use syn::{parse_quote, Expr, Ident, Path, Type, TypeParamBound, WherePredicate};

use crate::classify::{dyn_pointer, DynPointer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    NestedBuilder,
    Escaping,
    Closure,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecorationFlags {
    pub nested_builder: bool,
    pub escaping: bool,
    pub closure: bool,
}

impl DecorationFlags {
    pub fn layers(self) -> impl Iterator<Item = Decoration> {
        [
            (self.nested_builder, Decoration::NestedBuilder),
            (self.escaping, Decoration::Escaping),
            (self.closure, Decoration::Closure),
        ]
        .into_iter()
        .filter_map(|(enabled, layer)| enabled.then_some(layer))
    }
}

/// The setter's parameter type.
#[derive(Clone)]
pub enum SetterParam {
    Type(Type),
    Impl(Punctuated<TypeParamBound, syn::Token![+]>),
}

impl ToTokens for SetterParam {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        match self {
            SetterParam::Type(ty) => ty.to_tokens(tokens),
            SetterParam::Impl(bounds) => tokens.extend(quote! { impl #bounds }),
        }
    }
}

/// One step from the setter argument to the slot value, innermost first.
#[derive(Clone)]
pub enum ValueWrapper {
    Ok,
    Pointer(Path),
}

/// Names used by the second setter of a nested-builder property.
#[derive(Clone)]
pub struct NestedBuilder {
    pub builder: Type,
    pub error: Type,
}

impl NestedBuilder {
    /// Runs `configure` on a fresh nested builder and builds it.
    pub fn invocation(&self, configure: &Ident) -> Expr {
        let builder = &self.builder;
        parse_quote! {
            ::buildable::Builder::build(
                #configure(<#builder as ::core::default::Default>::default())
            )
        }
    }
}

#[derive(Clone)]
pub struct TypeDescriptor {
    pub base: Type,
    /// The value held by the builder slot, before any `Option` wrapping.
    pub slot: Type,
    pub param: SetterParam,
    pub wrappers: Vec<ValueWrapper>,
    pub predicates: Vec<WherePredicate>,
    pub nested: Option<NestedBuilder>,
    pub layers: Vec<Decoration>,
}

pub fn decorate(base: &Type, flags: DecorationFlags) -> TypeDescriptor {
    flags
        .layers()
        .fold(TypeDescriptor::plain(base), TypeDescriptor::apply)
}

impl TypeDescriptor {
    fn plain(base: &Type) -> Self {
        TypeDescriptor {
            base: base.clone(),
            slot: base.clone(),
            param: SetterParam::Type(base.clone()),
            wrappers: Vec::new(),
            predicates: Vec::new(),
            nested: None,
            layers: Vec::new(),
        }
    }

    fn apply(mut self, layer: Decoration) -> Self {
        let base = self.base.clone();
        match layer {
            Decoration::NestedBuilder => {
                let nested = NestedBuilder {
                    builder: parse_quote!(<#base as ::buildable::Buildable>::Builder),
                    error: parse_quote!(::buildable::BuilderError),
                };
                let error = &nested.error;
                self.slot = parse_quote!(::core::result::Result<#base, #error>);
                self.wrappers.push(ValueWrapper::Ok);
                self.nested = Some(nested);
            }
            Decoration::Escaping => match dyn_pointer(&base) {
                Some(pointer) => self.outlive_call(pointer),
                None => self.predicates.push(parse_quote!(#base: 'static)),
            },
            Decoration::Closure => {
                if let Some(pointer) = dyn_pointer(&base) {
                    self.outlive_call(pointer);
                }
            }
        }
        self.layers.push(layer);
        self
    }

    /// Takes any value implementing the pointee's bounds and boxes it.
    fn outlive_call(&mut self, pointer: DynPointer) {
        if matches!(self.param, SetterParam::Impl(_)) {
            return;
        }
        let mut bounds = pointer.bounds.clone();
        if !pointer.has_lifetime_bound() {
            bounds.push(parse_quote!('static));
        }
        self.param = SetterParam::Impl(bounds);
        self.wrappers.insert(0, ValueWrapper::Pointer(pointer.pointer));
    }

    pub fn is_nested_builder(&self) -> bool {
        self.nested.is_some()
    }

    /// The expression assigned to the slot by the direct setter.
    pub fn setter_body(&self, value: &Ident) -> Expr {
        self.wrappers
            .iter()
            .fold(parse_quote!(#value), |expr: Expr, wrapper| match wrapper {
                ValueWrapper::Ok => parse_quote!(::core::result::Result::Ok(#expr)),
                ValueWrapper::Pointer(path) => parse_quote!(#path::new(#expr)),
            })
    }

    /// The slot's initial value for a property with a default.
    pub fn default_assignment(&self, default: &Expr, optional: bool) -> Expr {
        match (self.is_nested_builder(), optional) {
            (true, true) => {
                parse_quote!(::core::option::Option::map(#default, ::core::result::Result::Ok))
            }
            (true, false) => parse_quote!(::core::result::Result::Ok(#default)),
            (false, _) => default.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    fn ty(tokens: TokenStream) -> Type {
        syn::parse2(tokens).unwrap()
    }

    fn render(tokens: impl ToTokens) -> String {
        tokens.to_token_stream().to_string()
    }

    #[test]
    fn test_plain_descriptor() {
        let descriptor = decorate(&ty(quote! { String }), DecorationFlags::default());
        assert_eq!(descriptor.slot, ty(quote! { String }));
        assert!(matches!(&descriptor.param, SetterParam::Type(t) if *t == ty(quote! { String })));
        let value = Ident::new("value", proc_macro2::Span::call_site());
        assert_eq!(render(descriptor.setter_body(&value)), "value");
        assert!(descriptor.layers.is_empty());
    }

    #[test]
    fn test_layer_order_is_fixed() {
        let flags = DecorationFlags {
            nested_builder: true,
            escaping: true,
            closure: true,
        };
        let layers: Vec<_> = flags.layers().collect();
        assert_eq!(
            layers,
            vec![
                Decoration::NestedBuilder,
                Decoration::Escaping,
                Decoration::Closure
            ]
        );
    }

    #[test]
    fn test_nested_builder_descriptor() {
        let descriptor = decorate(
            &ty(quote! { Address }),
            DecorationFlags {
                nested_builder: true,
                ..Default::default()
            },
        );
        assert_eq!(
            descriptor.slot,
            ty(quote! { ::core::result::Result<Address, ::buildable::BuilderError> })
        );
        let value = Ident::new("value", proc_macro2::Span::call_site());
        assert_eq!(
            descriptor.setter_body(&value),
            parse_quote!(::core::result::Result::Ok(value))
        );

        let default: Expr = parse_quote!(Address::home());
        assert_eq!(
            descriptor.default_assignment(&default, false),
            parse_quote!(::core::result::Result::Ok(Address::home()))
        );

        let nested = descriptor.nested.as_ref().unwrap();
        assert_eq!(
            nested.builder,
            ty(quote! { <Address as ::buildable::Buildable>::Builder })
        );
        let configure = Ident::new("configure", proc_macro2::Span::call_site());
        assert!(render(nested.invocation(&configure)).contains("configure"));
    }

    #[test]
    fn test_closure_descriptor_boxes_static_impl() {
        let base = ty(quote! { Box<dyn Fn(i32) -> i32> });
        let descriptor = decorate(
            &base,
            DecorationFlags {
                closure: true,
                ..Default::default()
            },
        );
        assert_eq!(descriptor.slot, base);
        assert_eq!(
            render(&descriptor.param),
            render(quote! { impl Fn(i32) -> i32 + 'static })
        );
        let value = Ident::new("value", proc_macro2::Span::call_site());
        assert_eq!(
            descriptor.setter_body(&value),
            parse_quote!(Box::new(value))
        );
    }

    #[test]
    fn test_closure_keeps_declared_lifetime() {
        let base = ty(quote! { Box<dyn FnMut() + Send + 'a> });
        let descriptor = decorate(
            &base,
            DecorationFlags {
                escaping: true,
                closure: true,
                ..Default::default()
            },
        );
        assert_eq!(
            render(&descriptor.param),
            render(quote! { impl FnMut() + Send + 'a })
        );
        assert_eq!(descriptor.wrappers.len(), 1);
    }

    #[test]
    fn test_fn_pointer_closure_is_passed_through() {
        let base = ty(quote! { fn(u8) -> bool });
        let descriptor = decorate(
            &base,
            DecorationFlags {
                closure: true,
                ..Default::default()
            },
        );
        assert!(matches!(descriptor.param, SetterParam::Type(_)));
        assert!(descriptor.wrappers.is_empty());
        assert!(descriptor.predicates.is_empty());
    }

    #[test]
    fn test_escaping_alias_adds_static_predicate() {
        let descriptor = decorate(
            &ty(quote! { Callback }),
            DecorationFlags {
                escaping: true,
                ..Default::default()
            },
        );
        assert_eq!(descriptor.slot, ty(quote! { Callback }));
        assert_eq!(descriptor.predicates.len(), 1);
        assert_eq!(
            render(&descriptor.predicates[0]),
            render(quote! { Callback: 'static })
        );
    }

    #[test]
    fn test_escaping_boxed_trait_object() {
        let descriptor = decorate(
            &ty(quote! { Box<dyn Handler> }),
            DecorationFlags {
                escaping: true,
                ..Default::default()
            },
        );
        assert_eq!(
            render(&descriptor.param),
            render(quote! { impl Handler + 'static })
        );
        assert!(descriptor.predicates.is_empty());
    }

    #[test]
    fn test_optional_nested_default_maps_ok() {
        let descriptor = decorate(
            &ty(quote! { Address }),
            DecorationFlags {
                nested_builder: true,
                ..Default::default()
            },
        );
        let default: Expr = parse_quote!(None);
        assert_eq!(
            descriptor.default_assignment(&default, true),
            parse_quote!(::core::option::Option::map(None, ::core::result::Result::Ok))
        );
    }
}
