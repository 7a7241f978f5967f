//! Property model construction.
//!
//! Walks an aggregate's field statements in declaration order and turns
//! every settable binding into a [`Property`]. Fields that are valid but
//! not settable (ignored, marker and constant fields) are kept as
//! [`FilledField`]s so the constructor can still name them.

use std::collections::BTreeSet;

use proc_macro2::{Group, Ident, Spacing, TokenStream, TokenTree};
use quote::{format_ident, quote_spanned, ToTokens};
use syn::ext::IdentExt;
use syn::parse::Parse;
use syn::{parse_quote, Expr, Type};
use tracing::trace;

use crate::decl::Declaration;
use crate::decorate::{decorate, DecorationFlags, TypeDescriptor};
use crate::diagnostic::{Diagnostic, Diagnostics, Message};
use crate::validate::{validate_field, Aggregate};

/// Names of the aggregate types known to have a generated builder.
#[derive(Debug, Clone, Default)]
pub struct ExpansionContext {
    generable: BTreeSet<String>,
}

impl ExpansionContext {
    pub fn new() -> Self {
        ExpansionContext::default()
    }

    /// Seeds a context from the declaration's `#[builder(generable(..))]` list.
    pub fn for_declaration(decl: &Declaration) -> Self {
        let mut context = ExpansionContext::new();
        for name in &decl.generable {
            context.register(name);
        }
        context
    }

    pub fn register(&mut self, name: &Ident) {
        trace!(name = %name, "registered generable type");
        self.generable.insert(name.to_string());
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.generable.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.generable.iter().map(String::as_str)
    }

    /// True for a plain path type, without generic arguments, whose last
    /// segment names a registered aggregate.
    pub fn is_generable(&self, ty: &Type) -> bool {
        let Type::Path(type_path) = ty else {
            return false;
        };
        if type_path.qself.is_some() {
            return false;
        }
        type_path.path.segments.last().is_some_and(|segment| {
            segment.arguments.is_empty() && self.is_registered(&segment.ident.to_string())
        })
    }
}

pub struct Property {
    pub name: Ident,
    pub ty: TypeDescriptor,
    pub default: Option<Expr>,
    pub optional: bool,
}

impl Property {
    /// Whether `build` must fail when the caller never set this property.
    pub fn is_required(&self) -> bool {
        !self.optional && self.default.is_none()
    }
}

/// A field the builder never sets, filled with a fixed expression.
pub struct FilledField {
    pub name: Ident,
    pub value: Expr,
}

pub struct PropertyModel {
    pub properties: Vec<Property>,
    pub filled: Vec<FilledField>,
}

pub fn build_model(
    aggregate: &Aggregate<'_>,
    context: &ExpansionContext,
) -> Result<PropertyModel, Diagnostics> {
    let decl = aggregate.declaration();
    let mut diagnostics = Diagnostics::new();
    let mut properties = Vec::new();
    let mut filled = Vec::new();

    for statement in aggregate.statements() {
        let verdict = validate_field(statement);
        if verdict.has_error {
            diagnostics.extend(verdict.diagnostics);
            continue;
        }

        for binding in verdict.bindings {
            let (Some(name), Some(ty)) = (binding.name.clone(), binding.ty.as_ref()) else {
                continue;
            };
            if verdict.excluded {
                trace!(field = %name, "marker field filled with its default");
                filled.push(FilledField {
                    name,
                    value: parse_quote!(::core::default::Default::default()),
                });
                continue;
            }

            let resolved = substitute_self(ty, decl, Position::Type);
            let default = binding
                .default
                .as_ref()
                .map(|expr| substitute_self(expr, decl, Position::Expr))
                .transpose();
            let (ty, default) = match (resolved, default) {
                (Ok(ty), Ok(default)) => (ty, default),
                (Err(error), _) | (_, Err(error)) => {
                    diagnostics.push(Diagnostic::from(error));
                    continue;
                }
            };

            if binding.is_ignored || (binding.is_constant && binding.has_initializer) {
                trace!(field = %name, "field excluded from the builder");
                filled.push(FilledField {
                    name,
                    value: default
                        .unwrap_or_else(|| parse_quote!(::core::default::Default::default())),
                });
                continue;
            }

            let flags = DecorationFlags {
                nested_builder: context.is_generable(&ty),
                escaping: binding.is_escaping,
                closure: binding.is_closure(),
            };
            properties.push(Property {
                name,
                ty: decorate(&ty, flags),
                default,
                optional: binding.is_optional,
            });
        }
    }

    diagnostics.extend(setter_clashes(&properties));
    diagnostics.finish()?;
    Ok(PropertyModel { properties, filled })
}

/// Reports setters that would collide with `build` or with each other.
fn setter_clashes(properties: &[Property]) -> Vec<Diagnostic> {
    let mut taken = BTreeSet::from(["build".to_string()]);
    let mut clashes = Vec::new();
    for property in properties {
        let direct = property.name.unraw();
        let nested = property
            .ty
            .is_nested_builder()
            .then(|| format_ident!("{}_builder", direct));
        for setter in std::iter::once(direct).chain(nested) {
            if !taken.insert(setter.to_string()) {
                clashes.push(Diagnostic::new(
                    Message::SetterClash(setter.to_string()),
                    property.name.span(),
                ));
            }
        }
    }
    clashes
}

#[derive(Clone, Copy)]
enum Position {
    Type,
    Expr,
}

/// Replaces the `Self` keyword with the aggregate's type, since generated
/// code lives in the builder's impl where `Self` means the builder.
fn substitute_self<T: Parse + ToTokens>(
    node: &T,
    decl: &Declaration,
    position: Position,
) -> syn::Result<T> {
    syn::parse2(replace_self(node.to_token_stream(), decl, position))
}

fn replace_self(tokens: TokenStream, decl: &Declaration, position: Position) -> TokenStream {
    let mut output = TokenStream::new();
    let mut trees = tokens.into_iter().peekable();
    while let Some(tree) = trees.next() {
        match tree {
            TokenTree::Ident(found) if found == "Self" => {
                let qualified = matches!(
                    trees.peek(),
                    Some(TokenTree::Punct(punct)) if punct.as_char() == ':' && punct.spacing() == Spacing::Joint
                );
                output.extend(aggregate_path(decl, &found, position, qualified));
            }
            TokenTree::Group(group) => {
                let mut replaced =
                    Group::new(group.delimiter(), replace_self(group.stream(), decl, position));
                replaced.set_span(group.span());
                output.extend([TokenTree::Group(replaced)]);
            }
            other => output.extend([other]),
        }
    }
    output
}

/// The aggregate's name with its generic parameters, spelled for `position`.
fn aggregate_path(
    decl: &Declaration,
    found: &Ident,
    position: Position,
    qualified: bool,
) -> TokenStream {
    let mut ident = decl.ident.clone();
    ident.set_span(found.span());
    if decl.generics.params.is_empty() {
        return ident.into_token_stream();
    }
    let (_, ty_generics, _) = decl.generics.split_for_impl();
    let span = found.span();
    match position {
        Position::Expr => {
            let turbofish = ty_generics.as_turbofish();
            quote_spanned!(span=> #ident #turbofish)
        }
        Position::Type if qualified => quote_spanned!(span=> <#ident #ty_generics>),
        Position::Type => quote_spanned!(span=> #ident #ty_generics),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::Binding;
    use crate::decorate::Decoration;
    use crate::diagnostic::Message;
    use crate::validate::validate_aggregate;
    use quote::quote;

    fn lower(tokens: TokenStream) -> Declaration {
        let input: syn::DeriveInput = syn::parse2(tokens).unwrap();
        Declaration::from_derive_input(&input)
    }

    fn model(decl: &Declaration) -> Result<PropertyModel, Diagnostics> {
        let aggregate = validate_aggregate(decl).ok().unwrap();
        build_model(&aggregate, &ExpansionContext::for_declaration(decl))
    }

    #[test]
    fn test_properties_follow_declaration_order() {
        let decl = lower(quote! {
            struct Comment {
                content: String,
                #[builder(default = false)]
                is_top_answer: bool,
                #[builder(default = "ThumbsUp".to_string())]
                upvote_emoji: String,
                note: Option<String>,
            }
        });
        let model = model(&decl).ok().unwrap();
        let names: Vec<String> = model.properties.iter().map(|p| p.name.to_string()).collect();
        assert_eq!(names, vec!["content", "is_top_answer", "upvote_emoji", "note"]);
        assert!(model.properties[0].is_required());
        assert!(!model.properties[1].is_required());
        assert!(model.properties[3].optional);
        assert!(!model.properties[3].is_required());
        assert!(model.filled.is_empty());
    }

    #[test]
    fn test_nested_builder_requires_registration() {
        let plain = lower(quote! {
            struct Person { address: Address }
        });
        let model_without = model(&plain).ok().unwrap();
        assert!(!model_without.properties[0].ty.is_nested_builder());

        let registered = lower(quote! {
            #[builder(generable(Address))]
            struct Person {
                address: Address,
                previous: Option<Address>,
                history: Vec<Address>,
            }
        });
        let model_with = model(&registered).ok().unwrap();
        assert!(model_with.properties[0].ty.is_nested_builder());
        assert!(model_with.properties[1].ty.is_nested_builder());
        assert!(!model_with.properties[2].ty.is_nested_builder());
    }

    #[test]
    fn test_flags_reach_the_descriptor() {
        let decl = lower(quote! {
            struct Callbacks {
                on_tick: Box<dyn Fn(u64)>,
                #[builder(escaping)]
                on_done: Callback,
            }
        });
        let model = model(&decl).ok().unwrap();
        assert_eq!(model.properties[0].ty.layers, vec![Decoration::Closure]);
        assert_eq!(model.properties[1].ty.layers, vec![Decoration::Escaping]);
    }

    #[test]
    fn test_ignored_and_marker_fields_are_filled() {
        let decl = lower(quote! {
            struct Cache<T> {
                key: String,
                #[builder(ignore)]
                hits: u64,
                #[builder(ignore, default = 16)]
                capacity: usize,
                marker: PhantomData<T>,
            }
        });
        let model = model(&decl).ok().unwrap();
        assert_eq!(model.properties.len(), 1);
        let filled: Vec<String> = model.filled.iter().map(|f| f.name.to_string()).collect();
        assert_eq!(filled, vec!["hits", "capacity", "marker"]);
        assert_eq!(model.filled[1].value, parse_quote!(16));
    }

    #[test]
    fn test_self_is_replaced_with_aggregate_name() {
        let decl = lower(quote! {
            struct Node {
                #[builder(default = Self::root_id())]
                parent: u32,
                sibling: Option<Box<Self>>,
            }
        });
        let model = model(&decl).ok().unwrap();
        assert_eq!(
            model.properties[0].default,
            Some(parse_quote!(Node::root_id()))
        );
        let expected: Type = parse_quote!(Box<Node>);
        assert_eq!(model.properties[1].ty.base, expected);
    }

    #[test]
    fn test_all_invalid_fields_are_reported() {
        let decl = lower(quote! {
            struct Broken<T> {
                #[builder(default, default = 1)]
                first: u8,
                fine: String,
                #[builder(escaping)]
                marker: PhantomData<T>,
            }
        });
        let err = model(&decl).err().unwrap();
        let found: Vec<Message> = err.iter().map(|d| d.message.clone()).collect();
        assert_eq!(
            found,
            vec![Message::DefaultAndInitializer, Message::AnnotatedMarker]
        );
    }

    #[test]
    fn test_shared_default_yields_one_property_per_binding() {
        let decl = lower(quote! {
            struct Point {
                #[builder(default = 0)]
                x: i32,
            }
        });
        let mut decl = decl;
        decl.statements[0].bindings.push(Binding {
            name: Some(parse_quote!(y)),
            ty: Some(parse_quote!(i32)),
            init: None,
            span: proc_macro2::Span::call_site(),
        });
        let model = model(&decl).ok().unwrap();
        assert_eq!(model.properties.len(), 2);
        assert!(model.properties.iter().all(|p| p.default.is_some()));
    }

    #[test]
    fn test_constant_with_initializer_is_filled() {
        let mut decl = lower(quote! {
            struct Version {
                #[builder(default)]
                revision: u32,
                label: String,
            }
        });
        decl.statements[0].is_constant = true;
        let model = model(&decl).ok().unwrap();
        assert_eq!(model.properties.len(), 1);
        assert_eq!(model.filled[0].name, "revision");
    }

    #[test]
    fn test_context_matches_plain_paths_only() {
        let mut context = ExpansionContext::new();
        context.register(&parse_quote!(Address));
        assert!(context.is_generable(&parse_quote!(Address)));
        assert!(context.is_generable(&parse_quote!(crate::models::Address)));
        assert!(!context.is_generable(&parse_quote!(Address<T>)));
        assert!(!context.is_generable(&parse_quote!(Box<Address>)));
        assert_eq!(context.names().collect::<Vec<_>>(), vec!["Address"]);
    }
    #[test]
    fn test_self_keeps_generic_parameters() {
        let decl = lower(quote! {
            struct Node<'a, T> {
                value: &'a T,
                next: Option<Box<Self>>,
                #[builder(default = Self::EMPTY)]
                depth: usize,
                #[builder(default = Vec::new())]
                items: Vec<<Self as Walk>::Item>,
                #[builder(default = Vec::new())]
                children: Vec<Self::Child>,
            }
        });
        let model = model(&decl).ok().unwrap();
        let boxed: Type = parse_quote!(Box<Node<'a, T>>);
        assert_eq!(model.properties[1].ty.base, boxed);
        assert_eq!(
            model.properties[2].default,
            Some(parse_quote!(Node::<'a, T>::EMPTY))
        );
        let projected: Type = parse_quote!(Vec<<Node<'a, T> as Walk>::Item>);
        assert_eq!(model.properties[3].ty.base, projected);
        let associated: Type = parse_quote!(Vec<<Node<'a, T>>::Child>);
        assert_eq!(model.properties[4].ty.base, associated);
    }

    #[test]
    fn test_field_named_build_is_rejected() {
        let decl = lower(quote! {
            struct Job {
                build: u32,
                name: String,
            }
        });
        let err = model(&decl).err().unwrap();
        let found: Vec<Message> = err.iter().map(|d| d.message.clone()).collect();
        assert_eq!(found, vec![Message::SetterClash("build".to_string())]);
    }

    #[test]
    fn test_nested_setter_clash_is_rejected() {
        let decl = lower(quote! {
            #[builder(generable(Address))]
            struct Person {
                address_builder: String,
                address: Address,
            }
        });
        let err = model(&decl).err().unwrap();
        let diagnostic = err.iter().next().unwrap();
        assert_eq!(
            diagnostic.message,
            Message::SetterClash("address_builder".to_string())
        );
        assert_eq!(diagnostic.kind(), crate::diagnostic::ErrorKind::InvalidProperty);

        let plain = lower(quote! {
            struct Person {
                address_builder: String,
                address: Address,
            }
        });
        assert!(model(&plain).is_ok());
    }
}
