//! Code generation logic for the Builder pattern.
//!
//! The property model is first turned into small output nodes (slots,
//! setters, field guards) and each node renders itself with `quote`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote, ToTokens};
use syn::ext::IdentExt;
use syn::{parse_quote, DeriveInput, Expr, Generics, Ident, Type, Visibility, WherePredicate};
use tracing::debug;

use crate::decl::Declaration;
use crate::decorate::SetterParam;
use crate::diagnostic::Diagnostics;
use crate::model::{build_model, ExpansionContext, FilledField, Property, PropertyModel};
use crate::validate::validate_aggregate;

/// Generates the complete builder implementation for a struct.
pub fn impl_builder(input: &DeriveInput) -> Result<TokenStream, Diagnostics> {
    let decl = Declaration::from_derive_input(input);
    let aggregate = validate_aggregate(&decl).inspect_err(|errors| {
        let kind = errors.iter().next().map(|d| d.kind());
        debug!(aggregate = %decl.ident, ?kind, "declaration rejected");
    })?;

    let mut diagnostics = Diagnostics::new();
    diagnostics.extend(decl.errors.iter().cloned());
    let context = ExpansionContext::for_declaration(&decl);
    let model = match build_model(&aggregate, &context) {
        Ok(model) => Some(model),
        Err(errors) => {
            diagnostics.extend(errors);
            None
        }
    };
    diagnostics.finish().inspect_err(|errors| {
        debug!(aggregate = %decl.ident, errors = errors.len(), "builder not generated");
    })?;

    let Some(model) = model else {
        return Ok(TokenStream::new());
    };
    Ok(synthesize(&decl, &model))
}

/// Whether `impl_builder` would emit a builder for `input`, with the
/// types in `context` treated as generable.
pub fn yields_builder(input: &DeriveInput, context: &ExpansionContext) -> bool {
    let decl = Declaration::from_derive_input(input);
    let Ok(aggregate) = validate_aggregate(&decl) else {
        return false;
    };
    decl.errors.is_empty()
        && build_model(&aggregate, context).is_ok_and(|model| !model.properties.is_empty())
}

/// Renders the builder for an already validated property model.
///
/// An aggregate without settable properties gets no builder.
pub fn synthesize(decl: &Declaration, model: &PropertyModel) -> TokenStream {
    if model.properties.is_empty() {
        debug!(aggregate = %decl.ident, "no settable properties, builder skipped");
        return TokenStream::new();
    }

    let ident = &decl.ident;
    let builder = format_ident!("{}Builder", ident);
    let vis = &decl.vis;
    let generics = &decl.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let configure = configure_param(generics);
    let builder_struct = BuilderStruct::new(ident, &builder, vis, generics, &model.properties);
    let setters = model.properties.iter().map(Setter::direct);
    let nested_setters = model
        .properties
        .iter()
        .filter_map(|property| Setter::nested(property, &configure));
    let build_method = BuildMethod {
        target: ident,
        generics,
        properties: &model.properties,
        filled: &model.filled,
    };

    debug!(
        aggregate = %ident,
        properties = model.properties.len(),
        "synthesized builder"
    );

    quote! {
        #builder_struct

        impl #impl_generics #builder #ty_generics #where_clause {
            #(#setters)*
            #(#nested_setters)*
            #build_method
        }

        impl #impl_generics #ident #ty_generics #where_clause {
            #vis fn builder() -> #builder #ty_generics {
                <#builder #ty_generics as ::core::default::Default>::default()
            }

            /// Builds through `configure`, returning `None` if any required
            /// value is missing.
            #vis fn checked_build<#configure>(configure: #configure) -> ::core::option::Option<Self>
            where
                #configure: ::core::ops::FnOnce(#builder #ty_generics) -> #builder #ty_generics,
            {
                configure(Self::builder()).build().ok()
            }
        }

        impl #impl_generics ::buildable::Builder for #builder #ty_generics #where_clause {
            type Buildable = #ident #ty_generics;

            fn build(self) -> ::buildable::BuildResult<#ident #ty_generics> {
                #builder::build(self)
            }
        }

        impl #impl_generics ::buildable::Buildable for #ident #ty_generics #where_clause {
            type Builder = #builder #ty_generics;
        }
    }
}

/// Whether the builder slot wraps the value in `Option` to track presence.
fn tracks_presence(property: &Property) -> bool {
    property.optional || property.is_required()
}

/// Name of the closure type parameter added by `checked_build` and the
/// nested setters, distinct from every parameter of the aggregate.
fn configure_param(generics: &Generics) -> Ident {
    let taken = |candidate: &Ident| {
        generics.type_params().any(|param| param.ident == *candidate)
            || generics.const_params().any(|param| param.ident == *candidate)
    };
    let mut candidate = format_ident!("F");
    let mut suffix = 0usize;
    while taken(&candidate) {
        suffix += 1;
        candidate = format_ident!("F{}", suffix);
    }
    candidate
}

/// `None`, written in any of its usual spellings.
fn is_absence(expr: &Expr) -> bool {
    match expr {
        Expr::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .is_some_and(|s| s.ident == "None" && s.arguments.is_empty()),
        _ => false,
    }
}

struct Slot {
    name: Ident,
    ty: Type,
    init: Expr,
}

impl Slot {
    fn new(property: &Property) -> Self {
        let value = &property.ty.slot;
        let ty = if tracks_presence(property) {
            parse_quote!(::core::option::Option<#value>)
        } else {
            value.clone()
        };
        let init = match &property.default {
            Some(default) if !is_absence(default) => {
                property.ty.default_assignment(default, property.optional)
            }
            _ => parse_quote!(::core::option::Option::None),
        };
        Slot {
            name: property.name.clone(),
            ty,
            init,
        }
    }
}

struct BuilderStruct<'a> {
    vis: &'a Visibility,
    ident: &'a Ident,
    generics: &'a Generics,
    slots: Vec<Slot>,
    marker: Option<Type>,
}

impl<'a> BuilderStruct<'a> {
    fn new(
        target: &Ident,
        ident: &'a Ident,
        vis: &'a Visibility,
        generics: &'a Generics,
        properties: &[Property],
    ) -> Self {
        let marker = if generics.params.is_empty() {
            None
        } else {
            let (_, ty_generics, _) = generics.split_for_impl();
            Some(parse_quote!(::core::marker::PhantomData<fn() -> #target #ty_generics>))
        };
        BuilderStruct {
            vis,
            ident,
            generics,
            slots: properties.iter().map(Slot::new).collect(),
            marker,
        }
    }
}

impl ToTokens for BuilderStruct<'_> {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let BuilderStruct {
            vis,
            ident,
            generics,
            slots,
            marker,
        } = self;
        let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
        let names: Vec<&Ident> = slots.iter().map(|slot| &slot.name).collect();
        let types = slots.iter().map(|slot| &slot.ty);
        let inits = slots.iter().map(|slot| &slot.init);
        let marker_field = marker
            .as_ref()
            .map(|ty| quote! { __buildable_marker: #ty, });
        let marker_init = marker
            .as_ref()
            .map(|_| quote! { __buildable_marker: ::core::marker::PhantomData, });

        tokens.extend(quote! {
            #vis struct #ident #generics #where_clause {
                #(#names: #types,)*
                #marker_field
            }

            impl #impl_generics ::core::default::Default for #ident #ty_generics #where_clause {
                fn default() -> Self {
                    Self {
                        #(#names: #inits,)*
                        #marker_init
                    }
                }
            }
        });
    }
}

struct Setter {
    name: Ident,
    slot: Ident,
    param: SetterParam,
    value: Expr,
    predicates: Vec<WherePredicate>,
    /// Set for the second setter of a nested-builder property: the nested
    /// builder type and the closure's type parameter.
    configure: Option<(Type, Ident)>,
}

impl Setter {
    fn direct(property: &Property) -> Self {
        let value = format_ident!("value");
        let body = property.ty.setter_body(&value);
        Setter {
            name: property.name.clone(),
            slot: property.name.clone(),
            param: property.ty.param.clone(),
            value: Self::assignment(property, body),
            predicates: property.ty.predicates.clone(),
            configure: None,
        }
    }

    fn nested(property: &Property, param: &Ident) -> Option<Self> {
        let nested = property.ty.nested.as_ref()?;
        let configure = format_ident!("configure");
        let body = nested.invocation(&configure);
        Some(Setter {
            name: format_ident!("{}_builder", property.name),
            slot: property.name.clone(),
            param: SetterParam::Type(nested.builder.clone()),
            value: Self::assignment(property, body),
            predicates: Vec::new(),
            configure: Some((nested.builder.clone(), param.clone())),
        })
    }

    fn assignment(property: &Property, body: Expr) -> Expr {
        if tracks_presence(property) {
            parse_quote!(::core::option::Option::Some(#body))
        } else {
            body
        }
    }
}

impl ToTokens for Setter {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let Setter {
            name,
            slot,
            param,
            value,
            predicates,
            configure,
        } = self;
        let where_clause = (!predicates.is_empty()).then(|| quote! { where #(#predicates),* });

        tokens.extend(match configure {
            Some((builder, param)) => quote! {
                pub fn #name<#param>(mut self, configure: #param) -> Self
                where
                    #param: ::core::ops::FnOnce(#builder) -> #builder,
                {
                    self.#slot = #value;
                    self
                }
            },
            None => quote! {
                pub fn #name(mut self, value: #param) -> Self #where_clause {
                    self.#slot = #value;
                    self
                }
            },
        });
    }
}

/// How `build` obtains one field's value from its slot.
enum Guard {
    /// Fails with a missing-value error when unset.
    Required,
    /// Unset fails; a failed nested build is propagated as is.
    NestedRequired,
    /// Absence is kept; a failed nested build is propagated.
    NestedOptional,
    /// Always present; a failed nested build is propagated.
    NestedDefaulted,
    PassThrough,
}

impl Guard {
    fn for_property(property: &Property) -> Self {
        if !property.ty.is_nested_builder() {
            return if property.is_required() {
                Guard::Required
            } else {
                Guard::PassThrough
            };
        }
        if property.optional {
            Guard::NestedOptional
        } else if property.is_required() {
            Guard::NestedRequired
        } else {
            Guard::NestedDefaulted
        }
    }
}

struct BuildMethod<'a> {
    target: &'a Ident,
    generics: &'a Generics,
    properties: &'a [Property],
    filled: &'a [FilledField],
}

impl BuildMethod<'_> {
    fn field_value(&self, property: &Property) -> TokenStream {
        let name = &property.name;
        let key = name.unraw().to_string();
        let container = self.target.unraw().to_string();
        let missing = quote! {
            ::buildable::BuilderError::missing_value_for(#key, #container)
        };

        match Guard::for_property(property) {
            Guard::Required => quote! {
                self.#name.ok_or_else(|| #missing)?
            },
            Guard::NestedRequired => quote! {
                match self.#name {
                    ::core::option::Option::Some(result) => result?,
                    ::core::option::Option::None => return ::core::result::Result::Err(#missing),
                }
            },
            Guard::NestedOptional => quote! {
                self.#name.transpose()?
            },
            Guard::NestedDefaulted => quote! {
                self.#name?
            },
            Guard::PassThrough => quote! {
                self.#name
            },
        }
    }
}

impl ToTokens for BuildMethod<'_> {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let target = self.target;
        let (_, ty_generics, _) = self.generics.split_for_impl();
        let names = self.properties.iter().map(|p| &p.name);
        let values = self.properties.iter().map(|p| self.field_value(p));
        let filled_names = self.filled.iter().map(|f| &f.name);
        let filled_values = self.filled.iter().map(|f| &f.value);

        tokens.extend(quote! {
            pub fn build(self) -> ::buildable::BuildResult<#target #ty_generics> {
                ::core::result::Result::Ok(#target {
                    #(#names: #values,)*
                    #(#filled_names: #filled_values,)*
                })
            }
        });
    }
}
