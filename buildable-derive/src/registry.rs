//! First pass over a module: find every struct deriving `Builder`.
//!
//! Each of those structs is tagged with `#[builder(generable(..))]` naming
//! the whole set, so nested-builder detection no longer depends on the
//! order in which the structs are declared.

use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::punctuated::Punctuated;
use syn::{parse_quote, Attribute, DeriveInput, Item, ItemMod, ItemStruct, Path};
use tracing::trace;

use crate::decl::ATTRIBUTE;
use crate::generate::yields_builder;
use crate::model::ExpansionContext;

const DERIVE_NAME: &str = "Builder";

pub fn impl_builders(args: TokenStream, input: TokenStream) -> syn::Result<TokenStream> {
    if !args.is_empty() {
        return Err(syn::Error::new_spanned(
            args,
            "`builders` does not take any arguments",
        ));
    }
    let mut module: ItemMod = syn::parse2(input)?;
    if module.content.is_none() {
        return Err(syn::Error::new_spanned(
            &module,
            "`builders` can only be applied to an inline module",
        ));
    }

    if let Some((_, items)) = module.content.as_mut() {
        let mut candidates = Vec::new();
        collect(items, &mut candidates)?;

        // Every candidate may be nested while deciding which ones really
        // get a builder.
        let mut optimistic = ExpansionContext::new();
        for candidate in &candidates {
            optimistic.register(&candidate.ident);
        }
        let mut context = ExpansionContext::new();
        for candidate in &candidates {
            if yields_builder(candidate, &optimistic) {
                context.register(&candidate.ident);
            } else {
                trace!(name = %candidate.ident, "derives Builder but gets no builder");
            }
        }
        trace!(
            module = %module.ident,
            generable = context.names().count(),
            "collected generable types"
        );
        tag(items, &context);
    }
    Ok(module.into_token_stream())
}

fn collect(items: &[Item], candidates: &mut Vec<DeriveInput>) -> syn::Result<()> {
    for item in items {
        match item {
            Item::Struct(item_struct) if derives_builder(&item_struct.attrs)? => {
                candidates.push(item_struct.clone().into());
            }
            Item::Mod(ItemMod {
                content: Some((_, nested)),
                ..
            }) => collect(nested, candidates)?,
            _ => {}
        }
    }
    Ok(())
}

fn tag(items: &mut [Item], context: &ExpansionContext) {
    for item in items {
        match item {
            Item::Struct(item_struct) => {
                if derives_builder(&item_struct.attrs).unwrap_or(false) {
                    tag_struct(item_struct, context);
                }
            }
            Item::Mod(ItemMod {
                content: Some((_, nested)),
                ..
            }) => tag(nested, context),
            _ => {}
        }
    }
}

fn tag_struct(item_struct: &mut ItemStruct, context: &ExpansionContext) {
    let names: Vec<syn::Ident> = context
        .names()
        .filter_map(|name| syn::parse_str(name).ok())
        .collect();
    let attribute = syn::Ident::new(ATTRIBUTE, item_struct.ident.span());
    item_struct
        .attrs
        .push(parse_quote!(#[#attribute(generable(#(#names),*))]));
}

fn derives_builder(attrs: &[Attribute]) -> syn::Result<bool> {
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
        let paths = attr.parse_args_with(Punctuated::<Path, syn::Token![,]>::parse_terminated)?;
        if paths
            .iter()
            .any(|path| path.segments.last().is_some_and(|s| s.ident == DERIVE_NAME))
        {
            return Ok(true);
        }
    }
    Ok(false)
}
