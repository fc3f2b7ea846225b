use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, parse_macro_input, spanned::Spanned};

/// Variant attribute: #[weight(<u64 const expr>)]
#[proc_macro_derive(WeightedEnum, attributes(weight))]
pub fn derive_weighted_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_weighted_enum(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_weighted_enum(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let enum_ident = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new(
            input.ident.span(),
            "WeightedEnum can only be derived for enums",
        ));
    };

    let mut variants = Vec::new();
    let mut weights = Vec::new();

    for variant in &data_enum.variants {
        // the table hands out &'static variants, so they carry no data
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new(
                variant.span(),
                "WeightedEnum only supports fieldless variants",
            ));
        }

        let weight = find_weight(&variant.attrs)?.ok_or_else(|| {
            syn::Error::new(variant.span(), "missing #[weight(...)] on variant")
        })?;

        let ident = &variant.ident;
        variants.push(quote! { Self::#ident });
        weights.push(weight);
    }

    Ok(quote! {
        impl fldr::WeightedEnum for #enum_ident {
            const VARIANTS: &'static [Self] = &[
                #(#variants),*
            ];
            const WEIGHTS: &'static [u64] = &[
                #(#weights),*
            ];
        }

        impl #enum_ident {
            /// Build a `StaticDropTable` over the variants from their `#[weight]`s.
            pub fn droptable() -> ::core::result::Result<
                fldr::StaticDropTable<fldr::DdgTree, Self>,
                fldr::FldrError,
            > {
                <Self as fldr::WeightedEnum>::droptable()
            }
        }
    })
}

/// The expression inside `#[weight(...)]`, if present. Weights are integers;
/// the expression lands in a `&[u64]`, so anything else fails to compile there.
fn find_weight(attrs: &[Attribute]) -> syn::Result<Option<Expr>> {
    let mut found = None;
    for Attribute { meta, .. } in attrs {
        if !meta.path().is_ident("weight") {
            continue;
        }
        let syn::Meta::List(list) = meta else {
            return Err(syn::Error::new(meta.span(), "use #[weight(<expr>)]"));
        };
        if found.is_some() {
            return Err(syn::Error::new(list.span(), "duplicate #[weight(...)]"));
        }
        let tokens: TokenStream2 = list.tokens.clone();
        let expr = syn::parse2::<Expr>(tokens)
            .map_err(|e| syn::Error::new(list.span(), format!("invalid weight expr: {e}")))?;
        found = Some(expr);
    }
    Ok(found)
}
