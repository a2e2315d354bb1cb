/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Expr, Fields, Ident, Token, parse::Parse, parse_macro_input};

#[proc_macro_attribute]
pub fn event_type(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let name = &input.ident;
    let vis = &input.vis;
    let attrs = &input.attrs;
    let name_str = name.to_string();
    let prefix = to_kebab_case(name_str.strip_suffix("Event").unwrap_or(&name_str));

    let enum_variants = match &input.data {
        Data::Enum(data_enum) => &data_enum.variants,
        _ => {
            return syn::Error::new_spanned(name, "event_type only works with enums")
                .to_compile_error()
                .into();
        }
    };

    let mut variant_names = Vec::new();
    let mut event_names = Vec::new();

    for variant in enum_variants {
        let variant_name = &variant.ident;
        event_names.push(format!(
            "{prefix}.{}",
            to_kebab_case(&variant_name.to_string())
        ));
        variant_names.push(variant_name);
    }

    let expanded = quote! {
        #(#attrs)*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #vis enum #name {
            #(#variant_names),*
        }

        impl #name {
            pub fn name(&self) -> &'static str {
                match self {
                    #(Self::#variant_names => #event_names,)*
                }
            }

            pub fn try_parse(name: &str) -> Option<Self> {
                match name {
                    #(#event_names => Some(Self::#variant_names),)*
                    _ => None,
                }
            }

            pub const fn variants() -> &'static [Self] {
                &[
                    #(#name::#variant_names,)*
                ]
            }
        }
    };

    TokenStream::from(expanded)
}

#[proc_macro_attribute]
pub fn event_family(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let name = &input.ident;
    let vis = &input.vis;
    let attrs = &input.attrs;

    let variants = match &input.data {
        Data::Enum(data_enum) => &data_enum.variants,
        _ => {
            return syn::Error::new_spanned(name, "event_family only works with enums")
                .to_compile_error()
                .into();
        }
    };

    let mut variant_idents = Vec::new();
    let mut event_types = Vec::new();
    for variant in variants {
        match &variant.fields {
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                variant_idents.push(&variant.ident);
                event_types.push(&fields.unnamed[0].ty);
            }
            _ => {
                return syn::Error::new_spanned(
                    &variant.ident,
                    "event_family variants must wrap exactly one event type",
                )
                .to_compile_error()
                .into();
            }
        }
    }

    let family_names: Vec<_> = variant_idents
        .iter()
        .map(|ident| {
            let name_str = ident.to_string();
            to_kebab_case(name_str.strip_suffix("Event").unwrap_or(&name_str))
        })
        .collect();

    let expanded = quote! {
        #(#attrs)*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #vis enum #name {
            #(#variant_idents(#event_types)),*
        }

        impl #name {
            pub fn name(&self) -> &'static str {
                match self {
                    #(#name::#variant_idents(e) => e.name()),*
                }
            }

            pub fn try_parse(name: &str) -> Option<Self> {
                match name.trim().split_once('.')?.0 {
                    #(
                        #family_names => <#event_types>::try_parse(name.trim()).map(#name::#variant_idents),
                    )*
                    _ => None,
                }
            }

            pub fn variants() -> Vec<#name> {
                let mut variants = Vec::new();
                #(
                    variants.extend(
                        <#event_types>::variants()
                            .iter()
                            .copied()
                            .map(#name::#variant_idents),
                    );
                )*
                variants
            }
        }
    };

    TokenStream::from(expanded)
}

#[proc_macro_attribute]
pub fn key_names(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let name = &input.ident;

    let enum_variants = match &input.data {
        Data::Enum(data_enum) => &data_enum.variants,
        _ => {
            return syn::Error::new_spanned(name, "key_names only works with enums")
                .to_compile_error()
                .into();
        }
    };

    let mut variant_names = Vec::new();
    let mut camel_case_names = Vec::new();
    let mut kebab_case_names = Vec::new();

    for variant in enum_variants.iter() {
        let variant_name = &variant.ident;
        variant_names.push(variant_name);
        kebab_case_names.push(to_kebab_case(&variant_name.to_string()));
        camel_case_names.push(
            variant_name
                .to_string()
                .char_indices()
                .map(|(i, c)| if i == 0 { c.to_ascii_lowercase() } else { c })
                .collect::<String>(),
        );
    }

    let expanded = quote! {
        #input

        impl #name {
            pub fn name(&self) -> &'static str {
                match self {
                    #(Self::#variant_names => #camel_case_names,)*
                }
            }

            pub fn id(&self) -> &'static str {
                match self {
                    #(Self::#variant_names => #kebab_case_names,)*
                }
            }

            pub fn try_parse(name: &str) -> Option<Self> {
                match name {
                    #(#kebab_case_names => Some(Self::#variant_names),)*
                    _ => None,
                }
            }
        }
    };

    TokenStream::from(expanded)
}

fn to_kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (idx, ch) in name.char_indices() {
        if ch.is_ascii_uppercase() {
            if idx > 0 {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

struct EventMacroInput {
    event: Ident,
    param: Expr,
    key_values: Vec<(Ident, Expr)>,
}

impl Parse for EventMacroInput {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let event: Ident = input.parse()?;
        let content;
        syn::parenthesized!(content in input);
        let param: Expr = content.parse()?;

        let mut key_values = Vec::new();
        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let value: Expr = input.parse()?;
            key_values.push((key, value));
        }

        Ok(EventMacroInput {
            event,
            param,
            key_values,
        })
    }
}

#[proc_macro]
pub fn event(input: TokenStream) -> TokenStream {
    let EventMacroInput {
        event,
        param,
        key_values,
    } = parse_macro_input!(input as EventMacroInput);

    // Values are only evaluated when somebody is listening
    let key_value_tokens = key_values.iter().map(|(key, value)| {
        quote! {
            (trc::Key::#key, trc::Value::from(#value))
        }
    });

    let expanded = quote! {{
        let et = trc::EventType::#event(#param);
        if et.effective_level().is_enabled() {
            trc::Event::with_keys(et, vec![#(#key_value_tokens),*]).send();
        }
    }};

    TokenStream::from(expanded)
}
