use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, LitBool, LitStr, parse_macro_input};

/// Derive `emberwire::Record`, generating the record's field table.
///
/// Only structs with named fields are supported. Each field becomes one
/// table entry according to its attribute:
///
/// | Attribute | Entry |
/// |---|---|
/// | *(none)* | unannotated field, persisted only when the context includes unannotated fields |
/// | `#[persist]` | persisted in both formats |
/// | `#[persist(tree = false)]` / `#[persist(wire = false)]` | persisted in one format only |
/// | `#[manual]` | encoded by the owner itself; the codec never touches it |
/// | `#[inherit]` | embedded record whose fields are pulled in |
/// | `#[skip]` | not declared at all |
///
/// The record name defaults to the struct name and can be overridden with
/// `#[record(name = "...")]`.
///
/// ```ignore
/// #[derive(Default, Record)]
/// #[record(name = "furnace")]
/// struct Furnace {
///     #[inherit]
///     machine: Machine,
///     #[persist]
///     fuel: i32,
///     #[persist(wire = false)]
///     owner: Uuid,
///     #[manual]
///     recipes: RecipeBook,
///     label: String,
/// }
/// ```
#[proc_macro_derive(Record, attributes(record, persist, manual, inherit, skip))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_record(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_record(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let record_name = record_name(input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Record can only be derived for structs",
            ));
        }
    };

    let mut entries = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(fname) = field.ident.as_ref() else {
            continue;
        };
        let fname_str = fname.to_string();
        let ftype = &field.ty;
        let entry = match field_mode(field)? {
            FieldMode::Unannotated => quote! {
                table.field(#fname_str, |s| &s.#fname, |s| &mut s.#fname);
            },
            FieldMode::Persist { tree, wire } => quote! {
                table.persist(
                    #fname_str,
                    ::emberwire::Persist { tree: #tree, wire: #wire },
                    |s| &s.#fname,
                    |s| &mut s.#fname,
                );
            },
            FieldMode::Manual => quote! {
                table.manual(#fname_str);
            },
            FieldMode::Inherit => quote! {
                table.inherit::<#ftype>(|s| &s.#fname, |s| &mut s.#fname);
            },
            FieldMode::Skip => continue,
        };
        entries.push(entry);
    }

    Ok(quote! {
        impl #impl_generics ::emberwire::Record for #name #ty_generics #where_clause {
            const NAME: &'static str = #record_name;

            fn describe(table: &mut ::emberwire::FieldTable<Self>) {
                #(#entries)*
            }
        }
    })
}

fn record_name(input: &DeriveInput) -> syn::Result<String> {
    let mut name = input.ident.to_string();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = meta.value()?.parse::<LitStr>()?.value();
                Ok(())
            } else {
                Err(meta.error("expected `name = \"...\"`"))
            }
        })?;
    }
    Ok(name)
}

enum FieldMode {
    Unannotated,
    Persist { tree: bool, wire: bool },
    Manual,
    Inherit,
    Skip,
}

fn field_mode(field: &Field) -> syn::Result<FieldMode> {
    let mut mode = None;
    for attr in &field.attrs {
        let path = attr.path();
        let next = if path.is_ident("persist") {
            let (mut tree, mut wire) = (true, true);
            if matches!(attr.meta, syn::Meta::List(_)) {
                attr.parse_nested_meta(|meta| {
                    let flag = meta.value()?.parse::<LitBool>()?.value;
                    if meta.path.is_ident("tree") {
                        tree = flag;
                    } else if meta.path.is_ident("wire") {
                        wire = flag;
                    } else {
                        return Err(meta.error("expected `tree` or `wire`"));
                    }
                    Ok(())
                })?;
            }
            FieldMode::Persist { tree, wire }
        } else if path.is_ident("manual") {
            FieldMode::Manual
        } else if path.is_ident("inherit") {
            FieldMode::Inherit
        } else if path.is_ident("skip") {
            FieldMode::Skip
        } else {
            continue;
        };

        if mode.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "a field takes at most one of #[persist], #[manual], #[inherit], #[skip]",
            ));
        }
        mode = Some(next);
    }
    Ok(mode.unwrap_or(FieldMode::Unannotated))
}
