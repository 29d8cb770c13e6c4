mod decode_column;
mod decode_table;

use decode_table::decode_table;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Implements `sift::Model` for a struct with named fields.
///
/// Struct attributes: `#[sift(table = "..", schema = "..", not_found = "..",
/// not_affected = "..", unique_index(name = "..", message = ".."))]`.
/// Field attributes: `#[sift(name = "..", primary_key, ignore, deleted, created_at,
/// created_by, updated_at, updated_by)]`.
///
/// Without attributes the table is the snake case struct name, the primary key is the
/// field called `id` and fields named like the bookkeeping columns take their role.
#[proc_macro_derive(Model, attributes(sift))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let name = &item.ident;
    let table = decode_table(&item);
    let table_name = &table.name;
    let schema_name = &table.schema;

    let column_defs = table.columns.iter().map(|c| {
        let column = &c.name;
        let field = c.field_name();
        let ty = &c.ty;
        let nullable = c.nullable;
        let primary_key = c.primary_key;
        let role = c.role_ident();
        quote! {
            ::sift::ColumnDef {
                name: #column,
                field: #field,
                value: <#ty as ::sift::AsValue>::as_empty_value(),
                nullable: #nullable,
                primary_key: #primary_key,
                role: ::sift::ColumnRole::#role,
            }
        }
    });
    let row = table.columns.iter().map(|c| {
        let column = &c.name;
        let ident = &c.ident;
        quote!((#column, ::sift::AsValue::as_value(::std::clone::Clone::clone(&self.#ident))))
    });
    let set_column = table.columns.iter().map(|c| {
        let column = &c.name;
        let field = c.field_name();
        let ident = &c.ident;
        let ty = &c.ty;
        let pattern = if *column == field {
            quote!(#column)
        } else {
            quote!(#column | #field)
        };
        quote! {
            #pattern => {
                self.#ident = ::sift::Context::with_context(
                    <#ty as ::sift::AsValue>::try_from_value(value),
                    || format!("While decoding column `{}` of `{}`", #column, #table_name),
                )?;
            }
        }
    });
    let unique_indexes = if table.unique_indexes.is_empty() {
        TokenStream2::new()
    } else {
        let count = table.unique_indexes.len();
        let indexes = table.unique_indexes.iter().map(|v| {
            let name = &v.name;
            let message = match &v.message {
                Some(message) => quote!(Some(#message)),
                None => quote!(None),
            };
            quote!(::sift::UniqueIndex { name: #name, message: #message })
        });
        quote! {
            fn unique_indexes() -> Option<&'static [::sift::UniqueIndex]> {
                static RESULT: [::sift::UniqueIndex; #count] = [#(#indexes),*];
                Some(&RESULT)
            }
        }
    };
    let not_found = table.not_found.as_ref().map(|v| {
        quote! {
            fn record_not_found_message() -> &'static str {
                #v
            }
        }
    });
    let not_affected = table.not_affected.as_ref().map(|v| {
        quote! {
            fn not_affected_message() -> &'static str {
                #v
            }
        }
    });
    quote! {
        impl ::sift::Model for #name {
            fn table_ref() -> &'static ::sift::TableRef {
                static TABLE_REF: ::sift::TableRef = ::sift::TableRef {
                    name: #table_name,
                    schema: #schema_name,
                };
                &TABLE_REF
            }

            fn columns() -> &'static [::sift::ColumnDef] {
                static RESULT: ::std::sync::LazyLock<Box<[::sift::ColumnDef]>> =
                    ::std::sync::LazyLock::new(|| vec![#(#column_defs),*].into_boxed_slice());
                &RESULT
            }

            fn row(&self) -> Box<[(&'static str, ::sift::Value)]> {
                vec![#(#row),*].into_boxed_slice()
            }

            fn set_column(&mut self, column: &str, value: ::sift::Value) -> ::sift::Result<()> {
                match column {
                    #(#set_column)*
                    _ => {
                        return Err(::sift::DbError::Value(format!(
                            "`{}` is not a column of `{}`",
                            column, #table_name
                        ))
                        .into());
                    }
                }
                Ok(())
            }

            #unique_indexes
            #not_found
            #not_affected
        }
    }
    .into()
}
