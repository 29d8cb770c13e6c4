use crate::decode_column::{ColumnMetadata, decode_column, role_by_name};
use convert_case::{Case, Casing};
use quote::ToTokens;
use syn::{Fields, ItemStruct, LitStr, meta::ParseNestedMeta, parse::ParseBuffer};

pub(crate) struct UniqueIndexMetadata {
    pub(crate) name: String,
    pub(crate) message: Option<String>,
}

pub(crate) struct TableMetadata {
    pub(crate) name: String,
    pub(crate) schema: String,
    /// Mapped columns, ignored fields excluded.
    pub(crate) columns: Vec<ColumnMetadata>,
    pub(crate) unique_indexes: Vec<UniqueIndexMetadata>,
    pub(crate) not_found: Option<String>,
    pub(crate) not_affected: Option<String>,
}

fn lit_str(arg: &ParseNestedMeta<'_>, usage: &str) -> String {
    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
        panic!(
            "Error while parsing `{}`, use it like: `{usage}`",
            arg.path.to_token_stream()
        );
    };
    value.value()
}

pub fn decode_table(item: &ItemStruct) -> TableMetadata {
    if !item.generics.params.is_empty() {
        panic!("Models cannot be generic");
    }
    let Fields::Named(fields) = &item.fields else {
        panic!("Models must be structs with named fields");
    };
    let mut table = TableMetadata {
        name: item.ident.to_string().to_case(Case::Snake),
        schema: String::new(),
        columns: fields
            .named
            .iter()
            .map(decode_column)
            .filter(|v| !v.ignore)
            .collect(),
        unique_indexes: Vec::new(),
        not_found: None,
        not_affected: None,
    };
    for attr in &item.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("sift") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `sift`, use it like: `#[sift(attribute = value, ..)]`");
        };
        let result = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("table") {
                table.name = lit_str(&arg, "#[sift(table = \"my_table\")]");
            } else if arg.path.is_ident("schema") {
                table.schema = lit_str(&arg, "#[sift(schema = \"my_schema\")]");
            } else if arg.path.is_ident("not_found") {
                table.not_found = Some(lit_str(&arg, "#[sift(not_found = \"message\")]"));
            } else if arg.path.is_ident("not_affected") {
                table.not_affected = Some(lit_str(&arg, "#[sift(not_affected = \"message\")]"));
            } else if arg.path.is_ident("unique_index") {
                let mut index = UniqueIndexMetadata {
                    name: String::new(),
                    message: None,
                };
                arg.parse_nested_meta(|arg| {
                    if arg.path.is_ident("name") {
                        index.name = lit_str(&arg, "#[sift(unique_index(name = \"uk_email\"))]");
                    } else if arg.path.is_ident("message") {
                        index.message = Some(lit_str(
                            &arg,
                            "#[sift(unique_index(name = \"uk_email\", message = \"email taken\"))]",
                        ));
                    } else {
                        panic!(
                            "Unknown attribute `{}` inside unique_index",
                            arg.path.to_token_stream()
                        );
                    }
                    Ok(())
                })?;
                if index.name.is_empty() {
                    panic!("A unique index needs a name: `#[sift(unique_index(name = \"..\"))]`");
                }
                table.unique_indexes.push(index);
            } else {
                panic!(
                    "Unknown attribute `{}` inside sift macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
        if let Err(e) = result {
            panic!("Error while parsing the `sift` attribute of `{}`: {e}", item.ident);
        }
    }
    if table.columns.iter().filter(|c| c.primary_key).count() > 1 {
        panic!("Model `{}` declares more than one primary key", item.ident);
    }
    if !table.columns.iter().any(|c| c.primary_key) {
        if let Some(column) = table.columns.iter_mut().find(|c| c.name == "id") {
            column.primary_key = true;
        }
    }
    for i in 0..table.columns.len() {
        if table.columns[i].role.is_some() {
            continue;
        }
        let Some(role) = role_by_name(&table.columns[i].name) else {
            continue;
        };
        if !table.columns.iter().any(|c| c.role == Some(role)) {
            table.columns[i].role = Some(role);
        }
    }
    table
}
