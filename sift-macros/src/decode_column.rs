use convert_case::{Case, Casing};
use proc_macro2::Span;
use quote::ToTokens;
use syn::{Field, Ident, LitStr, Type, ext::IdentExt, parse::ParseBuffer};

pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) nullable: bool,
    pub(crate) primary_key: bool,
    /// Variant of `ColumnRole`, `None` until decided.
    pub(crate) role: Option<&'static str>,
    pub(crate) ignore: bool,
}

impl ColumnMetadata {
    pub(crate) fn field_name(&self) -> String {
        self.ident.unraw().to_string()
    }
    pub(crate) fn role_ident(&self) -> Ident {
        Ident::new(self.role.unwrap_or("Regular"), Span::call_site())
    }
}

const ROLES: [(&str, &str); 5] = [
    ("deleted", "Deleted"),
    ("created_at", "CreatedAt"),
    ("created_by", "CreatedBy"),
    ("updated_at", "UpdatedAt"),
    ("updated_by", "UpdatedBy"),
];

/// Role of a column named like one of the bookkeeping columns.
pub(crate) fn role_by_name(name: &str) -> Option<&'static str> {
    ROLES.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
}

fn is_option(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.path
        .segments
        .last()
        .is_some_and(|v| v.ident == "Option")
}

pub fn decode_column(field: &Field) -> ColumnMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Model fields are expected to have a name");
    let mut metadata = ColumnMetadata {
        name: ident.unraw().to_string().to_case(Case::Snake),
        ident,
        ty: field.ty.clone(),
        nullable: is_option(&field.ty),
        primary_key: false,
        role: None,
        ignore: false,
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("sift") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `sift`, use it like: `#[sift(attribute = value, ...)]`");
        };
        let result = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("name") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `name`, use it like: `#[sift(name = \"my_column\")]`");
                };
                metadata.name = v.value();
            } else if arg.path.is_ident("primary_key") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `primary_key`, use it like: `#[sift(primary_key)]`");
                };
                metadata.primary_key = true;
            } else if arg.path.is_ident("ignore") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `ignore`, use it like: `#[sift(ignore)]`");
                };
                metadata.ignore = true;
            } else if let Some((_, role)) = ROLES.iter().find(|(k, _)| arg.path.is_ident(k)) {
                let Err(..) = arg.value() else {
                    panic!(
                        "Error while parsing `{}`, it takes no value",
                        arg.path.to_token_stream()
                    );
                };
                metadata.role = Some(*role);
            } else {
                panic!(
                    "Unknown attribute `{}` inside sift macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
        if let Err(e) = result {
            panic!("Error while parsing the `sift` attribute of `{}`: {e}", metadata.ident);
        }
    }
    metadata
}
