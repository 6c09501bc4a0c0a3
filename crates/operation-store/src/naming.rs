use heck::{ToPascalCase, ToSnakeCase};

/// Joins the client name and the operation or fragment name in canonical names.
pub const NAME_SEPARATOR: &str = "__";

pub const FILE_EXTENSION: &str = "graphql";

/// The name an operation or fragment is sent under, e.g. `Metaphysics__Artist` for the
/// `artist.graphql` file of the `metaphysics` client.
pub fn canonical_name(client: &str, name: &str) -> String {
    format!("{}{NAME_SEPARATOR}{}", client.to_pascal_case(), name.to_pascal_case())
}

/// The name an operation is called by from a client, e.g. `artist`.
pub fn method_name(name: &str) -> String {
    name.to_snake_case()
}

/// Directory holding the documents of a client, relative to a search path.
pub fn client_directory(client: &str) -> String {
    client.to_snake_case()
}

pub fn file_name(name: &str) -> String {
    format!("{}.{FILE_EXTENSION}", name.to_snake_case())
}

/// Fragments may be spread either by their short name or by their canonical one.
pub(crate) fn short_name<'a>(client: &str, name: &'a str) -> &'a str {
    let prefix = format!("{}{NAME_SEPARATOR}", client.to_pascal_case());
    name.strip_prefix(prefix.as_str()).unwrap_or(name)
}
