use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{
    compose::{compose, FragmentLocator, Source},
    naming::file_name,
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A GraphQL type reference as written in a variable definition, e.g. `[ID!]!`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    /// The type without its non-null wrapper, if any.
    pub fn nullable(&self) -> &TypeRef {
        match self {
            TypeRef::NonNull(inner) => inner.as_ref(),
            ty => ty,
        }
    }

    pub fn named_type(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.named_type(),
        }
    }
}

impl FromStr for TypeRef {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();

        if let Some(inner) = input.strip_suffix('!') {
            return match inner.parse::<TypeRef>()? {
                TypeRef::NonNull(_) => Err(format!("`{input}` is non-null twice")),
                ty => Ok(TypeRef::NonNull(Box::new(ty))),
            };
        }

        if let Some(inner) = input.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            return Ok(TypeRef::List(Box::new(inner.parse::<TypeRef>()?)));
        }

        let is_name = input.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
            && input.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

        if is_name {
            Ok(TypeRef::Named(input.to_owned()))
        } else {
            Err(format!("`{input}` is not a valid type reference"))
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// A variable declared by an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableDefinition {
    pub name: String,
    pub ty: TypeRef,
    pub has_default: bool,
}

impl VariableDefinition {
    /// Required variables must be supplied by the caller: they're non-null and have no default.
    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && !self.has_default
    }
}

/// A resolved operation: renamed, with all of its fragments appended, ready to be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationDocument {
    pub(crate) name: String,
    pub(crate) kind: OperationKind,
    pub(crate) variables: Vec<VariableDefinition>,
    pub(crate) fragments: Vec<String>,
    pub(crate) path: PathBuf,
    pub(crate) query: String,
}

impl OperationDocument {
    /// Composes an operation held in memory rather than in a file of the store.
    ///
    /// Every fragment it spreads must be defined in `text`.
    pub fn from_source(client: &str, operation: &str, text: &str) -> Result<Self> {
        let path = PathBuf::from(format!("<{}>", file_name(operation)));

        compose(client, operation, Source::parse(&path, text)?, &InlineOnly)
    }

    /// Canonical operation name, e.g. `Metaphysics__Artist`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Declared variables, in declaration order.
    pub fn variables(&self) -> &[VariableDefinition] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDefinition> {
        self.variables.iter().find(|variable| variable.name == name)
    }

    /// Canonical names of the fragments appended to the operation, in the order they're printed.
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn to_query_string(&self) -> &str {
        &self.query
    }
}

impl fmt::Display for OperationDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query)
    }
}

struct InlineOnly;

impl FragmentLocator for InlineOnly {
    fn locate_fragment(&self, _: &str, _: &str, _: &[Source]) -> Result<Option<Source>> {
        Ok(None)
    }
}

/// Call descriptor of an operation, as enumerated from a client's directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub name: String,
    pub method_name: String,
    pub kind: OperationKind,
    pub variables: Vec<VariableDefinition>,
}

impl OperationDescriptor {
    pub(crate) fn new(method_name: String, document: &OperationDocument) -> Self {
        OperationDescriptor {
            name: document.name.clone(),
            method_name,
            kind: document.kind,
            variables: document.variables.clone(),
        }
    }
}
