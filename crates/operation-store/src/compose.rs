use std::{
    fmt::{self, Write},
    path::{Path, PathBuf},
};

use cynic_parser::{
    common::OperationType,
    executable::{iter::Iter, Directive, FragmentDefinition, Selection},
    ExecutableDocument,
};

use crate::{
    document::{OperationDocument, OperationKind, TypeRef, VariableDefinition},
    naming::{canonical_name, short_name},
    Error, Result,
};

/// A parsed `.graphql` file.
pub(crate) struct Source {
    pub path: PathBuf,
    pub document: ExecutableDocument,
}

impl Source {
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let document = cynic_parser::parse_executable_document(text).map_err(|error| Error::Parse {
            path: path.to_owned(),
            message: error.to_string(),
        })?;

        Ok(Source {
            path: path.to_owned(),
            document,
        })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;

        Self::parse(path, &text)
    }

    pub fn fragment(&self, client: &str, name: &str) -> Option<FragmentDefinition<'_>> {
        self.document
            .fragments()
            .find(|fragment| short_name(client, fragment.name()) == name)
    }
}

/// Finds fragments which aren't defined in the operation's own file.
pub(crate) trait FragmentLocator {
    fn locate_fragment(&self, client: &str, name: &str, loaded: &[Source]) -> Result<Option<Source>>;
}

/// Renames the single operation of `source` and appends every fragment it needs.
///
/// Fragments are appended in the order they're first spread, depth first, each exactly once.
pub(crate) fn compose(
    client: &str,
    operation_name: &str,
    source: Source,
    locator: &dyn FragmentLocator,
) -> Result<OperationDocument> {
    let (kind, variables, spreads) = {
        let mut operations = source.document.operations();

        let Some(operation) = operations.next() else {
            return Err(Error::MissingOperation { path: source.path });
        };

        if operations.next().is_some() {
            return Err(Error::MultipleOperations { path: source.path });
        }

        let kind = operation_kind(operation.operation_type());

        let variables = operation
            .variable_definitions()
            .map(|variable| {
                let ty = variable
                    .ty()
                    .to_string()
                    .parse::<TypeRef>()
                    .map_err(|message| Error::Parse {
                        path: source.path.clone(),
                        message,
                    })?;

                Ok(VariableDefinition {
                    name: variable.name().to_owned(),
                    ty,
                    has_default: variable.default_value().is_some(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut spreads = Vec::new();
        collect_spreads(client, operation.selection_set(), &mut spreads);

        (kind, variables, spreads)
    };

    let mut collector = FragmentCollector {
        client,
        locator,
        sources: vec![source],
        order: Vec::new(),
    };

    collector.visit(spreads, &mut Vec::new())?;

    let FragmentCollector { sources, order, .. } = collector;
    let name = canonical_name(client, operation_name);
    let query = Printer::new(client).print(&name, &sources, &order);

    let fragments = order
        .iter()
        .map(|(fragment, _)| canonical_name(client, fragment))
        .collect();

    let path = sources
        .into_iter()
        .next()
        .map(|source| source.path)
        .unwrap_or_default();

    Ok(OperationDocument {
        name,
        kind,
        variables,
        fragments,
        path,
        query,
    })
}

fn operation_kind(operation_type: OperationType) -> OperationKind {
    match operation_type {
        OperationType::Query => OperationKind::Query,
        OperationType::Mutation => OperationKind::Mutation,
        OperationType::Subscription => OperationKind::Subscription,
    }
}

struct FragmentCollector<'a> {
    client: &'a str,
    locator: &'a dyn FragmentLocator,
    /// The operation's file comes first, then every file a fragment was found in.
    sources: Vec<Source>,
    /// Short fragment names in emission order, with the index of the source defining them.
    order: Vec<(String, usize)>,
}

impl FragmentCollector<'_> {
    fn visit(&mut self, spreads: Vec<String>, stack: &mut Vec<String>) -> Result<()> {
        for fragment in spreads {
            if stack.contains(&fragment) {
                return Err(Error::FragmentCycle {
                    fragment: canonical_name(self.client, &fragment),
                    path: self.sources[0].path.clone(),
                });
            }

            if self.order.iter().any(|(name, _)| *name == fragment) {
                continue;
            }

            let index = self.locate(&fragment)?;
            self.order.push((fragment.clone(), index));

            let mut nested = Vec::new();
            if let Some(definition) = self.sources[index].fragment(self.client, &fragment) {
                collect_spreads(self.client, definition.selection_set(), &mut nested);
            }

            stack.push(fragment);
            self.visit(nested, stack)?;
            stack.pop();
        }

        Ok(())
    }

    fn locate(&mut self, fragment: &str) -> Result<usize> {
        if let Some(index) = self
            .sources
            .iter()
            .position(|source| source.fragment(self.client, fragment).is_some())
        {
            return Ok(index);
        }

        match self.locator.locate_fragment(self.client, fragment, &self.sources)? {
            Some(source) => {
                tracing::debug!(fragment, path = %source.path.display(), "located GraphQL fragment");
                self.sources.push(source);
                Ok(self.sources.len() - 1)
            }
            None => Err(Error::FragmentNotFound {
                fragment: canonical_name(self.client, fragment),
                path: self.sources[0].path.clone(),
            }),
        }
    }
}

fn collect_spreads(client: &str, selections: Iter<'_, Selection<'_>>, spreads: &mut Vec<String>) {
    for selection in selections {
        match selection {
            Selection::Field(field) => collect_spreads(client, field.selection_set(), spreads),
            Selection::InlineFragment(fragment) => collect_spreads(client, fragment.selection_set(), spreads),
            Selection::FragmentSpread(spread) => spreads.push(short_name(client, spread.fragment_name()).to_owned()),
        }
    }
}

macro_rules! write_indent {
    ($f:expr, $level:expr) => {
        write!($f, "{:indent$}", "", indent = $level * 2)
    };
}

/// Prints the canonical query string: two space indentation, the operation first, then each
/// fragment separated by an empty line.
struct Printer<'a> {
    client: &'a str,
    out: String,
}

impl<'a> Printer<'a> {
    fn new(client: &'a str) -> Self {
        Printer {
            client,
            out: String::new(),
        }
    }

    fn print(mut self, name: &str, sources: &[Source], fragments: &[(String, usize)]) -> String {
        // Writing into a String can't fail.
        let _ = self.document(name, sources, fragments);
        self.out
    }

    fn document(&mut self, name: &str, sources: &[Source], fragments: &[(String, usize)]) -> fmt::Result {
        if let Some(operation) = sources[0].document.operations().next() {
            write!(self.out, "{} {name}", operation_kind(operation.operation_type()))?;

            let variables = operation
                .variable_definitions()
                .map(|variable| variable.to_string())
                .collect::<Vec<_>>();

            if !variables.is_empty() {
                write!(self.out, "({})", variables.join(", "))?;
            }

            self.directives(operation.directives())?;
            self.out.push(' ');
            self.selection_set(operation.selection_set(), 0)?;
        }

        for (fragment, index) in fragments {
            let Some(definition) = sources[*index].fragment(self.client, fragment) else {
                continue;
            };

            write!(
                self.out,
                "\n\nfragment {} on {}",
                canonical_name(self.client, fragment),
                definition.type_condition()
            )?;
            self.directives(definition.directives())?;
            self.out.push(' ');
            self.selection_set(definition.selection_set(), 0)?;
        }

        Ok(())
    }

    fn selection_set(&mut self, selections: Iter<'_, Selection<'_>>, level: usize) -> fmt::Result {
        writeln!(self.out, "{{")?;

        for selection in selections {
            write_indent!(self.out, level + 1)?;

            match selection {
                Selection::Field(field) => {
                    if let Some(alias) = field.alias() {
                        write!(self.out, "{alias}: ")?;
                    }

                    write!(self.out, "{}{}", field.name(), field.arguments())?;
                    self.directives(field.directives())?;

                    let nested = field.selection_set();
                    if nested.len() != 0 {
                        self.out.push(' ');
                        self.selection_set(nested, level + 1)?;
                    }
                }
                Selection::InlineFragment(fragment) => {
                    self.out.push_str("...");

                    if let Some(on_type) = fragment.type_condition() {
                        write!(self.out, " on {on_type}")?;
                    }

                    self.directives(fragment.directives())?;
                    self.out.push(' ');
                    self.selection_set(fragment.selection_set(), level + 1)?;
                }
                Selection::FragmentSpread(spread) => {
                    let fragment = short_name(self.client, spread.fragment_name());
                    write!(self.out, "...{}", canonical_name(self.client, fragment))?;
                    self.directives(spread.directives())?;
                }
            }

            self.out.push('\n');
        }

        write_indent!(self.out, level)?;
        self.out.push('}');

        Ok(())
    }

    fn directives(&mut self, directives: Iter<'_, Directive<'_>>) -> fmt::Result {
        for directive in directives {
            write!(self.out, " @{}{}", directive.name(), directive.arguments())?;
        }

        Ok(())
    }
}
