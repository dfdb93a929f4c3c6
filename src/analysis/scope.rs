use crate::language::{
    span::Span,
    syntax::{Syntax, VariableName},
    token::Tag,
    tree::{NodeId, Tree},
};
use crate::workspace::Document;
use std::sync::Arc;

/// An occurrence of a declared name: the declaring identifier token plus the
/// enclosing declaration node the type reconstructor dispatches on. Borrows
/// from the document it was found in.
#[derive(Clone, Copy)]
pub struct Reference<'a> {
    pub document: &'a Document,
    pub node: NodeId,
    pub parent_declaration: NodeId,
}

impl<'a> Reference<'a> {
    pub fn name(&self) -> &'a str {
        self.document
            .tree()
            .text_of(self.node, self.document.source())
    }

    pub fn span(&self) -> Span {
        self.document.tree().span(self.node)
    }
}

#[derive(Clone, Copy)]
struct VisibleOptions {
    check_children: bool,
    parent_declaration: Option<NodeId>,
}

/// Collects the symbols visible at `node`, innermost scope first and in
/// reverse source order within each scope.
///
/// The walk ascends the ancestor chain; at every level it visits the
/// siblings lexically before the node it came from, except at file scope,
/// where all top-level declarations are visible regardless of order.
pub fn visible_symbols<'a>(
    document: &'a Document,
    node: NodeId,
    symbols: &mut Vec<Reference<'a>>,
) {
    let tree = document.tree();
    let mut current = node;
    while let Some(parent) = tree.parent(current) {
        let children = tree.children(parent);
        let at_file_scope = tree.tag(parent) == Tag::File;
        let mut index = if at_file_scope { children.end } else { current };
        while index > children.start {
            index -= 1;
            find_visible_symbols(
                document,
                tree,
                index,
                symbols,
                VisibleOptions {
                    check_children: !at_file_scope,
                    parent_declaration: None,
                },
            );
        }
        current = parent;
    }
}

/// The file-scope symbols of `document`, used for cross-document lookup.
pub fn global_symbols<'a>(document: &'a Document, symbols: &mut Vec<Reference<'a>>) {
    let tree = document.tree();
    let children = tree.children(tree.root());
    let mut index = children.end;
    while index > children.start {
        index -= 1;
        find_visible_symbols(
            document,
            tree,
            index,
            symbols,
            VisibleOptions {
                check_children: false,
                parent_declaration: None,
            },
        );
    }
}

fn find_visible_symbols<'a>(
    document: &'a Document,
    tree: &Tree,
    index: NodeId,
    symbols: &mut Vec<Reference<'a>>,
    options: VisibleOptions,
) {
    let tag = tree.tag(index);
    if matches!(tag, Tag::Block | Tag::Statement) {
        // Inner scopes; their declarations are not visible from outside.
        return;
    }
    if tag.is_token() {
        return;
    }
    // Interface-block fields become globally visible names, so descending
    // into a block declaration turns field lists back on.
    let check_children = options.check_children || tag == Tag::BlockDeclaration;
    let declares_names = matches!(
        tag,
        Tag::FunctionDeclaration
            | Tag::StructSpecifier
            | Tag::VariableDeclaration
            | Tag::Parameter
            | Tag::BlockDeclaration
    );
    let children = tree.children(index);
    let mut child = children.end;
    while child > children.start {
        child -= 1;
        if declares_names {
            if let Some(name) = VariableName::try_extract(tree, child) {
                if let Some(identifier) = name.identifier(tree) {
                    symbols.push(Reference {
                        document,
                        node: identifier.node(),
                        parent_declaration: options.parent_declaration.unwrap_or(index),
                    });
                }
                continue;
            }
        }
        let child_tag = tree.tag(child);
        if !check_children && matches!(child_tag, Tag::ParameterList | Tag::FieldDeclarationList) {
            // Parameters and struct fields stay scoped to their owning
            // declaration when collecting from an outer scope.
            continue;
        }
        find_visible_symbols(
            document,
            tree,
            child,
            symbols,
            VisibleOptions {
                check_children,
                parent_declaration: match child_tag {
                    Tag::Declaration
                    | Tag::Parameter
                    | Tag::FunctionDeclaration
                    | Tag::BlockDeclaration
                    | Tag::StructSpecifier => Some(child),
                    _ => options.parent_declaration,
                },
            },
        );
    }
}

/// Appends the declarations of the identifier at `node`, innermost first.
/// Empty output when the node is not an identifier or nothing is in scope.
pub fn find_definition<'a>(
    document: &'a Document,
    node: NodeId,
    references: &mut Vec<Reference<'a>>,
) {
    let tree = document.tree();
    if tree.tag(node) != Tag::Identifier {
        return;
    }
    let name = tree.text_of(node, document.source());
    let mut symbols = Vec::new();
    visible_symbols(document, node, &mut symbols);
    for symbol in symbols {
        if symbol.document.tree().tag(symbol.node) == Tag::Identifier && symbol.name() == name {
            references.push(symbol);
        }
    }
}

/// `find_definition`, falling back to the global scopes of the other open
/// documents when the owning document has no candidate.
pub fn find_definition_across<'a>(
    document: &'a Document,
    others: &'a [Arc<Document>],
    node: NodeId,
    references: &mut Vec<Reference<'a>>,
) {
    find_definition(document, node, references);
    if !references.is_empty() {
        return;
    }
    let tree = document.tree();
    if tree.tag(node) != Tag::Identifier {
        return;
    }
    let name = tree.text_of(node, document.source());
    for other in others {
        if other.uri() == document.uri() {
            continue;
        }
        let mut globals = Vec::new();
        global_symbols(other, &mut globals);
        references.extend(globals.into_iter().filter(|symbol| {
            symbol.document.tree().tag(symbol.node) == Tag::Identifier && symbol.name() == name
        }));
    }
}
