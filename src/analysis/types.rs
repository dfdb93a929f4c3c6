use crate::analysis::scope::Reference;
use crate::language::{
    syntax::{
        AnyDeclaration, ArraySpecifier, Parameter, ParameterList, Syntax, TypeQualifierList,
        TypeSpecifier, VariableName,
    },
    token::Tag,
    tree::{NodeId, Tree},
};
use std::fmt;

/// A reconstructed declared type. Everything borrows from the parse tree at
/// rendering time; the record itself only pins down which subtrees take part.
///
/// Functions carry `qualifiers`, `specifier`, and `parameters`; a struct
/// reference carries only its `specifier`; every other declaration carries
/// `qualifiers`, `specifier`, and possibly the `arrays` of its declared name.
#[derive(Clone, Copy)]
pub struct Type {
    pub qualifiers: Option<TypeQualifierList>,
    pub specifier: Option<TypeSpecifier>,
    pub arrays: Option<ArraySpecifier>,
    pub parameters: Option<ParameterList>,
}

/// Reconstructs the declared type of a resolved reference. `None` when the
/// reference's enclosing node is not a declaration of any shape.
pub fn type_of(reference: &Reference) -> Option<Type> {
    let tree = reference.document.tree();
    let declaration = AnyDeclaration::try_extract(tree, reference.parent_declaration)?;
    Some(match declaration {
        AnyDeclaration::Function(function) => Type {
            qualifiers: function.qualifiers(tree),
            specifier: function.specifier(tree),
            arrays: None,
            parameters: function.parameters(tree),
        },
        AnyDeclaration::Struct(specifier) => Type {
            qualifiers: None,
            specifier: Some(TypeSpecifier::Struct(specifier)),
            arrays: None,
            parameters: None,
        },
        AnyDeclaration::Declaration(declaration) => Type {
            qualifiers: declaration.qualifiers(tree),
            specifier: declaration.specifier(tree),
            arrays: name_arrays(tree, reference.node),
            parameters: None,
        },
        AnyDeclaration::Parameter(parameter) => Type {
            qualifiers: parameter.qualifiers(tree),
            specifier: parameter.specifier(tree),
            arrays: name_arrays(tree, reference.node),
            parameters: None,
        },
        AnyDeclaration::Block(block) => Type {
            qualifiers: block.qualifiers(tree),
            specifier: block.specifier(tree).map(TypeSpecifier::Identifier),
            arrays: name_arrays(tree, reference.node),
            parameters: None,
        },
    })
}

/// The declared type of one parameter, as rendered inside a function type.
pub fn parameter_type(tree: &Tree, parameter: &Parameter) -> Type {
    Type {
        qualifiers: parameter.qualifiers(tree),
        specifier: parameter.specifier(tree),
        arrays: parameter.name(tree).and_then(|name| match name {
            VariableName::Array(array) => Some(array),
            VariableName::Identifier(_) => None,
        }),
        parameters: None,
    }
}

/// The array suffixes hanging off the declared name the reference points at.
fn name_arrays(tree: &Tree, node: NodeId) -> Option<ArraySpecifier> {
    let parent = tree.parent(node)?;
    match VariableName::try_extract(tree, parent)? {
        VariableName::Array(array) => Some(array),
        VariableName::Identifier(_) => None,
    }
}

impl Type {
    pub fn format<'a>(&'a self, tree: &'a Tree, source: &'a str) -> DisplayType<'a> {
        DisplayType {
            ty: self,
            tree,
            source,
        }
    }
}

/// Canonical single-line rendering: qualifiers and specifier each followed
/// by one space, array suffixes concatenated, parameter types joined with
/// `", "` inside parentheses.
pub struct DisplayType<'a> {
    ty: &'a Type,
    tree: &'a Tree,
    source: &'a str,
}

impl fmt::Display for DisplayType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.tree;
        if let Some(qualifiers) = &self.ty.qualifiers {
            write_subtree(f, tree, self.source, qualifiers.node())?;
            f.write_str(" ")?;
        }
        if let Some(specifier) = &self.ty.specifier {
            write_subtree(f, tree, self.source, specifier.node())?;
            f.write_str(" ")?;
        }
        if let Some(arrays) = &self.ty.arrays {
            for array in arrays.arrays(tree) {
                write_subtree(f, tree, self.source, array.node())?;
            }
        }
        if let Some(parameters) = &self.ty.parameters {
            f.write_str("(")?;
            let mut first = true;
            for parameter in parameters.iter(tree) {
                if !first {
                    f.write_str(", ")?;
                }
                first = false;
                let rendered = parameter_type(tree, &parameter)
                    .format(tree, self.source)
                    .to_string();
                f.write_str(rendered.trim_end())?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Single-line rendering of one subtree, for clients composing their own
/// lines (hover, completion detail).
pub fn display_node<'a>(tree: &'a Tree, source: &'a str, node: NodeId) -> DisplayNode<'a> {
    DisplayNode { tree, source, node }
}

pub struct DisplayNode<'a> {
    tree: &'a Tree,
    source: &'a str,
    node: NodeId,
}

impl fmt::Display for DisplayNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtree(f, self.tree, self.source, self.node)
    }
}

/// Renders every token under `node` in source order, single-line, with one
/// space between tokens except around tight punctuation.
fn write_subtree(
    f: &mut fmt::Formatter<'_>,
    tree: &Tree,
    source: &str,
    node: NodeId,
) -> fmt::Result {
    let mut previous = None;
    write_tokens(f, tree, source, node, &mut previous)
}

fn write_tokens(
    f: &mut fmt::Formatter<'_>,
    tree: &Tree,
    source: &str,
    node: NodeId,
    previous: &mut Option<Tag>,
) -> fmt::Result {
    let tag = tree.tag(node);
    if tag.is_token() {
        if matches!(tag, Tag::Unknown | Tag::Eof) {
            return Ok(());
        }
        if let Some(before) = *previous {
            if space_between(before, tag) {
                f.write_str(" ")?;
            }
        }
        f.write_str(tree.text_of(node, source))?;
        *previous = Some(tag);
        return Ok(());
    }
    for child in tree.children(node) {
        write_tokens(f, tree, source, child, previous)?;
    }
    Ok(())
}

fn space_between(previous: Tag, next: Tag) -> bool {
    if matches!(previous, Tag::LParen | Tag::LBracket | Tag::Dot) {
        return false;
    }
    !matches!(
        next,
        Tag::LParen | Tag::LBracket | Tag::RParen | Tag::RBracket | Tag::Comma | Tag::Semi | Tag::Dot
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::markers::markers;
    use crate::analysis::scope::find_definition;
    use crate::workspace::Document;

    fn document(source: &str) -> Document {
        Document::new("file:///shader.frag".parse().expect("uri"), source.into())
    }

    fn type_at_marker(source: &str, marker: &str) -> String {
        let doc = document(source);
        let map = markers(&doc);
        let marker = &map[marker];
        let node = *marker.usages.first().unwrap_or(&marker.definition);
        let mut references = Vec::new();
        find_definition(&doc, node, &mut references);
        let reference = references.first().expect("definition");
        let ty = type_of(reference).expect("type");
        ty.format(doc.tree(), doc.source()).to_string()
    }

    #[test]
    fn local_int_renders_with_a_trailing_space() {
        let rendered = type_at_marker("void main() { int /*1*/x = 1; /*1*/x += 2; }", "1");
        assert_eq!(rendered, "int ");
    }

    #[test]
    fn nullary_function_renders_empty_parentheses() {
        let rendered = type_at_marker("void /*0*/main() {}", "0");
        assert_eq!(rendered, "void ()");
    }

    #[test]
    fn function_parameters_render_comma_separated() {
        let rendered = type_at_marker("int /*0*/add(int x, int y) {}", "0");
        assert_eq!(rendered, "int (int, int)");
    }

    #[test]
    fn parameter_reference_reconstructs_the_parameter_type() {
        let rendered = type_at_marker("int bar(int /*1*/x) { return /*1*/x; }", "1");
        assert_eq!(rendered, "int ");
    }

    #[test]
    fn qualifiers_render_before_the_specifier() {
        let rendered = type_at_marker(
            "layout(location = 1) uniform vec4 /*1*/color; void main() { /*1*/color; }",
            "1",
        );
        assert_eq!(rendered, "layout(location = 1) uniform vec4 ");
    }

    #[test]
    fn declared_arrays_render_after_the_specifier() {
        let rendered = type_at_marker("int /*1*/values[4]; void main() { /*1*/values; }", "1");
        assert_eq!(rendered, "int [4]");
    }

    #[test]
    fn block_instance_renders_the_block_name() {
        let rendered = type_at_marker(
            "uniform MyBlock { vec4 color; } /*1*/my_block; void main() { /*1*/my_block; }",
            "1",
        );
        assert_eq!(rendered, "uniform MyBlock ");
    }

    #[test]
    fn block_field_reconstructs_from_the_field_declaration() {
        let rendered = type_at_marker(
            "uniform MyBlock { vec4 /*1*/color; } my_block; void main() { /*1*/color; }",
            "1",
        );
        assert_eq!(rendered, "vec4 ");
    }

    #[test]
    fn struct_reference_renders_the_struct_specifier() {
        let rendered = type_at_marker(
            "struct /*1*/Light { vec3 color; }; void main() { /*1*/Light probe; }",
            "1",
        );
        assert_eq!(rendered, "struct Light { vec3 color; } ");
    }

    #[test]
    fn every_definition_reference_reconstructs_to_a_type() {
        let source = "layout(location = 0) uniform vec4 tint; \
                      uniform Data { float scale; } data; \
                      struct Light { vec3 color; }; \
                      float weight(float x) { return x; } \
                      void main() { float local = weight(1.0); local; tint; scale; data; }";
        let doc = document(source);
        let tree = doc.tree();
        for node in tree.node_ids() {
            if tree.tag(node) != Tag::Identifier {
                continue;
            }
            let mut references = Vec::new();
            find_definition(&doc, node, &mut references);
            for reference in &references {
                assert!(
                    type_of(reference).is_some(),
                    "no type for `{}`",
                    reference.name()
                );
            }
        }
    }

    #[test]
    fn formatting_is_idempotent() {
        let source = "layout(location = 1) uniform vec4 /*1*/color; void main() { /*1*/color; }";
        let doc = document(source);
        let map = markers(&doc);
        let marker = &map["1"];
        let mut references = Vec::new();
        find_definition(&doc, marker.usages[0], &mut references);
        let ty = type_of(&references[0]).expect("type");
        let first = ty.format(doc.tree(), doc.source()).to_string();
        let second = ty.format(doc.tree(), doc.source()).to_string();
        assert_eq!(first, second);
    }
}
