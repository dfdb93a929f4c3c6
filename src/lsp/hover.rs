use crate::analysis::scope::Reference;
use crate::analysis::types::{display_node, parameter_type, Type};
use crate::language::syntax::Syntax;
use tower_lsp_server::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind};

/// Renders a resolved reference as `qualifiers specifier name[arrays]` or
/// `specifier name(parameters)` inside a fenced code block.
pub fn hover_for_reference(reference: &Reference, ty: &Type) -> Hover {
    let tree = reference.document.tree();
    let source = reference.document.source();
    let mut line = String::new();
    if let Some(qualifiers) = &ty.qualifiers {
        line.push_str(&display_node(tree, source, qualifiers.node()).to_string());
        line.push(' ');
    }
    if let Some(specifier) = &ty.specifier {
        line.push_str(&display_node(tree, source, specifier.node()).to_string());
        line.push(' ');
    }
    line.push_str(reference.name());
    if let Some(arrays) = &ty.arrays {
        for array in arrays.arrays(tree) {
            line.push_str(&display_node(tree, source, array.node()).to_string());
        }
    }
    if let Some(parameters) = &ty.parameters {
        line.push('(');
        let mut first = true;
        for parameter in parameters.iter(tree) {
            if !first {
                line.push_str(", ");
            }
            first = false;
            let rendered = parameter_type(tree, &parameter).format(tree, source).to_string();
            line.push_str(rendered.trim_end());
        }
        line.push(')');
    }
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: format!("```glsl\n{line}\n```"),
        }),
        range: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scope::find_definition;
    use crate::analysis::types::type_of;
    use crate::workspace::Document;

    fn hover_line(source: &str, name: &str) -> String {
        let document = Document::new("file:///shader.frag".parse().expect("uri"), source.into());
        let tree = document.tree();
        let offset = source.rfind(name).expect("usage");
        let node = tree.token_at_offset(offset).expect("node");
        let mut references = Vec::new();
        find_definition(&document, node, &mut references);
        let reference = references.first().expect("definition");
        let ty = type_of(reference).expect("type");
        let hover = hover_for_reference(reference, &ty);
        match hover.contents {
            HoverContents::Markup(content) => content.value,
            _ => unreachable!(),
        }
    }

    #[test]
    fn variable_hover_shows_qualifiers_type_and_name() {
        let value = hover_line("uniform vec4 tint; void main() { tint; }", "tint");
        assert_eq!(value, "```glsl\nuniform vec4 tint\n```");
    }

    #[test]
    fn function_hover_shows_the_signature() {
        let value = hover_line("int add(int x, int y) { return x; } void main() { add(1, 2); }", "add");
        assert_eq!(value, "```glsl\nint add(int, int)\n```");
    }

    #[test]
    fn array_hover_keeps_the_dimensions_on_the_name() {
        let value = hover_line("float weights[3]; void main() { weights; }", "weights");
        assert_eq!(value, "```glsl\nfloat weights[3]\n```");
    }
}
