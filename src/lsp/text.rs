use crate::language::{span::Span, token::Tag, tree::{NodeId, Tree}};
use tower_lsp_server::lsp_types::{Position, Range};

pub fn offset_to_position(text: &str, offset: usize) -> Position {
    let mut line = 0u32;
    let mut col = 0u32;
    for (idx, ch) in text.char_indices() {
        if idx >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    Position::new(line, col)
}

pub fn position_to_offset(text: &str, position: Position) -> usize {
    let mut offset = 0usize;
    for (current_line, line) in text.split_inclusive('\n').enumerate() {
        let current_line: u32 = current_line.try_into().unwrap_or(u32::MAX);
        if current_line == position.line {
            let mut col_bytes = 0usize;
            for ch in line.chars().take(position.character as usize) {
                col_bytes += ch.len_utf8();
            }
            return offset + col_bytes;
        }
        offset += line.len();
    }
    text.len()
}

pub fn span_to_range(text: &str, span: Span) -> Range {
    Range {
        start: offset_to_position(text, span.start.min(text.len())),
        end: offset_to_position(text, span.end.min(text.len())),
    }
}

/// The identifier token under the cursor. A cursor sitting just past the
/// last character still counts as being on the identifier.
pub fn identifier_at(tree: &Tree, offset: usize) -> Option<NodeId> {
    let node = tree
        .token_at_offset(offset)
        .or_else(|| tree.token_at_offset(offset.checked_sub(1)?))?;
    (tree.tag(node) == Tag::Identifier).then_some(node)
}

/// The nearest token ending at or before `offset`, used to anchor
/// completion requests between tokens.
pub fn token_before(tree: &Tree, offset: usize) -> Option<NodeId> {
    if let Some(node) = tree.token_at_offset(offset) {
        return Some(node);
    }
    tree.node_ids()
        .filter(|&node| tree.tag(node).is_token() && tree.tag(node) != Tag::Eof)
        .filter(|&node| tree.span(node).end <= offset)
        .max_by_key(|&node| tree.span(node).end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::parser::parse;

    #[test]
    fn positions_round_trip_through_offsets() {
        let text = "void main() {\n    int x = 1;\n}\n";
        let offset = text.find('x').expect("x");
        let position = offset_to_position(text, offset);
        assert_eq!(position, Position::new(1, 8));
        assert_eq!(position_to_offset(text, position), offset);
    }

    #[test]
    fn position_past_the_end_clamps_to_text_length() {
        let text = "int x;";
        assert_eq!(position_to_offset(text, Position::new(5, 0)), text.len());
    }

    #[test]
    fn identifier_lookup_accepts_the_trailing_cursor() {
        let text = "int abc;";
        let parsed = parse(text);
        let start = text.find("abc").expect("abc");
        let inside = identifier_at(&parsed.tree, start + 1);
        let trailing = identifier_at(&parsed.tree, start + 3);
        assert!(inside.is_some());
        assert_eq!(inside, trailing);
        assert!(identifier_at(&parsed.tree, 0).is_some());
    }

    #[test]
    fn token_before_falls_back_to_the_previous_token() {
        let text = "int x = ";
        let parsed = parse(text);
        let node = token_before(&parsed.tree, text.len()).expect("token");
        assert_eq!(parsed.tree.tag(node), Tag::Eq);
    }
}
