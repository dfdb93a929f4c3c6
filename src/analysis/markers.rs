//! Test harness mapping `/*N*/` cursor markers to tree nodes. A marker sits
//! immediately before an identifier token; the first occurrence of a marker
//! number names the definition, later ones its usages.

use crate::language::{token::Tag, tree::NodeId};
use crate::workspace::Document;
use std::collections::HashMap;

pub struct Marker {
    pub definition: NodeId,
    pub usages: Vec<NodeId>,
}

pub fn markers(document: &Document) -> HashMap<String, Marker> {
    let parsed = document.parse_tree();
    let source = document.source();
    let mut out: HashMap<String, Marker> = HashMap::new();
    for span in &parsed.ignored {
        let text = span.text(source);
        let Some(number) = text
            .strip_prefix("/*")
            .and_then(|rest| rest.strip_suffix("*/"))
        else {
            continue;
        };
        if number.is_empty() || !number.bytes().all(|byte| byte.is_ascii_digit()) {
            continue;
        }
        let Some(node) = identifier_at(document, span.end) else {
            panic!("marker /*{number}*/ is not followed by an identifier");
        };
        match out.entry(number.to_string()) {
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(Marker {
                    definition: node,
                    usages: Vec::new(),
                });
            }
            std::collections::hash_map::Entry::Occupied(mut entry) => {
                let marker = entry.get_mut();
                assert!(marker.usages.len() < 4, "marker /*{number}*/ used too often");
                marker.usages.push(node);
            }
        }
    }
    out
}

fn identifier_at(document: &Document, offset: usize) -> Option<NodeId> {
    let tree = document.tree();
    tree.node_ids()
        .find(|&node| tree.tag(node) == Tag::Identifier && tree.span(node).start == offset)
}
