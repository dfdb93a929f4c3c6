use super::text::span_to_range;
use crate::workspace::Document;
use serde_json::json;
use tower_lsp_server::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString};

/// Parse errors of one document as publishable diagnostics.
pub fn syntax_diagnostics(document: &Document) -> Vec<Diagnostic> {
    document
        .parse_tree()
        .errors
        .iter()
        .map(|error| Diagnostic {
            range: span_to_range(document.source(), error.span),
            severity: Some(DiagnosticSeverity::ERROR),
            code: Some(NumberOrString::String("syntax".into())),
            source: Some("shade-lang".into()),
            message: error.message.clone(),
            data: error.help.as_ref().map(|help| json!({ "help": help })),
            ..Default::default()
        })
        .collect()
}
