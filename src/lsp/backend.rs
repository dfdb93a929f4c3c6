use super::diagnostics::syntax_diagnostics;
use super::hover::hover_for_reference;
use super::text::{identifier_at, position_to_offset, span_to_range, token_before};
use crate::analysis::scope::{
    find_definition, find_definition_across, visible_symbols, Reference,
};
use crate::analysis::types::type_of;
use crate::language::syntax::{ExternalDeclaration, File, Syntax, TypeSpecifier};
use crate::language::token::Tag;
use crate::workspace::{Document, Workspace};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp_server::jsonrpc::Result as RpcResult;
use tower_lsp_server::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionOptions, CompletionParams, CompletionResponse,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DocumentSymbolParams, DocumentSymbolResponse, GotoDefinitionParams, GotoDefinitionResponse,
    Hover, HoverParams, HoverProviderCapability, InitializeParams, InitializeResult,
    InitializedParams, Location, MessageType, OneOf, Position, ReferenceParams,
    ServerCapabilities, SymbolInformation, SymbolKind, TextDocumentSyncCapability,
    TextDocumentSyncKind, Uri,
};
use tower_lsp_server::{Client, LanguageServer};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Look up unresolved identifiers in other open documents' globals.
    pub cross_document: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cross_document: true,
        }
    }
}

pub struct Backend {
    client: Client,
    workspace: Workspace,
    config: RwLock<ServerConfig>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            workspace: Workspace::default(),
            config: RwLock::new(ServerConfig::default()),
        }
    }

    async fn update_document(&self, uri: Uri, text: String) {
        let document = self.workspace.open(uri.clone(), text).await;
        let diagnostics = syntax_diagnostics(&document);
        self.client
            .publish_diagnostics(uri, diagnostics, None)
            .await;
    }

    async fn document_at(
        &self,
        uri: &Uri,
        position: Position,
    ) -> Option<(Arc<Document>, usize)> {
        let document = self.workspace.get(uri).await?;
        let offset = position_to_offset(document.source(), position);
        Some((document, offset))
    }

    async fn resolution_context(&self, uri: &Uri) -> Vec<Arc<Document>> {
        if self.config.read().await.cross_document {
            self.workspace.snapshot().await
        } else {
            Vec::new()
        }
    }
}

fn reference_location(reference: &Reference) -> Location {
    Location {
        uri: reference.document.uri().clone(),
        range: span_to_range(reference.document.source(), reference.span()),
    }
}

fn completion_items(document: &Document, offset: usize) -> Vec<CompletionItem> {
    let tree = document.tree();
    let Some(anchor) = token_before(tree, offset) else {
        return Vec::new();
    };
    let mut symbols = Vec::new();
    visible_symbols(document, anchor, &mut symbols);
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for symbol in &symbols {
        let name = symbol.name();
        if !seen.insert(name.to_string()) {
            continue;
        }
        let Some(ty) = type_of(symbol) else {
            continue;
        };
        let kind = if ty.parameters.is_some() {
            CompletionItemKind::FUNCTION
        } else if matches!(ty.specifier, Some(TypeSpecifier::Struct(_))) {
            CompletionItemKind::STRUCT
        } else {
            CompletionItemKind::VARIABLE
        };
        items.push(CompletionItem {
            label: name.to_string(),
            kind: Some(kind),
            detail: Some(ty.format(tree, document.source()).to_string()),
            ..Default::default()
        });
    }
    items
}

fn document_symbols(document: &Document) -> Vec<SymbolInformation> {
    let tree = document.tree();
    let source = document.source();
    let mut symbols = Vec::new();
    let mut push = |name: &str, node, kind| {
        #[allow(deprecated)]
        symbols.push(SymbolInformation {
            name: name.to_string(),
            kind,
            tags: None,
            deprecated: None,
            location: Location {
                uri: document.uri().clone(),
                range: span_to_range(source, tree.span(node)),
            },
            container_name: None,
        });
    };
    let Some(file) = File::try_extract(tree, tree.root()) else {
        return symbols;
    };
    for declaration in file.iter(tree) {
        match declaration {
            ExternalDeclaration::Function(function) => {
                if let Some(name) = function.name(tree) {
                    push(name.text(source, tree), name.node(), SymbolKind::FUNCTION);
                }
            }
            ExternalDeclaration::Declaration(declaration) => {
                if let Some(TypeSpecifier::Struct(specifier)) = declaration.specifier(tree) {
                    if let Some(name) = specifier.name(tree) {
                        push(name.text(source, tree), name.node(), SymbolKind::STRUCT);
                    }
                }
                if let Some(variables) = declaration.variables(tree) {
                    for variable in variables.iter(tree) {
                        if let Some(name) =
                            variable.name(tree).and_then(|name| name.identifier(tree))
                        {
                            push(name.text(source, tree), name.node(), SymbolKind::VARIABLE);
                        }
                    }
                }
            }
            ExternalDeclaration::Block(block) => {
                if let Some(name) = block.specifier(tree) {
                    push(name.text(source, tree), name.node(), SymbolKind::STRUCT);
                }
                if let Some(name) = block.variable(tree).and_then(|name| name.identifier(tree)) {
                    push(name.text(source, tree), name.node(), SymbolKind::VARIABLE);
                }
            }
        }
    }
    symbols
}

fn reference_locations(
    document: &Document,
    target: u32,
    include_declaration: bool,
) -> Vec<Location> {
    let tree = document.tree();
    let mut locations = Vec::new();
    for candidate in tree.node_ids() {
        if tree.tag(candidate) != Tag::Identifier {
            continue;
        }
        if candidate == target {
            if include_declaration {
                locations.push(Location {
                    uri: document.uri().clone(),
                    range: span_to_range(document.source(), tree.span(candidate)),
                });
            }
            continue;
        }
        let mut references = Vec::new();
        find_definition(document, candidate, &mut references);
        if references.first().map(|reference| reference.node) == Some(target) {
            locations.push(Location {
                uri: document.uri().clone(),
                range: span_to_range(document.source(), tree.span(candidate)),
            });
        }
    }
    locations
}

impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> RpcResult<InitializeResult> {
        if let Some(options) = params.initialization_options {
            if let Ok(config) = serde_json::from_value::<ServerConfig>(options) {
                *self.config.write().await = config;
            }
        }
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                definition_provider: Some(OneOf::Left(true)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                references_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                completion_provider: Some(CompletionOptions::default()),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let _ = self
            .client
            .log_message(MessageType::INFO, "shade-lang LSP ready")
            .await;
    }

    async fn shutdown(&self) -> RpcResult<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.update_document(params.text_document.uri, params.text_document.text)
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        if let Some(change) = params.content_changes.into_iter().last() {
            self.update_document(params.text_document.uri, change.text)
                .await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.workspace.close(&params.text_document.uri).await;
        self.client
            .publish_diagnostics(params.text_document.uri, vec![], None)
            .await;
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> RpcResult<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some((document, offset)) = self.document_at(&uri, position).await else {
            return Ok(None);
        };
        let Some(node) = identifier_at(document.tree(), offset) else {
            return Ok(None);
        };
        let others = self.resolution_context(&uri).await;
        let mut references = Vec::new();
        find_definition_across(&document, &others, node, &mut references);
        Ok(references
            .first()
            .map(|reference| GotoDefinitionResponse::Scalar(reference_location(reference))))
    }

    async fn hover(&self, params: HoverParams) -> RpcResult<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some((document, offset)) = self.document_at(&uri, position).await else {
            return Ok(None);
        };
        let Some(node) = identifier_at(document.tree(), offset) else {
            return Ok(None);
        };
        let others = self.resolution_context(&uri).await;
        let mut references = Vec::new();
        find_definition_across(&document, &others, node, &mut references);
        let Some(reference) = references.first() else {
            return Ok(None);
        };
        let Some(ty) = type_of(reference) else {
            return Ok(None);
        };
        let mut hover = hover_for_reference(reference, &ty);
        hover.range = Some(span_to_range(
            document.source(),
            document.tree().span(node),
        ));
        Ok(Some(hover))
    }

    async fn completion(
        &self,
        params: CompletionParams,
    ) -> RpcResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let Some((document, offset)) = self.document_at(&uri, position).await else {
            return Ok(None);
        };
        let items = completion_items(&document, offset);
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn references(&self, params: ReferenceParams) -> RpcResult<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let Some((document, offset)) = self.document_at(&uri, position).await else {
            return Ok(None);
        };
        let Some(node) = identifier_at(document.tree(), offset) else {
            return Ok(None);
        };
        let mut definitions = Vec::new();
        find_definition(&document, node, &mut definitions);
        let target = definitions
            .first()
            .map(|reference| reference.node)
            .unwrap_or(node);
        let locations =
            reference_locations(&document, target, params.context.include_declaration);
        Ok((!locations.is_empty()).then_some(locations))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> RpcResult<Option<DocumentSymbolResponse>> {
        let Some(document) = self.workspace.get(&params.text_document.uri).await else {
            return Ok(None);
        };
        let symbols = document_symbols(&document);
        Ok(Some(DocumentSymbolResponse::Flat(symbols)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(source: &str) -> Document {
        Document::new("file:///shader.frag".parse().expect("uri"), source.into())
    }

    #[test]
    fn completion_offers_visible_symbols_with_rendered_types() {
        let source = "uniform vec4 tint; void main() { int local = 1;  }";
        let doc = document(source);
        let offset = source.rfind(' ').expect("offset inside the block");
        let items = completion_items(&doc, offset);
        let tint = items.iter().find(|item| item.label == "tint").expect("tint");
        assert_eq!(tint.kind, Some(CompletionItemKind::VARIABLE));
        assert_eq!(tint.detail.as_deref(), Some("uniform vec4 "));
        let main = items.iter().find(|item| item.label == "main").expect("main");
        assert_eq!(main.kind, Some(CompletionItemKind::FUNCTION));
        assert!(items.iter().any(|item| item.label == "local"));
    }

    #[test]
    fn completion_deduplicates_shadowed_names_keeping_the_innermost() {
        let source = "int value; void main() { float value = 2.0;  }";
        let doc = document(source);
        let offset = source.rfind(' ').expect("offset inside the block");
        let items = completion_items(&doc, offset);
        let values: Vec<_> = items.iter().filter(|item| item.label == "value").collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].detail.as_deref(), Some("float "));
    }

    #[test]
    fn document_symbols_list_file_scope_declarations() {
        let source =
            "uniform vec4 tint; struct Light { vec3 color; }; void main() {} uniform Data { float t; } data;";
        let doc = document(source);
        let symbols = document_symbols(&doc);
        let names: Vec<_> = symbols.iter().map(|symbol| symbol.name.as_str()).collect();
        assert_eq!(names, vec!["tint", "Light", "main", "Data", "data"]);
        assert_eq!(symbols[2].kind, SymbolKind::FUNCTION);
        assert_eq!(symbols[1].kind, SymbolKind::STRUCT);
    }

    #[test]
    fn reference_scan_finds_usages_and_optionally_the_declaration() {
        let source = "void main() { int count = 0; count += 1; count += 2; }";
        let doc = document(source);
        let tree = doc.tree();
        let declaration = tree
            .token_at_offset(source.find("count").expect("declaration"))
            .expect("node");
        let with_declaration = reference_locations(&doc, declaration, true);
        let without_declaration = reference_locations(&doc, declaration, false);
        assert_eq!(with_declaration.len(), 3);
        assert_eq!(without_declaration.len(), 2);
    }
}
