use crate::language::parser::{parse, ParsedTree};
use crate::language::tree::Tree;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp_server::lsp_types::Uri;

/// One open shader source. The parse tree is built on construction, so a
/// `Document` handed to the analysis layer always carries one; replacing the
/// text means replacing the whole document.
#[derive(Debug)]
pub struct Document {
    uri: Uri,
    source: String,
    parsed: ParsedTree,
}

impl Document {
    pub fn new(uri: Uri, source: String) -> Self {
        let parsed = parse(&source);
        Self {
            uri,
            source,
            parsed,
        }
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn parse_tree(&self) -> &ParsedTree {
        &self.parsed
    }

    pub fn tree(&self) -> &Tree {
        &self.parsed.tree
    }
}

/// The open-document table shared by the LSP backend. Documents are
/// immutable once inserted; an edit swaps in a freshly parsed `Document`, so
/// in-flight resolutions keep working against the snapshot they cloned out.
#[derive(Default)]
pub struct Workspace {
    documents: RwLock<HashMap<Uri, Arc<Document>>>,
}

impl Workspace {
    pub async fn open(&self, uri: Uri, source: String) -> Arc<Document> {
        let document = Arc::new(Document::new(uri.clone(), source));
        self.documents
            .write()
            .await
            .insert(uri, Arc::clone(&document));
        document
    }

    pub async fn close(&self, uri: &Uri) {
        self.documents.write().await.remove(uri);
    }

    pub async fn get(&self, uri: &Uri) -> Option<Arc<Document>> {
        self.documents.read().await.get(uri).cloned()
    }

    pub async fn snapshot(&self) -> Vec<Arc<Document>> {
        self.documents.read().await.values().cloned().collect()
    }
}
