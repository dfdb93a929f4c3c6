mod backend;
mod diagnostics;
mod hover;
mod text;

use std::error::Error;
use tower_lsp_server::{LspService, Server};

/// Serves the language server over stdin/stdout, blocking until the client
/// disconnects. Resolution work is synchronous per request, so a
/// single-threaded runtime is all the transport needs.
pub fn serve_stdio() -> Result<(), Box<dyn Error + Send + Sync>> {
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    runtime.block_on(async {
        let (service, socket) = LspService::new(backend::Backend::new);
        Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
            .serve(service)
            .await;
        Ok(())
    })
}
