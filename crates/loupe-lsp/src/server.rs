//! LSP server entry points.

use crate::config::Config;
use crate::main_loop::{run_main_loop, uri_to_path};
use crate::session::Session;
use loupe_core::{DependencyResolver, FrontEnd};
use lsp_server::Connection;
use lsp_types::InitializeParams;
use std::path::PathBuf;
use std::sync::Arc;

/// The LSP server.
pub struct Server {
    /// Connection to the LSP client.
    connection: Connection,
    /// Initialize parameters from the client.
    init_params: InitializeParams,
    /// The analysis session.
    session: Arc<Session>,
}

impl Server {
    /// Create a server from an established connection.
    pub fn new(connection: Connection, init_params: InitializeParams, session: Arc<Session>) -> Self {
        Self {
            connection,
            init_params,
            session,
        }
    }

    /// Run the server's main loop.
    pub fn run(self) {
        tracing::info!("Starting Loupe Language Server v{}", crate::VERSION);

        let workspace_root = workspace_root(&self.init_params);
        if let Some(root) = &workspace_root {
            tracing::info!("Workspace root: {}", root.display());
        }

        let (sender, receiver) = (self.connection.sender, self.connection.receiver);
        run_main_loop(receiver, sender, self.session, workspace_root);

        tracing::info!("Server shutdown complete");
    }
}

/// The workspace root from initialize params: first workspace folder,
/// falling back to the legacy root URI.
#[allow(deprecated)] // InitializeParams::root_uri is the legacy fallback
fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    if let Some(folders) = &params.workspace_folders {
        if let Some(folder) = folders.first() {
            return uri_to_path(&folder.uri);
        }
    }
    params.root_uri.as_ref().and_then(uri_to_path)
}

/// Initialize tracing to stderr; stdout carries the protocol stream.
///
/// Call once at process startup, before [`start_stdio`]. Respects
/// `RUST_LOG`, defaulting this crate to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("loupe_lsp=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Start the LSP server on stdio with the given external collaborators.
pub fn start_stdio(
    front_end: Arc<dyn FrontEnd>,
    resolver: Option<Arc<dyn DependencyResolver>>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing::info!("Starting LSP server on stdio");

    let (connection, io_threads) = Connection::stdio();

    // Wait for the initialize request.
    let (id, params) = connection.initialize_start()?;
    let init_params: InitializeParams = serde_json::from_value(params)?;

    let capabilities = lsp_types::ServerCapabilities {
        text_document_sync: Some(lsp_types::TextDocumentSyncCapability::Kind(
            lsp_types::TextDocumentSyncKind::FULL,
        )),
        completion_provider: Some(lsp_types::CompletionOptions {
            trigger_characters: Some(vec![".".to_string()]),
            ..Default::default()
        }),
        signature_help_provider: Some(lsp_types::SignatureHelpOptions {
            trigger_characters: Some(vec!["(".to_string(), ",".to_string()]),
            ..Default::default()
        }),
        hover_provider: Some(lsp_types::HoverProviderCapability::Simple(true)),
        definition_provider: Some(lsp_types::OneOf::Left(true)),
        type_definition_provider: Some(lsp_types::TypeDefinitionProviderCapability::Simple(true)),
        references_provider: Some(lsp_types::OneOf::Left(true)),
        rename_provider: Some(lsp_types::OneOf::Left(true)),
        document_symbol_provider: Some(lsp_types::OneOf::Left(true)),
        workspace_symbol_provider: Some(lsp_types::OneOf::Left(true)),
        ..Default::default()
    };

    let init_result = lsp_types::InitializeResult {
        capabilities,
        server_info: Some(lsp_types::ServerInfo {
            name: "loupe-lsp".to_string(),
            version: Some(crate::VERSION.to_string()),
        }),
    };

    connection.initialize_finish(id, serde_json::to_value(init_result)?)?;

    tracing::info!("LSP initialized successfully");

    let session = Arc::new(Session::new(front_end, resolver, config));
    let server = Server::new(connection, init_params, session);
    server.run();

    io_threads.join()?;

    Ok(())
}
