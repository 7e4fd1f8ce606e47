//! Main event loop for the LSP server.
//!
//! Notifications are handled synchronously — edits must apply in receipt
//! order before anything else runs. Requests capture an immutable world
//! snapshot and run against it; a recompilation publishing mid-request
//! never affects a request that already captured its snapshot.

use crate::config::Config;
use crate::handlers::completion::handle_completion;
use crate::handlers::definition::handle_goto_definition;
use crate::handlers::diagnostics::to_lsp_diagnostics;
use crate::handlers::hover::handle_hover;
use crate::handlers::references::handle_references;
use crate::handlers::rename::handle_rename;
use crate::handlers::signature_help::handle_signature_help;
use crate::handlers::symbols::handle_document_symbols;
use crate::handlers::type_definition::handle_goto_type_definition;
use crate::handlers::workspace_symbols::handle_workspace_symbols;
use crate::session::{Session, WorldSnapshot};
use crossbeam_channel::{Receiver, Sender};
use lsp_types::notification::{
    DidChangeConfiguration, DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument,
    Notification, PublishDiagnostics, ShowMessage,
};
use lsp_types::request::{
    Completion, DocumentSymbolRequest, GotoDefinition, GotoTypeDefinition, HoverRequest,
    References, Rename, Request, Shutdown, SignatureHelpRequest, WorkspaceSymbolRequest,
};
use lsp_types::{MessageType, PublishDiagnosticsParams, ShowMessageParams, Uri};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Convert a URI to a file path.
#[cfg(not(windows))]
pub(crate) fn uri_to_path(uri: &Uri) -> Option<PathBuf> {
    uri.as_str().strip_prefix("file://").map(PathBuf::from)
}

/// Convert a URI to a file path (Windows version).
#[cfg(windows)]
pub(crate) fn uri_to_path(uri: &Uri) -> Option<PathBuf> {
    uri.as_str()
        .strip_prefix("file://")
        // Handle Windows paths like file:///C:/...
        .map(|p| p.strip_prefix('/').unwrap_or(p))
        .map(PathBuf::from)
}

/// State managed by the main loop.
pub struct MainLoopState {
    /// The analysis session behind every request.
    session: Arc<Session>,
    /// Sender for outgoing LSP messages.
    sender: Sender<lsp_server::Message>,
    /// Workspace root for dependency import.
    workspace_root: Option<PathBuf>,
    /// Files with currently published diagnostics, so files leaving the
    /// open set get theirs cleared.
    published: HashSet<String>,
    /// Whether shutdown was requested.
    shutdown_requested: bool,
}

impl MainLoopState {
    /// Create a new main loop state.
    pub fn new(
        session: Arc<Session>,
        sender: Sender<lsp_server::Message>,
        workspace_root: Option<PathBuf>,
    ) -> Self {
        Self {
            session,
            sender,
            workspace_root,
            published: HashSet::new(),
            shutdown_requested: false,
        }
    }

    /// Handle one incoming LSP message.
    pub fn handle_message(&mut self, msg: lsp_server::Message) {
        match msg {
            lsp_server::Message::Request(req) => self.handle_request(req),
            lsp_server::Message::Notification(notif) => self.handle_notification(notif),
            lsp_server::Message::Response(_) => {
                // We don't currently send requests to the client.
            }
        }
    }

    /// Handle an LSP request (expects a response).
    fn handle_request(&mut self, req: lsp_server::Request) {
        let id = req.id.clone();

        let result = match req.method.as_str() {
            Shutdown::METHOD => {
                self.shutdown_requested = true;
                Ok(serde_json::Value::Null)
            }
            Completion::METHOD => self.dispatch(req, handle_completion),
            HoverRequest::METHOD => self.dispatch(req, handle_hover),
            GotoDefinition::METHOD => self.dispatch(req, handle_goto_definition),
            GotoTypeDefinition::METHOD => self.dispatch(req, handle_goto_type_definition),
            References::METHOD => self.dispatch(req, handle_references),
            Rename::METHOD => self.dispatch(req, handle_rename),
            SignatureHelpRequest::METHOD => self.dispatch(req, handle_signature_help),
            DocumentSymbolRequest::METHOD => self.dispatch(req, handle_document_symbols),
            WorkspaceSymbolRequest::METHOD => self.dispatch(req, handle_workspace_symbols),
            _ => {
                tracing::warn!("Unhandled request: {}", req.method);
                Err(format!("Unhandled request: {}", req.method))
            }
        };

        let response = match result {
            Ok(value) => lsp_server::Response::new_ok(id, value),
            Err(msg) => {
                let error_code = if msg.starts_with("Unhandled request") {
                    lsp_server::ErrorCode::MethodNotFound
                } else {
                    lsp_server::ErrorCode::InternalError
                };
                lsp_server::Response::new_err(id, error_code as i32, msg)
            }
        };

        self.send(lsp_server::Message::Response(response));
    }

    /// Decode params, capture a world snapshot, run one provider.
    fn dispatch<P, R>(
        &self,
        req: lsp_server::Request,
        handler: fn(&P, &WorldSnapshot) -> Option<R>,
    ) -> Result<serde_json::Value, String>
    where
        P: serde::de::DeserializeOwned,
        R: serde::Serialize,
    {
        let params: P = serde_json::from_value(req.params).map_err(|e| e.to_string())?;
        let snapshot = self.session.snapshot();
        let response = handler(&params, &snapshot);
        serde_json::to_value(response).map_err(|e| e.to_string())
    }

    /// Handle an LSP notification (no response expected).
    fn handle_notification(&mut self, notif: lsp_server::Notification) {
        match notif.method.as_str() {
            DidOpenTextDocument::METHOD => {
                if let Ok(params) =
                    serde_json::from_value::<lsp_types::DidOpenTextDocumentParams>(notif.params)
                {
                    self.session
                        .open_document(params.text_document.uri.as_str(), &params.text_document.text);
                    self.after_mutation();
                }
            }
            DidChangeTextDocument::METHOD => {
                if let Ok(params) =
                    serde_json::from_value::<lsp_types::DidChangeTextDocumentParams>(notif.params)
                {
                    // Full sync: the last change carries the full content.
                    if let Some(change) = params.content_changes.into_iter().last() {
                        self.session
                            .change_document(params.text_document.uri.as_str(), &change.text);
                        self.after_mutation();
                    }
                }
            }
            DidCloseTextDocument::METHOD => {
                if let Ok(params) =
                    serde_json::from_value::<lsp_types::DidCloseTextDocumentParams>(notif.params)
                {
                    self.session
                        .close_document(params.text_document.uri.as_str());
                    self.after_mutation();
                }
            }
            DidChangeConfiguration::METHOD => {
                if let Ok(params) =
                    serde_json::from_value::<lsp_types::DidChangeConfigurationParams>(notif.params)
                {
                    let config = Config::from_settings(&params.settings);
                    tracing::info!(?config, "configuration changed");
                    self.session.set_config(config);
                    self.import_dependencies();
                }
            }
            "initialized" => {
                tracing::info!("Client initialized");
                self.import_dependencies();
            }
            "exit" => {
                tracing::info!("Exit notification received");
                std::process::exit(i32::from(!self.shutdown_requested));
            }
            _ => {
                tracing::debug!("Unhandled notification: {}", notif.method);
            }
        }
    }

    /// Kick off a background dependency import for the workspace root.
    fn import_dependencies(&self) {
        if !self.session.resolver_active() {
            return;
        }
        if let Some(root) = &self.workspace_root {
            Arc::clone(&self.session).import_dependencies(root.clone());
        }
    }

    /// Publish diagnostics and surface pending warnings after a
    /// document or classpath mutation.
    fn after_mutation(&mut self) {
        self.publish_diagnostics();
        self.surface_warnings();
    }

    /// Publish the current generation's diagnostics, clearing files that
    /// left the open set.
    fn publish_diagnostics(&mut self) {
        let snapshot = self.session.snapshot();

        let mut current = HashSet::new();
        for (uri, record) in snapshot.generation.files() {
            current.insert(uri.to_string());
            self.send_diagnostics(uri, to_lsp_diagnostics(&record.diagnostics));
        }

        let stale: Vec<String> = self.published.difference(&current).cloned().collect();
        for uri in stale {
            self.send_diagnostics(&uri, vec![]);
        }
        self.published = current;
    }

    /// Send diagnostics for one file.
    fn send_diagnostics(&self, uri: &str, diagnostics: Vec<lsp_types::Diagnostic>) {
        let Ok(uri) = uri.parse::<Uri>() else {
            return;
        };
        tracing::debug!(
            "Publishing {} diagnostics for {}",
            diagnostics.len(),
            uri.as_str()
        );
        let params = PublishDiagnosticsParams {
            uri,
            diagnostics,
            version: None,
        };
        let notif = lsp_server::Notification::new(PublishDiagnostics::METHOD.to_string(), params);
        self.send(lsp_server::Message::Notification(notif));
    }

    /// Surface one-time session warnings as `window/showMessage`.
    fn surface_warnings(&self) {
        for message in self.session.take_warnings() {
            let params = ShowMessageParams {
                typ: MessageType::WARNING,
                message,
            };
            let notif = lsp_server::Notification::new(ShowMessage::METHOD.to_string(), params);
            self.send(lsp_server::Message::Notification(notif));
        }
    }

    /// Send a message to the client.
    fn send(&self, msg: lsp_server::Message) {
        if let Err(e) = self.sender.send(msg) {
            tracing::error!("Failed to send message: {}", e);
        }
    }
}

/// Run the main event loop until the client disconnects.
pub fn run_main_loop(
    receiver: Receiver<lsp_server::Message>,
    sender: Sender<lsp_server::Message>,
    session: Arc<Session>,
    workspace_root: Option<PathBuf>,
) {
    let mut state = MainLoopState::new(session, sender, workspace_root);

    tracing::info!("Main loop started");

    for msg in receiver {
        state.handle_message(msg);
    }

    tracing::info!("Main loop ended");
}
