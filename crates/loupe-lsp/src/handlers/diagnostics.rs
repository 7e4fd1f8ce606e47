//! Conversion of analysis diagnostics to LSP diagnostics.

use super::utils::to_lsp_range;
use loupe_core::{Diagnostic, Severity};
use lsp_types::DiagnosticSeverity;

/// Convert one file's diagnostics for publication.
pub fn to_lsp_diagnostics(diagnostics: &[Diagnostic]) -> Vec<lsp_types::Diagnostic> {
    diagnostics
        .iter()
        .map(|diag| lsp_types::Diagnostic {
            range: to_lsp_range(diag.range),
            severity: Some(severity(diag.severity)),
            source: Some("loupe".to_string()),
            message: diag.message.clone(),
            ..Default::default()
        })
        .collect()
}

fn severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Information => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}
