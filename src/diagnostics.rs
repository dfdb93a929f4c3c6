use crate::language::errors::SyntaxError;
use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic, Clone)]
#[error("{message}")]
pub struct SyntaxDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    message: String,
}

impl SyntaxDiagnostic {
    pub fn from_error(src: NamedSource<String>, error: SyntaxError) -> Self {
        Self {
            src,
            span: error.to_source_span(),
            help: error.help.clone(),
            message: error.message.clone(),
        }
    }
}

pub fn emit_syntax_errors(path: &Path, source: &str, errors: &[SyntaxError]) {
    let src = NamedSource::new(path.display().to_string(), source.to_string());
    for error in errors {
        let diagnostic = SyntaxDiagnostic::from_error(src.clone(), error.clone());
        eprintln!("{:?}", Report::new(diagnostic));
    }
}

pub fn report_io_error(path: &Path, error: &std::io::Error) {
    eprintln!("Failed to access {}: {}", path.display(), error);
}
