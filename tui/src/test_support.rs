//! Analysis services for render and input tests.

use std::sync::Arc;

use cmdpad_engine::{AnalysisService, AnalyzeError, App, Settings};
use futures_util::future::{self, BoxFuture, FutureExt};

/// Answers every command with the same lines.
pub(crate) struct FixedLines(pub(crate) Vec<&'static str>);

impl AnalysisService for FixedLines {
    fn analyze(&self, _command: String) -> BoxFuture<'static, Result<Vec<String>, AnalyzeError>> {
        let lines = self.0.iter().map(|line| (*line).to_string()).collect();
        future::ready(Ok(lines)).boxed()
    }
}

/// Never answers, so a submission stays loading.
pub(crate) struct NeverAnswers;

impl AnalysisService for NeverAnswers {
    fn analyze(&self, _command: String) -> BoxFuture<'static, Result<Vec<String>, AnalyzeError>> {
        future::pending().boxed()
    }
}

pub(crate) fn app_with(settings: &Settings, service: impl AnalysisService + 'static) -> App {
    App::with_service(settings, Arc::new(service))
}
