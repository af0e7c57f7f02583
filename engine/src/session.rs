//! Submission lifecycle of the console session.
//!
//! The session holds the input buffer, the output text, and the phase of
//! the single submission. `Loading` owns the in-flight task handle, so a
//! session cannot be loading without a request behind it, and a second
//! request cannot start while one is outstanding.

use std::fmt;
use std::mem;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};

use cmdpad_client::{AnalysisService, AnalyzeError};
use cmdpad_types::{ContentType, NonEmptyString, Phase, Severity};

use crate::editor::Editor;
use crate::notifications::NotificationManager;

const SUCCESS_MESSAGE: &str = "Execution completed successfully";
const CLEARED_MESSAGE: &str = "Fields cleared successfully";

/// Description used for every non-2xx answer from the service.
const STATUS_DESCRIPTION: &str = "network or server response error";

/// Errors surfaced to the user. None of them ends the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("The text area is empty. Please enter a command or load a file.")]
    EmptyInput,
    #[error("{0}")]
    NetworkOrServer(String),
    #[error("unknown error")]
    Unknown,
    #[error("Please select a text file (.txt)")]
    UnsupportedFileType(ContentType),
    #[error("Error reading file")]
    FileRead(String),
}

impl From<AnalyzeError> for SessionError {
    fn from(err: AnalyzeError) -> Self {
        match err {
            AnalyzeError::Status { .. } => SessionError::NetworkOrServer(STATUS_DESCRIPTION.into()),
            AnalyzeError::Transport(e) => SessionError::NetworkOrServer(e.to_string()),
            AnalyzeError::MalformedBody(_) => SessionError::Unknown,
        }
    }
}

impl From<JoinError> for SessionError {
    fn from(err: JoinError) -> Self {
        tracing::error!(error = %err, "Submission task died without a result");
        SessionError::Unknown
    }
}

/// Result of asking the session to submit its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A request is in flight; the phase is `Loading`.
    Started,
    /// Nothing to send. No request was made and the phase is unchanged.
    EmptyInput,
    /// A submission is already in flight.
    Busy,
}

type SubmissionResult = Result<Vec<String>, AnalyzeError>;

#[derive(Debug)]
struct PendingSubmission {
    handle: JoinHandle<SubmissionResult>,
}

#[derive(Debug, Default)]
enum SubmissionState {
    #[default]
    Idle,
    Loading(PendingSubmission),
    Succeeded,
    Failed,
}

pub struct SessionController {
    input: Editor,
    output: String,
    state: SubmissionState,
    service: Arc<dyn AnalysisService>,
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    #[must_use]
    pub fn new(service: Arc<dyn AnalysisService>) -> Self {
        Self {
            input: Editor::new(),
            output: String::new(),
            state: SubmissionState::Idle,
            service,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        match self.state {
            SubmissionState::Idle => Phase::Idle,
            SubmissionState::Loading(_) => Phase::Loading,
            SubmissionState::Succeeded => Phase::Succeeded,
            SubmissionState::Failed => Phase::Failed,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.state, SubmissionState::Loading(_))
    }

    #[must_use]
    pub fn input(&self) -> &Editor {
        &self.input
    }

    #[must_use]
    pub fn input_text(&self) -> &str {
        self.input.text()
    }

    #[must_use]
    pub fn output_text(&self) -> &str {
        &self.output
    }

    /// Editor access for typing. `None` while a submission is loading.
    pub fn input_mut(&mut self) -> Option<&mut Editor> {
        if self.is_loading() {
            None
        } else {
            Some(&mut self.input)
        }
    }

    /// Replace the whole input buffer (file load). Refused while loading.
    pub fn replace_input(&mut self, text: String) -> bool {
        match self.input_mut() {
            Some(editor) => {
                editor.set_text(text);
                true
            }
            None => false,
        }
    }

    /// Scroll the input viewport by `delta` lines. Allowed in every phase.
    pub fn scroll_input(&mut self, delta: isize, height: usize) -> Option<usize> {
        self.input.scroll_by(delta, height)
    }

    /// Bring the cursor line into a viewport of `height` rows.
    pub fn follow_input_cursor(&mut self, height: usize) -> Option<usize> {
        self.input.scroll_to_cursor(height)
    }

    /// Submit the current input to the analysis service.
    ///
    /// The request carries the input exactly as typed; trimming is only used
    /// to decide whether there is anything to send.
    pub fn submit(&mut self, notifications: &mut NotificationManager) -> SubmitOutcome {
        if !self.phase().accepts_submission() {
            tracing::debug!("Submit ignored: a submission is already running");
            return SubmitOutcome::Busy;
        }

        let command = match NonEmptyString::new(self.input.text()) {
            Ok(command) => command,
            Err(_) => {
                notifications.notify(SessionError::EmptyInput.to_string(), Severity::Error);
                return SubmitOutcome::EmptyInput;
            }
        };

        tracing::info!(bytes = command.as_str().len(), "Submitting command");
        let handle = tokio::spawn(self.service.analyze(command.into_inner()));
        self.state = SubmissionState::Loading(PendingSubmission { handle });
        SubmitOutcome::Started
    }

    /// Apply the submission outcome if the task has finished. Returns `true`
    /// when the session left `Loading`.
    pub fn poll(&mut self, notifications: &mut NotificationManager) -> bool {
        use futures_util::future::FutureExt;

        let finished = match &self.state {
            SubmissionState::Loading(pending) => pending.handle.is_finished(),
            _ => return false,
        };
        if !finished {
            return false;
        }

        let SubmissionState::Loading(mut pending) = mem::take(&mut self.state) else {
            return false;
        };

        match (&mut pending.handle).now_or_never() {
            Some(result) => {
                self.settle(result, notifications);
                true
            }
            None => {
                // is_finished() raced with the runtime; try again next tick.
                self.state = SubmissionState::Loading(pending);
                false
            }
        }
    }

    /// Wait for the in-flight submission, if any, and apply its outcome.
    pub async fn wait_for_settlement(&mut self, notifications: &mut NotificationManager) {
        let SubmissionState::Loading(pending) = &mut self.state else {
            return;
        };
        let result = (&mut pending.handle).await;
        self.settle(result, notifications);
    }

    /// Clear input and output and return to `Idle`. Refused while loading.
    pub fn reset(&mut self, notifications: &mut NotificationManager) -> bool {
        if !self.phase().accepts_submission() {
            tracing::debug!("Reset ignored: a submission is running");
            return false;
        }

        self.input.clear();
        self.output.clear();
        self.state = SubmissionState::Idle;
        notifications.notify(CLEARED_MESSAGE, Severity::Info);
        true
    }

    fn settle(
        &mut self,
        result: Result<SubmissionResult, JoinError>,
        notifications: &mut NotificationManager,
    ) {
        match result {
            Ok(Ok(lines)) => {
                tracing::info!(lines = lines.len(), "Execution completed");
                self.output = lines.join("\n");
                self.state = SubmissionState::Succeeded;
                notifications.notify(SUCCESS_MESSAGE, Severity::Success);
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Execution failed");
                self.fail(SessionError::from(e), notifications);
            }
            Err(e) => self.fail(SessionError::from(e), notifications),
        }
    }

    fn fail(&mut self, err: SessionError, notifications: &mut NotificationManager) {
        self.output = format!("Error: {err}");
        self.state = SubmissionState::Failed;
        notifications.notify(format!("Execution failed: {err}"), Severity::Error);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use futures_util::future::BoxFuture;
    use tokio::sync::oneshot;
    use tokio::task;

    use cmdpad_client::StatusCode;

    use super::*;

    /// Service that answers from a queue and records what it was sent.
    #[derive(Default)]
    struct Scripted {
        answers: Mutex<Vec<SubmissionResult>>,
        sent: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn answering(answer: SubmissionResult) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(vec![answer]),
                sent: Mutex::default(),
            })
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl AnalysisService for Scripted {
        fn analyze(&self, command: String) -> BoxFuture<'static, SubmissionResult> {
            self.sent.lock().unwrap().push(command);
            let answer = self
                .answers
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(Vec::new()));
            Box::pin(async move { answer })
        }
    }

    /// Service whose answer is released by the test.
    struct Gated(Mutex<Option<oneshot::Receiver<SubmissionResult>>>);

    impl AnalysisService for Gated {
        fn analyze(&self, _command: String) -> BoxFuture<'static, SubmissionResult> {
            let rx = self.0.lock().unwrap().take().unwrap();
            Box::pin(async move { rx.await.unwrap() })
        }
    }

    fn manager() -> NotificationManager {
        NotificationManager::new(Duration::from_secs(5))
    }

    fn session_with(service: Arc<dyn AnalysisService>, input: &str) -> SessionController {
        let mut session = SessionController::new(service);
        session.replace_input(input.to_string());
        session
    }

    fn notification(n: &NotificationManager) -> (String, Severity) {
        let current = n.current().unwrap();
        (current.text().to_string(), current.severity())
    }

    #[tokio::test]
    async fn success_joins_results_with_newlines() {
        let service = Scripted::answering(Ok(vec!["a".into(), "b".into()]));
        let mut session = session_with(service.clone(), "mkdisk -size=5");
        let mut n = manager();

        assert_eq!(session.submit(&mut n), SubmitOutcome::Started);
        assert_eq!(session.phase(), Phase::Loading);

        session.wait_for_settlement(&mut n).await;
        assert_eq!(session.output_text(), "a\nb");
        assert_eq!(session.phase(), Phase::Succeeded);
        assert_eq!(
            notification(&n),
            ("Execution completed successfully".into(), Severity::Success)
        );
        assert_eq!(service.sent(), vec!["mkdisk -size=5".to_string()]);
    }

    #[tokio::test]
    async fn input_is_sent_untrimmed() {
        let service = Scripted::answering(Ok(vec![]));
        let mut session = session_with(service.clone(), "  rep \n");
        let mut n = manager();

        session.submit(&mut n);
        session.wait_for_settlement(&mut n).await;
        assert_eq!(service.sent(), vec!["  rep \n".to_string()]);
        assert_eq!(session.output_text(), "");
    }

    #[tokio::test]
    async fn blank_input_never_reaches_the_service() {
        let service = Scripted::answering(Ok(vec!["x".into()]));
        let mut session = session_with(service.clone(), " \n\t ");
        let mut n = manager();

        assert_eq!(session.submit(&mut n), SubmitOutcome::EmptyInput);
        assert_eq!(session.phase(), Phase::Idle);
        assert!(service.sent().is_empty());
        assert_eq!(
            notification(&n),
            (
                "The text area is empty. Please enter a command or load a file.".into(),
                Severity::Error
            )
        );
    }

    #[tokio::test]
    async fn blank_input_keeps_previous_phase_and_output() {
        let service = Scripted::answering(Ok(vec!["done".into()]));
        let mut session = session_with(service, "login");
        let mut n = manager();
        session.submit(&mut n);
        session.wait_for_settlement(&mut n).await;

        session.replace_input(String::new());
        assert_eq!(session.submit(&mut n), SubmitOutcome::EmptyInput);
        assert_eq!(session.phase(), Phase::Succeeded);
        assert_eq!(session.output_text(), "done");
    }

    #[tokio::test]
    async fn status_error_uses_generic_description() {
        let service = Scripted::answering(Err(AnalyzeError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".into(),
        }));
        let mut session = session_with(service, "rep");
        let mut n = manager();

        session.submit(&mut n);
        session.wait_for_settlement(&mut n).await;
        assert_eq!(session.phase(), Phase::Failed);
        assert_eq!(
            session.output_text(),
            "Error: network or server response error"
        );
        assert_eq!(
            notification(&n),
            (
                "Execution failed: network or server response error".into(),
                Severity::Error
            )
        );
    }

    #[tokio::test]
    async fn malformed_body_is_unknown_error() {
        let service = Scripted::answering(Err(AnalyzeError::MalformedBody("eof".into())));
        let mut session = session_with(service, "rep");
        let mut n = manager();

        session.submit(&mut n);
        session.wait_for_settlement(&mut n).await;
        assert_eq!(session.phase(), Phase::Failed);
        assert_eq!(session.output_text(), "Error: unknown error");
        assert_eq!(n.current().unwrap().text(), "Execution failed: unknown error");
    }

    #[tokio::test]
    async fn loading_rejects_submit_reset_and_edits() {
        let (tx, rx) = oneshot::channel();
        let service = Arc::new(Gated(Mutex::new(Some(rx))));
        let mut session = session_with(service, "mkdir");
        let mut n = manager();

        assert_eq!(session.submit(&mut n), SubmitOutcome::Started);
        assert_eq!(session.submit(&mut n), SubmitOutcome::Busy);
        assert!(!session.reset(&mut n));
        assert!(session.input_mut().is_none());
        assert!(!session.replace_input("other".into()));
        assert!(!session.poll(&mut n));
        assert_eq!(session.input_text(), "mkdir");

        tx.send(Ok(vec!["ok".into()])).unwrap();
        session.wait_for_settlement(&mut n).await;
        assert_eq!(session.phase(), Phase::Succeeded);
        assert!(session.input_mut().is_some());
    }

    #[tokio::test]
    async fn poll_settles_finished_task() {
        let service = Scripted::answering(Ok(vec!["line".into()]));
        let mut session = session_with(service, "cat");
        let mut n = manager();

        session.submit(&mut n);
        let mut settled = false;
        for _ in 0..100 {
            task::yield_now().await;
            if session.poll(&mut n) {
                settled = true;
                break;
            }
        }
        assert!(settled);
        assert_eq!(session.output_text(), "line");
        assert!(!session.poll(&mut n));
    }

    #[tokio::test]
    async fn dead_task_is_unknown_error() {
        struct Panics;
        impl AnalysisService for Panics {
            fn analyze(&self, _command: String) -> BoxFuture<'static, SubmissionResult> {
                Box::pin(async { panic!("service crashed") })
            }
        }

        let mut session = session_with(Arc::new(Panics), "rep");
        let mut n = manager();
        session.submit(&mut n);
        session.wait_for_settlement(&mut n).await;
        assert_eq!(session.phase(), Phase::Failed);
        assert_eq!(session.output_text(), "Error: unknown error");
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let service = Scripted::answering(Err(AnalyzeError::MalformedBody(String::new())));
        let mut session = session_with(service, "rep");
        let mut n = manager();
        session.submit(&mut n);
        session.wait_for_settlement(&mut n).await;

        assert!(session.reset(&mut n));
        assert_eq!(session.input_text(), "");
        assert_eq!(session.output_text(), "");
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(
            notification(&n),
            ("Fields cleared successfully".into(), Severity::Info)
        );
    }

    #[tokio::test]
    async fn wait_without_submission_is_noop() {
        let mut session = session_with(Scripted::answering(Ok(vec![])), "x");
        let mut n = manager();
        session.wait_for_settlement(&mut n).await;
        assert_eq!(session.phase(), Phase::Idle);
        assert!(n.current().is_none());
    }

    #[test]
    fn error_messages() {
        assert_eq!(SessionError::Unknown.to_string(), "unknown error");
        assert_eq!(
            SessionError::UnsupportedFileType(ContentType::Png).to_string(),
            "Please select a text file (.txt)"
        );
        assert_eq!(
            SessionError::FileRead("denied".into()).to_string(),
            "Error reading file"
        );
        assert_eq!(
            SessionError::from(AnalyzeError::MalformedBody("x".into())),
            SessionError::Unknown
        );
    }
}
