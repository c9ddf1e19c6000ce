//! In-memory exam service for tests and offline runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use examkit_core::api::{ExamApi, FetchExamRequest, StartSessionResponse, SubmitResponse};
use examkit_core::encoder::SubmissionPayload;
use examkit_core::model::{Exam, SectionKind};

use crate::error::ClientError;

/// A mock exam service serving exams from memory.
///
/// Sessions get fresh UUIDs; submissions are recorded for inspection.
pub struct MockExamApi {
    /// Exams keyed by id.
    exams: HashMap<String, Exam>,
    /// Submissions to fail before accepting one.
    failing_submits: AtomicU32,
    /// Number of sessions started.
    start_count: AtomicU32,
    /// Submissions received, with their session id.
    submissions: Mutex<Vec<(String, SubmissionPayload)>>,
}

impl MockExamApi {
    pub fn new(exams: impl IntoIterator<Item = Exam>) -> Self {
        Self {
            exams: exams.into_iter().map(|e| (e.id.clone(), e)).collect(),
            failing_submits: AtomicU32::new(0),
            start_count: AtomicU32::new(0),
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next `n` submissions with a server error.
    pub fn with_failing_submits(self, n: u32) -> Self {
        self.failing_submits.store(n, Ordering::Relaxed);
        self
    }

    pub fn start_count(&self) -> u32 {
        self.start_count.load(Ordering::Relaxed)
    }

    pub fn submissions(&self) -> Vec<(String, SubmissionPayload)> {
        self.submissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn exam(&self, id: &str) -> Result<&Exam, ClientError> {
        self.exams
            .get(id)
            .ok_or_else(|| ClientError::NotFound(format!("exam {id}")))
    }
}

#[async_trait]
impl ExamApi for MockExamApi {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_exam(&self, request: &FetchExamRequest) -> anyhow::Result<Exam> {
        let mut exam = self.exam(&request.exam_id)?.clone();
        if let Some(kind) = request.section {
            exam.sections.retain(|s| s.kind == kind);
        }
        Ok(exam)
    }

    async fn start_session(
        &self,
        exam_id: &str,
        _section: Option<SectionKind>,
    ) -> anyhow::Result<StartSessionResponse> {
        self.exam(exam_id)?;
        self.start_count.fetch_add(1, Ordering::Relaxed);
        Ok(StartSessionResponse {
            session_id: Uuid::new_v4().to_string(),
        })
    }

    async fn submit(
        &self,
        session_id: &str,
        payload: &SubmissionPayload,
    ) -> anyhow::Result<SubmitResponse> {
        let failed = self
            .failing_submits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ClientError::Server {
                status: 503,
                message: "submission unavailable".into(),
            }
            .into());
        }

        self.submissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((session_id.to_string(), payload.clone()));
        Ok(SubmitResponse {
            result_id: Some(Uuid::new_v4().to_string()),
            session_id: Some(session_id.to_string()),
        })
    }
}
