//! Exam service boundary.
//!
//! Implemented by `examkit-client` over HTTP, and by fakes in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::encoder::SubmissionPayload;
use crate::model::{Exam, SectionKind};

// ---------------------------------------------------------------------------
// Exam API trait
// ---------------------------------------------------------------------------

/// Remote operations a session needs.
#[async_trait]
pub trait ExamApi: Send + Sync {
    /// Human-readable backend name (e.g. "http").
    fn name(&self) -> &str;

    /// `GET /exams/{id}?questions=true[&section=..][&sid=..]`.
    async fn fetch_exam(&self, request: &FetchExamRequest) -> anyhow::Result<Exam>;

    /// `POST /exams/{id}/start`.
    async fn start_session(
        &self,
        exam_id: &str,
        section: Option<SectionKind>,
    ) -> anyhow::Result<StartSessionResponse>;

    /// `POST /exams/sessions/{session_id}/submit`.
    async fn submit(
        &self,
        session_id: &str,
        payload: &SubmissionPayload,
    ) -> anyhow::Result<SubmitResponse>;
}

/// Parameters of an exam fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchExamRequest {
    pub exam_id: String,
    /// Restrict the payload to one section.
    #[serde(default)]
    pub section: Option<SectionKind>,
    /// Ticket session id; authorises question visibility without a login.
    #[serde(default)]
    pub sid: Option<String>,
}

impl FetchExamRequest {
    pub fn new(exam_id: impl Into<String>) -> Self {
        Self {
            exam_id: exam_id.into(),
            section: None,
            sid: None,
        }
    }

    /// Query pairs in wire order.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("questions", "true".to_string())];
        if let Some(section) = self.section {
            query.push(("section", section.to_string()));
        }
        if let Some(sid) = &self.sid {
            query.push(("sid", sid.clone()));
        }
        query
    }
}

/// Body of the session-start call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartSessionBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub session_id: String,
}

/// Server acknowledgement of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Result id, when the server assigns one separately from the session.
    #[serde(default, alias = "id")]
    pub result_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl SubmitResponse {
    /// Id to redirect to: the result id, else the session id, else the
    /// session we submitted.
    pub fn redirect_id<'a>(&'a self, submitted: &'a str) -> &'a str {
        self.result_id
            .as_deref()
            .or(self.session_id.as_deref())
            .unwrap_or(submitted)
    }

    pub fn results_path(&self, submitted: &str) -> String {
        format!("/results/{}", self.redirect_id(submitted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_query_includes_optional_params() {
        let mut request = FetchExamRequest::new("e1");
        assert_eq!(request.query(), vec![("questions", "true".to_string())]);
        request.section = Some(SectionKind::Listening);
        request.sid = Some("abc".into());
        assert_eq!(
            request.query(),
            vec![
                ("questions", "true".to_string()),
                ("section", "listening".to_string()),
                ("sid", "abc".to_string()),
            ]
        );
    }

    #[test]
    fn redirect_prefers_result_id() {
        let response: SubmitResponse =
            serde_json::from_value(serde_json::json!({"id": "r9", "sessionId": "s1"})).unwrap();
        assert_eq!(response.results_path("s0"), "/results/r9");

        let response: SubmitResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(response.results_path("s0"), "/results/s0");
    }

    #[test]
    fn start_body_omits_missing_section() {
        let body = serde_json::to_value(StartSessionBody::default()).unwrap();
        assert_eq!(body, serde_json::json!({}));
    }
}
