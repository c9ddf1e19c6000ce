//! HTTP implementation of the exam service boundary.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::instrument;

use examkit_core::api::{
    ExamApi, FetchExamRequest, StartSessionBody, StartSessionResponse, SubmitResponse,
};
use examkit_core::encoder::SubmissionPayload;
use examkit_core::model::{Exam, SectionKind};

use crate::config::ExamkitConfig;
use crate::error::ClientError;

/// Exam service client over HTTP.
pub struct HttpExamApi {
    base_url: String,
    token: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpExamApi {
    pub fn new(base_url: &str, token: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            timeout_secs,
            client,
        })
    }

    pub fn from_config(config: &ExamkitConfig) -> anyhow::Result<Self> {
        Self::new(&config.base_url, config.token.clone(), config.timeout_secs)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ClientError> {
        let response = self.authorize(request).send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(self.timeout_secs)
            } else {
                ClientError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status, "exam service returned an error");
            return Err(ClientError::from_status(status, body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ExamApi for HttpExamApi {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, request), fields(exam = %request.exam_id))]
    async fn fetch_exam(&self, request: &FetchExamRequest) -> anyhow::Result<Exam> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/exams/{}", self.base_url, request.exam_id),
            request.query(),
        )?;
        let exam = self.send(self.client.get(url)).await?;
        Ok(exam)
    }

    #[instrument(skip(self))]
    async fn start_session(
        &self,
        exam_id: &str,
        section: Option<SectionKind>,
    ) -> anyhow::Result<StartSessionResponse> {
        let url = format!("{}/exams/{exam_id}/start", self.base_url);
        let body = StartSessionBody { section };
        let started = self.send(self.client.post(url).json(&body)).await?;
        Ok(started)
    }

    #[instrument(skip(self, payload), fields(answers = payload.answers.len()))]
    async fn submit(
        &self,
        session_id: &str,
        payload: &SubmissionPayload,
    ) -> anyhow::Result<SubmitResponse> {
        let url = format!("{}/exams/sessions/{session_id}/submit", self.base_url);
        let response = self.send(self.client.post(url).json(payload)).await?;
        Ok(response)
    }
}
