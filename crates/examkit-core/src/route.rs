//! Session routing parameters.
//!
//! A ticket link such as `https://host/exams/e1/take?section=listening&sid=abc`
//! names the exam in its path and carries the section and session id in the
//! query.

use std::fmt;

use url::Url;

use crate::api::FetchExamRequest;
use crate::error::SessionError;
use crate::model::SectionKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRoute {
    pub exam_id: String,
    pub section: Option<SectionKind>,
    /// Existing session to resume instead of starting a new one.
    pub sid: Option<String>,
}

impl SessionRoute {
    pub fn new(exam_id: impl Into<String>) -> Self {
        Self {
            exam_id: exam_id.into(),
            section: None,
            sid: None,
        }
    }

    pub fn with_section(mut self, section: SectionKind) -> Self {
        self.section = Some(section);
        self
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    /// Parse an absolute URL or a path with query (`/exams/e1?sid=abc`).
    ///
    /// The exam id is the path segment after `exams`, or the last segment
    /// when there is none.
    pub fn parse(input: &str) -> Result<Self, SessionError> {
        let url = match Url::parse(input) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://localhost/")
                .and_then(|base| base.join(input))
                .map_err(|e| SessionError::InvalidRoute(format!("{input}: {e}")))?,
            Err(e) => return Err(SessionError::InvalidRoute(format!("{input}: {e}"))),
        };

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let exam_id = segments
            .iter()
            .position(|seg| *seg == "exams")
            .and_then(|i| segments.get(i + 1))
            .or(segments.last())
            .filter(|id| **id != "exams")
            .ok_or_else(|| SessionError::InvalidRoute(format!("{input}: no exam id in path")))?;

        let mut route = SessionRoute::new(*exam_id);
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "section" if !value.is_empty() => {
                    let section = value
                        .parse::<SectionKind>()
                        .map_err(SessionError::InvalidRoute)?;
                    route.section = Some(section);
                }
                "sid" if !value.is_empty() => route.sid = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(route)
    }

    pub fn fetch_request(&self) -> FetchExamRequest {
        FetchExamRequest {
            exam_id: self.exam_id.clone(),
            section: self.section,
            sid: self.sid.clone(),
        }
    }
}

impl fmt::Display for SessionRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/exams/{}", self.exam_id)?;
        let mut sep = '?';
        if let Some(section) = self.section {
            write!(f, "{sep}section={section}")?;
            sep = '&';
        }
        if let Some(sid) = &self.sid {
            write!(f, "{sep}sid={sid}")?;
        }
        Ok(())
    }
}
