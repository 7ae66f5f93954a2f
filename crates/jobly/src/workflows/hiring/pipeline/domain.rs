use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Employer organization whose jobs and applicants are isolated from other employers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(pub String);

/// Team member acting on behalf of a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for a pipeline card (one application record).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

/// Identifier wrapper for a posted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Stable stage identifier such as `new` or `interview`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StageId(pub String);

impl StageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Explicit caller identity threaded into every load and move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant_id: TenantId,
    user_id: UserId,
}

impl TenantContext {
    pub fn new(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self, ContextError> {
        let tenant_id = tenant_id.into();
        let user_id = user_id.into();

        if tenant_id.trim().is_empty() {
            return Err(ContextError::MissingTenant);
        }
        if user_id.trim().is_empty() {
            return Err(ContextError::MissingUser);
        }

        Ok(Self {
            tenant_id: TenantId(tenant_id),
            user_id: UserId(user_id),
        })
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("tenant identity is required")]
    MissingTenant,
    #[error("user identity is required")]
    MissingUser,
}

/// Scope of a board load: every job the tenant posted, or a single one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobFilter {
    #[default]
    All,
    Job(JobId),
}

impl JobFilter {
    /// Parse the `job` query parameter; absent, blank, or `all` selects every job.
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::All,
            Some(value) if value.eq_ignore_ascii_case("all") => Self::All,
            Some(value) => Self::Job(JobId(value.to_string())),
        }
    }

    pub fn as_query(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Job(job) => Some(job.0.as_str()),
        }
    }

    pub fn admits(&self, job: &JobId) -> bool {
        match self {
            Self::All => true,
            Self::Job(wanted) => wanted == job,
        }
    }
}

/// Named bucket in the hiring funnel. Configuration, never created by the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub label: String,
    pub color: String,
}

impl Stage {
    pub fn new(id: &str, label: &str, color: &str) -> Self {
        Self {
            id: StageId::new(id),
            label: label.to_string(),
            color: color.to_string(),
        }
    }
}

/// Default funnel used when a tenant has not customized its stages.
pub struct StageCatalog;

impl StageCatalog {
    pub fn standard() -> Vec<Stage> {
        vec![
            Stage::new("new", "New", "blue"),
            Stage::new("reviewing", "Reviewing", "yellow"),
            Stage::new("shortlisted", "Shortlisted", "purple"),
            Stage::new("interview", "Interview", "indigo"),
            Stage::new("offered", "Offered", "orange"),
            Stage::new("hired", "Hired", "green"),
            Stage::new("rejected", "Rejected", "red"),
        ]
    }
}

/// Public-facing candidate details shown on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReference {
    pub id: JobId,
    pub title: String,
    pub company: String,
}

/// Job picker entry returned alongside a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: JobId,
    pub title: String,
    pub applicant_count: u32,
}

/// Projection of an application record as held on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantCard {
    pub id: ApplicantId,
    pub candidate: CandidateSummary,
    pub job: JobReference,
    pub status: StageId,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicantCard {
    /// Case-insensitive match against candidate name, email, or job title.
    /// `needle` must already be trimmed and lowercased.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }

        [
            self.candidate.name.as_str(),
            self.candidate.email.as_str(),
            self.job.title.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}
