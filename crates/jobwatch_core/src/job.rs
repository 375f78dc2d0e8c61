use serde::{Deserialize, Serialize};

/// Stable job identity: the marketplace ciphertext when present, else the numeric id.
pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BudgetKind {
    Hourly,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    #[serde(rename = "type")]
    pub kind: BudgetKind,
    pub currency_code: String,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub payment_verification_status: Option<String>,
    pub country: Option<String>,
    pub total_spent: Option<f64>,
    pub rating: Option<f64>,
}

impl Client {
    pub fn is_payment_verified(&self) -> bool {
        self.payment_verification_status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case("VERIFIED"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
}

/// A normalized job posting. Immutable once mapped from the API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub ciphertext: Option<String>,
    pub title: String,
    pub description: String,
    pub posted_on: Option<String>,
    pub applied: bool,
    pub budget: Option<Budget>,
    pub client: Client,
    pub skills: Vec<Skill>,
}

impl Job {
    /// Picks the stable identity: ciphertext first, numeric id as fallback.
    pub fn derive_id(ciphertext: Option<&str>, numeric_id: Option<&str>) -> Option<JobId> {
        ciphertext
            .filter(|c| !c.trim().is_empty())
            .or(numeric_id.filter(|n| !n.trim().is_empty()))
            .map(|id| id.trim().to_string())
    }

    /// Path of the job page relative to the marketplace site root.
    pub fn page_path(&self) -> String {
        match self.ciphertext.as_deref() {
            Some(ciphertext) => format!("/jobs/{ciphertext}"),
            None => format!("/jobs/~{}", self.id),
        }
    }
}

/// A job plus the annotations the filter pipeline attaches to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedJob {
    #[serde(flatten)]
    pub job: Job,
    pub is_excluded_by_title_filter: bool,
    pub is_low_priority_by_skill: bool,
    pub is_low_priority_by_client_country: bool,
}

impl ProcessedJob {
    pub fn unannotated(job: Job) -> Self {
        Self {
            job,
            is_excluded_by_title_filter: false,
            is_low_priority_by_skill: false,
            is_low_priority_by_client_country: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.job.id
    }

    /// True when any filter rule matched.
    pub fn is_annotated(&self) -> bool {
        self.is_excluded_by_title_filter
            || self.is_low_priority_by_skill
            || self.is_low_priority_by_client_country
    }

    /// Fresh, unfiltered and not yet applied to.
    pub fn is_notifiable(&self) -> bool {
        !self.is_annotated() && !self.job.applied
    }
}
