use serde::Serialize;

use crate::budget::{format_budget, format_total_spent};
use crate::{JobId, ProcessedJob};

/// Payload handed to UI surfaces: the status line and the job cards.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchViewModel {
    pub status: String,
    pub last_check: Option<String>,
    pub new_jobs_in_last_run: usize,
    pub jobs: Vec<JobCardView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCardView {
    pub id: JobId,
    pub title: String,
    pub page_path: String,
    pub budget: String,
    pub client_country: Option<String>,
    pub client_spent: String,
    pub client_rating: Option<f64>,
    pub payment_verified: bool,
    pub posted_on: Option<String>,
    pub skills: Vec<String>,
    pub applied: bool,
    pub collapsed: bool,
    pub excluded_by_title: bool,
    pub low_priority: bool,
}

impl JobCardView {
    pub fn new(processed: &ProcessedJob, collapsed: bool) -> Self {
        let job = &processed.job;
        Self {
            id: job.id.clone(),
            title: job.title.clone(),
            page_path: job.page_path(),
            budget: format_budget(job.budget.as_ref()),
            client_country: job.client.country.clone(),
            client_spent: format_total_spent(job.client.total_spent),
            client_rating: job.client.rating,
            payment_verified: job.client.is_payment_verified(),
            posted_on: job.posted_on.clone(),
            skills: job.skills.iter().map(|skill| skill.name.clone()).collect(),
            applied: job.applied,
            collapsed,
            excluded_by_title: processed.is_excluded_by_title_filter,
            low_priority: processed.is_low_priority_by_skill
                || processed.is_low_priority_by_client_country,
        }
    }
}
