use serde::{Deserialize, Serialize};

use crate::{Job, ProcessedJob};

/// Static annotation rules. Matching is case-insensitive throughout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Phrases that mark a job as excluded when found anywhere in its title.
    pub title_exclusions: Vec<String>,
    /// Skill names that mark a job as low priority.
    pub low_priority_skills: Vec<String>,
    /// Client countries that mark a job as low priority.
    pub low_priority_countries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterOutcome {
    pub processed_jobs: Vec<ProcessedJob>,
    pub title_excluded_count: usize,
    pub skill_low_priority_count: usize,
    pub client_country_low_priority_count: usize,
}

impl FilterRules {
    /// Annotates every job; none are dropped.
    pub fn apply(&self, jobs: &[Job]) -> FilterOutcome {
        self.annotate(jobs.iter().cloned())
    }

    /// Re-evaluates already processed jobs, replacing previous annotations.
    pub fn apply_processed(&self, jobs: &[ProcessedJob]) -> FilterOutcome {
        self.annotate(jobs.iter().map(|processed| processed.job.clone()))
    }

    fn annotate(&self, jobs: impl Iterator<Item = Job>) -> FilterOutcome {
        let title_exclusions = lowercase_all(&self.title_exclusions);
        let low_priority_skills = lowercase_all(&self.low_priority_skills);
        let low_priority_countries = lowercase_all(&self.low_priority_countries);

        let mut outcome = FilterOutcome::default();
        for job in jobs {
            let title = job.title.to_lowercase();
            let is_excluded_by_title_filter = title_exclusions
                .iter()
                .any(|phrase| title.contains(phrase.as_str()));

            let is_low_priority_by_skill = job.skills.iter().any(|skill| {
                let name = skill.name.trim().to_lowercase();
                low_priority_skills.iter().any(|entry| *entry == name)
            });

            let is_low_priority_by_client_country = job
                .client
                .country
                .as_deref()
                .map(|country| country.trim().to_lowercase())
                .is_some_and(|country| low_priority_countries.iter().any(|entry| *entry == country));

            outcome.title_excluded_count += usize::from(is_excluded_by_title_filter);
            outcome.skill_low_priority_count += usize::from(is_low_priority_by_skill);
            outcome.client_country_low_priority_count +=
                usize::from(is_low_priority_by_client_country);
            outcome.processed_jobs.push(ProcessedJob {
                job,
                is_excluded_by_title_filter,
                is_low_priority_by_skill,
                is_low_priority_by_client_country,
            });
        }
        outcome
    }
}

// Empty entries would match every title, so they are dropped.
fn lowercase_all(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}
