//! GraphQL operations run through token rotation, and their wire-to-domain mapping.

use jobwatch_core::{ApiError, Budget, BudgetKind, Client, Job, RecoveryTarget, Skill};
use jobwatch_logging::watch_warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::types::EndpointId;

/// A typed GraphQL call: what to send, and how to read the `data` object back.
pub trait GraphQlOperation: Send + Sync {
    type Output: Send;

    fn endpoint(&self) -> EndpointId;
    /// Value of the `alias` query parameter the API routes on.
    fn alias(&self) -> &'static str;
    fn query(&self) -> &'static str;
    fn variables(&self) -> Value;
    fn decode(&self, data: Value) -> Result<Self::Output, ApiError>;
    /// Page that lets the user re-establish a session for this call.
    fn recovery_target(&self) -> RecoveryTarget;
}

const JOB_SEARCH_QUERY: &str = r#"
query UserJobSearch($requestVariables: UserJobSearchV1Request!) {
  search {
    universalSearchNuxt {
      userJobSearchV1(request: $requestVariables) {
        paging { total offset count }
        results {
          id
          title
          description
          applied
          ontologySkills { prettyName }
          upworkHistoryData {
            client {
              paymentVerificationStatus
              country
              totalSpent { amount }
              totalFeedback
            }
          }
          jobTile {
            job {
              id
              ciphertext: cipherText
              jobType
              hourlyBudgetMin
              hourlyBudgetMax
              fixedPriceAmount { isoCurrencyCode amount }
              publishTime
            }
          }
        }
      }
    }
  }
}"#;

const JOB_DETAILS_QUERY: &str = r#"
query JobAuthDetailsQuery($id: ID!) {
  jobAuthDetails(id: $id) {
    opening {
      job {
        info { ciphertext id title }
        description
        clientActivity {
          totalApplicants
          totalInvitedToInterview
          invitationsSent
          lastBuyerActivity
        }
        questions { question }
      }
    }
    buyer {
      info {
        stats { totalJobsWithHires }
        company { contractDate }
        jobs { postedCount }
      }
    }
  }
}"#;

const TALENT_PROFILE_QUERY: &str = r#"
query GetTalentProfile($profileUrl: String) {
  talentVPDAuthProfile(filter: { profileUrl: $profileUrl }) {
    identity { uid ciphertext }
    profile {
      name
      title
      description
      location { country }
      skills { node { prettyName } }
    }
    stats { hourlyRate { amount currencyCode } }
  }
}"#;

/// Most recent postings matching `query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSearch {
    pub query: String,
    pub count: usize,
}

impl GraphQlOperation for JobSearch {
    type Output = Vec<Job>;

    fn endpoint(&self) -> EndpointId {
        EndpointId::JobSearch
    }

    fn alias(&self) -> &'static str {
        "userJobSearch"
    }

    fn query(&self) -> &'static str {
        JOB_SEARCH_QUERY
    }

    fn variables(&self) -> Value {
        json!({
            "requestVariables": {
                "userQuery": self.query,
                "sort": "recency",
                "highlight": false,
                "paging": { "offset": 0, "count": self.count },
            }
        })
    }

    fn decode(&self, data: Value) -> Result<Vec<Job>, ApiError> {
        let results = data
            .pointer("/search/universalSearchNuxt/userJobSearchV1/results")
            .cloned()
            .ok_or_else(|| ApiError::parsing("job search response has no results"))?;
        let results: Vec<Value> = from_value(results, "job search results")?;

        // One malformed result must not cost the rest of the batch.
        let mut jobs = Vec::with_capacity(results.len());
        for (index, raw) in results.into_iter().enumerate() {
            let result: WireSearchResult = match serde_json::from_value(raw) {
                Ok(result) => result,
                Err(err) => {
                    watch_warn!("Skipping malformed job search result #{}: {}", index, err);
                    continue;
                }
            };
            match result.into_job() {
                Some(job) => jobs.push(job),
                None => watch_warn!("Skipping job search result without an identifier"),
            }
        }
        jobs.truncate(self.count);
        Ok(jobs)
    }

    fn recovery_target(&self) -> RecoveryTarget {
        RecoveryTarget::JobSearch {
            query: self.query.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobActivity {
    pub applicants: Option<u32>,
    pub interviewing: Option<u32>,
    pub invites_sent: Option<u32>,
    pub last_viewed_by_client: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetails {
    pub id: Option<String>,
    pub ciphertext: String,
    pub title: String,
    pub description: String,
    pub client_total_hires: Option<u32>,
    pub client_total_posted_jobs: Option<u32>,
    pub client_member_since: Option<String>,
    pub questions: Vec<String>,
    pub activity: JobActivity,
}

/// Full posting details, including client activity and screening questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetailsQuery {
    pub ciphertext: String,
}

impl GraphQlOperation for JobDetailsQuery {
    type Output = JobDetails;

    fn endpoint(&self) -> EndpointId {
        EndpointId::JobDetails
    }

    fn alias(&self) -> &'static str {
        "gql-query-get-auth-job-details"
    }

    fn query(&self) -> &'static str {
        JOB_DETAILS_QUERY
    }

    fn variables(&self) -> Value {
        json!({ "id": self.ciphertext })
    }

    fn decode(&self, data: Value) -> Result<JobDetails, ApiError> {
        let details = data
            .get("jobAuthDetails")
            .cloned()
            .filter(|value| !value.is_null())
            .ok_or_else(|| ApiError::parsing("job details response is empty"))?;
        let details: WireJobAuthDetails = from_value(details, "job details")?;
        let job = details.opening.job;
        let buyer = details.buyer.info;

        Ok(JobDetails {
            id: job.info.id,
            ciphertext: job.info.ciphertext.unwrap_or_else(|| self.ciphertext.clone()),
            title: job.info.title.unwrap_or_default(),
            description: job.description.unwrap_or_default(),
            client_total_hires: buyer.stats.total_jobs_with_hires,
            client_total_posted_jobs: buyer.jobs.posted_count,
            client_member_since: buyer.company.contract_date,
            questions: job
                .questions
                .into_iter()
                .filter_map(|question| question.question)
                .collect(),
            activity: JobActivity {
                applicants: job.client_activity.total_applicants,
                interviewing: job.client_activity.total_invited_to_interview,
                invites_sent: job.client_activity.invitations_sent,
                last_viewed_by_client: job.client_activity.last_buyer_activity,
            },
        })
    }

    fn recovery_target(&self) -> RecoveryTarget {
        RecoveryTarget::JobPage {
            ciphertext: self.ciphertext.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalentProfile {
    pub id: String,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub hourly_rate: Option<f64>,
    pub country: Option<String>,
    pub skills: Vec<String>,
}

/// Public freelancer profile by profile id (e.g. `~01abc...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalentProfileQuery {
    pub profile_id: String,
}

impl GraphQlOperation for TalentProfileQuery {
    type Output = TalentProfile;

    fn endpoint(&self) -> EndpointId {
        EndpointId::TalentProfile
    }

    fn alias(&self) -> &'static str {
        "getDetails"
    }

    fn query(&self) -> &'static str {
        TALENT_PROFILE_QUERY
    }

    fn variables(&self) -> Value {
        json!({ "profileUrl": self.profile_id })
    }

    fn decode(&self, data: Value) -> Result<TalentProfile, ApiError> {
        let profile = data
            .get("talentVPDAuthProfile")
            .cloned()
            .filter(|value| !value.is_null())
            .ok_or_else(|| ApiError::parsing("talent profile response is empty"))?;
        let profile: WireTalentProfile = from_value(profile, "talent profile")?;

        Ok(TalentProfile {
            id: profile
                .identity
                .ciphertext
                .or(profile.identity.uid)
                .unwrap_or_else(|| self.profile_id.clone()),
            name: profile.profile.name.unwrap_or_default(),
            title: profile.profile.title,
            description: profile.profile.description,
            hourly_rate: profile.stats.hourly_rate.and_then(|rate| rate.amount),
            country: profile.profile.location.and_then(|location| location.country),
            skills: profile
                .profile
                .skills
                .into_iter()
                .filter_map(|skill| skill.node.and_then(|node| node.pretty_name))
                .collect(),
        })
    }

    fn recovery_target(&self) -> RecoveryTarget {
        RecoveryTarget::Profile {
            profile_id: self.profile_id.clone(),
        }
    }
}

fn from_value<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|err| ApiError::parsing(format!("{what}: {err}")))
}

/// Money amounts arrive as numbers or numeric strings depending on the field.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

/// Identifiers arrive as strings or bare numbers depending on the field.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

/// GraphQL sends `null` for absent objects and lists; read those as empty.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireSearchResult {
    #[serde(deserialize_with = "lenient_id")]
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    applied: Option<bool>,
    #[serde(deserialize_with = "null_as_default")]
    ontology_skills: Vec<WireSkill>,
    upwork_history_data: Option<WireHistory>,
    job_tile: Option<WireJobTile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireSkill {
    pretty_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireHistory {
    client: Option<WireClient>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireClient {
    payment_verification_status: Option<String>,
    country: Option<String>,
    total_spent: Option<WireMoney>,
    #[serde(deserialize_with = "lenient_f64")]
    total_feedback: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireMoney {
    #[serde(deserialize_with = "lenient_f64")]
    amount: Option<f64>,
    #[serde(alias = "currencyCode")]
    iso_currency_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireJobTile {
    job: Option<WireTileJob>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireTileJob {
    #[serde(deserialize_with = "lenient_id")]
    id: Option<String>,
    ciphertext: Option<String>,
    job_type: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    hourly_budget_min: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    hourly_budget_max: Option<f64>,
    fixed_price_amount: Option<WireMoney>,
    publish_time: Option<String>,
}

impl WireSearchResult {
    fn into_job(self) -> Option<Job> {
        let tile = self.job_tile.and_then(|tile| tile.job).unwrap_or_default();
        let numeric_id = tile.id.as_deref().or(self.id.as_deref());
        let id = Job::derive_id(tile.ciphertext.as_deref(), numeric_id)?;

        let budget = match tile.job_type.as_deref().map(str::to_ascii_uppercase).as_deref() {
            Some("HOURLY") => Some(Budget {
                kind: BudgetKind::Hourly,
                currency_code: "USD".to_string(),
                min_amount: tile.hourly_budget_min,
                max_amount: tile.hourly_budget_max,
            }),
            Some("FIXED") => tile.fixed_price_amount.map(|money| Budget {
                kind: BudgetKind::Fixed,
                currency_code: money.iso_currency_code.unwrap_or_else(|| "USD".to_string()),
                min_amount: money.amount,
                max_amount: money.amount,
            }),
            _ => None,
        };

        let client = self
            .upwork_history_data
            .and_then(|history| history.client)
            .map(|client| Client {
                payment_verification_status: client.payment_verification_status,
                country: client.country,
                total_spent: client.total_spent.and_then(|money| money.amount),
                rating: client.total_feedback,
            })
            .unwrap_or_default();

        Some(Job {
            id,
            ciphertext: tile.ciphertext.filter(|c| !c.trim().is_empty()),
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            posted_on: tile.publish_time,
            applied: self.applied.unwrap_or(false),
            budget,
            client,
            skills: self
                .ontology_skills
                .into_iter()
                .filter_map(|skill| skill.pretty_name)
                .map(|name| Skill { name })
                .collect(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireJobAuthDetails {
    #[serde(deserialize_with = "null_as_default")]
    opening: WireOpening,
    #[serde(deserialize_with = "null_as_default")]
    buyer: WireBuyer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireOpening {
    #[serde(deserialize_with = "null_as_default")]
    job: WireOpeningJob,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireOpeningJob {
    #[serde(deserialize_with = "null_as_default")]
    info: WireJobInfo,
    description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    client_activity: WireClientActivity,
    #[serde(deserialize_with = "null_as_default")]
    questions: Vec<WireQuestion>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireJobInfo {
    ciphertext: Option<String>,
    #[serde(deserialize_with = "lenient_id")]
    id: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireClientActivity {
    total_applicants: Option<u32>,
    total_invited_to_interview: Option<u32>,
    invitations_sent: Option<u32>,
    last_buyer_activity: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireQuestion {
    question: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireBuyer {
    #[serde(deserialize_with = "null_as_default")]
    info: WireBuyerInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireBuyerInfo {
    #[serde(deserialize_with = "null_as_default")]
    stats: WireBuyerStats,
    #[serde(deserialize_with = "null_as_default")]
    company: WireCompany,
    #[serde(deserialize_with = "null_as_default")]
    jobs: WireBuyerJobs,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireBuyerStats {
    total_jobs_with_hires: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireCompany {
    contract_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireBuyerJobs {
    posted_count: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireTalentProfile {
    #[serde(deserialize_with = "null_as_default")]
    identity: WireIdentity,
    #[serde(deserialize_with = "null_as_default")]
    profile: WireProfile,
    #[serde(deserialize_with = "null_as_default")]
    stats: WireProfileStats,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireIdentity {
    #[serde(deserialize_with = "lenient_id")]
    uid: Option<String>,
    ciphertext: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireProfile {
    name: Option<String>,
    title: Option<String>,
    description: Option<String>,
    location: Option<WireLocation>,
    #[serde(deserialize_with = "null_as_default")]
    skills: Vec<WireProfileSkill>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireLocation {
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireProfileSkill {
    node: Option<WireSkill>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireProfileStats {
    hourly_rate: Option<WireMoney>,
}
