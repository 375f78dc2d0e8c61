mod common;

use jobwatch_core::{BudgetKind, ErrorKind, RecoveryTarget};
use jobwatch_engine::{
    EndpointId, GraphQlOperation, JobDetailsQuery, JobSearch, TalentProfileQuery,
};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{init_logging, search_data, search_result};

#[test]
fn job_search_maps_results_to_jobs() {
    let op = JobSearch {
        query: "rust".to_string(),
        count: 10,
    };

    let jobs = op
        .decode(search_data(vec![search_result("~01abc", "Rust service", true)]))
        .unwrap();

    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.id, "~01abc");
    assert_eq!(job.page_path(), "/jobs/~01abc");
    assert_eq!(job.title, "Rust service");
    assert!(job.client.is_payment_verified());
    assert_eq!(job.client.country.as_deref(), Some("Germany"));
    assert_eq!(job.client.total_spent, Some(1500.0));
    assert_eq!(job.skills[0].name, "Rust");
    let budget = job.budget.as_ref().unwrap();
    assert_eq!(budget.kind, BudgetKind::Hourly);
    assert_eq!(budget.min_amount, Some(25.0));
    assert_eq!(budget.max_amount, None);
}

#[test]
fn job_search_skips_results_without_identifier_and_honors_count() {
    let op = JobSearch {
        query: "rust".to_string(),
        count: 2,
    };
    let data = search_data(vec![
        json!({ "title": "no id at all" }),
        search_result("~01a", "A", false),
        search_result("~01b", "B", false),
        search_result("~01c", "C", false),
    ]);

    let ids: Vec<String> = op.decode(data).unwrap().into_iter().map(|job| job.id).collect();

    assert_eq!(ids, vec!["~01a", "~01b"]);
}

#[test]
fn numeric_ids_are_read_and_malformed_results_are_skipped() {
    init_logging();
    let op = JobSearch {
        query: "rust".to_string(),
        count: 10,
    };
    let data = search_data(vec![
        json!({ "id": 1234567, "title": "numeric id", "jobTile": { "job": { "id": 1234567 } } }),
        json!({ "title": ["not", "a", "string"], "jobTile": { "job": { "ciphertext": "~01x" } } }),
        search_result("~01b", "B", false),
    ]);

    let jobs = op.decode(data).unwrap();

    let ids: Vec<&str> = jobs.iter().map(|job| job.id.as_str()).collect();
    assert_eq!(ids, vec!["1234567", "~01b"]);
    assert_eq!(jobs[0].title, "numeric id");
    assert_eq!(jobs[0].page_path(), "/jobs/~1234567");
}

#[test]
fn fixed_price_budget_uses_the_amount_for_both_bounds() {
    let mut result = search_result("~01f", "Fixed", true);
    result["jobTile"]["job"]["jobType"] = json!("FIXED");
    result["jobTile"]["job"]["fixedPriceAmount"] = json!({ "isoCurrencyCode": "EUR", "amount": "500" });
    let op = JobSearch {
        query: "rust".to_string(),
        count: 10,
    };

    let jobs = op.decode(search_data(vec![result])).unwrap();

    let budget = jobs[0].budget.as_ref().unwrap();
    assert_eq!(budget.kind, BudgetKind::Fixed);
    assert_eq!(budget.currency_code, "EUR");
    assert_eq!(budget.min_amount, Some(500.0));
    assert_eq!(budget.max_amount, Some(500.0));
}

#[test]
fn job_search_without_results_path_is_parsing_error() {
    let op = JobSearch {
        query: "rust".to_string(),
        count: 10,
    };

    let err = op.decode(json!({ "search": {} })).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Parsing);
    assert_eq!(
        op.recovery_target(),
        RecoveryTarget::JobSearch {
            query: "rust".to_string()
        }
    );
}

#[test]
fn job_details_reads_activity_and_questions() {
    let op = JobDetailsQuery {
        ciphertext: "~01abc".to_string(),
    };
    let data = json!({
        "jobAuthDetails": {
            "opening": {
                "job": {
                    "info": { "ciphertext": "~01abc", "id": "123", "title": "Rust service" },
                    "description": "Build it",
                    "clientActivity": {
                        "totalApplicants": 12,
                        "totalInvitedToInterview": 2,
                        "invitationsSent": null,
                        "lastBuyerActivity": "2026-10-17T10:00:00Z"
                    },
                    "questions": [{ "question": "Why Rust?" }, { "question": null }]
                }
            },
            "buyer": { "info": { "stats": null, "company": { "contractDate": "2019-01-01" }, "jobs": { "postedCount": 40 } } }
        }
    });

    let details = op.decode(data).unwrap();

    assert_eq!(op.endpoint(), EndpointId::JobDetails);
    assert_eq!(details.title, "Rust service");
    assert_eq!(details.description, "Build it");
    assert_eq!(details.activity.applicants, Some(12));
    assert_eq!(details.activity.invites_sent, None);
    assert_eq!(details.questions, vec!["Why Rust?"]);
    assert_eq!(details.client_total_hires, None);
    assert_eq!(details.client_total_posted_jobs, Some(40));
    assert_eq!(details.client_member_since.as_deref(), Some("2019-01-01"));
}

#[test]
fn null_job_details_is_parsing_error() {
    let op = JobDetailsQuery {
        ciphertext: "~01abc".to_string(),
    };

    let err = op.decode(json!({ "jobAuthDetails": null })).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Parsing);
}

#[test]
fn talent_profile_reads_skills_and_rate() {
    let op = TalentProfileQuery {
        profile_id: "~01dev".to_string(),
    };
    let data = json!({
        "talentVPDAuthProfile": {
            "identity": { "uid": "42", "ciphertext": "~01dev" },
            "profile": {
                "name": "Sam D.",
                "title": "Systems engineer",
                "description": null,
                "location": { "country": "Sweden" },
                "skills": [{ "node": { "prettyName": "Rust" } }, { "node": null }]
            },
            "stats": { "hourlyRate": { "amount": 85, "currencyCode": "USD" } }
        }
    });

    let profile = op.decode(data).unwrap();

    assert_eq!(profile.id, "~01dev");
    assert_eq!(profile.name, "Sam D.");
    assert_eq!(profile.country.as_deref(), Some("Sweden"));
    assert_eq!(profile.hourly_rate, Some(85.0));
    assert_eq!(profile.skills, vec!["Rust"]);
    assert_eq!(
        op.recovery_target().path(),
        "/freelancers/~01dev".to_string()
    );
}
