use serde::{Deserialize, Serialize};

/// Page the user is sent to when a call fails for lack of a valid session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "page", rename_all = "camelCase")]
pub enum RecoveryTarget {
    JobSearch { query: String },
    JobPage { ciphertext: String },
    Profile { profile_id: String },
}

impl RecoveryTarget {
    /// Path and query relative to the marketplace site root.
    pub fn path(&self) -> String {
        match self {
            RecoveryTarget::JobSearch { query } => {
                let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
                format!("/nx/search/jobs/?q={encoded}")
            }
            RecoveryTarget::JobPage { ciphertext } => format!("/jobs/{ciphertext}"),
            RecoveryTarget::Profile { profile_id } => format!("/freelancers/{profile_id}"),
        }
    }
}
