use std::fmt;

/// Logical API endpoint; each keeps its own sticky token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EndpointId {
    JobSearch,
    JobDetails,
    TalentProfile,
}

impl EndpointId {
    /// Key used in the persisted sticky-token map.
    pub fn as_str(self) -> &'static str {
        match self {
            EndpointId::JobSearch => "jobSearch",
            EndpointId::JobDetails => "jobDetails",
            EndpointId::TalentProfile => "talentProfile",
        }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful rotated call: the decoded result and the token that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotated<T> {
    pub result: T,
    pub token: String,
}

/// What a single `Monitor::run_check` call ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Completed {
        fetched: usize,
        new_count: usize,
        notifiable_count: usize,
    },
    Failed { kind: jobwatch_core::ErrorKind },
    /// Another cycle held the gate; nothing ran.
    Busy,
}
