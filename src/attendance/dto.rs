use serde::Serialize;

use crate::attendance::ledger::MarkOutcome;

/// Response for a mark request.
#[derive(Debug, Serialize)]
pub struct MarkResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl From<MarkOutcome> for MarkResponse {
    fn from(outcome: MarkOutcome) -> Self {
        match outcome {
            MarkOutcome::Marked { date, time } => Self {
                outcome: "marked",
                date: Some(date),
                time: Some(time),
            },
            MarkOutcome::AlreadyMarked => Self {
                outcome: "already_marked",
                date: None,
                time: None,
            },
        }
    }
}

/// Daily aggregate for the dashboard.
#[derive(Debug, Serialize)]
pub struct DailyCountResponse {
    pub date: String,
    pub present: usize,
}
