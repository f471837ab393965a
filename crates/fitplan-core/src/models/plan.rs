use std::fmt;

use serde::{Deserialize, Serialize};

/// Which part of the program a plan covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanKind {
    Diet,
    Workout,
    #[serde(other)]
    Other,
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlanKind::Diet => "Diet",
            PlanKind::Workout => "Workout",
            PlanKind::Other => "Other",
        };
        f.write_str(name)
    }
}

/// A diet or workout plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessPlan {
    #[serde(rename = "type")]
    pub kind: PlanKind,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Body of `GET /plan` and `POST /generate-plan` responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlansResponse {
    #[serde(default)]
    pub plans: Vec<FitnessPlan>,
}

/// Body of `POST /generate-plan`
#[derive(Debug, Clone, Serialize)]
pub struct PlanGenerationRequest<'a> {
    pub user_prompt: &'a str,
}
