use serde::{Deserialize, Serialize};

/// Dashboard summary returned by `GET /dashboard`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub progress: String,
    #[serde(default)]
    pub last_update: String,
}

impl DashboardData {
    /// Heading shown above the dashboard
    pub fn title(&self) -> String {
        if self.user_name.is_empty() {
            "Your Fitness Dashboard".to_string()
        } else {
            format!("Your Fitness Dashboard for {}", self.user_name)
        }
    }

    pub fn last_update_display(&self) -> &str {
        if self.last_update.is_empty() {
            "N/A"
        } else {
            &self.last_update
        }
    }
}
