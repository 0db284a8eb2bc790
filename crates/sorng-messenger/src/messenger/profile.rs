//! User profile lookup by page-scoped id.

use crate::messenger::api_client::GraphClient;
use crate::messenger::error::{MessengerError, MessengerResult};
use serde::{Deserialize, Serialize};

const PROFILE_FIELDS: &str = "first_name,last_name,profile_pic,locale,timezone,gender";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_pic: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    /// Offset from UTC in hours.
    #[serde(default)]
    pub timezone: Option<f32>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
            (Some(f), None) => Some(f.clone()),
            (None, Some(l)) => Some(l.clone()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserProfiles {
    client: GraphClient,
}

impl UserProfiles {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub async fn get_user_profile(&self, user_id: &str) -> MessengerResult<UserProfile> {
        if user_id.is_empty() || user_id.contains('/') {
            return Err(MessengerError::invalid_parameter(format!(
                "Invalid user id: '{}'",
                user_id
            )));
        }
        let resp = self
            .client
            .get_with_params(user_id, &[("fields", PROFILE_FIELDS)])
            .await?;
        Ok(serde_json::from_value(resp)?)
    }
}
