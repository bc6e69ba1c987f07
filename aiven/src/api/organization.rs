//! Organization API implementation

use crate::api::{common::build_path, ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub organization_id: String,
    pub organization_name: String,
    pub account_id: String,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
}

/// Organization API
pub struct OrganizationApi<'a> {
    client: &'a Client,
}

impl<'a> OrganizationApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /v1/organization/{organization_id}
    pub async fn get(&self, organization_id: &str) -> Result<Organization, ApiError> {
        let path = build_path(&["v1", "organization", organization_id]);
        self.client.get(&path).await
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_helpers::create_test_client;
    use mockito::Server;

    #[tokio::test]
    async fn get_organization() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/organization/org1a2b")
            .with_body(
                r#"{"organization_id": "org1a2b", "organization_name": "acme", "account_id": "a1b2", "tier": "business"}"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let org = client.organization().get("org1a2b").await.unwrap();
        assert_eq!(org.account_id, "a1b2");
        assert_eq!(org.tier.as_deref(), Some("business"));
    }
}
