//! Account API implementation

use crate::api::{common::build_path, ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub account_name: String,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub owner_team_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountsListResponse {
    #[serde(default)]
    accounts: Vec<Account>,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account: Account,
}

/// Accounts API
pub struct AccountsApi<'a> {
    client: &'a Client,
}

impl<'a> AccountsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /v1/account
    pub async fn list(&self) -> Result<Vec<Account>, ApiError> {
        let response: AccountsListResponse = self.client.get("/v1/account").await?;
        Ok(response.accounts)
    }

    /// GET /v1/account/{account_id}
    pub async fn get(&self, account_id: &str) -> Result<Account, ApiError> {
        let path = build_path(&["v1", "account", account_id]);
        let response: AccountResponse = self.client.get(&path).await?;
        Ok(response.account)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_helpers::create_test_client;
    use mockito::Server;

    #[tokio::test]
    async fn list_and_get_accounts() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", "/v1/account")
            .with_body(
                r#"{"accounts": [
                    {"account_id": "a1b2", "account_name": "acme", "organization_id": "org1a2b"},
                    {"account_id": "c3d4", "account_name": "globex"}
                ]}"#,
            )
            .create_async()
            .await;
        let _get = server
            .mock("GET", "/v1/account/a1b2")
            .with_body(r#"{"account": {"account_id": "a1b2", "account_name": "acme", "organization_id": "org1a2b"}}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let accounts = client.accounts().list().await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[1].organization_id, "");

        let account = client.accounts().get("a1b2").await.unwrap();
        assert_eq!(account.organization_id, "org1a2b");
    }
}
