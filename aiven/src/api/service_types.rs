//! Service type and plan API implementation

use crate::api::{common::build_path, ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePlan {
    pub service_plan: String,
    pub service_type: String,
    #[serde(default)]
    pub disk_space_mb: u64,
    #[serde(default)]
    pub disk_space_cap_mb: u64,
    #[serde(default)]
    pub disk_space_step_mb: u64,
    #[serde(default)]
    pub node_count: Option<u32>,
}

/// Price of a plan in one cloud. Prices are decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePlanPricing {
    pub service_plan: String,
    pub service_type: String,
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub base_price_usd: Option<String>,
    #[serde(default)]
    pub extra_disk_price_per_gb_usd: Option<String>,
}

/// Service types API
pub struct ServiceTypesApi<'a> {
    client: &'a Client,
}

impl<'a> ServiceTypesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /v1/project/{project}/service_types/{service_type}/plans/{plan}
    pub async fn get_plan(
        &self,
        project: &str,
        service_type: &str,
        plan: &str,
    ) -> Result<ServicePlan, ApiError> {
        let path = build_path(&["v1", "project", project, "service_types", service_type, "plans", plan]);
        self.client.get(&path).await
    }

    /// GET /v1/project/{project}/pricing/service-types/{service_type}/plans/{plan}/clouds/{cloud}
    pub async fn get_plan_pricing(
        &self,
        project: &str,
        service_type: &str,
        plan: &str,
        cloud: &str,
    ) -> Result<ServicePlanPricing, ApiError> {
        let path = build_path(&[
            "v1",
            "project",
            project,
            "pricing",
            "service-types",
            service_type,
            "plans",
            plan,
            "clouds",
            cloud,
        ]);
        self.client.get(&path).await
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_helpers::create_test_client;
    use mockito::Server;

    #[tokio::test]
    async fn get_plan_reads_disk_limits() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/project/proj/service_types/m3db/plans/business-8")
            .with_body(
                r#"{"service_plan": "business-8", "service_type": "m3db", "disk_space_mb": 81920, "disk_space_cap_mb": 163840, "disk_space_step_mb": 10240}"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let plan = client
            .service_types()
            .get_plan("proj", "m3db", "business-8")
            .await
            .unwrap();

        assert_eq!(plan.disk_space_mb, 81920);
        assert_eq!(plan.disk_space_step_mb, 10240);
        assert_eq!(plan.node_count, None);
    }

    #[tokio::test]
    async fn get_plan_pricing_reads_extra_disk_price() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock(
                "GET",
                "/v1/project/proj/pricing/service-types/pg/plans/business-4/clouds/google-europe-west1",
            )
            .with_body(
                r#"{"service_plan": "business-4", "service_type": "pg", "cloud_name": "google-europe-west1", "base_price_usd": "0.685", "extra_disk_price_per_gb_usd": "0.000137"}"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let pricing = client
            .service_types()
            .get_plan_pricing("proj", "pg", "business-4", "google-europe-west1")
            .await
            .unwrap();

        assert_eq!(pricing.cloud_name, "google-europe-west1");
        assert_eq!(pricing.extra_disk_price_per_gb_usd.as_deref(), Some("0.000137"));
    }
}
