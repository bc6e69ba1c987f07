//! Attribute helpers shared by resources: organization/account ID handling,
//! disk size conversions and other small value mappings.

use crate::api::accounts::Account;
use crate::api::{ApiError, Client};

const KIB: f64 = 1024.0;
const MIB: u64 = 1024 * 1024;
const SIZE_SUFFIXES: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid project_vpc_id, should have the following format {{project_name}}/{{project_vpc_id}}")]
    InvalidProjectVpcId,

    #[error("invalid size: {0:?}")]
    InvalidSize(String),

    #[error("organization {0} not found")]
    OrganizationNotFound(String),

    #[error("unable to get service plan pricing from api: {0}")]
    PlanPricing(#[source] ApiError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceWindow {
    pub day_of_week: String,
    pub time_of_day: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanParameters {
    pub disk_size_mb_default: u64,
    pub disk_size_mb_step: u64,
    pub disk_size_mb_max: u64,
}

pub fn is_organization_id(id: &str) -> bool {
    id.starts_with("org")
}

/// Returns the account ID to send to the API. Organization IDs are resolved
/// to their account; account IDs are returned without an API call.
pub async fn normalize_organization_id(client: &Client, id: &str) -> Result<String, ApiError> {
    if !is_organization_id(id) {
        return Ok(id.to_string());
    }

    let organization = client.organization().get(id).await?;
    Ok(organization.account_id)
}

/// Picks the ID to keep in state for fields that accept either an
/// organization ID or an account ID. Keeps the kind already in state and
/// prefers the organization ID when the account has one.
pub async fn determine_mixed_organization_constraint_id_to_store(
    client: &Client,
    state_id: &str,
    account_id: &str,
) -> Result<String, ApiError> {
    if account_id.is_empty() {
        return Ok(String::new());
    }

    if !is_organization_id(state_id) {
        return Ok(account_id.to_string());
    }

    let account = client.accounts().get(account_id).await?;
    if account.organization_id.is_empty() {
        return Ok(account_id.to_string());
    }

    Ok(account.organization_id)
}

/// Finds an organization's account by its name.
pub async fn find_organization_by_name(client: &Client, name: &str) -> Result<Account, SchemaError> {
    client
        .accounts()
        .list()
        .await?
        .into_iter()
        .find(|account| account.account_name == name)
        .ok_or_else(|| SchemaError::OrganizationNotFound(name.to_string()))
}

/// Extracts the VPC ID from a `{project_name}/{project_vpc_id}` value. An
/// empty value means no VPC.
pub fn project_vpc_id(value: &str) -> Result<Option<String>, SchemaError> {
    if value.is_empty() {
        return Ok(None);
    }

    match value.split_once('/') {
        Some((_, vpc_id)) => Ok(Some(vpc_id.to_string())),
        None => Err(SchemaError::InvalidProjectVpcId),
    }
}

/// `never` can be set on the backend but is rejected by the API, so it maps to
/// no window at all.
pub fn maintenance_window(day_of_week: &str, time_of_day: &str) -> Option<MaintenanceWindow> {
    if day_of_week == "never" || day_of_week.is_empty() || time_of_day.is_empty() {
        return None;
    }

    Some(MaintenanceWindow {
        day_of_week: day_of_week.to_string(),
        time_of_day: time_of_day.to_string(),
    })
}

/// Parses a size such as `80GiB`, `512M` or `1.5 g` (binary multiples
/// throughout) into bytes.
pub fn ram_in_bytes(size: &str) -> Result<u64, SchemaError> {
    let invalid = || SchemaError::InvalidSize(size.to_string());

    let trimmed = size.trim();
    let number_end = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(number_end);

    let value: f64 = number.parse().map_err(|_| invalid())?;

    let mut unit = unit.trim_start().chars().peekable();
    let exponent = match unit.peek().map(|c| c.to_ascii_lowercase()) {
        Some('k') => 1,
        Some('m') => 2,
        Some('g') => 3,
        Some('t') => 4,
        Some('p') => 5,
        _ => 0,
    };
    if exponent > 0 {
        unit.next();
    }
    let rest: String = unit.collect::<String>().to_ascii_lowercase();
    if !matches!(rest.as_str(), "" | "b" | "i" | "ib") {
        return Err(invalid());
    }

    Ok((value * KIB.powi(exponent)) as u64)
}

/// Disk size in MiB for a human readable size.
pub fn convert_to_disk_space_mb(size: &str) -> Result<u64, SchemaError> {
    Ok(ram_in_bytes(size)? / MIB)
}

/// Formats a byte count with binary units up to GiB, e.g. `80GiB` or
/// `1.5KiB`.
pub fn human_readable_byte_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut suffix = 0;
    while size >= KIB && suffix < SIZE_SUFFIXES.len() - 1 {
        size /= KIB;
        suffix += 1;
    }

    format!("{}{}", round_significant(size, 12), SIZE_SUFFIXES[suffix])
}

fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    let magnitude = value.abs().log10().floor() as i32 + 1;
    let factor = 10f64.powi(digits - magnitude);
    (value * factor).round() / factor
}

pub async fn service_plan_parameters(
    client: &Client,
    project: &str,
    service_type: &str,
    plan: &str,
) -> Result<PlanParameters, ApiError> {
    let plan = client
        .service_types()
        .get_plan(project, service_type, plan)
        .await?;

    Ok(PlanParameters {
        disk_size_mb_default: plan.disk_space_mb,
        disk_size_mb_step: plan.disk_space_step_mb,
        disk_size_mb_max: plan.disk_space_cap_mb,
    })
}

/// Whether the plan can take extra disk on top of its default size. Only
/// plans priced per extra GB in the given cloud allow it.
pub async fn dynamic_disk_space_is_allowed_by_pricing(
    client: &Client,
    project: &str,
    service_type: &str,
    plan: &str,
    cloud: &str,
) -> Result<bool, SchemaError> {
    let pricing = client
        .service_types()
        .get_plan_pricing(project, service_type, plan, cloud)
        .await
        .map_err(SchemaError::PlanPricing)?;

    Ok(pricing
        .extra_disk_price_per_gb_usd
        .is_some_and(|price| !price.is_empty()))
}
