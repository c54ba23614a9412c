// src/services/app_store.rs
//! App Store Connect resources used to discover the alternative
//! distribution package id.
//!
//! Each function issues a single request through [`ApiClient::execute`] and
//! shapes the response; failures have already been reported by the executor
//! and are handed back to the caller unchanged.

use crate::error::ClientError;
use crate::models::resources::{
    AlternativeDistributionPackage, App, AppResource, Collection, PackageResource,
};
use crate::services::request_executor::{ApiClient, HttpMethod};
use crate::storage::config_store::ConfigStore;
use log::info;
use serde::de::DeserializeOwned;

/// Page size requested when listing apps.
pub const APPS_PAGE_LIMIT: &str = "200";

fn collection<T: DeserializeOwned>(value: Option<serde_json::Value>) -> Result<Vec<T>, ClientError> {
    let value = value.ok_or_else(|| ClientError::Decode("empty collection response".to_string()))?;
    serde_json::from_value::<Collection<T>>(value)
        .map(|c| c.data)
        .map_err(|e| ClientError::Decode(e.to_string()))
}

/// Probes `GET /alternativeDistributionDomains`. Any successful response
/// means the feature is enabled for the account.
pub async fn check_availability<S: ConfigStore>(client: &mut ApiClient<S>) -> bool {
    info!("Checking alternative distribution availability...");
    let hints_before = client.region_hints();
    match client
        .execute(HttpMethod::Get, "/alternativeDistributionDomains", None, None)
        .await
    {
        Ok(_) => {
            info!("Alternative distribution is available");
            true
        }
        Err(_) => {
            if client.region_hints() > hints_before {
                info!("Alternative distribution is restricted in this account's region");
            }
            info!("Alternative distribution is not available");
            false
        }
    }
}

/// Lists the account's apps (`GET /apps?limit=200`).
///
/// # Errors
/// Any [`ClientError`] from the request, or [`ClientError::Decode`] if the
/// document is not an app collection.
pub async fn list_apps<S: ConfigStore>(client: &mut ApiClient<S>) -> Result<Vec<App>, ClientError> {
    info!("Fetching apps...");
    let response = client
        .execute(HttpMethod::Get, "/apps", None, Some(&[("limit", APPS_PAGE_LIMIT)][..]))
        .await?;

    let apps: Vec<App> = collection::<AppResource>(response.into_json())?
        .into_iter()
        .map(App::from)
        .collect();

    info!("Found {} app(s)", apps.len());
    for app in &apps {
        info!("  - {} ({})  id: {}", app.name, app.bundle_id, app.id);
    }
    Ok(apps)
}

/// Lists the alternative distribution packages of `app_id`.
///
/// The first package id ever seen is cached in the configuration record;
/// later ids never replace it.
///
/// # Errors
/// Same as [`list_apps`].
pub async fn list_packages<S: ConfigStore>(
    client: &mut ApiClient<S>,
    app_id: &str,
) -> Result<Vec<AlternativeDistributionPackage>, ClientError> {
    let response = client
        .execute(
            HttpMethod::Get,
            "/alternativeDistributionPackages",
            None,
            Some(&[("filter[app]", app_id)][..]),
        )
        .await?;

    let packages: Vec<AlternativeDistributionPackage> =
        collection::<PackageResource>(response.into_json())?
            .into_iter()
            .map(AlternativeDistributionPackage::from)
            .collect();

    for package in &packages {
        info!("  Package id: {}", package.id);
        client.credentials_mut().cache_resource_id(&package.id);
        if let Some(app) = &package.app_id {
            info!("    app id: {}", app);
        }
        if let Some(version) = &package.app_store_version_id {
            info!("    version id: {}", version);
        }
    }
    if packages.is_empty() {
        info!("  No alternative distribution packages found");
    }
    Ok(packages)
}
