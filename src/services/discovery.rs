// src/services/discovery.rs
//! Alternative distribution package discovery.
//!
//! Walks every app of the account and records the first package id found.

use crate::error::ClientError;
use crate::services::app_store::{check_availability, list_apps, list_packages};
use crate::services::credential_manager::is_fresh;
use crate::services::operator::Operator;
use crate::services::request_executor::ApiClient;
use crate::storage::config_store::ConfigStore;
use chrono::Utc;
use log::{info, warn};

/// Result of a discovery run.
#[derive(Debug, Clone, PartialEq)]
pub enum Discovery {
    /// The operator declined to continue after a failed availability probe.
    Aborted,
    /// Apps were scanned; carries the cached package id, if any.
    Completed { adp_id: Option<String> },
}

/// Runs the discovery flow.
///
/// # Process Flow
/// 1. Reports the state of the current credential
/// 2. Probes availability; asks `operator` whether to go on if it fails
/// 3. Lists apps, then the packages of each app
/// 4. Reports the cached package id
///
/// # Errors
/// Only the app listing is fatal; per-app package failures are reported and
/// skipped.
pub async fn discover<S: ConfigStore>(
    client: &mut ApiClient<S>,
    operator: &dyn Operator,
) -> Result<Discovery, ClientError> {
    is_fresh(client.credentials().credential(), Utc::now());

    if !check_availability(client).await {
        warn!("Alternative distribution is unavailable. Check that:");
        warn!("1. the account holder accepted the Alternative Terms Addendum");
        warn!("2. alternative distribution is offered in your region (currently EU only)");
        warn!("3. the API key has the required role");
        if !operator.confirm("Continue anyway?") {
            info!("Stopping");
            return Ok(Discovery::Aborted);
        }
    }

    let apps = list_apps(client).await?;
    let mut found_any = false;
    for app in &apps {
        info!("Checking alternative distribution packages of {}...", app.name);
        match list_packages(client, &app.id).await {
            Ok(packages) if !packages.is_empty() => {
                found_any = true;
                info!("Found alternative distribution packages for {}", app.name);
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping {}: {}", app.name, e),
        }
    }

    if !apps.is_empty() && !found_any {
        warn!("No app has an alternative distribution package. Possible causes:");
        warn!("1. the app was not built with the iOS 16.1 SDK or later");
        warn!("2. the app status does not meet the requirements");
        warn!("3. the Alternative Terms were not accepted");
        warn!("4. regional restrictions");
    }

    let adp_id = client.credentials().config().adp_id.get().map(str::to_string);
    match &adp_id {
        Some(id) => info!("Alternative Distribution Package ID: {} (saved to the configuration)", id),
        None => warn!("No Alternative Distribution Package ID could be obtained"),
    }
    Ok(Discovery::Completed { adp_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::configuration::Configuration;
    use crate::services::credential_manager::CredentialManager;
    use crate::services::operator::FixedOperator;
    use crate::testutil::{signed_credential, MemoryStore, TEST_KEY_ID};
    use mockito::{mock, Matcher};
    use serde_json::json;

    fn client(prefix: &str) -> (ApiClient<MemoryStore>, MemoryStore) {
        let store = MemoryStore::new(Configuration {
            security_token: Some(signed_credential(TEST_KEY_ID, Utc::now().timestamp() + 3600)),
            ..Configuration::default()
        });
        let handle = store.clone();
        let manager = CredentialManager::load(store).unwrap();
        (ApiClient::new(manager, format!("{}{}", mockito::server_url(), prefix)), handle)
    }

    #[tokio::test]
    async fn test_declined_after_unavailable_probe() {
        let probe = mock("GET", "/disc-abort/alternativeDistributionDomains")
            .with_status(403)
            .with_body(r#"{"errors": []}"#)
            .create();
        let apps = mock("GET", "/disc-abort/apps").match_query(Matcher::Any).expect(0).create();
        let (mut client, _) = client("/disc-abort");

        let outcome = discover(&mut client, &FixedOperator(false)).await.unwrap();

        probe.assert();
        apps.assert();
        assert_eq!(outcome, Discovery::Aborted);
    }

    #[tokio::test]
    async fn test_discovers_first_package_id() {
        let _probe = mock("GET", "/disc-ok/alternativeDistributionDomains")
            .with_status(200)
            .with_body(r#"{"data": []}"#)
            .create();
        let _apps = mock("GET", "/disc-ok/apps")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({"data": [
                    {"id": "app-1", "attributes": {"name": "One", "bundleId": "com.example.one", "sku": "ONE"}},
                    {"id": "app-2", "attributes": {"name": "Two", "bundleId": "com.example.two", "sku": "TWO"}}
                ]})
                .to_string(),
            )
            .create();
        let _none = mock("GET", "/disc-ok/alternativeDistributionPackages")
            .match_query(Matcher::UrlEncoded("filter[app]".into(), "app-1".into()))
            .with_status(200)
            .with_body(r#"{"data": []}"#)
            .create();
        let _some = mock("GET", "/disc-ok/alternativeDistributionPackages")
            .match_query(Matcher::UrlEncoded("filter[app]".into(), "app-2".into()))
            .with_status(200)
            .with_body(r#"{"data": [{"id": "adp-2"}]}"#)
            .create();
        let (mut client, store) = client("/disc-ok");

        let outcome = discover(&mut client, &FixedOperator(false)).await.unwrap();

        assert_eq!(
            outcome,
            Discovery::Completed {
                adp_id: Some("adp-2".to_string())
            }
        );
        assert_eq!(store.save_count(), 1);
    }
}
