// src/models/resources.rs
//! App Store Connect resource shapes (JSON:API documents).

use serde::{Deserialize, Serialize};

/// Marker the API puts in error details when alternative distribution is
/// not offered in the account's region.
pub const REGION_RESTRICTION_MARKER: &str = "not available in your region";

/// One entry of an API `errors` array.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ApiErrorEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl ApiErrorEntry {
    /// Whether `detail` carries [`REGION_RESTRICTION_MARKER`].
    pub fn is_region_restricted(&self) -> bool {
        self.detail
            .as_deref()
            .map_or(false, |d| d.contains(REGION_RESTRICTION_MARKER))
    }
}

/// Error document returned with 4xx/5xx statuses.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorDocument {
    #[serde(default)]
    pub errors: Vec<ApiErrorEntry>,
}

/// Summary of an app from `GET /apps`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct App {
    pub id: String,
    pub name: String,
    pub bundle_id: String,
    pub sku: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct AppResource {
    pub id: String,
    pub attributes: AppAttributes,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppAttributes {
    pub name: String,
    pub bundle_id: String,
    #[serde(default)]
    pub sku: String,
}

impl From<AppResource> for App {
    fn from(resource: AppResource) -> Self {
        App {
            id: resource.id,
            name: resource.attributes.name,
            bundle_id: resource.attributes.bundle_id,
            sku: resource.attributes.sku,
        }
    }
}

/// A collection document: `{"data": [...]}`.
#[derive(Deserialize, Debug)]
pub(crate) struct Collection<T> {
    pub data: Vec<T>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct RelationshipData {
    pub id: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct Relationship {
    #[serde(default)]
    pub data: Option<RelationshipData>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PackageRelationships {
    #[serde(default)]
    pub app: Option<Relationship>,
    #[serde(default)]
    pub app_store_version: Option<Relationship>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct PackageResource {
    pub id: String,
    #[serde(default)]
    pub relationships: PackageRelationships,
}

/// An alternative distribution package with its relationship references.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AlternativeDistributionPackage {
    pub id: String,
    pub app_id: Option<String>,
    pub app_store_version_id: Option<String>,
}

impl From<PackageResource> for AlternativeDistributionPackage {
    fn from(resource: PackageResource) -> Self {
        let related = |r: Option<Relationship>| r.and_then(|r| r.data).map(|d| d.id);
        AlternativeDistributionPackage {
            id: resource.id,
            app_id: related(resource.relationships.app),
            app_store_version_id: related(resource.relationships.app_store_version),
        }
    }
}
