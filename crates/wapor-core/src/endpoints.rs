//! URL construction for the GIS Manager API

use crate::models::Partition;

pub const DEFAULT_BASE_URL: &str = "https://io.apps.fao.org/gismgr/api/v1/";

const LISTING: &str = "overview=false&paged=false";

/// Endpoint paths relative to a base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        let trimmed = base_url.trim();
        let base = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{}/", trimmed)
        };
        Self { base }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn sign_in(&self) -> String {
        format!("{}iam/sign-in/", self.base)
    }

    pub fn refresh(&self) -> String {
        format!("{}iam/token", self.base)
    }

    pub fn workspaces(&self) -> String {
        format!("{}catalog/workspaces/?{}&sort=code", self.base, LISTING)
    }

    pub fn cubes(&self, partition: &Partition) -> String {
        let url = format!(
            "{}catalog/workspaces/{}/cubes?{}",
            self.base,
            partition.workspace_code(),
            LISTING
        );
        match partition.level_tag() {
            Some(tag) => format!("{}&tags={}", url, tag),
            None => url,
        }
    }

    pub fn measures(&self, partition: &Partition, cube: &str) -> String {
        format!("{}/measures?{}", self.cube(partition, cube), LISTING)
    }

    pub fn dimensions(&self, partition: &Partition, cube: &str) -> String {
        format!("{}/dimensions?{}", self.cube(partition, cube), LISTING)
    }

    pub fn members(&self, partition: &Partition, cube: &str, dimension: &str) -> String {
        format!("{}/dimensions/{}/members?{}", self.cube(partition, cube), dimension, LISTING)
    }

    pub fn query(&self) -> String {
        format!("{}query/", self.base)
    }

    pub fn download(&self, partition: &Partition) -> String {
        format!("{}download/{}", self.base, partition.workspace_code())
    }

    fn cube(&self, partition: &Partition, cube: &str) -> String {
        format!(
            "{}catalog/workspaces/{}/cubes/{}",
            self.base,
            partition.workspace_code(),
            cube
        )
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
