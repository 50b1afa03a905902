//! Catalog resolution: find which workspace partition holds a cube and
//! fetch its measure and dimensions.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::endpoints::Endpoints;
use crate::envelope;
use crate::error::{Result, WaporError};
use crate::models::{
    CubeDescriptor, CubeSummary, DimensionDescriptor, DimensionMember, Measure, Partition,
};
use crate::ports::{ApiRequest, Transport};

/// Per-client catalog cache
#[derive(Debug, Default)]
pub struct CatalogResolver {
    listings: HashMap<Partition, Vec<CubeSummary>>,
    descriptors: HashMap<(Partition, String), CubeDescriptor>,
    members: HashMap<(Partition, String, String), Vec<DimensionMember>>,
}

impl CatalogResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the partition holding `code` and return its full descriptor.
    ///
    /// A complete, in-range `(version, level)` hint restricts the search to
    /// that partition. Otherwise partitions are probed in
    /// [`Partition::PROBE_ORDER`] and the first hit wins.
    pub fn resolve<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        endpoints: &Endpoints,
        code: &str,
        version_hint: Option<u8>,
        level_hint: Option<u8>,
    ) -> Result<CubeDescriptor> {
        let candidates: Vec<Partition> = match Partition::from_hints(version_hint, level_hint) {
            Some(partition) => vec![partition],
            None => {
                if version_hint.is_some() || level_hint.is_some() {
                    tracing::warn!(
                        ?version_hint,
                        ?level_hint,
                        "incomplete or out-of-range partition hint, searching all partitions"
                    );
                }
                Partition::PROBE_ORDER.to_vec()
            }
        };

        let mut probed = Vec::with_capacity(candidates.len());
        for partition in candidates {
            probed.push(partition);
            let listing = self.catalog(transport, endpoints, &partition)?;
            if listing.iter().any(|cube| cube.code == code) {
                tracing::info!(cube = code, %partition, "cube found");
                return self.describe(transport, endpoints, &partition, code);
            }
            tracing::debug!(cube = code, %partition, "cube not in partition");
        }

        Err(WaporError::ProductNotFound {
            code: code.to_string(),
            probed,
        })
    }

    /// Cube listing of one partition, fetched once per resolver
    pub fn catalog<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        endpoints: &Endpoints,
        partition: &Partition,
    ) -> Result<&[CubeSummary]> {
        match self.listings.entry(*partition) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_slice()),
            Entry::Vacant(entry) => {
                let request = ApiRequest::get(endpoints.cubes(partition));
                let listing: Vec<CubeSummary> = envelope::fetch(transport, &request)?;
                tracing::debug!(%partition, cubes = listing.len(), "fetched catalog listing");
                Ok(entry.insert(listing).as_slice())
            }
        }
    }

    /// Full descriptor of a cube known to live in `partition`
    pub fn describe<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        endpoints: &Endpoints,
        partition: &Partition,
        code: &str,
    ) -> Result<CubeDescriptor> {
        let key = (*partition, code.to_string());
        if let Some(descriptor) = self.descriptors.get(&key) {
            return Ok(descriptor.clone());
        }

        let measures_url = endpoints.measures(partition, code);
        let measures: Vec<Measure> = envelope::fetch(transport, &ApiRequest::get(&measures_url))?;
        let measure = measures
            .into_iter()
            .next()
            .ok_or_else(|| WaporError::malformed(&measures_url, format!("cube {} has no measure", code)))?;
        if measure.multiplier.is_nan() || measure.multiplier <= 0.0 {
            return Err(WaporError::malformed(
                &measures_url,
                format!("measure {} has non-positive multiplier {}", measure.code, measure.multiplier),
            ));
        }

        let dimensions_url = endpoints.dimensions(partition, code);
        let dimensions: Vec<DimensionDescriptor> =
            envelope::fetch(transport, &ApiRequest::get(&dimensions_url))?;

        let caption = self
            .listings
            .get(partition)
            .and_then(|listing| listing.iter().find(|c| c.code == code))
            .map(|c| c.caption.clone())
            .unwrap_or_default();

        let descriptor = CubeDescriptor {
            code: code.to_string(),
            caption,
            partition: *partition,
            measure,
            dimensions,
        };
        self.descriptors.insert(key, descriptor.clone());
        Ok(descriptor)
    }

    /// Members of one dimension of a cube
    pub fn dimension_members<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        endpoints: &Endpoints,
        cube: &CubeDescriptor,
        dimension: &str,
    ) -> Result<Vec<DimensionMember>> {
        let key = (cube.partition, cube.code.clone(), dimension.to_string());
        if let Some(members) = self.members.get(&key) {
            return Ok(members.clone());
        }

        let request = ApiRequest::get(endpoints.members(&cube.partition, &cube.code, dimension));
        let members: Vec<DimensionMember> = envelope::fetch(transport, &request)?;
        self.members.insert(key, members.clone());
        Ok(members)
    }
}
