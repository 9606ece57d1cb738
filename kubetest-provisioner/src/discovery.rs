use std::collections::HashMap;

use kube::api::GroupVersionKind;
use kube::discovery::ApiCapabilities;
use kube::api::ApiResource;

use crate::errors::ProvisionerError;

/// Caches discovery lookups keyed by GroupVersionKind so we don't re-query the apiserver on every
/// Provisioner call. Grounded on `sk-core::k8s::apiset::ApiSet`'s resources cache; we don't need
/// its per-GVK `kube::Api` memoization since each Provisioner call is namespace-scoped
/// differently, so only the `(ApiResource, ApiCapabilities)` pair is worth caching here.
#[derive(Default)]
pub struct DiscoveryCache {
    resources: HashMap<GvkKey, (ApiResource, ApiCapabilities)>,
}

#[derive(Clone, Eq, Hash, PartialEq)]
struct GvkKey {
    group: String,
    version: String,
    kind: String,
}

impl DiscoveryCache {
    pub fn new() -> DiscoveryCache {
        DiscoveryCache::default()
    }

    /// Resolves `(group, version, kind)` to its REST mapping, refreshing the cache once on a
    /// miss (spec §4.1's recommended "tolerate stale cache" behavior).
    pub async fn resolve(
        &mut self,
        client: &kube::Client,
        api_version: &str,
        kind: &str,
    ) -> anyhow::Result<(ApiResource, ApiCapabilities)> {
        let (group, version) = split_group_version(api_version);
        let key = GvkKey { group: group.clone(), version: version.clone(), kind: kind.to_string() };

        if let Some(cached) = self.resources.get(&key) {
            return Ok(cached.clone());
        }

        let gvk = GroupVersionKind::gvk(&group, &version, kind);
        match kube::discovery::pinned_kind(client, &gvk).await {
            Ok(meta) => {
                self.resources.insert(key, meta.clone());
                Ok(meta)
            },
            Err(e) => Err(ProvisionerError::mapping_failed(&format!("{group}/{version}.{kind}: {e}"))),
        }
    }

    /// Evicts a stale cache entry so the next `resolve` re-queries discovery.
    pub fn evict(&mut self, api_version: &str, kind: &str) {
        let (group, version) = split_group_version(api_version);
        self.resources.remove(&GvkKey { group, version, kind: kind.to_string() });
    }
}

fn split_group_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}
