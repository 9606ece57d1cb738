use std::collections::BTreeMap;

use async_trait::async_trait;
use kube::api::{
    ApiResource,
    DeleteParams,
    ListParams,
    Patch,
    PatchParams,
    PropagationPolicy,
};
use kube::discovery::Scope;
use kube::{
    Api,
    ResourceExt,
};
use serde_json::Value;
use tracing::{
    debug,
    warn,
};

use kubetest_core::prelude::*;
use kubetest_core::selectors::partition_selectors;

use crate::discovery::DiscoveryCache;
use crate::errors::ProvisionerError;
use crate::provisioner::Provisioner;

/// Live Kubernetes realization of [`Provisioner`]. Grounded on
/// `sk-core::k8s::apiset::ApiSet` for the discovery-cache shape, and on the original's
/// `pkg/provisioner/kubernetes.go` for the apply/delete/list semantics (default namespace
/// substitution, foreground delete, selector partitioning).
pub struct KubernetesProvisioner {
    client: kube::Client,
    discovery: DiscoveryCache,
}

impl KubernetesProvisioner {
    pub fn new(client: kube::Client) -> KubernetesProvisioner {
        KubernetesProvisioner { client, discovery: DiscoveryCache::new() }
    }

    async fn resolve(&mut self, api_version: &str, kind: &str) -> anyhow::Result<(ApiResource, Scope)> {
        match self.discovery.resolve(&self.client, api_version, kind).await {
            Ok((ar, caps)) => Ok((ar, caps.scope)),
            Err(_) => {
                // Tolerate a stale discovery cache: evict and retry once before giving up.
                self.discovery.evict(api_version, kind);
                let (ar, caps) = self.discovery.resolve(&self.client, api_version, kind).await?;
                Ok((ar, caps.scope))
            },
        }
    }

    fn api_for(&self, ar: &ApiResource, scope: &Scope, namespace: Option<&str>) -> Api<DynamicObject> {
        match scope {
            Scope::Namespaced => {
                let ns = namespace.unwrap_or(DEFAULT_NAMESPACE);
                Api::namespaced_with(self.client.clone(), ns, ar)
            },
            Scope::Cluster => Api::all_with(self.client.clone(), ar),
        }
    }
}

#[async_trait]
impl Provisioner for KubernetesProvisioner {
    async fn create_or_update(&mut self, obj: &DynamicObject) -> anyhow::Result<()> {
        let types = obj.types.as_ref().ok_or_else(|| ProvisionerError::mapping_failed("object has no type data"))?;
        let (ar, scope) = self.resolve(&types.api_version, &types.kind).await?;
        let api = self.api_for(&ar, &scope, obj.metadata.namespace.as_deref());

        debug!("applying {}/{}", types.kind, obj.name_any());
        api.patch(&obj.name_any(), &PatchParams::apply(FIELD_MANAGER), &Patch::Apply(obj))
            .await
            .map_err(map_transport_error)?;
        Ok(())
    }

    async fn delete(&mut self, obj: &DynamicObject) -> anyhow::Result<()> {
        let types = obj.types.as_ref().ok_or_else(|| ProvisionerError::mapping_failed("object has no type data"))?;
        let (ar, scope) = self.resolve(&types.api_version, &types.kind).await?;
        let api = self.api_for(&ar, &scope, obj.metadata.namespace.as_deref());

        let dp = DeleteParams { propagation_policy: Some(PropagationPolicy::Foreground), ..Default::default() };
        debug!("deleting {}/{}", types.kind, obj.name_any());
        api.delete(&obj.name_any(), &dp).await.map_err(map_transport_error)?;
        Ok(())
    }

    async fn list_with_selectors(
        &mut self,
        r: &ObjectRef,
        selectors: &BTreeMap<String, Value>,
    ) -> anyhow::Result<Vec<DynamicObject>> {
        let (ar, scope) = self.resolve(&r.api_version, &r.kind).await?;
        let api = self.api_for(&ar, &scope, r.namespace.as_deref());

        let (field_selector, label_selector) = partition_selectors(selectors);
        let mut lp = ListParams::default();
        if !field_selector.is_empty() {
            lp = lp.fields(&field_selector);
        }
        if !label_selector.is_empty() {
            lp = lp.labels(&label_selector);
        }

        debug!("listing {} with field={field_selector:?} label={label_selector:?}", r.kind);
        let list = api.list(&lp).await.map_err(map_transport_error)?;
        Ok(list.items)
    }
}

fn map_transport_error(e: kube::Error) -> anyhow::Error {
    match &e {
        kube::Error::Api(resp) if resp.code == 409 => ProvisionerError::apply_conflict(&resp.message),
        _ => {
            warn!("provisioner transport error: {e}");
            ProvisionerError::transport(&e.to_string())
        },
    }
}
