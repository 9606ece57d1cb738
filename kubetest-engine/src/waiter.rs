use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use kubetest_core::constants::WAIT_POLL_INTERVAL_SECONDS;
use kubetest_core::prelude::*;
use kubetest_provisioner::Provisioner;

use crate::sleeper::Sleeper;

/// Prewired predicate: satisfied once at least one object is observed (spec §4.3).
pub fn created(items: &[DynamicObject]) -> bool {
    !items.is_empty()
}

/// Prewired predicate: satisfied once no objects are observed (spec §4.3).
pub fn deleted(items: &[DynamicObject]) -> bool {
    items.is_empty()
}

/// Predicate factory: satisfied once exactly `count` objects are observed (used by the
/// `ExpectedResources` assertion, spec §4.4).
pub fn count_is(count: i64) -> impl Fn(&[DynamicObject]) -> bool + Copy {
    move |items: &[DynamicObject]| items.len() as i64 == count
}

/// Polls `resource` with `selectors`, evaluating `predicate` on each tick, until it is satisfied
/// or `timeout` is exhausted (spec §4.3). Poll interval is the fixed constant
/// [`WAIT_POLL_INTERVAL_SECONDS`]; maximum retries is `floor(timeout_seconds / interval)`.
/// Transport errors from a tick are swallowed and counted as "not yet satisfied" -- the
/// objective is observable convergence, not error reporting.
#[instrument(skip(provisioner, sleeper, selectors, predicate, cancel), fields(kind = %resource.kind, name = %resource.name))]
pub async fn wait_for_selectors<P: Provisioner, S: Sleeper, F: Fn(&[DynamicObject]) -> bool>(
    provisioner: &mut P,
    sleeper: &S,
    resource: &ObjectRef,
    selectors: &BTreeMap<String, Value>,
    predicate: F,
    timeout: Duration,
    cancel: &CancellationToken,
) -> bool {
    let interval = Duration::from_secs(WAIT_POLL_INTERVAL_SECONDS);
    let max_retries = timeout.as_secs() / WAIT_POLL_INTERVAL_SECONDS;

    for _ in 0..max_retries {
        if cancel.is_cancelled() {
            return false;
        }

        let items = provisioner.list_with_selectors(resource, selectors).await.unwrap_or_default();
        if predicate(&items) {
            return true;
        }

        tokio::select! {
            _ = sleeper.sleep(interval) => {},
            _ = cancel.cancelled() => return false,
        }
    }

    false
}

/// `wait_for_selectors` scoped to a single object by name (spec §4.3: "list by ref using a field
/// selector `metadata.name = ref.name`").
pub async fn wait_for<P: Provisioner, S: Sleeper, F: Fn(&[DynamicObject]) -> bool>(
    provisioner: &mut P,
    sleeper: &S,
    resource: &ObjectRef,
    predicate: F,
    timeout: Duration,
    cancel: &CancellationToken,
) -> bool {
    let mut selectors = BTreeMap::new();
    selectors.insert("metadata.name".to_string(), Value::String(resource.name.clone()));
    wait_for_selectors(provisioner, sleeper, resource, &selectors, predicate, timeout, cancel).await
}

/// Runs `wait_for` over each `WaitSpec` in order, aborting on the first failure (the adopted
/// resolution of spec.md's "partial waitFor failures" open question: "abort on first failure
/// within a test").
pub async fn wait_all<P: Provisioner, S: Sleeper, F: Fn(&[DynamicObject]) -> bool + Copy>(
    provisioner: &mut P,
    sleeper: &S,
    specs: &[WaitSpec],
    predicate: F,
    cancel: &CancellationToken,
) -> bool {
    for spec in specs {
        let ok = wait_for(provisioner, sleeper, &spec.resource, predicate, spec.timeout, cancel).await;
        if !ok {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{
        AtomicUsize,
        Ordering,
    };

    use kubetest_provisioner::MockProvisioner;

    use super::*;
    use crate::sleeper::NoopSleeper;

    fn obj(name: &str) -> DynamicObject {
        DynamicObject::new(name, &kube::api::ApiResource {
            group: String::new(),
            version: "v1".into(),
            api_version: "v1".into(),
            kind: "Namespace".into(),
            plural: "namespaces".into(),
        })
    }

    #[tokio::test]
    async fn test_predicate_correctness_third_attempt() {
        let calls = AtomicUsize::new(0);
        let mut mock = MockProvisioner::new();
        mock.expect_list_with_selectors().times(3).returning(move |_, _| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 { Ok(vec![]) } else { Ok(vec![obj("ns-1")]) }
        });

        let resource = ObjectRef::cluster_scoped("v1", "Namespace", "ns-1");
        let ok = wait_for(
            &mut mock,
            &NoopSleeper,
            &resource,
            created,
            Duration::from_secs(10),
            &CancellationToken::new(),
        )
        .await;
        assert!(ok);
    }

    #[tokio::test]
    async fn test_retry_bound_exhausted() {
        let mut mock = MockProvisioner::new();
        // floor(10/2) = 5 retries, never satisfied.
        mock.expect_list_with_selectors().times(5).returning(|_, _| Ok(vec![]));

        let resource = ObjectRef::cluster_scoped("v1", "Namespace", "ns-1");
        let ok = wait_for(
            &mut mock,
            &NoopSleeper,
            &resource,
            created,
            Duration::from_secs(10),
            &CancellationToken::new(),
        )
        .await;
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_wait_all_aborts_on_first_failure() {
        let mut mock = MockProvisioner::new();
        mock.expect_list_with_selectors().times(2).returning(|_, _| Ok(vec![]));

        let specs = vec![
            WaitSpec { resource: ObjectRef::cluster_scoped("v1", "Namespace", "a"), timeout: Duration::from_secs(4) },
            WaitSpec { resource: ObjectRef::cluster_scoped("v1", "Namespace", "b"), timeout: Duration::from_secs(4) },
        ];
        let ok = wait_all(&mut mock, &NoopSleeper, &specs, created, &CancellationToken::new()).await;
        assert!(!ok);
    }
}
