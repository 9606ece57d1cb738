use std::collections::HashMap;
use std::net::SocketAddr;

use futures::StreamExt;
use kube::runtime::watcher;
use kube::ResourceExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio_util::sync::CancellationToken;
use tracing::{
    info,
    warn,
};

use kubetest_api::v1::TestResult;
use kubetest_core::prelude::CycleResult;

/// Owns the Prometheus-shaped gauge families and the `/metrics` HTTP exposition endpoint (spec
/// §4.6). Grounded on the teacher's `metrics`-facade usage (`sk-core::metrics::MemoryRecorder`)
/// for the gauge API; HTTP exposition is `metrics-exporter-prometheus`'s listener, since the
/// teacher serves Prometheus via the Prometheus Operator CR rather than an in-process endpoint.
#[derive(Clone, Default)]
pub struct MetricsHub;

impl MetricsHub {
    pub fn new() -> MetricsHub {
        MetricsHub
    }

    /// Starts the HTTP listener. Best-effort (spec §4.5): a bind failure is logged, not fatal.
    pub fn serve(&self, address: SocketAddr) {
        match PrometheusBuilder::new().with_http_listener(address).install() {
            Ok(()) => info!("metrics listening on {address}"),
            Err(e) => warn!("failed to bind metrics listener on {address}: {e}"),
        }
    }

    /// Push path: overwrites every gauge touched by this cycle (spec §4.6.1).
    pub fn publish_snapshot(&self, cycle: &CycleResult) {
        for test in &cycle.tests {
            metrics::gauge!("kubetest_test_status", "name" => test.name.clone())
                .set(if test.passed { 1.0 } else { 0.0 });
            for (assertion, passed) in &test.assertions {
                metrics::gauge!(
                    "kubetest_assertion_status",
                    "name" => test.name.clone(),
                    "assertion" => assertion.clone()
                )
                .set(if *passed { 1.0 } else { 0.0 });
            }
        }

        metrics::gauge!("kubetest_total_tests").set(cycle.total() as f64);
        metrics::gauge!("kubetest_total_tests_passed").set(cycle.passed() as f64);
        metrics::gauge!("kubetest_total_tests_failed").set(cycle.failed() as f64);
    }

    /// Watch path (cluster-loader mode only): an informer over `TestResult` objects
    /// incrementally adjusts gauges on add/update/delete (spec §4.6.2). Add-vs-Update is
    /// distinguished with a local `name -> last passed` map, since the watcher's apply stream
    /// does not distinguish them itself; totals move only on Add/Delete.
    pub async fn run_informer(&self, client: kube::Client, namespace: &str, cancel: CancellationToken) {
        let api: kube::Api<TestResult> = kube::Api::namespaced(client, namespace);
        let mut seen: HashMap<String, bool> = HashMap::new();
        let mut stream = watcher(api, watcher::Config::default()).boxed();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                next = stream.next() => {
                    match next {
                        Some(Ok(event)) => self.handle_event(event, &mut seen),
                        Some(Err(e)) => warn!("informer stream error: {e}"),
                        None => return,
                    }
                },
            }
        }
    }

    fn handle_event(&self, event: watcher::Event<TestResult>, seen: &mut HashMap<String, bool>) {
        match event {
            watcher::Event::Apply(obj) | watcher::Event::InitApply(obj) => self.apply_result(&obj, seen),
            watcher::Event::Delete(obj) => self.delete_result(&obj, seen),
            watcher::Event::Init | watcher::Event::InitDone => {},
        }
    }

    fn apply_result(&self, obj: &TestResult, seen: &mut HashMap<String, bool>) {
        let name = obj.name_any();
        let passed = obj.spec.result;

        metrics::gauge!("kubetest_test_status", "name" => name.clone()).set(if passed { 1.0 } else { 0.0 });
        for (assertion, assertion_passed) in &obj.spec.assertions {
            metrics::gauge!(
                "kubetest_assertion_status",
                "name" => name.clone(),
                "assertion" => assertion.clone()
            )
            .set(if *assertion_passed { 1.0 } else { 0.0 });
        }

        if seen.insert(name, passed).is_none() {
            metrics::gauge!("kubetest_total_tests").increment(1.0);
            if passed {
                metrics::gauge!("kubetest_total_tests_passed").increment(1.0);
            } else {
                metrics::gauge!("kubetest_total_tests_failed").increment(1.0);
            }
        }
    }

    fn delete_result(&self, obj: &TestResult, seen: &mut HashMap<String, bool>) {
        let name = obj.name_any();
        if let Some(passed) = seen.remove(&name) {
            metrics::gauge!("kubetest_total_tests").decrement(1.0);
            if passed {
                metrics::gauge!("kubetest_total_tests_passed").decrement(1.0);
            } else {
                metrics::gauge!("kubetest_total_tests_failed").decrement(1.0);
            }
        }

        // `metrics` has no unregister call; a deleted test's labeled gauges are zeroed rather
        // than removed from the registry.
        metrics::gauge!("kubetest_test_status", "name" => name.clone()).set(0.0);
        for assertion in obj.spec.assertions.keys() {
            metrics::gauge!(
                "kubetest_assertion_status",
                "name" => name.clone(),
                "assertion" => assertion.clone()
            )
            .set(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use kube::api::ObjectMeta;
    use kubetest_core::model::TestOutcome;

    use super::*;

    fn result(name: &str, passed: bool) -> TestResult {
        TestResult {
            metadata: ObjectMeta { name: Some(name.into()), ..Default::default() },
            spec: kubetest_api::v1::TestResultSpec { result: passed, assertions: Default::default() },
        }
    }

    #[test]
    fn test_add_then_update_does_not_double_count() {
        let hub = MetricsHub::new();
        let mut seen = HashMap::new();

        hub.apply_result(&result("t1", true), &mut seen);
        assert_eq!(seen.get("t1"), Some(&true));

        hub.apply_result(&result("t1", false), &mut seen);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen.get("t1"), Some(&false));
    }

    #[test]
    fn test_delete_removes_from_seen() {
        let hub = MetricsHub::new();
        let mut seen = HashMap::new();
        hub.apply_result(&result("t1", true), &mut seen);
        hub.delete_result(&result("t1", true), &mut seen);
        assert!(seen.is_empty());
    }

    #[test]
    fn test_publish_snapshot_handles_mixed_cycle() {
        let hub = MetricsHub::new();
        let cycle = CycleResult {
            tests: vec![
                TestOutcome { name: "a".into(), passed: true, assertions: Default::default() },
                TestOutcome { name: "b".into(), passed: false, assertions: Default::default() },
            ],
        };
        assert_eq!(cycle.total(), 2);
        assert_eq!(cycle.passed(), 1);
        assert_eq!(cycle.failed(), 1);
        hub.publish_snapshot(&cycle);
    }
}
