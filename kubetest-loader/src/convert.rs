use std::time::Duration;

use kubetest_api::v1::{
    AssertionSpec,
    TestSpecEntry,
    WaitSpecEntry,
};
use kubetest_core::constants::{
    DEFAULT_WAIT_TIMEOUT_SECONDS,
    YAML_DOCUMENT_DELIMITER,
};
use kubetest_core::model::{
    Assertion,
    TestDefinition,
    WaitSpec,
};
use kubetest_core::objectref::{
    ObjectRef,
    RefSyntax,
};
use tracing::warn;

use crate::errors::LoaderError;

fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECONDS)
}

/// Parses a `"2m"`/`"30s"`-style duration string, falling back to the default timeout on a
/// missing or unparseable value (spec §4.3: "a missing/unparseable timeout defaults to 60
/// seconds").
fn parse_timeout(raw: Option<&str>) -> Duration {
    match raw {
        Some(s) => humantime::parse_duration(s).unwrap_or_else(|_| {
            warn!("unparseable timeout {s:?}, defaulting to {}s", DEFAULT_WAIT_TIMEOUT_SECONDS);
            default_timeout()
        }),
        None => default_timeout(),
    }
}

fn convert_wait_spec(raw: &WaitSpecEntry, syntax: RefSyntax) -> anyhow::Result<WaitSpec> {
    let resource = ObjectRef::parse(&raw.resource, syntax)?;
    Ok(WaitSpec { resource, timeout: parse_timeout(Some(raw.timeout.as_str())) })
}

fn convert_assertion(raw: &AssertionSpec, syntax: RefSyntax) -> anyhow::Result<Assertion> {
    match raw.kind.as_str() {
        "expectedErrors" => Ok(Assertion::ExpectedErrors { name: raw.name.clone(), expected: raw.errors.clone() }),
        _ => {
            let resource_str =
                raw.resource.as_deref().ok_or_else(|| anyhow::anyhow!("assertion {} missing resource", raw.name))?;
            Ok(Assertion::ExpectedResources {
                name: raw.name.clone(),
                resource: ObjectRef::parse(resource_str, syntax)?,
                selectors: raw.selectors.clone(),
                count: raw.count.unwrap_or(0),
                timeout: parse_timeout(raw.timeout.as_deref()),
            })
        },
    }
}

/// Expands a raw `TestSpecEntry` (the YAML/CR shape, with ref strings and manifest paths) into
/// the internal `TestDefinition` (manifests inlined, refs parsed, timeouts resolved). `objects`
/// must already be the decoded manifests for this test, in the same order as
/// `raw.resources`.
pub fn expand_test_spec(
    raw: &TestSpecEntry,
    objects: Vec<kube::api::DynamicObject>,
    syntax: RefSyntax,
) -> anyhow::Result<TestDefinition> {
    let setup_wait_for =
        raw.setup.wait_for.iter().map(|w| convert_wait_spec(w, syntax)).collect::<anyhow::Result<Vec<_>>>()?;
    let teardown_wait_for =
        raw.teardown.wait_for.iter().map(|w| convert_wait_spec(w, syntax)).collect::<anyhow::Result<Vec<_>>>()?;
    let assertions =
        raw.assert.iter().map(|a| convert_assertion(a, syntax)).collect::<anyhow::Result<Vec<_>>>()?;

    Ok(TestDefinition { name: raw.name.clone(), objects, setup_wait_for, teardown_wait_for, assertions })
}

/// Splits a blob on the literal `---` delimiter and decodes each document as an opaque object
/// (spec §4.2's `LoadManifests`), shared by both the filesystem and cluster loader.
pub fn decode_manifests(data: &str) -> anyhow::Result<Vec<kube::api::DynamicObject>> {
    let mut objects = Vec::new();
    for doc in data.split(YAML_DOCUMENT_DELIMITER) {
        if doc.trim().is_empty() {
            continue;
        }
        let obj: kube::api::DynamicObject =
            serde_yaml::from_str(doc).map_err(|e| LoaderError::decode_failed(&e.to_string()))?;
        objects.push(obj);
    }
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::valid("5s", Duration::from_secs(5))]
    #[case::unparseable("bogus", default_timeout())]
    fn test_parse_timeout(#[case] raw: &str, #[case] expected: Duration) {
        assert_eq!(parse_timeout(Some(raw)), expected);
    }

    #[test]
    fn test_parse_timeout_none_defaults() {
        assert_eq!(parse_timeout(None), default_timeout());
    }

    #[test]
    fn test_convert_assertion_expected_errors() {
        let raw = AssertionSpec {
            name: "errs".into(),
            kind: "expectedErrors".into(),
            errors: vec!["boom.*".into()],
            ..Default::default()
        };
        let assertion = convert_assertion(&raw, RefSyntax::Slash).unwrap();
        match assertion {
            Assertion::ExpectedErrors { name, expected } => {
                assert_eq!(name, "errs");
                assert_eq!(expected, vec!["boom.*".to_string()]);
            },
            _ => panic!("expected ExpectedErrors variant"),
        }
    }

    #[test]
    fn test_convert_assertion_expected_resources_requires_resource() {
        let raw = AssertionSpec { name: "res".into(), kind: "expectedResources".into(), ..Default::default() };
        assert_err!(convert_assertion(&raw, RefSyntax::Slash));
    }
}
