use kube::api::DynamicObject;

use crate::errors::KubetestCoreError;

/// Which literal character separates the components of a ref-string.  Filesystem-mode test
/// definitions use `/`, cluster-mode ones use `:` (see spec §6 and §9's "ref-string ambiguity"
/// design note -- we pick one syntax per loader and never mix them).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RefSyntax {
    Slash,
    Colon,
}

impl RefSyntax {
    fn sep(self) -> char {
        match self {
            RefSyntax::Slash => '/',
            RefSyntax::Colon => ':',
        }
    }
}

/// Identifies a cluster object: `{ apiVersion, kind, namespace (optional), name }`.
///
/// Namespace absence is distinct from the empty namespace -- a cluster-scoped ref and a
/// namespaced ref whose namespace happens to be the empty string are different things, though in
/// practice the latter never arises from a parsed ref string (an empty namespace component is
/// trimmed the same as if it had been omitted is *not* done here -- "" is valid input and yields
/// `Some(String::new())`, only a genuinely missing component yields `None`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ObjectRef {
    pub api_version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectRef {
    pub fn cluster_scoped(api_version: &str, kind: &str, name: &str) -> ObjectRef {
        ObjectRef { api_version: api_version.into(), kind: kind.into(), namespace: None, name: name.into() }
    }

    pub fn namespaced(api_version: &str, kind: &str, namespace: &str, name: &str) -> ObjectRef {
        ObjectRef {
            api_version: api_version.into(),
            kind: kind.into(),
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// Parses `"apiVersion/kind/name"` (cluster-scoped) or `"apiVersion/kind/namespace/name"`
    /// (namespace-scoped) using the given separator.  A ref-string with fewer than three
    /// non-empty components is rejected.  Requires the apiVersion component to be a single path
    /// segment -- groups with a literal separator character must use the other `RefSyntax`.
    pub fn parse(raw: &str, syntax: RefSyntax) -> anyhow::Result<ObjectRef> {
        let sep = syntax.sep();
        let trimmed = raw.trim_matches(sep);
        let parts: Vec<&str> = trimmed.split(sep).collect();

        if parts.len() < 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(KubetestCoreError::malformed_object_ref(raw));
        }

        match parts.len() {
            3 => Ok(ObjectRef::cluster_scoped(parts[0], parts[1], parts[2])),
            4 => Ok(ObjectRef::namespaced(parts[0], parts[1], parts[2], parts[3])),
            _ => Err(KubetestCoreError::malformed_object_ref(raw)),
        }
    }
}

/// Path accessors over an opaque, dynamically-typed object manifest.  We never inspect
/// `DynamicObject`'s structure beyond these four fields (per spec §3).
pub trait OpaqueObjectExt {
    fn object_ref(&self) -> anyhow::Result<ObjectRef>;
}

impl OpaqueObjectExt for DynamicObject {
    fn object_ref(&self) -> anyhow::Result<ObjectRef> {
        let types = self
            .types
            .as_ref()
            .ok_or_else(|| KubetestCoreError::field_not_found("apiVersion/kind"))?;
        let name = self.metadata.name.clone().ok_or_else(|| KubetestCoreError::field_not_found("metadata.name"))?;

        Ok(ObjectRef {
            api_version: types.api_version.clone(),
            kind: types.kind.clone(),
            namespace: self.metadata.namespace.clone(),
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::cluster_scoped("v1/Namespace/ns-1", RefSyntax::Slash, ObjectRef::cluster_scoped("v1", "Namespace", "ns-1"))]
    #[case::namespaced("v1/Pod/ns-1/my-pod", RefSyntax::Slash, ObjectRef::namespaced("v1", "Pod", "ns-1", "my-pod"))]
    #[case::leading_trailing_slash("/v1/Pod/ns-1/my-pod/", RefSyntax::Slash, ObjectRef::namespaced("v1", "Pod", "ns-1", "my-pod"))]
    #[case::colon_syntax("v1:Pod:ns-1:my-pod", RefSyntax::Colon, ObjectRef::namespaced("v1", "Pod", "ns-1", "my-pod"))]
    fn test_parse_ok(#[case] raw: &str, #[case] syntax: RefSyntax, #[case] expected: ObjectRef) {
        assert_eq!(ObjectRef::parse(raw, syntax).unwrap(), expected);
    }

    #[rstest]
    #[case::too_few_components("v1/Pod", RefSyntax::Slash)]
    #[case::empty_component("v1//my-pod", RefSyntax::Slash)]
    #[case::empty_string("", RefSyntax::Slash)]
    fn test_parse_rejects(#[case] raw: &str, #[case] syntax: RefSyntax) {
        assert_err!(ObjectRef::parse(raw, syntax));
    }
}
