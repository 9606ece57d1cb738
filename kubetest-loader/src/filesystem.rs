use std::collections::BTreeMap;
use std::fs;
use std::path::{
    Path,
    PathBuf,
};

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use kubetest_api::v1::TestSpecEntry;
use kubetest_core::objectref::RefSyntax;
use kubetest_core::prelude::*;

use crate::convert::{
    decode_manifests,
    expand_test_spec,
};
use crate::errors::LoaderError;
use crate::loader::Loader;

/// Filesystem realization of [`Loader`]: `location` is a directory, each `*.yaml` file decodes
/// to a list of [`TestSpecEntry`] (spec §4.2), and each entry's `resources` are manifest paths
/// resolved relative to the directory.
///
/// Grounded on `examples/original_source/pkg/loader/filesystem.go`, re-expressed with typed
/// errors and per-file failure isolation instead of aborting the whole batch.
pub struct FilesystemLoader {
    root: PathBuf,
}

impl FilesystemLoader {
    pub fn new(root: impl Into<PathBuf>) -> FilesystemLoader {
        FilesystemLoader { root: root.into() }
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

#[async_trait]
impl Loader for FilesystemLoader {
    async fn load_tests(
        &mut self,
        location: &str,
        _selectors: &BTreeMap<String, Value>,
    ) -> anyhow::Result<Vec<TestDefinition>> {
        let dir = Path::new(location);
        let mut tests = Vec::new();

        let entries = fs::read_dir(dir).map_err(|e| LoaderError::read_failed(&format!("{location}: {e}")))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("yaml"))
            .collect();
        files.sort();

        for file in files {
            let data = match fs::read_to_string(&file) {
                Ok(d) => d,
                Err(e) => {
                    warn!("failed to read test file {}: {e}", file.display());
                    continue;
                },
            };

            let raw_tests: Vec<TestSpecEntry> = match serde_yaml::from_str(&data) {
                Ok(t) => t,
                Err(e) => {
                    warn!("failed to decode test definitions in {}: {e}", file.display());
                    continue;
                },
            };

            for raw in &raw_tests {
                match expand_one(dir, raw).await {
                    Ok(def) => tests.push(def),
                    Err(e) => warn!("dropping test {} in {}: {e}", raw.name, file.display()),
                }
            }
        }

        Ok(tests)
    }

    async fn load_manifests(&mut self, reference: &str) -> anyhow::Result<Vec<DynamicObject>> {
        let path = self.resolve(reference);
        let data = fs::read_to_string(&path)
            .map_err(|e| LoaderError::read_failed(&format!("{}: {e}", path.display())))?;
        decode_manifests(&data)
    }
}

async fn expand_one(dir: &Path, raw: &TestSpecEntry) -> anyhow::Result<TestDefinition> {
    let mut objects = Vec::with_capacity(raw.resources.len());
    for relative in &raw.resources {
        let path = dir.join(relative);
        let data = fs::read_to_string(&path)
            .map_err(|e| LoaderError::manifest_unresolved(&format!("{relative}: {e}")))?;
        objects.extend(decode_manifests(&data)?);
    }

    expand_test_spec(raw, objects, RefSyntax::Slash)
}

#[cfg(test)]
mod tests {
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_load_manifests_splits_on_delimiter() {
        let dir = TempDir::new().unwrap();
        let file = dir.child("pod.yaml");
        file.write_str(
            "apiVersion: v1\nkind: Pod\nmetadata:\n  name: a\n---\napiVersion: v1\nkind: Pod\nmetadata:\n  name: b\n",
        )
        .unwrap();

        let mut loader = FilesystemLoader::new(dir.path());
        let objs = loader.load_manifests("pod.yaml").await.unwrap();
        assert_eq!(objs.len(), 2);
        assert_eq!(objs[0].metadata.name.as_deref(), Some("a"));
        assert_eq!(objs[1].metadata.name.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_load_tests_skips_malformed_file() {
        let dir = TempDir::new().unwrap();
        dir.child("broken.yaml").write_str("not: [valid test spec").unwrap();
        dir.child("good.yaml")
            .write_str(
                "- name: smoke\n  resources:\n    - pod.yaml\n",
            )
            .unwrap();
        dir.child("pod.yaml")
            .write_str("apiVersion: v1\nkind: Pod\nmetadata:\n  name: a\n")
            .unwrap();

        let mut loader = FilesystemLoader::new(dir.path());
        let tests = loader.load_tests(dir.path().to_str().unwrap(), &BTreeMap::new()).await.unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].name, "smoke");
    }
}
