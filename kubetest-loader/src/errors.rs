use kubetest_core::err_impl;

err_impl! {LoaderError,
    #[error("failed to read test file: {0}")]
    ReadFailed(String),

    #[error("failed to decode test definitions: {0}")]
    DecodeFailed(String),

    #[error("manifest reference could not be resolved: {0}")]
    ManifestUnresolved(String),
}
