use kubetest_core::err_impl;

err_impl! {ProvisionerError,
    #[error("could not resolve REST mapping for {0}")]
    MappingFailed(String),

    #[error("apply conflict: {0}")]
    ApplyConflict(String),

    #[error("transport error: {0}")]
    Transport(String),
}
