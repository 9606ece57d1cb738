use kubetest_core::err_impl;

err_impl! {EngineError,
    #[error("no tests loaded and --once was set")]
    NoTestsOnce(String),

    #[error("failed to persist test result: {0}")]
    PersistFailed(String),
}
