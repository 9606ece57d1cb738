use crate::err_impl;

pub type EmptyResult = anyhow::Result<()>;

err_impl! {KubetestCoreError,
    #[error("unparseable object reference: {0}")]
    MalformedObjectRef(String),

    #[error("field not found on object: {0}")]
    FieldNotFound(String),
}
