pub mod constants;
pub mod errors;
pub mod logging;
pub mod macros;
pub mod model;
pub mod objectref;
pub mod selectors;

pub mod prelude {
    pub use kube::api::DynamicObject;
    pub use kube::ResourceExt;

    pub use crate::constants::*;
    pub use crate::errors::EmptyResult;
    pub use crate::model::{
        Assertion,
        CycleResult,
        TestDefinition,
        TestOutcome,
        WaitSpec,
    };
    pub use crate::objectref::{
        ObjectRef,
        OpaqueObjectExt,
        RefSyntax,
    };
}
