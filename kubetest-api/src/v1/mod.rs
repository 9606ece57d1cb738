mod test_definition;
mod test_resource;
mod test_result;

pub use test_definition::{
    AssertionSpec,
    TestDefinition,
    TestDefinitionSpec,
    TestSpecEntry,
    WaitForSpec,
    WaitSpecEntry,
};
pub use test_resource::{
    TestResource,
    TestResourceSpec,
};
pub use test_result::{
    TestResult,
    TestResultSpec,
};
