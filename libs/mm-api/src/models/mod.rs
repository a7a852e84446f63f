//! API models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Members subscribed for one metadata type: either a single name
/// (`"Account"` or the `"*"` wildcard) or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PackageMembers {
    One(String),
    Many(Vec<String>),
}

impl PackageMembers {
    /// Member names in declaration order
    pub fn names(&self) -> Vec<&str> {
        match self {
            PackageMembers::One(name) => vec![name.as_str()],
            PackageMembers::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// Package descriptor keyed by metadata type, e.g. `{"CustomObject": "Account"}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageDescriptor(pub BTreeMap<String, PackageMembers>);

impl PackageDescriptor {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn types(&self) -> impl Iterator<Item = (&String, &PackageMembers)> {
        self.0.iter()
    }
}

/// Test execution level for a deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestLevel {
    NoTestRun,
    RunSpecifiedTests,
    RunLocalTests,
    RunAllTestsInOrg,
}

impl TestLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestLevel::NoTestRun => "NoTestRun",
            TestLevel::RunSpecifiedTests => "RunSpecifiedTests",
            TestLevel::RunLocalTests => "RunLocalTests",
            TestLevel::RunAllTestsInOrg => "RunAllTestsInOrg",
        }
    }
}

/// Deploy behavior flags
///
/// Unknown flags are kept in `extra` so a caller's options reach the
/// remote engine untouched. Only scalar and string-list values can be
/// expressed on the wire; other shapes are dropped there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_only: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_on_error: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_all_tests: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_level: Option<TestLevel>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_tests: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_warnings: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_package: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_missing_files: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub purge_on_delete: Option<bool>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Handle returned by an asynchronous metadata call (deploy or retrieve)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncResult {
    pub id: String,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub done: bool,
}

/// One component the remote compile rejected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentFailure {
    #[serde(default)]
    pub component_type: Option<String>,

    #[serde(default)]
    pub file_name: Option<String>,

    #[serde(default)]
    pub full_name: Option<String>,

    pub problem: String,

    #[serde(default)]
    pub problem_type: Option<String>,

    #[serde(default)]
    pub line_number: Option<u32>,
}

/// One failing test method run as part of a deploy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFailure {
    pub name: String,

    #[serde(default)]
    pub method_name: Option<String>,

    pub message: String,

    #[serde(default)]
    pub stack_trace: Option<String>,
}

/// Final state of a deploy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    pub id: String,
    pub status: String,
    pub success: bool,
    pub done: bool,

    #[serde(default)]
    pub check_only: bool,

    #[serde(default)]
    pub error_message: Option<String>,

    #[serde(default)]
    pub number_components_deployed: u32,

    #[serde(default)]
    pub number_component_errors: u32,

    #[serde(default)]
    pub number_tests_completed: u32,

    #[serde(default)]
    pub number_test_errors: u32,

    #[serde(default)]
    pub component_failures: Vec<ComponentFailure>,

    #[serde(default)]
    pub test_failures: Vec<TestFailure>,
}

/// Final state of a retrieve; `files` are the paths unpacked under `src/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveResult {
    pub id: String,
    pub status: String,
    pub success: bool,
    pub done: bool,

    #[serde(default)]
    pub error_message: Option<String>,

    #[serde(default)]
    pub files: Vec<String>,

    /// Per-file warnings, `"<file>: <problem>"`
    #[serde(default)]
    pub messages: Vec<String>,
}
