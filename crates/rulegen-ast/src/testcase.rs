use indexmap::IndexMap;
use serde_derive::{Deserialize, Serialize};

use crate::ParameterValue;

/// A file of endpoint test cases.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    /// The test cases, in order.
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

/// A declarative endpoint resolution test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// What the test checks.
    #[serde(default)]
    pub documentation: Option<String>,
    /// Input parameters, by ruleset name.
    #[serde(default)]
    pub params: IndexMap<String, ParameterValue>,
    /// The expected outcome.
    pub expect: Expectation,
}

/// The expected outcome of a [`TestCase`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expectation {
    /// Resolution succeeds with this endpoint.
    Endpoint(ExpectedEndpoint),
    /// Resolution fails with this message.
    Error(String),
}

/// The endpoint a [`TestCase`] expects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpectedEndpoint {
    /// The URL.
    pub url: String,
    /// Headers, each with one or more values.
    #[serde(default)]
    pub headers: IndexMap<String, Vec<String>>,
    /// Endpoint properties.
    #[serde(default)]
    pub properties: IndexMap<String, PropertyValue>,
}

/// A JSON-like endpoint property value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// A string.
    String(String),
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// An array.
    Array(Vec<PropertyValue>),
    /// An object.
    Object(IndexMap<String, PropertyValue>),
}
