//! The data model described by `fixtures/schema.json`.

use std::collections::HashMap;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Output {
    pub foo: Foo,
    pub items: Vec<Item>,
    pub tags: Option<Vec<String>>,
    pub groups: Option<Vec<Group>>,
    pub labels: Option<HashMap<String, String>>,
    pub status: Option<Status>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Foo {
    pub bar: Option<String>,
    pub size: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub name: Option<String>,
    pub state: Status,
    pub weight: f64,
    pub tags: Option<Vec<String>>,
}

impl Item {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_owned()),
            state: Status::Active,
            weight: 1.0,
            tags: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Group {
    pub members: Option<Vec<Item>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Active,
    Retired,
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "Active",
            Self::Retired => "Retired",
        }
    }
}
