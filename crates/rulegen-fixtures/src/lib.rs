//! Code generated from `fixtures/` at build time.
//!
//! Each ruleset module holds a generated resolver and, under
//! `cfg(test)`, the tests generated from its test suite.
//! [`traversals`] holds functions generated from JMESPath
//! expressions over the types in [`model`].

pub mod model;


macro_rules! ruleset {
    ($name:ident) => {
        #[allow(unused_qualifications, unused, clippy::all)]
        #[rustfmt::skip]
        pub mod $name {
            include!(concat!(env!("OUT_DIR"), "/", stringify!($name), ".rs"));

        }
    };
}

ruleset!(basic);
ruleset!(regional);
ruleset!(aws);
ruleset!(fallback);

/// Traversals of [`model::Output`].
#[allow(unused_qualifications, unused, clippy::all)]
#[rustfmt::skip]
pub mod traversals {
    include!(concat!(env!("OUT_DIR"), "/traversals.rs"));
}
