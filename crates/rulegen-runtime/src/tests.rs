#![cfg(test)]

use std::{collections::HashMap, error::Error as _};

use crate::{DiagnosticCollector, Document, Endpoint, InvalidParams, ResolveEndpointError};

#[test]
fn test_endpoint_builder() {
    let endpoint = Endpoint::builder()
        .url("https://example.com")
        .header("x-a", "1")
        .header("x-a", "2")
        .header("x-b", "3")
        .property("authSchemes", vec![Document::from("sigv4")])
        .property("flag", true)
        .build();

    assert_eq!(endpoint.url(), "https://example.com");
    assert_eq!(endpoint.header("x-a").collect::<Vec<_>>(), ["1", "2"]);
    assert_eq!(endpoint.header("missing").count(), 0);
    assert_eq!(endpoint.headers().len(), 2);
    assert_eq!(
        endpoint.properties().get("authSchemes"),
        Some(&Document::Array(vec![Document::String("sigv4".into())]))
    );
    assert_eq!(endpoint.properties().get("flag"), Some(&Document::Bool(true)));
}

#[test]
fn test_document_accessors() {
    let mut obj = HashMap::new();
    obj.insert("name".to_owned(), Document::from("sigv4"));
    let doc = Document::from(obj);
    assert_eq!(
        doc.as_object().and_then(|o| o.get("name")).and_then(Document::as_str),
        Some("sigv4")
    );
    assert_eq!(Document::from(3i64).as_str(), None);
}

#[test]
fn test_diagnostic_collector() {
    let mut dc = DiagnosticCollector::new();
    assert_eq!(dc.capture(Ok::<_, std::fmt::Error>(1)), Some(1));
    assert!(dc.take_last_error().is_none());

    assert_eq!(dc.capture(Err::<i32, _>("first")), None);
    dc.report_error("second");
    let err = dc.take_last_error().expect("should have an error");
    assert_eq!(err.to_string(), "second");
    assert!(dc.take_last_error().is_none());
}

#[test]
fn test_resolve_endpoint_error() {
    let err = ResolveEndpointError::message("no match")
        .with_source(Some("bad host label".into()));
    assert_eq!(err.to_string(), "no match");
    assert_eq!(
        err.source().map(|s| s.to_string()).as_deref(),
        Some("bad host label")
    );

    let err = ResolveEndpointError::message(format!("{} {}", "formatted", 1)).with_source(None);
    assert!(err.source().is_none());

    assert_eq!(
        InvalidParams::missing("region").to_string(),
        "a required field was missing: `region`"
    );
}
