use http::Method;

use super::{DuplicatePolicy, RegisterError, ResolveError, RouterBuilder};
use crate::handler::{HandlerDescriptor, ParameterDescriptor};
use crate::typed::{ScalarKind, TypeDescriptor};

fn handler(name: &str, parameters: &[&str]) -> HandlerDescriptor {
    let parameters = parameters
        .iter()
        .map(|n| ParameterDescriptor::new(*n, TypeDescriptor::Scalar(ScalarKind::Text)))
        .collect();
    HandlerDescriptor::new(name, parameters, |_, _| Ok(None))
}

#[test]
fn literal_route_resolves_with_no_keys() {
    let mut builder = RouterBuilder::new();
    builder.route(Method::GET, "/tree", handler("tree", &[])).unwrap();
    let router = builder.build();

    let matched = router.resolve("get", "/tree").unwrap();
    assert_eq!(matched.handlers.len(), 1);
    assert_eq!(matched.handlers[0].name(), "tree");
    assert!(matched.keys.is_empty());

    // Verbs are case-insensitive.
    assert!(router.resolve("GET", "/tree").is_ok());
}

#[test]
fn wildcard_captures_segments_in_order() {
    let mut builder = RouterBuilder::new();
    builder
        .route(Method::GET, "/users/?/roles", handler("roles", &[]))
        .unwrap()
        .route(Method::GET, "/a/?/b/?", handler("pair", &[]))
        .unwrap();
    let router = builder.build();

    let matched = router.resolve("get", "/users/42/roles").unwrap();
    assert_eq!(matched.keys.as_slice(), ["42"]);

    let matched = router.resolve("get", "/a/1/b/2").unwrap();
    assert_eq!(matched.keys.as_slice(), ["1", "2"]);
}

#[test]
fn unknown_path_is_not_found_and_unknown_verb_is_not_allowed() {
    let mut builder = RouterBuilder::new();
    builder.route(Method::GET, "/tree", handler("tree", &[])).unwrap();
    let router = builder.build();

    assert_eq!(
        router.resolve("get", "/missing").unwrap_err(),
        ResolveError::NotFound {
            path: "/missing".to_string()
        }
    );
    assert_eq!(
        router.resolve("post", "/tree").unwrap_err(),
        ResolveError::MethodNotAllowed {
            verb: "post".to_string(),
            path: "/tree".to_string()
        }
    );
}

#[test]
fn literal_children_win_over_the_wildcard() {
    let mut builder = RouterBuilder::new();
    builder
        .route(Method::GET, "/pets/list", handler("list", &[]))
        .unwrap()
        .route(Method::GET, "/pets/?", handler("by_id", &[]))
        .unwrap();
    let router = builder.build();

    let matched = router.resolve("get", "/pets/list").unwrap();
    assert_eq!(matched.handlers[0].name(), "list");
    assert!(matched.keys.is_empty());

    let matched = router.resolve("get", "/pets/9").unwrap();
    assert_eq!(matched.handlers[0].name(), "by_id");
    assert_eq!(matched.keys.as_slice(), ["9"]);
}

#[test]
fn descent_is_greedy_without_backtracking() {
    let mut builder = RouterBuilder::new();
    builder
        .route(Method::GET, "/a/?/z", handler("wild", &[]))
        .unwrap()
        .route(Method::GET, "/a/x/c", handler("literal", &[]))
        .unwrap();
    let router = builder.build();

    // /a/x/z takes the literal "x" branch and dead-ends there; the wildcard
    // subtree is not revisited.
    assert!(matches!(
        router.resolve("get", "/a/x/z"),
        Err(ResolveError::NotFound { .. })
    ));
    assert_eq!(
        router.resolve("get", "/a/y/z").unwrap().keys.as_slice(),
        ["y"]
    );
}

#[test]
fn empty_and_padded_paths_normalize() {
    let mut builder = RouterBuilder::new();
    builder
        .route(Method::GET, "/", handler("root", &[]))
        .unwrap()
        .route(Method::GET, "//tree/", handler("tree", &[]))
        .unwrap();
    let router = builder.build();

    assert_eq!(router.resolve("get", "").unwrap().handlers[0].name(), "root");
    assert_eq!(router.resolve("get", "/").unwrap().handlers[0].name(), "root");
    assert_eq!(
        router.resolve("get", "/tree").unwrap().handlers[0].name(),
        "tree"
    );
}

#[test]
fn duplicate_parameter_sets_follow_policy() {
    let mut builder = RouterBuilder::new();
    builder
        .route(Method::GET, "/calc", handler("v1", &["a", "b"]))
        .unwrap();

    // Same name set in a different order still counts as a duplicate.
    let err = builder
        .route(Method::GET, "/calc", handler("v2", &["b", "a"]))
        .unwrap_err();
    assert!(matches!(err, RegisterError::DuplicateHandler { .. }));

    let mut builder = RouterBuilder::new();
    builder.duplicate_policy(DuplicatePolicy::Replace);
    builder
        .route(Method::GET, "/calc", handler("v1", &["a", "b"]))
        .unwrap()
        .route(Method::GET, "/calc", handler("v3", &["a"]))
        .unwrap()
        .route(Method::GET, "/calc", handler("v2", &["b", "a"]))
        .unwrap();
    let router = builder.build();

    let matched = router.resolve("get", "/calc").unwrap();
    assert_eq!(matched.handlers.len(), 2);
    // Replacement keeps the original registration position.
    assert_eq!(matched.handlers[0].name(), "v2");
    assert_eq!(matched.handlers[1].name(), "v3");
}

#[test]
fn invalid_parameter_declarations_are_rejected() {
    let mut builder = RouterBuilder::new();
    let err = builder
        .route(Method::GET, "/x", handler("dup", &["a", "a"]))
        .unwrap_err();
    assert!(matches!(err, RegisterError::DuplicateParameter { .. }));

    let shaped = HandlerDescriptor::new(
        "shaped",
        vec![ParameterDescriptor::new(
            "m",
            TypeDescriptor::map_value(TypeDescriptor::Scalar(ScalarKind::I64)),
        )],
        |_, _| Ok(None),
    );
    let err = builder.route(Method::GET, "/x", shaped).unwrap_err();
    assert!(matches!(err, RegisterError::UnsupportedParameterType { .. }));
}
