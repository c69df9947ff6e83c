use super::{DelegatePath, ReverseError, RouteOptions, RouteTable, Router, RouterOptions};
use crate::handler::{named, Handler, HandlerResult, Reply, SharedHandler, TerminalResponse};
use crate::server::{Request, Response};
use http::{Method, StatusCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Answers with its payload, plus the extracted variables when there are any
fn view(payload: &'static str) -> SharedHandler {
    named(payload, move |req: &mut Request| {
        let body = if req.urlvars().is_empty() {
            json!(payload)
        } else {
            json!([payload, req.urlvars()])
        };
        Ok(Some(Reply::Response(Response::ok(body))))
    })
}

fn decline(name: &'static str) -> SharedHandler {
    named(name, |_req: &mut Request| Ok(None))
}

fn body(router: &Router, target: &str) -> Value {
    response(router, Request::blank(target)).body
}

fn response(router: &Router, mut req: Request) -> Response {
    router
        .dispatch(&mut req)
        .unwrap()
        .and_then(Reply::into_response)
        .unwrap()
}

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_simple_paths() {
    let mut r = Router::new();
    r.route("/", view("root")).unwrap();
    r.route("/path", view("path")).unwrap();
    r.route("/path/", view("path_slash")).unwrap();
    r.route("/path/{element}", view("path_var")).unwrap();

    assert_eq!(body(&r, "/"), json!("root"));
    assert_eq!(body(&r, "/path"), json!("path"));
    assert_eq!(body(&r, "/path/"), json!("path_slash"));
    assert_eq!(body(&r, "/path/pie"), json!(["path_var", {"element": "pie"}]));
}

#[test]
fn test_default_is_not_found() {
    let r = Router::new();
    assert_eq!(response(&r, Request::blank("/")).status, StatusCode::NOT_FOUND);
    assert_eq!(response(&r, Request::blank("/path")).status, StatusCode::NOT_FOUND);
}

#[test]
fn test_bare_router_has_no_result() {
    let r = Router::bare();
    let mut req = Request::blank("/");
    assert!(r.dispatch(&mut req).unwrap().is_none());
}

#[test]
fn test_catch_all_template() {
    let mut r = Router::new();
    r.add_route(None, view("catchall"), RouteOptions::default()).unwrap();
    r.add_route(Some("/"), view("something"), RouteOptions::new().priority(1))
        .unwrap();

    assert_eq!(body(&r, "/"), json!("something"));
    assert_eq!(body(&r, "/x"), json!("catchall"));
}

#[test]
fn test_regex_placeholders() {
    let mut r = Router::new().with_default(Some(view("default")));
    r.route("/{d:\\d+}", view("digit")).unwrap();
    r.route("/{d:\\d+}/", view("digitSlash")).unwrap();
    r.route("/term/{t:[^_]+}", view("incSlash")).unwrap();

    assert_eq!(body(&r, "/1234"), json!(["digit", {"d": "1234"}]));
    assert_eq!(body(&r, "/1234/"), json!(["digitSlash", {"d": "1234"}]));
    assert_eq!(body(&r, "/term/abc/def"), json!(["incSlash", {"t": "abc/def"}]));
    assert_eq!(body(&r, "/abc"), json!("default"));
}

#[test]
fn test_wrong_slash_without_try_slashes() {
    let mut r = Router::new().with_default(Some(view("wrong")));
    r.route("/path", view("path")).unwrap();
    let mut r2 = Router::new().with_default(Some(view("wrong")));
    r2.route("/path/", view("path")).unwrap();

    assert_eq!(body(&r, "/path"), json!("path"));
    assert_eq!(body(&r2, "/path/"), json!("path"));
    assert_eq!(body(&r, "/path/"), json!("wrong"));
    assert_eq!(body(&r2, "/path"), json!("wrong"));
}

#[test]
fn test_wrong_slash_with_try_slashes() {
    let mut r = Router::new().with_default(Some(view("wrong"))).try_slashes(true);
    r.route("/path", view("path")).unwrap();
    let mut r2 = Router::new().with_default(Some(view("wrong"))).try_slashes(true);
    r2.route("/path/", view("path")).unwrap();

    assert_eq!(body(&r, "/path"), json!("path"));
    assert_eq!(body(&r2, "/path/"), json!("path"));

    let redirect = response(&r, Request::blank("/path/"));
    assert_eq!(redirect.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(redirect.location(), Some("http://localhost/path"));

    let redirect = response(&r2, Request::blank("/path"));
    assert_eq!(redirect.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(redirect.location(), Some("http://localhost/path/"));
}

#[test]
fn test_redirect_keeps_query_string() {
    let mut r = Router::new().try_slashes(true);
    r.route("/path/", view("path")).unwrap();
    let redirect = response(&r, Request::blank("/path?x=1"));
    assert_eq!(redirect.location(), Some("http://localhost/path/?x=1"));
}

#[test]
fn test_no_alt_redirect_falls_through_to_default() {
    let mut r = Router::new().with_default(Some(view("wrong"))).try_slashes(true);
    r.add_route(Some("/path"), view("path"), RouteOptions::new().no_alt_redirect())
        .unwrap();
    assert_eq!(body(&r, "/path/"), json!("wrong"));
    assert_eq!(body(&r, "/path"), json!("path"));
}

#[test]
fn test_no_redirect_to_a_handler_that_already_declined() {
    let shared = decline("shy");
    let mut r = Router::new().with_default(Some(view("wrong"))).try_slashes(true);
    r.route("/path", Arc::clone(&shared)).unwrap();
    r.route("/path/", shared).unwrap();
    assert_eq!(body(&r, "/path"), json!("wrong"));
}

#[test]
fn test_priority_ordering() {
    let mut r = Router::new();
    r.add_route(Some("/1"), view("low"), RouteOptions::new().priority(-1)).unwrap();
    r.route("/1", view("normal")).unwrap();
    assert_eq!(body(&r, "/1"), json!("normal"));

    r.route("/2", view("normal")).unwrap();
    r.add_route(Some("/2"), view("low"), RouteOptions::new().priority(-1)).unwrap();
    assert_eq!(body(&r, "/2"), json!("normal"));

    let mut r = Router::new();
    r.add_route(Some("/3"), view("high"), RouteOptions::new().priority(1)).unwrap();
    r.route("/3", view("normal")).unwrap();
    r.add_route(Some("/3"), view("low"), RouteOptions::new().priority(-1)).unwrap();
    assert_eq!(body(&r, "/3"), json!("high"));

    let priorities: Vec<i32> = r.routes().iter().map(|route| route.priority()).collect();
    assert_eq!(priorities, vec![1, 0, -1]);
}

#[test]
fn test_equal_priority_keeps_insertion_order() {
    let mut r = Router::new();
    r.route("/x", view("first")).unwrap();
    r.route("/x", view("second")).unwrap();
    r.add_route(Some("/x"), view("top"), RouteOptions::new().priority(5)).unwrap();
    let names: Vec<&str> = r.routes().iter().map(|route| route.view_name()).collect();
    assert_eq!(names, vec!["top", "first", "second"]);
}

#[test]
fn test_declining_handler_lets_next_route_answer() {
    let mut r = Router::new();
    r.add_route(Some("/x"), decline("shy"), RouteOptions::new().priority(1)).unwrap();
    r.route("/x", view("fallback")).unwrap();
    assert_eq!(body(&r, "/x"), json!("fallback"));
}

#[test]
fn test_method_filter() {
    let mut r = Router::new();
    r.add_route(Some("/get"), view("get"), RouteOptions::new().methods([Method::GET]))
        .unwrap();
    r.route("/any", view("any")).unwrap();

    let head = Request::blank("/get").with_method(Method::HEAD);
    assert_eq!(response(&r, head).body, json!("get"));
    let post = Request::blank("/get").with_method(Method::POST);
    assert_eq!(response(&r, post).status, StatusCode::NOT_FOUND);
    let delete = Request::blank("/any").with_method(Method::DELETE);
    assert_eq!(response(&r, delete).body, json!("any"));
}

#[test]
fn test_static_vars_override_path_vars() {
    let mut r = Router::new();
    r.add_route(
        Some("/item/{kind}/{id}"),
        view("item"),
        RouteOptions::new().var("kind", "fixed").var("extra", "1"),
    )
    .unwrap();
    assert_eq!(
        body(&r, "/item/pet/7"),
        json!(["item", {"kind": "fixed", "id": "7", "extra": "1"}])
    );
}

#[test]
fn test_delegation_shifts_path() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in = Arc::clone(&seen);
    let mut child = Router::bare();
    child
        .add_route(
            None,
            named("inner", move |req: &mut Request| {
                if let Ok(mut seen) = seen_in.lock() {
                    seen.push((req.script_name().to_string(), req.path_info().to_string()));
                }
                Ok(Some(Reply::Response(Response::text("inner"))))
            }),
            RouteOptions::default(),
        )
        .unwrap();

    let mut r = Router::new();
    r.add_route(
        Some("/test"),
        child,
        RouteOptions::new().delegate(DelegatePath::Anything),
    )
    .unwrap();

    assert_eq!(body(&r, "/test/pants"), json!("inner"));
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[("/test".to_string(), "/pants".to_string())]
    );
}

#[test]
fn test_declined_delegation_is_undone() {
    let child = RouteTable::new().route("/only", view("only"));
    let observed = Arc::new(Mutex::new(None));
    let observed_in = Arc::clone(&observed);

    let mut r = Router::new();
    r.add_route(
        Some("/{section}"),
        child,
        RouteOptions::new()
            .delegate(DelegatePath::Anything)
            .priority(1),
    )
    .unwrap();
    r.add_route(
        None,
        named("fallback", move |req: &mut Request| {
            if let Ok(mut observed) = observed_in.lock() {
                *observed = Some(req.context.clone());
            }
            Ok(Some(Reply::Response(Response::text("fallback"))))
        }),
        RouteOptions::default(),
    )
    .unwrap();

    assert_eq!(body(&r, "/a/only"), json!("only"));
    assert_eq!(body(&r, "/a/other"), json!("fallback"));

    let ctx = observed.lock().unwrap().clone().unwrap();
    assert_eq!(ctx.script_name, "");
    assert_eq!(ctx.path_info, "/a/other");
    assert!(ctx.urlvars.is_empty());
}

#[test]
fn test_passthrough_returns_handler() {
    let raw = named("raw_app", |req: &mut Request| {
        Ok(Some(Reply::Response(Response::text(req.path_info().to_string()))))
    });
    let mut r = Router::new();
    r.add_route(
        Some("/app"),
        Arc::clone(&raw),
        RouteOptions::new()
            .delegate(DelegatePath::Anything)
            .passthrough(),
    )
    .unwrap();

    let mut req = Request::blank("/app/sub");
    let reply = r.dispatch(&mut req).unwrap().unwrap();
    let Reply::Passthrough(handler) = reply else {
        panic!("expected a passthrough reply");
    };
    assert_eq!(handler.name(), "raw_app");
    assert_eq!(req.script_name(), "/app");
    assert_eq!(req.path_info(), "/sub");

    let resp = handler.call(&mut req).unwrap().unwrap().into_response().unwrap();
    assert_eq!(resp.body, json!("/sub"));
}

fn raising(location: &'static str) -> SharedHandler {
    named("raising", move |_req: &mut Request| -> HandlerResult {
        Err(TerminalResponse(Response::redirect(location)))
    })
}

#[test]
fn test_raised_response_is_caught() {
    let mut r = Router::new();
    r.route("/", raising("/elsewhere")).unwrap();
    r.route("/", view("never")).unwrap();
    let resp = response(&r, Request::blank("/"));
    assert_eq!(resp.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.location(), Some("/elsewhere"));
}

#[test]
fn test_raised_response_propagates_when_not_caught() {
    let mut r = Router::new().catch_raised_responses(false);
    r.route("/", raising("/elsewhere")).unwrap();
    let mut req = Request::blank("/");
    let err = r.dispatch(&mut req).unwrap_err();
    assert_eq!(err.0.location(), Some("/elsewhere"));
}

#[test]
fn test_nested_table_options() {
    let inner = RouteTable::new()
        .route("/leaf/", view("leaf"))
        .options(RouterOptions {
            try_slashes: true,
            catch_raised_responses: true,
        });
    let mut r = Router::new();
    r.add_route(
        Some("/outer"),
        inner,
        RouteOptions::new().delegate(DelegatePath::Anything),
    )
    .unwrap();

    let redirect = response(&r, Request::blank("/outer/leaf"));
    assert_eq!(redirect.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(redirect.location(), Some("http://localhost/outer/leaf/"));
}

#[test]
fn test_malformed_path_is_bad_request() {
    let mut r = Router::new();
    r.add_route(None, view("anything"), RouteOptions::default()).unwrap();
    assert_eq!(response(&r, Request::blank("/bad%FF")).status, StatusCode::BAD_REQUEST);
}

#[test]
fn test_reverse() {
    let mut r = Router::new();
    let element = r.route("/path/{element}", view("path_var")).unwrap();
    let catch_all = r.add_route(None, view("catchall"), RouteOptions::default()).unwrap();
    let mount = r
        .add_route(
            Some("/mount/{id}"),
            view("mounted"),
            RouteOptions::new().delegate(DelegatePath::Anything),
        )
        .unwrap();

    assert_eq!(
        r.reverse(&element, &vars(&[("element", "pie")]), None).unwrap(),
        "/path/pie"
    );
    assert_eq!(
        r.reverse("path_var", &vars(&[("element", "cake")]), None).unwrap(),
        "/path/cake"
    );
    assert_eq!(
        r.reverse(&mount, &vars(&[("id", "3")]), Some("/rest/of/it")).unwrap(),
        "/mount/3/rest/of/it"
    );
    assert_eq!(
        r.reverse(&catch_all, &HashMap::new(), None),
        Err(ReverseError::NotReversible {
            route: "catchall".to_string()
        })
    );
    assert!(matches!(
        r.reverse("nope", &HashMap::new(), None),
        Err(ReverseError::NotFound { .. })
    ));
    assert!(matches!(
        r.reverse(&element, &HashMap::new(), None),
        Err(ReverseError::MissingVariable { .. })
    ));
}

#[test]
fn test_reverse_by_handler_identity() {
    let handler = view("by_identity");
    let stranger = view("by_identity");
    let mut r = Router::new();
    r.route("/found/{x}", Arc::clone(&handler)).unwrap();

    assert_eq!(
        r.reverse(&handler, &vars(&[("x", "1")]), None).unwrap(),
        "/found/1"
    );
    assert!(matches!(
        r.reverse(&stranger, &HashMap::new(), None),
        Err(ReverseError::NotFound { .. })
    ));
}

#[test]
fn test_invalid_template_fails_registration() {
    let mut r = Router::new();
    assert!(r.route("/{broken", view("x")).is_err());
    assert!(r.routes().is_empty());
}

#[test]
fn test_unresolvable_identifier_yields_server_error() {
    let mut r = Router::new();
    r.route("/missing", "nonexistent.invalid:view").unwrap();
    let resp = response(&r, Request::blank("/missing"));
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_route_dispatch_shifts_and_restores_context() {
    let mut r = Router::new();
    let app = r
        .add_route(
            Some("/app"),
            named("app", |req: &mut Request| {
                let seen = format!("{}|{}", req.script_name(), req.path_info());
                Ok(Some(Reply::Response(Response::text(seen))))
            }),
            RouteOptions::new().delegate(DelegatePath::Pattern("(/.*)?".to_string())),
        )
        .unwrap();
    let shy = r
        .add_route(
            Some("/{section}"),
            decline("shy"),
            RouteOptions::new().delegate(DelegatePath::Anything),
        )
        .unwrap();

    let mut req = Request::blank("/app");
    let resp = app.dispatch(&mut req).unwrap().and_then(Reply::into_response).unwrap();
    assert_eq!(resp.body, json!("/app|"));

    let mut req = Request::blank("/app/sub");
    let resp = app.dispatch(&mut req).unwrap().and_then(Reply::into_response).unwrap();
    assert_eq!(resp.body, json!("/app|/sub"));
    assert_eq!(req.script_name(), "/app");
    assert_eq!(req.path_info(), "/sub");

    let mut req = Request::blank("/docs/intro");
    let before = req.context.clone();
    assert!(shy.dispatch(&mut req).unwrap().is_none());
    assert_eq!(req.context, before);

    let mut req = Request::blank("/elsewhere");
    assert!(app.dispatch(&mut req).unwrap().is_none());
    assert_eq!(req.path_info(), "/elsewhere");
}

#[test]
fn test_matches_in_order_and_alternate_filter() {
    let mut r = Router::new();
    r.add_route(Some("/path/"), view("strict"), RouteOptions::new().no_alt_redirect())
        .unwrap();
    r.add_route(Some("/path/"), view("loose"), RouteOptions::new().priority(-1))
        .unwrap();
    r.add_route(Some("/{any}/"), view("high"), RouteOptions::new().priority(1))
        .unwrap();

    let req = Request::blank("/path/");
    let names: Vec<&str> = r.matches(&req, false).map(|route| route.view_name()).collect();
    assert_eq!(names, vec!["high", "strict", "loose"]);
    let alternate: Vec<&str> = r.matches(&req, true).map(|route| route.view_name()).collect();
    assert_eq!(alternate, vec!["high", "loose"]);
    assert_eq!(r.first_match(&req, false).map(|route| route.view_name()), Some("high"));

    let miss = Request::blank("/path");
    assert_eq!(r.matches(&miss, false).count(), 0);
    assert!(r.first_match(&miss, false).is_none());
}

#[test]
fn test_from_env_uses_runtime_config() {
    let r = Router::from_env();
    let expected: RouterOptions = crate::runtime_config::RuntimeConfig::from_env().into();
    assert_eq!(r.options(), expected);
    assert!(r.default_handler().is_some());
}
