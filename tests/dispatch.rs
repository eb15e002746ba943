//! End-to-end dispatch: filters, priority, 404/405, binding, negotiation.

use std::fs;
use std::sync::{Arc, Mutex};

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use trellis::{
    ConfigError, Context, DispatchEvent, DispatchObserver, Dispatcher, Form, Json, KeyValues, Outcome, Payload,
    Request, Resource, Response, Router,
};

async fn get(d: &Dispatcher, target: &str) -> Response {
    d.dispatch(Request::from_target(Method::GET, target)).await
}

async fn post(d: &Dispatcher, target: &str) -> Response {
    d.dispatch(Request::from_target(Method::POST, target)).await
}

async fn post_form(d: &Dispatcher, path: &str, form: &[(&str, &str)]) -> Response {
    let form: KeyValues = form.iter().copied().collect();
    d.dispatch(Request::new(Method::POST, path).with_form(form)).await
}

fn assert_produces(res: &Response, status: StatusCode, content_type: &str, body: &str) {
    assert_eq!(res.status(), status);
    assert_eq!(res.content_type(), content_type);
    assert_eq!(res.text(), body);
}

#[tokio::test]
async fn not_found() {
    let d = Dispatcher::default();
    assert_produces(&get(&d, "/notfound").await, StatusCode::NOT_FOUND, "text/html", "Page not found");
}

#[tokio::test]
async fn path_placeholders() {
    let d = Dispatcher::new(
        Router::new()
            .get("/hello/:name", |name: String| async move { format!("Hello {name}") })
            .and_then(|r| r.get("/other/:name", |name: String| async move { format!("Other {name}") }))
            .and_then(|r| r.get("/say/:what/how/:loud", |what: String, loud: String| async move {
                format!("{what} {loud}")
            }))
            .and_then(|r| r.get("/:one/:two/:three", |a: String, b: String, c: String| async move {
                format!("{a} {b} {c}")
            }))
            .unwrap(),
    );

    assert_produces(&get(&d, "/hello/Dave").await, StatusCode::OK, "text/html", "Hello Dave");
    assert_eq!(get(&d, "/other/Joe").await.text(), "Other Joe");
    assert_eq!(get(&d, "/say/HI/how/LOUD").await.text(), "HI LOUD");
    assert_eq!(get(&d, "/ONE/TWO/THREE").await.text(), "ONE TWO THREE");
    assert_eq!(get(&d, "/hello/Dave/").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn query_placeholders_and_key_values() {
    let d = Dispatcher::new(
        Router::new()
            .get("/index", || async { "Hello" })
            .and_then(|r| r.get("/hello?name=:name", |name: String| async move { format!("Hello {name}") }))
            .and_then(|r| r.get("/page/:id?size=:size", |id: u32, size: u32| async move {
                format!("{id}:{size}")
            }))
            .and_then(|r| r.get("/keyValues", |kv: KeyValues| async move { kv.to_string() }))
            .unwrap(),
    );

    assert_eq!(get(&d, "/index?query=useless").await.text(), "Hello");
    assert_eq!(get(&d, "/hello?name=Dave").await.text(), "Hello Dave");
    assert_eq!(get(&d, "/hello").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&d, "/page/3?size=20").await.text(), "3:20");
    assert_eq!(get(&d, "/keyValues?key1=value1&key2=value2").await.text(), "key1=value1&key2=value2");
}

#[derive(Serialize)]
struct Person {
    name: &'static str,
    age: u32,
}

#[tokio::test]
async fn content_types() {
    let d = Dispatcher::new(
        Router::new()
            .get("/index", || async { "Hello" })
            .and_then(|r| r.get("/text", || async { Payload::new("text/plain", "TEXT") }))
            .and_then(|r| r.get("/raw", || async { b"RAW".to_vec() }))
            .and_then(|r| r.get("/json", || async { Json(Person { name: "NAME", age: 42 }) }))
            .and_then(|r| r.get("/stream", || async {
                Payload::stream("text/html", std::io::Cursor::new(b"Hello".to_vec()))
            }))
            .and_then(|r| r.get("/add/:left/:right", |left: i32, right: i32| async move { left + right }))
            .unwrap(),
    );

    assert_produces(&get(&d, "/index").await, StatusCode::OK, "text/html", "Hello");
    assert_produces(&get(&d, "/text").await, StatusCode::OK, "text/plain", "TEXT");
    assert_produces(&get(&d, "/raw").await, StatusCode::OK, "application/octet-stream", "RAW");
    assert_produces(&get(&d, "/json").await, StatusCode::OK, "application/json", r#"{"name":"NAME","age":42}"#);
    assert_produces(&get(&d, "/stream").await, StatusCode::OK, "text/html", "Hello");
    assert_produces(&get(&d, "/add/22/20").await, StatusCode::OK, "application/json", "42");
}

#[tokio::test]
async fn arity_mismatch_fails_at_registration() {
    let err = Router::new().get("/hello/:name", || async { "Hello" }).unwrap_err();
    assert!(matches!(err, ConfigError::ArityMismatch { expected: 1, found: 0, .. }));

    let resource = Resource::new().get("/bye/:whom", |a: String, b: String| async move { a + &b });
    assert!(matches!(Router::new().resource(resource), Err(ConfigError::ArityMismatch { .. })));
}

#[tokio::test]
async fn last_registered_route_wins() {
    let d = Dispatcher::new(
        Router::new()
            .get("/:page", |_: String| async { "GENERIC" })
            .and_then(|r| r.get("/", || async { "FIRST" }))
            .and_then(|r| r.get("/", || async { "PRIORITY" }))
            .unwrap(),
    );
    assert_eq!(get(&d, "/").await.text(), "PRIORITY");
    assert_eq!(get(&d, "/about").await.text(), "GENERIC");
}

#[tokio::test]
async fn filters_run_first_and_in_order() {
    let d = Dispatcher::new(
        Router::new()
            .get("/", || async { "NOT FILTERED" })
            .and_then(|r| r.get("/other", || async { "OTHER" }))
            .unwrap()
            .filter(|req: &Request| (req.path() == "/").then(|| Payload::html("FILTERED")))
            .filter(|_: &Request| -> Option<Payload> { Some(Payload::html("SECOND")) }),
    );

    assert_produces(&get(&d, "/").await, StatusCode::OK, "text/html", "FILTERED");
    assert_eq!(get(&d, "/other").await.text(), "SECOND");

    let d = Dispatcher::new(
        Router::new()
            .get("/", || async { "NOT FILTERED" })
            .and_then(|r| r.get("/other", || async { "OTHER" }))
            .unwrap()
            .filter(|req: &Request| (req.path() == "/").then(|| Payload::html("FILTERED"))),
    );
    assert_eq!(get(&d, "/other").await.text(), "OTHER");
}

#[tokio::test]
async fn method_disambiguation() {
    let d = Dispatcher::new(
        Router::new()
            .post("/post", || async { "Done" })
            .and_then(|r| r.get("/get", || async { "Done" }))
            .and_then(|r| r.get("/action", || async { "Done GET" }))
            .and_then(|r| r.post("/action", || async { "Done POST" }))
            .and_then(|r| r.post("/post/:who", |who: String| async move { format!("Done {who}") }))
            .and_then(|r| r.resource(Resource::new().post_all(&["/person", "/person_alt"], || async { "CREATED" })))
            .unwrap(),
    );

    assert_eq!(post(&d, "/post").await.text(), "Done");
    assert_eq!(post(&d, "/post/Bob").await.text(), "Done Bob");
    assert_eq!(post(&d, "/action").await.text(), "Done POST");
    assert_eq!(get(&d, "/action").await.text(), "Done GET");
    assert_eq!(post(&d, "/person").await.text(), "CREATED");
    assert_eq!(post(&d, "/person_alt").await.text(), "CREATED");

    assert_produces(&post(&d, "/get").await, StatusCode::METHOD_NOT_ALLOWED, "text/html", "Method not allowed");
    assert_eq!(get(&d, "/post").await.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(post(&d, "/unknown").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&d, "/unknown").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_content_is_lowest_priority_and_method_checked() {
    let site = tempfile::tempdir().unwrap();
    fs::write(site.path().join("index.html"), "Hello From a File").unwrap();
    fs::write(site.path().join("test.html"), "TEST").unwrap();
    fs::write(site.path().join("_config.yaml"), "secret").unwrap();
    fs::create_dir(site.path().join("assets")).unwrap();
    fs::write(site.path().join("assets/style.css"), "* {}").unwrap();

    let d = Dispatcher::new(
        Router::new()
            .static_dir(site.path())
            .get("/test", || async { "ROUTE" })
            .unwrap(),
    );

    assert_produces(&get(&d, "/").await, StatusCode::OK, "text/html", "Hello From a File");
    assert_produces(&get(&d, "/index.html").await, StatusCode::OK, "text/html", "Hello From a File");
    assert_produces(&get(&d, "/assets/style.css").await, StatusCode::OK, "text/css", "* {}");
    assert_eq!(get(&d, "/test").await.text(), "ROUTE");
    assert_eq!(get(&d, "/test.html").await.text(), "TEST");

    assert_eq!(get(&d, "/_config.yaml").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&d, "/../private.txt").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(post(&d, "/index.html").await.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(post(&d, "/unknown").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mounted_resources() {
    let greeting = Arc::new(String::from("Hello"));
    let hello = {
        let greeting = Arc::clone(&greeting);
        move || {
            let greeting = greeting.to_string();
            async move { greeting }
        }
    };

    let resource = Resource::new()
        .get_all(&["/hello", "/"], hello)
        .get("/bye/:whom", |whom: String| async move { format!("Good Bye {whom}") })
        .get("/add/:left/:right", |left: i32, right: i32| async move { left + right });

    let d = Dispatcher::new(
        Router::new()
            .resource(resource)
            .and_then(|r| r.mount("/say", Resource::new().get("/hello", || async { "Hello" })))
            .unwrap(),
    );

    assert_eq!(get(&d, "/hello").await.text(), "Hello");
    assert_eq!(get(&d, "/").await.text(), "Hello");
    assert_eq!(get(&d, "/bye/Bob").await.text(), "Good Bye Bob");
    assert_produces(&get(&d, "/add/22/20").await, StatusCode::OK, "application/json", "42");
    assert_eq!(get(&d, "/say/hello").await.text(), "Hello");
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Human {
    first_name: String,
    last_name: String,
}

#[tokio::test]
async fn form_bodies() {
    let d = Dispatcher::new(
        Router::new()
            .post("/postForm", |ctx: Context| async move {
                format!("CREATED {} {}", ctx.get("firstName").unwrap_or(""), ctx.get("lastName").unwrap_or(""))
            })
            .and_then(|r| r.post("/postFormResource", |kv: KeyValues| async move {
                format!("CREATED {} {}", kv.get("firstName").unwrap_or(""), kv.get("lastName").unwrap_or(""))
            }))
            .and_then(|r| r.post("/postBean", |Form(human): Form<Human>| async move {
                format!("CREATED {} {}", human.first_name, human.last_name)
            }))
            .unwrap(),
    );

    let form = [("firstName", "John"), ("lastName", "Doe")];
    assert_eq!(post_form(&d, "/postForm", &form).await.text(), "CREATED John Doe");
    assert_eq!(post_form(&d, "/postFormResource", &[("firstName", "Jane"), ("lastName", "Doe")]).await.text(), "CREATED Jane Doe");
    assert_eq!(post_form(&d, "/postBean", &form).await.text(), "CREATED John Doe");
    assert_eq!(post_form(&d, "/postBean", &[("firstName", "John"), ("age", "12")]).await.text(), "CREATED John ");
}

#[tokio::test]
async fn binding_failure_is_bad_request() {
    let d = Dispatcher::new(
        Router::new()
            .get("/add/:left/:right", |left: i32, right: i32| async move { left + right })
            .unwrap(),
    );
    assert_produces(&get(&d, "/add/one/2").await, StatusCode::BAD_REQUEST, "text/html", "Bad request");
}

#[tokio::test]
async fn handler_failures_are_generic_500s() {
    let d = Dispatcher::new(
        Router::new()
            .get("/", || async { Err::<String, _>("BUG") })
            .and_then(|r| r.get("/panic", || async {
                if true {
                    panic!("BUG");
                }
                "unreachable"
            }))
            .unwrap(),
    );

    for path in ["/", "/panic"] {
        assert_produces(
            &get(&d, path).await,
            StatusCode::INTERNAL_SERVER_ERROR,
            "text/html",
            "An error occurred on the server",
        );
    }
}

#[tokio::test]
async fn redirect() {
    let d = Dispatcher::new(
        Router::new()
            .get("/", || async { Payload::see_other("/login") })
            .unwrap(),
    );
    let res = get(&d, "/").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[http::header::LOCATION], "/login");
}

#[tokio::test]
async fn configure_and_reset_swap_the_whole_table() {
    let d = Dispatcher::default();
    d.configure(|r| r.get("/", || async { "ONE" })).unwrap();
    assert_eq!(get(&d, "/").await.text(), "ONE");

    let failed = d.configure(|r| r.get("/", || async { "TWO" })?.get("/x/:y", || async { "bad" }));
    assert!(failed.is_err());
    assert_eq!(get(&d, "/").await.text(), "ONE");

    let snapshot = d.router();
    d.reset();
    assert_eq!(get(&d, "/").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(snapshot.route_count(), 1);
    assert_eq!(d.router().route_count(), 0);
}

type Seen = Arc<Mutex<Vec<(String, Outcome, u16)>>>;

struct Recorder(Seen);

impl DispatchObserver for Recorder {
    fn on_dispatch(&self, event: &DispatchEvent<'_>) {
        self.0.lock().unwrap().push((event.path.to_owned(), event.outcome, event.status.as_u16()));
    }
}

#[tokio::test]
async fn observer_sees_every_outcome() {
    let seen: Seen = Arc::default();

    let d = Dispatcher::new(
        Router::new()
            .get("/ok", || async { "ok" })
            .and_then(|r| r.get("/n/:n", |n: u8| async move { n }))
            .unwrap()
            .filter(|req: &Request| (req.path() == "/f").then(|| Payload::html("f"))),
    )
    .with_observer(Recorder(Arc::clone(&seen)));

    get(&d, "/ok").await;
    get(&d, "/f").await;
    get(&d, "/missing").await;
    post(&d, "/ok").await;
    get(&d, "/n/x").await;

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec![
        ("/ok".to_owned(), Outcome::Handled, 200),
        ("/f".to_owned(), Outcome::Filtered, 200),
        ("/missing".to_owned(), Outcome::NotFound, 404),
        ("/ok".to_owned(), Outcome::MethodNotAllowed, 405),
        ("/n/x".to_owned(), Outcome::BadRequest, 400),
    ]);
}
