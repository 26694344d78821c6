use readwell::config::PolicyConfig;
use readwell::policy::{DomainPolicies, RobotsGate, origin_key};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

fn gate(policies: DomainPolicies) -> RobotsGate {
    RobotsGate::new(policies, &PolicyConfig::default()).unwrap()
}

fn url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
}

async fn mount_robots(server: &MockServer, body: &str, expected_fetches: u64) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("Content-Type", "text/plain"),
        )
        .expect(expected_fetches)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_disallowed_path_is_blocked() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /private/\n", 1).await;

    let gate = gate(DomainPolicies::new());
    assert!(!gate.is_allowed(&url(&server, "/private/story")).await);
    assert!(gate.is_allowed(&url(&server, "/public/story")).await);
}

#[tokio::test]
async fn test_robots_fetched_once_per_origin() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /\n", 1).await;

    let policies = DomainPolicies::new();
    let gate = gate(policies.clone());
    for p in ["/a", "/b", "/c"] {
        assert!(gate.is_allowed(&url(&server, p)).await);
    }

    let origin = origin_key(&url(&server, "/"));
    let cached = policies.get(&origin).expect("origin recorded");
    assert!(cached.robots.is_some());
    assert!(cached.robots_checked_at.is_some());
}

#[tokio::test]
async fn test_rules_for_our_agent_apply() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        "User-agent: ReadwellBot\nDisallow: /\n\nUser-agent: *\nAllow: /\n",
        1,
    )
    .await;

    let gate = gate(DomainPolicies::new());
    assert!(!gate.is_allowed(&url(&server, "/story")).await);
}

#[tokio::test]
async fn test_robots_request_identifies_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .and(header("user-agent", "ReadwellBot"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow:\n"))
        .expect(1)
        .mount(&server)
        .await;

    assert!(gate(DomainPolicies::new()).is_allowed(&url(&server, "/story")).await);
}

#[tokio::test]
async fn test_missing_robots_allows_and_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let gate = gate(DomainPolicies::new());
    assert!(gate.is_allowed(&url(&server, "/one")).await);
    assert!(gate.is_allowed(&url(&server, "/two")).await);
}

#[tokio::test]
async fn test_server_error_fails_open_without_caching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let gate = gate(DomainPolicies::new());
    assert!(gate.is_allowed(&url(&server, "/one")).await);
    assert!(gate.is_allowed(&url(&server, "/two")).await);
}

#[tokio::test]
async fn test_unreachable_host_fails_open() {
    // Nothing listens on the discard port.
    let target = Url::parse("http://127.0.0.1:9/story").unwrap();
    assert!(gate(DomainPolicies::new()).is_allowed(&target).await);
}
