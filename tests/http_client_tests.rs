use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use series_access::acl::{actions, AclDocument};
use series_access::client::{AdminApi, HttpAdminApi, RoleQuery};
use series_access::config::AdminConfig;
use series_access::error::AppError;
use series_access::series::metadata::SeriesMetadata;

#[derive(Default)]
struct Recorded {
    access_forms: Vec<HashMap<String, String>>,
    metadata_forms: Vec<HashMap<String, String>>,
    theme_forms: Vec<HashMap<String, String>>,
    theme_deletes: usize,
    role_queries: Vec<HashMap<String, String>>,
}

type Shared = Arc<Mutex<Recorded>>;

async fn me() -> Json<Value> {
    Json(json!({
        "user": {"username": "jdoe", "name": "J. Doe"},
        "org": {"id": "mh_default_org", "properties": {"aai.org": "example.org"}},
        "roles": ["ROLE_ADMIN"],
        "userRole": "ROLE_USER_JDOE"
    }))
}

async fn access(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    if id == "missing" {
        return Err(StatusCode::NOT_FOUND);
    }
    let acl = json!({"acl": {"ace": [
        {"role": "ROLE_ANONYMOUS", "action": "cast-view", "allow": true},
        {"role": "ROLE_ANONYMOUS", "action": "cast-discover", "allow": "true"},
        {"role": "ROLE_USER_JDOE", "action": "write", "allow": true}
    ]}});
    Ok(Json(json!({"series_access": {"acl": acl.to_string(), "locked": false, "privileges": {"ROLE_ADMIN": {}}}})))
}

async fn save_access(State(rec): State<Shared>, Form(form): Form<HashMap<String, String>>) -> StatusCode {
    rec.lock().access_forms.push(form);
    StatusCode::NO_CONTENT
}

async fn roles(State(rec): State<Shared>, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    rec.lock().role_queries.push(q);
    Json(json!([{"name": "ROLE_ADMIN", "value": "Admin"}, {"name": "ROLE_USER"}]))
}

async fn resource(Path(name): Path<String>) -> Result<Json<Value>, StatusCode> {
    match name.as_str() {
        "ACL.ACTIONS.json" => Ok(Json(json!({"cast-view": "View", "$resolved": true}))),
        "USERS.SWITCH.ROLE.json" => Ok(Json(json!({"Jane Doe": "ROLE_USER_JANE"}))),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn metadata() -> Json<Value> {
    Json(json!([{"flavor": "dublincore/series", "title": "t", "fields": [{"id": "identifier", "value": "uid-1"}]}]))
}

async fn save_metadata(State(rec): State<Shared>, Form(form): Form<HashMap<String, String>>) -> StatusCode {
    rec.lock().metadata_forms.push(form);
    StatusCode::OK
}

async fn save_theme(State(rec): State<Shared>, Form(form): Form<HashMap<String, String>>) -> StatusCode {
    rec.lock().theme_forms.push(form);
    StatusCode::OK
}

async fn delete_theme(State(rec): State<Shared>) -> StatusCode {
    rec.lock().theme_deletes += 1;
    StatusCode::NO_CONTENT
}

async fn forbidden() -> (StatusCode, &'static str) {
    (StatusCode::FORBIDDEN, "not allowed")
}

// Start the mock admin backend on an ephemeral localhost port.
async fn start_backend() -> anyhow::Result<(JoinHandle<()>, SocketAddr, Shared)> {
    let rec: Shared = Arc::new(Mutex::new(Recorded::default()));
    let app = Router::new()
        .route("/info/me.json", get(me))
        .route("/admin-ng/series/{id}/access.json", get(access))
        .route("/admin-ng/series/{id}/access", post(save_access))
        .route("/admin-ng/resources/ROLES.json", get(roles))
        .route("/admin-ng/resources/{name}", get(resource))
        .route("/admin-ng/series/{id}/metadata.json", get(metadata))
        .route("/admin-ng/series/{id}/metadata", put(save_metadata))
        .route("/admin-ng/series/{id}/theme", put(save_theme).delete(delete_theme))
        .route("/acl-manager/acl/{id}", get(forbidden))
        .with_state(rec.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("mock backend error: {e:?}");
        }
    });
    Ok((handle, addr, rec))
}

struct Guard(JoinHandle<()>);
impl Drop for Guard { fn drop(&mut self) { self.0.abort(); } }

fn client_for(addr: SocketAddr) -> anyhow::Result<HttpAdminApi> {
    let cfg = AdminConfig { base_url: format!("http://{}", addr), user: Some("admin".into()), password: Some("opencast".into()), ..AdminConfig::default() };
    Ok(HttpAdminApi::new(&cfg)?)
}

#[tokio::test]
async fn reads_user_and_series_access() -> anyhow::Result<()> {
    let (srv, addr, _) = start_backend().await?;
    let _g = Guard(srv);
    let api = client_for(addr)?;

    let me = api.current_user().await?;
    assert_eq!(me.aai_org(), Some("example.org"));
    assert_eq!(me.user_role(), Some("ROLE_USER_JDOE"));

    let env = api.series_access("s1").await?;
    let access = env.series_access.expect("access block");
    let aces = access.entries()?;
    assert_eq!(aces.len(), 3);
    assert!(aces.iter().all(|a| a.allow));
    assert!(access.privileges.contains_key("ROLE_ADMIN"));

    match api.series_access("missing").await {
        Err(AppError::NotFound { .. }) => {}
        other => panic!("expected not found, got {:?}", other),
    }
    match api.managed_acl(3).await {
        Err(e @ AppError::Auth { .. }) => assert_eq!(e.message(), "not allowed"),
        other => panic!("expected auth error, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn posts_acl_as_form_fields() -> anyhow::Result<()> {
    let (srv, addr, rec) = start_backend().await?;
    let _g = Guard(srv);
    let api = client_for(addr)?;

    let aces = vec![series_access::acl::AccessControlEntry::allow("ROLE_A", actions::READ)];
    let update = series_access::acl::AccessUpdate { acl: AclDocument::new(aces.clone()).acl, override_events: true };
    api.save_series_access("s1", &update).await?;

    let forms = rec.lock().access_forms.clone();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].get("override").map(String::as_str), Some("true"));
    let doc: AclDocument = serde_json::from_str(&forms[0]["acl"])?;
    assert_eq!(doc.acl.ace, aces);
    Ok(())
}

#[tokio::test]
async fn role_queries_and_resource_lists() -> anyhow::Result<()> {
    let (srv, addr, rec) = start_backend().await?;
    let _g = Guard(srv);
    let api = client_for(addr)?;

    let roles = api.list_roles(&RoleQuery::new(100, 0, Some("ADM"))).await?;
    assert_eq!(roles.len(), 2);
    let q = rec.lock().role_queries[0].clone();
    assert_eq!(q.get("filter").map(String::as_str), Some("role_name:ADM,role_target:ACL"));
    assert_eq!(q.get("limit").map(String::as_str), Some("100"));

    let actions = api.resource_list("ACL.ACTIONS").await?;
    assert_eq!(actions.len(), 1);
    let users = api.switch_users().await?;
    assert_eq!(users[0].value, "ROLE_USER_JANE");
    Ok(())
}

#[tokio::test]
async fn metadata_and_theme_writes() -> anyhow::Result<()> {
    let (srv, addr, rec) = start_backend().await?;
    let _g = Guard(srv);
    let api = client_for(addr)?;

    let md: SeriesMetadata = api.series_metadata("s1").await?;
    let catalog = md.entries[0].prepare_for_save("identifier");
    api.save_series_metadata("s1", &catalog).await?;
    api.save_series_theme("s1", "12").await?;
    api.delete_series_theme("s1").await?;

    let r = rec.lock();
    let sent: Value = serde_json::from_str(&r.metadata_forms[0]["metadata"])?;
    assert_eq!(sent[0]["attributeToSend"], "identifier");
    assert_eq!(r.theme_forms[0].get("themeId").map(String::as_str), Some("12"));
    assert_eq!(r.theme_deletes, 1);
    Ok(())
}
