use std::sync::Arc;

use chrono::Duration;
use reqwest::StatusCode;
use serde_json::{json, Value};

use goodjob_api::app::{build_app_with, AppDeps};
use goodjob_api::config::Config;
use goodjob_api::identity::{IdentityProvider, InMemoryIdentityProvider};
use goodjob_api::mailer::RecordingMailer;
use goodjob_auth::{AuthClaims, Hs256TokenVerifier};
use goodjob_store::{DocumentStore, MemoryStore};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    store: Arc<MemoryStore>,
    identity: Arc<InMemoryIdentityProvider>,
    mailer: Arc<RecordingMailer>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port, with handles on
        // the collaborators so tests can look behind the API.
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(InMemoryIdentityProvider::new());
        let mailer = Arc::new(RecordingMailer::new());
        let deps = AppDeps {
            store: store.clone(),
            identity: identity.clone(),
            mailer: mailer.clone(),
        };
        let app = build_app_with(Config::for_tests(JWT_SECRET), deps).await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            identity,
            mailer,
            handle,
        }
    }

    /// Seed a staff document so `uid` carries the given role.
    async fn seed_role(&self, uid: &str, rol: &str) {
        let doc = match json!({
            "uid": uid,
            "nombres": "Staff",
            "apellidos": "User",
            "rut": "12345678-5",
            "correo": format!("{uid}@goodjob.cl"),
            "area": "a1",
            "rol": rol,
            "requiereCambioPassword": true,
            "creadoEn": "2025-01-01T00:00:00Z"
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        self.store.set("usuariosWeb", uid, doc).await.unwrap();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(uid: &str, email: Option<&str>) -> String {
    let verifier = Hs256TokenVerifier::new(JWT_SECRET.as_bytes());
    let claims = AuthClaims::new(uid, email.map(str::to_string), Duration::minutes(10));
    verifier.mint(&claims).expect("failed to mint jwt")
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_is_required_for_everything_else() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/encuestas", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "authentication_required");

    let res = client
        .get(format!("{}/encuestas", srv.base_url))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn mobile_user_create_list_and_duplicate_rut() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt("admin-1", Some("admin@goodjob.cl"));

    let res = client
        .post(format!("{}/UsuarioMovil", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "nombres": "Ana",
            "apellidos": "Lopez",
            "rut": "12345678-5",
            "correo": "ana@x.com",
            "rol": "UsuarioAppMovil"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    let uid = body["uid"].as_str().unwrap().to_string();
    assert_eq!(body["correo"], "ana@x.com");
    assert_eq!(body["tempPassword"], "ana@x.com");

    // Welcome email went out with the temporary credentials.
    let sent = srv.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ana@x.com");

    let res = client
        .get(format!("{}/UsuarioMovil", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let list: Vec<Value> = res.json().await.unwrap();
    assert!(list.iter().any(|u| u["id"] == uid.as_str()));

    // Same RUT again, different email: rejected with the exact message the
    // frontend matches on.
    let res = client
        .post(format!("{}/UsuarioMovil", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "nombres": "Otra",
            "apellidos": "Persona",
            "rut": "12345678-5",
            "correo": "otra@x.com",
            "rol": "UsuarioAppMovil"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "conflict");
    assert_eq!(body["message"], "El RUT ya está registrado.");
}

#[tokio::test]
async fn invalid_rut_is_rejected_before_any_write() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt("admin-1", None);

    let res = client
        .post(format!("{}/UsuarioMovil", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "nombres": "Ana",
            "apellidos": "Lopez",
            "rut": "12345678-4",
            "correo": "ana@x.com",
            "rol": "UsuarioAppMovil"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(srv.mailer.sent().len(), 0);
}

#[tokio::test]
async fn duplicate_rut_on_update_leaves_identity_untouched() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt("admin-1", None);

    // Ana holds the RUT that Ben's update will try to take.
    for (nombres, rut, correo) in [
        ("Ana", "12345678-5", "ana@x.com"),
        ("Ben", "12345679-3", "ben@x.com"),
    ] {
        let res = client
            .post(format!("{}/UsuarioMovil", srv.base_url))
            .bearer_auth(&token)
            .json(&json!({
                "nombres": nombres,
                "apellidos": "Soto",
                "rut": rut,
                "correo": correo,
                "rol": "UsuarioAppMovil"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }
    let users: Vec<Value> = client
        .get(format!("{}/UsuarioMovil", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ben_uid = users
        .iter()
        .find(|u| u["correo"] == "ben@x.com")
        .and_then(|u| u["id"].as_str())
        .unwrap()
        .to_string();

    let res = client
        .patch(format!("{}/UsuarioMovil/{}", srv.base_url, ben_uid))
        .bearer_auth(&token)
        .json(&json!({
            "nombres": "Ben",
            "apellidos": "Soto",
            "rut": "12345678-5",
            "correo": "ben.new@x.com",
            "contacto": "+569",
            "rol": "UsuarioAppMovil"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "El RUT ya está registrado.");

    // The document kept its old values...
    let doc = srv.store.get("UsuarioMovil", &ben_uid).await.unwrap().unwrap();
    assert_eq!(doc["correo"], "ben@x.com");
    assert_eq!(doc["rut"], "12345679-3");

    // ...and so did the identity account: the rejected address is still free.
    srv.identity
        .create_account("ben.new@x.com", "pw", "Someone Else")
        .await
        .expect("address must not be held by a failed update");
}

#[tokio::test]
async fn bulk_import_isolates_row_failures() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt("admin-1", None);

    // One good row, one bad check digit, one email already taken by row 0.
    let res = client
        .post(format!("{}/UsuarioMovil/bulk", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "area": "a1",
            "usuarios": [
                {"nombres": "Ana", "apellidos": "Lopez", "rut": "12345678-5",
                 "correo": " ANA@x.com ", "contacto": "+5691"},
                {"nombres": "Mal", "apellidos": "Rut", "rut": "12345678-4",
                 "correo": "mal@x.com", "contacto": "+5692"},
                {"nombres": "Dup", "apellidos": "Correo", "rut": "12345679-3",
                 "correo": "ana@x.com", "contacto": "+5693"}
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();

    assert_eq!(body["total"], 3);
    assert_eq!(body["ok"], 1);
    assert_eq!(body["error"], 2);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["status"], "ok");
    assert_eq!(results[0]["correo"], "ana@x.com");
    assert_eq!(results[1]["status"], "error");
    assert_eq!(results[1]["error"], "RUT inválido (formato y DV)");
    assert_eq!(results[2]["status"], "error");
    assert_eq!(results[2]["error"], "Correo ya registrado");

    // Only the successful row produced a user and a welcome email.
    let users: Vec<Value> = client
        .get(format!("{}/UsuarioMovil", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["area"], "a1");
    assert_eq!(srv.mailer.sent().len(), 1);
}

#[tokio::test]
async fn unknown_estado_on_create_returns_json_error() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt("creator-1", None);

    let res = client
        .post(format!("{}/abusos", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "usuarioId": "emp-1", "estado": "Archivado" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["message"], "Estado inválido");
}

#[tokio::test]
async fn only_assigned_gestor_may_annotate_a_case() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let creator = mint_jwt("creator-1", None);
    let gestor = mint_jwt("gestor-1", None);
    let stranger = mint_jwt("stranger-1", None);

    let res = client
        .post(format!("{}/abusos", srv.base_url))
        .bearer_auth(&creator)
        .json(&json!({ "usuarioId": "emp-1", "gestorAsignado": "gestor-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let case: Value = res.json().await.unwrap();
    let caso_id = case["abusoId"].as_str().unwrap().to_string();
    assert_eq!(case["estado"], "Pendiente");

    let obs_body = json!({ "casoId": caso_id, "gestorId": "gestor-1", "texto": "Primer contacto" });

    let res = client
        .post(format!("{}/observaciones", srv.base_url))
        .bearer_auth(&stranger)
        .json(&obs_body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(format!("{}/observaciones", srv.base_url))
        .bearer_auth(&gestor)
        .json(&obs_body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/observaciones?casoId={}", srv.base_url, caso_id))
        .bearer_auth(&gestor)
        .send()
        .await
        .unwrap();
    let list: Vec<Value> = res.json().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["texto"], "Primer contacto");
}

#[tokio::test]
async fn case_edit_is_gated_by_ownership_or_admin() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let creator = mint_jwt("creator-1", None);
    let gestor = mint_jwt("gestor-1", None);
    let stranger = mint_jwt("stranger-1", None);
    let admin = mint_jwt("admin-1", None);
    srv.seed_role("admin-1", "Admin RRHH").await;

    let res = client
        .post(format!("{}/abusos", srv.base_url))
        .bearer_auth(&creator)
        .json(&json!({ "usuarioId": "emp-1", "gestorAsignado": "gestor-1" }))
        .send()
        .await
        .unwrap();
    let caso_id = res.json::<Value>().await.unwrap()["abusoId"]
        .as_str()
        .unwrap()
        .to_string();

    let patch = json!({ "estado": "En proceso" });
    for (token, expected) in [
        (&stranger, StatusCode::FORBIDDEN),
        (&gestor, StatusCode::OK),
        (&creator, StatusCode::OK),
        (&admin, StatusCode::OK),
    ] {
        let res = client
            .patch(format!("{}/abusos/{}", srv.base_url, caso_id))
            .bearer_auth(token)
            .json(&patch)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), expected);
    }

    // Unknown estado value is rejected even for the creator.
    let res = client
        .patch(format!("{}/abusos/{}", srv.base_url, caso_id))
        .bearer_auth(&creator)
        .json(&json!({ "estado": "Archivado" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn audit_entry_carries_full_before_and_after_images() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt("admin-1", Some("admin@goodjob.cl"));

    let res = client
        .post(format!("{}/areas", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "nombreArea": "Ventas",
            "nombreEncargado": "Ana",
            "correoEncargado": "ana@goodjob.cl"
        }))
        .send()
        .await
        .unwrap();
    let area_id = res.json::<Value>().await.unwrap()["areaId"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .patch(format!("{}/areas/{}", srv.base_url, area_id))
        .bearer_auth(&token)
        .json(&json!({
            "nombreArea": "Ventas y Marketing",
            "nombreEncargado": "Ana",
            "correoEncargado": "ana@goodjob.cl"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/auditoria", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let logs: Vec<Value> = res.json().await.unwrap();
    let edit = logs
        .iter()
        .find(|l| l["accion"] == "Editar area")
        .expect("edit audit entry missing");
    assert_eq!(edit["entidadId"], area_id.as_str());
    assert_eq!(edit["usuarioUid"], "admin-1");
    assert_eq!(edit["detalle"]["antes"]["nombreArea"], "Ventas");
    assert_eq!(edit["detalle"]["despues"]["nombreArea"], "Ventas y Marketing");
}

#[tokio::test]
async fn deleting_an_area_cleans_every_reference() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt("admin-1", None);

    let res = client
        .post(format!("{}/areas", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "nombreArea": "Ventas",
            "nombreEncargado": "Ana",
            "correoEncargado": "ana@goodjob.cl"
        }))
        .send()
        .await
        .unwrap();
    let area_id = res.json::<Value>().await.unwrap()["areaId"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .post(format!("{}/encuestas", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "titulo": "Clima 2025",
            "preguntas": [{"texto": "¿Cómo estás?", "tipo": "texto"}],
            "area": area_id
        }))
        .send()
        .await
        .unwrap();
    let survey_id = res.json::<Value>().await.unwrap()["encuestaId"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .post(format!("{}/UsuarioMovil", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "nombres": "Ana",
            "apellidos": "Lopez",
            "rut": "12345678-5",
            "correo": "ana@x.com",
            "rol": "UsuarioAppMovil",
            "area": area_id
        }))
        .send()
        .await
        .unwrap();
    let user_uid = res.json::<Value>().await.unwrap()["uid"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .delete(format!("{}/areas/{}", srv.base_url, area_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["encuestasActualizadas"], 1);
    assert_eq!(body["usuariosActualizados"], 1);

    let res = client
        .get(format!("{}/encuestas/{}", srv.base_url, survey_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let survey: Value = res.json().await.unwrap();
    assert_eq!(survey["area"], json!([]));

    let res = client
        .get(format!("{}/UsuarioMovil", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let users: Vec<Value> = res.json().await.unwrap();
    let user = users.iter().find(|u| u["id"] == user_uid.as_str()).unwrap();
    assert_eq!(user["area"], "");
}

#[tokio::test]
async fn web_user_routes_are_role_gated() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let roleless = mint_jwt("nobody-1", None);
    let admin = mint_jwt("admin-1", None);
    srv.seed_role("admin-1", "SuperAdmin").await;

    let body = json!({
        "nombres": "Berta",
        "apellidos": "Soto",
        "rut": "1000005-K",
        "correo": "berta@goodjob.cl",
        "area": "a1",
        "rol": "Gestor Casos",
        "contacto": "+569"
    });

    let res = client
        .post(format!("{}/usuariosWeb", srv.base_url))
        .bearer_auth(&roleless)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(format!("{}/usuariosWeb", srv.base_url))
        .bearer_auth(&admin)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let uid = res.json::<Value>().await.unwrap()["uid"]
        .as_str()
        .unwrap()
        .to_string();

    // Fresh accounts must change their password on first login.
    let res = client
        .get(format!("{}/usuariosWeb/check/{}", srv.base_url, uid))
        .bearer_auth(&roleless)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["requiereCambioPassword"], true);

    // Gestor may list, but not create.
    let res = client
        .get(format!("{}/usuariosWeb", srv.base_url))
        .bearer_auth(&mint_jwt(&uid, None))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn new_protocol_links_to_the_open_case() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt("creator-1", None);

    let res = client
        .post(format!("{}/abusos", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "usuarioId": "emp-1" }))
        .send()
        .await
        .unwrap();
    let caso_id = res.json::<Value>().await.unwrap()["abusoId"]
        .as_str()
        .unwrap()
        .to_string();

    // Protocols arrive from the mobile pipeline, i.e. straight into the
    // store, not through this API.
    let protocol = match json!({ "usuarioId": "emp-1", "tipo": "panico" }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    let protocolo_id = srv.store.insert("protocolos", protocol).await.unwrap();

    // The linker runs off a background feed; poll briefly.
    let mut linked = false;
    for _ in 0..50 {
        let res = client
            .get(format!("{}/abusos/{}", srv.base_url, caso_id))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        let case: Value = res.json().await.unwrap();
        if case["protocolosAsociados"]
            .as_array()
            .is_some_and(|a| a.iter().any(|p| p == protocolo_id.as_str()))
        {
            linked = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(linked, "protocol was not linked to the open case in time");

    // The same protocol is also visible through the read-only endpoint.
    let res = client
        .get(format!("{}/protocolos?usuarioId=emp-1", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let protocols: Vec<Value> = res.json().await.unwrap();
    assert_eq!(protocols.len(), 1);
    assert_eq!(protocols[0]["protocoloId"], protocolo_id.as_str());
}
