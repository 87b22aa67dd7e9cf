//! Integration tests for the web front end against a mock backend

#![allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use axum::http::{Method, StatusCode, header};
use common::{TestApp, build_request, deny_rest, flags, grant, json_body, session_token};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{body_json, header as header_eq, method, path},
};

fn areas(count: i64) -> Value {
    Value::Array(
        (1..=count)
            .map(|id| json!({"id": id, "nombre": format!("Área {id:02}"), "idSede": {"id": 1, "nombre": "Sede Norte"}}))
            .collect(),
    )
}

#[tokio::test]
async fn test_denied_view_never_fetches_the_list() {
    let app = TestApp::new().await;
    grant(&app.backend, "/admin/areas", flags(false, true, true, true)).await;
    Mock::given(method("GET"))
        .and(path("/areas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(areas(3)))
        .expect(0)
        .mount(&app.backend)
        .await;

    let response = app.call(Method::GET, "/api/entities/areas", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let page = json_body(response).await;
    assert_eq!(page["denied"], json!(true));
    assert_eq!(page["rows"], json!([]));
    assert!(page["message"].as_str().unwrap().contains("áreas"));
}

#[tokio::test]
async fn test_list_page_filters_sorts_and_paginates() {
    let app = TestApp::new().await;
    grant(&app.backend, "/admin/areas", flags(true, false, true, false)).await;
    Mock::given(method("GET"))
        .and(path("/areas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(areas(25)))
        .expect(1)
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/sedes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "nombre": "Sede Norte"}])))
        .mount(&app.backend)
        .await;

    let response = app
        .call(Method::GET, "/api/entities/areas?page=2&per_page=10&sort=id&dir=desc", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = json_body(response).await;
    let rows = page["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0]["id"], json!(15));
    assert_eq!(page["pagination"]["total"], json!(25));
    assert_eq!(page["pagination"]["total_pages"], json!(3));
    assert_eq!(page["permisos"]["puedeEditar"], json!(true));
    assert_eq!(page["options"]["sedes"], json!([{"id": 1, "label": "Sede Norte"}]));
}

#[tokio::test]
async fn test_failed_dependency_becomes_a_warning() {
    let app = TestApp::new().await;
    grant(&app.backend, "/admin/areas", flags(true, false, false, false)).await;
    Mock::given(method("GET"))
        .and(path("/areas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(areas(2)))
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/sedes"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.backend)
        .await;

    let response = app.call(Method::GET, "/api/entities/areas?q=%C3%A1rea%2002", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = json_body(response).await;
    assert_eq!(page["rows"].as_array().unwrap().len(), 1);
    assert_eq!(page["options"]["sedes"], json!([]));
    assert_eq!(page["warnings"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_permissions_fetched_once_per_route() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/permisos/por-ruta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(flags(true, false, false, false)))
        .expect(1)
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/municipios"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(3)
        .mount(&app.backend)
        .await;

    for _ in 0..3 {
        let response = app.call(Method::GET, "/api/entities/municipios", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_create_then_list_shows_the_record_once() {
    let app = TestApp::new().await;
    grant(&app.backend, "/admin/areas", flags(true, true, false, false)).await;
    let payload = json!({"nombre": "Bodega", "idSede": 1});
    let created = json!({"id": 40, "nombre": "Bodega", "idSede": 1});

    Mock::given(method("POST"))
        .and(path("/areas"))
        .and(body_json(payload.clone()))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(created.clone())
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/areas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([created])))
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/sedes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&app.backend)
        .await;

    let (first, second) = tokio::join!(
        app.call(Method::POST, "/api/entities/areas", Some(payload.clone())),
        app.call(Method::POST, "/api/entities/areas", Some(payload.clone())),
    );
    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let page = json_body(app.call(Method::GET, "/api/entities/areas", None).await).await;
    let rows = page["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], json!(40));
}

#[tokio::test]
async fn test_create_requires_capability_and_valid_payload() {
    let app = TestApp::new().await;
    grant(&app.backend, "/admin/areas", flags(true, false, false, false)).await;
    grant(&app.backend, "/admin/productos", flags(true, true, false, false)).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.backend)
        .await;

    let forbidden = app
        .call(Method::POST, "/api/entities/areas", Some(json!({"nombre": "X", "idSede": 1})))
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    let body = json_body(forbidden).await;
    assert_eq!(body["code"], json!("FORBIDDEN"));
    assert_eq!(body["details"]["capability"], json!("puedeCrear"));

    let invalid = app
        .call(Method::POST, "/api/entities/productos", Some(json!({"nombre": ""})))
        .await;
    assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(invalid).await["code"], json!("VALIDATION_ERROR"));
}

#[rstest]
#[case::nested_reference_and_unmodelled_field("areas", "/areas/5", json!({
    "id": 5,
    "nombre": "Bodega principal",
    "idSede": {"id": 2, "nombre": "Sede Norte"},
    "codigoInterno": "B-01"
}))]
#[case::absent_optional_field("sedes", "/sedes/5", json!({
    "id": 5,
    "nombre": "Sede Norte",
    "idCentroFormacion": 2
}))]
#[case::explicit_null("sedes", "/sedes/5", json!({
    "id": 5,
    "nombre": "Sede Norte",
    "direccion": null,
    "idCentroFormacion": 2
}))]
#[case::decimal_stock("inventarios", "/inventarios/5", json!({
    "id": 5,
    "stock": "12.00",
    "idProducto": {"id": 1, "nombre": "Resma carta"},
    "idSitio": 3
}))]
#[tokio::test]
async fn test_unmodified_edit_round_trips(
    #[case] slug: &str,
    #[case] backend_path: &str,
    #[case] original: Value,
) {
    let app = TestApp::new().await;
    grant(&app.backend, &format!("/admin/{slug}"), flags(true, false, true, false)).await;

    Mock::given(method("GET"))
        .and(path(backend_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(original.clone()))
        .mount(&app.backend)
        .await;
    Mock::given(method("PUT"))
        .and(path(backend_path))
        .and(body_json(original.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(original.clone()))
        .expect(1)
        .mount(&app.backend)
        .await;

    let uri = format!("/api/entities/{slug}/5");
    let fetched = json_body(app.call(Method::GET, &uri, None).await).await;
    assert_eq!(fetched, original);

    let response = app.call(Method::PUT, &uri, Some(fetched)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, original);
}

#[tokio::test]
async fn test_deleting_missing_id_is_not_found() {
    let app = TestApp::new().await;
    grant(&app.backend, "/admin/productos", flags(true, false, false, true)).await;
    Mock::given(method("DELETE"))
        .and(path("/productos/999"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&app.backend)
        .await;

    let response = app.call(Method::DELETE, "/api/entities/productos/999", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_delete_succeeds_with_no_content() {
    let app = TestApp::new().await;
    grant(&app.backend, "/admin/productos", flags(true, false, false, true)).await;
    Mock::given(method("DELETE"))
        .and(path("/productos/3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.backend)
        .await;

    let response = app.call(Method::DELETE, "/api/entities/productos/3", None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_unreachable_permission_backend_fails_closed() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/permisos/por-ruta"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.backend)
        .await;

    let response = app.call(Method::GET, "/api/entities/sedes", None).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["denied"], json!(true));
}

#[tokio::test]
async fn test_menu_lists_viewable_entries() {
    let app = TestApp::new().await;
    grant(&app.backend, "/admin/reportes", flags(true, false, false, false)).await;
    grant(&app.backend, "/admin/productos", flags(true, true, true, true)).await;
    grant(&app.backend, "/admin/areas", flags(false, true, false, false)).await;
    deny_rest(&app.backend).await;

    let response = app.call(Method::GET, "/api/menu", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let menu = json_body(response).await;
    let hrefs: Vec<&str> = menu
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["href"].as_str().unwrap())
        .collect();
    assert_eq!(hrefs, ["/admin/reportes", "/admin/productos"]);
    assert_eq!(menu[1]["entity"], json!("productos"));
}

#[tokio::test]
async fn test_permisos_endpoint() {
    let app = TestApp::new().await;
    grant(&app.backend, "/admin/roles", json!({"permisos": {"puedeVer": 1, "puedeEditar": "true"}})).await;

    let response = app.call(Method::GET, "/api/permisos?ruta=/admin/roles", None).await;
    assert_eq!(
        json_body(response).await,
        json!({"puedeVer": true, "puedeCrear": false, "puedeEditar": true, "puedeEliminar": false})
    );

    let bad = app.call(Method::GET, "/api/permisos?ruta=admin", None).await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cached_grants_stay_with_their_session() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/permisos/por-ruta"))
        .and(header_eq("authorization", format!("Bearer {}", app.token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(flags(true, true, true, true)))
        .with_priority(1)
        .expect(1)
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/permisos/por-ruta"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "token inválido"})))
        .mount(&app.backend)
        .await;

    let granted = app.call(Method::GET, "/api/permisos?ruta=/admin/usuarios", None).await;
    assert_eq!(json_body(granted).await, flags(true, true, true, true));

    let other = session_token(999, common::ID_ROL, None);
    let response = app
        .send(build_request(Method::GET, "/api/permisos?ruta=/admin/usuarios", None, Some(&other)))
        .await;
    assert_eq!(json_body(response).await, flags(false, false, false, false));

    let create = app
        .send(build_request(
            Method::POST,
            "/api/entities/usuarios",
            Some(json!({"nombre": "Intruso"})),
            Some(&other),
        ))
        .await;
    assert_eq!(create.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_logout_only_forgets_its_own_session() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/permisos/por-ruta"))
        .and(header_eq("authorization", format!("Bearer {}", app.token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(flags(true, false, false, false)))
        .expect(1)
        .mount(&app.backend)
        .await;

    let first = app.call(Method::GET, "/api/permisos?ruta=/admin/roles", None).await;
    assert_eq!(json_body(first).await["puedeVer"], json!(true));

    let other = session_token(999, common::ID_ROL, None);
    let logout = app
        .send(build_request(Method::POST, "/api/session/logout", None, Some(&other)))
        .await;
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let again = app.call(Method::GET, "/api/permisos?ruta=/admin/roles", None).await;
    assert_eq!(json_body(again).await["puedeVer"], json!(true));
}

#[tokio::test]
async fn test_reports_summary_uses_viewable_lists() {
    let app = TestApp::new().await;
    grant(&app.backend, "/admin/reportes", flags(true, false, false, false)).await;
    grant(&app.backend, "/admin/inventarios", flags(true, false, false, false)).await;
    deny_rest(&app.backend).await;
    Mock::given(method("GET"))
        .and(path("/inventarios"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "stock": 30, "idProducto": {"id": 1, "nombre": "Tornillo"}, "idSitio": {"id": 1, "nombre": "Bodega A"}},
            {"id": 2, "stock": 2, "idProducto": {"id": 2, "nombre": "Brocha"}, "idSitio": {"id": 1, "nombre": "Bodega A"}}
        ])))
        .expect(1)
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/solicitudes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&app.backend)
        .await;

    let response = app.call(Method::GET, "/api/reports/summary", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let summary = json_body(response).await;
    assert_eq!(summary["counts"].as_array().unwrap().len(), 1);
    assert_eq!(summary["stock_by_site"], json!([{"label": "Bodega A", "value": 32}]));
    assert_eq!(summary["low_stock"][0]["producto"], json!("Brocha"));
}

#[tokio::test]
async fn test_reports_require_view() {
    let app = TestApp::new().await;
    deny_rest(&app.backend).await;

    let response = app.call(Method::GET, "/api/reports/summary", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_requests_without_a_valid_session_are_rejected() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(flags(true, true, true, true)))
        .expect(0)
        .mount(&app.backend)
        .await;

    let anonymous = app
        .send(build_request(Method::GET, "/api/entities/areas", None, None))
        .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let expired = session_token(7, 2, Some(1_000));
    let response = app
        .send(build_request(Method::GET, "/api/menu", None, Some(&expired)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let garbage = app
        .send(build_request(Method::GET, "/api/session", None, Some("not-a-token")))
        .await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = TestApp::new().await;
    let token = session_token(9, 3, Some(4_102_444_800));
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "ana@example.com", "password": "secreto"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": token})))
        .expect(1)
        .mount(&app.backend)
        .await;

    let response = app
        .send(build_request(
            Method::POST,
            "/api/session/login",
            Some(json!({"email": "ana@example.com", "password": "secreto"})),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with(&format!("token={token}; Path=/; HttpOnly")));
    let session = json_body(response).await;
    assert_eq!(session["id"], json!(9));
    assert_eq!(session["idRol"], json!(3));
}

#[tokio::test]
async fn test_rejected_login_is_unauthorized() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Credenciales inválidas"})))
        .mount(&app.backend)
        .await;

    let response = app
        .send(build_request(
            Method::POST,
            "/api/session/login",
            Some(json!({"email": "ana@example.com", "password": "mal"})),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("Credenciales inválidas"));
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new().await;

    let response = app.call(Method::POST, "/api/session/logout", None).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_current_session_includes_profile_when_available() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/usuarios/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "nombre": "Ana", "email": "ana@example.com", "idRol": 2
        })))
        .mount(&app.backend)
        .await;

    let session = json_body(app.call(Method::GET, "/api/session", None).await).await;

    assert_eq!(session["id"], json!(7));
    assert_eq!(session["idRol"], json!(2));
    assert_eq!(session["usuario"]["nombre"], json!("Ana"));
}

#[tokio::test]
async fn test_pages_and_health() {
    let app = TestApp::new().await;

    let anonymous = app.send(build_request(Method::GET, "/", None, None)).await;
    assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);
    assert_eq!(anonymous.headers()[header::LOCATION], "/login");

    let login = app.send(build_request(Method::GET, "/login", None, None)).await;
    assert_eq!(login.status(), StatusCode::OK);

    let page = app.call(Method::GET, "/admin/sedes", None).await;
    assert_eq!(page.status(), StatusCode::OK);

    let unknown = app.call(Method::GET, "/admin/no-existe", None).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let health = json_body(app.send(build_request(Method::GET, "/health", None, None)).await).await;
    assert_eq!(health["status"], json!("healthy"));

    let response = app.send(build_request(Method::GET, "/health", None, None)).await;
    assert!(response.headers().contains_key("x-request-id"));
}
