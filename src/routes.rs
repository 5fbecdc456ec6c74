// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{config::AppState, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/users", get(handlers::users::list_users))
        .route("/users/me", get(handlers::auth::get_me))
        .route(
            "/users/{cpf}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/users/{cpf}/accept", put(handlers::users::accept_user));

    // Cadastros de apoio: unidades, cargos e etapas
    let reference_routes = Router::new()
        .route(
            "/units",
            get(handlers::units::list_units).post(handlers::units::create_unit),
        )
        .route(
            "/units/{id}",
            get(handlers::units::get_unit)
                .put(handlers::units::update_unit)
                .delete(handlers::units::delete_unit),
        )
        .route(
            "/roles",
            get(handlers::roles::list_roles).post(handlers::roles::create_role),
        )
        .route(
            "/roles/{id}",
            get(handlers::roles::get_role)
                .put(handlers::roles::update_role)
                .delete(handlers::roles::delete_role),
        )
        .route(
            "/stages",
            get(handlers::stages::list_stages).post(handlers::stages::create_stage),
        )
        .route(
            "/stages/{id}",
            get(handlers::stages::get_stage)
                .put(handlers::stages::update_stage)
                .delete(handlers::stages::delete_stage),
        );

    let flow_routes = Router::new()
        .route(
            "/flows",
            get(handlers::flows::list_flows).post(handlers::flows::create_flow),
        )
        .route(
            "/flows/{id}",
            get(handlers::flows::get_flow)
                .put(handlers::flows::update_flow)
                .delete(handlers::flows::delete_flow),
        )
        .route("/flows/{id}/sequences", get(handlers::flows::list_sequences))
        .route(
            "/flows/{id}/stages/{stage_id}",
            delete(handlers::flows::remove_stage),
        )
        .route("/flows/{id}/notify-users", post(handlers::flows::add_notify_user))
        .route(
            "/flows/{id}/notify-users/{cpf}",
            delete(handlers::flows::remove_notify_user),
        );

    let process_routes = Router::new()
        .route(
            "/processes",
            get(handlers::processes::list_processes).post(handlers::processes::create_process),
        )
        .route(
            "/processes/{record}",
            get(handlers::processes::get_process)
                .put(handlers::processes::update_process)
                .delete(handlers::processes::delete_process),
        )
        .route("/processes/{record}/advance", post(handlers::processes::advance_process))
        .route(
            "/processes/{record}/observation",
            put(handlers::processes::update_observation),
        )
        .route("/processes/{record}/archive", put(handlers::processes::set_archived))
        .route("/processes/{record}/notes", get(handlers::notes::list_process_notes))
        .route("/notes", post(handlers::notes::create_note))
        .route(
            "/notes/{id}",
            get(handlers::notes::get_note)
                .put(handlers::notes::update_note)
                .delete(handlers::notes::delete_note),
        )
        .route(
            "/notifications/overdue",
            post(handlers::notifications::send_overdue_digest),
        );

    // Tudo que não é login/cadastro passa pelo auth_guard
    let protected_routes = Router::new()
        .merge(user_routes)
        .merge(reference_routes)
        .merge(flow_routes)
        .merge(process_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{memory::MemoryStore, Repositories},
        models::{process::NewProcess, role::RolePayload, unit::UnitPayload},
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        repos: Repositories,
        unit_id: i32,
        role_id: i32,
    }

    async fn test_app() -> TestApp {
        let repos = MemoryStore::new().repositories();
        let unit = repos.units.create(&UnitPayload { name: "Secretaria".into() }).await.unwrap();
        let role = repos
            .roles
            .create(&RolePayload { name: "Servidor".into(), access_level: 1 })
            .await
            .unwrap();

        let mut state = AppState::from_parts(
            repos.clone(),
            "segredo-de-teste".into(),
            None,
            PathBuf::from("assets/email"),
        );
        state.auth_service = state.auth_service.with_bcrypt_cost(4);

        TestApp { router: build_router(state), repos, unit_id: unit.id, role_id: role.id }
    }

    async fn send(
        app: &TestApp,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn register_body(app: &TestApp, cpf: &str, email: &str) -> Value {
        json!({
            "cpf": cpf,
            "fullName": "Maria da Silva",
            "email": email,
            "password": "senha-forte",
            "unitId": app.unit_id,
            "roleId": app.role_id,
        })
    }

    // Cadastra, aceita e faz login; devolve o token.
    async fn logged_in(app: &TestApp) -> String {
        let (status, _) = send(
            app,
            "POST",
            "/api/auth/register",
            None,
            Some(register_body(app, "12345678901", "maria@orgao.gov.br")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        app.repos.users.set_accepted("12345678901", true).await.unwrap();

        let (status, body) = send(
            app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "login": "maria@orgao.gov.br", "password": "senha-forte" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public_and_the_rest_needs_a_token() {
        let app = test_app().await;
        let (status, _) = send(&app, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "GET", "/api/units", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/api/units", Some("nao-e-um-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn pending_user_cannot_log_in_until_accepted() {
        let app = test_app().await;
        send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(register_body(&app, "98765432100", "joao@orgao.gov.br")),
        )
        .await;

        let login = json!({ "login": "98765432100", "password": "senha-forte" });
        let (status, _) = send(&app, "POST", "/api/auth/login", None, Some(login.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        app.repos.users.set_accepted("98765432100", true).await.unwrap();
        let (status, body) = send(&app, "POST", "/api/auth/login", None, Some(login)).await;
        assert_eq!(status, StatusCode::OK);

        let token = body["token"].as_str().unwrap();
        let (status, me) = send(&app, "GET", "/api/users/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["cpf"], "98765432100");
        assert!(me.get("password").is_none());
    }

    #[tokio::test]
    async fn duplicate_registration_reports_the_field() {
        let app = test_app().await;
        let body = register_body(&app, "11122233344", "ana@orgao.gov.br");
        send(&app, "POST", "/api/auth/register", None, Some(body.clone())).await;

        let (status, error) = send(&app, "POST", "/api/auth/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error["error"].as_str().unwrap().contains("CPF"));
    }

    #[tokio::test]
    async fn invalid_payload_returns_field_details() {
        let app = test_app().await;
        let token = logged_in(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/flows",
            Some(&token),
            Some(json!({ "name": "Curto", "unitId": app.unit_id, "stages": [1] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["stages"].is_array());
    }

    #[tokio::test]
    async fn process_walks_through_a_flow_over_http() {
        let app = test_app().await;
        let token = logged_in(&app).await;
        let auth = Some(token.as_str());

        let mut stages = vec![];
        for name in ["Protocolo", "Análise", "Decisão"] {
            let (status, stage) = send(
                &app,
                "POST",
                "/api/stages",
                auth,
                Some(json!({ "name": name, "unitId": app.unit_id, "duration": 3 })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            stages.push(stage["id"].as_i64().unwrap());
        }

        let (status, flow) = send(
            &app,
            "POST",
            "/api/flows",
            auth,
            Some(json!({ "name": "Requerimento", "unitId": app.unit_id, "stages": stages })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(flow["sequences"].as_array().unwrap().len(), 2);
        let flow_id = flow["id"].as_i64().unwrap();

        let (status, process) = send(
            &app,
            "POST",
            "/api/processes",
            auth,
            Some(json!({ "record": "2026-0001", "flowId": flow_id, "unitId": app.unit_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(process["currentStageId"], stages[0]);

        for observation in ["primeira", "segunda"] {
            let (status, _) = send(
                &app,
                "POST",
                "/api/processes/2026-0001/advance",
                auth,
                Some(json!({ "to": stages[1], "from": stages[0], "observation": observation })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, process) = send(&app, "GET", "/api/processes/2026-0001", auth, None).await;
        let history = process["stageHistory"].as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["observation"], "segunda");
        assert_eq!(process["currentStageId"], stages[1]);

        let (status, _) = send(&app, "GET", "/api/processes/nao-existe", auth, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn notes_belong_to_an_existing_process() {
        let app = test_app().await;
        let token = logged_in(&app).await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/notes",
            Some(&token),
            Some(json!({ "processRecord": "sem-processo", "content": "lembrete" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/api/processes/sem-processo/notes", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn digest_without_smtp_reports_nothing_sent() {
        let app = test_app().await;
        let token = logged_in(&app).await;

        let (status, body) =
            send(&app, "POST", "/api/notifications/overdue", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "sent": false, "recipients": 0, "processes": 0 }));
    }

    #[tokio::test]
    async fn note_with_unknown_stage_is_not_found() {
        let app = test_app().await;
        let token = logged_in(&app).await;
        app.repos
            .processes
            .create(&NewProcess {
                record: "2026-0002".into(),
                nickname: None,
                current_stage_id: None,
                flow_id: 1,
                unit_id: app.unit_id,
            })
            .await
            .unwrap();

        let (status, _) = send(
            &app,
            "POST",
            "/api/notes",
            Some(&token),
            Some(json!({ "processRecord": "2026-0002", "stageId": 9999, "content": "lembrete" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "POST",
            "/api/notes",
            Some(&token),
            Some(json!({ "processRecord": "2026-0002", "content": "lembrete" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn user_update_checks_unit_and_role() {
        let app = test_app().await;
        let token = logged_in(&app).await;
        let update = |unit_id: i32, role_id: i32| {
            json!({
                "fullName": "Maria Souza",
                "email": "maria@orgao.gov.br",
                "unitId": unit_id,
                "roleId": role_id,
            })
        };

        let (status, _) = send(
            &app,
            "PUT",
            "/api/users/12345678901",
            Some(&token),
            Some(update(app.unit_id, 9999)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "PUT",
            "/api/users/12345678901",
            Some(&token),
            Some(update(9999, app.role_id)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, user) = send(
            &app,
            "PUT",
            "/api/users/12345678901",
            Some(&token),
            Some(update(app.unit_id, app.role_id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["fullName"], "Maria Souza");
    }
}
