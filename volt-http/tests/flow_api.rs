use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use volt_flow::{
    AuthenticatedUser, Executor, ExecutorConfig, ExecutorError, ExecutorRegistry,
    ExecutorResponse, ExecutorResult, GraphDefinition, GraphRepository, InputField, NodeContext,
};
use volt_http::{router, FlowService};
use volt_session::SessionStore;

/// Replays a scripted sequence of responses, one per invocation; completes
/// once the script runs dry.
struct ScriptedExecutor {
    name: &'static str,
    script: Mutex<VecDeque<ExecutorResponse>>,
}

impl ScriptedExecutor {
    fn new(name: &'static str, script: Vec<ExecutorResponse>) -> Arc<Self> {
        Arc::new(Self {
            name,
            script: Mutex::new(script.into()),
        })
    }
}

impl Executor for ScriptedExecutor {
    fn name(&self) -> &str {
        self.name
    }

    fn execute<'a>(
        &'a self,
        _ctx: &'a NodeContext,
    ) -> Pin<Box<dyn Future<Output = ExecutorResult> + Send + 'a>> {
        let response = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(ExecutorResponse::complete);
        Box::pin(async move { Ok(response) })
    }
}

fn app_with(
    definitions: Vec<Value>,
    executors: Vec<Arc<ScriptedExecutor>>,
    session_ttl: Duration,
) -> Router {
    let mut registry = ExecutorRegistry::new();
    for executor in executors {
        let name = executor.name;
        registry = registry.register(
            name,
            move |_config: &ExecutorConfig| -> Result<Arc<dyn Executor>, ExecutorError> {
                Ok(Arc::clone(&executor) as Arc<dyn Executor>)
            },
        );
    }
    let registry = Arc::new(registry);

    let definitions: Vec<GraphDefinition> = definitions
        .into_iter()
        .map(|def| serde_json::from_value(def).expect("definition"))
        .collect();
    let graphs = Arc::new(
        GraphRepository::from_definitions(definitions, registry.as_ref()).expect("valid graphs"),
    );

    let sessions = SessionStore::with_validity(session_ttl);
    router(Arc::new(FlowService::new(graphs, registry, sessions)))
}

fn registration_graph() -> Value {
    json!({
        "id": "reg_basic",
        "type": "REGISTRATION",
        "nodes": [
            {"id": "choose_auth", "type": "DECISION", "next": ["basic_auth"]},
            {
                "id": "basic_auth",
                "type": "TASK_EXECUTION",
                "next": ["sms_otp_auth_basic"],
                "executor": {"name": "BasicAuthExecutor"}
            },
            {
                "id": "sms_otp_auth_basic",
                "type": "TASK_EXECUTION",
                "next": ["provisioning_local_basic"],
                "executor": {"name": "SMSOTPAuthExecutor"}
            },
            {
                "id": "provisioning_local_basic",
                "type": "TASK_EXECUTION",
                "next": ["authenticated"],
                "executor": {"name": "ProvisioningExecutor"}
            },
            {"id": "authenticated", "type": "AUTHENTICATION_SUCCESS"}
        ]
    })
}

fn login_graph() -> Value {
    json!({
        "id": "auth_basic",
        "type": "AUTHENTICATION",
        "nodes": [
            {
                "id": "basic_auth",
                "type": "TASK_EXECUTION",
                "next": ["authenticated"],
                "executor": {"name": "BasicAuthExecutor"}
            },
            {"id": "authenticated", "type": "AUTHENTICATION_SUCCESS"}
        ]
    })
}

async fn post_execute(app: &Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/flow/execute")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = serde_json::from_slice(&bytes).expect("json body");
    (status, json)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = serde_json::from_slice(&bytes).expect("json body");
    (status, json)
}

#[tokio::test]
async fn basic_registration_over_http() {
    let app = app_with(
        vec![registration_graph()],
        vec![
            ScriptedExecutor::new(
                "BasicAuthExecutor",
                vec![
                    ExecutorResponse::input_required(vec![
                        InputField::required("username", "string"),
                        InputField::required("password", "string"),
                    ]),
                    ExecutorResponse::complete().with_user(AuthenticatedUser::new("user-1")),
                ],
            ),
            ScriptedExecutor::new(
                "SMSOTPAuthExecutor",
                vec![
                    ExecutorResponse::input_required(vec![InputField::required("otp", "string")])
                        .with_additional_data("otpSent", "true"),
                    ExecutorResponse::complete(),
                ],
            ),
            ScriptedExecutor::new(
                "ProvisioningExecutor",
                vec![ExecutorResponse::complete().with_assertion("jwt-like-string")],
            ),
        ],
        Duration::from_secs(60),
    );

    // Req1: start the flow, land on the decision prompt.
    let (status, step) = post_execute(&app, json!({"graphId": "reg_basic"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(step["status"], "INCOMPLETE");
    assert_eq!(step["type"], "VIEW");
    assert_eq!(step["data"]["inputs"][0]["name"], "decision");
    let flow_id = step["flowId"].as_str().expect("flowId").to_string();

    // Req2: pick the branch, get asked for credentials.
    let (status, step) = post_execute(
        &app,
        json!({"flowId": flow_id, "inputs": {"decision": "basic_auth"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(step["data"]["inputs"][0]["name"], "username");
    assert_eq!(step["data"]["inputs"][1]["name"], "password");

    // Req3: credentials accepted, OTP requested.
    let (status, step) = post_execute(
        &app,
        json!({"flowId": flow_id, "inputs": {"username": "a", "password": "b"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(step["data"]["inputs"][0]["name"], "otp");
    assert_eq!(step["data"]["additionalData"]["otpSent"], "true");

    // Req4: OTP accepted, flow completes with the assertion.
    let (status, step) = post_execute(
        &app,
        json!({"flowId": flow_id, "inputs": {"otp": "123456"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(step["status"], "COMPLETE");
    assert_eq!(step["assertion"], "jwt-like-string");

    // The completed session is gone.
    let (status, body) = post_execute(&app, json!({"flowId": flow_id})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "flow_not_found");
}

#[tokio::test]
async fn failed_credentials_return_error_step_and_keep_the_session() {
    let app = app_with(
        vec![login_graph()],
        vec![ScriptedExecutor::new(
            "BasicAuthExecutor",
            vec![
                ExecutorResponse::failure("invalid credentials"),
                ExecutorResponse::complete().with_assertion("assertion-1"),
            ],
        )],
        Duration::from_secs(60),
    );

    // The executor failure is a terminal step, not an HTTP error.
    let (status, step) = post_execute(&app, json!({"graphId": "auth_basic"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(step["status"], "ERROR");
    assert_eq!(step["failureReason"], "invalid credentials");
    let flow_id = step["flowId"].as_str().expect("flowId").to_string();

    // The session survived the failure; a resubmission can succeed.
    let (status, step) = post_execute(&app, json!({"flowId": flow_id})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(step["status"], "COMPLETE");
    assert_eq!(step["assertion"], "assertion-1");
}

#[tokio::test]
async fn request_without_ids_is_rejected() {
    let app = app_with(
        vec![login_graph()],
        vec![ScriptedExecutor::new("BasicAuthExecutor", vec![])],
        Duration::from_secs(60),
    );
    let (status, body) = post_execute(&app, json!({"inputs": {}})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn unknown_graph_is_not_found() {
    let app = app_with(
        vec![login_graph()],
        vec![ScriptedExecutor::new("BasicAuthExecutor", vec![])],
        Duration::from_secs(60),
    );
    let (status, body) = post_execute(&app, json!({"graphId": "no_such_graph"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "graph_not_found");
}

#[tokio::test]
async fn unknown_flow_is_not_found() {
    let app = app_with(
        vec![login_graph()],
        vec![ScriptedExecutor::new("BasicAuthExecutor", vec![])],
        Duration::from_secs(60),
    );
    let (status, body) = post_execute(
        &app,
        json!({"flowId": "00000000-0000-0000-0000-000000000000"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "flow_not_found");
}

#[tokio::test]
async fn expired_session_is_gone() {
    let app = app_with(
        vec![registration_graph()],
        vec![
            ScriptedExecutor::new("BasicAuthExecutor", vec![]),
            ScriptedExecutor::new("SMSOTPAuthExecutor", vec![]),
            ScriptedExecutor::new("ProvisioningExecutor", vec![]),
        ],
        Duration::from_millis(10),
    );

    let (status, step) = post_execute(&app, json!({"graphId": "reg_basic"})).await;
    assert_eq!(status, StatusCode::OK);
    let flow_id = step["flowId"].as_str().expect("flowId").to_string();

    tokio::time::sleep(Duration::from_millis(30)).await;

    let (status, body) = post_execute(&app, json!({"flowId": flow_id})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "flow_not_found");
}

#[tokio::test]
async fn graphs_are_listed_with_their_types() {
    let app = app_with(
        vec![login_graph(), registration_graph()],
        vec![
            ScriptedExecutor::new("BasicAuthExecutor", vec![]),
            ScriptedExecutor::new("SMSOTPAuthExecutor", vec![]),
            ScriptedExecutor::new("ProvisioningExecutor", vec![]),
        ],
        Duration::from_secs(60),
    );
    let (status, body) = get_json(&app, "/flow/graphs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"id": "auth_basic", "type": "AUTHENTICATION"},
            {"id": "reg_basic", "type": "REGISTRATION"}
        ])
    );
}

#[tokio::test]
async fn health_endpoint_reports_up() {
    let app = app_with(
        vec![login_graph()],
        vec![ScriptedExecutor::new("BasicAuthExecutor", vec![])],
        Duration::from_secs(60),
    );
    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "UP");
}
