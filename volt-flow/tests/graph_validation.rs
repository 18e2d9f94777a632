use serde_json::json;
use volt_flow::{FlowError, FlowType, Graph, GraphDefinition, NodeType};

fn definition(value: serde_json::Value) -> GraphDefinition {
    serde_json::from_value(value).expect("definition parses")
}

fn login_graph() -> serde_json::Value {
    json!({
        "id": "auth_basic",
        "type": "AUTHENTICATION",
        "nodes": [
            {
                "id": "choose_auth",
                "type": "DECISION",
                "next": ["basic_auth"]
            },
            {
                "id": "basic_auth",
                "type": "TASK_EXECUTION",
                "next": ["authenticated"],
                "inputData": [
                    {"name": "username", "type": "string", "required": true},
                    {"name": "password", "type": "string", "required": true}
                ],
                "executor": {"name": "BasicAuthExecutor"}
            },
            {
                "id": "authenticated",
                "type": "AUTHENTICATION_SUCCESS"
            }
        ]
    })
}

#[test]
fn valid_graph_exposes_start_and_nodes() {
    let graph = Graph::from_definition(definition(login_graph())).expect("valid graph");
    assert_eq!(graph.id(), "auth_basic");
    assert_eq!(graph.flow_type(), FlowType::Authentication);

    // The start node resolves through the normal lookup.
    assert_eq!(graph.start_node_id(), "choose_auth");
    assert!(graph.get(graph.start_node_id()).is_some());

    // Every declared successor resolves.
    for node in graph.nodes() {
        for next in &node.next {
            assert!(graph.get(next).is_some(), "unresolved successor {next}");
        }
    }
}

#[test]
fn start_node_defaults_to_first_listed() {
    let graph = Graph::from_definition(definition(login_graph())).expect("valid graph");
    assert_eq!(graph.start_node_id(), "choose_auth");
}

#[test]
fn explicit_start_flag_wins_over_position() {
    let mut def = login_graph();
    def["nodes"][1]["isStartNode"] = json!(true);
    let graph = Graph::from_definition(definition(def)).expect("valid graph");
    assert_eq!(graph.start_node_id(), "basic_auth");
}

#[test]
fn two_start_flags_are_rejected() {
    let mut def = login_graph();
    def["nodes"][0]["isStartNode"] = json!(true);
    def["nodes"][1]["isStartNode"] = json!(true);
    assert!(matches!(
        Graph::from_definition(definition(def)),
        Err(FlowError::GraphValidation { .. })
    ));
}

#[test]
fn empty_graph_is_rejected() {
    let def = definition(json!({"id": "empty", "type": "AUTHENTICATION", "nodes": []}));
    assert!(matches!(
        Graph::from_definition(def),
        Err(FlowError::GraphNotInitialized(_))
    ));
}

#[test]
fn duplicate_node_ids_are_rejected() {
    let mut def = login_graph();
    def["nodes"][1]["id"] = json!("choose_auth");
    assert!(matches!(
        Graph::from_definition(definition(def)),
        Err(FlowError::GraphValidation { .. })
    ));
}

#[test]
fn unresolved_successor_is_rejected() {
    let mut def = login_graph();
    def["nodes"][1]["next"] = json!(["no_such_node"]);
    assert!(matches!(
        Graph::from_definition(definition(def)),
        Err(FlowError::GraphValidation { .. })
    ));
}

#[test]
fn self_successor_is_rejected() {
    let mut def = login_graph();
    def["nodes"][1]["next"] = json!(["basic_auth"]);
    assert!(matches!(
        Graph::from_definition(definition(def)),
        Err(FlowError::GraphValidation { .. })
    ));
}

#[test]
fn decision_without_branches_is_rejected() {
    let mut def = login_graph();
    def["nodes"][0]["next"] = json!([]);
    assert!(matches!(
        Graph::from_definition(definition(def)),
        Err(FlowError::GraphValidation { .. })
    ));
}

#[test]
fn terminal_with_successors_is_rejected() {
    let mut def = login_graph();
    def["nodes"][2]["next"] = json!(["choose_auth"]);
    assert!(matches!(
        Graph::from_definition(definition(def)),
        Err(FlowError::GraphValidation { .. })
    ));
}

#[test]
fn prompt_without_required_input_is_rejected() {
    let def = definition(json!({
        "id": "g",
        "type": "REGISTRATION",
        "nodes": [
            {
                "id": "collect",
                "type": "PROMPT_ONLY",
                "next": ["done"],
                "inputData": [{"name": "nickname", "type": "string", "required": false}]
            },
            {"id": "done", "type": "AUTHENTICATION_SUCCESS"}
        ]
    }));
    assert!(matches!(
        Graph::from_definition(def),
        Err(FlowError::GraphValidation { .. })
    ));
}

#[test]
fn task_without_executor_is_rejected() {
    let mut def = login_graph();
    def["nodes"][1].as_object_mut().expect("object").remove("executor");
    assert!(matches!(
        Graph::from_definition(definition(def)),
        Err(FlowError::GraphValidation { .. })
    ));
}

#[test]
fn unreachable_terminal_is_rejected() {
    // The only terminal hangs off a node the start never reaches.
    let def = definition(json!({
        "id": "g",
        "type": "AUTHENTICATION",
        "nodes": [
            {
                "id": "a",
                "type": "TASK_EXECUTION",
                "next": ["b"],
                "executor": {"name": "X"}
            },
            {
                "id": "b",
                "type": "TASK_EXECUTION",
                "next": ["a"],
                "executor": {"name": "X"}
            },
            {"id": "done", "type": "AUTHENTICATION_SUCCESS"}
        ]
    }));
    assert!(matches!(
        Graph::from_definition(def),
        Err(FlowError::GraphValidation { .. })
    ));
}

#[test]
fn decision_cycles_back_to_earlier_nodes_are_legal() {
    // Retry loops through a decision branch are legitimate.
    let def = definition(json!({
        "id": "g",
        "type": "AUTHENTICATION",
        "nodes": [
            {"id": "choose", "type": "DECISION", "next": ["try_otp", "done"]},
            {
                "id": "try_otp",
                "type": "TASK_EXECUTION",
                "next": ["choose"],
                "executor": {"name": "SMSOTPAuthExecutor"}
            },
            {"id": "done", "type": "AUTHENTICATION_SUCCESS"}
        ]
    }));
    assert!(Graph::from_definition(def).is_ok());
}

#[test]
fn parsed_graph_projects_back_onto_its_definition() {
    let original = definition(json!({
        "id": "auth_social",
        "type": "AUTHENTICATION",
        "nodes": [
            {"id": "choose_auth", "type": "DECISION", "next": ["google_auth"]},
            {
                "id": "google_auth",
                "type": "TASK_EXECUTION",
                "next": ["authenticated"],
                "executor": {
                    "name": "GoogleOIDCAuthExecutor",
                    "idpName": "google-default",
                    "properties": {"scope": "openid profile"}
                }
            },
            {"id": "authenticated", "type": "AUTHENTICATION_SUCCESS"}
        ]
    }));
    let graph = Graph::from_definition(original.clone()).expect("valid graph");
    assert_eq!(graph.to_definition(), original);

    // And the projection survives a JSON round-trip.
    let json = serde_json::to_string(&graph.to_definition()).expect("serialize");
    let reparsed: GraphDefinition = serde_json::from_str(&json).expect("reparse");
    assert_eq!(reparsed, original);
}

#[test]
fn node_types_are_preserved() {
    let graph = Graph::from_definition(definition(login_graph())).expect("valid graph");
    let types: Vec<NodeType> = graph.nodes().iter().map(|n| n.node_type()).collect();
    assert_eq!(
        types,
        vec![
            NodeType::Decision,
            NodeType::TaskExecution,
            NodeType::AuthenticationSuccess
        ]
    );
}
