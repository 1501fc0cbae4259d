//! Router-level tests of the board API over the in-memory store.

mod common;

use axum::http::StatusCode;
use rstest::rstest;
use serde_json::{Value, json};

use common::{
    OTHER_TOKEN, TOKEN, column_id, create_project, create_task, create_test_router, label_id,
    list_projects, send, send_raw,
};

fn titles(column: &Value) -> Vec<&str> {
    column["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["title"].as_str().unwrap())
        .collect()
}

fn find_column<'a>(tree: &'a Value, title: &str) -> &'a Value {
    tree["columns"]
        .as_array()
        .unwrap()
        .iter()
        .find(|column| column["title"] == title)
        .unwrap()
}

// =============================================================================
// Sessions
// =============================================================================

#[rstest]
#[case("GET", "/api/projects", None)]
#[case("POST", "/api/projects", Some(json!({"name": "P"})))]
#[case("POST", "/api/columns", Some(json!({"title": "C"})))]
#[case("PATCH", "/api/columns/whatever", Some(json!({"title": "C"})))]
#[case("DELETE", "/api/columns/whatever", None)]
#[case("POST", "/api/tasks", Some(json!({"title": "T"})))]
#[case("PATCH", "/api/tasks/whatever", Some(json!({})))]
#[case("DELETE", "/api/tasks/whatever", None)]
#[case("POST", "/api/tasks/whatever", None)]
#[case("POST", "/api/labels", Some(json!({})))]
#[case("DELETE", "/api/labels/whatever", None)]
#[case("POST", "/api/task-labels", Some(json!({})))]
#[case("DELETE", "/api/task-labels", Some(json!({})))]
#[tokio::test]
async fn test_every_route_requires_a_session(
    #[case] method: &str,
    #[case] uri: &str,
    #[case] body: Option<Value>,
) {
    let router = create_test_router();

    let (status, error) = send(&router, method, uri, None, body.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["message"], "Unauthorized");

    let (status, _) = send(&router, method, uri, Some("unknown-token"), body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[rstest]
#[tokio::test]
async fn test_health_does_not_require_a_session() {
    let router = create_test_router();

    let (status, body) = send(&router, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

// =============================================================================
// Projects
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_create_project_seeds_defaults() {
    let router = create_test_router();

    let tree = create_project(&router, "P").await;

    assert_eq!(tree["name"], "P");
    let columns: Vec<(&str, i64)> = tree["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|column| {
            (
                column["title"].as_str().unwrap(),
                column["order"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(columns, [("To Do", 0), ("In Progress", 1), ("Done", 2)]);
    let labels: Vec<&str> = tree["labels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|label| label["name"].as_str().unwrap())
        .collect();
    assert_eq!(labels, ["Bug", "Feature", "Design"]);
}

#[rstest]
#[tokio::test]
async fn test_projects_are_listed_per_owner() {
    let router = create_test_router();
    create_project(&router, "Mine").await;

    let (status, others) = send(&router, "GET", "/api/projects", Some(OTHER_TOKEN), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(others, json!([]));
    assert_eq!(list_projects(&router).await.len(), 1);
}

#[rstest]
#[tokio::test]
async fn test_create_project_with_malformed_body_is_generic_500() {
    let router = create_test_router();

    let (status, error) = send_raw(&router, "POST", "/api/projects", "{\"nom\": 1}").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error["message"], "Failed to create project");
}

// =============================================================================
// Columns
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_new_column_order_is_sibling_count() {
    let router = create_test_router();
    let tree = create_project(&router, "P").await;
    let project_id = tree["id"].as_str().unwrap();

    for (expected, title) in [(3, "Review"), (4, "Blocked")] {
        let (status, column) = send(
            &router,
            "POST",
            "/api/columns",
            Some(TOKEN),
            Some(json!({"projectId": project_id, "title": title})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(column["order"], expected);
    }

    let listed = &list_projects(&router).await[0];
    let orders: Vec<i64> = listed["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|column| column["order"].as_i64().unwrap())
        .collect();
    assert_eq!(orders, [0, 1, 2, 3, 4]);
}

#[rstest]
#[tokio::test]
async fn test_create_column_in_unknown_project_fails() {
    let router = create_test_router();

    let (status, error) = send(
        &router,
        "POST",
        "/api/columns",
        Some(TOKEN),
        Some(json!({"projectId": "0190a5a4-0000-7000-8000-000000000000", "title": "C"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error["message"], "Failed to create column");
}

#[rstest]
#[tokio::test]
async fn test_rename_column() {
    let router = create_test_router();
    let tree = create_project(&router, "P").await;
    let id = column_id(&tree, "Done");

    let (status, column) = send(
        &router,
        "PATCH",
        &format!("/api/columns/{id}"),
        Some(TOKEN),
        Some(json!({"title": "Shipped"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(column["title"], "Shipped");
    assert_eq!(column["order"], 2);
}

#[rstest]
#[tokio::test]
async fn test_delete_column_removes_its_tasks() {
    let router = create_test_router();
    let tree = create_project(&router, "P").await;
    let todo = column_id(&tree, "To Do");
    create_task(&router, &todo, "X").await;

    let (status, body) = send(
        &router,
        "DELETE",
        &format!("/api/columns/{todo}"),
        Some(TOKEN),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    let listed = &list_projects(&router).await[0];
    assert_eq!(listed["columns"].as_array().unwrap().len(), 2);
    assert!(
        listed["columns"]
            .as_array()
            .unwrap()
            .iter()
            .all(|column| column["tasks"].as_array().unwrap().is_empty())
    );
}

#[rstest]
#[tokio::test]
async fn test_last_column_cannot_be_deleted() {
    let router = create_test_router();
    let tree = create_project(&router, "P").await;
    let uri = |title: &str| format!("/api/columns/{}", column_id(&tree, title));

    for title in ["To Do", "In Progress"] {
        let (status, _) = send(&router, "DELETE", &uri(title), Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, error) = send(&router, "DELETE", &uri("Done"), Some(TOKEN), None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "CONFLICT");
    assert_eq!(list_projects(&router).await[0]["columns"].as_array().unwrap().len(), 1);
}

// =============================================================================
// Tasks
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_create_task_defaults_and_order() {
    let router = create_test_router();
    let tree = create_project(&router, "P").await;
    let todo = column_id(&tree, "To Do");

    let first = create_task(&router, &todo, "X").await;
    let (status, second) = send(
        &router,
        "POST",
        "/api/tasks",
        Some(TOKEN),
        Some(json!({
            "columnId": todo,
            "title": "Y",
            "description": "details",
            "priority": "high",
            "dueDate": "2025-03-01",
        })),
    )
    .await;

    assert_eq!(first["order"], 0);
    assert_eq!(first["priority"], "medium");
    assert_eq!(first["description"], Value::Null);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["order"], 1);
    assert_eq!(second["priority"], "high");
    assert_eq!(second["description"], "details");
    assert!(second["dueDate"].as_str().unwrap().starts_with("2025-03-01T00:00:00"));
}

#[rstest]
#[case(json!({"title": "T", "priority": "urgent"}))]
#[case(json!({"title": "T", "dueDate": "tomorrow"}))]
#[case(json!({"priority": "low"}))]
#[tokio::test]
async fn test_create_task_with_invalid_input_is_generic_500(#[case] body: Value) {
    let router = create_test_router();
    let mut body = body;
    let tree = create_project(&router, "P").await;
    body["columnId"] = json!(column_id(&tree, "To Do"));

    let (status, error) = send(&router, "POST", "/api/tasks", Some(TOKEN), Some(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error["message"], "Failed to create task");
}

#[rstest]
#[tokio::test]
async fn test_update_task_precedence() {
    let router = create_test_router();
    let tree = create_project(&router, "P").await;
    let todo = column_id(&tree, "To Do");
    let (_, task) = send(
        &router,
        "POST",
        "/api/tasks",
        Some(TOKEN),
        Some(json!({
            "columnId": todo,
            "title": "T",
            "description": "keep me?",
            "dueDate": "2025-03-01",
        })),
    )
    .await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (status, updated) = send(
        &router,
        "PATCH",
        &uri,
        Some(TOKEN),
        Some(json!({"title": null, "priority": "low", "description": null})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "T");
    assert_eq!(updated["priority"], "low");
    assert_eq!(updated["description"], Value::Null);
    assert_eq!(updated["dueDate"], task["dueDate"]);

    let (_, cleared) = send(
        &router,
        "PATCH",
        &uri,
        Some(TOKEN),
        Some(json!({"dueDate": ""})),
    )
    .await;
    assert_eq!(cleared["dueDate"], Value::Null);
}

#[rstest]
#[tokio::test]
async fn test_update_unknown_task_fails() {
    let router = create_test_router();

    let (status, error) = send(
        &router,
        "PATCH",
        "/api/tasks/0190a5a4-0000-7000-8000-000000000000",
        Some(TOKEN),
        Some(json!({"title": "T"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error["message"], "Failed to update task");
}

#[rstest]
#[tokio::test]
async fn test_move_task_between_columns() {
    let router = create_test_router();
    let tree = create_project(&router, "P").await;
    let todo = column_id(&tree, "To Do");
    let done = column_id(&tree, "Done");
    create_task(&router, &todo, "X").await;
    let y = create_task(&router, &todo, "Y").await;

    let (status, moved) = send(
        &router,
        "PATCH",
        &format!("/api/tasks/{}", y["id"].as_str().unwrap()),
        Some(TOKEN),
        Some(json!({"columnId": done})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["columnId"], done.as_str());
    let listed = &list_projects(&router).await[0];
    assert_eq!(titles(find_column(listed, "To Do")), ["X"]);
    assert_eq!(titles(find_column(listed, "Done")), ["Y"]);
}

#[rstest]
#[tokio::test]
async fn test_delete_task() {
    let router = create_test_router();
    let tree = create_project(&router, "P").await;
    let todo = column_id(&tree, "To Do");
    let task = create_task(&router, &todo, "X").await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (status, body) = send(&router, "DELETE", &uri, Some(TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (status, error) = send(&router, "DELETE", &uri, Some(TOKEN), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error["message"], "Failed to delete task");
}

#[rstest]
#[tokio::test]
async fn test_duplicate_task_never_copies_labels() {
    let router = create_test_router();
    let tree = create_project(&router, "P").await;
    let todo = column_id(&tree, "To Do");
    let (_, source) = send(
        &router,
        "POST",
        "/api/tasks",
        Some(TOKEN),
        Some(json!({
            "columnId": todo,
            "title": "X",
            "description": "d",
            "priority": "high",
            "dueDate": "2025-03-01",
        })),
    )
    .await;
    let (status, _) = send(
        &router,
        "POST",
        "/api/task-labels",
        Some(TOKEN),
        Some(json!({"taskId": source["id"], "labelId": label_id(&tree, "Bug")})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, copy) = send(
        &router,
        "POST",
        &format!("/api/tasks/{}", source["id"].as_str().unwrap()),
        Some(TOKEN),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_ne!(copy["id"], source["id"]);
    assert_eq!(copy["title"], "X (copy)");
    assert_eq!(copy["description"], "d");
    assert_eq!(copy["priority"], "high");
    assert_eq!(copy["dueDate"], source["dueDate"]);
    assert_eq!(copy["columnId"], source["columnId"]);
    assert_eq!(copy["order"], 1);

    let listed = &list_projects(&router).await[0];
    let tasks = find_column(listed, "To Do")["tasks"].as_array().unwrap().clone();
    assert_eq!(tasks[0]["labels"].as_array().unwrap().len(), 1);
    assert_eq!(tasks[1]["labels"], json!([]));
}

#[rstest]
#[case("0190a5a4-0000-7000-8000-000000000000")]
#[case("not-a-uuid")]
#[tokio::test]
async fn test_duplicate_missing_task_is_404(#[case] id: &str) {
    let router = create_test_router();

    let (status, error) = send(
        &router,
        "POST",
        &format!("/api/tasks/{id}"),
        Some(TOKEN),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["message"], "Task not found");
}

// =============================================================================
// Labels
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_label_lifecycle() {
    let router = create_test_router();
    let tree = create_project(&router, "P").await;
    let todo = column_id(&tree, "To Do");
    let task = create_task(&router, &todo, "X").await;

    let (status, label) = send(
        &router,
        "POST",
        "/api/labels",
        Some(TOKEN),
        Some(json!({"projectId": tree["id"], "name": "Docs", "color": "#22c55e"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(label["name"], "Docs");

    let pair = json!({"taskId": task["id"], "labelId": label["id"]});
    let (status, association) =
        send(&router, "POST", "/api/task-labels", Some(TOKEN), Some(pair.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(association, pair);

    let listed = &list_projects(&router).await[0];
    let attached = &find_column(listed, "To Do")["tasks"][0]["labels"][0];
    assert_eq!(attached["label"]["name"], "Docs");

    let (status, body) = send(
        &router,
        "DELETE",
        &format!("/api/labels/{}", label["id"].as_str().unwrap()),
        Some(TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let listed = &list_projects(&router).await[0];
    assert_eq!(find_column(listed, "To Do")["tasks"][0]["labels"], json!([]));
    assert_eq!(listed["labels"].as_array().unwrap().len(), 3);
}

#[rstest]
#[tokio::test]
async fn test_attaching_twice_fails() {
    let router = create_test_router();
    let tree = create_project(&router, "P").await;
    let task = create_task(&router, &column_id(&tree, "To Do"), "X").await;
    let pair = json!({"taskId": task["id"], "labelId": label_id(&tree, "Bug")});

    let (first, _) = send(
        &router,
        "POST",
        "/api/task-labels",
        Some(TOKEN),
        Some(pair.clone()),
    )
    .await;
    let (second, error) =
        send(&router, "POST", "/api/task-labels", Some(TOKEN), Some(pair)).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error["message"], "Failed to add label");
}

#[rstest]
#[tokio::test]
async fn test_detaching_missing_pair_fails() {
    let router = create_test_router();
    let tree = create_project(&router, "P").await;
    let task = create_task(&router, &column_id(&tree, "To Do"), "X").await;
    let pair = json!({"taskId": task["id"], "labelId": label_id(&tree, "Bug")});

    let (status, error) =
        send(&router, "DELETE", "/api/task-labels", Some(TOKEN), Some(pair)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error["message"], "Failed to remove label");
}

#[rstest]
#[tokio::test]
async fn test_cross_project_attach_is_conflict() {
    let router = create_test_router();
    let first = create_project(&router, "A").await;
    let second = create_project(&router, "B").await;
    let task = create_task(&router, &column_id(&first, "To Do"), "X").await;

    let (status, error) = send(
        &router,
        "POST",
        "/api/task-labels",
        Some(TOKEN),
        Some(json!({"taskId": task["id"], "labelId": label_id(&second, "Bug")})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "CONFLICT");
}

#[rstest]
#[case("/api/labels", "{")]
#[case("/api/task-labels", "[]")]
#[tokio::test]
async fn test_label_routes_reject_malformed_bodies(#[case] uri: &str, #[case] body: &str) {
    let router = create_test_router();

    let (status, error) = send_raw(&router, "POST", uri, body).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error["message"].as_str().unwrap().starts_with("Failed to"));
}
