//! Full CRUD lifecycle against the live server.
//!
//! # Design
//! Starts the server on a random port, then exercises every client
//! operation over real HTTP using ureq, first through `TodoClient` directly
//! and then through `TodoState` the way the terminal UI drives it.

use std::net::SocketAddr;
use std::sync::Arc;

use todo_core::{
    ApiError, CreateTodo, HttpMethod, HttpRequest, HttpResponse, Operation, TodoClient,
    TodoState, UpdateTodo,
};
use todo_server::DocumentStore;

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data, letting the core handle status
/// interpretation.
fn execute(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.path).call(),
        (HttpMethod::Delete, _) => agent.delete(&req.path).call(),
        (HttpMethod::Post, Some(body)) => {
            agent.post(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Post, None) => agent.post(&req.path).send_empty(),
        (HttpMethod::Patch, Some(body)) => {
            agent.patch(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Patch, None) => agent.patch(&req.path).send_empty(),
    }
    .map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();

    Ok(HttpResponse {
        status,
        headers: Vec::new(),
        body,
    })
}

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            todo_server::run(listener, Arc::new(DocumentStore::in_memory())).await
        })
        .unwrap();
    });

    addr
}

#[test]
fn crud_lifecycle() {
    let addr = start_server();
    let client = TodoClient::new(&format!("http://{addr}"));

    // Step 1: list — should be empty.
    let req = client.build_list_todos();
    let todos = client.parse_list_todos(execute(req).unwrap()).unwrap();
    assert!(todos.is_empty(), "expected empty list");

    // Step 2: create a todo.
    let create_input = CreateTodo {
        title: "Buy milk".to_string(),
        description: "2%".to_string(),
    };
    let req = client.build_create_todo(&create_input).unwrap();
    let created = client.parse_create_todo(execute(req).unwrap()).unwrap();
    assert_eq!(created.title, "Buy milk");
    assert_eq!(created.description, "2%");
    assert!(!created.completed);
    let id = created.id;

    // Step 3: mark completed.
    let req = client.build_update_todo(id, &UpdateTodo::completed(true)).unwrap();
    let updated = client.parse_update_todo(execute(req).unwrap()).unwrap().unwrap();
    assert_eq!(updated.title, "Buy milk");
    assert!(updated.completed);

    // Step 4: list — contains the completed record.
    let req = client.build_list_todos();
    let todos = client.parse_list_todos(execute(req).unwrap()).unwrap();
    assert_eq!(todos, vec![updated]);

    // Step 5: delete.
    let req = client.build_delete_todo(id);
    let message = client.parse_delete_todo(execute(req).unwrap()).unwrap();
    assert_eq!(message, "Todo deleted successfully");

    // Step 6: update after delete — null body, nothing recreated.
    let req = client.build_update_todo(id, &UpdateTodo::completed(false)).unwrap();
    assert!(client.parse_update_todo(execute(req).unwrap()).unwrap().is_none());

    // Step 7: delete again — still succeeds.
    let req = client.build_delete_todo(id);
    assert!(client.parse_delete_todo(execute(req).unwrap()).is_ok());

    // Step 8: list — should be empty again.
    let req = client.build_list_todos();
    let todos = client.parse_list_todos(execute(req).unwrap()).unwrap();
    assert!(todos.is_empty(), "expected empty list after delete");
}

#[test]
fn state_drives_the_live_server() {
    let addr = start_server();
    let mut state = TodoState::new(TodoClient::new(&format!("http://{addr}")));

    let dispatch = state.mount();
    state.settle(dispatch.operation, execute(dispatch.request));
    assert!(state.items().is_empty());
    assert!(state.error_message().is_none());

    state.open_modal();
    state.set_draft_title("Walk dog");
    state.set_draft_description("around the block");
    let dispatch = state.submit().unwrap();
    state.settle(dispatch.operation, execute(dispatch.request));
    assert!(!state.is_modal_open());
    assert_eq!(state.items().len(), 1);
    let id = state.items()[0].id;

    let dispatch = state.toggle(id).unwrap();
    assert_eq!(dispatch.operation, Operation::Toggle(id));
    assert!(state.settle(dispatch.operation, execute(dispatch.request)).is_none());
    assert!(state.items()[0].completed);

    let dispatch = state.delete(id).unwrap();
    state.settle(dispatch.operation, execute(dispatch.request));
    assert!(state.items().is_empty());

    // A reload agrees with the local view.
    let dispatch = state.mount();
    state.settle(dispatch.operation, execute(dispatch.request));
    assert!(state.items().is_empty());
    assert!(state.error_message().is_none());
}

#[test]
fn unreachable_server_sets_fetch_banner() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut state = TodoState::new(TodoClient::new(&format!("http://{addr}")));
    let dispatch = state.mount();
    let outcome = execute(dispatch.request);
    assert!(matches!(outcome, Err(ApiError::Transport(_))));

    state.settle(dispatch.operation, outcome);
    assert_eq!(
        state.error_message(),
        Some("Failed to fetch todos. Please try again later.")
    );
}
