//! Client-side view state for the todo list.
//!
//! # Design
//! `TodoState` is the single owned state object behind the UI. Every change
//! goes through a named action (`mount`, `submit`, `toggle`, ...) that may
//! hand back a [`Dispatch`] for the host to execute. When the response
//! arrives the host feeds it to [`TodoState::settle`], which reconciles the
//! state with the server's answer.
//!
//! Toggle and delete are serialized per todo: while one request for an id
//! is in flight, further actions on that id queue up and are built against
//! the record the server returned, so rapid toggles cannot interleave.
//!
//! A list fetched before a create settled does not contain the new todo, so
//! todos created while a load is outstanding are carried over into the
//! loaded list.

use std::collections::{HashMap, HashSet, VecDeque};

use uuid::Uuid;

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{CreateTodo, Todo, UpdateTodo};

pub const FETCH_FAILED: &str = "Failed to fetch todos. Please try again later.";
pub const ADD_FAILED: &str = "Failed to add todo.";
pub const UPDATE_FAILED: &str = "Failed to update todo.";
pub const DELETE_FAILED: &str = "Failed to delete todo.";
pub const DRAFT_INCOMPLETE: &str = "Title and description are required.";

/// Unsaved input of the add-item form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub description: String,
}

impl Draft {
    fn validate(&self) -> Result<CreateTodo, ApiError> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Err(ApiError::Validation(DRAFT_INCOMPLETE.to_string()));
        }
        Ok(CreateTodo {
            title: self.title.clone(),
            description: self.description.clone(),
        })
    }
}

/// What an in-flight request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Load,
    Create,
    Toggle(Uuid),
    Delete(Uuid),
}

/// A request the host must execute, tagged with the operation to settle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub operation: Operation,
    pub request: HttpRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Toggle,
    Delete,
}

#[derive(Debug)]
pub struct TodoState {
    client: TodoClient,
    items: Vec<Todo>,
    error_message: Option<String>,
    is_submitting: bool,
    is_modal_open: bool,
    draft: Draft,
    in_flight: HashSet<Uuid>,
    queued: HashMap<Uuid, VecDeque<Intent>>,
    loads_in_flight: usize,
    created_during_load: Vec<Todo>,
}

impl TodoState {
    pub fn new(client: TodoClient) -> Self {
        Self {
            client,
            items: Vec::new(),
            error_message: None,
            is_submitting: false,
            is_modal_open: false,
            draft: Draft::default(),
            in_flight: HashSet::new(),
            queued: HashMap::new(),
            loads_in_flight: 0,
            created_during_load: Vec::new(),
        }
    }

    pub fn items(&self) -> &[Todo] {
        &self.items
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn is_modal_open(&self) -> bool {
        self.is_modal_open
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// True while a toggle or delete for `id` is in flight.
    pub fn is_pending(&self, id: Uuid) -> bool {
        self.in_flight.contains(&id)
    }

    /// Fetch the full list. Used on startup and for manual reloads.
    pub fn mount(&mut self) -> Dispatch {
        self.loads_in_flight += 1;
        Dispatch {
            operation: Operation::Load,
            request: self.client.build_list_todos(),
        }
    }

    pub fn open_modal(&mut self) {
        self.is_modal_open = true;
    }

    /// Close the add-item form. The draft is kept for the next opening.
    pub fn close_modal(&mut self) {
        self.is_modal_open = false;
        self.error_message = None;
    }

    pub fn set_draft_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
    }

    pub fn set_draft_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
    }

    /// Send the draft as a new todo. Returns `None` while a previous submit
    /// is still pending or when the draft is incomplete.
    pub fn submit(&mut self) -> Option<Dispatch> {
        if self.is_submitting {
            return None;
        }
        self.error_message = None;

        let request = match self
            .draft
            .validate()
            .and_then(|input| self.client.build_create_todo(&input))
        {
            Ok(request) => request,
            Err(ApiError::Validation(msg)) => {
                self.error_message = Some(msg);
                return None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to build create request");
                self.error_message = Some(ADD_FAILED.to_string());
                return None;
            }
        };

        self.is_submitting = true;
        Some(Dispatch {
            operation: Operation::Create,
            request,
        })
    }

    /// Flip `completed` on the todo with this id.
    pub fn toggle(&mut self, id: Uuid) -> Option<Dispatch> {
        self.enqueue(id, Intent::Toggle)
    }

    pub fn delete(&mut self, id: Uuid) -> Option<Dispatch> {
        self.enqueue(id, Intent::Delete)
    }

    /// Apply the outcome of a dispatched request. Returns the next queued
    /// request for the same todo, if any.
    pub fn settle(
        &mut self,
        operation: Operation,
        outcome: Result<HttpResponse, ApiError>,
    ) -> Option<Dispatch> {
        match operation {
            Operation::Load => {
                self.loads_in_flight = self.loads_in_flight.saturating_sub(1);
                match outcome.and_then(|resp| self.client.parse_list_todos(resp)) {
                    Ok(mut todos) => {
                        tracing::debug!(count = todos.len(), "Loaded todos");
                        for created in &self.created_during_load {
                            if !todos.iter().any(|t| t.id == created.id) {
                                todos.push(created.clone());
                            }
                        }
                        self.items = todos;
                        self.error_message = None;
                        self.prune_queues();
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Failed to fetch todos");
                        self.error_message = Some(FETCH_FAILED.to_string());
                    }
                }
                if self.loads_in_flight == 0 {
                    self.created_during_load.clear();
                }
                None
            }
            Operation::Create => {
                self.is_submitting = false;
                match outcome.and_then(|resp| self.client.parse_create_todo(resp)) {
                    Ok(todo) => {
                        if self.loads_in_flight > 0 {
                            self.created_during_load.push(todo.clone());
                        }
                        self.items.push(todo);
                        self.draft = Draft::default();
                        self.is_modal_open = false;
                        self.error_message = None;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Failed to add todo");
                        let message = err.server_message().unwrap_or(ADD_FAILED);
                        self.error_message = Some(message.to_string());
                    }
                }
                None
            }
            Operation::Toggle(id) => {
                self.in_flight.remove(&id);
                match outcome.and_then(|resp| self.client.parse_update_todo(resp)) {
                    Ok(Some(todo)) => {
                        if let Some(slot) = self.items.iter_mut().find(|t| t.id == id) {
                            *slot = todo;
                        }
                    }
                    Ok(None) => {
                        tracing::debug!(todo_id = %id, "Todo vanished on the server");
                        self.remove_item(id);
                    }
                    Err(err) => {
                        tracing::warn!(todo_id = %id, error = %err, "Failed to update todo");
                        self.error_message = Some(UPDATE_FAILED.to_string());
                    }
                }
                self.next_queued(id)
            }
            Operation::Delete(id) => {
                self.in_flight.remove(&id);
                match outcome.and_then(|resp| self.client.parse_delete_todo(resp)) {
                    Ok(_) => self.remove_item(id),
                    Err(err) => {
                        tracing::warn!(todo_id = %id, error = %err, "Failed to delete todo");
                        self.error_message = Some(DELETE_FAILED.to_string());
                    }
                }
                self.next_queued(id)
            }
        }
    }

    fn enqueue(&mut self, id: Uuid, intent: Intent) -> Option<Dispatch> {
        self.error_message = None;
        if !self.items.iter().any(|t| t.id == id) {
            return None;
        }
        if self.in_flight.contains(&id) {
            tracing::debug!(todo_id = %id, ?intent, "Queued behind in-flight request");
            self.queued.entry(id).or_default().push_back(intent);
            return None;
        }
        self.issue(id, intent)
    }

    fn issue(&mut self, id: Uuid, intent: Intent) -> Option<Dispatch> {
        let todo = self.items.iter().find(|t| t.id == id)?;
        let (operation, request) = match intent {
            Intent::Toggle => {
                let patch = UpdateTodo::completed(!todo.completed);
                match self.client.build_update_todo(id, &patch) {
                    Ok(request) => (Operation::Toggle(id), request),
                    Err(err) => {
                        tracing::warn!(todo_id = %id, error = %err, "Failed to build update request");
                        self.error_message = Some(UPDATE_FAILED.to_string());
                        return None;
                    }
                }
            }
            Intent::Delete => (Operation::Delete(id), self.client.build_delete_todo(id)),
        };
        self.in_flight.insert(id);
        Some(Dispatch { operation, request })
    }

    fn next_queued(&mut self, id: Uuid) -> Option<Dispatch> {
        loop {
            let Some(intent) = self.queued.get_mut(&id).and_then(VecDeque::pop_front) else {
                break;
            };
            if let Some(dispatch) = self.issue(id, intent) {
                return Some(dispatch);
            }
            if !self.items.iter().any(|t| t.id == id) {
                break;
            }
        }
        self.queued.remove(&id);
        None
    }

    fn remove_item(&mut self, id: Uuid) {
        self.items.retain(|t| t.id != id);
        self.queued.remove(&id);
    }

    fn prune_queues(&mut self) {
        let items = &self.items;
        self.queued.retain(|id, _| items.iter().any(|t| t.id == *id));
    }
}
