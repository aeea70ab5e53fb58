use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{backend::Backend, Terminal};
use todo_core::{Dispatch, TodoState};

use crate::transport::{Completion, Transport};
use crate::ui;

const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Title,
    Description,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Title => Focus::Description,
            Focus::Description => Focus::Title,
        }
    }
}

/// Terminal-side wrapper around [`TodoState`]: cursor, input focus and the
/// quit flag. Everything about todos themselves lives in the state.
pub struct App {
    pub state: TodoState,
    pub selected: usize,
    pub focus: Focus,
    pub running: bool,
}

impl App {
    pub fn new(state: TodoState) -> Self {
        Self {
            state,
            selected: 0,
            focus: Focus::Title,
            running: true,
        }
    }

    /// Translate a key press into a state action.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Dispatch> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.running = false;
            return None;
        }
        if self.state.is_modal_open() {
            self.handle_modal_key(key)
        } else {
            self.handle_list_key(key)
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Option<Dispatch> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.state.items().len() {
                    self.selected += 1;
                }
                None
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                let id = self.selected_id()?;
                self.state.toggle(id)
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let id = self.selected_id()?;
                self.state.delete(id)
            }
            KeyCode::Char('a') => {
                self.focus = Focus::Title;
                self.state.open_modal();
                None
            }
            KeyCode::Char('r') => Some(self.state.mount()),
            _ => None,
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) -> Option<Dispatch> {
        match key.code {
            KeyCode::Esc => {
                self.state.close_modal();
                None
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = self.focus.next();
                None
            }
            KeyCode::Enter => self.state.submit(),
            KeyCode::Backspace => {
                self.edit_focused(|field| {
                    field.pop();
                });
                None
            }
            KeyCode::Char(c) => {
                self.edit_focused(|field| field.push(c));
                None
            }
            _ => None,
        }
    }

    fn edit_focused(&mut self, edit: impl FnOnce(&mut String)) {
        let draft = self.state.draft();
        match self.focus {
            Focus::Title => {
                let mut title = draft.title.clone();
                edit(&mut title);
                self.state.set_draft_title(title);
            }
            Focus::Description => {
                let mut description = draft.description.clone();
                edit(&mut description);
                self.state.set_draft_description(description);
            }
        }
    }

    /// Apply a finished request and keep the cursor on a real row.
    pub fn settle(&mut self, completion: Completion) -> Option<Dispatch> {
        let next = self.state.settle(completion.operation, completion.outcome);
        let len = self.state.items().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
        next
    }

    fn selected_id(&self) -> Option<uuid::Uuid> {
        self.state.items().get(self.selected).map(|todo| todo.id)
    }
}

/// Draw, read input, and settle finished requests until the user quits.
pub fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    transport: &Transport,
) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel();
    transport.spawn(app.state.mount(), tx.clone());

    while app.running {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(dispatch) = app.handle_key(key) {
                        transport.spawn(dispatch, tx.clone());
                    }
                }
            }
        }

        while let Ok(completion) = rx.try_recv() {
            if let Some(next) = app.settle(completion) {
                transport.spawn(next, tx.clone());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use todo_core::{ApiError, HttpResponse, Operation, TodoClient};

    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            assert!(app.handle_key(press(KeyCode::Char(c))).is_none());
        }
    }

    fn todo_json(n: u128, completed: bool) -> serde_json::Value {
        serde_json::json!({
            "id": uuid::Uuid::from_u128(n),
            "title": format!("todo {n}"),
            "description": "details",
            "completed": completed,
        })
    }

    fn loaded(count: u128) -> App {
        let mut app = App::new(TodoState::new(TodoClient::new("http://localhost:3000")));
        let todos: Vec<_> = (1..=count).map(|n| todo_json(n, false)).collect();
        app.settle(Completion {
            operation: Operation::Load,
            outcome: Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: serde_json::Value::Array(todos).to_string(),
            }),
        });
        app
    }

    #[test]
    fn cursor_stays_within_list() {
        let mut app = loaded(2);
        app.handle_key(press(KeyCode::Up));
        assert_eq!(app.selected, 0);
        app.handle_key(press(KeyCode::Down));
        app.handle_key(press(KeyCode::Char('j')));
        assert_eq!(app.selected, 1);
    }

    #[test]
    fn space_toggles_selected_todo() {
        let mut app = loaded(2);
        app.handle_key(press(KeyCode::Down));
        let dispatch = app.handle_key(press(KeyCode::Char(' '))).unwrap();
        assert_eq!(dispatch.operation, Operation::Toggle(uuid::Uuid::from_u128(2)));
    }

    #[test]
    fn toggle_on_empty_list_does_nothing() {
        let mut app = loaded(0);
        assert!(app.handle_key(press(KeyCode::Enter)).is_none());
    }

    #[test]
    fn deleting_last_row_moves_cursor_up() {
        let mut app = loaded(2);
        app.handle_key(press(KeyCode::Down));
        let dispatch = app.handle_key(press(KeyCode::Char('d'))).unwrap();
        app.settle(Completion {
            operation: dispatch.operation,
            outcome: Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: r#"{"message":"Todo deleted successfully"}"#.to_string(),
            }),
        });
        assert_eq!(app.state.items().len(), 1);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn modal_typing_fills_draft_and_enter_submits() {
        let mut app = loaded(0);
        app.handle_key(press(KeyCode::Char('a')));
        assert!(app.state.is_modal_open());

        type_text(&mut app, "Buy milkk");
        app.handle_key(press(KeyCode::Backspace));
        app.handle_key(press(KeyCode::Tab));
        type_text(&mut app, "2%");
        assert_eq!(app.state.draft().title, "Buy milk");
        assert_eq!(app.state.draft().description, "2%");

        // 'q' is text inside the modal, not quit.
        type_text(&mut app, "q");
        assert!(app.running);
        app.handle_key(press(KeyCode::Backspace));

        let dispatch = app.handle_key(press(KeyCode::Enter)).unwrap();
        assert_eq!(dispatch.operation, Operation::Create);
        assert!(app.handle_key(press(KeyCode::Enter)).is_none());
    }

    #[test]
    fn escape_closes_modal_then_quits() {
        let mut app = loaded(0);
        app.handle_key(press(KeyCode::Char('a')));
        app.handle_key(press(KeyCode::Esc));
        assert!(!app.state.is_modal_open());
        assert!(app.running);

        app.handle_key(press(KeyCode::Esc));
        assert!(!app.running);
    }

    #[test]
    fn reload_key_refetches() {
        let mut app = loaded(1);
        let dispatch = app.handle_key(press(KeyCode::Char('r'))).unwrap();
        assert_eq!(dispatch.operation, Operation::Load);

        app.settle(Completion {
            operation: Operation::Load,
            outcome: Err(ApiError::Transport("refused".to_string())),
        });
        assert!(app.state.error_message().is_some());
        assert_eq!(app.state.items().len(), 1);
    }

    #[test]
    fn ctrl_c_quits_from_modal() {
        let mut app = loaded(0);
        app.handle_key(press(KeyCode::Char('a')));
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!app.running);
    }
}
