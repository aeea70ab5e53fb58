use std::path::PathBuf;

/// Terminal client configuration loaded from environment variables.
///
/// | Env Var        | Default                 |
/// |----------------|-------------------------|
/// | `TODO_API_URL` | `http://127.0.0.1:3000` |
/// | `TODO_TUI_LOG` | `todo-tui.log`          |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuiConfig {
    pub api_url: String,
    pub log_file: PathBuf,
}

impl TuiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|s: &String| !s.trim().is_empty());
        Self {
            api_url: non_blank("TODO_API_URL").unwrap_or_else(|| "http://127.0.0.1:3000".into()),
            log_file: non_blank("TODO_TUI_LOG")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("todo-tui.log")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let config = TuiConfig::from_lookup(|_| None);
        assert_eq!(config.api_url, "http://127.0.0.1:3000");
        assert_eq!(config.log_file, PathBuf::from("todo-tui.log"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = TuiConfig::from_lookup(|key| match key {
            "TODO_API_URL" => Some("http://todo.test:8080/".to_string()),
            _ => Some("   ".to_string()),
        });
        assert_eq!(config.api_url, "http://todo.test:8080/");
        assert_eq!(config.log_file, PathBuf::from("todo-tui.log"));
    }
}
