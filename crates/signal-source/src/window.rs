//! Foreground window inspection

use std::sync::{Arc, Mutex};

/// Reports which application currently has focus.
pub trait WindowInspector: Send + Sync + 'static {
    /// Title of the active window. Empty when nothing can be resolved.
    fn active_title(&self) -> String;

    /// Titles of all open windows, used to offer target choices.
    fn list_titles(&self) -> Vec<String> {
        let active = self.active_title();
        if active.trim().is_empty() {
            Vec::new()
        } else {
            vec![active]
        }
    }
}

#[derive(Debug, Default)]
struct WindowTable {
    active: String,
    open: Vec<String>,
}

/// In-memory window inspector whose state is driven by the caller.
///
/// Cloning shares the underlying table, so a test can keep one handle and
/// switch the foreground window while the engine holds another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedWindows {
    table: Arc<Mutex<WindowTable>>,
}

impl ScriptedWindows {
    /// Create an inspector with the given window open and focused
    pub fn focused_on(title: &str) -> Self {
        let windows = Self::default();
        windows.open_window(title);
        windows.focus(title);
        windows
    }

    /// Make `title` the foreground window
    pub fn focus(&self, title: &str) {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table.active = title.to_string();
    }

    /// Add a window to the open list (no-op for duplicates)
    pub fn open_window(&self, title: &str) {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        if !table.open.iter().any(|t| t == title) {
            table.open.push(title.to_string());
        }
    }

    /// Clear the foreground window
    pub fn blur(&self) {
        self.focus("");
    }
}

impl WindowInspector for ScriptedWindows {
    fn active_title(&self) -> String {
        self.table
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .active
            .clone()
    }

    fn list_titles(&self) -> Vec<String> {
        self.table
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .open
            .iter()
            .filter(|t| !t.trim().is_empty())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_switch_is_shared_between_clones() {
        let windows = ScriptedWindows::focused_on("Editor");
        let engine_side = windows.clone();

        assert_eq!(engine_side.active_title(), "Editor");
        windows.focus("Browser");
        assert_eq!(engine_side.active_title(), "Browser");
        windows.blur();
        assert_eq!(engine_side.active_title(), "");
    }

    #[test]
    fn test_list_skips_blank_titles() {
        let windows = ScriptedWindows::default();
        windows.open_window("Editor");
        windows.open_window("   ");
        windows.open_window("Editor");
        windows.open_window("Terminal");

        assert_eq!(windows.list_titles(), vec!["Editor", "Terminal"]);
    }
}
