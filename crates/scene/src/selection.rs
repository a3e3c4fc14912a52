/// Single-selection state: `Idle` (no id) or `Selected(id)`.
///
/// At most one id is ever selected; selecting another id replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: Option<String>,
}

/// Result of feeding a click into `SelectionState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Unchanged,
    Selected(String),
    Cleared,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    /// Toggle semantics for a click:
    /// - hit on the selected id clears the selection
    /// - hit on another id selects it
    /// - a miss clears the selection
    pub fn click(&mut self, hit: Option<&str>) -> SelectionChange {
        match hit {
            Some(id) if self.is_selected(id) => self.clear(),
            Some(id) => {
                self.selected = Some(id.to_string());
                SelectionChange::Selected(id.to_string())
            }
            None => self.clear(),
        }
    }

    pub fn clear(&mut self) -> SelectionChange {
        match self.selected.take() {
            Some(_) => SelectionChange::Cleared,
            None => SelectionChange::Unchanged,
        }
    }
}
