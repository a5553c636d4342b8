//! Published screen state.

use std::sync::Arc;

use tasker_core::{SortOrder, Task};
use tasker_store::StoreError;

/// State of one live list as a screen sees it.
#[derive(Clone, Debug, Default)]
pub enum ListState {
    /// No result has arrived yet.
    #[default]
    Loading,
    /// The latest result.
    Loaded {
        /// Deadline order of `tasks`; `None` for lists with no sort choice.
        order: Option<SortOrder>,
        /// Subscription this result came from. Bumped on every re-subscribe,
        /// so a result tagged with an older generation is stale.
        generation: u64,
        /// The tasks, in display order.
        tasks: Vec<Task>,
    },
    /// The subscription failed and stopped.
    Failed(Arc<StoreError>),
}

impl ListState {
    /// Tasks of a loaded list.
    pub fn tasks(&self) -> Option<&[Task]> {
        match self {
            Self::Loaded { tasks, .. } => Some(tasks),
            _ => None,
        }
    }

    /// Generation of a loaded list.
    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::Loaded { generation, .. } => Some(*generation),
            _ => None,
        }
    }

    /// Order of a loaded, sorted list.
    pub fn order(&self) -> Option<SortOrder> {
        match self {
            Self::Loaded { order, .. } => *order,
            _ => None,
        }
    }

    /// Whether no result has arrived yet.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The failure, if the subscription stopped.
    pub fn error(&self) -> Option<&StoreError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_on_loaded() {
        let state = ListState::Loaded {
            order: Some(SortOrder::Descending),
            generation: 3,
            tasks: vec![Task::new("a")],
        };
        assert_eq!(state.tasks().map(<[Task]>::len), Some(1));
        assert_eq!(state.generation(), Some(3));
        assert_eq!(state.order(), Some(SortOrder::Descending));
        assert!(!state.is_loading());
        assert!(state.error().is_none());
    }

    #[test]
    fn default_is_loading() {
        let state = ListState::default();
        assert!(state.is_loading());
        assert!(state.tasks().is_none());
        assert!(state.generation().is_none());
    }

    #[test]
    fn failed_exposes_error() {
        let state = ListState::Failed(Arc::new(StoreError::Internal("boom".into())));
        assert!(state.error().unwrap().to_string().contains("boom"));
        assert!(state.tasks().is_none());
    }
}
