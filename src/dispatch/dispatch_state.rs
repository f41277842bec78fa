/// Where a single request is in its trip through the dispatcher.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DispatchState {
    Received,
    Resolved,
    Validated,
    Executing,
    Completed,
    Failed,
}

impl DispatchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DispatchState::Completed | DispatchState::Failed)
    }
}
