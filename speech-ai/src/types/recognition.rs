//! Cloud recognition operations.

/// Where a long-running recognition currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationState {
    Running,
    Succeeded { text: String },
    Failed { message: String },
}

/// A remote recognition job identified by an id and discovered by polling.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRunningOperation {
    pub id: String,
    pub state: OperationState,
}

impl LongRunningOperation {
    pub fn is_done(&self) -> bool {
        !matches!(self.state, OperationState::Running)
    }
}
