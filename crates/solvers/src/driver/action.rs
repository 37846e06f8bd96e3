/// Actions an observer can take when the solver reports a new iterate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// End the run at the current iterate.
    ///
    /// The driver writes [`Task::Stop`](crate::protocol::Task::Stop) and
    /// steps once more so the solver can acknowledge it.
    Stop,
}
