#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No peer set yet, or the session ended
    Disconnected,
    /// Peers are known but no host is settled
    ElectingHost,
    HostActive,
    /// Following a host, waiting for its scene ids
    ClientAwaitingSync,
    ClientActive,
}

impl SessionState {
    pub fn is_host(&self) -> bool {
        matches!(self, SessionState::HostActive)
    }

    pub fn is_client(&self) -> bool {
        matches!(
            self,
            SessionState::ClientAwaitingSync | SessionState::ClientActive
        )
    }
}
