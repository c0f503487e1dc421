use serde::{Deserialize, Serialize};

/// Internet reachability as last acted upon by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectivityState {
    #[default]
    Disconnected,
    Connected,
}

/// Edge reported by [`ConnectivityState::observe`]. NAT is reprogrammed
/// once per edge and never for repeated identical probe results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Connected,
    Disconnected,
}

impl ConnectivityState {
    pub fn observe(&mut self, reachable: bool) -> Option<Transition> {
        match (*self, reachable) {
            (ConnectivityState::Disconnected, true) => {
                *self = ConnectivityState::Connected;
                Some(Transition::Connected)
            }
            (ConnectivityState::Connected, false) => {
                *self = ConnectivityState::Disconnected;
                Some(Transition::Disconnected)
            }
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        *self == ConnectivityState::Connected
    }
}
