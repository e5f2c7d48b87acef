//! Local role and the perspective mapping derived from it

use serde::Serialize;

use super::PlayerId;

/// Which way an attack travels on the local screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    /// Fired by the local player, flies away from the camera
    Outgoing,
    /// Fired at the local player, flies toward the camera
    Incoming,
}

/// Presentation indexed by [local role][attacker]
const PRESENTATION_TABLE: [[Presentation; 2]; 2] = [
    [Presentation::Outgoing, Presentation::Incoming],
    [Presentation::Incoming, Presentation::Outgoing],
];

/// Role of this device, fixed at session start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleAssignment {
    local_role: PlayerId,
    presentation: [Presentation; 2],
}

impl RoleAssignment {
    pub fn new(local_role: PlayerId) -> Self {
        Self {
            local_role,
            presentation: PRESENTATION_TABLE[local_role.index()],
        }
    }

    pub fn local_role(&self) -> PlayerId {
        self.local_role
    }

    pub fn opponent(&self) -> PlayerId {
        self.local_role.other()
    }

    pub fn presentation(&self, attacker: PlayerId) -> Presentation {
        self.presentation[attacker.index()]
    }

    /// Topic announcing whether the opponent is on the local camera
    pub fn screen_topic(&self, visible: bool) -> String {
        let state = if visible { "on" } else { "off" };
        format!("{}_{}_{}screen", self.opponent().tag(), state, self.local_role.tag())
    }
}
