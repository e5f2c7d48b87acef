//! Turn status line and check marks, relative to the local role

use crate::util::time::reached;
use crate::ws::protocol::{StatusMsg, StatusView};

use super::role::RoleAssignment;

/// Seconds both check marks stay up once both turns are complete
const CHECK_MARK_HOLD: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct TurnStatus {
    text: String,
    near_done: bool,
    far_done: bool,
    clear_in: Option<f64>,
}

impl TurnStatus {
    pub fn new() -> Self {
        Self {
            text: "No Action".to_string(),
            near_done: false,
            far_done: false,
            clear_in: None,
        }
    }

    pub fn apply(&mut self, role: &RoleAssignment, msg: &StatusMsg) {
        let local = role.local_role();
        if let Some(label) = msg.action(local).label() {
            self.text = format!("{} {}", local.tag(), label);
        }

        self.near_done = msg.turn_complete(local);
        self.far_done = msg.turn_complete(role.opponent());
        self.clear_in = (self.near_done && self.far_done).then_some(CHECK_MARK_HOLD);
    }

    pub fn tick(&mut self, dt: f64) {
        if let Some(remaining) = self.clear_in {
            let remaining = remaining - dt;
            if reached(0.0, remaining) {
                self.near_done = false;
                self.far_done = false;
                self.clear_in = None;
            } else {
                self.clear_in = Some(remaining);
            }
        }
    }

    pub fn view(&self) -> StatusView {
        StatusView {
            text: self.text.clone(),
            near_done: self.near_done,
            far_done: self.far_done,
        }
    }
}

impl Default for TurnStatus {
    fn default() -> Self {
        Self::new()
    }
}
