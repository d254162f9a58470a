//! Health state machine of an agent.
//!
//! ```text
//! unknown --start--> healthy <--degrade/recover--> degraded
//!    \                  |                             |
//!     `------------stop-+-------------stop------------'--> unhealthy
//! ```
//!
//! `unhealthy` is terminal for an agent instance.

use a2a_rt_core::{A2aRtError, Result};
use a2a_rt_protocol::AgentStatus;

#[derive(Debug, Default)]
pub struct Lifecycle {
    status: AgentStatus,
    starting: bool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    /// Claims the start transition. Only one caller holds the claim until
    /// [`Lifecycle::start`] or [`Lifecycle::abort_start`] releases it.
    pub fn begin_start(&mut self) -> Result<()> {
        if self.starting {
            return Err(A2aRtError::InvalidTransition {
                from: "starting",
                to: AgentStatus::Healthy.as_str(),
            });
        }
        match self.status {
            AgentStatus::Unknown => {
                self.starting = true;
                Ok(())
            }
            other => Err(invalid(other, AgentStatus::Healthy)),
        }
    }

    pub fn abort_start(&mut self) {
        self.starting = false;
    }

    pub fn start(&mut self) -> Result<()> {
        self.starting = false;
        match self.status {
            AgentStatus::Unknown => {
                self.status = AgentStatus::Healthy;
                Ok(())
            }
            other => Err(invalid(other, AgentStatus::Healthy)),
        }
    }

    /// Always succeeds. Returns the status the agent was in.
    pub fn stop(&mut self) -> AgentStatus {
        std::mem::replace(&mut self.status, AgentStatus::Unhealthy)
    }

    /// Returns whether the status changed.
    pub fn degrade(&mut self) -> Result<bool> {
        match self.status {
            AgentStatus::Healthy => {
                self.status = AgentStatus::Degraded;
                Ok(true)
            }
            AgentStatus::Degraded => Ok(false),
            other => Err(invalid(other, AgentStatus::Degraded)),
        }
    }

    /// Returns whether the status changed.
    pub fn recover(&mut self) -> Result<bool> {
        match self.status {
            AgentStatus::Degraded => {
                self.status = AgentStatus::Healthy;
                Ok(true)
            }
            AgentStatus::Healthy => Ok(false),
            other => Err(invalid(other, AgentStatus::Healthy)),
        }
    }
}

fn invalid(from: AgentStatus, to: AgentStatus) -> A2aRtError {
    A2aRtError::InvalidTransition {
        from: from.as_str(),
        to: to.as_str(),
    }
}
