use std::sync::Arc;

use fspiop_core::{CallbackSender, ParticipantDirectory};

/// Collaborators shared by every event handler.
#[derive(Clone)]
pub struct DispatcherState {
    /// FSP identity the switch inserts when relaying party traffic.
    pub switch_fsp_id: String,
    pub directory: Arc<dyn ParticipantDirectory>,
    pub sender: Arc<dyn CallbackSender>,
}

impl DispatcherState {
    pub fn new(
        switch_fsp_id: impl Into<String>,
        directory: Arc<dyn ParticipantDirectory>,
        sender: Arc<dyn CallbackSender>,
    ) -> Self {
        Self {
            switch_fsp_id: switch_fsp_id.into(),
            directory,
            sender,
        }
    }
}
