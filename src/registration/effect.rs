//! Replies and side effects produced by stage transitions

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Effect {
    #[default]
    None,
    /// Insert a registrant row using `name` as the display name
    WriteRegistrant { name: String },
}

impl Effect {
    #[allow(dead_code)] // Used in tests
    pub fn is_write(&self) -> bool {
        matches!(self, Effect::WriteRegistrant { .. })
    }
}

/// Text sent back to the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Welcome { event_name: Option<String> },
    StillWaitingForName,
    Registered,
    AlreadyRegistered,
    RetryLater,
    RegistrationClosed,
}

impl Reply {
    pub fn text(&self) -> String {
        match self {
            Reply::Welcome {
                event_name: Some(name),
            } => format!(
                "Hi! I'm the registration bot for \"{name}\".\n\n\
                 Send me your full name to register."
            ),
            Reply::Welcome { event_name: None } => {
                "Hi! I'm the event registration bot.\n\nSend me your full name to register."
                    .to_string()
            }
            Reply::StillWaitingForName => "Still waiting for your name!".to_string(),
            Reply::Registered => "Thanks! You are registered.".to_string(),
            Reply::AlreadyRegistered => "You are already registered!".to_string(),
            Reply::RetryLater => "Something went wrong. Please try again.".to_string(),
            Reply::RegistrationClosed => {
                "Registration is closed right now. Please try again later.".to_string()
            }
        }
    }
}
