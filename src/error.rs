use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagenError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("A generation request is already in flight")]
    InFlight,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImagenError {
    /// Message shown to the user, without the category prefix.
    pub fn user_message(&self) -> String {
        match self {
            ImagenError::Validation(msg)
            | ImagenError::Transport(msg)
            | ImagenError::Service(msg)
            | ImagenError::Decode(msg)
            | ImagenError::Config(msg) => msg.clone(),
            ImagenError::InFlight => self.to_string(),
            ImagenError::Io(e) => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImagenError>;
