use tracing::error;

/// Failure of one of the collaborators a request touches.  The HTTP surface never exposes these
/// kinds to clients; they only drive logging and the handlers' choice of error payload.
#[derive(Debug)]
pub enum AppError {
    Plivo(&'static str),
    Pusher(&'static str),
    Store(&'static str),
    Request(&'static str),
    Config(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AppError::Plivo(msg) => write!(f, "plivo: {msg}"),
            AppError::Pusher(msg) => write!(f, "pusher: {msg}"),
            AppError::Store(msg) => write!(f, "store: {msg}"),
            AppError::Request(msg) => write!(f, "request: {msg}"),
            AppError::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

pub fn handle_error(e: impl std::error::Error) {
    error!("ERROR: {e}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_collaborator() {
        assert_eq!(
            AppError::Plivo("live conference query").to_string(),
            "plivo: live conference query"
        );
        assert_eq!(
            AppError::Config("PLIVO_NUMBER not set".to_string()).to_string(),
            "config: PLIVO_NUMBER not set"
        );
    }
}
