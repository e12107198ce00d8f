/// How a client run ended. Each outcome maps to a distinct exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Finished,
    Usage,
    InvalidPort,
    BadServer,
    SystemError,
    ClientEof,
    ServerDisconnected,
    ServerFull,
    ProtocolError,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Finished => 0,
            Outcome::Usage => 1,
            Outcome::InvalidPort => 4,
            Outcome::BadServer => 5,
            Outcome::SystemError => 8,
            Outcome::ClientEof => 9,
            Outcome::ServerDisconnected => 10,
            Outcome::ServerFull => 11,
            Outcome::ProtocolError => 12,
        }
    }

    /// Message for standard error; clean termination prints nothing.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Outcome::Finished => None,
            Outcome::Usage => Some("Usage: trivial name port [host]"),
            Outcome::InvalidPort => Some("Invalid Port"),
            Outcome::BadServer => Some("Bad Server"),
            Outcome::SystemError => Some("System Error"),
            Outcome::ClientEof => Some("Client EOF"),
            Outcome::ServerDisconnected => Some("Server Disconnected"),
            Outcome::ServerFull => Some("Server Full"),
            Outcome::ProtocolError => Some("Protocol Error"),
        }
    }
}

/// `1..=65535`, digits only.
pub fn parse_port(s: &str) -> Option<u16> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u16>().ok().filter(|port| *port != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let all = [
            Outcome::Finished,
            Outcome::Usage,
            Outcome::InvalidPort,
            Outcome::BadServer,
            Outcome::SystemError,
            Outcome::ClientEof,
            Outcome::ServerDisconnected,
            Outcome::ServerFull,
            Outcome::ProtocolError,
        ];
        let mut codes: Vec<u8> = all.iter().map(|o| o.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn test_labels() {
        assert_eq!(Outcome::Finished.label(), None);
        assert_eq!(Outcome::ServerFull.label(), Some("Server Full"));
        assert_eq!(Outcome::ProtocolError.label(), Some("Protocol Error"));
        assert_eq!(Outcome::ClientEof.label(), Some("Client EOF"));
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("4000"), Some(4000));
        assert_eq!(parse_port("65535"), Some(65535));
        assert_eq!(parse_port("0"), None);
        assert_eq!(parse_port("65536"), None);
        assert_eq!(parse_port("40a"), None);
        assert_eq!(parse_port(""), None);
    }
}
