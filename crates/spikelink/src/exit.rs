use std::fmt;
use std::io;

use spikelink_filter::FilterError;
use spikelink_frame::FrameError;
use spikelink_session::SessionError;
use spikelink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const PROTOCOL_ERROR: i32 = 76;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::InvalidData => DATA_INVALID,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::AddrInUse
        | io::ErrorKind::AddrNotAvailable => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match &err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => match source.kind() {
            io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
            _ => TRANSPORT_ERROR,
        },
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
        FrameError::Truncated { .. } | FrameError::WriteZero { .. } => {
            CliError::new(PROTOCOL_ERROR, format!("{context}: {err}"))
        }
        FrameError::LengthMismatch { .. } => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

pub fn filter_error(context: &str, err: FilterError) -> CliError {
    let code = match err {
        FilterError::ZeroOrder
        | FilterError::OrderTooLarge { .. }
        | FilterError::InvalidStepSize(_)
        | FilterError::UnknownKind(_) => USAGE,
        FilterError::ZeroDimension | FilterError::StateTooLarge { .. } => PROTOCOL_ERROR,
        FilterError::DimensionMismatch { .. } | FilterError::WeightShape { .. } => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Frame(err) => frame_error(context, err),
        SessionError::Filter(err) => filter_error(context, err),
        SessionError::Protocol(_) => CliError::new(PROTOCOL_ERROR, format!("{context}: {err}")),
        SessionError::Disconnected(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        SessionError::InvalidInput(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use spikelink_frame::RecordKind;

    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:8889".parse().unwrap()
    }

    #[test]
    fn connection_failures_are_transport_errors() {
        let err = TransportError::Connect {
            addr: addr(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        let cli = session_error("connect failed", SessionError::Transport(err));
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.starts_with("connect failed: "));
    }

    #[test]
    fn privileged_port_is_permission_denied() {
        let err = TransportError::Bind {
            addr: addr(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(transport_error("bind failed", err).code, PERMISSION_DENIED);
    }

    #[test]
    fn protocol_violations_map_to_protocol_code() {
        let cli = session_error(
            "handshake failed",
            SessionError::Protocol("unexpected acknowledgment 7 (expected 1)".to_string()),
        );
        assert_eq!(cli.code, PROTOCOL_ERROR);

        let truncated = FrameError::Truncated {
            record: RecordKind::Sample,
            expected: 8,
            received: 3,
        };
        assert_eq!(frame_error("read failed", truncated).code, PROTOCOL_ERROR);
    }

    #[test]
    fn bad_filter_parameters_are_usage_errors() {
        let cli = session_error("bind failed", SessionError::Filter(FilterError::ZeroOrder));
        assert_eq!(cli.code, USAGE);

        let too_deep = FilterError::OrderTooLarge {
            order: 100_000,
            max: 4096,
        };
        assert_eq!(filter_error("bind failed", too_deep).code, USAGE);
    }

    #[test]
    fn oversized_filter_state_is_protocol_error() {
        let err = FilterError::StateTooLarge {
            dim: 1024,
            order: 4096,
            max: 1 << 27,
        };
        assert_eq!(filter_error("accept failed", err).code, PROTOCOL_ERROR);
    }

    #[test]
    fn bad_input_is_data_invalid() {
        let cli = session_error(
            "probe failed",
            SessionError::InvalidInput("dataset is empty".to_string()),
        );
        assert_eq!(cli.code, DATA_INVALID);
        assert_eq!(
            io_error("read failed", io::Error::from(io::ErrorKind::NotFound)).code,
            DATA_INVALID
        );
    }
}
