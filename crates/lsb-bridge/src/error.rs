use std::fmt;

/// Boundary error variants. Each one is fatal to the operation that produced
/// it; the bridge never terminates the process on its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BridgeError {
    /// A READY session already exists in this process.
    AlreadyActive,
    /// A script failed to read, parse, or execute its top-level statements.
    Load { op: &'static str, message: String },
    /// The tick handler raised during execution.
    Invocation { message: String },
    /// Any other interpreter-reported failure (allocation, global binding).
    Interp { op: &'static str, message: String },
    /// A requested global is absent or not convertible to the host type.
    TypeMismatch { name: String, expected: &'static str },
    /// A TableBuilder call arrived out of protocol order.
    TableProtocol(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::AlreadyActive => {
                write!(f, "a lua session is already active in this process")
            }
            BridgeError::Load { op, message } => write!(f, "{op} failed: {message}"),
            BridgeError::Invocation { message } => {
                write!(f, "tick handler raised: {message}")
            }
            BridgeError::Interp { op, message } => write!(f, "{op} failed: {message}"),
            BridgeError::TypeMismatch { name, expected } => {
                write!(f, "global '{name}' is absent or not a valid {expected}")
            }
            BridgeError::TableProtocol(message) => {
                write!(f, "table protocol violation: {message}")
            }
        }
    }
}

impl std::error::Error for BridgeError {}

pub(crate) fn interp(op: &'static str, err: mlua::Error) -> BridgeError {
    BridgeError::Interp {
        op,
        message: err.to_string(),
    }
}
