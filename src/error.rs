use std::fmt;

/// Errors that can occur while reading, parsing and reporting ZFS statistics
#[derive(Debug)]
pub enum DiagError {
    /// A command line value was rejected before any work started
    Config { argument: String, reason: String },

    /// File system operation failed
    Filesystem {
        path: String,
        operation: String,
        source: std::io::Error,
    },

    /// Parsing failed for a specific data source
    Parse {
        data_source: String,
        data: String,
        reason: String,
    },

    /// Invalid or unexpected data format
    InvalidFormat {
        expected: String,
        received: String,
        context: String,
    },

    /// Command execution failed
    Command {
        command: String,
        args: Vec<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Timeout occurred during operation
    Timeout {
        operation: String,
        timeout: std::time::Duration,
    },

    /// Required ZFS subsystem not available
    SubsystemUnavailable { subsystem: String, reason: String },
}

impl fmt::Display for DiagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagError::Config { argument, reason } => {
                write!(f, "Invalid {}: {}", argument, reason)
            }
            DiagError::Filesystem {
                path,
                operation,
                source,
            } => {
                write!(f, "Filesystem {} failed for path {}: {}", operation, path, source)
            }
            DiagError::Parse {
                data_source,
                data,
                reason,
            } => {
                if data.is_empty() {
                    write!(f, "Failed to parse {}: {}", data_source, reason)
                } else {
                    write!(f, "Failed to parse {}: {} (in '{}')", data_source, reason, data)
                }
            }
            DiagError::InvalidFormat {
                expected,
                received,
                context,
            } => {
                write!(
                    f,
                    "Invalid format in {}: expected {}, received '{}'",
                    context, expected, received
                )
            }
            DiagError::Command { command, args, source } => {
                write!(f, "Command failed: {} {}: {}", command, args.join(" "), source)
            }
            DiagError::Timeout { operation, timeout } => {
                write!(f, "{} timed out after {:?}", operation, timeout)
            }
            DiagError::SubsystemUnavailable { subsystem, reason } => {
                write!(f, "{} subsystem unavailable: {}", subsystem, reason)
            }
        }
    }
}

impl std::error::Error for DiagError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiagError::Filesystem { source, .. } => Some(source),
            DiagError::Command { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl DiagError {
    /// Create a configuration error
    pub fn config_error(argument: &str, reason: &str) -> Self {
        DiagError::Config {
            argument: argument.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a filesystem error wrapping the underlying I/O failure
    pub fn filesystem_error(path: &str, operation: &str, source: std::io::Error) -> Self {
        DiagError::Filesystem {
            path: path.to_string(),
            operation: operation.to_string(),
            source,
        }
    }

    /// Create a parse error
    pub fn parse_error(data_source: &str, data: &str, reason: &str) -> Self {
        DiagError::Parse {
            data_source: data_source.to_string(),
            data: data.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid format error
    pub fn invalid_format(expected: &str, received: &str, context: &str) -> Self {
        DiagError::InvalidFormat {
            expected: expected.to_string(),
            received: received.to_string(),
            context: context.to_string(),
        }
    }

    /// Create a command error
    pub fn command_error(command: &str, args: &[&str], message: &str) -> Self {
        DiagError::Command {
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            source: message.to_string().into(),
        }
    }

    /// Create a timeout error
    pub fn timeout_error(operation: &str, timeout: std::time::Duration) -> Self {
        DiagError::Timeout {
            operation: operation.to_string(),
            timeout,
        }
    }

    /// Create a subsystem unavailable error
    pub fn subsystem_unavailable(subsystem: &str, reason: &str) -> Self {
        DiagError::SubsystemUnavailable {
            subsystem: subsystem.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Result type alias for diagnostic operations
pub type DiagResult<T> = Result<T, DiagError>;
