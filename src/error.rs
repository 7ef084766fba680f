use std::fmt;

// Errors raised while building a vehicle or driving the world that hosts it.
// Airborne wheels and disabled-vehicle requests are not errors.

#[derive(Debug)]
pub enum ConfigError {
    NonFinite { field: &'static str },
    NotPositive { field: &'static str, value: f32 },
    Negative { field: &'static str, value: f32 },
    OutOfRange { field: &'static str, value: f32, min: f32, max: f32 },
    InvalidCurve { field: &'static str, reason: &'static str },
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonFinite { field } => write!(f, "{field} must be finite"),
            ConfigError::NotPositive { field, value } => {
                write!(f, "{field} must be greater than zero (got {value})")
            }
            ConfigError::Negative { field, value } => {
                write!(f, "{field} must not be negative (got {value})")
            }
            ConfigError::OutOfRange { field, value, min, max } => {
                write!(f, "{field} must lie in [{min}, {max}] (got {value})")
            }
            ConfigError::InvalidCurve { field, reason } => write!(f, "{field}: {reason}"),
            ConfigError::Io(err) => write!(f, "config read error: {err}"),
            ConfigError::Parse(err) => write!(f, "config parse error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

#[derive(Debug)]
pub enum WorldError {
    UnknownVehicle(String),
    MissingBody(String),
    Config(ConfigError),
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::UnknownVehicle(id) => write!(f, "no vehicle registered as {id}"),
            WorldError::MissingBody(id) => write!(f, "vehicle {id} has no chassis body"),
            WorldError::Config(err) => write!(f, "invalid vehicle config: {err}"),
        }
    }
}

impl std::error::Error for WorldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorldError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for WorldError {
    fn from(err: ConfigError) -> Self {
        WorldError::Config(err)
    }
}
