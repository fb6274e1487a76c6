use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty {
        field: &'static str,
    },
    InvalidMsisdn {
        input: String,
    },
    InvalidSenderId {
        input: String,
    },
    MissingOption {
        option: &'static str,
        required_by: &'static str,
    },
    ReservedField {
        key: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::InvalidMsisdn { input } => write!(
                f,
                "invalid recipient {input:?}: use international format, country code followed \
                 by number, digits only, no leading zero or '+'"
            ),
            Self::InvalidSenderId { input } => write!(
                f,
                "invalid sender id {input:?}: expected up to 16 digits or up to 11 \
                 alphanumeric characters"
            ),
            Self::MissingOption {
                option,
                required_by,
            } => write!(f, "{required_by} requires {option} to be set"),
            Self::ReservedField { key } => write!(
                f,
                "{key:?} is set by the client and cannot be passed as an extra parameter"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}
