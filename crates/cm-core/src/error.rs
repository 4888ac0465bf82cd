use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Service call {domain}.{service} on {target} failed: {message}")]
    ServiceCall {
        domain: &'static str,
        service: &'static str,
        target: String,
        message: String,
    },
}
