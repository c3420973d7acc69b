use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {variable}: {value}")]
    InvalidValue { variable: String, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
