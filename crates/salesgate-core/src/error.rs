use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid config file: {0}")]
    ConfigFile(#[from] toml::de::Error),
}

impl Error {
    /// Helper for creating configuration errors
    ///
    /// # Example
    /// ```
    /// use salesgate_core::Error;
    /// let err = Error::config_error("SQL_CONNECTION_STRING is not set");
    /// ```
    pub fn config_error(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}
