use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
   /// Transport, auth, timeout or non-2xx response from the oracle.
   #[error("interpreter unavailable: {0}")]
   OracleUnavailable(String),

   /// The oracle answered, but not with a usable filter document.
   #[error("interpreter returned malformed response: {0}")]
   OracleMalformed(String),

   #[error("invalid filters: {0}")]
   InvalidFilters(String),

   #[error("invalid catalog: {0}")]
   InvalidCatalog(String),

   #[error("configuration error: {0}")]
   Config(#[from] Box<figment::Error>),

   #[error("io error: {0}")]
   Io(#[from] std::io::Error),

   #[error("json error: {0}")]
   Json(#[from] serde_json::Error),

   #[error("toml error: {0}")]
   Toml(#[from] toml::de::Error),

   #[error("http error: {0}")]
   Http(#[from] reqwest::Error),
}

impl From<figment::Error> for Error {
   fn from(err: figment::Error) -> Self {
      Self::Config(Box::new(err))
   }
}

impl Error {
   /// Whether this error came from the semantic oracle boundary.
   pub const fn is_oracle(&self) -> bool {
      matches!(self, Self::OracleUnavailable(_) | Self::OracleMalformed(_) | Self::Http(_))
   }
}
