//! Connection profiles: the TOML store and effective-connection resolution.
//!
//! The HTTP client only ever sees a resolved [`ConnectionProfile`]; choosing
//! between flags, environment and stored profiles happens once, in
//! [`resolve_connection`].

mod error;
mod profile;
mod resolve;
mod store;

pub use error::ConfigError;
pub use profile::{ConfigFile, ConnectionProfile, GatewayProfile, validate_timeout_secs};
pub use resolve::{
    ADHOC_PROFILE_NAME, ConnectionFlags, EnvOverrides, PROFILE_ENV, TOKEN_ENV, URL_ENV,
    resolve_connection,
};
pub use store::ConfigStore;
