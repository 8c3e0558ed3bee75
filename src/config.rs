//! Invocation parsing.
//!
//! vireo is configured entirely from the command line: `vireo <port> <password>`.  There is
//! no configuration file.

use std::net::SocketAddr;

/// The domain of the server, used as the prefix of every reply it sends.
const DOMAIN: &str = "localhost";

/// The settings consumed by the shared state.
pub struct StateConfig {
    /// The domain of the server.
    pub domain: String,

    /// The connection password.  Clients must issue a PASS command with this password before
    /// their registration completes.
    pub password: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            domain: DOMAIN.to_owned(),
            password: String::new(),
        }
    }
}

/// The whole configuration of the server.
pub struct Config {
    /// The IP and TCP port to which to bind.
    pub bind_to_address: SocketAddr,

    /// Settings forwarded to the shared state.
    pub state: StateConfig,
}

/// Builds the configuration from the command-line arguments.
///
/// The first item of `args` is expected to be the program name.  Exactly two arguments must
/// follow: a port in 1..=65535 and a non-empty password.
pub fn from_args(mut args: impl Iterator<Item = String>) -> Result<Config, String> {
    let _program = args.next();
    let port = args.next().ok_or_else(|| "missing port argument".to_owned())?;
    let password = args.next().ok_or_else(|| "missing password argument".to_owned())?;
    if args.next().is_some() {
        return Err("too many arguments".to_owned());
    }

    let port = match port.parse::<u16>() {
        Ok(port) if port != 0 => port,
        _ => return Err(format!("invalid port number {:?}, must be 1-65535", port)),
    };
    if password.is_empty() {
        return Err("password cannot be empty".to_owned());
    }

    Ok(Config {
        bind_to_address: SocketAddr::from(([0, 0, 0, 0], port)),
        state: StateConfig {
            domain: DOMAIN.to_owned(),
            password,
        },
    })
}
