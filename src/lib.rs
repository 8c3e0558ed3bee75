//! vireo, a small IRC chat relay server.
//!
//! # Usage
//!
//! The server takes the TCP port to listen on and the connection password as its two
//! command-line arguments:
//!
//! ```console
//! vireo 6667 some-password
//! ```
//!
//! Clients must issue a `PASS` command with that password, and register with `NICK` and
//! `USER`, before they can join channels and talk.

#![forbid(unsafe_code)]
#![warn(clippy::all, rust_2018_idioms)]

pub use crate::state::State;
use std::{env, process};

pub mod config;
mod channel;
mod client;
mod lines;
mod net;
mod state;
mod util;

/// The beginning of everything
pub fn start() {
    let cfg = config::from_args(env::args()).unwrap_or_else(|err| {
        eprintln!("Error: {}", err);
        eprintln!(
            "Usage: {} <port> <password>",
            env::args().next().unwrap_or_else(|| "vireo".to_owned())
        );
        process::exit(1);
    });

    if cfg!(debug_assertions) {
        env::set_var("RUST_BACKTRACE", "1");
    }

    let log_settings = env_logger::Env::new()
        .filter_or("VIREO_LOG", "vireo=debug")
        .write_style("VIREO_LOG_STYLE");
    env_logger::Builder::from_env(log_settings)
        .format(|buf, r| {
            use std::io::Write;
            writeln!(buf, "[{:<5} {}] {}", r.level(), r.target(), r.args())
        })
        .init();

    let runtime = runtime();
    let shared = State::new(cfg.state);

    runtime.block_on(net::listen(cfg.bind_to_address, shared));
}

/// Creates the tokio runtime.
///
/// The whole server runs on a single thread; the runtime is only used for its reactor and
/// the readiness wait.
fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
        .unwrap_or_else(|err| {
            eprintln!("Failed to start the tokio runtime: {}", err);
            process::exit(1);
        })
}
