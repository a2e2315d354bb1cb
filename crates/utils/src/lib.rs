/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod config;

use compact_str::ToCompactString;

/// Startup helpers that abort the process instead of propagating.
pub trait UnwrapFailure<T> {
    fn failed(self, action: &str) -> T;
}

impl<T> UnwrapFailure<T> for Option<T> {
    fn failed(self, action: &str) -> T {
        self.unwrap_or_else(|| failed(action))
    }
}

impl<T, E: std::fmt::Display> UnwrapFailure<T> for Result<T, E> {
    fn failed(self, action: &str) -> T {
        self.unwrap_or_else(|err| abort(action, Some(err.to_compact_string())))
    }
}

pub fn failed(message: &str) -> ! {
    abort(message, None)
}

fn abort(message: &str, reason: Option<compact_str::CompactString>) -> ! {
    trc::event!(
        Server(trc::ServerEvent::StartupError),
        Details = message.to_compact_string(),
        Reason = reason.clone().unwrap_or_default(),
    );

    let message = match reason {
        Some(reason) => format!("{message}: {reason}"),
        None => message.to_string(),
    };

    if cfg!(feature = "test_mode") {
        panic!("{message}");
    }

    eprintln!("{message}");
    std::process::exit(1);
}

/// Resolves once SIGTERM or SIGINT (Ctrl-C outside Unix) is received and
/// returns the name of the signal.
pub async fn wait_for_shutdown() -> &'static str {
    #[cfg(unix)]
    let signal = {
        use tokio::signal::unix::{SignalKind, signal};

        let mut h_term = signal(SignalKind::terminate()).failed("Failed to install SIGTERM handler");
        let mut h_int = signal(SignalKind::interrupt()).failed("Failed to install SIGINT handler");

        tokio::select! {
            _ = h_term.recv() => "SIGTERM",
            _ = h_int.recv() => "SIGINT",
        }
    };

    #[cfg(not(unix))]
    let signal = match tokio::signal::ctrl_c().await {
        Ok(()) => "SIGINT",
        Err(err) => {
            trc::event!(
                Server(trc::ServerEvent::ThreadError),
                Details = "Unable to listen for shutdown signal",
                Reason = err.to_string(),
            );
            "error"
        }
    };

    trc::event!(Server(trc::ServerEvent::Shutdown), CausedBy = signal);

    signal
}
