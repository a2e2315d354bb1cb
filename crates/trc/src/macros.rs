/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

#[macro_export]
macro_rules! location {
    () => {{ concat!(file!(), ":", line!(), " (", module_path!(), ")") }};
}

#[macro_export]
macro_rules! bail {
    ($err:expr $(,)?) => {
        return Err($err);
    };
}

/// Sends an already built error event to the collector.
#[macro_export]
macro_rules! error {
    ($err:expr $(,)?) => {{
        let err: $crate::Error = $err;
        if err.inner.effective_level().is_enabled() {
            err.send();
        }
    }};
}
