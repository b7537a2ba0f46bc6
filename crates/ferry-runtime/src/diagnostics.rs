#![forbid(unsafe_code)]

//! Diagnostic output policy.
//!
//! UI-loop diagnostics (everything logged under the `ferry_ui` target) are
//! suppressed by default so routine toolkit chatter does not reach the
//! user. Setting [`SHOW_UI_MESSAGES_ENV`] to a truthy value lifts the
//! suppression. This affects observability only, never control flow.

use std::env;

use tracing_subscriber::EnvFilter;

/// Environment toggle that lifts the default UI-diagnostics suppression.
pub const SHOW_UI_MESSAGES_ENV: &str = "FERRY_SHOW_UI_MESSAGES";

/// Tracing target used for suppressible UI-loop diagnostics.
pub const UI_DIAGNOSTICS_TARGET: &str = "ferry_ui";

/// Whether the environment asks for UI diagnostics to be shown.
#[must_use]
pub fn show_ui_messages() -> bool {
    env::var(SHOW_UI_MESSAGES_ENV)
        .map(|value| is_truthy(&value))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Install the global subscriber implementing the suppression policy.
///
/// Safe to call more than once; an already-installed subscriber wins and
/// the policy is simply not reapplied.
pub fn install() {
    let directives = if show_ui_messages() {
        "info,ferry_ui=debug"
    } else {
        "info,ferry_ui=off"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .try_init();
}
