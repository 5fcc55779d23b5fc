//! Account commands.
//!
//! # Usage
//!
//! ```bash
//! sartoria login -e ada@example.com -p secret1
//! sartoria register -f Ada -l Lovelace -e ada@example.com -p secret1 -c secret1
//! sartoria whoami
//! sartoria logout
//! ```

use sartoria_storefront::{AppState, SessionError};

/// Log in and save the session.
///
/// # Errors
///
/// Returns the session error (invalid email, backend rejection, transport).
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(), SessionError> {
    let user = state.session().login(email, password).await?;
    tracing::info!("Logged in as {} <{}>", user.full_name(), user.email);
    Ok(())
}

/// Create an account and save the session.
///
/// # Errors
///
/// Returns the session error (validation failure, backend rejection).
pub async fn register(
    state: &AppState,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), SessionError> {
    let user = state
        .session()
        .register(first_name, last_name, email, password, confirm_password)
        .await?;
    tracing::info!("Account created. Logged in as {} <{}>", user.full_name(), user.email);
    Ok(())
}

/// Delete the saved session. Always succeeds locally.
pub fn logout(state: &AppState) {
    state.session().logout();
    tracing::info!("Logged out");
}

/// Verify the saved token and show who is logged in.
pub async fn whoami(state: &AppState) {
    state.session().initialize().await;

    match state.session().user() {
        Some(user) => {
            tracing::info!("{} <{}> ({})", user.full_name(), user.email, user.role);
        }
        None => tracing::info!("Not logged in"),
    }
}
