//! Session configuration for headless runs.
//!
//! The binary has no sign-in screen: the user it syncs for is taken from
//! `CAPNOTE_USER_ID` (and optionally `CAPNOTE_USER_EMAIL`) in the `.env` file.

use crate::errors::{Error, Result};
use crate::session::Session;
use std::env::VarError;

/// Builds the session from `CAPNOTE_USER_ID` and `CAPNOTE_USER_EMAIL`.
///
/// # Errors
/// Returns [`Error::NotAuthenticated`] when no user id is configured.
pub fn session_from_env() -> Result<Session> {
    let user_id = match std::env::var("CAPNOTE_USER_ID") {
        Ok(id) if !id.trim().is_empty() => id.trim().to_string(),
        Ok(_) | Err(VarError::NotPresent) => return Err(Error::NotAuthenticated),
        Err(e) => return Err(e.into()),
    };

    let session = Session::new(user_id);
    Ok(match std::env::var("CAPNOTE_USER_EMAIL") {
        Ok(email) if !email.trim().is_empty() => session.with_email(email.trim()),
        _ => session,
    })
}
