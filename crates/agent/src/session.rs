//! User session and login outcome mapping.

use reqwest::StatusCode;
use thiserror::Error;

use crate::client::{ApiClient, LoginResponse};

/// An authenticated session.
///
/// Passed by value between the login step and the tracker; never
/// persisted, so a process restart means logging in again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSession {
    /// Identifier of the authenticated user.
    pub user_id: i64,
}

/// Login failures, each with a distinct user-visible message.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The server rejected the credentials.
    #[error("Erro: Usuário ou senha inválidos. (status {0})")]
    InvalidCredentials(StatusCode),

    /// The server accepted the login but the response carried no user id.
    #[error("Erro: ID de usuário não encontrado.")]
    MissingUserId,

    /// The response body was not the expected JSON.
    #[error("Erro: resposta de login inválida: {0}")]
    MalformedResponse(#[source] reqwest::Error),

    /// The request never produced an HTTP response.
    #[error("Erro de conexão: {0}")]
    Connection(#[source] reqwest::Error),
}

/// Authenticate and build a session.
///
/// Success requires both an HTTP success and a usable (non-negative)
/// `user_id` in the body; a 2xx response without one is still a failure.
pub async fn login(
    client: &ApiClient,
    username: &str,
    password: &str,
) -> Result<UserSession, SessionError> {
    let response = client.login(username, password).await?;
    session_from_response(response)
}

fn session_from_response(response: LoginResponse) -> Result<UserSession, SessionError> {
    if response.user_id < 0 {
        return Err(SessionError::MissingUserId);
    }

    Ok(UserSession {
        user_id: response.user_id,
    })
}
