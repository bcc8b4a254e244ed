use tracing::info;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{AuthTokens, LoginPayload, RegisterPayload};
use crate::request::ApiRequest;
use taskdeck_state::User;

use super::{LOGIN_PATH, LOGOUT_PATH, PROFILE_PATH, USER_PATH};

impl ApiClient {
    /// `POST /user`: create an account.
    ///
    /// Returns `None` when the server acknowledges without a body.
    ///
    /// # Errors
    ///
    /// Propagates transport, status, and decode failures.
    pub async fn register_user(&self, payload: &RegisterPayload) -> ApiResult<Option<User>> {
        let request = ApiRequest::post(USER_PATH).with_json(payload)?;
        let user = self.send(request).await?.json_optional()?;
        info!(username = %payload.username, "account registered");
        Ok(user)
    }

    /// `POST /user/login`: exchange credentials for a token triple.
    ///
    /// The caller persists the returned tokens.
    ///
    /// # Errors
    ///
    /// Propagates transport, status, and decode failures.
    pub async fn login_user(&self, payload: &LoginPayload) -> ApiResult<AuthTokens> {
        let request = ApiRequest::post(LOGIN_PATH).with_json(payload)?;
        self.send(request).await?.json()
    }

    /// `GET /user/me`: profile of the authenticated user.
    ///
    /// # Errors
    ///
    /// Propagates transport, status, and decode failures.
    pub async fn get_user(&self) -> ApiResult<User> {
        self.send(ApiRequest::get(PROFILE_PATH)).await?.json()
    }

    /// `POST /user/logout`: end the server-side session.
    ///
    /// The caller clears local storage afterwards.
    ///
    /// # Errors
    ///
    /// Propagates transport and status failures.
    pub async fn logout_user(&self) -> ApiResult<()> {
        self.send(ApiRequest::post(LOGOUT_PATH)).await?;
        Ok(())
    }
}
