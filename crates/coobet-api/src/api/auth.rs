//! Login, logout and the cached operator profile.

use tracing::{info, instrument, warn};

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{LoginRequest, LoginResponse, RefreshRequest, UserProfile};
use crate::request::RequestDescriptor;

pub const LOGIN_SUCCESS_MESSAGE: &str = "Connexion réussie!";
pub const LOGOUT_SUCCESS_MESSAGE: &str = "Déconnexion réussie";

impl ApiClient {
    /// Log in and store the new session in both mirrors.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email_or_phone: &str, password: &str) -> Result<UserProfile> {
        let request = RequestDescriptor::post(&self.config.login_path).with_json(&LoginRequest {
            email_or_phone: email_or_phone.to_string(),
            password: password.to_string(),
        })?;

        let login: LoginResponse = self.execute(request).await?.json()?;
        let stored = login.clone();
        self.session
            .run_blocking(move |s| s.store_login(&stored))
            .await?;
        self.refresh.reset();

        info!(user_id = %login.data.id, "Logged in");
        self.notify_success(LOGIN_SUCCESS_MESSAGE);
        self.navigator.redirect(&self.config.home_route);
        Ok(login.data)
    }

    /// Revoke the refresh credential server-side and wipe the local session.
    ///
    /// The local wipe happens whether or not the server call succeeds.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let mut request = RequestDescriptor::post(&self.config.logout_path);
        if let Some(refresh) = self.session.refresh_token() {
            request = request.with_json(&RefreshRequest { refresh })?;
        }

        match self.execute(request).await {
            Ok(_) => {
                info!("Logged out");
                self.notify_success(LOGOUT_SUCCESS_MESSAGE);
                self.end_session().await;
            }
            // The refresh coordinator already wiped the session and redirected.
            Err(e) if e.requires_relogin() => {
                warn!(error = %e, "Logout ended by credential failure");
            }
            Err(e) => {
                warn!(error = %e, "Logout request failed, clearing session locally");
                self.end_session().await;
            }
        }
        Ok(())
    }

    /// Profile cached at login, if a session exists.
    pub fn current_user(&self) -> Option<UserProfile> {
        self.session.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }
}
