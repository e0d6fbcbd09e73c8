//! Google OAuth 2.0 client (authorization code flow).

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::AuthError;
use crate::config::StorefrontConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Path of the OAuth callback route.
pub const CALLBACK_PATH: &str = "/auth/google/callback";

/// Identity returned by Google's userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for Google's OAuth endpoints.
#[derive(Clone)]
pub struct GoogleClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
}

impl GoogleClient {
    /// Create a new client; the redirect URI is derived from the base URL.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: config.google.client_id.clone(),
            client_secret: config.google.client_secret.clone(),
            redirect_uri: config.absolute_url(CALLBACK_PATH),
        }
    }

    /// URL to send the browser to, carrying the CSRF `state`.
    #[must_use]
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope=openid%20email%20profile&\
            prompt=select_account&\
            state={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange the callback code and fetch the signed-in profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::OAuth` if Google rejects the code or the userinfo request.
    /// Returns `AuthError::Http` if a request cannot be sent.
    pub async fn fetch_profile(&self, code: &str) -> Result<GoogleProfile, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self.client.post(TOKEN_URL).form(&params).send().await?;
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::OAuth(format!("Token exchange failed: {text}")));
        }
        let token: TokenResponse = response.json().await?;

        let response = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AuthError::OAuth(format!(
                "Userinfo request failed: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn test_authorization_url_encodes_parameters() {
        let client = GoogleClient::new(&test_config());
        let url = client.authorization_url("abc 123");

        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("state=abc%20123"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains(&format!(
            "redirect_uri={}",
            urlencoding::encode(&test_config().absolute_url(CALLBACK_PATH))
        )));
    }
}
