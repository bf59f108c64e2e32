//! User-accounts service client: authentication, profile, settings, and
//! email-suppression management

mod session;
mod token;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Error;
use crate::fetch::Fetch;

pub use session::*;
pub use token::*;

/// Signed-in user's profile as served by the user-accounts service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountMe {
    pub email: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Registration payload; validation happens server-side
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Current email-suppression state for an address
#[derive(Debug, Clone)]
pub struct SubscriptionStatus {
    pub email: String,
    pub suppressed: bool,
}

/// Settings snapshot reduced to the email-notification concern
#[derive(Debug, Clone)]
pub struct EmailPreferences {
    pub email_subscribed: bool,
    pub unsubscribe_token: Option<String>,
    pub settings_payload: Value,
}

/// How suppression-token endpoints resolve and send their token
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenRequestOptions {
    /// Skip attaching the bearer header (the link in the email works for
    /// signed-out recipients)
    pub allow_unauthenticated: bool,
    /// Fall back to the stored auth token when no suppression token is given
    pub use_auth_token_fallback: bool,
}

const MISSING_SUPPRESSION_TOKEN: &str =
    "A suppression token is required to change your email preferences.";

const SETTINGS_PREFERENCES_KEY: &str = "Notification_Email_Preferences";

/// Token-ish keys checked, in order, when digging a suppression token out
/// of a settings payload
const TOKEN_KEYS: [&str; 7] = [
    "unsubscribeToken",
    "token",
    "unsubscribe_token",
    "unsubscribe-token",
    "suppressionToken",
    "suppression_token",
    "suppression-token",
];

/// Client for the user-accounts service
pub struct AccountsClient {
    base_url: String,
    client: Client,
    tokens: TokenStore,
}

impl AccountsClient {
    pub(crate) fn new(base_url: &str, client: Client, tokens: TokenStore) -> Self {
        Self {
            base_url: crate::config::normalize_base_url(base_url),
            client,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Join a `/api/v1/...` path onto the base, tolerating bases that
    /// already carry the prefix
    fn endpoint(&self, path: &str) -> String {
        if self.base_url.ends_with("/api/v1") {
            if let Some(rest) = path.strip_prefix("/api/v1") {
                let rest = if rest.is_empty() { "/" } else { rest };
                return format!("{}{}", self.base_url, rest);
            }
        }
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Option<String> {
        self.tokens.get()
    }

    /// Authenticate and persist the returned bearer token.
    ///
    /// Different service versions have named the token field differently;
    /// all three spellings are accepted. A response without any token is an
    /// authentication error.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), Error> {
        let payload = json!({ "email": email, "password": password });
        let data: Value = Fetch::post(&self.client, &self.endpoint("/api/v1/auth/login"))
            .json(&payload)?
            .execute()
            .await?;

        let token = ["access_token", "accessToken", "token"]
            .iter()
            .find_map(|key| data.get(*key)?.as_str())
            .filter(|token| !token.is_empty());

        match token {
            Some(token) => {
                self.tokens.save(token);
                Ok(())
            }
            None => Err(Error::auth("No access token returned by server.")),
        }
    }

    /// Notify the backend and clear the stored token; the local clear
    /// happens even when the backend call fails
    pub async fn logout(&self) -> Result<(), Error> {
        let result = match self.bearer() {
            Some(token) => {
                Fetch::post(&self.client, &self.endpoint("/api/v1/auth/logout"))
                    .bearer_auth(&token)
                    .execute_empty()
                    .await
            }
            None => Ok(()),
        };
        self.tokens.clear();
        result
    }

    pub async fn fetch_me(&self) -> Result<AccountMe, Error> {
        Fetch::get(&self.client, &self.endpoint("/api/v1/user-accounts"))
            .maybe_bearer_auth(self.bearer().as_deref())
            .execute()
            .await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Value, Error> {
        Fetch::post(&self.client, &self.endpoint("/api/v1/user-accounts"))
            .maybe_bearer_auth(self.bearer().as_deref())
            .json(request)?
            .execute_value()
            .await
    }

    /// Delete the account; the token is cleared no matter what the backend
    /// answered
    pub async fn delete_account(&self) -> Result<(), Error> {
        let result = Fetch::delete(&self.client, &self.endpoint("/api/v1/user-accounts"))
            .maybe_bearer_auth(self.bearer().as_deref())
            .execute_empty()
            .await;
        self.tokens.clear();
        result
    }

    /// Read the settings payload and reduce it to the email-notification
    /// concern. 401/403 here means the session died underneath us.
    pub async fn email_preferences(&self) -> Result<EmailPreferences, Error> {
        let payload = Fetch::get(&self.client, &self.endpoint("/api/v1/user-accounts/settings"))
            .maybe_bearer_auth(self.bearer().as_deref())
            .execute_value()
            .await
            .map_err(forced_logout)?;

        Ok(EmailPreferences {
            email_subscribed: read_email_subscribed(&payload),
            unsubscribe_token: read_unsubscribe_token(&payload),
            settings_payload: payload,
        })
    }

    /// Write the email-notification flag back, seeding from the last known
    /// settings payload so unrelated settings survive the patch.
    ///
    /// The flag is written in all three casings the backend has used over
    /// time; the service ignores the spellings it does not know.
    pub async fn update_email_notification_preference(
        &self,
        enabled: bool,
        base_settings: Option<&Value>,
    ) -> Result<Value, Error> {
        let mut next = match base_settings {
            Some(value) if value.is_object() => value.clone(),
            _ => default_settings_payload(),
        };
        set_email_notifications_flag(&mut next, enabled);

        let data = Fetch::patch(&self.client, &self.endpoint("/api/v1/user-accounts/settings"))
            .maybe_bearer_auth(self.bearer().as_deref())
            .json(&next)?
            .execute_value()
            .await
            .map_err(forced_logout)?;

        Ok(if data.is_object() { data } else { next })
    }

    pub async fn subscription_status(&self, email: &str) -> Result<SubscriptionStatus, Error> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(Error::general(
                "An email address is required to check your subscription status.",
            ));
        }
        let data: Value = Fetch::get(
            &self.client,
            &self.endpoint("/api/v1/user-accounts/subscription-status"),
        )
        .maybe_bearer_auth(self.bearer().as_deref())
        .query("email", normalized)
        .execute()
        .await
        .map_err(forced_logout)?;

        let suppressed = data
            .get("suppressed")
            .and_then(Value::as_bool)
            .or_else(|| data.get("isSuppressed").and_then(Value::as_bool))
            .unwrap_or(false);
        let email = data
            .get("email")
            .and_then(Value::as_str)
            .unwrap_or(normalized)
            .to_string();
        Ok(SubscriptionStatus { email, suppressed })
    }

    /// Stop account emails for the address behind the suppression token.
    ///
    /// The token travels both as a query parameter and as the
    /// `X-Unsubscribe-Token` header. If the request never reaches the
    /// service (mail-client link checkers and strict proxies are common
    /// here), a bare redirect-style GET is fired as a best effort.
    pub async fn unsubscribe(
        &self,
        token: Option<&str>,
        options: TokenRequestOptions,
    ) -> Result<Option<String>, Error> {
        let token = self.resolve_suppression_token(token, options)?;
        let result = self
            .suppression_request("/api/v1/user-accounts/unsubscribe", &token, options, true)
            .await;

        match result {
            Ok(data) => Ok(read_unsubscribe_token(&data)),
            Err(err) if err.is_network() => {
                log::warn!("unsubscribe request failed in transit, retrying as redirect");
                self.redirect_fallback("/api/v1/user-accounts/unsubscribe", &token, false)
                    .await;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Re-enable account emails. A 404 means the address was never (or is
    /// no longer) suppressed, which is the state the caller wanted anyway.
    pub async fn subscribe(
        &self,
        token: Option<&str>,
        options: TokenRequestOptions,
    ) -> Result<Option<String>, Error> {
        let token = self.resolve_suppression_token(token, options)?;
        let result = self
            .suppression_request("/api/v1/user-accounts/subscribe", &token, options, false)
            .await;

        match result {
            Ok(data) => Ok(read_unsubscribe_token(&data)),
            Err(Error::Api { status: 404, .. }) => Ok(None),
            Err(err) if err.is_network() => {
                log::warn!("subscribe request failed in transit, retrying in background");
                self.redirect_fallback("/api/v1/user-accounts/subscribe", &token, true)
                    .await;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn resolve_suppression_token(
        &self,
        token: Option<&str>,
        options: TokenRequestOptions,
    ) -> Result<String, Error> {
        if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
            return Ok(token.to_string());
        }
        if options.use_auth_token_fallback {
            if let Some(token) = self.bearer().map(|t| t.trim().to_string()) {
                if !token.is_empty() {
                    return Ok(token);
                }
            }
        }
        Err(Error::MissingToken(MISSING_SUPPRESSION_TOKEN.to_string()))
    }

    async fn suppression_request(
        &self,
        path: &str,
        token: &str,
        options: TokenRequestOptions,
        one_click: bool,
    ) -> Result<Value, Error> {
        let mut request = Fetch::post(&self.client, &self.endpoint(path))
            .query("token", token)
            .header("X-Unsubscribe-Token", token);
        if one_click {
            request = request.header("List-Unsubscribe-Post", "List-Unsubscribe=One-Click");
        }
        if !options.allow_unauthenticated {
            request = request.maybe_bearer_auth(self.bearer().as_deref());
        }
        request.execute_value().await.map_err(forced_logout)
    }

    /// Fire-and-forget fallback mirroring the email links themselves; the
    /// response (even a redirect) is deliberately ignored
    async fn redirect_fallback(&self, path: &str, token: &str, post: bool) {
        let url = format!("{}?token={}", self.endpoint(path), token);
        let request = if post {
            self.client.post(&url)
        } else {
            self.client.get(&url)
        };
        if let Err(err) = request.send().await {
            log::debug!("suppression fallback request failed: {}", err);
        }
    }
}

/// 401/403 on the settings/subscription surface means the session has been
/// invalidated; callers force a logout off this variant
fn forced_logout(err: Error) -> Error {
    match err {
        Error::Api { status, .. } if status == 401 || status == 403 => Error::Unauthorized,
        other => other,
    }
}

fn default_settings_payload() -> Value {
    json!({
        SETTINGS_PREFERENCES_KEY: {
            "Email_Notifications": true,
        }
    })
}

fn set_email_notifications_flag(payload: &mut Value, enabled: bool) {
    if !payload.is_object() {
        *payload = json!({});
    }
    let map = payload.as_object_mut().unwrap();
    let nested = map
        .entry(SETTINGS_PREFERENCES_KEY.to_string())
        .or_insert_with(|| json!({}));
    if !nested.is_object() {
        *nested = json!({});
    }
    let nested = nested.as_object_mut().unwrap();
    nested.insert("Email_Notifications".to_string(), json!(enabled));
    nested.insert("emailNotifications".to_string(), json!(enabled));
    nested.insert("email_notifications".to_string(), json!(enabled));
}

fn coerce_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Read the subscribed flag from whichever shape this service version
/// serves: a direct flag, an inverted `suppressed` flag, a legacy casing, or
/// the nested preferences block. Defaults to subscribed.
fn read_email_subscribed(payload: &Value) -> bool {
    let mut roots = vec![payload];
    if let Some(settings) = payload.get("settings").filter(|v| v.is_object()) {
        roots.push(settings);
    }

    for root in roots {
        if let Some(direct) = root.get("emailSubscribed").and_then(coerce_boolean) {
            return direct;
        }
        if let Some(suppressed) = root.get("suppressed").and_then(coerce_boolean) {
            return !suppressed;
        }
        for legacy in ["EmailNotifications", "emailNotifications", "email_notifications"] {
            if let Some(value) = root.get(legacy).and_then(coerce_boolean) {
                return value;
            }
        }
        let nested = root
            .get(SETTINGS_PREFERENCES_KEY)
            .or_else(|| root.get("notificationEmailPreferences"));
        if let Some(nested) = nested {
            for key in ["Email_Notifications", "emailNotifications", "email_notifications"] {
                if let Some(value) = nested.get(key).and_then(coerce_boolean) {
                    return value;
                }
            }
        }
    }
    true
}

/// Dig a suppression token out of an arbitrary settings/response payload:
/// known keys first, then any string under a token-ish key, recursing into
/// nested objects and arrays
fn read_unsubscribe_token(data: &Value) -> Option<String> {
    match data {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Object(map) => {
            for key in TOKEN_KEYS {
                if let Some(Value::String(candidate)) = map.get(key) {
                    let trimmed = candidate.trim();
                    if !trimmed.is_empty() {
                        return Some(trimmed.to_string());
                    }
                }
            }
            for (key, value) in map {
                let token_ish = {
                    let lower = key.to_ascii_lowercase();
                    lower.contains("token") || lower.contains("suppression")
                };
                match value {
                    Value::String(candidate) if token_ish => {
                        let trimmed = candidate.trim();
                        if !trimmed.is_empty() {
                            return Some(trimmed.to_string());
                        }
                    }
                    Value::Array(entries) => {
                        for entry in entries {
                            if let Some(nested) = read_unsubscribe_token(entry) {
                                return Some(nested);
                            }
                        }
                    }
                    Value::Object(_) => {
                        if let Some(nested) = read_unsubscribe_token(value) {
                            return Some(nested);
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribed_flag_read_from_each_known_shape() {
        assert!(!read_email_subscribed(&json!({ "emailSubscribed": false })));
        assert!(!read_email_subscribed(&json!({ "suppressed": "true" })));
        assert!(!read_email_subscribed(&json!({ "email_notifications": false })));
        assert!(!read_email_subscribed(
            &json!({ "Notification_Email_Preferences": { "Email_Notifications": false } })
        ));
        assert!(!read_email_subscribed(
            &json!({ "settings": { "emailSubscribed": false } })
        ));
        // Unknown shape defaults to subscribed.
        assert!(read_email_subscribed(&json!({ "theme": "dark" })));
    }

    #[test]
    fn unsubscribe_token_found_in_nested_payloads() {
        assert_eq!(
            read_unsubscribe_token(&json!(" tok-1 ")).as_deref(),
            Some("tok-1")
        );
        assert_eq!(
            read_unsubscribe_token(&json!({ "unsubscribeToken": "tok-2" })).as_deref(),
            Some("tok-2")
        );
        assert_eq!(
            read_unsubscribe_token(&json!({ "mySuppressionKey": "tok-3" })).as_deref(),
            Some("tok-3")
        );
        assert_eq!(
            read_unsubscribe_token(&json!({ "settings": { "links": [{ "token": "tok-4" }] } }))
                .as_deref(),
            Some("tok-4")
        );
        assert!(read_unsubscribe_token(&json!({ "email": "a@b.com" })).is_none());
    }

    #[test]
    fn notification_flag_written_in_every_casing() {
        let mut payload = json!({ "theme": "dark" });
        set_email_notifications_flag(&mut payload, false);
        let nested = payload.get(SETTINGS_PREFERENCES_KEY).unwrap();
        assert_eq!(nested.get("Email_Notifications"), Some(&json!(false)));
        assert_eq!(nested.get("emailNotifications"), Some(&json!(false)));
        assert_eq!(nested.get("email_notifications"), Some(&json!(false)));
        assert_eq!(payload.get("theme"), Some(&json!("dark")));
    }

    #[test]
    fn forced_logout_only_rewrites_auth_statuses() {
        assert!(matches!(
            forced_logout(Error::Api { status: 401, body: String::new() }),
            Error::Unauthorized
        ));
        assert!(matches!(
            forced_logout(Error::Api { status: 403, body: String::new() }),
            Error::Unauthorized
        ));
        assert!(matches!(
            forced_logout(Error::Api { status: 500, body: String::new() }),
            Error::Api { status: 500, .. }
        ));
    }
}
