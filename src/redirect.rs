//! Classification of account-flow redirect URLs.
//!
//! The backend bounces users back to the storefront with the outcome of a
//! verification or unsubscribe flow encoded in URL parameters, either in
//! the query string or behind the hash. These pure functions turn such a
//! URL into dialog events; the caller is expected to strip the parameters
//! afterwards so a reload does not replay the dialog.

use std::collections::HashMap;

use url::Url;

/// Outcome of an email-verification redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub title: String,
    pub message: Option<String>,
    pub email: Option<String>,
}

/// Outcome of an unsubscribe / resubscribe confirmation redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsubscribeOutcome {
    pub success: bool,
    pub title: String,
    pub message: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    Verify(VerifyOutcome),
    Unsubscribe(UnsubscribeOutcome),
}

/// Run both classifiers; a single URL can carry both outcomes
pub fn classify_redirect(url: &Url) -> Vec<DialogEvent> {
    let mut events = Vec::new();
    if let Some(outcome) = classify_verify(url) {
        events.push(DialogEvent::Verify(outcome));
    }
    if let Some(outcome) = classify_unsubscribe(url) {
        events.push(DialogEvent::Unsubscribe(outcome));
    }
    events
}

/// Query parameters merged with parameters carried behind the hash.
///
/// Hash parameters never override query parameters of the same name.
fn combined_params(url: &Url) -> HashMap<String, String> {
    let mut params: HashMap<String, String> = HashMap::new();
    for (key, value) in url.query_pairs() {
        params.entry(key.into_owned()).or_insert(value.into_owned());
    }
    if let Some(fragment) = url.fragment() {
        if let Some((_, hash_query)) = fragment.split_once('?') {
            for (key, value) in url::form_urlencoded::parse(hash_query.as_bytes()) {
                params.entry(key.into_owned()).or_insert(value.into_owned());
            }
        }
    }
    params
}

/// First alias whose value is present and non-blank, trimmed
fn read_param(params: &HashMap<String, String>, aliases: &[&str]) -> Option<String> {
    for alias in aliases {
        if let Some(value) = params.get(*alias) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// Strip a leading `#` and trailing slashes so route suffixes compare
/// cleanly whether they arrive as a path or a hash route
fn normalize_route_segment(input: &str) -> String {
    input
        .strip_prefix('#')
        .unwrap_or(input)
        .trim_end_matches('/')
        .to_string()
}

pub fn classify_verify(url: &Url) -> Option<VerifyOutcome> {
    let params = combined_params(url);
    let verified = params.get("verified").map(String::as_str);
    let resent = params.get("resent").map(String::as_str);
    let error = params.get("error").map(String::as_str);
    let email = read_param(&params, &["email", "email?"]);
    let not_me = read_param(&params, &["not_me", "notMe", "not-me"]);

    if not_me.is_some() {
        let suffix = email
            .as_deref()
            .map(|email| format!(" for {email}"))
            .unwrap_or_default();
        return Some(VerifyOutcome {
            title: "Verification dismissed".to_string(),
            message: Some(format!(
                "Thanks for confirming. We cancelled that verification request{suffix}."
            )),
            email,
        });
    }

    if verified == Some("true") {
        return Some(VerifyOutcome {
            title: "Email verified".to_string(),
            message: None,
            email,
        });
    }

    if verified == Some("false") {
        if let Some(error) = error {
            let message = match error {
                "invalid" => "That verification link is invalid. Request a new one.",
                "not_found" => "We couldn’t find a matching verification request. It may have expired.",
                "expired" => "This verification link has expired. Request a new one.",
                "used" => "This verification link was already used.",
                _ => "Something went wrong on our side. Please try again.",
            };
            return Some(VerifyOutcome {
                title: "Verification failed".to_string(),
                message: Some(message.to_string()),
                email,
            });
        }
    }

    if resent == Some("true") {
        let address = email.clone().unwrap_or_default();
        return Some(VerifyOutcome {
            title: "Verification email resent".to_string(),
            message: Some(format!("We sent a new verification link to {address}.")),
            email,
        });
    }

    if resent == Some("false") && error.is_some() {
        return Some(VerifyOutcome {
            title: "Resend failed".to_string(),
            message: Some("Could not resend the verification email. Please try again.".to_string()),
            email,
        });
    }

    None
}

pub fn classify_unsubscribe(url: &Url) -> Option<UnsubscribeOutcome> {
    let path = normalize_route_segment(url.path());
    let hash_segment = url
        .fragment()
        .map(|fragment| match fragment.split_once('?') {
            Some((route, _)) => normalize_route_segment(route),
            None => normalize_route_segment(fragment),
        })
        .unwrap_or_default();
    let matches_confirmation_route = path.ends_with("/unsubscribe-confirmation")
        || hash_segment.ends_with("/unsubscribe-confirmation");

    let params = combined_params(url);
    let explicit_action = read_param(&params, &["action", "action?", "flow", "flow?"]);
    let subscribe_flag = read_param(&params, &["subscribe", "subscribe?"]);
    let unsubscribe_flag = read_param(&params, &["unsubscribe", "unsubscribe?"]);
    let triggered = matches_confirmation_route
        || explicit_action.is_some()
        || subscribe_flag.is_some()
        || unsubscribe_flag.is_some();
    if !triggered {
        return None;
    }

    let email = read_param(&params, &["email", "email?"]);

    if let Some(error) = read_param(&params, &["error", "error?"]) {
        let message = match error.as_str() {
            "missing_token" => {
                "That confirmation link is missing its token. Please use the most recent email we sent you."
            }
            "expired" => {
                "This confirmation link has expired. Request a new unsubscribe email from your account settings."
            }
            "invalid" => {
                "We could not validate that confirmation link. Double-check that you used the full URL."
            }
            _ => "We could not process that link. Please try again.",
        };
        return Some(UnsubscribeOutcome {
            success: false,
            title: "Unable to update email preferences".to_string(),
            message: message.to_string(),
            email,
        });
    }

    let action = explicit_action
        .or_else(|| subscribe_flag.map(|_| "subscribe".to_string()))
        .or_else(|| unsubscribe_flag.map(|_| "unsubscribe".to_string()))
        .or_else(|| matches_confirmation_route.then(|| "unsubscribe".to_string()))?;

    let re_enabling = matches!(
        action.to_lowercase().as_str(),
        "subscribe" | "resubscribe" | "enable"
    );
    let (title, message) = if re_enabling {
        (
            "Email notifications re-enabled",
            "We will start sending account-related emails to this address again.",
        )
    } else {
        (
            "You are unsubscribed",
            "You will no longer receive account-related emails at this address.",
        )
    };
    Some(UnsubscribeOutcome {
        success: true,
        title: title.to_string(),
        message: message.to_string(),
        email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn expired_verification_link_maps_to_a_friendly_message() {
        let outcome =
            classify_verify(&url("https://shop.test/?verified=false&error=expired&email=a@b.com"))
                .unwrap();
        assert_eq!(outcome.title, "Verification failed");
        assert_eq!(
            outcome.message.as_deref(),
            Some("This verification link has expired. Request a new one.")
        );
        assert_eq!(outcome.email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn unknown_verification_error_falls_back_to_generic_text() {
        let outcome =
            classify_verify(&url("https://shop.test/?verified=false&error=mystery")).unwrap();
        assert_eq!(
            outcome.message.as_deref(),
            Some("Something went wrong on our side. Please try again.")
        );
    }

    #[test]
    fn not_me_takes_precedence_over_verified() {
        let outcome =
            classify_verify(&url("https://shop.test/?verified=true&not_me=1&email=a@b.com"))
                .unwrap();
        assert_eq!(outcome.title, "Verification dismissed");
        assert_eq!(
            outcome.message.as_deref(),
            Some("Thanks for confirming. We cancelled that verification request for a@b.com.")
        );
    }

    #[test]
    fn successful_verification_has_no_message() {
        let outcome = classify_verify(&url("https://shop.test/?verified=true")).unwrap();
        assert_eq!(outcome.title, "Email verified");
        assert!(outcome.message.is_none());
    }

    #[test]
    fn hash_params_do_not_override_query_params() {
        let outcome = classify_verify(&url(
            "https://shop.test/?verified=true#/settings?verified=false&error=expired",
        ))
        .unwrap();
        assert_eq!(outcome.title, "Email verified");
    }

    #[test]
    fn hash_only_params_are_still_read() {
        let outcome =
            classify_verify(&url("https://shop.test/#/settings?resent=true&email=a@b.com"))
                .unwrap();
        assert_eq!(outcome.title, "Verification email resent");
        assert_eq!(
            outcome.message.as_deref(),
            Some("We sent a new verification link to a@b.com.")
        );
    }

    #[test]
    fn confirmation_route_alone_triggers_the_unsubscribe_dialog() {
        let outcome =
            classify_unsubscribe(&url("https://shop.test/unsubscribe-confirmation")).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.title, "You are unsubscribed");
    }

    #[test]
    fn hash_route_with_trailing_slash_matches_too() {
        let outcome =
            classify_unsubscribe(&url("https://shop.test/#/unsubscribe-confirmation/?email=a@b.com"))
                .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn error_param_wins_over_the_action() {
        let outcome = classify_unsubscribe(&url(
            "https://shop.test/?action=unsubscribe&error=missing_token",
        ))
        .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.title, "Unable to update email preferences");
        assert_eq!(
            outcome.message,
            "That confirmation link is missing its token. Please use the most recent email we sent you."
        );
    }

    #[test]
    fn resubscribe_action_gets_the_re_enabled_copy() {
        let outcome =
            classify_unsubscribe(&url("https://shop.test/?action=Resubscribe")).unwrap();
        assert_eq!(outcome.title, "Email notifications re-enabled");
    }

    #[test]
    fn plain_urls_produce_no_events() {
        assert!(classify_redirect(&url("https://shop.test/")).is_empty());
        assert!(classify_redirect(&url("https://shop.test/catalog?page=2")).is_empty());
    }

    #[test]
    fn one_url_can_carry_both_outcomes() {
        let events = classify_redirect(&url(
            "https://shop.test/?verified=true&unsubscribe=1&email=a@b.com",
        ));
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], DialogEvent::Verify(_)));
        assert!(matches!(events[1], DialogEvent::Unsubscribe(_)));
    }
}
