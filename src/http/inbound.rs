//! Inbound service hooks.
//!
//! The hosting platform delivers mail, instant messages and warm-up signals
//! as ordinary requests under `/_ah/`. They reach the main dispatcher only
//! when the application declares the matching service.

use std::collections::HashSet;

/// Service name for a hook path, if the path is one.
pub fn hook_service(path: &str) -> Option<&'static str> {
    if path.starts_with("/_ah/mail/") {
        Some("mail")
    } else if path.starts_with("/_ah/xmpp/") {
        Some("xmpp_message")
    } else if path == "/_ah/warmup" {
        Some("warmup")
    } else {
        None
    }
}

/// Declared inbound services.
#[derive(Debug, Clone, Default)]
pub struct InboundServices {
    declared: HashSet<String>,
}

impl InboundServices {
    pub fn new<I, S>(services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            declared: services.into_iter().map(Into::into).collect(),
        }
    }

    /// False only for hook paths whose service was not declared.
    pub fn admits(&self, path: &str) -> bool {
        match hook_service(path) {
            Some(service) => self.declared.contains(service),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_paths() {
        assert_eq!(hook_service("/_ah/mail/review@example.com"), Some("mail"));
        assert_eq!(hook_service("/_ah/xmpp/message/chat/"), Some("xmpp_message"));
        assert_eq!(hook_service("/_ah/warmup"), Some("warmup"));
        assert_eq!(hook_service("/_ah/start"), None);
        assert_eq!(hook_service("/mail"), None);
    }

    #[test]
    fn test_only_declared_hooks_are_admitted() {
        let inbound = InboundServices::new(["mail", "warmup"]);
        assert!(inbound.admits("/_ah/mail/x@example.com"));
        assert!(inbound.admits("/_ah/warmup"));
        assert!(!inbound.admits("/_ah/xmpp/message/chat/"));
        assert!(inbound.admits("/1234/show"));
    }
}
