//! Capability check for the report.
//!
//! Authentication happens in front of this service: a proxy puts the signed-in
//! user's name in a header. This module only decides whether that user may
//! manage the report.
use std::collections::HashSet;

use crate::config::AccessConfig;

/// A caller that passed the capability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    user: String,
}

impl Caller {
    pub fn user(&self) -> &str {
        &self.user
    }
}

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    user_header: String,
    admins: HashSet<String>,
}

impl AccessPolicy {
    pub fn new(config: &AccessConfig) -> Self {
        Self {
            user_header: config.user_header.to_ascii_lowercase(),
            admins: config.admins.iter().map(|a| a.trim().to_string()).collect(),
        }
    }

    /// Name of the request header carrying the authenticated user.
    pub fn user_header(&self) -> &str {
        &self.user_header
    }

    /// `Some(Caller)` if `user` may manage the report.
    pub fn authorize(&self, user: Option<&str>) -> Option<Caller> {
        let user = user.map(str::trim).filter(|u| !u.is_empty())?;
        if self.admins.contains(user) {
            Some(Caller {
                user: user.to_string(),
            })
        } else {
            tracing::warn!(user = %user, "Caller lacks the capability to manage the author report");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(admins: &[&str]) -> AccessPolicy {
        AccessPolicy::new(&AccessConfig {
            user_header: "X-Remote-User".to_string(),
            admins: admins.iter().map(|a| a.to_string()).collect(),
        })
    }

    #[test]
    fn test_header_name_is_lowercased() {
        assert_eq!(policy(&[]).user_header(), "x-remote-user");
    }

    #[test]
    fn test_admin_is_authorized() {
        let caller = policy(&["ana"]).authorize(Some(" ana ")).unwrap();
        assert_eq!(caller.user(), "ana");
    }

    #[test]
    fn test_missing_blank_or_unknown_user_is_rejected() {
        let p = policy(&["ana"]);
        assert!(p.authorize(None).is_none());
        assert!(p.authorize(Some("   ")).is_none());
        assert!(p.authorize(Some("bo")).is_none());
        assert!(p.authorize(Some("Ana")).is_none());
    }

    #[test]
    fn test_empty_admin_list_authorizes_nobody() {
        assert!(policy(&[]).authorize(Some("ana")).is_none());
    }
}
