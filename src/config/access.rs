//! Repository allow-list.

use super::AccessControlConfig;

/// Owners and repositories a server may render banners for.
///
/// An entry without a slash allows every repository of that owner; an
/// `owner/repo` entry allows exactly that repository. Matching ignores
/// ASCII case. An empty list allows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessList {
    entries: Vec<String>,
}

impl AccessList {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// Orgs and users from the config, or an empty list when disabled.
    pub fn from_config(config: &AccessControlConfig) -> Self {
        if !config.enabled {
            return Self::default();
        }
        let entries = config
            .allowed_orgs
            .iter()
            .chain(&config.allowed_users)
            .cloned()
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_allowed(&self, owner: &str, repo: &str) -> bool {
        if self.entries.is_empty() {
            return true;
        }

        let full = format!("{owner}/{repo}");
        self.entries.iter().any(|allowed| {
            allowed.eq_ignore_ascii_case(&full)
                || (!allowed.contains('/') && allowed.eq_ignore_ascii_case(owner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[&str]) -> AccessList {
        AccessList::new(entries.iter().map(|e| e.to_string()).collect())
    }

    #[test]
    fn test_empty_allows_all() {
        assert!(AccessList::default().is_allowed("anyone", "anything"));
    }

    #[test]
    fn test_owner_entry() {
        let acl = list(&["NumTide"]);
        assert!(acl.is_allowed("numtide", "treefmt"));
        assert!(!acl.is_allowed("other", "numtide"));
    }

    #[test]
    fn test_repo_entry() {
        let acl = list(&["numtide/treefmt"]);
        assert!(acl.is_allowed("NUMTIDE", "TreeFmt"));
        assert!(!acl.is_allowed("numtide", "devshell"));
        // a repo entry does not grant its owner
        assert!(!acl.is_allowed("numtide/treefmt", ""));
    }

    #[test]
    fn test_from_config() {
        let mut config = AccessControlConfig {
            enabled: false,
            allowed_orgs: vec!["org".into()],
            allowed_users: vec!["user/repo".into()],
        };
        assert!(AccessList::from_config(&config).is_empty());

        config.enabled = true;
        let acl = AccessList::from_config(&config);
        assert_eq!(acl.entries(), ["org", "user/repo"]);
        assert!(acl.is_allowed("org", "x"));
        assert!(acl.is_allowed("user", "repo"));
        assert!(!acl.is_allowed("user", "other"));
    }
}
