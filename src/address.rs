//! Canonical actor addresses and name/path validation.

use std::fmt;

use uuid::Uuid;

/// The prefix every canonical address is anchored under.
pub const SYSTEM_PREFIX: &str = "/system";

/// A forward-slash separated actor address, unique within an
/// [`crate::system::ActorSystem`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorPath(String);

impl ActorPath {
    /// Build a canonical address: empty segments get a generated uuid name,
    /// and any path not already anchored under [`SYSTEM_PREFIX`] is
    /// prefixed with it.
    pub fn create(raw: &str) -> Result<Self, InvalidName> {
        let trimmed = raw.trim_end_matches('/');

        if trimmed.is_empty() {
            let generated = Uuid::new_v4().to_string();
            return Ok(ActorPath(format!("{}/{}", SYSTEM_PREFIX, generated)));
        }

        let stripped = trimmed.trim_start_matches('/');
        for part in stripped.split('/') {
            if part.is_empty() || part == "system" {
                continue;
            }
            validate_name(part)?;
        }

        let full = if trimmed.starts_with(SYSTEM_PREFIX) {
            trimmed.to_string()
        } else {
            format!("{}/{}", SYSTEM_PREFIX, stripped)
        };

        Ok(ActorPath(full))
    }

    /// The address of a child spawned under this one.
    pub fn child(&self, name: &str) -> Result<Self, InvalidName> {
        validate_name(name)?;
        Ok(ActorPath(format!("{}/{}", self.0, name)))
    }

    /// The address of this actor's parent, or the system prefix if this is
    /// already a top-level address.
    pub fn parent(&self) -> ActorPath {
        match self.0.rfind('/') {
            Some(idx) if idx > 0 => ActorPath(self.0[..idx].to_string()),
            _ => ActorPath(SYSTEM_PREFIX.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The system root address, used as the default anchor for relative
    /// selections and as the parent of top-level actors.
    pub fn root() -> Self {
        ActorPath(SYSTEM_PREFIX.to_string())
    }
}

impl fmt::Display for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn validate_name(name: &str) -> Result<(), InvalidName> {
    use regex::Regex;
    use std::sync::OnceLock;

    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    let rgx = NAME_RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());

    if !rgx.is_match(name) {
        Err(InvalidName { name: name.into() })
    } else {
        Ok(())
    }
}

pub struct InvalidName {
    pub name: String,
}

impl std::error::Error for InvalidName {}

impl fmt::Display for InvalidName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\". Invalid name. Must contain only a-Z, 0-9, _, or -",
            self.name
        )
    }
}

impl fmt::Debug for InvalidName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_relative_paths_under_system_prefix() {
        let path = ActorPath::create("alpha").unwrap();
        assert_eq!(path.as_str(), "/system/alpha");
    }

    #[test]
    fn generates_a_uuid_name_for_empty_path() {
        let path = ActorPath::create("").unwrap();
        assert!(path.as_str().starts_with("/system/"));
        assert!(path.as_str().len() > "/system/".len());
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(validate_name("bad name!").is_err());
        assert!(validate_name("good-name_1").is_ok());
    }

    #[test]
    fn child_appends_a_segment() {
        let parent = ActorPath::create("alpha").unwrap();
        let child = parent.child("beta").unwrap();
        assert_eq!(child.as_str(), "/system/alpha/beta");
        assert_eq!(child.parent().as_str(), "/system/alpha");
    }
}
