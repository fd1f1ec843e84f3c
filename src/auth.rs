// CLASSIFICATION: COMMUNITY
// Filename: auth.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-02-10

//! HTTP Basic authentication against the system shadow database.

use std::fs;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::warn;

/// Credential check behind the REST router.
///
/// The production implementation reads `/etc/shadow`; tests substitute a
/// fixed table. A platform-specific PAM hook would slot in here too.
pub trait Authenticator: Send + Sync {
    fn check(&self, user: &str, password: &str) -> bool;
}

/// Verifies credentials against shadow-format crypt hashes.
pub struct ShadowAuth {
    shadow_path: PathBuf,
}

impl ShadowAuth {
    pub fn new() -> Self {
        Self {
            shadow_path: PathBuf::from("/etc/shadow"),
        }
    }

    /// Use an alternate shadow file. Only used in tests.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            shadow_path: path.into(),
        }
    }
}

impl Default for ShadowAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl Authenticator for ShadowAuth {
    fn check(&self, user: &str, password: &str) -> bool {
        let data = match fs::read_to_string(&self.shadow_path) {
            Ok(d) => d,
            Err(e) => {
                warn!("cannot read {}: {}", self.shadow_path.display(), e);
                return false;
            }
        };
        for line in data.lines() {
            let mut fields = line.split(':');
            let (Some(name), Some(hash)) = (fields.next(), fields.next()) else {
                continue;
            };
            if name != user {
                continue;
            }
            // crypt strings look like $id$salt$hash; locked or empty
            // entries never authenticate
            if hash.split('$').count() < 3 {
                continue;
            }
            if pwhash::unix::verify(password, hash) {
                return true;
            }
        }
        warn!("authentication failed for user {user:?}");
        false
    }
}

/// Decode an `Authorization: Basic <base64>` header value into
/// `(user, password)`.
pub fn parse_basic_auth(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?.trim();
    let decoded = BASE64.decode(encoded).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, password) = text.split_once(':')?;
    Some((user.to_owned(), password.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn basic_header_round_trip() {
        let value = format!("Basic {}", BASE64.encode("root:hunter2"));
        let (user, pw) = parse_basic_auth(&value).unwrap();
        assert_eq!(user, "root");
        assert_eq!(pw, "hunter2");
    }

    #[test]
    fn rejects_malformed_headers() {
        assert!(parse_basic_auth("Bearer abc").is_none());
        assert!(parse_basic_auth("Basic !!!not-base64!!!").is_none());
        let no_colon = format!("Basic {}", BASE64.encode("rootonly"));
        assert!(parse_basic_auth(&no_colon).is_none());
    }

    #[test]
    fn shadow_verification() {
        let hash = pwhash::sha512_crypt::hash("s3cret").unwrap();
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "daemon:*:19000:0:99999:7:::").unwrap();
        writeln!(f, "root:{hash}:19000:0:99999:7:::").unwrap();
        f.flush().unwrap();

        let auth = ShadowAuth::with_path(f.path());
        assert!(auth.check("root", "s3cret"));
        assert!(!auth.check("root", "wrong"));
        assert!(!auth.check("daemon", "s3cret"));
        assert!(!auth.check("nobody", "s3cret"));
    }

    #[test]
    fn missing_shadow_file_denies() {
        let auth = ShadowAuth::with_path("/nonexistent/shadow");
        assert!(!auth.check("root", "anything"));
    }
}
