//! The signed OpenID assertion a client relays back from Steam, and what
//! Steam says about it.

use std::collections::HashMap;

use crate::IdentityError;

/// OpenID protocol version sent as `openid.ns` on every verification.
pub const OPENID_NS: &str = "http://specs.openid.net/auth/2.0";

/// Literal marker Steam puts in the body of a positive verdict.
const VALID_MARKER: &str = "is_valid:true";

const SIG: &str = "openid.sig";
const SIGNED: &str = "openid.signed";
const CLAIMED_ID: &str = "openid.claimed_id";

/// A relay assertion as received from the client.
///
/// Only `openid.*` keys are kept. `openid.signed` is a comma-separated
/// list of field names (without the `openid.` prefix) that Steam signed;
/// exactly those fields are replayed during verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAssertion {
    fields: HashMap<String, String>,
}

impl IdentityAssertion {
    /// Picks the `openid.*` entries out of a request's variable bag.
    ///
    /// # Errors
    /// [`IdentityError::Validation`] if `openid.sig`, `openid.signed`, or
    /// `openid.claimed_id` is missing.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, IdentityError> {
        let fields: HashMap<String, String> = vars
            .iter()
            .filter(|(k, _)| k.starts_with("openid."))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for required in [SIG, SIGNED, CLAIMED_ID] {
            if !fields.contains_key(required) {
                return Err(IdentityError::Validation(format!(
                    "missing field '{required}'"
                )));
            }
        }

        Ok(Self { fields })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn signature(&self) -> &str {
        self.get(SIG).unwrap_or_default()
    }

    pub fn claimed_id(&self) -> &str {
        self.get(CLAIMED_ID).unwrap_or_default()
    }

    /// Names listed in `openid.signed`, in order.
    pub fn signed_fields(&self) -> impl Iterator<Item = &str> {
        self.get(SIGNED)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// The exact form body for `check_authentication`.
    ///
    /// Order: `openid.ns`, `openid.sig`, each signed field that is present
    /// (in list order), then `openid.mode` last. Unsigned fields are never
    /// forwarded.
    pub fn verification_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("openid.ns".to_string(), OPENID_NS.to_string()),
            (SIG.to_string(), self.signature().to_string()),
        ];

        for name in self.signed_fields() {
            let key = format!("openid.{name}");
            if let Some(value) = self.fields.get(&key) {
                params.push((key, value.clone()));
            }
        }

        params.push((
            "openid.mode".to_string(),
            "check_authentication".to_string(),
        ));
        params
    }
}

/// Steam's verdict on an assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// `true` only if the verdict body carried `is_valid:true`.
    pub valid: bool,
    /// The claimed identifier URL from the assertion.
    pub claimed_id: String,
}

impl VerifiedIdentity {
    /// Reads a `check_authentication` response body.
    ///
    /// Anything without the literal marker is a rejection. Bodies are
    /// key:value lines but are not parsed; a malformed body is simply
    /// "not valid".
    pub fn from_verdict(body: &str, claimed_id: &str) -> Self {
        Self {
            valid: body.contains(VALID_MARKER),
            claimed_id: claimed_id.to_string(),
        }
    }

    /// The 64-bit Steam id: the last path segment of the claimed id,
    /// e.g. `76561198185501646` from
    /// `https://steamcommunity.com/openid/id/76561198185501646`.
    ///
    /// `None` if the segment is empty or not all digits.
    pub fn steam_id(&self) -> Option<&str> {
        self.claimed_id
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
    }
}
