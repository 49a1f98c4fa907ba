//! HMAC-SHA256 signing for session tokens and session store keys.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: char = '.';

/// Signs values with a server secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        HmacSha256::new_from_slice(&self.secret).unwrap_or_else(|_| unreachable!())
    }

    /// Hex HMAC of `value`.
    pub fn digest(&self, value: &str) -> String {
        let mut mac = self.mac();
        mac.update(value.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Client token for a session id: `<id>.<hex mac>`.
    pub fn sign(&self, id: &str) -> String {
        format!("{}{}{}", id, SEPARATOR, self.digest(id))
    }

    /// Session id carried by a signed token, or `None` if the MAC does not verify.
    pub fn verify<'a>(&self, token: &'a str) -> Option<&'a str> {
        let (id, sig) = token.rsplit_once(SEPARATOR)?;
        if id.is_empty() {
            return None;
        }
        let sig = hex::decode(sig).ok()?;
        let mut mac = self.mac();
        mac.update(id.as_bytes());
        mac.verify_slice(&sig).ok()?;
        Some(id)
    }
}
