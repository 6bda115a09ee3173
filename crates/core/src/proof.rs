//! Stateless signed-proof verification.
//!
//! A proof is a short text token `<namespace>:<action>:<unixMillis>` signed
//! with the caller's Ed25519 key in the attached NaCl `sign` layout: the
//! 64-byte signature followed by the signed message. The server never stores
//! proofs; a proof is accepted iff
//!
//! 1. the signature opens under the claimed public key,
//! 2. `namespace:action` equals the action expected by the route, and
//! 3. `0 <= now - timestamp <= freshness_window_ms`.
//!
//! Used proofs are not tracked, so a proof can be replayed inside its
//! freshness window.

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

use crate::types::UnixMillis;

/// Byte length of an Ed25519 signature prefix.
pub const SIGNATURE_LENGTH: usize = 64;

/// Byte length of an Ed25519 public signing key.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Namespace clients prefix every proof with.
pub const DEFAULT_NAMESPACE: &str = "msgApp";

/// Default maximum proof age: one minute.
pub const DEFAULT_FRESHNESS_WINDOW_MS: i64 = 60_000;

// ---------------------------------------------------------------------------
// Rejection reasons
// ---------------------------------------------------------------------------

/// Why a proof was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofRejection {
    /// Blob truncated, key malformed, or signature does not verify.
    BadSignature,
    /// Opened payload is not `<namespace>:<action>:<digits>` UTF-8 text.
    MalformedToken,
    /// The token authorizes a different action.
    ActionMismatch,
    /// The token is older than the freshness window.
    Expired,
    /// The token timestamp lies after the verification time.
    FromFuture,
}

impl ProofRejection {
    /// Stable machine-readable code, used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadSignature => "bad_signature",
            Self::MalformedToken => "malformed_token",
            Self::ActionMismatch => "action_mismatch",
            Self::Expired => "expired",
            Self::FromFuture => "from_future",
        }
    }
}

impl fmt::Display for ProofRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::error::Error for ProofRejection {}

// ---------------------------------------------------------------------------
// ProofToken
// ---------------------------------------------------------------------------

/// The parsed form of an opened proof payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofToken {
    pub namespace: String,
    pub action: String,
    pub issued_at: UnixMillis,
}

impl ProofToken {
    pub fn new(
        namespace: impl Into<String>,
        action: impl Into<String>,
        issued_at: UnixMillis,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            action: action.into(),
            issued_at,
        }
    }

    /// Parse `<namespace>:<action>:<unixMillis>`.
    ///
    /// Exactly three fields are required and the timestamp must be a
    /// non-empty run of ASCII digits.
    pub fn parse(text: &str) -> Result<Self, ProofRejection> {
        let mut fields = text.split(':');
        let (Some(namespace), Some(action), Some(timestamp), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(ProofRejection::MalformedToken);
        };

        if namespace.is_empty() || action.is_empty() {
            return Err(ProofRejection::MalformedToken);
        }
        if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProofRejection::MalformedToken);
        }
        let issued_at = timestamp
            .parse::<UnixMillis>()
            .map_err(|_| ProofRejection::MalformedToken)?;

        Ok(Self::new(namespace, action, issued_at))
    }

    /// `namespace:action`, the form routes compare against.
    pub fn qualified_action(&self) -> String {
        format!("{}:{}", self.namespace, self.action)
    }

    /// Wire form of the token (the text a client signs).
    pub fn encode(&self) -> String {
        format!("{}:{}:{}", self.namespace, self.action, self.issued_at)
    }
}

// ---------------------------------------------------------------------------
// Signature opening
// ---------------------------------------------------------------------------

/// Open an attached signature, returning the signed message.
///
/// Fails closed: a short blob, a key that is not a valid Ed25519 point, or a
/// signature that does not verify all yield [`ProofRejection::BadSignature`].
pub fn open_signed<'a>(signed: &'a [u8], public_key: &[u8]) -> Result<&'a [u8], ProofRejection> {
    let key_bytes: &[u8; PUBLIC_KEY_LENGTH] = public_key
        .try_into()
        .map_err(|_| ProofRejection::BadSignature)?;
    let key = VerifyingKey::from_bytes(key_bytes).map_err(|_| ProofRejection::BadSignature)?;

    if signed.len() < SIGNATURE_LENGTH {
        return Err(ProofRejection::BadSignature);
    }
    let (sig_bytes, message) = signed.split_at(SIGNATURE_LENGTH);
    let sig_bytes: &[u8; SIGNATURE_LENGTH] = sig_bytes
        .try_into()
        .map_err(|_| ProofRejection::BadSignature)?;
    let signature = Signature::from_bytes(sig_bytes);

    key.verify_strict(message, &signature)
        .map_err(|_| ProofRejection::BadSignature)?;

    Ok(message)
}

/// Produce an attached signature (`signature || message`).
///
/// This is the client side of [`open_signed`]; the server uses it only in
/// tests and tooling.
pub fn sign_attached(key: &SigningKey, message: &[u8]) -> Vec<u8> {
    let signature = key.sign(message);
    let mut out = Vec::with_capacity(SIGNATURE_LENGTH + message.len());
    out.extend_from_slice(&signature.to_bytes());
    out.extend_from_slice(message);
    out
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// The identity established by an accepted proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSigner {
    pub public_signing_key: [u8; PUBLIC_KEY_LENGTH],
    pub token: ProofToken,
}

impl VerifiedSigner {
    /// Lowercase hex form of the signer key, as stored in `users`.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_signing_key)
    }
}

/// Verify a signed proof.
///
/// `expected_action` is the qualified `namespace:action` string. `now` is the
/// verification time in Unix milliseconds; the function is otherwise pure.
pub fn verify(
    signed: &[u8],
    public_key: &[u8],
    expected_action: &str,
    freshness_window_ms: i64,
    now: UnixMillis,
) -> Result<VerifiedSigner, ProofRejection> {
    let message = open_signed(signed, public_key)?;
    let text = std::str::from_utf8(message).map_err(|_| ProofRejection::MalformedToken)?;
    let token = ProofToken::parse(text)?;

    if token.qualified_action() != expected_action {
        return Err(ProofRejection::ActionMismatch);
    }

    let age = now
        .checked_sub(token.issued_at)
        .ok_or(ProofRejection::MalformedToken)?;
    if age < 0 {
        return Err(ProofRejection::FromFuture);
    }
    if age > freshness_window_ms {
        return Err(ProofRejection::Expired);
    }

    let mut public_signing_key = [0u8; PUBLIC_KEY_LENGTH];
    public_signing_key.copy_from_slice(public_key);

    Ok(VerifiedSigner {
        public_signing_key,
        token,
    })
}

/// Configured verifier shared by every proof-gated route.
#[derive(Debug, Clone)]
pub struct ProofVerifier {
    namespace: String,
    freshness_window_ms: i64,
}

impl ProofVerifier {
    pub fn new(namespace: impl Into<String>, freshness_window_ms: i64) -> Self {
        Self {
            namespace: namespace.into(),
            freshness_window_ms,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn freshness_window_ms(&self) -> i64 {
        self.freshness_window_ms
    }

    /// Qualify a bare action name with this verifier's namespace.
    pub fn expected_action(&self, action: &str) -> String {
        format!("{}:{}", self.namespace, action)
    }

    /// Verify `signed` for the bare `action` at time `now`.
    pub fn verify_at(
        &self,
        signed: &[u8],
        public_key: &[u8],
        action: &str,
        now: UnixMillis,
    ) -> Result<VerifiedSigner, ProofRejection> {
        verify(
            signed,
            public_key,
            &self.expected_action(action),
            self.freshness_window_ms,
            now,
        )
    }

    /// Verify against the current wall clock.
    pub fn verify_now(
        &self,
        signed: &[u8],
        public_key: &[u8],
        action: &str,
    ) -> Result<VerifiedSigner, ProofRejection> {
        self.verify_at(signed, public_key, action, chrono::Utc::now().timestamp_millis())
    }
}

impl Default for ProofVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE, DEFAULT_FRESHNESS_WINDOW_MS)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const NOW: UnixMillis = 1_700_000_000_000;
    const WINDOW: i64 = 60_000;

    fn signing_key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    fn proof(key: &SigningKey, token: &str) -> Vec<u8> {
        sign_attached(key, token.as_bytes())
    }

    fn public(key: &SigningKey) -> [u8; 32] {
        key.verifying_key().to_bytes()
    }

    #[test]
    fn accepts_fresh_matching_proof() {
        let key = signing_key(1);
        let blob = proof(&key, &format!("msgApp:updateStatus:{}", NOW - 10));

        let signer = verify(&blob, &public(&key), "msgApp:updateStatus", WINDOW, NOW)
            .expect("proof should verify");

        assert_eq!(signer.public_signing_key, public(&key));
        assert_eq!(signer.token.action, "updateStatus");
        assert_eq!(signer.token.issued_at, NOW - 10);
        assert_eq!(signer.public_key_hex().len(), 64);
    }

    #[test]
    fn timestamp_exactly_at_window_edge_is_accepted() {
        let key = signing_key(2);
        let blob = proof(&key, &format!("msgApp:syncSettings:{}", NOW - WINDOW));

        assert!(verify(&blob, &public(&key), "msgApp:syncSettings", WINDOW, NOW).is_ok());
    }

    #[test]
    fn one_millisecond_beyond_window_is_rejected() {
        let key = signing_key(2);
        let blob = proof(&key, &format!("msgApp:syncSettings:{}", NOW - WINDOW - 1));

        assert_matches!(
            verify(&blob, &public(&key), "msgApp:syncSettings", WINDOW, NOW),
            Err(ProofRejection::Expired)
        );
    }

    #[test]
    fn timestamp_issued_now_is_accepted() {
        let key = signing_key(3);
        let blob = proof(&key, &format!("msgApp:sendMessage:{NOW}"));

        assert!(verify(&blob, &public(&key), "msgApp:sendMessage", WINDOW, NOW).is_ok());
    }

    #[test]
    fn future_timestamp_is_rejected() {
        let key = signing_key(3);
        let blob = proof(&key, &format!("msgApp:sendMessage:{}", NOW + 1));

        assert_matches!(
            verify(&blob, &public(&key), "msgApp:sendMessage", WINDOW, NOW),
            Err(ProofRejection::FromFuture)
        );
    }

    #[test]
    fn proof_for_other_action_is_rejected_despite_valid_signature() {
        let key = signing_key(4);
        let blob = proof(&key, &format!("msgApp:updateStatus:{NOW}"));

        assert_matches!(
            verify(&blob, &public(&key), "msgApp:updateDisplayName", WINDOW, NOW),
            Err(ProofRejection::ActionMismatch)
        );
    }

    #[test]
    fn other_namespace_is_rejected() {
        let key = signing_key(4);
        let blob = proof(&key, &format!("otherApp:updateStatus:{NOW}"));

        assert_matches!(
            verify(&blob, &public(&key), "msgApp:updateStatus", WINDOW, NOW),
            Err(ProofRejection::ActionMismatch)
        );
    }

    #[test]
    fn wrong_key_is_rejected() {
        let signer = signing_key(5);
        let other = signing_key(6);
        let blob = proof(&signer, &format!("msgApp:updateStatus:{NOW}"));

        assert_matches!(
            verify(&blob, &public(&other), "msgApp:updateStatus", WINDOW, NOW),
            Err(ProofRejection::BadSignature)
        );
    }

    #[test]
    fn corrupted_or_truncated_blob_is_rejected() {
        let key = signing_key(7);
        let mut blob = proof(&key, &format!("msgApp:updateStatus:{NOW}"));

        let truncated = &blob[..SIGNATURE_LENGTH - 1];
        assert_matches!(
            verify(truncated, &public(&key), "msgApp:updateStatus", WINDOW, NOW),
            Err(ProofRejection::BadSignature)
        );

        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        assert_matches!(
            verify(&blob, &public(&key), "msgApp:updateStatus", WINDOW, NOW),
            Err(ProofRejection::BadSignature)
        );
    }

    #[test]
    fn short_public_key_is_rejected() {
        let key = signing_key(8);
        let blob = proof(&key, &format!("msgApp:updateStatus:{NOW}"));

        assert_matches!(
            verify(&blob, &public(&key)[..31], "msgApp:updateStatus", WINDOW, NOW),
            Err(ProofRejection::BadSignature)
        );
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let key = signing_key(9);
        for token in [
            "msgApp:updateStatus",
            "msgApp:updateStatus:123:extra",
            "msgApp:updateStatus:",
            "msgApp:updateStatus:-5",
            "msgApp:updateStatus:+5",
            "msgApp:updateStatus:12ab",
            "::123",
        ] {
            let blob = proof(&key, token);
            assert_matches!(
                verify(&blob, &public(&key), "msgApp:updateStatus", WINDOW, NOW),
                Err(ProofRejection::MalformedToken),
                "token {token:?} should be malformed"
            );
        }
    }

    #[test]
    fn non_utf8_payload_is_rejected() {
        let key = signing_key(10);
        let blob = sign_attached(&key, &[0xff, 0xfe, b':']);

        assert_matches!(
            verify(&blob, &public(&key), "msgApp:updateStatus", WINDOW, NOW),
            Err(ProofRejection::MalformedToken)
        );
    }

    #[test]
    fn token_encode_and_parse_agree() {
        let token = ProofToken::new("msgApp", "retrieveSettings", 42);
        assert_eq!(token.encode(), "msgApp:retrieveSettings:42");
        assert_eq!(ProofToken::parse(&token.encode()), Ok(token));
    }

    #[test]
    fn configured_verifier_qualifies_actions() {
        let verifier = ProofVerifier::new("msgApp", WINDOW);
        let key = signing_key(11);

        assert_eq!(verifier.namespace(), "msgApp");
        assert_eq!(verifier.freshness_window_ms(), WINDOW);
        let blob = proof(&key, &format!("msgApp:deleteMessage:{NOW}"));

        assert_eq!(verifier.expected_action("deleteMessage"), "msgApp:deleteMessage");
        assert!(verifier.verify_at(&blob, &public(&key), "deleteMessage", NOW).is_ok());
        assert_matches!(
            verifier.verify_at(&blob, &public(&key), "editMessage", NOW),
            Err(ProofRejection::ActionMismatch)
        );
    }

    #[test]
    fn open_signed_returns_message() {
        let key = signing_key(12);
        let blob = sign_attached(&key, b"Hello there");

        assert_eq!(open_signed(&blob, &public(&key)), Ok(&b"Hello there"[..]));
    }
}
