// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operation signers.
//!
//! Two implementations share the [`Signer`] surface:
//! - [`LocalKey`]: an ed25519 key loaded from the tezos-client `secret_keys` file
//! - [`RemoteSigner`]: a Signatory-compatible HTTP signer holding the key

use std::time::Duration;

use async_trait::async_trait;
use blake2::{
    digest::consts::{U20, U32},
    Blake2b, Digest,
};
use reqwest::Client;
use ring::signature::{Ed25519KeyPair, KeyPair};
use serde::Deserialize;
use tracing::debug;

use super::encoding::{b58check_decode, b58check_encode, is_ed25519_address, prefix};
use super::TezosError;

type Blake2b160 = Blake2b<U20>;
type Blake2b256 = Blake2b<U32>;

/// Ed25519 signature length in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Something that can authorize operations for one implicit account.
#[async_trait]
pub trait Signer: Send + Sync {
    /// The account address (`tz1…`).
    fn public_key_hash(&self) -> &str;

    /// The public key (`edpk…`), needed to reveal the account.
    async fn public_key(&self) -> Result<String, TezosError>;

    /// Sign watermarked operation bytes, returning the raw signature.
    async fn sign(&self, watermarked: &[u8]) -> Result<Vec<u8>, TezosError>;
}

/// In-memory ed25519 key.
pub struct LocalKey {
    key_pair: Ed25519KeyPair,
    public_key: String,
    public_key_hash: String,
}

impl std::fmt::Debug for LocalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKey")
            .field("public_key_hash", &self.public_key_hash)
            .finish_non_exhaustive()
    }
}

impl LocalKey {
    /// Build a key from a tezos-client secret key value.
    ///
    /// Accepts `edsk` keys in seed (32-byte) and expanded (64-byte) form, with
    /// or without the `unencrypted:` prefix.
    pub fn from_secret_key(secret_key: &str) -> Result<Self, TezosError> {
        let secret_key = secret_key
            .strip_prefix("unencrypted:")
            .unwrap_or(secret_key)
            .trim();

        if !secret_key.starts_with("edsk") {
            return Err(TezosError::InvalidKey(
                "only unencrypted ed25519 (edsk) keys are supported".to_string(),
            ));
        }

        let seed = match b58check_decode(secret_key, prefix::EDSK_SEED, 32) {
            Ok(seed) => seed,
            Err(_) => {
                let mut full = b58check_decode(secret_key, prefix::EDSK_FULL, 64)
                    .map_err(|e| TezosError::InvalidKey(e.to_string()))?;
                full.truncate(32);
                full
            }
        };

        let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed)
            .map_err(|e| TezosError::InvalidKey(e.to_string()))?;
        let public_key_bytes = key_pair.public_key().as_ref().to_vec();

        Ok(Self {
            public_key: b58check_encode(prefix::EDPK, &public_key_bytes),
            public_key_hash: public_key_hash(&public_key_bytes),
            key_pair,
        })
    }
}

#[async_trait]
impl Signer for LocalKey {
    fn public_key_hash(&self) -> &str {
        &self.public_key_hash
    }

    async fn public_key(&self) -> Result<String, TezosError> {
        Ok(self.public_key.clone())
    }

    async fn sign(&self, watermarked: &[u8]) -> Result<Vec<u8>, TezosError> {
        let digest = Blake2b256::digest(watermarked);
        Ok(self.key_pair.sign(&digest).as_ref().to_vec())
    }
}

/// `tz1` address of a raw ed25519 public key.
pub fn public_key_hash(public_key: &[u8]) -> String {
    let hash = Blake2b160::digest(public_key);
    b58check_encode(prefix::TZ1, &hash)
}

/// Signer backed by a Signatory-compatible HTTP service.
#[derive(Debug, Clone)]
pub struct RemoteSigner {
    alias: String,
    base_url: Option<String>,
    public_key_hash: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct PublicKeyResponse {
    public_key: String,
}

#[derive(Debug, Deserialize)]
struct SignatureResponse {
    signature: String,
}

impl RemoteSigner {
    /// `base_url` is `None` when no remote signer is configured; the signer
    /// can still report its address but every signing attempt fails.
    ///
    /// Only ed25519 (`tz1`) accounts are supported, since the service's
    /// signatures are decoded as `edsig`.
    pub fn new(
        alias: impl Into<String>,
        base_url: Option<String>,
        public_key_hash: String,
    ) -> Result<Self, TezosError> {
        let alias = alias.into();
        if !is_ed25519_address(&public_key_hash) {
            return Err(TezosError::InvalidKey(format!(
                "remote signer `{alias}` needs a tz1 address, got `{public_key_hash}`"
            )));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| TezosError::Signing(format!("failed to build signer HTTP client: {e}")))?;
        Ok(Self {
            alias,
            base_url,
            public_key_hash,
            http,
        })
    }

    fn key_url(&self) -> Result<String, TezosError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| TezosError::SignerNotConfigured(self.alias.clone()))?;
        Ok(format!(
            "{}/keys/{}",
            base.trim_end_matches('/'),
            self.public_key_hash
        ))
    }
}

#[async_trait]
impl Signer for RemoteSigner {
    fn public_key_hash(&self) -> &str {
        &self.public_key_hash
    }

    async fn public_key(&self) -> Result<String, TezosError> {
        let url = self.key_url()?;
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| TezosError::Signing(format!("GET {url} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TezosError::Signing(format!(
                "GET {url} returned {status}: {body}"
            )));
        }

        let body: PublicKeyResponse = response
            .json()
            .await
            .map_err(|e| TezosError::Signing(format!("GET {url} invalid JSON: {e}")))?;
        Ok(body.public_key)
    }

    async fn sign(&self, watermarked: &[u8]) -> Result<Vec<u8>, TezosError> {
        let url = self.key_url()?;
        debug!(signer = %self.alias, "Requesting remote signature");

        let response = self
            .http
            .post(&url)
            .json(&hex::encode(watermarked))
            .send()
            .await
            .map_err(|e| TezosError::Signing(format!("POST {url} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TezosError::Signing(format!(
                "POST {url} returned {status}: {body}"
            )));
        }

        let body: SignatureResponse = response
            .json()
            .await
            .map_err(|e| TezosError::Signing(format!("POST {url} invalid JSON: {e}")))?;
        b58check_decode(&body.signature, prefix::EDSIG, SIGNATURE_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE_SK: &str = "edsk3QoqBuvdamxouPhin7swCvkQNgq4jP5KZPbwWNnwdZpSpJiEbq";
    const ALICE_PK: &str = "edpkvGfYw3LyB1UcCahKQk4rF2tvbMUk8GFiTuMjL75uGXrpvKXhjn";
    const ALICE_PKH: &str = "tz1VSUr8wwNhLAzempoch5d6hLRiTh8Cjcjb";

    #[tokio::test]
    async fn local_key_derives_public_key_and_address() {
        let key = LocalKey::from_secret_key(&format!("unencrypted:{ALICE_SK}")).unwrap();
        assert_eq!(key.public_key_hash(), ALICE_PKH);
        assert_eq!(key.public_key().await.unwrap(), ALICE_PK);
    }

    #[tokio::test]
    async fn local_signature_verifies_against_public_key() {
        let key = LocalKey::from_secret_key(ALICE_SK).unwrap();
        let message = [0x03, 0xde, 0xad, 0xbe, 0xef];
        let signature = key.sign(&message).await.unwrap();
        assert_eq!(signature.len(), SIGNATURE_LEN);

        let public_key = b58check_decode(ALICE_PK, prefix::EDPK, 32).unwrap();
        let digest = Blake2b256::digest(message);
        ring::signature::UnparsedPublicKey::new(&ring::signature::ED25519, public_key)
            .verify(&digest, &signature)
            .unwrap();
    }

    #[test]
    fn rejects_unsupported_keys() {
        assert!(matches!(
            LocalKey::from_secret_key("encrypted:edesk1abc"),
            Err(TezosError::InvalidKey(_))
        ));
        assert!(matches!(
            LocalKey::from_secret_key("spsk1abc"),
            Err(TezosError::InvalidKey(_))
        ));
        assert!(LocalKey::from_secret_key("edsk-garbage").is_err());
    }

    #[tokio::test]
    async fn unconfigured_remote_signer_fails_to_sign() {
        let signer = RemoteSigner::new("operator", None, ALICE_PKH.to_string()).unwrap();
        assert_eq!(signer.public_key_hash(), ALICE_PKH);
        assert!(matches!(
            signer.sign(&[3]).await,
            Err(TezosError::SignerNotConfigured(alias)) if alias == "operator"
        ));
    }

    #[tokio::test]
    async fn remote_signer_posts_hex_payload() {
        let mut server = mockito::Server::new_async().await;
        let signature = b58check_encode(prefix::EDSIG, &[9u8; SIGNATURE_LEN]);
        let mock = server
            .mock("POST", format!("/keys/{ALICE_PKH}").as_str())
            .match_body(mockito::Matcher::Json(serde_json::json!("03abcd")))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!({ "signature": signature }).to_string())
            .create_async()
            .await;

        let signer = RemoteSigner::new("operator", Some(server.url()), ALICE_PKH.to_string()).unwrap();
        let raw = signer.sign(&[0x03, 0xab, 0xcd]).await.unwrap();
        assert_eq!(raw, vec![9u8; SIGNATURE_LEN]);
        mock.assert_async().await;
    }

    #[test]
    fn remote_signer_accepts_only_tz1_accounts() {
        let tz2 = b58check_encode(prefix::TZ2, &[2u8; 20]);
        let tz3 = b58check_encode(prefix::TZ3, &[3u8; 20]);
        for address in [tz2, tz3, "tz1nope".to_string()] {
            assert!(matches!(
                RemoteSigner::new("operator", None, address),
                Err(TezosError::InvalidKey(_))
            ));
        }
    }
}
