// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Byte-level encodings used by the X4C contracts.
//!
//! ## Michelson bytes
//!
//! Off-chain identities (KYC registrant names, the literal `"self"`) are
//! stored in `bytes` fields as a packed Michelson string:
//!
//! ```text
//! 05 01 <u32 big-endian length> <utf-8 payload>
//! ```
//!
//! rendered as lowercase hex. Values that do not carry the `0501` marker are
//! treated as plain text and passed through unchanged when decoding.
//!
//! ## Base58check
//!
//! Tezos addresses, keys and signatures are base58check strings whose
//! decoded payload starts with a fixed version prefix.

use super::TezosError;

/// Hex marker of a packed Michelson string (`PACK` tag + string node tag).
pub const MICHELSON_STRING_MARKER: &str = "0501";

/// Length of the marker plus the 4-byte length, in hex digits.
const MICHELSON_STRING_HEADER_LEN: usize = 12;

/// Encode a string as packed Michelson bytes (hex).
pub fn string_to_michelson_bytes(value: &str) -> String {
    let payload = value.as_bytes();
    format!(
        "{MICHELSON_STRING_MARKER}{:08x}{}",
        payload.len(),
        hex::encode(payload)
    )
}

/// Decode packed Michelson bytes (hex) back to a string.
///
/// Anything that is not a well-formed packed string is returned as-is, so
/// already-plain values survive a decode.
pub fn michelson_bytes_to_string(value: &str) -> String {
    if !value.starts_with(MICHELSON_STRING_MARKER) || value.len() < MICHELSON_STRING_HEADER_LEN {
        return value.to_string();
    }
    hex::decode(&value[MICHELSON_STRING_HEADER_LEN..])
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| value.to_string())
}

/// Decode a raw hex `bytes` value as UTF-8 text, if it is one.
///
/// Used for metadata maps (`token_info`, TZIP-16 `metadata`) whose values are
/// unpacked UTF-8 bytes.
pub fn hex_to_text(value: &str) -> Option<String> {
    let bytes = hex::decode(value).ok()?;
    String::from_utf8(bytes).ok()
}

/// Base58check version prefixes.
pub mod prefix {
    pub const TZ1: &[u8] = &[6, 161, 159];
    pub const TZ2: &[u8] = &[6, 161, 161];
    pub const TZ3: &[u8] = &[6, 161, 164];
    pub const KT1: &[u8] = &[2, 90, 121];
    pub const EDPK: &[u8] = &[13, 15, 37, 217];
    /// 32-byte seed form (`edsk` + 50 chars).
    pub const EDSK_SEED: &[u8] = &[13, 15, 58, 7];
    /// 64-byte secret key form (`edsk` + 94 chars).
    pub const EDSK_FULL: &[u8] = &[43, 246, 78, 7];
    pub const EDSIG: &[u8] = &[9, 245, 205, 134, 18];
}

/// Encode `payload` under a version prefix.
pub fn b58check_encode(prefix: &[u8], payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(prefix.len() + payload.len());
    data.extend_from_slice(prefix);
    data.extend_from_slice(payload);
    bs58::encode(data).with_check().into_string()
}

/// Decode a base58check string, verify its version prefix and payload size,
/// and return the payload.
pub fn b58check_decode(
    value: &str,
    prefix: &[u8],
    payload_len: usize,
) -> Result<Vec<u8>, TezosError> {
    let data = bs58::decode(value)
        .with_check(None)
        .into_vec()
        .map_err(|e| TezosError::InvalidEncoding(format!("{value}: {e}")))?;

    if !data.starts_with(prefix) || data.len() != prefix.len() + payload_len {
        return Err(TezosError::InvalidEncoding(format!(
            "{value}: unexpected prefix or length"
        )));
    }
    Ok(data[prefix.len()..].to_vec())
}

/// Whether `value` is a valid implicit account address (`tz1`/`tz2`/`tz3`).
pub fn is_implicit_address(value: &str) -> bool {
    [prefix::TZ1, prefix::TZ2, prefix::TZ3]
        .iter()
        .any(|p| b58check_decode(value, p, 20).is_ok())
}

/// Whether `value` is an ed25519 implicit account address (`tz1`).
pub fn is_ed25519_address(value: &str) -> bool {
    b58check_decode(value, prefix::TZ1, 20).is_ok()
}

/// Whether `value` is a valid originated contract address (`KT1`).
pub fn is_contract_address(value: &str) -> bool {
    b58check_decode(value, prefix::KT1, 20).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_self_with_length_header() {
        let encoded = string_to_michelson_bytes("self");
        assert_eq!(encoded, format!("0501{}{}", "00000004", hex::encode("self")));
        assert_eq!(encoded, "05010000000473656c66");
    }

    #[test]
    fn decodes_known_identities() {
        assert_eq!(michelson_bytes_to_string("05010000000473656c66"), "self");
        assert_eq!(
            michelson_bytes_to_string("0501000000096f74686572206f7267"),
            "other org"
        );
        assert_eq!(
            michelson_bytes_to_string("05010000000c6578616d706c6520636f7270"),
            "example corp"
        );
    }

    #[test]
    fn decode_passes_through_plain_values() {
        assert_eq!(michelson_bytes_to_string("hello"), "hello");
        assert_eq!(michelson_bytes_to_string("tz1abc"), "tz1abc");
        assert_eq!(michelson_bytes_to_string(""), "");
    }

    #[test]
    fn decode_passes_through_marker_with_garbage() {
        assert_eq!(michelson_bytes_to_string("0501zz"), "0501zz");
        assert_eq!(michelson_bytes_to_string("050100000002zzzz"), "050100000002zzzz");
    }

    #[test]
    fn round_trips_non_ascii_identity() {
        let name = "Coopérative Ñandú";
        let encoded = string_to_michelson_bytes(name);
        assert_eq!(&encoded[4..12], format!("{:08x}", name.len()));
        assert_eq!(michelson_bytes_to_string(&encoded), name);
    }

    #[test]
    fn hex_to_text_decodes_utf8_only() {
        assert_eq!(hex_to_text("68656c6c6f").as_deref(), Some("hello"));
        assert_eq!(hex_to_text("ff"), None);
        assert_eq!(hex_to_text("not hex"), None);
    }

    #[test]
    fn base58check_prefix_is_enforced() {
        let address = b58check_encode(prefix::KT1, &[7u8; 20]);
        assert!(address.starts_with("KT1"));
        assert!(is_contract_address(&address));
        assert!(!is_implicit_address(&address));
        assert_eq!(b58check_decode(&address, prefix::KT1, 20).unwrap(), vec![7u8; 20]);
        assert!(b58check_decode(&address, prefix::TZ1, 20).is_err());
    }

    #[test]
    fn implicit_addresses_are_recognised() {
        assert!(is_implicit_address("tz1VSUr8wwNhLAzempoch5d6hLRiTh8Cjcjb"));
        assert!(!is_implicit_address("tz1VSUr8wwNhLAzempoch5d6hLRiTh8Cjcjc"));
        assert!(!is_implicit_address("alice"));

        let tz2 = b58check_encode(prefix::TZ2, &[2; 20]);
        assert!(is_implicit_address(&tz2));
        assert!(!is_ed25519_address(&tz2));
        assert!(is_ed25519_address("tz1VSUr8wwNhLAzempoch5d6hLRiTh8Cjcjb"));
    }
}
