//! # ECDSA Recovery (secp256k1)
//!
//! Pure domain logic for checking a personal-sign signature against an
//! account address.
//!
//! ## Security Notes
//!
//! - **Exact bytes**: the EIP-191 digest is computed over the raw message
//!   bytes exactly as supplied. Nothing is re-serialized or normalized.
//! - **Malleability Prevention (EIP-2)**: S must be STRICTLY LESS THAN SECP256K1_HALF_ORDER
//! - **Scalar Range Validation**: R and S must be in [1, n-1]
//! - **R Point Validation**: R must be a valid x-coordinate on the secp256k1 curve
//! - **Constant-Time Operations**: Uses `subtle` crate for side-channel resistance

use super::entities::{Address, EcdsaSignature, Hash};
use super::errors::SignatureError;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::FromEncodedPoint;
use k256::{AffinePoint, EncodedPoint};
use sha3::{Digest, Keccak256};
use subtle::{Choice, ConstantTimeEq};

/// secp256k1 curve order n
/// n = 0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Half of the secp256k1 curve order (for malleability check).
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// EIP-191 version 0x45 prefix used by `personal_sign`.
const PERSONAL_SIGN_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

// =============================================================================
// SIGNATURE DECODING
// =============================================================================

impl EcdsaSignature {
    /// Decode a hex signature, with or without a `0x` prefix.
    ///
    /// Accepts the 65-byte `r || s || v` form and the 64-byte EIP-2098
    /// compact form `r || yParityAndS`.
    pub fn from_hex(signature: &str) -> Result<Self, SignatureError> {
        let digits = signature.strip_prefix("0x").unwrap_or(signature);
        let bytes =
            hex::decode(digits).map_err(|e| SignatureError::InvalidEncoding(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];

        match bytes.len() {
            65 => {
                r.copy_from_slice(&bytes[..32]);
                s.copy_from_slice(&bytes[32..64]);
                Ok(Self { r, s, v: bytes[64] })
            }
            64 => {
                r.copy_from_slice(&bytes[..32]);
                s.copy_from_slice(&bytes[32..]);
                // Top bit of the second word carries the y parity
                let v = s[0] >> 7;
                s[0] &= 0x7f;
                Ok(Self { r, s, v })
            }
            n => Err(SignatureError::InvalidEncoding(format!(
                "expected 64 or 65 bytes, got {n}"
            ))),
        }
    }

    /// 65-byte `r || s || v` encoding.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    /// `0x`-prefixed hex of the 65-byte encoding.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

// =============================================================================
// CORE VERIFICATION FUNCTIONS
// =============================================================================

/// Digest that a wallet signs for `personal_sign` over `message`.
///
/// `keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)`
pub fn hash_personal_message(message: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_SIGN_PREFIX);
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}

/// Check the signature components and recover the signer address.
///
/// Security validations performed:
/// 1. R is in valid range [1, n-1] per SEC1 standard
/// 2. R is a valid x-coordinate on the secp256k1 curve
/// 3. S is in valid range [1, n-1] per SEC1 standard
/// 4. S is in lower half per EIP-2 malleability protection
/// 5. Recovery ID (v) is valid (0, 1, 27, or 28)
/// 6. Public key recovery succeeds
pub fn verify_ecdsa(
    message_hash: &Hash,
    signature: &EcdsaSignature,
) -> Result<Address, SignatureError> {
    if !is_valid_scalar(&signature.r) || !is_valid_r_coordinate(&signature.r) {
        return Err(SignatureError::InvalidFormat);
    }

    if !is_valid_scalar(&signature.s) {
        return Err(SignatureError::InvalidFormat);
    }

    if !is_low_s(&signature.s) {
        return Err(SignatureError::MalleableSignature);
    }

    recover_address(message_hash, signature)
}

/// Whether `signature` over the personal-sign digest of `message` was
/// produced by the key behind `expected`.
pub fn verify_personal_signature(
    message: &[u8],
    signature: &EcdsaSignature,
    expected: &Address,
) -> Result<bool, SignatureError> {
    let digest = hash_personal_message(message);
    let recovered = verify_ecdsa(&digest, signature)?;
    Ok(recovered.as_bytes()[..].ct_eq(&expected.as_bytes()[..]).into())
}

/// Recover the signer's address from a signature.
pub fn recover_address(
    message_hash: &Hash,
    signature: &EcdsaSignature,
) -> Result<Address, SignatureError> {
    use zeroize::Zeroize;

    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);

    let sig = Signature::from_slice(&sig_bytes);
    sig_bytes.zeroize();
    let sig = sig.map_err(|_| SignatureError::InvalidFormat)?;

    let recovered_key = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered_key))
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}

/// Derive an address from a public key.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let pubkey_bytes = public_key.to_encoded_point(false);

    // Keccak256 of the uncompressed key without its 0x04 prefix
    let hash = keccak256(&pubkey_bytes.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Address::new(address)
}

/// Check if S value is in lower half of curve order (EIP-2 malleability protection).
///
/// Runs in fixed time regardless of input: both "less" and "greater" are
/// accumulated without early returns.
fn is_low_s(s: &[u8; 32]) -> bool {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for (s_byte, h_byte) in s.iter().zip(SECP256K1_HALF_ORDER.iter()) {
        let not_decided = !(less | greater);
        let byte_less = Choice::from((s_byte < h_byte) as u8);
        let byte_greater = Choice::from((s_byte > h_byte) as u8);

        less |= not_decided & byte_less;
        greater |= not_decided & byte_greater;
    }

    // Strict inequality
    less.into()
}

/// Check if a scalar value is in valid range [1, n-1] for ECDSA.
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let mut is_zero = Choice::from(1u8);
    for byte in scalar {
        is_zero &= byte.ct_eq(&0u8);
    }

    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for (s_byte, n_byte) in scalar.iter().zip(SECP256K1_ORDER.iter()) {
        let not_decided = !(less | greater);
        let byte_less = Choice::from((s_byte < n_byte) as u8);
        let byte_greater = Choice::from((s_byte > n_byte) as u8);

        less |= not_decided & byte_less;
        greater |= not_decided & byte_greater;
    }

    (!is_zero & less).into()
}

/// Validate that R is a valid x-coordinate on the secp256k1 curve.
///
/// Only about half of all field elements have a corresponding y on the
/// curve; the rest cannot come from a real signature.
fn is_valid_r_coordinate(r: &[u8; 32]) -> bool {
    let mut compressed = [0u8; 33];
    compressed[0] = 0x02;
    compressed[1..].copy_from_slice(r);

    let encoded = match EncodedPoint::from_bytes(compressed) {
        Ok(e) => e,
        Err(_) => return false,
    };

    AffinePoint::from_encoded_point(&encoded).is_some().into()
}

/// Parse recovery ID from v value.
///
/// Valid v values: 0, 1, 27, 28
fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };

    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}

/// Invert S value: s' = n - s
pub fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i32 = 0;

    for i in (0..32).rev() {
        let diff = (SECP256K1_ORDER[i] as i32) - (s[i] as i32) - borrow;
        if diff < 0 {
            result[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            result[i] = diff as u8;
            borrow = 0;
        }
    }

    result
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(any(test, feature = "test-utils"))]
pub mod test_helpers {
    use super::*;
    use k256::ecdsa::SigningKey;

    /// Generate a new ECDSA keypair.
    pub fn generate_keypair() -> (SigningKey, VerifyingKey) {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let verifying_key = *signing_key.verifying_key();
        (signing_key, verifying_key)
    }

    /// Address controlled by `key`.
    pub fn address_of(key: &SigningKey) -> Address {
        address_from_pubkey(key.verifying_key())
    }

    /// Sign a message hash with a private key, normalized to low S.
    pub fn sign(message_hash: &Hash, private_key: &SigningKey) -> EcdsaSignature {
        let (sig, recid) = private_key
            .sign_prehash_recoverable(message_hash)
            .expect("signing failed");

        let sig_bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&sig_bytes[..32]);
        s.copy_from_slice(&sig_bytes[32..]);

        let s_normalized = if !is_low_s(&s) { invert_s(&s) } else { s };

        // Inverting S flips the recovery id
        let v = if s_normalized != s {
            if recid.to_byte() == 0 {
                28
            } else {
                27
            }
        } else {
            recid.to_byte() + 27
        };

        EcdsaSignature {
            r,
            s: s_normalized,
            v,
        }
    }

    /// What a wallet returns from `personal_sign(message)`: 65-byte hex.
    pub fn personal_sign(message: &str, private_key: &SigningKey) -> String {
        sign(&hash_personal_message(message.as_bytes()), private_key).to_hex()
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
