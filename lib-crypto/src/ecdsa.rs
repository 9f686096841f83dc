//! Standard single-key signatures
//!
//! ECDSA over secp256k1 with SHA-256 of the signed data as the digest.
//! Signatures are fixed-width `r || s`; high-s signatures are rejected.

use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};

use crate::errors::{CryptoError, CryptoResult};
use crate::{PRIVATE_KEY_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

/// Parse a compressed public key, checking it is a curve point
pub fn decode_point(public_key: &[u8]) -> CryptoResult<VerifyingKey> {
    if public_key.len() != PUBLIC_KEY_LENGTH {
        return Err(CryptoError::InvalidPublicKeyEncoding(format!(
            "expected {} bytes, got {}",
            PUBLIC_KEY_LENGTH,
            public_key.len()
        )));
    }
    if public_key[0] != 0x02 && public_key[0] != 0x03 {
        return Err(CryptoError::InvalidPublicKeyEncoding(format!(
            "unexpected tag {:#04x}",
            public_key[0]
        )));
    }
    VerifyingKey::from_sec1_bytes(public_key).map_err(|_| CryptoError::PointNotOnCurve)
}

fn signing_key(private_key: &[u8]) -> CryptoResult<SigningKey> {
    if private_key.len() != PRIVATE_KEY_LENGTH {
        return Err(CryptoError::InvalidPrivateKey);
    }
    SigningKey::from_slice(private_key).map_err(|_| CryptoError::InvalidPrivateKey)
}

pub fn public_key_from_private(private_key: &[u8]) -> CryptoResult<[u8; PUBLIC_KEY_LENGTH]> {
    let sk = signing_key(private_key)?;
    let point = sk.verifying_key().to_encoded_point(true);
    let mut out = [0u8; PUBLIC_KEY_LENGTH];
    out.copy_from_slice(point.as_bytes());
    Ok(out)
}

pub fn sign(private_key: &[u8], data: &[u8]) -> CryptoResult<[u8; SIGNATURE_LENGTH]> {
    let sk = signing_key(private_key)?;
    let sig: Signature = sk.sign(data);
    let mut out = [0u8; SIGNATURE_LENGTH];
    out.copy_from_slice(&sig.to_bytes());
    Ok(out)
}

/// `Ok(())` only when `signature` is a valid signature of `data` under `public_key`
pub fn verify(public_key: &[u8], data: &[u8], signature: &[u8]) -> CryptoResult<()> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(CryptoError::InvalidSignatureLength(signature.len()));
    }
    let vk = decode_point(public_key)?;
    let sig = Signature::from_slice(signature).map_err(|_| CryptoError::InvalidSignatureEncoding)?;
    vk.verify(data, &sig).map_err(|_| CryptoError::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x11; 32];

    #[test]
    fn test_sign_verify() {
        let pk = public_key_from_private(&KEY).unwrap();
        let sig = sign(&KEY, b"payload").unwrap();
        assert!(verify(&pk, b"payload", &sig).is_ok());
        assert_eq!(verify(&pk, b"other", &sig), Err(CryptoError::VerificationFailed));
    }

    #[test]
    fn test_wrong_key_fails() {
        let other = public_key_from_private(&[0x22; 32]).unwrap();
        let sig = sign(&KEY, b"payload").unwrap();
        assert_eq!(verify(&other, b"payload", &sig), Err(CryptoError::VerificationFailed));
    }

    #[test]
    fn test_malformed_inputs() {
        let pk = public_key_from_private(&KEY).unwrap();
        assert_eq!(
            verify(&pk, b"x", &[0u8; 63]),
            Err(CryptoError::InvalidSignatureLength(63))
        );
        assert!(matches!(
            decode_point(&pk[..32]),
            Err(CryptoError::InvalidPublicKeyEncoding(_))
        ));
        assert_eq!(sign(&[0u8; 32], b"x"), Err(CryptoError::InvalidPrivateKey));
    }
}
