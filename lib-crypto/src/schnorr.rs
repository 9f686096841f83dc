//! Aggregated Schnorr signatures
//!
//! Several signers produce one 64-byte signature that verifies against the
//! curve sum of their public keys:
//!
//! ```text
//! k_i = H(d_i || m) mod n              (deterministic nonces)
//! R   = sum(k_i * G), negate all k_i when R.y is odd
//! P   = sum(d_i * G)
//! e   = H(R.x || P || m) mod n
//! s   = sum(k_i + e * d_i) mod n
//! sig = R.x || s
//! ```
//!
//! Verification recomputes `R' = s*G - e*P` and accepts when `R'` is finite,
//! has even y and `R'.x == r`.

use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::point::AffineCoordinates;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, ProjectivePoint, PublicKey, Scalar, U256};
use sha2::{Digest, Sha256};

use crate::errors::{CryptoError, CryptoResult};
use crate::{PRIVATE_KEY_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

/// secp256k1 field prime, big-endian
const FIELD_PRIME: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe, 0xff, 0xff, 0xfc, 0x2f,
];

fn hash_to_scalar(parts: &[&[u8]]) -> Scalar {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    <Scalar as Reduce<U256>>::reduce_bytes(&digest)
}

fn parse_private(private_key: &[u8]) -> CryptoResult<Scalar> {
    if private_key.len() != PRIVATE_KEY_LENGTH {
        return Err(CryptoError::InvalidPrivateKey);
    }
    let scalar = Option::<Scalar>::from(Scalar::from_repr(*FieldBytes::from_slice(private_key)))
        .ok_or(CryptoError::InvalidPrivateKey)?;
    if scalar == Scalar::ZERO {
        return Err(CryptoError::InvalidPrivateKey);
    }
    Ok(scalar)
}

fn parse_public(public_key: &[u8]) -> CryptoResult<ProjectivePoint> {
    if public_key.len() != PUBLIC_KEY_LENGTH || (public_key[0] != 0x02 && public_key[0] != 0x03) {
        return Err(CryptoError::InvalidPublicKeyEncoding(hex_prefix(public_key)));
    }
    let pk = PublicKey::from_sec1_bytes(public_key).map_err(|_| CryptoError::PointNotOnCurve)?;
    Ok(pk.to_projective())
}

fn hex_prefix(bytes: &[u8]) -> String {
    bytes.iter().take(4).map(|b| format!("{:02x}", b)).collect()
}

fn compress(point: &ProjectivePoint) -> CryptoResult<[u8; PUBLIC_KEY_LENGTH]> {
    if *point == ProjectivePoint::IDENTITY {
        return Err(CryptoError::PointAtInfinity);
    }
    let encoded = point.to_affine().to_encoded_point(true);
    let mut out = [0u8; PUBLIC_KEY_LENGTH];
    out.copy_from_slice(encoded.as_bytes());
    Ok(out)
}

/// Curve sum of compressed public keys, compressed
pub fn aggregate_public_keys(public_keys: &[Vec<u8>]) -> CryptoResult<[u8; PUBLIC_KEY_LENGTH]> {
    if public_keys.is_empty() {
        return Err(CryptoError::EmptyKeySet);
    }
    let mut sum = ProjectivePoint::IDENTITY;
    for pk in public_keys {
        sum += parse_public(pk)?;
    }
    compress(&sum)
}

/// One signature over `message` from every private key in `private_keys`
pub fn aggregate(private_keys: &[Vec<u8>], message: &[u8]) -> CryptoResult<[u8; SIGNATURE_LENGTH]> {
    if private_keys.is_empty() {
        return Err(CryptoError::EmptyKeySet);
    }
    let secrets = private_keys
        .iter()
        .map(|d| parse_private(d))
        .collect::<CryptoResult<Vec<_>>>()?;

    let mut nonces: Vec<Scalar> = secrets
        .iter()
        .map(|d| hash_to_scalar(&[d.to_bytes().as_slice(), message]))
        .collect();

    let r_point = nonces
        .iter()
        .fold(ProjectivePoint::IDENTITY, |acc, k| acc + ProjectivePoint::GENERATOR * *k);
    if r_point == ProjectivePoint::IDENTITY {
        return Err(CryptoError::PointAtInfinity);
    }
    let r_affine = r_point.to_affine();
    if bool::from(r_affine.y_is_odd()) {
        for k in nonces.iter_mut() {
            *k = -*k;
        }
    }
    let r_x = r_affine.x();

    let p_point = secrets
        .iter()
        .fold(ProjectivePoint::IDENTITY, |acc, d| acc + ProjectivePoint::GENERATOR * *d);
    let p_bytes = compress(&p_point)?;

    let e = hash_to_scalar(&[r_x.as_slice(), &p_bytes, message]);
    let s = nonces
        .iter()
        .zip(secrets.iter())
        .fold(Scalar::ZERO, |acc, (k, d)| acc + *k + e * *d);

    let mut sig = [0u8; SIGNATURE_LENGTH];
    sig[..32].copy_from_slice(r_x.as_slice());
    sig[32..].copy_from_slice(s.to_bytes().as_slice());
    Ok(sig)
}

/// Single-signer Schnorr signature
pub fn sign(private_key: &[u8], message: &[u8]) -> CryptoResult<[u8; SIGNATURE_LENGTH]> {
    aggregate(&[private_key.to_vec()], message)
}

/// Verify `signature` over `message` against an aggregated public key.
///
/// Returns `Ok(false)` for a well-formed signature that does not verify and
/// an error for malformed keys or out-of-range signature components.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> CryptoResult<bool> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(CryptoError::InvalidSignatureLength(signature.len()));
    }
    let p_point = parse_public(public_key)?;

    let r = &signature[..32];
    if r >= &FIELD_PRIME[..] {
        return Err(CryptoError::SignatureRTooLarge);
    }
    let s = Option::<Scalar>::from(Scalar::from_repr(*FieldBytes::from_slice(&signature[32..])))
        .ok_or(CryptoError::SignatureSTooLarge)?;

    let e = hash_to_scalar(&[r, public_key, message]);
    let r_point = ProjectivePoint::GENERATOR * s - p_point * e;
    if r_point == ProjectivePoint::IDENTITY {
        return Ok(false);
    }
    let r_affine = r_point.to_affine();
    if bool::from(r_affine.y_is_odd()) {
        return Ok(false);
    }
    Ok(r_affine.x().as_slice() == r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecdsa::public_key_from_private;

    fn keys(seeds: &[u8]) -> (Vec<Vec<u8>>, Vec<Vec<u8>>) {
        let privs: Vec<Vec<u8>> = seeds.iter().map(|s| vec![*s; 32]).collect();
        let pubs = privs
            .iter()
            .map(|d| public_key_from_private(d).unwrap().to_vec())
            .collect();
        (privs, pubs)
    }

    #[test]
    fn test_aggregate_three_signers_verifies() {
        let (privs, pubs) = keys(&[1, 2, 3]);
        let message = [0x5a; 32];
        let sig = aggregate(&privs, &message).unwrap();
        let agg = aggregate_public_keys(&pubs).unwrap();
        assert_eq!(verify(&agg, &message, &sig), Ok(true));
    }

    #[test]
    fn test_wrong_message_or_key_returns_false() {
        let (privs, pubs) = keys(&[4, 5]);
        let sig = aggregate(&privs, b"message").unwrap();
        let agg = aggregate_public_keys(&pubs).unwrap();
        assert_eq!(verify(&agg, b"tampered", &sig), Ok(false));
        assert_eq!(verify(&pubs[0], b"message", &sig), Ok(false));
    }

    #[test]
    fn test_single_signer() {
        let (privs, pubs) = keys(&[9]);
        let sig = sign(&privs[0], b"hello").unwrap();
        assert_eq!(verify(&pubs[0], b"hello", &sig), Ok(true));
    }

    #[test]
    fn test_point_not_on_curve() {
        let mut pk = vec![0x02];
        pk.extend(hex::decode("eefdea4cdb677750a420fee807eacf21eb9898ae79b9768766e4faa04a2d4a34").unwrap());
        assert_eq!(verify(&pk, b"m", &[1u8; 64]), Err(CryptoError::PointNotOnCurve));
    }

    #[test]
    fn test_aggregate_rejects_key_off_curve() {
        let (_, mut pubs) = keys(&[1, 2]);
        let mut off_curve = vec![0x02];
        off_curve.extend(hex::decode("eefdea4cdb677750a420fee807eacf21eb9898ae79b9768766e4faa04a2d4a34").unwrap());
        pubs.insert(1, off_curve);
        assert_eq!(aggregate_public_keys(&pubs), Err(CryptoError::PointNotOnCurve));

        let mut beyond_field = vec![0x03];
        beyond_field.extend_from_slice(&FIELD_PRIME);
        pubs[1] = beyond_field;
        assert_eq!(aggregate_public_keys(&pubs), Err(CryptoError::PointNotOnCurve));
    }

    #[test]
    fn test_out_of_range_components() {
        let (_, pubs) = keys(&[7]);
        let mut sig = [0u8; 64];
        sig[..32].copy_from_slice(&FIELD_PRIME);
        assert_eq!(verify(&pubs[0], b"m", &sig), Err(CryptoError::SignatureRTooLarge));

        let order =
            hex::decode("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141").unwrap();
        let mut sig = [0u8; 64];
        sig[32..].copy_from_slice(&order);
        assert_eq!(verify(&pubs[0], b"m", &sig), Err(CryptoError::SignatureSTooLarge));
    }

    #[test]
    fn test_malformed_encodings() {
        let (_, pubs) = keys(&[7]);
        assert_eq!(
            verify(&pubs[0], b"m", &[0u8; 65]),
            Err(CryptoError::InvalidSignatureLength(65))
        );
        assert!(matches!(
            verify(&[0x04; 33], b"m", &[0u8; 64]),
            Err(CryptoError::InvalidPublicKeyEncoding(_))
        ));
        assert_eq!(aggregate(&[], b"m"), Err(CryptoError::EmptyKeySet));
    }
}
