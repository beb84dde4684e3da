//! Cryptographic functions for MySQL authentication.

use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Compute SHA-1 hash.
pub fn sha1_hash(data: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256 hash.
pub fn sha256_hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// XOR `mask` into `target`, cycling `mask` if it is shorter.
pub fn xor_in_place(target: &mut [u8], mask: &[u8]) {
    if mask.is_empty() {
        return;
    }
    for (i, byte) in target.iter_mut().enumerate() {
        *byte ^= mask[i % mask.len()];
    }
}

/// `mysql_native_password` scramble:
/// `SHA1(password) XOR SHA1(nonce + SHA1(SHA1(password)))`.
///
/// An empty password produces an empty response.
pub fn scramble_native_password(password: &[u8], nonce: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }
    let stage1 = sha1_hash(password);
    let stage2 = sha1_hash(&stage1);

    let mut hasher = Sha1::new();
    hasher.update(nonce);
    hasher.update(stage2);
    let stage3: [u8; 20] = hasher.finalize().into();

    let mut out = stage1.to_vec();
    xor_in_place(&mut out, &stage3);
    out
}

/// `caching_sha2_password` fast-path scramble:
/// `SHA256(password) XOR SHA256(SHA256(SHA256(password)) + nonce)`.
///
/// An empty password produces an empty response.
pub fn scramble_caching_sha2(password: &[u8], nonce: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }
    let stage1 = sha256_hash(password);
    let stage2 = sha256_hash(&stage1);

    let mut hasher = Sha256::new();
    hasher.update(stage2);
    hasher.update(nonce);
    let stage3: [u8; 32] = hasher.finalize().into();

    let mut out = stage1.to_vec();
    xor_in_place(&mut out, &stage3);
    out
}
