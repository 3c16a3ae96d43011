//! Known-answer vectors for provider back-ends.
//!
//! Sources: RFC 2202 and RFC 4231 (HMAC), RFC 6070 and widely published
//! SHA-256/SHA-512 PBKDF2 values, NIST SP 800-38A F.2.5/F.2.6 (AES-256-CBC).
//! The vectors serialize to JSON so bindings in other languages can run the
//! same checks.

use crate::hex::hex_encode;
use serde::{Deserialize, Serialize};

/// An HMAC known answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmacVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Digest name (`sha1`, `sha256`, `sha512`).
    pub algorithm: String,
    /// Key (hex-encoded).
    pub key_hex: String,
    /// First input (hex-encoded).
    pub input_hex: String,
    /// Optional second input, appended to the first (hex-encoded).
    pub input2_hex: Option<String>,
    /// Expected tag (hex-encoded).
    pub expected_hex: String,
}

/// A PBKDF2 known answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Digest name (`sha1`, `sha256`, `sha512`).
    pub algorithm: String,
    /// Password (hex-encoded).
    pub password_hex: String,
    /// Salt (hex-encoded).
    pub salt_hex: String,
    /// Iteration count.
    pub iterations: u32,
    /// Expected derived key (hex-encoded); its length is the key length.
    pub expected_hex: String,
}

/// An AES-256-CBC known answer, checked in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Key (hex-encoded).
    pub key_hex: String,
    /// IV (hex-encoded).
    pub iv_hex: String,
    /// Plaintext (hex-encoded).
    pub plaintext_hex: String,
    /// Ciphertext (hex-encoded).
    pub ciphertext_hex: String,
}

fn hmac(
    id: &str,
    algorithm: &str,
    key: &[u8],
    input: &[u8],
    input2: Option<&[u8]>,
    expected: &str,
) -> HmacVector {
    HmacVector {
        id: id.into(),
        algorithm: algorithm.into(),
        key_hex: hex_encode(key),
        input_hex: hex_encode(input),
        input2_hex: input2.map(hex_encode),
        expected_hex: expected.into(),
    }
}

fn kdf(
    id: &str,
    algorithm: &str,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    expected: &str,
) -> KdfVector {
    KdfVector {
        id: id.into(),
        algorithm: algorithm.into(),
        password_hex: hex_encode(password),
        salt_hex: hex_encode(salt),
        iterations,
        expected_hex: expected.into(),
    }
}

/// HMAC vectors.
pub fn hmac_vectors() -> Vec<HmacVector> {
    const JEFE: &[u8] = b"what do ya want for nothing?";
    const LONG_KEY_MSG: &[u8] = b"Test Using Larger Than Block-Size Key - Hash Key First";
    let long_key = [0xaau8; 131];

    vec![
        hmac(
            "hmac_sha256_zero_key_abc",
            "sha256",
            &[0u8; 32],
            b"abc",
            None,
            "fd7adb152c05ef80dccf50a1fa4c05d5a3ec6da95575fc312ae7c5d091836351",
        ),
        hmac(
            "hmac_sha256_zero_key_abc_split",
            "sha256",
            &[0u8; 32],
            b"ab",
            Some(b"c"),
            "fd7adb152c05ef80dccf50a1fa4c05d5a3ec6da95575fc312ae7c5d091836351",
        ),
        hmac(
            "rfc2202_sha1_case1",
            "sha1",
            &[0x0b; 20],
            b"Hi There",
            None,
            "b617318655057264e28bc0b6fb378c8ef146be00",
        ),
        hmac(
            "rfc2202_sha1_case2",
            "sha1",
            b"Jefe",
            JEFE,
            None,
            "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79",
        ),
        hmac(
            "rfc4231_sha256_case1",
            "sha256",
            &[0x0b; 20],
            b"Hi There",
            None,
            "b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7",
        ),
        hmac(
            "rfc4231_sha256_case2_split",
            "sha256",
            b"Jefe",
            &JEFE[..10],
            Some(&JEFE[10..]),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843",
        ),
        hmac(
            "rfc4231_sha512_case1",
            "sha512",
            &[0x0b; 20],
            b"Hi There",
            None,
            "87aa7cdea5ef619d4ff0b4241a1d6cb02379f4e2ce4ec2787ad0b30545e17cde\
             daa833b7d6b8a702038b274eaea3f4e4be9d914eeb61f1702e696c203a126854",
        ),
        hmac(
            "rfc4231_sha512_case2",
            "sha512",
            b"Jefe",
            JEFE,
            None,
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
             9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737",
        ),
        hmac(
            "long_key_sha1",
            "sha1",
            &long_key,
            LONG_KEY_MSG,
            None,
            "90d0dace1c1bdc957339307803160335bde6df2b",
        ),
        hmac(
            "rfc4231_sha256_case6",
            "sha256",
            &long_key,
            LONG_KEY_MSG,
            None,
            "60e431591ee0b67f0d8a26aacbf5b77f8e0bc6213728c5140546040f0ee37f54",
        ),
        hmac(
            "rfc4231_sha512_case6",
            "sha512",
            &long_key,
            LONG_KEY_MSG,
            None,
            "80b24263c7c1a3ebb71493c1dd7be8b49b46d1f41b4aeec1121b013783f8f352\
             6b56d037e05f2598bd0fd2215d6a1e5295e64f73f63f0aec8b915a985d786598",
        ),
        hmac(
            "empty_key_sha1",
            "sha1",
            b"",
            b"abc",
            None,
            "9b4a918f398d74d3e367970aba3cbe54e4d2b5d9",
        ),
        hmac(
            "empty_key_sha256_split",
            "sha256",
            b"",
            b"a",
            Some(b"bc"),
            "fd7adb152c05ef80dccf50a1fa4c05d5a3ec6da95575fc312ae7c5d091836351",
        ),
        hmac(
            "empty_key_sha512",
            "sha512",
            b"",
            b"abc",
            None,
            "29689f6b79a8dd686068c2eeae97fd8769ad3ba65cb5381f838358a8045a358e\
             e3ba1739c689c7805e31734fb6072f87261d1256995370d55725cba00d10bdd0",
        ),
        hmac(
            "empty_key_empty_message_sha256",
            "sha256",
            b"",
            b"",
            None,
            "b613679a0814d9ec772f95d778c35fc5ff1697c493715653c6c712144292c5ad",
        ),
    ]
}

/// PBKDF2 vectors.
pub fn kdf_vectors() -> Vec<KdfVector> {
    let salt_0_15: Vec<u8> = (0u8..16).collect();

    vec![
        kdf(
            "rfc6070_sha1_c1",
            "sha1",
            b"password",
            b"salt",
            1,
            "0c60c80f961f0e71f3a9b524af6012062fe037a6",
        ),
        kdf(
            "rfc6070_sha1_c2",
            "sha1",
            b"password",
            b"salt",
            2,
            "ea6c014dc72d6f8ccd1ed92ace1d41f0d8de8957",
        ),
        kdf(
            "rfc6070_sha1_c4096",
            "sha1",
            b"password",
            b"salt",
            4096,
            "4b007901b765489abead49d926f721d065a429c1",
        ),
        kdf(
            "rfc6070_sha1_c4096_dklen25",
            "sha1",
            b"passwordPASSWORDpassword",
            b"saltSALTsaltSALTsaltSALTsaltSALTsalt",
            4096,
            "3d2eec4fe41c849b80c8d83662c0e44a8b291a964cf2f07038",
        ),
        kdf(
            "sha256_c1",
            "sha256",
            b"password",
            b"salt",
            1,
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b",
        ),
        kdf(
            "sha256_c4096",
            "sha256",
            b"password",
            b"salt",
            4096,
            "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a",
        ),
        kdf(
            "sha512_c1",
            "sha512",
            b"password",
            b"salt",
            1,
            "867f70cf1ade02cff3752599a3a53dc4af34c7a669815ae5d513554e1c8cf252\
             c02d470a285a0501bad999bfe943c08f050235d7d68b1da55e63f73b60a57fce",
        ),
        kdf(
            "sha512_c1000_binary_salt",
            "sha512",
            b"test",
            &salt_0_15,
            1000,
            "d5f3180c22198e230cd70e224300edd4fcbff8d9dbc697c8171f1aa29fa80f57",
        ),
        kdf(
            "empty_password_and_salt_sha256",
            "sha256",
            b"",
            b"",
            1,
            "f7ce0b653d2d72a4108cf5abe912ffdd777616dbbb27a70e8204f3ae2d0f6fad",
        ),
        kdf(
            "empty_password_sha1_c2",
            "sha1",
            b"",
            b"salt",
            2,
            "133a4ce837b4d2521ee2bf03e11c71ca794e0797",
        ),
        kdf(
            "empty_salt_sha512",
            "sha512",
            b"password",
            b"",
            1,
            "ae16ce6dfd4a6a0c20421ff80eb3ba4acc13bd1dea45f8bb034b753e4cf2032f\
             e7ce7f4f90d5d50ac5f40d1318165984231735a191fade57b25b543991c79f08",
        ),
    ]
}

/// AES-256-CBC vectors.
pub fn cipher_vectors() -> Vec<CipherVector> {
    vec![
        CipherVector {
            id: "sp800_38a_f2_5".into(),
            key_hex: "603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4".into(),
            iv_hex: "000102030405060708090a0b0c0d0e0f".into(),
            plaintext_hex: "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51\
                            30c81c46a35ce411e5fbc1191a0a52eff69f2445df4f9b17ad2b417be66c3710"
                .into(),
            ciphertext_hex: "f58c4c04d6e5f1ba779eabfb5f7bfbd69cfc4e967edb808d679f777bc6702c7d\
                             39f23369a9d9bacfa530e26304231461b2eb05e2c39be9fcda6c19078c6a9d1b"
                .into(),
        },
        CipherVector {
            id: "sp800_38a_f2_5_first_block".into(),
            key_hex: "603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4".into(),
            iv_hex: "000102030405060708090a0b0c0d0e0f".into(),
            plaintext_hex: "6bc1bee22e409f96e93d7e117393172a".into(),
            ciphertext_hex: "f58c4c04d6e5f1ba779eabfb5f7bfbd6".into(),
        },
    ]
}

/// All vectors, grouped by operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllTestVectors {
    /// HMAC vectors.
    pub hmac: Vec<HmacVector>,
    /// PBKDF2 vectors.
    pub kdf: Vec<KdfVector>,
    /// AES-256-CBC vectors.
    pub cipher: Vec<CipherVector>,
}

impl AllTestVectors {
    /// Collects every vector.
    pub fn collect() -> Self {
        Self {
            hmac: hmac_vectors(),
            kdf: kdf_vectors(),
            cipher: cipher_vectors(),
        }
    }
}

/// Generates all vectors as JSON for cross-language use.
///
/// # Errors
///
/// Returns the serializer's error.
pub fn all_vectors_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&AllTestVectors::collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::hex_decode;
    use pagecrypt_provider::HmacAlgorithm;

    #[test]
    fn vectors_are_well_formed() {
        for v in hmac_vectors() {
            let alg = HmacAlgorithm::from_name(&v.algorithm).unwrap();
            assert_eq!(
                hex_decode(&v.expected_hex).unwrap().len(),
                alg.output_size(),
                "{}",
                v.id
            );
            hex_decode(&v.key_hex).unwrap();
            hex_decode(&v.input_hex).unwrap();
        }
        for v in kdf_vectors() {
            assert!(HmacAlgorithm::from_name(&v.algorithm).is_some(), "{}", v.id);
            assert!(v.iterations >= 1);
            hex_decode(&v.expected_hex).unwrap();
        }
        for v in cipher_vectors() {
            assert_eq!(hex_decode(&v.key_hex).unwrap().len(), 32);
            assert_eq!(hex_decode(&v.iv_hex).unwrap().len(), 16);
            let pt = hex_decode(&v.plaintext_hex).unwrap();
            assert_eq!(pt.len() % 16, 0);
            assert_eq!(pt.len(), hex_decode(&v.ciphertext_hex).unwrap().len());
        }
    }

    #[test]
    fn json_export_parses_back() {
        let json = all_vectors_json().unwrap();
        let parsed: AllTestVectors = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, AllTestVectors::collect());
    }
}
