//! Simulated transaction reference ids

/// Generate an opaque `0x`-prefixed 32-byte hex id
///
/// The value carries no cryptographic meaning, it only stands in for a
/// transaction hash in the UI.
pub fn generate_reference_id() -> String {
    let bytes: [u8; 32] = rand::random();
    format!("0x{}", hex::encode(bytes))
}

/// Whether a string has the shape produced by [`generate_reference_id`]
pub fn is_reference_id(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|digits| digits.len() == 64 && hex::decode(digits).is_ok())
}
