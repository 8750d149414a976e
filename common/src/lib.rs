use substreams::scalar::BigInt;
use substreams::Hex;

/// Format BigInt as a base-10 string
#[inline]
pub fn format_bigint(value: &BigInt) -> String {
    value.to_string()
}

/// Format a list of BigInt values, keeping their order
pub fn format_bigints(values: &[BigInt]) -> Vec<String> {
    values.iter().map(format_bigint).collect()
}

/// Ensure address has 0x prefix
#[inline]
pub fn ensure_0x_prefix(address: &str) -> String {
    if address.starts_with("0x") || address.starts_with("0X") {
        address.to_string()
    } else {
        format!("0x{address}")
    }
}

/// Format raw address bytes as lowercase 0x-prefixed hex
///
/// Entity ids are built from this representation, so every address written
/// to the store goes through here.
#[inline]
pub fn format_address(bytes: &[u8]) -> String {
    ensure_0x_prefix(&Hex(bytes).to_string())
}

/// Format a list of raw addresses, keeping their order
pub fn format_addresses(addresses: &[Vec<u8>]) -> Vec<String> {
    addresses.iter().map(|address| format_address(address)).collect()
}

/// Lowercase an address and make sure it carries the 0x prefix
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    format!("0x{}", body.to_ascii_lowercase())
}

/// Decode a 0x-prefixed (or bare) hex address into its 20 raw bytes
///
/// ## Returns:
/// - `None` if the input is not exactly 20 bytes of hex
pub fn decode_address(address: &str) -> Option<Vec<u8>> {
    let normalized = normalize_address(address);
    hex::decode(&normalized[2..])
        .ok()
        .filter(|bytes| bytes.len() == 20)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_addresses_as_lowercase_hex() {
        let bytes = vec![0xAB; 20];
        assert_eq!(format_address(&bytes), format!("0x{}", "ab".repeat(20)));
        assert_eq!(
            format_addresses(&[vec![0x01; 20], vec![0xff; 20]]),
            vec![format!("0x{}", "01".repeat(20)), format!("0x{}", "ff".repeat(20))]
        );
    }

    #[test]
    fn normalizes_mixed_case_addresses() {
        assert_eq!(
            normalize_address("0xC04ED88C05FCDE0F94305598EB14F1624B091A5C"),
            "0xc04ed88c05fcde0f94305598eb14f1624b091a5c"
        );
        assert_eq!(normalize_address("abCD"), "0xabcd");
    }

    #[test]
    fn decodes_only_twenty_byte_addresses() {
        let decoded = decode_address("0xc04ed88c05fcde0f94305598eb14f1624b091a5c").unwrap();
        assert_eq!(decoded.len(), 20);
        assert_eq!(decoded[0], 0xc0);
        assert_eq!(decoded[19], 0x5c);

        assert!(decode_address("0x1234").is_none());
        assert!(decode_address(&format!("0x{}", "zz".repeat(20))).is_none());
        assert!(decode_address(&format!("0x{}", "00".repeat(21))).is_none());
    }

    #[test]
    fn rejects_signed_hex_pairs() {
        assert!(decode_address(&format!("0x{}", "+f".repeat(20))).is_none());
        assert!(decode_address(&"+0".repeat(20)).is_none());
    }

    #[test]
    fn formats_bigints_in_order() {
        let values = vec![BigInt::from(0u64), BigInt::from(42u64)];
        assert_eq!(format_bigints(&values), vec!["0".to_string(), "42".to_string()]);
    }
}
