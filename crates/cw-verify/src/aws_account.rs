// SPDX-License-Identifier: MIT OR Apache-2.0
//! Thin re-export of the account-from-key-ID derivation so the
//! verifier doesn't need a dependency on the full detectors crate just
//! for one function.

/// Derive the 12-digit AWS account ID encoded in an access key ID, or
/// `None` for legacy prefixes / malformed input.
#[must_use]
pub fn derive(key_id: &str) -> Option<String> {
    const LEGACY_PREFIXES: [&str; 4] = ["AKIAI", "AKIAJ", "ASIAI", "ASIAJ"];
    if key_id.len() != 20 {
        return None;
    }
    if LEGACY_PREFIXES.contains(&&key_id[..5]) {
        return None;
    }
    let body = &key_id[4..];
    let decoded = base32::decode(base32::Alphabet::Rfc4648 { padding: false }, body)?;
    if decoded.len() < 6 {
        return None;
    }
    let mut buf = [0u8; 8];
    buf[2..8].copy_from_slice(&decoded[..6]);
    let value = u64::from_be_bytes(buf);
    let masked = value & 0x0000_7fff_ffff_ff80;
    Some(format!("{:012}", masked >> 7))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_prefix_yields_none() {
        assert!(derive("AKIAI44QH8DHBEXAMPLE").is_none());
    }

    #[test]
    fn wrong_length_yields_none() {
        assert!(derive("AKIA").is_none());
    }
}
