//! Jenkins hash functions.
//!
//! Original algorithms by Bob Jenkins. All rights to the original belong to the author.
//! Forgelight tables hash names with two of them:
//! - [`oaat`] - one-at-a-time, computed on a *signed* 32-bit accumulator
//! - [`lookup2`] - the 1996 `hash()` with the golden-ratio seed
//!
//! Both must match the game bit for bit, so every step uses explicit wrapping arithmetic.

#![no_std]

/// Golden ratio seed used by lookup2.
pub const GOLDEN_RATIO: u32 = 0x9e37_79b9;

/// One-at-a-time hash.
///
/// Bytes are sign-extended before they are added and the shifts are
/// arithmetic, matching the engine's `int32_t` accumulator. The result is
/// returned reinterpreted as unsigned.
#[inline]
pub fn oaat(key: &[u8]) -> u32 {
    oaat_bytes(key.iter().copied())
}

/// One-at-a-time hash of the ASCII-uppercased key.
///
/// Material parameters reference textures by `oaat(UPPERCASE(name))`.
#[inline]
pub fn oaat_uppercase(key: &str) -> u32 {
    oaat_bytes(key.bytes().map(|b| b.to_ascii_uppercase()))
}

fn oaat_bytes(key: impl Iterator<Item = u8>) -> u32 {
    let mut hash: i32 = 0;
    for byte in key {
        hash = hash.wrapping_add(byte as i8 as i32);
        hash = hash.wrapping_add(hash.wrapping_shl(10));
        hash ^= hash >> 6;
    }
    hash = hash.wrapping_add(hash.wrapping_shl(3));
    hash ^= hash >> 11;
    hash = hash.wrapping_add(hash.wrapping_shl(15));
    hash as u32
}

#[inline(always)]
fn mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *a = a.wrapping_sub(*b).wrapping_sub(*c);
    *a ^= *c >> 13;
    *b = b.wrapping_sub(*c).wrapping_sub(*a);
    *b ^= *a << 8;
    *c = c.wrapping_sub(*a).wrapping_sub(*b);
    *c ^= *b >> 13;

    *a = a.wrapping_sub(*b).wrapping_sub(*c);
    *a ^= *c >> 12;
    *b = b.wrapping_sub(*c).wrapping_sub(*a);
    *b ^= *a << 16;
    *c = c.wrapping_sub(*a).wrapping_sub(*b);
    *c ^= *b >> 5;

    *a = a.wrapping_sub(*b).wrapping_sub(*c);
    *a ^= *c >> 3;
    *b = b.wrapping_sub(*c).wrapping_sub(*a);
    *b ^= *a << 10;
    *c = c.wrapping_sub(*a).wrapping_sub(*b);
    *c ^= *b >> 15;
}

/// Key byte as the engine adds it: a sign-extended `char`.
#[inline(always)]
fn sext(byte: u8) -> u32 {
    byte as i8 as u32
}

/// Four key bytes, little-endian, each sign-extended before the add.
#[inline(always)]
fn word(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .enumerate()
        .fold(0u32, |acc, (i, &b)| acc.wrapping_add(sext(b) << (8 * i)))
}

/// lookup2 hash with an initial value (`initval` in the reference code).
///
/// Like [`oaat`], key bytes are sign-extended, so names with bytes >= 0x80
/// hash the way the engine does rather than like the reference C code.
pub fn lookup2(key: &[u8], init: u32) -> u32 {
    let mut a = GOLDEN_RATIO;
    let mut b = GOLDEN_RATIO;
    let mut c = init;

    let mut blocks = key.chunks_exact(12);
    for block in &mut blocks {
        a = a.wrapping_add(word(&block[0..4]));
        b = b.wrapping_add(word(&block[4..8]));
        c = c.wrapping_add(word(&block[8..12]));
        mix(&mut a, &mut b, &mut c);
    }

    let tail = blocks.remainder();
    c = c.wrapping_add(key.len() as u32);
    // The low byte of c is reserved for the length.
    for (i, &byte) in tail.iter().enumerate() {
        let byte = sext(byte);
        match i {
            0..=3 => a = a.wrapping_add(byte << (8 * i)),
            4..=7 => b = b.wrapping_add(byte << (8 * (i - 4))),
            _ => c = c.wrapping_add(byte << (8 * (i - 7))),
        }
    }

    mix(&mut a, &mut b, &mut c);
    c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oaat_empty() {
        assert_eq!(oaat(b""), 0);
    }

    #[test]
    fn test_oaat_known_values() {
        assert_eq!(oaat(b"A"), 0x8201_03f0);
        assert_eq!(oaat(b"somefilename"), 0xe9eb_0404);
        assert_eq!(oaat(b"SOMEFILENAME"), 0x093f_3637);
        assert_eq!(oaat(b"Root"), 0x3c3a_6eb0);
        assert_eq!(oaat(b"WORLDROOT"), 0xa289_7232);
    }

    #[test]
    fn test_oaat_sign_extends_high_bytes() {
        // "é" in UTF-8, both bytes >= 0x80
        assert_eq!(oaat("\u{e9}".as_bytes()), 0xf5ac_a6ae);
    }

    #[test]
    fn test_oaat_uppercase() {
        assert_eq!(oaat_uppercase("somefilename"), oaat(b"SOMEFILENAME"));
        assert_eq!(
            oaat_uppercase("Common_Structures_Warpgate_Shield_C.dds"),
            0x45a6_0234
        );
    }

    #[test]
    fn test_lookup2_known_values() {
        assert_eq!(lookup2(b"", 0), 0xbd49_d10d);
        assert_eq!(lookup2(b"A", 0), 0xa161_4b4d);
        assert_eq!(lookup2(b"somefilename", 0), 0x4e42_f1c2);
        assert_eq!(lookup2(b"COMMON_STRUCTURES_WARPGATE_SHIELD_C.DDS", 0), 0x2ae1_90d5);
    }

    #[test]
    fn test_lookup2_sign_extends_high_bytes() {
        assert_eq!(lookup2("\u{e9}".as_bytes(), 0), 0x2cfc_f91d);
        // Full 12-byte blocks take the same path as the tail.
        assert_eq!(lookup2("Caf\u{e9}_\u{dc}ber_Texture.dds".as_bytes(), 0), 0x2613_9ffa);
    }

    #[test]
    fn test_lookup2_init_changes_hash() {
        assert_ne!(lookup2(b"Root", 0), lookup2(b"Root", 1));
    }
}
