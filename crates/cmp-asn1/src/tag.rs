//! DER tag byte constants used throughout PKIMessage parsing.

pub const BOOLEAN: u8 = 0x01;
pub const INTEGER: u8 = 0x02;
pub const BIT_STRING: u8 = 0x03;
pub const OCTET_STRING: u8 = 0x04;
pub const NULL: u8 = 0x05;
pub const OBJECT_IDENTIFIER: u8 = 0x06;
pub const UTF8_STRING: u8 = 0x0C;
pub const SEQUENCE: u8 = 0x30;
pub const SET: u8 = 0x31;
pub const GENERALIZED_TIME: u8 = 0x18;

/// Constructed context-specific tag `[n]`, e.g. for CHOICE/implicit-tagged
/// fields such as `PKIBody`'s variant selector or `PKIMessage`'s
/// `protection [0]` / `extraCerts [1]`.
pub const fn context_constructed(n: u8) -> u8 {
    0xA0 | n
}

/// Primitive context-specific tag `[n]`.
pub const fn context_primitive(n: u8) -> u8 {
    0x80 | n
}

/// `true` if `tag` is constructed (bit 0x20 set) rather than primitive.
pub const fn is_constructed(tag: u8) -> bool {
    tag & 0x20 != 0
}

/// The low 5 bits of a context-specific tag, i.e. the CHOICE/field index
/// `n` in `[n]`.
pub const fn context_number(tag: u8) -> u8 {
    tag & 0x1F
}
