//! Translates instruction fields into their binary form.
//!
//! All functions here are pure. A binary instruction is rendered as a
//! 16 character string of `0` and `1`, most significant bit first.
use crate::error::{Error, Result};
use super::ast::{Comp, Dest, Jump};

/// Highest address an A-instruction can load.
pub const MAX_ADDRESS: u32 = 0x7FFF;

/// Encodes a `dest` mnemonic as its 3-bit field.
pub fn dest(mnemonic: &str) -> Result<u16> {
    Ok(mnemonic.parse::<Dest>()?.bits())
}

/// Encodes a `comp` mnemonic as its 7-bit field.
pub fn comp(mnemonic: &str) -> Result<u16> {
    Ok(mnemonic.parse::<Comp>()?.bits())
}

/// Encodes a `jump` mnemonic as its 3-bit field.
pub fn jump(mnemonic: &str) -> Result<u16> {
    Ok(mnemonic.parse::<Jump>()?.bits())
}

/// `111` followed by the comp, dest and jump fields.
pub fn compute(dest: Dest, comp: Comp, jump: Jump) -> String {
    let word = (0b111 << 13) | (comp.bits() << 6) | (dest.bits() << 3) | jump.bits();
    format!("{:016b}", word)
}

/// A leading `0` followed by the 15-bit address.
pub fn address(line: usize, value: u32) -> Result<String> {
    if value > MAX_ADDRESS {
        return Err(Error::AddressOverflow {
            line,
            address: value.to_string(),
        });
    }
    Ok(format!("{:016b}", value))
}
