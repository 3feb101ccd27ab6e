//! Symbol table mapping names to RAM or ROM addresses.
//!
//! The table is seeded with the predefined registers and I/O maps. Labels are
//! added during the first pass, variables are allocated on first use during
//! the second pass. An address never changes once it is handed out, except
//! when a program defines the same label twice, in which case the later
//! definition wins.
use std::collections::HashMap;

use crate::error::{Error, Result};

/// RAM address of the first variable.
pub const VARIABLE_BASE: u32 = 16;

const PREDEFINED: [(&str, u32); 23] = [
    ("SP", 0),
    ("LCL", 1),
    ("ARG", 2),
    ("THIS", 3),
    ("THAT", 4),
    ("R0", 0),
    ("R1", 1),
    ("R2", 2),
    ("R3", 3),
    ("R4", 4),
    ("R5", 5),
    ("R6", 6),
    ("R7", 7),
    ("R8", 8),
    ("R9", 9),
    ("R10", 10),
    ("R11", 11),
    ("R12", 12),
    ("R13", 13),
    ("R14", 14),
    ("R15", 15),
    ("SCREEN", 16384),
    ("KBD", 24576),
];

/// Whether `name` is one of the symbols every table starts with.
pub fn is_predefined(name: &str) -> bool {
    PREDEFINED.iter().any(|(predefined, _)| *predefined == name)
}

#[derive(Debug)]
pub struct SymbolTable {
    symbols: HashMap<String, u32>,
    next_variable: u32,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let symbols = PREDEFINED
            .iter()
            .map(|(name, address)| (name.to_string(), *address))
            .collect();
        SymbolTable {
            symbols,
            next_variable: VARIABLE_BASE,
        }
    }

    /// Inserts or overwrites `name`. Returns the previous address, if any.
    pub fn define(&mut self, name: &str, address: u32) -> Option<u32> {
        self.symbols.insert(name.to_owned(), address)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn resolve(&self, name: &str) -> Result<u32> {
        self.symbols
            .get(name)
            .copied()
            .ok_or_else(|| Error::UndefinedSymbol(name.to_owned()))
    }

    /// Resolves `name`, allocating the next free variable cell if it has
    /// never been seen.
    pub fn resolve_or_allocate(&mut self, name: &str) -> u32 {
        if let Some(address) = self.symbols.get(name) {
            return *address;
        }
        let address = self.next_variable;
        self.next_variable += 1;
        debug!("allocated variable `{}` at RAM[{}]", name, address);
        self.symbols.insert(name.to_owned(), address);
        address
    }

    /// Number of variables allocated so far.
    pub fn variable_count(&self) -> u32 {
        self.next_variable - VARIABLE_BASE
    }
}
