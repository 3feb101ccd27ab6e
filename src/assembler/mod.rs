//! The Assembler module is in charge of taking Hack assembly
//! and producing 16-bit binary machine words.
//!
//! It parses the whole source once, then makes two passes over the
//! parsed statements: the first defines labels, the second resolves
//! symbols and encodes every real instruction.

pub mod ast;
pub mod code;
pub mod parser;
pub mod symbols;

use crate::error::Result;
use crate::source::SourceLine;
use ast::{Address, Instruction, Statement};
use symbols::SymbolTable;

/// One encoded ROM word and the line it was assembled from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Encoded {
    pub rom_address: u32,
    pub source: SourceLine,
    pub bits: String,
}

/// Assembles cleaned source lines. Nothing is returned unless every line
/// parsed and encoded.
pub fn assemble<I: IntoIterator<Item = SourceLine>>(lines: I) -> Result<Vec<Encoded>> {
    let statements = parser::Parser::new(lines).run()?;

    let mut symbols = SymbolTable::new();
    let rom_size = define_labels(&statements, &mut symbols);
    info!("first pass: {} statements, {} instructions", statements.len(), rom_size);

    let encoded = encode(&statements, &mut symbols)?;
    info!(
        "second pass: {} words emitted, {} variables allocated",
        encoded.len(),
        symbols.variable_count()
    );
    Ok(encoded)
}

/// First pass. Binds every label to the ROM address of the next real
/// instruction and returns the total instruction count.
pub fn define_labels(statements: &[Statement], symbols: &mut SymbolTable) -> u32 {
    let mut rom_address = 0;
    for statement in statements {
        match &statement.instruction {
            Instruction::Label(name) => {
                if let Some(previous) = symbols.define(name, rom_address) {
                    if previous != rom_address {
                        warn!(
                            "label `{}` on line {} redefined: {} -> {}",
                            name, statement.source.number, previous, rom_address
                        );
                    }
                }
                debug!("label `{}` = ROM[{}]", name, rom_address);
            }
            _ => rom_address += 1,
        }
    }
    rom_address
}

/// Second pass. Resolves addresses, allocating variables on first use,
/// and encodes every A- and C-instruction in source order.
pub fn encode(statements: &[Statement], symbols: &mut SymbolTable) -> Result<Vec<Encoded>> {
    let mut out = Vec::with_capacity(statements.len());
    for statement in statements.iter().filter(|s| s.instruction.occupies_rom()) {
        let line = statement.source.number;
        let bits = match &statement.instruction {
            Instruction::Address(Address::Literal(value)) => code::address(line, *value)?,
            Instruction::Address(Address::Symbol(name)) => {
                code::address(line, symbols.resolve_or_allocate(name))?
            }
            Instruction::Compute { dest, comp, jump } => code::compute(*dest, *comp, *jump),
            Instruction::Label(_) => continue,
        };
        out.push(Encoded {
            rom_address: out.len() as u32,
            source: statement.source.clone(),
            bits,
        });
    }
    Ok(out)
}
