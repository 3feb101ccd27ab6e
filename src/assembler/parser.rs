//! The Parser module takes cleaned source lines and classifies each one
//! as an A-instruction, a label definition or a C-instruction.
//!
//! The forms are tried in that order and the first match wins.
use std::collections::VecDeque;

use once_cell::sync::Lazy;
use regex::Regex;

use super::ast::*;
use crate::error::{Error, Result};
use crate::source::SourceLine;

static ADDRESS_SYMBOL: Lazy<Regex> = regex!(r"^@([A-Za-z_.$:][A-Za-z0-9_.$:]*)$");
static ADDRESS_LITERAL: Lazy<Regex> = regex!(r"^@([0-9]+)$");
static LABEL: Lazy<Regex> = regex!(r"^\(([A-Za-z_.$:][A-Za-z0-9_.$:]*)\)$");
// dest=comp;jump with dest and jump optional. The field values themselves
// are checked against the encoding tables.
static COMPUTE: Lazy<Regex> = regex!(r"^(?:([^=;]+)=)?([^=;]+)(?:;([^=;]+))?$");

pub struct Parser {
    lines: VecDeque<SourceLine>,
}

impl Parser {
    pub fn new<I: IntoIterator<Item = SourceLine>>(lines: I) -> Self {
        Parser { lines: lines.into_iter().collect() }
    }

    /// Run the parser, consuming itself and returning every statement in
    /// source order. Stops at the first line that fails to parse.
    pub fn run(mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::with_capacity(self.lines.len());
        while let Some(source) = self.consume() {
            let instruction = parse_line(&source)?;
            trace!("line {}: {:?}", source.number, instruction);
            statements.push(Statement { source, instruction });
        }
        Ok(statements)
    }

    /// Pops a line off the input and returns it.
    /// Returns None if no lines are left.
    #[inline]
    fn consume(&mut self) -> Option<SourceLine> {
        self.lines.pop_front()
    }
}

/// Classifies a single cleaned line.
pub fn parse_line(line: &SourceLine) -> Result<Instruction> {
    let text = line.text.as_str();

    if let Some(caps) = ADDRESS_SYMBOL.captures(text) {
        return Ok(Instruction::Address(Address::Symbol(caps[1].to_owned())));
    }
    if let Some(caps) = ADDRESS_LITERAL.captures(text) {
        // Only digits matched, so the parse can fail on overflow alone.
        return match caps[1].parse::<u32>() {
            Ok(value) => Ok(Instruction::Address(Address::Literal(value))),
            Err(_) => Err(Error::AddressOverflow {
                line: line.number,
                address: caps[1].to_owned(),
            }),
        };
    }
    if let Some(caps) = LABEL.captures(text) {
        return Ok(Instruction::Label(caps[1].to_owned()));
    }
    if let Some(caps) = COMPUTE.captures(text) {
        return compute(line, &caps);
    }

    Err(Error::parse(line.number, &line.original))
}

fn compute(line: &SourceLine, caps: &regex::Captures) -> Result<Instruction> {
    let middle = &caps[2];
    match (caps.get(1), caps.get(3)) {
        // A bare mnemonic is only valid as an unconditional jump form.
        (None, None) => match middle.parse::<Jump>() {
            Ok(jump) if jump != Jump::Null => Ok(Instruction::Compute {
                dest: Dest::Null,
                comp: Comp::Zero,
                jump,
            }),
            _ => Err(Error::parse(line.number, &line.original)),
        },
        (dest, jump) => Ok(Instruction::Compute {
            dest: match dest {
                Some(m) => m.as_str().parse()?,
                None => Dest::Null,
            },
            comp: middle.parse()?,
            jump: match jump {
                Some(m) => m.as_str().parse()?,
                None => Jump::Null,
            },
        }),
    }
}
