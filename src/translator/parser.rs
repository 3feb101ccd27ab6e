//! The Parser module classifies cleaned VM source lines into commands.
use std::collections::VecDeque;

use once_cell::sync::Lazy;
use regex::Regex;

use super::ast::*;
use crate::assembler::symbols;
use crate::error::{Error, Result};
use crate::source::SourceLine;

static ARITHMETIC: Lazy<Regex> = regex!(r"^(add|sub|neg|eq|gt|lt|and|or|not)$");
static STACK: Lazy<Regex> = regex!(
    r"^(push|pop)\s+(argument|local|static|constant|this|that|pointer|temp)\s+([0-9]+)$"
);
static FLOW: Lazy<Regex> = regex!(r"^(label|goto|if-goto)\s+([A-Za-z_.$:][A-Za-z0-9_.$:]*)$");
// Function names never contain `$`, which separates a scope from the
// labels inside it.
static FUNCTION: Lazy<Regex> =
    regex!(r"^(function|call)\s+([A-Za-z_.:][A-Za-z0-9_.:]*)\s+([0-9]+)$");
// `Unit.k` is how static variables are spelled.
static STATIC_SYMBOL: Lazy<Regex> = regex!(r"\.[0-9]+$");
static RETURN: Lazy<Regex> = regex!(r"^return$");

pub struct Parser {
    lines: VecDeque<SourceLine>,
}

impl Parser {
    pub fn new<I: IntoIterator<Item = SourceLine>>(lines: I) -> Self {
        Parser { lines: lines.into_iter().collect() }
    }

    /// Run the parser, consuming itself and returning every command in
    /// source order. Stops at the first line that fails to parse.
    pub fn run(mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::with_capacity(self.lines.len());
        while let Some(source) = self.consume() {
            let command = parse_line(&source)?;
            statements.push(Statement { source, command });
        }
        Ok(statements)
    }

    #[inline]
    fn consume(&mut self) -> Option<SourceLine> {
        self.lines.pop_front()
    }
}

/// Classifies a single cleaned line.
pub fn parse_line(line: &SourceLine) -> Result<Command> {
    let text = line.text.as_str();
    let located = |err: Error| locate(err, line.number);

    if let Some(caps) = ARITHMETIC.captures(text) {
        return Ok(Command::Arithmetic(caps[1].parse::<ArithmeticOp>().map_err(located)?));
    }
    if let Some(caps) = STACK.captures(text) {
        let segment: Segment = caps[2].parse().map_err(located)?;
        let index = number(line, &caps[3])?;
        return match &caps[1] {
            "push" => Ok(Command::Push(segment, index)),
            _ if segment == Segment::Constant => Err(Error::parse(line.number, &line.original)),
            _ => Ok(Command::Pop(segment, index)),
        };
    }
    if let Some(caps) = FLOW.captures(text) {
        let name = caps[2].to_owned();
        return match &caps[1] {
            "label" => Ok(Command::Label(name)),
            "goto" => Ok(Command::Goto(name)),
            _ => Ok(Command::IfGoto(name)),
        };
    }
    if let Some(caps) = FUNCTION.captures(text) {
        let name = caps[2].to_owned();
        if is_reserved(&name) {
            return Err(Error::ReservedName { line: line.number, name });
        }
        let count = number(line, &caps[3])?;
        return match &caps[1] {
            "function" => Ok(Command::Function(name, count)),
            _ => Ok(Command::Call(name, count)),
        };
    }
    if RETURN.is_match(text) {
        return Ok(Command::Return);
    }

    Err(Error::parse(line.number, &line.original))
}

/// A function's entry label is its bare name, so it must not land on a
/// register symbol or a static variable.
fn is_reserved(name: &str) -> bool {
    symbols::is_predefined(name) || STATIC_SYMBOL.is_match(name)
}

fn number(line: &SourceLine, digits: &str) -> Result<u16> {
    digits
        .parse()
        .map_err(|_| Error::parse(line.number, &line.original))
}

/// Attaches a line number to errors raised by the `FromStr` impls.
fn locate(err: Error, number: usize) -> Error {
    match err {
        Error::UnknownSegment { segment, .. } => Error::UnknownSegment { line: number, segment },
        Error::UnknownCommand { command, .. } => Error::UnknownCommand { line: number, command },
        other => other,
    }
}
