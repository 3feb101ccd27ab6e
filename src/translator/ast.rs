//! This AST describes one parsed VM command.
//!
//! ```text
//! add | sub | neg | eq | gt | lt | and | or | not
//! push SEGMENT INDEX
//! pop SEGMENT INDEX
//! label NAME | goto NAME | if-goto NAME
//! function NAME NLOCALS
//! call NAME NARGS
//! return
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::source::SourceLine;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Command {
    Arithmetic(ArithmeticOp),
    Push(Segment, u16),
    Pop(Segment, u16),
    Label(String),
    Goto(String),
    IfGoto(String),
    Function(String, u16),
    Call(String, u16),
    Return,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Command::*;
        match self {
            Arithmetic(op)           => write!(f, "{}", op),
            Push(segment, index)     => write!(f, "push {} {}", segment, index),
            Pop(segment, index)      => write!(f, "pop {} {}", segment, index),
            Label(name)              => write!(f, "label {}", name),
            Goto(name)               => write!(f, "goto {}", name),
            IfGoto(name)             => write!(f, "if-goto {}", name),
            Function(name, n_locals) => write!(f, "function {} {}", name, n_locals),
            Call(name, n_args)       => write!(f, "call {} {}", name, n_args),
            Return                   => write!(f, "return"),
        }
    }
}

/// A parsed command together with the line it came from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Statement {
    pub source: SourceLine,
    pub command: Command,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithmeticOp {
    fn mnemonic(self) -> &'static str {
        use ArithmeticOp::*;
        match self {
            Add => "add",
            Sub => "sub",
            Neg => "neg",
            Eq  => "eq",
            Gt  => "gt",
            Lt  => "lt",
            And => "and",
            Or  => "or",
            Not => "not",
        }
    }
}

impl FromStr for ArithmeticOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use ArithmeticOp::*;
        match s {
            "add" => Ok(Add),
            "sub" => Ok(Sub),
            "neg" => Ok(Neg),
            "eq"  => Ok(Eq),
            "gt"  => Ok(Gt),
            "lt"  => Ok(Lt),
            "and" => Ok(And),
            "or"  => Ok(Or),
            "not" => Ok(Not),
            _ => Err(Error::UnknownCommand { line: 0, command: s.to_owned() }),
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Segment {
    Argument,
    Local,
    Static,
    Constant,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    fn name(self) -> &'static str {
        use Segment::*;
        match self {
            Argument => "argument",
            Local    => "local",
            Static   => "static",
            Constant => "constant",
            This     => "this",
            That     => "that",
            Pointer  => "pointer",
            Temp     => "temp",
        }
    }
}

impl FromStr for Segment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Segment::*;
        match s {
            "argument" => Ok(Argument),
            "local"    => Ok(Local),
            "static"   => Ok(Static),
            "constant" => Ok(Constant),
            "this"     => Ok(This),
            "that"     => Ok(That),
            "pointer"  => Ok(Pointer),
            "temp"     => Ok(Temp),
            _ => Err(Error::UnknownSegment { line: 0, segment: s.to_owned() }),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
