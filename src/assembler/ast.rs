//! This AST describes one parsed line of Hack assembly.
//!
//! Every non-blank line is exactly one of three things:
//!
//! ```nasm
//! @21          // A-instruction with a literal address
//! @LOOP        // A-instruction with a symbolic address
//! (LOOP)       // label definition, occupies no ROM space
//! MD=M+1;JGT   // C-instruction: dest=comp;jump, dest and jump optional
//! ```
//!
//! The three fields of a C-instruction are closed enums. Each one knows its
//! own bit pattern, so an encoded instruction can never carry a mnemonic
//! that is missing from the table.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::source::SourceLine;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Instruction {
    Address(Address),
    Compute { dest: Dest, comp: Comp, jump: Jump },
    Label(String),
}

impl Instruction {
    /// Labels are pseudo-instructions, everything else takes one ROM word.
    pub fn occupies_rom(&self) -> bool {
        !matches!(self, Instruction::Label(_))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instruction::Address(addr) => write!(f, "@{}", addr),
            Instruction::Label(name) => write!(f, "({})", name),
            Instruction::Compute { dest, comp, jump } => {
                if *dest != Dest::Null {
                    write!(f, "{}=", dest)?;
                }
                write!(f, "{}", comp)?;
                if *jump != Jump::Null {
                    write!(f, ";{}", jump)?;
                }
                Ok(())
            }
        }
    }
}

/// The operand of an A-instruction.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Address {
    Literal(u32),
    Symbol(String),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Address::Literal(value) => write!(f, "{}", value),
            Address::Symbol(name) => write!(f, "{}", name),
        }
    }
}

/// A parsed instruction together with the line it came from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Statement {
    pub source: SourceLine,
    pub instruction: Instruction,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Dest {
    Null,
    M,
    D,
    MD,
    A,
    AM,
    AD,
    AMD,
}

impl Dest {
    /// The 3-bit `d1 d2 d3` field.
    pub fn bits(self) -> u16 {
        use Dest::*;
        match self {
            Null => 0b000,
            M    => 0b001,
            D    => 0b010,
            MD   => 0b011,
            A    => 0b100,
            AM   => 0b101,
            AD   => 0b110,
            AMD  => 0b111,
        }
    }

    fn mnemonic(self) -> &'static str {
        use Dest::*;
        match self {
            Null => "null",
            M    => "M",
            D    => "D",
            MD   => "MD",
            A    => "A",
            AM   => "AM",
            AD   => "AD",
            AMD  => "AMD",
        }
    }
}

impl FromStr for Dest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Dest::*;
        // `Null` stands for an omitted field and has no spelling.
        match s {
            "M"    => Ok(M),
            "D"    => Ok(D),
            "MD"   => Ok(MD),
            "A"    => Ok(A),
            "AM"   => Ok(AM),
            "AD"   => Ok(AD),
            "AMD"  => Ok(AMD),
            _ => Err(Error::InvalidMnemonic { kind: "dest", mnemonic: s.to_owned() }),
        }
    }
}

impl fmt::Display for Dest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// The ALU computation of a C-instruction. Variants reading `M` instead of
/// `A` set the `a` bit.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Comp {
    Zero,
    One,
    MinusOne,
    D,
    A,
    NotD,
    NotA,
    NegD,
    NegA,
    DPlusOne,
    APlusOne,
    DMinusOne,
    AMinusOne,
    DPlusA,
    DMinusA,
    AMinusD,
    DAndA,
    DOrA,
    M,
    NotM,
    NegM,
    MPlusOne,
    MMinusOne,
    DPlusM,
    DMinusM,
    MMinusD,
    DAndM,
    DOrM,
}

impl Comp {
    /// The 7-bit `a c1 c2 c3 c4 c5 c6` field.
    pub fn bits(self) -> u16 {
        use Comp::*;
        match self {
            Zero      => 0b0101010,
            One       => 0b0111111,
            MinusOne  => 0b0111010,
            D         => 0b0001100,
            A         => 0b0110000,
            NotD      => 0b0001101,
            NotA      => 0b0110001,
            NegD      => 0b0001111,
            NegA      => 0b0110011,
            DPlusOne  => 0b0011111,
            APlusOne  => 0b0110111,
            DMinusOne => 0b0001110,
            AMinusOne => 0b0110010,
            DPlusA    => 0b0000010,
            DMinusA   => 0b0010011,
            AMinusD   => 0b0000111,
            DAndA     => 0b0000000,
            DOrA      => 0b0010101,
            M         => 0b1110000,
            NotM      => 0b1110001,
            NegM      => 0b1110011,
            MPlusOne  => 0b1110111,
            MMinusOne => 0b1110010,
            DPlusM    => 0b1000010,
            DMinusM   => 0b1010011,
            MMinusD   => 0b1000111,
            DAndM     => 0b1000000,
            DOrM      => 0b1010101,
        }
    }

    fn mnemonic(self) -> &'static str {
        use Comp::*;
        match self {
            Zero      => "0",
            One       => "1",
            MinusOne  => "-1",
            D         => "D",
            A         => "A",
            NotD      => "!D",
            NotA      => "!A",
            NegD      => "-D",
            NegA      => "-A",
            DPlusOne  => "D+1",
            APlusOne  => "A+1",
            DMinusOne => "D-1",
            AMinusOne => "A-1",
            DPlusA    => "D+A",
            DMinusA   => "D-A",
            AMinusD   => "A-D",
            DAndA     => "D&A",
            DOrA      => "D|A",
            M         => "M",
            NotM      => "!M",
            NegM      => "-M",
            MPlusOne  => "M+1",
            MMinusOne => "M-1",
            DPlusM    => "D+M",
            DMinusM   => "D-M",
            MMinusD   => "M-D",
            DAndM     => "D&M",
            DOrM      => "D|M",
        }
    }
}

impl FromStr for Comp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Comp::*;
        match s {
            "0"   => Ok(Zero),
            "1"   => Ok(One),
            "-1"  => Ok(MinusOne),
            "D"   => Ok(D),
            "A"   => Ok(A),
            "!D"  => Ok(NotD),
            "!A"  => Ok(NotA),
            "-D"  => Ok(NegD),
            "-A"  => Ok(NegA),
            "D+1" => Ok(DPlusOne),
            "A+1" => Ok(APlusOne),
            "D-1" => Ok(DMinusOne),
            "A-1" => Ok(AMinusOne),
            "D+A" => Ok(DPlusA),
            "D-A" => Ok(DMinusA),
            "A-D" => Ok(AMinusD),
            "D&A" => Ok(DAndA),
            "D|A" => Ok(DOrA),
            "M"   => Ok(M),
            "!M"  => Ok(NotM),
            "-M"  => Ok(NegM),
            "M+1" => Ok(MPlusOne),
            "M-1" => Ok(MMinusOne),
            "D+M" => Ok(DPlusM),
            "D-M" => Ok(DMinusM),
            "M-D" => Ok(MMinusD),
            "D&M" => Ok(DAndM),
            "D|M" => Ok(DOrM),
            _ => Err(Error::InvalidMnemonic { kind: "comp", mnemonic: s.to_owned() }),
        }
    }
}

impl fmt::Display for Comp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Jump {
    Null,
    JGT,
    JEQ,
    JGE,
    JLT,
    JNE,
    JLE,
    JMP,
}

impl Jump {
    /// The 3-bit `j1 j2 j3` field.
    pub fn bits(self) -> u16 {
        use Jump::*;
        match self {
            Null => 0b000,
            JGT  => 0b001,
            JEQ  => 0b010,
            JGE  => 0b011,
            JLT  => 0b100,
            JNE  => 0b101,
            JLE  => 0b110,
            JMP  => 0b111,
        }
    }

    fn mnemonic(self) -> &'static str {
        use Jump::*;
        match self {
            Null => "null",
            JGT  => "JGT",
            JEQ  => "JEQ",
            JGE  => "JGE",
            JLT  => "JLT",
            JNE  => "JNE",
            JLE  => "JLE",
            JMP  => "JMP",
        }
    }
}

impl FromStr for Jump {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Jump::*;
        match s {
            "JGT"  => Ok(JGT),
            "JEQ"  => Ok(JEQ),
            "JGE"  => Ok(JGE),
            "JLT"  => Ok(JLT),
            "JNE"  => Ok(JNE),
            "JLE"  => Ok(JLE),
            "JMP"  => Ok(JMP),
            _ => Err(Error::InvalidMnemonic { kind: "jump", mnemonic: s.to_owned() }),
        }
    }
}

impl fmt::Display for Jump {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comp_mnemonics() {
        let all = [
            "0", "1", "-1", "D", "A", "!D", "!A", "-D", "-A", "D+1", "A+1", "D-1", "A-1",
            "D+A", "D-A", "A-D", "D&A", "D|A", "M", "!M", "-M", "M+1", "M-1", "D+M", "D-M",
            "M-D", "D&M", "D|M",
        ];
        for mnemonic in all.iter() {
            let comp: Comp = mnemonic.parse().unwrap();
            assert_eq!(comp.to_string(), *mnemonic);
        }

        assert_eq!(Comp::Zero.bits(), 0b0101010);
        assert_eq!(Comp::DPlusA.bits(), 0b0000010);
        assert_eq!(Comp::M.bits(), 0b1110000);

        assert!("A+D".parse::<Comp>().is_err());
        assert!("d".parse::<Comp>().is_err());
        assert!("".parse::<Comp>().is_err());
    }

    #[test]
    fn test_m_forms_set_a_bit() {
        let pairs = [
            (Comp::A, Comp::M),
            (Comp::NotA, Comp::NotM),
            (Comp::NegA, Comp::NegM),
            (Comp::APlusOne, Comp::MPlusOne),
            (Comp::AMinusOne, Comp::MMinusOne),
            (Comp::DPlusA, Comp::DPlusM),
            (Comp::DMinusA, Comp::DMinusM),
            (Comp::AMinusD, Comp::MMinusD),
            (Comp::DAndA, Comp::DAndM),
            (Comp::DOrA, Comp::DOrM),
        ];
        for (a, m) in pairs.iter() {
            assert_eq!(a.bits() | 0b1000000, m.bits());
        }
    }

    #[test]
    fn test_dest_and_jump() {
        assert_eq!("MD".parse::<Dest>().unwrap().bits(), 0b011);
        assert_eq!("AMD".parse::<Dest>().unwrap().bits(), 0b111);
        assert!(matches!("null".parse::<Dest>(), Err(Error::InvalidMnemonic { kind: "dest", .. })));
        assert!("DM".parse::<Dest>().is_err());

        assert_eq!("JGT".parse::<Jump>().unwrap().bits(), 0b001);
        assert_eq!("JMP".parse::<Jump>().unwrap().bits(), 0b111);
        assert!("jmp".parse::<Jump>().is_err());
        assert!(matches!("null".parse::<Jump>(), Err(Error::InvalidMnemonic { kind: "jump", .. })));
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::Address(Address::Literal(21)).to_string(), "@21");
        assert_eq!(Instruction::Address(Address::Symbol("i".into())).to_string(), "@i");
        assert_eq!(Instruction::Label("LOOP".into()).to_string(), "(LOOP)");
        let c = Instruction::Compute { dest: Dest::MD, comp: Comp::MPlusOne, jump: Jump::Null };
        assert_eq!(c.to_string(), "MD=M+1");
        let c = Instruction::Compute { dest: Dest::Null, comp: Comp::Zero, jump: Jump::JMP };
        assert_eq!(c.to_string(), "0;JMP");
    }
}
