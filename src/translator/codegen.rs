//! Emits Hack assembly for VM commands.
//!
//! Memory layout assumed by the generated code:
//!
//! ```text
//! RAM[0]        SP    stack pointer, the stack grows upward from 256
//! RAM[1..=4]    LCL, ARG, THIS, THAT segment base pointers
//! RAM[3..=4]    pointer 0..=1
//! RAM[5..=12]   temp 0..=7
//! RAM[13..=15]  scratch registers used by pop and return
//! RAM[16..]     static variables, allocated by the assembler
//! ```
//!
//! Label numbering lives in a [`Context`] that the caller threads through
//! every unit of a run, so two comparisons or two calls never share a label.
//!
//! Every label other than a function entry is `scope$suffix`, where the
//! scope is the current function, or the unit outside of any function.
//! Scopes never contain `$`. Flow labels keep the name written in the
//! source as the suffix, which cannot start with a digit. Generated labels
//! use `N.tag` with `N` from the run-wide counter, so the two never meet.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use super::ast::{ArithmeticOp, Command, Segment, Statement};

// A symbol without `$`, so `Unit.k` and `Unit$label` stay unambiguous.
static UNIT_NAME: Lazy<Regex> = regex!(r"^[A-Za-z_.:][A-Za-z0-9_.:]*$");

/// Holds a destination address across a pop.
const POP_TARGET: &str = "R13";
/// The callee's LCL, captured at the start of a return.
const FRAME: &str = "R13";
/// The caller's resume address, read from the frame.
const RETURN_ADDRESS: &str = "R14";
/// The callee's ARG, where the return value lands.
const RETURN_TARGET: &str = "R15";

const TEMP_BASE: u16 = 5;
const TEMP_SIZE: u16 = 8;
const MAX_CONSTANT: u16 = 0x7FFF;
const STACK_BASE: u16 = 256;

/// Words pushed by a call: return address, LCL, ARG, THIS, THAT.
const FRAME_SIZE: u16 = 5;

/// State shared by every unit translated in one run.
#[derive(Debug, Default)]
pub struct Context {
    label_counter: usize,
    unit: String,
    function: Option<String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches to a new source unit. Statics and top-level labels are
    /// namespaced by `name`, so it has to be a valid symbol. The label
    /// counter carries over.
    pub fn set_unit(&mut self, name: &str) -> Result<()> {
        if !UNIT_NAME.is_match(name) {
            return Err(Error::UnitName(name.to_owned()));
        }
        self.unit = name.to_owned();
        self.function = None;
        Ok(())
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Number of unique labels handed out so far.
    pub fn labels_allocated(&self) -> usize {
        self.label_counter
    }

    fn next_label(&mut self) -> usize {
        let n = self.label_counter;
        self.label_counter += 1;
        n
    }

    /// Flow labels live inside the enclosing function, or the unit.
    fn scoped(&self, label: &str) -> String {
        format!("{}${}", self.scope(), label)
    }

    fn generated(&self, n: usize, tag: &str) -> String {
        format!("{}${}.{}", self.scope(), n, tag)
    }

    fn scope(&self) -> &str {
        match &self.function {
            Some(function) => function.as_str(),
            None if !self.unit.is_empty() => self.unit.as_str(),
            None => "Bootstrap",
        }
    }
}

/// Generates the assembly fragment for one command.
pub fn generate(statement: &Statement, ctx: &mut Context) -> Result<Vec<String>> {
    let line = statement.source.number;
    let mut asm = Asm::default();
    match &statement.command {
        Command::Arithmetic(op) => arithmetic(&mut asm, *op, ctx),
        Command::Push(segment, index) => push(&mut asm, *segment, *index, ctx, line)?,
        Command::Pop(segment, index) => pop(&mut asm, *segment, *index, ctx, line)?,
        Command::Label(name) => asm.label(&ctx.scoped(name)),
        Command::Goto(name) => {
            asm.at(&ctx.scoped(name));
            asm.op("0;JMP");
        }
        Command::IfGoto(name) => {
            asm.pop_d();
            asm.at(&ctx.scoped(name));
            asm.op("D;JNE");
        }
        Command::Function(name, n_locals) => function(&mut asm, name, *n_locals, ctx),
        Command::Call(name, n_args) => call(&mut asm, name, *n_args, ctx),
        Command::Return => ret(&mut asm),
    }
    Ok(asm.finish())
}

/// Startup code: points SP at the stack base and calls `Sys.init`.
pub fn bootstrap(ctx: &mut Context) -> Vec<String> {
    let mut asm = Asm::default();
    asm.at(&STACK_BASE.to_string());
    asm.op("D=A");
    asm.at("SP");
    asm.op("M=D");
    call(&mut asm, "Sys.init", 0, ctx);
    asm.finish()
}

fn arithmetic(asm: &mut Asm, op: ArithmeticOp, ctx: &mut Context) {
    use ArithmeticOp::*;
    match op {
        Add => binary(asm, "M=D+M"),
        Sub => binary(asm, "M=M-D"),
        And => binary(asm, "M=D&M"),
        Or  => binary(asm, "M=D|M"),
        Neg => unary(asm, "M=-M"),
        Not => unary(asm, "M=!M"),
        Eq  => compare(asm, "JEQ", ctx),
        Gt  => compare(asm, "JGT", ctx),
        Lt  => compare(asm, "JLT", ctx),
    }
}

/// Pops y into D and leaves A pointing at x, then combines in place.
fn binary(asm: &mut Asm, combine: &str) {
    asm.pop_d();
    asm.op("A=A-1");
    asm.op(combine);
}

fn unary(asm: &mut Asm, apply: &str) {
    asm.at("SP");
    asm.op("A=M-1");
    asm.op(apply);
}

/// Replaces x and y with -1 when `x - y` satisfies `jump`, 0 otherwise.
fn compare(asm: &mut Asm, jump: &str, ctx: &mut Context) {
    let n = ctx.next_label();
    let is_true = ctx.generated(n, "true");
    let end = ctx.generated(n, "end");

    asm.pop_d();
    asm.op("A=A-1");
    asm.op("D=M-D");
    asm.at(&is_true);
    asm.op(&format!("D;{}", jump));
    asm.at("SP");
    asm.op("A=M-1");
    asm.op("M=0");
    asm.at(&end);
    asm.op("0;JMP");
    asm.label(&is_true);
    asm.at("SP");
    asm.op("A=M-1");
    asm.op("M=-1");
    asm.label(&end);
}

/// Base pointer register of the pointer-addressed segments.
fn base_pointer(segment: Segment) -> Option<&'static str> {
    match segment {
        Segment::Local    => Some("LCL"),
        Segment::Argument => Some("ARG"),
        Segment::This     => Some("THIS"),
        Segment::That     => Some("THAT"),
        _ => None,
    }
}

/// The fixed RAM symbol behind a directly addressed segment cell.
fn direct(segment: Segment, index: u16, ctx: &Context, line: usize) -> Result<String> {
    let out_of_range = || Error::SegmentIndex {
        line,
        segment: segment.to_string(),
        index,
    };
    match segment {
        Segment::Static => Ok(format!("{}.{}", ctx.unit(), index)),
        Segment::Pointer => match index {
            0 => Ok("THIS".to_owned()),
            1 => Ok("THAT".to_owned()),
            _ => Err(out_of_range()),
        },
        Segment::Temp if index < TEMP_SIZE => Ok(format!("R{}", TEMP_BASE + index)),
        _ => Err(out_of_range()),
    }
}

fn push(asm: &mut Asm, segment: Segment, index: u16, ctx: &Context, line: usize) -> Result<()> {
    if segment == Segment::Constant {
        if index > MAX_CONSTANT {
            return Err(Error::SegmentIndex {
                line,
                segment: segment.to_string(),
                index,
            });
        }
        asm.at(&index.to_string());
        asm.op("D=A");
    } else if let Some(base) = base_pointer(segment) {
        asm.at(&index.to_string());
        asm.op("D=A");
        asm.at(base);
        asm.op("A=D+M");
        asm.op("D=M");
    } else {
        asm.at(&direct(segment, index, ctx, line)?);
        asm.op("D=M");
    }
    asm.push_d();
    Ok(())
}

fn pop(asm: &mut Asm, segment: Segment, index: u16, ctx: &Context, line: usize) -> Result<()> {
    if let Some(base) = base_pointer(segment) {
        // A is needed both to address the target and to pop, so the
        // target address waits in a scratch register.
        asm.at(&index.to_string());
        asm.op("D=A");
        asm.at(base);
        asm.op("D=D+M");
        asm.at(POP_TARGET);
        asm.op("M=D");
        asm.pop_d();
        asm.at(POP_TARGET);
        asm.op("A=M");
        asm.op("M=D");
    } else {
        let target = direct(segment, index, ctx, line)?;
        asm.pop_d();
        asm.at(&target);
        asm.op("M=D");
    }
    Ok(())
}

fn function(asm: &mut Asm, name: &str, n_locals: u16, ctx: &mut Context) {
    ctx.function = Some(name.to_owned());
    asm.label(name);
    for _ in 0..n_locals {
        asm.at("SP");
        asm.op("A=M");
        asm.op("M=0");
        asm.at("SP");
        asm.op("M=M+1");
    }
}

fn call(asm: &mut Asm, name: &str, n_args: u16, ctx: &mut Context) {
    let n = ctx.next_label();
    let return_label = ctx.generated(n, "ret");

    asm.at(&return_label);
    asm.op("D=A");
    asm.push_d();
    for saved in ["LCL", "ARG", "THIS", "THAT"].iter() {
        asm.at(saved);
        asm.op("D=M");
        asm.push_d();
    }

    // ARG = SP - 5 - n_args
    asm.at("SP");
    asm.op("D=M");
    asm.at(&(FRAME_SIZE as u32 + n_args as u32).to_string());
    asm.op("D=D-A");
    asm.at("ARG");
    asm.op("M=D");

    // LCL = SP
    asm.at("SP");
    asm.op("D=M");
    asm.at("LCL");
    asm.op("M=D");

    asm.at(name);
    asm.op("0;JMP");
    asm.label(&return_label);
}

fn ret(asm: &mut Asm) {
    // FRAME = LCL
    asm.at("LCL");
    asm.op("D=M");
    asm.at(FRAME);
    asm.op("M=D");

    // RETURN_ADDRESS = *(FRAME - 5), read before the return value can
    // overwrite it when the callee took no arguments.
    read_frame(asm, FRAME_SIZE);
    asm.at(RETURN_ADDRESS);
    asm.op("M=D");

    // RETURN_TARGET = ARG, read before ARG is restored.
    asm.at("ARG");
    asm.op("D=M");
    asm.at(RETURN_TARGET);
    asm.op("M=D");

    // Restore the caller's pointers from FRAME-1 down to FRAME-4.
    for (offset, register) in [(1, "THAT"), (2, "THIS"), (3, "ARG"), (4, "LCL")].iter() {
        read_frame(asm, *offset);
        asm.at(register);
        asm.op("M=D");
    }

    // *RETURN_TARGET = pop()
    asm.pop_d();
    asm.at(RETURN_TARGET);
    asm.op("A=M");
    asm.op("M=D");

    // SP = RETURN_TARGET + 1
    asm.at(RETURN_TARGET);
    asm.op("D=M+1");
    asm.at("SP");
    asm.op("M=D");

    asm.at(RETURN_ADDRESS);
    asm.op("A=M");
    asm.op("0;JMP");
}

/// D = *(FRAME - offset)
fn read_frame(asm: &mut Asm, offset: u16) {
    asm.at(FRAME);
    asm.op("D=M");
    asm.at(&offset.to_string());
    asm.op("A=D-A");
    asm.op("D=M");
}

/// Accumulates the lines of one fragment.
#[derive(Default)]
struct Asm {
    lines: Vec<String>,
}

impl Asm {
    fn at(&mut self, target: &str) {
        self.lines.push(format!("@{}", target));
    }

    fn op(&mut self, instruction: &str) {
        self.lines.push(instruction.to_owned());
    }

    fn label(&mut self, name: &str) {
        self.lines.push(format!("({})", name));
    }

    /// *SP = D; SP++
    fn push_d(&mut self) {
        self.at("SP");
        self.op("A=M");
        self.op("M=D");
        self.at("SP");
        self.op("M=M+1");
    }

    /// SP--; D = *SP, leaving A at the popped cell.
    fn pop_d(&mut self) {
        self.at("SP");
        self.op("AM=M-1");
        self.op("D=M");
    }

    fn finish(self) -> Vec<String> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceLine;

    fn gen(text: &str, ctx: &mut Context) -> Result<Vec<String>> {
        let source = SourceLine::new(1, text);
        let command = super::super::parser::parse_line(&source)?;
        generate(&Statement { source, command }, ctx)
    }

    #[test]
    fn test_push_constant() {
        let mut ctx = Context::new();
        assert_eq!(
            gen("push constant 7", &mut ctx).unwrap(),
            vec!["@7", "D=A", "@SP", "A=M", "M=D", "@SP", "M=M+1"]
        );
    }

    #[test]
    fn test_add() {
        let mut ctx = Context::new();
        assert_eq!(
            gen("add", &mut ctx).unwrap(),
            vec!["@SP", "AM=M-1", "D=M", "A=A-1", "M=D+M"]
        );
        assert_eq!(gen("not", &mut ctx).unwrap(), vec!["@SP", "A=M-1", "M=!M"]);
    }

    #[test]
    fn test_comparison_labels_are_unique() {
        let mut ctx = Context::new();
        ctx.set_unit("Main").unwrap();
        let first = gen("eq", &mut ctx).unwrap();
        let second = gen("lt", &mut ctx).unwrap();
        assert!(first.contains(&"(Main$0.true)".to_owned()));
        assert!(first.contains(&"D;JEQ".to_owned()));
        assert!(second.contains(&"(Main$1.true)".to_owned()));
        assert!(second.contains(&"(Main$1.end)".to_owned()));
        assert!(second.contains(&"D;JLT".to_owned()));
        assert_eq!(ctx.labels_allocated(), 2);

        // A new unit keeps counting.
        ctx.set_unit("Other").unwrap();
        let third = gen("gt", &mut ctx).unwrap();
        assert!(third.contains(&"(Other$2.true)".to_owned()));
    }

    #[test]
    fn test_static_namespacing() {
        let mut ctx = Context::new();
        ctx.set_unit("Foo").unwrap();
        assert_eq!(gen("push static 3", &mut ctx).unwrap()[0], "@Foo.3");
        ctx.set_unit("Bar").unwrap();
        let popped = gen("pop static 3", &mut ctx).unwrap();
        assert_eq!(popped, vec!["@SP", "AM=M-1", "D=M", "@Bar.3", "M=D"]);
    }

    #[test]
    fn test_fixed_segments() {
        let mut ctx = Context::new();
        assert_eq!(gen("push pointer 0", &mut ctx).unwrap()[0], "@THIS");
        assert_eq!(gen("push pointer 1", &mut ctx).unwrap()[0], "@THAT");
        assert_eq!(gen("pop temp 0", &mut ctx).unwrap()[3], "@R5");
        assert_eq!(gen("push temp 7", &mut ctx).unwrap()[0], "@R12");
        assert!(matches!(
            gen("push pointer 2", &mut ctx),
            Err(Error::SegmentIndex { index: 2, .. })
        ));
        assert!(matches!(gen("pop temp 8", &mut ctx), Err(Error::SegmentIndex { .. })));
        assert!(matches!(
            gen("push constant 32768", &mut ctx),
            Err(Error::SegmentIndex { .. })
        ));
    }

    #[test]
    fn test_pop_local_uses_scratch() {
        let mut ctx = Context::new();
        assert_eq!(
            gen("pop local 2", &mut ctx).unwrap(),
            vec![
                "@2", "D=A", "@LCL", "D=D+M", "@R13", "M=D", "@SP", "AM=M-1", "D=M", "@R13",
                "A=M", "M=D",
            ]
        );
    }

    #[test]
    fn test_flow_labels_are_scoped() {
        let mut ctx = Context::new();
        ctx.set_unit("Main").unwrap();
        assert_eq!(gen("label TOP", &mut ctx).unwrap(), vec!["(Main$TOP)"]);
        assert_eq!(gen("label SP", &mut ctx).unwrap(), vec!["(Main$SP)"]);
        gen("function Main.loop 0", &mut ctx).unwrap();
        assert_eq!(gen("label TOP", &mut ctx).unwrap(), vec!["(Main.loop$TOP)"]);
        assert_eq!(gen("goto TOP", &mut ctx).unwrap(), vec!["@Main.loop$TOP", "0;JMP"]);
        assert_eq!(
            gen("if-goto TOP", &mut ctx).unwrap(),
            vec!["@SP", "AM=M-1", "D=M", "@Main.loop$TOP", "D;JNE"]
        );
    }

    #[test]
    fn test_function_allocates_locals() {
        let mut ctx = Context::new();
        let out = gen("function Main.f 2", &mut ctx).unwrap();
        assert_eq!(out[0], "(Main.f)");
        assert_eq!(out.iter().filter(|l| *l == "M=0").count(), 2);
        assert_eq!(out.len(), 1 + 2 * 5);
    }

    #[test]
    fn test_call() {
        let mut ctx = Context::new();
        ctx.set_unit("Main").unwrap();
        gen("function Main.main 0", &mut ctx).unwrap();
        gen("eq", &mut ctx).unwrap();
        let out = gen("call Math.max 2", &mut ctx).unwrap();
        assert_eq!(out[0], "@Main.main$1.ret");
        assert_eq!(out.last().unwrap(), "(Main.main$1.ret)");
        assert!(out.contains(&"@7".to_owned()));
        assert!(out.contains(&"@Math.max".to_owned()));
    }

    #[test]
    fn test_bootstrap() {
        let mut ctx = Context::new();
        let out = bootstrap(&mut ctx);
        assert_eq!(&out[..4], &["@256", "D=A", "@SP", "M=D"]);
        assert!(out.contains(&"@Sys.init".to_owned()));
        assert_eq!(out.last().unwrap(), "(Bootstrap$0.ret)");
    }

    #[test]
    fn test_unit_names() {
        let mut ctx = Context::new();
        for name in ["Main", "_tmp", "a.b:c", "R1"].iter() {
            assert!(ctx.set_unit(name).is_ok(), "{}", name);
        }
        for name in ["my-prog", "2048", "", "a$b", "two words"].iter() {
            assert!(matches!(ctx.set_unit(name), Err(Error::UnitName(_))), "{}", name);
        }
        // A rejected name leaves the previous unit in place.
        assert_eq!(ctx.unit(), "R1");
    }
}
