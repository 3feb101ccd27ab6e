//! The Translator module lowers VM commands to Hack assembly.
//!
//! Units are translated in the order given and their output is
//! concatenated. Static variables are namespaced per unit, while label
//! numbering runs across the whole translation.

pub mod ast;
pub mod codegen;
pub mod parser;

use crate::error::Result;
use crate::source::SourceLine;
use codegen::Context;

/// Switches that change the generated code.
#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    /// Emit startup code that sets up the stack and calls `Sys.init`.
    pub bootstrap: bool,
}

/// One source unit: its base name and its cleaned lines.
#[derive(Clone, Debug)]
pub struct Unit {
    pub name: String,
    pub lines: Vec<SourceLine>,
}

impl Unit {
    pub fn new(name: &str, lines: Vec<SourceLine>) -> Self {
        Unit {
            name: name.to_owned(),
            lines,
        }
    }
}

/// The assembly emitted for one command, or for the bootstrap when
/// `source` is `None`.
#[derive(Clone, Debug)]
pub struct Fragment {
    pub unit: String,
    pub source: Option<SourceLine>,
    pub asm: Vec<String>,
}

/// Translates every unit. Nothing is returned unless all of them
/// parsed and generated cleanly.
pub fn translate(units: &[Unit], options: &Options) -> Result<Vec<Fragment>> {
    let mut ctx = Context::new();
    let mut fragments = Vec::new();

    if options.bootstrap {
        debug!("emitting bootstrap");
        fragments.push(Fragment {
            unit: String::new(),
            source: None,
            asm: codegen::bootstrap(&mut ctx),
        });
    }

    for unit in units {
        info!("translating unit `{}` ({} lines)", unit.name, unit.lines.len());
        ctx.set_unit(&unit.name)?;
        let statements = parser::Parser::new(unit.lines.iter().cloned())
            .run()
            .map_err(|err| {
                error!("in unit `{}`", unit.name);
                err
            })?;
        for statement in statements {
            let asm = codegen::generate(&statement, &mut ctx).map_err(|err| {
                error!("in unit `{}`", unit.name);
                err
            })?;
            trace!("{} -> {} lines", statement.command, asm.len());
            fragments.push(Fragment {
                unit: unit.name.clone(),
                source: Some(statement.source),
                asm,
            });
        }
    }

    info!(
        "translated {} units, {} unique labels",
        units.len(),
        ctx.labels_allocated()
    );
    Ok(fragments)
}

/// Joins fragments into assembly text, one instruction per line.
pub fn render(fragments: &[Fragment]) -> String {
    let mut out = String::new();
    for line in fragments.iter().flat_map(|f| f.asm.iter()) {
        out.push_str(line);
        out.push('\n');
    }
    out
}
