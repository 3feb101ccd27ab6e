extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate term_grid;

/// Builds a lazily compiled regex from a literal pattern.
macro_rules! regex {
    ($re:expr) => {
        Lazy::new(|| Regex::new($re).expect("All regexes should compile"))
    };
}

pub mod assembler;
pub mod error;
pub mod source;
pub mod translator;
#[cfg(test)]
mod emulator;

use clap::{Arg, ArgMatches, App, AppSettings, SubCommand};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use error::{Error, Result};
use translator::{Options, Unit};

fn main() {
    let args = process_arguments();
    let verbosity = match args.subcommand() {
        (_, Some(sub)) => sub.occurrences_of("verbose").max(args.occurrences_of("verbose")),
        _ => args.occurrences_of("verbose"),
    };
    initialize_logging(verbosity);

    let outcome = match args.subcommand() {
        ("asm", Some(sub)) => run_assembler(sub),
        ("vm", Some(sub)) => run_translator(sub),
        _ => unreachable!("clap requires a subcommand"),
    };

    if let Err(err) = outcome {
        error!("fatal: {}", err);
        std::process::exit(1);
    }
}

fn run_assembler(args: &ArgMatches) -> Result<()> {
    let ipath = Path::new(args.value_of("INPUT").unwrap());
    debug!("Arguments:\n\tInfile: {}\n\tOutfile: {}\n\tPrint Debug: {}",
        ipath.display(),
        args.value_of("output").unwrap_or("None"),
        args.is_present("print-debug")
    );

    if ipath.extension().map_or(true, |ext| ext != "asm") {
        warn!("input file `{}` does not end with `.asm`", ipath.display());
    }

    let lines = read_source(ipath)?;
    let encoded = assembler::assemble(source::assembly_lines(lines))?;

    if args.is_present("print-debug") {
        let mut grid = Grid::new(GridOptions {
            filling:     Filling::Spaces(1),
            direction:   Direction::LeftToRight,
        });

        for word in encoded.iter() {
            grid.add(Cell::from(format!("0x{:04X}:", word.rom_address)));
            grid.add(Cell::from(word.source.text.clone()));
            grid.add(Cell::from("=>".to_string()));
            grid.add(Cell::from(word.bits.clone()));
        }

        println!("{}", grid.fit_into_columns(4));
    }

    let opath = match args.value_of("output") {
        Some(filename) => PathBuf::from(filename),
        None => ipath.with_extension("hack"),
    };

    let mut out = String::with_capacity(encoded.len() * 17);
    for word in encoded.iter() {
        out.push_str(&word.bits);
        out.push('\n');
    }
    write_output(&opath, &out)?;
    info!("wrote {} words to `{}`", encoded.len(), opath.display());
    Ok(())
}

fn run_translator(args: &ArgMatches) -> Result<()> {
    let ipath = Path::new(args.value_of("INPUT").unwrap());
    let options = Options {
        bootstrap: args.is_present("bootstrap"),
    };
    debug!("Arguments:\n\tInput: {}\n\tOutfile: {}\n\tBootstrap: {}\n\tPrint Debug: {}",
        ipath.display(),
        args.value_of("output").unwrap_or("None"),
        options.bootstrap,
        args.is_present("print-debug")
    );

    let files = vm_files(ipath)?;
    let mut units = Vec::with_capacity(files.len());
    for file in files.iter() {
        let name = file.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        units.push(Unit::new(&name, source::vm_lines(read_source(file)?)));
    }

    let fragments = translator::translate(&units, &options)?;

    if args.is_present("print-debug") {
        let mut grid = Grid::new(GridOptions {
            filling:     Filling::Spaces(1),
            direction:   Direction::LeftToRight,
        });

        for fragment in fragments.iter() {
            let (line, text) = match &fragment.source {
                Some(source) => (source.number.to_string(), source.text.clone()),
                None => ("-".to_string(), "(bootstrap)".to_string()),
            };
            grid.add(Cell::from(format!("{}:{}", fragment.unit, line)));
            grid.add(Cell::from(text));
            grid.add(Cell::from("=>".to_string()));
            grid.add(Cell::from(format!("{} instructions", fragment.asm.len())));
        }

        println!("{}", grid.fit_into_columns(4));
    }

    let opath = match args.value_of("output") {
        Some(filename) => PathBuf::from(filename),
        None if ipath.is_dir() => {
            let name = ipath.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "out".to_string());
            ipath.join(format!("{}.asm", name))
        },
        None => ipath.with_extension("asm"),
    };

    write_output(&opath, &translator::render(&fragments))?;
    info!("wrote {} units to `{}`", units.len(), opath.display());
    Ok(())
}

/// Resolves the `.vm` files named by `path`, a single file or a directory.
/// Directory entries are sorted so unit order does not depend on the
/// filesystem.
fn vm_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        if path.extension().map_or(true, |ext| ext != "vm") {
            warn!("input file `{}` does not end with `.vm`", path.display());
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let entries = fs::read_dir(path).map_err(|err| Error::file_access(path, err))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| Error::file_access(path, err))?;
        let file = entry.path();
        if file.is_file() && file.extension().map_or(false, |ext| ext == "vm") {
            files.push(file);
        }
    }
    files.sort();

    if files.is_empty() {
        warn!("no `.vm` files found in `{}`", path.display());
    }
    Ok(files)
}

fn read_source(path: &Path) -> Result<Vec<String>> {
    // Open the path in read-only mode, returns `io::Result<File>`
    let file = File::open(path).map_err(|err| Error::file_access(path, err))?;
    debug!("reading `{}`", path.display());
    source::read(Box::new(file)).map_err(|err| Error::file_access(path, err))
}

/// Output is written in one go, after translation has fully succeeded.
fn write_output(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|err| Error::file_access(path, err))
}

fn process_arguments() -> ArgMatches<'static> {
    let output = Arg::with_name("output")
        .short("o")
        .takes_value(true)
        .help("write output to an outfile");
    let print_debug = Arg::with_name("print-debug")
        .short("d")
        .alias("show")
        .alias("s")
        .takes_value(false)
        .help("prints the debug information alongside the output to STDOUT");

    App::new(option_env!("CARGO_PKG_NAME").unwrap())
        .version(option_env!("CARGO_PKG_VERSION").unwrap())
        .author(option_env!("CARGO_PKG_AUTHORS").unwrap())
        .about(option_env!("CARGO_PKG_DESCRIPTION").unwrap())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .global(true)
            .help("Sets the level of verbosity"))
        .subcommand(SubCommand::with_name("asm")
            .about("assembles a .asm file into .hack binary text")
            .arg(Arg::with_name("INPUT")
                .help("Sets the input file to use")
                .required(true)
                .multiple(false)
                .index(1))
            .arg(output.clone())
            .arg(print_debug.clone()))
        .subcommand(SubCommand::with_name("vm")
            .about("translates a .vm file, or a directory of them, into .asm")
            .arg(Arg::with_name("INPUT")
                .help("Sets the input file or directory to use")
                .required(true)
                .multiple(false)
                .index(1))
            .arg(Arg::with_name("bootstrap")
                .short("b")
                .long("bootstrap")
                .takes_value(false)
                .help("emit startup code that calls Sys.init"))
            .arg(output)
            .arg(print_debug))
        .get_matches()
}

fn initialize_logging(verbosity: u64) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(match verbosity {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            3 | _ => log::LevelFilter::Debug,
        })
        .chain(std::io::stdout())
        .apply().ok();
}
