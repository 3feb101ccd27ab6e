//! Reads source units and strips them down to the lines the parsers classify.
//!
//! Both source languages share the same comment syntax: `//` starts a comment
//! that runs to the end of the line. Blank lines and comment-only lines are
//! dropped, but every surviving line keeps its 1-based line number so errors
//! can point back at the original text.
use std::io::{self, BufRead, BufReader, Read};

/// A cleaned, non-blank source line and where it came from.
///
/// `text` is what the parsers classify. `original` is the line as written,
/// minus its comment and surrounding whitespace, and is what errors quote.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
    pub original: String,
}

impl SourceLine {
    pub fn new(number: usize, text: &str) -> Self {
        SourceLine {
            number,
            text: text.to_owned(),
            original: text.to_owned(),
        }
    }
}

/// Reads every line of `reader`. Line terminators are dropped.
pub fn read<T: Read + ?Sized>(reader: Box<T>) -> io::Result<Vec<String>> {
    BufReader::new(reader).lines().collect()
}

/// Returns the part of `line` before any `//` comment.
pub fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Cleans assembly source. Whitespace is insignificant anywhere in an
/// assembly line, so all of it is removed.
pub fn assembly_lines<I, S>(lines: I) -> Vec<SourceLine>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    clean(lines, |code| code.chars().filter(|c| !c.is_whitespace()).collect())
}

/// Cleans VM source. Tokens stay separated, only the ends are trimmed.
pub fn vm_lines<I, S>(lines: I) -> Vec<SourceLine>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    clean(lines, |code| code.trim().to_owned())
}

fn clean<I, S, F>(lines: I, normalize: F) -> Vec<SourceLine>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: Fn(&str) -> String,
{
    lines
        .into_iter()
        .enumerate()
        .filter_map(|(index, line)| {
            let code = strip_comment(line.as_ref());
            let text = normalize(code);
            if text.is_empty() {
                None
            } else {
                Some(SourceLine {
                    number: index + 1,
                    text,
                    original: code.trim().to_owned(),
                })
            }
        })
        .collect()
}
