//! Loading a literal program-word file (§6: "a sequence of 32-bit signed integer
//! words ... No header, no relocation."). The core takes the word stream directly
//! via [`vm_core::Cpu::load_program`]; this is just the text-file convention
//! `vm_cli` reads from disk, since an assembler is out of scope (§1).
//!
//! One decimal `i32` per whitespace-separated token. A `#` starts a line comment,
//! letting a hand-written word program carry the opcode names as annotations.

use std::fs;
use std::path::Path;

use crate::LoadError;

/// Read `path` and parse it as a flat sequence of decimal 32-bit words.
pub fn load_program_words(path: &Path) -> Result<Vec<i32>, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;

    let mut words = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = match line.split_once('#') {
            Some((code, _comment)) => code,
            None => line,
        };
        for token in line.split_whitespace() {
            let word = token.parse::<i32>().map_err(|_| LoadError::InvalidWord {
                path: path.to_path_buf(),
                line: line_no + 1,
                text: token.to_owned(),
            })?;
            words.push(word);
        }
    }
    Ok(words)
}
