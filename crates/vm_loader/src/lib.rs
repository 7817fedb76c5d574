//! Loading conventions around the virtual machine core (§6 of the spec): turning
//! files on disk into word images. None of this is part of the core — `vm_core`
//! never touches a filesystem — it is the thin "for loaders, not core" layer the
//! spec calls out explicitly.

pub mod fs;
pub mod program;

pub use fs::{load_project, FileImage};
pub use program::load_program_words;

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use vm_core::Cpu;

/// Apply every loaded [`FileImage`] to `cpu`'s RAM, in the order they were loaded
/// (`load_project` returns them sorted by word index, low to high).
pub fn apply_to(cpu: &mut Cpu, images: &[FileImage]) {
    for image in images {
        cpu.write_words_at(image.word_index, &image.words);
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("{}:{line}: {text:?} is not a valid 32-bit signed integer word", path.display())]
    InvalidWord { path: PathBuf, line: usize, text: String },
}
