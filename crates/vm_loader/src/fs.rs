//! The filesystem loading convention from §6: "files whose name is a decimal
//! integer, optionally with an extension, are loaded into RAM starting at the word
//! index given by that integer; file bytes are packed 4-per-word in little-endian
//! order and null-terminated."

use std::fs;
use std::path::{Path, PathBuf};

use crate::LoadError;

/// One file's content, already packed into words and addressed by the RAM word
/// index named by its file name. Applied via [`vm_core::Cpu::write_words_at`].
pub struct FileImage {
    pub path: PathBuf,
    pub word_index: usize,
    pub words: Vec<i32>,
}

/// Scan every regular file directly inside `dir` whose stem parses as a decimal
/// word index, and pack its bytes into the convention's word layout. Files whose
/// name doesn't parse are skipped rather than treated as an error — a project's
/// filesystem can freely hold files the machine isn't meant to see (§6 is a
/// convention the loader opts into, not a constraint on the whole tree).
pub fn load_project(dir: &Path) -> Result<Vec<FileImage>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io { path: dir.to_path_buf(), source })?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io { path: dir.to_path_buf(), source })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(word_index) = word_index_of(&path) else {
            continue;
        };

        let bytes = fs::read(&path).map_err(|source| LoadError::Io { path: path.clone(), source })?;
        images.push(FileImage { words: pack_bytes(&bytes), word_index, path });
    }

    images.sort_by_key(|img| img.word_index);
    Ok(images)
}

/// Parse a file's decimal word index from its stem, ignoring any extension.
fn word_index_of(path: &Path) -> Option<usize> {
    path.file_stem()?.to_str()?.parse().ok()
}

/// Pack raw file bytes 4-per-word, little-endian, with a null terminator appended
/// and the final word zero-padded if the terminated length isn't a multiple of 4.
pub fn pack_bytes(bytes: &[u8]) -> Vec<i32> {
    let mut packed = bytes.to_vec();
    packed.push(0);
    while packed.len() % 4 != 0 {
        packed.push(0);
    }
    packed
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_bytes_null_terminates_and_pads_to_a_word_boundary() {
        // "hello world" is 11 bytes; + 1 null = 12, already a multiple of 4.
        let words = pack_bytes(b"hello world");
        assert_eq!(words.len(), 3);
        let mut bytes = Vec::new();
        for w in &words {
            bytes.extend_from_slice(&w.to_le_bytes());
        }
        assert_eq!(&bytes, b"hello world\0");
    }

    #[test]
    fn pack_bytes_pads_a_partial_final_word() {
        // 4 bytes + null = 5, padded up to 8: two words.
        let words = pack_bytes(b"hi!!");
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn word_index_of_ignores_extension() {
        assert_eq!(word_index_of(Path::new("/tmp/2000.txt")), Some(2000));
        assert_eq!(word_index_of(Path::new("/tmp/2000")), Some(2000));
        assert_eq!(word_index_of(Path::new("/tmp/readme.md")), None);
    }

    #[test]
    fn load_project_skips_non_numeric_files_and_sorts_by_word_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("4008.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("4000.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("notes.md"), b"ignored").unwrap();

        let images = load_project(dir.path()).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].word_index, 4000);
        assert_eq!(images[1].word_index, 4008);
    }
}
