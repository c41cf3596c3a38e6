//! File type labels used by the summary statistics.
//!
//! A file is labelled by its extension, by a handful of well-known file
//! names, or (for extension-less scripts) by the interpreter named in its
//! shebang line. Config entries override the built-in tables.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const SHEBANG_READ_LEN: usize = 256;

const BUILTIN_EXTENSIONS: &[(&str, &str)] = &[
    ("rs", "Rust"),
    ("js", "JavaScript"),
    ("mjs", "JavaScript"),
    ("cjs", "JavaScript"),
    ("jsx", "JavaScript"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("mts", "TypeScript"),
    ("py", "Python"),
    ("pyi", "Python"),
    ("pyw", "Python"),
    ("go", "Go"),
    ("java", "Java"),
    ("kt", "Kotlin"),
    ("kts", "Kotlin"),
    ("c", "C"),
    ("h", "C"),
    ("cpp", "C++"),
    ("cc", "C++"),
    ("cxx", "C++"),
    ("hpp", "C++"),
    ("hh", "C++"),
    ("cs", "C#"),
    ("swift", "Swift"),
    ("m", "Objective-C"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("lua", "Lua"),
    ("pl", "Perl"),
    ("pm", "Perl"),
    ("sh", "Shell"),
    ("bash", "Shell"),
    ("zsh", "Shell"),
    ("fish", "Shell"),
    ("html", "HTML"),
    ("htm", "HTML"),
    ("css", "CSS"),
    ("scss", "Sass"),
    ("sass", "Sass"),
    ("vue", "Vue"),
    ("svelte", "Svelte"),
    ("json", "JSON"),
    ("yaml", "YAML"),
    ("yml", "YAML"),
    ("toml", "TOML"),
    ("xml", "XML"),
    ("ini", "Config"),
    ("cfg", "Config"),
    ("conf", "Config"),
    ("md", "Markdown"),
    ("markdown", "Markdown"),
    ("txt", "Text"),
    ("rst", "reStructuredText"),
    ("tex", "TeX"),
    ("csv", "CSV"),
    ("sql", "SQL"),
    ("proto", "Protocol Buffers"),
    ("zig", "Zig"),
    ("hs", "Haskell"),
    ("ml", "OCaml"),
    ("ex", "Elixir"),
    ("exs", "Elixir"),
    ("erl", "Erlang"),
    ("clj", "Clojure"),
    ("scala", "Scala"),
    ("dart", "Dart"),
    ("nim", "Nim"),
    ("r", "R"),
    ("jpg", "Image"),
    ("jpeg", "Image"),
    ("png", "Image"),
    ("gif", "Image"),
    ("bmp", "Image"),
    ("tif", "Image"),
    ("tiff", "Image"),
    ("heic", "Image"),
    ("webp", "Image"),
    ("svg", "Image"),
    ("cr2", "Raw Image"),
    ("cr3", "Raw Image"),
    ("nef", "Raw Image"),
    ("arw", "Raw Image"),
    ("dng", "Raw Image"),
    ("wav", "Audio"),
    ("mp3", "Audio"),
    ("flac", "Audio"),
    ("m4a", "Audio"),
    ("m4b", "Audio"),
    ("ogg", "Audio"),
    ("mp4", "Video"),
    ("mov", "Video"),
    ("mkv", "Video"),
    ("webm", "Video"),
    ("3gp", "Video"),
    ("pdf", "PDF"),
    ("zip", "Archive"),
    ("tar", "Archive"),
    ("gz", "Archive"),
    ("xz", "Archive"),
    ("zst", "Archive"),
    ("7z", "Archive"),
];

const BUILTIN_NAMES: &[(&str, &str)] = &[
    ("Makefile", "Makefile"),
    ("makefile", "Makefile"),
    ("GNUmakefile", "Makefile"),
    ("Dockerfile", "Dockerfile"),
    ("CMakeLists.txt", "CMake"),
    ("Justfile", "Justfile"),
    ("justfile", "Justfile"),
];

const BUILTIN_INTERPRETERS: &[(&str, &str)] = &[
    ("sh", "Shell"),
    ("bash", "Shell"),
    ("zsh", "Shell"),
    ("dash", "Shell"),
    ("ksh", "Shell"),
    ("fish", "Shell"),
    ("python", "Python"),
    ("perl", "Perl"),
    ("ruby", "Ruby"),
    ("node", "JavaScript"),
    ("deno", "TypeScript"),
    ("lua", "Lua"),
    ("php", "PHP"),
    ("awk", "Awk"),
    ("tclsh", "Tcl"),
];

/// Extension, file name and interpreter tables.
#[derive(Debug, Clone)]
pub struct FileTypes {
    extensions: HashMap<String, String>,
    names: HashMap<String, String>,
    interpreters: HashMap<String, String>,
}

impl Default for FileTypes {
    fn default() -> Self {
        let owned = |table: &[(&str, &str)]| {
            table
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        Self {
            extensions: owned(BUILTIN_EXTENSIONS),
            names: owned(BUILTIN_NAMES),
            interpreters: owned(BUILTIN_INTERPRETERS),
        }
    }
}

impl FileTypes {
    /// Map `extension` (case-insensitive) to `label`.
    pub fn set_extension(&mut self, extension: &str, label: &str) {
        self.extensions
            .insert(extension.to_lowercase(), label.to_string());
    }

    pub fn set_interpreter(&mut self, interpreter: &str, label: &str) {
        self.interpreters
            .insert(interpreter.to_string(), label.to_string());
    }

    pub fn from_extension(&self, ext: &str) -> Option<&str> {
        self.extensions.get(&ext.to_lowercase()).map(String::as_str)
    }

    pub fn from_interpreter(&self, interpreter: &str) -> Option<&str> {
        if let Some(label) = self.interpreters.get(interpreter) {
            return Some(label.as_str());
        }
        // python3.12 -> python
        let bare = interpreter.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
        self.interpreters.get(bare).map(String::as_str)
    }

    /// Label for the file at `path`. Reads the first line only when the name
    /// has no extension and no well-known name.
    pub fn detect(&self, path: &Path) -> Option<&str> {
        let name = path.file_name()?.to_str()?;
        if let Some(label) = self.names.get(name) {
            return Some(label.as_str());
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.from_extension(ext),
            None => {
                let interpreter = read_shebang(path)?;
                self.from_interpreter(&interpreter)
            }
        }
    }
}

/// Interpreter basename from a `#!` line, looking through `env`.
pub fn read_shebang(path: &Path) -> Option<String> {
    let mut file = File::open(path).ok()?;
    let mut buf = [0u8; SHEBANG_READ_LEN];
    let n = file.read(&mut buf).ok()?;
    parse_shebang(&buf[..n])
}

fn parse_shebang(head: &[u8]) -> Option<String> {
    let line = head.strip_prefix(b"#!")?;
    let end = line.iter().position(|&b| b == b'\n').unwrap_or(line.len());
    let line = std::str::from_utf8(&line[..end]).ok()?;
    let mut words = line.split_whitespace();
    let mut program = Path::new(words.next()?).file_name()?.to_str()?;
    if program == "env" {
        program = words.find(|w| !w.starts_with('-'))?;
    }
    Some(program.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_from_extension_case_insensitive() {
        let types = FileTypes::default();
        assert_eq!(types.from_extension("rs"), Some("Rust"));
        assert_eq!(types.from_extension("RS"), Some("Rust"));
        assert_eq!(types.from_extension("xyz"), None);
    }

    #[test]
    fn test_parse_shebang() {
        assert_eq!(parse_shebang(b"#!/bin/sh\necho"), Some("sh".to_string()));
        assert_eq!(
            parse_shebang(b"#!/usr/bin/env python3\n"),
            Some("python3".to_string())
        );
        assert_eq!(
            parse_shebang(b"#!/usr/bin/env -S node --flag\n"),
            Some("node".to_string())
        );
        assert_eq!(parse_shebang(b"echo hi"), None);
    }

    #[test]
    fn test_versioned_interpreter() {
        let types = FileTypes::default();
        assert_eq!(types.from_interpreter("python3.12"), Some("Python"));
        assert_eq!(types.from_interpreter("bash"), Some("Shell"));
        assert_eq!(types.from_interpreter("unknown"), None);
    }

    #[test]
    fn test_detect() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("deploy");
        fs::write(&script, "#!/usr/bin/env bash\nset -e\n").unwrap();
        let makefile = dir.path().join("Makefile");
        fs::write(&makefile, "all:\n").unwrap();
        let plain = dir.path().join("LICENSE");
        fs::write(&plain, "MIT\n").unwrap();

        let types = FileTypes::default();
        assert_eq!(types.detect(&script), Some("Shell"));
        assert_eq!(types.detect(&makefile), Some("Makefile"));
        assert_eq!(types.detect(&dir.path().join("main.RS")), Some("Rust"));
        assert_eq!(types.detect(&plain), None);
    }

    #[test]
    fn test_overrides() {
        let mut types = FileTypes::default();
        types.set_extension("H", "C++");
        types.set_interpreter("janet", "Janet");
        assert_eq!(types.from_extension("h"), Some("C++"));
        assert_eq!(types.from_interpreter("janet"), Some("Janet"));
    }
}
