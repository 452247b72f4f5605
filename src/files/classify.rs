//! Text/binary classification and language detection.
//!
//! Lookup tables answer the common cases by extension or file name; unknown
//! files fall back to sniffing the first kilobyte, the way `file(1)` and
//! most version-control tools decide whether to diff a file.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of leading bytes inspected by the content sniffer.
pub const SNIFF_LEN: usize = 1024;

/// Markdown file extensions (lowercase).
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkd"];

/// Result of classifying a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Text,
    Binary,
}

// ─────────────────────────────────────────────────────────────────────────────
// Lookup Tables
// ─────────────────────────────────────────────────────────────────────────────

/// Extension → highlight language. Every entry is a text format.
const LANGUAGE_BY_EXTENSION: &[(&str, &str)] = &[
    ("md", "markdown"),
    ("markdown", "markdown"),
    ("mdown", "markdown"),
    ("mkd", "markdown"),
    ("txt", "plaintext"),
    ("text", "plaintext"),
    ("log", "plaintext"),
    ("rs", "rust"),
    ("swift", "swift"),
    ("py", "python"),
    ("rb", "ruby"),
    ("go", "go"),
    ("c", "c"),
    ("h", "c"),
    ("cc", "cpp"),
    ("cpp", "cpp"),
    ("hpp", "cpp"),
    ("m", "objectivec"),
    ("java", "java"),
    ("kt", "kotlin"),
    ("js", "javascript"),
    ("mjs", "javascript"),
    ("jsx", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("html", "html"),
    ("htm", "html"),
    ("xml", "xml"),
    ("svg", "xml"),
    ("css", "css"),
    ("scss", "scss"),
    ("json", "json"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("toml", "toml"),
    ("ini", "ini"),
    ("sh", "bash"),
    ("bash", "bash"),
    ("zsh", "bash"),
    ("fish", "bash"),
    ("sql", "sql"),
    ("lua", "lua"),
    ("php", "php"),
    ("cs", "csharp"),
    ("r", "r"),
    ("tex", "latex"),
    ("csv", "plaintext"),
];

/// Extensionless (or dot) file names that are always text.
const LANGUAGE_BY_FILENAME: &[(&str, &str)] = &[
    ("Makefile", "makefile"),
    ("makefile", "makefile"),
    ("Dockerfile", "dockerfile"),
    ("Gemfile", "ruby"),
    ("Rakefile", "ruby"),
    ("CMakeLists.txt", "cmake"),
    ("LICENSE", "plaintext"),
    ("README", "plaintext"),
    (".gitignore", "plaintext"),
    (".gitattributes", "plaintext"),
    (".editorconfig", "ini"),
    (".env", "bash"),
];

/// Extensions known to hold binary data.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "ico", "bmp", "tiff", "pdf", "zip", "gz", "xz", "bz2",
    "7z", "rar", "tar", "o", "obj", "a", "so", "dylib", "dll", "exe", "class", "jar", "wasm",
    "bin", "sqlite", "db", "h5", "mp3", "mp4", "mov", "woff", "woff2", "ttf", "otf",
];

/// Byte-order marks (UTF-32 first, since its LE mark starts with UTF-16's).
const BOMS: &[&[u8]] = &[
    &[0x00, 0x00, 0xFE, 0xFF],
    &[0xFF, 0xFE, 0x00, 0x00],
    &[0xEF, 0xBB, 0xBF],
    &[0xFE, 0xFF],
    &[0xFF, 0xFE],
];

/// Magic-number prefixes of common binary formats.
const BINARY_MAGIC: &[&[u8]] = &[
    b"\x89PNG\r\n\x1a\n",         // PNG
    &[0xFF, 0xD8, 0xFF],          // JPEG
    b"GIF87a",                    // GIF
    b"GIF89a",                    // GIF
    b"%PDF-",                     // PDF
    b"PK\x03\x04",                // ZIP (also jar, docx, ...)
    &[0x1F, 0x8B],                // gzip
    &[0xFD, b'7', b'z', b'X', b'Z', 0x00], // xz
    b"BZh",                       // bzip2
    b"\x7fELF",                   // ELF
    &[0xFE, 0xED, 0xFA, 0xCE],    // Mach-O 32
    &[0xFE, 0xED, 0xFA, 0xCF],    // Mach-O 64
    &[0xCE, 0xFA, 0xED, 0xFE],    // Mach-O 32, little endian
    &[0xCF, 0xFA, 0xED, 0xFE],    // Mach-O 64, little endian
    &[0xCA, 0xFE, 0xBA, 0xBE],    // Mach-O universal
    b"MZ",                        // Windows PE
    b"Rar!\x1a\x07",              // RAR
    &[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C], // 7-Zip
    b"\x89HDF\r\n\x1a\n",         // HDF5
    b"SQLite format 3\0",         // SQLite
];

// ─────────────────────────────────────────────────────────────────────────────
// Classification
// ─────────────────────────────────────────────────────────────────────────────

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Whether the path has a Markdown extension.
pub fn is_markdown_path(path: &Path) -> bool {
    lowercase_extension(path).is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext.as_str()))
}

/// Highlight language for a path, from the file name or extension tables.
pub fn language_for_path(path: &Path) -> Option<&'static str> {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        if let Some((_, lang)) = LANGUAGE_BY_FILENAME.iter().find(|(n, _)| *n == name) {
            return Some(lang);
        }
    }
    let ext = lowercase_extension(path)?;
    LANGUAGE_BY_EXTENSION
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
}

/// Classify a file using only the lookup tables.
///
/// Returns `None` when the name gives no answer and the contents must be sniffed.
pub fn classify_by_name(path: &Path) -> Option<FileClass> {
    if language_for_path(path).is_some() {
        return Some(FileClass::Text);
    }
    let ext = lowercase_extension(path)?;
    BINARY_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(FileClass::Binary)
}

/// Classify a leading sample of file contents.
pub fn classify_bytes(sample: &[u8]) -> FileClass {
    let sample = &sample[..sample.len().min(SNIFF_LEN)];
    if sample.is_empty() {
        return FileClass::Text;
    }
    if BOMS.iter().any(|bom| sample.starts_with(bom)) {
        return FileClass::Text;
    }
    if BINARY_MAGIC.iter().any(|magic| sample.starts_with(magic)) {
        return FileClass::Binary;
    }
    if sample.contains(&0) {
        FileClass::Binary
    } else {
        FileClass::Text
    }
}

/// Classify a file on disk: lookup tables first, then a content sniff.
///
/// Unreadable files are reported as binary so callers never try to render them.
pub fn classify_path(path: &Path) -> FileClass {
    if let Some(class) = classify_by_name(path) {
        return class;
    }

    let mut sample = Vec::with_capacity(SNIFF_LEN);
    match File::open(path).and_then(|f| f.take(SNIFF_LEN as u64).read_to_end(&mut sample)) {
        Ok(_) => classify_bytes(&sample),
        Err(e) => {
            log::debug!("Could not sniff {}: {}", path.display(), e);
            FileClass::Binary
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
