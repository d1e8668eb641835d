//! Output capture helpers: truncation, sanitization, and tar archive
//! handling for code/data staging and `/output/` retrieval.

use std::collections::HashMap;
use std::io::Read;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, SandboxError};

/// Maximum bytes of stdout/stderr captured from the container.
pub const MAX_OUTPUT_BYTES: usize = 64 * 1024;

/// Maximum total bytes of the `/output/` tar archive collected from a
/// container; the download is aborted once this is exceeded.
pub const MAX_OUTPUT_FILES_BYTES: usize = 32 * 1024 * 1024;

static ANSI_ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").unwrap());

static CONTROL_CHAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f]").unwrap());

/// Strip ANSI escape codes and control characters from captured output.
/// Newlines, carriage returns, and tabs are preserved.
pub fn sanitize_output(raw: &str) -> String {
    let no_ansi = ANSI_ESCAPE_RE.replace_all(raw, "");
    CONTROL_CHAR_RE.replace_all(&no_ansi, "").into_owned()
}

/// Truncate `data` to at most `limit` bytes, appending a marker if cut.
pub fn truncate_bytes(data: Vec<u8>, limit: usize) -> Vec<u8> {
    if data.len() <= limit {
        return data;
    }
    let mut truncated = data[..limit].to_vec();
    truncated.extend_from_slice(b"\n... [truncated at 64 KB]\n");
    truncated
}

/// Build an in-memory tar archive from `relative_path -> content`, with
/// every member readable (mode 0o444).
pub fn make_tar(files: &HashMap<String, Vec<u8>>) -> Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o444);
        header.set_cksum();
        builder.append_data(&mut header, name, content.as_slice())?;
    }
    Ok(builder.into_inner()?)
}

/// Extract an in-memory tar archive, rejecting members with absolute paths
/// or `..` components so a malicious container cannot escape the expected
/// output directory.
pub fn extract_tar(data: &[u8]) -> Result<HashMap<String, Vec<u8>>> {
    let mut result = HashMap::new();
    let mut archive = tar::Archive::new(data);
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.to_string_lossy().into_owned();
        if path.starts_with('/') || path.split('/').any(|part| part == "..") {
            tracing::warn!(path = %path, "skipping tar member with suspicious path");
            continue;
        }
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf)?;
        result.insert(path, buf);
    }
    Ok(result)
}

/// Reject path traversal or absolute paths in a staged file's relative path.
pub fn check_safe_relative_path(kind: &'static str, path: &str) -> Result<()> {
    if path.starts_with('/') || path.split('/').any(|part| part == "..") {
        return Err(SandboxError::PathTraversal {
            kind,
            path: path.to_string(),
        });
    }
    Ok(())
}

/// Strip the leading `output/` prefix tar members carry, skipping the
/// directory entry itself (an empty name after stripping).
pub fn strip_output_prefix(files: HashMap<String, Vec<u8>>) -> HashMap<String, Vec<u8>> {
    files
        .into_iter()
        .filter_map(|(name, content)| {
            let clean = name.strip_prefix("output/").unwrap_or(&name).to_string();
            if clean.is_empty() {
                None
            } else {
                Some((clean, content))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_ansi_colors() {
        let raw = "\x1b[31merror\x1b[0m: bad input\n";
        assert_eq!(sanitize_output(raw), "error: bad input\n");
    }

    #[test]
    fn sanitize_keeps_newlines_tabs_crlf() {
        let raw = "a\tb\r\nc\n";
        assert_eq!(sanitize_output(raw), "a\tb\r\nc\n");
    }

    #[test]
    fn sanitize_strips_control_chars() {
        let raw = "ok\x07bell\x00null";
        assert_eq!(sanitize_output(raw), "okbellnull");
    }

    #[test]
    fn truncate_leaves_small_data_untouched() {
        let data = b"hello".to_vec();
        assert_eq!(truncate_bytes(data.clone(), 1024), data);
    }

    #[test]
    fn truncate_appends_marker() {
        let data = vec![b'x'; 100];
        let truncated = truncate_bytes(data, 10);
        assert!(truncated.starts_with(&[b'x'; 10]));
        assert!(String::from_utf8_lossy(&truncated).contains("truncated at 64 KB"));
    }

    #[test]
    fn tar_roundtrip() {
        let mut files = HashMap::new();
        files.insert("a.py".to_string(), b"print(1)".to_vec());
        files.insert("sub/b.txt".to_string(), b"hi".to_vec());
        let archive = make_tar(&files).unwrap();
        let extracted = extract_tar(&archive).unwrap();
        assert_eq!(extracted.get("a.py"), Some(&b"print(1)".to_vec()));
        assert_eq!(extracted.get("sub/b.txt"), Some(&b"hi".to_vec()));
    }

    #[test]
    fn rejects_traversal_path() {
        assert!(check_safe_relative_path("code_files", "../etc/passwd").is_err());
        assert!(check_safe_relative_path("code_files", "/etc/passwd").is_err());
        assert!(check_safe_relative_path("code_files", "a/../../b").is_err());
        assert!(check_safe_relative_path("code_files", "a/b.py").is_ok());
    }

    #[test]
    fn strip_output_prefix_drops_bare_directory_entry() {
        let mut files = HashMap::new();
        files.insert("output/".to_string(), vec![]);
        files.insert("output/result.csv".to_string(), b"1,2,3".to_vec());
        let cleaned = strip_output_prefix(files);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.get("result.csv"), Some(&b"1,2,3".to_vec()));
    }
}
