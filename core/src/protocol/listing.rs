//! LIST response parser.
//!
//! FTP servers answer LIST with free-form text. Two layouts cover nearly
//! everything in the wild:
//!
//! 1. Unix `ls -l`: `-rw-r--r-- 1 owner group 1234 Jan  1 12:00 file.txt`
//! 2. Windows/IIS: `01-01-26  12:00AM       1234 file.txt`
//!
//! Lines matching neither become [`EntryKind::Unknown`] entries carrying
//! only the name, so a listing never fails outright on an odd server.

use std::sync::OnceLock;

use regex::Regex;

/// Kind of a remote directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Unknown,
}

/// One parsed line of a remote directory listing.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Size in bytes, -1 when the listing did not state one.
    pub size: i64,
    /// Permission string as printed by the server (`-rw-r--r--`), when given.
    pub permissions: Option<String>,
    /// Modification time as printed by the server, kept verbatim.
    pub modified: Option<String>,
    /// Symlink target as printed after `->`, unresolved.
    pub link_target: Option<String>,
}

impl RemoteEntry {
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }
}

/// Parse a full multi-line LIST response, dropping `.` and `..`.
pub fn parse_listing(raw_lines: &[String]) -> Vec<RemoteEntry> {
    raw_lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with("total "))
        .filter_map(parse_line)
        .filter(|e| e.name != "." && e.name != "..")
        .collect()
}

fn parse_line(line: &str) -> Option<RemoteEntry> {
    if let Some(entry) = parse_unix(line) {
        return Some(entry);
    }
    if let Some(entry) = parse_windows(line) {
        return Some(entry);
    }
    // Fallback: the whole line is a name we know nothing else about.
    Some(RemoteEntry {
        name: line.to_string(),
        kind: EntryKind::Unknown,
        size: -1,
        permissions: None,
        modified: None,
        link_target: None,
    })
}

/// Parse a Unix `ls -l` line:
/// ```text
/// drwxr-xr-x   2 user group  4096 Jan  1 12:00 dirname
/// -rw-r--r--   1 user group  1234 Jan  1  2025 file.txt
/// lrwxrwxrwx   1 user group    42 Jan  1 12:00 link -> target
/// ```
fn parse_unix(line: &str) -> Option<RemoteEntry> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^([dlcbps-][rwxsStT-]{9})\s+   # permissions
            \d+\s+                          # link count
            \S+\s+                          # owner
            \S+\s+                          # group
            (\d+)\s+                        # size
            (\w{3}\s+\d{1,2}\s+[\d:]+)\s+   # date
            (.+)$                           # name (possibly with -> target)
            ",
        )
        .expect("unix LIST pattern is valid")
    });

    let caps = re.captures(line)?;
    let perms = caps.get(1)?.as_str();
    let size = caps.get(2)?.as_str().parse::<i64>().unwrap_or(-1);
    let modified = caps.get(3)?.as_str().to_string();
    let name_raw = caps.get(4)?.as_str();

    let kind = match perms.as_bytes().first() {
        Some(b'd') => EntryKind::Directory,
        Some(b'l') => EntryKind::Symlink,
        Some(b'-') => EntryKind::File,
        _ => EntryKind::Unknown,
    };

    let (name, link_target) = if kind == EntryKind::Symlink {
        match name_raw.find(" -> ") {
            Some(pos) => (
                name_raw[..pos].to_string(),
                Some(name_raw[pos + 4..].to_string()),
            ),
            None => (name_raw.to_string(), None),
        }
    } else {
        (name_raw.to_string(), None)
    };

    Some(RemoteEntry {
        name,
        kind,
        size,
        permissions: Some(perms.to_string()),
        modified: Some(modified),
        link_target,
    })
}

/// Parse a Windows/IIS line:
/// ```text
/// 01-01-26  12:00AM       1234 file.txt
/// 01-01-26  12:00PM      <DIR> Directory Name
/// ```
fn parse_windows(line: &str) -> Option<RemoteEntry> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^(\d{2}-\d{2}-\d{2})\s+        # date
            (\d{1,2}:\d{2}(?:AM|PM)?)\s+   # time
            (<DIR>|\d+)\s+                 # size or <DIR>
            (.+)$                          # name
            ",
        )
        .expect("windows LIST pattern is valid")
    });

    let caps = re.captures(line)?;
    let date = caps.get(1)?.as_str();
    let time = caps.get(2)?.as_str();
    let size_or_dir = caps.get(3)?.as_str();
    let name = caps.get(4)?.as_str().to_string();

    let (kind, size) = if size_or_dir == "<DIR>" {
        (EntryKind::Directory, -1)
    } else {
        (EntryKind::File, size_or_dir.parse::<i64>().unwrap_or(-1))
    };

    Some(RemoteEntry {
        name,
        kind,
        size,
        permissions: None,
        modified: Some(format!("{date} {time}")),
        link_target: None,
    })
}
