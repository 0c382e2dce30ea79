//! Normalized path values.
//!
//! [`PathValue`] is the canonical addressing scheme used throughout the
//! engine. Separator, whitespace, and dot-segment normalization happens once
//! at construction; every derived operation works on already-normalized
//! state and never re-validates those rules. Platform-native path strings
//! never cross the engine boundary; collaborators exchange `PathValue`s.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DocmillError, Result};

/// Whether a path is anchored at a filesystem root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    Absolute,
    Relative,
}

/// Case-sensitivity mode for path equality, ordering, and hashing.
///
/// Some platforms treat `a.txt` and `A.TXT` as the same file, so comparisons
/// are parameterized rather than fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PathComparison {
    #[default]
    Ordinal,
    OrdinalIgnoreCase,
}

/// Characters removed from file names by [`optimize_file_name`].
pub const OPTIMIZE_RESERVED_CHARS: &str = "_~:/\\?#[]@!$&'()*+,;=}{|%\"^<>";

/// A normalized, platform-aware path.
///
/// A `PathValue` is either the null sentinel (no backing string — distinct
/// from the empty path) or a normalized string plus its kind. The value is
/// immutable; all derived operations return new values.
#[derive(Debug, Clone)]
pub struct PathValue {
    full_path: Option<String>,
    kind: PathKind,
    root_len: usize,
}

impl PathValue {
    /// The null path sentinel. Not equal to the empty path.
    pub fn null() -> Self {
        Self {
            full_path: None,
            kind: PathKind::Relative,
            root_len: 0,
        }
    }

    /// The empty relative path.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Build a path from a string, inferring the kind from the root.
    /// Never fails: any string input has a normalized form.
    pub fn new(path: &str) -> Self {
        Self::build(path, None)
    }

    /// Build a path with an explicit kind, overriding root inference.
    pub fn with_kind(path: &str, kind: PathKind) -> Self {
        Self::build(path, Some(kind))
    }

    fn build(path: &str, kind: Option<PathKind>) -> Self {
        let (full_path, root_len) = normalize(path);
        let inferred = if root_len > 0 {
            PathKind::Absolute
        } else {
            PathKind::Relative
        };
        Self {
            full_path: Some(full_path),
            kind: kind.unwrap_or(inferred),
            root_len,
        }
    }

    // -----------------------------------------------------------------------
    // State accessors
    // -----------------------------------------------------------------------

    pub fn is_null(&self) -> bool {
        self.full_path.is_none()
    }

    /// True for the empty (but non-null) path.
    pub fn is_empty(&self) -> bool {
        self.full_path.as_deref() == Some("")
    }

    pub fn is_absolute(&self) -> bool {
        !self.is_null() && self.kind == PathKind::Absolute
    }

    pub fn is_relative(&self) -> bool {
        !self.is_null() && self.kind == PathKind::Relative
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    /// The normalized backing string, or `None` for the null path.
    pub fn full_path(&self) -> Option<&str> {
        self.full_path.as_deref()
    }

    /// Path segments, excluding the root. Empty for the null path, the empty
    /// path, and bare roots.
    pub fn segments(&self) -> Vec<&str> {
        match self.full_path.as_deref() {
            None => Vec::new(),
            Some(full) => full[self.root_len..]
                .split('/')
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    fn last_segment(&self) -> Option<&str> {
        self.segments().into_iter().next_back()
    }

    // -----------------------------------------------------------------------
    // Derived paths
    // -----------------------------------------------------------------------

    /// The root of an absolute path (`/` or a drive root); empty for
    /// relative paths, null for the null path.
    pub fn root(&self) -> PathValue {
        if self.is_null() {
            return Self::null();
        }
        if self.kind == PathKind::Relative || self.root_len == 0 {
            return Self::empty();
        }
        let Some(full) = self.full_path.as_deref() else {
            return Self::null();
        };
        Self::new(&full[..self.root_len])
    }

    /// The path with its root stripped; relative paths return themselves.
    pub fn root_relative(&self) -> PathValue {
        if self.is_null() {
            return Self::null();
        }
        if self.kind == PathKind::Relative {
            return self.clone();
        }
        let Some(full) = self.full_path.as_deref() else {
            return Self::null();
        };
        Self::new(&full[self.root_len..])
    }

    /// The containing path. An absolute root has no parent (null); a
    /// single-segment relative path yields the empty path.
    pub fn parent(&self) -> PathValue {
        let Some(full) = self.full_path.as_deref() else {
            return Self::null();
        };
        let segments = self.segments();
        match segments.len() {
            0 => {
                if self.is_absolute() {
                    Self::null()
                } else {
                    Self::empty()
                }
            }
            1 => {
                if self.root_len > 0 {
                    Self::new(&full[..self.root_len])
                } else {
                    Self::empty()
                }
            }
            n => {
                let root = &full[..self.root_len];
                Self::new(&format!("{root}{}", segments[..n - 1].join("/")))
            }
        }
    }

    /// The final segment, or the root itself for bare roots (`/` stays `/`,
    /// a drive root loses its trailing slash).
    pub fn name(&self) -> &str {
        let Some(full) = self.full_path.as_deref() else {
            return "";
        };
        if let Some(last) = self.last_segment() {
            return last;
        }
        let root = &full[..self.root_len];
        if root == "/" {
            root
        } else {
            root.trim_end_matches('/')
        }
    }

    /// The final segment as a relative path; empty when there is none.
    pub fn file_name(&self) -> PathValue {
        match self.last_segment() {
            Some(name) => Self::new(name),
            None => Self::empty(),
        }
    }

    /// The final segment minus its extension; empty for dot-files.
    pub fn file_name_without_extension(&self) -> PathValue {
        let Some(name) = self.last_segment() else {
            return Self::empty();
        };
        match name.rfind('.') {
            Some(idx) => Self::new(&name[..idx]),
            None => Self::new(name),
        }
    }

    /// The extension of the final segment including the leading dot, or
    /// `None` when there is no extension.
    pub fn extension(&self) -> Option<&str> {
        let name = self.last_segment()?;
        let idx = name.rfind('.')?;
        if idx == name.len() - 1 {
            return None;
        }
        Some(&name[idx..])
    }

    pub fn has_extension(&self) -> bool {
        self.extension().is_some()
    }

    /// Replace the final segment entirely.
    pub fn change_file_name(&self, file_name: &str) -> PathValue {
        let Some(full) = self.full_path.as_deref() else {
            return Self::null();
        };
        let segments = self.segments();
        let root = &full[..self.root_len];
        if segments.len() <= 1 {
            return Self::new(&format!("{root}{file_name}"));
        }
        Self::new(&format!(
            "{root}{}/{file_name}",
            segments[..segments.len() - 1].join("/")
        ))
    }

    /// Replace the extension; `None` removes it, `Some("")` leaves a bare
    /// trailing dot. A leading dot on the new extension is optional.
    pub fn change_extension(&self, extension: Option<&str>) -> PathValue {
        if self.is_null() {
            return Self::null();
        }
        let name = self.last_segment().unwrap_or("");
        let stem = match name.rfind('.') {
            Some(idx) => &name[..idx],
            None => name,
        };
        let new_name = match extension {
            None => stem.to_string(),
            Some(ext) => {
                let ext = ext.strip_prefix('.').unwrap_or(ext);
                format!("{stem}.{ext}")
            }
        };
        self.change_file_name(&new_name)
    }

    /// Append an extension after any existing one (`a.txt` + `dat` →
    /// `a.txt.dat`).
    pub fn append_extension(&self, extension: &str) -> PathValue {
        if self.is_null() {
            return Self::null();
        }
        let ext = extension.strip_prefix('.').unwrap_or(extension);
        let name = self.last_segment().unwrap_or("");
        self.change_file_name(&format!("{name}.{ext}"))
    }

    /// Insert text at the start of the file-name stem.
    pub fn insert_prefix(&self, prefix: &str) -> PathValue {
        if self.is_null() {
            return Self::null();
        }
        let name = self.last_segment().unwrap_or("");
        self.change_file_name(&format!("{prefix}{name}"))
    }

    /// Insert text between the file-name stem and the final extension.
    pub fn insert_suffix(&self, suffix: &str) -> PathValue {
        if self.is_null() {
            return Self::null();
        }
        let name = self.last_segment().unwrap_or("");
        match name.rfind('.') {
            Some(idx) => {
                self.change_file_name(&format!("{}{suffix}{}", &name[..idx], &name[idx..]))
            }
            None => self.change_file_name(&format!("{name}{suffix}")),
        }
    }

    // -----------------------------------------------------------------------
    // Combination
    // -----------------------------------------------------------------------

    /// Combine with another path. An absolute second operand replaces this
    /// path entirely; otherwise the operands concatenate and re-normalize.
    pub fn combine(&self, other: &PathValue) -> Result<PathValue> {
        let Some(full) = self.full_path.as_deref() else {
            return Err(DocmillError::argument("cannot combine a null path"));
        };
        let Some(other_full) = other.full_path.as_deref() else {
            return Err(DocmillError::argument("cannot combine with a null path"));
        };
        if other.is_absolute() {
            return Ok(other.clone());
        }
        if full.is_empty() {
            return Ok(other.clone());
        }
        Ok(Self::with_kind(
            &format!("{full}/{other_full}"),
            self.kind,
        ))
    }

    /// Combine as a file path: only the file name of the second operand is
    /// used, any directory portion is dropped.
    pub fn get_file_path(&self, other: &PathValue) -> Result<PathValue> {
        if other.is_null() {
            return Err(DocmillError::argument(
                "cannot take a file path from a null path",
            ));
        }
        self.combine(&other.file_name())
    }

    /// True when `other` is directly contained in this path (exactly one
    /// segment deeper).
    pub fn contains_child(&self, other: &PathValue) -> bool {
        self.contains_at_depth(other, Some(1))
    }

    /// True when `other` is contained anywhere below this path.
    pub fn contains_descendant(&self, other: &PathValue) -> bool {
        self.contains_at_depth(other, None)
    }

    fn contains_at_depth(&self, other: &PathValue, depth: Option<usize>) -> bool {
        let (Some(full), Some(other_full)) =
            (self.full_path.as_deref(), other.full_path.as_deref())
        else {
            return false;
        };
        if self.kind != other.kind || full[..self.root_len] != other_full[..other.root_len] {
            return false;
        }
        let ours = self.segments();
        let theirs = other.segments();
        if theirs.len() <= ours.len() {
            return false;
        }
        if let Some(depth) = depth {
            if theirs.len() != ours.len() + depth {
                return false;
            }
        }
        ours.iter().zip(&theirs).all(|(a, b)| a == b)
    }

    // -----------------------------------------------------------------------
    // Equality, ordering, hashing
    // -----------------------------------------------------------------------

    /// Equality under an explicit comparison mode. A relative and an
    /// absolute path are never equal, even with identical tails. Two null
    /// paths are equal; null never equals non-null.
    pub fn equals(&self, other: &PathValue, comparison: PathComparison) -> bool {
        match (self.full_path.as_deref(), other.full_path.as_deref()) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                self.kind == other.kind
                    && match comparison {
                        PathComparison::Ordinal => a == b,
                        PathComparison::OrdinalIgnoreCase => {
                            a.to_lowercase() == b.to_lowercase()
                        }
                    }
            }
            _ => false,
        }
    }

    /// Hash consistent with [`PathValue::equals`] under the same mode.
    pub fn hash_code(&self, comparison: PathComparison) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.kind.hash(&mut hasher);
        match (self.full_path.as_deref(), comparison) {
            (None, _) => 0u8.hash(&mut hasher),
            (Some(s), PathComparison::Ordinal) => s.hash(&mut hasher),
            (Some(s), PathComparison::OrdinalIgnoreCase) => s.to_lowercase().hash(&mut hasher),
        }
        hasher.finish()
    }

    /// Ordering under an explicit comparison mode; `None` when either path
    /// is null or the kinds differ.
    pub fn compare(&self, other: &PathValue, comparison: PathComparison) -> Option<Ordering> {
        let (Some(a), Some(b)) = (self.full_path.as_deref(), other.full_path.as_deref()) else {
            return None;
        };
        if self.kind != other.kind {
            return None;
        }
        Some(match comparison {
            PathComparison::Ordinal => a.cmp(b),
            PathComparison::OrdinalIgnoreCase => a.to_lowercase().cmp(&b.to_lowercase()),
        })
    }

    // -----------------------------------------------------------------------
    // Slug optimization
    // -----------------------------------------------------------------------

    /// Apply [`optimize_file_name`] to the file-name portion, keeping the
    /// directory part untouched.
    pub fn optimize_file_name(&self) -> PathValue {
        if self.is_null() {
            return Self::null();
        }
        let Some(name) = self.last_segment() else {
            return self.clone();
        };
        let optimized = optimize_file_name(name);
        self.change_file_name(&optimized)
    }
}

impl PartialEq for PathValue {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, PathComparison::Ordinal)
    }
}

impl Eq for PathValue {}

impl Hash for PathValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.full_path.hash(state);
    }
}

impl fmt::Display for PathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_path.as_deref().unwrap_or(""))
    }
}

impl From<&str> for PathValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for PathValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.full_path.as_deref() {
            Some(full) => serializer.serialize_str(full),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for PathValue {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            Some(s) => PathValue::new(&s),
            None => PathValue::null(),
        })
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Length of the root prefix: `/`, or a drive root (`c:`, `c:/`) when
/// compiled for Windows.
fn detect_root(s: &str) -> usize {
    if cfg!(windows) {
        let bytes = s.as_bytes();
        if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
            return if bytes.len() >= 3 && bytes[2] == b'/' {
                3
            } else {
                2
            };
        }
    }
    if s.starts_with('/') { 1 } else { 0 }
}

/// Normalize a raw path string; returns the normalized form and the length
/// of its root prefix.
///
/// Rules: both separators rewrite to `/`; the overall string is trimmed of
/// tabs and line breaks (spaces are significant path characters); repeated
/// and trailing slashes collapse; a leading `./` is stripped unless the
/// remainder would be empty; `.` segments vanish; `..` cancels a preceding
/// real segment when one exists and is otherwise kept, so a path can end up
/// with more `..` segments than it had real ones to cancel.
fn normalize(path: &str) -> (String, usize) {
    let replaced = path.replace('\\', "/");
    let trimmed = replaced.trim_matches(|c| matches!(c, '\t' | '\r' | '\n'));
    let root_len = detect_root(trimmed);
    let root = &trimmed[..root_len];
    let rest = &trimmed[root_len..];

    let mut segments: Vec<&str> = Vec::new();
    let mut saw_dot = false;
    for segment in rest.split('/') {
        match segment {
            "" => {}
            "." => saw_dot = true,
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let mut full = String::with_capacity(trimmed.len());
    full.push_str(root);
    if segments.is_empty() {
        // "." and "./" keep their current-directory meaning
        if root.is_empty() && saw_dot {
            full.push('.');
        }
    } else {
        full.push_str(&segments.join("/"));
    }
    (full, root_len)
}

// ---------------------------------------------------------------------------
// File-name optimization
// ---------------------------------------------------------------------------

/// Produce a URL- and filesystem-safe slug from a file name: lowercase,
/// reserved characters removed, whitespace and `-` runs collapsed to a
/// single `-`, separators trimmed from both ends, trailing dots trimmed.
/// Dots inside the name (including the extension) are preserved.
pub fn optimize_file_name(file_name: &str) -> String {
    optimize_file_name_with(file_name, OPTIMIZE_RESERVED_CHARS, true)
}

/// [`optimize_file_name`] with a custom reserved-character set and control
/// over trailing-dot trimming.
pub fn optimize_file_name_with(file_name: &str, reserved: &str, trim_dot: bool) -> String {
    let trimmed = file_name.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c.is_whitespace() || c == '-' {
            if !out.ends_with('-') {
                out.push('-');
            }
            continue;
        }
        if reserved.contains(c) {
            continue;
        }
        for lower in c.to_lowercase() {
            out.push(lower);
        }
    }

    let mut slug = out.trim_matches('-').to_string();
    if trim_dot {
        loop {
            let before = slug.len();
            while slug.ends_with('.') {
                slug.pop();
            }
            let kept = slug.trim_end_matches('-').len();
            slug.truncate(kept);
            if slug.len() == before {
                break;
            }
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- construction -------------------------------------------------------

    #[test]
    fn null_is_distinct_from_empty() {
        let null = PathValue::null();
        let empty = PathValue::empty();
        assert!(null.is_null());
        assert!(!null.is_empty());
        assert!(!empty.is_null());
        assert!(empty.is_empty());
        assert!(!null.equals(&empty, PathComparison::Ordinal));
        assert!(null.equals(&PathValue::null(), PathComparison::Ordinal));
    }

    #[test]
    fn empty_path() {
        let path = PathValue::new("");
        assert_eq!(path.full_path(), Some(""));
        assert!(path.segments().is_empty());
        assert!(path.is_relative());
    }

    #[test]
    fn whitespace_is_a_valid_segment() {
        let path = PathValue::new(" ");
        assert_eq!(path.full_path(), Some(" "));
        assert!(!path.is_empty());
        assert_eq!(path.segments(), vec![" "]);
    }

    #[test]
    fn trims_control_whitespace_but_keeps_spaces() {
        assert_eq!(PathValue::new("\t ").full_path(), Some(" "));
        assert_eq!(
            PathValue::new("\t\r\nshaders/basic ").full_path(),
            Some("shaders/basic ")
        );
        assert_eq!(
            PathValue::new("my awesome shaders/basic").full_path(),
            Some("my awesome shaders/basic")
        );
    }

    #[test]
    fn normalizes_separators() {
        assert_eq!(
            PathValue::new("shaders\\basic").full_path(),
            Some("shaders/basic")
        );
        assert_eq!(PathValue::new("\\").full_path(), Some("/"));
        assert!(PathValue::new("\\").is_absolute());
    }

    #[test]
    fn removes_trailing_slashes() {
        for (input, expected) in [
            ("/Hello/World/", "/Hello/World"),
            ("\\Hello\\World\\", "/Hello/World"),
            ("file.txt/", "file.txt"),
            ("file.txt\\", "file.txt"),
            ("Temp/file.txt/", "Temp/file.txt"),
        ] {
            assert_eq!(PathValue::new(input).full_path(), Some(expected));
        }
    }

    #[test]
    fn keeps_single_root_slash() {
        assert_eq!(PathValue::new("/").full_path(), Some("/"));
        assert!(PathValue::new("/").segments().is_empty());
    }

    #[test]
    fn removes_relative_prefix() {
        for (input, expected) in [
            ("./Hello/World/", "Hello/World"),
            (".\\Hello/World/", "Hello/World"),
            ("./file.txt", "file.txt"),
            ("./Temp/file.txt", "Temp/file.txt"),
        ] {
            assert_eq!(PathValue::new(input).full_path(), Some(expected));
        }
    }

    #[test]
    fn current_directory_survives_alone() {
        assert_eq!(PathValue::new("./").full_path(), Some("."));
        assert_eq!(PathValue::new(".").full_path(), Some("."));
    }

    #[test]
    fn collapses_dot_segments() {
        for (input, expected) in [
            ("hello/temp/test/../world", "hello/temp/world"),
            ("../hello/temp/test/../world", "../hello/temp/world"),
            ("hello/temp/test/../../world", "hello/world"),
            ("hello/temp/../temp2/../world", "hello/world"),
            ("/hello/temp/test/../../world", "/hello/world"),
            ("/hello/../../../../../../temp", "/../../../../../temp"),
            ("/hello/../../foo/../../../../temp", "/../../../../temp"),
            ("..", ".."),
            ("/..", "/.."),
            ("/.", "/"),
            ("a/./b", "a/b"),
            ("/a/./b", "/a/b"),
            ("a/b/.", "a/b"),
            ("/./a/b", "/a/b"),
            ("/././a/b", "/a/b"),
            ("/a/b/c/../d/baz.txt", "/a/b/d/baz.txt"),
            ("../d/baz.txt", "../d/baz.txt"),
            ("../a/b/c/../d/baz.txt", "../a/b/d/baz.txt"),
        ] {
            assert_eq!(PathValue::new(input).full_path(), Some(expected), "{input}");
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        for input in [
            "/hello/../../../../../../temp",
            "a/b/c/",
            "./x",
            ".",
            "/",
            "",
            " ",
            "my awesome shaders/basic ",
            "/a/./b/../c",
        ] {
            let once = PathValue::new(input);
            let twice = PathValue::new(once.full_path().unwrap());
            assert_eq!(once, twice, "{input}");
        }
    }

    #[test]
    fn segments_exclude_the_root() {
        for input in ["Hello/World", "/Hello/World", "/Hello/World/", "./Hello/World/"] {
            let path = PathValue::new(input);
            assert_eq!(path.segments(), vec!["Hello", "World"], "{input}");
        }
    }

    #[test]
    fn explicit_kind_overrides_inference() {
        let path = PathValue::with_kind("shaders/basic", PathKind::Absolute);
        assert!(path.is_absolute());
        assert_eq!(path.full_path(), Some("shaders/basic"));

        let path = PathValue::with_kind("/a/b/c", PathKind::Relative);
        assert!(path.is_relative());
        assert!(path.root().is_empty());
        assert_eq!(path.root_relative().full_path(), Some("/a/b/c"));
    }

    // -- derived paths ------------------------------------------------------

    #[test]
    fn root_of_absolute_and_relative_paths() {
        assert_eq!(PathValue::new("/a/b/c").root().full_path(), Some("/"));
        assert_eq!(PathValue::new("\\a\\b\\c").root().full_path(), Some("/"));
        assert_eq!(PathValue::new("a/b/c").root().full_path(), Some(""));
        assert_eq!(PathValue::new("foo.txt").root().full_path(), Some(""));
    }

    #[test]
    fn is_relative_tracks_the_root() {
        assert!(PathValue::new("assets/shaders").is_relative());
        assert!(PathValue::new("assets/shaders/basic.frag").is_relative());
        assert!(!PathValue::new("/assets/shaders").is_relative());
        assert!(!PathValue::new("/assets/shaders/basic.frag").is_relative());
    }

    #[test]
    fn root_relative_strips_the_root() {
        for (input, expected) in [
            ("\\a\\b\\c", "a/b/c"),
            ("/a/b/c", "a/b/c"),
            ("a/b/c", "a/b/c"),
            ("foo.txt", "foo.txt"),
        ] {
            assert_eq!(
                PathValue::new(input).root_relative().full_path(),
                Some(expected)
            );
        }
    }

    #[test]
    fn parent_walks_up_one_level() {
        assert_eq!(PathValue::new("/a/b").parent().full_path(), Some("/a"));
        assert_eq!(PathValue::new("/a/b/").parent().full_path(), Some("/a"));
        assert_eq!(PathValue::new("/a/b/../c").parent().full_path(), Some("/a"));
        assert_eq!(PathValue::new("/a").parent().full_path(), Some("/"));
        assert_eq!(
            PathValue::new("temp/hello.txt").parent().full_path(),
            Some("temp")
        );
    }

    #[test]
    fn parent_of_relative_top_level_is_empty() {
        for input in [".", "a", "", "hello.txt"] {
            assert!(PathValue::new(input).parent().is_empty(), "{input}");
        }
    }

    #[test]
    fn parent_of_absolute_root_is_null() {
        assert!(PathValue::new("/").parent().is_null());
    }

    #[test]
    fn name_returns_the_last_segment() {
        assert_eq!(PathValue::new("/a/b").name(), "b");
        assert_eq!(PathValue::new("/a/b/").name(), "b");
        assert_eq!(PathValue::new("/a/b/../c").name(), "c");
        assert_eq!(PathValue::new("/a/b/..").name(), "a");
        assert_eq!(PathValue::new("/a").name(), "a");
        assert_eq!(PathValue::new("/").name(), "/");
    }

    #[test]
    fn file_name_from_path() {
        assert_eq!(
            PathValue::new("/input/test.txt").file_name().full_path(),
            Some("test.txt")
        );
        assert_eq!(
            PathValue::new("test.txt").file_name().full_path(),
            Some("test.txt")
        );
    }

    #[test]
    fn file_name_without_extension() {
        for (input, expected) in [
            ("/input/test.txt", "test"),
            ("/input/test", "test"),
            ("test.txt", "test"),
            ("test", "test"),
        ] {
            assert_eq!(
                PathValue::new(input)
                    .file_name_without_extension()
                    .full_path(),
                Some(expected)
            );
        }
        // dot-files are all extension
        assert!(PathValue::new("/input/.test")
            .file_name_without_extension()
            .is_empty());
        assert!(PathValue::new(".test")
            .file_name_without_extension()
            .is_empty());
    }

    #[test]
    fn extension_of_the_last_segment() {
        assert_eq!(
            PathValue::new("assets/shaders/basic.frag").extension(),
            Some(".frag")
        );
        assert_eq!(
            PathValue::new("assets/shaders/basic.frag/test.vert").extension(),
            Some(".vert")
        );
        assert_eq!(PathValue::new("assets/shaders/basic").extension(), None);
        assert_eq!(
            PathValue::new("assets/shaders/basic.frag/test").extension(),
            None
        );
        assert!(PathValue::new("assets/shaders/basic.txt").has_extension());
        assert!(!PathValue::new("assets/shaders/basic").has_extension());
        assert!(!PathValue::new("assets/shaders/basic/").has_extension());
    }

    #[test]
    fn change_extension_variants() {
        let path = PathValue::new("temp/hello.txt");
        assert_eq!(
            path.change_extension(Some(".dat")).full_path(),
            Some("temp/hello.dat")
        );
        assert_eq!(
            path.change_extension(Some("dat")).full_path(),
            Some("temp/hello.dat")
        );
        assert_eq!(
            path.change_extension(Some("")).full_path(),
            Some("temp/hello.")
        );
        assert_eq!(path.change_extension(None).full_path(), Some("temp/hello"));
    }

    #[test]
    fn change_extension_on_empty_path() {
        assert_eq!(
            PathValue::empty().change_extension(Some("foo")).full_path(),
            Some(".foo")
        );
        assert_eq!(
            PathValue::empty()
                .change_extension(Some(".foo"))
                .full_path(),
            Some(".foo")
        );
    }

    #[test]
    fn append_extension_keeps_the_existing_one() {
        let path = PathValue::new("temp/hello.txt");
        assert_eq!(
            path.append_extension("dat").full_path(),
            Some("temp/hello.txt.dat")
        );
        assert_eq!(
            path.append_extension(".dat").full_path(),
            Some("temp/hello.txt.dat")
        );
    }

    #[test]
    fn insert_suffix_before_the_final_extension() {
        for (input, expected) in [
            ("temp/hello.txt", "temp/hello123.txt"),
            ("/hello.txt", "/hello123.txt"),
            ("temp/hello", "temp/hello123"),
            ("temp/hello.txt.dat", "temp/hello.txt123.dat"),
        ] {
            assert_eq!(
                PathValue::new(input).insert_suffix("123").full_path(),
                Some(expected)
            );
        }
    }

    #[test]
    fn insert_prefix_before_the_file_name() {
        for (input, expected) in [
            ("temp/hello.txt", "temp/123hello.txt"),
            ("/hello.txt", "/123hello.txt"),
            ("hello.txt", "123hello.txt"),
            ("temp/hello", "temp/123hello"),
            ("temp/hello.txt.dat", "temp/123hello.txt.dat"),
        ] {
            assert_eq!(
                PathValue::new(input).insert_prefix("123").full_path(),
                Some(expected)
            );
        }
    }

    #[test]
    fn change_file_name_replaces_the_last_segment() {
        for (input, name, expected) in [
            ("/input/test.txt", "foo.bar", "/input/foo.bar"),
            ("input/test", "foo.bar", "input/foo.bar"),
            ("/test.txt", "foo.bar", "/foo.bar"),
            ("test.txt", "foo", "foo"),
            ("test", "foo", "foo"),
        ] {
            assert_eq!(
                PathValue::new(input).change_file_name(name).full_path(),
                Some(expected)
            );
        }
    }

    // -- combination --------------------------------------------------------

    #[test]
    fn combine_concatenates_relative_operands() {
        for (first, second, expected) in [
            ("assets/shaders", "simple.frag", "assets/shaders/simple.frag"),
            ("assets/shaders/", "simple.frag", "assets/shaders/simple.frag"),
            (
                "/assets/shaders/",
                "simple.frag",
                "/assets/shaders/simple.frag",
            ),
            (
                "assets/shaders",
                "test/simple.frag",
                "assets/shaders/test/simple.frag",
            ),
            (".", "asset.txt", "asset.txt"),
            (".", "other/asset.txt", "other/asset.txt"),
        ] {
            let result = PathValue::new(first)
                .combine(&PathValue::new(second))
                .unwrap();
            assert_eq!(result.full_path(), Some(expected));
        }
    }

    #[test]
    fn combine_absolute_operand_wins() {
        let result = PathValue::new("assets")
            .combine(&PathValue::new("/other/asset.txt"))
            .unwrap();
        assert_eq!(result.full_path(), Some("/other/asset.txt"));
        assert!(result.is_absolute());
    }

    #[test]
    fn combine_with_null_is_an_argument_error() {
        let path = PathValue::new("assets");
        assert!(matches!(
            path.combine(&PathValue::null()),
            Err(DocmillError::Argument { .. })
        ));
        assert!(matches!(
            PathValue::null().combine(&path),
            Err(DocmillError::Argument { .. })
        ));
    }

    #[test]
    fn get_file_path_drops_the_directory_portion() {
        for (first, second, expected) in [
            (
                "assets/shaders",
                "simple.frag",
                "assets/shaders/simple.frag",
            ),
            (
                "assets/shaders",
                "test/simple.frag",
                "assets/shaders/simple.frag",
            ),
            (
                "assets/shaders",
                "/test/simple.frag",
                "assets/shaders/simple.frag",
            ),
            (
                "/assets/shaders/",
                "/test/simple.frag",
                "/assets/shaders/simple.frag",
            ),
        ] {
            let result = PathValue::new(first)
                .get_file_path(&PathValue::new(second))
                .unwrap();
            assert_eq!(result.full_path(), Some(expected));
        }
    }

    #[test]
    fn contains_child_is_direct_containment() {
        let dir = PathValue::new("/a/b/c");
        assert!(!dir.contains_child(&PathValue::new("/a/b/test.txt")));
        assert!(dir.contains_child(&PathValue::new("/a/b/c/test.txt")));
        assert!(!dir.contains_child(&PathValue::new("/a/b/c/d/test.txt")));
        assert!(!dir.contains_child(&PathValue::new("/a/b")));
        assert!(!dir.contains_child(&PathValue::new("/a/b/c")));
        assert!(dir.contains_child(&PathValue::new("/a/b/c/d")));
        assert!(!dir.contains_child(&PathValue::new("/a/b/c/d/e")));
    }

    #[test]
    fn contains_descendant_is_transitive() {
        let dir = PathValue::new("/a/b/c");
        assert!(!dir.contains_descendant(&PathValue::new("/a/b/test.txt")));
        assert!(dir.contains_descendant(&PathValue::new("/a/b/c/test.txt")));
        assert!(dir.contains_descendant(&PathValue::new("/a/b/c/d/test.txt")));
        assert!(!dir.contains_descendant(&PathValue::new("/a/b/c")));
        assert!(dir.contains_descendant(&PathValue::new("/a/b/c/d/e")));
    }

    #[test]
    fn containment_requires_matching_kind() {
        let dir = PathValue::new("/a/b");
        assert!(!dir.contains_descendant(&PathValue::new("a/b/c")));
    }

    // -- equality and hashing -----------------------------------------------

    #[test]
    fn same_paths_are_equal_in_both_modes() {
        let first = PathValue::new("shaders/basic.vert");
        let second = PathValue::new("shaders/basic.vert");
        for mode in [PathComparison::Ordinal, PathComparison::OrdinalIgnoreCase] {
            assert!(first.equals(&second, mode));
            assert!(second.equals(&first, mode));
            assert_eq!(first.hash_code(mode), second.hash_code(mode));
        }
    }

    #[test]
    fn different_paths_are_not_equal() {
        let first = PathValue::new("shaders/basic.vert");
        let second = PathValue::new("shaders/basic.frag");
        for mode in [PathComparison::Ordinal, PathComparison::OrdinalIgnoreCase] {
            assert!(!first.equals(&second, mode));
            assert_ne!(first.hash_code(mode), second.hash_code(mode));
        }
    }

    #[test]
    fn casing_follows_the_comparison_mode() {
        let first = PathValue::new("shaders/basic.vert");
        let second = PathValue::new("SHADERS/BASIC.VERT");
        assert!(!first.equals(&second, PathComparison::Ordinal));
        assert!(first.equals(&second, PathComparison::OrdinalIgnoreCase));
        assert_ne!(
            first.hash_code(PathComparison::Ordinal),
            second.hash_code(PathComparison::Ordinal)
        );
        assert_eq!(
            first.hash_code(PathComparison::OrdinalIgnoreCase),
            second.hash_code(PathComparison::OrdinalIgnoreCase)
        );
    }

    #[test]
    fn relative_and_absolute_never_compare_equal() {
        let relative = PathValue::new("shaders/basic.vert");
        let absolute = PathValue::with_kind("shaders/basic.vert", PathKind::Absolute);
        assert!(!relative.equals(&absolute, PathComparison::Ordinal));
        assert!(!relative.equals(&absolute, PathComparison::OrdinalIgnoreCase));
        assert!(relative.compare(&absolute, PathComparison::Ordinal).is_none());
    }

    #[test]
    fn null_path_never_equals_a_real_path() {
        let path = PathValue::new("test.txt");
        assert!(!path.equals(&PathValue::null(), PathComparison::Ordinal));
        assert!(!PathValue::null().equals(&path, PathComparison::Ordinal));
    }

    #[test]
    fn serde_roundtrip_through_strings() {
        let path = PathValue::new("a\\b/c/");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"a/b/c\"");
        let parsed: PathValue = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, path);
    }

    // -- slug optimization --------------------------------------------------

    #[test]
    fn optimize_removes_reserved_characters() {
        assert_eq!(
            optimize_file_name(
                "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789._~:?#[]@!$&'()*+,;="
            ),
            "abcdefghijklmnopqrstuvwxyzabcdefghijklmnopqrstuvwxyz0123456789"
        );
        assert_eq!(
            optimize_file_name("Děku.jemeविकीвики_движка"),
            "děku.jemeविकीвикидвижка"
        );
    }

    #[test]
    fn optimize_collapses_separator_runs() {
        assert_eq!(
            optimize_file_name(
                "this is my title - and some \t\t\t\t\n   clever; (piece) of text here: [ok]."
            ),
            "this-is-my-title-and-some-clever-piece-of-text-here-ok"
        );
        assert_eq!(
            optimize_file_name("this is my title?!! science and #firstworldproblems :* :sadface=true"),
            "this-is-my-title-science-and-firstworldproblems-sadfacetrue"
        );
        assert_eq!(
            optimize_file_name("one_two_three__four__five and a six__seven__eight_nine______ten"),
            "onetwothreefourfive-and-a-sixseveneightnineten"
        );
    }

    #[test]
    fn optimize_lowercases() {
        assert_eq!(
            optimize_file_name("FileName With MiXeD CapS"),
            "filename-with-mixed-caps"
        );
    }

    #[test]
    fn optimize_with_custom_reserved_characters() {
        let reserved: String = OPTIMIZE_RESERVED_CHARS.replace('_', "");
        assert_eq!(
            optimize_file_name_with("this-is_a-.net-tag", &reserved, true),
            "this-is_a-.net-tag"
        );
    }

    #[test]
    fn optimize_without_dot_trimming() {
        assert_eq!(
            optimize_file_name_with("this_is_a_.", OPTIMIZE_RESERVED_CHARS, false),
            "thisisa."
        );
    }

    #[test]
    fn optimize_ignores_blank_input() {
        assert_eq!(optimize_file_name(""), "");
        assert_eq!(optimize_file_name(" "), "");
    }

    #[test]
    fn optimize_preserves_the_extension() {
        assert_eq!(optimize_file_name("myfile.html"), "myfile.html");
        assert_eq!(optimize_file_name("   myfile.html   "), "myfile.html");
    }

    #[test]
    fn optimize_instance_touches_only_the_file_name() {
        let path = PathValue::new(
            "a/b/c/ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_~:?#[]@!$&'()*+,;=.html",
        );
        assert_eq!(
            path.optimize_file_name().full_path(),
            Some("a/b/c/abcdefghijklmnopqrstuvwxyzabcdefghijklmnopqrstuvwxyz0123456789.html")
        );
    }
}
