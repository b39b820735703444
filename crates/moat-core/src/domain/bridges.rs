//! The ordered set of bridge lines produced by a successful solution check.

/// An ordered sequence of opaque bridge-line strings.
///
/// Each line identifies a non-public relay; the client treats them as
/// opaque text and preserves the server-supplied order.  A `BridgeSet` is
/// produced once per successful `check`, handed to the preference store,
/// and not retained afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BridgeSet {
    lines: Vec<String>,
}

impl BridgeSet {
    /// Wraps the given lines, preserving their order.
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// The bridge lines in server-supplied order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Consumes the set, yielding the lines in order.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// `true` when the server returned no bridges.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of bridge lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// The storage representation: every line followed by a newline.
    ///
    /// `["a", "b"]` becomes `"a\nb\n"`.  The trailing newline per line is
    /// part of the stored format that the surrounding application's bridge
    /// configuration expects.
    pub fn to_storage_string(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

impl From<Vec<String>> for BridgeSet {
    fn from(lines: Vec<String>) -> Self {
        Self::new(lines)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
