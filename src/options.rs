/// How concatenated gzip members are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Members {
    /// Decode every member until the source ends (what `gzip -d` does).
    Multi,
    /// Stop after the first member; trailing bytes are left unread in the buffer.
    Single,
}

/// Smallest buffer that can hold the gzip magic.
pub const MIN_CAPACITY: usize = 2;

/// Default read-ahead buffer size.
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// Read-ahead buffer size of the peekable layer; clamped to [`MIN_CAPACITY`].
    pub capacity: usize,
    pub members: Members,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            members: Members::Multi, // matches gzip(1) on concatenated files
        }
    }
}
