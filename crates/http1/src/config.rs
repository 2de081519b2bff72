//! Connection configuration.
//!
//! All limits exist to bound memory and CPU spent on a single connection.
//! The defaults are suitable for most servers and clients.

/// Default maximum length of a single line (start line, header line, chunk-size line)
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8 * 1024;

/// Default maximum number of fields in one header or trailer block
pub const DEFAULT_MAX_HEADERS: usize = 64;

/// Default read-ahead size, also the largest chunk a remainder body yields
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Tunables for a [`HttpConnection`](crate::connection::HttpConnection).
///
/// ```
/// use micro_http1::Config;
///
/// let config = Config::new().max_line_length(1024).block_size(16 * 1024);
/// assert_eq!(config.get_max_line_length(), 1024);
/// assert!(config.is_persistent());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    max_line_length: usize,
    max_headers: usize,
    block_size: usize,
    persistent: bool,
}

impl Config {
    /// Creates a configuration with the default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines longer than this fail with a line-too-long error.
    #[must_use]
    pub fn max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    /// Header (and trailer) blocks with more fields than this are rejected.
    #[must_use]
    pub fn max_headers(mut self, max_headers: usize) -> Self {
        self.max_headers = max_headers;
        self
    }

    /// Size of each read from the transport.
    #[must_use]
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Initial value of the connection's persistence flag.
    #[must_use]
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn get_max_line_length(&self) -> usize {
        self.max_line_length
    }

    pub fn get_max_headers(&self) -> usize {
        self.max_headers
    }

    pub fn get_block_size(&self) -> usize {
        self.block_size
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_headers: DEFAULT_MAX_HEADERS,
            block_size: DEFAULT_BLOCK_SIZE,
            persistent: true,
        }
    }
}
