//! Protocol-boundary scanner for a child's stdout.
//!
//! Tool servers often print banners or warnings on stdout before their
//! JSON-RPC stream begins. The scanner drops everything up to the first `{`
//! and passes every byte after it through untouched. It is a forward-only,
//! single-pass transducer: nothing is buffered between chunks, and once the
//! marker has been seen the scanner never inspects data again.
//!
//! A stray `{` inside pre-protocol noise starts forwarding early; the marker
//! is the only thing recognised.

/// The byte that opens the protocol stream (start of a JSON value).
pub const BOUNDARY_MARKER: u8 = b'{';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Discarding output while looking for the marker.
    Scanning,
    /// Marker seen; all output is forwarded verbatim. Terminal.
    Forwarding,
}

#[derive(Debug)]
pub struct BoundaryScanner {
    state: ScanState,
    /// Bytes consumed from the stream so far, forwarded or not.
    seen: u64,
    discarded: u64,
    boundary_offset: Option<u64>,
}

impl Default for BoundaryScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundaryScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::Scanning,
            seen: 0,
            discarded: 0,
            boundary_offset: None,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn is_forwarding(&self) -> bool {
        self.state == ScanState::Forwarding
    }

    pub fn discarded_bytes(&self) -> u64 {
        self.discarded
    }

    pub fn boundary_offset(&self) -> Option<u64> {
        self.boundary_offset
    }

    /// Returns the part of `chunk` that should reach the parent.
    ///
    /// While scanning, this is empty unless the chunk holds the marker, in
    /// which case it is the suffix starting at the marker and the scanner
    /// switches to [`ScanState::Forwarding`] for good.
    pub fn filter<'a>(&mut self, chunk: &'a [u8]) -> &'a [u8] {
        let base = self.seen;
        self.seen += chunk.len() as u64;

        match self.state {
            ScanState::Forwarding => chunk,
            ScanState::Scanning => match find_boundary(chunk) {
                Some(k) => {
                    self.state = ScanState::Forwarding;
                    self.discarded += k as u64;
                    self.boundary_offset = Some(base + k as u64);
                    &chunk[k..]
                }
                None => {
                    self.discarded += chunk.len() as u64;
                    &chunk[..0]
                }
            },
        }
    }
}

/// Offset of the first boundary marker in `chunk`.
///
/// Works on raw bytes: `{` is ASCII, and no UTF-8 multi-byte sequence
/// contains `0x7B`, so invalid or partial UTF-8 in the noise is harmless.
pub fn find_boundary(chunk: &[u8]) -> Option<usize> {
    memchr::memchr(BOUNDARY_MARKER, chunk)
}
