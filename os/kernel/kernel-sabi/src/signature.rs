//! Locating the SABI control header in the BIOS segment.

use crate::SabiError;
use crate::physmap::MemoryWindow;

/// Physical base of the BIOS segment that holds the control header.
pub const BIOS_SEGMENT_BASE: u64 = 0xF_0000;

/// Bytes scanned from [`BIOS_SEGMENT_BASE`].
pub const BIOS_SEGMENT_LEN: usize = 0x1_0000;

/// Marker that immediately precedes the control header.
pub const SIGNATURE: [u8; 6] = *b"SwSmi@";

/// Scans `window` once, front to back, for [`SIGNATURE`].
///
/// Returns the offset of the first byte *after* the marker, which is where
/// the control header starts. Every byte of the window is read at most once.
///
/// # Errors
/// [`SabiError::SignatureNotFound`] when the marker does not occur.
pub fn find_signature<W: MemoryWindow + ?Sized>(window: &W) -> Result<usize, SabiError> {
    // Last SIGNATURE.len() bytes read, oldest first.
    let mut tail = [0u8; SIGNATURE.len()];
    for offset in 0..window.len() {
        tail.copy_within(1.., 0);
        tail[SIGNATURE.len() - 1] = window.read_u8(offset);

        if offset + 1 >= SIGNATURE.len() && tail == SIGNATURE {
            return Ok(offset + 1);
        }
    }

    Err(SabiError::SignatureNotFound {
        scanned: window.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    struct CountingWindow {
        bytes: RefCell<Vec<u8>>,
        reads: RefCell<Vec<usize>>,
        writes: Cell<usize>,
    }

    impl CountingWindow {
        fn new(bytes: Vec<u8>) -> Self {
            Self {
                bytes: RefCell::new(bytes),
                reads: RefCell::new(Vec::new()),
                writes: Cell::new(0),
            }
        }
    }

    impl MemoryWindow for CountingWindow {
        fn len(&self) -> usize {
            self.bytes.borrow().len()
        }

        fn read_u8(&self, offset: usize) -> u8 {
            self.reads.borrow_mut().push(offset);
            self.bytes.borrow()[offset]
        }

        fn write_u8(&self, offset: usize, value: u8) {
            self.writes.set(self.writes.get() + 1);
            self.bytes.borrow_mut()[offset] = value;
        }
    }

    fn segment_with_marker_at(at: usize) -> Vec<u8> {
        let mut bytes = vec![0xFF; BIOS_SEGMENT_LEN];
        bytes[at..at + SIGNATURE.len()].copy_from_slice(&SIGNATURE);
        bytes
    }

    #[test]
    fn finds_marker_and_points_past_it() {
        let window = CountingWindow::new(segment_with_marker_at(0x1234));
        assert_eq!(find_signature(&window), Ok(0x1234 + 6));
    }

    #[test]
    fn finds_marker_at_start() {
        let window = CountingWindow::new(segment_with_marker_at(0));
        assert_eq!(find_signature(&window), Ok(6));
    }

    #[test]
    fn finds_marker_at_last_possible_offset() {
        let window = CountingWindow::new(segment_with_marker_at(BIOS_SEGMENT_LEN - 6));
        assert_eq!(find_signature(&window), Ok(BIOS_SEGMENT_LEN));
    }

    #[test]
    fn missing_marker_scans_every_byte_exactly_once() {
        let window = CountingWindow::new(vec![0u8; BIOS_SEGMENT_LEN]);
        assert_eq!(
            find_signature(&window),
            Err(SabiError::SignatureNotFound {
                scanned: BIOS_SEGMENT_LEN
            })
        );

        let reads = window.reads.borrow();
        assert_eq!(reads.len(), BIOS_SEGMENT_LEN);
        assert!(reads.iter().enumerate().all(|(i, &off)| i == off));
        assert_eq!(window.writes.get(), 0);
    }

    #[test]
    fn partial_match_does_not_hide_the_real_one() {
        let mut bytes = vec![0u8; 64];
        bytes[10..18].copy_from_slice(b"SwSwSmi@");
        let window = CountingWindow::new(bytes);
        assert_eq!(find_signature(&window), Ok(18));
    }

    #[test]
    fn truncated_marker_at_end_is_not_a_match() {
        let mut bytes = vec![0u8; 32];
        bytes[27..32].copy_from_slice(b"SwSmi");
        let window = CountingWindow::new(bytes);
        assert!(find_signature(&window).is_err());
    }

    #[test]
    fn window_shorter_than_marker() {
        let window = CountingWindow::new(b"SwS".to_vec());
        assert_eq!(
            find_signature(&window),
            Err(SabiError::SignatureNotFound { scanned: 3 })
        );
    }
}
