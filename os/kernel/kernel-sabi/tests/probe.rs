use kernel_sabi::{BIOS_SEGMENT_BASE, BIOS_SEGMENT_LEN, FailureCause, SabiError, Sabi};
use kernel_sabi_sim::{DEFAULT_HEADER, SIGNATURE_OFFSET, SimulatedBios};

#[test]
fn probe_decodes_header_and_releases_segment() {
    let bios = SimulatedBios::new();
    let sabi = unsafe { Sabi::probe(&bios.mapper(), bios.ports(), bios.delay()) }.unwrap();

    assert_eq!(*sabi.header(), DEFAULT_HEADER);
    // Only the interface buffer stays mapped.
    assert_eq!(bios.live_mappings(), 1);
    // The scan stops right after the marker; the header adds its own bytes.
    assert_eq!(
        bios.segment_reads(),
        SIGNATURE_OFFSET + 6 + kernel_sabi::HEADER_LEN
    );

    drop(sabi);
    assert_eq!(bios.live_mappings(), 0);
}

#[test]
fn missing_marker_is_unsupported_after_one_full_scan() {
    let bios = SimulatedBios::without_signature();
    let err = unsafe { Sabi::probe(&bios.mapper(), bios.ports(), bios.delay()) }
        .err()
        .unwrap();

    assert_eq!(
        err,
        SabiError::SignatureNotFound {
            scanned: BIOS_SEGMENT_LEN
        }
    );
    assert!(err.is_unsupported());
    assert_eq!(bios.segment_reads(), BIOS_SEGMENT_LEN);
    assert_eq!(bios.live_mappings(), 0);
    assert!(bios.events().is_empty());
}

#[test]
fn marker_at_end_of_segment_has_no_room_for_a_header() {
    let bios = SimulatedBios::with_header_at(BIOS_SEGMENT_LEN - 6, DEFAULT_HEADER);
    let err = unsafe { Sabi::probe(&bios.mapper(), bios.ports(), bios.delay()) }
        .err()
        .unwrap();

    assert_eq!(
        err,
        SabiError::HeaderOutOfWindow {
            offset: BIOS_SEGMENT_LEN,
            window: BIOS_SEGMENT_LEN
        }
    );
    assert!(err.is_unsupported());
    assert_eq!(bios.live_mappings(), 0);
}

#[test]
fn segment_mapping_failure_is_fatal() {
    let bios = SimulatedBios::new().refusing_segment_mapping();
    let err = unsafe { Sabi::probe(&bios.mapper(), bios.ports(), bios.delay()) }
        .err()
        .unwrap();

    assert_eq!(
        err,
        SabiError::MapFailed {
            address: BIOS_SEGMENT_BASE,
            len: BIOS_SEGMENT_LEN
        }
    );
    assert_eq!(err.to_string(), "failed to map 0x10000 bytes at physical 0xf0000");
    assert!(!err.is_unsupported());
    assert_eq!(bios.segment_reads(), 0);
    assert_eq!(bios.live_mappings(), 0);
}

#[test]
fn interface_mapping_failure_releases_everything() {
    let bios = SimulatedBios::new().refusing_interface_mapping();
    let err = unsafe { Sabi::probe(&bios.mapper(), bios.ports(), bios.delay()) }
        .err()
        .unwrap();

    assert_eq!(
        err,
        SabiError::MapFailed {
            address: 0xE_0010,
            len: 16
        }
    );
    assert!(!err.is_unsupported());
    assert_eq!(bios.live_mappings(), 0);
}

#[test]
fn header_may_point_anywhere() {
    let mut header = DEFAULT_HEADER;
    header.data_segment = 0x9FC0;
    header.data_offset = 0x0123;
    header.port = 0x0082;

    let bios = SimulatedBios::with_header_at(0x10, header);
    let sabi = unsafe { Sabi::probe(&bios.mapper(), bios.ports(), bios.delay()) }.unwrap();
    assert_eq!(sabi.header().interface_address().linear(), 0x9FD23);

    let err = sabi.get(0x77).unwrap_err();
    let SabiError::Transaction(failure) = err else {
        panic!("expected transaction failure, got {err:?}");
    };
    assert_eq!(failure.cause(), FailureCause::Rejected);
}
