//! gRPC wire-framing properties (§8): `unframe(Frame::encode(x)) == x`,
//! and frames claiming a payload over the 256 MiB cap are rejected
//! without allocating it.

use fetch::grpc::{read_frame, unframe, Frame};

#[test]
fn frame_then_unframe_roundtrips_arbitrary_payloads() {
    for payload in [
        Vec::new(),
        b"short".to_vec(),
        vec![0u8; 4096],
        (0..=255u8).collect::<Vec<u8>>(),
    ] {
        for compressed in [false, true] {
            let frame = Frame::new(payload.clone(), compressed);
            let decoded = unframe(&frame.encode()).expect("roundtrip should decode");
            assert_eq!(decoded.payload, payload);
            assert_eq!(decoded.compressed, compressed);
        }
    }
}

#[test]
fn frame_claiming_over_256_mib_is_rejected_without_allocating() {
    // A header claiming a length just past the cap, with no payload
    // bytes following it at all. If this were allocated eagerly the
    // process would try to commit >256 MiB; it must instead be rejected
    // from the 5-byte header alone.
    let mut header_only = vec![0u8];
    header_only.extend_from_slice(&(256 * 1024 * 1024 + 1u32).to_be_bytes());
    let err = unframe(&header_only).unwrap_err();
    assert!(err.to_string().contains("exceeds maximum"));
}

#[test]
fn read_frame_rejects_oversized_length_before_reading_payload() {
    let mut buf = vec![1u8];
    buf.extend_from_slice(&(256 * 1024 * 1024 + 1u32).to_be_bytes());
    let err = read_frame(&buf).unwrap_err();
    assert!(err.to_string().contains("exceeds maximum"));
}

#[test]
fn read_frame_splits_a_stream_of_concatenated_messages() {
    let frames: Vec<Vec<u8>> = vec![b"alpha".to_vec(), b"beta".to_vec(), b"gamma".to_vec()];
    let mut stream = Vec::new();
    for payload in &frames {
        stream.extend_from_slice(&Frame::new(payload.clone(), false).encode());
    }

    let mut offset = 0;
    let mut decoded = Vec::new();
    while let Some((frame, consumed)) = read_frame(&stream[offset..]).unwrap() {
        decoded.push(frame.payload);
        offset += consumed;
    }
    assert_eq!(decoded, frames);
    assert_eq!(offset, stream.len());
}
