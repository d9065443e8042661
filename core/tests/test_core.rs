#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read};

    use ursparse_core::prelude::*;
    use ursparse_core::telemetry::Operation;
    use ursparse_core::transfer::io::{open_output, OutputTarget};

    const STREAM: &[u8] = b"0 4\nabcd10 2\nxy";

    fn decode_with(block_size: usize, input: InputSource) -> (Result<TelemetrySnapshot, StreamError>, MemorySink) {
        let mut sink = MemorySink::new();
        let config = ApiConfig::new(Some(block_size));
        let r = decode_stream(input, &mut sink, &config);
        (r, sink)
    }

    /// Reader that hands out at most one byte per call and reports interruptions in between.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        interrupt_next: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt_next = !self.interrupt_next;
            if self.interrupt_next {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            if self.pos >= self.data.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    /// Sink whose every write fails.
    struct BrokenSink;

    impl OutputSink for BrokenSink {
        fn write_payload(&mut self, _data: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
        fn seek_hole(&mut self, _offset: u64) -> io::Result<()> {
            Ok(())
        }
        fn hole_mode(&self) -> HoleMode {
            HoleMode::Sparse
        }
    }

    // --- Configuration ---

    #[test]
    fn block_size_below_minimum_is_rejected() {
        let (r, sink) = decode_with(1, InputSource::Memory(STREAM.to_vec()));
        assert!(matches!(r, Err(StreamError::Validation(_))));
        assert!(sink.is_empty());
    }

    // --- Decode orchestration ---

    #[test]
    fn block_size_does_not_change_output() {
        for bs in [2usize, 3, 5, 7, 4096] {
            let (r, sink) = decode_with(bs, InputSource::Memory(STREAM.to_vec()));
            let snap = r.unwrap();
            assert_eq!(sink.as_bytes(), b"abcd\0\0\0\0\0\0xy", "block size {bs}");
            assert_eq!(snap.records, 2);
            assert_eq!(snap.payload_bytes, 6);
            assert_eq!(snap.hole_bytes, 6);
            assert_eq!(snap.header_bytes, 4 + 5);
            assert_eq!(snap.operation, Operation::Decode);
        }
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let reader = Trickle { data: STREAM.to_vec(), pos: 0, interrupt_next: false };
        let (r, sink) = decode_with(4096, InputSource::Reader(Box::new(reader)));
        assert_eq!(r.unwrap().records, 2);
        assert_eq!(&sink.as_bytes()[10..], b"xy");
    }

    #[test]
    fn truncated_input_fails_after_partial_write() {
        let (r, sink) = decode_with(4, InputSource::Memory(b"0 4\nabcd8 8\nxyz".to_vec()));
        assert!(matches!(
            r,
            Err(StreamError::Truncation { offset: 8, declared: 8, remaining: 5 })
        ));
        // completed records stay written
        assert_eq!(&sink.as_bytes()[..4], b"abcd");
    }

    #[test]
    fn sink_write_failure_is_reported() {
        let mut sink = BrokenSink;
        let r = decode_stream(InputSource::Memory(STREAM.to_vec()), &mut sink, &ApiConfig::default());
        match r {
            Err(StreamError::SinkWrite(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn short_sink_write_is_an_underrun() {
        let mut sink = MemorySink::accepting_at_most(1);
        let r = decode_bytes(STREAM, &mut sink);
        assert!(matches!(r, Err(StreamError::SinkUnderrun { accepted: 1, .. })));
    }

    #[test]
    fn record_at_end_of_address_space_fails_cleanly() {
        let mut sink = MemorySink::new();
        let r = decode_bytes(b"18446744073709551615 1\na", &mut sink);
        match r {
            Err(StreamError::SinkWrite(e)) => assert_eq!(e.kind(), io::ErrorKind::InvalidInput),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn missing_input_file_is_an_input_error() {
        let (r, _) = decode_with(
            4096,
            InputSource::File("/nonexistent/ursparse/input".into()),
        );
        assert!(matches!(r, Err(StreamError::Input(_))));
    }

    #[test]
    fn writer_target_zero_fills_holes() {
        let buf = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));

        struct Shared(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);
        impl io::Write for Shared {
            fn write(&mut self, b: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(b);
                Ok(b.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut sink = open_output(OutputTarget::Writer(Box::new(Shared(buf.clone())))).unwrap();
        assert_eq!(sink.hole_mode(), HoleMode::ZeroFill);
        decode_bytes(STREAM, &mut sink).unwrap();
        assert_eq!(buf.lock().unwrap().as_slice(), b"abcd\0\0\0\0\0\0xy");
    }

    #[test]
    fn zero_fill_target_rejects_out_of_order_records() {
        let mut sink = open_output(OutputTarget::Writer(Box::new(io::sink()))).unwrap();
        let r = decode_bytes(b"10 1\na0 1\nb", &mut sink);
        assert!(matches!(r, Err(StreamError::SinkSeek(_))));
    }

    // --- Encode and map over memory sources ---

    #[test]
    fn encode_then_map_agree_on_extents() {
        let mut data = vec![0u8; 64];
        data[16..24].copy_from_slice(b"payload!");
        let mut src = MemorySource::detect_zero_blocks(data, 8).unwrap();

        let mut wire = Vec::new();
        let enc = encode_sparse(&mut src, &mut wire).unwrap();
        assert_eq!(wire, b"16 8\npayload!");
        assert_eq!(enc.operation, Operation::Encode);

        let mut listing = Vec::new();
        let map = map_sparse(&mut src, &mut listing).unwrap();
        assert_eq!(listing, b"16 8\n");
        assert_eq!(map.extents, 1);
        assert_eq!(map.hole_bytes, 16);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut sink = MemorySink::new();
        let snap = decode_bytes(STREAM, &mut sink).unwrap();
        let json = snap.to_json().unwrap();
        assert!(json.contains("\"operation\":\"decode\""));
        assert!(json.contains("\"records\":2"));
        assert_eq!(snap.wire_bytes(), 15);
    }

    #[test]
    fn cursor_reader_input_works() {
        let (r, _) = decode_with(16, InputSource::Reader(Box::new(Cursor::new(STREAM.to_vec()))));
        assert!(r.is_ok());
    }
}
