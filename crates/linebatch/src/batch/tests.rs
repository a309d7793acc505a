use std::io::{self, Write};
use std::num::NonZeroUsize;

use super::BatchLineWriter;
use crate::config::{BatchConfig, OversizeLinePolicy};
use crate::error::{LineWriterError, WriterOperation};
use crate::test_support::{
    ChunkedSource, FailingSource, FaultySink, RecordingSink, SinkFault,
};
use crate::traits::LineWrite;

const SCENARIO: &[u8] = b"ab\ncdefgh\nijklmnopqrstuvwxyz\n";

fn grow_config(capacity: usize, max_capacity: Option<usize>) -> BatchConfig {
    BatchConfig::new()
        .with_capacity(capacity)
        .with_oversize_policy(OversizeLinePolicy::Grow {
            max_capacity: max_capacity.and_then(NonZeroUsize::new),
        })
}

#[test]
fn zero_capacity_is_invalid_configuration() {
    let err = BatchLineWriter::new(RecordingSink::new(), 0).unwrap_err();
    assert!(matches!(err, LineWriterError::InvalidConfiguration { .. }));
}

#[test]
fn scenario_splits_line_longer_than_buffer() {
    let mut sink = RecordingSink::new();
    let mut writer = BatchLineWriter::new(&mut sink, 16).unwrap();

    assert_eq!(writer.append(SCENARIO).unwrap(), SCENARIO.len());
    writer.close().unwrap();
    drop(writer);

    assert_eq!(
        sink.calls_lossy(),
        ["ab\ncdefgh\n", "ijklmnopqrstuvwx", "yz\n"]
    );
    assert_eq!(sink.output(), SCENARIO);
    assert_eq!(sink.close_count(), 1);
}

#[test]
fn scenario_with_growth_keeps_long_line_whole() {
    let mut sink = RecordingSink::new();
    let mut writer = BatchLineWriter::with_config(&mut sink, grow_config(16, None)).unwrap();

    writer.append(SCENARIO).unwrap();
    assert_eq!(writer.capacity(), 32);
    writer.close().unwrap();
    drop(writer);

    assert_eq!(sink.calls_lossy(), ["ab\ncdefgh\n", "ijklmnopqrstuvwxyz\n"]);
}

#[test]
fn growth_limit_falls_back_to_split() {
    let mut sink = RecordingSink::new();
    let mut writer = BatchLineWriter::with_config(&mut sink, grow_config(4, Some(8))).unwrap();

    writer.append(b"abcdefghij\n").unwrap();
    assert_eq!(writer.capacity(), 8);
    writer.close().unwrap();
    drop(writer);

    assert_eq!(sink.calls_lossy(), ["abcdefgh", "ij\n"]);
}

#[test]
fn nothing_is_forwarded_before_buffer_fills() {
    let mut sink = RecordingSink::new();
    let mut writer = BatchLineWriter::new(&mut sink, 16).unwrap();

    writer.append(b"a\n").unwrap();
    writer.append(b"b\nc").unwrap();
    assert_eq!(writer.buffered(), b"a\nb\nc");
    drop(writer);

    assert_eq!(sink.calls_lossy(), ["a\nb\nc"]);
}

#[test]
fn batches_end_on_newline_boundaries() {
    let mut sink = RecordingSink::new();
    let mut writer = BatchLineWriter::new(&mut sink, 10).unwrap();

    for line in ["one\n", "two\n", "three\n", "four\n", "five\n"] {
        writer.append(line.as_bytes()).unwrap();
    }
    writer.close().unwrap();
    drop(writer);

    assert_eq!(sink.calls_lossy(), ["one\ntwo\n", "three\n", "four\nfive\n"]);
}

#[test]
fn unit_capacity_forwards_every_byte() {
    let mut sink = RecordingSink::new();
    let mut writer = BatchLineWriter::new(&mut sink, 1).unwrap();

    writer.append(b"a\nb").unwrap();
    assert!(writer.buffered().is_empty());
    writer.close().unwrap();
    drop(writer);

    assert_eq!(sink.calls_lossy(), ["a", "\n", "b"]);
}

#[test]
fn close_without_data_only_closes_sink() {
    let mut sink = RecordingSink::new();
    BatchLineWriter::new(&mut sink, 8).unwrap().close().unwrap();

    assert!(sink.calls().is_empty());
    assert_eq!(sink.close_count(), 1);
}

#[test]
fn second_close_is_already_closed() {
    let mut sink = RecordingSink::new();
    let mut writer = BatchLineWriter::new(&mut sink, 8).unwrap();

    writer.append(b"tail").unwrap();
    writer.close().unwrap();
    assert!(writer.is_closed());

    let err = writer.close().unwrap_err();
    assert!(matches!(
        err,
        LineWriterError::AlreadyClosed {
            operation: WriterOperation::Close
        }
    ));
    drop(writer);

    assert_eq!(sink.calls_lossy(), ["tail"]);
    assert_eq!(sink.close_count(), 1);
}

#[test]
fn operations_after_close_fail() {
    let mut writer = BatchLineWriter::new(RecordingSink::new(), 8).unwrap();
    writer.close().unwrap();

    assert!(writer.append(b"x\n").unwrap_err().is_already_closed());
    assert!(
        writer
            .drain_from(&mut &b"x\n"[..])
            .unwrap_err()
            .is_already_closed()
    );
    assert!(writer.flush_lines().unwrap_err().is_already_closed());
    assert_eq!(writer.get_ref().close_count(), 1);
}

#[test]
fn drop_closes_unclosed_writer() {
    let mut sink = RecordingSink::new();
    {
        let mut writer = BatchLineWriter::new(&mut sink, 8).unwrap();
        writer.append(b"pending").unwrap();
    }
    assert_eq!(sink.calls_lossy(), ["pending"]);
    assert_eq!(sink.close_count(), 1);
}

#[test]
fn flush_lines_forwards_complete_prefix_only() {
    let mut sink = RecordingSink::new();
    let mut writer = BatchLineWriter::new(&mut sink, 64).unwrap();

    writer.append(b"one\ntwo\nthr").unwrap();
    writer.flush_lines().unwrap();
    assert_eq!(writer.buffered(), b"thr");

    writer.flush_lines().unwrap();
    writer.append(b"ee\n").unwrap();
    Write::flush(&mut writer).unwrap();
    assert!(writer.buffered().is_empty());
    drop(writer);

    assert_eq!(sink.calls_lossy(), ["one\ntwo\n", "three\n"]);
}

#[test]
fn drain_from_matches_append_for_scenario() {
    let mut pushed = RecordingSink::new();
    let mut writer = BatchLineWriter::new(&mut pushed, 16).unwrap();
    writer.append(SCENARIO).unwrap();
    writer.close().unwrap();
    drop(writer);

    let mut pulled = RecordingSink::new();
    let mut writer = BatchLineWriter::new(&mut pulled, 16).unwrap();
    let mut source = ChunkedSource::new(SCENARIO, 5);
    assert_eq!(writer.drain_from(&mut source).unwrap(), SCENARIO.len() as u64);
    writer.close().unwrap();
    drop(writer);

    assert_eq!(pulled.calls(), pushed.calls());
}

#[test]
fn drain_from_retries_interrupted_reads() {
    let mut sink = RecordingSink::new();
    let mut writer = BatchLineWriter::new(&mut sink, 8).unwrap();
    let mut source = ChunkedSource::new(b"abc\ndef\nghi\n".to_vec(), 3).interrupt_every(2);

    assert_eq!(writer.drain_from(&mut source).unwrap(), 12);
    writer.close().unwrap();
    drop(writer);

    assert_eq!(sink.output(), b"abc\ndef\nghi\n");
}

#[test]
fn drain_from_reports_source_failure_and_keeps_data() {
    let mut sink = RecordingSink::new();
    let mut writer = BatchLineWriter::new(&mut sink, 64).unwrap();
    let mut source = FailingSource::new(b"kept\npartial".to_vec(), io::ErrorKind::TimedOut);

    let err = writer.drain_from(&mut source).unwrap_err();
    match &err {
        LineWriterError::SourceReadFailed {
            transferred,
            source,
        } => {
            assert_eq!(*transferred, 12);
            assert_eq!(source.kind(), io::ErrorKind::TimedOut);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(writer.buffered(), b"kept\npartial");
    writer.close().unwrap();
    drop(writer);

    assert_eq!(sink.output(), b"kept\npartial");
}

#[test]
fn sink_failure_keeps_bytes_for_retry() {
    let mut sink = FaultySink::new([SinkFault::Fail(io::ErrorKind::BrokenPipe)]);
    let mut writer = BatchLineWriter::new(&mut sink, 4).unwrap();

    let err = writer.append(b"ab\ncd\n").unwrap_err();
    match &err {
        LineWriterError::SinkWriteFailed {
            operation,
            processed,
            source,
        } => {
            assert_eq!(*operation, WriterOperation::Append);
            assert_eq!(*processed, 4);
            assert_eq!(source.kind(), io::ErrorKind::BrokenPipe);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(writer.buffered(), b"ab\nc");

    writer.append(b"d\n").unwrap();
    writer.close().unwrap();
    drop(writer);

    assert_eq!(sink.accepted(), b"ab\ncd\n");
    assert_eq!(sink.close_count(), 1);
}

#[test]
fn short_write_is_sink_write_failure() {
    let mut sink = FaultySink::new([SinkFault::Short(1)]);
    let mut writer = BatchLineWriter::new(&mut sink, 4).unwrap();

    let err = writer.append(b"ab\ncd\n").unwrap_err();
    assert!(matches!(
        &err,
        LineWriterError::SinkWriteFailed { source, processed: 4, .. }
            if source.kind() == io::ErrorKind::WriteZero
    ));
    assert_eq!(writer.buffered(), b"b\nc");

    writer.close().unwrap();
    drop(writer);
    assert_eq!(sink.accepted(), b"ab\nc");
}

#[test]
fn overreported_count_is_sink_write_failure() {
    let mut sink = FaultySink::new([SinkFault::Overreport(100)]);
    let mut writer = BatchLineWriter::new(&mut sink, 4).unwrap();

    let err = writer.append(b"ab\ncd").unwrap_err();
    assert_eq!(
        err.io_error().map(io::Error::kind),
        Some(io::ErrorKind::InvalidData)
    );
}

#[test]
fn close_still_closes_sink_when_final_flush_fails() {
    let mut sink = FaultySink::new([SinkFault::Fail(io::ErrorKind::BrokenPipe)]);
    let mut writer = BatchLineWriter::new(&mut sink, 16).unwrap();

    writer.append(b"tail").unwrap();
    let err = writer.close().unwrap_err();
    assert!(matches!(
        err,
        LineWriterError::SinkWriteFailed {
            operation: WriterOperation::Close,
            ..
        }
    ));
    assert!(writer.close().unwrap_err().is_already_closed());
    drop(writer);

    assert_eq!(sink.close_count(), 1);
}

#[test]
fn close_reports_sink_close_failure() {
    let mut sink = FaultySink::new([]).with_close_error(io::ErrorKind::PermissionDenied);
    let mut writer = BatchLineWriter::new(&mut sink, 16).unwrap();

    writer.append(b"line\n").unwrap();
    let err = writer.close().unwrap_err();
    assert!(matches!(err, LineWriterError::SinkCloseFailed { .. }));
    drop(writer);

    assert_eq!(sink.accepted(), b"line\n");
}

#[test]
fn close_reports_first_error_when_both_fail() {
    let mut sink = FaultySink::new([SinkFault::Fail(io::ErrorKind::BrokenPipe)])
        .with_close_error(io::ErrorKind::PermissionDenied);
    let mut writer = BatchLineWriter::new(&mut sink, 16).unwrap();

    writer.append(b"tail").unwrap();
    let err = writer.close().unwrap_err();
    assert_eq!(
        err.io_error().map(io::Error::kind),
        Some(io::ErrorKind::BrokenPipe)
    );
    drop(writer);

    assert_eq!(sink.close_count(), 1);
}

#[test]
fn io_copy_pushes_through_write_impl() {
    let mut sink = RecordingSink::new();
    let mut writer = BatchLineWriter::new(&mut sink, 16).unwrap();

    let copied = io::copy(&mut &SCENARIO[..], &mut writer).unwrap();
    assert_eq!(copied, SCENARIO.len() as u64);
    writer.close().unwrap();
    drop(writer);

    assert_eq!(
        sink.calls_lossy(),
        ["ab\ncdefgh\n", "ijklmnopqrstuvwx", "yz\n"]
    );
}

#[test]
fn write_impl_surfaces_closed_writer_as_broken_pipe() {
    let mut writer = BatchLineWriter::new(RecordingSink::new(), 16).unwrap();
    writer.close().unwrap();

    let err = writer.write(b"late\n").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
}

#[test]
fn usable_as_line_write_trait_object() {
    let mut sink = RecordingSink::new();
    {
        let mut writer = BatchLineWriter::new(&mut sink, 8).unwrap();
        let dynamic: &mut dyn LineWrite = &mut writer;
        dynamic.append(b"a\n").unwrap();
        dynamic.drain_from(&mut &b"b\n"[..]).unwrap();
        dynamic.close().unwrap();
        assert!(dynamic.is_closed());
    }
    assert_eq!(sink.calls_lossy(), ["a\nb\n"]);
}

#[test]
fn config_is_retained() {
    let writer = BatchLineWriter::with_config(RecordingSink::new(), grow_config(8, Some(64))).unwrap();
    assert_eq!(writer.config().capacity(), 8);
    assert!(matches!(
        writer.config().oversize_policy(),
        OversizeLinePolicy::Grow { .. }
    ));
}

#[test]
fn write_all_after_interrupted_sink_delivers_each_byte_once() {
    let mut sink = FaultySink::new([SinkFault::Fail(io::ErrorKind::Interrupted)]);
    let mut writer = BatchLineWriter::new(&mut sink, 4).unwrap();

    writer.write_all(b"ab\ncd\n").unwrap();
    writer.close().unwrap();
    drop(writer);

    assert_eq!(sink.accepted(), b"ab\ncd\n");
    assert_eq!(sink.close_count(), 1);
}

#[test]
fn io_copy_after_interrupted_sink_delivers_each_byte_once() {
    let mut sink = FaultySink::new([SinkFault::Fail(io::ErrorKind::Interrupted)]);
    let mut writer = BatchLineWriter::new(&mut sink, 16).unwrap();

    let copied = io::copy(&mut &SCENARIO[..], &mut writer).unwrap();
    assert_eq!(copied, SCENARIO.len() as u64);
    writer.close().unwrap();
    drop(writer);

    assert_eq!(sink.accepted(), SCENARIO);
}

#[test]
fn write_reports_bytes_taken_before_sink_failure() {
    let mut sink = FaultySink::new([
        SinkFault::Fail(io::ErrorKind::BrokenPipe),
        SinkFault::Fail(io::ErrorKind::BrokenPipe),
    ]);
    let mut writer = BatchLineWriter::new(&mut sink, 4).unwrap();

    assert_eq!(writer.write(b"ab\ncd\n").unwrap(), 4);
    assert_eq!(writer.buffered(), b"ab\nc");

    // Nothing of the next slice fits, so the retained failure is reported.
    let err = writer.write(b"d\n").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    assert_eq!(writer.buffered(), b"ab\nc");

    assert_eq!(writer.write(b"d\n").unwrap(), 2);
    writer.close().unwrap();
    drop(writer);

    assert_eq!(sink.accepted(), b"ab\ncd\n");
}
