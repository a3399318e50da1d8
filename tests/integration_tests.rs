//! End-to-end tests compiling configuration documents into loggers

mod common;

use chrono::Local;
use common::captured_registry;
use rust_logger_config::{Config, LogLevel, Logger, LoggerError, NopWriter, Sink, WriterRegistry};
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn compile(registry: &WriterRegistry, json: &str) -> Logger {
    Config::from_json_str(json)
        .expect("config should parse")
        .compile_with(registry)
        .expect("config should compile")
}

#[test]
fn test_stdout_pretty_respects_min_level() {
    let (registry, stdout, _) = captured_registry();
    let logger = compile(
        &registry,
        r#"{
            "writers": [{"type": "stdout", "format": "pretty"}],
            "min_level": "debug",
            "timestamp": false
        }"#,
    );

    logger.event(LogLevel::Trace).msg("meow").unwrap();
    assert!(stdout.contents().is_empty());

    logger
        .event(LogLevel::Debug)
        .field("cats", 5)
        .msg("meow")
        .unwrap();
    assert_eq!(stdout.contents(), "<nil> DBG meow cats=5\n");
}

#[test]
fn test_metadata_fields_on_every_record() {
    let (registry, stdout, _) = captured_registry();
    let logger = compile(
        &registry,
        r#"{
            "writers": [{"type": "stdout", "format": "pretty"}],
            "metadata": {"meow": 5, "foo": {"bar": "asd"}},
            "timestamp": false
        }"#,
    );

    logger.debug("meow");
    assert_eq!(stdout.contents(), "<nil> DBG meow foo={\"bar\":\"asd\"} meow=5\n");
}

#[test]
fn test_pretty_time_format() {
    let (registry, stdout, _) = captured_registry();
    let logger = compile(
        &registry,
        r#"{
            "writers": [{"type": "stdout", "format": "pretty", "time_format": "%Y"}],
            "min_level": "debug"
        }"#,
    );

    logger
        .event(LogLevel::Debug)
        .field("cats", 5)
        .msg("meow")
        .unwrap();
    let year = Local::now().format("%Y").to_string();
    assert_eq!(stdout.contents(), format!("{} DBG meow cats=5\n", year));
}

#[test]
fn test_level_windows_split_console_streams() {
    let (registry, stdout, stderr) = captured_registry();
    let logger = compile(
        &registry,
        r#"{
            "writers": [
                {"type": "stdout", "format": "pretty", "max_level": "warn"},
                {"type": "stderr", "format": "pretty", "min_level": "error"}
            ],
            "min_level": "trace",
            "timestamp": false
        }"#,
    );

    logger.info("meow");
    assert!(stderr.contents().is_empty());
    assert_eq!(stdout.contents(), "<nil> INF meow\n");
    stdout.clear();

    logger.error("meow #2");
    assert!(stdout.contents().is_empty());
    assert_eq!(stderr.contents(), "<nil> ERR meow #2\n");
    stderr.clear();

    logger.trace("meow #3");
    assert!(stderr.contents().is_empty());
    assert_eq!(stdout.contents(), "<nil> TRC meow #3\n");
}

#[test]
fn test_stdout_and_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = dir.path().join("test.log");
    let (registry, stdout, _) = captured_registry();
    let config = format!(
        r#"{{
            "writers": [
                {{"type": "stdout", "format": "pretty", "min_level": "info"}},
                {{"type": "file", "filename": {}}}
            ],
            "min_level": "trace",
            "timestamp": false
        }}"#,
        serde_json::to_string(&log_file).unwrap()
    );
    let logger = compile(&registry, &config);
    assert!(log_file.exists(), "file is created at compile time");

    logger.debug("meow");
    assert!(stdout.contents().is_empty());

    logger.error("meow #2");
    assert_eq!(stdout.contents(), "<nil> ERR meow #2\n");

    let content = fs::read_to_string(&log_file).unwrap();
    let records: Vec<Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["level"], "debug");
    assert_eq!(records[0]["message"], "meow");
    assert_eq!(records[1]["level"], "error");
    assert_eq!(records[1]["message"], "meow #2");
}

#[test]
fn test_default_records_are_json_with_time() {
    let (registry, stdout, _) = captured_registry();
    let logger = compile(
        &registry,
        r#"{"writers": [{"type": "stdout"}], "caller": true}"#,
    );

    logger.warn("disk low");

    let line = stdout.contents();
    assert!(line.ends_with('\n'));
    assert_eq!(line.lines().count(), 1);
    let record: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(record["level"], "warn");
    assert_eq!(record["message"], "disk low");
    assert!(record["time"].is_string());
    assert!(record["caller"]
        .as_str()
        .unwrap()
        .starts_with("tests/integration_tests.rs:"));
}

#[test]
fn test_unknown_writer_reports_position() {
    let (registry, _, _) = captured_registry();
    let config = Config::from_json_str(
        r#"{"writers": [{"type": "stdout"}, {"type": "carrier-pigeon"}]}"#,
    )
    .unwrap();

    let err = config.compile_with(&registry).unwrap_err();
    assert_eq!(err.writer_index(), Some(2));
    assert_eq!(
        err.to_string(),
        "failed to parse config for writer #2: unknown writer type \"carrier-pigeon\""
    );
}

#[test]
fn test_sink_construction_error_kept_as_source() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "regular file").unwrap();
    let (registry, _, _) = captured_registry();
    let config = format!(
        r#"{{"writers": [{{"type": "stdout"}}, {{"type": "file", "filename": {}}}]}}"#,
        serde_json::to_string(&blocker.join("x.log")).unwrap()
    );

    let err = Config::from_json_str(&config)
        .unwrap()
        .compile_with(&registry)
        .unwrap_err();
    assert_eq!(err.writer_index(), Some(2));
    match err {
        LoggerError::WriterConfig { source, .. } => assert!(
            matches!(
                *source,
                LoggerError::IoOperation { .. } | LoggerError::FileAppenderError { .. }
            ),
            "unexpected source: {:?}",
            source
        ),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_custom_compiler_error_passed_through() {
    let (mut registry, _, _) = captured_registry();
    registry.register("vault", |_| Err(LoggerError::other("vault is sealed")));
    let config = Config::from_json_str(
        r#"{"writers": [{"type": "stderr"}, {"type": "stdout"}, {"type": "vault"}]}"#,
    )
    .unwrap();

    let err = config.compile_with(&registry).unwrap_err();
    assert_eq!(err.writer_index(), Some(3));
    assert_eq!(
        err.to_string(),
        format!(
            "failed to parse config for writer #3: {}",
            LoggerError::other("vault is sealed")
        )
    );
}

#[test]
fn test_pretty_colored_emits_escapes() {
    let (registry, stdout, _) = captured_registry();
    let logger = compile(
        &registry,
        r#"{"writers": [{"type": "stdout", "format": "pretty-colored"}], "timestamp": false}"#,
    );

    logger.error("boom");

    let output = stdout.contents();
    assert!(output.contains("\u{1b}["), "no color escapes in {:?}", output);
    assert!(output.contains("ERR"));
    assert!(output.contains("boom"));
    assert!(output.ends_with('\n'));
}

#[cfg(all(unix, feature = "journald"))]
#[test]
fn test_journald_compiles_without_daemon() {
    let (registry, _, _) = captured_registry();
    let config = Config::from_json_str(r#"{"writers": [{"type": "journald"}]}"#).unwrap();
    assert!(config.compile_with(&registry).is_ok());
}

#[test]
fn test_unknown_format_rejected() {
    let (registry, _, _) = captured_registry();
    let config =
        Config::from_json_str(r#"{"writers": [{"type": "stderr", "format": "xml"}]}"#).unwrap();

    let err = config.compile_with(&registry).unwrap_err();
    match err {
        LoggerError::WriterConfig { index, source } => {
            assert_eq!(index, 1);
            assert!(matches!(*source, LoggerError::UnknownFormat { .. }));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_invalid_time_format_rejected() {
    let (registry, _, _) = captured_registry();
    let config = Config::from_json_str(
        r#"{"writers": [{"type": "stdout", "format": "pretty", "time_format": "%Q"}]}"#,
    )
    .unwrap();
    assert!(config.compile_with(&registry).is_err());
}

#[test]
fn test_disabled_logger_writes_nothing() {
    let (registry, stdout, stderr) = captured_registry();
    let logger = compile(
        &registry,
        r#"{
            "writers": [{"type": "stdout"}, {"type": "stderr"}],
            "min_level": "disabled"
        }"#,
    );

    for level in LogLevel::ALL {
        logger.log(level, "silent");
    }
    assert!(stdout.contents().is_empty());
    assert!(stderr.contents().is_empty());
}

#[test]
fn test_custom_writer_kind() {
    let (mut registry, stdout, _) = captured_registry();
    registry.register("blackhole", |_| Ok(Sink::leveled(NopWriter)));

    let logger = compile(
        &registry,
        r#"{
            "writers": [
                {"type": "blackhole"},
                {"type": "stdout", "format": "pretty"}
            ],
            "timestamp": false
        }"#,
    );

    logger.info("still delivered");
    assert_eq!(stdout.contents(), "<nil> INF still delivered\n");
}

#[test]
fn test_redirected_registry_outputs() {
    let (mut registry, first, _) = captured_registry();
    let second = common::MemoryBuffer::default();
    registry.bind_outputs(rust_logger_config::OutputSlots {
        stdout: rust_logger_config::SharedWriter::new(second.clone()),
        stderr: rust_logger_config::SharedWriter::new(common::MemoryBuffer::default()),
    });

    let logger = compile(&registry, r#"{"writers": [{"type": "stdout"}]}"#);
    logger.info("moved");

    assert!(first.contents().is_empty());
    assert!(second.contents().contains("\"message\":\"moved\""));
}

#[test]
fn test_cloned_logger_shares_sinks() {
    let (registry, stdout, _) = captured_registry();
    let logger = compile(
        &registry,
        r#"{"writers": [{"type": "stdout", "format": "pretty"}], "timestamp": false}"#,
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let logger = logger.clone();
            std::thread::spawn(move || {
                for j in 0..25 {
                    logger.info(format!("worker {} record {}", i, j));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let content = stdout.contents();
    assert_eq!(content.lines().count(), 100);
    assert!(content.lines().all(|l| l.starts_with("<nil> INF worker ")));
}

#[cfg(all(unix, feature = "syslog"))]
#[test]
fn test_syslog_cee_writer_over_unixgram() {
    use std::os::unix::net::UnixDatagram;
    use std::time::Duration;

    let dir = TempDir::new().unwrap();
    let socket_path = dir.path().join("syslog.sock");
    let server = UnixDatagram::bind(&socket_path).unwrap();
    server
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    let (registry, _, _) = captured_registry();
    let config = format!(
        r#"{{
            "writers": [{{"type": "syslog-cee", "network": "unixgram", "host": {}, "tag": "it", "format": "pretty"}}],
            "timestamp": false
        }}"#,
        serde_json::to_string(&socket_path).unwrap()
    );
    let logger = compile(&registry, &config);
    logger.error("boom");

    let mut buf = [0u8; 1024];
    let n = server.recv(&mut buf).unwrap();
    let frame = String::from_utf8_lossy(&buf[..n]).into_owned();
    assert!(frame.starts_with("<3>"), "frame was {}", frame);
    assert!(frame.ends_with(": @cee:<nil> ERR boom\n"));
}
