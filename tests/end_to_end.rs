use std::{
    ffi::OsStr,
    io::{self, Write},
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use address_tally::{
    ThreadPool,
    app::{self, AppError, tally},
    config::Config,
    error::{IngestError, ParseError},
    source::XmlSource,
};
use clap::Parser;
use tempfile::NamedTempFile;

fn xml_file(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n{body}</root>\n"
    )
    .unwrap();
    file
}

#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let capture = LogCapture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    (result, logs)
}

fn run(path: &Path) -> (Result<(), AppError>, String) {
    let config = Config::try_parse_from([
        OsStr::new("address-tally"),
        OsStr::new("--workers"),
        OsStr::new("4"),
        path.as_os_str(),
    ])
    .unwrap();
    let mut out = Vec::new();
    let result = app::run(&config, &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn prints_full_report() {
    let file = xml_file(
        r#"<item city="CityA" street="St1" house="10" floor="3"/>
<item city="CityA" street="St1" house="10" floor="3"/>
<item city="CityA" street="St2" house="11" floor="5"/>
<item city="CityB" street="St3" house="20" floor="3"/>
"#,
    );
    let (result, out) = run(file.path());
    result.unwrap();
    assert_eq!(
        out,
        "Processing. Please, wait...\n\
         I. Duplicate entries\n\
         1. City: CityA, Street: St1 House: 10, Floor: 3. Number of repetitions: 2\n\
         \n\
         II. Information on the number of buildings with 1, 2, 3, 4 5 floors\n\
         1. CityA\n \
         3-floor(s): 2\n \
         5-floor(s): 1\n\
         2. CityB\n \
         3-floor(s): 1\n"
    );
}

#[test]
fn empty_input_prints_empty_sections() {
    let file = xml_file("");
    let (result, out) = run(file.path());
    result.unwrap();
    assert_eq!(
        out,
        "Processing. Please, wait...\n\
         I. Duplicate entries\n\
         \n\
         II. Information on the number of buildings with 1, 2, 3, 4 5 floors\n"
    );
}

#[test]
fn missing_file_fails_before_processing() {
    let dir = tempfile::tempdir().unwrap();
    let (result, out) = run(&dir.path().join("absent.xml"));
    let err = result.unwrap_err();
    assert!(matches!(err, AppError::Startup(_)));
    assert_eq!(
        err.to_string(),
        "File reading error. Please, check the path to file and restart application"
    );
    assert!(out.is_empty());
}

#[test]
fn malformed_number_aborts_without_report() {
    let file = xml_file(
        r#"<item city="A" street="S" house="1" floor="2"/>
<item city="A" street="S" house="1" floor="two"/>
"#,
    );
    let (result, out) = run(file.path());
    assert!(matches!(
        result,
        Err(AppError::Ingest(IngestError::Parse(
            ParseError::InvalidNumber { field: "floor", .. }
        )))
    ));
    assert_eq!(out, "Processing. Please, wait...\n");
}

#[test]
fn broken_markup_aborts_without_report() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        "<root><item city=\"A\" street=\"S\" house=\"1\" floor=\"2\"></root>",
    )
    .unwrap();
    let (result, out) = run(file.path());
    assert!(matches!(
        result,
        Err(AppError::Ingest(IngestError::Parse(ParseError::Xml(_))))
    ));
    assert!(!out.contains("I. Duplicate entries"));
}

#[test]
fn truncated_file_aborts_without_report() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        r#"<root><item city="A" street="S" house="1" floor="2"/><item city="B" street="S" house="1" floor="2"/>"#,
    )
    .unwrap();
    let (result, out) = run(file.path());
    let err = result.unwrap_err();
    assert!(matches!(
        err,
        AppError::Ingest(IngestError::Parse(ParseError::UnclosedDocument { open: 1 }))
    ));
    assert_eq!(
        err.to_string(),
        "unexpected end of document: 1 element(s) left unclosed"
    );
    assert_eq!(out, "Processing. Please, wait...\n");
}

#[test]
fn timed_out_drain_still_reports() {
    let slow = ThreadPool::new(1);
    slow.execute(|| std::thread::sleep(Duration::from_millis(300)))
        .unwrap();
    let file = xml_file(r#"<item city="A" street="S" house="1" floor="2"/>"#);
    let source = XmlSource::open(file.path()).unwrap();

    let (tally, logs) =
        with_captured_logs(|| tally(source, slow, Duration::from_millis(10)).unwrap());
    assert!(logs.contains("WARN"));
    assert!(logs.contains("thread pool did not drain before timeout"));
    assert!(!tally.drain.completed);
    assert!(tally.drain.pending >= 2);
    assert_eq!(tally.summary.records, 1);
    assert_eq!(tally.report.duplicates().count(), 0);
}
