//! Library events reach the CLI's `log` backend

use criteria_cli::{commands, load_store};
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::json;
use std::sync::{Arc, Mutex};
use ticket_criteria::CriteriaCompiler;

struct CaptureLogger {
    records: Mutex<Vec<(Level, String, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records.lock().unwrap().push((
            record.level(),
            record.target().to_string(),
            record.args().to_string(),
        ));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    records: Mutex::new(Vec::new()),
};

#[tokio::test]
async fn test_unknown_key_is_logged_at_debug() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Debug);

    let compiler = CriteriaCompiler::new(Arc::new(load_store(None).unwrap()));
    let output = commands::compile(&compiler, &json!({"bogus_key": 1, "merged": true}), false)
        .await
        .unwrap();
    assert_eq!(output, json!([["merged", "set", null]]));

    let records = LOGGER.records.lock().unwrap();
    assert!(
        records.iter().any(|(level, target, message)| *level == Level::Debug
            && target.starts_with("ticket_criteria")
            && message.contains("Ignoring unknown criteria key: bogus_key")),
        "{:?}",
        *records
    );
}
