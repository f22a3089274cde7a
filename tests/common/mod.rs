//! Common test utilities and fixtures

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use stock_runner::common::traits::Notifier;
use stock_runner::common::types::AlertClass;
use stock_runner::RunnerPaths;

/// Notifier that keeps every call for inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(Vec<String>, Option<AlertClass>)>>,
}

impl RecordingNotifier {
    pub fn calls(&self) -> Vec<(Vec<String>, Option<AlertClass>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, lines: &[String], image: Option<AlertClass>) {
        self.calls.lock().unwrap().push((lines.to_vec(), image));
    }
}

/// Configuration with one index, one equity and `east` pointed at `east_base`
pub fn config_json(east_base: &str, down: f64) -> String {
    format!(
        r#"{{
    "indices": ["000001"],
    "codes": ["600519"],
    "threshold": {{ "indices": [1.0], "up": 1.0, "down": {down} }},
    "delay": 3,
    "endpoints": {{ "east": "{east_base}" }}
}}"#
    )
}

/// Write the configuration under the standard layout of `home`
pub fn write_config(home: &Path, body: &str) -> RunnerPaths {
    let paths = RunnerPaths::under(home);
    fs::create_dir_all(paths.config_file.parent().unwrap()).unwrap();
    fs::write(&paths.config_file, body).unwrap();
    paths
}

/// Sample provider bodies
pub mod bodies {
    pub const EAST_PATH: &str = "/api/qt/ulist.np/get";

    /// 上证 +0.39, 贵州茅台 -1.02
    pub const EAST_OK: &str = r#"qa_wap_jsonpCB1737645019281({"rc":0,"data":{"total":2,"diff":[{"f2":1688.0,"f3":-1.02,"f12":"600519","f13":1,"f14":"贵州茅台"},{"f2":3250.12,"f3":0.39,"f12":"000001","f13":1,"f14":"上证指数"}]}});"#;

    /// 贵州茅台 without a percent figure
    pub const EAST_NULL_VALUE: &str = r#"qa_wap_jsonpCB1737645019281({"rc":0,"data":{"total":2,"diff":[{"f2":1688.0,"f3":null,"f12":"600519","f13":1,"f14":"贵州茅台"},{"f2":3250.12,"f3":0.39,"f12":"000001","f13":1,"f14":"上证指数"}]}});"#;

    pub const EAST_GARBLED: &str = "qa_wap_jsonpCB1737645019281({\"rc\":0,\"data\":";
}
