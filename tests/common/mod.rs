#![allow(dead_code)]

pub mod temp_files {
    use std::io::Write;

    use tempfile::NamedTempFile;

    /// Write `content` to a temporary file with the given extension. The file
    /// is removed when the handle drops.
    pub fn create_temp_config(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("brrtcors_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        create_temp_config(content, "yaml")
    }

    pub fn create_temp_toml(content: &str) -> NamedTempFile {
        create_temp_config(content, "toml")
    }

    pub fn create_temp_json(content: &str) -> NamedTempFile {
        create_temp_config(content, "json")
    }
}

pub mod requests {
    use std::sync::Arc;

    use brrtcors::dispatcher::{Dispatcher, HandlerResponse, HeaderVec};

    /// The CORS header names checked by the fixture suites.
    pub const CORS_HEADERS: [&str; 6] = [
        "access-control-allow-origin",
        "access-control-allow-methods",
        "access-control-allow-headers",
        "access-control-allow-credentials",
        "access-control-expose-headers",
        "vary",
    ];

    pub fn headers(pairs: &[(&str, &str)]) -> HeaderVec {
        pairs
            .iter()
            .map(|(k, v)| (Arc::from(*k), v.to_string()))
            .collect()
    }

    /// Register every address with a handler answering `200`.
    pub fn ok_dispatcher(addresses: &[&str]) -> Dispatcher {
        let mut dispatcher = Dispatcher::new();
        for address in addresses {
            dispatcher
                .add_route(address, address, |_req| HandlerResponse::ok())
                .unwrap();
        }
        dispatcher
    }
}
