//! UITF daily NAVPU provider.
//!
//! Fetches the `thlabels` JSON that uitf.com.ph serves for one fund over a
//! date window. One blocking GET per instrument, no retries: a failed fetch
//! skips the instrument for this run.

use chrono::{Datelike, NaiveDate};
use log::debug;

use crate::catalog::{InstrumentSpec, SourceSpec};
use crate::config::UitfConfig;
use crate::provider::{FetchError, PayloadProvider};

/// Blocking HTTP provider for UITF funds.
pub struct UitfProvider {
    client: reqwest::blocking::Client,
    config: UitfConfig,
}

impl UitfProvider {
    pub fn new(config: UitfConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn url_for(&self, bank_id: &str, fund_id: &str) -> String {
        navpu_url(
            &self.config.base_url,
            bank_id,
            fund_id,
            self.config.from,
            self.config.to,
        )
    }
}

/// Build the NAVPU endpoint URL for a fund and an inclusive date window.
pub fn navpu_url(
    base_url: &str,
    bank_id: &str,
    fund_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> String {
    format!(
        "{base_url}?bank_id={bank_id}&fund_id={fund_id}\
         &fmonth={:02}&fday={:02}&fyear={}\
         &tmonth={:02}&tday={:02}&tyear={}&btn=Filter",
        from.month(),
        from.day(),
        from.year(),
        to.month(),
        to.day(),
        to.year(),
    )
}

impl PayloadProvider for UitfProvider {
    fn name(&self) -> &str {
        "uitf"
    }

    fn fetch(&self, spec: &InstrumentSpec) -> Result<String, FetchError> {
        let SourceSpec::Uitf { bank_id, fund_id } = &spec.source else {
            return Err(FetchError::Unsupported {
                provider: "uitf",
                name: spec.name.clone(),
            });
        };

        let url = self.url_for(bank_id, fund_id);
        debug!("{}: GET {url}", spec.name);

        let response = self.client.get(&url).send().map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(e.to_string())
            } else {
                FetchError::NetworkUnreachable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        response
            .text()
            .map_err(|e| FetchError::NetworkUnreachable(format!("reading body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use fundseries_core::{Category, SourceFormat};

    /// Accept one connection and answer it with `response`, or drop it when
    /// `response` is `None`.
    fn one_shot_server(response: Option<&'static str>) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            if let Some(response) = response {
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });
        (format!("http://{addr}/x"), handle)
    }

    fn provider_for(base_url: String) -> UitfProvider {
        UitfProvider::new(UitfConfig {
            base_url,
            timeout_secs: 5,
            ..UitfConfig::default()
        })
        .unwrap()
    }

    fn uitf_spec() -> InstrumentSpec {
        let mut spec =
            InstrumentSpec::new("Live Fund", Category::Uitf, SourceFormat::LabeledJsonBlob);
        spec.source = SourceSpec::Uitf {
            bank_id: "1".into(),
            fund_id: "2".into(),
        };
        spec
    }

    #[test]
    fn non_success_status_maps_to_http_status() {
        let (base_url, server) = one_shot_server(Some(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        ));
        let result = provider_for(base_url).fetch(&uitf_spec());
        server.join().unwrap();

        match result {
            Err(FetchError::HttpStatus { status, url }) => {
                assert_eq!(status, 500);
                assert!(url.contains("bank_id=1&fund_id=2"), "{url}");
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[test]
    fn success_returns_body_text() {
        let (base_url, server) = one_shot_server(Some(
            "HTTP/1.1 200 OK\r\nContent-Length: 16\r\nConnection: close\r\n\r\n{\"thlabels\": []}",
        ));
        let body = provider_for(base_url).fetch(&uitf_spec()).unwrap();
        server.join().unwrap();
        assert_eq!(body, "{\"thlabels\": []}");
    }

    #[test]
    fn dropped_connection_is_unreachable() {
        let (base_url, server) = one_shot_server(None);
        let result = provider_for(base_url).fetch(&uitf_spec());
        server.join().unwrap();
        assert!(
            matches!(result, Err(FetchError::NetworkUnreachable(_))),
            "{result:?}"
        );
    }

    #[test]
    fn url_carries_ids_and_zero_padded_window() {
        let config = UitfConfig::default();
        let url = navpu_url(&config.base_url, "21", "105", config.from, config.to);
        assert_eq!(
            url,
            "http://www.uitf.com.ph/daily_navpu_details_json.php?bank_id=21&fund_id=105\
             &fmonth=01&fday=01&fyear=1970&tmonth=12&tday=31&tyear=2030&btn=Filter"
        );
    }

    #[test]
    fn file_sources_are_not_served() {
        let provider = UitfProvider::new(UitfConfig::default()).unwrap();
        let spec =
            InstrumentSpec::new("Saved Fund", Category::Uitf, SourceFormat::LabeledJsonBlob);
        assert!(matches!(
            provider.fetch(&spec),
            Err(FetchError::Unsupported { .. })
        ));
    }
}
