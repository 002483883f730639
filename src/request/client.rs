use chrono::Utc;
use log::debug;
use reqwest::Client;

use crate::config::Credentials;
use crate::pipeline::FetchWindow;
use crate::request::FetchError;
use crate::third_party::okx::{
    api_path::{
        HEADER_ACCESS_KEY, HEADER_ACCESS_PASSPHRASE, HEADER_ACCESS_SIGN, HEADER_ACCESS_TIMESTAMP,
        OKX_FUNDING_RATE_HISTORY_PATH, OKX_SUCCESS_CODE,
    },
    data::{ApiFundingRateHistoryResponse, RawFundingRecord},
    sign::{access_timestamp, sign},
};

const METHOD_GET: &str = "GET";

/// A fully built GET request. `request_path` is both what gets signed and
/// what gets requested.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedRequest {
    pub url: String,
    pub request_path: String,
    pub headers: Vec<(&'static str, String)>,
}

#[derive(Debug, Clone)]
pub struct OkxClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl OkxClient {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn request_path(instrument_id: &str, window: FetchWindow) -> String {
        format!(
            "{OKX_FUNDING_RATE_HISTORY_PATH}?instId={instrument_id}&after={}&before={}",
            window.after, window.before
        )
    }

    pub fn build_request(
        &self,
        instrument_id: &str,
        window: FetchWindow,
        timestamp: &str,
    ) -> Result<SignedRequest, FetchError> {
        let request_path = Self::request_path(instrument_id, window);
        let signature = sign(
            &self.credentials.secret_key,
            timestamp,
            METHOD_GET,
            &request_path,
            "",
        )
        .map_err(|e| FetchError::Signing(e.to_string()))?;

        Ok(SignedRequest {
            url: format!("{}{}", self.base_url, request_path),
            headers: vec![
                ("Content-Type", "application/json".to_string()),
                (HEADER_ACCESS_KEY, self.credentials.api_key.clone()),
                (HEADER_ACCESS_PASSPHRASE, self.credentials.passphrase.clone()),
                (HEADER_ACCESS_SIGN, signature),
                (HEADER_ACCESS_TIMESTAMP, timestamp.to_string()),
            ],
            request_path,
        })
    }

    pub async fn funding_rate_history(
        &self,
        instrument_id: &str,
        window: FetchWindow,
    ) -> Result<Vec<RawFundingRecord>, FetchError> {
        let request = self.build_request(instrument_id, window, &access_timestamp(Utc::now()))?;
        debug!("GET {}", request.url);

        let mut builder = self.http.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        let response = builder.send().await?.error_for_status()?.text().await?;
        decode_history(&response)
    }
}

pub fn decode_history(body: &str) -> Result<Vec<RawFundingRecord>, FetchError> {
    let parsed: ApiFundingRateHistoryResponse = serde_json::from_str(body)?;
    if let Some(code) = parsed.code.filter(|c| c != OKX_SUCCESS_CODE) {
        return Err(FetchError::Api {
            code,
            msg: parsed.msg.unwrap_or_default(),
        });
    }
    parsed.data.ok_or(FetchError::MissingData)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OkxClient {
        OkxClient::new(
            "https://www.okx.com/",
            Credentials {
                api_key: "key".to_string(),
                secret_key: "secret".to_string(),
                passphrase: "phrase".to_string(),
            },
        )
    }

    fn header<'a>(request: &'a SignedRequest, name: &str) -> Option<&'a str> {
        request
            .headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_signed_path_matches_requested_path() {
        let window = FetchWindow {
            after: 1730505599999,
            before: 1730419200000,
        };
        let request = client()
            .build_request("BTC-USDT-SWAP", window, "2024-11-01T00:00:00.000Z")
            .unwrap();

        assert_eq!(
            request.request_path,
            "/api/v5/public/funding-rate-history?instId=BTC-USDT-SWAP&after=1730505599999&before=1730419200000"
        );
        assert_eq!(
            request.url,
            format!("https://www.okx.com{}", request.request_path)
        );
        assert_eq!(
            header(&request, "OK-ACCESS-SIGN"),
            Some("JjWy7Pc/xptoRjxHJYwrA7gtgU3vq3s5LvtENBWBxjA=")
        );
        assert_eq!(header(&request, "OK-ACCESS-KEY"), Some("key"));
        assert_eq!(header(&request, "OK-ACCESS-PASSPHRASE"), Some("phrase"));
        assert_eq!(
            header(&request, "OK-ACCESS-TIMESTAMP"),
            Some("2024-11-01T00:00:00.000Z")
        );
        assert_eq!(header(&request, "Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_decode_history() {
        let body = r#"{
            "code": "0",
            "msg": "",
            "data": [
                {"fundingRate": "0.0001", "realizedRate": "0.00009", "fundingTime": "1730448000000", "instId": "BTC-USDT-SWAP", "method": "next_period"},
                {"fundingRate": "-0.0002", "realizedRate": "-0.0002", "fundingTime": "1730419200000", "nextFundingTime": "1730433600000"}
            ]
        }"#;

        let records = decode_history(body).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].funding_rate, "0.0001");
        assert_eq!(records[0].next_funding_time, None);
        assert_eq!(records[1].next_funding_time.as_deref(), Some("1730433600000"));
    }

    #[test]
    fn test_decode_empty_data_is_not_an_error() {
        let records = decode_history(r#"{"code":"0","msg":"","data":[]}"#).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_decode_api_error() {
        let err = decode_history(r#"{"code":"51001","msg":"Instrument ID does not exist","data":[]}"#)
            .unwrap_err();
        match err {
            FetchError::Api { code, msg } => {
                assert_eq!(code, "51001");
                assert_eq!(msg, "Instrument ID does not exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_malformed_body() {
        assert!(matches!(
            decode_history("<html>bad gateway</html>"),
            Err(FetchError::Decode(_))
        ));
        assert!(matches!(
            decode_history(r#"{"code":"0"}"#),
            Err(FetchError::MissingData)
        ));
        assert!(matches!(
            decode_history(r#"{"data":[{"fundingRate":"0.1"}]}"#),
            Err(FetchError::Decode(_))
        ));
    }
}
