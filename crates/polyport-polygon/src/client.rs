//! The Polygon REST client

use std::path::Path;

use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use polyport_config::PolygonConfig;

use crate::error::{PolygonError, PolygonResult};
use crate::sign;
use crate::types::{Package, Problem};

/// Signed client for `https://polygon.codeforces.com/api/`
#[derive(Debug, Clone)]
pub struct PolygonClient {
    http: reqwest::Client,
    config: PolygonConfig,
}

impl PolygonClient {
    pub fn new(config: PolygonConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}{method}", self.config.api_url)
    }

    /// POST a signed request; parameters travel in the query string
    async fn call(
        &self,
        method: &str,
        params: Vec<(String, String)>,
    ) -> PolygonResult<reqwest::Response> {
        let signed = sign::sign(method, params, &self.config.api_key, &self.config.api_secret);
        let response = self
            .http
            .post(self.endpoint(method))
            .query(&signed)
            .send()
            .await?;
        Ok(response)
    }

    /// POST a signed request and unwrap the `{status, result}` envelope
    async fn call_json<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<(String, String)>,
    ) -> PolygonResult<T> {
        let response = self.call(method, params).await?;
        let code = response.status().as_u16();
        let body = response.text().await?;

        let envelope: serde_json::Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(_) => return Err(PolygonError::BadResponse { code, body }),
        };

        let Some(status) = envelope.get("status").and_then(|s| s.as_str()) else {
            return Err(PolygonError::BadResponse { code, body });
        };

        if status != "OK" {
            let comment = envelope
                .get("comment")
                .and_then(|c| c.as_str())
                .unwrap_or("no comment")
                .to_string();
            return Err(PolygonError::Failed { comment });
        }

        let result = envelope
            .get("result")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        serde_json::from_value(result).map_err(|_| PolygonError::BadResponse { code, body })
    }

    /// `problems.list` narrowed to a single id
    pub async fn problem(&self, problem_id: i64) -> PolygonResult<Problem> {
        let mut problems: Vec<Problem> = self
            .call_json(
                "problems.list",
                vec![("id".to_string(), problem_id.to_string())],
            )
            .await?;

        if problems.is_empty() {
            return Err(PolygonError::ProblemNotFound {
                id: problem_id,
                user: self.config.user.clone(),
            });
        }
        if problems.len() > 1 {
            return Err(PolygonError::AmbiguousProblem { id: problem_id });
        }
        Ok(problems.remove(0))
    }

    /// `problem.packages`: every package generated for the problem
    pub async fn problem_packages(&self, problem_id: i64) -> PolygonResult<Vec<Package>> {
        self.call_json(
            "problem.packages",
            vec![("problemId".to_string(), problem_id.to_string())],
        )
        .await
    }

    /// `problem.package`: stream one package ZIP to `destination`
    pub async fn save_package(
        &self,
        problem_id: i64,
        package_id: i64,
        destination: &Path,
        kind: &str,
    ) -> PolygonResult<()> {
        let response = self
            .call(
                "problem.package",
                vec![
                    ("problemId".to_string(), problem_id.to_string()),
                    ("packageId".to_string(), package_id.to_string()),
                    ("type".to_string(), kind.to_string()),
                ],
            )
            .await?;

        if response.status().as_u16() != 200 {
            return Err(PolygonError::UnexpectedStatus(response.status().as_u16()));
        }

        let mut file = tokio::fs::File::create(destination).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use mockito::Matcher;

    fn client(server: &mockito::ServerGuard) -> PolygonClient {
        PolygonClient::new(PolygonConfig {
            api_url: format!("{}/", server.url()),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            user: "importer".to_string(),
        })
    }

    const PROBLEM_JSON: &str = r#"{
        "id": 42, "owner": "author", "name": "A plus B",
        "deleted": false, "favourite": false, "accessType": "OWNER",
        "revision": 7, "modified": false, "latestPackage": 7
    }"#;

    #[tokio::test]
    async fn problem_parses_a_single_result() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/problems.list")
            .match_query(Matcher::Any)
            .with_body(format!(r#"{{"status":"OK","result":[{PROBLEM_JSON}]}}"#))
            .create_async()
            .await;

        let problem = client(&server).problem(42).await.unwrap();
        assert_eq!(problem.name, "A plus B");
        assert_eq!(problem.latest_package, Some(7));
    }

    #[tokio::test]
    async fn empty_result_means_missing_or_inaccessible() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/problems.list")
            .match_query(Matcher::Any)
            .with_body(r#"{"status":"OK","result":[]}"#)
            .create_async()
            .await;

        let error = client(&server).problem(42).await.unwrap_err();
        assert!(matches!(error, PolygonError::ProblemNotFound { id: 42, .. }));
    }

    #[tokio::test]
    async fn failed_status_carries_the_comment() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/problems.list")
            .match_query(Matcher::Any)
            .with_body(r#"{"status":"FAILED","comment":"apiKey is invalid"}"#)
            .create_async()
            .await;

        let error = client(&server).problem(42).await.unwrap_err();
        assert!(matches!(
            error,
            PolygonError::Failed { comment } if comment == "apiKey is invalid"
        ));
    }

    #[tokio::test]
    async fn non_json_body_reports_http_code_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/problems.list")
            .match_query(Matcher::Any)
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let error = client(&server).problem(42).await.unwrap_err();
        assert!(matches!(
            error,
            PolygonError::BadResponse { code: 502, body } if body == "Bad Gateway"
        ));
    }

    #[tokio::test]
    async fn save_package_streams_the_body_to_disk() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/problem.package")
            .match_query(Matcher::Any)
            .with_body(b"PK\x03\x04fake-zip".to_vec())
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("archive.zip");
        client(&server)
            .save_package(42, 7, &destination, "linux")
            .await
            .unwrap();

        assert_eq!(std::fs::read(&destination).unwrap(), b"PK\x03\x04fake-zip");
    }

    #[tokio::test]
    async fn save_package_rejects_non_200() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/problem.package")
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let error = client(&server)
            .save_package(42, 7, &dir.path().join("archive.zip"), "linux")
            .await
            .unwrap_err();
        assert!(matches!(error, PolygonError::UnexpectedStatus(403)));
    }
}
