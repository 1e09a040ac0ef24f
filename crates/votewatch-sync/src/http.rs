//! HTTP client for the governance API's proposal listing.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info};
use votewatch_core::ProposalId;

use crate::{FetchError, ProposalFilter, ProposalSource};

/// Client for `GET /api/v3/proposals`.
pub struct ProposalClient {
    client: reqwest::Client,
    api_url: String,
}

#[derive(Deserialize)]
struct ProposalsPage {
    data: Option<Vec<ProposalSummary>>,
}

#[derive(Deserialize)]
struct ProposalSummary {
    proposal_id: ProposalId,
}

impl ProposalClient {
    /// Create a client for the full listing endpoint, e.g.
    /// `https://ic-api.internetcomputer.org/api/v3/proposals` (no trailing slash).
    pub fn new(api_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn query(filter: &ProposalFilter) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![("include_reward_status", filter.reward_status.as_str())];
        pairs.extend(filter.topics.iter().map(|t| ("include_topic", t.as_str())));
        pairs
    }
}

#[async_trait]
impl ProposalSource for ProposalClient {
    async fn fetch(&self, filter: &ProposalFilter) -> Result<Vec<ProposalId>, FetchError> {
        info!(url = %self.api_url, topics = ?filter.topics, "fetching proposals");
        let resp = self
            .client
            .get(&self.api_url)
            .query(&Self::query(filter))
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "proposals request failed"))?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            error!(status = status.as_u16(), body = %body, "proposals API returned an error");
            return Err(FetchError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let page: ProposalsPage = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, body = %body, "unparseable proposals response");
            FetchError::Malformed {
                reason: e.to_string(),
                body: body.clone(),
            }
        })?;
        let Some(data) = page.data else {
            error!(body = %body, "proposals response has no data field");
            return Err(FetchError::Malformed {
                reason: "missing `data` field".into(),
                body,
            });
        };

        let ids: Vec<ProposalId> = data.into_iter().map(|p| p.proposal_id).collect();
        info!(count = ids.len(), "fetched proposals");
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn filter() -> ProposalFilter {
        ProposalFilter {
            topics: vec!["TOPIC_GOVERNANCE".into(), "TOPIC_NETWORK_ECONOMICS".into()],
            reward_status: "ACCEPT_VOTES".into(),
        }
    }

    fn client(server: &MockServer) -> ProposalClient {
        ProposalClient::new(format!("{}/api/v3/proposals", server.uri()))
    }

    #[tokio::test]
    async fn fetch_returns_ids_in_api_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/proposals"))
            .and(query_param("include_reward_status", "ACCEPT_VOTES"))
            .and(query_param("include_topic", "TOPIC_GOVERNANCE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "proposal_id": 134125, "title": "c" },
                    { "proposal_id": 134124, "title": "b" },
                    { "proposal_id": "134123", "title": "a" }
                ],
                "max_proposal_index": 134125
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ids = client(&server).fetch(&filter()).await.unwrap();
        assert_eq!(
            ids,
            vec![
                ProposalId::from("134125"),
                "134124".into(),
                "134123".into()
            ]
        );
    }

    #[tokio::test]
    async fn empty_data_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let ids = client(&server).fetch(&filter()).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn missing_data_field_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "detail": "rate limited" })),
            )
            .mount(&server)
            .await;

        let err = client(&server).fetch(&filter()).await.unwrap_err();
        match err {
            FetchError::Malformed { body, .. } => assert!(body.contains("rate limited")),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn entry_without_proposal_id_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "title": "x" }] })),
            )
            .mount(&server)
            .await;

        let err = client(&server).fetch(&filter()).await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server).fetch(&filter()).await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[tokio::test]
    async fn non_success_status_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client(&server).fetch(&filter()).await.unwrap_err();
        match err {
            FetchError::Server { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected Server, got {other:?}"),
        }
    }

    #[test]
    fn query_lists_every_topic() {
        let f = filter();
        let pairs = ProposalClient::query(&f);
        assert_eq!(
            pairs,
            vec![
                ("include_reward_status", "ACCEPT_VOTES"),
                ("include_topic", "TOPIC_GOVERNANCE"),
                ("include_topic", "TOPIC_NETWORK_ECONOMICS"),
            ]
        );
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = ProposalClient::new("http://localhost:4000/api/v3/proposals/".into());
        assert_eq!(client.api_url, "http://localhost:4000/api/v3/proposals");
    }
}
