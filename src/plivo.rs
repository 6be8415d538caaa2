use crate::error::AppError;
use crate::plivo_types::{CallRequest, LiveConference, Member, SpeakRequest};
use crate::types::AppState;

use reqwest::{StatusCode, Url};
use tracing::{debug, error, trace};

impl AppState {
    /// `<api>/v1/Account/<auth id>/<segments..>/`.  Every segment is percent-encoded on its own,
    /// so caller-supplied ids cannot climb out of the account or add a query string.
    fn plivo_url(&self, segments: &[&str]) -> Result<Url, AppError> {
        if segments
            .iter()
            .any(|s| s.is_empty() || *s == "." || *s == "..")
        {
            return Err(AppError::Request("invalid plivo resource id"));
        }
        let mut url = Url::parse(&self.config.plivo_api_url).map_err(|e| {
            error!(error=%e, "invalid plivo api url");
            AppError::Plivo("api url")
        })?;
        url.path_segments_mut()
            .map_err(|_| AppError::Plivo("api url"))?
            .pop_if_empty()
            .extend(["v1", "Account", self.config.plivo_auth_id.as_str()])
            .extend(segments)
            .push("");
        Ok(url)
    }

    fn plivo_request(
        &self,
        method: reqwest::Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, AppError> {
        Ok(self
            .http_client
            .request(method, self.plivo_url(segments)?)
            .basic_auth(
                &self.config.plivo_auth_id,
                Some(&self.config.plivo_auth_token),
            ))
    }

    /// Ask Plivo to dial out.  The status is returned as-is; Plivo answers 201 when the call
    /// was queued.
    pub async fn make_call(&self, call: &CallRequest) -> Result<StatusCode, AppError> {
        debug!(to=%call.to, answer_url=%call.answer_url, "requesting outbound call");
        let resp = self
            .plivo_request(reqwest::Method::POST, &["Call"])?
            .json(call)
            .send()
            .await
            .map_err(|e| {
                error!(error=%e, "failed to send call request to plivo");
                AppError::Plivo("call api")
            })?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        trace!(status=%status, body=%body, "plivo call response");
        Ok(status)
    }

    /// Speak text into a live call.
    pub async fn speak(&self, call_uuid: &str, text: &str) -> Result<StatusCode, AppError> {
        let resp = self
            .plivo_request(reqwest::Method::POST, &["Call", call_uuid, "Speak"])?
            .json(&SpeakRequest {
                text: text.to_string(),
            })
            .send()
            .await
            .map_err(|e| {
                error!(error=%e, call_uuid=%call_uuid, "failed to send speak request to plivo");
                AppError::Plivo("speak api")
            })?;
        Ok(resp.status())
    }

    /// Current members of a live conference.  A conference Plivo does not know about is not
    /// live, so it has no members; every other failure is an error.
    pub async fn conference_members(&self, conference_name: &str) -> Result<Vec<Member>, AppError> {
        let resp = self
            .plivo_request(reqwest::Method::GET, &["Conference", conference_name])?
            .send()
            .await
            .map_err(|e| {
                error!(error=%e, "failed to query live conference");
                AppError::Plivo("live conference api")
            })?;
        match resp.status() {
            StatusCode::NOT_FOUND => {
                debug!(conference=%conference_name, "conference is not live");
                Ok(vec![])
            }
            status if status.is_success() => {
                let conference: LiveConference = resp.json().await.map_err(|e| {
                    error!(error=%e, "failed to deserialize live conference");
                    AppError::Plivo("malformed live conference")
                })?;
                Ok(conference.members)
            }
            status => {
                error!(status=%status, conference=%conference_name, "live conference query failed");
                Err(AppError::Plivo("live conference status"))
            }
        }
    }

    /// Destination number of one conference member, if that member is still connected.
    pub async fn conference_member_number(
        &self,
        conference_name: &str,
        member_id: &str,
    ) -> Result<Option<String>, AppError> {
        let members = self.conference_members(conference_name).await?;
        Ok(members
            .into_iter()
            .find(|m| m.member_id == member_id)
            .map(|m| m.to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn state(api_url: &str) -> AppState {
        let config = Config::from_lookup(|key| {
            match key {
                "PLIVO_AUTH_ID" => Some("MAID"),
                "PLIVO_AUTH_TOKEN" => Some("token"),
                "PLIVO_NUMBER" => Some("15550001111"),
                "PUSHER_APP_ID" => Some("3"),
                "PUSHER_KEY" => Some("key"),
                "PUSHER_SECRET" => Some("secret"),
                "BASE_URL" => Some("https://collaborate.example.com/"),
                "PLIVO_API_URL" => Some(api_url),
                _ => None,
            }
            .map(str::to_string)
        })
        .unwrap();
        AppState::new(config, Arc::new(MemoryStore::new()))
    }

    #[test]
    fn resource_ids_stay_inside_their_segment() {
        let state = state("https://api.plivo.com");
        let url = state
            .plivo_url(&["Call", "../../Message/?q=1#x", "Speak"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.plivo.com/v1/Account/MAID/Call/..%2F..%2FMessage%2F%3Fq=1%23x/Speak/"
        );
        assert!(url.query().is_none());
    }

    #[test]
    fn dot_segments_are_rejected() {
        let state = state("https://api.plivo.com");
        for id in ["", ".", ".."] {
            assert!(matches!(
                state.plivo_url(&["Conference", id]),
                Err(AppError::Request(_))
            ));
        }
    }

    #[test]
    fn keeps_api_url_prefix() {
        let state = state("http://127.0.0.1:8080/plivo");
        assert_eq!(
            state.plivo_url(&["Call"]).unwrap().as_str(),
            "http://127.0.0.1:8080/plivo/v1/Account/MAID/Call/"
        );
    }
}
