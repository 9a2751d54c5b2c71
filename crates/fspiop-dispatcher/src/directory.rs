//! Participant directory implementations.

use std::collections::HashMap;

use async_trait::async_trait;

use fspiop_core::{
    EndpointType, FspiopError, ParticipantDirectory, ParticipantEndpoint, ParticipantInfo,
};

/// Fixed fsp-id to endpoint map, built from configuration pairs. Also the
/// directory used by the handler tests.
pub struct StaticParticipantDirectory {
    participants: HashMap<String, ParticipantInfo>,
}

impl StaticParticipantDirectory {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let participants = pairs
            .iter()
            .map(|(fsp_id, endpoint)| {
                (
                    fsp_id.clone(),
                    ParticipantInfo {
                        endpoints: vec![ParticipantEndpoint {
                            endpoint_type: EndpointType::Fspiop,
                            value: endpoint.clone(),
                        }],
                    },
                )
            })
            .collect();
        Self { participants }
    }
}

#[async_trait]
impl ParticipantDirectory for StaticParticipantDirectory {
    async fn get_participant_info(
        &self,
        fsp_id: &str,
    ) -> Result<Option<ParticipantInfo>, FspiopError> {
        Ok(self.participants.get(fsp_id).cloned())
    }
}

/// Directory backed by a central participant service.
pub struct HttpParticipantDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpParticipantDirectory {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }
}

#[async_trait]
impl ParticipantDirectory for HttpParticipantDirectory {
    async fn get_participant_info(
        &self,
        fsp_id: &str,
    ) -> Result<Option<ParticipantInfo>, FspiopError> {
        let url = format!("{}/participants/{}", self.base_url, fsp_id);
        let response = self.client.get(&url).send().await.map_err(|e| {
            FspiopError::Transport(format!("participant directory unreachable: {e}"))
        })?;

        // Absence is a domain answer, not a transport failure.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(FspiopError::Transport(format!(
                "participant directory returned {}",
                response.status()
            )));
        }

        let info = response.json::<ParticipantInfo>().await.map_err(|e| {
            FspiopError::Transport(format!("participant directory payload: {e}"))
        })?;
        Ok(Some(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_directory_hit_and_miss() {
        let directory = StaticParticipantDirectory::from_pairs(&[(
            "dfsp1".to_string(),
            "http://dfsp1.example".to_string(),
        )]);

        let info = directory.get_participant_info("dfsp1").await.unwrap();
        assert_eq!(
            info.unwrap().fspiop_endpoint(),
            Some("http://dfsp1.example")
        );

        let missing = directory.get_participant_info("dfsp9").await.unwrap();
        assert!(missing.is_none());
    }
}
