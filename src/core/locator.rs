use crate::core::gemini::GeminiClient;
use crate::core::sanitize::sanitize_value;
use crate::domain::generation::{
    Content, GenerateRequest, GoogleMaps, LatLng, Part, RetrievalConfig, Tool, ToolConfig,
};
use crate::domain::model::StoreLocation;
use crate::domain::ports::{ConfigProvider, GenerativeModel};
use crate::utils::error::{AushadhError, Result};
use crate::utils::validation::validate_coordinates;

pub const DEFAULT_STORE_NAME: &str = "Jan Aushadhi Kendra";
const VERIFIED_LOCATION: &str = "Jan Aushadhi Kendra (Verified Location)";
const MIN_ADDRESS_LEN: usize = 5;

pub fn fallback_map_uri(lat: f64, lng: f64) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query=Jan+Aushadhi+Kendra+near+{},{}",
        lat, lng
    )
}

pub struct StoreLocator<M: GenerativeModel> {
    model: M,
    locator_model: String,
}

impl<M: GenerativeModel> StoreLocator<M> {
    pub fn new(model: M, config: &impl ConfigProvider) -> Self {
        Self {
            model,
            locator_model: config.locator_model().to_string(),
        }
    }

    /// Nearest Kendra to the given position. `Ok(None)` means the model had
    /// no answer at all, which callers show as "no store found".
    pub async fn find_nearest(&self, lat: f64, lng: f64) -> Result<Option<StoreLocation>> {
        validate_coordinates(lat, lng)?;
        tracing::info!("Looking up nearest Kendra to {:.4}, {:.4}", lat, lng);

        let prompt = format!(
            "Find the nearest 'Pradhan Mantri Bhartiya Janaushadhi Kendra' to location {}, {}.",
            lat, lng
        );
        let request = GenerateRequest {
            contents: vec![Content::user(vec![Part::text(prompt)])],
            tools: Some(vec![Tool {
                google_maps: Some(GoogleMaps::default()),
            }]),
            tool_config: Some(ToolConfig {
                retrieval_config: RetrievalConfig {
                    lat_lng: LatLng {
                        latitude: lat,
                        longitude: lng,
                    },
                },
            }),
            ..Default::default()
        };

        let response = self.model.generate(&self.locator_model, &request).await?;
        let Some(candidate) = response.candidates.first() else {
            tracing::warn!("Locator returned no candidates");
            return Ok(None);
        };

        let mut name = DEFAULT_STORE_NAME.to_string();
        let mut map_uri = fallback_map_uri(lat, lng);
        let mut snippets: Vec<String> = Vec::new();

        let chunks = candidate
            .grounding_metadata
            .as_ref()
            .map(|m| m.grounding_chunks.as_slice())
            .unwrap_or_default();

        for maps in chunks.iter().filter_map(|c| c.maps.as_ref()) {
            if let Some(uri) = maps.uri.as_deref().filter(|u| !u.is_empty()) {
                map_uri = uri.to_string();
            }
            if let Some(title) = maps.title.as_deref().filter(|t| !t.is_empty()) {
                name = title.to_string();
            }
            if let Some(sources) = &maps.place_answer_sources {
                snippets.extend(
                    sources
                        .review_snippets
                        .iter()
                        .map(sanitize_value)
                        .filter(|s| !s.is_empty()),
                );
            }
        }
        tracing::debug!("Grounding: {} chunk(s), {} snippet(s)", chunks.len(), snippets.len());

        let mut address = response.text().replace('*', "").trim().to_string();
        if address.chars().count() < MIN_ADDRESS_LEN {
            address = if snippets.is_empty() {
                VERIFIED_LOCATION.to_string()
            } else {
                format!("{}: {}", VERIFIED_LOCATION, snippets.join(". "))
            };
        }

        Ok(Some(StoreLocation {
            name,
            address,
            map_uri,
        }))
    }
}

/// What the user sees after a lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LocateOutcome {
    Found(StoreLocation),
    NotFound,
    LocationUnavailable,
    Failed,
}

impl LocateOutcome {
    pub fn from_result(result: Result<Option<StoreLocation>>) -> Self {
        match result {
            Ok(Some(store)) => Self::Found(store),
            Ok(None) => Self::NotFound,
            Err(AushadhError::ValidationError { message }) => {
                tracing::warn!("Location rejected: {}", message);
                Self::LocationUnavailable
            }
            Err(e) => {
                tracing::error!("Store lookup failed: {} ({:?})", e, e.category());
                Self::Failed
            }
        }
    }

    /// Message for the non-found states.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Found(_) => None,
            Self::NotFound => Some(
                "Unable to find a store nearby using the available data. Please try again or search on Google Maps.",
            ),
            Self::LocationUnavailable => {
                Some("A valid location is required to find the nearest store.")
            }
            Self::Failed => Some("Something went wrong while finding the store."),
        }
    }
}

/// Builds the model client from `config` and runs one lookup. Setup problems
/// such as a missing API key end up as [`LocateOutcome::Failed`] too.
pub async fn locate_nearest(config: &impl ConfigProvider, lat: f64, lng: f64) -> LocateOutcome {
    let client = match GeminiClient::from_config(config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Store lookup unavailable: {}", e);
            return LocateOutcome::Failed;
        }
    };
    LocateOutcome::from_result(StoreLocator::new(client, config).find_nearest(lat, lng).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelSettings;
    use crate::core::analyzer::tests::FakeModel;
    use crate::utils::error::AushadhError;
    use serde_json::json;

    fn locator(model: FakeModel) -> StoreLocator<FakeModel> {
        let settings = ModelSettings {
            locator_model: "maps-model".to_string(),
            ..Default::default()
        };
        StoreLocator::new(model, &settings)
    }

    #[tokio::test]
    async fn test_grounded_answer_uses_chunk_title_and_uri() {
        let model = FakeModel::replying(json!({
            "candidates": [{
                "content": {"parts": [{"text": "**Janaushadhi Kendra**, Shop 4, Sector 18, Noida"}]},
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "https://example.com"}},
                    {"maps": {"uri": "https://maps.google.com/?cid=42", "title": "PMBJK Sector 18"}}
                ]}
            }]
        }));
        let store = locator(model.clone())
            .find_nearest(28.57, 77.32)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(store.name, "PMBJK Sector 18");
        assert_eq!(store.map_uri, "https://maps.google.com/?cid=42");
        assert_eq!(store.address, "Janaushadhi Kendra, Shop 4, Sector 18, Noida");

        let (model_name, request) = model.last_call();
        assert_eq!(model_name, "maps-model");
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["tools"], json!([{"googleMaps": {}}]));
        assert_eq!(
            body["toolConfig"]["retrievalConfig"]["latLng"],
            json!({"latitude": 28.57, "longitude": 77.32})
        );
        assert!(body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("28.57, 77.32"));
    }

    #[tokio::test]
    async fn test_short_text_falls_back_to_snippets() {
        let model = FakeModel::replying(json!({
            "candidates": [{
                "content": {"parts": [{"text": "**"}]},
                "groundingMetadata": {"groundingChunks": [{"maps": {
                    "placeAnswerSources": {"reviewSnippets": ["Cheap medicines", {"text": "Helpful staff"}]}
                }}]}
            }]
        }));
        let store = locator(model).find_nearest(19.07, 72.87).await.unwrap().unwrap();

        assert_eq!(store.name, DEFAULT_STORE_NAME);
        assert_eq!(store.map_uri, fallback_map_uri(19.07, 72.87));
        assert_eq!(
            store.address,
            "Jan Aushadhi Kendra (Verified Location): Cheap medicines. Helpful staff"
        );
    }

    #[tokio::test]
    async fn test_short_text_without_snippets() {
        let model = FakeModel::replying(json!({
            "candidates": [{"content": {"parts": [{"text": ""}]}}]
        }));
        let store = locator(model).find_nearest(0.0, 0.0).await.unwrap().unwrap();
        assert_eq!(store.address, VERIFIED_LOCATION);
    }

    #[tokio::test]
    async fn test_no_candidates_means_no_store() {
        let model = FakeModel::replying(json!({"candidates": []}));
        assert!(locator(model).find_nearest(12.9, 77.6).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_coordinates_never_reach_the_model() {
        let model = FakeModel::replying(json!({"candidates": []}));
        let err = locator(model.clone()).find_nearest(120.0, 77.6).await.unwrap_err();

        assert!(matches!(err, AushadhError::ValidationError { .. }));
        assert!(model.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error_not_an_empty_result() {
        let model = FakeModel::failing(AushadhError::ModelHttpError {
            status: 503,
            body: String::new(),
        });
        tokio_test::assert_err!(locator(model).find_nearest(12.9, 77.6).await);
    }

    #[test]
    fn test_outcome_states_are_distinct() {
        let not_found = LocateOutcome::from_result(Ok(None));
        let bad_location = LocateOutcome::from_result(Err(AushadhError::ValidationError {
            message: "Invalid latitude".to_string(),
        }));
        let failed = LocateOutcome::from_result(Err(AushadhError::EmptyResponse));

        assert_eq!(not_found, LocateOutcome::NotFound);
        assert_eq!(bad_location, LocateOutcome::LocationUnavailable);
        assert_eq!(failed, LocateOutcome::Failed);
        assert_ne!(not_found.message(), failed.message());
        assert!(failed.message().unwrap().contains("Something went wrong"));

        let store = StoreLocation {
            name: DEFAULT_STORE_NAME.to_string(),
            address: VERIFIED_LOCATION.to_string(),
            map_uri: fallback_map_uri(1.0, 2.0),
        };
        assert!(LocateOutcome::from_result(Ok(Some(store))).message().is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_is_a_failed_lookup() {
        let settings = ModelSettings {
            api_key: None,
            ..Default::default()
        };
        let outcome = locate_nearest(&settings, 12.9, 77.6).await;
        assert_eq!(outcome, LocateOutcome::Failed);
        assert_eq!(
            outcome.message(),
            Some("Something went wrong while finding the store.")
        );
    }

    #[tokio::test]
    async fn test_locate_nearest_with_configured_client() {
        use httpmock::prelude::*;

        let server = MockServer::start();
        let maps_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1beta/models/maps-model:generateContent");
            then.status(200).json_body(json!({
                "candidates": [{"content": {"parts": [{"text": "Shop 2, Ring Road, Delhi"}]}}]
            }));
        });
        let settings = ModelSettings {
            api_base: server.base_url(),
            api_key: Some("key".to_string()),
            locator_model: "maps-model".to_string(),
            ..Default::default()
        };

        match locate_nearest(&settings, 28.6, 77.2).await {
            LocateOutcome::Found(store) => {
                assert_eq!(store.name, DEFAULT_STORE_NAME);
                assert_eq!(store.address, "Shop 2, Ring Road, Delhi");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        maps_mock.assert();
    }
}
