use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::form_urlencoded::byte_serialize;

use crate::{
    domain::{CollaboratorId, Sector},
    error::InvalidPathSegment,
};

/// Body of `GET /api/colaborador/{id}/overall/{setor}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallResponse {
    pub overall: Value,
}

impl OverallResponse {
    /// Score text as shown to the user, without JSON quoting.
    pub fn display_text(&self) -> String {
        match &self.overall {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Flat field-name to value mapping collected from one submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormPayload(pub BTreeMap<String, String>);

impl FormPayload {
    /// Collects fields in document order; a repeated name keeps its last value.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveEvaluationResponse {
    pub mensagem: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub data: NaiveDate,
    pub overall: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveBadgesRequest {
    pub insignias: Vec<String>,
}

/// Body of `POST /api/comparar`; the server accepts 2 to 4 ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareRequest {
    pub ids: Vec<CollaboratorId>,
}

/// One compared collaborator as the server renders it on a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareCard {
    pub id: i64,
    #[serde(rename = "Nome_completo")]
    pub nome_completo: String,
    #[serde(default)]
    pub overall: Option<i64>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,
    #[serde(rename = "backgroundColor")]
    pub background_color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareResponse {
    pub cards_data: Vec<CompareCard>,
    pub chart_data: ChartData,
}

pub struct ApiPath;

impl ApiPath {
    pub const SAVE_EVALUATION: &'static str = "/api/salvar_avaliacao";
    pub const COMPARE: &'static str = "/api/comparar";

    pub fn overall(
        collaborator_id: &CollaboratorId,
        sector: &Sector,
    ) -> Result<String, InvalidPathSegment> {
        Ok(format!(
            "/api/colaborador/{}/overall/{}",
            encode_segment(collaborator_id.as_str())?,
            encode_segment(sector.as_str())?
        ))
    }

    pub fn history(collaborator_id: &CollaboratorId) -> Result<String, InvalidPathSegment> {
        Ok(format!(
            "/api/colaborador/{}/historico",
            encode_segment(collaborator_id.as_str())?
        ))
    }

    pub fn save_badges(collaborator_id: &CollaboratorId) -> Result<String, InvalidPathSegment> {
        Ok(format!(
            "/api/colaborador/{}/salvar_insignias",
            encode_segment(collaborator_id.as_str())?
        ))
    }
}

// Empty and dot-only values would collapse or climb the path when resolved;
// percent-encoded dots resolve the same way, so they are refused outright.
fn encode_segment(raw: &str) -> Result<String, InvalidPathSegment> {
    if raw.is_empty() || raw.chars().all(|c| c == '.') {
        return Err(InvalidPathSegment(raw.to_string()));
    }
    // form_urlencoded turns spaces into '+', which a path segment must not carry.
    Ok(byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_path_encodes_sector_with_spaces() {
        let path = ApiPath::overall(&CollaboratorId::from("42"), &Sector::from("Linha A/B"))
            .expect("path");
        assert_eq!(path, "/api/colaborador/42/overall/Linha%20A%2FB");
    }

    #[test]
    fn dot_only_and_empty_segments_are_refused() {
        for sector in [".", "..", "...", ""] {
            assert_eq!(
                ApiPath::overall(&CollaboratorId::from("7"), &Sector::from(sector)),
                Err(InvalidPathSegment(sector.to_string())),
                "{sector:?}"
            );
        }
        assert!(ApiPath::history(&CollaboratorId::from("..")).is_err());
        assert!(ApiPath::save_badges(&CollaboratorId::from(".")).is_err());
    }

    #[test]
    fn dots_inside_a_segment_are_kept() {
        let path = ApiPath::overall(&CollaboratorId::from("7"), &Sector::from("Linha.2"))
            .expect("path");
        assert_eq!(path, "/api/colaborador/7/overall/Linha.2");
    }

    #[test]
    fn compare_response_keeps_card_details() {
        let response: CompareResponse = serde_json::from_value(serde_json::json!({
            "cards_data": [{"id": 3, "Nome_completo": "Ana Souza", "overall": 81, "Cargo": "Operadora"}],
            "chart_data": {
                "labels": ["Técnica"],
                "datasets": [{"label": "Ana", "data": [80], "backgroundColor": "#007bff"}]
            }
        }))
        .expect("parse compare");

        assert_eq!(response.cards_data[0].overall, Some(81));
        assert_eq!(
            response.cards_data[0].details.get("Cargo"),
            Some(&serde_json::json!("Operadora"))
        );
        assert_eq!(response.chart_data.datasets[0].background_color, "#007bff");
    }

    #[test]
    fn display_text_renders_values_verbatim() {
        let cases = [
            (serde_json::json!(87), "87"),
            (serde_json::json!("B+"), "B+"),
            (serde_json::json!(72.5), "72.5"),
            (Value::Null, ""),
        ];
        for (overall, expected) in cases {
            assert_eq!(OverallResponse { overall }.display_text(), expected);
        }
    }

    #[test]
    fn overall_response_requires_overall_field() {
        assert!(serde_json::from_str::<OverallResponse>(r#"{"score": 1}"#).is_err());
    }

    #[test]
    fn form_payload_keeps_last_value_for_repeated_name() {
        let payload = FormPayload::from_fields([("nota", "3"), ("nome", "Ana"), ("nota", "5")]);
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.get("nota"), Some("5"));
        assert_eq!(
            serde_json::to_value(&payload).expect("serialize"),
            serde_json::json!({"nome": "Ana", "nota": "5"})
        );
    }

    #[test]
    fn history_entries_parse_server_dates() {
        let entries: Vec<HistoryEntry> = serde_json::from_str(
            r#"[{"data":"2024-03-01","overall":70},{"data":"2024-04-01","overall":null}]"#,
        )
        .expect("parse history");
        assert_eq!(entries[0].data, NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"));
        assert_eq!(entries[1].overall, None);
    }
}
