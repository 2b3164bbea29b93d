//! # Registros de Entrada e Saída
//!
//! Um [`TitleRecord`] é uma linha do dataset: o título (que pode faltar) e os
//! campos estruturados que o acompanham. Um [`TrainingExample`] é o que o
//! treinador de sequência consome: o título e a lista `(início, fim, rótulo)`
//! em offsets de **caractere**.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::label::EntitySpan;

/// Uma linha do dataset de entrada.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRecord {
    /// `None` quando a linha não tem título (dado ausente, não é erro)
    pub title: Option<String>,
    /// Campos de ground truth, por nome de coluna
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl TitleRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Registro sem título
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Valor não vazio do campo `name`.
    ///
    /// O nome exato tem preferência; senão, compara sem diferenciar
    /// maiúsculas ("Modelo" atende a "modelo").
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Exemplo de treino no formato `{"text": ..., "entities": [[início, fim, "RÓTULO"], ...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub text: String,
    pub entities: Vec<(usize, usize, String)>,
}

impl TrainingExample {
    /// Converte um conjunto de entidades; `None` se estiver vazio, que o
    /// treinador interpreta como "pular este título".
    pub fn from_entities(title: &str, entities: &[EntitySpan]) -> Option<Self> {
        if entities.is_empty() {
            return None;
        }
        let entities = entities
            .iter()
            .map(|span| {
                let (start, end) = span.char_range(title);
                (start, end, span.label.name().to_string())
            })
            .collect();
        Some(Self {
            text: title.to_string(),
            entities,
        })
    }

    /// Texto de cada entidade, recortado pelos offsets de caractere
    pub fn entity_texts(&self) -> Vec<(String, &str)> {
        self.entities
            .iter()
            .map(|(start, end, label)| {
                let text: String = self.text.chars().skip(*start).take(end - start).collect();
                (text, label.as_str())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::{EntityLabel, SpanSource};

    #[test]
    fn test_field_lookup_is_case_insensitive_and_skips_empty() {
        let record = TitleRecord::new("Tablet")
            .with_field("Modelo", "Tab A8")
            .with_field("RAM", "  ");
        assert_eq!(record.field("modelo"), Some("Tab A8"));
        assert_eq!(record.field("Modelo"), Some("Tab A8"));
        assert_eq!(record.field("RAM"), None);
        assert_eq!(record.field("armazenamento"), None);
    }

    #[test]
    fn test_empty_entities_produce_no_example() {
        assert!(TrainingExample::from_entities("Tablet", &[]).is_none());
    }

    #[test]
    fn test_training_example_uses_char_offsets() {
        let title = "iPad 9ª geração 64GB";
        let start = title.find("64GB").unwrap();
        let spans = vec![EntitySpan {
            text: "64GB".into(),
            label: EntityLabel::Storage,
            start,
            end: start + 4,
            source: SpanSource::Regex,
        }];
        let example = TrainingExample::from_entities(title, &spans).unwrap();
        assert_eq!(example.entities, vec![(16, 20, "STORAGE".to_string())]);
        assert_eq!(example.entity_texts(), vec![("64GB".to_string(), "STORAGE")]);

        let json = serde_json::to_string(&example).unwrap();
        assert_eq!(json, r#"{"text":"iPad 9ª geração 64GB","entities":[[16,20,"STORAGE"]]}"#);
    }

    #[test]
    fn test_record_deserializes_without_fields() {
        let record: TitleRecord = serde_json::from_str(r#"{"title":"Tablet Samsung"}"#).unwrap();
        assert_eq!(record.title.as_deref(), Some("Tablet Samsung"));
        assert!(record.fields.is_empty());
    }
}
