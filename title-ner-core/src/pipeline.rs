//! # Pipeline de Extração: Orquestrador com Eventos Observáveis
//!
//! Um único motor, parametrizado pelo [`CategorySchema`] da categoria, executa
//! as regras na ordem declarada sobre um [`SpanRegistry`] novo por título.
//! Cada passo é emitido como [`PipelineEvent`] por um canal `mpsc`, o que
//! permite que o servidor WebSocket mostre por que cada candidato foi aceito
//! ou descartado.
//!
//! ## Fluxo por título
//! 1. Sem título (ou categoria sem schema): `Done` vazio.
//! 2. Para cada regra: pula se o rótulo já tem span (`RuleSkipped`); senão
//!    roda o extrator (`RuleStarted`), reporta descartes (`CandidateRejected`)
//!    e aceita o vencedor (`SpanAccepted`) ou registra a falha (`RuleMissed`).
//! 3. `Done` com o conjunto final, na ordem de aceitação.

use std::collections::BTreeMap;
use std::sync::mpsc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::extract::{
    extract_brand, extract_ground_truth, extract_heuristic, Candidate, MissReason, RejectReason,
};
use crate::label::{EntityLabel, EntitySet, EntitySpan, SpanSource};
use crate::patterns::BrandVocabulary;
use crate::record::{TitleRecord, TrainingExample};
use crate::schema::{Category, CategorySchema, Matcher};
use crate::span::SpanRegistry;

/// Eventos emitidos durante a extração de um título.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// Uma regra começou a procurar candidatos
    RuleStarted {
        rule_index: usize,
        label: EntityLabel,
        strategy: String,
    },
    /// O rótulo já foi satisfeito por uma regra anterior
    RuleSkipped { rule_index: usize, label: EntityLabel },
    /// Um candidato foi descartado antes do desempate
    CandidateRejected {
        rule_index: usize,
        label: EntityLabel,
        candidate: Candidate,
        reason: RejectReason,
    },
    /// A regra terminou sem vencedor
    RuleMissed {
        rule_index: usize,
        label: EntityLabel,
        reason: MissReason,
    },
    /// Span aceito e registrado
    SpanAccepted { rule_index: usize, span: EntitySpan },
    /// **Conclusão**: conjunto final de entidades.
    Done {
        entities: Vec<EntitySpan>,
        total_rules: usize,
        processing_us: u64,
    },
}

/// O motor de extração: schemas compilados e vocabulário de marcas.
///
/// Todo o estado é somente-leitura, então uma instância pode ser
/// compartilhada entre threads (`&self` em todos os métodos).
#[derive(Debug, Clone)]
pub struct ExtractionEngine {
    schemas: BTreeMap<Category, CategorySchema>,
    brands: BrandVocabulary,
}

impl ExtractionEngine {
    /// Compila a configuração. Qualquer erro aqui aborta antes do primeiro título.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let schemas = config.compile_schemas()?;
        let brands = config.brand_vocabulary()?;
        Ok(Self { schemas, brands })
    }

    /// Motor com os schemas e marcas embutidos.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&EngineConfig::default())
    }

    pub fn schema(&self, category: Category) -> Option<&CategorySchema> {
        self.schemas.get(&category)
    }

    pub fn brands(&self) -> &BrandVocabulary {
        &self.brands
    }

    /// Extrai o conjunto de entidades de um registro, de forma síncrona.
    pub fn extract(&self, category: Category, record: &TitleRecord) -> EntitySet {
        let (tx, rx) = mpsc::channel();
        self.extract_streaming(category, record, tx);
        let mut entities = vec![];

        while let Ok(event) = rx.recv() {
            if let PipelineEvent::Done { entities: ents, .. } = event {
                entities = ents;
            }
        }
        entities
    }

    /// Exemplo de treino do registro; `None` se não houver título ou entidades.
    pub fn training_example(&self, category: Category, record: &TitleRecord) -> Option<TrainingExample> {
        let title = record.title.as_deref()?;
        TrainingExample::from_entities(title, &self.extract(category, record))
    }

    /// Executa o pipeline enviando eventos de progresso pelo canal `tx`.
    pub fn extract_streaming(&self, category: Category, record: &TitleRecord, tx: mpsc::Sender<PipelineEvent>) {
        let start = Instant::now();

        let (Some(title), Some(schema)) = (record.title.as_deref(), self.schemas.get(&category)) else {
            debug!(%category, "registro sem título; nada a extrair");
            let _ = tx.send(PipelineEvent::Done {
                entities: vec![],
                total_rules: 0,
                processing_us: start.elapsed().as_micros() as u64,
            });
            return;
        };

        let mut registry = SpanRegistry::new(title);

        for (rule_index, rule) in schema.rules().iter().enumerate() {
            let label = rule.label;
            if registry.has_label(label) {
                let _ = tx.send(PipelineEvent::RuleSkipped { rule_index, label });
                continue;
            }

            let _ = tx.send(PipelineEvent::RuleStarted {
                rule_index,
                label,
                strategy: rule.spec().strategy_name().to_string(),
            });

            let (outcome, source) = match &rule.matcher {
                Matcher::Field { field, template } => (
                    extract_ground_truth(&registry, record.field(field), template.as_deref(), label),
                    SpanSource::GroundTruth,
                ),
                Matcher::Pattern {
                    regex,
                    constraint,
                    policy,
                    source,
                } => (
                    extract_heuristic(&registry, regex, constraint.as_ref(), *policy),
                    *source,
                ),
                Matcher::Brand => (extract_brand(&registry, &self.brands), SpanSource::Regex),
            };

            for (candidate, reason) in outcome.rejected {
                debug!(%label, text = %candidate.text, ?reason, "candidato descartado");
                let _ = tx.send(PipelineEvent::CandidateRejected {
                    rule_index,
                    label,
                    candidate,
                    reason,
                });
            }

            let accepted = outcome
                .winner
                .map_or(false, |w| registry.propose(w.start, w.end, label, source));

            match registry.last() {
                Some(span) if accepted => {
                    let _ = tx.send(PipelineEvent::SpanAccepted {
                        rule_index,
                        span: span.clone(),
                    });
                }
                _ => {
                    let _ = tx.send(PipelineEvent::RuleMissed {
                        rule_index,
                        label,
                        reason: outcome.miss.unwrap_or(MissReason::AllRejected),
                    });
                }
            }
        }

        let _ = tx.send(PipelineEvent::Done {
            entities: registry.into_spans(),
            total_rules: schema.rules().len(),
            processing_us: start.elapsed().as_micros() as u64,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::is_non_overlapping;

    fn engine() -> ExtractionEngine {
        ExtractionEngine::with_defaults().unwrap()
    }

    fn texts(entities: &[EntitySpan]) -> Vec<(EntityLabel, &str)> {
        entities.iter().map(|e| (e.label, e.text.as_str())).collect()
    }

    fn find(entities: &[EntitySpan], label: EntityLabel) -> Option<&EntitySpan> {
        entities.iter().find(|e| e.label == label)
    }

    #[test]
    fn test_notebook_ground_truth_then_heuristics() {
        let record = TitleRecord::new("Notebook Dell Inspiron 15 Intel Core i5 8GB RAM 256GB SSD")
            .with_field("modelo", "Inspiron 15")
            .with_field("CPU", "Intel Core i5");
        let entities = engine().extract(Category::Notebook, &record);
        assert_eq!(
            texts(&entities),
            vec![
                (EntityLabel::Model, "Inspiron 15"),
                (EntityLabel::Cpu, "Intel Core i5"),
                (EntityLabel::Ram, "8GB RAM"),
                (EntityLabel::Ssd, "256GB SSD"),
            ]
        );
        assert_eq!(entities[0].source, SpanSource::GroundTruth);
        assert_eq!(entities[2].source, SpanSource::Regex);
        assert!(is_non_overlapping(&entities));
    }

    #[test]
    fn test_tablet_storage_largest_and_ram_smallest() {
        let record = TitleRecord::new("Tablet Samsung Galaxy Tab A8 64GB 4GB RAM");
        let entities = engine().extract(Category::Tablet, &record);
        assert_eq!(
            texts(&entities),
            vec![(EntityLabel::Storage, "64GB"), (EntityLabel::Ram, "4GB RAM")]
        );
        assert_eq!(entities[1].source, SpanSource::Regex);
    }

    #[test]
    fn test_storage_and_ram_resolve_independently_of_order() {
        for title in ["Smartphone Xiaomi 8GB RAM 128GB", "Smartphone Xiaomi 128GB 8GB RAM"] {
            let entities = engine().extract(Category::Smartphone, &TitleRecord::new(title));
            assert_eq!(find(&entities, EntityLabel::Storage).unwrap().text, "128GB");
            assert_eq!(find(&entities, EntityLabel::Ram).unwrap().text, "8GB RAM");
            assert!(is_non_overlapping(&entities));
        }
    }

    #[test]
    fn test_tv_size_and_resolution_from_fields() {
        let record = TitleRecord::new("Smart TV LG 50 polegadas 4K")
            .with_field("polegadas", "50")
            .with_field("resolucao", "4K");
        let entities = engine().extract(Category::Tv, &record);
        assert_eq!(
            texts(&entities),
            vec![(EntityLabel::Size, "50"), (EntityLabel::Resolution, "4K")]
        );
        assert_eq!(entities[0].source, SpanSource::GroundTruth);
    }

    #[test]
    fn test_tv_size_falls_back_to_two_digit_number() {
        let record = TitleRecord::new("Smart TV LG 50 polegadas 4K")
            .with_field("polegadas", "")
            .with_field("resolucao", "4K");
        let entities = engine().extract(Category::Tv, &record);
        let size = find(&entities, EntityLabel::Size).unwrap();
        assert_eq!(size.text, "50");
        assert_eq!(size.source, SpanSource::Fallback);
    }

    #[test]
    fn test_tv_size_prefers_number_followed_by_unit() {
        let title = "TV LG 43LM6370 43 polegadas";
        let record = TitleRecord::new(title)
            .with_field("modelo", "43LM6370")
            .with_field("polegadas", "43");
        let entities = engine().extract(Category::Tv, &record);
        let size = find(&entities, EntityLabel::Size).unwrap();
        assert_eq!(size.start, title.find("43 pol").unwrap());
        assert_eq!(size.text, "43");
    }

    #[test]
    fn test_ground_truth_beats_heuristic_for_same_label() {
        let record = TitleRecord::new("Notebook Lenovo 16GB RAM 8GB Video").with_field("RAM", "16GB");
        let entities = engine().extract(Category::Notebook, &record);
        let rams: Vec<&EntitySpan> = entities.iter().filter(|e| e.label == EntityLabel::Ram).collect();
        assert_eq!(rams.len(), 1);
        assert_eq!(rams[0].text, "16GB");
        assert_eq!(rams[0].source, SpanSource::GroundTruth);
    }

    #[test]
    fn test_tablet_ground_truth_storage_field() {
        let record = TitleRecord::new("Tablet Lenovo M10 128GB 4GB 64GB").with_field("Armazenamento", "64GB");
        let entities = engine().extract(Category::Tablet, &record);
        let storage = find(&entities, EntityLabel::Storage).unwrap();
        assert_eq!(storage.text, "64GB");
        assert_eq!(storage.source, SpanSource::GroundTruth);
        // RAM continua heurística: o menor entre os "<n>GB" livres
        assert_eq!(find(&entities, EntityLabel::Ram).unwrap().text, "4GB");
    }

    #[test]
    fn test_tablet_ram_field_is_claimed_before_storage_pattern() {
        let record = TitleRecord::new("Tablet Multilaser M7 2GB RAM Wi-Fi").with_field("RAM", "2GB");
        let entities = engine().extract(Category::Tablet, &record);
        assert_eq!(texts(&entities), vec![(EntityLabel::Ram, "2GB")]);
        assert_eq!(entities[0].source, SpanSource::GroundTruth);
    }

    #[test]
    fn test_notebook_model_from_model_column() {
        let record = TitleRecord::new("Notebook Acer Aspire 5 Intel Core i5 8GB")
            .with_field("model", "Aspire 5")
            .with_field("cpu", "Intel Core i5");
        let entities = engine().extract(Category::Notebook, &record);
        let model = find(&entities, EntityLabel::Model).unwrap();
        assert_eq!(model.text, "Aspire 5");
        assert_eq!(model.source, SpanSource::GroundTruth);
        assert_eq!(entities.iter().filter(|e| e.label == EntityLabel::Model).count(), 1);
    }

    #[test]
    fn test_ram_bounded_fallback() {
        let entities = engine().extract(Category::Smartphone, &TitleRecord::new("Celular Positivo 2G 32GB"));
        let ram = find(&entities, EntityLabel::Ram).unwrap();
        assert_eq!(ram.text, "2G");
        assert_eq!(ram.source, SpanSource::Fallback);

        let entities = engine().extract(Category::Smartphone, &TitleRecord::new("Celular Positivo 16G 32GB"));
        assert!(find(&entities, EntityLabel::Ram).is_none());
    }

    #[test]
    fn test_smartphone_camera_and_dual_chip() {
        let record = TitleRecord::new("Smartphone Motorola Moto G84 256GB 8GB RAM Câmera 50Mpx Dual Chip")
            .with_field("modelo", "Moto G84");
        let entities = engine().extract(Category::Smartphone, &record);
        assert_eq!(
            texts(&entities),
            vec![
                (EntityLabel::Model, "Moto G84"),
                (EntityLabel::Storage, "256GB"),
                (EntityLabel::Ram, "8GB RAM"),
                (EntityLabel::Camera, "50Mpx"),
                (EntityLabel::DualChip, "Dual Chip"),
            ]
        );
    }

    #[test]
    fn test_smartwatch_single_brand_in_vocabulary_order() {
        let record = TitleRecord::new("Smartwatch Amazfit GTR 4 compatível Samsung").with_field("modelo", "GTR 4");
        let entities = engine().extract(Category::Smartwatch, &record);
        let brands: Vec<&EntitySpan> = entities.iter().filter(|e| e.label == EntityLabel::Brand).collect();
        assert_eq!(brands.len(), 1);
        assert_eq!(brands[0].text, "Samsung");
        assert_eq!(find(&entities, EntityLabel::Model).unwrap().text, "GTR 4");
    }

    #[test]
    fn test_missing_title_yields_nothing() {
        let engine = engine();
        let record = TitleRecord::missing().with_field("modelo", "Inspiron");
        assert!(engine.extract(Category::Notebook, &record).is_empty());
        assert!(engine.training_example(Category::Notebook, &record).is_none());
    }

    #[test]
    fn test_no_match_title_produces_no_training_example() {
        let record = TitleRecord::new("Capa protetora para tablet");
        assert!(engine().training_example(Category::Tablet, &record).is_none());
    }

    #[test]
    fn test_entities_never_overlap() {
        let engine = engine();
        let titles = [
            "Notebook Acer Aspire 5 AMD Ryzen 7 5700U 16GB 512GB SSD Radeon Graphics",
            "Notebook Gamer Asus TUF RTX 3050 Intel Core i5-11400H 8GB 256GB SSD",
            "Tablet Apple iPad 9ª geração 64GB Wi-Fi 10.2\"",
            "Smartphone Samsung Galaxy A54 5G 128GB 8GB RAM 50 Mpx Dual Chip",
            "Smart TV Samsung 55 polegadas QLED 4K QN55Q60",
            "Smartwatch Xiaomi Redmi Watch 3 Active",
            "64GB 64GB 64GB 4GB 4G 2 RAM",
        ];
        let record_fields = [("modelo", "QN55Q60"), ("polegadas", "55"), ("CPU", "Intel Core i5"), ("RAM", "8GB")];
        for title in titles {
            for category in Category::ALL {
                let mut record = TitleRecord::new(title);
                for (name, value) in record_fields {
                    record = record.with_field(name, value);
                }
                let entities = engine.extract(category, &record);
                assert!(is_non_overlapping(&entities), "{category}: {title} -> {entities:?}");
                for e in &entities {
                    assert_eq!(&title[e.start..e.end], e.text);
                }
            }
        }
    }

    #[test]
    fn test_events_streaming() {
        let engine = engine();
        let record = TitleRecord::new("Tablet Samsung Galaxy Tab A8 64GB 4GB RAM");
        let (tx, rx) = mpsc::channel();
        engine.extract_streaming(Category::Tablet, &record, tx);

        let events: Vec<PipelineEvent> = rx.try_iter().collect();
        assert!(matches!(&events[0], PipelineEvent::RuleStarted { rule_index: 0, .. }));
        assert!(matches!(events.last().unwrap(), PipelineEvent::Done { total_rules: 6, .. }));

        // "64GB" disputado pela regra de RAM
        assert!(events.iter().any(|e| matches!(
            e,
            PipelineEvent::CandidateRejected { label: EntityLabel::Ram, reason: RejectReason::Overlap, .. }
        )));
        // fallback de RAM pulado porque o padrão principal já aceitou
        assert!(events.iter().any(|e| matches!(
            e,
            PipelineEvent::RuleSkipped { rule_index: 5, label: EntityLabel::Ram }
        )));
        assert_eq!(
            events.iter().filter(|e| matches!(e, PipelineEvent::SpanAccepted { .. })).count(),
            2
        );
    }

    #[test]
    fn test_event_json_shape() {
        let event = PipelineEvent::RuleSkipped {
            rule_index: 3,
            label: EntityLabel::Size,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "RuleSkipped");
        assert_eq!(json["data"]["label"], "SIZE");
    }
}
