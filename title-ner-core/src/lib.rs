//! # title-ner-core: Extração de Entidades em Títulos de Produtos
//!
//! Este crate gera anotações de entidades (spans rotulados) para títulos de
//! e-commerce em Português Brasileiro: notebooks, tablets, smartphones,
//! smartwatches e TVs. As anotações alimentam o treinamento de um modelo de
//! sequência, então o contrato principal é: **spans válidos, dentro do título e
//! sem sobreposição**.
//!
//! ## Arquitetura
//!
//! 1.  **Entrada**: um [`TitleRecord`] (título, possivelmente ausente, e campos
//!     estruturados).
//! 2.  **Schema** ([`schema`]): a tabela de regras da categoria, na ordem de
//!     prioridade. Regras de ground truth vêm antes das heurísticas.
//! 3.  **Extração** ([`extract`]): ground truth literal, regex com política de
//!     desempate e faixa numérica, ou vocabulário de marcas.
//! 4.  **Registro** ([`span`]): o [`SpanRegistry`] aceita um span somente se não
//!     colidir com nenhum aceito antes.
//! 5.  **Saída**: o conjunto de entidades, ou um [`TrainingExample`] com
//!     offsets de caractere.
//!
//! O modo de divisão de títulos de tablets ([`resolver`]) é independente do
//! registro e devolve colunas `model`, `RAM` e `storage_capacity`.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use title_ner_core::{Category, EntityLabel, ExtractionEngine, TitleRecord};
//!
//! let engine = ExtractionEngine::with_defaults().unwrap();
//! let record = TitleRecord::new("Tablet Samsung Galaxy Tab A8 64GB 4GB RAM");
//!
//! let entities = engine.extract(Category::Tablet, &record);
//! let found: Vec<(EntityLabel, &str)> = entities.iter().map(|e| (e.label, e.text.as_str())).collect();
//! assert_eq!(found, vec![(EntityLabel::Storage, "64GB"), (EntityLabel::Ram, "4GB RAM")]);
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: o motor que executa um schema sobre um título.
//! - [`patterns`]: padrões, tabelas de regras embutidas e marcas.
//! - [`config`]: sobrescrita de marcas e schemas via JSON.
//! - [`batch`]: lotes paralelos com rayon.

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod label;
pub mod patterns;
pub mod pipeline;
pub mod record;
pub mod resolver;
pub mod schema;
pub mod span;

pub use batch::{prepare_training_data, split_titles};
pub use config::EngineConfig;
pub use error::{ConfigError, Result};
pub use label::{EntityLabel, EntitySet, EntitySpan, SpanSource};
pub use patterns::BrandVocabulary;
pub use pipeline::{ExtractionEngine, PipelineEvent};
pub use record::{TitleRecord, TrainingExample};
pub use resolver::{SplitFields, TitleSplitter};
pub use schema::{Category, CategorySchema, Policy, RuleSpec};
pub use span::SpanRegistry;
