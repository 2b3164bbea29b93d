//! # Vocabulário de Entidades
//!
//! Define os rótulos que a extração pode atribuir a um trecho do título e a
//! origem de cada span aceito.
//!
//! | Rótulo       | Significado                     | Exemplos                      |
//! |--------------|---------------------------------|-------------------------------|
//! | MODEL        | Modelo do produto               | Inspiron 15, Galaxy Tab A8    |
//! | CPU          | Processador                     | Intel Core i5, AMD Ryzen 7    |
//! | GPU          | Placa de vídeo                  | RTX 3060, Intel Iris Xe       |
//! | RAM          | Memória                         | 8GB RAM, 4 GB                 |
//! | SSD          | Armazenamento de notebook       | 256GB SSD                     |
//! | STORAGE      | Armazenamento interno           | 128GB, 1 TB                   |
//! | SIZE         | Tamanho da tela (polegadas)     | 50, 65                        |
//! | RESOLUTION   | Resolução da tela               | 4K, Full HD                   |
//! | TECHNOLOGY   | Tecnologia do painel            | QLED, OLED                    |
//! | CAMERA       | Resolução da câmera             | 50 Mpx                        |
//! | DUAL_CHIP    | Suporte a dois chips            | Dual Chip, Dual SIM           |
//! | BRAND        | Marca                           | Samsung, Amazfit              |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Rótulos de entidade reconhecidos pelo motor.
///
/// O conjunto é fechado: um schema que referencie um rótulo fora desta lista é
/// um erro de configuração, detectado na inicialização.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Model,
    Cpu,
    Gpu,
    Ram,
    Ssd,
    Storage,
    Size,
    Resolution,
    Technology,
    Camera,
    DualChip,
    Brand,
}

impl EntityLabel {
    /// Todos os rótulos, na ordem de declaração.
    pub const ALL: [EntityLabel; 12] = [
        EntityLabel::Model,
        EntityLabel::Cpu,
        EntityLabel::Gpu,
        EntityLabel::Ram,
        EntityLabel::Ssd,
        EntityLabel::Storage,
        EntityLabel::Size,
        EntityLabel::Resolution,
        EntityLabel::Technology,
        EntityLabel::Camera,
        EntityLabel::DualChip,
        EntityLabel::Brand,
    ];

    /// Nome do rótulo como o treinador de sequência o consome (ex: "DUAL_CHIP")
    pub fn name(&self) -> &'static str {
        match self {
            EntityLabel::Model => "MODEL",
            EntityLabel::Cpu => "CPU",
            EntityLabel::Gpu => "GPU",
            EntityLabel::Ram => "RAM",
            EntityLabel::Ssd => "SSD",
            EntityLabel::Storage => "STORAGE",
            EntityLabel::Size => "SIZE",
            EntityLabel::Resolution => "RESOLUTION",
            EntityLabel::Technology => "TECHNOLOGY",
            EntityLabel::Camera => "CAMERA",
            EntityLabel::DualChip => "DUAL_CHIP",
            EntityLabel::Brand => "BRAND",
        }
    }

    /// Cor CSS para highlight em interfaces
    pub fn color(&self) -> &'static str {
        match self {
            EntityLabel::Model => "#3b82f6",
            EntityLabel::Cpu => "#ef4444",
            EntityLabel::Gpu => "#f97316",
            EntityLabel::Ram => "#10b981",
            EntityLabel::Ssd | EntityLabel::Storage => "#f59e0b",
            EntityLabel::Size => "#8b5cf6",
            EntityLabel::Resolution => "#ec4899",
            EntityLabel::Technology => "#14b8a6",
            EntityLabel::Camera => "#6366f1",
            EntityLabel::DualChip => "#84cc16",
            EntityLabel::Brand => "#0ea5e9",
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityLabel {
    type Err = ConfigError;

    /// Aceita o nome canônico sem diferenciar maiúsculas (ex: "ram" → `Ram`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        EntityLabel::ALL
            .iter()
            .copied()
            .find(|label| label.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownLabel(s.to_string()))
    }
}

/// De onde veio um span aceito.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanSource {
    /// Valor de um campo estruturado que acompanha o título
    GroundTruth,
    /// Padrão heurístico principal do rótulo
    Regex,
    /// Padrão de último recurso (ex: número de dois dígitos como polegadas)
    Fallback,
}

impl SpanSource {
    pub fn name(&self) -> &'static str {
        match self {
            SpanSource::GroundTruth => "ground_truth",
            SpanSource::Regex => "regex",
            SpanSource::Fallback => "fallback",
        }
    }
}

/// Um span aceito dentro de um título.
///
/// `start` e `end` são offsets de **byte** no título original (intervalo
/// semiaberto), que é o que o motor de regex reporta. Para o contrato do
/// treinador, que usa offsets de caractere, use [`EntitySpan::char_range`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Texto coberto pelo span, exatamente como aparece no título
    pub text: String,
    pub label: EntityLabel,
    /// Posição de byte inicial (inclusiva)
    pub start: usize,
    /// Posição de byte final (exclusiva)
    pub end: usize,
    pub source: SpanSource,
}

impl EntitySpan {
    /// `true` se `[start, end)` intersecta este span
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }

    /// Converte os offsets de byte em offsets de caractere sobre `title`.
    pub fn char_range(&self, title: &str) -> (usize, usize) {
        (char_offset(title, self.start), char_offset(title, self.end))
    }
}

/// Conjunto de entidades de um título, na ordem de aceitação.
pub type EntitySet = Vec<EntitySpan>;

/// Número de caracteres antes do byte `byte` em `text`.
pub fn char_offset(text: &str, byte: usize) -> usize {
    match text.get(..byte) {
        Some(prefix) => prefix.chars().count(),
        None => text.chars().count(),
    }
}
