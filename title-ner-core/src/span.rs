//! # Registro de Spans
//!
//! Guarda os intervalos já reivindicados dentro de um título e recusa qualquer
//! candidato que intersecte um deles. É aqui que vive a invariante central do
//! motor: **nenhuma posição do título carrega dois rótulos**.
//!
//! Um registro novo é criado para cada título. A aceitação é monotônica: um
//! span aceito nunca é revogado durante o processamento daquele título.
//!
//! Títulos têm poucas dezenas de caracteres e poucas entidades, então a
//! verificação de sobreposição é uma varredura linear.

use crate::label::{EntityLabel, EntitySet, EntitySpan, SpanSource};

/// Intervalos aceitos para um único título.
#[derive(Debug, Clone)]
pub struct SpanRegistry<'t> {
    title: &'t str,
    spans: Vec<EntitySpan>,
}

impl<'t> SpanRegistry<'t> {
    pub fn new(title: &'t str) -> Self {
        Self {
            title,
            spans: Vec::new(),
        }
    }

    pub fn title(&self) -> &'t str {
        self.title
    }

    /// `true` se `[start, end)` intersecta algum span já aceito.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.spans.iter().any(|s| s.overlaps(start, end))
    }

    /// Propõe um span; retorna `true` se ele foi aceito.
    ///
    /// Recusa intervalos vazios, fora do título, que cortem um caractere
    /// multibyte ao meio, ou que colidam com um span anterior.
    pub fn propose(&mut self, start: usize, end: usize, label: EntityLabel, source: SpanSource) -> bool {
        if start >= end
            || end > self.title.len()
            || !self.title.is_char_boundary(start)
            || !self.title.is_char_boundary(end)
        {
            return false;
        }
        if self.overlaps(start, end) {
            return false;
        }
        self.spans.push(EntitySpan {
            text: self.title[start..end].to_string(),
            label,
            start,
            end,
            source,
        });
        true
    }

    /// `true` se algum span com este rótulo já foi aceito
    pub fn has_label(&self, label: EntityLabel) -> bool {
        self.spans.iter().any(|s| s.label == label)
    }

    pub fn spans(&self) -> &[EntitySpan] {
        &self.spans
    }

    pub fn last(&self) -> Option<&EntitySpan> {
        self.spans.last()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Consome o registro e devolve os spans na ordem de aceitação.
    pub fn into_spans(self) -> EntitySet {
        self.spans
    }
}

/// Verifica se todos os pares de spans são disjuntos.
pub fn is_non_overlapping(spans: &[EntitySpan]) -> bool {
    spans.iter().enumerate().all(|(i, a)| {
        spans[i + 1..]
            .iter()
            .all(|b| a.end <= b.start || b.end <= a.start)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_overlapping_candidate() {
        let mut reg = SpanRegistry::new("Tablet 64GB 4GB RAM");
        assert!(reg.propose(7, 11, EntityLabel::Storage, SpanSource::Regex));
        // "4GB" dentro de "64GB"
        assert!(!reg.propose(8, 11, EntityLabel::Ram, SpanSource::Regex));
        assert!(!reg.propose(5, 8, EntityLabel::Ram, SpanSource::Regex));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_adjacent_spans_are_accepted() {
        let mut reg = SpanRegistry::new("50polegadas");
        assert!(reg.propose(0, 2, EntityLabel::Size, SpanSource::GroundTruth));
        assert!(reg.propose(2, 11, EntityLabel::Model, SpanSource::GroundTruth));
        assert!(is_non_overlapping(reg.spans()));
    }

    #[test]
    fn test_rejects_empty_and_out_of_bounds() {
        let mut reg = SpanRegistry::new("abc");
        assert!(!reg.propose(1, 1, EntityLabel::Model, SpanSource::Regex));
        assert!(!reg.propose(2, 1, EntityLabel::Model, SpanSource::Regex));
        assert!(!reg.propose(0, 4, EntityLabel::Model, SpanSource::Regex));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_rejects_split_multibyte_char() {
        let mut reg = SpanRegistry::new("5ª");
        // "ª" ocupa os bytes 1..3
        assert!(!reg.propose(0, 2, EntityLabel::Model, SpanSource::Regex));
        assert!(reg.propose(0, 3, EntityLabel::Model, SpanSource::Regex));
        assert_eq!(reg.spans()[0].text, "5ª");
    }

    #[test]
    fn test_acceptance_order_is_kept() {
        let mut reg = SpanRegistry::new("Smart TV LG 50 4K");
        assert!(reg.propose(15, 17, EntityLabel::Resolution, SpanSource::GroundTruth));
        assert!(reg.propose(12, 14, EntityLabel::Size, SpanSource::GroundTruth));
        assert!(reg.has_label(EntityLabel::Size));
        assert!(!reg.has_label(EntityLabel::Model));
        let labels: Vec<EntityLabel> = reg.into_spans().iter().map(|s| s.label).collect();
        assert_eq!(labels, vec![EntityLabel::Resolution, EntityLabel::Size]);
    }
}
