//! # Extratores
//!
//! Três formas de encontrar o trecho de um rótulo, todas consultando o
//! [`SpanRegistry`] antes de escolher:
//!
//! - [`extract_ground_truth`]: o valor de um campo estruturado, procurado
//!   literalmente no título. A **primeira** ocorrência livre vence; o ground
//!   truth diz *que* o valor existe, não qual ocorrência é.
//! - [`extract_heuristic`]: todos os matches de uma regex, filtrados por
//!   sobreposição e por faixa numérica **antes** do desempate por política.
//! - [`extract_brand`]: a primeira marca do vocabulário presente no título.
//!
//! Nenhum extrator registra nada: eles devolvem um [`Outcome`] com no máximo
//! um vencedor e o pipeline decide se o propõe ao registro.

use std::cmp::Reverse;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::label::EntityLabel;
use crate::patterns::BrandVocabulary;
use crate::schema::{compile_case_insensitive, NumericConstraint, Policy, VALUE_PLACEHOLDER};
use crate::span::SpanRegistry;

/// Grupo nomeado que, quando presente, delimita o span dentro do match.
pub const SPAN_GROUP: &str = "span";

/// Um trecho candidato (offsets de byte) e seu inteiro líder, se houver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub value: Option<u64>,
}

impl Candidate {
    pub fn new(title: &str, start: usize, end: usize) -> Self {
        let text = title[start..end].to_string();
        let value = leading_integer(&text);
        Self { text, start, end, value }
    }

    /// Candidato sem espaços nas bordas; `None` se sobrar só espaço.
    fn trimmed(title: &str, start: usize, end: usize) -> Option<Self> {
        let slice = &title[start..end];
        let lead = slice.len() - slice.trim_start().len();
        let trail = slice.len() - slice.trim_end().len();
        let (start, end) = (start + lead, end - trail);
        (start < end).then(|| Self::new(title, start, end))
    }
}

/// Motivo pelo qual um candidato foi descartado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Colide com um span já aceito
    Overlap,
    /// Inteiro líder fora da faixa (ou ausente quando há faixa)
    Constraint,
}

/// Motivo pelo qual uma regra não produziu vencedor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// O registro não traz o campo (ou o traz vazio)
    FieldAbsent,
    /// Nenhuma ocorrência no título
    NotFound,
    /// Houve ocorrências, mas todas foram descartadas
    AllRejected,
    /// O template do campo não produziu uma regex válida para este valor
    InvalidTemplate,
}

#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub winner: Option<Candidate>,
    pub rejected: Vec<(Candidate, RejectReason)>,
    pub miss: Option<MissReason>,
}

impl Outcome {
    fn missed(reason: MissReason) -> Self {
        Self {
            miss: Some(reason),
            ..Self::default()
        }
    }

    fn finish(mut self, winner: Option<Candidate>) -> Self {
        self.miss = match (&winner, self.rejected.is_empty()) {
            (Some(_), _) => None,
            (None, true) => Some(MissReason::NotFound),
            (None, false) => Some(MissReason::AllRejected),
        };
        self.winner = winner;
        self
    }
}

/// Primeiro inteiro (sequência de dígitos ASCII) do texto.
///
/// Valores que não cabem em `u64` contam como ausentes.
pub fn leading_integer(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits = &text[start..];
    let len = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..len].parse().ok()
}

/// Localiza a primeira ocorrência livre de `value` no título.
///
/// - `value` ausente ou só com espaços: a regra é pulada (`FieldAbsent`).
/// - O valor é aparado e escapado, então metacaracteres são literais.
/// - Com `template`, o valor escapado substitui `{value}` e o span é o grupo
///   `span`, se existir.
pub fn extract_ground_truth(
    registry: &SpanRegistry<'_>,
    value: Option<&str>,
    template: Option<&str>,
    label: EntityLabel,
) -> Outcome {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Outcome::missed(MissReason::FieldAbsent);
    };
    let escaped = regex::escape(value);
    let pattern = match template {
        Some(template) => template.replace(VALUE_PLACEHOLDER, &escaped),
        None => escaped,
    };
    let Ok(regex) = compile_case_insensitive(&pattern, label) else {
        return Outcome::missed(MissReason::InvalidTemplate);
    };

    let title = registry.title();
    let mut outcome = Outcome::default();
    for (start, end) in match_ranges(&regex, title) {
        let candidate = Candidate::new(title, start, end);
        if registry.overlaps(start, end) {
            outcome.rejected.push((candidate, RejectReason::Overlap));
            continue;
        }
        return outcome.finish(Some(candidate));
    }
    outcome.finish(None)
}

/// Enumera os matches da regex e escolhe um vencedor.
///
/// Descarta, nesta ordem, candidatos que colidem com spans aceitos e
/// candidatos cujo inteiro líder não satisfaz `constraint`. Entre os
/// elegíveis, aplica `policy`; empates ficam com o que aparece antes no título.
/// Espaços nas bordas do match não fazem parte do candidato.
pub fn extract_heuristic(
    registry: &SpanRegistry<'_>,
    regex: &Regex,
    constraint: Option<&NumericConstraint>,
    policy: Policy,
) -> Outcome {
    let title = registry.title();
    let mut outcome = Outcome::default();
    let mut eligible = Vec::new();

    for (start, end) in match_ranges(regex, title) {
        let Some(candidate) = Candidate::trimmed(title, start, end) else {
            continue;
        };
        if registry.overlaps(candidate.start, candidate.end) {
            outcome.rejected.push((candidate, RejectReason::Overlap));
            continue;
        }
        if let Some(constraint) = constraint {
            if !candidate.value.map_or(false, |v| constraint.accepts(v)) {
                outcome.rejected.push((candidate, RejectReason::Constraint));
                continue;
            }
        }
        eligible.push(candidate);
    }

    let winner = select(eligible, policy);
    outcome.finish(winner)
}

/// Aplica a política de desempate. A ordenação é estável.
pub fn select(mut candidates: Vec<Candidate>, policy: Policy) -> Option<Candidate> {
    match policy {
        Policy::First => {}
        // Candidatos sem número vão para o fim nas duas políticas numéricas
        Policy::Largest => candidates.sort_by_key(|c| Reverse(c.value)),
        Policy::Smallest => candidates.sort_by_key(|c| (c.value.is_none(), c.value)),
    }
    candidates.into_iter().next()
}

/// Varre o vocabulário na ordem da lista; a primeira marca com uma ocorrência
/// livre vence e a varredura para.
pub fn extract_brand(registry: &SpanRegistry<'_>, vocabulary: &BrandVocabulary) -> Outcome {
    let title = registry.title();
    let mut outcome = Outcome::default();
    for brand in vocabulary.iter() {
        for (start, end) in match_ranges(brand.regex(), title) {
            let candidate = Candidate::new(title, start, end);
            if registry.overlaps(start, end) {
                outcome.rejected.push((candidate, RejectReason::Overlap));
                continue;
            }
            return outcome.finish(Some(candidate));
        }
    }
    outcome.finish(None)
}

/// Intervalos dos matches não vazios, usando o grupo `span` quando existir.
fn match_ranges(regex: &Regex, title: &str) -> Vec<(usize, usize)> {
    regex
        .captures_iter(title)
        .filter_map(|caps| caps.name(SPAN_GROUP).or_else(|| caps.get(0)))
        .filter(|m| !m.is_empty())
        .map(|m| (m.start(), m.end()))
        .collect()
}
