// src/scoring/history.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::tally::{percentage, round2};

/// The persisted score snapshot of one simulado.
#[derive(Debug, Clone)]
pub struct SimuladoSnapshot {
    pub id: i64,
    pub finalizado: bool,
    pub data_realizacao: DateTime<Utc>,
    pub total_questoes: i32,
    pub acertos_total: i32,
    pub erros_total: i32,
    pub percentual_acerto: f64,
    pub tempo_utilizado: i32,
    pub acertos_basicos: i32,
    pub erros_basicos: i32,
    pub acertos_especificos: i32,
    pub erros_especificos: i32,
    pub acertos_por_materia: BTreeMap<String, i32>,
    pub erros_por_materia: BTreeMap<String, i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Desempenho {
    pub acertos: i32,
    pub total: i32,
    pub percentual: f64,
}

impl Desempenho {
    fn add(&mut self, acertos: i32, erros: i32) {
        self.acertos += acertos;
        self.total += acertos + erros;
    }

    fn finish(mut self) -> Self {
        self.percentual = round2(percentage(self.acertos, self.total));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricoItem {
    pub id: i64,
    /// "YYYY-MM-DD HH:MM"
    pub data: String,
    pub acertos: i32,
    pub erros: i32,
    pub percentual: f64,
    pub tempo_utilizado: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimuladoStatistics {
    pub total_simulados: i32,
    pub percentual_geral: f64,
    pub por_tipo: BTreeMap<String, Desempenho>,
    pub por_materia: BTreeMap<String, Desempenho>,
    pub historico: Vec<HistoricoItem>,
}

/// Builds the dashboard from persisted snapshots. Only finalized simulados count.
pub fn summarize(snapshots: &[SimuladoSnapshot]) -> SimuladoStatistics {
    let mut finalized: Vec<&SimuladoSnapshot> = snapshots.iter().filter(|s| s.finalizado).collect();
    finalized.sort_by(|a, b| b.data_realizacao.cmp(&a.data_realizacao));

    let mut basico = Desempenho::default();
    let mut especifico = Desempenho::default();
    let mut por_materia: BTreeMap<String, Desempenho> = BTreeMap::new();
    let mut acertos_geral = 0;
    let mut questoes_geral = 0;

    for s in &finalized {
        acertos_geral += s.acertos_total;
        questoes_geral += s.acertos_total + s.erros_total;

        basico.add(s.acertos_basicos, s.erros_basicos);
        especifico.add(s.acertos_especificos, s.erros_especificos);

        for (materia, acertos) in &s.acertos_por_materia {
            por_materia.entry(materia.clone()).or_default().add(*acertos, 0);
        }
        for (materia, erros) in &s.erros_por_materia {
            por_materia.entry(materia.clone()).or_default().add(0, *erros);
        }
    }

    if finalized.is_empty() {
        return SimuladoStatistics::default();
    }

    let historico = finalized
        .iter()
        .map(|s| HistoricoItem {
            id: s.id,
            data: s.data_realizacao.format("%Y-%m-%d %H:%M").to_string(),
            acertos: s.acertos_total,
            erros: s.erros_total,
            percentual: round2(s.percentual_acerto),
            tempo_utilizado: s.tempo_utilizado,
        })
        .collect();

    SimuladoStatistics {
        total_simulados: finalized.len() as i32,
        percentual_geral: round2(percentage(acertos_geral, questoes_geral)),
        por_tipo: BTreeMap::from([
            ("basico".to_string(), basico.finish()),
            ("especifico".to_string(), especifico.finish()),
        ]),
        por_materia: por_materia.into_iter().map(|(k, v)| (k, v.finish())).collect(),
        historico,
    }
}
