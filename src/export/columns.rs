//! Column definitions: how each record type turns into a table row.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    Eleve, Facture, Filiere, Formateur, Module, Paiement, Parent, Quittance, Rapport, Record,
    Vague,
};

/// One exported cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    fn optional(value: Option<&str>) -> Self {
        Self::Text(value.unwrap_or("-").to_string())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(value) => f.write_str(&format_number(*value)),
        }
    }
}

pub struct Column<T> {
    pub header: &'static str,
    /// Width in spreadsheet character units; the PDF scales these to the page.
    pub width: f64,
    pub value: fn(&T) -> CellValue,
}

impl<T> Column<T> {
    pub const fn new(header: &'static str, width: f64, value: fn(&T) -> CellValue) -> Self {
        Self {
            header,
            width,
            value,
        }
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Column<T> {}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("header", &self.header)
            .field("width", &self.width)
            .finish()
    }
}

pub trait Exportable: Record + Sized {
    fn columns() -> Vec<Column<Self>>;
}

/// `1234567.5` -> `1 234 567.5`: thousands grouped, decimals kept as given.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let plain = value.abs().to_string();
    let (digits, decimals) = match plain.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (plain.as_str(), None),
    };
    let mut grouped = String::with_capacity(plain.len() + digits.len() / 3 + 1);
    if value < 0.0 {
        grouped.push('-');
    }
    for (index, c) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    if let Some(fraction) = decimals {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

pub fn format_amount(value: f64) -> String {
    format!("{} FCFA", format_number(value))
}

fn date_cell(value: Option<NaiveDate>) -> CellValue {
    CellValue::Text(
        value
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| "-".to_string()),
    )
}

fn datetime_cell(value: Option<DateTime<Utc>>) -> CellValue {
    date_cell(value.map(|d| d.date_naive()))
}

impl Exportable for Parent {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("Nom", 18.0, |p| CellValue::text(&p.nom)),
            Column::new("Prénom", 18.0, |p| CellValue::text(&p.prenom)),
            Column::new("Email", 28.0, |p| CellValue::text(&p.email)),
            Column::new("Téléphone", 16.0, |p| CellValue::optional(p.telephone.as_deref())),
            Column::new("Enfants", 10.0, |p| CellValue::Number(p.enfants.len() as f64)),
            Column::new("Statut", 12.0, |p| CellValue::text(p.statut.label())),
        ]
    }
}

impl Exportable for Eleve {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("Nom", 18.0, |e| CellValue::text(&e.nom)),
            Column::new("Prénom", 18.0, |e| CellValue::text(&e.prenom)),
            Column::new("Email", 26.0, |e| CellValue::optional(e.email.as_deref())),
            Column::new("Filière", 20.0, |e| {
                CellValue::optional(e.filiere.as_ref().map(|f| f.nom.as_str()))
            }),
            Column::new("Vague", 14.0, |e| {
                CellValue::optional(e.vague.as_ref().map(|v| v.nom.as_str()))
            }),
            Column::new("Statut", 12.0, |e| CellValue::text(e.statut.label())),
        ]
    }
}

impl Exportable for Formateur {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("Nom", 18.0, |f| CellValue::text(&f.nom)),
            Column::new("Prénom", 18.0, |f| CellValue::text(&f.prenom)),
            Column::new("Email", 26.0, |f| CellValue::text(&f.email)),
            Column::new("Spécialité", 20.0, |f| CellValue::optional(f.specialite.as_deref())),
            Column::new("Modules", 10.0, |f| CellValue::Number(f.modules.len() as f64)),
            Column::new("Statut", 12.0, |f| CellValue::text(f.statut.label())),
        ]
    }
}

impl Exportable for Filiere {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("Nom", 24.0, |f| CellValue::text(&f.nom)),
            Column::new("Description", 36.0, |f| CellValue::optional(f.description.as_deref())),
            Column::new("Durée (mois)", 12.0, |f| {
                f.duree_mois
                    .map(|d| CellValue::Number(f64::from(d)))
                    .unwrap_or_else(|| CellValue::text("-"))
            }),
            Column::new("Modules", 10.0, |f| CellValue::Number(f.modules.len() as f64)),
            Column::new("Vagues", 10.0, |f| CellValue::Number(f.vagues.len() as f64)),
        ]
    }
}

impl Exportable for Module {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("Nom", 28.0, |m| CellValue::text(&m.nom)),
            Column::new("Coefficient", 12.0, |m| CellValue::text(m.coefficient.to_string())),
            Column::new("Durée (h)", 10.0, |m| {
                m.duree_heures
                    .map(|d| CellValue::Number(f64::from(d)))
                    .unwrap_or_else(|| CellValue::text("-"))
            }),
            Column::new("Formateurs", 12.0, |m| {
                CellValue::Number(m.formateur_ids.len() as f64)
            }),
        ]
    }
}

impl Exportable for Vague {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("Nom", 20.0, |v| CellValue::text(&v.nom)),
            Column::new("Début", 12.0, |v| date_cell(v.date_debut)),
            Column::new("Fin", 12.0, |v| date_cell(v.date_fin)),
            Column::new("Filières", 10.0, |v| CellValue::Number(v.filiere_ids.len() as f64)),
            Column::new("Statut", 12.0, |v| CellValue::optional(v.statut.as_deref())),
        ]
    }
}

impl Exportable for Paiement {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("Référence", 16.0, |p| CellValue::optional(p.reference.as_deref())),
            Column::new("Élève", 22.0, |p| {
                CellValue::optional(p.eleve.as_ref().map(|e| e.nom.as_str()))
            }),
            Column::new("Montant", 14.0, |p| CellValue::Number(p.montant)),
            Column::new("Méthode", 14.0, |p| CellValue::text(p.methode.label())),
            Column::new("Statut", 12.0, |p| CellValue::text(p.statut.label())),
            Column::new("Date", 12.0, |p| datetime_cell(p.date_paiement)),
        ]
    }
}

impl Exportable for Facture {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("Numéro", 16.0, |f| CellValue::text(&f.numero)),
            Column::new("Élève", 22.0, |f| {
                CellValue::optional(f.eleve.as_ref().map(|e| e.nom.as_str()))
            }),
            Column::new("Montant", 14.0, |f| CellValue::Number(f.montant)),
            Column::new("Statut", 12.0, |f| CellValue::text(f.statut.label())),
            Column::new("Émise le", 12.0, |f| datetime_cell(f.date_emission)),
        ]
    }
}

impl Exportable for Quittance {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("Numéro", 16.0, |q| CellValue::text(&q.numero)),
            Column::new("Élève", 22.0, |q| {
                CellValue::optional(q.eleve.as_ref().map(|e| e.nom.as_str()))
            }),
            Column::new("Montant", 14.0, |q| CellValue::Number(q.montant)),
            Column::new("Statut", 12.0, |q| CellValue::text(q.statut.label())),
            Column::new("Émise le", 12.0, |q| datetime_cell(q.date_emission)),
        ]
    }
}

impl Exportable for Rapport {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("Formateur", 20.0, |r| {
                CellValue::optional(r.formateur.as_ref().map(|f| f.nom.as_str()))
            }),
            Column::new("Module", 18.0, |r| {
                CellValue::optional(r.module.as_ref().map(|m| m.nom.as_str()))
            }),
            Column::new("Chapitre", 20.0, |r| CellValue::text(&r.chapitre)),
            Column::new("Objectif", 28.0, |r| CellValue::text(&r.objectif)),
            Column::new("Note", 8.0, |r| {
                r.note_evaluation
                    .map(CellValue::Number)
                    .unwrap_or_else(|| CellValue::text("-"))
            }),
            Column::new("Durée prévue/réelle", 16.0, |r| {
                let planned = r.duree_prevue.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
                let actual = r.duree_reelle.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
                CellValue::Text(format!("{planned} / {actual}"))
            }),
            Column::new("Progression", 12.0, |r| CellValue::text(r.progression.label())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_group_by_thousands() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1000.0), "1 000");
        assert_eq!(format_number(1234567.5), "1 234 567.5");
        assert_eq!(format_number(14.5), "14.5");
        assert_eq!(format_number(1250.25), "1 250.25");
        assert_eq!(format_number(-0.75), "-0.75");
        assert_eq!(format_number(-25000.0), "-25 000");
        assert_eq!(format_amount(150000.0), "150 000 FCFA");
    }

    #[test]
    fn every_column_set_is_non_empty() {
        assert!(!Parent::columns().is_empty());
        assert!(!Rapport::columns().is_empty());
        assert_eq!(Facture::columns()[2].header, "Montant");
    }
}
