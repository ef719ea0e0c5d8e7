use std::collections::HashMap;
use std::fmt::Write;

use crate::models::Record;

/// Count (and amount total, for financial records) of one category value.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub value: String,
    pub count: usize,
    pub amount_total: Option<f64>,
}

/// Label used for records that have no value for the grouping key.
pub const UNSET: &str = "(non renseigné)";

pub fn summarize_by<T: Record>(records: &[T], key: &str) -> Vec<CategorySummary> {
    let mut map: HashMap<String, (usize, Option<f64>)> = HashMap::new();

    for record in records {
        let value = record
            .field(key)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| UNSET.to_string());
        let entry = map.entry(value).or_insert((0, None));
        entry.0 += 1;
        if let Some(amount) = record.amount() {
            entry.1 = Some(entry.1.unwrap_or(0.0) + amount);
        }
    }

    let mut summaries: Vec<CategorySummary> = map
        .into_iter()
        .map(|(value, (count, amount_total))| CategorySummary {
            value,
            count,
            amount_total,
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    summaries
}

/// Sum of all amounts in the list, or `None` when no record carries one.
pub fn total_amount<T: Record>(records: &[T]) -> Option<f64> {
    records
        .iter()
        .filter_map(|record| record.amount())
        .fold(None, |acc, amount| Some(acc.unwrap_or(0.0) + amount))
}

/// Plain-text rendition used in logs and the CLI footer.
pub fn describe(summaries: &[CategorySummary]) -> String {
    let mut output = String::new();
    if summaries.is_empty() {
        let _ = writeln!(output, "No records in this selection.");
        return output;
    }
    for summary in summaries {
        match summary.amount_total {
            Some(total) => {
                let _ = writeln!(
                    output,
                    "- {}: {} records (total {:.2})",
                    summary.value, summary.count, total
                );
            }
            None => {
                let _ = writeln!(output, "- {}: {} records", summary.value, summary.count);
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Facture, InvoiceStatus, Parent, PersonStatus, RecordId};

    fn invoice(id: &str, statut: InvoiceStatus, montant: f64) -> Facture {
        Facture {
            id: RecordId::from(id),
            numero: format!("F-{id}"),
            montant,
            statut,
            eleve: None,
            date_emission: None,
        }
    }

    #[test]
    fn groups_counts_and_amounts() {
        let invoices = vec![
            invoice("1", InvoiceStatus::Generee, 100.0),
            invoice("2", InvoiceStatus::Envoyee, 50.0),
            invoice("3", InvoiceStatus::Generee, 25.5),
        ];
        let summaries = summarize_by(&invoices, "statut");
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].value, "generee");
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[0].amount_total, Some(125.5));
        assert_eq!(total_amount(&invoices), Some(175.5));
    }

    #[test]
    fn non_financial_records_have_no_amounts() {
        let parents = vec![Parent {
            id: RecordId::from("p1"),
            nom: "Traoré".into(),
            prenom: "Fanta".into(),
            email: "fanta@example.com".into(),
            telephone: None,
            statut: PersonStatus::Actif,
            enfants: vec![],
        }];
        let summaries = summarize_by(&parents, "telephone");
        assert_eq!(summaries[0].value, UNSET);
        assert_eq!(summaries[0].amount_total, None);
        assert_eq!(total_amount(&parents), None);
        assert!(describe(&summaries).contains("1 records"));
    }
}
