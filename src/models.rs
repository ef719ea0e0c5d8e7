use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::filter::Searchable;

/// Backend identifier. Some endpoints send integers, others strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Int(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(value) => Self(value),
            RawId::Int(value) => Self(value.to_string()),
        })
    }
}

/// A record held in a remote collection.
pub trait Record: Searchable {
    fn id(&self) -> &RecordId;

    /// Monetary amount for financial records.
    fn amount(&self) -> Option<f64> {
        None
    }
}

/// Declares a status-like enum carried on the wire as a lowercase French word.
/// Values the backend adds later land in `Other` instead of failing the list.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal, $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(value) => value,
                }
            }

            pub fn label(&self) -> &str {
                match self {
                    $(Self::$variant => $label,)+
                    Self::Other(value) => value,
                }
            }

            pub fn parse(value: &str) -> Self {
                match value {
                    $($wire => Self::$variant,)+
                    other => Self::Other(other.to_string()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(Self::parse(&raw))
            }
        }
    };
}

wire_enum!(
    /// Account state of a parent, student or teacher.
    PersonStatus {
        Actif => "actif", "Actif",
        Inactif => "inactif", "Inactif",
        Suspendu => "suspendu", "Suspendu",
    }
);

wire_enum!(
    PaymentStatus {
        EnAttente => "en_attente", "En attente",
        Approuve => "approuve", "Approuvé",
        Rejete => "rejete", "Rejeté",
    }
);

wire_enum!(
    PaymentMethod {
        Especes => "especes", "Espèces",
        Cheque => "cheque", "Chèque",
        Virement => "virement", "Virement",
        MobileMoney => "mobile_money", "Mobile money",
        Carte => "carte", "Carte bancaire",
    }
);

wire_enum!(
    InvoiceStatus {
        Generee => "generee", "Générée",
        Envoyee => "envoyee", "Envoyée",
        Payee => "payee", "Payée",
        Annulee => "annulee", "Annulée",
    }
);

wire_enum!(
    ReceiptStatus {
        Emise => "emise", "Émise",
        Envoyee => "envoyee", "Envoyée",
        Annulee => "annulee", "Annulée",
    }
);

wire_enum!(
    /// Actual vs planned pace of a teacher report.
    ReportProgress {
        EnRetard => "en_retard", "En retard",
        Conforme => "conforme", "Conforme",
        EnAvance => "en_avance", "En avance",
    }
);

impl Default for PersonStatus {
    fn default() -> Self {
        Self::Actif
    }
}

impl Default for ReportProgress {
    fn default() -> Self {
        Self::Conforme
    }
}

/// Embedded `{ id, nom }` summary of another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: RecordId,
    pub nom: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSummary {
    pub id: RecordId,
    pub nom: String,
    pub prenom: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parent {
    pub id: RecordId,
    pub nom: String,
    pub prenom: String,
    pub email: String,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub statut: PersonStatus,
    #[serde(default)]
    pub enfants: Vec<ChildSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eleve {
    pub id: RecordId,
    pub nom: String,
    pub prenom: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub statut: PersonStatus,
    #[serde(default)]
    pub filiere: Option<NamedRef>,
    #[serde(default)]
    pub vague: Option<NamedRef>,
    #[serde(default)]
    pub parent_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Formateur {
    pub id: RecordId,
    pub nom: String,
    pub prenom: String,
    pub email: String,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub specialite: Option<String>,
    #[serde(default)]
    pub statut: PersonStatus,
    #[serde(default)]
    pub modules: Vec<NamedRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filiere {
    pub id: RecordId,
    pub nom: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duree_mois: Option<u32>,
    #[serde(default)]
    pub modules: Vec<RecordId>,
    #[serde(default)]
    pub vagues: Vec<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: RecordId,
    pub nom: String,
    #[serde(default)]
    pub coefficient: f64,
    #[serde(default)]
    pub duree_heures: Option<u32>,
    #[serde(default)]
    pub filiere_id: Option<RecordId>,
    #[serde(default)]
    pub formateur_ids: Vec<RecordId>,
}

/// Accepts `2024-01-15` as well as a full RFC 3339 timestamp.
fn calendar_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|moment| Some(moment.with_timezone(&Utc).date_naive()))
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vague {
    pub id: RecordId,
    pub nom: String,
    #[serde(default, deserialize_with = "calendar_date")]
    pub date_debut: Option<NaiveDate>,
    #[serde(default, deserialize_with = "calendar_date")]
    pub date_fin: Option<NaiveDate>,
    #[serde(default)]
    pub filiere_ids: Vec<RecordId>,
    #[serde(default)]
    pub statut: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paiement {
    pub id: RecordId,
    pub montant: f64,
    pub methode: PaymentMethod,
    pub statut: PaymentStatus,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub eleve: Option<NamedRef>,
    #[serde(default)]
    pub parent: Option<NamedRef>,
    #[serde(default)]
    pub date_paiement: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facture {
    pub id: RecordId,
    pub numero: String,
    pub montant: f64,
    pub statut: InvoiceStatus,
    #[serde(default)]
    pub eleve: Option<NamedRef>,
    #[serde(default)]
    pub date_emission: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quittance {
    pub id: RecordId,
    pub numero: String,
    pub montant: f64,
    pub statut: ReceiptStatus,
    #[serde(default)]
    pub paiement_id: Option<RecordId>,
    #[serde(default)]
    pub eleve: Option<NamedRef>,
    #[serde(default)]
    pub date_emission: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rapport {
    pub id: RecordId,
    #[serde(default)]
    pub formateur: Option<NamedRef>,
    #[serde(default)]
    pub module: Option<NamedRef>,
    #[serde(default)]
    pub objectif: String,
    #[serde(default)]
    pub chapitre: String,
    #[serde(default)]
    pub difficultes: Option<String>,
    #[serde(default)]
    pub commentaires: Option<String>,
    #[serde(default)]
    pub note_evaluation: Option<f64>,
    #[serde(default)]
    pub duree_prevue: Option<f64>,
    #[serde(default)]
    pub duree_reelle: Option<f64>,
    #[serde(default)]
    pub progression: ReportProgress,
}

/// Aggregates computed by the backend, shown as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DashboardStats(pub BTreeMap<String, serde_json::Value>);

fn full_name(prenom: &str, nom: &str) -> String {
    format!("{prenom} {nom}")
}

fn ref_name(value: &Option<NamedRef>) -> Option<String> {
    value.as_ref().map(|r| r.nom.clone())
}

fn ref_str(value: &Option<NamedRef>) -> Option<&str> {
    value.as_ref().map(|r| r.nom.as_str())
}

impl Parent {
    pub fn full_name(&self) -> String {
        full_name(&self.prenom, &self.nom)
    }
}

impl Eleve {
    pub fn full_name(&self) -> String {
        full_name(&self.prenom, &self.nom)
    }
}

impl Formateur {
    pub fn full_name(&self) -> String {
        full_name(&self.prenom, &self.nom)
    }
}

impl Searchable for Parent {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.nom.as_str(), self.prenom.as_str(), self.email.as_str()];
        fields.extend(self.telephone.as_deref());
        fields
    }

    fn field(&self, key: &str) -> Option<String> {
        match key {
            "nom" => Some(self.nom.clone()),
            "prenom" => Some(self.prenom.clone()),
            "email" => Some(self.email.clone()),
            "telephone" => self.telephone.clone(),
            "statut" => Some(self.statut.as_str().to_string()),
            _ => None,
        }
    }
}

impl Record for Parent {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Searchable for Eleve {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.nom.as_str(), self.prenom.as_str()];
        fields.extend(self.email.as_deref());
        fields.extend(self.telephone.as_deref());
        fields
    }

    fn field(&self, key: &str) -> Option<String> {
        match key {
            "nom" => Some(self.nom.clone()),
            "prenom" => Some(self.prenom.clone()),
            "email" => self.email.clone(),
            "statut" => Some(self.statut.as_str().to_string()),
            "filiere" => ref_name(&self.filiere),
            "vague" => ref_name(&self.vague),
            _ => None,
        }
    }
}

impl Record for Eleve {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Searchable for Formateur {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.nom.as_str(), self.prenom.as_str(), self.email.as_str()];
        fields.extend(self.specialite.as_deref());
        fields
    }

    fn field(&self, key: &str) -> Option<String> {
        match key {
            "nom" => Some(self.nom.clone()),
            "prenom" => Some(self.prenom.clone()),
            "email" => Some(self.email.clone()),
            "specialite" => self.specialite.clone(),
            "statut" => Some(self.statut.as_str().to_string()),
            _ => None,
        }
    }
}

impl Record for Formateur {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Searchable for Filiere {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.nom.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }

    fn field(&self, key: &str) -> Option<String> {
        match key {
            "nom" => Some(self.nom.clone()),
            "dureeMois" => self.duree_mois.map(|d| d.to_string()),
            _ => None,
        }
    }
}

impl Record for Filiere {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Searchable for Module {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.nom.as_str()]
    }

    fn field(&self, key: &str) -> Option<String> {
        match key {
            "nom" => Some(self.nom.clone()),
            "coefficient" => Some(self.coefficient.to_string()),
            "filiereId" => self.filiere_id.as_ref().map(|id| id.0.clone()),
            _ => None,
        }
    }
}

impl Record for Module {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Searchable for Vague {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.nom.as_str()]
    }

    fn field(&self, key: &str) -> Option<String> {
        match key {
            "nom" => Some(self.nom.clone()),
            "statut" => self.statut.clone(),
            "dateDebut" => self.date_debut.map(|d| d.to_string()),
            _ => None,
        }
    }
}

impl Record for Vague {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Searchable for Paiement {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        fields.extend(self.reference.as_deref());
        fields.extend(ref_str(&self.eleve));
        fields.extend(ref_str(&self.parent));
        fields
    }

    fn field(&self, key: &str) -> Option<String> {
        match key {
            "statut" => Some(self.statut.as_str().to_string()),
            "methode" => Some(self.methode.as_str().to_string()),
            "eleve" => ref_name(&self.eleve),
            "parent" => ref_name(&self.parent),
            "reference" => self.reference.clone(),
            _ => None,
        }
    }
}

impl Record for Paiement {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn amount(&self) -> Option<f64> {
        Some(self.montant)
    }
}

impl Searchable for Facture {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.numero.as_str()];
        fields.extend(ref_str(&self.eleve));
        fields
    }

    fn field(&self, key: &str) -> Option<String> {
        match key {
            "numero" => Some(self.numero.clone()),
            "statut" => Some(self.statut.as_str().to_string()),
            "eleve" => ref_name(&self.eleve),
            _ => None,
        }
    }
}

impl Record for Facture {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn amount(&self) -> Option<f64> {
        Some(self.montant)
    }
}

impl Searchable for Quittance {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.numero.as_str()];
        fields.extend(ref_str(&self.eleve));
        fields
    }

    fn field(&self, key: &str) -> Option<String> {
        match key {
            "numero" => Some(self.numero.clone()),
            "statut" => Some(self.statut.as_str().to_string()),
            "eleve" => ref_name(&self.eleve),
            _ => None,
        }
    }
}

impl Record for Quittance {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn amount(&self) -> Option<f64> {
        Some(self.montant)
    }
}

impl Searchable for Rapport {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.objectif.as_str(), self.chapitre.as_str()];
        fields.extend(self.difficultes.as_deref());
        fields.extend(self.commentaires.as_deref());
        fields.extend(ref_str(&self.formateur));
        fields.extend(ref_str(&self.module));
        fields
    }

    fn field(&self, key: &str) -> Option<String> {
        match key {
            "chapitre" => Some(self.chapitre.clone()),
            "progression" => Some(self.progression.as_str().to_string()),
            "formateur" => ref_name(&self.formateur),
            "module" => ref_name(&self.module),
            _ => None,
        }
    }
}

impl Record for Rapport {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ids_accept_numbers_and_strings() {
        let ids: Vec<RecordId> = serde_json::from_str(r#"[12, "ab-3"]"#).unwrap();
        assert_eq!(ids, vec![RecordId::from("12"), RecordId::from("ab-3")]);
        assert_eq!(serde_json::to_string(&ids[0]).unwrap(), r#""12""#);
    }

    #[test]
    fn unknown_status_values_are_preserved() {
        let status: InvoiceStatus = serde_json::from_str(r#""archivee""#).unwrap();
        assert_eq!(status, InvoiceStatus::Other("archivee".to_string()));
        assert_eq!(status.as_str(), "archivee");

        let known: PaymentStatus = serde_json::from_str(r#""en_attente""#).unwrap();
        assert_eq!(known, PaymentStatus::EnAttente);
        assert_eq!(known.label(), "En attente");
    }

    #[test]
    fn payment_decodes_from_backend_shape() {
        let payment: Paiement = serde_json::from_str(
            r#"{
                "id": 7,
                "montant": 150000,
                "methode": "mobile_money",
                "statut": "approuve",
                "eleve": { "id": 3, "nom": "Awa Diallo" },
                "datePaiement": "2026-01-15T10:00:00.000Z"
            }"#,
        )
        .unwrap();
        assert_eq!(payment.id.as_str(), "7");
        assert_eq!(payment.methode, PaymentMethod::MobileMoney);
        assert_eq!(payment.field("eleve").as_deref(), Some("Awa Diallo"));
        assert_eq!(payment.amount(), Some(150000.0));
        assert!(payment.date_paiement.is_some());
    }

    #[test]
    fn vague_dates_accept_plain_and_timestamp_forms() {
        let vagues: Vec<Vague> = serde_json::from_str(
            r#"[
                { "id": 1, "nom": "V1", "dateDebut": "2024-01-15T00:00:00.000Z", "dateFin": "2024-06-30" },
                { "id": 2, "nom": "V2", "dateDebut": "2024-09-01T23:30:00+02:00", "dateFin": null },
                { "id": 3, "nom": "V3", "dateDebut": "" }
            ]"#,
        )
        .unwrap();
        assert_eq!(vagues[0].date_debut, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(vagues[0].date_fin, NaiveDate::from_ymd_opt(2024, 6, 30));
        assert_eq!(vagues[1].date_debut, NaiveDate::from_ymd_opt(2024, 9, 1));
        assert_eq!(vagues[1].date_fin, None);
        assert_eq!(vagues[2].date_debut, None);
        assert_eq!(vagues[2].date_fin, None);

        let bad: Result<Vague, _> =
            serde_json::from_str(r#"{ "id": 4, "nom": "V4", "dateDebut": "janvier" }"#);
        assert!(bad.is_err());
    }

    #[test]
    fn module_filiere_key_is_the_id() {
        let module: Module =
            serde_json::from_str(r#"{ "id": 10, "nom": "Réseaux", "filiereId": 2 }"#).unwrap();
        assert_eq!(module.field("filiereId").as_deref(), Some("2"));
        assert_eq!(module.field("filiere"), None);
    }
}
