//! Registry of the dashboard's resources.
//!
//! Each entry is the whole configuration of one page: who may open it, where
//! it lives on the backend, which fields search and filters look at, and which
//! inline actions it offers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Censeur,
    Comptable,
    Secretaire,
    Formateur,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Censeur,
        Role::Comptable,
        Role::Secretaire,
        Role::Formateur,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Censeur => "censeur",
            Self::Comptable => "comptable",
            Self::Secretaire => "secretaire",
            Self::Formateur => "formateur",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DeskError;

    fn from_str(value: &str) -> Result<Self> {
        let lower = value.trim().to_lowercase();
        match lower.as_str() {
            "admin" => Ok(Self::Admin),
            "censeur" | "censor" => Ok(Self::Censeur),
            "comptable" | "accountant" => Ok(Self::Comptable),
            "secretaire" | "secrétaire" | "secretary" => Ok(Self::Secretaire),
            "formateur" | "teacher" => Ok(Self::Formateur),
            _ => Err(DeskError::Config(format!("unknown role: {value}"))),
        }
    }
}

/// Which record type a resource lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Parents,
    Eleves,
    Formateurs,
    Filieres,
    Modules,
    Vagues,
    Paiements,
    Factures,
    Quittances,
    Rapports,
}

/// Inline actions multiplexed onto `POST ...?action=<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    Approve,
    Reject,
    Send,
    Cancel,
    ToggleStatus,
}

impl RecordAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Send => "send",
            Self::Cancel => "cancel",
            Self::ToggleStatus => "toggle-status",
        }
    }
}

impl fmt::Display for RecordAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub role: Role,
    pub name: &'static str,
    pub title: &'static str,
    pub kind: ResourceKind,
    /// Wrapper key some endpoints use instead of `data`.
    pub envelope_key: &'static str,
    pub filter_keys: &'static [&'static str],
    pub default_sort: &'static str,
    pub group_by: &'static str,
    pub actions: &'static [RecordAction],
}

impl Resource {
    /// `/api/<role>/<resource>`
    pub fn path(&self) -> String {
        format!("/api/{}/{}", self.role, self.name)
    }

    pub fn stats_path(&self) -> String {
        format!("{}/stats", self.path())
    }

    pub fn supports(&self, action: RecordAction) -> bool {
        self.actions.contains(&action)
    }

    /// Client-side page guard. Not a security boundary: the backend enforces access.
    pub fn ensure_role(&self, current: Role) -> Result<()> {
        if current == self.role {
            Ok(())
        } else {
            Err(DeskError::Forbidden {
                expected: self.role.to_string(),
                actual: current.to_string(),
            })
        }
    }
}

pub static REGISTRY: &[Resource] = &[
    Resource {
        role: Role::Admin,
        name: "parents",
        title: "Liste des parents",
        kind: ResourceKind::Parents,
        envelope_key: "parents",
        filter_keys: &["statut"],
        default_sort: "nom",
        group_by: "statut",
        actions: &[RecordAction::ToggleStatus],
    },
    Resource {
        role: Role::Admin,
        name: "eleves",
        title: "Liste des élèves",
        kind: ResourceKind::Eleves,
        envelope_key: "eleves",
        filter_keys: &["statut", "filiere", "vague"],
        default_sort: "nom",
        group_by: "filiere",
        actions: &[RecordAction::ToggleStatus],
    },
    Resource {
        role: Role::Admin,
        name: "formateurs",
        title: "Liste des formateurs",
        kind: ResourceKind::Formateurs,
        envelope_key: "formateurs",
        filter_keys: &["statut", "specialite"],
        default_sort: "nom",
        group_by: "statut",
        actions: &[RecordAction::ToggleStatus],
    },
    Resource {
        role: Role::Admin,
        name: "filieres",
        title: "Liste des filières",
        kind: ResourceKind::Filieres,
        envelope_key: "filieres",
        filter_keys: &[],
        default_sort: "nom",
        group_by: "dureeMois",
        actions: &[],
    },
    Resource {
        role: Role::Admin,
        name: "modules",
        title: "Liste des modules",
        kind: ResourceKind::Modules,
        envelope_key: "modules",
        filter_keys: &["filiereId"],
        default_sort: "nom",
        group_by: "filiereId",
        actions: &[],
    },
    Resource {
        role: Role::Admin,
        name: "vagues",
        title: "Liste des vagues",
        kind: ResourceKind::Vagues,
        envelope_key: "vagues",
        filter_keys: &["statut"],
        default_sort: "dateDebut",
        group_by: "statut",
        actions: &[],
    },
    Resource {
        role: Role::Secretaire,
        name: "eleves",
        title: "Inscriptions des élèves",
        kind: ResourceKind::Eleves,
        envelope_key: "eleves",
        filter_keys: &["statut", "filiere", "vague"],
        default_sort: "nom",
        group_by: "vague",
        actions: &[],
    },
    Resource {
        role: Role::Secretaire,
        name: "parents",
        title: "Contacts des parents",
        kind: ResourceKind::Parents,
        envelope_key: "parents",
        filter_keys: &["statut"],
        default_sort: "nom",
        group_by: "statut",
        actions: &[],
    },
    Resource {
        role: Role::Comptable,
        name: "paiements",
        title: "Rapport des paiements",
        kind: ResourceKind::Paiements,
        envelope_key: "paiements",
        filter_keys: &["statut", "methode"],
        default_sort: "eleve",
        group_by: "statut",
        actions: &[RecordAction::Approve, RecordAction::Reject],
    },
    Resource {
        role: Role::Comptable,
        name: "factures",
        title: "Liste des factures",
        kind: ResourceKind::Factures,
        envelope_key: "factures",
        filter_keys: &["statut"],
        default_sort: "numero",
        group_by: "statut",
        actions: &[RecordAction::Send, RecordAction::Cancel],
    },
    Resource {
        role: Role::Comptable,
        name: "quittances",
        title: "Liste des quittances",
        kind: ResourceKind::Quittances,
        envelope_key: "quittances",
        filter_keys: &["statut"],
        default_sort: "numero",
        group_by: "statut",
        actions: &[RecordAction::Send, RecordAction::Cancel],
    },
    Resource {
        role: Role::Censeur,
        name: "rapports",
        title: "Rapports des formateurs",
        kind: ResourceKind::Rapports,
        envelope_key: "rapports",
        filter_keys: &["progression", "formateur", "module"],
        default_sort: "formateur",
        group_by: "progression",
        actions: &[RecordAction::Approve, RecordAction::Reject],
    },
    Resource {
        role: Role::Formateur,
        name: "rapports",
        title: "Mes rapports",
        kind: ResourceKind::Rapports,
        envelope_key: "rapports",
        filter_keys: &["progression", "module"],
        default_sort: "module",
        group_by: "progression",
        actions: &[],
    },
];

/// Looks up `name` for `role`. A resource that exists only for another role
/// yields [`DeskError::Forbidden`].
pub fn find(role: Role, name: &str) -> Result<&'static Resource> {
    if let Some(resource) = REGISTRY.iter().find(|r| r.role == role && r.name == name) {
        return Ok(resource);
    }
    match REGISTRY.iter().find(|r| r.name == name) {
        Some(other) => {
            other.ensure_role(role)?;
            Ok(other)
        }
        None => Err(DeskError::UnknownResource(name.to_string())),
    }
}

pub fn for_role(role: Role) -> impl Iterator<Item = &'static Resource> {
    REGISTRY.iter().filter(move |r| r.role == role)
}
