//! Draft state for create/edit dialogs with dependent selects.
//!
//! A field may depend on a parent field. Changing the parent resets every
//! field below it (transitively) to empty, in the same update, and clears
//! their option lists until the parent's new value repopulates them.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::error::{DeskError, Result};
use crate::models::{Filiere, Formateur, Module, RecordId, Vague};

/// A selectable value and its display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DependentForm {
    order: Vec<String>,
    values: BTreeMap<String, String>,
    parents: BTreeMap<String, String>,
    required: BTreeSet<String>,
    options: BTreeMap<String, Vec<SelectOption>>,
}

impl DependentForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field. Fields keep declaration order for validation messages.
    #[must_use]
    pub fn field(mut self, name: &str, required: bool) -> Self {
        if !self.values.contains_key(name) {
            self.order.push(name.to_string());
            self.values.insert(name.to_string(), String::new());
        }
        if required {
            self.required.insert(name.to_string());
        }
        self
    }

    /// Declares `child` as dependent on `parent`.
    #[must_use]
    pub fn depends_on(mut self, child: &str, parent: &str) -> Self {
        self.parents.insert(child.to_string(), parent.to_string());
        self
    }

    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn options(&self, name: &str) -> &[SelectOption] {
        self.options.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_options(&mut self, name: &str, options: Vec<SelectOption>) {
        self.options.insert(name.to_string(), options);
    }

    /// Every field below `name`, nearest first.
    pub fn dependents(&self, name: &str) -> Vec<String> {
        let mut found = Vec::new();
        let mut frontier = vec![name.to_string()];
        while let Some(current) = frontier.pop() {
            for field in &self.order {
                if self.parents.get(field) == Some(&current) && !found.contains(field) {
                    found.push(field.clone());
                    frontier.push(field.clone());
                }
            }
        }
        found
    }

    /// Sets `name` to `value`. If the value changed, every dependent field is
    /// emptied and its options cleared; the reset fields are returned.
    pub fn set(&mut self, name: &str, value: &str) -> Result<Vec<String>> {
        let Some(current) = self.values.get(name) else {
            return Err(DeskError::Validation {
                fields: vec![name.to_string()],
            });
        };
        if current == value {
            return Ok(Vec::new());
        }

        self.values.insert(name.to_string(), value.to_string());
        let reset = self.dependents(name);
        for field in &reset {
            self.values.insert(field.clone(), String::new());
            self.options.remove(field);
        }
        if !reset.is_empty() {
            tracing::debug!(field = name, reset = ?reset, "dependent fields cleared");
        }
        Ok(reset)
    }

    /// Required fields that are still empty, in declaration order.
    pub fn missing_required(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|field| self.required.contains(*field) && self.get(field).trim().is_empty())
            .cloned()
            .collect()
    }

    pub fn is_submittable(&self) -> bool {
        self.missing_required().is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let fields = self.missing_required();
        if fields.is_empty() {
            Ok(())
        } else {
            Err(DeskError::Validation { fields })
        }
    }

    /// JSON body with every non-empty field.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .order
            .iter()
            .filter(|field| !self.get(field).is_empty())
            .map(|field| (field.clone(), Value::String(self.get(field).to_string())))
            .collect();
        Value::Object(map)
    }
}

pub const FILIERE: &str = "filiereId";
pub const MODULE: &str = "moduleId";
pub const FORMATEUR: &str = "formateurId";
pub const VAGUE: &str = "vagueId";

/// Reference data behind the filière → module → formateur → vague selects.
#[derive(Debug, Clone, Default)]
pub struct EnrollmentCatalog {
    pub filieres: Vec<Filiere>,
    pub modules: Vec<Module>,
    pub formateurs: Vec<Formateur>,
    pub vagues: Vec<Vague>,
}

impl EnrollmentCatalog {
    pub fn modules_for(&self, filiere: &RecordId) -> Vec<&Module> {
        let listed = self
            .filieres
            .iter()
            .find(|f| &f.id == filiere)
            .map(|f| f.modules.as_slice())
            .unwrap_or(&[]);
        self.modules
            .iter()
            .filter(|m| m.filiere_id.as_ref() == Some(filiere) || listed.contains(&m.id))
            .collect()
    }

    pub fn formateurs_for(&self, module: &RecordId) -> Vec<&Formateur> {
        let assigned = self
            .modules
            .iter()
            .find(|m| &m.id == module)
            .map(|m| m.formateur_ids.as_slice())
            .unwrap_or(&[]);
        self.formateurs
            .iter()
            .filter(|f| assigned.contains(&f.id) || f.modules.iter().any(|r| &r.id == module))
            .collect()
    }

    pub fn vagues_for(&self, filiere: &RecordId) -> Vec<&Vague> {
        let listed = self
            .filieres
            .iter()
            .find(|f| &f.id == filiere)
            .map(|f| f.vagues.as_slice())
            .unwrap_or(&[]);
        self.vagues
            .iter()
            .filter(|v| v.filiere_ids.contains(filiere) || listed.contains(&v.id))
            .collect()
    }
}

/// Assignment form: filière, then module and vague, then formateur.
#[derive(Debug, Clone)]
pub struct EnrollmentForm {
    catalog: EnrollmentCatalog,
    form: DependentForm,
}

impl EnrollmentForm {
    pub fn new(catalog: EnrollmentCatalog) -> Self {
        let mut form = DependentForm::new()
            .field(FILIERE, true)
            .field(MODULE, true)
            .field(FORMATEUR, true)
            .field(VAGUE, true)
            .depends_on(MODULE, FILIERE)
            .depends_on(VAGUE, FILIERE)
            .depends_on(FORMATEUR, MODULE);
        form.set_options(
            FILIERE,
            catalog
                .filieres
                .iter()
                .map(|f| SelectOption::new(f.id.as_str(), &f.nom))
                .collect(),
        );
        Self { catalog, form }
    }

    pub fn form(&self) -> &DependentForm {
        &self.form
    }

    /// Selects a value, refusing anything not offered by the current options,
    /// then repopulates the options of the fields directly below it.
    pub fn select(&mut self, field: &str, value: &str) -> Result<Vec<String>> {
        if !self.form.options(field).iter().any(|o| o.value == value) {
            return Err(DeskError::Validation {
                fields: vec![field.to_string()],
            });
        }
        let reset = self.form.set(field, value)?;
        let id = RecordId::from(value);

        match field {
            FILIERE => {
                let modules = self
                    .catalog
                    .modules_for(&id)
                    .into_iter()
                    .map(|m| SelectOption::new(m.id.as_str(), &m.nom))
                    .collect();
                let vagues = self
                    .catalog
                    .vagues_for(&id)
                    .into_iter()
                    .map(|v| SelectOption::new(v.id.as_str(), &v.nom))
                    .collect();
                self.form.set_options(MODULE, modules);
                self.form.set_options(VAGUE, vagues);
            }
            MODULE => {
                let formateurs = self
                    .catalog
                    .formateurs_for(&id)
                    .into_iter()
                    .map(|f| SelectOption::new(f.id.as_str(), f.full_name()))
                    .collect();
                self.form.set_options(FORMATEUR, formateurs);
            }
            _ => {}
        }
        Ok(reset)
    }

    pub fn validate(&self) -> Result<()> {
        self.form.validate()
    }

    pub fn to_json(&self) -> Value {
        self.form.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_change_resets_children_in_same_update() {
        let mut form = DependentForm::new()
            .field("a", true)
            .field("b", true)
            .field("c", false)
            .depends_on("b", "a")
            .depends_on("c", "b");

        form.set("a", "a1").unwrap();
        form.set("b", "b1").unwrap();
        form.set("c", "c1").unwrap();

        let reset = form.set("a", "a2").unwrap();
        assert_eq!(reset, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(form.get("a"), "a2");
        assert_eq!(form.get("b"), "");
        assert_eq!(form.get("c"), "");
    }

    #[test]
    fn same_value_resets_nothing() {
        let mut form = DependentForm::new()
            .field("a", true)
            .field("b", true)
            .depends_on("b", "a");
        form.set("a", "a1").unwrap();
        form.set("b", "b1").unwrap();
        assert!(form.set("a", "a1").unwrap().is_empty());
        assert_eq!(form.get("b"), "b1");
    }

    #[test]
    fn validation_lists_empty_required_fields() {
        let mut form = DependentForm::new().field("nom", true).field("note", false);
        assert!(!form.is_submittable());
        let err = form.validate().unwrap_err();
        assert!(matches!(err, DeskError::Validation { ref fields } if fields == &["nom"]));

        form.set("nom", "Diop").unwrap();
        assert!(form.validate().is_ok());
        assert_eq!(form.to_json(), serde_json::json!({ "nom": "Diop" }));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut form = DependentForm::new().field("nom", true);
        assert!(form.set("prenom", "x").is_err());
    }
}
