use serde_json::json;

use ecole_desk::form::{self, EnrollmentCatalog, EnrollmentForm};
use ecole_desk::DeskError;

fn catalog() -> EnrollmentCatalog {
    EnrollmentCatalog {
        filieres: serde_json::from_value(json!([
            { "id": 1, "nom": "Informatique", "modules": [10], "vagues": [100] },
            { "id": 2, "nom": "Comptabilité" }
        ]))
        .unwrap(),
        modules: serde_json::from_value(json!([
            { "id": 10, "nom": "Algorithmique", "formateurIds": [7] },
            { "id": 11, "nom": "Réseaux", "filiereId": 1 },
            { "id": 20, "nom": "Fiscalité", "filiereId": 2 }
        ]))
        .unwrap(),
        formateurs: serde_json::from_value(json!([
            { "id": 7, "nom": "Sow", "prenom": "Moussa", "email": "m.sow@ecole.sn" },
            {
                "id": 8, "nom": "Ba", "prenom": "Fatou", "email": "f.ba@ecole.sn",
                "modules": [{ "id": 11, "nom": "Réseaux" }]
            }
        ]))
        .unwrap(),
        vagues: serde_json::from_value(json!([
            { "id": 100, "nom": "Vague Janvier" },
            { "id": 200, "nom": "Vague Mars", "filiereIds": [2] }
        ]))
        .unwrap(),
    }
}

fn values(form: &EnrollmentForm, field: &str) -> Vec<String> {
    form.form()
        .options(field)
        .iter()
        .map(|o| o.value.clone())
        .collect()
}

#[test]
fn choosing_a_filiere_narrows_modules_and_vagues() {
    let mut enrollment = EnrollmentForm::new(catalog());
    assert_eq!(values(&enrollment, form::FILIERE), vec!["1", "2"]);
    assert!(values(&enrollment, form::MODULE).is_empty());

    enrollment.select(form::FILIERE, "1").unwrap();
    assert_eq!(values(&enrollment, form::MODULE), vec!["10", "11"]);
    assert_eq!(values(&enrollment, form::VAGUE), vec!["100"]);

    enrollment.select(form::MODULE, "11").unwrap();
    assert_eq!(values(&enrollment, form::FORMATEUR), vec!["8"]);
}

#[test]
fn changing_the_filiere_clears_everything_below_it() {
    let mut enrollment = EnrollmentForm::new(catalog());
    enrollment.select(form::FILIERE, "1").unwrap();
    enrollment.select(form::MODULE, "10").unwrap();
    enrollment.select(form::VAGUE, "100").unwrap();
    enrollment.select(form::FORMATEUR, "7").unwrap();
    assert!(enrollment.validate().is_ok());

    let reset = enrollment.select(form::FILIERE, "2").unwrap();
    for field in [form::MODULE, form::VAGUE, form::FORMATEUR] {
        assert!(reset.iter().any(|r| r == field), "{field} not reset");
        assert_eq!(enrollment.form().get(field), "");
    }
    assert!(values(&enrollment, form::FORMATEUR).is_empty());
    assert_eq!(values(&enrollment, form::MODULE), vec!["20"]);
    assert_eq!(values(&enrollment, form::VAGUE), vec!["200"]);

    let err = enrollment.validate().unwrap_err();
    assert!(matches!(err, DeskError::Validation { ref fields } if fields.len() == 3));
}

#[test]
fn values_outside_the_current_options_are_refused() {
    let mut enrollment = EnrollmentForm::new(catalog());
    assert!(enrollment.select(form::MODULE, "10").is_err());

    enrollment.select(form::FILIERE, "2").unwrap();
    assert!(enrollment.select(form::MODULE, "10").is_err());
    assert_eq!(enrollment.form().get(form::MODULE), "");
}

#[test]
fn complete_assignment_serializes_every_field() {
    let mut enrollment = EnrollmentForm::new(catalog());
    enrollment.select(form::FILIERE, "1").unwrap();
    enrollment.select(form::MODULE, "10").unwrap();
    enrollment.select(form::VAGUE, "100").unwrap();
    enrollment.select(form::FORMATEUR, "7").unwrap();

    assert_eq!(
        enrollment.to_json(),
        json!({
            "filiereId": "1",
            "moduleId": "10",
            "formateurId": "7",
            "vagueId": "100"
        })
    );
}
