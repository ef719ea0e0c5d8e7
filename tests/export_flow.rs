use chrono::NaiveDate;

use ecole_desk::export::pdf::PdfLayout;
use ecole_desk::export::{export_table, ExportFormat, ExportRequest, Exportable, TableData};
use ecole_desk::filter::{apply_filter, FilterCriteria};
use ecole_desk::models::{Facture, InvoiceStatus, NamedRef, Rapport, RecordId, ReportProgress};
use ecole_desk::notify::{NoticeLevel, RecordingNotifier};
use ecole_desk::DeskError;

fn invoice(id: &str, statut: InvoiceStatus, montant: f64) -> Facture {
    Facture {
        id: RecordId::from(id),
        numero: format!("FAC-2024-{id}"),
        montant,
        statut,
        eleve: Some(NamedRef {
            id: RecordId::from("e1"),
            nom: "Awa Ndiaye".to_string(),
        }),
        date_emission: None,
    }
}

fn request(format: ExportFormat) -> ExportRequest<'static> {
    ExportRequest {
        resource: "factures",
        title: "Factures",
        format,
        date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        group_by: Some("statut"),
    }
}

#[test]
fn empty_export_raises_exactly_one_error_notice() {
    for format in [ExportFormat::Csv, ExportFormat::Xlsx, ExportFormat::Pdf] {
        let notifier = RecordingNotifier::new();
        let err = export_table::<Facture>(&[], &Facture::columns(), &request(format), &notifier)
            .unwrap_err();
        assert!(matches!(err, DeskError::EmptyExport { .. }));
        assert_eq!(notifier.notices().len(), 1);
        assert_eq!(notifier.count(NoticeLevel::Error), 1);
    }
}

#[test]
fn csv_has_one_line_per_record_plus_header() {
    let records: Vec<Facture> = (1..=4)
        .map(|n| invoice(&n.to_string(), InvoiceStatus::Payee, 1000.0 * n as f64))
        .collect();
    let notifier = RecordingNotifier::new();
    let document = export_table(
        &records,
        &Facture::columns(),
        &request(ExportFormat::Csv),
        &notifier,
    )
    .unwrap();

    let text = String::from_utf8(document.bytes).unwrap();
    assert_eq!(text.lines().count(), records.len() + 1);
    assert_eq!(document.row_count, 4);
    assert_eq!(document.file_name, "factures-2024-03-15.csv");
    assert_eq!(notifier.count(NoticeLevel::Info), 1);
    assert_eq!(notifier.count(NoticeLevel::Success), 1);
}

#[test]
fn filtered_invoices_export_only_matching_rows() {
    let invoices = vec![
        invoice("1", InvoiceStatus::Generee, 50000.0),
        invoice("2", InvoiceStatus::Payee, 75000.0),
        invoice("3", InvoiceStatus::Annulee, 20000.0),
    ];
    let criteria = FilterCriteria::new().with_category("statut", "generee");
    let visible = apply_filter(&invoices, &criteria);
    assert_eq!(visible.len(), 1);

    let notifier = RecordingNotifier::new();
    let document = export_table(
        &visible,
        &Facture::columns(),
        &request(ExportFormat::Pdf),
        &notifier,
    )
    .unwrap();
    assert_eq!(document.row_count, 1);
    assert!(document.bytes.starts_with(b"%PDF"));
    assert_eq!(document.file_name, "factures-2024-03-15.pdf");

    let table = TableData::build(&visible, &Facture::columns(), "Factures");
    assert_eq!(PdfLayout::plan(&table).body_row_count(), 1);
}

#[test]
fn xlsx_export_is_a_zip_container() {
    let records = vec![
        invoice("1", InvoiceStatus::Generee, 50000.0),
        invoice("2", InvoiceStatus::Generee, 12500.0),
    ];
    let notifier = RecordingNotifier::new();
    let document = export_table(
        &records,
        &Facture::columns(),
        &request(ExportFormat::Xlsx),
        &notifier,
    )
    .unwrap();
    assert!(document.bytes.starts_with(b"PK"));
    assert_eq!(document.file_name, "factures-2024-03-15.xlsx");
}

#[test]
fn written_file_lands_in_the_target_directory() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![invoice("1", InvoiceStatus::Envoyee, 9000.0)];
    let document = export_table(
        &records,
        &Facture::columns(),
        &request(ExportFormat::Csv),
        &RecordingNotifier::new(),
    )
    .unwrap();
    let path = document.write_to(&dir.path().join("exports")).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), document.bytes);
}

#[test]
fn fractional_scores_and_amounts_survive_csv_export() {
    let report = Rapport {
        id: RecordId::from("r1"),
        formateur: None,
        module: None,
        objectif: "Boucles".to_string(),
        chapitre: "Chapitre 3".to_string(),
        difficultes: None,
        commentaires: None,
        note_evaluation: Some(14.5),
        duree_prevue: Some(4.0),
        duree_reelle: Some(4.5),
        progression: ReportProgress::Conforme,
    };
    let document = export_table(
        &[report],
        &Rapport::columns(),
        &ExportRequest {
            resource: "rapports",
            title: "Rapports",
            format: ExportFormat::Csv,
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            group_by: None,
        },
        &RecordingNotifier::new(),
    )
    .unwrap();
    let text = String::from_utf8(document.bytes).unwrap();
    assert!(text.contains("\"14.5\""), "{text}");

    let invoices = vec![invoice("1", InvoiceStatus::Generee, 1250.5)];
    let document = export_table(
        &invoices,
        &Facture::columns(),
        &request(ExportFormat::Csv),
        &RecordingNotifier::new(),
    )
    .unwrap();
    let mut reader = csv::Reader::from_reader(document.bytes.as_slice());
    let row = reader.records().next().unwrap().unwrap();
    assert!(row.iter().any(|field| field == "1 250.5"), "{row:?}");
}
