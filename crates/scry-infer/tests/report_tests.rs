use super::*;
use scry_types::Type;

fn report() -> AnalysisReport {
    let mut report = AnalysisReport::default();
    let unit = UnitId::function("App\\total");
    report.definitions.insert(
        unit.clone(),
        FunctionLikeDefinition::new("total", unit).with_return_type(Type::Integer),
    );
    report.failures.push(InferError::NotFound {
        unit: UnitId::function("App\\missing"),
    });
    report.failures.push(InferError::Unanalyzable {
        unit: UnitId::function("App\\Total"),
        construct: "eval".to_string(),
    });
    report
}

#[test]
fn test_empty_report_is_clean() {
    assert!(AnalysisReport::default().is_clean());
    assert!(!report().is_clean());
}

#[test]
fn test_failures_for_ignores_case() {
    let report = report();
    let unit = UnitId::function("app\\TOTAL");
    let failures: Vec<&InferError> = report.failures_for(&unit).collect();
    assert!(matches!(
        failures.as_slice(),
        [InferError::Unanalyzable { construct, .. }] if construct == "eval"
    ));
    assert_eq!(report.failures_for(&UnitId::function("other")).count(), 0);
}

#[test]
fn test_lookup_by_unit() {
    let report = report();
    let definition = report
        .definition(&UnitId::function("App\\total"))
        .expect("definition");
    assert_eq!(definition.return_type, Type::Integer);
    assert!(report.definition(&UnitId::function("App\\missing")).is_none());
}

#[test]
fn test_json_rendering() {
    let json = report().to_json().expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

    let definition = &value["definitions"]["App\\total"];
    assert_eq!(definition["returnType"], "int");
    assert_eq!(definition["definingUnit"], "App\\total");
    assert_eq!(
        value["failures"][0],
        "no declaration found for `App\\missing`"
    );
    assert_eq!(
        value["failures"][1],
        "`App\\Total`: cannot analyze eval, treated as unknown"
    );
}
