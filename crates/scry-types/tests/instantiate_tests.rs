use super::*;
use crate::keyed_array::KeyedArrayType;

#[test]
fn test_substitutes_nested_templates() {
    let mut subst = TemplateSubstitution::new();
    subst.insert("TKey", Type::Integer);
    subst.insert("TValue", Type::object("App\\User"));

    let ty = Type::function(
        vec![FunctionParam::new("key", Type::template("TKey"))],
        Type::nullable(Type::generic("Collection", vec![Type::template("TValue")])),
    );
    assert_eq!(
        instantiate_type(&ty, &subst).to_string(),
        "(int): Collection<App\\User>|null"
    );
}

#[test]
fn test_substitutes_inside_shapes() {
    let subst = TemplateSubstitution::from_pairs(&[TemplateType::new("T")], &[Type::String]);
    let shape = Type::KeyedArray(KeyedArrayType::list(vec![Type::template("T"), Type::Integer]));
    assert_eq!(instantiate_type(&shape, &subst).to_string(), "list{string, int}");
}

#[test]
fn test_missing_arguments_become_void() {
    let templates = [TemplateType::new("K"), TemplateType::new("V")];
    let subst = TemplateSubstitution::from_pairs(&templates, &[Type::String]);
    assert_eq!(subst.len(), 2);
    assert_eq!(subst.get("V"), Some(&Type::Void));
    let ty = Type::Array(ArrayType::new(Type::template("K"), Type::template("V")));
    assert_eq!(instantiate_type(&ty, &subst).to_string(), "array<string, void>");
}

#[test]
fn test_unbound_templates_are_kept() {
    let mut subst = TemplateSubstitution::new();
    subst.insert("T", Type::Integer);
    assert_eq!(instantiate_type(&Type::template("U"), &subst), Type::template("U"));
}

#[test]
fn test_substitution_can_collapse_unions() {
    let mut subst = TemplateSubstitution::new();
    subst.insert("T", Type::Integer);
    let ty = Union::wrap([Type::template("T"), Type::Integer]);
    assert_eq!(instantiate_type(&ty, &subst), Type::Integer);
}
