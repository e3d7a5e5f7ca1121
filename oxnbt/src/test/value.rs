use crate::error::ErrorKind;
use crate::value::{Compound, List, Value};
use crate::Tag;

#[test]
fn typed_unwrap_fails_with_wrong_kind() {
    let v = Value::Int(5);
    assert_eq!(5, v.as_int().unwrap());

    let err = v.as_str().unwrap_err();
    assert_eq!(ErrorKind::WrongKind, err.kind());

    let err = v.as_compound().unwrap_err();
    assert_eq!(ErrorKind::WrongKind, err.kind());
}

#[test]
fn empty_values_for_every_kind() {
    assert!(Value::empty(Tag::End).is_none());
    assert_eq!(Some(Value::Byte(0)), Value::empty(Tag::Byte));
    assert_eq!(Some(Value::String(String::new())), Value::empty(Tag::String));
    assert_eq!(
        Some(Value::ByteArray(Vec::new())),
        Value::empty(Tag::ByteArray)
    );

    let list = Value::empty(Tag::List).unwrap();
    assert_eq!(Tag::End, list.as_list().unwrap().element());
    assert!(Value::empty(Tag::Compound).unwrap().as_compound().is_ok());
}

#[test]
fn container_predicates() {
    assert!(Tag::List.is_container());
    assert!(Tag::Compound.is_container());
    assert!(!Tag::Int.is_container());
    assert!(Tag::ByteArray.is_array());
    assert!(Tag::LongArray.is_array());
    assert!(!Tag::List.is_array());
}

#[test]
fn compound_preserves_insertion_order() {
    let mut c = Compound::new();
    c.insert("a", Value::Int(1));
    c.insert("b", Value::Int(2));
    c.insert("c", Value::Int(3));

    let names: Vec<&str> = c.names().collect();
    assert_eq!(vec!["a", "b", "c"], names);

    // removal keeps the relative order of the rest
    c.remove("b");
    let names: Vec<&str> = c.names().collect();
    assert_eq!(vec!["a", "c"], names);

    // reinsertion appends
    c.insert("b", Value::Int(4));
    let names: Vec<&str> = c.names().collect();
    assert_eq!(vec!["a", "c", "b"], names);
}

#[test]
fn compound_replace_keeps_position_and_returns_old() {
    let mut c = Compound::new();
    c.insert("a", Value::Int(1));
    c.insert("b", Value::Int(2));

    let old = c.insert("a", Value::Int(10));
    assert_eq!(Some(Value::Int(1)), old);

    let names: Vec<&str> = c.names().collect();
    assert_eq!(vec!["a", "b"], names);
    assert_eq!(10, c.get("a").unwrap().as_int().unwrap());
}

#[test]
fn list_binds_element_kind_on_first_push() {
    let mut list = List::new();
    assert_eq!(Tag::End, list.element());

    list.push(Value::Int(1)).unwrap();
    assert_eq!(Tag::Int, list.element());

    let err = list.push(Value::String("no".into())).unwrap_err();
    assert_eq!(ErrorKind::Structural, err.kind());
    assert_eq!(1, list.len());
}

#[test]
fn list_keeps_element_kind_when_emptied() {
    let mut list = List::new();
    list.push(Value::Short(7)).unwrap();
    list.remove(0).unwrap();

    assert!(list.is_empty());
    assert_eq!(Tag::Short, list.element());

    let err = list.push(Value::Int(1)).unwrap_err();
    assert_eq!(ErrorKind::Structural, err.kind());
}

#[test]
fn list_set_checks_kind_and_bounds() {
    let mut list = List::with_element(Tag::Int);
    list.push(Value::Int(1)).unwrap();

    list.set(0, Value::Int(9)).unwrap();
    assert_eq!(Some(&Value::Int(9)), list.get(0));

    assert_eq!(
        ErrorKind::Structural,
        list.set(0, Value::Byte(1)).unwrap_err().kind()
    );
    assert_eq!(
        ErrorKind::Structural,
        list.set(5, Value::Int(1)).unwrap_err().kind()
    );
    assert_eq!(ErrorKind::Structural, list.remove(5).unwrap_err().kind());
}

#[test]
fn mixed_kinds_never_enter_a_list() {
    let mut list = List::with_element(Tag::Compound);
    list.push(Value::Compound(Compound::new())).unwrap();
    assert!(list.push(Value::List(List::new())).is_err());

    for item in &list {
        assert_eq!(Tag::Compound, item.tag());
    }
}
