// Relative values, specifiers, and resolution through real contexts.

use quill::value::{context_append, make_context, specifier_of};
use quill::{
    array_get_relative, make_array, Binding, Cell, Kind, MemConfig, Pools, Spelling,
};

fn pools() -> Pools {
    Pools::new(MemConfig::standard())
}

#[test]
fn test_template_extraction_resolves_against_frame() {
    let mut pools = pools();

    // A function template body holding a relative word.
    let body = make_array(&mut pools, 2);
    let mut param = Cell::word(Kind::Word, Spelling(0));
    param.set_binding(Binding::Relative { index: 0 });
    quill::series::array_push_template(&mut pools, body, param);

    // A live frame to resolve against.
    let frame = make_context(&mut pools, 1);
    context_append(&mut pools, &frame, Cell::integer(5));
    let specifier = specifier_of(&frame).unwrap();

    let extracted = array_get_relative(&pools, body, 0);
    assert!(extracted.peek().is_relative());

    let resolved = extracted.resolve(&specifier);
    assert!(!resolved.is_relative());
    match resolved.binding() {
        Some(Binding::Context { varlist, index }) => {
            assert_eq!(Some(varlist), quill::value::context_varlist(&frame));
            assert_eq!(index, 0);
        }
        other => panic!("unexpected binding {:?}", other),
    }
}

#[test]
fn test_specific_cells_pass_through_extraction() {
    let mut pools = pools();
    let arr = make_array(&mut pools, 1);
    quill::array_push(&mut pools, arr, Cell::integer(3));

    let cell = array_get_relative(&pools, arr, 0);
    assert!(!cell.peek().is_relative());

    let frame = make_context(&mut pools, 0);
    let resolved = cell.resolve(&specifier_of(&frame).unwrap());
    assert_eq!(resolved, Cell::integer(3));
}

#[test]
fn test_binding_is_part_of_value_identity() {
    let mut pools = pools();
    let frame = make_context(&mut pools, 1);
    context_append(&mut pools, &frame, Cell::blank());
    let varlist = quill::value::context_varlist(&frame).unwrap();

    let unbound = Cell::word(Kind::Word, Spelling(9));
    let mut bound = unbound;
    bound.set_binding(Binding::Context { varlist, index: 0 });
    assert_ne!(unbound, bound);
}
