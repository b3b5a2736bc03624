use super::build_ir_from_ast;
use crate::diagnostic::{AggregateResult, Code};
use crate::ir;
use crate::passes::parse;

fn analyze(source: &str) -> AggregateResult<ir::Root> {
    parse::parse(source).and_then(|ast| build_ir_from_ast(&ast))
}

/// Panics unless the source analyzes with zero diagnostics.
#[track_caller]
fn accepts(source: &str) -> ir::Root {
    let res = analyze(source);
    if !res.is_ok() {
        panic!(
            "expected a clean analysis, got: {}",
            res.diagnostics()
                .map(|d| format!("{:?}: {}", d.1.code(), d.1.message()))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
    res.into_value().unwrap()
}

/// Panics unless at least one diagnostic with the given code was produced.
/// Other codes may accompany it.
#[track_caller]
fn rejects(source: &str, code: Code) {
    let res = analyze(source);
    let found = res.diagnostics().any(|d| d.1.code() == &code);
    if !found {
        panic!(
            "expected a {code:?} diagnostic, got: {}",
            res.diagnostics()
                .map(|d| format!("{:?}: {}", d.1.code(), d.1.message()))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

#[test]
fn undeclared_identifier() {
    rejects("let x: integer = y;", Code::UndeclaredIdentifier);
}

#[test]
fn duplicate_in_same_scope() {
    rejects("let x: integer = 1; let x: integer = 2;", Code::DuplicateDeclaration);
}

#[test]
fn shadowing_in_inner_block_is_fine() {
    accepts("let x: integer = 1; { let x: string = \"s\"; print(x); } print(x);");
}

#[test]
fn reserved_words_cannot_be_declared() {
    rejects("let integer = 1;", Code::DuplicateDeclaration);
    rejects("function len(): integer { return 0; }", Code::DuplicateDeclaration);
}

#[test]
fn constants() {
    rejects("const c: integer;", Code::AssignToImmutable);
    rejects("const c: integer = 1; c = 2;", Code::AssignToImmutable);
    accepts("const c: integer = 1; let x: integer = c + 1;");
}

#[test]
fn uninitialized_read() {
    rejects("let x: integer; let y: integer = x;", Code::UninitializedRead);
    accepts("let x: integer; x = 3; let y: integer = x;");
}

#[test]
fn operator_type_rules() {
    rejects("let x: integer = 1 + true;", Code::TypeMismatch);
    rejects("let x: boolean = 1 && true;", Code::TypeMismatch);
    rejects("let x: boolean = \"a\" < 1;", Code::TypeMismatch);
    accepts("let s: string = \"n=\" + 3;");
    accepts("let b: boolean = 1 < 2 && \"a\" <= \"b\";");
}

#[test]
fn ternary_branches_must_agree() {
    rejects("let x: integer = true ? 1 : \"no\";", Code::TypeMismatch);
    accepts("let x: integer = 1 < 2 ? 1 : 0;");
}

#[test]
fn null_is_assignable_to_references_only() {
    accepts("class C { } let c: C = null;");
    accepts("let a: integer[] = null;");
    rejects("let x: integer = null;", Code::TypeMismatch);
}

#[test]
fn conditions_must_be_boolean() {
    rejects("if (1) { }", Code::BadCondition);
    rejects("while (\"s\") { }", Code::BadCondition);
    accepts("if (1 < 2) { } while (false) { }");
}

#[test]
fn arity_grid() {
    let def = "function add(a: integer, b: integer): integer { return a + b; }";
    accepts(&format!("{def} let r: integer = add(1, 2);"));
    rejects(&format!("{def} add();"), Code::ArityMismatch);
    rejects(&format!("{def} add(1);"), Code::ArityMismatch);
    rejects(&format!("{def} add(1, 2, 3);"), Code::ArityMismatch);
}

#[test]
fn argument_types_are_checked() {
    rejects(
        "function f(a: integer): integer { return a; } f(\"s\");",
        Code::TypeMismatch,
    );
}

#[test]
fn method_arity_through_receiver() {
    let def = "class T { function add(a: integer, b: integer): integer { return a + b; } } \
               let o: T = new T();";
    accepts(&format!("{def} let r: integer = o.add(1, 2);"));
    rejects(&format!("{def} o.add(1);"), Code::ArityMismatch);
}

#[test]
fn bad_property_access() {
    rejects(
        "class P { let edad: integer; } let j: P = new P(); let x: integer = j.edades;",
        Code::BadPropertyAccess,
    );
    accepts("class P { let edad: integer; } let j: P = new P(); let x: integer = j.edad;");
}

#[test]
fn bad_method_call() {
    rejects(
        "class P { } let p: P = new P(); p.saluda();",
        Code::BadMethodCall,
    );
}

#[test]
fn inheritance_field_layout() {
    let root = accepts(
        "class Persona { let nombre: string; let edad: integer; let color: string; } \
         class Estudiante : Persona { let grado: integer; }",
    );
    let estudiante = root
        .classes
        .iter()
        .find(|c| c.name == "Estudiante")
        .unwrap();
    let offsets: Vec<(&str, u32)> = estudiante
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.offset))
        .collect();
    assert_eq!(
        offsets,
        vec![("nombre", 0), ("edad", 4), ("color", 8), ("grado", 12)]
    );
    assert_eq!(estudiante.size, 16);

    let persona = root.classes.iter().find(|c| c.name == "Persona").unwrap();
    assert_eq!(persona.size, 12);
}

#[test]
fn field_offsets_are_deterministic() {
    let source = "class A { let x: integer; let y: string; } class B : A { let z: boolean; }";
    let first = accepts(source);
    let second = accepts(source);
    let offsets = |root: &ir::Root| -> Vec<Vec<u32>> {
        root.classes
            .iter()
            .map(|c| c.fields.iter().map(|f| f.offset).collect())
            .collect()
    };
    assert_eq!(offsets(&first), offsets(&second));
}

#[test]
fn inherited_methods_resolve() {
    accepts(
        "class A { function hi(): integer { return 1; } } \
         class B : A { } \
         let b: B = new B(); let x: integer = b.hi();",
    );
}

#[test]
fn super_resolves_in_parent() {
    accepts(
        "class A { function hi(): integer { return 1; } } \
         class B : A { function hi(): integer { return super.hi() + 1; } }",
    );
    rejects(
        "class A { function hi(): integer { return super.hi(); } }",
        Code::ThisOutsideClass,
    );
}

#[test]
fn override_signatures_must_match() {
    rejects(
        "class A { function f(a: integer): integer { return a; } } \
         class B : A { function f(a: string): integer { return 0; } }",
        Code::OverrideSignatureMismatch,
    );
    accepts(
        "class A { function f(a: integer): integer { return a; } } \
         class B : A { function f(a: integer): integer { return a + 1; } }",
    );
}

#[test]
fn bad_inheritance() {
    rejects("class C : C { }", Code::BadInheritance);
    rejects("class C : Nope { }", Code::BadInheritance);
    rejects("let x: integer = 1; class C : x { }", Code::BadInheritance);
    rejects("class A : B { } class B : A { }", Code::BadInheritance);
}

#[test]
fn this_outside_class() {
    rejects("let x: integer = this.edad;", Code::ThisOutsideClass);
}

#[test]
fn constructors() {
    accepts(
        "class P { let nombre: string; init(n: string) { this.nombre = n; } } \
         let p: P = new P(\"Juan\");",
    );
    accepts(
        "class P { let n: integer; function constructor(n: integer) { this.n = n; } } \
         let p: P = new P(3);",
    );
    rejects(
        "class P { init(a: integer) { } function constructor(b: integer) { } }",
        Code::DuplicateDeclaration,
    );
    rejects("class P { init(a: integer) { } } let p: P = new P();", Code::ArityMismatch);
}

#[test]
fn break_continue_placement() {
    rejects("break;", Code::BreakContinueOutsideLoop);
    rejects("continue;", Code::BreakContinueOutsideLoop);
    rejects(
        "function f(): void { break; }",
        Code::BreakContinueOutsideLoop,
    );
    accepts("function f(): void { while (true) { break; } }");
    accepts("while (true) { continue; }");
    // break targets the switch end label; continue still needs a loop
    accepts("switch (1) { case 1: break; }");
    rejects("switch (1) { case 1: continue; }", Code::BreakContinueOutsideLoop);
}

#[test]
fn return_placement_and_types() {
    rejects("return 1;", Code::ReturnOutsideFunction);
    rejects(
        "function f(): integer { return \"s\"; }",
        Code::ReturnTypeMismatch,
    );
    rejects("function f(): integer { return; }", Code::ReturnTypeMismatch);
    rejects(
        "function f(): void { return 1; }",
        Code::ReturnTypeMismatch,
    );
    rejects("function f(): integer { print(1); }", Code::MissingReturn);
    accepts("function f(): integer { if (true) { return 1; } else { return 2; } }");
    rejects(
        "function f(b: boolean): integer { if (b) { return 1; } }",
        Code::MissingReturn,
    );
}

#[test]
fn void_call_is_not_a_value() {
    rejects(
        "function f(): void { } let x = f();",
        Code::TypeMismatch,
    );
    rejects("function f(): void { } print(f());", Code::TypeMismatch);
    accepts("function f(): void { } f();");
}

#[test]
fn array_literals_must_be_homogeneous() {
    rejects("let a = [1, \"x\", 3];", Code::BadArrayLiteral);
    accepts("let a = [1, 2, 3]; let m = [[1], [2]];");
}

#[test]
fn index_rules() {
    rejects("let x: integer = 1; let y: integer = x[0];", Code::BadIndex);
    rejects("let a: integer[] = [1]; let y: integer = a[\"i\"];", Code::BadIndex);
    accepts("let a: integer[] = [1, 2]; let y: integer = a[1]; a[0] = 7;");
}

#[test]
fn foreach_binds_the_element_type() {
    accepts("let a: integer[] = [1, 2]; foreach (x in a) { let y: integer = x + 1; }");
    rejects("foreach (x in 5) { }", Code::BadIndex);
    rejects(
        "let a: string[] = [\"s\"]; foreach (x in a) { let y: integer = x; }",
        Code::TypeMismatch,
    );
}

#[test]
fn switch_case_types_follow_the_scrutinee() {
    accepts("let x: integer = 2; switch (x) { case 1: print(1); break; default: print(0); }");
    rejects(
        "let x: integer = 2; switch (x) { case \"uno\": break; }",
        Code::TypeMismatch,
    );
}

#[test]
fn try_catch_binds_a_string() {
    accepts("try { print(1); } catch (err) { print(err); }");
    rejects(
        "try { } catch (err) { let n: integer = err; }",
        Code::TypeMismatch,
    );
}

#[test]
fn bare_field_access_in_methods() {
    accepts(
        "class C { let n: integer; function get(): integer { return n; } \
           function set(v: integer): void { n = v; } }",
    );
}

#[test]
fn analysis_is_idempotent() {
    let source = "class C : Nope { } let x: integer = y + true;";
    let ast = parse::parse(source).into_value().unwrap();
    let first: Vec<_> = build_ir_from_ast(&ast)
        .into_diagnostics()
        .map(|d| (d.0, d.1))
        .collect();
    let second: Vec<_> = build_ir_from_ast(&ast)
        .into_diagnostics()
        .map(|d| (d.0, d.1))
        .collect();
    assert_eq!(first, second);
}

#[test]
fn scope_stack_balances() {
    let root = accepts(
        "function f(n: integer): integer { \
           let acc: integer = 0; \
           for (let i: integer = 0; i < n; i = i + 1) { acc = acc + i; } \
           return acc; \
         } \
         let r: integer = f(5);",
    );
    assert_eq!(root.table.depth(), 0);
}
