//! TAC generation: storage model, label disciplines, calling convention,
//! and the textual round trip through the backend contract parser.

use compiscript_lib::{codegen, passes, tac};

fn tac_for(source: &str) -> tac::Program {
    let root = passes::parse::parse(source)
        .and_then(|ast| passes::lower_ast::build_ir_from_ast(&ast))
        .into_value()
        .expect("expected a clean analysis");
    codegen::tac::build_from_root(&root)
}

fn text_for(source: &str) -> String {
    tac_for(source).to_string()
}

#[test]
fn method_call_protocol() {
    let text = text_for(
        "class T { function add(a: integer, b: integer): integer { return a + b; } } \
         let o: T = new T(); \
         let r: integer = o.add(1, 2);",
    );
    assert_eq!(
        text,
        "FUNCTION add:\n\
         \tt0 := fp[-2] + fp[-3]\n\
         \tRETURN t0\n\
         END FUNCTION add\n\
         FUNCTION main:\n\
         \tCALL newT,0\n\
         \tt0 := R\n\
         \tG[0] := t0\n\
         \tPARAM G[0]\n\
         \tPARAM 1\n\
         \tPARAM 2\n\
         \tCALL add,3\n\
         \tt1 := R\n\
         \tG[4] := t1\n\
         \tRETURN\n\
         END FUNCTION main\n"
    );
}

#[test]
fn while_lowering_label_shape() {
    let text = text_for("let i: integer = 0; while (i < 5) { i = i + 1; }");
    assert_eq!(
        text,
        "FUNCTION main:\n\
         \tG[0] := 0\n\
         STARTWHILE_0:\n\
         \tt0 := G[0] < 5\n\
         \tIF t0 > 0 GOTO LABEL_TRUE_0\n\
         \tGOTO ENDWHILE_0\n\
         LABEL_TRUE_0:\n\
         \tt1 := G[0] + 1\n\
         \tG[0] := t1\n\
         \tGOTO STARTWHILE_0\n\
         ENDWHILE_0:\n\
         \tRETURN\n\
         END FUNCTION main\n"
    );
}

#[test]
fn short_circuit_uses_cont_labels_and_defers_the_right_side() {
    let text = text_for(
        "let x: integer = 10; let y: integer = 20; \
         if (x < 100 || (x > 200 && x != y)) { x = 0; }",
    );
    let or_cont = text.find("OR_CONT_0:").expect("OR_CONT label");
    let and_cont = text.find("AND_CONT_1:").expect("AND_CONT label");
    let neq = text.find("!=").expect("x != y comparison");
    // `x != y` is only reachable through both CONT labels
    assert!(or_cont < and_cont);
    assert!(and_cont < neq);
    // the first comparison short-circuits straight to the then-branch
    assert!(text.contains("IF t0 > 0 GOTO IF_TRUE_0"));
    // no else: the false label collapses into the end label
    assert!(!text.contains("IF_FALSE_0"));
}

#[test]
fn inherited_field_offsets_in_access() {
    let text = text_for(
        "class Persona { let nombre: string; let edad: integer; let color: string; } \
         class Estudiante : Persona { let grado: integer; } \
         let juan: Estudiante = new Estudiante(); \
         let g: integer = juan.grado;",
    );
    assert!(text.contains("\tCALL newEstudiante,0\n"));
    // grado sits behind the three inherited 4-byte slots
    assert!(text.contains("\tt1 := G[0][12]\n"));
}

#[test]
fn constructor_runs_as_new_class() {
    let text = text_for(
        "class P { let n: integer; init(n: integer) { this.n = n; } } \
         let p: P = new P(5);",
    );
    assert!(text.contains("FUNCTION newP:\n"));
    // `this` is fp[-1]; the first declared parameter fp[-2]
    assert!(text.contains("\tfp[-1][0] := fp[-2]\n"));
    assert!(text.contains("\tPARAM 5\n\tCALL newP,1\n"));
}

#[test]
fn frame_layout_for_params_and_locals() {
    let text = text_for(
        "function f(a: integer, b: integer): integer { \
           let c: integer = a + b; \
           return c; \
         } \
         let r: integer = f(1, 2);",
    );
    assert!(text.contains("\tt0 := fp[-1] + fp[-2]\n"));
    assert!(text.contains("\tfp[0] := t0\n"));
    assert!(text.contains("\tRETURN fp[0]\n"));
}

#[test]
fn assignment_computes_the_value_then_stores() {
    let text = text_for(
        "class C { let f: integer; } \
         let c: C = new C(); \
         c.f = 1 + 2;",
    );
    let compute = text.find("t1 := 1 + 2").expect("value computed into a temp");
    let store = text.find("G[0][0] := t1").expect("field store");
    assert!(compute < store);
}

#[test]
fn foreach_materializes_an_index_over_len() {
    let text = text_for("let xs: integer[] = [7, 8]; foreach (x in xs) { print(x); }");
    assert!(text.contains("\tCALL len,1\n"));
    // index starts at zero and advances by one element per round
    assert!(text.contains("G[8] := 0\n"));
    assert!(text.contains(" + 1\n"));
    assert!(text.contains("\tCALL print,1\n"));
    assert!(text.contains("STARTWHILE_0:"));
}

#[test]
fn array_literal_allocates_then_fills_by_index() {
    let text = text_for("let xs: integer[] = [7, 8];");
    assert_eq!(
        text,
        "FUNCTION main:\n\
         \tPARAM 2\n\
         \tCALL newarray,1\n\
         \tt0 := R\n\
         \tt0[0] := 7\n\
         \tt0[1] := 8\n\
         \tG[0] := t0\n\
         \tRETURN\n\
         END FUNCTION main\n"
    );
}

#[test]
fn switch_cases_fall_through_and_break_exits() {
    let text = text_for(
        "let x: integer = 1; let y: integer = 0; \
         switch (x) { \
           case 1: y = 1; \
           case 2: y = 2; break; \
           default: y = 3; \
         }",
    );
    assert!(text.contains("CASE_0_0:"));
    assert!(text.contains("CASE_0_1:"));
    assert!(text.contains("DEFAULT_0:"));
    assert!(text.contains("ENDSWITCH_0:"));
    // only the explicit break jumps to the end label; case 1 falls through
    assert_eq!(text.matches("GOTO ENDSWITCH_0").count(), 1);
    // default is tried last in the test sequence
    let goto_default = text.find("GOTO DEFAULT_0").unwrap();
    let first_case_label = text.find("CASE_0_0:").unwrap();
    assert!(goto_default < first_case_label);
}

#[test]
fn do_while_tests_at_the_bottom() {
    let text = text_for("let i: integer = 0; do { i = i + 1; } while (i < 3);");
    assert!(text.contains("IF t1 > 0 GOTO STARTDO_0"));
    // the back edge is conditional; there is no unconditional jump
    assert!(!text.contains("\tGOTO STARTDO_0"));
    assert!(text.find("STARTDO_0:").unwrap() < text.find("DOCOND_0:").unwrap());
}

#[test]
fn counters_reset_at_function_boundaries() {
    let program = tac_for(
        "function f(): integer { let a: integer = 1 + 2; return a; } \
         function g(): integer { let b: integer = 3 + 4; return b; } \
         let r: integer = f() + g();",
    );
    for function in &program.functions {
        let uses_temp_zero = function
            .body
            .iter()
            .any(|i| i.to_string().starts_with("t0 :="));
        assert!(uses_temp_zero, "`{}` should restart at t0", function.name);
    }
}

#[test]
fn labels_are_unique_within_a_function() {
    let program = tac_for(
        "let i: integer = 0; \
         while (i < 3) { if (i == 1) { print(1); } else { print(2); } i = i + 1; } \
         while (i < 6) { i = i + 2; } \
         if (i == 6) { print(6); }",
    );
    for function in &program.functions {
        let mut seen = std::collections::HashSet::new();
        for instr in &function.body {
            if let tac::Instr::Label(label) = instr {
                assert!(seen.insert(label.clone()), "duplicate label {label}");
            }
        }
    }
}

#[test]
fn generated_tac_round_trips_through_the_contract_parser() {
    let program = tac_for(
        "class Punto { let x: integer; let y: integer; \
           init(x: integer, y: integer) { this.x = x; this.y = y; } \
           function norma(): integer { return x * x + y * y; } } \
         function suma(a: integer, b: integer): integer { return a + b; } \
         let p: Punto = new Punto(3, 4); \
         let n: integer = p.norma(); \
         let s: string = \"n = \" + n; \
         print(s); \
         for (let i: integer = 0; i < n; i = i + 1) { \
           if (i % 2 == 0 && i != 4) { print(i); } \
         }",
    );
    let reparsed = codegen::tac::parser::parse(&program.to_string()).expect("round trip");
    assert_eq!(reparsed, program);
}

#[test]
fn global_statements_wrap_into_main_after_named_functions() {
    let program = tac_for("function f(): void { } print(1); f();");
    let names: Vec<&str> = program
        .functions
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, vec!["f", "main"]);
    let main = program.functions.last().unwrap();
    assert!(matches!(main.body.last(), Some(tac::Instr::Return(None))));
}
