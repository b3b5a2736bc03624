//! End-to-end verdicts through the public `compile` entry point.

use compiscript_lib::compile::{compile, CompileOpts, CompileOptsBuilder, OutputFormat};
use compiscript_lib::diagnostic::{AggregateResult, Code};

fn opts(format: OutputFormat) -> CompileOpts {
    CompileOptsBuilder::new().output_format(format).build()
}

fn run(source: &str) -> AggregateResult<Vec<u8>> {
    compile(source, &opts(OutputFormat::Tac))
}

#[track_caller]
fn assert_rejected(source: &str, code: Code) {
    let res = run(source);
    assert!(res.into_value().is_none(), "expected a failed compilation");
    let res = run(source);
    assert!(
        res.diagnostics().any(|(_, d)| d.code() == &code),
        "expected a {code:?} diagnostic, got: {}",
        res.diagnostics()
            .map(|(_, d)| format!("{:?}: {}", d.code(), d.message()))
            .collect::<Vec<_>>()
            .join("\n"),
    );
}

#[test]
fn a_valid_program_compiles_to_tac() {
    let res = run("class T { function add(a: integer, b: integer): integer { return a + b; } } \
                   let o: T = new T(); \
                   let r: integer = o.add(1, 2);");
    assert!(res.is_ok());
    let tac = String::from_utf8(res.into_value().unwrap()).unwrap();
    assert!(tac.contains("CALL add,3"));
}

#[test]
fn wrong_arity_is_rejected_with_counts() {
    let source = "class T { function add(a: integer, b: integer): integer { return a + b; } } \
                  let o: T = new T(); \
                  o.add(1);";
    assert_rejected(source, Code::ArityMismatch);
    let res = run(source);
    let message = res
        .diagnostics()
        .find(|(_, d)| d.code() == &Code::ArityMismatch)
        .map(|(_, d)| d.message().clone())
        .unwrap();
    assert!(message.contains('2') && message.contains('1'), "{message}");
}

#[test]
fn missing_property_is_rejected() {
    assert_rejected(
        "class P { let nombre: string; let edad: integer; \
           init(n: string, e: integer) { this.nombre = n; this.edad = e; } } \
         let j: P = new P(\"Juan\", 25); \
         let x: integer = j.edades;",
        Code::BadPropertyAccess,
    );
}

#[test]
fn syntax_errors_stop_before_analysis() {
    let res = run("let x = ;");
    assert!(res.diagnostics().any(|(_, d)| d.code() == &Code::Syntax));
    assert!(res.into_value().is_none());
}

#[test]
fn all_diagnostics_arrive_in_one_run() {
    let res = run("let x: integer = y; let z: boolean = 1 + true; break;");
    let codes: Vec<Code> = res.diagnostics().map(|(_, d)| *d.code()).collect();
    assert!(codes.contains(&Code::UndeclaredIdentifier));
    assert!(codes.contains(&Code::TypeMismatch));
    assert!(codes.contains(&Code::BreakContinueOutsideLoop));
}

#[test]
fn symbol_table_dump_lists_scopes_and_symbols() {
    let res = compile(
        "const limit: integer = 3; \
         function twice(n: integer): integer { return n * 2; }",
        &opts(OutputFormat::SymbolTableAscii),
    );
    let dump = String::from_utf8(res.into_value().unwrap()).unwrap();
    assert!(dump.starts_with("global scope"));
    assert!(dump.contains("constant limit : integer [const] [init]"));
    assert!(dump.contains("function twice : (integer) -> integer"));
    assert!(dump.contains("variable n : integer [init]"));
}

#[test]
fn pretty_output_reparses_to_the_same_text() {
    let source = "class A { let n: integer; init(n: integer) { this.n = n; } } \
                  let a: A = new A(1); \
                  if (a.n < 2 || a.n > 5) { print(\"fuera\"); } else { print(\"dentro\"); }";
    let first = compile(source, &opts(OutputFormat::AstPretty))
        .into_value()
        .unwrap();
    let first = String::from_utf8(first).unwrap();
    let second = compile(&first, &opts(OutputFormat::AstPretty))
        .into_value()
        .unwrap();
    let second = String::from_utf8(second).unwrap();
    assert_eq!(first, second);
}

#[test]
fn boundary_verdicts() {
    // inheriting from something that is not a class
    assert_rejected("let x: integer = 1; class C : x { }", Code::BadInheritance);
    // self inheritance
    assert_rejected("class C : C { }", Code::BadInheritance);
    // assignment to a constant after its initializer
    assert_rejected("const c: integer = 1; c = 2;", Code::AssignToImmutable);
    // break at file scope vs. inside a loop inside a function
    assert_rejected("break;", Code::BreakContinueOutsideLoop);
    assert!(run("function f(): void { while (true) { break; } }").is_ok());
    // heterogeneous array literal
    assert_rejected("let a = [1, true];", Code::BadArrayLiteral);
}
