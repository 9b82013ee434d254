use rox::ast::Stmt;
use rox::ast_printer::AstPrinter;
use rox::error::Reporter;
use rox::parser::Parser;
use rox::scanner::scan;

fn parse(source: &str) -> (Vec<Stmt>, Reporter) {
    let mut reporter = Reporter::new();
    let tokens = scan(source, &mut reporter);
    let statements = Parser::new(&tokens, &mut reporter).parse();

    (statements, reporter)
}

fn print(source: &str) -> String {
    let (statements, reporter) = parse(source);

    assert!(
        !reporter.had_error(),
        "unexpected diagnostics: {:?}",
        reporter.diagnostics()
    );

    AstPrinter.print_program(&statements)
}

fn messages(reporter: &Reporter) -> Vec<String> {
    reporter
        .diagnostics()
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn test_precedence() {
    assert_eq!(print("print 1 + 2 * 3;"), "(print (+ 1.0 (* 2.0 3.0)))");
    assert_eq!(print("print (1 + 2) * 3;"), "(print (* (group (+ 1.0 2.0)) 3.0))");
    assert_eq!(print("print -!x;"), "(print (- (! x)))");
    assert_eq!(
        print("a == b < c or d and e;"),
        "(; (or (== a (< b c)) (and d e)))"
    );
    assert_eq!(print("print 2.5 - 1;"), "(print (- 2.5 1.0))");
}

#[test]
fn test_literals() {
    assert_eq!(
        print("print \"hi\"; print nil; print true;"),
        "(print hi)\n(print nil)\n(print true)"
    );
}

#[test]
fn test_null_coalescing_desugars_to_conditional() {
    assert_eq!(print("a ?? b;"), "(; (?: (!= a nil) a b))");
}

#[test]
fn test_null_coalescing_right_side_is_full_expression() {
    assert_eq!(print("a ?? b ?? c;"), "(; (?: (!= a nil) a (?: (!= b nil) b c)))");
}

#[test]
fn test_ternary() {
    assert_eq!(print("x = true ? 1 : 2;"), "(; (= x (?: true 1.0 2.0)))");
    assert_eq!(
        print("print a ? b : c ? d : e;"),
        "(print (?: a b (?: c d e)))"
    );
}

#[test]
fn test_ternary_missing_colon() {
    let (_, reporter) = parse("print a ? b;");

    assert!(messages(&reporter)[0]
        .contains("Expected ':' after then branch of conditional expression."));
}

#[test]
fn test_property_access_and_assignment() {
    assert_eq!(print("a.b.c = 1;"), "(; (.= (. a b) c 1.0))");
    assert_eq!(print("f(1, g())(2);"), "(; (call (call f 1.0 (call g)) 2.0))");
    assert_eq!(print("super.go;"), "(; (super go))");
    assert_eq!(print("this.x;"), "(; (. this x))");
}

#[test]
fn test_for_loop_desugars_to_while() {
    assert_eq!(
        print("for (var i = 0; i < 3; i = i + 1) print i;"),
        "(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"
    );
    assert_eq!(print("for (;;) print 1;"), "(while true (print 1.0))");
}

#[test]
fn test_declarations() {
    assert_eq!(
        print("fun add(a, b) { return a + b; }"),
        "(fun add(a b) (return (+ a b)))"
    );
    assert_eq!(
        print("class B < A { init() {} go() { return; } static make() {} }"),
        "(class B < A init go static make)"
    );
    assert_eq!(
        print("if (a) print 1; else { var b; }"),
        "(if a (print 1.0) (block (var b)))"
    );
    assert_eq!(print("while (x) x = nil;"), "(while x (; (= x nil)))");
}

#[test]
fn test_recovery_skips_bad_declaration() {
    let (statements, reporter) = parse("var = 1;\nprint 2;\nvar ok = 3;");

    assert!(reporter.had_error());
    assert_eq!(
        messages(&reporter),
        vec!["[line 1] Error at '=': Expected variable name.".to_string()]
    );
    assert_eq!(
        AstPrinter.print_program(&statements),
        "(print 2.0)\n(var ok 3.0)"
    );
}

#[test]
fn test_recovery_reports_every_bad_declaration() {
    let (statements, reporter) = parse("print ;\nprint 1;\nvar x = ;\n");

    assert_eq!(reporter.diagnostics().len(), 2);
    assert_eq!(statements.len(), 1);
}

#[test]
fn test_error_at_end() {
    let (_, reporter) = parse("print 1");

    assert_eq!(
        messages(&reporter),
        vec!["[line 1] Error at end: Expected ';' after value.".to_string()]
    );
}

#[test]
fn test_invalid_assignment_target_keeps_parsing() {
    let (statements, reporter) = parse("1 = 2;\nprint 3;");

    assert_eq!(
        messages(&reporter),
        vec!["[line 1] Error at '=': Invalid assignment target.".to_string()]
    );
    assert_eq!(
        AstPrinter.print_program(&statements),
        "(; 1.0)\n(print 3.0)"
    );
}

#[test]
fn test_argument_limit() {
    let (statements, reporter) = parse("f(1, 2, 3, 4, 5, 6, 7, 8, 9);");

    assert_eq!(statements.len(), 1);
    assert_eq!(
        messages(&reporter),
        vec!["[line 1] Error at '9': Can't have more than 8 arguments.".to_string()]
    );
}

#[test]
fn test_parameter_limit() {
    let (statements, reporter) = parse("fun f(a, b, c, d, e, g, h, i, j) {}");

    assert_eq!(statements.len(), 1);
    assert_eq!(
        messages(&reporter),
        vec!["[line 1] Error at 'j': Can't have more than 8 parameters.".to_string()]
    );
}

#[test]
fn test_eight_arguments_is_fine() {
    let (_, reporter) = parse("f(1, 2, 3, 4, 5, 6, 7, 8);");

    assert!(!reporter.had_error());
}
