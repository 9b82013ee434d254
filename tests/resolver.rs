mod common;

use common::run;
use rox::session::Outcome;

fn static_errors(source: &str) -> Vec<String> {
    let (outcome, output, diagnostics) = run(source);

    assert_eq!(outcome, Outcome::StaticError, "diagnostics: {:?}", diagnostics);
    assert_eq!(output, "", "nothing may run after a static error");

    diagnostics
}

#[test]
fn test_read_in_own_initializer() {
    let errors = static_errors("var a = 1;\n{\n  var a = a;\n  print a;\n}");

    assert_eq!(
        errors,
        vec!["[line 3] Error at 'a': Can't read local variable in its own initializer.".to_string()]
    );
}

#[test]
fn test_global_may_read_itself() {
    let (outcome, output, _) = run("var a = 1;\nvar a = a + 1;\nprint a;");

    assert_eq!(outcome, Outcome::Ok);
    assert_eq!(output, "2\n");
}

#[test]
fn test_top_level_return() {
    let errors = static_errors("print 1;\nreturn 2;");

    assert_eq!(
        errors,
        vec!["[line 2] Error at 'return': Can't return from top-level code.".to_string()]
    );
}

#[test]
fn test_return_value_from_initializer() {
    let errors = static_errors("class A {\n  init() {\n    return 1;\n  }\n}");

    assert_eq!(
        errors,
        vec!["[line 3] Error at 'return': Can't return a value from an initializer.".to_string()]
    );
}

#[test]
fn test_bare_return_from_initializer_is_fine() {
    let (outcome, output, _) = run(
        "class A {\n  init() {\n    this.x = 1;\n    return;\n  }\n}\nprint A().x;",
    );

    assert_eq!(outcome, Outcome::Ok);
    assert_eq!(output, "1\n");
}

#[test]
fn test_this_outside_class() {
    let errors = static_errors("print this;");

    assert_eq!(
        errors,
        vec!["[line 1] Error at 'this': Can't use 'this' outside of a class.".to_string()]
    );
}

#[test]
fn test_this_in_static_method() {
    let errors = static_errors("class A {\n  static make() {\n    return this;\n  }\n}");

    assert_eq!(
        errors,
        vec!["[line 3] Error at 'this': Can't use 'this' in a static method.".to_string()]
    );
}

#[test]
fn test_super_misuse() {
    let errors = static_errors("print super.go;");
    assert_eq!(
        errors,
        vec!["[line 1] Error at 'super': Can't use 'super' outside of a class.".to_string()]
    );

    let errors = static_errors("class A {\n  go() {\n    return super.go;\n  }\n}");
    assert_eq!(
        errors,
        vec![
            "[line 3] Error at 'super': Can't use 'super' in a class with no superclass."
                .to_string()
        ]
    );
}

#[test]
fn test_class_inheriting_from_itself() {
    let errors = static_errors("class A < A {}");

    assert_eq!(
        errors,
        vec!["[line 1] Error at 'A': A class can't inherit from itself.".to_string()]
    );
}

#[test]
fn test_duplicate_local() {
    let errors = static_errors("{\n  var a = 1;\n  var a = 2;\n  print a;\n}");

    assert_eq!(
        errors,
        vec!["[line 3] Error at 'a': Already a variable with this name in this scope.".to_string()]
    );
}

#[test]
fn test_duplicate_global_is_fine() {
    let (outcome, output, _) = run("var a = 1;\nvar a = 2;\nprint a;");

    assert_eq!(outcome, Outcome::Ok);
    assert_eq!(output, "2\n");
}

#[test]
fn test_unused_locals_sorted_by_line() {
    let errors = static_errors("{\n  var b = 1;\n  var a = 2;\n  var used = 3;\n  print used;\n}");

    assert_eq!(
        errors,
        vec![
            "[line 2] Error at 'b': Local variable is never used.".to_string(),
            "[line 3] Error at 'a': Local variable is never used.".to_string(),
        ]
    );
}

#[test]
fn test_assignment_is_not_a_use() {
    let errors = static_errors("{\n  var a;\n  a = 1;\n}");

    assert_eq!(
        errors,
        vec!["[line 2] Error at 'a': Local variable is never used.".to_string()]
    );
}

#[test]
fn test_unused_parameter() {
    let errors = static_errors("fun f(a, b) {\n  return a;\n}\nprint f(1, 2);");

    assert_eq!(
        errors,
        vec!["[line 1] Error at 'b': Local variable is never used.".to_string()]
    );
}

#[test]
fn test_read_from_inner_function_counts_as_use() {
    let (outcome, output, diagnostics) = run(
        "fun outer() {\n  var x = \"captured\";\n  fun inner() {\n    print x;\n  }\n  inner();\n}\nouter();",
    );

    assert_eq!(outcome, Outcome::Ok, "diagnostics: {:?}", diagnostics);
    assert_eq!(output, "captured\n");
}

#[test]
fn test_resolution_reports_all_errors() {
    let errors = static_errors("return 1;\nprint this;");

    assert_eq!(errors.len(), 2);
}

#[test]
fn test_closure_binds_at_declaration() {
    let source = "var a = \"global\";\n\
                  {\n\
                    fun show() {\n\
                      print a;\n\
                    }\n\
                    show();\n\
                    var a = \"block\";\n\
                    show();\n\
                    print a;\n\
                  }";

    let (outcome, output, diagnostics) = run(source);

    assert_eq!(outcome, Outcome::Ok, "diagnostics: {:?}", diagnostics);
    assert_eq!(output, "global\nglobal\nblock\n");
}
