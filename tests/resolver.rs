#[cfg(test)]
mod resolver_tests {
    use corvid::error::ErrorReporter;
    use corvid::interpreter::Interpreter;
    use corvid::parser::Parser;
    use corvid::resolver::Resolver;
    use corvid::scanner::scan;

    /// Scan, parse, and resolve; returns the reporter for inspection.
    fn resolve(source: &str) -> ErrorReporter {
        let mut reporter = ErrorReporter::new();
        let tokens = scan(source.as_bytes(), &mut reporter);
        let statements = Parser::new(tokens, &mut reporter).parse();

        assert!(
            !reporter.had_error(),
            "parse errors: {:?}",
            reporter.diagnostics()
        );

        let mut interpreter = Interpreter::default();

        Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);

        reporter
    }

    fn assert_resolve_error(source: &str, expected: &str) {
        let reporter = resolve(source);

        assert!(reporter.had_error(), "expected a resolve error");
        assert!(
            reporter.diagnostics().iter().any(|d| d.contains(expected)),
            "no diagnostic containing {:?} in {:?}",
            expected,
            reporter.diagnostics()
        );
    }

    fn assert_resolves_cleanly(source: &str) {
        let reporter = resolve(source);

        assert!(
            !reporter.had_error(),
            "unexpected errors: {:?}",
            reporter.diagnostics()
        );
    }

    #[test]
    fn test_this_outside_class() {
        let reporter = resolve("print this;");

        assert_eq!(
            reporter.diagnostics(),
            &["[line 1] Error at 'this': Can't use 'this' outside of a class!".to_string()]
        );
    }

    #[test]
    fn test_super_outside_class() {
        assert_resolve_error(
            "print super.x;",
            "Can't use 'super' outside of a class!",
        );
    }

    #[test]
    fn test_super_without_superclass() {
        assert_resolve_error(
            "class A { m() { return super.m; } }",
            "Can't use 'super' in a class with no superclass!",
        );
    }

    #[test]
    fn test_return_at_top_level() {
        assert_resolve_error("return 1;", "Can't return from top-level code!");
    }

    #[test]
    fn test_return_value_from_initializer() {
        assert_resolve_error(
            "class P { init() { return 1; } }",
            "Can't return a value from an initializer!",
        );
    }

    #[test]
    fn test_bare_return_from_initializer_is_fine() {
        assert_resolves_cleanly("class P { init() { return; } }");
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        assert_resolve_error(
            "{ var a = 1; var a = 2; }",
            "Already a variable with this name in this scope!",
        );
    }

    #[test]
    fn test_redeclaration_of_globals_is_fine() {
        assert_resolves_cleanly("var a = 1; var a = 2;");
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_resolve_error(
            "{ var a = a; }",
            "Can't read local variable in its own initializer!",
        );
    }

    #[test]
    fn test_class_inheriting_from_itself() {
        assert_resolve_error("class A < A {}", "A class can't inherit from itself.");
    }

    #[test]
    fn test_multiple_errors_in_one_pass() {
        let reporter = resolve("return 1; print this;");

        assert_eq!(reporter.diagnostics().len(), 2);
    }

    #[test]
    fn test_methods_and_closures_resolve_cleanly() {
        assert_resolves_cleanly(
            r#"
            class A { greet() { return "A"; } }
            class B < A {
                init(tag) { this.tag = tag; }
                greet() { return super.greet() + this.tag; }
            }
            fun make(tag) {
                var b = B(tag);
                fun inner() { return b.greet(); }
                return inner;
            }
            print make("!")();
            "#,
        );
    }

    #[test]
    fn test_lambda_body_may_return() {
        assert_resolves_cleanly("var f = fun (x) { return x; };");
    }
}
