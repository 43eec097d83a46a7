#[cfg(test)]
mod parser_tests {
    use corvid::ast::{Expr, Stmt};
    use corvid::ast_printer::AstPrinter;
    use corvid::error::ErrorReporter;
    use corvid::parser::Parser;
    use corvid::scanner::scan;
    use corvid::token::TokenType;

    fn parse(source: &str) -> (Vec<Stmt>, ErrorReporter) {
        let mut reporter = ErrorReporter::new();
        let tokens = scan(source.as_bytes(), &mut reporter);
        let statements = Parser::new(tokens, &mut reporter).parse();

        (statements, reporter)
    }

    /// Parse a single expression statement and render it in prefix form.
    fn parse_expr(source: &str) -> String {
        let (statements, reporter) = parse(source);

        assert!(
            !reporter.had_error(),
            "unexpected errors: {:?}",
            reporter.diagnostics()
        );
        assert_eq!(statements.len(), 1);

        match &statements[0] {
            Stmt::Expression(expr) => AstPrinter::print(expr),
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_arithmetic() {
        assert_eq!(
            parse_expr("(1 + 2) * 3 - 4 / 2;"),
            "(- (* (group (+ 1.0 2.0)) 3.0) (/ 4.0 2.0))"
        );
    }

    #[test]
    fn test_precedence_comparison_equality() {
        assert_eq!(parse_expr("1 < 2 == true;"), "(== (< 1.0 2.0) true)");
    }

    #[test]
    fn test_unary_nesting() {
        assert_eq!(parse_expr("!!-1;"), "(! (! (- 1.0)))");
    }

    #[test]
    fn test_logical_binds_looser_than_equality() {
        assert_eq!(
            parse_expr("a == 1 or b and c;"),
            "(or (== a 1.0) (and b c))"
        );
    }

    #[test]
    fn test_assignment_rewrites_variable() {
        assert_eq!(parse_expr("a = 1;"), "(= a 1.0)");
        assert_eq!(parse_expr("a = b = 2;"), "(= a (= b 2.0))");
    }

    #[test]
    fn test_assignment_rewrites_property() {
        assert_eq!(parse_expr("a.b = 1;"), "(set a b 1.0)");
        assert_eq!(parse_expr("a.b.c;"), "(get (get a b) c)");
    }

    #[test]
    fn test_invalid_assignment_target_reported_not_fatal() {
        let (statements, reporter) = parse("1 = 2; print 3;");

        assert!(reporter.had_error());
        assert!(reporter.diagnostics()[0].contains("Invalid assignment target!"));

        // Both statements survive; the bad assignment stands as its l-value.
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_call_chains() {
        assert_eq!(parse_expr("f(1)(2);"), "(call (call f 1.0) 2.0)");
        assert_eq!(parse_expr("o.m(1, 2);"), "(call (get o m) 1.0 2.0)");
    }

    #[test]
    fn test_super_and_this() {
        assert_eq!(parse_expr("super.greet();"), "(call (super greet))");
        assert_eq!(parse_expr("this.x;"), "(get this x)");
    }

    #[test]
    fn test_lambda_expression() {
        let (statements, reporter) = parse("var f = fun (a, b) { return a; };");

        assert!(!reporter.had_error());

        match &statements[0] {
            Stmt::Var {
                initializer: Some(Expr::Lambda(decl)),
                ..
            } => {
                assert_eq!(decl.params.len(), 2);
                assert_eq!(decl.body.len(), 1);
            }

            other => panic!("expected var with lambda initializer, got {:?}", other),
        }
    }

    #[test]
    fn test_class_declaration() {
        let (statements, reporter) = parse("class B < A { greet() { return 1; } init(x) {} }");

        assert!(!reporter.had_error());

        match &statements[0] {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                assert_eq!(name.lexeme, "B");
                assert!(matches!(superclass, Some(Expr::Variable { .. })));
                assert_eq!(methods.len(), 2);
                assert_eq!(methods[0].name.lexeme, "greet");
                assert_eq!(methods[1].params.len(), 1);
            }

            other => panic!("expected class declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_for_desugars_to_while() {
        let (statements, reporter) = parse("for (var i = 0; i < 3; i = i + 1) print i;");

        assert!(!reporter.had_error());
        assert_eq!(statements.len(), 1);

        // { var i; while (i < 3) { print i; i = i + 1; } }
        let block = match &statements[0] {
            Stmt::Block(stmts) => stmts,
            other => panic!("expected block, got {:?}", other),
        };

        assert!(matches!(block[0], Stmt::Var { .. }));

        match &block[1] {
            Stmt::While { condition, body } => {
                assert_eq!(AstPrinter::print(condition), "(< i 3.0)");

                match body.as_ref() {
                    Stmt::Block(inner) => {
                        assert!(matches!(inner[0], Stmt::Print(_)));
                        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
                    }

                    other => panic!("expected desugared body block, got {:?}", other),
                }
            }

            other => panic!("expected while, got {:?}", other),
        }
    }

    #[test]
    fn test_for_without_clauses_loops_on_true() {
        let (statements, _reporter) = parse("for (;;) print 1;");

        match &statements[0] {
            Stmt::While { condition, .. } => match condition {
                Expr::Literal(token) => assert_eq!(token.token_type, TokenType::TRUE),
                other => panic!("expected literal true, got {:?}", other),
            },

            other => panic!("expected while, got {:?}", other),
        }
    }

    #[test]
    fn test_panic_mode_recovers_per_statement() {
        let (statements, reporter) = parse("foo bar; baz qux; print 1;");

        // One diagnostic per broken statement, and the good one survives.
        assert_eq!(reporter.diagnostics().len(), 2);
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::Print(_)));
    }

    #[test]
    fn test_error_at_end_location() {
        let (_statements, reporter) = parse("print 1");

        assert!(reporter.had_error());
        assert!(reporter.diagnostics()[0].contains(" at end"));
    }

    #[test]
    fn test_missing_paren_diagnostic_names_lexeme() {
        let (_statements, reporter) = parse("if (true print 1;");

        assert!(reporter.had_error());
        assert!(reporter.diagnostics()[0].contains("at 'print'"));
        assert!(reporter.diagnostics()[0].contains("Expect ')' after if condition!"));
    }
}
