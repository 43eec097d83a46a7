#[cfg(test)]
mod scanner_tests {
    use corvid::error::ErrorReporter;
    use corvid::scanner::{scan, Scanner};
    use corvid::token::{Token, TokenType};

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::END, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_operators() {
        assert_token_sequence(
            "! != = == > >= < <= / -",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::SLASH, "/"),
                (TokenType::MINUS, "-"),
                (TokenType::END, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_keywords_and_identifiers() {
        assert_token_sequence(
            "class whale while fun fungus this",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "whale"),
                (TokenType::WHILE, "while"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "fungus"),
                (TokenType::THIS, "this"),
                (TokenType::END, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_numbers() {
        let scanner = Scanner::new(b"12 3.5 7.".as_slice());
        let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

        // The trailing '.' is not part of the number.
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0].token_type, TokenType::NUMBER(0.0));
        assert_eq!(tokens[0].lexeme, "12");
        assert_eq!(tokens[1].lexeme, "3.5");
        assert_eq!(tokens[2].lexeme, "7");
        assert_eq!(tokens[3].token_type, TokenType::DOT);
        assert_eq!(tokens[4].token_type, TokenType::END);

        match tokens[1].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 3.5),
            _ => panic!("expected NUMBER"),
        }
    }

    #[test]
    fn test_scanner_string_literal() {
        let scanner = Scanner::new(b"\"hello\nworld\"".as_slice());
        let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), 2);

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hello\nworld"),
            other => panic!("expected STRING, got {:?}", other),
        }

        // The newline inside the literal advances the line counter.
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn test_scanner_unterminated_string() {
        let mut reporter = ErrorReporter::new();
        let tokens = scan(b"\"oops", &mut reporter);

        assert!(reporter.had_error());
        assert!(reporter.diagnostics()[0].contains("Unterminated string."));

        // The partial literal is discarded; END still terminates the list.
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::END);
    }

    #[test]
    fn test_scanner_comments_and_whitespace() {
        assert_token_sequence(
            "var x; // the rest is noise ***\nx",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::END, ""),
            ],
        );
    }

    #[test]
    fn test_unexpected_chars_reported_and_scanning_continues() {
        let mut reporter = ErrorReporter::new();
        let tokens = scan(b",.$(#", &mut reporter);

        assert!(reporter.had_error());

        let errors: Vec<_> = reporter
            .diagnostics()
            .iter()
            .filter(|d| d.contains("Unexpected character!"))
            .collect();

        assert_eq!(errors.len(), 2, "one error per bad byte");

        // Tokens on both sides of the bad bytes survive.
        let kinds: Vec<TokenType> = tokens.iter().map(|t| t.token_type.clone()).collect();

        assert_eq!(
            kinds,
            vec![
                TokenType::COMMA,
                TokenType::DOT,
                TokenType::LEFT_PAREN,
                TokenType::END,
            ],
        );
    }

    #[test]
    fn test_scanner_lines_non_decreasing_and_end_terminated() {
        let source = b"var a = 1;\nvar b = \"two\nthree\";\n// comment\nprint a;\n";

        let mut reporter = ErrorReporter::new();
        let tokens = scan(source.as_slice(), &mut reporter);

        assert!(!reporter.had_error());

        assert_eq!(tokens.last().unwrap().token_type, TokenType::END);

        for pair in tokens.windows(2) {
            assert!(pair[0].line <= pair[1].line);
        }
    }
}
