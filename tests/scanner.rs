#[cfg(test)]
mod scanner_tests {
    use rox::error::{LoxError, Reporter};
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
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
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_maximal_munch() {
        assert_token_sequence(
            "!= == <= >= ?? ? : ! = < >",
            &[
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::QUESTION_QUESTION, "??"),
                (TokenType::QUESTION, "?"),
                (TokenType::COLON, ":"),
                (TokenType::BANG, "!"),
                (TokenType::EQUAL, "="),
                (TokenType::LESS, "<"),
                (TokenType::GREATER, ">"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "class static fun classy _x1 var",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::STATIC, "static"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "classy"),
                (TokenType::IDENTIFIER, "_x1"),
                (TokenType::VAR, "var"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_trailing_dot_is_not_part_of_number() {
        let tokens: Vec<Token> = Scanner::new("12.5 7.").filter_map(Result::ok).collect();

        assert!(matches!(tokens[0].token_type, TokenType::NUMBER(n) if n == 12.5));
        assert!(matches!(tokens[1].token_type, TokenType::NUMBER(n) if n == 7.0));
        assert_eq!(tokens[1].lexeme, "7");
        assert_eq!(tokens[2].token_type, TokenType::DOT);
    }

    #[test]
    fn test_scanner_05_comments_and_lines() {
        let tokens: Vec<Token> = Scanner::new("// nothing here\nprint 1; // trailing\n\"a\nb\"")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens[0].token_type, TokenType::PRINT);
        assert_eq!(tokens[0].line, 2);
        assert!(matches!(&tokens[3].token_type, TokenType::STRING(s) if s == "a\nb"));
        assert_eq!(tokens[3].line, 4);
    }

    #[test]
    fn test_scanner_06_token_display() {
        let tokens: Vec<Token> = Scanner::new("3 \"hi\" +").filter_map(Result::ok).collect();

        assert_eq!(tokens[0].to_string(), "NUMBER 3 3.0");
        assert_eq!(tokens[1].to_string(), "STRING \"hi\" hi");
        assert_eq!(tokens[2].to_string(), "PLUS + null");
        assert_eq!(tokens[3].to_string(), "EOF  null");
    }

    #[test]
    fn test_unterminated_string_reports_and_stops() {
        let mut reporter = Reporter::new();
        let tokens = scan("print \"never closed\nstill", &mut reporter);

        assert!(reporter.had_error());
        assert_eq!(reporter.diagnostics().len(), 1);
        assert!(reporter.diagnostics()[0]
            .to_string()
            .contains("Unterminated string."));

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token_type, TokenType::PRINT);
        assert_eq!(tokens[1].token_type, TokenType::EOF);
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        // Collect all results (both tokens and errors)
        let results: Vec<_> = scanner.collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_multibyte_character_reported_once() {
        let mut reporter = Reporter::new();
        let tokens = scan("1 é 2", &mut reporter);

        assert_eq!(reporter.diagnostics().len(), 1);
        assert_eq!(tokens.len(), 3);
    }
}
