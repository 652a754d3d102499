#[cfg(test)]
mod scanner_tests {
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        let actual: Vec<(&TokenType, &str)> = tokens
            .iter()
            .map(|t| (&t.token_type, t.lexeme.as_str()))
            .collect();

        assert_eq!(
            tokens.len(),
            expected.len(),
            "token count mismatch, got {:?}",
            actual
        );

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    fn kinds(source: &str) -> Vec<&'static str> {
        Scanner::new(source)
            .filter_map(Result::ok)
            .map(|t| t.token_type.name())
            .collect()
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*%})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::PERCENT, "%"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                // `)` can end a statement, so one is closed at end of input.
                (TokenType::SEMICOLON, ""),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators() {
        assert_eq!(
            kinds("! != = == < <= > >= /"),
            vec![
                "BANG",
                "BANG_EQUAL",
                "EQUAL",
                "EQUAL_EQUAL",
                "LESS",
                "LESS_EQUAL",
                "GREATER",
                "GREATER_EQUAL",
                "SLASH",
                "EOF"
            ]
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_eq!(
            kinds("class fun var while for if else break continue super foo_1 _bar;"),
            vec![
                "CLASS",
                "FUN",
                "VAR",
                "WHILE",
                "FOR",
                "IF",
                "ELSE",
                "BREAK",
                "CONTINUE",
                "SUPER",
                "IDENTIFIER",
                "IDENTIFIER",
                "SEMICOLON",
                "EOF"
            ]
        );
    }

    #[test]
    fn test_scanner_04_literals() {
        let tokens = tokenize("\"hi there\" 12 3.5 7.").expect("should scan");

        assert!(matches!(&tokens[0].token_type, TokenType::STRING(s) if s == "hi there"));
        assert_eq!(tokens[0].lexeme, "\"hi there\"");
        assert!(matches!(tokens[1].token_type, TokenType::NUMBER(n) if n == 12.0));
        assert!(matches!(tokens[2].token_type, TokenType::NUMBER(n) if n == 3.5));
        // A trailing dot is not part of the number.
        assert!(matches!(tokens[3].token_type, TokenType::NUMBER(n) if n == 7.0));
        assert_eq!(tokens[4].token_type, TokenType::DOT);
    }

    #[test]
    fn test_scanner_05_display_format() {
        let tokens = tokenize("var x = 42 \"s\"").expect("should scan");
        let printed: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

        assert_eq!(printed[0], "VAR var null");
        assert_eq!(printed[1], "IDENTIFIER x null");
        assert_eq!(printed[2], "EQUAL = null");
        assert_eq!(printed[3], "NUMBER 42 42.0");
        assert_eq!(printed[4], "STRING \"s\" s");
        assert_eq!(printed.last().map(String::as_str), Some("EOF  null"));
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let results: Vec<_> = Scanner::new(",.$(#").collect();

        // COMMA, DOT, error, LEFT_PAREN, error, EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.to_string())
            .collect();

        assert_eq!(
            errors,
            vec![
                "[line 1] Error: Unexpected character: $",
                "[line 1] Error: Unexpected character: #",
            ]
        );
    }

    #[test]
    fn test_unexpected_multibyte_character() {
        let results: Vec<_> = Scanner::new("a é b").collect();

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.to_string())
            .collect();
        assert_eq!(errors, vec!["[line 1] Error: Unexpected character: é"]);

        let idents = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .filter(|t| t.token_type == TokenType::IDENTIFIER)
            .count();
        assert_eq!(idents, 2);
    }

    #[test]
    fn test_unterminated_string() {
        let errors = tokenize("\"abc\n").expect_err("should fail");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 2] Error: Unterminated string.");
    }

    #[test]
    fn test_comments_and_line_numbers() {
        let tokens = tokenize("// heading\nfoo // trailing\n\nbar").expect("should scan");

        let foo = &tokens[0];
        assert_eq!(foo.lexeme, "foo");
        assert_eq!(foo.line, 2);

        let bar = tokens
            .iter()
            .find(|t| t.lexeme == "bar")
            .expect("bar scanned");
        assert_eq!(bar.line, 4);
    }

    #[test]
    fn test_semicolon_inserted_after_terminating_token() {
        assert_token_sequence(
            "x = 1\ny = 2\n",
            &[
                (TokenType::IDENTIFIER, "x"),
                (TokenType::EQUAL, "="),
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::SEMICOLON, ""),
                (TokenType::IDENTIFIER, "y"),
                (TokenType::EQUAL, "="),
                (TokenType::NUMBER(0.0), "2"),
                (TokenType::SEMICOLON, ""),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_no_semicolon_after_non_terminating_token() {
        // `+` and `{` cannot end a statement, so the line break is ignored.
        assert_eq!(
            kinds("a +\nb"),
            vec!["IDENTIFIER", "PLUS", "IDENTIFIER", "SEMICOLON", "EOF"]
        );
        assert_eq!(
            kinds("{\n}"),
            vec!["LEFT_BRACE", "RIGHT_BRACE", "EOF"]
        );
    }

    #[test]
    fn test_explicit_semicolon_is_not_doubled() {
        assert_eq!(
            kinds("return;\nbreak;"),
            vec!["RETURN", "SEMICOLON", "BREAK", "SEMICOLON", "EOF"]
        );
    }

    #[test]
    fn test_semicolon_inserted_across_comment() {
        assert_eq!(
            kinds("continue // skip\nfoo"),
            vec!["CONTINUE", "SEMICOLON", "IDENTIFIER", "SEMICOLON", "EOF"]
        );
    }

    #[test]
    fn test_inserted_semicolon_uses_previous_line() {
        let tokens = tokenize("print(1)\n\n\nx").expect("should scan");

        let semi = tokens
            .iter()
            .find(|t| t.is_implicit_semicolon())
            .expect("semicolon inserted");
        assert_eq!(semi.line, 1);
        assert_eq!(semi.near(), "end of line");
    }

    #[test]
    fn test_scanner_is_fused() {
        let mut scanner = Scanner::new("");

        assert_token_matches(
            &scanner.next().expect("EOF is emitted"),
            TokenType::EOF,
            "",
        );
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_tokens_serialize_to_json() {
        let tokens = tokenize("x").expect("should scan");
        let json = serde_json::to_value(&tokens[0]).expect("serializable");

        assert_eq!(json["lexeme"], "x");
        assert_eq!(json["line"], 1);
        assert_eq!(json["token_type"], "IDENTIFIER");
    }

    #[test]
    fn test_number_token_serializes_with_its_value() {
        let tokens = tokenize("1.5").expect("should scan");
        let json = serde_json::to_value(&tokens[0]).expect("serializable");

        assert_eq!(json["lexeme"], "1.5");
        assert_eq!(json["token_type"], serde_json::json!({ "NUMBER": 1.5 }));
    }

    fn assert_token_matches(
        result: &Result<Token, rox::error::LoxError>,
        expected_type: TokenType,
        expected_lexeme: &str,
    ) {
        match result {
            Ok(token) => {
                assert_eq!(token.token_type, expected_type, "Token type mismatch");
                assert_eq!(token.lexeme, expected_lexeme, "Lexeme mismatch");
            }
            Err(e) => panic!("Expected token but got error: {}", e),
        }
    }
}
