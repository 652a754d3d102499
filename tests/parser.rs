#[cfg(test)]
mod parser_tests {
    use rox::ast::Stmt;
    use rox::ast_printer::AstPrinter;
    use rox::error::LoxError;
    use rox::parser::Parser;
    use rox::scanner::tokenize;

    fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
        let tokens = tokenize(source).expect("source should scan");
        Parser::new(&tokens).parse()
    }

    fn printed(source: &str) -> Vec<String> {
        match parse(source) {
            Ok(statements) => statements.iter().map(AstPrinter::print_stmt).collect(),
            Err(errors) => panic!(
                "unexpected parse errors: {:?}",
                errors.iter().map(|e| e.to_string()).collect::<Vec<_>>()
            ),
        }
    }

    fn errors(source: &str) -> Vec<String> {
        match parse(source) {
            Ok(_) => panic!("expected parse errors for {:?}", source),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(printed("1 + 2 * 3;"), vec!["(; (+ 1.0 (* 2.0 3.0)))"]);
        assert_eq!(printed("1 - 2 - 3;"), vec!["(; (- (- 1.0 2.0) 3.0))"]);
        assert_eq!(printed("(1 + 2) % 3;"), vec!["(; (% (group (+ 1.0 2.0)) 3.0))"]);
        assert_eq!(printed("-!x;"), vec!["(; (- (! x)))"]);
        assert_eq!(
            printed("a < b == c >= d;"),
            vec!["(; (== (< a b) (>= c d)))"]
        );
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(
            printed("a or b and c;"),
            vec!["(; (or a (and b c)))"]
        );
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(printed("a = b = 1;"), vec!["(; (= a (= b 1.0)))"]);
    }

    #[test]
    fn test_property_assignment_becomes_set() {
        assert_eq!(
            printed("a.b.c = 2;"),
            vec!["(; (= (. (. a b) c) 2.0))"]
        );
    }

    #[test]
    fn test_call_chains() {
        assert_eq!(printed("f()();"), vec!["(; (call (call f)))"]);
        assert_eq!(
            printed("a.b(1, \"s\").c;"),
            vec!["(; (. (call (. a b) 1.0 s) c))"]
        );
    }

    #[test]
    fn test_var_and_block() {
        assert_eq!(
            printed("var a = 1; { var b; a = b; }"),
            vec!["(var a 1.0)", "(block (var b) (; (= a b)))"]
        );
    }

    #[test]
    fn test_if_else_and_while() {
        assert_eq!(
            printed("if (a) b; else c;"),
            vec!["(if a (; b) (; c))"]
        );
        assert_eq!(printed("while (x) y;"), vec!["(while x (; y))"]);
    }

    #[test]
    fn test_for_desugars_to_while_with_increment() {
        assert_eq!(
            printed("for (var i = 0; i < 3; i = i + 1) f(i);"),
            vec!["(block (var i 0.0) (while (< i 3.0) (; (call f i)) (= i (+ i 1.0))))"]
        );
    }

    #[test]
    fn test_for_with_omitted_clauses() {
        assert_eq!(printed("for (;;) break;"), vec!["(while true (break))"]);
    }

    #[test]
    fn test_function_and_return() {
        assert_eq!(
            printed("fun add(a, b) {\n  return a + b\n}"),
            vec!["(fun add(a b) (block (return (+ a b))))"]
        );
        assert_eq!(
            printed("fun f() { return; }"),
            vec!["(fun f() (block (return)))"]
        );
    }

    #[test]
    fn test_class_with_superclass_and_super_call() {
        let source = "class B < A {\n  init(x) {\n    this.x = x\n  }\n  greet() {\n    return super.greet()\n  }\n}";

        assert_eq!(
            printed(source),
            vec![
                "(class B < A \
                 (method init(x) (block (; (= (. this x) x)))) \
                 (method greet() (block (return (call (super greet))))))"
            ]
        );
    }

    #[test]
    fn test_break_and_continue_statements() {
        assert_eq!(
            printed("while (true) {\n  continue\n  break\n}"),
            vec!["(while true (block (continue) (break)))"]
        );
    }

    #[test]
    fn test_statements_without_semicolons() {
        assert_eq!(
            printed("var a = 1\na = a + 2\nprint(a)"),
            vec!["(var a 1.0)", "(; (= a (+ a 2.0)))", "(; (call print a))"]
        );
    }

    #[test]
    fn test_expression_may_continue_after_operator() {
        assert_eq!(printed("var a = 1 +\n  2"), vec!["(var a (+ 1.0 2.0))"]);
    }

    #[test]
    fn test_invalid_assignment_target_is_reported() {
        assert_eq!(
            errors("1 + 2 = 3;"),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn test_error_at_end() {
        assert_eq!(
            errors("print(1,"),
            vec!["[line 1] Error at end: Expected expression."]
        );
    }

    #[test]
    fn test_error_at_end_of_line() {
        let errs = errors("var x = (1\n+ 2)");

        assert_eq!(
            errs[0],
            "[line 1] Error at end of line: Expected ')' after expression."
        );
        // The dangling second line is its own bad statement.
        assert_eq!(errs[1], "[line 2] Error at '+': Expected expression.");
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn test_recovers_and_reports_each_bad_statement() {
        let errs = errors("var = 1;\nvar ok = 2;\nfun (a) {}\nvar also = 3;");

        assert_eq!(
            errs,
            vec![
                "[line 1] Error at '=': Expected variable name.",
                "[line 3] Error at '(': Expected function name.",
            ]
        );
    }

    #[test]
    fn test_super_requires_method_name() {
        assert_eq!(
            errors("super;"),
            vec!["[line 1] Error at ';': Expected '.' after 'super'."]
        );
    }

    #[test]
    fn test_too_many_arguments() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        assert_eq!(
            errors(&source),
            vec!["[line 1] Error at '255': Can't have more than 255 arguments."]
        );
    }

    #[test]
    fn test_too_many_parameters() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));

        assert_eq!(
            errors(&source),
            vec!["[line 1] Error at 'p255': Can't have more than 255 parameters."]
        );
    }
}
