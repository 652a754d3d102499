#[cfg(test)]
mod resolver_tests {
    use rox::parser::Parser;
    use rox::resolver::{ResolutionMap, Resolver};
    use rox::scanner::tokenize;

    fn resolve(source: &str) -> Result<ResolutionMap, Vec<String>> {
        let tokens = tokenize(source).expect("source should scan");
        let statements = Parser::new(&tokens).parse().expect("source should parse");

        Resolver::new()
            .resolve(&statements)
            .map_err(|errors| errors.iter().map(|e| e.to_string()).collect())
    }

    fn errors(source: &str) -> Vec<String> {
        match resolve(source) {
            Ok(_) => panic!("expected resolution errors for {:?}", source),
            Err(errors) => errors,
        }
    }

    #[test]
    fn test_globals_are_left_unresolved() {
        let locals = resolve("var a = 1\nprint(a)\na = 2").expect("should resolve");
        assert!(locals.is_empty());
    }

    #[test]
    fn test_locals_get_an_entry_per_occurrence() {
        // Two reads of `a` and one assignment, all inside the block.
        let locals = resolve("{\n  var a = 1\n  a = a + a\n}").expect("should resolve");
        assert_eq!(locals.len(), 3);
    }

    #[test]
    fn test_structurally_identical_reads_resolve_to_different_depths() {
        let source = "{\n  var x = 1\n  {\n    var x = 2\n    print(x)\n  }\n  print(x)\n}";
        let locals = resolve(source).expect("should resolve");

        let mut depths: Vec<usize> = locals.values().copied().collect();
        depths.sort_unstable();
        assert_eq!(depths, vec![0, 0]);

        let nested = "{\n  var x = 1\n  {\n    print(x)\n  }\n}";
        let locals = resolve(nested).expect("should resolve");
        assert_eq!(locals.values().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_read_in_own_local_initializer() {
        assert_eq!(
            errors("{\n  var a = a\n}"),
            vec!["[line 2] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_read_in_own_global_initializer() {
        assert_eq!(
            errors("var a = a;"),
            vec!["[line 1] Error at 'a': Can't read variable in its own initializer."]
        );
        assert!(resolve("var a = 1; var b = a;").is_ok());
    }

    #[test]
    fn test_duplicate_local_declaration() {
        assert_eq!(
            errors("fun f() {\n  var a = 1\n  var a = 2\n}"),
            vec!["[line 3] Error at 'a': Already a variable with this name in this scope."]
        );
        // Globals may be redeclared.
        assert!(resolve("var a = 1; var a = 2;").is_ok());
    }

    #[test]
    fn test_return_outside_function() {
        assert_eq!(
            errors("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn test_return_value_from_initializer() {
        assert_eq!(
            errors("class A {\n  init() {\n    return 1\n  }\n}"),
            vec!["[line 3] Error at 'return': Can't return a value from an initializer."]
        );
        assert!(resolve("class A {\n  init() {\n    return\n  }\n}").is_ok());
    }

    #[test]
    fn test_break_and_continue_outside_loop() {
        assert_eq!(
            errors("break;\ncontinue;"),
            vec![
                "[line 1] Error at 'break': Can't use 'break' outside of a loop.",
                "[line 2] Error at 'continue': Can't use 'continue' outside of a loop.",
            ]
        );
    }

    #[test]
    fn test_loop_depth_does_not_leak_into_functions() {
        assert_eq!(
            errors("while (true) {\n  fun f() {\n    break\n  }\n}"),
            vec!["[line 3] Error at 'break': Can't use 'break' outside of a loop."]
        );
        assert!(resolve("for (;;) {\n  if (true) break\n}").is_ok());
    }

    #[test]
    fn test_class_inheriting_from_itself() {
        assert_eq!(
            errors("class A < A {}"),
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_this_outside_class() {
        assert_eq!(
            errors("print(this)"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(
            errors("fun f() {\n  return this\n}"),
            vec!["[line 2] Error at 'this': Can't use 'this' outside of a class."]
        );
    }

    #[test]
    fn test_super_misuse() {
        assert_eq!(
            errors("super.x()"),
            vec!["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );
        assert_eq!(
            errors("class A {\n  f() {\n    super.f()\n  }\n}"),
            vec!["[line 3] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn test_this_and_super_resolve_inside_methods() {
        let source = "class A {}\nclass B < A {\n  f() {\n    super.f()\n    return this\n  }\n}";
        let locals = resolve(source).expect("should resolve");

        // `super` sits one frame further out than `this`.
        let mut depths: Vec<usize> = locals.values().copied().collect();
        depths.sort_unstable();
        assert_eq!(depths, vec![1, 2]);
    }

    #[test]
    fn test_all_errors_are_collected() {
        let errs = errors("return;\nbreak;\nprint(this)");
        assert_eq!(errs.len(), 3);
    }
}
