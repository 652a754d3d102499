#[cfg(test)]
mod pipeline_tests {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use rox::error::LoxError;
    use rox::value::Value;
    use rox::{compile, compile_and_run, Lox, Outcome};

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn take(&self) -> String {
            let bytes: Vec<u8> = std::mem::take(&mut *self.0.borrow_mut());
            String::from_utf8(bytes).expect("output is UTF-8")
        }
    }

    fn session() -> (Lox, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Lox::with_output(Box::new(buffer.clone())), buffer)
    }

    fn static_errors(outcome: Outcome) -> Vec<String> {
        match outcome {
            Outcome::StaticError(errors) => errors.iter().map(LoxError::to_string).collect(),
            other => panic!("expected static errors, got {:?}", other),
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Ok.exit_code(), 0);
        assert_eq!(Outcome::StaticError(Vec::new()).exit_code(), 65);
        assert_eq!(
            Outcome::RuntimeError {
                message: "boom".into(),
                line: 1
            }
            .exit_code(),
            70
        );
    }

    #[test]
    fn test_compile_produces_statements_and_locals() {
        let program = compile("var a = 1\n{\n  var b = a\n  print(b)\n}").expect("should compile");

        assert_eq!(program.statements.len(), 2);
        // Only `b` is local; `a` and `print` are globals.
        assert_eq!(program.locals.len(), 1);
    }

    #[test]
    fn test_lexical_and_syntax_errors_are_reported_together() {
        let errors = match compile("var a = 1 @\nvar = 2") {
            Ok(_) => panic!("should not compile"),
            Err(errors) => errors,
        };

        let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "[line 1] Error: Unexpected character: @",
                "[line 2] Error at '=': Expected variable name.",
            ]
        );
    }

    #[test]
    fn test_static_error_prevents_execution() {
        let (mut lox, out) = session();

        let outcome = lox.run("print(\"side effect\")\nreturn 1");
        assert_eq!(outcome.exit_code(), 65);
        assert_eq!(out.take(), "");
    }

    #[test]
    fn test_class_inheriting_from_itself_is_static() {
        let errors = static_errors(compile_and_run("class A < A {}"));
        assert_eq!(errors, vec!["[line 1] Error at 'A': A class can't inherit from itself."]);
    }

    #[test]
    fn test_self_initializer_is_static() {
        let errors = static_errors(compile_and_run("var a = a"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_runtime_error_outcome() {
        let (mut lox, out) = session();

        match lox.run("print(1)\nprint(2 / 0)\nprint(3)") {
            Outcome::RuntimeError { message, line } => {
                assert_eq!(message, "Division by zero.");
                assert_eq!(line, 2);
            }
            other => panic!("expected runtime error, got {:?}", other),
        }
        assert_eq!(out.take(), "1\n");
    }

    #[test]
    fn test_globals_persist_across_runs() {
        let (mut lox, out) = session();

        assert!(lox.run("var count = 1").is_ok());
        assert!(lox.run("count = count + 1").is_ok());
        assert!(lox.run("print(count)").is_ok());
        assert_eq!(out.take(), "2\n");

        assert_eq!(lox.interpreter().global("count"), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_closures_from_earlier_runs_keep_working() {
        let (mut lox, out) = session();

        let define = "\
fun makeAdder(n) {
  fun add(x) {
    return x + n
  }
  return add
}
var addTwo = makeAdder(2)";
        assert!(lox.run(define).is_ok());
        assert!(lox.run("{\n  var n = 100\n  print(addTwo(1))\n}").is_ok());
        assert!(lox.run("print(addTwo(40))").is_ok());

        assert_eq!(out.take(), "3\n42\n");
    }

    #[test]
    fn test_errors_do_not_corrupt_the_session() {
        let (mut lox, out) = session();

        assert!(lox.run("var keep = \"kept\"").is_ok());
        assert_eq!(lox.run("keep = nope").exit_code(), 70);
        assert_eq!(lox.run("var = broken").exit_code(), 65);
        assert!(lox.run("print(keep)").is_ok());

        assert_eq!(out.take(), "kept\n");
    }

    #[test]
    fn test_session_survives_stack_overflow() {
        let (mut lox, out) = session();

        match lox.run("fun f() { f(); }\nf();") {
            Outcome::RuntimeError { message, line } => {
                assert_eq!(message, "Stack overflow.");
                assert_eq!(line, 1);
            }
            other => panic!("expected runtime error, got {:?}", other),
        }

        // The failed run leaves the global frame active.
        assert!(lox.run("var after = \"ok\"\nprint(after)").is_ok());
        assert!(lox.run("fun g(n) {\n  if (n > 0) g(n - 1)\n}\ng(10)\nprint(\"done\")").is_ok());
        assert_eq!(out.take(), "ok\ndone\n");
    }

    #[test]
    fn test_classes_defined_in_earlier_runs() {
        let (mut lox, out) = session();

        assert!(lox.run("class A {\n  hi() {\n    return \"A\"\n  }\n}").is_ok());
        assert!(lox.run("class B < A {\n  hi() {\n    return super.hi() + \"B\"\n  }\n}").is_ok());
        assert!(lox.run("print(B().hi())").is_ok());

        assert_eq!(out.take(), "AB\n");
    }

    #[test]
    fn test_empty_source_runs() {
        assert!(compile_and_run("").is_ok());
        assert!(compile_and_run("// only a comment\n").is_ok());
    }
}
