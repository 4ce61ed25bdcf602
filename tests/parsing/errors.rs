#[cfg(test)]
mod syntax {
    use nfstructure::config::Settings;
    use nfstructure::language::{ExtractionError, Step};
    use nfstructure::parsing;

    /// Helper function to check if extraction produces the expected error type
    fn expect_error(content: &str, expected: ExtractionError) -> ExtractionError {
        expect_error_with(content, &Settings::default(), expected)
    }

    fn expect_error_with(content: &str, settings: &Settings, expected: ExtractionError) -> ExtractionError {
        match parsing::parse_with_settings(content, settings) {
            Ok(_) => panic!(
                "Expected extraction to fail, but it succeeded for input: {}",
                content
            ),
            Err(error) => {
                if std::mem::discriminant(&error) != std::mem::discriminant(&expected) {
                    panic!(
                        "Expected error type like {:?} but got: {:?} for input '{}'",
                        expected, error, content
                    );
                }
                error
            }
        }
    }

    #[test]
    fn unclosed_process() {
        let error = expect_error(
            "process foo { input: val x",
            ExtractionError::UnbalancedDelimiter {
                delimiter: '{',
                kind: "",
                name: String::new(),
                offset: 0,
                line: 0,
            },
        );

        match error {
            ExtractionError::UnbalancedDelimiter { name, kind, line, .. } => {
                assert_eq!(name, "foo");
                assert_eq!(kind, "process");
                assert_eq!(line, 1);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn unclosed_workflow() {
        let error = expect_error(
            r#"
workflow ALIGN {
    take:
    reads

    main:
    reads.view()
            "#
            .trim_ascii(),
            ExtractionError::UnbalancedDelimiter {
                delimiter: '{',
                kind: "",
                name: String::new(),
                offset: 0,
                line: 0,
            },
        );

        assert!(error
            .to_string()
            .contains("'ALIGN'"));
    }

    #[test]
    fn unmapped_pipe_segment() {
        let error = expect_error(
            r#"
process foo {
    script: "echo"
}

workflow {
    foo(x) | mystery
}
            "#
            .trim_ascii(),
            ExtractionError::UnmappedPipeSegment {
                statement: String::new(),
                segment: String::new(),
                offset: 0,
                line: 0,
            },
        );

        assert!(error
            .to_string()
            .contains("'mystery' is neither a process, subworkflow or an operator"));
        match error {
            ExtractionError::UnmappedPipeSegment { statement, line, .. } => {
                assert_eq!(statement, "foo(x) | mystery");
                assert_eq!(line, 6);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn unmapped_segment_in_bare_chain() {
        expect_error(
            r#"
workflow {
    ch | flatten | mystery
}
            "#
            .trim_ascii(),
            ExtractionError::UnmappedPipeSegment {
                statement: String::new(),
                segment: String::new(),
                offset: 0,
                line: 0,
            },
        );
    }

    #[test]
    fn statement_starting_with_list() {
        let error = expect_error(
            "workflow {\n    ['a', 'b'].view()\n}\n",
            ExtractionError::SpanExtractionFailed {
                context: String::new(),
                offset: 0,
                line: 0,
            },
        );

        assert!(error
            .to_string()
            .contains("try rewriting it in a simplified version"));
    }

    #[test]
    fn two_entry_workflows() {
        let error = expect_error(
            "workflow {\n}\n\nworkflow {\n}\n",
            ExtractionError::MultipleMainWorkflows { offset: 0, line: 0 },
        );

        assert_eq!(error, ExtractionError::MultipleMainWorkflows { offset: 14, line: 4 });
    }

    #[test]
    fn iteration_limit_exceeded() {
        let settings = Settings {
            iteration_limit: Some(1),
            ..Settings::default()
        };

        let error = expect_error_with(
            "workflow {\n    a = Channel.of(1)\n    b = Channel.of(2)\n}\n",
            &settings,
            ExtractionError::NoProgress {
                unit: String::new(),
                step: Step::Assignments,
                iterations: 0,
            },
        );

        match error {
            ExtractionError::NoProgress { step, iterations, .. } => {
                assert_eq!(step, Step::Assignments);
                assert_eq!(iterations, 2);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn unclosed_include_parameters() {
        expect_error(
            "include { ALIGN } from './modules/align' addParams(genome: params.genome\n",
            ExtractionError::UnbalancedDelimiter {
                delimiter: '(',
                kind: "",
                name: String::new(),
                offset: 0,
                line: 0,
            },
        );
    }
}
