#[cfg(test)]
mod verify {
    use std::ops::Range;

    use nfstructure::language::{Document, Executor, Kind};
    use nfstructure::parsing;
    use proptest::prelude::*;

    fn summary(executors: &[Executor]) -> Vec<(Kind, &str)> {
        executors
            .iter()
            .map(|executor| (executor.kind(), executor.text()))
            .collect()
    }

    fn main_of<'d>(document: &'d Document) -> &'d [Executor] {
        &document
            .main
            .as_ref()
            .expect("an entry workflow")
            .executors
    }

    #[test]
    fn process_and_entry_workflow() {
        let content = r#"
process foo {
  input: val x
  output: val y
  script: "echo $x"
}
workflow {
  ch = Channel.of(1,2,3)
  foo(ch)
}
        "#
        .trim_ascii();

        let document = parsing::parse(content).unwrap();

        assert_eq!(document.processes.len(), 1);
        assert_eq!(document.processes[0].name, "foo");
        assert_eq!(
            summary(main_of(&document)),
            vec![
                (Kind::Operation, "ch = Channel.of(1,2,3)"),
                (Kind::Call, "foo(ch)")
            ]
        );
        assert_eq!(main_of(&document)[1].target(), Some("foo"));
    }

    #[test]
    fn chain_headed_by_process() {
        let content = r#"
process splitLetters {
  script: "echo"
}
workflow {
  splitLetters | flatten | view
}
        "#
        .trim_ascii();

        let document = parsing::parse(content).unwrap();
        let executors = main_of(&document);

        assert_eq!(executors.len(), 1);
        assert_eq!(executors[0].kind(), Kind::Call);
        assert_eq!(executors[0].target(), Some("splitLetters"));
        assert!(executors[0]
            .text()
            .starts_with("splitLetters()"));
        assert_eq!(executors[0].original(), "splitLetters | flatten | view");
    }

    #[test]
    fn chain_ending_in_process() {
        let content = r#"
process splitLetters {
  script: "echo"
}
workflow {
  Channel.of('a') | splitLetters
}
        "#
        .trim_ascii();

        let document = parsing::parse(content).unwrap();
        let executors = main_of(&document);

        assert_eq!(executors.len(), 1);
        assert_eq!(executors[0].target(), Some("splitLetters"));
        assert_eq!(executors[0].text(), "Channel.of('a') | splitLetters");
    }

    #[test]
    fn call_followed_by_set() {
        let content = r#"
process foo {
  script: "echo"
}
workflow {
  foo().set{bar}
}
        "#
        .trim_ascii();

        let document = parsing::parse(content).unwrap();

        assert_eq!(
            summary(main_of(&document)),
            vec![(Kind::Operation, "foo().set{bar}")]
        );
        match &main_of(&document)[0] {
            Executor::Operation { calls, .. } => assert_eq!(calls, &vec!["foo".to_string()]),
            _ => unreachable!(),
        }
    }

    #[test]
    fn assignment_inside_inline_if() {
        let content = r#"
workflow {
  x = 1
  if (x > 0) { y = compute() }
}
        "#
        .trim_ascii();

        let document = parsing::parse(content).unwrap();

        assert_eq!(summary(main_of(&document)), vec![(Kind::Operation, "x = 1")]);
    }

    #[test]
    fn assignment_to_a_call_inside_if() {
        let content = r#"
process foo {
  script: "echo"
}
workflow {
  x = 1
  if (x > 0) { y = foo() }
  if (x > 1) {
    y = foo()
  }
}
        "#
        .trim_ascii();

        let document = parsing::parse(content).unwrap();
        let executors = main_of(&document);

        // the same statement is claimed whole however it is laid out
        assert_eq!(
            summary(executors),
            vec![
                (Kind::Operation, "x = 1"),
                (Kind::Operation, "y = foo()"),
                (Kind::Operation, "y = foo()")
            ]
        );
        for executor in &executors[1..] {
            match executor {
                Executor::Operation { calls, .. } => assert_eq!(calls, &vec!["foo".to_string()]),
                _ => unreachable!(),
            }
        }
        assert_eq!(unclaimed(&document), "if (x > 0) { } if (x > 1) { }");
    }

    #[test]
    fn chains_headed_by_outputs() {
        let content = r#"
process FASTQC {
  script: "echo"
}
process MULTIQC {
  script: "echo"
}
workflow {
  FASTQC(ch)
  FASTQC.out.zip | collect | MULTIQC
  FASTQC.out.html.view()
  FASTQC.out.html | view
}
        "#
        .trim_ascii();

        let document = parsing::parse(content).unwrap();
        let executors = main_of(&document);

        assert_eq!(
            summary(executors),
            vec![
                (Kind::Call, "FASTQC(ch)"),
                (Kind::Operation, "FASTQC.out.html.view()"),
                (Kind::Call, "FASTQC.out.zip | collect | MULTIQC"),
                (Kind::Operation, "FASTQC.out.html | view")
            ]
        );
        assert_eq!(executors[2].target(), Some("MULTIQC"));
        assert_eq!(unclaimed(&document), "");
    }

    #[test]
    fn call_in_if_condition() {
        let content = r#"
process foo {
  script: "echo"
}
workflow {
  ch = Channel.of(1)
  if (foo(ch)) {
    ch.view()
  }
}
        "#
        .trim_ascii();

        let document = parsing::parse(content).unwrap();

        assert_eq!(
            summary(main_of(&document)),
            vec![
                (Kind::Operation, "ch = Channel.of(1)"),
                (Kind::Operation, "ch.view()")
            ]
        );
    }

    #[test]
    fn statements_in_control_blocks() {
        let content = r#"
process foo {
  script: "echo"
}
workflow {
  if (params.run) {
    foo(Channel.of(1))
  } else {
    Channel.empty().view()
  }
}
        "#
        .trim_ascii();

        let document = parsing::parse(content).unwrap();

        assert_eq!(
            summary(main_of(&document)),
            vec![
                (Kind::Call, "foo(Channel.of(1))"),
                (Kind::Operation, "Channel.empty().view()")
            ]
        );
    }

    #[test]
    fn statements_in_closures_are_not_executors() {
        let content = r#"
workflow {
  ch.subscribe { v ->
    other = v * 2
    other.view()
  }
}
        "#
        .trim_ascii();

        let document = parsing::parse(content).unwrap();
        let executors = main_of(&document);

        assert_eq!(executors.len(), 1);
        assert!(executors[0]
            .text()
            .starts_with("ch.subscribe {"));
    }

    #[test]
    fn console_output_is_dropped() {
        let content = r#"
workflow {
  System.out.println(x)
  ch.view { System.out.println(it) }
}
        "#
        .trim_ascii();

        let document = parsing::parse(content).unwrap();

        assert_eq!(
            summary(main_of(&document)),
            vec![(Kind::Operation, "ch.view { System.out.println(it) }")]
        );
    }

    #[test]
    fn reparsing_is_stable() {
        let content = parsing::load(std::path::Path::new("tests/samples/branching.nf")).unwrap();

        let first = parsing::parse(&content).unwrap();
        let second = parsing::parse(&content).unwrap();

        assert_eq!(first, second);
    }

    /// Whatever of the entry workflow's body no executor claimed, with
    /// whitespace collapsed.
    fn unclaimed(document: &Document) -> String {
        let main = document
            .main
            .as_ref()
            .expect("an entry workflow");

        let mut bytes = document
            .source
            .as_bytes()
            .to_vec();
        for executor in &main.executors {
            for b in &mut bytes[executor.span()] {
                *b = b' ';
            }
        }

        let body = String::from_utf8_lossy(&bytes[main.span.clone()]).to_string();
        let inner = match (body.find('{'), body.rfind('}')) {
            (Some(open), Some(close)) if open < close => &body[open + 1..close],
            _ => "",
        };

        inner
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn overlapping(spans: &[Range<usize>]) -> Option<(Range<usize>, Range<usize>)> {
        let mut spans = spans.to_vec();
        spans.sort_by_key(|span| span.start);

        spans
            .windows(2)
            .find(|pair| pair[0].end > pair[1].start)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
    }

    /// Processes, functions, includes, and executors never claim the same
    /// text, and an executor lies within the workflow it came from.
    fn check_spans(document: &Document) {
        let mut spans: Vec<Range<usize>> = Vec::new();

        spans.extend(
            document
                .processes
                .iter()
                .map(|process| {
                    process
                        .span
                        .clone()
                }),
        );
        spans.extend(
            document
                .functions
                .iter()
                .map(|function| {
                    function
                        .span
                        .clone()
                }),
        );
        spans.extend(
            document
                .includes
                .iter()
                .map(|include| {
                    include
                        .span
                        .clone()
                }),
        );

        let mut bodies: Vec<(Range<usize>, &[Executor])> = Vec::new();
        if let Some(main) = &document.main {
            bodies.push((
                main.span
                    .clone(),
                main.executors
                    .as_slice(),
            ));
        }
        for subworkflow in &document.subworkflows {
            bodies.push((
                subworkflow
                    .span
                    .clone(),
                subworkflow
                    .executors
                    .as_slice(),
            ));
        }

        for (body, executors) in &bodies {
            for executor in executors.iter() {
                let span = executor.span();
                assert!(
                    body.start <= span.start && span.end <= body.end,
                    "{:?} outside of {:?}",
                    span,
                    body
                );
                spans.push(span);
            }
        }
        for executor in &document.executors {
            spans.push(executor.span());
        }

        for (_, executors) in document.units() {
            for executor in executors {
                assert_eq!(&document.source[executor.span()], executor.original());
            }
        }

        if let Some((a, b)) = overlapping(&spans) {
            panic!("{:?} overlaps {:?}", a, b);
        }
    }

    #[test]
    fn samples_claim_disjoint_text() {
        for name in ["hello.nf", "rnaseq.nf", "legacy.nf", "branching.nf"] {
            let path = std::path::Path::new("tests/samples/").join(name);
            let content = parsing::load(&path).unwrap();
            let document = parsing::parse(&content).unwrap();

            check_spans(&document);
        }
    }

    const STATEMENTS: &[&str] = &[
        "ch = Channel.of(1, 2)",
        "foo(ch)",
        "ch.view()",
        "ch | map { it * 2 } | view",
        "foo.out.collect().set { done }",
        "bar(ch) | foo",
    ];

    fn script(statements: &[&str]) -> String {
        let mut content = String::from(
            "process foo {\n    script: \"echo\"\n}\n\nprocess bar {\n    script: \"echo\"\n}\n\nworkflow {\n",
        );
        for statement in statements {
            content.push_str("    ");
            content.push_str(statement);
            content.push('\n');
        }
        content.push_str("}\n");
        content
    }

    proptest! {
        #[test]
        fn every_statement_found_once(statements in prop::collection::vec(prop::sample::select(STATEMENTS), 1..8)) {
            let content = script(&statements);

            let document = parsing::parse(&content).unwrap();
            let again = parsing::parse(&content).unwrap();
            prop_assert_eq!(&document, &again);

            check_spans(&document);
            prop_assert_eq!(unclaimed(&document), "");

            let mut executors = main_of(&document).to_vec();
            executors.sort_by_key(|executor| executor.span().start);
            let found: Vec<&str> = executors
                .iter()
                .map(|executor| executor.original())
                .collect();
            prop_assert_eq!(found, statements);
        }
    }
}
