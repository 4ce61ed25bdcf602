#[cfg(test)]
mod golden {
    use std::path::Path;

    use nfstructure::formatting::Identity;
    use nfstructure::parsing;
    use nfstructure::rendering;

    /// Outline a sample file without any markup.
    fn outline_of(name: &str) -> String {
        let path = Path::new("tests/samples/").join(name);
        let content = parsing::load(&path)
            .unwrap_or_else(|e| panic!("Failed to load file {:?}: {:?}", path, e));
        let document = parsing::parse(&content)
            .unwrap_or_else(|e| panic!("Failed to parse file {:?}: {}", path, e));

        rendering::render(&Identity, &document)
    }

    fn trim(expected: &str) -> String {
        expected
            .trim_ascii()
            .to_string()
            + "\n"
    }

    #[test]
    fn hello() {
        assert_eq!(
            outline_of("hello.nf"),
            trim(
                r#"
dialect DSL2

process splitLetters (line 5)
process convertToUpper (line 15)

workflow (line 28)
    call splitLetters: splitLetters() | flatten | convertToUpper | view { v -> v.trim() }
                "#
            )
        );
    }

    #[test]
    fn rnaseq() {
        assert_eq!(
            outline_of("rnaseq.nf"),
            trim(
                r#"
dialect DSL2

include INDEX from './modules/index' (line 6)
include QUANT from './modules/quant' (line 7)
include FASTQC as FASTQC_RAW from './modules/fastqc' (line 8)
include MULTIQC from './modules/multiqc' (line 9)

workflow QC (line 14)
    take reads
    emit reports
    call FASTQC_RAW: FASTQC_RAW(reads)
    operation FASTQC_RAW.out.html .mix(FASTQC_RAW.out.zip) .collect() .set { reports }

workflow (line 29)
    operation index = INDEX(params.transcriptome) -> INDEX
    call QUANT: QUANT(index, read_pairs)
    call QC: QC(read_pairs)
    operation Channel .fromFilePairs(params.reads, checkIfExists: true) .set { read_pairs }
    call MULTIQC: QUANT.out.mix(QC.out.reports).collect() | MULTIQC
                "#
            )
        );
    }

    #[test]
    fn legacy() {
        assert_eq!(
            outline_of("legacy.nf"),
            trim(
                r#"
dialect DSL1

process count_lines (line 9)

script
    operation Channel .fromPath(params.input) .into { files_a; files_b }
    operation counts .map { it.trim() } .subscribe { println it }
                "#
            )
        );
    }

    #[test]
    fn functions_are_listed() {
        let outline = outline_of("branching.nf");

        assert!(outline.starts_with("dialect DSL2\n\nprocess align (line 5)\nfunction banner (line 1)\n"));
        assert!(outline.contains("\n    call align: align(samples)\n"));
        assert!(!outline.contains("System.out"));
    }
}
