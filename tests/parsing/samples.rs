#[cfg(test)]
mod samples {
    use std::fs;
    use std::path::{Path, PathBuf};

    use nfstructure::parsing;

    fn scripts_in(dir: &Path) -> Vec<PathBuf> {
        let entries = fs::read_dir(dir).expect("Failed to read directory");

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.expect("Failed to read directory entry");
            let path = entry.path();

            if path
                .extension()
                .and_then(|s| s.to_str())
                == Some("nf")
            {
                files.push(path);
            }
        }

        files.sort();
        files
    }

    #[test]
    fn ensure_samples_parse() {
        let dir = Path::new("tests/samples/");

        assert!(dir.exists(), "samples directory missing");

        let files = scripts_in(dir);
        assert!(!files.is_empty(), "No .nf files found in samples directory");

        let mut failures = Vec::new();

        for file in &files {
            let content = parsing::load(&file)
                .unwrap_or_else(|e| panic!("Failed to load file {:?}: {:?}", file, e));

            match parsing::parse(&content) {
                Ok(_) => {}
                Err(e) => {
                    println!("File {:?} failed to parse: {:?}", file, e);
                    failures.push(file.clone());
                }
            }
        }

        if !failures.is_empty() {
            panic!(
                "Sample files should parse successfully, but {} files failed",
                failures.len()
            );
        }
    }

    #[test]
    fn ensure_broken_fail() {
        let dir = Path::new("tests/broken/");

        assert!(dir.exists(), "broken directory missing");

        let files = scripts_in(dir);
        assert!(!files.is_empty(), "No .nf files found in broken directory");

        let mut unexpected_successes = Vec::new();

        for file in &files {
            let content = parsing::load(&file)
                .unwrap_or_else(|e| panic!("Failed to load file {:?}: {:?}", file, e));

            match parsing::parse(&content) {
                Ok(_) => {
                    println!("File {:?} unexpectedly parsed successfully", file);
                    unexpected_successes.push(file.clone());
                }
                Err(_) => {}
            }
        }

        if !unexpected_successes.is_empty() {
            panic!(
                "Broken files should fail to parse, but {} files succeeded",
                unexpected_successes.len()
            );
        }
    }

    #[test]
    fn sample_structure() {
        let content = parsing::load(Path::new("tests/samples/rnaseq.nf")).unwrap();
        let document = parsing::parse(&content).unwrap();

        assert_eq!(
            document
                .includes
                .iter()
                .map(|include| include.path)
                .collect::<Vec<_>>(),
            vec![
                "./modules/index",
                "./modules/quant",
                "./modules/fastqc",
                "./modules/multiqc"
            ]
        );

        let qc = document
            .subworkflow("QC")
            .unwrap();
        assert_eq!(qc.takes, vec!["reads"]);
        assert_eq!(qc.emits, vec!["reports"]);
        assert_eq!(
            qc.executors
                .iter()
                .map(|executor| executor.target())
                .collect::<Vec<_>>(),
            vec![Some("FASTQC_RAW"), None]
        );

        let main = document
            .main
            .as_ref()
            .unwrap();
        assert_eq!(
            main.executors
                .iter()
                .map(|executor| executor.target())
                .collect::<Vec<_>>(),
            vec![None, Some("QUANT"), Some("QC"), None, Some("MULTIQC")]
        );
        assert!(main.executors[0]
            .text()
            .starts_with("index = INDEX("));
        assert!(main.executors[3]
            .text()
            .starts_with("Channel\n        .fromFilePairs("));
    }

    #[test]
    fn legacy_sample() {
        let content = parsing::load(Path::new("tests/samples/legacy.nf")).unwrap();
        let document = parsing::parse(&content).unwrap();

        assert_eq!(document.dialect.to_string(), "DSL1");
        assert!(document
            .main
            .is_none());
        assert_eq!(document.executors.len(), 2);
        assert!(document
            .executors
            .iter()
            .all(|executor| executor
                .target()
                .is_none()));
    }
}
