// tests/command_work.rs

use std::error::Error;

use tempfile::tempdir;

use changetar::errors::ChangetarError;
use changetar::exec::CommandWork;

type TestResult = Result<(), Box<dyn Error>>;

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[test]
fn empty_command_is_rejected() {
    let result = CommandWork::from_argv(&[], "/tmp");
    assert!(matches!(result, Err(ChangetarError::ConfigError(_))));
}

#[test]
fn display_joins_program_and_args() -> TestResult {
    let work = CommandWork::from_argv(&argv(&["make", "-j", "4"]), "/src")?;
    assert_eq!(work.display(), "make -j 4");
    assert_eq!(work.cwd(), std::path::Path::new("/src"));
    Ok(())
}

#[cfg(unix)]
mod unix {
    use super::*;

    use std::fs;

    use changetar::tar_changes;
    use changetar_test_utils::archive::read_archive;
    use changetar_test_utils::builders::default_observer;
    use changetar_test_utils::{init_tracing, with_timeout};

    #[tokio::test]
    async fn command_runs_in_the_given_directory() -> TestResult {
        let dir = tempdir()?;
        let work = CommandWork::from_argv(&argv(&["sh", "-c", "printf done > marker"]), dir.path())?;

        work.run().await?;

        assert_eq!(fs::read_to_string(dir.path().join("marker"))?, "done");
        Ok(())
    }

    #[tokio::test]
    async fn non_zero_exit_is_an_error() -> TestResult {
        let dir = tempdir()?;
        let work = CommandWork::from_argv(&argv(&["sh", "-c", "exit 3"]), dir.path())?;

        let err = work.run().await.expect_err("command should fail");
        assert!(err.to_string().contains("status 3"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_program_is_an_error() -> TestResult {
        let dir = tempdir()?;
        let work = CommandWork::from_argv(
            &argv(&["definitely-not-a-real-program-xyz"]),
            dir.path(),
        )?;

        assert!(work.run().await.is_err());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn command_output_is_captured_end_to_end() -> TestResult {
        init_tracing();

        let dir = tempdir()?;
        let root = dir.path().canonicalize()?;
        let out = tempdir()?;
        let destination = out.path().join("cmd.tgz");

        let work = CommandWork::from_argv(
            &argv(&[
                "sh",
                "-c",
                "mkdir -p gen && printf 'a' > gen/one.txt && printf 'bb' > two.txt",
            ]),
            &root,
        )?;

        let summary = with_timeout(tar_changes(
            &default_observer(),
            &root,
            Some(destination.clone()),
            || work.run(),
        ))
        .await?;

        assert_eq!(summary.entries, vec!["gen/one.txt", "two.txt"]);
        let files = read_archive(&destination)?;
        assert_eq!(files["gen/one.txt"].content, b"a");
        assert_eq!(files["two.txt"].content, b"bb");
        Ok(())
    }
}
