use predicates::str;
use test_utilities::{BINARY_NAME, chartpyramid_cmd};

#[test]
fn no_subcommand_prints_usage_and_fails() {
	chartpyramid_cmd()
		.assert()
		.failure()
		.code(2)
		.stdout(str::is_empty())
		.stderr(str::contains(format!("Usage: {BINARY_NAME} [OPTIONS] <COMMAND>")));
}

#[test]
fn build_without_required_args_fails_with_usage() {
	chartpyramid_cmd()
		.arg("build")
		.assert()
		.failure()
		.code(2)
		.stderr(str::contains("Usage: chartpyramid build"));
}

#[test]
fn build_reports_error_for_missing_catalog() {
	let dir = tempfile::tempdir().unwrap();
	chartpyramid_cmd()
		.args([
			"build",
			"no-such-catalog.json",
			"--outpath",
			dir.path().join("out").to_str().unwrap(),
			"--tmppath",
			dir.path().join("tmp").to_str().unwrap(),
		])
		.assert()
		.failure()
		.code(1)
		.stderr(str::contains("Error:"));
}
