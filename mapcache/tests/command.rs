#![cfg(feature = "cli")]

use predicates::str;
use rstest::rstest;
use std::fs;
use test_utilities::*;

#[test]
fn command() -> Result<(), Box<dyn std::error::Error>> {
	mapcache_cmd()
		.assert()
		.failure()
		.code(2)
		.stdout(str::is_empty())
		.stderr(str::contains(format!("Usage: {BINARY_NAME} [OPTIONS] <COMMAND>")));
	Ok(())
}

#[rstest]
#[case("stats", "[OPTIONS] <DATABASE>")]
#[case("regions", "[OPTIONS] <DATABASE>")]
#[case("create-region", "[OPTIONS] --style <STYLE>")]
#[case("delete-region", "[OPTIONS] <DATABASE> <ID>")]
#[case("get", "[OPTIONS] <DATABASE> <URL>")]
#[case("put", "[OPTIONS] <DATABASE> <URL> [FILE]")]
#[case("tile-count", "[OPTIONS] <DATABASE>")]
fn subcommand(#[case] sub_command: &str, #[case] usage: &str) -> Result<(), Box<dyn std::error::Error>> {
	mapcache_cmd()
		.arg(sub_command)
		.assert()
		.failure()
		.code(2)
		.stdout(str::is_empty())
		.stderr(str::contains(format!("Usage: {BINARY_NAME} {sub_command} {usage}")));
	Ok(())
}

#[test]
fn e2e_offline_region() -> Result<(), Box<dyn std::error::Error>> {
	let (dir, db) = get_temp_database();
	let tile = dir.path().join("tile.pbf");
	fs::write(&tile, vec![7u8; 4096])?;
	let tile = tile.to_str().unwrap();
	let template = "mapbox://tiles/{z}/{x}/{y}.pbf";

	assert_eq!(
		mapcache_stdout("create-region", &db, &["--style", "mapbox://styles/streets", "--bbox", "13,52,14,53"]),
		"1\n"
	);
	mapcache_stdout("put", &db, &[template, tile, "--tile", "0/0/0", "--region", "1"]);
	mapcache_stdout("put", &db, &[template, tile, "--tile", "1/0/0", "--region", "1"]);
	assert_eq!(mapcache_stdout("tile-count", &db, &[]), "2\n");

	// an entry larger than the budget is refused and the region stays intact
	mapcache_cmd()
		.args(["--maximum-cache-size", "10", "put", db.to_str().unwrap(), "https://example.com/a.json", tile])
		.assert()
		.failure()
		.stderr(str::contains("Unable to make space for entry"));
	assert_eq!(mapcache_stdout("get", &db, &[template, "--tile", "1/0/0"]).len(), 4096);

	assert_eq!(mapcache_stdout("delete-region", &db, &["1"]), "deleted region 1\n");
	assert_eq!(mapcache_stdout("tile-count", &db, &[]), "0\n");
	mapcache_cmd()
		.args(["get", db.to_str().unwrap(), template, "--tile", "1/0/0"])
		.assert()
		.failure()
		.stderr(str::contains("is not cached"));
	Ok(())
}

#[test]
fn e2e_config_file() -> Result<(), Box<dyn std::error::Error>> {
	let (_dir, db) = get_temp_database();
	let config = get_testdata("config.yml");
	let output = mapcache_stdout("stats", &db, &["--config", config.to_str().unwrap()]);
	assert!(output.contains("cache size: 0 of 104857600 bytes"), "{output}");
	Ok(())
}
