use std::path::{Path, PathBuf};
use std::process::Command;

use code2map::{OutputLayout, RunOptions, run_file};

const FIXTURE: &str = "tests/fixtures/project";

fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(FIXTURE)
}

fn code2map_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_code2map"));
    cmd.current_dir(fixture_root());
    cmd.env_remove("RUST_LOG");
    cmd
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("reading {}: {e}", path.display()))
}

#[test]
fn single_file_produces_fragments_index_and_map() {
    let out = tempfile::tempdir().unwrap();
    let layout = OutputLayout::single(out.path());
    let report =
        run_file(&fixture_root(), Path::new("src/app/service.py"), &layout, RunOptions::default())
            .unwrap();

    let names: Vec<&str> = report.map_entries.iter().map(|e| e.qualified_name.as_str()).collect();
    assert_eq!(names, ["helper", "Service", "Service#run"]);

    let fragment = read(&out.path().join("parts/src/app/service/Service.run.py"));
    assert_eq!(
        fragment,
        "\
# code2map fragment (non-buildable)
# original: src/app/service.py
# lines: 8-9
# symbol: Service#run
# notes: none
    def run(self):
        return helper('a')
"
    );

    let index = read(&out.path().join("INDEX.md"));
    assert!(index.contains("- Total lines: 10\n"), "index:\n{index}");
    let class_line = index.find("- `Service` class, lines 7-10").unwrap();
    let method_line = index.find("- `Service#run` method, lines 8-9").unwrap();
    assert!(class_line < method_line, "class must be listed before its method:\n{index}");

    let map: serde_json::Value = serde_json::from_str(&read(&out.path().join("MAP.json"))).unwrap();
    assert_eq!(map["helper"]["start_line"], 2);
    assert_eq!(map["helper"]["end_line"], 5);
}

#[test]
fn fragment_bodies_are_verbatim_source_lines() {
    let out = tempfile::tempdir().unwrap();
    let layout = OutputLayout::single(out.path());
    let report =
        run_file(&fixture_root(), Path::new("src/app/service.py"), &layout, RunOptions::default())
            .unwrap();

    let source = read(&fixture_root().join("src/app/service.py"));
    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    for fragment in &report.outcome.fragments {
        let expected = lines[fragment.symbol.start_line - 1..fragment.symbol.end_line].concat();
        let written = read(&out.path().join(&fragment.output_path));
        assert_eq!(
            written.strip_prefix(&fragment.header),
            Some(expected.as_str()),
            "{}",
            fragment.symbol.qualified_name
        );
    }
}

#[test]
fn regeneration_is_byte_identical() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    for out in [first.path(), second.path()] {
        let layout = OutputLayout::single(out);
        let options = RunOptions::default();
        run_file(&fixture_root(), Path::new("src/app/Inventory.java"), &layout, options).unwrap();
    }
    for document in ["INDEX.md", "MAP.json", "parts/src/app/Inventory/Inventory.count~2.java"] {
        assert_eq!(
            read(&first.path().join(document)),
            read(&second.path().join(document)),
            "{document}"
        );
    }
}

#[test]
fn map_has_one_entry_per_fragment_even_with_clashing_names() {
    let out = tempfile::tempdir().unwrap();
    let report = run_file(
        &fixture_root(),
        Path::new("src/app/Inventory.java"),
        &OutputLayout::single(out.path()),
        RunOptions::default(),
    )
    .unwrap();

    assert_eq!(report.map_entries.len(), report.outcome.fragments.len());
    assert_eq!(
        report.map_entries.len(),
        report.table.symbols().len() - report.outcome.skipped.len()
    );

    let map: serde_json::Value = serde_json::from_str(&read(&out.path().join("MAP.json"))).unwrap();
    assert_eq!(map["Inventory#count"]["kind"], "field");
    assert_eq!(map["Inventory#count~2"]["kind"], "method");
    assert_ne!(map["Inventory#count"]["output_path"], map["Inventory#count~2"]["output_path"]);
}

#[test]
fn build_directory_reports_partial_failure() {
    let out = tempfile::tempdir().unwrap();
    let output = code2map_cmd().args(["build", "."]).arg("--out").arg(out.path()).output().unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(2), "stderr: {stderr}");
    assert!(stderr.contains("lib/notes.py"), "stderr: {stderr}");
    assert!(stderr.contains("Empty Map"), "stderr: {stderr}");

    let broken = read(&out.path().join("index/lib/broken.py.md"));
    assert!(broken.contains("\n## Warnings\n\n- line 4 ("), "index:\n{broken}");
    assert!(broken.contains("`first`") && broken.contains("`second`"), "index:\n{broken}");
    assert!(out.path().join("map/src/app/Inventory.java.json").is_file(), "java map missing");
    assert!(
        out.path().join("parts/src/app/service/helper.py").is_file(),
        "python fragment missing"
    );
    assert!(!out.path().join("index/README.txt.md").exists(), "non-source file was processed");
}

#[test]
fn build_directory_with_allow_empty_succeeds() {
    let out = tempfile::tempdir().unwrap();
    let output = code2map_cmd()
        .args(["build", ".", "--allow-empty"])
        .arg("--out")
        .arg(out.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(out.path().join("index/lib/notes.py.md").is_file(), "index for empty file missing");
    assert!(!out.path().join("map/lib/notes.py.json").exists(), "empty map was written");
}

#[test]
fn dry_run_prints_plan_and_writes_nothing() {
    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("out");
    let output = code2map_cmd()
        .args(["build", "src/app/service.py", "--dry-run"])
        .arg("--out")
        .arg(&target)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 3, "stdout: {stdout}");
    assert!(stdout.contains("Service.run.py"), "stdout: {stdout}");
    assert!(!target.exists(), "dry run wrote output");
}

#[test]
fn lookup_finds_built_symbol_and_suggests_on_miss() {
    let out = tempfile::tempdir().unwrap();
    let build = code2map_cmd()
        .args(["build", "src/app/service.py"])
        .arg("--out")
        .arg(out.path())
        .output()
        .unwrap();
    assert!(build.status.success(), "stderr: {}", String::from_utf8_lossy(&build.stderr));

    let map = out.path().join("MAP.json");
    let hit = code2map_cmd().arg("lookup").arg(&map).arg("Service#run").output().unwrap();
    assert!(hit.status.success(), "stderr: {}", String::from_utf8_lossy(&hit.stderr));
    assert_eq!(
        String::from_utf8_lossy(&hit.stdout),
        "parts/src/app/service/Service.run.py\tmethod\t8-9\n"
    );

    let miss = code2map_cmd().arg("lookup").arg(&map).arg("run").output().unwrap();
    assert_eq!(miss.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&miss.stderr);
    assert!(stderr.contains("Did you mean `Service#run`?"), "stderr: {stderr}");
}

#[test]
fn symbols_lists_without_writing() {
    let output = code2map_cmd().args(["symbols", "lib/broken.py"]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "first\tfunction\t1-2\nsecond\tfunction\t6-7\n"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning: line 4 ("), "warning not reported: {stderr}");
}

#[test]
fn unsupported_file_is_a_fatal_error() {
    let out = tempfile::tempdir().unwrap();
    let output = code2map_cmd()
        .args(["build", "README.txt"])
        .arg("--out")
        .arg(out.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unsupported Language"), "wrong diagnostic: {stderr}");
}
