#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub const CHECKER: &str = "#include \"testlib.h\"\nint main(int argc, char* argv[]) {\n    registerTestlibCmd(argc, argv);\n    quitf(_ok, \"ok\");\n}\n";
pub const TESTLIB: &str = "#ifndef _TESTLIB_H_\n#define _TESTLIB_H_\n#endif\n";
pub const STATEMENT: &str = "%PDF-1.4 fake statement\n";

pub fn setup() {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_nanos()
        .is_test(true)
        .try_init();
}

/// Builder of a Polygon problem package on disk.
#[derive(Debug, Clone)]
pub struct ProblemFixture {
    pub short_name: String,
    pub name: String,
    pub revision: u32,
    pub time_limit: u64,
    pub memory_limit: u64,
    pub testsets: Vec<(String, u32)>,
    pub statement: bool,
    pub checker: bool,
    pub testlib: bool,
    pub validation: Option<String>,
}

impl ProblemFixture {
    pub fn new(short_name: &str) -> ProblemFixture {
        ProblemFixture {
            short_name: short_name.into(),
            name: "Soma de Números".into(),
            revision: 1,
            time_limit: 1000,
            memory_limit: 256 * 1024 * 1024,
            testsets: vec![("tests".into(), 3)],
            statement: true,
            checker: true,
            testlib: true,
            validation: None,
        }
    }

    pub fn revision(mut self, revision: u32) -> Self {
        self.revision = revision;
        self
    }

    pub fn time_limit(mut self, time_limit: u64) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn testsets(mut self, testsets: &[(&str, u32)]) -> Self {
        self.testsets = testsets
            .iter()
            .map(|(name, count)| (name.to_string(), *count))
            .collect();
        self
    }

    pub fn without_statement(mut self) -> Self {
        self.statement = false;
        self
    }

    pub fn without_checker(mut self) -> Self {
        self.checker = false;
        self
    }

    pub fn without_testlib(mut self) -> Self {
        self.testlib = false;
        self
    }

    /// Content of `doall.sh`, written with mode 0644 like the real packages.
    pub fn validation(mut self, script: &str) -> Self {
        self.validation = Some(script.into());
        self
    }

    fn xml(&self) -> String {
        let mut xml = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"no\"?>\n<problem revision=\"{}\" short-name=\"{}\" url=\"https://polygon.codeforces.com/p/judge/{}\">\n",
            self.revision, self.short_name, self.short_name
        );
        xml += &format!(
            "  <names>\n    <name language=\"portuguese\" value=\"{}\"/>\n  </names>\n",
            self.name
        );
        if self.statement {
            xml += "  <statements>\n    <statement language=\"portuguese\" path=\"statements/.pdf/portuguese/problem.pdf\" type=\"application/pdf\"/>\n  </statements>\n";
        }
        xml += "  <judging cpu-name=\"Intel(R) Core(TM) i3-8100 CPU @ 3.60GHz\" cpu-speed=\"3600\" input-file=\"\" output-file=\"\">\n";
        for (name, count) in &self.testsets {
            xml += &format!(
                "    <testset name=\"{name}\">\n      <time-limit>{}</time-limit>\n      <memory-limit>{}</memory-limit>\n      <test-count>{count}</test-count>\n      <input-path-pattern>{name}/%02d</input-path-pattern>\n      <answer-path-pattern>{name}/%02d.a</answer-path-pattern>\n    </testset>\n",
                self.time_limit,
                self.memory_limit,
                name = name,
                count = count
            );
        }
        xml += "  </judging>\n  <files>\n    <resources>\n      <file path=\"files/olymp.sty\"/>\n";
        if self.testlib {
            xml += "      <file path=\"files/testlib.h\" type=\"h.g++\"/>\n";
        }
        xml += "    </resources>\n  </files>\n  <assets>\n";
        if self.checker {
            xml += "    <checker name=\"check.cpp\" type=\"testlib\">\n      <source path=\"files/check.cpp\" type=\"cpp.g++17\"/>\n    </checker>\n";
        }
        xml += "  </assets>\n</problem>\n";
        xml
    }

    /// Write the package inside `dir/<short name>`, returning its path.
    pub fn write(&self, dir: &Path) -> PathBuf {
        let root = dir.join(&self.short_name);
        std::fs::create_dir_all(root.join("files")).unwrap();
        std::fs::write(root.join("problem.xml"), self.xml()).unwrap();
        std::fs::write(root.join("files/olymp.sty"), "% style\n").unwrap();
        std::fs::write(root.join("files/check.cpp"), CHECKER).unwrap();
        if self.testlib {
            std::fs::write(root.join("files/testlib.h"), TESTLIB).unwrap();
        }
        if self.statement {
            let statement = root.join("statements/.pdf/portuguese");
            std::fs::create_dir_all(&statement).unwrap();
            std::fs::write(statement.join("problem.pdf"), STATEMENT).unwrap();
        }
        for (name, count) in &self.testsets {
            std::fs::create_dir_all(root.join(name)).unwrap();
            for i in 1..=*count {
                std::fs::write(root.join(format!("{}/{:02}", name, i)), input(name, i)).unwrap();
                std::fs::write(root.join(format!("{}/{:02}.a", name, i)), answer(name, i))
                    .unwrap();
            }
        }
        if let Some(script) = &self.validation {
            let path = root.join("doall.sh");
            std::fs::write(&path, script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        }
        root
    }
}

pub fn input(testset: &str, ordinal: u32) -> String {
    format!("{} input {}\n", testset, ordinal)
}

pub fn answer(testset: &str, ordinal: u32) -> String {
    format!("{} answer {}\n", testset, ordinal)
}

/// Write a contest package in `dir/contest` with the provided `(index, problem)` pairs.
pub fn write_contest(dir: &Path, problems: &[(&str, ProblemFixture)]) -> PathBuf {
    let root = dir.join("contest");
    let problems_dir = root.join("problems");
    std::fs::create_dir_all(&problems_dir).unwrap();
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"no\"?>\n<contest url=\"https://polygon.codeforces.com/c/1/training\">\n  <problems>\n",
    );
    for (index, problem) in problems {
        problem.write(&problems_dir);
        xml += &format!(
            "    <problem index=\"{}\" url=\"https://polygon.codeforces.com/p/judge/{}\"/>\n",
            index, problem.short_name
        );
    }
    xml += "  </problems>\n</contest>\n";
    std::fs::write(root.join("contest.xml"), xml).unwrap();
    root
}

/// The names of the entries of the archive that are files.
pub fn files(archive: &Path) -> Vec<String> {
    polyconv_archive::list_entries(archive)
        .unwrap()
        .into_iter()
        .filter(|name| !name.ends_with('/'))
        .collect()
}

/// The raw content of an entry of the archive.
pub fn read_bytes(archive: &Path, name: &str) -> Vec<u8> {
    polyconv_archive::read_entry(archive, name)
        .unwrap()
        .unwrap_or_else(|| panic!("{} is missing from {}", name, archive.display()))
}

/// The content of an entry of the archive.
pub fn read(archive: &Path, name: &str) -> String {
    String::from_utf8(read_bytes(archive, name)).unwrap()
}
