#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use mrwc::config::Layout;

pub const GOLDEN: [(&str, &str); 2] = [
    ("a.txt", "the cat sat on the mat\n"),
    ("b.txt", "a cat and a hat\n"),
];

/// Writes `files` under `<root>/inputs` and returns a layout over them.
pub fn layout_with(root: &Path, files: &[(&str, &str)]) -> Layout {
    let inputs = root.join("inputs");
    fs::create_dir_all(&inputs).unwrap();
    for (name, text) in files {
        fs::write(inputs.join(name), text).unwrap();
    }
    Layout::new(
        inputs.join("*.txt").to_string_lossy().into_owned(),
        root.join("files"),
    )
}

pub fn expected_golden() -> BTreeMap<String, u64> {
    [
        ("the", 2),
        ("cat", 2),
        ("sat", 1),
        ("on", 1),
        ("mat", 1),
        ("a", 2),
        ("and", 1),
        ("hat", 1),
    ]
    .into_iter()
    .map(|(w, n)| (w.to_string(), n))
    .collect()
}

/// Parses one output file.
pub fn read_bucket(layout: &Layout, bucket: u32) -> BTreeMap<String, u64> {
    let data = fs::read(layout.output_path(bucket)).unwrap();
    mrwc::wordcount::parse_output(&data).unwrap()
}

/// Words of the golden corpus that land in `bucket` of 2.
pub fn golden_bucket(bucket: u32) -> BTreeMap<String, u64> {
    expected_golden()
        .into_iter()
        .filter(|(w, _)| mrwc::wordcount::bucket_for(w.as_bytes(), 2) == bucket)
        .collect()
}
