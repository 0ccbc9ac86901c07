//! Polygon compiler ids mapped to judge language keys
//!
//! Main solutions whose source type is missing from this table are skipped
//! with a warning instead of being submitted.

const POLYGON_COMPILERS: &[(&str, &str)] = &[
    ("c.gcc", "C"),
    ("cpp.g++11", "CPP11"),
    ("cpp.g++14", "CPP14"),
    ("cpp.g++17", "CPP17"),
    ("cpp.gcc11-64-winlibs-g++20", "CPP20"),
    ("cpp.gcc13-64-winlibs-g++20", "CPP20"),
    ("cpp.msys2-mingw64-9-g++17", "CPP17"),
    ("java.8", "JAVA8"),
    ("java.11", "JAVA11"),
    ("java.21", "JAVA21"),
    ("kotlin.17", "KOTLIN"),
    ("kotlin.19", "KOTLIN"),
    ("pas.fpc", "PAS"),
    ("python.2", "PY2"),
    ("python.3", "PY3"),
    ("python.pypy2", "PYPY2"),
    ("python.pypy3", "PYPY3"),
    ("python.pypy3-64", "PYPY3"),
    ("rust.2021", "RUST"),
];

/// Judge language key for a Polygon source type, if supported
pub fn judge_language(source_type: &str) -> Option<&'static str> {
    POLYGON_COMPILERS
        .iter()
        .find(|(polygon, _)| *polygon == source_type)
        .map(|(_, judge)| *judge)
}
