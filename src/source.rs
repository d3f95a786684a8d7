//! Lightweight lexical analysis of Java-like class sources.
//!
//! None of this is a parser. The patterns are tuned for conventionally
//! formatted code and feed heuristics only (ranking, metrics, scope).

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static TYPE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:(?:public|protected|private|abstract|final|static|sealed|strictfp)[ \t]+)*(?:class|interface|enum|record)[ \t]+([A-Za-z_$][\w$]*)",
    )
    .expect("type declaration pattern")
});

static METHOD_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:(?:public|protected|private|static|final|abstract|synchronized|native|default)[ \t]+)*(?:<[^>\n]*>[ \t]+)?([\w$.]+(?:<[^(\n]*>)?(?:\[\])*)[ \t]+([A-Za-z_$][\w$]*)[ \t]*\([^)]*\)[ \t]*(?:throws[ \t]+[\w$.,\s]+?)?[ \t]*\{",
    )
    .expect("method declaration pattern")
});

static FIELD_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:(?:public|protected|private|static|final|transient|volatile)[ \t]+)+[\w$.<>\[\], ?]+?[ \t]+[A-Za-z_$][\w$]*[ \t]*(?:=[^;]*)?;",
    )
    .expect("field declaration pattern")
});

static DECISION_POINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:if|for|while|case|catch)\b|&&|\|\|").expect("decision point pattern"));

static IMPORT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*import[ \t]").expect("import pattern"));

static TYPE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][A-Za-z0-9_$]*\b").expect("type reference pattern"));

/// Words that can sit where a return type or method name would in `METHOD_DECL`
const NOT_A_METHOD: &[&str] = &[
    "if", "for", "while", "switch", "catch", "synchronized", "return", "new", "else", "throw", "try", "do",
];

/// A modifier in return-type position means the match is a constructor
const MODIFIERS: &[&str] = &["public", "protected", "private", "static", "final", "abstract"];

/// Name of the first top-level type declared in `source`.
pub fn extract_class_name(source: &str) -> Option<String> {
    TYPE_DECL
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Class name for a file: the declared type, else the file stem.
pub fn class_name_for(path: &Path, source: &str) -> Option<String> {
    extract_class_name(source).or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Declared methods as (name, byte offset of the declaration, byte offset of the opening brace).
fn method_declarations(source: &str) -> Vec<(String, usize, usize)> {
    METHOD_DECL
        .captures_iter(source)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let return_type = caps.get(1)?.as_str();
            let name = caps.get(2)?.as_str();
            if NOT_A_METHOD.contains(&return_type) || NOT_A_METHOD.contains(&name) || MODIFIERS.contains(&return_type)
            {
                return None;
            }
            Some((name.to_string(), whole.start(), whole.end() - 1))
        })
        .collect()
}

/// Byte offset of the brace closing the one at `open`, if any.
fn matching_brace(source: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in source[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Names of the methods declared in `source`, in order of appearance.
pub fn method_names(source: &str) -> Vec<String> {
    method_declarations(source)
        .into_iter()
        .map(|(name, _, _)| name)
        .collect()
}

/// Each method with its length in lines, declaration through closing brace.
pub fn method_lengths(source: &str) -> Vec<(String, usize)> {
    method_declarations(source)
        .into_iter()
        .map(|(name, start, open)| {
            let end = matching_brace(source, open).map_or(source.len(), |close| close + 1);
            (name, source[start..end].lines().count())
        })
        .collect()
}

pub fn count_methods(source: &str) -> usize {
    method_names(source).len()
}

pub fn count_fields(source: &str) -> usize {
    FIELD_DECL.find_iter(source).count()
}

pub fn count_decision_points(source: &str) -> usize {
    DECISION_POINT.find_iter(source).count()
}

pub fn count_imports(source: &str) -> usize {
    IMPORT.find_iter(source).count()
}

pub fn non_blank_lines(source: &str) -> usize {
    source.lines().filter(|l| !l.trim().is_empty()).count()
}

/// Capitalised identifiers referenced anywhere in `source`.
pub fn referenced_types(source: &str) -> BTreeSet<String> {
    TYPE_REFERENCE
        .find_iter(source)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Whether `ident` occurs in `source` as a whole word.
pub fn mentions_identifier(source: &str, ident: &str) -> bool {
    if ident.is_empty() {
        return false;
    }
    source.match_indices(ident).any(|(start, _)| {
        let before = source[..start].chars().next_back();
        let after = source[start + ident.len()..].chars().next();
        !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
    })
}

/// Whether an identifier names a test class.
///
/// The `Test` prefix only counts when a new word follows it, so `TestParser`
/// is a test and `Testimonial` is not.
pub fn is_test_identifier(id: &str) -> bool {
    let test_prefix = id
        .strip_prefix("Test")
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_uppercase);
    id.ends_with("Test") || id.ends_with("Tests") || id.ends_with("IT") || test_prefix
}

/// Whether a source path belongs to test code.
pub fn is_test_path(path: &Path) -> bool {
    let in_test_dir = path
        .components()
        .any(|c| matches!(c.as_os_str().to_str(), Some("test") | Some("tests")));
    let test_stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(is_test_identifier);
    in_test_dir || test_stem
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"package org.example;

import java.util.List;
import java.util.Map;

public class VirtualMachine extends Base {
    private String name;
    private final Map<String, Integer> ports = new HashMap<>();
    protected static int COUNT = 0;

    public VirtualMachine(String name) {
        this.name = name;
    }

    public String getName() {
        return name;
    }

    public static <T> List<T> wrap(T item) throws IllegalStateException {
        if (item == null && COUNT > 0) {
            throw new IllegalStateException();
        }
        for (int i = 0; i < 2; i++) {
            COUNT++;
        }
        return List.of(item);
    }

    private void start() {
        try {
            Runner r = new Runner();
        } catch (Exception e) {
        } else if (x) {
        }
    }
}
"#;

    #[test]
    fn test_extract_class_name() {
        assert_eq!(extract_class_name(SAMPLE), Some("VirtualMachine".to_string()));
        assert_eq!(extract_class_name("interface Shape {}"), Some("Shape".to_string()));
        assert_eq!(extract_class_name("// nothing here"), None);
    }

    #[test]
    fn test_class_name_falls_back_to_stem() {
        let path = Path::new("src/main/java/Util.java");
        assert_eq!(class_name_for(path, "// empty"), Some("Util".to_string()));
        assert_eq!(class_name_for(path, SAMPLE), Some("VirtualMachine".to_string()));
    }

    #[test]
    fn test_method_names_skip_control_flow() {
        let names = method_names(SAMPLE);
        assert_eq!(names, vec!["getName", "wrap", "start"]);
    }

    #[test]
    fn test_method_lengths() {
        let lengths = method_lengths(SAMPLE);
        assert_eq!(
            lengths,
            vec![("getName".to_string(), 3), ("wrap".to_string(), 9), ("start".to_string(), 7)]
        );
    }

    #[test]
    fn test_method_length_unclosed_body() {
        let lengths = method_lengths("void run() {\n  work();\n");
        assert_eq!(lengths, vec![("run".to_string(), 2)]);
    }

    #[test]
    fn test_count_fields() {
        assert_eq!(count_fields(SAMPLE), 3);
    }

    #[test]
    fn test_count_decision_points() {
        // if, &&, for, catch, if
        assert_eq!(count_decision_points(SAMPLE), 5);
    }

    #[test]
    fn test_count_imports_and_lines() {
        assert_eq!(count_imports(SAMPLE), 2);
        assert_eq!(non_blank_lines("a\n\n  \nb\n"), 2);
    }

    #[test]
    fn test_mentions_identifier_whole_word() {
        let source = "VirtualMachineFactory f; VirtualMachine vm;";
        assert!(mentions_identifier(source, "VirtualMachine"));
        assert!(!mentions_identifier("VirtualMachineFactory f;", "VirtualMachine"));
        assert!(!mentions_identifier("myVirtualMachine", "VirtualMachine"));
        assert!(!mentions_identifier(source, ""));
    }

    #[test]
    fn test_referenced_types() {
        let types = referenced_types(SAMPLE);
        assert!(types.contains("Runner"));
        assert!(types.contains("Map"));
        assert!(!types.contains("name"));
    }

    #[test]
    fn test_is_test_identifier() {
        assert!(is_test_identifier("VirtualMachineTest"));
        assert!(is_test_identifier("VirtualMachineTests"));
        assert!(is_test_identifier("TestCase"));
        assert!(is_test_identifier("ComputeServiceIT"));
        assert!(!is_test_identifier("VirtualMachine"));
    }

    #[test]
    fn test_test_prefix_needs_a_following_word() {
        assert!(is_test_identifier("TestParser"));
        assert!(is_test_identifier("Test"));
        assert!(!is_test_identifier("Testimonial"));
        assert!(!is_test_identifier("Testament"));
        assert!(!is_test_path(Path::new("src/main/java/org/Testimonial.java")));
    }

    #[test]
    fn test_is_test_path() {
        assert!(is_test_path(Path::new("src/test/java/org/FooTest.java")));
        assert!(is_test_path(Path::new("src/main/java/org/FooTest.java")));
        assert!(!is_test_path(Path::new("src/main/java/org/Foo.java")));
        assert!(!is_test_path(Path::new("src/main/java/org/Contest.java")));
    }
}
