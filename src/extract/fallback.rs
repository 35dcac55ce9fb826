//! Line-oriented regex scan for sources that do not tokenize.

use regex::Regex;
use std::sync::LazyLock;

static IMPORT_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^import\s+(.+)$").expect("IMPORT_LINE_REGEX must compile")
});

static FROM_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^from\s+([A-Za-z_][\w.]*)\s+import\b").expect("FROM_LINE_REGEX must compile")
});

static DYNAMIC_CALL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:__import__|import_module)\(\s*['"]([\w.]+)['"]\s*[,)]"#)
        .expect("DYNAMIC_CALL_REGEX must compile")
});

static DOTTED_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_]\w*(\.[A-Za-z_]\w*)*$").expect("DOTTED_NAME_REGEX must compile")
});

/// Scan source line by line, returning every module name that looks imported.
pub fn scan(source: &str) -> Vec<String> {
    let mut found = Vec::new();

    for raw_line in source.lines() {
        for caps in DYNAMIC_CALL_REGEX.captures_iter(raw_line) {
            let name = &caps[1];
            if !name.starts_with('.') {
                found.push(name.to_string());
            }
        }

        let line = raw_line.split('#').next().unwrap_or_default();
        for segment in line.split(';') {
            let statement = statement_after_colon(segment.trim());
            if let Some(caps) = FROM_LINE_REGEX.captures(statement) {
                found.push(caps[1].to_string());
            } else if let Some(caps) = IMPORT_LINE_REGEX.captures(statement) {
                found.extend(import_targets(&caps[1]));
            }
        }
    }

    found
}

/// `try: import x` → `import x`.
fn statement_after_colon(segment: &str) -> &str {
    if segment.starts_with("import") || segment.starts_with("from") {
        return segment;
    }
    match segment.rfind(':') {
        Some(idx) => segment[idx + 1..].trim(),
        None => segment,
    }
}

fn import_targets(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(',').filter_map(|item| {
        let name = item.split_whitespace().next()?;
        DOTTED_NAME_REGEX
            .is_match(name)
            .then(|| name.to_string())
    })
}
